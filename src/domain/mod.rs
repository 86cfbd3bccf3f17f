pub mod message;
pub mod range;

pub use message::{Field, FieldError, Message};
pub use range::{DateRange, parse_date};
