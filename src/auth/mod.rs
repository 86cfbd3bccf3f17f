pub mod oauth;
pub mod token_manager;
pub mod token_store;
pub mod tokens_file;

pub use token_manager::{Credentials, TokenManager};
