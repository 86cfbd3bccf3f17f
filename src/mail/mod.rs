pub mod decoders;
pub mod folders;
pub mod imap_client;
pub mod store;

pub use folders::FolderInfo;
pub use imap_client::ImapClient;
pub use store::{FolderKind, MailStore, Mailboxes};
