pub mod config;
pub mod connection;
pub mod response;

pub use self::config::ImapConfig;
pub use self::connection::{Error, ImapConnection, ImapSession, ImapSessionStream, Result};
