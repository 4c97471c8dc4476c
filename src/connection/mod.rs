pub mod connection;
pub mod idle;

#[cfg(feature = "imap-backend")]
pub mod imap;

pub use self::connection::{
    decode_name, encode_name, Connection, Error, FetchAttribute, IdleEvent, MailboxInfo,
    Result, StoreAction, PREFETCH_ATTRIBUTES,
};
pub use self::idle::IdleDone;
#[cfg(feature = "imap-backend")]
pub use self::imap::{ImapConfig, ImapConnection};
