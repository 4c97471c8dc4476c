pub mod mailbox;
pub mod watch;

pub use self::mailbox::{Mailbox, FETCH_CHUNK_SIZE};
pub use self::watch::{Watch, WatchConfig, DEFAULT_IDLE_TIMEOUT};
