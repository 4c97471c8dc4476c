pub mod envelope;
pub use envelope::{Address, Envelope, EnvelopeField};

pub mod flag;
pub use flag::{Flag, Flags};

pub mod label;
pub use label::{Label, LabelManager, Labels, SpecialUse};

pub mod mailbox;
pub use mailbox::{Mailbox, Watch, WatchConfig};

pub mod message;
pub use message::{AttributeCache, Attributes, Field, Mark, Message};

pub mod search;
pub use search::{SearchAlias, SearchCriteria, SearchFilter, Token};
