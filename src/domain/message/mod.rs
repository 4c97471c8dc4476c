pub mod attributes;
pub mod message;

pub use self::attributes::{AttributeCache, Attributes};
pub use self::message::{Field, Mark, Message};
