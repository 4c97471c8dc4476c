pub mod envelope;

pub use self::envelope::*;
