pub mod label;
pub mod labels;
pub mod manager;
pub mod special_use;

pub use self::label::*;
pub use self::labels::*;
pub use self::manager::*;
pub use self::special_use::*;
