pub mod criteria;

pub use self::criteria::{
    format_date, Error, Result, SearchAlias, SearchCriteria, SearchFilter, Token,
};
