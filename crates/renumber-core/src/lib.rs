pub mod domain;
pub mod error;
pub mod input;

pub use domain::*;
pub use error::{CoreError, MappingError};
pub use input::{parse_mappings, read_mappings, MappingColumns, MappingFile};
