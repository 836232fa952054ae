pub mod mapping;
pub mod phone;

pub use mapping::MappingRow;
pub use phone::{normalize_number, search_variants, NormalizedNumber};
