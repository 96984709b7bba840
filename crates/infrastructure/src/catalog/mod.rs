pub mod document;
pub mod json_catalog;

pub use document::{parse_time_updated, FiltersDocument};
pub use json_catalog::JsonFilterCatalog;
