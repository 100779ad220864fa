pub mod match_row;
pub mod repository;
pub mod run_metadata;

pub use match_row::MatchRow;
pub use repository::{Branch, Repository};
pub use run_metadata::{MetadataValue, RunMetadata, UNKNOWN_IDENTITY};
