//! Test helpers shared across memvault crates.

pub mod files;
pub mod records;
pub mod store;

pub use files::InMemoryFiles;
pub use records::{canonical_record, record, with_fields};
pub use store::{open_temp_store, seed, write_legacy_artifact};
