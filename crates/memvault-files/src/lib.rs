//! File-based memory documents, one markdown file per memory name.

pub mod error;
pub mod manager;
pub mod model;

/// File manager error type.
pub use error::FilesError;
/// Memory file capability and the filesystem implementation.
pub use manager::{FileMemoryManager, MemoryFiles, validate_name};
/// Load and save outcomes.
pub use model::{MemoryLoad, SaveConfirmation};
