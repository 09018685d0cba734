//! Error types for file-backed memories.

/// Errors returned by memory file managers.
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Memory name that cannot be mapped to a single file.
    #[error("invalid memory name: {0:?}")]
    InvalidName(String),
}
