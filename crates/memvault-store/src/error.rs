//! Error types for memory store operations.

/// Errors returned by the document store, snapshot, and migration layers.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record is stored under the identifier.
    #[error("memory not found: {0}")]
    NotFound(String),
    /// A record was written with an empty scope.
    #[error("memory scope must not be empty (id={0})")]
    EmptyScope(String),
    /// The purge candidate set changed between plan and commit.
    #[error("purge plan is stale (planned={planned}, current={current})")]
    PlanStale { planned: usize, current: usize },
    /// A snapshot repeats an identifier and cannot be restored as-is.
    #[error("snapshot contains duplicate memory id: {0}")]
    DuplicateInSnapshot(String),
    /// The database failed its integrity check.
    #[error("storage corrupt: {0}")]
    Corrupt(String),
    /// The underlying SQLite database could not be reached or written.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] rusqlite::Error),
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// True when the error means the backing storage cannot be used.
    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            StoreError::StorageUnavailable(_) | StoreError::Corrupt(_) | StoreError::Io(_)
        )
    }
}
