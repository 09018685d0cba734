//! Result types of memory file operations.

use serde::{Deserialize, Serialize};

/// Outcome of loading a named memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MemoryLoad {
    /// The memory exists.
    Found { content: String },
    /// No memory by that name; `message` is meant for the caller to show.
    NotFound { message: String },
}

impl MemoryLoad {
    /// Standard "not found" outcome for `name`.
    pub fn not_found(name: &str) -> Self {
        MemoryLoad::NotFound {
            message: format!("memory '{name}' not found"),
        }
    }

    /// Content when found.
    pub fn content(&self) -> Option<&str> {
        match self {
            MemoryLoad::Found { content } => Some(content),
            MemoryLoad::NotFound { .. } => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, MemoryLoad::Found { .. })
    }
}

/// Acknowledgement of a successful save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveConfirmation {
    pub name: String,
    /// Bytes written.
    pub bytes: usize,
    /// `false` when an existing memory was replaced.
    pub created: bool,
}
