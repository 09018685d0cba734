//! Memory file capability and its filesystem implementation.

use crate::error::FilesError;
use crate::model::{MemoryLoad, SaveConfirmation};
use log::{debug, info};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Named memory persistence, one document per name.
pub trait MemoryFiles: Send + Sync {
    /// Load a memory; an absent name yields `MemoryLoad::NotFound`.
    fn load(&self, name: &str) -> Result<MemoryLoad, FilesError>;

    /// Create or replace a memory.
    fn save(&self, name: &str, content: &str) -> Result<SaveConfirmation, FilesError>;

    /// Names of all stored memories, sorted.
    fn list(&self) -> Result<Vec<String>, FilesError>;

    /// Remove a memory; returns whether it existed.
    fn delete(&self, name: &str) -> Result<bool, FilesError>;
}

/// Reject names that do not map to exactly one file in the root.
pub fn validate_name(name: &str) -> Result<(), FilesError> {
    let invalid = name.trim().is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(FilesError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Markdown-file memory manager storing `<name>.<extension>` under a root.
#[derive(Debug, Clone)]
pub struct FileMemoryManager {
    root: PathBuf,
    extension: String,
}

impl FileMemoryManager {
    /// Default file extension.
    pub const DEFAULT_EXTENSION: &'static str = "md";

    /// Create a manager under `root`, creating the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, FilesError> {
        Self::with_extension(root, Self::DEFAULT_EXTENSION)
    }

    /// Create a manager using a custom file extension (without the dot).
    pub fn with_extension(
        root: impl AsRef<Path>,
        extension: impl Into<String>,
    ) -> Result<Self, FilesError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        let extension = extension.into();
        info!(
            "initialized file memory manager (root={}, extension={})",
            root.display(),
            extension
        );
        Ok(Self { root, extension })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `name`.
    fn memory_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.{}", self.extension))
    }
}

impl MemoryFiles for FileMemoryManager {
    fn load(&self, name: &str) -> Result<MemoryLoad, FilesError> {
        validate_name(name)?;
        match std::fs::read_to_string(self.memory_path(name)) {
            Ok(content) => Ok(MemoryLoad::Found { content }),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("memory file missing (name={})", name);
                Ok(MemoryLoad::not_found(name))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Write to a uniquely named temp file in the root, then rename it over
    /// the target. Concurrent saves of one name never share a temp file.
    fn save(&self, name: &str, content: &str) -> Result<SaveConfirmation, FilesError> {
        validate_name(name)?;
        let path = self.memory_path(name);
        let created = !path.exists();
        let mut temp = NamedTempFile::new_in(&self.root)?;
        temp.write_all(content.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(&path).map_err(|err| err.error)?;
        debug!(
            "saved memory file (name={}, bytes={}, created={})",
            name,
            content.len(),
            created
        );
        Ok(SaveConfirmation {
            name: name.to_string(),
            bytes: content.len(),
            created,
        })
    }

    fn list(&self) -> Result<Vec<String>, FilesError> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(self.extension.as_str()) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete(&self, name: &str) -> Result<bool, FilesError> {
        validate_name(name)?;
        match std::fs::remove_file(self.memory_path(name)) {
            Ok(()) => {
                debug!("deleted memory file (name={})", name);
                Ok(true)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}
