use memvault_files::{FilesError, MemoryFiles, MemoryLoad, SaveConfirmation, validate_name};
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// In-memory stand-in for the filesystem memory manager.
#[derive(Debug, Default)]
pub struct InMemoryFiles {
    entries: Mutex<BTreeMap<String, String>>,
}

impl InMemoryFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            entries: Mutex::new(entries.into_iter().collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl MemoryFiles for InMemoryFiles {
    fn load(&self, name: &str) -> Result<MemoryLoad, FilesError> {
        validate_name(name)?;
        Ok(match self.entries.lock().get(name) {
            Some(content) => MemoryLoad::Found {
                content: content.clone(),
            },
            None => MemoryLoad::not_found(name),
        })
    }

    fn save(&self, name: &str, content: &str) -> Result<SaveConfirmation, FilesError> {
        validate_name(name)?;
        let previous = self
            .entries
            .lock()
            .insert(name.to_string(), content.to_string());
        Ok(SaveConfirmation {
            name: name.to_string(),
            bytes: content.len(),
            created: previous.is_none(),
        })
    }

    fn list(&self) -> Result<Vec<String>, FilesError> {
        Ok(self.entries.lock().keys().cloned().collect())
    }

    fn delete(&self, name: &str) -> Result<bool, FilesError> {
        validate_name(name)?;
        Ok(self.entries.lock().remove(name).is_some())
    }
}
