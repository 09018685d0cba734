//! One explicit handle wiring every component from a config.

use crate::error::VaultError;
use log::info;
use memvault_config::{ConfigError, VaultConfig};
use memvault_files::{FileMemoryManager, MemoryFiles};
use memvault_store::{
    JournalMode, MemoryStore, MigrationManager, ScopeRegistry, StoreOptions,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Store, memory files, and backup location for one vault.
///
/// Components borrow or clone the store handle held here; nothing is global.
#[derive(Clone)]
pub struct Vault {
    store: Arc<MemoryStore>,
    files: Arc<dyn MemoryFiles>,
    backup_dir: PathBuf,
    backup_prefix: String,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("store", &self.store)
            .field("backup_dir", &self.backup_dir)
            .field("backup_prefix", &self.backup_prefix)
            .finish_non_exhaustive()
    }
}

impl Vault {
    /// Open the store and memory files described by `config`.
    ///
    /// Relative paths in the config resolve against `base_dir`.
    pub fn open(config: &VaultConfig, base_dir: impl AsRef<Path>) -> Result<Self, VaultError> {
        config.validate()?;
        let base_dir = base_dir.as_ref();
        let journal_mode = config
            .store
            .journal_mode
            .parse::<JournalMode>()
            .map_err(ConfigError::Invalid)?;
        let options = StoreOptions {
            busy_timeout: Duration::from_millis(config.store.busy_timeout_ms),
            journal_mode,
        };
        let store = MemoryStore::open_with_options(config.resolve_store_path(base_dir), options)?;
        let files = FileMemoryManager::with_extension(
            config.resolve_files_root(base_dir),
            config.files.extension.clone(),
        )?;
        info!("opened vault (base_dir={})", base_dir.display());
        Ok(Self::from_parts(
            Arc::new(store),
            Arc::new(files),
            config.resolve_backup_dir(base_dir),
            config.backup.file_prefix.clone(),
        ))
    }

    /// Load the layered config for `cwd` and open the vault it describes.
    ///
    /// Paths resolve against the project root when one is found.
    pub fn open_layered(cwd: impl AsRef<Path>) -> Result<Self, VaultError> {
        let cwd = cwd.as_ref();
        let layered = VaultConfig::load_layered(cwd)?;
        let base_dir = layered
            .project_root
            .clone()
            .unwrap_or_else(|| cwd.to_path_buf());
        Self::open(&layered.config, base_dir)
    }

    /// Assemble a vault from already-built components.
    pub fn from_parts(
        store: Arc<MemoryStore>,
        files: Arc<dyn MemoryFiles>,
        backup_dir: impl Into<PathBuf>,
        backup_prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            files,
            backup_dir: backup_dir.into(),
            backup_prefix: backup_prefix.into(),
        }
    }

    /// Shared document store handle.
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    pub fn registry(&self) -> ScopeRegistry<'_> {
        ScopeRegistry::new(&self.store)
    }

    pub fn migration(&self) -> MigrationManager {
        MigrationManager::new(Arc::clone(&self.store))
    }

    /// Named memory documents.
    pub fn files(&self) -> &dyn MemoryFiles {
        self.files.as_ref()
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Snapshot the store into the configured backup directory.
    pub fn backup(&self) -> Result<PathBuf, VaultError> {
        let path = self
            .migration()
            .backup_to_dir(&self.backup_dir, &self.backup_prefix)?;
        Ok(path)
    }
}
