//! Error type for the vault facade.

use memvault_config::ConfigError;
use memvault_files::FilesError;
use memvault_store::StoreError;

/// Errors surfaced by `Vault`.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// Configuration failed to load or validate.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Document store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Memory file failure.
    #[error(transparent)]
    Files(#[from] FilesError),
}
