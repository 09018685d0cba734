//! Public surface for memvault.
//!
//! This crate re-exports the component crates and provides `Vault`, the one
//! handle that wires the store, migration manager, and memory files from a
//! single config.

mod error;
mod vault;

/// Re-export for convenience.
pub use memvault_config as config;
/// Re-export for convenience.
pub use memvault_files as files;
/// Re-export for convenience.
pub use memvault_store as store;

/// Facade error type.
pub use error::VaultError;
/// Wired vault handle.
pub use vault::Vault;

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Binaries are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}
