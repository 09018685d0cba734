//! Configuration schema for memvault.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Journal modes accepted by `store.journal_mode`.
pub const JOURNAL_MODES: &[&str] = &["wal", "delete", "truncate", "memory"];

/// Root config for a vault.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct VaultConfig {
    #[serde(default, rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub files: FilesConfig,
}

impl VaultConfig {
    /// Database path, resolved against `base` when relative.
    pub fn resolve_store_path(&self, base: impl AsRef<Path>) -> PathBuf {
        resolve_path(base.as_ref(), &self.store.path)
    }

    /// Backup directory, resolved against `base` when relative.
    pub fn resolve_backup_dir(&self, base: impl AsRef<Path>) -> PathBuf {
        resolve_path(base.as_ref(), &self.backup.dir)
    }

    /// Memory file root, resolved against `base` when relative.
    pub fn resolve_files_root(&self, base: impl AsRef<Path>) -> PathBuf {
        resolve_path(base.as_ref(), &self.files.root)
    }
}

fn resolve_path(base: &Path, value: &str) -> PathBuf {
    let path = Path::new(value);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Document store settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
    /// Milliseconds a connection waits on a locked database.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default = "default_journal_mode")]
    pub journal_mode: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: default_journal_mode(),
        }
    }
}

fn default_store_path() -> String {
    ".memvault/memories.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_journal_mode() -> String {
    "wal".to_string()
}

/// Snapshot artifact settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackupConfig {
    #[serde(default = "default_backup_dir")]
    pub dir: String,
    /// Artifacts are named `<file_prefix>-<timestamp>.db`.
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            dir: default_backup_dir(),
            file_prefix: default_file_prefix(),
        }
    }
}

fn default_backup_dir() -> String {
    ".memvault/backups".to_string()
}

fn default_file_prefix() -> String {
    "memories-backup".to_string()
}

/// File-based memory manager settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilesConfig {
    #[serde(default = "default_files_root")]
    pub root: String,
    /// File extension without the leading dot.
    #[serde(default = "default_extension")]
    pub extension: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            root: default_files_root(),
            extension: default_extension(),
        }
    }
}

fn default_files_root() -> String {
    ".memvault/memory".to_string()
}

fn default_extension() -> String {
    "md".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn relative_paths_resolve_against_base() {
        let config = VaultConfig::default();
        assert_eq!(
            config.resolve_store_path("/work"),
            PathBuf::from("/work/.memvault/memories.db")
        );
        assert_eq!(
            config.resolve_files_root("/work"),
            PathBuf::from("/work/.memvault/memory")
        );
    }

    #[cfg(unix)]
    #[test]
    fn absolute_paths_are_kept() {
        let mut config = VaultConfig::default();
        config.backup.dir = "/var/backups/memvault".to_string();
        assert_eq!(
            config.resolve_backup_dir("/work"),
            PathBuf::from("/var/backups/memvault")
        );
    }
}
