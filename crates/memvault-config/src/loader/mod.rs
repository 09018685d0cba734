//! Layered configuration loader.
//!
//! Discovers configuration layers (user, project, runtime), validates each
//! layer's schema, merges them over the built-in defaults, and produces a
//! final `VaultConfig`.

mod layer_io;
mod merge;
mod schema;
mod utils;


use crate::{ConfigError, JOURNAL_MODES, VaultConfig};
use log::{debug, info};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config filename in local layers.
const DEFAULT_CONFIG_FILE: &str = "memvault.json5";
/// Default config directory under user or project roots.
const DEFAULT_CONFIG_DIR: &str = ".memvault";
/// Marker files/dirs that identify a project root.
const DEFAULT_PROJECT_ROOT_MARKERS: &[&str] = &[".git"];

/// Effective config plus metadata about which layers were loaded.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// The merged, validated config.
    pub config: VaultConfig,
    /// Layers that contributed, lowest precedence first.
    pub layers: Vec<ConfigLayer>,
    /// Project root the project layer was looked up in, if any.
    pub project_root: Option<PathBuf>,
}

/// Origin for a single config layer in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    /// User-specific configuration.
    User,
    /// Project root configuration.
    Project,
    /// Runtime overrides (highest precedence).
    Runtime,
}

/// Metadata about a loaded config layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    pub source: ConfigLayerSource,
    pub path: PathBuf,
}

/// Options controlling layered config discovery and overrides.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Working directory used to find the project root.
    pub cwd: PathBuf,
    /// Optional user config path (defaults to `~/.memvault/memvault.json5`).
    pub user_config_path: Option<PathBuf>,
    /// Runtime override config paths applied last.
    pub runtime_paths: Vec<PathBuf>,
    /// Marker files/dirs used to detect the project root.
    pub project_root_markers: Vec<String>,
}

impl LayeredConfigOptions {
    /// Create options with default layer locations for the provided cwd.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            user_config_path: layer_io::default_user_config_path(),
            runtime_paths: Vec::new(),
            project_root_markers: DEFAULT_PROJECT_ROOT_MARKERS
                .iter()
                .map(|marker| marker.to_string())
                .collect(),
        }
    }

    /// Add a runtime override config path that is applied last.
    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }
}

impl VaultConfig {
    /// Load a single config from a path (no layering).
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("loading config from path: {}", path.display());
        let label = format!("config({})", path.display());
        let contents = fs::read_to_string(path).map_err(|err| ConfigError::read(&label, err))?;
        let value: Value =
            json5::from_str(&contents).map_err(|err| ConfigError::parse(&label, err))?;
        config_from_value(value, &label)
    }

    /// Load a single config from JSON5 contents (no layering).
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from raw contents (len={})", contents.len());
        let value: Value =
            json5::from_str(contents).map_err(|err| ConfigError::parse("config", err))?;
        config_from_value(value, "config")
    }

    /// Load a layered config stack using the default layer locations.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        info!(
            "loading layered config with defaults (cwd={})",
            cwd.as_ref().display()
        );
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Load a layered config stack using explicit layer locations.
    ///
    /// Layer precedence (low -> high): defaults, user, project, runtime.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let cwd = utils::normalize_path(&options.cwd)?;
        debug!("normalized cwd for config load: {}", cwd.display());
        let mut layers = Vec::new();
        let mut merge_layers = Vec::new();
        let mut seen_paths = HashSet::new();

        if let Some(path) = options.user_config_path.as_deref() {
            push_optional_layer(
                ConfigLayerSource::User,
                path,
                &mut layers,
                &mut merge_layers,
                &mut seen_paths,
            )?;
        }

        let project_root = utils::find_project_root(&cwd, &options.project_root_markers);
        match project_root.as_ref() {
            Some(root) => {
                debug!("resolved project root: {}", root.display());
                let path = root.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE);
                push_optional_layer(
                    ConfigLayerSource::Project,
                    &path,
                    &mut layers,
                    &mut merge_layers,
                    &mut seen_paths,
                )?;
            }
            None => debug!("project root not found; skipping project layer"),
        }

        for runtime_path in &options.runtime_paths {
            let value = layer_io::load_layer(ConfigLayerSource::Runtime, runtime_path)?;
            debug!("loaded runtime layer (path={})", runtime_path.display());
            layers.push(ConfigLayer {
                source: ConfigLayerSource::Runtime,
                path: runtime_path.clone(),
            });
            merge_layers.push(value);
        }

        let mut merged = serde_json::to_value(VaultConfig::default())?;
        for value in &merge_layers {
            merge::merge_json_values(&mut merged, value);
        }

        let config = config_from_value(merged, "effective")?;
        info!("layered config loaded (layers={})", layers.len());
        Ok(LayeredConfig {
            config,
            layers,
            project_root,
        })
    }

    /// Validate configuration invariants that cannot be expressed in serde.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mode = self.store.journal_mode.to_ascii_lowercase();
        if !JOURNAL_MODES.contains(&mode.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "store.journal_mode must be one of {}, got {:?}",
                JOURNAL_MODES.join("/"),
                self.store.journal_mode
            )));
        }
        let extension = self.files.extension.trim();
        if extension.is_empty() || extension.starts_with('.') {
            return Err(ConfigError::Invalid(
                "files.extension must be non-empty and without a leading dot".to_string(),
            ));
        }
        if self.backup.file_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "backup.file_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn config_from_value(value: Value, label: &str) -> Result<VaultConfig, ConfigError> {
    schema::validate_layer_schema(&value, label)?;
    let config: VaultConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}

fn push_optional_layer(
    source: ConfigLayerSource,
    path: &Path,
    layers: &mut Vec<ConfigLayer>,
    merge_layers: &mut Vec<Value>,
    seen_paths: &mut HashSet<PathBuf>,
) -> Result<(), ConfigError> {
    if !path.exists() {
        debug!(
            "skipping missing layer (source={:?}, path={})",
            source,
            path.display()
        );
        return Ok(());
    }
    if !seen_paths.insert(utils::unique_path(path)) {
        debug!(
            "skipping duplicate layer (source={:?}, path={})",
            source,
            path.display()
        );
        return Ok(());
    }
    let value = layer_io::load_layer(source, path)?;
    debug!(
        "loaded layer (source={:?}, path={})",
        source,
        path.display()
    );
    layers.push(ConfigLayer {
        source,
        path: path.to_path_buf(),
    });
    merge_layers.push(value);
    Ok(())
}
