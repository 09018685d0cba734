//! Error types for config loading and validation.

use thiserror::Error;

/// Errors returned while loading or validating config.
///
/// `layer` names the source the same way schema errors do, e.g.
/// `user(/home/me/.memvault/memvault.json5)` or `config` for raw contents.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config source could not be read.
    #[error("failed to read config {layer}: {source}")]
    ReadFailed {
        layer: String,
        #[source]
        source: std::io::Error,
    },
    /// A config source is not valid JSON5.
    #[error("failed to parse config {layer}: {source}")]
    ParseFailed {
        layer: String,
        #[source]
        source: json5::Error,
    },
    /// The merged JSON value did not decode into `VaultConfig`.
    #[error("failed to decode config: {0}")]
    DecodeFailed(#[from] serde_json::Error),
    /// A field failed the schema or value checks.
    #[error("invalid config at {path}: {message}")]
    InvalidField { path: String, message: String },
    /// Cross-field validation failure.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub(crate) fn read(layer: impl Into<String>, source: std::io::Error) -> Self {
        Self::ReadFailed {
            layer: layer.into(),
            source,
        }
    }

    pub(crate) fn parse(layer: impl Into<String>, source: json5::Error) -> Self {
        Self::ParseFailed {
            layer: layer.into(),
            source,
        }
    }
}
