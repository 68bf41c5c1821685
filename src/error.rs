//! Errors of the configuration layer
//!
//! The registries themselves are total and never fail; only loading and
//! applying edge overrides can.

use thiserror::Error;

/// Errors that can occur while loading or applying edge overrides
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read overrides file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid overrides TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Unknown edge kind in overrides: {0}")]
    UnknownEdge(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
