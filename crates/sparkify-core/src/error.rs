//! Error types for configuration loading.

use std::path::PathBuf;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading or checking configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for the expected layout.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Path that was being parsed.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },

    /// A key required by the requested entry point is empty or absent.
    #[error("missing configuration key [{section}] {key}")]
    MissingKey {
        /// Section the key belongs to.
        section: &'static str,
        /// Name of the key.
        key: &'static str,
    },

    /// A key is present but holds an unusable value.
    #[error("invalid configuration value for [{section}] {key}: {message}")]
    InvalidValue {
        /// Section the key belongs to.
        section: &'static str,
        /// Name of the key.
        key: &'static str,
        /// Why the value was rejected.
        message: String,
    },
}
