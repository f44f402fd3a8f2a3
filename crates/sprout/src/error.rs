//! # Editor Core Error Types

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors loading or checking the application config.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config '{}': {source}", path.display())]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The file is not valid TOML or has fields of the wrong type.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The values parsed but make no sense.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors starting the backup worker.
#[derive(Error, Debug)]
pub enum BackupError {
    /// The OS refused to create the worker thread.
    #[error("failed to spawn backup thread: {0}")]
    Spawn(#[from] io::Error),

    /// Invalid backup configuration.
    #[error("invalid backup config: {0}")]
    InvalidConfig(String),
}

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for backup operations.
pub type BackupResult<T> = Result<T, BackupError>;
