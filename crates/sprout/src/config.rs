//! # Application Config
//!
//! One TOML file, one table per subsystem. Missing tables and fields take
//! their defaults:
//!
//! ```toml
//! [lock]
//! poll_interval_ms = 100
//! read_timeout_ms = 500
//! write_timeout_ms = 500
//!
//! [playback]
//! mode = "play_in_loop"
//! reverse = false
//!
//! [backup]
//! enabled = true
//! period_ms = 1000
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use sprout_base::LockConfig;
use sprout_doc::PlaybackConfig;

use crate::backup::BackupConfig;
use crate::error::{ConfigError, ConfigResult};

/// Complete application config.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Document lock timeouts.
    pub lock: LockConfig,
    /// Defaults for new playbacks.
    pub playback: PlaybackConfig,
    /// Background backup worker.
    pub backup: BackupConfig,
}

impl Config {
    /// Parses and validates a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise see
    /// [`Config::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Loads a config file, falling back to the defaults on any error.
    #[must_use]
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::load(path).unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), error = %err, "using default config");
            Self::default()
        })
    }

    /// Serializes the config back to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the config cannot be represented.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string(self).map_err(|err| ConfigError::Invalid(err.to_string()))
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.lock.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "lock.poll_interval_ms must be greater than 0".into(),
            ));
        }
        if self.backup.period_ms == 0 {
            return Err(ConfigError::Invalid(
                "backup.period_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
