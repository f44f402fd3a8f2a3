//! # Lock Configuration
//!
//! Timeouts and polling granularity for document locking. Loaded once at
//! startup from the `[lock]` table of the application config.

use serde::{Deserialize, Serialize};

/// Configuration for [`RwLock`](crate::RwLock) and its callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Longest single sleep between two acquisition attempts (ms).
    pub poll_interval_ms: u32,
    /// How long read-only views wait for a writer to finish (ms).
    pub read_timeout_ms: u32,
    /// How long mutation commands wait for readers to leave (ms).
    pub write_timeout_ms: u32,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            read_timeout_ms: 500,
            write_timeout_ms: 500,
        }
    }
}

impl LockConfig {
    /// Single-probe configuration: every acquisition either succeeds at once
    /// or fails.
    #[must_use]
    pub const fn non_blocking() -> Self {
        Self {
            poll_interval_ms: 100,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
        }
    }

    /// Configuration for background workers that should wait patiently
    /// instead of failing a pass.
    #[must_use]
    pub const fn background() -> Self {
        Self {
            poll_interval_ms: 50,
            read_timeout_ms: 5_000,
            write_timeout_ms: 5_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LockConfig::default();
        assert_eq!(config.poll_interval_ms, 100);
        assert_eq!(config.read_timeout_ms, 500);
        assert_eq!(config.write_timeout_ms, 500);
    }

    #[test]
    fn test_presets() {
        assert_eq!(LockConfig::non_blocking().write_timeout_ms, 0);
        assert!(LockConfig::background().read_timeout_ms > LockConfig::default().read_timeout_ms);
    }
}
