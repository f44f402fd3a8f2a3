//! # Lock Error Types
//!
//! Errors surfaced by the scoped lock API. The raw API reports failure through
//! [`LockResult::Fail`](crate::LockResult::Fail) instead.

use thiserror::Error;

/// Errors that can occur while acquiring a scoped lock.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockError {
    /// A writer kept the lock for longer than the caller was willing to wait.
    #[error("cannot lock for reading: timed out after {timeout_ms} ms")]
    ReadTimeout {
        /// The timeout that elapsed.
        timeout_ms: u32,
    },

    /// Readers, another writer, or a weak lock kept the lock busy.
    #[error("cannot lock for writing: timed out after {timeout_ms} ms")]
    WriteTimeout {
        /// The timeout that elapsed.
        timeout_ms: u32,
    },

    /// Other readers were still present when the upgrade timed out.
    #[error("cannot upgrade read lock to write: timed out after {timeout_ms} ms")]
    UpgradeTimeout {
        /// The timeout that elapsed.
        timeout_ms: u32,
    },
}

impl LockError {
    /// Returns the timeout that elapsed before giving up.
    #[inline]
    #[must_use]
    pub const fn timeout_ms(&self) -> u32 {
        match *self {
            Self::ReadTimeout { timeout_ms }
            | Self::WriteTimeout { timeout_ms }
            | Self::UpgradeTimeout { timeout_ms } => timeout_ms,
        }
    }
}

/// Result type for scoped lock operations.
pub type SyncResult<T> = Result<T, LockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = LockError::WriteTimeout { timeout_ms: 250 };
        assert_eq!(
            err.to_string(),
            "cannot lock for writing: timed out after 250 ms"
        );
        assert_eq!(err.timeout_ms(), 250);
    }
}
