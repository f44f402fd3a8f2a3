//! # Playback Configuration
//!
//! Default play mode and direction, read from the `[playback]` table of the
//! application config.

use serde::{Deserialize, Serialize};

use crate::playback::PlayMode;

/// How new playbacks start when the caller does not say otherwise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Play mode for new playbacks.
    pub mode: PlayMode,
    /// Play the sprite backwards.
    pub reverse: bool,
}

impl PlaybackConfig {
    /// Configuration for previewing a single pass.
    #[must_use]
    pub const fn preview() -> Self {
        Self {
            mode: PlayMode::PlayOnce,
            reverse: false,
        }
    }

    /// Returns the global direction: +1 or -1.
    #[inline]
    #[must_use]
    pub const fn forward(&self) -> i32 {
        if self.reverse {
            -1
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlaybackConfig::default();
        assert_eq!(config.mode, PlayMode::PlayInLoop);
        assert_eq!(config.forward(), 1);
    }

    #[test]
    fn test_reverse() {
        let config = PlaybackConfig {
            reverse: true,
            ..PlaybackConfig::preview()
        };
        assert_eq!(config.mode, PlayMode::PlayOnce);
        assert_eq!(config.forward(), -1);
    }
}
