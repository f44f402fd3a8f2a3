//! # Document Error Types
//!
//! All errors that can occur while building the document model. Playback
//! itself never fails.

use thiserror::Error;

use crate::tag::Frame;

/// Errors that can occur in the document model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocError {
    /// A tag whose first frame comes after its last frame.
    #[error("invalid tag range for '{name}': {from}..={to}")]
    InvalidTagRange {
        /// Tag name.
        name: String,
        /// First frame.
        from: Frame,
        /// Last frame.
        to: Frame,
    },

    /// A tag reaching past the end of the sprite.
    #[error("tag '{name}' ends at frame {to} but the sprite has {total_frames} frames")]
    TagOutOfBounds {
        /// Tag name.
        name: String,
        /// Last frame of the tag.
        to: Frame,
        /// Frames in the sprite.
        total_frames: Frame,
    },

    /// Two tags share the same identifier.
    #[error("duplicate tag id: {0}")]
    DuplicateTagId(u32),

    /// Unrecognized animation direction name.
    #[error("unknown animation direction: {0}")]
    UnknownAniDir(String),

    /// Unrecognized play mode name.
    #[error("unknown play mode: {0}")]
    UnknownPlayMode(String),
}

/// Result type for document operations.
pub type DocResult<T> = Result<T, DocError>;
