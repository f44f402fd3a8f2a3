//! # Animation Tags
//!
//! A tag names a frame range and says how to play it: in which direction and
//! how many times. Tags are immutable values owned by the sprite; playback
//! refers to them by [`TagId`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DocError, DocResult};

/// Frame index within a sprite.
pub type Frame = i32;

/// Stable identity of a tag within its sprite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(pub u32);

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Direction in which a tag's frames are played.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AniDir {
    /// `from` to `to`.
    #[default]
    #[serde(rename = "forward")]
    Forward,
    /// `to` to `from`.
    #[serde(rename = "reverse")]
    Reverse,
    /// `from` to `to`, then back.
    #[serde(rename = "pingpong")]
    PingPong,
    /// `to` to `from`, then back.
    #[serde(rename = "pingpong_reverse")]
    PingPongReverse,
}

impl AniDir {
    /// Returns +1 if the first pass runs forward, -1 otherwise.
    #[inline]
    #[must_use]
    pub const fn sign(self) -> i32 {
        match self {
            Self::Forward | Self::PingPong => 1,
            Self::Reverse | Self::PingPongReverse => -1,
        }
    }

    /// Returns true for the two bouncing directions.
    #[inline]
    #[must_use]
    pub const fn is_ping_pong(self) -> bool {
        matches!(self, Self::PingPong | Self::PingPongReverse)
    }

    /// Returns the canonical name used in files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Reverse => "reverse",
            Self::PingPong => "pingpong",
            Self::PingPongReverse => "pingpong_reverse",
        }
    }
}

impl fmt::Display for AniDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AniDir {
    type Err = DocError;

    fn from_str(s: &str) -> DocResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "forward" => Ok(Self::Forward),
            "reverse" => Ok(Self::Reverse),
            "pingpong" | "ping_pong" => Ok(Self::PingPong),
            "pingpong_reverse" | "ping_pong_reverse" => Ok(Self::PingPongReverse),
            _ => Err(DocError::UnknownAniDir(s.to_owned())),
        }
    }
}

/// A named, directional, repeatable range of frames.
///
/// `repeat == 0` means "use the default": one pass for plain directions, two
/// passes (there and back) for ping-pong.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    id: TagId,
    name: String,
    from: Frame,
    to: Frame,
    #[serde(default)]
    ani_dir: AniDir,
    #[serde(default)]
    repeat: u32,
}

impl Tag {
    /// Creates a forward tag played with the default repeat count.
    ///
    /// # Errors
    ///
    /// Returns [`DocError::InvalidTagRange`] if `from > to` or `from < 0`.
    pub fn new(id: TagId, name: impl Into<String>, from: Frame, to: Frame) -> DocResult<Self> {
        let tag = Self {
            id,
            name: name.into(),
            from,
            to,
            ani_dir: AniDir::Forward,
            repeat: 0,
        };
        tag.validate()?;
        Ok(tag)
    }

    /// Sets the animation direction.
    #[must_use]
    pub fn with_ani_dir(mut self, ani_dir: AniDir) -> Self {
        self.ani_dir = ani_dir;
        self
    }

    /// Sets the number of passes (0 = default).
    #[must_use]
    pub fn with_repeat(mut self, repeat: u32) -> Self {
        self.repeat = repeat;
        self
    }

    /// Checks the frame range.
    ///
    /// # Errors
    ///
    /// Returns [`DocError::InvalidTagRange`] if `from > to` or `from < 0`.
    pub fn validate(&self) -> DocResult<()> {
        if self.from < 0 || self.from > self.to {
            return Err(DocError::InvalidTagRange {
                name: self.name.clone(),
                from: self.from,
                to: self.to,
            });
        }
        Ok(())
    }

    /// Returns the tag identity.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> TagId {
        self.id
    }

    /// Returns the tag name (diagnostics only).
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the first frame of the range.
    #[inline]
    #[must_use]
    pub const fn from_frame(&self) -> Frame {
        self.from
    }

    /// Returns the last frame of the range (inclusive).
    #[inline]
    #[must_use]
    pub const fn to_frame(&self) -> Frame {
        self.to
    }

    /// Returns the animation direction.
    #[inline]
    #[must_use]
    pub const fn ani_dir(&self) -> AniDir {
        self.ani_dir
    }

    /// Returns the raw repeat count (0 = default).
    #[inline]
    #[must_use]
    pub const fn repeat(&self) -> u32 {
        self.repeat
    }

    /// Returns the number of frames in the range.
    #[inline]
    #[must_use]
    pub const fn frames(&self) -> Frame {
        self.to - self.from + 1
    }

    /// Returns true if `frame` lies inside the range.
    #[inline]
    #[must_use]
    pub const fn contains(&self, frame: Frame) -> bool {
        self.from <= frame && frame <= self.to
    }
}
