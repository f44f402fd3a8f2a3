//! # Sprout Doc
//!
//! The document model read by animation playback, and the playback itself.
//!
//! A [`Sprite`] is a frame count plus a list of [`Tag`]s. A [`Playback`]
//! walks it frame by frame, entering tags as the current frame reaches them
//! and honouring each tag's direction and repeat count.
//!
//! ## Example
//!
//! ```rust
//! use sprout_doc::{AniDir, PlayMode, Playback, Sprite, Tag, TagId};
//!
//! let walk = Tag::new(TagId(1), "walk", 1, 2)
//!     .unwrap()
//!     .with_ani_dir(AniDir::Reverse);
//! let sprite = Sprite::new(4).with_tag(walk).unwrap();
//!
//! let mut playback = Playback::new(Some(&sprite), 0, PlayMode::PlayAll, None, 1);
//! assert_eq!(playback.next_frame(1), 2); // entering "walk" jumps to its end
//! assert_eq!(playback.next_frame(1), 1);
//! assert_eq!(playback.next_frame(1), 3);
//! assert_eq!(playback.next_frame(1), 3);
//! assert!(playback.is_stopped());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod playback;
pub mod sprite;
pub mod tag;

pub use config::PlaybackConfig;
pub use error::{DocError, DocResult};
pub use playback::{PlayMode, Playback};
pub use sprite::{Sprite, Timeline};
pub use tag::{AniDir, Frame, Tag, TagId};
