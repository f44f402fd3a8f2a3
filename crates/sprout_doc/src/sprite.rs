//! # Sprite Timeline
//!
//! The slice of the document model that playback consumes: how many frames
//! there are and which tags cover them.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{DocError, DocResult};
use crate::tag::{Frame, Tag, TagId};

/// Frame count and tag list of an animation.
pub trait Timeline {
    /// Returns the number of frames (0 for an empty document).
    fn total_frames(&self) -> Frame;

    /// Returns the tags in document order.
    fn tags(&self) -> &[Tag];
}

/// Minimal sprite: a frame count plus its tags.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprite {
    total_frames: Frame,
    #[serde(default)]
    tags: Vec<Tag>,
}

impl Sprite {
    /// Creates a sprite without tags.
    #[must_use]
    pub fn new(total_frames: Frame) -> Self {
        Self {
            total_frames: total_frames.max(0),
            tags: Vec::new(),
        }
    }

    /// Adds a tag, builder style.
    ///
    /// # Errors
    ///
    /// See [`Sprite::add_tag`].
    pub fn with_tag(mut self, tag: Tag) -> DocResult<Self> {
        self.add_tag(tag)?;
        Ok(self)
    }

    /// Adds a tag at the end of the tag list.
    ///
    /// # Errors
    ///
    /// Returns an error if the range is invalid, reaches past the last frame,
    /// or the id is already taken.
    pub fn add_tag(&mut self, tag: Tag) -> DocResult<()> {
        self.check_tag(&tag)?;
        if self.tag(tag.id()).is_some() {
            return Err(DocError::DuplicateTagId(tag.id().0));
        }
        self.tags.push(tag);
        Ok(())
    }

    /// Removes a tag. Running playbacks must be told through
    /// `Playback::remove_references_to_tag`.
    pub fn remove_tag(&mut self, id: TagId) -> Option<Tag> {
        let index = self.tags.iter().position(|t| t.id() == id)?;
        Some(self.tags.remove(index))
    }

    /// Finds a tag by id.
    #[must_use]
    pub fn tag(&self, id: TagId) -> Option<&Tag> {
        self.tags.iter().find(|t| t.id() == id)
    }

    /// Finds the first tag with the given name.
    #[must_use]
    pub fn tag_by_name(&self, name: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.name() == name)
    }

    /// Checks every tag, e.g. after deserializing.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> DocResult<()> {
        let mut seen = HashSet::with_capacity(self.tags.len());
        for tag in &self.tags {
            self.check_tag(tag)?;
            if !seen.insert(tag.id()) {
                return Err(DocError::DuplicateTagId(tag.id().0));
            }
        }
        Ok(())
    }

    fn check_tag(&self, tag: &Tag) -> DocResult<()> {
        tag.validate()?;
        if tag.to_frame() >= self.total_frames {
            return Err(DocError::TagOutOfBounds {
                name: tag.name().to_owned(),
                to: tag.to_frame(),
                total_frames: self.total_frames,
            });
        }
        Ok(())
    }
}

impl Timeline for Sprite {
    fn total_frames(&self) -> Frame {
        self.total_frames
    }

    fn tags(&self) -> &[Tag] {
        &self.tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(id: u32, from: Frame, to: Frame) -> Tag {
        Tag::new(TagId(id), format!("tag{id}"), from, to).unwrap()
    }

    #[test]
    fn test_sprite_tags() {
        let mut sprite = Sprite::new(10);
        sprite.add_tag(tag(1, 0, 3)).unwrap();
        sprite.add_tag(tag(2, 4, 9)).unwrap();

        assert_eq!(sprite.total_frames(), 10);
        assert_eq!(sprite.tags().len(), 2);
        assert_eq!(sprite.tag_by_name("tag2").unwrap().id(), TagId(2));

        let removed = sprite.remove_tag(TagId(1)).unwrap();
        assert_eq!(removed.id(), TagId(1));
        assert!(sprite.tag(TagId(1)).is_none());
        assert!(sprite.remove_tag(TagId(1)).is_none());
    }

    #[test]
    fn test_tag_out_of_bounds() {
        let err = Sprite::new(4).with_tag(tag(1, 2, 4)).unwrap_err();
        assert_eq!(
            err,
            DocError::TagOutOfBounds {
                name: "tag1".into(),
                to: 4,
                total_frames: 4
            }
        );
    }

    #[test]
    fn test_duplicate_tag_id() {
        let err = Sprite::new(8)
            .with_tag(tag(1, 0, 1))
            .and_then(|s| s.with_tag(tag(1, 2, 3)))
            .unwrap_err();
        assert_eq!(err, DocError::DuplicateTagId(1));
    }

    #[test]
    fn test_validate() {
        let sprite = Sprite::new(8).with_tag(tag(1, 0, 7)).unwrap();
        assert!(sprite.validate().is_ok());
        assert!(Sprite::default().validate().is_ok());
    }
}
