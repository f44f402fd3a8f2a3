//! # Animation Playback
//!
//! Frame-by-frame state machine deciding which frame comes next. It knows the
//! sprite's frame count and tags, and nothing about time: the caller ticks it
//! with [`Playback::next_frame`] whenever its timer fires.
//!
//! ## Stepping
//!
//! Each unit of the delta runs three phases:
//!
//! ```text
//! handle_exit_frame   on the last frame of the active tag's pass?
//!                     -> rewind / bounce / leave the tag
//!                     no tag active and on the sprite edge?
//!                     -> loop / stop according to the play mode
//! handle_move_frame   otherwise move one frame in the active direction
//! handle_enter_frame  push every unplayed tag covering the new frame
//!                     and jump to its first frame
//! ```
//!
//! ## Tag Stack
//!
//! Active tags form a stack, innermost last. A tag nested inside the active
//! one is a plain child. A tag that crosses the active one's range is a
//! *cascade*: it keeps an index link (`delayed_delete`) to the tag it crossed,
//! and when it runs out that tag's pass ends with it.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::PlaybackConfig;
use crate::error::{DocError, DocResult};
use crate::sprite::Timeline;
use crate::tag::{Frame, Tag, TagId};

/// Repeat count that never runs out.
const INFINITE: i32 = i32::MAX;

/// How the playback treats the sprite and its tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayMode {
    /// Play every frame once, entering tags on the way, then stop on the edge.
    PlayAll,
    /// Like `PlayAll`, but start over at the sprite edge.
    #[default]
    PlayInLoop,
    /// Ignore tags and wrap around the frame count.
    PlayWithoutTagsInLoop,
    /// Play the given tag (or the whole sprite) once, then return to the
    /// initial frame.
    PlayOnce,
    /// Nothing moves.
    Stopped,
}

impl PlayMode {
    /// Returns the canonical name used in files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PlayAll => "play_all",
            Self::PlayInLoop => "play_in_loop",
            Self::PlayWithoutTagsInLoop => "play_without_tags_in_loop",
            Self::PlayOnce => "play_once",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for PlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayMode {
    type Err = DocError;

    fn from_str(s: &str) -> DocResult<Self> {
        [
            Self::PlayAll,
            Self::PlayInLoop,
            Self::PlayWithoutTagsInLoop,
            Self::PlayOnce,
            Self::Stopped,
        ]
        .into_iter()
        .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
        .ok_or_else(|| DocError::UnknownPlayMode(s.to_owned()))
    }
}

/// A tag being played.
#[derive(Clone, Debug)]
struct PlayTag {
    tag: TagId,
    from: Frame,
    to: Frame,
    ping_pong: bool,
    /// Tag direction composed with the parent's: +1 or -1.
    forward: i32,
    /// Passes left, including the current one.
    repeat: i32,
    /// Stack index of the crossed tag whose pass ends together with this one.
    delayed_delete: Option<usize>,
    /// Tags whose played marker clears together with this one.
    remove_these: Vec<TagId>,
}

impl PlayTag {
    fn new(tag: &Tag, parent_forward: i32) -> Self {
        Self {
            tag: tag.id(),
            from: tag.from_frame(),
            to: tag.to_frame(),
            ping_pong: tag.ani_dir().is_ping_pong(),
            forward: tag.ani_dir().sign() * parent_forward,
            repeat: passes(tag),
            delayed_delete: None,
            remove_these: Vec::new(),
        }
    }

    #[inline]
    const fn contains(&self, frame: Frame) -> bool {
        self.from <= frame && frame <= self.to
    }

    #[inline]
    const fn contains_range(&self, from: Frame, to: Frame) -> bool {
        self.from <= from && to <= self.to
    }

    /// First frame of a pass moving in `dir`.
    #[inline]
    const fn pass_start(&self, dir: i32) -> Frame {
        if dir > 0 {
            self.from
        } else {
            self.to
        }
    }

    /// Last frame of a pass moving in `dir`.
    #[inline]
    const fn pass_end(&self, dir: i32) -> Frame {
        if dir > 0 {
            self.to
        } else {
            self.from
        }
    }
}

/// Number of passes a tag is played for.
///
/// A repeat of 0 means one pass for plain tags and two (there and back) for
/// ping-pong tags.
fn passes(tag: &Tag) -> i32 {
    match tag.repeat() {
        0 if tag.ani_dir().is_ping_pong() => 2,
        0 => 1,
        n => i32::try_from(n).unwrap_or(INFINITE),
    }
}

/// Copies the tags whose range fits inside the timeline.
///
/// A tag reaching past the last frame could never finish its pass.
fn playable_tags(timeline: &dyn Timeline) -> Vec<Tag> {
    let total_frames = timeline.total_frames();
    timeline
        .tags()
        .iter()
        .filter(|tag| {
            let fits = tag.validate().is_ok() && tag.to_frame() < total_frames;
            if !fits {
                tracing::warn!(
                    tag = %tag.id(),
                    from = tag.from_frame(),
                    to = tag.to_frame(),
                    total_frames,
                    "tag outside the timeline, ignored"
                );
            }
            fits
        })
        .cloned()
        .collect()
}

/// What finishing a pass did to the top tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pass {
    /// The frame was repositioned; no further move this step.
    Rewound,
    /// Direction inverted; the step still moves one frame.
    Bounced,
    /// No passes left.
    Exhausted,
}

/// The playback state machine.
///
/// ## Usage
///
/// ```rust
/// use sprout_doc::{AniDir, PlayMode, Playback, Sprite, Tag, TagId};
///
/// let tag = Tag::new(TagId(1), "bounce", 0, 2)
///     .unwrap()
///     .with_ani_dir(AniDir::PingPong);
/// let sprite = Sprite::new(5).with_tag(tag).unwrap();
///
/// let mut playback = Playback::new(Some(&sprite), 0, PlayMode::PlayInLoop, Some(TagId(1)), 1);
/// let frames: Vec<_> = (0..6).map(|_| playback.next_frame(1)).collect();
/// assert_eq!(frames, [1, 2, 1, 0, 1, 2]);
/// ```
#[derive(Clone, Debug)]
pub struct Playback {
    frame: Frame,
    initial_frame: Frame,
    mode: PlayMode,
    /// Global direction when no tag is active: +1 or -1.
    forward: i32,
    total_frames: Frame,
    /// Copy of the sprite's tag list.
    tags: Vec<Tag>,
    /// Active tags, innermost last.
    playing: Vec<PlayTag>,
    /// Tags already triggered in the current pass.
    played: HashSet<TagId>,
    /// Tag given at construction for `PlayOnce`/`PlayInLoop`.
    root_tag: Option<TagId>,
}

impl Playback {
    /// Creates a playback starting at `frame`.
    ///
    /// With `PlayOnce` or `PlayInLoop` and a `tag`, only that tag is played
    /// (forever in `PlayInLoop`). `forward` < 0 plays the sprite backwards.
    /// Without a timeline, or with an empty one, the playback starts stopped.
    #[must_use]
    pub fn new(
        timeline: Option<&dyn Timeline>,
        frame: Frame,
        mode: PlayMode,
        tag: Option<TagId>,
        forward: i32,
    ) -> Self {
        let mut playback = Self {
            frame,
            initial_frame: frame,
            mode,
            forward: if forward < 0 { -1 } else { 1 },
            total_frames: 0,
            tags: Vec::new(),
            playing: Vec::new(),
            played: HashSet::new(),
            root_tag: None,
        };

        let Some(timeline) = timeline.filter(|t| t.total_frames() > 0) else {
            tracing::debug!(frame, "playback without frames, stopped");
            playback.mode = PlayMode::Stopped;
            return playback;
        };

        playback.total_frames = timeline.total_frames();
        playback.tags = playable_tags(timeline);
        playback.frame = frame.clamp(0, playback.total_frames - 1);
        playback.initial_frame = playback.frame;

        tracing::trace!(
            %mode,
            frame = playback.frame,
            total_frames = playback.total_frames,
            tag = ?tag,
            "new playback"
        );

        match mode {
            PlayMode::Stopped | PlayMode::PlayWithoutTagsInLoop => {}
            PlayMode::PlayOnce | PlayMode::PlayInLoop if tag.is_some() => {
                let root = tag
                    .and_then(|id| playback.tags.iter().find(|t| t.id() == id))
                    .map(|t| PlayTag::new(t, playback.forward));
                if let Some(mut root) = root {
                    if mode == PlayMode::PlayInLoop {
                        root.repeat = INFINITE;
                    }
                    let rewind = !root.contains(playback.frame);
                    playback.root_tag = Some(root.tag);
                    playback.add_tag(root, rewind, 1);
                }
                playback.handle_enter_frame(1, true);
            }
            _ => playback.handle_enter_frame(1, true),
        }

        playback
    }

    /// Creates a playback using the configured mode and direction.
    #[must_use]
    pub fn from_config(
        timeline: Option<&dyn Timeline>,
        frame: Frame,
        tag: Option<TagId>,
        config: &PlaybackConfig,
    ) -> Self {
        Self::new(timeline, frame, config.mode, tag, config.forward())
    }

    /// Returns the current frame.
    #[inline]
    #[must_use]
    pub const fn frame(&self) -> Frame {
        self.frame
    }

    /// Returns the frame the playback started at.
    #[inline]
    #[must_use]
    pub const fn initial_frame(&self) -> Frame {
        self.initial_frame
    }

    /// Returns the current play mode.
    #[inline]
    #[must_use]
    pub const fn mode(&self) -> PlayMode {
        self.mode
    }

    /// Returns true once the playback reached its terminal state.
    #[inline]
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.mode == PlayMode::Stopped
    }

    /// Returns the global direction: +1 or -1.
    #[inline]
    #[must_use]
    pub const fn forward(&self) -> i32 {
        self.forward
    }

    /// Returns the number of frames being played.
    #[inline]
    #[must_use]
    pub const fn total_frames(&self) -> Frame {
        self.total_frames
    }

    /// Returns the tags this playback knows about.
    #[inline]
    #[must_use]
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Returns the innermost active tag.
    #[must_use]
    pub fn tag(&self) -> Option<&Tag> {
        let top = self.playing.last()?;
        self.tags.iter().find(|t| t.id() == top.tag)
    }

    /// Returns the active tags, innermost last.
    #[must_use]
    pub fn playing_tags(&self) -> Vec<TagId> {
        self.playing.iter().map(|p| p.tag).collect()
    }

    /// Returns true if `id` was already triggered in the current pass.
    #[must_use]
    pub fn was_played(&self, id: TagId) -> bool {
        self.played.contains(&id)
    }

    /// Advances `delta` frames (negative goes backwards) and returns the new
    /// current frame.
    pub fn next_frame(&mut self, delta: Frame) -> Frame {
        if self.mode == PlayMode::Stopped || delta == 0 {
            return self.frame;
        }

        if self.mode == PlayMode::PlayWithoutTagsInLoop {
            let moved = i64::from(self.frame) + i64::from(delta) * i64::from(self.forward);
            let wrapped = moved.rem_euclid(i64::from(self.total_frames));
            self.frame = Frame::try_from(wrapped).unwrap_or(0);
            return self.frame;
        }

        let step = delta.signum();
        for _ in 0..delta.unsigned_abs() {
            if !self.handle_exit_frame(step) {
                self.handle_move_frame(step);
            }
            if self.mode == PlayMode::Stopped {
                break;
            }
            self.handle_enter_frame(step, false);
        }

        tracing::trace!(frame = self.frame, mode = %self.mode, "next frame");
        self.frame
    }

    /// Stops the playback and returns to the initial frame.
    pub fn stop(&mut self) {
        tracing::debug!(initial_frame = self.initial_frame, "stop playback");
        self.mode = PlayMode::Stopped;
        self.frame = self.initial_frame;
        self.playing.clear();
        self.played.clear();
        self.root_tag = None;
    }

    /// Forgets a tag deleted from the document while playing.
    ///
    /// The tag leaves the tag list, the played set and the stack; cascade
    /// links that pointed at it are passed down to its own parent.
    pub fn remove_references_to_tag(&mut self, id: TagId) {
        tracing::debug!(tag = %id, "remove references to tag");

        self.tags.retain(|t| t.id() != id);
        self.played.remove(&id);
        if self.root_tag == Some(id) {
            self.root_tag = None;
        }

        let mut index = 0;
        while index < self.playing.len() {
            if self.playing[index].tag != id {
                index += 1;
                continue;
            }
            let removed = self.playing.remove(index);
            for entry in &mut self.playing[index..] {
                entry.delayed_delete = match entry.delayed_delete {
                    Some(link) if link == index => removed.delayed_delete,
                    Some(link) if link > index => Some(link - 1),
                    other => other,
                };
            }
        }

        for entry in &mut self.playing {
            entry.remove_these.retain(|t| *t != id);
        }
    }

    /// Repositions the frame if it is the last one of the active pass.
    /// Returns true if the frame was repositioned (no plain move needed).
    fn handle_exit_frame(&mut self, step: i32) -> bool {
        let Some(top) = self.playing.last() else {
            return self.handle_sprite_edge(step);
        };
        if self.frame != top.pass_end(top.forward * step) {
            return false;
        }
        self.end_pass(step)
    }

    fn handle_move_frame(&mut self, step: i32) {
        let forward = self.playing.last().map_or(self.forward, |p| p.forward);
        self.frame = (self.frame + step * forward).clamp(0, self.total_frames - 1);
    }

    /// Pushes every unplayed tag covering the current frame, outermost first.
    fn handle_enter_frame(&mut self, step: i32, first_time: bool) {
        if self.mode == PlayMode::PlayWithoutTagsInLoop {
            return;
        }

        // With a root tag, only tags nested in it may start.
        let bounds = self
            .root_tag
            .and_then(|id| self.playing.iter().find(|p| p.tag == id))
            .map(|root| (root.from, root.to));

        loop {
            let parent_forward = self.playing.last().map_or(self.forward, |p| p.forward);
            let frame = self.frame;
            let candidate = self
                .tags
                .iter()
                .filter(|t| !self.played.contains(&t.id()) && t.contains(frame))
                .filter(|t| {
                    bounds.map_or(true, |(from, to)| from <= t.from_frame() && t.to_frame() <= to)
                })
                .min_by_key(|t| Reverse(t.frames()))
                .map(|t| PlayTag::new(t, parent_forward));

            let Some(entry) = candidate else {
                break;
            };
            self.add_tag(entry, !first_time, step);
        }
    }

    fn add_tag(&mut self, mut entry: PlayTag, rewind: bool, step: i32) {
        if let Some(index) = self.playing.len().checked_sub(1) {
            let parent = &self.playing[index];
            if !parent.contains_range(entry.from, entry.to) {
                entry.delayed_delete = Some(index);
                entry.remove_these = std::iter::once(parent.tag)
                    .chain(parent.remove_these.iter().copied())
                    .collect();
            }
        }

        if rewind {
            self.frame = entry.pass_start(entry.forward * step);
        }

        tracing::trace!(
            tag = %entry.tag,
            forward = entry.forward,
            repeat = entry.repeat,
            cascade = entry.delayed_delete.is_some(),
            frame = self.frame,
            "enter tag"
        );

        self.played.insert(entry.tag);
        self.playing.push(entry);
    }

    /// Ends the top tag's pass: rewinds, bounces or leaves it.
    fn end_pass(&mut self, step: i32) -> bool {
        match self.complete_pass(step) {
            Pass::Rewound => true,
            Pass::Bounced => false,
            Pass::Exhausted => self.exit_tag(step),
        }
    }

    /// Counts one finished pass of the top tag.
    fn complete_pass(&mut self, step: i32) -> Pass {
        let Some(top) = self.playing.last_mut() else {
            return Pass::Exhausted;
        };
        if top.repeat != INFINITE {
            top.repeat -= 1;
        }
        if top.repeat <= 0 {
            return Pass::Exhausted;
        }

        let dir = top.forward * step;
        if top.ping_pong {
            self.frame = top.pass_end(dir);
            top.forward = -top.forward;
            tracing::trace!(tag = %top.tag, repeat = top.repeat, "bounce");
            // A one-frame tag has nowhere to bounce to.
            if top.from == top.to {
                Pass::Rewound
            } else {
                Pass::Bounced
            }
        } else {
            self.frame = top.pass_start(dir);
            tracing::trace!(tag = %top.tag, repeat = top.repeat, "rewind");
            Pass::Rewound
        }
    }

    /// Pops the exhausted top tag and decides where the frame goes next.
    fn exit_tag(&mut self, step: i32) -> bool {
        let Some(mut done) = self.playing.pop() else {
            return self.handle_sprite_edge(step);
        };
        tracing::trace!(tag = %done.tag, "exit tag");
        if self.stops_with(done.tag) {
            self.stop();
            return true;
        }

        // The tags this one crossed finish their pass together with it. The
        // frame then leaves the span of every tag that ran out.
        let (mut span_from, mut span_to) = (done.from, done.to);
        while done.delayed_delete.is_some() {
            debug_assert_eq!(done.delayed_delete, self.playing.len().checked_sub(1));
            match self.complete_pass(step) {
                Pass::Rewound => {
                    self.clear_played(&done);
                    return true;
                }
                Pass::Bounced => {
                    self.clear_played(&done);
                    return false;
                }
                Pass::Exhausted => {
                    let Some(crossed) = self.playing.pop() else {
                        break;
                    };
                    tracing::trace!(tag = %crossed.tag, "exit crossed tag");
                    if self.stops_with(crossed.tag) {
                        self.stop();
                        return true;
                    }
                    span_from = span_from.min(crossed.from);
                    span_to = span_to.max(crossed.to);
                    done.delayed_delete = crossed.delayed_delete;
                }
            }
        }
        self.clear_played(&done);

        let parent_forward = self.playing.last().map_or(self.forward, |p| p.forward);
        let dir = parent_forward * step;
        let next = if dir > 0 { span_to + 1 } else { span_from - 1 };

        let parent = self
            .playing
            .last()
            .map(|p| (p.contains(next), p.pass_end(dir)));
        match parent {
            Some((true, _)) => {
                self.frame = next;
                true
            }
            // The tag ended on its parent's boundary.
            Some((false, parent_end)) => {
                self.frame = parent_end;
                self.end_pass(step)
            }
            None if (0..self.total_frames).contains(&next) => {
                self.frame = next;
                true
            }
            None => self.leave_sprite(dir),
        }
    }

    /// Sprite-level edge handling when no tag is active.
    fn handle_sprite_edge(&mut self, step: i32) -> bool {
        let dir = self.forward * step;
        let at_edge = if dir > 0 {
            self.frame >= self.total_frames - 1
        } else {
            self.frame <= 0
        };
        at_edge && self.leave_sprite(dir)
    }

    /// Applies the play mode when moving past the sprite edge in `dir`.
    fn leave_sprite(&mut self, dir: i32) -> bool {
        match self.mode {
            PlayMode::PlayInLoop => {
                self.frame = if dir > 0 { 0 } else { self.total_frames - 1 };
                tracing::trace!(frame = self.frame, "loop");
            }
            PlayMode::PlayOnce => self.stop(),
            PlayMode::PlayAll => {
                tracing::debug!(frame = self.frame, "all frames played");
                self.mode = PlayMode::Stopped;
            }
            PlayMode::PlayWithoutTagsInLoop | PlayMode::Stopped => return false,
        }
        true
    }

    fn stops_with(&self, id: TagId) -> bool {
        self.mode == PlayMode::PlayOnce && self.root_tag == Some(id)
    }

    /// Clears the played markers of `entry` and of the crossed tags that are
    /// no longer active.
    fn clear_played(&mut self, entry: &PlayTag) {
        self.played.remove(&entry.tag);
        for id in &entry.remove_these {
            if !self.playing.iter().any(|p| p.tag == *id) {
                self.played.remove(id);
            }
        }
    }
}
