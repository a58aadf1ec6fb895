//! Timeline orchestration for multiple animations
//!
//! A timeline places per-target keyframe entries at offsets on one shared
//! playhead, so a staggered group or a chained sequence plays, reverses and
//! pauses as a single unit.

use std::str::FromStr;

use rustc_hash::FxHashMap;
use scrollwork_core::{NodeId, ScrollworkError, Style};
use serde::Deserialize;
use slotmap::{new_key_type, SlotMap};

use crate::easing::Easing;
use crate::keyframe::{Keyframes, StyleProps};
use crate::tween::{PlayState, Playhead};

new_key_type! {
    pub struct TimelineEntryId;
}

/// Where a new entry starts relative to what is already on the timeline
///
/// Parses from `">"` (after the last entry), `"<"` (with the previous
/// entry), `"-=0.4"` / `"+=0.2"` (seconds relative to the end of the last
/// entry) and `"1.5"` (absolute seconds).
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub enum Position {
    /// After the end of the last entry
    #[default]
    End,
    /// Same start as the previous entry
    WithPrevious,
    /// Offset in milliseconds from the end of the last entry
    Relative(f32),
    /// Absolute offset in milliseconds from the timeline start
    At(f32),
}

impl FromStr for Position {
    type Err = ScrollworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ScrollworkError::InvalidPosition(s.to_string());
        let secs = |v: &str| v.trim().parse::<f32>().map(|v| v * 1000.0).map_err(|_| err());

        match s {
            "" | ">" => Ok(Position::End),
            "<" => Ok(Position::WithPrevious),
            _ => {
                if let Some(rest) = s.strip_prefix("-=") {
                    Ok(Position::Relative(-secs(rest)?))
                } else if let Some(rest) = s.strip_prefix("+=") {
                    Ok(Position::Relative(secs(rest)?))
                } else {
                    let at = secs(s)?;
                    if at < 0.0 {
                        return Err(err());
                    }
                    Ok(Position::At(at))
                }
            }
        }
    }
}

impl TryFrom<String> for Position {
    type Error = ScrollworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// An entry in a timeline
#[derive(Clone, Debug)]
struct TimelineEntry {
    target: NodeId,
    /// Offset in milliseconds from timeline start
    offset_ms: f32,
    duration_ms: u32,
    keyframes: Keyframes,
}

impl TimelineEntry {
    fn end_ms(&self) -> f32 {
        self.offset_ms + self.duration_ms as f32
    }

    /// `reached_end` is set once the playhead has finished moving forward;
    /// zero-length entries sitting exactly at the playhead step on it alone.
    fn sample(&self, time_ms: f32, reached_end: bool) -> StyleProps {
        let local = if self.duration_ms == 0 {
            if time_ms > self.offset_ms || (reached_end && time_ms >= self.offset_ms) {
                1.0
            } else {
                0.0
            }
        } else {
            (time_ms - self.offset_ms) / self.duration_ms as f32
        };
        self.keyframes.sample(local)
    }
}

/// A timeline that orchestrates multiple animations
#[derive(Clone, Debug)]
pub struct Timeline {
    entries: SlotMap<TimelineEntryId, TimelineEntry>,
    order: Vec<TimelineEntryId>,
    playhead: Playhead,
}

impl Timeline {
    pub fn new() -> Self {
        Self {
            entries: SlotMap::with_key(),
            order: Vec::new(),
            playhead: Playhead::new(0),
        }
    }

    /// A group where item `k` starts at `k * stagger_ms`
    pub fn staggered<I>(items: I, to: StyleProps, duration_ms: u32, easing: Easing, stagger_ms: u32) -> Self
    where
        I: IntoIterator<Item = (NodeId, StyleProps)>,
    {
        let mut timeline = Self::new();
        for (k, (target, from)) in items.into_iter().enumerate() {
            timeline.add(
                target,
                Keyframes::from_to(from, to, easing),
                duration_ms,
                Position::At(k as f32 * stagger_ms as f32),
            );
        }
        timeline
    }

    /// Add a from/to step (builder pattern)
    pub fn from_to(
        mut self,
        target: NodeId,
        from: StyleProps,
        to: StyleProps,
        duration_ms: u32,
        easing: Easing,
        position: Position,
    ) -> Self {
        self.add(target, Keyframes::from_to(from, to, easing), duration_ms, position);
        self
    }

    /// Add an animation to the timeline at a given position
    pub fn add(
        &mut self,
        target: NodeId,
        keyframes: Keyframes,
        duration_ms: u32,
        position: Position,
    ) -> TimelineEntryId {
        let last = self.order.last().and_then(|id| self.entries.get(*id));
        let end = self.content_end_ms();
        let offset_ms = match position {
            Position::End => end,
            Position::WithPrevious => last.map(|e| e.offset_ms).unwrap_or(0.0),
            Position::Relative(delta) => end + delta,
            Position::At(at) => at,
        }
        .max(0.0);

        let id = self.entries.insert(TimelineEntry {
            target,
            offset_ms,
            duration_ms,
            keyframes,
        });
        self.order.push(id);
        self.sync_duration();
        id
    }

    /// Drop entries whose target fails `keep`; returns how many were dropped
    pub fn retain_targets<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(NodeId) -> bool,
    {
        let before = self.order.len();
        let entries = &mut self.entries;
        self.order.retain(|id| {
            let keep_it = entries.get(*id).map(|e| keep(e.target)).unwrap_or(false);
            if !keep_it {
                entries.remove(*id);
            }
            keep_it
        });
        self.sync_duration();
        before - self.order.len()
    }

    /// Fill each entry's unset start fields from where its target will be
    /// when the entry begins
    ///
    /// Entries are visited by start offset; a target animated twice picks up
    /// from the end of its earlier entry, otherwise from `current`.
    pub fn fill_starts<F>(&mut self, mut current: F)
    where
        F: FnMut(NodeId) -> Option<Style>,
    {
        let mut by_offset = self.order.clone();
        by_offset.sort_by(|a, b| {
            let offset = |id: &TimelineEntryId| self.entries.get(*id).map_or(0.0, |e| e.offset_ms);
            offset(a).total_cmp(&offset(b))
        });

        let mut running: FxHashMap<NodeId, Style> = FxHashMap::default();
        for id in by_offset {
            let Some(entry) = self.entries.get_mut(id) else {
                continue;
            };
            let style = match running.get(&entry.target) {
                Some(style) => *style,
                None => match current(entry.target) {
                    Some(style) => style,
                    None => continue,
                },
            };
            entry.keyframes.fill_start(&style);
            let mut end = style;
            if let Some(last) = entry.keyframes.last() {
                last.props.apply_to(&mut end);
            }
            running.insert(entry.target, end);
        }
    }

    fn content_end_ms(&self) -> f32 {
        self.entries
            .values()
            .map(TimelineEntry::end_ms)
            .fold(0.0, f32::max)
    }

    fn sync_duration(&mut self) {
        self.playhead.set_duration(self.content_end_ms().ceil() as u32);
    }

    /// Set delay before the first iteration (builder pattern)
    pub fn delay(mut self, delay_ms: u32) -> Self {
        self.playhead.set_delay(delay_ms);
        self
    }

    /// Set number of extra iterations, -1 for infinite (builder pattern)
    pub fn repeat(mut self, repeat: i32) -> Self {
        self.playhead.set_repeat(repeat);
        self
    }

    /// Alternate direction on every repeat (builder pattern)
    pub fn yoyo(mut self, yoyo: bool) -> Self {
        self.playhead.set_yoyo(yoyo);
        self
    }

    pub fn set_delay(&mut self, delay_ms: u32) {
        self.playhead.set_delay(delay_ms);
    }

    pub fn set_repeat(&mut self, repeat: i32) {
        self.playhead.set_repeat(repeat);
    }

    pub fn set_yoyo(&mut self, yoyo: bool) {
        self.playhead.set_yoyo(yoyo);
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Total duration of one iteration
    pub fn duration_ms(&self) -> u32 {
        self.playhead.duration_ms()
    }

    /// Start offsets of every entry, in insertion order
    pub fn offsets_ms(&self) -> Vec<f32> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(*id))
            .map(|e| e.offset_ms)
            .collect()
    }

    pub fn entry_offset_ms(&self, id: TimelineEntryId) -> Option<f32> {
        self.entries.get(id).map(|e| e.offset_ms)
    }

    /// Targets of every entry, in insertion order (may repeat)
    pub fn targets(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(*id))
            .map(|e| e.target)
    }

    pub fn play(&mut self) {
        self.playhead.play();
    }

    pub fn reverse(&mut self) {
        self.playhead.reverse();
    }

    pub fn pause(&mut self) {
        self.playhead.pause();
    }

    pub fn resume(&mut self) {
        self.playhead.resume();
    }

    pub fn restart(&mut self) {
        self.playhead.restart();
    }

    pub fn reset(&mut self) {
        self.playhead.reset();
    }

    pub fn complete(&mut self) {
        self.playhead.complete();
    }

    /// Jump to a progress (0.0 to 1.0) without changing play state
    pub fn seek(&mut self, progress: f32) {
        self.playhead.seek(progress);
    }

    pub fn state(&self) -> PlayState {
        self.playhead.state()
    }

    pub fn is_playing(&self) -> bool {
        self.playhead.is_playing()
    }

    pub fn is_reversed(&self) -> bool {
        self.playhead.is_reversed()
    }

    pub fn progress(&self) -> f32 {
        self.playhead.progress()
    }

    /// Advance the timeline; returns `true` if the playhead moved
    pub fn tick(&mut self, dt_ms: f32) -> bool {
        self.playhead.tick(dt_ms)
    }

    fn time_ms(&self) -> f32 {
        self.playhead.progress() * self.playhead.duration_ms() as f32
    }

    fn reached_end(&self) -> bool {
        self.playhead.progress() >= 1.0
    }

    /// Get the current value for an animation entry
    pub fn value(&self, id: TimelineEntryId) -> Option<StyleProps> {
        let entry = self.entries.get(id)?;
        Some(entry.sample(self.time_ms(), self.reached_end()))
    }

    /// Current properties for every entry, in insertion order
    pub fn samples(&self) -> impl Iterator<Item = (NodeId, StyleProps)> + '_ {
        let time = self.time_ms();
        let reached_end = self.reached_end();
        self.order
            .iter()
            .filter_map(|id| self.entries.get(*id))
            .map(move |e| (e.target, e.sample(time, reached_end)))
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}
