//! Declarative page descriptors
//!
//! A page is described in TOML: the viewport, a flat list of named nodes with
//! document-space rectangles, and sections holding timelines, sequences,
//! parallax, hover and cursor binders and scroll flags. [`PageDescriptor::mount`]
//! interprets the whole description against an [`AnimationScheduler`].
//!
//! ```toml
//! [viewport]
//! width = 1280
//! height = 800
//!
//! [[nodes]]
//! name = "about"
//! rect = [0, 900, 1280, 900]
//!
//! [[nodes]]
//! name = "about-title"
//! parent = "about"
//! rect = [80, 980, 600, 80]
//!
//! [[sections]]
//! name = "about"
//!
//! [[sections.timelines]]
//! targets = ["about-title"]
//! preset = "fade-up"
//! duration_ms = 800
//! easing = "power3.out"
//! trigger = { node = "about", start = "top 80%" }
//! ```

use rustc_hash::FxHashMap;
use scrollwork_core::{NodeId, Rect, Result, ScrollworkError};
use serde::Deserialize;

use crate::easing::Easing;
use crate::keyframe::StyleProps;
use crate::pointer::{CursorFollower, HoverBinder, ParallaxBinder, ParallaxTarget, Sensitivity};
use crate::presets::AnimationPreset;
use crate::scheduler::{AnimationScheduler, FlagId, SectionId, TimelineOptions};
use crate::scroll::{Scrub, ScrollOffset, ToggleActions, TriggerDescriptor};
use crate::timeline::{Position, Timeline};

/// A whole page
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageDescriptor {
    #[serde(default)]
    pub viewport: ViewportDescriptor,
    #[serde(default)]
    pub nodes: Vec<NodeDescriptor>,
    #[serde(default)]
    pub sections: Vec<SectionDescriptor>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewportDescriptor {
    #[serde(default = "default_viewport_width")]
    pub width: f32,
    #[serde(default = "default_viewport_height")]
    pub height: f32,
    /// Initial scroll position
    #[serde(default)]
    pub scroll_y: f32,
}

impl Default for ViewportDescriptor {
    fn default() -> Self {
        Self {
            width: default_viewport_width(),
            height: default_viewport_height(),
            scroll_y: 0.0,
        }
    }
}

fn default_viewport_width() -> f32 {
    1280.0
}

fn default_viewport_height() -> f32 {
    800.0
}

/// A named node; `rect` is `[x, y, width, height]` in document space
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeDescriptor {
    pub name: String,
    pub rect: [f32; 4],
    /// Must name a node listed earlier
    #[serde(default)]
    pub parent: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionDescriptor {
    pub name: String,
    #[serde(default)]
    pub timelines: Vec<TimelineDescriptor>,
    #[serde(default)]
    pub sequences: Vec<SequenceDescriptor>,
    #[serde(default)]
    pub parallax: Vec<ParallaxDescriptor>,
    #[serde(default)]
    pub hover: Vec<HoverDescriptor>,
    #[serde(default)]
    pub cursor: Vec<CursorDescriptor>,
    #[serde(default)]
    pub flags: Vec<FlagDescriptor>,
}

/// A from/to animation over one or more targets
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimelineDescriptor {
    pub targets: Vec<String>,
    /// Named from/to pair; explicit `from`/`to` fields override it
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default)]
    pub from: Option<StyleProps>,
    #[serde(default)]
    pub to: Option<StyleProps>,
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u32,
    #[serde(default = "default_easing")]
    pub easing: Easing,
    #[serde(default)]
    pub stagger_ms: u32,
    #[serde(default)]
    pub delay_ms: u32,
    #[serde(default)]
    pub repeat: i32,
    #[serde(default)]
    pub yoyo: bool,
    #[serde(default)]
    pub trigger: Option<TriggerSpec>,
}

fn default_duration_ms() -> u32 {
    500
}

fn default_easing() -> Easing {
    Easing::EaseOutQuad
}

/// Scroll trigger settings, with the trigger node given by name
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TriggerSpec {
    pub node: String,
    #[serde(default)]
    pub start: Option<ScrollOffset>,
    #[serde(default)]
    pub end: Option<ScrollOffset>,
    /// Four toggle actions; overrides `reversible`
    #[serde(default)]
    pub actions: Option<ToggleActions>,
    #[serde(default = "default_true")]
    pub reversible: bool,
    #[serde(default)]
    pub scrub: ScrubSetting,
}

fn default_true() -> bool {
    true
}

/// `scrub = true` follows the scroll exactly, `scrub = 1.5` catches up over
/// 1.5 seconds
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScrubSetting {
    Enabled(bool),
    Seconds(f32),
}

impl Default for ScrubSetting {
    fn default() -> Self {
        ScrubSetting::Enabled(false)
    }
}

impl From<ScrubSetting> for Scrub {
    fn from(setting: ScrubSetting) -> Self {
        match setting {
            ScrubSetting::Enabled(false) => Scrub::Off,
            ScrubSetting::Enabled(true) => Scrub::Immediate,
            ScrubSetting::Seconds(secs) if secs <= 0.0 => Scrub::Immediate,
            ScrubSetting::Seconds(secs) => Scrub::Smoothed(secs * 1000.0),
        }
    }
}

/// Chained steps on one timeline
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SequenceDescriptor {
    /// Easing for steps that do not name their own
    #[serde(default = "default_easing")]
    pub easing: Easing,
    #[serde(default)]
    pub delay_ms: u32,
    #[serde(default)]
    pub repeat: i32,
    #[serde(default)]
    pub yoyo: bool,
    #[serde(default)]
    pub trigger: Option<TriggerSpec>,
    pub steps: Vec<StepDescriptor>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepDescriptor {
    pub target: String,
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default)]
    pub from: Option<StyleProps>,
    #[serde(default)]
    pub to: Option<StyleProps>,
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u32,
    #[serde(default)]
    pub easing: Option<Easing>,
    /// `">"`, `"<"`, `"-=0.4"`, `"1.2"`
    #[serde(default)]
    pub position: Position,
}

/// Pointer parallax over a region
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParallaxDescriptor {
    pub region: String,
    pub targets: Vec<String>,
    /// Per-target depth factors; missing entries default to 1
    #[serde(default)]
    pub factors: Vec<f32>,
    /// Shorthand for equal `rotate_x` and `rotate_y`
    #[serde(default)]
    pub tilt: Option<f32>,
    /// Shorthand for equal `translate_x` and `translate_y`
    #[serde(default)]
    pub shift: Option<f32>,
    #[serde(default)]
    pub rotate_x: Option<f32>,
    #[serde(default)]
    pub rotate_y: Option<f32>,
    #[serde(default)]
    pub translate_x: Option<f32>,
    #[serde(default)]
    pub translate_y: Option<f32>,
    #[serde(default = "default_smoothing_ms")]
    pub smoothing_ms: u32,
    #[serde(default = "default_pointer_easing")]
    pub easing: Easing,
    #[serde(default)]
    pub reset_on_leave: bool,
}

fn default_smoothing_ms() -> u32 {
    500
}

fn default_pointer_easing() -> Easing {
    Easing::EaseOutCubic
}

impl ParallaxDescriptor {
    fn sensitivity(&self) -> Sensitivity {
        let base = Sensitivity::default()
            .with_tilt(self.tilt.unwrap_or(0.0))
            .with_shift(self.shift.unwrap_or(0.0));
        Sensitivity {
            rotate_x: self.rotate_x.unwrap_or(base.rotate_x),
            rotate_y: self.rotate_y.unwrap_or(base.rotate_y),
            translate_x: self.translate_x.unwrap_or(base.translate_x),
            translate_y: self.translate_y.unwrap_or(base.translate_y),
        }
    }
}

/// Hover in/out over a region
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HoverDescriptor {
    pub region: String,
    /// Defaults to the region itself
    #[serde(default)]
    pub target: Option<String>,
    pub rest: StyleProps,
    pub hovered: StyleProps,
    #[serde(default = "default_hover_ms")]
    pub duration_ms: u32,
    #[serde(default = "default_pointer_easing")]
    pub easing: Easing,
}

fn default_hover_ms() -> u32 {
    400
}

/// A node that follows the pointer across the window
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CursorDescriptor {
    pub node: String,
    /// Nodes that expand the cursor while hovered
    #[serde(default)]
    pub interactive: Vec<String>,
    #[serde(default = "default_pressed_scale")]
    pub pressed_scale: f32,
    #[serde(default = "default_hover_scale")]
    pub hover_scale: f32,
    #[serde(default = "default_cursor_ms")]
    pub transition_ms: u32,
    #[serde(default = "default_easing")]
    pub easing: Easing,
}

fn default_pressed_scale() -> f32 {
    0.9
}

fn default_hover_scale() -> f32 {
    1.5
}

fn default_cursor_ms() -> u32 {
    200
}

/// A named "scrolled past N px" flag
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlagDescriptor {
    pub name: String,
    pub threshold_px: f32,
}

/// Resolve a from/to pair from a preset name and explicit overrides
fn resolve_props(
    preset: Option<&str>,
    from: Option<StyleProps>,
    to: Option<StyleProps>,
    context: &str,
) -> Result<(StyleProps, StyleProps)> {
    let (preset_from, preset_to) = match preset {
        Some(name) => AnimationPreset::named(name).ok_or_else(|| {
            ScrollworkError::Descriptor(format!("{context}: unknown preset {name:?}"))
        })?,
        None => (StyleProps::default(), StyleProps::default()),
    };
    let to = to.unwrap_or(preset_to);
    if to.is_empty() {
        return Err(ScrollworkError::Descriptor(format!(
            "{context}: needs `to` or a preset"
        )));
    }
    Ok((from.unwrap_or(preset_from), to))
}

impl PageDescriptor {
    pub fn from_toml(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| ScrollworkError::Descriptor(e.to_string()))
    }

    /// Build the node tree and register every section
    ///
    /// Names that do not resolve to a node follow the missing-target policy:
    /// the affected target (or the whole item, for a missing region or
    /// trigger) is skipped and the name is listed in
    /// [`MountedPage::missing`]. Structural problems such as duplicate node
    /// names or unknown presets are errors, and nothing is mounted.
    pub fn mount(&self, scheduler: &mut AnimationScheduler) -> Result<MountedPage> {
        self.validate()?;

        scheduler.set_viewport(self.viewport.width, self.viewport.height);
        let mut page = MountedPage::default();

        for node in &self.nodes {
            let [x, y, width, height] = node.rect;
            let rect = Rect::new(x, y, width, height);
            // Parents were checked by `validate`
            let parent = node.parent.as_deref().and_then(|parent| page.node(parent));
            let id = match parent {
                Some(parent_id) => scheduler
                    .nodes_mut()
                    .insert_child(parent_id, rect)
                    .ok_or(ScrollworkError::MissingTarget(parent_id))?,
                None => scheduler.nodes_mut().insert(rect),
            };
            page.insert_node(&node.name, id);
        }

        for section in &self.sections {
            let section_id = scheduler.mount_section(section.name.clone());
            page.sections.push((section.name.clone(), section_id));
            self.mount_section(scheduler, &mut page, section, section_id)?;
        }

        if self.viewport.scroll_y != 0.0 {
            scheduler.scroll_to(self.viewport.scroll_y);
        }

        tracing::debug!(
            nodes = page.nodes.len(),
            sections = page.sections.len(),
            timelines = page.timelines,
            binders = page.binders,
            missing = page.missing.len(),
            "page mounted"
        );
        Ok(page)
    }

    /// Reject descriptors that cannot be mounted as a whole
    fn validate(&self) -> Result<()> {
        let mut seen = FxHashMap::default();
        for (index, node) in self.nodes.iter().enumerate() {
            if let Some(parent) = &node.parent {
                if !seen.contains_key(parent.as_str()) {
                    return Err(ScrollworkError::Descriptor(format!(
                        "node {:?}: parent {parent:?} must be listed before it",
                        node.name
                    )));
                }
            }
            if seen.insert(node.name.as_str(), index).is_some() {
                return Err(ScrollworkError::Descriptor(format!(
                    "duplicate node name {:?}",
                    node.name
                )));
            }
        }
        for section in &self.sections {
            for (i, timeline) in section.timelines.iter().enumerate() {
                let context = format!("section {:?} timeline {i}", section.name);
                resolve_props(
                    timeline.preset.as_deref(),
                    timeline.from,
                    timeline.to,
                    &context,
                )?;
            }
            for (i, sequence) in section.sequences.iter().enumerate() {
                for (j, step) in sequence.steps.iter().enumerate() {
                    let context = format!("section {:?} sequence {i} step {j}", section.name);
                    resolve_props(step.preset.as_deref(), step.from, step.to, &context)?;
                }
            }
        }
        Ok(())
    }

    fn mount_section(
        &self,
        scheduler: &mut AnimationScheduler,
        page: &mut MountedPage,
        section: &SectionDescriptor,
        section_id: SectionId,
    ) -> Result<()> {
        for (i, timeline) in section.timelines.iter().enumerate() {
            let context = format!("section {:?} timeline {i}", section.name);
            let (from, to) =
                resolve_props(timeline.preset.as_deref(), timeline.from, timeline.to, &context)?;
            let targets = page.resolve_all(&timeline.targets);
            let mut options = TimelineOptions::new(timeline.duration_ms)
                .easing(timeline.easing)
                .stagger(timeline.stagger_ms)
                .delay(timeline.delay_ms)
                .repeat(timeline.repeat)
                .yoyo(timeline.yoyo);
            if let Some(spec) = &timeline.trigger {
                let Some(trigger) = page.trigger(spec) else {
                    continue;
                };
                options = options.trigger(trigger);
            }
            if scheduler
                .register_timeline(section_id, &targets, from, to, options)
                .is_some()
            {
                page.timelines += 1;
            }
        }

        for (i, sequence) in section.sequences.iter().enumerate() {
            let mut timeline = Timeline::new()
                .delay(sequence.delay_ms)
                .repeat(sequence.repeat)
                .yoyo(sequence.yoyo);
            for (j, step) in sequence.steps.iter().enumerate() {
                let context = format!("section {:?} sequence {i} step {j}", section.name);
                let (from, to) =
                    resolve_props(step.preset.as_deref(), step.from, step.to, &context)?;
                let Some(target) = page.resolve(&step.target) else {
                    continue;
                };
                timeline = timeline.from_to(
                    target,
                    from,
                    to,
                    step.duration_ms,
                    step.easing.unwrap_or(sequence.easing),
                    step.position,
                );
            }
            let trigger = match &sequence.trigger {
                Some(spec) => match page.trigger(spec) {
                    Some(trigger) => Some(trigger),
                    None => continue,
                },
                None => None,
            };
            if scheduler
                .register_sequence(section_id, timeline, trigger)
                .is_some()
            {
                page.timelines += 1;
            }
        }

        for parallax in &section.parallax {
            let Some(region) = page.resolve(&parallax.region) else {
                continue;
            };
            let targets: Vec<ParallaxTarget> = parallax
                .targets
                .iter()
                .enumerate()
                .filter_map(|(k, name)| {
                    let factor = parallax.factors.get(k).copied().unwrap_or(1.0);
                    page.resolve(name).map(|node| ParallaxTarget::new(node, factor))
                })
                .collect();
            let binder = ParallaxBinder::new(region, targets, parallax.sensitivity())
                .smoothing(parallax.smoothing_ms)
                .easing(parallax.easing)
                .reset_on_leave(parallax.reset_on_leave);
            if scheduler.register_parallax(section_id, binder).is_some() {
                page.binders += 1;
            }
        }

        for hover in &section.hover {
            let Some(region) = page.resolve(&hover.region) else {
                continue;
            };
            let target = match &hover.target {
                Some(name) => match page.resolve(name) {
                    Some(target) => target,
                    None => continue,
                },
                None => region,
            };
            let binder = HoverBinder::new(region, hover.rest, hover.hovered)
                .target(target)
                .duration(hover.duration_ms)
                .easing(hover.easing);
            if scheduler.register_hover(section_id, binder).is_some() {
                page.binders += 1;
            }
        }

        for cursor in &section.cursor {
            let Some(node) = page.resolve(&cursor.node) else {
                continue;
            };
            let interactive = page.resolve_all(&cursor.interactive);
            let follower = CursorFollower::new(node, interactive)
                .pressed_scale(cursor.pressed_scale)
                .hover_scale(cursor.hover_scale)
                .transition(cursor.transition_ms)
                .easing(cursor.easing);
            if scheduler.register_cursor(section_id, follower).is_some() {
                page.binders += 1;
            }
        }

        for flag in &section.flags {
            if let Some(id) = scheduler.watch_scroll_threshold(section_id, flag.threshold_px) {
                page.flags.push((flag.name.clone(), id));
            }
        }

        Ok(())
    }
}

/// Name lookups for everything a descriptor mounted
#[derive(Clone, Debug, Default)]
pub struct MountedPage {
    nodes: Vec<(String, NodeId)>,
    by_name: FxHashMap<String, NodeId>,
    sections: Vec<(String, SectionId)>,
    flags: Vec<(String, FlagId)>,
    /// Referenced names that matched no node, in first-seen order
    pub missing: Vec<String>,
    /// Timelines and sequences that registered
    pub timelines: usize,
    /// Parallax and hover binders that registered
    pub binders: usize,
}

impl MountedPage {
    fn insert_node(&mut self, name: &str, id: NodeId) {
        self.nodes.push((name.to_string(), id));
        self.by_name.insert(name.to_string(), id);
    }

    /// Look up a name, recording it as missing if it does not resolve
    fn resolve(&mut self, name: &str) -> Option<NodeId> {
        let found = self.node(name);
        if found.is_none() {
            tracing::debug!(name, "skipping unknown node name");
            if !self.missing.iter().any(|m| m == name) {
                self.missing.push(name.to_string());
            }
        }
        found
    }

    fn resolve_all(&mut self, names: &[String]) -> Vec<NodeId> {
        names.iter().filter_map(|name| self.resolve(name)).collect()
    }

    fn trigger(&mut self, spec: &TriggerSpec) -> Option<TriggerDescriptor> {
        let node = self.resolve(&spec.node)?;
        let mut trigger = TriggerDescriptor::new(node)
            .reversible(spec.reversible)
            .scrub(spec.scrub.into());
        if let Some(start) = spec.start {
            trigger = trigger.start(start);
        }
        if let Some(end) = spec.end {
            trigger = trigger.end(end);
        }
        if let Some(actions) = spec.actions {
            trigger = trigger.actions(actions);
        }
        Some(trigger)
    }

    pub fn node(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    pub fn section(&self, name: &str) -> Option<SectionId> {
        self.sections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
    }

    pub fn flag(&self, name: &str) -> Option<FlagId> {
        self.flags.iter().find(|(n, _)| n == name).map(|(_, id)| *id)
    }

    /// Nodes in descriptor order
    pub fn nodes(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.nodes.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// Sections in descriptor order
    pub fn sections(&self) -> impl Iterator<Item = (&str, SectionId)> {
        self.sections.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn flags(&self) -> impl Iterator<Item = (&str, FlagId)> {
        self.flags.iter().map(|(name, id)| (name.as_str(), *id))
    }
}
