//! Animation scheduler
//!
//! The single interpreter behind every section: it owns the node tree, the
//! viewport and the listener dispatcher, and keeps a per-section registry of
//! everything registered so that [`AnimationScheduler::teardown`] can stop
//! every timeline and detach every listener in one step.
//!
//! Nothing here runs on its own. Scroll, pointer and viewport changes are fed
//! in through the input methods and time only moves on
//! [`AnimationScheduler::advance`] (or [`AnimationScheduler::tick`] against
//! the wall clock).

use std::time::Instant;

use rustc_hash::FxHashSet;
use scrollwork_core::events::event_types::{
    POINTER_DOWN, POINTER_ENTER, POINTER_LEAVE, POINTER_MOVE, POINTER_UP, SCROLL,
};
use scrollwork_core::{
    Event, EventData, EventDispatcher, EventType, ListenerId, NodeId, NodeTree, Rect, Result,
    ScrollworkError,
};
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::easing::Easing;
use crate::keyframe::StyleProps;
use crate::pointer::{
    CursorFollower, CursorState, HoverBinder, ParallaxBinder, ParallaxTarget, PointerSample,
    Sensitivity,
};
use crate::scroll::{Scrub, ScrollTrigger, ToggleAction, TriggerDescriptor};
use crate::timeline::Timeline;
use crate::tween::{PlayState, Tween};

new_key_type! {
    pub struct SectionId;
    pub struct TimelineId;
    pub struct BinderId;
    pub struct FlagId;
}

/// Anything a section owns
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handle {
    Timeline(TimelineId),
    Binder(BinderId),
    Flag(FlagId),
}

impl From<TimelineId> for Handle {
    fn from(id: TimelineId) -> Self {
        Handle::Timeline(id)
    }
}

impl From<BinderId> for Handle {
    fn from(id: BinderId) -> Self {
        Handle::Binder(id)
    }
}

impl From<FlagId> for Handle {
    fn from(id: FlagId) -> Self {
        Handle::Flag(id)
    }
}

/// Options for [`AnimationScheduler::register_timeline`]
#[derive(Clone, Copy, Debug)]
pub struct TimelineOptions {
    pub duration_ms: u32,
    pub easing: Easing,
    /// Per-target start offset; target `k` starts at `k * stagger_ms`
    pub stagger_ms: u32,
    pub delay_ms: u32,
    /// Extra iterations (-1 for infinite)
    pub repeat: i32,
    pub yoyo: bool,
    /// Without a trigger the timeline plays as soon as it is registered
    pub trigger: Option<TriggerDescriptor>,
    /// Write the `from` state at registration instead of on the first tick
    pub immediate_render: bool,
}

impl TimelineOptions {
    pub fn new(duration_ms: u32) -> Self {
        Self {
            duration_ms,
            ..Self::default()
        }
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn stagger(mut self, stagger_ms: u32) -> Self {
        self.stagger_ms = stagger_ms;
        self
    }

    pub fn delay(mut self, delay_ms: u32) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn repeat(mut self, repeat: i32) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn yoyo(mut self, yoyo: bool) -> Self {
        self.yoyo = yoyo;
        self
    }

    pub fn trigger(mut self, trigger: TriggerDescriptor) -> Self {
        self.trigger = Some(trigger);
        self
    }

    pub fn immediate_render(mut self, immediate: bool) -> Self {
        self.immediate_render = immediate;
        self
    }
}

impl Default for TimelineOptions {
    fn default() -> Self {
        Self {
            duration_ms: 500,
            easing: Easing::EaseOutQuad,
            stagger_ms: 0,
            delay_ms: 0,
            repeat: 0,
            yoyo: false,
            trigger: None,
            immediate_render: true,
        }
    }
}

/// What a dispatcher entry routes to
#[derive(Clone, Copy, Debug)]
enum ListenerTag {
    Trigger(TimelineId),
    Flag(FlagId),
    PointerEnter(BinderId),
    PointerMove(BinderId),
    PointerLeave(BinderId),
    Cursor(BinderId, CursorInput),
}

/// Window-level input a cursor follower reacts to
#[derive(Clone, Copy, Debug)]
enum CursorInput {
    Move,
    Press(bool),
    Window(bool),
    /// An interactive node was entered or left
    Hover,
}

struct TimelineSlot {
    section: SectionId,
    timeline: Timeline,
    trigger: Option<ScrollTrigger>,
    listener: Option<ListenerId>,
}

enum BinderKind {
    Parallax(ParallaxBinder),
    Hover(HoverBinder),
    Cursor(CursorFollower, CursorState),
}

impl BinderKind {
    /// Nodes whose pointer enter and leave the binder listens to
    fn regions(&self) -> SmallVec<[NodeId; 4]> {
        match self {
            BinderKind::Parallax(binder) => SmallVec::from_slice(&[binder.region]),
            BinderKind::Hover(binder) => SmallVec::from_slice(&[binder.region]),
            BinderKind::Cursor(follower, _) => follower.interactive.clone(),
        }
    }
}

struct BinderSlot {
    section: SectionId,
    kind: BinderKind,
    listeners: SmallVec<[ListenerId; 2]>,
    /// In-flight tweens, at most one per node
    tweens: SmallVec<[(NodeId, Tween); 4]>,
}

struct FlagSlot {
    section: SectionId,
    threshold: f32,
    scrolled: bool,
    listener: ListenerId,
}

struct Section {
    name: String,
    timelines: Vec<TimelineId>,
    binders: Vec<BinderId>,
    flags: Vec<FlagId>,
}

/// The animation scheduler that owns every section's animations
pub struct AnimationScheduler {
    nodes: NodeTree,
    /// Receives scroll listeners; sized to the viewport
    document: NodeId,
    viewport_width: f32,
    viewport_height: f32,
    scroll_y: f32,
    listeners: EventDispatcher<ListenerTag>,
    sections: SlotMap<SectionId, Section>,
    timelines: SlotMap<TimelineId, TimelineSlot>,
    timeline_order: Vec<TimelineId>,
    binders: SlotMap<BinderId, BinderSlot>,
    binder_order: Vec<BinderId>,
    flags: SlotMap<FlagId, FlagSlot>,
    hovered: FxHashSet<NodeId>,
    pointer_in_window: bool,
    last_frame: Instant,
}

impl AnimationScheduler {
    pub fn new(viewport_width: f32, viewport_height: f32) -> Self {
        let mut nodes = NodeTree::new();
        let document = nodes.insert(Rect::new(0.0, 0.0, viewport_width, viewport_height));
        Self {
            nodes,
            document,
            viewport_width,
            viewport_height,
            scroll_y: 0.0,
            listeners: EventDispatcher::new(),
            sections: SlotMap::with_key(),
            timelines: SlotMap::with_key(),
            timeline_order: Vec::new(),
            binders: SlotMap::with_key(),
            binder_order: Vec::new(),
            flags: SlotMap::with_key(),
            hovered: FxHashSet::default(),
            pointer_in_window: false,
            last_frame: Instant::now(),
        }
    }

    // ========================================================================
    // Nodes and viewport
    // ========================================================================

    pub fn nodes(&self) -> &NodeTree {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut NodeTree {
        &mut self.nodes
    }

    /// The node standing in for the document (scroll listeners attach here)
    pub fn document(&self) -> NodeId {
        self.document
    }

    pub fn viewport(&self) -> (f32, f32) {
        (self.viewport_width, self.viewport_height)
    }

    pub fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    /// Move or resize a node; call [`Self::refresh`] once layout settles
    pub fn set_node_rect(&mut self, node: NodeId, rect: Rect) -> Result<()> {
        if self.nodes.set_rect(node, rect) {
            Ok(())
        } else {
            Err(ScrollworkError::MissingTarget(node))
        }
    }

    /// Resize the viewport and re-evaluate every trigger against it
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport_width = width;
        self.viewport_height = height;
        self.nodes
            .set_rect(self.document, Rect::new(0.0, 0.0, width, height));
        self.refresh();
    }

    /// Recompute trigger boundaries from current layout and apply any crossings
    pub fn refresh(&mut self) -> usize {
        let ids: SmallVec<[TimelineId; 16]> = self
            .timeline_order
            .iter()
            .copied()
            .filter(|id| self.timelines.get(*id).is_some_and(|s| s.trigger.is_some()))
            .collect();
        ids.into_iter().map(|id| self.evaluate_trigger(id)).sum()
    }

    // ========================================================================
    // Sections
    // ========================================================================

    /// Start a section registry
    ///
    /// Mounting a name that is already mounted tears the earlier instance
    /// down first, so a remount never leaves its predecessor running.
    pub fn mount_section(&mut self, name: impl Into<String>) -> SectionId {
        let name = name.into();
        if let Ok(previous) = self.find_section(&name) {
            tracing::debug!(section = %name, "remounting section, tearing down previous instance");
            self.teardown(previous);
        }
        tracing::debug!(section = %name, "mounting section");
        self.sections.insert(Section {
            name,
            timelines: Vec::new(),
            binders: Vec::new(),
            flags: Vec::new(),
        })
    }

    pub fn is_mounted(&self, section: SectionId) -> bool {
        self.sections.contains_key(section)
    }

    pub fn find_section(&self, name: &str) -> Result<SectionId> {
        self.sections
            .iter()
            .find(|(_, s)| s.name == name)
            .map(|(id, _)| id)
            .ok_or(ScrollworkError::UnknownSection)
    }

    pub fn section_name(&self, section: SectionId) -> Option<&str> {
        self.sections.get(section).map(|s| s.name.as_str())
    }

    /// Stop every timeline and detach every listener the section registered
    ///
    /// Returns `false` if the section was already torn down.
    pub fn teardown(&mut self, section: SectionId) -> bool {
        let Some(entry) = self.sections.remove(section) else {
            tracing::debug!(?section, "teardown of unmounted section ignored");
            return false;
        };

        let mut detached = 0;
        for id in &entry.timelines {
            detached += self.remove_timeline(*id);
        }
        for id in &entry.binders {
            detached += self.remove_binder(*id);
        }
        for id in &entry.flags {
            detached += self.remove_flag(*id);
        }

        tracing::debug!(
            section = %entry.name,
            timelines = entry.timelines.len(),
            binders = entry.binders.len(),
            flags = entry.flags.len(),
            listeners = detached,
            "section torn down"
        );
        true
    }

    /// Timelines and tweens of the section that will change on the next frame
    pub fn active_tween_count(&self, section: SectionId) -> usize {
        let timelines = self
            .timelines
            .values()
            .filter(|s| s.section == section)
            .filter(|s| {
                s.timeline.is_playing()
                    || s.trigger.as_ref().is_some_and(ScrollTrigger::is_catching_up)
            })
            .count();
        let tweens: usize = self
            .binders
            .values()
            .filter(|s| s.section == section)
            .map(|s| s.tweens.iter().filter(|(_, t)| t.is_active()).count())
            .sum();
        timelines + tweens
    }

    /// Listeners currently attached on behalf of the section
    pub fn listener_count(&self, section: SectionId) -> usize {
        let timelines = self
            .timelines
            .values()
            .filter(|s| s.section == section)
            .filter_map(|s| s.listener)
            .filter(|id| self.listeners.is_subscribed(*id))
            .count();
        let binders = self
            .binders
            .values()
            .filter(|s| s.section == section)
            .flat_map(|s| s.listeners.iter())
            .filter(|id| self.listeners.is_subscribed(**id))
            .count();
        let flags = self
            .flags
            .values()
            .filter(|s| s.section == section && self.listeners.is_subscribed(s.listener))
            .count();
        timelines + binders + flags
    }

    /// Listeners attached across all sections
    pub fn total_listener_count(&self) -> usize {
        self.listeners.listener_count()
    }

    pub fn timeline_count(&self, section: SectionId) -> usize {
        self.sections
            .get(section)
            .map(|s| s.timelines.len())
            .unwrap_or(0)
    }

    pub fn binder_count(&self, section: SectionId) -> usize {
        self.sections
            .get(section)
            .map(|s| s.binders.len())
            .unwrap_or(0)
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Animate `targets` from `from` to `to`
    ///
    /// Missing targets are skipped. Returns `None` (and registers nothing)
    /// when the section is not mounted, no target exists, or the trigger
    /// node is missing. Fields set in `to` but not in `from` start from each
    /// target's current style.
    pub fn register_timeline(
        &mut self,
        section: SectionId,
        targets: &[NodeId],
        from: StyleProps,
        to: StyleProps,
        options: TimelineOptions,
    ) -> Option<TimelineId> {
        if !self.check_section(section) {
            return None;
        }
        let present: SmallVec<[NodeId; 8]> = targets
            .iter()
            .copied()
            .filter(|node| self.check_target(*node))
            .collect();
        if present.is_empty() {
            tracing::debug!(?section, "no animation targets present, timeline skipped");
            return None;
        }

        let nodes = &self.nodes;
        let items = present.iter().map(|node| {
            let start = nodes
                .style(*node)
                .map(|style| to.capture(style).merge(&from))
                .unwrap_or(from);
            (*node, start)
        });
        let timeline = Timeline::staggered(
            items,
            to,
            options.duration_ms,
            options.easing,
            options.stagger_ms,
        )
        .delay(options.delay_ms)
        .repeat(options.repeat)
        .yoyo(options.yoyo);

        self.insert_timeline(
            section,
            timeline,
            options.trigger,
            options.immediate_render && !from.is_empty(),
        )
    }

    /// Register a prebuilt timeline (chained steps with positions)
    ///
    /// Entries whose target is missing are dropped. Fields an entry animates
    /// but does not set at its start begin where the target will be when the
    /// entry starts, and the first state of every remaining entry is rendered
    /// immediately.
    pub fn register_sequence(
        &mut self,
        section: SectionId,
        mut timeline: Timeline,
        trigger: Option<TriggerDescriptor>,
    ) -> Option<TimelineId> {
        if !self.check_section(section) {
            return None;
        }
        let nodes = &self.nodes;
        let dropped = timeline.retain_targets(|node| nodes.contains(node));
        if dropped > 0 {
            tracing::debug!(?section, dropped, "sequence steps with missing targets skipped");
        }
        if timeline.is_empty() {
            tracing::debug!(?section, "no sequence targets present, sequence skipped");
            return None;
        }
        timeline.fill_starts(|node| nodes.style(node).copied());
        self.insert_timeline(section, timeline, trigger, true)
    }

    fn insert_timeline(
        &mut self,
        section: SectionId,
        mut timeline: Timeline,
        trigger: Option<TriggerDescriptor>,
        immediate_render: bool,
    ) -> Option<TimelineId> {
        if let Some(descriptor) = &trigger {
            if !self.nodes.contains(descriptor.trigger) {
                tracing::debug!(trigger = ?descriptor.trigger, "trigger node missing, timeline skipped");
                return None;
            }
        }

        if immediate_render {
            write_samples(&mut self.nodes, &timeline);
        }
        if trigger.is_none() {
            timeline.play();
        }

        let id = self.timelines.insert(TimelineSlot {
            section,
            timeline,
            trigger: trigger.map(ScrollTrigger::new),
            listener: None,
        });
        if trigger.is_some() {
            let listener = self
                .listeners
                .subscribe(self.document, SCROLL, ListenerTag::Trigger(id));
            if let Some(slot) = self.timelines.get_mut(id) {
                slot.listener = Some(listener);
            }
        }

        self.timeline_order.push(id);
        if let Some(entry) = self.sections.get_mut(section) {
            entry.timelines.push(id);
        }
        if trigger.is_some() {
            self.evaluate_trigger(id);
        }
        Some(id)
    }

    /// Tilt and shift `targets` by the pointer's offset within `region`
    pub fn register_pointer_binder<I, T>(
        &mut self,
        section: SectionId,
        region: NodeId,
        targets: I,
        sensitivity: Sensitivity,
    ) -> Option<BinderId>
    where
        I: IntoIterator<Item = T>,
        T: Into<ParallaxTarget>,
    {
        self.register_parallax(section, ParallaxBinder::new(region, targets, sensitivity))
    }

    /// Register a fully configured parallax binder
    pub fn register_parallax(
        &mut self,
        section: SectionId,
        mut binder: ParallaxBinder,
    ) -> Option<BinderId> {
        if !self.check_section(section) || !self.check_target(binder.region) {
            return None;
        }
        let nodes = &self.nodes;
        binder.targets.retain(|t| {
            let present = nodes.contains(t.node);
            if !present {
                tracing::debug!(node = ?t.node, "skipping missing parallax target");
            }
            present
        });
        if binder.targets.is_empty() {
            tracing::debug!(?section, "no parallax targets present, binder skipped");
            return None;
        }

        let region = binder.region;
        let mut events: SmallVec<[EventType; 2]> = SmallVec::from_slice(&[POINTER_MOVE]);
        if binder.reset_on_leave {
            events.push(POINTER_LEAVE);
        }
        Some(self.insert_binder(section, region, BinderKind::Parallax(binder), &events))
    }

    /// Play a hover style on pointer enter and reverse it on leave
    pub fn register_hover(&mut self, section: SectionId, binder: HoverBinder) -> Option<BinderId> {
        if !self.check_section(section)
            || !self.check_target(binder.region)
            || !self.check_target(binder.target)
        {
            return None;
        }
        let region = binder.region;
        let id = self.insert_binder(
            section,
            region,
            BinderKind::Hover(binder),
            &[POINTER_ENTER, POINTER_LEAVE],
        );
        if let Some(slot) = self.binders.get_mut(id) {
            let tween = Tween::new(binder.rest, binder.hovered, binder.duration_ms, binder.easing);
            slot.tweens.push((binder.target, tween));
        }
        Some(id)
    }

    /// Move `follower.cursor` with the pointer anywhere in the window
    ///
    /// The cursor starts hidden and appears on the first pointer move.
    /// Missing interactive nodes are skipped.
    pub fn register_cursor(
        &mut self,
        section: SectionId,
        mut follower: CursorFollower,
    ) -> Option<BinderId> {
        if !self.check_section(section) || !self.check_target(follower.cursor) {
            return None;
        }
        let nodes = &self.nodes;
        follower.interactive.retain(|node| {
            let present = nodes.contains(*node);
            if !present {
                tracing::debug!(?node, "skipping missing interactive node");
            }
            present
        });

        let state = CursorState::default();
        let hidden = follower.appearance(&state);
        self.nodes
            .write_style(follower.cursor, |style| hidden.apply_to(style));

        let interactive = follower.interactive.clone();
        let document = self.document;
        let id = self.insert_binder(section, document, BinderKind::Cursor(follower, state), &[]);
        let mut subscriptions: SmallVec<[(NodeId, EventType, CursorInput); 8]> =
            SmallVec::from_slice(&[
                (document, POINTER_MOVE, CursorInput::Move),
                (document, POINTER_DOWN, CursorInput::Press(true)),
                (document, POINTER_UP, CursorInput::Press(false)),
                (document, POINTER_ENTER, CursorInput::Window(true)),
                (document, POINTER_LEAVE, CursorInput::Window(false)),
            ]);
        for node in interactive {
            subscriptions.push((node, POINTER_ENTER, CursorInput::Hover));
            subscriptions.push((node, POINTER_LEAVE, CursorInput::Hover));
        }
        let listeners: SmallVec<[ListenerId; 2]> = subscriptions
            .into_iter()
            .map(|(node, event_type, input)| {
                self.listeners
                    .subscribe(node, event_type, ListenerTag::Cursor(id, input))
            })
            .collect();
        if let Some(slot) = self.binders.get_mut(id) {
            slot.listeners = listeners;
        }
        Some(id)
    }

    fn insert_binder(
        &mut self,
        section: SectionId,
        region: NodeId,
        kind: BinderKind,
        events: &[EventType],
    ) -> BinderId {
        let id = self.binders.insert(BinderSlot {
            section,
            kind,
            listeners: SmallVec::new(),
            tweens: SmallVec::new(),
        });
        let listeners: SmallVec<[ListenerId; 2]> = events
            .iter()
            .map(|event_type| {
                let tag = match *event_type {
                    POINTER_ENTER => ListenerTag::PointerEnter(id),
                    POINTER_LEAVE => ListenerTag::PointerLeave(id),
                    _ => ListenerTag::PointerMove(id),
                };
                self.listeners.subscribe(region, *event_type, tag)
            })
            .collect();
        if let Some(slot) = self.binders.get_mut(id) {
            slot.listeners = listeners;
        }
        self.binder_order.push(id);
        if let Some(entry) = self.sections.get_mut(section) {
            entry.binders.push(id);
        }
        id
    }

    /// Track whether the page has scrolled past `threshold_px`
    pub fn watch_scroll_threshold(&mut self, section: SectionId, threshold_px: f32) -> Option<FlagId> {
        if !self.check_section(section) {
            return None;
        }
        let scrolled = self.scroll_y > threshold_px;
        let id = self.flags.insert(FlagSlot {
            section,
            threshold: threshold_px,
            scrolled,
            listener: ListenerId::default(),
        });
        let listener = self
            .listeners
            .subscribe(self.document, SCROLL, ListenerTag::Flag(id));
        if let Some(slot) = self.flags.get_mut(id) {
            slot.listener = listener;
        }
        if let Some(entry) = self.sections.get_mut(section) {
            entry.flags.push(id);
        }
        Some(id)
    }

    /// Current value of a scroll-threshold flag
    pub fn flag(&self, id: FlagId) -> Option<bool> {
        self.flags.get(id).map(|f| f.scrolled)
    }

    pub fn timeline(&self, id: TimelineId) -> Option<&Timeline> {
        self.timelines.get(id).map(|s| &s.timeline)
    }

    pub fn trigger(&self, id: TimelineId) -> Option<&ScrollTrigger> {
        self.timelines.get(id).and_then(|s| s.trigger.as_ref())
    }

    /// Detach a binder's listeners and drop its tweens
    ///
    /// Unbinding an unknown or already removed binder is a no-op returning
    /// `false`.
    pub fn unbind(&mut self, id: BinderId) -> bool {
        self.release(Handle::Binder(id))
    }

    /// Release a single handle before its section is torn down
    pub fn release(&mut self, handle: Handle) -> bool {
        let section = match handle {
            Handle::Timeline(id) => self.timelines.get(id).map(|s| s.section),
            Handle::Binder(id) => self.binders.get(id).map(|s| s.section),
            Handle::Flag(id) => self.flags.get(id).map(|s| s.section),
        };
        let Some(section) = section else {
            tracing::debug!(?handle, "release of unknown handle ignored");
            return false;
        };

        match handle {
            Handle::Timeline(id) => {
                self.remove_timeline(id);
                if let Some(entry) = self.sections.get_mut(section) {
                    entry.timelines.retain(|t| *t != id);
                }
            }
            Handle::Binder(id) => {
                self.remove_binder(id);
                if let Some(entry) = self.sections.get_mut(section) {
                    entry.binders.retain(|b| *b != id);
                }
            }
            Handle::Flag(id) => {
                self.remove_flag(id);
                if let Some(entry) = self.sections.get_mut(section) {
                    entry.flags.retain(|f| *f != id);
                }
            }
        }
        true
    }

    fn remove_timeline(&mut self, id: TimelineId) -> usize {
        self.timeline_order.retain(|t| *t != id);
        let Some(slot) = self.timelines.remove(id) else {
            return 0;
        };
        slot.listener
            .and_then(|listener| self.listeners.unsubscribe(listener))
            .map_or(0, |_| 1)
    }

    fn remove_binder(&mut self, id: BinderId) -> usize {
        self.binder_order.retain(|b| *b != id);
        let Some(slot) = self.binders.remove(id) else {
            return 0;
        };
        for region in slot.kind.regions() {
            if !self.binder_order.iter().any(|b| {
                self.binders
                    .get(*b)
                    .is_some_and(|s| s.kind.regions().contains(&region))
            }) {
                self.hovered.remove(&region);
            }
        }
        slot.listeners
            .into_iter()
            .filter_map(|listener| self.listeners.unsubscribe(listener))
            .count()
    }

    fn remove_flag(&mut self, id: FlagId) -> usize {
        let Some(slot) = self.flags.remove(id) else {
            return 0;
        };
        self.listeners.unsubscribe(slot.listener).map_or(0, |_| 1)
    }

    fn check_section(&self, section: SectionId) -> bool {
        let mounted = self.sections.contains_key(section);
        if !mounted {
            tracing::debug!(?section, "registration against unmounted section ignored");
        }
        mounted
    }

    fn check_target(&self, node: NodeId) -> bool {
        let present = self.nodes.contains(node);
        if !present {
            tracing::debug!(?node, "skipping missing animation target");
        }
        present
    }

    // ========================================================================
    // Input
    // ========================================================================

    /// Scroll the document; returns the number of style writes it caused
    pub fn scroll_to(&mut self, scroll_y: f32) -> usize {
        self.scroll_y = scroll_y;
        let event = Event::new(SCROLL, self.document, EventData::Scroll { offset_y: scroll_y });
        self.dispatch(event)
    }

    /// Pointer entered `region`
    pub fn pointer_enter(&mut self, region: NodeId) -> usize {
        self.hovered.insert(region);
        self.dispatch(Event::new(POINTER_ENTER, region, EventData::None))
    }

    /// Pointer moved inside `region` (document coordinates)
    pub fn pointer_move(&mut self, region: NodeId, x: f32, y: f32) -> usize {
        self.dispatch(Event::new(POINTER_MOVE, region, EventData::Pointer { x, y }))
    }

    /// Pointer left `region`
    pub fn pointer_leave(&mut self, region: NodeId) -> usize {
        self.hovered.remove(&region);
        self.dispatch(Event::new(POINTER_LEAVE, region, EventData::None))
    }

    /// Move the pointer to a document position
    ///
    /// Hit-tests every bound region and synthesizes enter, move and leave
    /// events for the regions whose hover state changed. The first move
    /// after [`Self::pointer_exit`] also enters the window.
    pub fn pointer_at(&mut self, x: f32, y: f32) -> usize {
        let mut writes = 0;
        if !self.pointer_in_window {
            self.pointer_in_window = true;
            writes += self.dispatch(Event::new(POINTER_ENTER, self.document, EventData::None));
        }
        for region in self.bound_regions() {
            let Some(rect) = self.nodes.rect(region) else {
                continue;
            };
            let inside = rect.contains(x, y);
            let was_inside = self.hovered.contains(&region);
            if inside && !was_inside {
                writes += self.pointer_enter(region);
            }
            if inside {
                writes += self.pointer_move(region, x, y);
            } else if was_inside {
                writes += self.pointer_leave(region);
            }
        }
        writes += self.dispatch(Event::new(
            POINTER_MOVE,
            self.document,
            EventData::Pointer { x, y },
        ));
        writes
    }

    /// Pointer left the window
    pub fn pointer_exit(&mut self) -> usize {
        let mut writes = 0;
        for region in self.bound_regions() {
            if self.hovered.contains(&region) {
                writes += self.pointer_leave(region);
            }
        }
        if self.pointer_in_window {
            self.pointer_in_window = false;
            writes += self.dispatch(Event::new(POINTER_LEAVE, self.document, EventData::None));
        }
        writes
    }

    /// A pointer button went down anywhere in the window
    pub fn pointer_down(&mut self) -> usize {
        self.dispatch(Event::new(POINTER_DOWN, self.document, EventData::None))
    }

    /// A pointer button was released
    pub fn pointer_up(&mut self) -> usize {
        self.dispatch(Event::new(POINTER_UP, self.document, EventData::None))
    }

    fn bound_regions(&self) -> SmallVec<[NodeId; 8]> {
        let mut regions: SmallVec<[NodeId; 8]> = SmallVec::new();
        for id in &self.binder_order {
            if let Some(slot) = self.binders.get(*id) {
                for region in slot.kind.regions() {
                    if !regions.contains(&region) {
                        regions.push(region);
                    }
                }
            }
        }
        regions
    }

    fn dispatch(&mut self, event: Event) -> usize {
        let mut writes = 0;
        for id in self.listeners.listener_ids(event.target, event.event_type) {
            if event.propagation_stopped {
                break;
            }
            let Some(tag) = self.listeners.handler(id).copied() else {
                continue;
            };
            writes += self.handle(tag, &event);
        }
        writes
    }

    fn handle(&mut self, tag: ListenerTag, event: &Event) -> usize {
        match tag {
            ListenerTag::Trigger(id) => self.evaluate_trigger(id),
            ListenerTag::Flag(id) => {
                if let Some(flag) = self.flags.get_mut(id) {
                    let scrolled = self.scroll_y > flag.threshold;
                    if scrolled != flag.scrolled {
                        tracing::debug!(threshold = flag.threshold, scrolled, "scroll flag changed");
                        flag.scrolled = scrolled;
                    }
                }
                0
            }
            ListenerTag::PointerMove(id) => match event.data {
                EventData::Pointer { x, y } => self.pointer_sample(id, x, y),
                _ => 0,
            },
            ListenerTag::PointerEnter(id) => self.hover(id, true),
            ListenerTag::PointerLeave(id) => self.hover(id, false),
            ListenerTag::Cursor(id, input) => self.cursor_input(id, input, event),
        }
    }

    /// Feed the trigger the current scroll position and apply its actions
    fn evaluate_trigger(&mut self, id: TimelineId) -> usize {
        let Some(slot) = self.timelines.get_mut(id) else {
            return 0;
        };
        let Some(trigger) = slot.trigger.as_mut() else {
            return 0;
        };
        let Some(rect) = self.nodes.rect(trigger.trigger_node()) else {
            tracing::debug!(node = ?trigger.trigger_node(), "trigger node removed, scroll ignored");
            return 0;
        };

        trigger.refresh(&rect, self.viewport_height);
        let events = trigger.update(self.scroll_y);

        let mut render = false;
        if trigger.is_scrubbed() {
            if trigger.descriptor().scrub == Scrub::Immediate {
                slot.timeline.seek(trigger.scrub_progress());
                render = true;
            }
        } else {
            let actions = trigger.descriptor().actions;
            for event in events {
                render |= apply_toggle(&mut slot.timeline, actions.action_for(event));
            }
        }

        if render {
            write_samples(&mut self.nodes, &slot.timeline)
        } else {
            0
        }
    }

    fn pointer_sample(&mut self, id: BinderId, x: f32, y: f32) -> usize {
        let Some(slot) = self.binders.get_mut(id) else {
            return 0;
        };
        let BinderKind::Parallax(binder) = &slot.kind else {
            return 0;
        };
        let Some(rect) = self.nodes.rect(binder.region) else {
            return 0;
        };
        let sample = PointerSample::from_point(&rect, x, y);
        retarget(&mut self.nodes, binder, &mut slot.tweens, sample)
    }

    fn hover(&mut self, id: BinderId, entering: bool) -> usize {
        let Some(slot) = self.binders.get_mut(id) else {
            return 0;
        };
        match &slot.kind {
            BinderKind::Hover(_) => {
                for (_, tween) in slot.tweens.iter_mut() {
                    if entering {
                        tween.play();
                    } else {
                        tween.reverse();
                    }
                }
                0
            }
            BinderKind::Parallax(binder) if !entering && binder.reset_on_leave => {
                retarget(&mut self.nodes, binder, &mut slot.tweens, PointerSample::CENTER)
            }
            BinderKind::Parallax(_) | BinderKind::Cursor(..) => 0,
        }
    }

    fn cursor_input(&mut self, id: BinderId, input: CursorInput, event: &Event) -> usize {
        let Some(slot) = self.binders.get_mut(id) else {
            return 0;
        };
        let BinderKind::Cursor(follower, state) = &mut slot.kind else {
            return 0;
        };
        let before = *state;
        match input {
            CursorInput::Move => {
                let EventData::Pointer { x, y } = event.data else {
                    return 0;
                };
                state.x = x;
                state.y = y - self.scroll_y;
                state.visible = true;
            }
            CursorInput::Press(pressed) => state.pressed = pressed,
            CursorInput::Window(inside) => state.visible = inside,
            CursorInput::Hover => {
                state.hovering = follower
                    .interactive
                    .iter()
                    .any(|node| self.hovered.contains(node));
            }
        }

        let mut writes = 0;
        let cursor = follower.cursor;
        if (state.x, state.y) != (before.x, before.y) {
            if let Some(rect) = self.nodes.rect(cursor) {
                let props = follower.position(&rect, state);
                if self.nodes.write_style(cursor, |style| props.apply_to(style)) {
                    writes += 1;
                }
            }
        }

        let appearance = follower.appearance(state);
        if appearance != follower.appearance(&before) {
            slot.tweens.retain(|(node, _)| *node != cursor);
            if follower.transition_ms == 0 {
                if self.nodes.write_style(cursor, |style| appearance.apply_to(style)) {
                    writes += 1;
                }
            } else if let Some(style) = self.nodes.style(cursor) {
                let mut tween =
                    Tween::to(style, appearance, follower.transition_ms, follower.easing);
                tween.play();
                slot.tweens.push((cursor, tween));
            }
        }
        writes
    }

    // ========================================================================
    // Time
    // ========================================================================

    /// Advance every animation by `dt_ms`, in registration order
    ///
    /// Returns the number of style writes.
    pub fn advance(&mut self, dt_ms: f32) -> usize {
        let mut writes = 0;

        for id in &self.timeline_order {
            let Some(slot) = self.timelines.get_mut(*id) else {
                continue;
            };
            let moved = match slot.trigger.as_mut() {
                Some(trigger) if trigger.is_scrubbed() => {
                    if trigger.advance_scrub(dt_ms) {
                        slot.timeline.seek(trigger.scrub_progress());
                        true
                    } else {
                        false
                    }
                }
                _ => slot.timeline.tick(dt_ms),
            };
            if moved {
                writes += write_samples(&mut self.nodes, &slot.timeline);
            }
        }

        for id in &self.binder_order {
            let Some(slot) = self.binders.get_mut(*id) else {
                continue;
            };
            for (node, tween) in slot.tweens.iter_mut() {
                if tween.tick(dt_ms) {
                    let props = tween.current();
                    if self.nodes.write_style(*node, |style| props.apply_to(style)) {
                        writes += 1;
                    }
                }
            }
            if matches!(slot.kind, BinderKind::Parallax(_) | BinderKind::Cursor(..)) {
                slot.tweens.retain(|(_, tween)| tween.is_active());
            }
        }

        if writes > 0 {
            tracing::trace!(dt_ms, writes, "frame advanced");
        }
        writes
    }

    /// Advance by the wall-clock time since the previous tick
    pub fn tick(&mut self) -> usize {
        let now = Instant::now();
        let dt_ms = (now - self.last_frame).as_secs_f32() * 1000.0;
        self.last_frame = now;
        self.advance(dt_ms)
    }

    /// Whether any section has something left to animate
    pub fn has_active_animations(&self) -> bool {
        self.sections
            .keys()
            .any(|section| self.active_tween_count(section) > 0)
    }
}

/// Start a catch-up tween from each target's current style toward the sample
fn retarget(
    nodes: &mut NodeTree,
    binder: &ParallaxBinder,
    tweens: &mut SmallVec<[(NodeId, Tween); 4]>,
    sample: PointerSample,
) -> usize {
    let mut writes = 0;
    for (node, props) in binder.sample_targets(sample) {
        let Some(style) = nodes.style(node) else {
            continue;
        };
        tweens.retain(|(n, _)| *n != node);
        if binder.smoothing_ms == 0 {
            if nodes.write_style(node, |style| props.apply_to(style)) {
                writes += 1;
            }
            continue;
        }
        let mut tween = Tween::to(style, props, binder.smoothing_ms, binder.easing);
        tween.play();
        tweens.push((node, tween));
    }
    writes
}

/// Apply a toggle action; returns `true` if the timeline jumped and its
/// state should be written right away
fn apply_toggle(timeline: &mut Timeline, action: ToggleAction) -> bool {
    match action {
        // Zero-length timelines (or ones already at the far end) finish
        // without a tick
        ToggleAction::Play => {
            timeline.play();
            return timeline.state() == PlayState::Finished;
        }
        ToggleAction::Reverse => {
            timeline.reverse();
            return timeline.state() == PlayState::Finished;
        }
        ToggleAction::Pause => timeline.pause(),
        ToggleAction::Resume => timeline.resume(),
        ToggleAction::Restart => {
            timeline.restart();
            return true;
        }
        ToggleAction::Reset => {
            timeline.reset();
            return true;
        }
        ToggleAction::Complete => {
            timeline.complete();
            return true;
        }
        ToggleAction::None => {}
    }
    false
}

fn write_samples(nodes: &mut NodeTree, timeline: &Timeline) -> usize {
    timeline
        .samples()
        .filter(|(node, props)| nodes.write_style(*node, |style| props.apply_to(style)))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler_with_node(top: f32) -> (AnimationScheduler, SectionId, NodeId) {
        let mut scheduler = AnimationScheduler::new(1280.0, 1000.0);
        let section = scheduler.mount_section("about");
        let node = scheduler
            .nodes_mut()
            .insert(Rect::new(0.0, top, 1280.0, 500.0));
        (scheduler, section, node)
    }

    #[test]
    fn test_untriggered_timeline_autoplays() {
        let (mut scheduler, section, node) = scheduler_with_node(0.0);
        let id = scheduler
            .register_timeline(
                section,
                &[node],
                StyleProps::opacity(0.0),
                StyleProps::opacity(0.8),
                TimelineOptions::new(2000).delay(500),
            )
            .unwrap();

        assert_eq!(scheduler.nodes().style(node).unwrap().opacity, 0.0);
        assert_eq!(scheduler.active_tween_count(section), 1);
        scheduler.advance(2500.0);
        assert_eq!(scheduler.timeline(id).unwrap().state(), PlayState::Finished);
        assert!((scheduler.nodes().style(node).unwrap().opacity - 0.8).abs() < 1e-6);
        assert_eq!(scheduler.active_tween_count(section), 0);
    }

    #[test]
    fn test_to_only_timeline_starts_from_current_style() {
        let (mut scheduler, section, node) = scheduler_with_node(0.0);
        scheduler
            .nodes_mut()
            .write_style(node, |s| s.translate_x = 40.0);
        scheduler.register_timeline(
            section,
            &[node],
            StyleProps::default(),
            StyleProps::translate(0.0, 0.0),
            TimelineOptions::new(100).easing(Easing::Linear),
        );
        assert_eq!(scheduler.nodes().style(node).unwrap().translate_x, 40.0);
        scheduler.advance(50.0);
        assert!((scheduler.nodes().style(node).unwrap().translate_x - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_unset_from_fields_animate_from_current_style() {
        let (mut scheduler, section, node) = scheduler_with_node(0.0);
        scheduler.register_timeline(
            section,
            &[node],
            StyleProps::opacity(0.0),
            StyleProps::opacity(1.0).with_translate(100.0, 0.0),
            TimelineOptions::new(1000).easing(Easing::Linear),
        );

        scheduler.advance(500.0);
        let style = scheduler.nodes().style(node).unwrap();
        assert!((style.opacity - 0.5).abs() < 1e-4);
        assert!((style.translate_x - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_zero_length_trigger_steps_to_and_back() {
        // Top at 2000 in a 1000px viewport: "top 80%" starts at scroll 1200
        let (mut scheduler, section, node) = scheduler_with_node(2000.0);
        let id = scheduler
            .register_timeline(
                section,
                &[node],
                StyleProps::opacity(0.0),
                StyleProps::opacity(1.0),
                TimelineOptions::new(0).trigger(TriggerDescriptor::new(node)),
            )
            .unwrap();
        let opacity = |s: &AnimationScheduler| s.nodes().style(node).unwrap().opacity;
        assert_eq!(opacity(&scheduler), 0.0);

        scheduler.scroll_to(1500.0);
        scheduler.advance(16.0);
        assert_eq!(opacity(&scheduler), 1.0);

        scheduler.scroll_to(1000.0);
        assert_eq!(opacity(&scheduler), 0.0);
        let timeline = scheduler.timeline(id).unwrap();
        assert_eq!(timeline.state(), PlayState::Finished);
        assert!(timeline.is_reversed());
    }

    #[test]
    fn test_missing_targets_are_skipped() {
        let (mut scheduler, section, node) = scheduler_with_node(0.0);
        let gone = scheduler.nodes_mut().insert(Rect::default());
        scheduler.nodes_mut().remove(gone);

        assert!(scheduler
            .register_timeline(
                section,
                &[gone],
                StyleProps::opacity(0.0),
                StyleProps::opacity(1.0),
                TimelineOptions::default(),
            )
            .is_none());

        let id = scheduler
            .register_timeline(
                section,
                &[gone, node],
                StyleProps::opacity(0.0),
                StyleProps::opacity(1.0),
                TimelineOptions::default(),
            )
            .unwrap();
        assert_eq!(scheduler.timeline(id).unwrap().len(), 1);

        let trigger = TriggerDescriptor::new(gone);
        assert!(scheduler
            .register_timeline(
                section,
                &[node],
                StyleProps::opacity(0.0),
                StyleProps::opacity(1.0),
                TimelineOptions::default().trigger(trigger),
            )
            .is_none());
        assert!(scheduler
            .register_pointer_binder(section, gone, [node], Sensitivity::tilt(20.0))
            .is_none());
        assert_eq!(scheduler.timeline_count(section), 1);
    }

    #[test]
    fn test_unbind_is_idempotent() {
        let (mut scheduler, section, node) = scheduler_with_node(0.0);
        let binder = scheduler
            .register_pointer_binder(section, node, [node], Sensitivity::tilt(20.0))
            .unwrap();
        assert_eq!(scheduler.listener_count(section), 1);

        assert!(scheduler.unbind(binder));
        assert!(!scheduler.unbind(binder));
        assert_eq!(scheduler.listener_count(section), 0);
        assert_eq!(scheduler.binder_count(section), 0);
        assert_eq!(scheduler.pointer_move(node, 10.0, 10.0), 0);
    }

    #[test]
    fn test_remount_replaces_previous_instance() {
        let (mut scheduler, first, node) = scheduler_with_node(2000.0);
        scheduler.register_timeline(
            first,
            &[node],
            StyleProps::opacity(0.0),
            StyleProps::opacity(1.0),
            TimelineOptions::default().trigger(TriggerDescriptor::new(node)),
        );
        assert_eq!(scheduler.total_listener_count(), 1);

        let second = scheduler.mount_section("about");
        assert!(!scheduler.is_mounted(first));
        assert!(scheduler.is_mounted(second));
        assert_eq!(scheduler.total_listener_count(), 0);
        assert_eq!(scheduler.find_section("about"), Ok(second));
        assert_eq!(
            scheduler.find_section("hero"),
            Err(ScrollworkError::UnknownSection)
        );
    }

    #[test]
    fn test_scroll_threshold_flag() {
        let mut scheduler = AnimationScheduler::new(1280.0, 800.0);
        let navbar = scheduler.mount_section("navbar");
        let flag = scheduler.watch_scroll_threshold(navbar, 20.0).unwrap();
        assert_eq!(scheduler.flag(flag), Some(false));

        scheduler.scroll_to(20.0);
        assert_eq!(scheduler.flag(flag), Some(false));
        scheduler.scroll_to(21.0);
        assert_eq!(scheduler.flag(flag), Some(true));
        scheduler.scroll_to(0.0);
        assert_eq!(scheduler.flag(flag), Some(false));

        assert!(scheduler.release(flag.into()));
        assert!(!scheduler.release(flag.into()));
        assert_eq!(scheduler.flag(flag), None);
        assert_eq!(scheduler.listener_count(navbar), 0);
    }

    #[test]
    fn test_hover_plays_and_reverses() {
        let (mut scheduler, section, card) = scheduler_with_node(0.0);
        let image = scheduler
            .nodes_mut()
            .insert_child(card, Rect::new(0.0, 0.0, 1280.0, 300.0))
            .unwrap();
        scheduler.register_hover(
            section,
            HoverBinder::new(card, StyleProps::scale(1.0), StyleProps::scale(1.1))
                .target(image)
                .duration(400),
        );

        scheduler.pointer_at(100.0, 100.0);
        assert_eq!(scheduler.active_tween_count(section), 1);
        scheduler.advance(400.0);
        assert!((scheduler.nodes().style(image).unwrap().scale - 1.1).abs() < 1e-6);

        scheduler.pointer_at(100.0, 900.0);
        scheduler.advance(400.0);
        assert!((scheduler.nodes().style(image).unwrap().scale - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cursor_fades_in_over_its_transition() {
        let (mut scheduler, section, _) = scheduler_with_node(0.0);
        let cursor = scheduler.nodes_mut().insert(Rect::new(0.0, 0.0, 24.0, 24.0));
        let gone = scheduler.nodes_mut().insert(Rect::default());
        scheduler.nodes_mut().remove(gone);
        let id = scheduler
            .register_cursor(
                section,
                CursorFollower::new(cursor, [gone])
                    .transition(200)
                    .easing(Easing::Linear),
            )
            .unwrap();
        assert_eq!(scheduler.listener_count(section), 5);

        scheduler.pointer_at(100.0, 100.0);
        assert_eq!(scheduler.nodes().style(cursor).unwrap().translate_x, 88.0);
        assert_eq!(scheduler.active_tween_count(section), 1);
        scheduler.advance(100.0);
        assert!((scheduler.nodes().style(cursor).unwrap().opacity - 0.5).abs() < 1e-4);
        scheduler.advance(100.0);
        assert_eq!(scheduler.nodes().style(cursor).unwrap().opacity, 1.0);
        assert_eq!(scheduler.active_tween_count(section), 0);

        assert!(scheduler.unbind(id));
        assert_eq!(scheduler.listener_count(section), 0);
    }

    #[test]
    fn test_set_node_rect_missing() {
        let (mut scheduler, _, node) = scheduler_with_node(0.0);
        assert!(scheduler.set_node_rect(node, Rect::default()).is_ok());
        scheduler.nodes_mut().remove(node);
        assert_eq!(
            scheduler.set_node_rect(node, Rect::default()),
            Err(ScrollworkError::MissingTarget(node))
        );
    }
}
