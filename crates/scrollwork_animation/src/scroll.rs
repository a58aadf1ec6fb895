//! Scroll triggers
//!
//! A trigger watches one node's position relative to the viewport. Its start
//! and end offsets split the scroll range into three regions (before, active,
//! after) and only region *changes* produce events, so repeated scroll
//! events at the same position never fire twice.

use std::fmt;
use std::str::FromStr;

use scrollwork_core::{NodeId, Rect, ScrollworkError};
use serde::Deserialize;
use smallvec::SmallVec;

/// A point on an element or on the viewport
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Anchor {
    /// Fraction of the extent (`top` = 0, `center` = 0.5, `bottom` = 1, `N%`)
    Fraction(f32),
    /// Fixed distance from the top edge in pixels
    Pixels(f32),
}

impl Anchor {
    fn resolve(&self, extent: f32) -> f32 {
        match self {
            Anchor::Fraction(f) => f * extent,
            Anchor::Pixels(px) => *px,
        }
    }

    fn parse(token: &str) -> Option<Self> {
        match token {
            "top" => Some(Anchor::Fraction(0.0)),
            "center" => Some(Anchor::Fraction(0.5)),
            "bottom" => Some(Anchor::Fraction(1.0)),
            _ => {
                if let Some(pct) = token.strip_suffix('%') {
                    pct.parse::<f32>().ok().map(|p| Anchor::Fraction(p / 100.0))
                } else {
                    let px = token.strip_suffix("px").unwrap_or(token);
                    px.parse::<f32>().ok().map(Anchor::Pixels)
                }
            }
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anchor::Fraction(v) if *v == 0.0 => f.write_str("top"),
            Anchor::Fraction(v) if *v == 0.5 => f.write_str("center"),
            Anchor::Fraction(v) if *v == 1.0 => f.write_str("bottom"),
            Anchor::Fraction(v) => write!(f, "{}%", v * 100.0),
            Anchor::Pixels(px) => write!(f, "{px}px"),
        }
    }
}

/// Scroll position at which a trigger boundary sits
///
/// `"top 80%"` means "when the element's top reaches 80% of the way down the
/// viewport". `"+=300"` is 300px past the trigger's start (or past the top of
/// the document when used as a start).
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub enum ScrollOffset {
    Anchored { element: Anchor, viewport: Anchor },
    Relative(f32),
}

impl ScrollOffset {
    pub fn new(element: Anchor, viewport: Anchor) -> Self {
        ScrollOffset::Anchored { element, viewport }
    }

    /// Scroll position (viewport top in document space) at this boundary
    pub fn resolve(&self, rect: &Rect, viewport_height: f32, base: f32) -> f32 {
        match self {
            ScrollOffset::Anchored { element, viewport } => {
                rect.top() + element.resolve(rect.height) - viewport.resolve(viewport_height)
            }
            ScrollOffset::Relative(px) => base + px,
        }
    }
}

impl FromStr for ScrollOffset {
    type Err = ScrollworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ScrollworkError::InvalidOffset(s.to_string());
        let trimmed = s.trim();

        let relative = |rest: &str| {
            let rest = rest.trim();
            rest.strip_suffix("px")
                .unwrap_or(rest)
                .parse::<f32>()
                .map_err(|_| err())
        };
        if let Some(rest) = trimmed.strip_prefix("+=") {
            return relative(rest).map(ScrollOffset::Relative);
        }
        if let Some(rest) = trimmed.strip_prefix("-=") {
            return relative(rest).map(|px| ScrollOffset::Relative(-px));
        }

        let mut tokens = trimmed.split_whitespace();
        match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(element), Some(viewport), None) => {
                let element = Anchor::parse(element).ok_or_else(err)?;
                let viewport = Anchor::parse(viewport).ok_or_else(err)?;
                Ok(ScrollOffset::Anchored { element, viewport })
            }
            _ => Err(err()),
        }
    }
}

impl TryFrom<String> for ScrollOffset {
    type Error = ScrollworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ScrollOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrollOffset::Anchored { element, viewport } => write!(f, "{element} {viewport}"),
            ScrollOffset::Relative(px) if *px < 0.0 => write!(f, "-={}", -px),
            ScrollOffset::Relative(px) => write!(f, "+={px}"),
        }
    }
}

/// Boundary crossings reported by a trigger
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerEvent {
    /// Scrolling down past the start
    Enter,
    /// Scrolling down past the end
    Leave,
    /// Scrolling up past the end
    EnterBack,
    /// Scrolling up past the start
    LeaveBack,
}

/// What to do with a timeline on a boundary crossing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleAction {
    Play,
    Pause,
    Resume,
    Reverse,
    Restart,
    Reset,
    Complete,
    None,
}

impl FromStr for ToggleAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "play" => Ok(ToggleAction::Play),
            "pause" => Ok(ToggleAction::Pause),
            "resume" => Ok(ToggleAction::Resume),
            "reverse" => Ok(ToggleAction::Reverse),
            "restart" => Ok(ToggleAction::Restart),
            "reset" => Ok(ToggleAction::Reset),
            "complete" => Ok(ToggleAction::Complete),
            "none" => Ok(ToggleAction::None),
            _ => Err(()),
        }
    }
}

/// Actions for enter, leave, enter-back and leave-back, in that order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct ToggleActions {
    pub on_enter: ToggleAction,
    pub on_leave: ToggleAction,
    pub on_enter_back: ToggleAction,
    pub on_leave_back: ToggleAction,
}

impl ToggleActions {
    pub const fn new(
        on_enter: ToggleAction,
        on_leave: ToggleAction,
        on_enter_back: ToggleAction,
        on_leave_back: ToggleAction,
    ) -> Self {
        Self {
            on_enter,
            on_leave,
            on_enter_back,
            on_leave_back,
        }
    }

    /// `"play none none reverse"` when reversible, `"play none none none"` otherwise
    pub const fn reversible(reversible: bool) -> Self {
        let back = if reversible {
            ToggleAction::Reverse
        } else {
            ToggleAction::None
        };
        Self::new(ToggleAction::Play, ToggleAction::None, ToggleAction::None, back)
    }

    pub fn action_for(&self, event: TriggerEvent) -> ToggleAction {
        match event {
            TriggerEvent::Enter => self.on_enter,
            TriggerEvent::Leave => self.on_leave,
            TriggerEvent::EnterBack => self.on_enter_back,
            TriggerEvent::LeaveBack => self.on_leave_back,
        }
    }
}

impl Default for ToggleActions {
    fn default() -> Self {
        Self::reversible(true)
    }
}

impl FromStr for ToggleActions {
    type Err = ScrollworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let actions: SmallVec<[ToggleAction; 4]> = s
            .split_whitespace()
            .map(str::parse)
            .collect::<Result<_, _>>()
            .map_err(|_| ScrollworkError::InvalidToggleActions(s.to_string()))?;
        match actions.as_slice() {
            &[on_enter, on_leave, on_enter_back, on_leave_back] => {
                Ok(Self::new(on_enter, on_leave, on_enter_back, on_leave_back))
            }
            _ => Err(ScrollworkError::InvalidToggleActions(s.to_string())),
        }
    }
}

impl TryFrom<String> for ToggleActions {
    type Error = ScrollworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Scroll-linked progress instead of toggle actions
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Scrub {
    #[default]
    Off,
    /// Progress follows the scroll position exactly
    Immediate,
    /// Progress catches up with the scroll position over roughly this many ms
    Smoothed(f32),
}

/// Configuration for a scroll trigger
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerDescriptor {
    pub trigger: NodeId,
    pub start: ScrollOffset,
    /// Defaults to `"bottom top"` (element fully scrolled out above)
    pub end: Option<ScrollOffset>,
    pub actions: ToggleActions,
    pub scrub: Scrub,
}

impl TriggerDescriptor {
    /// Trigger at `"top 80%"` with `"play none none reverse"`
    pub fn new(trigger: NodeId) -> Self {
        Self {
            trigger,
            start: ScrollOffset::new(Anchor::Fraction(0.0), Anchor::Fraction(0.8)),
            end: None,
            actions: ToggleActions::default(),
            scrub: Scrub::Off,
        }
    }

    pub fn start(mut self, start: ScrollOffset) -> Self {
        self.start = start;
        self
    }

    pub fn end(mut self, end: ScrollOffset) -> Self {
        self.end = Some(end);
        self
    }

    pub fn actions(mut self, actions: ToggleActions) -> Self {
        self.actions = actions;
        self
    }

    pub fn reversible(mut self, reversible: bool) -> Self {
        self.actions = ToggleActions::reversible(reversible);
        self
    }

    pub fn scrub(mut self, scrub: Scrub) -> Self {
        self.scrub = scrub;
        self
    }
}

/// Which side of the trigger range the scroll position is on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerRegion {
    Before,
    Active,
    After,
}

const SCRUB_EPSILON: f32 = 1e-4;

/// Runtime state of one scroll trigger
#[derive(Clone, Debug)]
pub struct ScrollTrigger {
    descriptor: TriggerDescriptor,
    region: Option<TriggerRegion>,
    start_px: f32,
    end_px: f32,
    scrub_progress: f32,
    scrub_target: f32,
}

impl ScrollTrigger {
    pub fn new(descriptor: TriggerDescriptor) -> Self {
        Self {
            descriptor,
            region: None,
            start_px: 0.0,
            end_px: 0.0,
            scrub_progress: 0.0,
            scrub_target: 0.0,
        }
    }

    pub fn descriptor(&self) -> &TriggerDescriptor {
        &self.descriptor
    }

    pub fn trigger_node(&self) -> NodeId {
        self.descriptor.trigger
    }

    /// Recompute boundary positions from the trigger's layout
    pub fn refresh(&mut self, rect: &Rect, viewport_height: f32) {
        self.start_px = self.descriptor.start.resolve(rect, viewport_height, 0.0);
        let end = self
            .descriptor
            .end
            .unwrap_or(ScrollOffset::new(Anchor::Fraction(1.0), Anchor::Fraction(0.0)));
        self.end_px = end.resolve(rect, viewport_height, self.start_px).max(self.start_px);
    }

    pub fn start_px(&self) -> f32 {
        self.start_px
    }

    pub fn end_px(&self) -> f32 {
        self.end_px
    }

    pub fn region(&self) -> Option<TriggerRegion> {
        self.region
    }

    fn region_at(&self, scroll_y: f32) -> TriggerRegion {
        if scroll_y < self.start_px {
            TriggerRegion::Before
        } else if scroll_y < self.end_px {
            TriggerRegion::Active
        } else {
            TriggerRegion::After
        }
    }

    /// Progress through the trigger range at a scroll position (0.0 to 1.0)
    pub fn progress_at(&self, scroll_y: f32) -> f32 {
        let span = self.end_px - self.start_px;
        if span <= 0.0 {
            return if scroll_y >= self.start_px { 1.0 } else { 0.0 };
        }
        ((scroll_y - self.start_px) / span).clamp(0.0, 1.0)
    }

    /// Feed a scroll position; returns the boundary crossings it caused
    ///
    /// The first update after creation reports how the trigger was reached
    /// from the top of the page: nothing when still before the start,
    /// `Enter` when inside, `Enter` then `Leave` when already past the end.
    pub fn update(&mut self, scroll_y: f32) -> SmallVec<[TriggerEvent; 2]> {
        use TriggerEvent::*;
        use TriggerRegion::*;

        if self.descriptor.scrub != Scrub::Off {
            self.scrub_target = self.progress_at(scroll_y);
            if self.descriptor.scrub == Scrub::Immediate {
                self.scrub_progress = self.scrub_target;
            }
        }

        let next = self.region_at(scroll_y);
        let prev = self.region.unwrap_or(Before);
        self.region = Some(next);

        let mut events = SmallVec::new();
        match (prev, next) {
            (Before, Active) => events.push(Enter),
            (Before, After) => events.extend([Enter, Leave]),
            (Active, After) => events.push(Leave),
            (After, Active) => events.push(EnterBack),
            (After, Before) => events.extend([EnterBack, LeaveBack]),
            (Active, Before) => events.push(LeaveBack),
            _ => {}
        }
        if !events.is_empty() {
            tracing::trace!(
                trigger = ?self.descriptor.trigger,
                scroll_y,
                ?events,
                "scroll trigger crossed boundary"
            );
        }
        events
    }

    pub fn is_scrubbed(&self) -> bool {
        self.descriptor.scrub != Scrub::Off
    }

    /// Whether smoothed scrubbing still has distance to cover
    pub fn is_catching_up(&self) -> bool {
        matches!(self.descriptor.scrub, Scrub::Smoothed(_))
            && (self.scrub_target - self.scrub_progress).abs() > SCRUB_EPSILON
    }

    pub fn scrub_progress(&self) -> f32 {
        self.scrub_progress
    }

    /// Move smoothed scrub progress toward its target
    ///
    /// Returns `true` if progress changed.
    pub fn advance_scrub(&mut self, dt_ms: f32) -> bool {
        let Scrub::Smoothed(window_ms) = self.descriptor.scrub else {
            return false;
        };
        if !self.is_catching_up() || dt_ms <= 0.0 {
            return false;
        }
        let factor = if window_ms <= 0.0 {
            1.0
        } else {
            (dt_ms / window_ms).min(1.0)
        };
        self.scrub_progress += (self.scrub_target - self.scrub_progress) * factor;
        if (self.scrub_target - self.scrub_progress).abs() <= SCRUB_EPSILON {
            self.scrub_progress = self.scrub_target;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrollwork_core::NodeTree;

    const VIEWPORT: f32 = 1000.0;

    fn trigger_at(top: f32, height: f32) -> (ScrollTrigger, Rect) {
        let mut tree = NodeTree::new();
        let rect = Rect::new(0.0, top, 800.0, height);
        let node = tree.insert(rect);
        let mut trigger = ScrollTrigger::new(TriggerDescriptor::new(node));
        trigger.refresh(&rect, VIEWPORT);
        (trigger, rect)
    }

    /// Scroll position that puts the element's top at `fraction` of the viewport
    fn scroll_for_top_at(rect: &Rect, fraction: f32) -> f32 {
        rect.top() - fraction * VIEWPORT
    }

    #[test]
    fn test_parse_offsets() {
        assert_eq!(
            "top 80%".parse::<ScrollOffset>().unwrap(),
            ScrollOffset::new(Anchor::Fraction(0.0), Anchor::Fraction(0.8))
        );
        assert_eq!(
            "center 120px".parse::<ScrollOffset>().unwrap(),
            ScrollOffset::new(Anchor::Fraction(0.5), Anchor::Pixels(120.0))
        );
        assert_eq!("+=300".parse::<ScrollOffset>().unwrap(), ScrollOffset::Relative(300.0));
        assert!(matches!(
            "top".parse::<ScrollOffset>(),
            Err(ScrollworkError::InvalidOffset(_))
        ));
        assert!("top middle".parse::<ScrollOffset>().is_err());
        assert_eq!("bottom top".parse::<ScrollOffset>().unwrap().to_string(), "bottom top");
    }

    #[test]
    fn test_parse_toggle_actions() {
        let actions: ToggleActions = "play pause resume pause".parse().unwrap();
        assert_eq!(actions.on_leave, ToggleAction::Pause);
        assert_eq!(actions.action_for(TriggerEvent::EnterBack), ToggleAction::Resume);
        assert_eq!(ToggleActions::default(), "play none none reverse".parse().unwrap());
        assert!("play none".parse::<ToggleActions>().is_err());
        assert!("play none none explode".parse::<ToggleActions>().is_err());
    }

    #[test]
    fn test_fires_once_per_crossing() {
        let (mut trigger, rect) = trigger_at(2000.0, 500.0);
        assert_eq!(trigger.start_px(), 1200.0);

        assert!(trigger.update(scroll_for_top_at(&rect, 0.9)).is_empty());

        let at_79 = scroll_for_top_at(&rect, 0.79);
        assert_eq!(trigger.update(at_79).as_slice(), &[TriggerEvent::Enter]);
        for _ in 0..5 {
            assert!(trigger.update(at_79).is_empty());
        }

        let at_81 = scroll_for_top_at(&rect, 0.81);
        assert_eq!(trigger.update(at_81).as_slice(), &[TriggerEvent::LeaveBack]);
        assert!(trigger.update(at_81).is_empty());
    }

    #[test]
    fn test_jump_past_end_reports_enter_and_leave() {
        let (mut trigger, rect) = trigger_at(2000.0, 500.0);
        assert_eq!(trigger.end_px(), rect.bottom());

        let events = trigger.update(5000.0);
        assert_eq!(events.as_slice(), &[TriggerEvent::Enter, TriggerEvent::Leave]);

        let events = trigger.update(0.0);
        assert_eq!(
            events.as_slice(),
            &[TriggerEvent::EnterBack, TriggerEvent::LeaveBack]
        );
    }

    #[test]
    fn test_relative_end() {
        let mut tree = NodeTree::new();
        let rect = Rect::new(0.0, 1000.0, 800.0, 400.0);
        let node = tree.insert(rect);
        let mut trigger = ScrollTrigger::new(
            TriggerDescriptor::new(node)
                .start("top top".parse().unwrap())
                .end("+=300".parse().unwrap())
                .scrub(Scrub::Immediate),
        );
        trigger.refresh(&rect, VIEWPORT);

        assert_eq!(trigger.end_px() - trigger.start_px(), 300.0);
        trigger.update(1150.0);
        assert!((trigger.scrub_progress() - 0.5).abs() < 1e-6);
        assert!(!trigger.is_catching_up());
    }

    #[test]
    fn test_smoothed_scrub_catches_up() {
        let mut tree = NodeTree::new();
        let rect = Rect::new(0.0, 1000.0, 800.0, 400.0);
        let node = tree.insert(rect);
        let mut trigger = ScrollTrigger::new(
            TriggerDescriptor::new(node)
                .start("top bottom".parse().unwrap())
                .end("bottom top".parse().unwrap())
                .scrub(Scrub::Smoothed(1000.0)),
        );
        trigger.refresh(&rect, VIEWPORT);

        trigger.update(trigger.end_px());
        assert_eq!(trigger.scrub_progress(), 0.0);
        assert!(trigger.is_catching_up());

        assert!(trigger.advance_scrub(500.0));
        assert!((trigger.scrub_progress() - 0.5).abs() < 1e-6);

        for _ in 0..60 {
            trigger.advance_scrub(500.0);
        }
        assert_eq!(trigger.scrub_progress(), 1.0);
        assert!(!trigger.advance_scrub(16.0));
    }
}
