//! Pointer-driven transforms
//!
//! A [`ParallaxBinder`] turns the cursor's offset from a region's center into
//! a rotation and translation per target. A [`HoverBinder`] swaps a target
//! between a rest style and a hovered style as the pointer enters and leaves.
//! A [`CursorFollower`] moves a node with the pointer across the whole
//! window. All three are plain data; the scheduler owns their listeners and
//! tweens.

use scrollwork_core::{NodeId, Rect};
use smallvec::SmallVec;

use crate::easing::Easing;
use crate::keyframe::StyleProps;

/// Cursor position relative to a region, each axis in `-0.5..=0.5`
///
/// `(0, 0)` is the region's center, `(-0.5, -0.5)` its top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerSample {
    pub x: f32,
    pub y: f32,
}

impl PointerSample {
    pub const CENTER: PointerSample = PointerSample { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: x.clamp(-0.5, 0.5),
            y: y.clamp(-0.5, 0.5),
        }
    }

    /// Normalize a document-space point against a region
    ///
    /// Points outside the region clamp to its edge. A zero-sized region
    /// always yields the center.
    pub fn from_point(rect: &Rect, x: f32, y: f32) -> Self {
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return Self::CENTER;
        }
        let (cx, cy) = rect.center();
        Self::new((x - cx) / rect.width, (y - cy) / rect.height)
    }
}

/// Degrees and pixels applied per unit of pointer offset
///
/// A full unit never occurs in practice since samples stop at 0.5, so a
/// sensitivity of 20 tilts at most 10 degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sensitivity {
    pub rotate_x: f32,
    pub rotate_y: f32,
    pub translate_x: f32,
    pub translate_y: f32,
}

impl Sensitivity {
    /// Rotate around both axes
    pub fn tilt(degrees: f32) -> Self {
        Self {
            rotate_x: degrees,
            rotate_y: degrees,
            ..Self::default()
        }
    }

    /// Translate along both axes
    pub fn shift(px: f32) -> Self {
        Self {
            translate_x: px,
            translate_y: px,
            ..Self::default()
        }
    }

    pub fn with_tilt(mut self, degrees: f32) -> Self {
        self.rotate_x = degrees;
        self.rotate_y = degrees;
        self
    }

    pub fn with_shift(mut self, px: f32) -> Self {
        self.translate_x = px;
        self.translate_y = px;
        self
    }

    /// Map a sample to target properties, scaled by `factor`
    ///
    /// Moving right turns the target's face toward the cursor (positive
    /// `rotate_y`), moving down tips its top away (negative `rotate_x`).
    /// Axes with zero sensitivity are left unset.
    pub fn apply(&self, sample: PointerSample, factor: f32) -> StyleProps {
        let mut props = StyleProps::default();
        if self.rotate_x != 0.0 {
            props.rotate_x = Some(-sample.y * self.rotate_x * factor);
        }
        if self.rotate_y != 0.0 {
            props.rotate_y = Some(sample.x * self.rotate_y * factor);
        }
        if self.translate_x != 0.0 {
            props.translate_x = Some(sample.x * self.translate_x * factor);
        }
        if self.translate_y != 0.0 {
            props.translate_y = Some(sample.y * self.translate_y * factor);
        }
        props
    }
}

/// A node moved by a parallax binder, with its own depth factor
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParallaxTarget {
    pub node: NodeId,
    pub factor: f32,
}

impl ParallaxTarget {
    pub fn new(node: NodeId, factor: f32) -> Self {
        Self { node, factor }
    }
}

impl From<NodeId> for ParallaxTarget {
    fn from(node: NodeId) -> Self {
        Self::new(node, 1.0)
    }
}

/// Maps pointer movement inside a region to transforms on its targets
#[derive(Clone, Debug)]
pub struct ParallaxBinder {
    pub region: NodeId,
    pub targets: SmallVec<[ParallaxTarget; 4]>,
    pub sensitivity: Sensitivity,
    /// Duration of the catch-up tween started on every move
    pub smoothing_ms: u32,
    pub easing: Easing,
    /// Ease targets back to the center pose when the pointer leaves
    pub reset_on_leave: bool,
}

impl ParallaxBinder {
    pub fn new<I, T>(region: NodeId, targets: I, sensitivity: Sensitivity) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ParallaxTarget>,
    {
        Self {
            region,
            targets: targets.into_iter().map(Into::into).collect(),
            sensitivity,
            smoothing_ms: 500,
            easing: Easing::EaseOutCubic,
            reset_on_leave: false,
        }
    }

    pub fn smoothing(mut self, smoothing_ms: u32) -> Self {
        self.smoothing_ms = smoothing_ms;
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn reset_on_leave(mut self, reset: bool) -> Self {
        self.reset_on_leave = reset;
        self
    }

    /// Target properties for every target at a sample
    pub fn sample_targets(
        &self,
        sample: PointerSample,
    ) -> impl Iterator<Item = (NodeId, StyleProps)> + '_ {
        self.targets
            .iter()
            .map(move |t| (t.node, self.sensitivity.apply(sample, t.factor)))
    }
}

/// Plays a target toward a hovered style on pointer enter, back on leave
#[derive(Clone, Copy, Debug)]
pub struct HoverBinder {
    pub region: NodeId,
    pub target: NodeId,
    pub rest: StyleProps,
    pub hovered: StyleProps,
    pub duration_ms: u32,
    pub easing: Easing,
}

impl HoverBinder {
    /// Hover the region itself
    pub fn new(region: NodeId, rest: StyleProps, hovered: StyleProps) -> Self {
        Self {
            region,
            target: region,
            rest,
            hovered,
            duration_ms: 400,
            easing: Easing::EaseOutCubic,
        }
    }

    /// Animate a different node than the one receiving pointer events
    pub fn target(mut self, target: NodeId) -> Self {
        self.target = target;
        self
    }

    pub fn duration(mut self, duration_ms: u32) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

/// What the pointer is doing, as seen by a cursor follower
///
/// `x` and `y` are viewport coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CursorState {
    pub x: f32,
    pub y: f32,
    /// Pointer is inside the window
    pub visible: bool,
    /// A button is held down
    pub pressed: bool,
    /// Pointer is over one of the follower's interactive nodes
    pub hovering: bool,
}

/// A node that tracks the pointer anywhere in the window
///
/// The cursor node is centered on the pointer, hidden while the pointer is
/// outside the window, shrunk while pressed and grown while over an
/// interactive node. Pressing over an interactive node applies both scales.
#[derive(Clone, Debug)]
pub struct CursorFollower {
    pub cursor: NodeId,
    /// Nodes that expand the cursor while hovered
    pub interactive: SmallVec<[NodeId; 4]>,
    pub pressed_scale: f32,
    pub hover_scale: f32,
    /// Duration of the opacity and scale transitions
    pub transition_ms: u32,
    pub easing: Easing,
}

impl CursorFollower {
    pub fn new<I>(cursor: NodeId, interactive: I) -> Self
    where
        I: IntoIterator<Item = NodeId>,
    {
        Self {
            cursor,
            interactive: interactive.into_iter().collect(),
            pressed_scale: 0.9,
            hover_scale: 1.5,
            transition_ms: 200,
            easing: Easing::EaseOutQuad,
        }
    }

    pub fn pressed_scale(mut self, scale: f32) -> Self {
        self.pressed_scale = scale;
        self
    }

    pub fn hover_scale(mut self, scale: f32) -> Self {
        self.hover_scale = scale;
        self
    }

    pub fn transition(mut self, transition_ms: u32) -> Self {
        self.transition_ms = transition_ms;
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Translation that centers the cursor node's rect on the pointer
    pub fn position(&self, rect: &Rect, state: &CursorState) -> StyleProps {
        let (cx, cy) = rect.center();
        StyleProps::translate(state.x - cx, state.y - cy)
    }

    /// Opacity and scale for a state
    pub fn appearance(&self, state: &CursorState) -> StyleProps {
        let mut scale = 1.0;
        if state.hovering {
            scale *= self.hover_scale;
        }
        if state.pressed {
            scale *= self.pressed_scale;
        }
        StyleProps::scale(scale).with_opacity(if state.visible { 1.0 } else { 0.0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrollwork_core::NodeTree;

    #[test]
    fn test_sample_center_and_corners() {
        let rect = Rect::new(100.0, 200.0, 400.0, 200.0);
        assert_eq!(PointerSample::from_point(&rect, 300.0, 300.0), PointerSample::CENTER);
        assert_eq!(
            PointerSample::from_point(&rect, 100.0, 200.0),
            PointerSample::new(-0.5, -0.5)
        );
        assert_eq!(
            PointerSample::from_point(&rect, 5000.0, 5000.0),
            PointerSample::new(0.5, 0.5)
        );
        assert_eq!(
            PointerSample::from_point(&Rect::new(0.0, 0.0, 0.0, 0.0), 10.0, 10.0),
            PointerSample::CENTER
        );
    }

    #[test]
    fn test_center_maps_to_zero() {
        let props = Sensitivity::tilt(20.0)
            .with_shift(40.0)
            .apply(PointerSample::CENTER, 1.0);
        assert_eq!(props.rotate_x, Some(0.0));
        assert_eq!(props.rotate_y, Some(0.0));
        assert_eq!(props.translate_x, Some(0.0));
        assert_eq!(props.translate_y, Some(0.0));
    }

    #[test]
    fn test_tilt_direction_and_unset_axes() {
        let props = Sensitivity::tilt(20.0).apply(PointerSample::new(0.5, 0.25), 1.0);
        assert_eq!(props.rotate_y, Some(10.0));
        assert_eq!(props.rotate_x, Some(-5.0));
        assert_eq!(props.translate_x, None);
        assert_eq!(props.translate_y, None);
    }

    #[test]
    fn test_output_is_continuous() {
        let rect = Rect::new(0.0, 0.0, 1000.0, 1000.0);
        let sensitivity = Sensitivity::tilt(20.0);
        let mut prev = sensitivity.apply(PointerSample::from_point(&rect, 0.0, 500.0), 1.0);
        for x in 1..=1000 {
            let next = sensitivity.apply(PointerSample::from_point(&rect, x as f32, 500.0), 1.0);
            let jump = (next.rotate_y.unwrap_or(0.0) - prev.rotate_y.unwrap_or(0.0)).abs();
            assert!(jump <= 0.021, "jump of {jump} at x={x}");
            prev = next;
        }
    }

    #[test]
    fn test_factors_scale_targets() {
        let mut tree = NodeTree::new();
        let region = tree.insert(Rect::new(0.0, 0.0, 100.0, 100.0));
        let near = tree.insert(Rect::new(0.0, 0.0, 10.0, 10.0));
        let far = tree.insert(Rect::new(0.0, 0.0, 10.0, 10.0));

        let binder = ParallaxBinder::new(
            region,
            [ParallaxTarget::new(near, 0.02), ParallaxTarget::new(far, 0.04)],
            Sensitivity::shift(100.0),
        );
        let out: Vec<_> = binder.sample_targets(PointerSample::new(0.5, 0.0)).collect();
        assert_eq!(out[0].0, near);
        assert!((out[0].1.translate_x.unwrap() - 1.0).abs() < 1e-6);
        assert!((out[1].1.translate_x.unwrap() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_cursor_centers_on_pointer() {
        let mut tree = NodeTree::new();
        let cursor = tree.insert(Rect::new(0.0, 0.0, 20.0, 20.0));
        let follower = CursorFollower::new(cursor, []);
        let state = CursorState {
            x: 300.0,
            y: 150.0,
            ..CursorState::default()
        };
        let props = follower.position(&Rect::new(0.0, 0.0, 20.0, 20.0), &state);
        assert_eq!(props, StyleProps::translate(290.0, 140.0));
    }

    #[test]
    fn test_cursor_appearance_combines_states() {
        let mut tree = NodeTree::new();
        let cursor = tree.insert(Rect::new(0.0, 0.0, 20.0, 20.0));
        let follower = CursorFollower::new(cursor, []).hover_scale(2.0).pressed_scale(0.5);

        let hidden = follower.appearance(&CursorState::default());
        assert_eq!(hidden, StyleProps::scale(1.0).with_opacity(0.0));

        let state = CursorState {
            visible: true,
            hovering: true,
            ..CursorState::default()
        };
        assert_eq!(follower.appearance(&state).scale, Some(2.0));
        let pressed = CursorState {
            pressed: true,
            ..state
        };
        assert_eq!(follower.appearance(&pressed), StyleProps::scale(1.0).with_opacity(1.0));
    }
}
