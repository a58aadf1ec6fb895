//! Style property sets and keyframes
//!
//! [`StyleProps`] is a partial style: only the fields that are `Some` take
//! part in interpolation and get written to a node. [`Keyframes`] samples a
//! sequence of property sets at a normalized progress.

use scrollwork_core::Style;
use serde::{Deserialize, Serialize};

use crate::easing::Easing;

/// Properties that can be animated
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleProps {
    /// Opacity (0.0 to 1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    /// Translation X in pixels
    #[serde(alias = "x", skip_serializing_if = "Option::is_none")]
    pub translate_x: Option<f32>,
    /// Translation Y in pixels
    #[serde(alias = "y", skip_serializing_if = "Option::is_none")]
    pub translate_y: Option<f32>,
    /// Translation Z in pixels
    #[serde(alias = "z", skip_serializing_if = "Option::is_none")]
    pub translate_z: Option<f32>,
    /// Uniform scale factor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
    /// Rotation in degrees (Z-axis)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotate: Option<f32>,
    /// Rotation X in degrees (3D tilt)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotate_x: Option<f32>,
    /// Rotation Y in degrees (3D turn)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotate_y: Option<f32>,
    /// Width in percent of the natural width
    #[serde(alias = "width", skip_serializing_if = "Option::is_none")]
    pub width_pct: Option<f32>,
    /// Vertical background position in percent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_y_pct: Option<f32>,
}

impl StyleProps {
    /// Create properties with only opacity set
    pub fn opacity(value: f32) -> Self {
        Self {
            opacity: Some(value),
            ..Default::default()
        }
    }

    /// Create properties with uniform scale
    pub fn scale(value: f32) -> Self {
        Self {
            scale: Some(value),
            ..Default::default()
        }
    }

    /// Create properties with translation
    pub fn translate(x: f32, y: f32) -> Self {
        Self {
            translate_x: Some(x),
            translate_y: Some(y),
            ..Default::default()
        }
    }

    /// Create properties with a 3D tilt
    pub fn tilt(rotate_x: f32, rotate_y: f32) -> Self {
        Self {
            rotate_x: Some(rotate_x),
            rotate_y: Some(rotate_y),
            ..Default::default()
        }
    }

    /// Builder: set opacity
    pub fn with_opacity(mut self, value: f32) -> Self {
        self.opacity = Some(value);
        self
    }

    /// Builder: set uniform scale
    pub fn with_scale(mut self, value: f32) -> Self {
        self.scale = Some(value);
        self
    }

    /// Builder: set translation
    pub fn with_translate(mut self, x: f32, y: f32) -> Self {
        self.translate_x = Some(x);
        self.translate_y = Some(y);
        self
    }

    /// Builder: set translate-z
    pub fn with_translate_z(mut self, px: f32) -> Self {
        self.translate_z = Some(px);
        self
    }

    /// Builder: set rotation
    pub fn with_rotate(mut self, degrees: f32) -> Self {
        self.rotate = Some(degrees);
        self
    }

    /// Builder: set X rotation (3D tilt)
    pub fn with_rotate_x(mut self, degrees: f32) -> Self {
        self.rotate_x = Some(degrees);
        self
    }

    /// Builder: set Y rotation (3D turn)
    pub fn with_rotate_y(mut self, degrees: f32) -> Self {
        self.rotate_y = Some(degrees);
        self
    }

    /// Builder: set width percentage
    pub fn with_width_pct(mut self, pct: f32) -> Self {
        self.width_pct = Some(pct);
        self
    }

    /// Builder: set vertical background position
    pub fn with_background_y_pct(mut self, pct: f32) -> Self {
        self.background_y_pct = Some(pct);
        self
    }

    /// Whether no property is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Interpolate between two property sets
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            opacity: lerp_opt(self.opacity, other.opacity, t),
            translate_x: lerp_opt(self.translate_x, other.translate_x, t),
            translate_y: lerp_opt(self.translate_y, other.translate_y, t),
            translate_z: lerp_opt(self.translate_z, other.translate_z, t),
            scale: lerp_opt(self.scale, other.scale, t),
            rotate: lerp_opt(self.rotate, other.rotate, t),
            rotate_x: lerp_opt(self.rotate_x, other.rotate_x, t),
            rotate_y: lerp_opt(self.rotate_y, other.rotate_y, t),
            width_pct: lerp_opt(self.width_pct, other.width_pct, t),
            background_y_pct: lerp_opt(self.background_y_pct, other.background_y_pct, t),
        }
    }

    /// Overlay `other` on top of `self`; fields set in `other` win
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            opacity: other.opacity.or(self.opacity),
            translate_x: other.translate_x.or(self.translate_x),
            translate_y: other.translate_y.or(self.translate_y),
            translate_z: other.translate_z.or(self.translate_z),
            scale: other.scale.or(self.scale),
            rotate: other.rotate.or(self.rotate),
            rotate_x: other.rotate_x.or(self.rotate_x),
            rotate_y: other.rotate_y.or(self.rotate_y),
            width_pct: other.width_pct.or(self.width_pct),
            background_y_pct: other.background_y_pct.or(self.background_y_pct),
        }
    }

    /// Read the current values of the fields this set animates
    ///
    /// Used for "to"-only tweens, which start from wherever the node is.
    pub fn capture(&self, style: &Style) -> Self {
        Self {
            opacity: self.opacity.map(|_| style.opacity),
            translate_x: self.translate_x.map(|_| style.translate_x),
            translate_y: self.translate_y.map(|_| style.translate_y),
            translate_z: self.translate_z.map(|_| style.translate_z),
            scale: self.scale.map(|_| style.scale),
            rotate: self.rotate.map(|_| style.rotate),
            rotate_x: self.rotate_x.map(|_| style.rotate_x),
            rotate_y: self.rotate_y.map(|_| style.rotate_y),
            width_pct: self.width_pct.map(|_| style.width_pct),
            background_y_pct: self.background_y_pct.map(|_| style.background_y_pct),
        }
    }

    /// Write the set fields into a resolved style
    pub fn apply_to(&self, style: &mut Style) {
        if let Some(v) = self.opacity {
            style.opacity = v;
        }
        if let Some(v) = self.translate_x {
            style.translate_x = v;
        }
        if let Some(v) = self.translate_y {
            style.translate_y = v;
        }
        if let Some(v) = self.translate_z {
            style.translate_z = v;
        }
        if let Some(v) = self.scale {
            style.scale = v;
        }
        if let Some(v) = self.rotate {
            style.rotate = v;
        }
        if let Some(v) = self.rotate_x {
            style.rotate_x = v;
        }
        if let Some(v) = self.rotate_y {
            style.rotate_y = v;
        }
        if let Some(v) = self.width_pct {
            style.width_pct = v;
        }
        if let Some(v) = self.background_y_pct {
            style.background_y_pct = v;
        }
    }
}

/// Helper to interpolate optional values
fn lerp_opt(a: Option<f32>, b: Option<f32>, t: f32) -> Option<f32> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a + (b - a) * t),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

/// A keyframe with multiple animated properties
#[derive(Clone, Debug, PartialEq)]
pub struct Keyframe {
    /// Time position (0.0 to 1.0)
    pub time: f32,
    /// Properties at this keyframe
    pub props: StyleProps,
    /// Easing function to use when transitioning TO this keyframe
    pub easing: Easing,
}

impl Keyframe {
    pub fn new(time: f32, props: StyleProps, easing: Easing) -> Self {
        Self {
            time,
            props,
            easing,
        }
    }
}

/// Keyframes sorted by time
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Keyframes {
    stops: Vec<Keyframe>,
}

impl Keyframes {
    /// Two-stop keyframes: `from` at 0, `to` at 1 reached with `easing`
    pub fn from_to(from: StyleProps, to: StyleProps, easing: Easing) -> Self {
        Self {
            stops: vec![
                Keyframe::new(0.0, from, Easing::Linear),
                Keyframe::new(1.0, to, easing),
            ],
        }
    }

    /// Add a keyframe (builder pattern)
    pub fn keyframe(mut self, time: f32, props: StyleProps, easing: Easing) -> Self {
        self.stops.push(Keyframe::new(time.clamp(0.0, 1.0), props, easing));
        self.stops.sort_by(|a, b| a.time.total_cmp(&b.time));
        self
    }

    /// Give the first stop every field a later stop animates, read from
    /// `current` where the first stop leaves it unset
    pub fn fill_start(&mut self, current: &Style) {
        let animated = self
            .stops
            .iter()
            .skip(1)
            .fold(StyleProps::default(), |acc, kf| acc.merge(&kf.props));
        if let Some(first) = self.stops.first_mut() {
            first.props = animated.capture(current).merge(&first.props);
        }
    }

    pub fn first(&self) -> Option<&Keyframe> {
        self.stops.first()
    }

    pub fn last(&self) -> Option<&Keyframe> {
        self.stops.last()
    }

    pub fn stops(&self) -> &[Keyframe] {
        &self.stops
    }

    /// Sample the keyframes at a specific progress (0.0 to 1.0)
    pub fn sample(&self, progress: f32) -> StyleProps {
        let Some(first) = self.stops.first() else {
            return StyleProps::default();
        };

        let progress = progress.clamp(0.0, 1.0);

        // Find surrounding keyframes
        let mut prev_kf = first;
        let mut next_kf = first;

        for kf in &self.stops {
            if kf.time <= progress {
                prev_kf = kf;
            }
            if kf.time >= progress {
                next_kf = kf;
                break;
            }
        }

        if (prev_kf.time - next_kf.time).abs() < f32::EPSILON {
            return prev_kf.props;
        }

        // Interpolate between keyframes
        let local_progress = (progress - prev_kf.time) / (next_kf.time - prev_kf.time);
        let eased = next_kf.easing.apply(local_progress);

        prev_kf.props.lerp(&next_kf.props, eased)
    }
}
