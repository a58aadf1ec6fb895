//! Animation presets for common entry animations
//!
//! Each preset is a `(from, to)` pair of property sets, ready to hand to
//! [`crate::AnimationScheduler::register_timeline`] or a page descriptor.

use crate::keyframe::StyleProps;

/// Pre-built from/to pairs for the usual section reveals
pub struct AnimationPreset;

impl AnimationPreset {
    // ========================================================================
    // Fades
    // ========================================================================

    /// Fade in from transparent
    pub fn fade_in() -> (StyleProps, StyleProps) {
        (StyleProps::opacity(0.0), StyleProps::opacity(1.0))
    }

    /// Fade in while rising `distance` pixels into place
    pub fn fade_up(distance: f32) -> (StyleProps, StyleProps) {
        (
            StyleProps::translate(0.0, distance).with_opacity(0.0),
            StyleProps::translate(0.0, 0.0).with_opacity(1.0),
        )
    }

    /// Fade in while sliding `distance` pixels in from the left
    pub fn fade_right(distance: f32) -> (StyleProps, StyleProps) {
        (
            StyleProps::translate(-distance, 0.0).with_opacity(0.0),
            StyleProps::translate(0.0, 0.0).with_opacity(1.0),
        )
    }

    // ========================================================================
    // 3D
    // ========================================================================

    /// Fade in while turning from `degrees` around the Y axis to facing front
    pub fn tilt_in(degrees: f32) -> (StyleProps, StyleProps) {
        (
            StyleProps::default().with_rotate_y(degrees).with_opacity(0.0),
            StyleProps::default().with_rotate_y(0.0).with_opacity(1.0),
        )
    }

    /// Card rising out of the page: lifted, slightly turned and shrunk
    pub fn card_rise() -> (StyleProps, StyleProps) {
        (
            StyleProps::translate(0.0, 50.0)
                .with_rotate_y(-5.0)
                .with_scale(0.95)
                .with_opacity(0.0),
            StyleProps::translate(0.0, 0.0)
                .with_rotate_y(0.0)
                .with_scale(1.0)
                .with_opacity(1.0),
        )
    }

    // ========================================================================
    // Progress bars and backgrounds
    // ========================================================================

    /// Grow from zero width to `pct` percent
    pub fn grow_width(pct: f32) -> (StyleProps, StyleProps) {
        (
            StyleProps::default().with_width_pct(0.0),
            StyleProps::default().with_width_pct(pct),
        )
    }

    /// Shift the background down to `pct` percent (scroll parallax)
    pub fn background_drift(pct: f32) -> (StyleProps, StyleProps) {
        (
            StyleProps::default().with_background_y_pct(0.0),
            StyleProps::default().with_background_y_pct(pct),
        )
    }

    /// Look up a preset by its descriptor name
    ///
    /// Names are `fade-in`, `fade-up`, `fade-right`, `tilt-in`, `card-rise`,
    /// `grow-width` and `background-drift`, using the distances the page
    /// layouts expect.
    pub fn named(name: &str) -> Option<(StyleProps, StyleProps)> {
        match name {
            "fade-in" => Some(Self::fade_in()),
            "fade-up" => Some(Self::fade_up(30.0)),
            "fade-right" => Some(Self::fade_right(30.0)),
            "tilt-in" => Some(Self::tilt_in(-20.0)),
            "card-rise" => Some(Self::card_rise()),
            "grow-width" => Some(Self::grow_width(100.0)),
            "background-drift" => Some(Self::background_drift(30.0)),
            _ => None,
        }
    }
}
