//! Tweens and the shared playhead
//!
//! [`Playhead`] owns the clock logic (delay, direction, repeat, yoyo) and is
//! shared by [`Tween`] and [`crate::Timeline`]. A playhead never runs past
//! either end: reversing from the middle walks back to the start and stops.

use scrollwork_core::Style;

use crate::easing::Easing;
use crate::keyframe::{Keyframes, StyleProps};

/// Playback state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlayState {
    /// Created but never started
    #[default]
    Idle,
    /// Advancing on every tick
    Playing,
    /// Halted mid-way, resumable
    Paused,
    /// Reached the start (reversed) or the end (forward)
    Finished,
}

/// Time position within a repeating, reversible span
#[derive(Clone, Debug)]
pub struct Playhead {
    duration_ms: u32,
    delay_ms: u32,
    /// Extra iterations after the first (-1 for infinite)
    repeat: i32,
    yoyo: bool,
    /// Time within the current iteration; negative while in the delay
    time: f32,
    iteration: i32,
    reversed: bool,
    state: PlayState,
}

impl Playhead {
    pub fn new(duration_ms: u32) -> Self {
        Self {
            duration_ms,
            delay_ms: 0,
            repeat: 0,
            yoyo: false,
            time: 0.0,
            iteration: 0,
            reversed: false,
            state: PlayState::Idle,
        }
    }

    pub fn set_duration(&mut self, duration_ms: u32) {
        self.duration_ms = duration_ms;
    }

    pub fn set_delay(&mut self, delay_ms: u32) {
        self.delay_ms = delay_ms;
    }

    /// Set number of extra iterations (-1 for infinite)
    pub fn set_repeat(&mut self, repeat: i32) {
        self.repeat = repeat;
    }

    /// Alternate direction on every repeat
    pub fn set_yoyo(&mut self, yoyo: bool) {
        self.yoyo = yoyo;
    }

    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }

    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn iteration(&self) -> i32 {
        self.iteration
    }

    /// Current time within the iteration in milliseconds (negative during delay)
    pub fn time_ms(&self) -> f32 {
        self.time
    }

    /// Play forward from the current position
    ///
    /// An idle playhead starts with its delay; a finished one at the end
    /// stays finished.
    pub fn play(&mut self) {
        if self.state == PlayState::Idle {
            self.time = -(self.delay_ms as f32);
        }
        self.reversed = false;
        if self.at_end() {
            self.state = PlayState::Finished;
        } else {
            self.state = PlayState::Playing;
        }
    }

    /// Play backward from the current position toward the start
    pub fn reverse(&mut self) {
        self.reversed = true;
        if self.at_start() {
            self.time = 0.0;
            self.state = PlayState::Finished;
        } else {
            self.state = PlayState::Playing;
        }
    }

    pub fn pause(&mut self) {
        if self.state == PlayState::Playing {
            self.state = PlayState::Paused;
        }
    }

    /// Continue in the current direction
    pub fn resume(&mut self) {
        match self.state {
            PlayState::Paused => self.state = PlayState::Playing,
            PlayState::Idle => self.play(),
            PlayState::Playing | PlayState::Finished => {}
        }
    }

    /// Jump to the start (including delay) and play forward
    pub fn restart(&mut self) {
        self.time = -(self.delay_ms as f32);
        self.iteration = 0;
        self.reversed = false;
        self.state = PlayState::Playing;
    }

    /// Jump to the start and stop
    pub fn reset(&mut self) {
        self.time = 0.0;
        self.iteration = 0;
        self.reversed = false;
        self.state = PlayState::Idle;
    }

    /// Jump to the end and stop
    ///
    /// Infinite playheads jump to the end of their current iteration.
    pub fn complete(&mut self) {
        if self.repeat >= 0 {
            self.iteration = self.repeat;
        }
        self.time = self.duration_ms as f32;
        self.reversed = false;
        self.state = PlayState::Finished;
    }

    /// Move to a progress (0.0 to 1.0) within the first iteration without
    /// changing play state
    pub fn seek(&mut self, progress: f32) {
        self.iteration = 0;
        self.time = progress.clamp(0.0, 1.0) * self.duration_ms as f32;
    }

    /// Progress within the current iteration (0.0 to 1.0), with yoyo applied
    pub fn progress(&self) -> f32 {
        let raw = if self.duration_ms == 0 {
            if self.time >= 0.0 && self.state == PlayState::Finished && !self.reversed {
                1.0
            } else {
                0.0
            }
        } else {
            (self.time / self.duration_ms as f32).clamp(0.0, 1.0)
        };
        if self.yoyo && self.iteration % 2 == 1 {
            1.0 - raw
        } else {
            raw
        }
    }

    fn at_start(&self) -> bool {
        self.iteration == 0 && self.time <= 0.0
    }

    fn at_end(&self) -> bool {
        self.duration_ms > 0
            && self.repeat >= 0 && self.iteration >= self.repeat && self.time >= self.duration_ms as f32
    }

    /// Advance by `dt_ms`
    ///
    /// Returns `true` if the playhead moved.
    pub fn tick(&mut self, dt_ms: f32) -> bool {
        if self.state != PlayState::Playing || dt_ms <= 0.0 {
            return false;
        }

        let duration = self.duration_ms as f32;

        if self.reversed {
            self.time -= dt_ms;
            while self.time < 0.0 && self.iteration > 0 && duration > 0.0 {
                self.iteration -= 1;
                self.time += duration;
            }
            if self.iteration == 0 && self.time <= 0.0 {
                self.time = 0.0;
                self.state = PlayState::Finished;
            }
        } else {
            self.time += dt_ms;
            if duration <= 0.0 {
                if self.time >= 0.0 {
                    self.time = 0.0;
                    self.state = PlayState::Finished;
                }
                return true;
            }
            while self.time >= duration {
                if self.repeat < 0 || self.iteration < self.repeat {
                    self.iteration += 1;
                    self.time -= duration;
                } else {
                    self.time = duration;
                    self.state = PlayState::Finished;
                    break;
                }
            }
        }

        true
    }
}

/// A single-target interpolation between style property sets
#[derive(Clone, Debug)]
pub struct Tween {
    keyframes: Keyframes,
    playhead: Playhead,
}

impl Tween {
    /// Create a tween from `from` to `to`
    pub fn new(from: StyleProps, to: StyleProps, duration_ms: u32, easing: Easing) -> Self {
        Self {
            keyframes: Keyframes::from_to(from, to, easing),
            playhead: Playhead::new(duration_ms),
        }
    }

    /// Create a tween from the node's current values to `to`
    pub fn to(current: &Style, to: StyleProps, duration_ms: u32, easing: Easing) -> Self {
        Self::new(to.capture(current), to, duration_ms, easing)
    }

    /// Create a tween over arbitrary keyframes
    pub fn with_keyframes(keyframes: Keyframes, duration_ms: u32) -> Self {
        Self {
            keyframes,
            playhead: Playhead::new(duration_ms),
        }
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

    pub fn seek(&mut self, progress: f32) {
        self.playhead.seek(progress);
    }

    pub fn state(&self) -> PlayState {
        self.playhead.state()
    }

    /// Whether the tween will change on the next tick
    pub fn is_active(&self) -> bool {
        self.playhead.is_playing()
    }

    pub fn progress(&self) -> f32 {
        self.playhead.progress()
    }

    pub fn duration_ms(&self) -> u32 {
        self.playhead.duration_ms()
    }

    /// Advance by `dt_ms`; returns `true` if the sampled value may have changed
    pub fn tick(&mut self, dt_ms: f32) -> bool {
        self.playhead.tick(dt_ms)
    }

    /// Current interpolated properties
    pub fn current(&self) -> StyleProps {
        self.keyframes.sample(self.playhead.progress())
    }

    pub fn keyframes(&self) -> &Keyframes {
        &self.keyframes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fade() -> Tween {
        Tween::new(
            StyleProps::opacity(0.0),
            StyleProps::opacity(1.0),
            1000,
            Easing::Linear,
        )
    }

    #[test]
    fn test_play_to_end() {
        let mut tween = fade();
        assert_eq!(tween.state(), PlayState::Idle);
        assert_eq!(tween.current().opacity, Some(0.0));

        tween.play();
        tween.tick(250.0);
        assert_eq!(tween.current().opacity, Some(0.25));

        tween.tick(5000.0);
        assert_eq!(tween.state(), PlayState::Finished);
        assert_eq!(tween.current().opacity, Some(1.0));
        assert!(!tween.tick(16.0));
    }

    #[test]
    fn test_reverse_from_middle() {
        let mut tween = fade();
        tween.play();
        tween.tick(600.0);
        tween.reverse();
        tween.tick(200.0);
        assert!((tween.progress() - 0.4).abs() < 1e-6);

        tween.tick(10_000.0);
        assert_eq!(tween.state(), PlayState::Finished);
        assert_eq!(tween.current().opacity, Some(0.0));
    }

    #[test]
    fn test_reverse_at_start_finishes_immediately() {
        let mut tween = fade();
        tween.reverse();
        assert_eq!(tween.state(), PlayState::Finished);
        assert!(!tween.is_active());
    }

    #[test]
    fn test_delay_holds_start() {
        let mut tween = fade().delay(500);
        tween.play();
        tween.tick(400.0);
        assert_eq!(tween.current().opacity, Some(0.0));
        tween.tick(600.0);
        assert!((tween.current().opacity.unwrap() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_infinite_repeat_never_finishes() {
        let mut spin = Tween::new(
            StyleProps::default().with_rotate_y(0.0),
            StyleProps::default().with_rotate_y(360.0),
            20_000,
            Easing::Linear,
        )
        .repeat(-1);
        spin.play();
        for _ in 0..100 {
            spin.tick(1_000.0);
        }
        assert!(spin.is_active());
        assert_eq!(spin.current().rotate_y, Some(0.0));
    }

    #[test]
    fn test_yoyo_alternates() {
        let mut tween = fade().repeat(1).yoyo(true);
        tween.play();
        tween.tick(1_250.0);
        assert!((tween.current().opacity.unwrap() - 0.75).abs() < 1e-6);
        tween.tick(1_000.0);
        assert_eq!(tween.state(), PlayState::Finished);
        assert_eq!(tween.current().opacity, Some(0.0));
    }

    #[test]
    fn test_pause_resume() {
        let mut tween = fade();
        tween.play();
        tween.tick(100.0);
        tween.pause();
        assert!(!tween.tick(100.0));
        tween.resume();
        tween.tick(100.0);
        assert!((tween.progress() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_complete_and_reset() {
        let mut tween = fade();
        tween.complete();
        assert_eq!(tween.current().opacity, Some(1.0));
        tween.reset();
        assert_eq!(tween.state(), PlayState::Idle);
        assert_eq!(tween.current().opacity, Some(0.0));
    }

    #[test]
    fn test_to_captures_current_style() {
        let style = Style {
            rotate_x: 4.0,
            ..Style::default()
        };
        let mut tween = Tween::to(&style, StyleProps::tilt(0.0, 0.0), 500, Easing::EaseOutCubic);
        assert_eq!(tween.current().rotate_x, Some(4.0));
        tween.play();
        tween.tick(500.0);
        assert_eq!(tween.current().rotate_x, Some(0.0));
    }

    #[test]
    fn test_zero_duration_completes_on_first_tick() {
        let mut tween = Tween::new(
            StyleProps::opacity(0.0),
            StyleProps::opacity(1.0),
            0,
            Easing::Linear,
        );
        tween.play();
        assert!(tween.tick(1.0));
        assert_eq!(tween.state(), PlayState::Finished);
        assert_eq!(tween.current().opacity, Some(1.0));
    }
}
