//! Scrollwork Animation System
//!
//! Scroll-linked and pointer-driven animation orchestration for page sections.
//!
//! # Features
//!
//! - **Tweens**: from/to style interpolation with easing, delay, repeat, yoyo
//! - **Timelines**: staggered groups and offset sequences, reversible as a whole
//! - **Scroll Triggers**: play/reverse when a node crosses a viewport threshold,
//!   or scrub progress directly from the scroll position
//! - **Pointer Parallax**: tilt and shift targets by the cursor's offset from a
//!   region's center
//! - **Cursor Followers**: a node that tracks the pointer across the window,
//!   reacting to presses and to hovering interactive nodes
//! - **Sections**: every handle is owned by a section; tearing the section down
//!   stops its tweens and detaches its listeners in one step
//!
//! # Example
//!
//! ```rust
//! use scrollwork_animation::{AnimationScheduler, StyleProps, TimelineOptions, TriggerDescriptor};
//! use scrollwork_core::Rect;
//!
//! let mut scheduler = AnimationScheduler::new(1280.0, 1000.0);
//! let about = scheduler.mount_section("about");
//! let title = scheduler.nodes_mut().insert(Rect::new(0.0, 2000.0, 1280.0, 120.0));
//!
//! let options = TimelineOptions::new(800)
//!     .easing("power3.out".parse().unwrap())
//!     .trigger(TriggerDescriptor::new(title));
//! scheduler.register_timeline(
//!     about,
//!     &[title],
//!     StyleProps::translate(0.0, 30.0).with_opacity(0.0),
//!     StyleProps::translate(0.0, 0.0).with_opacity(1.0),
//!     options,
//! );
//!
//! // Title top reaches 79% of the viewport: the timeline starts playing
//! scheduler.scroll_to(1210.0);
//! scheduler.advance(800.0);
//! assert_eq!(scheduler.nodes().style(title).unwrap().opacity, 1.0);
//!
//! scheduler.teardown(about);
//! assert_eq!(scheduler.listener_count(about), 0);
//! ```

pub mod descriptor;
pub mod easing;
pub mod keyframe;
pub mod pointer;
pub mod presets;
pub mod scheduler;
pub mod scroll;
pub mod timeline;
pub mod tween;

pub use descriptor::{MountedPage, PageDescriptor};
pub use easing::Easing;
pub use keyframe::{Keyframe, Keyframes, StyleProps};
pub use pointer::{
    CursorFollower, CursorState, HoverBinder, ParallaxBinder, ParallaxTarget, PointerSample,
    Sensitivity,
};
pub use presets::AnimationPreset;
pub use scheduler::{
    AnimationScheduler, BinderId, FlagId, Handle, SectionId, TimelineId, TimelineOptions,
};
pub use scroll::{Scrub, ScrollOffset, ScrollTrigger, ToggleAction, ToggleActions, TriggerDescriptor};
pub use timeline::{Position, Timeline};
pub use tween::{PlayState, Tween};
