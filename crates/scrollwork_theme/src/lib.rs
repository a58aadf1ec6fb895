//! Scrollwork Theme State
//!
//! An explicit light/dark color scheme cell. Components read the current
//! [`ColorScheme`] and subscribe to changes instead of inspecting a class on
//! the document root.
//!
//! # Quick Start
//!
//! ```rust
//! use scrollwork_theme::{ColorScheme, ThemeState};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let theme = ThemeState::new(ColorScheme::Light);
//! let changes = Arc::new(AtomicUsize::new(0));
//! let counter = changes.clone();
//! let id = theme.subscribe(move |_| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! theme.toggle();
//! theme.set_scheme(ColorScheme::Dark);
//! assert_eq!(changes.load(Ordering::SeqCst), 1);
//!
//! assert!(theme.unsubscribe(id));
//! assert!(!theme.unsubscribe(id));
//! ```

mod scheme;
mod state;

pub use scheme::ColorScheme;
pub use state::{SubscriberId, ThemeState};
