//! Scrollwork Core Runtime
//!
//! This crate provides the foundational primitives the animation engine
//! writes to and listens on:
//!
//! - **Node Tree**: document-space rectangles with resolved style state
//! - **Event Dispatch**: listeners keyed by an opaque [`ListenerId`], so
//!   removal always detaches exactly what was attached
//! - **Errors**: the shared error taxonomy
//!
//! # Example
//!
//! ```rust
//! use scrollwork_core::dom::{NodeTree, Rect};
//! use scrollwork_core::events::{event_types, EventDispatcher, EventHandler};
//!
//! let mut tree = NodeTree::new();
//! let card = tree.insert(Rect::new(0.0, 400.0, 300.0, 200.0));
//!
//! let mut dispatcher: EventDispatcher<EventHandler> = EventDispatcher::new();
//! let id = dispatcher.subscribe_fn(card, event_types::POINTER_MOVE, |_| {});
//! assert_eq!(dispatcher.listener_count(), 1);
//!
//! assert!(dispatcher.unsubscribe(id).is_some());
//! // Removing twice is a no-op
//! assert!(dispatcher.unsubscribe(id).is_none());
//! ```

pub mod dom;
pub mod error;
pub mod events;

pub use dom::{NodeId, NodeTree, Rect, Style};
pub use error::{Result, ScrollworkError};
pub use events::{Event, EventData, EventDispatcher, EventHandler, EventType, ListenerId};
