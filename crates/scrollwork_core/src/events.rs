//! Event dispatch system
//!
//! Listeners are stored under an opaque [`ListenerId`]. Removal goes through
//! that id, never through the handler itself, so a caller can always detach
//! exactly what it attached and removing an unknown id is a harmless no-op.

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::dom::NodeId;

new_key_type! {
    /// Handle returned by [`EventDispatcher::subscribe`]
    pub struct ListenerId;
}

/// Event type identifier
pub type EventType = u32;

/// Common event types
pub mod event_types {
    use super::EventType;

    pub const POINTER_DOWN: EventType = 1;
    pub const POINTER_UP: EventType = 2;
    pub const POINTER_MOVE: EventType = 3;
    pub const POINTER_ENTER: EventType = 4;
    pub const POINTER_LEAVE: EventType = 5;
    pub const SCROLL: EventType = 30;
}

/// An event with associated data
#[derive(Clone, Debug)]
pub struct Event {
    pub event_type: EventType,
    pub target: NodeId,
    pub data: EventData,
    pub propagation_stopped: bool,
}

/// Event-specific data
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EventData {
    /// Pointer position in document coordinates
    Pointer { x: f32, y: f32 },
    /// Vertical scroll position of the viewport
    Scroll { offset_y: f32 },
    None,
}

impl Event {
    pub fn new(event_type: EventType, target: NodeId, data: EventData) -> Self {
        Self {
            event_type,
            target,
            data,
            propagation_stopped: false,
        }
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }
}

/// Event handler function type
pub type EventHandler = Box<dyn Fn(&Event) + Send + Sync>;

struct Listener<H> {
    target: NodeId,
    event_type: EventType,
    handler: H,
}

/// Routes events to listeners registered per node and event type
///
/// `H` is whatever the owner wants to attach: boxed closures for ad-hoc
/// callbacks, or a plain tag the owner interprets itself.
pub struct EventDispatcher<H = EventHandler> {
    listeners: SlotMap<ListenerId, Listener<H>>,
    index: FxHashMap<(NodeId, EventType), SmallVec<[ListenerId; 4]>>,
}

impl<H> EventDispatcher<H> {
    pub fn new() -> Self {
        Self {
            listeners: SlotMap::with_key(),
            index: FxHashMap::default(),
        }
    }

    /// Register a listener for a node and event type
    pub fn subscribe(&mut self, target: NodeId, event_type: EventType, handler: H) -> ListenerId {
        let id = self.listeners.insert(Listener {
            target,
            event_type,
            handler,
        });
        self.index.entry((target, event_type)).or_default().push(id);
        id
    }

    /// Remove a listener by its id
    ///
    /// Returns the handler that was attached, or `None` if the id is unknown
    /// or was already removed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> Option<H> {
        let listener = self.listeners.remove(id)?;
        let key = (listener.target, listener.event_type);
        if let Some(ids) = self.index.get_mut(&key) {
            ids.retain(|l| *l != id);
            if ids.is_empty() {
                self.index.remove(&key);
            }
        }
        Some(listener.handler)
    }

    /// Remove every listener attached to a node
    pub fn unsubscribe_target(&mut self, target: NodeId) -> usize {
        let ids: SmallVec<[ListenerId; 8]> = self
            .listeners
            .iter()
            .filter(|(_, l)| l.target == target)
            .map(|(id, _)| id)
            .collect();
        ids.iter().filter(|id| self.unsubscribe(**id).is_some()).count()
    }

    pub fn is_subscribed(&self, id: ListenerId) -> bool {
        self.listeners.contains_key(id)
    }

    /// Listener ids for a node and event type, in subscription order
    pub fn listener_ids(&self, target: NodeId, event_type: EventType) -> SmallVec<[ListenerId; 4]> {
        self.index
            .get(&(target, event_type))
            .cloned()
            .unwrap_or_default()
    }

    /// Listeners for a node and event type, in subscription order
    pub fn listeners(
        &self,
        target: NodeId,
        event_type: EventType,
    ) -> impl Iterator<Item = (ListenerId, &H)> + '_ {
        self.index
            .get(&(target, event_type))
            .into_iter()
            .flatten()
            .filter_map(move |id| self.listeners.get(*id).map(|l| (*id, &l.handler)))
    }

    pub fn handler(&self, id: ListenerId) -> Option<&H> {
        self.listeners.get(id).map(|l| &l.handler)
    }

    /// Total number of attached listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Number of listeners attached to one node
    pub fn listener_count_for(&self, target: NodeId) -> usize {
        self.listeners
            .iter()
            .filter(|(_, l)| l.target == target)
            .count()
    }
}

impl EventDispatcher<EventHandler> {
    /// Register a closure listener
    pub fn subscribe_fn<F>(&mut self, target: NodeId, event_type: EventType, handler: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.subscribe(target, event_type, Box::new(handler))
    }

    /// Dispatch an event to all registered handlers
    pub fn dispatch(&self, event: &mut Event) {
        let Some(ids) = self.index.get(&(event.target, event.event_type)) else {
            return;
        };
        for id in ids {
            if event.propagation_stopped {
                break;
            }
            if let Some(listener) = self.listeners.get(*id) {
                (listener.handler)(&*event);
            }
        }
    }
}

impl<H> Default for EventDispatcher<H> {
    fn default() -> Self {
        Self::new()
    }
}
