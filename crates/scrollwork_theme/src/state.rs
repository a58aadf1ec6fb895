//! Theme state cell
//!
//! Reads take a shared lock on the scheme; subscribers live behind a mutex.
//! Both locks are released before subscribers run, so a subscriber may read
//! the scheme, subscribe, or unsubscribe itself.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use slotmap::{new_key_type, SlotMap};

use crate::scheme::ColorScheme;

new_key_type! {
    /// Handle returned by [`ThemeState::subscribe`]
    pub struct SubscriberId;
}

type Subscriber = Arc<dyn Fn(ColorScheme) + Send + Sync>;

/// Current color scheme plus change subscribers
pub struct ThemeState {
    scheme: RwLock<ColorScheme>,
    subscribers: Mutex<SlotMap<SubscriberId, Subscriber>>,
}

impl ThemeState {
    pub fn new(scheme: ColorScheme) -> Self {
        Self {
            scheme: RwLock::new(scheme),
            subscribers: Mutex::new(SlotMap::with_key()),
        }
    }

    // ========== Color Scheme ==========

    /// Get the current color scheme
    pub fn scheme(&self) -> ColorScheme {
        *self.scheme.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the color scheme, notifying subscribers if it changed
    ///
    /// Returns `true` if the scheme changed.
    pub fn set_scheme(&self, scheme: ColorScheme) -> bool {
        let mut current = self.scheme.write().unwrap_or_else(PoisonError::into_inner);
        if *current == scheme {
            return false;
        }
        let previous = *current;
        tracing::debug!(from = %previous, to = %scheme, "switching color scheme");
        *current = scheme;
        drop(current);

        let subscribers: Vec<Subscriber> = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for subscriber in subscribers {
            subscriber(scheme);
        }
        true
    }

    /// Toggle between light and dark; returns the new scheme
    pub fn toggle(&self) -> ColorScheme {
        let next = self.scheme().toggle();
        self.set_scheme(next);
        next
    }

    // ========== Subscribers ==========

    /// Call `f` with the new scheme after every change
    pub fn subscribe<F>(&self, f: F) -> SubscriberId
    where
        F: Fn(ColorScheme) + Send + Sync + 'static,
    {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(Arc::new(f))
    }

    /// Remove a subscriber; unknown or already removed ids return `false`
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some();
        if !removed {
            tracing::debug!(?id, "unsubscribe of unknown theme subscriber ignored");
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for ThemeState {
    fn default() -> Self {
        Self::new(ColorScheme::default())
    }
}
