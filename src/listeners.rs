//! Local listener registry.
//!
//! Listeners are keyed by [`EventKind`] and called in registration order.
//! Dispatch copies the listener list out of the lock before invoking
//! anything, so a callback may register, remove, or call back into the
//! client without deadlocking.

use crate::events::Event;
use contactio_proto::EventKind;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A shared callback handle.
///
/// Identity is the callback allocation: clones of one `Listener` are the same
/// listener, two `Listener::new` calls with equal closures are not.
#[derive(Clone)]
pub struct Listener(Arc<dyn Fn(&Event) + Send + Sync>);

impl Listener {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        Self(Arc::new(callback))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }

    /// Whether both handles point at the same callback.
    pub fn same_as(&self, other: &Listener) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// Map from event kind to listeners.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: RwLock<HashMap<EventKind, Vec<Listener>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `kind`. Registering the same handle twice
    /// makes it fire twice.
    pub fn add(&self, kind: EventKind, listener: Listener) {
        self.listeners.write().entry(kind).or_default().push(listener);
    }

    /// Remove the first registration of `listener` for `kind`.
    pub fn remove(&self, kind: EventKind, listener: &Listener) -> bool {
        let mut map = self.listeners.write();
        let Some(list) = map.get_mut(&kind) else {
            return false;
        };
        let Some(pos) = list.iter().position(|l| l.same_as(listener)) else {
            return false;
        };
        list.remove(pos);
        if list.is_empty() {
            map.remove(&kind);
        }
        true
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.listeners.read().get(&kind).map_or(0, Vec::len)
    }

    /// Invoke every listener registered for the event's kind.
    pub fn dispatch(&self, event: &Event) {
        let snapshot: Vec<Listener> = match self.listeners.read().get(&event.kind()) {
            Some(list) => list.clone(),
            None => return,
        };
        for listener in &snapshot {
            listener.call(event);
        }
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let map = self.listeners.read();
        let counts: HashMap<_, _> = map.iter().map(|(k, v)| (k.as_str(), v.len())).collect();
        f.debug_struct("ListenerRegistry")
            .field("listeners", &counts)
            .finish()
    }
}
