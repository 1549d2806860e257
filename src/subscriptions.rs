//! The set of conversations a client wants pushes for.
//!
//! Kept independently of the connection so it survives drops and can be
//! replayed on every (re)connect.

use contactio_proto::ConversationId;
use std::collections::BTreeSet;

/// Ordered set of subscribed conversation ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionSet {
    ids: BTreeSet<ConversationId>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `id`. Returns `false` if it was already tracked.
    pub fn insert(&mut self, id: ConversationId) -> bool {
        let added = self.ids.insert(id);
        if added {
            crate::metrics::set_tracked_subscriptions(self.ids.len());
        }
        added
    }

    /// Stop tracking `id`. Returns `false` if it was not tracked.
    pub fn remove(&mut self, id: &ConversationId) -> bool {
        let removed = self.ids.remove(id);
        if removed {
            crate::metrics::set_tracked_subscriptions(self.ids.len());
        }
        removed
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Sorted copy of the tracked ids, used for replay.
    pub fn snapshot(&self) -> Vec<ConversationId> {
        self.ids.iter().cloned().collect()
    }
}
