//! Subscriber types for state change notification.
//!
//! A Listener is any callback that wants to hear about new state trees:
//! view bindings, selectors, loggers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::tree::StateTree;

/// Unique identifier for a subscription.
///
/// Returned by `subscribe` calls and accepted by the matching `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Generate a new unique subscription ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

/// A callback notified with each new state tree.
#[derive(Clone)]
pub struct Listener {
    id: SubscriptionId,
    notify: Arc<dyn Fn(&StateTree) + Send + Sync>,
}

impl Listener {
    pub fn new<F>(notify: F) -> Self
    where
        F: Fn(&StateTree) + Send + Sync + 'static,
    {
        Self {
            id: SubscriptionId::new(),
            notify: Arc::new(notify),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn notify(&self, state: &StateTree) {
        (self.notify)(state);
    }
}
