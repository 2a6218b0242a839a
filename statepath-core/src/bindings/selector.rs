//! Selector Implementation
//!
//! A Selector is the read side of a view binding. It holds the value found at
//! one path of the store and tracks which watchers depend on it.
//!
//! # How Selectors Work
//!
//! 1. On creation the selector reads the current value at its path and
//!    subscribes to its store, with no dispatch able to land in between.
//!
//! 2. On every store change it resolves its path against the new tree.
//!
//! 3. If the value at the path is a different node (see
//!    [`StateTree::same`]), the cached value is replaced and all watchers
//!    are notified. Writes elsewhere in the tree leave the node shared, so
//!    they cost a lookup and nothing more.
//!
//! Dropping the selector removes its store subscription.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::error::Result;
use crate::store::Store;
use crate::subscriber::SubscriptionId;
use crate::tree::{Path, StateTree};

type Watcher = Arc<dyn Fn(Option<&StateTree>) + Send + Sync>;

/// Live view of the value at one path.
///
/// # Example
///
/// ```rust
/// use statepath_core::{bindings, Action, Store};
///
/// # fn main() -> statepath_core::Result<()> {
/// let store = Store::new(serde_json::json!({}));
/// let name = bindings::value(&store, "user.name")?;
/// name.watch(|value| println!("name is now {value:?}"));
///
/// store.dispatch(Action::write("user.name", "ada")?)?;
/// // Watcher prints: name is now Some("ada")
/// assert_eq!(name.get().as_ref().and_then(|v| v.as_str()), Some("ada"));
/// # Ok(())
/// # }
/// ```
pub struct Selector {
    shared: Arc<Shared>,
    store: Store,
    subscription: SubscriptionId,
}

struct Shared {
    path: Path,

    /// Last value seen at `path`; `None` when the path does not resolve.
    value: RwLock<Option<StateTree>>,

    watchers: RwLock<Vec<(SubscriptionId, Watcher)>>,
}

impl Selector {
    pub(crate) fn new(store: &Store, path: &str) -> Result<Self> {
        let shared = Arc::new(Shared {
            path: Path::parse(path)?,
            value: RwLock::new(None),
            watchers: RwLock::new(Vec::new()),
        });

        let weak: Weak<Shared> = Arc::downgrade(&shared);
        let subscription = store.subscribe_seeded(
            |state| *shared.value.write() = state.get_in(&shared.path).cloned(),
            move |state| {
                if let Some(shared) = weak.upgrade() {
                    shared.refresh(state);
                }
            },
        );

        Ok(Self {
            shared,
            store: store.clone(),
            subscription,
        })
    }

    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    /// The current value at the path.
    pub fn get(&self) -> Option<StateTree> {
        self.shared.value.read().clone()
    }

    /// Register a callback for changes of the value at the path.
    pub fn watch<F>(&self, notify: F) -> SubscriptionId
    where
        F: Fn(Option<&StateTree>) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        self.shared.watchers.write().push((id, Arc::new(notify)));
        id
    }

    /// Remove a watcher. Returns whether it was registered.
    pub fn unwatch(&self, id: SubscriptionId) -> bool {
        let mut watchers = self.shared.watchers.write();
        let before = watchers.len();
        watchers.retain(|(watcher, _)| *watcher != id);
        watchers.len() != before
    }

    pub fn watcher_count(&self) -> usize {
        self.shared.watchers.read().len()
    }
}

impl Shared {
    fn refresh(&self, state: &StateTree) {
        let next = state.get_in(&self.path).cloned();
        {
            let mut value = self.value.write();
            if same_slot(value.as_ref(), next.as_ref()) {
                return;
            }
            *value = next.clone();
        }

        let watchers = self.watchers.read().clone();
        for (_, notify) in &watchers {
            notify(next.as_ref());
        }
    }
}

fn same_slot(a: Option<&StateTree>, b: Option<&StateTree>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => StateTree::same(a, b),
        (None, None) => true,
        _ => false,
    }
}

impl Drop for Selector {
    fn drop(&mut self) {
        self.store.unsubscribe(self.subscription);
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selector")
            .field("path", &self.shared.path.as_str())
            .field("value", &self.get())
            .field("watcher_count", &self.watcher_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
