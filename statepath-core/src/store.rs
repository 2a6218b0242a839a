//! Store
//!
//! The store owns the current state tree, the reducer, the middleware chain
//! and the listeners. It is a cheap, cloneable handle: every clone talks to
//! the same state.
//!
//! # Dispatch
//!
//! `dispatch` is synchronous. The action runs through the middleware chain in
//! registration order and then through the reducer; the new tree is stored
//! and listeners are notified before `dispatch` returns. Reducer application
//! and notification run under a re-entrant gate, so:
//!
//! - a listener (or anything else on the dispatching thread) may dispatch
//!   again from inside a dispatch,
//! - two dispatches from different threads never interleave their reducer
//!   applications.
//!
//! Listeners are only notified when the reducer returned a different tree.
//!
//! # Completion
//!
//! `dispatch` returns a [`Dispatched`]. Awaiting it waits for the effect the
//! action carried, if any, and yields the effect's return value.

use std::fmt;
use std::future::IntoFuture;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use indexmap::IndexMap;
use parking_lot::{Mutex, ReentrantMutex};
use tokio::task::JoinHandle;

use crate::action::Action;
use crate::config::StoreConfig;
use crate::error::{BoxError, Error, Result};
use crate::pipeline::{AsyncInterceptor, LoggingMiddleware, Middleware, Next};
use crate::reducer::{PathReducer, Reducer};
use crate::subscriber::{Listener, SubscriptionId};
use crate::tree::{Path, StateTree};

/// Handle to a state store.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    state: Mutex<StateTree>,
    reducer: Box<dyn Reducer>,
    middleware: Vec<Box<dyn Middleware>>,
    listeners: Mutex<IndexMap<SubscriptionId, Listener>>,
    gate: ReentrantMutex<()>,
}

impl Store {
    /// A store running a [`PathReducer`] behind the [`AsyncInterceptor`].
    pub fn new(initial: impl Into<StateTree>) -> Self {
        Self::from_config(initial, &StoreConfig::default())
    }

    /// Like [`Store::new`], with the conflict policy and action logging taken
    /// from `config`.
    pub fn from_config(initial: impl Into<StateTree>, config: &StoreConfig) -> Self {
        let mut builder = Self::builder(PathReducer::with_policy(initial, config.conflict_policy));
        if config.log_actions {
            builder = builder.middleware(LoggingMiddleware);
        }
        builder.middleware(AsyncInterceptor).build()
    }

    pub fn builder(reducer: impl Reducer) -> StoreBuilder {
        StoreBuilder {
            reducer: Box::new(reducer),
            middleware: Vec::new(),
        }
    }

    /// Snapshot of the current state. Cheap: containers are shared.
    pub fn state(&self) -> StateTree {
        self.inner.state.lock().clone()
    }

    /// Read the current value at `path`.
    pub fn get(&self, path: &str) -> Result<Option<StateTree>> {
        let path = Path::parse(path)?;
        Ok(self.get_path(&path))
    }

    pub fn get_path(&self, path: &Path) -> Option<StateTree> {
        self.inner.state.lock().get_in(path).cloned()
    }

    /// Send an action through the middleware chain and the reducer.
    pub fn dispatch(&self, action: Action) -> Result<Dispatched> {
        Next::new(self, &self.inner.middleware).run(action)
    }

    /// Register a listener called with every new state tree.
    pub fn subscribe<F>(&self, notify: F) -> SubscriptionId
    where
        F: Fn(&StateTree) + Send + Sync + 'static,
    {
        let listener = Listener::new(notify);
        let id = listener.id();
        self.inner.listeners.lock().insert(id, listener);
        id
    }

    /// Like [`Store::subscribe`], but first hands `seed` the current tree.
    ///
    /// Both run under the dispatch gate: no action is applied between the
    /// seed and the registration, so the listener hears about every tree
    /// newer than the one `seed` saw.
    pub fn subscribe_seeded<S, F>(&self, seed: S, notify: F) -> SubscriptionId
    where
        S: FnOnce(&StateTree),
        F: Fn(&StateTree) + Send + Sync + 'static,
    {
        let _gate = self.inner.gate.lock();
        seed(&self.state());
        self.subscribe(notify)
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.listeners.lock().shift_remove(&id).is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    /// The last stage of every dispatch: reduce, store, notify.
    pub(crate) fn apply(&self, action: Action) -> Result<Dispatched> {
        let _gate = self.inner.gate.lock();

        let (next, changed) = {
            let mut state = self.inner.state.lock();
            let next = self.inner.reducer.reduce(&state, &action)?;
            let changed = !StateTree::same(&state, &next);
            if changed {
                *state = next.clone();
            }
            (next, changed)
        };
        tracing::trace!(action = action.kind(), changed, "applied action");

        if changed {
            // Listeners may subscribe, unsubscribe or dispatch; don't hold the lock.
            let listeners: Vec<Listener> = self.inner.listeners.lock().values().cloned().collect();
            for listener in &listeners {
                listener.notify(&next);
            }
        }

        Ok(Dispatched::new(changed))
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state())
            .field("middleware", &self.inner.middleware.len())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

pub struct StoreBuilder {
    reducer: Box<dyn Reducer>,
    middleware: Vec<Box<dyn Middleware>>,
}

impl StoreBuilder {
    /// Append a middleware. Actions visit middleware in the order added.
    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        self.middleware.push(Box::new(middleware));
        self
    }

    pub fn build(self) -> Store {
        let state = self.reducer.initial_state();
        Store {
            inner: Arc::new(StoreInner {
                state: Mutex::new(state),
                reducer: self.reducer,
                middleware: self.middleware,
                listeners: Mutex::new(IndexMap::new()),
                gate: ReentrantMutex::new(()),
            }),
        }
    }
}

/// Outcome of a dispatch.
///
/// The synchronous part (reducer, listeners) is already done. If the action
/// carried an effect, it is running; `.await` waits for it and yields its
/// return value, or `None` when there was no effect. Dropping a `Dispatched`
/// does not stop the effect.
pub struct Dispatched {
    changed: bool,
    pending: Option<PendingEffect>,
}

struct PendingEffect {
    action: String,
    task: JoinHandle<std::result::Result<StateTree, BoxError>>,
}

impl Dispatched {
    /// A finished dispatch with no effect. Middleware that swallows an
    /// action returns `Dispatched::new(false)`.
    pub fn new(changed: bool) -> Self {
        Self {
            changed,
            pending: None,
        }
    }

    pub(crate) fn attach(
        &mut self,
        action: String,
        task: JoinHandle<std::result::Result<StateTree, BoxError>>,
    ) {
        self.pending = Some(PendingEffect { action, task });
    }

    /// Whether the reducer produced a new state tree.
    pub fn changed(&self) -> bool {
        self.changed
    }

    pub fn has_effect(&self) -> bool {
        self.pending.is_some()
    }

    /// True once there is nothing left to wait for.
    pub fn is_settled(&self) -> bool {
        self.pending
            .as_ref()
            .map_or(true, |pending| pending.task.is_finished())
    }
}

impl IntoFuture for Dispatched {
    type Output = Result<Option<StateTree>>;
    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        async move {
            match self.pending {
                Some(pending) => pending.settle().await.map(Some),
                None => Ok(None),
            }
        }
        .boxed()
    }
}

impl PendingEffect {
    async fn settle(self) -> Result<StateTree> {
        match self.task.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => Err(Error::EffectFailed {
                action: self.action,
                source,
            }),
            Err(join) if join.is_panic() => Err(Error::EffectPanicked {
                action: self.action,
            }),
            Err(_) => Err(Error::EffectCancelled {
                action: self.action,
            }),
        }
    }
}

impl fmt::Debug for Dispatched {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatched")
            .field("changed", &self.changed)
            .field("effect", &self.pending.as_ref().map(|p| p.action.as_str()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    fn count(store: &Store) -> Option<i64> {
        store.get("count").unwrap().and_then(|v| v.as_i64())
    }

    #[test]
    fn starts_from_the_reducer_initial_state() {
        let store = Store::new(json!({"count": 3}));
        assert_eq!(count(&store), Some(3));
        assert_eq!(store.state(), StateTree::from(json!({"count": 3})));
    }

    #[test]
    fn dispatch_applies_path_writes() {
        let store = Store::new(json!({}));
        let dispatched = store.dispatch(Action::write("count", 5).unwrap()).unwrap();
        assert!(dispatched.changed());
        assert!(!dispatched.has_effect());
        assert!(dispatched.is_settled());
        assert_eq!(count(&store), Some(5));
    }

    #[test]
    fn opaque_actions_leave_state_alone() {
        let store = Store::new(json!({"count": 1}));
        let before = store.state();
        let dispatched = store.dispatch(Action::new("noop", 9)).unwrap();
        assert!(!dispatched.changed());
        assert!(StateTree::same(&before, &store.state()));
    }

    #[test]
    fn reducer_errors_surface_from_dispatch() {
        let store = Store::new(json!({"count": 1}));
        let err = store
            .dispatch(Action::write("count.inner", 2).unwrap())
            .unwrap_err();
        assert!(matches!(err, Error::TypeConflict { .. }));
        assert_eq!(count(&store), Some(1));
    }

    #[test]
    fn listeners_fire_only_on_change() {
        let store = Store::new(json!({}));
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        store.subscribe(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        store.dispatch(Action::new("noop", ())).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        store.dispatch(Action::write("a", 1).unwrap()).unwrap();
        store.dispatch(Action::write("b", 2).unwrap()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let store = Store::new(json!({}));
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let id = store.subscribe(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        store.dispatch(Action::write("a", 1).unwrap()).unwrap();
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.dispatch(Action::write("a", 2).unwrap()).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn subscribe_seeded_sees_the_current_tree_first() {
        let store = Store::new(json!({"count": 1}));
        let seeded = Arc::new(Mutex::new(None));
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();

        let seeded_clone = seeded.clone();
        store.subscribe_seeded(
            move |state| *seeded_clone.lock() = Some(state.clone()),
            move |_| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            },
        );
        assert_eq!(*seeded.lock(), Some(StateTree::from(json!({"count": 1}))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        store.dispatch(Action::write("count", 2).unwrap()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listeners_may_dispatch_reentrantly() {
        let store = Store::new(json!({"count": 0, "mirror": 0}));
        let handle = store.clone();
        store.subscribe(move |state| {
            let count = state.as_map().and_then(|m| m.get("count")).cloned();
            let mirror = state.as_map().and_then(|m| m.get("mirror")).cloned();
            if let Some(count) = count {
                if mirror.as_ref() != Some(&count) {
                    handle.dispatch(Action::write("mirror", count).unwrap()).unwrap();
                }
            }
        });

        store.dispatch(Action::write("count", 4).unwrap()).unwrap();
        assert_eq!(store.state(), StateTree::from(json!({"count": 4, "mirror": 4})));
    }

    #[test]
    fn from_config_uses_the_conflict_policy() {
        let config = StoreConfig::from_json(r#"{"conflict_policy": "replace"}"#).unwrap();
        let store = Store::from_config(json!({"count": 1}), &config);
        store
            .dispatch(Action::write("count.inner", 2).unwrap())
            .unwrap();
        assert_eq!(store.state(), StateTree::from(json!({"count": {"inner": 2}})));
    }

    #[tokio::test]
    async fn awaiting_without_effect_yields_none() {
        let store = Store::new(json!({}));
        let value = store.dispatch(Action::write("a", 1).unwrap()).unwrap().await.unwrap();
        assert!(value.is_none());
    }
}
