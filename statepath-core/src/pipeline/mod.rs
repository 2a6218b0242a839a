//! Dispatch Pipeline
//!
//! Every action passes through the store's middleware chain before it reaches
//! the reducer. A middleware sees the action, may do work around it, and
//! hands it on with [`Next::run`]; the last `Next` applies the reducer.
//!
//! ```text
//! dispatch ──→ middleware[0] ──→ … ──→ middleware[n] ──→ reducer ──→ listeners
//!    ↑                                       │
//!    └──────── effect `set` calls ───────────┘
//! ```
//!
//! Two middleware ship with the crate:
//!
//! - [`AsyncInterceptor`] runs the effect attached to an action, after the
//!   action itself has gone through.
//! - [`LoggingMiddleware`] traces each action and its outcome.

mod interceptor;
mod logging;

pub use interceptor::AsyncInterceptor;
pub use logging::LoggingMiddleware;

use crate::action::Action;
use crate::error::Result;
use crate::store::{Dispatched, Store};

/// A stage of the dispatch pipeline.
pub trait Middleware: Send + Sync + 'static {
    /// Handle `action`. Call `next.run(..)` to pass it on; returning without
    /// doing so swallows the action.
    fn handle(&self, store: &Store, action: Action, next: Next<'_>) -> Result<Dispatched>;
}

/// The rest of the pipeline after the current middleware.
pub struct Next<'a> {
    store: &'a Store,
    chain: &'a [Box<dyn Middleware>],
}

impl<'a> Next<'a> {
    pub(crate) fn new(store: &'a Store, chain: &'a [Box<dyn Middleware>]) -> Self {
        Self { store, chain }
    }

    /// Forward `action` to the remaining stages.
    pub fn run(self, action: Action) -> Result<Dispatched> {
        match self.chain.split_first() {
            Some((head, rest)) => head.handle(self.store, action, Next::new(self.store, rest)),
            None => self.store.apply(action),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use parking_lot::Mutex;
    use serde_json::json;

    use crate::reducer::PathReducer;
    use crate::tree::StateTree;

    struct Recorder {
        log: Arc<Mutex<Vec<String>>>,
        name: &'static str,
    }

    impl Middleware for Recorder {
        fn handle(&self, _: &Store, action: Action, next: Next<'_>) -> Result<Dispatched> {
            self.log
                .lock()
                .push(format!("{}:before:{}", self.name, action.kind()));
            let result = next.run(action);
            self.log.lock().push(format!("{}:after", self.name));
            result
        }
    }

    fn recorder(log: Arc<Mutex<Vec<String>>>, name: &'static str) -> Recorder {
        Recorder { log, name }
    }

    /// Drops every write under `locked`.
    struct Lock;

    impl Middleware for Lock {
        fn handle(&self, _: &Store, action: Action, next: Next<'_>) -> Result<Dispatched> {
            if action.kind().starts_with("SET[locked") {
                return Ok(Dispatched::new(false));
            }
            next.run(action)
        }
    }

    #[test]
    fn middleware_runs_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let store = Store::builder(PathReducer::default())
            .middleware(recorder(log.clone(), "outer"))
            .middleware(recorder(log.clone(), "inner"))
            .build();

        store.dispatch(Action::write("a", 1).unwrap()).unwrap();

        assert_eq!(
            *log.lock(),
            vec![
                "outer:before:SET[a]",
                "inner:before:SET[a]",
                "inner:after",
                "outer:after",
            ]
        );
        assert_eq!(store.state(), StateTree::from(json!({"a": 1})));
    }

    #[test]
    fn middleware_can_swallow_actions() {
        let store = Store::builder(PathReducer::default())
            .middleware(Lock)
            .build();

        let dispatched = store.dispatch(Action::write("locked", 1).unwrap()).unwrap();
        assert!(!dispatched.changed());
        store.dispatch(Action::write("open", 1).unwrap()).unwrap();
        assert_eq!(store.state(), StateTree::from(json!({"open": 1})));
    }

    #[test]
    fn empty_chain_goes_straight_to_the_reducer() {
        let store = Store::builder(PathReducer::new(json!({"n": 0}))).build();
        store.dispatch(Action::write("n", 1).unwrap()).unwrap();
        assert_eq!(store.get("n").unwrap().and_then(|v| v.as_i64()), Some(1));
    }
}
