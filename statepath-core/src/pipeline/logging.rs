//! Action logging.

use tracing::{debug, warn};

use crate::action::Action;
use crate::error::Result;
use crate::pipeline::{Middleware, Next};
use crate::store::{Dispatched, Store};

/// Emits a `debug` event for each action and its outcome, and a `warn` event
/// when the rest of the pipeline rejects it.
///
/// Register it first so that it sees every action, including the writes
/// issued by effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMiddleware;

impl Middleware for LoggingMiddleware {
    fn handle(&self, _store: &Store, action: Action, next: Next<'_>) -> Result<Dispatched> {
        let kind = action.kind().to_string();
        debug!(action = %kind, intent = ?action.intent(), "dispatching");

        match next.run(action) {
            Ok(dispatched) => {
                debug!(
                    action = %kind,
                    changed = dispatched.changed(),
                    effect = dispatched.has_effect(),
                    "dispatched"
                );
                Ok(dispatched)
            }
            Err(error) => {
                warn!(action = %kind, %error, "dispatch failed");
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::config::StoreConfig;
    use crate::Error;

    fn logged_store() -> Store {
        let config = StoreConfig {
            log_actions: true,
            ..StoreConfig::default()
        };
        Store::from_config(json!({"count": 1}), &config)
    }

    #[test]
    fn passes_actions_through() {
        let store = logged_store();
        let dispatched = store.dispatch(Action::write("count", 2).unwrap()).unwrap();
        assert!(dispatched.changed());
        assert_eq!(store.get("count").unwrap().and_then(|v| v.as_i64()), Some(2));
    }

    #[test]
    fn passes_errors_through() {
        let store = logged_store();
        let err = store
            .dispatch(Action::write("count.inner", 2).unwrap())
            .unwrap_err();
        assert!(matches!(err, Error::TypeConflict { .. }));
    }
}
