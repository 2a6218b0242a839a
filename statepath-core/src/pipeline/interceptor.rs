//! Async Interceptor
//!
//! Runs the effect attached to an action.
//!
//! # Order of Events
//!
//! 1. The action is forwarded to the rest of the pipeline and applied.
//! 2. A [`Capability`] is built from the store and the action's payload.
//! 3. The effect is spawned on the ambient tokio runtime; its join handle is
//!    attached to the returned [`Dispatched`].
//!
//! Step 1 always completes before the effect starts, so the effect's first
//! `get` sees the triggering action's own write, and everything the effect
//! `set`s lands after it.
//!
//! If forwarding fails (for instance a write-then-effect action with a
//! conflicting path), the effect is never started. If no runtime is
//! available the dispatch is rejected before anything is applied.

use tokio::runtime::Handle;
use tracing::{debug, trace, warn};

use crate::action::Action;
use crate::effect::{Capability, Effect};
use crate::error::{BoxError, Error, Result};
use crate::pipeline::{Middleware, Next};
use crate::store::{Dispatched, Store};
use crate::tree::StateTree;

/// Middleware that executes effect-bearing actions.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsyncInterceptor;

impl Middleware for AsyncInterceptor {
    fn handle(&self, store: &Store, action: Action, next: Next<'_>) -> Result<Dispatched> {
        let Some(effect) = action.attached_effect().cloned() else {
            return next.run(action);
        };

        let kind = action.kind().to_string();
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime {
            action: kind.clone(),
        })?;
        let capability = Capability::new(store.clone(), action.payload().clone());

        let mut dispatched = next.run(action)?;

        debug!(action = %kind, effect = effect.id(), "spawning effect");
        let task = runtime.spawn(run_effect(kind.clone(), effect, capability));
        dispatched.attach(kind, task);
        Ok(dispatched)
    }
}

async fn run_effect(
    kind: String,
    effect: Effect,
    capability: Capability,
) -> std::result::Result<StateTree, BoxError> {
    let result = effect.call(capability).await;
    match &result {
        Ok(_) => trace!(action = %kind, effect = effect.id(), "effect settled"),
        Err(error) => warn!(action = %kind, effect = effect.id(), %error, "effect failed"),
    }
    result
}
