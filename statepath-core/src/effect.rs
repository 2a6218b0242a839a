//! Effects and Capabilities
//!
//! An [`Effect`] is an async function attached to an action. When the
//! [`AsyncInterceptor`](crate::pipeline::AsyncInterceptor) sees such an
//! action it first lets the action through the rest of the pipeline, then
//! spawns the effect with a fresh [`Capability`].
//!
//! # The Capability
//!
//! The capability is the effect's only handle on the store:
//!
//! - `payload()`: the triggering action's payload
//! - `get(path)`: read the live state, including every write already applied
//! - `set(path, payload)`: dispatch a path write through the whole pipeline
//!
//! Each `set` is applied before it returns, so sequential calls land in the
//! order they are made. Writes from different effects interleave at their
//! await points in whatever order the runtime schedules them.
//!
//! # Failure
//!
//! An effect that returns `Err` (or panics) fails the dispatch it belongs
//! to. Writes it issued before failing stay applied.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};

use crate::action::Action;
use crate::error::{BoxError, Result};
use crate::store::Store;
use crate::tree::StateTree;

/// Counter for generating unique effect IDs.
static EFFECT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_effect_id() -> u64 {
    EFFECT_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

type EffectFn =
    dyn Fn(Capability) -> BoxFuture<'static, std::result::Result<StateTree, BoxError>> + Send + Sync;

/// An async function run on behalf of an action.
///
/// # Example
///
/// ```rust
/// use statepath_core::{Action, BoxError, Effect, Store};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), BoxError> {
/// let increment = Effect::new(|cap| async move {
///     let count = cap.get("count")?.and_then(|v| v.as_i64()).unwrap_or(0);
///     cap.set("count", count + 1)?;
///     Ok::<_, BoxError>(())
/// });
///
/// let store = Store::new(serde_json::json!({"count": 1}));
/// store.dispatch(Action::effect("incr", increment, ()))?.await?;
/// assert_eq!(store.get("count")?.and_then(|v| v.as_i64()), Some(2));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Effect {
    id: u64,
    run: Arc<EffectFn>,
}

impl Effect {
    pub fn new<F, Fut, T>(run: F) -> Self
    where
        F: Fn(Capability) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, BoxError>> + Send + 'static,
        T: Into<StateTree>,
    {
        Self {
            id: next_effect_id(),
            run: Arc::new(move |capability| {
                run(capability).map(|result| result.map(Into::into)).boxed()
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Start the effect. Nothing runs until the returned future is polled.
    pub(crate) fn call(
        &self,
        capability: Capability,
    ) -> BoxFuture<'static, std::result::Result<StateTree, BoxError>> {
        (self.run)(capability)
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Effect#{}", self.id)
    }
}

/// Scoped read/write access handed to one effect invocation.
#[derive(Clone)]
pub struct Capability {
    payload: StateTree,
    store: Store,
}

impl Capability {
    pub(crate) fn new(store: Store, payload: StateTree) -> Self {
        Self { payload, store }
    }

    /// Payload of the action that triggered the effect.
    pub fn payload(&self) -> &StateTree {
        &self.payload
    }

    /// Write `payload` at `path`, labelled `SET[<path>]`.
    pub fn set(&self, path: &str, payload: impl Into<StateTree>) -> Result<()> {
        self.set_named(path, payload, None)
    }

    /// Write `payload` at `path` under an explicit label.
    pub fn set_named(
        &self,
        path: &str,
        payload: impl Into<StateTree>,
        name: Option<&str>,
    ) -> Result<()> {
        let action = Action::write(path, payload)?.named_or_default(name);
        self.store.dispatch(action)?;
        Ok(())
    }

    /// Read the current value at `path`.
    pub fn get(&self, path: &str) -> Result<Option<StateTree>> {
        self.store.get(path)
    }

    /// Snapshot of the whole current state.
    pub fn state(&self) -> StateTree {
        self.store.state()
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}
