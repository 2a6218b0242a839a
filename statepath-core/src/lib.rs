//! Statepath Core
//!
//! This crate binds a path-addressed state tree to async side effects. It
//! implements:
//!
//! - A persistent state tree with structural sharing
//! - Path expressions (`user.todos[0].title`) to read and write any location
//! - A generic path reducer that applies path-targeted writes
//! - An async interceptor that runs effects with a scoped read/write capability
//! - View bindings (selectors, setters, effect triggers)
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `tree`: the state tree value and path expressions
//! - `action`: actions and the intent they declare
//! - `reducer`: the reducer trait and the path reducer
//! - `pipeline`: middleware, including the async interceptor
//! - `effect`: effect functions and the capability they receive
//! - `store`: the store host that runs the pipeline
//! - `bindings`: read/write/trigger handles for a view layer
//!
//! # Example
//!
//! ```rust
//! use statepath_core::{Action, BoxError, Effect, Store};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), BoxError> {
//! let store = Store::new(serde_json::json!({}));
//!
//! // A plain path write
//! store.dispatch(Action::write("count", 5)?)?;
//!
//! // An effect that reads and writes through its capability
//! let increment = Effect::new(|cap| async move {
//!     let count = cap.get("count")?.and_then(|v| v.as_i64()).unwrap_or(0);
//!     cap.set("count", count + 1)?;
//!     Ok::<_, BoxError>(())
//! });
//! store.dispatch(Action::effect("incr", increment, ()))?.await?;
//!
//! assert_eq!(store.get("count")?.and_then(|v| v.as_i64()), Some(6));
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod bindings;
pub mod config;
pub mod effect;
pub mod error;
pub mod pipeline;
pub mod reducer;
pub mod store;
pub mod subscriber;
pub mod tree;

pub use action::{Action, Intent};
pub use config::{ConflictPolicy, StoreConfig};
pub use effect::{Capability, Effect};
pub use error::{BoxError, Error, Result};
pub use reducer::{PathReducer, Reducer};
pub use store::{Dispatched, Store, StoreBuilder};
pub use subscriber::SubscriptionId;
pub use tree::{Path, StateTree};
