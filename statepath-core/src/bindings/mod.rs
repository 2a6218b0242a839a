//! View Bindings
//!
//! Thin handles a view layer uses to talk to a store without touching its
//! dispatch or subscribe machinery directly. Every binding is built from an
//! explicit [`Store`] handle.
//!
//! - [`value`]: a [`Selector`] tracking the value at a path
//! - [`setter`]: a [`Setter`] writing to a path
//! - [`binding`]: both at once, for read/write fields
//! - [`trigger`]: a [`Trigger`] firing an effect with a payload

mod selector;

pub use selector::Selector;

use crate::action::{default_kind, Action};
use crate::effect::Effect;
use crate::error::Result;
use crate::store::{Dispatched, Store};
use crate::tree::{Path, StateTree};

/// Track the value at `path`.
pub fn value(store: &Store, path: &str) -> Result<Selector> {
    Selector::new(store, path)
}

/// Write to `path`. Actions are labelled `name`, or `SET[<path>]` when
/// `name` is missing or empty.
pub fn setter(store: &Store, path: &str, name: Option<&str>) -> Result<Setter> {
    let path = Path::parse(path)?;
    let kind = match name.filter(|name| !name.is_empty()) {
        Some(name) => name.to_string(),
        None => default_kind(&path),
    };
    Ok(Setter {
        store: store.clone(),
        path,
        kind,
    })
}

/// A selector and a setter for the same path.
pub fn binding(store: &Store, path: &str, name: Option<&str>) -> Result<(Selector, Setter)> {
    Ok((value(store, path)?, setter(store, path, name)?))
}

/// Dispatch `kind` actions carrying `effect`.
pub fn trigger(store: &Store, kind: impl Into<String>, effect: Effect) -> Trigger {
    Trigger {
        store: store.clone(),
        kind: kind.into(),
        effect,
    }
}

/// Write binding for one path.
#[derive(Debug, Clone)]
pub struct Setter {
    store: Store,
    path: Path,
    kind: String,
}

impl Setter {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Label of the actions this setter dispatches.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn set(&self, payload: impl Into<StateTree>) -> Result<Dispatched> {
        let action = Action::write_path(self.path.clone(), payload).named(self.kind.as_str());
        self.store.dispatch(action)
    }
}

/// Effect-trigger binding.
#[derive(Debug, Clone)]
pub struct Trigger {
    store: Store,
    kind: String,
    effect: Effect,
}

impl Trigger {
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Dispatch the effect with `payload`. Await the result to wait for the
    /// effect to settle.
    pub fn fire(&self, payload: impl Into<StateTree>) -> Result<Dispatched> {
        let action = Action::effect(self.kind.as_str(), self.effect.clone(), payload);
        self.store.dispatch(action)
    }
}
