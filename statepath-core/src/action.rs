//! Actions
//!
//! An action names a transition (`kind`), carries a payload, and declares
//! what the pipeline should do with it. The declaration is an [`Intent`],
//! fixed when the action is built, so nothing downstream has to probe the
//! action's shape:
//!
//! - `Write(path)`: the path reducer stores the payload at `path`.
//! - `Effect(effect)`: the interceptor runs `effect` after forwarding.
//! - `WriteThenEffect(path, effect)`: both, write first. The effect's first
//!   read already sees the write.
//! - `Opaque`: passes through untouched; useful for custom reducers.
//!
//! The `kind` is a free-form label for tracing and never changes dispatch
//! behavior.

use std::fmt;

use crate::effect::Effect;
use crate::error::Result;
use crate::tree::{Path, StateTree};

/// The default label of a path write: `SET[<path>]`.
pub fn default_kind(path: &Path) -> String {
    format!("SET[{path}]")
}

/// What the pipeline does with an action.
#[derive(Clone)]
pub enum Intent {
    Opaque,
    Write(Path),
    Effect(Effect),
    WriteThenEffect(Path, Effect),
}

impl Intent {
    /// The target path, if this intent writes.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Intent::Write(path) | Intent::WriteThenEffect(path, _) => Some(path),
            Intent::Opaque | Intent::Effect(_) => None,
        }
    }

    /// The effect, if this intent runs one.
    pub fn effect(&self) -> Option<&Effect> {
        match self {
            Intent::Effect(effect) | Intent::WriteThenEffect(_, effect) => Some(effect),
            Intent::Opaque | Intent::Write(_) => None,
        }
    }
}

impl fmt::Debug for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::Opaque => f.write_str("Opaque"),
            Intent::Write(path) => write!(f, "Write({path})"),
            Intent::Effect(effect) => write!(f, "Effect({effect:?})"),
            Intent::WriteThenEffect(path, effect) => {
                write!(f, "WriteThenEffect({path}, {effect:?})")
            }
        }
    }
}

/// An immutable record describing a state transition or an effect to run.
#[derive(Debug, Clone)]
pub struct Action {
    kind: String,
    payload: StateTree,
    intent: Intent,
}

impl Action {
    /// An action no built-in stage acts on.
    pub fn new(kind: impl Into<String>, payload: impl Into<StateTree>) -> Self {
        Self {
            kind: kind.into(),
            payload: payload.into(),
            intent: Intent::Opaque,
        }
    }

    /// A write of `payload` at `path`, labelled `SET[<path>]`.
    pub fn write(path: &str, payload: impl Into<StateTree>) -> Result<Self> {
        Ok(Self::write_path(Path::parse(path)?, payload))
    }

    pub fn write_path(path: Path, payload: impl Into<StateTree>) -> Self {
        Self {
            kind: default_kind(&path),
            payload: payload.into(),
            intent: Intent::Write(path),
        }
    }

    /// An action whose effect runs once the action has passed the pipeline.
    pub fn effect(kind: impl Into<String>, effect: Effect, payload: impl Into<StateTree>) -> Self {
        Self {
            kind: kind.into(),
            payload: payload.into(),
            intent: Intent::Effect(effect),
        }
    }

    /// Replace the label.
    pub fn named(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Replace the label unless `name` is missing or empty.
    pub fn named_or_default(self, name: Option<&str>) -> Self {
        match name.filter(|name| !name.is_empty()) {
            Some(name) => self.named(name),
            None => self,
        }
    }

    /// Attach an effect. A write becomes a write-then-effect; any effect
    /// already attached is replaced.
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.intent = match self.intent {
            Intent::Opaque | Intent::Effect(_) => Intent::Effect(effect),
            Intent::Write(path) | Intent::WriteThenEffect(path, _) => {
                Intent::WriteThenEffect(path, effect)
            }
        };
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn payload(&self) -> &StateTree {
        &self.payload
    }

    pub fn intent(&self) -> &Intent {
        &self.intent
    }

    pub fn path(&self) -> Option<&Path> {
        self.intent.path()
    }

    /// The effect this action carries, if any.
    pub fn attached_effect(&self) -> Option<&Effect> {
        self.intent.effect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn noop() -> Effect {
        Effect::new(|_| async { Ok::<_, crate::BoxError>(()) })
    }

    #[test]
    fn write_defaults_kind_to_set_path() {
        let action = Action::write("user.name", "ada").unwrap();
        assert_eq!(action.kind(), "SET[user.name]");
        assert_eq!(action.path().map(Path::as_str), Some("user.name"));
        assert_eq!(action.payload().as_str(), Some("ada"));
        assert!(action.attached_effect().is_none());
    }

    #[test]
    fn explicit_name_overrides_default() {
        let action = Action::write("count", 1).unwrap().named_or_default(Some("RESET"));
        assert_eq!(action.kind(), "RESET");
    }

    #[test]
    fn empty_name_falls_back_to_default() {
        let action = Action::write("count", 1).unwrap().named_or_default(Some(""));
        assert_eq!(action.kind(), "SET[count]");
        let action = Action::write("count", 1).unwrap().named_or_default(None);
        assert_eq!(action.kind(), "SET[count]");
    }

    #[test]
    fn malformed_path_fails_at_construction() {
        assert!(matches!(
            Action::write("a..b", 1),
            Err(Error::MalformedPath { .. })
        ));
    }

    #[test]
    fn opaque_action_has_no_intent() {
        let action = Action::new("ping", ());
        assert!(matches!(action.intent(), Intent::Opaque));
        assert!(action.path().is_none());
        assert!(action.attached_effect().is_none());
    }

    #[test]
    fn with_effect_combines_with_write() {
        let action = Action::write("loading", true).unwrap().with_effect(noop());
        assert!(matches!(action.intent(), Intent::WriteThenEffect(..)));
        assert!(action.path().is_some());
        assert!(action.attached_effect().is_some());

        let action = Action::new("load", ()).with_effect(noop());
        assert!(matches!(action.intent(), Intent::Effect(_)));
    }

    #[test]
    fn effect_action_exposes_its_effect() {
        let effect = noop();
        let action = Action::effect("load", effect.clone(), 7);
        assert_eq!(action.kind(), "load");
        assert_eq!(action.payload().as_i64(), Some(7));
        assert!(action.path().is_none());
        assert_eq!(action.attached_effect().map(Effect::id), Some(effect.id()));
    }

    #[test]
    fn debug_shows_intent() {
        let action = Action::write("a.b", 1).unwrap();
        let debug = format!("{action:?}");
        assert!(debug.contains("Write(a.b)"));
        assert!(debug.contains("SET[a.b]"));
    }
}
