//! Reducers
//!
//! A reducer is a pure function `(state, action) -> state`. The store calls
//! it for every action that reaches the end of the middleware chain.
//!
//! [`PathReducer`] is the one reducer most stores need: it stores the
//! action's payload at the action's path and returns every other action's
//! input unchanged (the very same tree, not a copy).

use crate::action::Action;
use crate::config::ConflictPolicy;
use crate::error::Result;
use crate::tree::StateTree;

pub trait Reducer: Send + Sync + 'static {
    /// State the store starts from.
    fn initial_state(&self) -> StateTree;

    /// Produce the next state. Must not have side effects.
    fn reduce(&self, state: &StateTree, action: &Action) -> Result<StateTree>;
}

/// Applies path writes to the state tree.
#[derive(Debug, Clone)]
pub struct PathReducer {
    initial: StateTree,
    policy: ConflictPolicy,
}

impl PathReducer {
    pub fn new(initial: impl Into<StateTree>) -> Self {
        Self::with_policy(initial, ConflictPolicy::default())
    }

    pub fn with_policy(initial: impl Into<StateTree>, policy: ConflictPolicy) -> Self {
        Self {
            initial: initial.into(),
            policy,
        }
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }
}

impl Default for PathReducer {
    fn default() -> Self {
        Self::new(StateTree::empty_map())
    }
}

impl Reducer for PathReducer {
    fn initial_state(&self) -> StateTree {
        self.initial.clone()
    }

    fn reduce(&self, state: &StateTree, action: &Action) -> Result<StateTree> {
        match action.path() {
            Some(path) => state.set_in(path, action.payload().clone(), self.policy),
            None => Ok(state.clone()),
        }
    }
}
