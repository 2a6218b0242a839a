//! State Tree
//!
//! The state tree is the single nested value a store holds. It is a tagged
//! union over three shapes: mappings, sequences and scalars.
//!
//! # Structural Sharing
//!
//! Containers live behind `Arc`, so cloning a tree is a reference-count bump
//! and never copies data. A write through [`StateTree::set_in`] rebuilds only
//! the containers along the written path; every other subtree of the result
//! is the same allocation as in the input tree. [`StateTree::same`] exposes
//! that identity.
//!
//! # Writes Through Scalars
//!
//! A write whose path descends through a scalar (say, `count.value` when
//! `count` is `5`) is a type conflict. [`ConflictPolicy::Fail`] reports it,
//! [`ConflictPolicy::Replace`] overwrites the scalar with a fresh container.
//! `Null` and missing entries are never conflicts; they are filled in.

mod path;

pub use path::{Path, Segment};

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::config::ConflictPolicy;
use crate::error::{Error, Result};

/// Mapping node contents.
pub type Map = IndexMap<String, StateTree>;

/// A leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(Arc<str>),
}

static NULL_NODE: StateTree = StateTree::NULL;

/// How many `Null`s a single write may append to a sequence.
pub const MAX_SEQ_PADDING: usize = 1 << 16;

/// A nested state value.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum StateTree {
    Map(Arc<Map>),
    Seq(Arc<Vec<StateTree>>),
    Scalar(Scalar),
}

impl StateTree {
    pub const NULL: StateTree = StateTree::Scalar(Scalar::Null);

    /// An empty mapping, the usual initial state.
    pub fn empty_map() -> Self {
        StateTree::Map(Arc::new(Map::new()))
    }

    pub fn empty_seq() -> Self {
        StateTree::Seq(Arc::new(Vec::new()))
    }

    /// Identity check: the same allocation for containers, equal values for
    /// scalars.
    pub fn same(a: &StateTree, b: &StateTree) -> bool {
        match (a, b) {
            (StateTree::Map(x), StateTree::Map(y)) => Arc::ptr_eq(x, y),
            (StateTree::Seq(x), StateTree::Seq(y)) => Arc::ptr_eq(x, y),
            (StateTree::Scalar(x), StateTree::Scalar(y)) => x == y,
            _ => false,
        }
    }

    /// Short name of this node's shape.
    pub fn kind(&self) -> &'static str {
        match self {
            StateTree::Map(_) => "a map",
            StateTree::Seq(_) => "a sequence",
            StateTree::Scalar(Scalar::Null) => "null",
            StateTree::Scalar(Scalar::Bool(_)) => "a bool",
            StateTree::Scalar(Scalar::Number(_)) => "a number",
            StateTree::Scalar(Scalar::String(_)) => "a string",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, StateTree::Scalar(Scalar::Null))
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            StateTree::Scalar(Scalar::Number(n)) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StateTree::Scalar(Scalar::Number(n)) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StateTree::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StateTree::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            StateTree::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[StateTree]> {
        match self {
            StateTree::Seq(seq) => Some(seq),
            _ => None,
        }
    }

    /// Resolve a path. Missing or untraversable locations are `None`.
    pub fn get_in(&self, path: &Path) -> Option<&StateTree> {
        path.segments()
            .iter()
            .try_fold(self, |node, segment| match (node, segment) {
                (StateTree::Map(map), segment) => map.get(segment.map_key().as_ref()),
                (StateTree::Seq(seq), Segment::Index(index)) => seq.get(*index),
                _ => None,
            })
    }

    /// Return a new tree with `value` stored at `path`.
    ///
    /// Missing containers along the path are created: a sequence when the
    /// next segment is an index, a mapping otherwise. Sequences written past
    /// their end are padded with `Null`, up to [`MAX_SEQ_PADDING`] entries.
    pub fn set_in(&self, path: &Path, value: StateTree, policy: ConflictPolicy) -> Result<StateTree> {
        write(self, path, 0, value, policy)
    }
}

fn write(
    node: &StateTree,
    path: &Path,
    depth: usize,
    value: StateTree,
    policy: ConflictPolicy,
) -> Result<StateTree> {
    let Some(segment) = path.segments().get(depth) else {
        return Ok(value);
    };

    let vacant = || {
        if segment.is_index() {
            StateTree::empty_seq()
        } else {
            StateTree::empty_map()
        }
    };
    let conflict = |found: &'static str| match policy {
        ConflictPolicy::Fail => Err(Error::TypeConflict {
            path: path.to_string(),
            at: path.prefix(depth),
            found,
        }),
        ConflictPolicy::Replace => Ok(vacant()),
    };

    let replaced;
    let node = match (node, segment) {
        (StateTree::Scalar(Scalar::Null), _) => {
            replaced = vacant();
            &replaced
        }
        (StateTree::Scalar(_), _) | (StateTree::Seq(_), Segment::Key(_)) => {
            replaced = conflict(node.kind())?;
            &replaced
        }
        _ => node,
    };

    match (node, segment) {
        (StateTree::Map(map), segment) => {
            let key = segment.map_key();
            let child = map.get(key.as_ref()).unwrap_or(&NULL_NODE);
            let child = write(child, path, depth + 1, value, policy)?;
            let mut map = Map::clone(map);
            map.insert(key.into_owned(), child);
            Ok(StateTree::Map(Arc::new(map)))
        }
        (StateTree::Seq(seq), Segment::Index(index)) => {
            let index = *index;
            if index > seq.len() && index - seq.len() > MAX_SEQ_PADDING {
                return Err(Error::IndexOutOfRange {
                    path: path.to_string(),
                    index,
                    len: seq.len(),
                });
            }
            let child = seq.get(index).unwrap_or(&NULL_NODE);
            let child = write(child, path, depth + 1, value, policy)?;
            let mut seq = Vec::clone(seq);
            if index >= seq.len() {
                seq.resize(index + 1, StateTree::NULL);
            }
            seq[index] = child;
            Ok(StateTree::Seq(Arc::new(seq)))
        }
        // Scalars and keyed sequences were replaced or rejected above.
        _ => conflict(node.kind()),
    }
}

impl Default for StateTree {
    fn default() -> Self {
        StateTree::empty_map()
    }
}

impl fmt::Debug for StateTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateTree::Map(map) => f.debug_map().entries(map.iter()).finish(),
            StateTree::Seq(seq) => f.debug_list().entries(seq.iter()).finish(),
            StateTree::Scalar(Scalar::Null) => f.write_str("null"),
            StateTree::Scalar(Scalar::Bool(b)) => write!(f, "{b}"),
            StateTree::Scalar(Scalar::Number(n)) => write!(f, "{n}"),
            StateTree::Scalar(Scalar::String(s)) => write!(f, "{s:?}"),
        }
    }
}

// ----------------------------------------------------------------------------
// Conversions
// ----------------------------------------------------------------------------

impl From<Value> for StateTree {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => StateTree::NULL,
            Value::Bool(b) => StateTree::Scalar(Scalar::Bool(b)),
            Value::Number(n) => StateTree::Scalar(Scalar::Number(n)),
            Value::String(s) => StateTree::Scalar(Scalar::String(s.into())),
            Value::Array(items) => {
                StateTree::Seq(Arc::new(items.into_iter().map(StateTree::from).collect()))
            }
            Value::Object(entries) => StateTree::Map(Arc::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, StateTree::from(v)))
                    .collect(),
            )),
        }
    }
}

impl From<StateTree> for Value {
    fn from(tree: StateTree) -> Self {
        match tree {
            StateTree::Scalar(Scalar::Null) => Value::Null,
            StateTree::Scalar(Scalar::Bool(b)) => Value::Bool(b),
            StateTree::Scalar(Scalar::Number(n)) => Value::Number(n),
            StateTree::Scalar(Scalar::String(s)) => Value::String(s.to_string()),
            StateTree::Seq(seq) => Value::Array(seq.iter().cloned().map(Value::from).collect()),
            StateTree::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from(v.clone())))
                    .collect(),
            ),
        }
    }
}

impl From<()> for StateTree {
    fn from(_: ()) -> Self {
        StateTree::NULL
    }
}

impl From<bool> for StateTree {
    fn from(b: bool) -> Self {
        StateTree::Scalar(Scalar::Bool(b))
    }
}

macro_rules! from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for StateTree {
                fn from(n: $t) -> Self {
                    StateTree::Scalar(Scalar::Number(Number::from(n)))
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl From<f64> for StateTree {
    /// Non-finite floats have no JSON number form and become `Null`.
    fn from(n: f64) -> Self {
        Number::from_f64(n)
            .map(|n| StateTree::Scalar(Scalar::Number(n)))
            .unwrap_or(StateTree::NULL)
    }
}

impl From<&str> for StateTree {
    fn from(s: &str) -> Self {
        StateTree::Scalar(Scalar::String(s.into()))
    }
}

impl From<String> for StateTree {
    fn from(s: String) -> Self {
        StateTree::Scalar(Scalar::String(s.into()))
    }
}

impl<T: Into<StateTree>> From<Vec<T>> for StateTree {
    fn from(items: Vec<T>) -> Self {
        StateTree::Seq(Arc::new(items.into_iter().map(Into::into).collect()))
    }
}

impl<T: Into<StateTree>> From<Option<T>> for StateTree {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(StateTree::NULL)
    }
}
