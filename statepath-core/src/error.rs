//! Error types shared by the whole crate.
//!
//! Path problems (malformed expressions, writes that would descend through a
//! scalar) surface synchronously from `dispatch`. Effect problems surface
//! when the caller awaits the returned [`Dispatched`](crate::Dispatched).

use thiserror::Error;

/// Error type produced by effect functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The path expression could not be parsed.
    #[error("malformed path `{path}`: {reason}")]
    MalformedPath { path: String, reason: &'static str },

    /// A write would have to descend through a value that cannot hold the
    /// next segment.
    #[error("type conflict writing `{path}`: `{at}` holds {found}")]
    TypeConflict {
        path: String,
        at: String,
        found: &'static str,
    },

    /// A sequence write landed too far past the end of the sequence.
    #[error("index {index} in `{path}` is out of range for a sequence of length {len}")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },

    /// The effect attached to an action returned an error.
    #[error("effect for `{action}` failed: {source}")]
    EffectFailed {
        action: String,
        #[source]
        source: BoxError,
    },

    #[error("effect for `{action}` panicked")]
    EffectPanicked { action: String },

    #[error("effect for `{action}` was cancelled before it settled")]
    EffectCancelled { action: String },

    /// An effect-bearing action was dispatched outside a tokio runtime.
    #[error("no async runtime available to run the effect for `{action}`")]
    NoRuntime { action: String },

    #[error("invalid store config: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn malformed(path: &str, reason: &'static str) -> Self {
        Self::MalformedPath {
            path: path.to_string(),
            reason,
        }
    }
}
