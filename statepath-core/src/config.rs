//! Store configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What a path write does when it has to descend through a scalar, or
/// address a sequence by key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Reject the write with [`Error::TypeConflict`](crate::Error::TypeConflict).
    #[default]
    Fail,
    /// Overwrite the offending node with a fresh container.
    Replace,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub conflict_policy: ConflictPolicy,
    /// Install [`LoggingMiddleware`](crate::pipeline::LoggingMiddleware)
    /// ahead of the effect interceptor.
    pub log_actions: bool,
}

impl StoreConfig {
    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }
}
