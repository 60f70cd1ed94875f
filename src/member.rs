//! Cluster member identity
//!
//! A [`Member`] is an opaque identifier for one node participating in a
//! scatter/gather call. It carries no behavior: the coordinator uses it only
//! as an ordered map key and for log/error attribution.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for one cluster node
///
/// Immutable and comparable. Insertion order of members, not their sort
/// order, determines traversal order in the sequential strategies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Member(String);

impl Member {
    /// Create a member from any string-like identifier
    pub fn new(id: impl Into<String>) -> Self {
        Member(id.into())
    }

    /// The member's identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Member {
    fn from(id: &str) -> Self {
        Member::new(id)
    }
}

impl From<String> for Member {
    fn from(id: String) -> Self {
        Member(id)
    }
}
