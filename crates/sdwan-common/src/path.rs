//! Path and path-group identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque path identifier (a datapath or link id)
///
/// Ordering is numeric and is the tie-break order for path selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathId(pub u64);

impl From<u64> for PathId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key of a set of redundant paths competing for the same traffic
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathGroup(String);

impl PathGroup {
    /// Create a named group
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Default group of a datapath: its id in decimal
    pub fn for_datapath(dpid: u64) -> Self {
        Self(dpid.to_string())
    }

    /// String form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PathGroup {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for PathGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
