//! Phase identifiers and dependency edges.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Opaque phase identifier. Identity is value equality of the token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhaseId(String);

impl PhaseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<&str> for PhaseId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PhaseId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&PhaseId> for PhaseId {
    fn from(p: &PhaseId) -> Self {
        p.clone()
    }
}

// Lets `HashMap<PhaseId, _>` be queried with a plain `&str`.
impl Borrow<str> for PhaseId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PhaseId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for PhaseId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PhaseId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// "`depender` depends on `dependency`": the dependency must come first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub depender: PhaseId,
    pub dependency: PhaseId,
}

impl Edge {
    pub fn new(depender: impl Into<PhaseId>, dependency: impl Into<PhaseId>) -> Self {
        Self {
            depender: depender.into(),
            dependency: dependency.into(),
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.depender == self.dependency
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.depender, self.dependency)
    }
}
