//! Dense integer keys for registered phases.
//!
//! Orderers index their adjacency and position tables by `PhaseKey` rather
//! than hashing phase names on every step. Keys are handed out by
//! [`PhaseRegistry`](crate::registry::PhaseRegistry) in registration order and
//! are only meaningful for the registry that issued them.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Ord, PartialOrd)]
#[serde(transparent)]
pub struct PhaseKey(u32);

impl PhaseKey {
    pub const fn new(v: u32) -> Self {
        Self(v)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// Position of this key in per-phase tables.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PhaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhaseKey({})", self.0)
    }
}
