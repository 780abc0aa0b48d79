//! Deterministic linearization manifest for audit/replay.
//!
//! Callers (the CLI in particular) emit a manifest after a linearization;
//! re-running the same problem with the same strategy must reproduce the same
//! `order_hash`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Strategy;
use crate::hash::Hash256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestId(pub Uuid);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearizationManifest {
    pub id: ManifestId,

    /// Stable hash of the phases and edges fed to the engine.
    pub problem_hash: Hash256,

    /// Hash of the resulting order; `None` when linearization failed.
    pub order_hash: Option<Hash256>,

    /// Strategy that produced the order.
    pub strategy: Strategy,

    /// Engine version string for provenance.
    pub engine_version: String,

    pub phase_count: usize,
    pub edge_count: usize,

    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: u64,
}

impl LinearizationManifest {
    pub fn new(
        problem_hash: Hash256,
        strategy: Strategy,
        phase_count: usize,
        edge_count: usize,
        started_ms: u64,
    ) -> Self {
        Self {
            id: ManifestId(Uuid::new_v4()),
            problem_hash,
            order_hash: None,
            strategy,
            engine_version: crate::VERSION.to_string(),
            phase_count,
            edge_count,
            started_ms,
            finished_ms: started_ms,
        }
    }

    pub fn finish(mut self, finished_ms: u64, order_hash: Option<Hash256>) -> Self {
        self.finished_ms = finished_ms;
        self.order_hash = order_hash;
        self
    }

    pub fn duration_ms(&self) -> u64 {
        self.finished_ms.saturating_sub(self.started_ms)
    }
}
