#![forbid(unsafe_code)]
//! linearize-order: the ordering engines.
//!
//! Responsibilities:
//! - Store phases and dependency edges (`graph`).
//! - Produce an order in one pass from the full edge set (`batch`), either
//!   in-process (Kahn, rounds) or through the system `tsort` (`external`).
//! - Keep an order valid while edges arrive one at a time, detecting cycles
//!   from the affected region only (`incremental`).
//! - Provide verification helpers for orders (`verify`).
//!
//! Every orderer implements [`Linearizer`], so callers can swap strategies
//! without code changes.

pub mod batch;
pub mod external;
pub mod graph;
pub mod incremental;
pub mod verify;

use std::fmt;

use linearize_core::config::Strategy;
use linearize_core::error::Result;
use linearize_core::phase::PhaseId;

pub use batch::{BatchOrderer, KahnBackend, RoundsBackend, SortBackend};
pub use external::TsortBackend;
pub use graph::DependencyGraph;
pub use incremental::IncrementalOrderer;
pub use verify::{assert_topological, check_linearization, Violation};

/// The uniform contract every ordering strategy satisfies.
pub trait Linearizer: Send + fmt::Debug {
    fn strategy(&self) -> Strategy;

    /// Register a phase.
    fn add_phase(&mut self, id: PhaseId) -> Result<()>;

    /// Declare that `depender` depends on `dependency` (the dependency runs
    /// first). Both phases must already be registered.
    fn add_dependency(&mut self, depender: &str, dependency: &str) -> Result<()>;

    /// Return a total order consistent with every recorded edge.
    fn linearize(&mut self) -> Result<Vec<PhaseId>>;

    /// Drop all phases, edges, and cycle state.
    fn reset(&mut self);

    fn phase_count(&self) -> usize;

    fn edge_count(&self) -> usize;

    /// True once a cycle has been detected and the orderer froze.
    fn is_cyclic(&self) -> bool;
}
