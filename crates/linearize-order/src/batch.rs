//! Batch ordering: collect every phase and edge, then eliminate in one pass.
//!
//! The orderer only records phases and edges as they arrive; all the work
//! happens in `linearize`, delegated to a [`SortBackend`]. Two in-process
//! backends live here:
//! - [`KahnBackend`]: in-degree counts plus a ready queue, O(V + E).
//! - [`RoundsBackend`]: re-scans the remaining phases each round and emits
//!   every phase whose dependencies are all placed, O(V²) worst case.
//!
//! Both seed from registration order, so their output is deterministic.

use std::collections::VecDeque;

use linearize_core::config::{CyclePolicy, DuplicatePolicy, Strategy};
use linearize_core::error::{Error, Result};
use linearize_core::id::PhaseKey;
use linearize_core::phase::{Edge, PhaseId};
use linearize_core::registry::PhaseRegistry;

use crate::graph::DependencyGraph;
use crate::Linearizer;

/// A one-shot ordering algorithm over a complete phase/edge set.
pub trait SortBackend: Send + std::fmt::Debug {
    fn strategy(&self) -> Strategy;

    /// Order every registered phase, or fail with `Error::Cycle`.
    fn sort(&self, registry: &PhaseRegistry, graph: &DependencyGraph) -> Result<Vec<PhaseId>>;
}

/// Count-based Kahn elimination.
///
/// Returns the order on success. On a cycle, returns one cycle (each phase
/// depending on the next) found among the phases that were never released.
pub fn kahn(graph: &DependencyGraph) -> std::result::Result<Vec<PhaseKey>, Vec<PhaseKey>> {
    let mut in_degree = graph.in_degrees();
    let mut ready: VecDeque<PhaseKey> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, deg)| **deg == 0)
        .map(|(i, _)| PhaseKey::new(i as u32))
        .collect();
    let mut out = Vec::with_capacity(graph.len());

    while let Some(k) = ready.pop_front() {
        out.push(k);
        for &d in graph.dependents(k) {
            let deg = &mut in_degree[d.index()];
            *deg -= 1;
            if *deg == 0 {
                ready.push_back(d);
            }
        }
    }

    if out.len() == graph.len() {
        Ok(out)
    } else {
        let stuck: Vec<bool> = in_degree.iter().map(|&d| d > 0).collect();
        Err(graph.cycle_among(&stuck))
    }
}

/// Round-by-round elimination.
///
/// Each round emits, in registration order, every remaining phase with no
/// unsatisfied dependency. A round that emits nothing while phases remain
/// means a cycle.
pub fn rounds(graph: &DependencyGraph) -> std::result::Result<Vec<PhaseKey>, Vec<PhaseKey>> {
    let mut unsatisfied = graph.in_degrees();
    let mut remaining: Vec<PhaseKey> = (0..graph.len()).map(|i| PhaseKey::new(i as u32)).collect();
    let mut out = Vec::with_capacity(graph.len());

    while !remaining.is_empty() {
        let eligible: Vec<PhaseKey> = remaining
            .iter()
            .copied()
            .filter(|k| unsatisfied[k.index()] == 0)
            .collect();
        if eligible.is_empty() {
            let mut stuck = vec![false; graph.len()];
            for k in &remaining {
                stuck[k.index()] = true;
            }
            return Err(graph.cycle_among(&stuck));
        }
        for &k in &eligible {
            for &d in graph.dependents(k) {
                unsatisfied[d.index()] -= 1;
            }
            // Mark placed so the retain below drops it.
            unsatisfied[k.index()] = usize::MAX;
        }
        remaining.retain(|k| unsatisfied[k.index()] != usize::MAX);
        out.extend(eligible);
    }

    Ok(out)
}

fn to_result(
    registry: &PhaseRegistry,
    res: std::result::Result<Vec<PhaseKey>, Vec<PhaseKey>>,
) -> Result<Vec<PhaseId>> {
    match res {
        Ok(order) => Ok(registry.to_names(&order)),
        Err(cycle) => Err(Error::Cycle {
            phases: registry.to_names(&cycle),
        }),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KahnBackend;

impl SortBackend for KahnBackend {
    fn strategy(&self) -> Strategy {
        Strategy::Kahn
    }

    fn sort(&self, registry: &PhaseRegistry, graph: &DependencyGraph) -> Result<Vec<PhaseId>> {
        to_result(registry, kahn(graph))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RoundsBackend;

impl SortBackend for RoundsBackend {
    fn strategy(&self) -> Strategy {
        Strategy::Rounds
    }

    fn sort(&self, registry: &PhaseRegistry, graph: &DependencyGraph) -> Result<Vec<PhaseId>> {
        to_result(registry, rounds(graph))
    }
}

/// Order a complete phase/edge set in one call with Kahn's algorithm.
///
/// Phases are registered in slice order; duplicate phases and duplicate edges
/// are tolerated (set semantics).
pub fn linearize(phases: &[PhaseId], edges: &[Edge]) -> Result<Vec<PhaseId>> {
    let mut orderer = BatchOrderer::new(
        Box::new(KahnBackend),
        DuplicatePolicy::Ignore,
        CyclePolicy::Deferred,
    );
    for p in phases {
        orderer.add_phase(p.clone())?;
    }
    for e in edges {
        orderer.add_dependency(e.depender.as_str(), e.dependency.as_str())?;
    }
    orderer.linearize()
}

/// Records phases and edges; orders them on demand through a [`SortBackend`].
#[derive(Debug)]
pub struct BatchOrderer {
    registry: PhaseRegistry,
    graph: DependencyGraph,
    backend: Box<dyn SortBackend>,
    cycle_policy: CyclePolicy,
    /// Sticky witness once a cycle has been reported.
    cycle: Option<Vec<PhaseId>>,
}

impl BatchOrderer {
    pub fn new(
        backend: Box<dyn SortBackend>,
        duplicate_policy: DuplicatePolicy,
        cycle_policy: CyclePolicy,
    ) -> Self {
        Self {
            registry: PhaseRegistry::new(duplicate_policy),
            graph: DependencyGraph::new(),
            backend,
            cycle_policy,
            cycle: None,
        }
    }

    pub fn kahn(duplicate_policy: DuplicatePolicy, cycle_policy: CyclePolicy) -> Self {
        Self::new(Box::new(KahnBackend), duplicate_policy, cycle_policy)
    }

    pub fn rounds(duplicate_policy: DuplicatePolicy, cycle_policy: CyclePolicy) -> Self {
        Self::new(Box::new(RoundsBackend), duplicate_policy, cycle_policy)
    }

    fn cycle_error(&self) -> Option<Error> {
        self.cycle.as_ref().map(|phases| Error::Cycle {
            phases: phases.clone(),
        })
    }
}

impl Linearizer for BatchOrderer {
    fn strategy(&self) -> Strategy {
        self.backend.strategy()
    }

    fn add_phase(&mut self, id: PhaseId) -> Result<()> {
        if self.cycle.is_some() {
            return Ok(());
        }
        let reg = self.registry.add(id)?;
        if reg.is_new() {
            self.graph.add_node(reg.key());
        }
        Ok(())
    }

    fn add_dependency(&mut self, depender: &str, dependency: &str) -> Result<()> {
        if self.cycle.is_some() {
            return Ok(());
        }
        let (a, b) = self.registry.resolve_edge(depender, dependency)?;
        if self.graph.contains_edge(a, b) {
            return Ok(());
        }
        if self.cycle_policy == CyclePolicy::FailFast {
            // a -> b closes a cycle iff b already (transitively) depends on a.
            if let Some(path) = self.graph.dependency_path(b, a) {
                #[cfg(feature = "tracing")]
                tracing::debug!(depender, dependency, len = path.len(), "rejected edge closing a cycle");
                return Err(Error::Cycle {
                    phases: self.registry.to_names(&path),
                });
            }
        }
        self.graph.add_edge(a, b);
        Ok(())
    }

    fn linearize(&mut self) -> Result<Vec<PhaseId>> {
        if let Some(err) = self.cycle_error() {
            return Err(err);
        }
        match self.backend.sort(&self.registry, &self.graph) {
            Err(Error::Cycle { phases }) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(backend = %self.backend.strategy(), witness = phases.len(), "cycle detected");
                self.cycle = Some(phases.clone());
                Err(Error::Cycle { phases })
            }
            other => other,
        }
    }

    fn reset(&mut self) {
        self.registry = PhaseRegistry::new(self.registry.policy());
        self.graph = DependencyGraph::new();
        self.cycle = None;
    }

    fn phase_count(&self) -> usize {
        self.registry.len()
    }

    fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn is_cyclic(&self) -> bool {
        self.cycle.is_some()
    }
}
