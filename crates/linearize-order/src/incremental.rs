//! Incremental ordering: keep a valid order live while edges arrive.
//!
//! The orderer holds a sequence of phases that is, at every observable point,
//! a topological order of all edges recorded so far. `linearize` is therefore
//! a copy. The price is paid in `add_dependency`, and only when the new edge
//! disagrees with the current order.
//!
//! When "`depender` depends on `dependency`" arrives with the depender at
//! position `lo` ahead of the dependency at `hi`, only the region `[lo, hi]`
//! is inspected:
//!
//! 1. **Shift the depender.** If nothing in `(lo, hi]` directly depends on the
//!    depender, rotate it to just after the dependency. Everything else keeps
//!    its relative order.
//! 2. **Shift the dependency.** Otherwise, if the dependency depends directly
//!    on nothing in `[lo, hi)`, rotate it to just before the depender.
//! 3. **Reorder the region.** Otherwise walk forward from the depender over
//!    dependents positioned before `hi` (set F) and backward from the
//!    dependency over dependencies positioned after `lo` (set B). If the
//!    forward walk reaches the dependency, the edge closes a cycle. If not,
//!    the slots held by B ∪ F are refilled with B then F, each in its current
//!    relative order.
//!
//! Direct checks are enough for steps 1 and 2: the order is valid before the
//! edge arrives, so any transitive dependent of the depender inside the region
//! is reached through a direct dependent that is also inside the region.
//!
//! Positions grow strictly along dependents, so step 3 never leaves the
//! region, and a cycle through the new edge is always found there.

use std::collections::HashMap;

use linearize_core::config::{CyclePolicy, DuplicatePolicy, Strategy};
use linearize_core::error::{Error, Result};
use linearize_core::id::PhaseKey;
use linearize_core::phase::PhaseId;
use linearize_core::registry::PhaseRegistry;

use crate::graph::DependencyGraph;
use crate::Linearizer;

/// How an out-of-order edge was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reposition {
    /// The dependency already preceded the depender.
    InOrder,
    /// The depender moved to just after the dependency.
    ShiftedDepender,
    /// The dependency moved to just before the depender.
    ShiftedDependency,
    /// A subset of the region between the two was permuted.
    Reordered { moved: usize },
}

#[derive(Debug, Clone)]
pub struct IncrementalOrderer {
    registry: PhaseRegistry,
    graph: DependencyGraph,
    order: Vec<PhaseKey>,
    /// Index into `order`, by phase key.
    position: Vec<usize>,
    cycle_policy: CyclePolicy,
    /// Sticky witness once an edge closed a cycle (deferred policy only).
    cycle: Option<Vec<PhaseKey>>,
    last: Option<Reposition>,
}

impl Default for IncrementalOrderer {
    fn default() -> Self {
        Self::new(DuplicatePolicy::default(), CyclePolicy::default())
    }
}

impl IncrementalOrderer {
    pub fn new(duplicate_policy: DuplicatePolicy, cycle_policy: CyclePolicy) -> Self {
        Self {
            registry: PhaseRegistry::new(duplicate_policy),
            graph: DependencyGraph::new(),
            order: Vec::new(),
            position: Vec::new(),
            cycle_policy,
            cycle: None,
            last: None,
        }
    }

    /// Current position of `id` in the live order.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.registry.lookup(id).map(|k| self.position[k.index()])
    }

    /// The live order, regardless of cycle state.
    pub fn current_order(&self) -> Vec<PhaseId> {
        self.registry.to_names(&self.order)
    }

    /// How the most recent accepted edge was placed.
    pub fn last_reposition(&self) -> Option<Reposition> {
        self.last
    }

    fn cycle_error(&self, witness: &[PhaseKey]) -> Error {
        Error::Cycle {
            phases: self.registry.to_names(witness),
        }
    }

    fn refresh_positions(&mut self, from: usize, to: usize) {
        for i in from..=to {
            self.position[self.order[i].index()] = i;
        }
    }

    /// Restore order validity for a new edge `a` depends on `b`.
    ///
    /// On a cycle, returns a witness chain in which every phase depends on
    /// the next and the last depends on the first. The order is untouched in
    /// that case.
    fn reposition(&mut self, a: PhaseKey, b: PhaseKey) -> std::result::Result<Reposition, Vec<PhaseKey>> {
        let lo = self.position[a.index()];
        let hi = self.position[b.index()];
        if hi < lo {
            return Ok(Reposition::InOrder);
        }

        let region = &self.order[lo + 1..=hi];
        let blocks_depender = region
            .iter()
            .any(|&x| self.graph.dependencies(x).contains(&a));
        if !blocks_depender {
            self.order[lo..=hi].rotate_left(1);
            self.refresh_positions(lo, hi);
            return Ok(Reposition::ShiftedDepender);
        }

        let deps_of_b = self.graph.dependencies(b);
        let blocks_dependency = self.order[lo..hi].iter().any(|x| deps_of_b.contains(x));
        if !blocks_dependency {
            self.order[lo..=hi].rotate_right(1);
            self.refresh_positions(lo, hi);
            return Ok(Reposition::ShiftedDependency);
        }

        let forward = self.walk_forward(a, b, hi)?;
        let backward = self.walk_backward(b, lo);
        let moved = forward.len() + backward.len();
        self.reorder(forward, backward);
        Ok(Reposition::Reordered { moved })
    }

    /// Phases that transitively depend on `a` and sit before `hi`.
    ///
    /// Fails with the cycle witness if `b` (at `hi`) is reached.
    fn walk_forward(
        &self,
        a: PhaseKey,
        b: PhaseKey,
        hi: usize,
    ) -> std::result::Result<Vec<PhaseKey>, Vec<PhaseKey>> {
        let mut parent: HashMap<PhaseKey, PhaseKey> = HashMap::new();
        let mut seen = vec![false; self.order.len()];
        let mut stack = vec![a];
        let mut found = Vec::new();
        seen[a.index()] = true;

        while let Some(cur) = stack.pop() {
            found.push(cur);
            for &next in self.graph.dependents(cur) {
                if next == b {
                    // b depends on cur, .., cur depends on a, and a now depends on b.
                    let mut witness = vec![b, cur];
                    let mut at = cur;
                    while let Some(&p) = parent.get(&at) {
                        witness.push(p);
                        at = p;
                    }
                    return Err(witness);
                }
                let pos = self.position[next.index()];
                if !seen[next.index()] && pos < hi {
                    seen[next.index()] = true;
                    parent.insert(next, cur);
                    stack.push(next);
                }
            }
        }
        Ok(found)
    }

    /// Phases `b` transitively depends on that sit after `lo`.
    fn walk_backward(&self, b: PhaseKey, lo: usize) -> Vec<PhaseKey> {
        let mut seen = vec![false; self.order.len()];
        let mut stack = vec![b];
        let mut found = Vec::new();
        seen[b.index()] = true;

        while let Some(cur) = stack.pop() {
            found.push(cur);
            for &next in self.graph.dependencies(cur) {
                let pos = self.position[next.index()];
                if !seen[next.index()] && pos > lo {
                    seen[next.index()] = true;
                    stack.push(next);
                }
            }
        }
        found
    }

    /// Refill the slots of `forward ∪ backward` with `backward` first.
    fn reorder(&mut self, mut forward: Vec<PhaseKey>, mut backward: Vec<PhaseKey>) {
        forward.sort_unstable_by_key(|k| self.position[k.index()]);
        backward.sort_unstable_by_key(|k| self.position[k.index()]);

        let mut slots: Vec<usize> = backward
            .iter()
            .chain(forward.iter())
            .map(|k| self.position[k.index()])
            .collect();
        slots.sort_unstable();

        for (key, slot) in backward.into_iter().chain(forward).zip(slots) {
            self.order[slot] = key;
            self.position[key.index()] = slot;
        }
    }
}

impl Linearizer for IncrementalOrderer {
    fn strategy(&self) -> Strategy {
        Strategy::Incremental
    }

    fn add_phase(&mut self, id: PhaseId) -> Result<()> {
        if self.cycle.is_some() {
            return Ok(());
        }
        let reg = self.registry.add(id)?;
        if reg.is_new() {
            let key = reg.key();
            self.graph.add_node(key);
            self.position.push(self.order.len());
            self.order.push(key);
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

        match self.reposition(a, b) {
            Ok(how) => {
                #[cfg(feature = "tracing")]
                tracing::trace!(depender, dependency, reposition = ?how, "edge accepted");
                self.graph.add_edge(a, b);
                self.last = Some(how);
                Ok(())
            }
            Err(witness) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(depender, dependency, witness = witness.len(), policy = %self.cycle_policy, "edge closes a cycle");
                match self.cycle_policy {
                    CyclePolicy::FailFast => Err(self.cycle_error(&witness)),
                    CyclePolicy::Deferred => {
                        self.graph.add_edge(a, b);
                        self.cycle = Some(witness);
                        Ok(())
                    }
                }
            }
        }
    }

    fn linearize(&mut self) -> Result<Vec<PhaseId>> {
        match &self.cycle {
            Some(witness) => Err(self.cycle_error(witness)),
            None => Ok(self.current_order()),
        }
    }

    fn reset(&mut self) {
        *self = Self::new(self.registry.policy(), self.cycle_policy);
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
