//! Adjacency storage shared by the orderers.
//!
//! Each phase keeps both directions: the phases it depends on and the phases
//! that depend on it ("dependents"). Sets are ordered so every traversal, and
//! therefore every produced order, is deterministic.

use std::collections::{BTreeSet, VecDeque};

use linearize_core::id::PhaseKey;

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    dependencies: Vec<BTreeSet<PhaseKey>>,
    dependents: Vec<BTreeSet<PhaseKey>>,
    edge_count: usize,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make room for `key`. Keys are dense, so this usually appends one slot.
    pub fn add_node(&mut self, key: PhaseKey) {
        let need = key.index() + 1;
        if self.dependencies.len() < need {
            self.dependencies.resize_with(need, BTreeSet::new);
            self.dependents.resize_with(need, BTreeSet::new);
        }
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn contains_edge(&self, depender: PhaseKey, dependency: PhaseKey) -> bool {
        self.dependencies[depender.index()].contains(&dependency)
    }

    /// Record "`depender` depends on `dependency`". Returns false if the edge
    /// was already present.
    pub fn add_edge(&mut self, depender: PhaseKey, dependency: PhaseKey) -> bool {
        let fresh = self.dependencies[depender.index()].insert(dependency);
        if fresh {
            self.dependents[dependency.index()].insert(depender);
            self.edge_count += 1;
        }
        fresh
    }

    /// Phases `key` depends on.
    pub fn dependencies(&self, key: PhaseKey) -> &BTreeSet<PhaseKey> {
        &self.dependencies[key.index()]
    }

    /// Phases that depend on `key`.
    pub fn dependents(&self, key: PhaseKey) -> &BTreeSet<PhaseKey> {
        &self.dependents[key.index()]
    }

    /// Number of unsatisfied dependencies per phase, indexed by key.
    pub fn in_degrees(&self) -> Vec<usize> {
        self.dependencies.iter().map(BTreeSet::len).collect()
    }

    /// All edges as `(depender, dependency)`, ordered by depender then dependency.
    pub fn edges(&self) -> impl Iterator<Item = (PhaseKey, PhaseKey)> + '_ {
        self.dependencies.iter().enumerate().flat_map(|(i, deps)| {
            let depender = PhaseKey::new(i as u32);
            deps.iter().map(move |&d| (depender, d))
        })
    }

    /// True if `key` takes part in at least one edge.
    pub fn is_connected(&self, key: PhaseKey) -> bool {
        !self.dependencies[key.index()].is_empty() || !self.dependents[key.index()].is_empty()
    }

    /// Shortest chain `from, .., to` where each phase depends on the next,
    /// or `None` if `from` does not transitively depend on `to`.
    pub fn dependency_path(&self, from: PhaseKey, to: PhaseKey) -> Option<Vec<PhaseKey>> {
        let mut parent: Vec<Option<PhaseKey>> = vec![None; self.len()];
        let mut seen = vec![false; self.len()];
        let mut queue = VecDeque::new();
        seen[from.index()] = true;
        queue.push_back(from);

        while let Some(cur) = queue.pop_front() {
            if cur == to {
                let mut path = vec![to];
                let mut at = to;
                while let Some(p) = parent[at.index()] {
                    path.push(p);
                    at = p;
                }
                path.reverse();
                return Some(path);
            }
            for &next in &self.dependencies[cur.index()] {
                if !seen[next.index()] {
                    seen[next.index()] = true;
                    parent[next.index()] = Some(cur);
                    queue.push_back(next);
                }
            }
        }
        None
    }

    /// Find one cycle among the phases flagged in `stuck`.
    ///
    /// Every stuck phase must have at least one stuck dependency, which is
    /// exactly what elimination leaves behind when it stalls. The returned
    /// chain lists phases each depending on the next, the last depending on
    /// the first.
    pub fn cycle_among(&self, stuck: &[bool]) -> Vec<PhaseKey> {
        let Some(start) = stuck.iter().position(|&s| s) else {
            return Vec::new();
        };
        let mut visited_at: Vec<Option<usize>> = vec![None; self.len()];
        let mut walk = Vec::new();
        let mut cur = PhaseKey::new(start as u32);

        loop {
            if let Some(i) = visited_at[cur.index()] {
                return walk.split_off(i);
            }
            visited_at[cur.index()] = Some(walk.len());
            walk.push(cur);
            match self.dependencies[cur.index()]
                .iter()
                .find(|d| stuck[d.index()])
            {
                Some(&next) => cur = next,
                // Not a stalled elimination state; report what we walked.
                None => return walk,
            }
        }
    }
}
