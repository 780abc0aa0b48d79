//! Problems: a phase list plus dependency edges, ready to replay on an engine.
//!
//! Loaders build problems through [`ProblemBuilder`], which registers phases
//! implicitly in first-seen order when an edge mentions a phase that was
//! never declared. The engine itself never does this.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use linearize_core::config::{CyclePolicy, DuplicatePolicy, EngineConfig, Strategy};
use linearize_core::error::Result;
use linearize_core::hash::{hash_serde, Hash256};
use linearize_core::phase::{Edge, PhaseId};

use crate::engine::LinearizationEngine;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub phases: Vec<PhaseId>,
    pub edges: Vec<Edge>,
}

impl Problem {
    /// Register every phase, then record every edge, stopping at the first error.
    pub fn apply(&self, engine: &mut LinearizationEngine) -> Result<()> {
        for p in &self.phases {
            engine.add_phase(p.clone())?;
        }
        for e in &self.edges {
            engine.add_dependency(&e.depender, &e.dependency)?;
        }
        Ok(())
    }

    /// Stable content hash; phase and edge order both count.
    pub fn digest(&self) -> Result<Hash256> {
        hash_serde(self)
    }

    /// `p0 <- p1 <- ... <- p{n-1}`: each phase depends on its predecessor.
    pub fn chain(n: usize) -> Self {
        let mut b = ProblemBuilder::default();
        for i in 0..n {
            b.declare(format!("p{i}"));
        }
        for i in 1..n {
            b.depend(format!("p{i}"), format!("p{}", i - 1));
        }
        b.finish()
    }

    /// `root` depends on `n` leaves, each of which depends on a shared `base`.
    pub fn fan_in(n: usize) -> Self {
        let mut b = ProblemBuilder::default();
        b.declare("root");
        for i in 0..n {
            b.depend("root", format!("leaf{i}"));
        }
        for i in 0..n {
            b.depend(format!("leaf{i}"), "base");
        }
        b.finish()
    }
}

#[derive(Debug, Default)]
pub struct ProblemBuilder {
    problem: Problem,
    seen: HashSet<PhaseId>,
}

impl ProblemBuilder {
    /// Declare a phase. Repeats are kept so the engine's duplicate policy applies.
    pub fn declare(&mut self, id: impl Into<PhaseId>) -> &mut Self {
        let id = id.into();
        self.seen.insert(id.clone());
        self.problem.phases.push(id);
        self
    }

    /// Declare a phase unless it is already known.
    pub fn ensure(&mut self, id: impl Into<PhaseId>) -> &mut Self {
        let id = id.into();
        if self.seen.insert(id.clone()) {
            self.problem.phases.push(id);
        }
        self
    }

    pub fn depend(
        &mut self,
        depender: impl Into<PhaseId>,
        dependency: impl Into<PhaseId>,
    ) -> &mut Self {
        let edge = Edge::new(depender, dependency);
        self.ensure(edge.depender.clone());
        self.ensure(edge.dependency.clone());
        self.problem.edges.push(edge);
        self
    }

    pub fn finish(self) -> Problem {
        self.problem
    }
}

/// Engine settings a problem file may carry. Unset fields leave the base config alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProblemConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_policy: Option<DuplicatePolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_policy: Option<CyclePolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tsort_program: Option<String>,
}

impl ProblemConfig {
    pub fn apply_to(&self, cfg: &mut EngineConfig) {
        if let Some(s) = self.strategy {
            cfg.strategy = s;
        }
        if let Some(p) = self.duplicate_policy {
            cfg.duplicate_policy = p;
        }
        if let Some(p) = self.cycle_policy {
            cfg.cycle_policy = p;
        }
        if let Some(prog) = &self.tsort_program {
            cfg.tsort_program = prog.clone();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedProblem {
    pub problem: Problem,
    pub config: ProblemConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use linearize_core::error::Error;

    #[test]
    fn builder_registers_implicit_phases_in_first_seen_order() {
        let mut b = ProblemBuilder::default();
        b.declare("x").depend("a", "b").depend("b", "x").depend("c", "a");
        let p = b.finish();
        let names: Vec<&str> = p.phases.iter().map(PhaseId::as_str).collect();
        assert_eq!(names, ["x", "a", "b", "c"]);
        assert_eq!(p.edges.len(), 3);
    }

    #[test]
    fn declared_duplicates_reach_the_engine() {
        let mut b = ProblemBuilder::default();
        b.declare("a").declare("a");
        let p = b.finish();
        let mut e = LinearizationEngine::default();
        assert_eq!(p.apply(&mut e), Err(Error::DuplicatePhase("a".into())));
    }

    #[test]
    fn chain_orders_by_index() {
        let p = Problem::chain(4);
        let mut e = LinearizationEngine::default();
        p.apply(&mut e).unwrap();
        let order = e.linearize().unwrap();
        assert_eq!(order, p.phases);
    }

    #[test]
    fn fan_in_puts_base_first_and_root_last() {
        let p = Problem::fan_in(3);
        let mut e = LinearizationEngine::default();
        p.apply(&mut e).unwrap();
        let order = e.linearize().unwrap();
        assert_eq!(order.first().map(PhaseId::as_str), Some("base"));
        assert_eq!(order.last().map(PhaseId::as_str), Some("root"));
        assert_eq!(order.len(), 5);
    }

    #[test]
    fn digest_tracks_content() {
        assert_eq!(Problem::chain(3).digest().unwrap(), Problem::chain(3).digest().unwrap());
        assert_ne!(Problem::chain(3).digest().unwrap(), Problem::chain(4).digest().unwrap());
    }

    #[test]
    fn config_overrides_only_set_fields() {
        let mut cfg = EngineConfig::default();
        ProblemConfig {
            strategy: Some(Strategy::Incremental),
            ..Default::default()
        }
        .apply_to(&mut cfg);
        assert_eq!(cfg.strategy, Strategy::Incremental);
        assert_eq!(cfg.duplicate_policy, DuplicatePolicy::Reject);
        assert_eq!(cfg.tsort_program, "tsort");
    }
}
