//! LinearizationEngine: one contract over every ordering strategy.
//!
//! The engine owns a boxed [`Linearizer`] chosen from [`EngineConfig`].
//! Callers see the same four operations whichever strategy backs it, so a
//! problem can be replayed against every strategy unchanged.

use linearize_core::config::{EngineConfig, Strategy};
use linearize_core::error::Result;
use linearize_core::phase::PhaseId;

use linearize_order::{BatchOrderer, IncrementalOrderer, Linearizer, SortBackend, TsortBackend};

use crate::metrics::emit_span;

#[derive(Debug)]
pub struct LinearizationEngine {
    cfg: EngineConfig,
    inner: Box<dyn Linearizer>,
}

impl Default for LinearizationEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl LinearizationEngine {
    pub fn new(cfg: EngineConfig) -> Self {
        let inner = build(&cfg);
        Self { cfg, inner }
    }

    pub fn with_strategy(strategy: Strategy) -> Self {
        Self::new(EngineConfig::with_strategy(strategy))
    }

    /// Batch engine over a caller-supplied backend. `cfg.strategy` is
    /// replaced by the backend's own.
    pub fn with_backend(mut cfg: EngineConfig, backend: Box<dyn SortBackend>) -> Self {
        cfg.strategy = backend.strategy();
        let inner = Box::new(BatchOrderer::new(
            backend,
            cfg.duplicate_policy,
            cfg.cycle_policy,
        ));
        Self { cfg, inner }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    pub fn strategy(&self) -> Strategy {
        self.inner.strategy()
    }

    pub fn add_phase(&mut self, id: impl Into<PhaseId>) -> Result<()> {
        self.inner.add_phase(id.into())
    }

    /// `depender` depends on `dependency`: the dependency must come first.
    pub fn add_dependency(
        &mut self,
        depender: impl AsRef<str>,
        dependency: impl AsRef<str>,
    ) -> Result<()> {
        self.inner
            .add_dependency(depender.as_ref(), dependency.as_ref())
    }

    pub fn linearize(&mut self) -> Result<Vec<PhaseId>> {
        let res = self.inner.linearize();

        #[cfg(feature = "tracing")]
        match &res {
            Ok(order) => tracing::debug!(strategy = %self.strategy(), phases = order.len(), "linearized"),
            Err(e) => tracing::debug!(strategy = %self.strategy(), error = %e, "linearize failed"),
        }

        emit_span(
            "linearize",
            &[
                ("strategy", self.strategy().to_string()),
                ("phases", self.inner.phase_count().to_string()),
                ("edges", self.inner.edge_count().to_string()),
                ("ok", res.is_ok().to_string()),
            ],
        );
        res
    }

    /// Back to the empty state; the strategy and policies are kept.
    pub fn reset(&mut self) {
        self.inner.reset();
    }

    pub fn phase_count(&self) -> usize {
        self.inner.phase_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn is_cyclic(&self) -> bool {
        self.inner.is_cyclic()
    }
}

fn build(cfg: &EngineConfig) -> Box<dyn Linearizer> {
    let (dup, cyc) = (cfg.duplicate_policy, cfg.cycle_policy);
    match cfg.strategy {
        Strategy::Kahn => Box::new(BatchOrderer::kahn(dup, cyc)),
        Strategy::Rounds => Box::new(BatchOrderer::rounds(dup, cyc)),
        Strategy::Incremental => Box::new(IncrementalOrderer::new(dup, cyc)),
        Strategy::Tsort => Box::new(BatchOrderer::new(
            Box::new(TsortBackend::new(cfg.tsort_program.clone())),
            dup,
            cyc,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linearize_core::config::{CyclePolicy, DuplicatePolicy};
    use linearize_core::error::Error;
    use linearize_order::KahnBackend;

    const IN_PROCESS: [Strategy; 3] = [Strategy::Kahn, Strategy::Rounds, Strategy::Incremental];

    fn ids(v: &[&str]) -> Vec<PhaseId> {
        v.iter().map(|s| PhaseId::from(*s)).collect()
    }

    #[test]
    fn strategy_follows_config() {
        for s in Strategy::ALL {
            assert_eq!(LinearizationEngine::with_strategy(s).strategy(), s);
        }
    }

    #[test]
    fn same_contract_for_every_in_process_strategy() {
        for s in IN_PROCESS {
            let mut e = LinearizationEngine::with_strategy(s);
            for p in ["a", "b", "c"] {
                e.add_phase(p).unwrap();
            }
            e.add_dependency("a", "b").unwrap();
            e.add_dependency("b", "c").unwrap();
            assert_eq!(e.linearize().unwrap(), ids(&["c", "b", "a"]), "{s}");
            assert_eq!(e.add_phase("a"), Err(Error::DuplicatePhase("a".into())), "{s}");
        }
    }

    #[test]
    fn ignore_policy_is_passed_down() {
        let cfg = EngineConfig {
            duplicate_policy: DuplicatePolicy::Ignore,
            ..EngineConfig::with_strategy(Strategy::Incremental)
        };
        let mut e = LinearizationEngine::new(cfg);
        e.add_phase("a").unwrap();
        e.add_phase("a").unwrap();
        assert_eq!(e.phase_count(), 1);
    }

    #[test]
    fn fail_fast_is_uniform() {
        for s in IN_PROCESS {
            let cfg = EngineConfig {
                cycle_policy: CyclePolicy::FailFast,
                ..EngineConfig::with_strategy(s)
            };
            let mut e = LinearizationEngine::new(cfg);
            e.add_phase("a").unwrap();
            e.add_phase("b").unwrap();
            e.add_dependency("a", "b").unwrap();
            assert!(e.add_dependency("b", "a").unwrap_err().is_cycle(), "{s}");
            assert_eq!(e.linearize().unwrap(), ids(&["b", "a"]), "{s}");
        }
    }

    #[test]
    fn reset_keeps_strategy_and_clears_cycle() {
        let mut e = LinearizationEngine::with_strategy(Strategy::Rounds);
        e.add_phase("a").unwrap();
        e.add_phase("b").unwrap();
        e.add_dependency("a", "b").unwrap();
        e.add_dependency("b", "a").unwrap();
        assert!(e.linearize().is_err());
        e.reset();
        assert_eq!(e.strategy(), Strategy::Rounds);
        assert!(!e.is_cyclic());
        assert!(e.linearize().unwrap().is_empty());
    }

    #[test]
    fn custom_backend_sets_strategy() {
        let mut cfg = EngineConfig::with_strategy(Strategy::Tsort);
        cfg.duplicate_policy = DuplicatePolicy::Ignore;
        let e = LinearizationEngine::with_backend(cfg, Box::new(KahnBackend));
        assert_eq!(e.strategy(), Strategy::Kahn);
        assert_eq!(e.config().strategy, Strategy::Kahn);
    }
}
