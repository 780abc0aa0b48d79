//! Drive an engine over a problem and record a manifest.

use std::time::{SystemTime, UNIX_EPOCH};

use linearize_core::error::{Error, Result};
use linearize_core::hash::hash_order;
use linearize_core::manifest::LinearizationManifest;
use linearize_core::phase::PhaseId;

use crate::engine::LinearizationEngine;
use crate::metrics::emit_span;
use crate::problem::Problem;

#[derive(Debug)]
pub struct RunOutcome {
    /// The order, or the first contract error raised while replaying or linearizing.
    pub order: std::result::Result<Vec<PhaseId>, Error>,
    pub manifest: LinearizationManifest,
}

/// Reset `engine`, replay `problem` on it and linearize.
///
/// Contract errors (duplicates, unknown phases, cycles) land in
/// `RunOutcome::order`; only a failure to hash the problem is returned as `Err`.
pub fn run_problem(engine: &mut LinearizationEngine, problem: &Problem) -> Result<RunOutcome> {
    let problem_hash = problem.digest()?;
    let started = now_millis();

    engine.reset();
    let order = problem.apply(engine).and_then(|()| engine.linearize());

    let order_hash = order.as_ref().ok().map(|o| hash_order(o));
    let manifest = LinearizationManifest::new(
        problem_hash,
        engine.strategy(),
        engine.phase_count(),
        engine.edge_count(),
        started,
    )
    .finish(now_millis(), order_hash);

    #[cfg(feature = "tracing")]
    tracing::info!(
        manifest = %manifest.id.0,
        strategy = %manifest.strategy,
        phases = manifest.phase_count,
        edges = manifest.edge_count,
        ok = order.is_ok(),
        "run finished"
    );

    emit_span(
        "run",
        &[
            ("problem_hash", manifest.problem_hash.to_hex()),
            ("duration_ms", manifest.duration_ms().to_string()),
        ],
    );

    Ok(RunOutcome { order, manifest })
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
