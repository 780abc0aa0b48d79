#![forbid(unsafe_code)]
//! linearize: order named phases so every dependency precedes its dependers.
//!
//! This crate re-exports the workspace members for integration tests,
//! benches and downstream users that want a single dependency.

pub use linearize_core::prelude::*;
pub use linearize_engine::{
    parse_text_problem, parse_yaml_problem, run_problem, LinearizationEngine, ParsedProblem,
    Problem, ProblemBuilder, ProblemConfig, RunOutcome,
};
pub use linearize_order::{assert_topological, check_linearization, Linearizer};
