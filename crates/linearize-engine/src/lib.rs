#![forbid(unsafe_code)]
//! linearize-engine: the facade callers use.
//!
//! - `engine`: [`LinearizationEngine`], one contract over every strategy.
//! - `problem` / `dsl`: phase/edge sets loaded from YAML or plain text.
//! - `run`: drive an engine over a problem and emit a manifest.
//! - `metrics`: tracing hooks (no-op unless the `tracing` feature is on).

pub mod dsl;
pub mod engine;
pub mod metrics;
pub mod problem;
pub mod run;

pub use dsl::text::parse_text_problem;
pub use dsl::yaml::parse_yaml_problem;
pub use engine::LinearizationEngine;
pub use problem::{ParsedProblem, Problem, ProblemBuilder, ProblemConfig};
pub use run::{run_problem, RunOutcome};
