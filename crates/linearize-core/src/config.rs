//! Engine configuration that callers can serialize/deserialize.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Which ordering strategy backs an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Count-based Kahn elimination at `linearize` time.
    #[default]
    Kahn,
    /// Round-by-round elimination (re-scans remaining phases each round).
    Rounds,
    /// Keeps a valid order live while edges are added.
    Incremental,
    /// Shells out to the system `tsort` utility.
    Tsort,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Kahn,
        Strategy::Rounds,
        Strategy::Incremental,
        Strategy::Tsort,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Kahn => "kahn",
            Strategy::Rounds => "rounds",
            Strategy::Incremental => "incremental",
            Strategy::Tsort => "tsort",
        }
    }
}

/// What registering an already-known phase does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail with `Error::DuplicatePhase`.
    #[default]
    Reject,
    /// Treat the second registration as a successful no-op.
    Ignore,
}

impl DuplicatePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            DuplicatePolicy::Reject => "reject",
            DuplicatePolicy::Ignore => "ignore",
        }
    }
}

/// When a cycle is reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePolicy {
    /// Enter a sticky cycle state; `linearize` reports it.
    #[default]
    Deferred,
    /// Reject the edge that would close a cycle at `add_dependency` time.
    #[serde(alias = "fail-fast")]
    FailFast,
}

impl CyclePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            CyclePolicy::Deferred => "deferred",
            CyclePolicy::FailFast => "fail_fast",
        }
    }
}

macro_rules! str_enum {
    ($ty:ident, $what:literal, [$($variant:ident),+ $(,)?]) => {
        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let norm = s.trim().to_ascii_lowercase().replace('-', "_");
                $(
                    if norm == $ty::$variant.as_str() {
                        return Ok($ty::$variant);
                    }
                )+
                Err(Error::Config(format!("unknown {} '{}'", $what, s)))
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(Strategy, "strategy", [Kahn, Rounds, Incremental, Tsort]);
str_enum!(DuplicatePolicy, "duplicate policy", [Reject, Ignore]);
str_enum!(CyclePolicy, "cycle policy", [Deferred, FailFast]);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ordering strategy backing the engine.
    pub strategy: Strategy,

    /// Behavior when a phase is registered twice.
    pub duplicate_policy: DuplicatePolicy,

    /// Whether cycles fail `add_dependency` or surface at `linearize`.
    pub cycle_policy: CyclePolicy,

    /// Program spawned by the `tsort` strategy.
    pub tsort_program: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            duplicate_policy: DuplicatePolicy::default(),
            cycle_policy: CyclePolicy::default(),
            tsort_program: "tsort".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn with_strategy(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `LINEARIZE_STRATEGY`: `kahn`, `rounds`, `incremental`, or `tsort`
    /// - `LINEARIZE_DUPLICATE_POLICY`: `reject` or `ignore`
    /// - `LINEARIZE_CYCLE_POLICY`: `deferred` or `fail_fast`
    /// - `LINEARIZE_TSORT_PROGRAM`: path to the `tsort` binary
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("LINEARIZE_STRATEGY") {
            if let Ok(v) = s.parse::<Strategy>() {
                cfg.strategy = v;
            }
        }

        if let Ok(s) = std::env::var("LINEARIZE_DUPLICATE_POLICY") {
            if let Ok(v) = s.parse::<DuplicatePolicy>() {
                cfg.duplicate_policy = v;
            }
        }

        if let Ok(s) = std::env::var("LINEARIZE_CYCLE_POLICY") {
            if let Ok(v) = s.parse::<CyclePolicy>() {
                cfg.cycle_policy = v;
            }
        }

        if let Ok(s) = std::env::var("LINEARIZE_TSORT_PROGRAM") {
            if !s.trim().is_empty() {
                cfg.tsort_program = s;
            }
        }

        cfg
    }
}
