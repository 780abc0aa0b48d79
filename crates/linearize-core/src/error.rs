use thiserror::Error;

use crate::phase::PhaseId;

/// Canonical result for the linearization crates.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("phase '{0}' is already registered")]
    DuplicatePhase(PhaseId),

    #[error("unknown phase '{0}'")]
    UnknownPhase(PhaseId),

    #[error("phase '{0}' cannot depend on itself")]
    SelfDependency(PhaseId),

    /// `phases` is a witness: the phases on (or blocked behind) the cycle.
    #[error("dependency cycle detected among phases [{}]", join_phases(.phases))]
    Cycle { phases: Vec<PhaseId> },

    // External backends (e.g. the `tsort` process) map their non-cycle
    // failures into this variant.
    #[error("sort backend failed: {0}")]
    Backend(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("registry is full: {0} phases already registered")]
    TooManyPhases(usize),

    #[error("problem parse error: {0}")]
    Parse(String),

    #[error("hashing failed: {0}")]
    Hash(String),
}

impl Error {
    pub fn is_cycle(&self) -> bool {
        matches!(self, Error::Cycle { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Hash(e.to_string())
    }
}

fn join_phases(phases: &[PhaseId]) -> String {
    phases
        .iter()
        .map(PhaseId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
