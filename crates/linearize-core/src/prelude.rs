//! Convenient re-exports for downstream crates.

pub use crate::config::{CyclePolicy, DuplicatePolicy, EngineConfig, Strategy};
pub use crate::error::{Error, Result};
pub use crate::id::PhaseKey;
pub use crate::manifest::{LinearizationManifest, ManifestId};
pub use crate::phase::{Edge, PhaseId};
pub use crate::registry::{PhaseRegistry, Registration};
