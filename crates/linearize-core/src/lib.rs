#![forbid(unsafe_code)]
//! linearize-core: phase identifiers, the phase registry, errors,
//! configuration, manifests, and hashing.
//!
//! Everything here is shared by the orderers (`linearize-order`) and the
//! facade (`linearize-engine`). **No process spawning, no file IO** here.

pub mod config;
pub mod error;
pub mod hash;
pub mod id;
pub mod manifest;
pub mod phase;
pub mod prelude;
pub mod registry;

/// Crate version recorded in manifests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
