//! The set of known phases.
//!
//! Every orderer owns one registry. It assigns each phase a dense
//! [`PhaseKey`] in registration order and validates edge endpoints before any
//! orderer state is touched, so a rejected `add_dependency` has no side
//! effects.

use std::collections::HashMap;

use crate::config::DuplicatePolicy;
use crate::error::{Error, Result};
use crate::id::PhaseKey;
use crate::phase::PhaseId;

/// Outcome of [`PhaseRegistry::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The phase is new and was assigned this key.
    Added(PhaseKey),
    /// The phase was already known (only under `DuplicatePolicy::Ignore`).
    Existing(PhaseKey),
}

impl Registration {
    pub fn key(self) -> PhaseKey {
        match self {
            Registration::Added(k) | Registration::Existing(k) => k,
        }
    }

    pub fn is_new(self) -> bool {
        matches!(self, Registration::Added(_))
    }
}

#[derive(Debug, Clone, Default)]
pub struct PhaseRegistry {
    policy: DuplicatePolicy,
    keys: HashMap<PhaseId, PhaseKey>,
    names: Vec<PhaseId>,
}

impl PhaseRegistry {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            keys: HashMap::new(),
            names: Vec::new(),
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    pub fn add(&mut self, id: PhaseId) -> Result<Registration> {
        if let Some(&key) = self.keys.get(&id) {
            return match self.policy {
                DuplicatePolicy::Reject => Err(Error::DuplicatePhase(id)),
                DuplicatePolicy::Ignore => Ok(Registration::Existing(key)),
            };
        }
        let raw = u32::try_from(self.names.len())
            .map_err(|_| Error::TooManyPhases(self.names.len()))?;
        let key = PhaseKey::new(raw);
        self.keys.insert(id.clone(), key);
        self.names.push(id);
        Ok(Registration::Added(key))
    }

    pub fn exists(&self, id: &str) -> bool {
        self.keys.contains_key(id)
    }

    pub fn lookup(&self, id: &str) -> Option<PhaseKey> {
        self.keys.get(id).copied()
    }

    /// Returns the identifier registered under `key`.
    ///
    /// # Panics
    ///
    /// If `key` was not issued by this registry.
    pub fn name(&self, key: PhaseKey) -> &PhaseId {
        &self.names[key.index()]
    }

    /// Validate both endpoints of "`depender` depends on `dependency`".
    pub fn resolve_edge(&self, depender: &str, dependency: &str) -> Result<(PhaseKey, PhaseKey)> {
        let a = self
            .lookup(depender)
            .ok_or_else(|| Error::UnknownPhase(PhaseId::from(depender)))?;
        let b = self
            .lookup(dependency)
            .ok_or_else(|| Error::UnknownPhase(PhaseId::from(dependency)))?;
        if a == b {
            return Err(Error::SelfDependency(PhaseId::from(depender)));
        }
        Ok((a, b))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Phases in registration order.
    pub fn names(&self) -> &[PhaseId] {
        &self.names
    }

    pub fn keys(&self) -> impl Iterator<Item = PhaseKey> + '_ {
        (0..self.names.len()).map(|i| PhaseKey::new(i as u32))
    }

    pub fn to_names(&self, keys: &[PhaseKey]) -> Vec<PhaseId> {
        keys.iter().map(|&k| self.name(k).clone()).collect()
    }
}
