//! Verification helpers for produced orders.
//!
//! Used by tests and by the CLI `check` command. They are cheap: one pass to
//! index the order, one pass over the edges.

use std::collections::HashMap;

use thiserror::Error;

use linearize_core::phase::{Edge, PhaseId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("phase '{0}' is missing from the order")]
    Missing(PhaseId),

    #[error("phase '{0}' appears more than once")]
    Duplicated(PhaseId),

    #[error("phase '{0}' is not part of the problem")]
    Unexpected(PhaseId),

    #[error("edge {0} violated: dependency placed after depender")]
    OutOfOrder(Edge),
}

/// Check that `order` lists exactly `phases` (each once) and respects every edge.
pub fn check_linearization(
    order: &[PhaseId],
    phases: &[PhaseId],
    edges: &[Edge],
) -> Result<(), Violation> {
    let pos = index(order)?;
    for p in phases {
        if !pos.contains_key(p.as_str()) {
            return Err(Violation::Missing(p.clone()));
        }
    }
    if pos.len() != phases.len() {
        let known: std::collections::HashSet<&str> = phases.iter().map(PhaseId::as_str).collect();
        if let Some(extra) = order.iter().find(|p| !known.contains(p.as_str())) {
            return Err(Violation::Unexpected(extra.clone()));
        }
    }
    check_edges(&pos, edges)
}

/// Panic unless every edge's dependency precedes its depender in `order`.
pub fn assert_topological(order: &[PhaseId], edges: &[Edge]) {
    let pos = match index(order) {
        Ok(pos) => pos,
        Err(v) => panic!("invalid order {order:?}: {v}"),
    };
    if let Err(v) = check_edges(&pos, edges) {
        panic!("order {order:?} is not topological: {v}");
    }
}

fn index(order: &[PhaseId]) -> Result<HashMap<&str, usize>, Violation> {
    let mut pos = HashMap::with_capacity(order.len());
    for (i, p) in order.iter().enumerate() {
        if pos.insert(p.as_str(), i).is_some() {
            return Err(Violation::Duplicated(p.clone()));
        }
    }
    Ok(pos)
}

fn check_edges(pos: &HashMap<&str, usize>, edges: &[Edge]) -> Result<(), Violation> {
    for e in edges {
        let depender = pos
            .get(e.depender.as_str())
            .ok_or_else(|| Violation::Missing(e.depender.clone()))?;
        let dependency = pos
            .get(e.dependency.as_str())
            .ok_or_else(|| Violation::Missing(e.dependency.clone()))?;
        if dependency >= depender {
            return Err(Violation::OutOfOrder(e.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[&str]) -> Vec<PhaseId> {
        v.iter().map(|s| PhaseId::from(*s)).collect()
    }

    #[test]
    fn accepts_valid_order() {
        let edges = [Edge::new("a", "b"), Edge::new("b", "c")];
        assert!(check_linearization(&ids(&["c", "b", "a"]), &ids(&["a", "b", "c"]), &edges).is_ok());
    }

    #[test]
    fn reports_each_violation_kind() {
        let phases = ids(&["a", "b"]);
        let edges = [Edge::new("a", "b")];
        assert_eq!(
            check_linearization(&ids(&["a", "b"]), &phases, &edges),
            Err(Violation::OutOfOrder(Edge::new("a", "b")))
        );
        assert_eq!(
            check_linearization(&ids(&["b"]), &phases, &edges),
            Err(Violation::Missing("a".into()))
        );
        assert_eq!(
            check_linearization(&ids(&["b", "b", "a"]), &phases, &edges),
            Err(Violation::Duplicated("b".into()))
        );
        assert_eq!(
            check_linearization(&ids(&["b", "x", "a"]), &phases, &edges),
            Err(Violation::Unexpected("x".into()))
        );
    }

    #[test]
    #[should_panic(expected = "not topological")]
    fn assert_topological_panics_on_violation() {
        assert_topological(&ids(&["a", "b"]), &[Edge::new("a", "b")]);
    }
}
