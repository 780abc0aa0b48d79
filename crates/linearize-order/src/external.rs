//! Batch backend that shells out to the system `tsort` utility.
//!
//! `tsort` reads whitespace-separated pairs `x y` meaning "x comes before y"
//! and prints one item per line. Each recorded edge is written as
//! `dependency depender`; phases without edges are written as `p p` so they
//! still appear in the output.
//!
//! Failure mapping:
//! - non-zero exit whose diagnostics mention a loop → `Error::Cycle`, with
//!   the witness recomputed in-process from the graph;
//! - anything else (spawn failure, other exit, output that is not a
//!   permutation of the registered phases) → `Error::Backend`.

use std::collections::HashSet;
use std::io::Write;
use std::process::{Command, Stdio};

use linearize_core::config::Strategy;
use linearize_core::error::{Error, Result};
use linearize_core::phase::PhaseId;
use linearize_core::registry::PhaseRegistry;

use crate::batch::{kahn, SortBackend};
use crate::graph::DependencyGraph;

#[derive(Debug, Clone)]
pub struct TsortBackend {
    program: String,
}

impl Default for TsortBackend {
    fn default() -> Self {
        Self::new("tsort")
    }
}

impl TsortBackend {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Render the registry and graph as `tsort` input.
    pub fn render_input(registry: &PhaseRegistry, graph: &DependencyGraph) -> Result<String> {
        for id in registry.names() {
            if id.as_str().is_empty() || id.as_str().chars().any(char::is_whitespace) {
                return Err(Error::Backend(format!(
                    "phase '{id}' cannot be passed to tsort (empty or contains whitespace)"
                )));
            }
        }

        let mut input = String::new();
        for (depender, dependency) in graph.edges() {
            input.push_str(registry.name(dependency).as_str());
            input.push(' ');
            input.push_str(registry.name(depender).as_str());
            input.push('\n');
        }
        for key in registry.keys() {
            if !graph.is_connected(key) {
                let name = registry.name(key).as_str();
                input.push_str(name);
                input.push(' ');
                input.push_str(name);
                input.push('\n');
            }
        }
        Ok(input)
    }

    /// Parse `tsort` output and check it is a permutation of the registry.
    pub fn parse_output(registry: &PhaseRegistry, stdout: &str) -> Result<Vec<PhaseId>> {
        let mut seen = HashSet::new();
        let mut order = Vec::with_capacity(registry.len());
        for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if !registry.exists(line) {
                return Err(Error::Backend(format!("tsort emitted unknown phase '{line}'")));
            }
            if !seen.insert(line) {
                return Err(Error::Backend(format!("tsort emitted phase '{line}' twice")));
            }
            order.push(PhaseId::from(line));
        }
        if order.len() != registry.len() {
            return Err(Error::Backend(format!(
                "tsort emitted {} phases, expected {}",
                order.len(),
                registry.len()
            )));
        }
        Ok(order)
    }
}

impl SortBackend for TsortBackend {
    fn strategy(&self) -> Strategy {
        Strategy::Tsort
    }

    fn sort(&self, registry: &PhaseRegistry, graph: &DependencyGraph) -> Result<Vec<PhaseId>> {
        if registry.is_empty() {
            return Ok(Vec::new());
        }
        let input = Self::render_input(registry, graph)?;

        let mut child = Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Backend(format!("spawn {}: {e}", self.program)))?;

        // tsort reads all of its input before writing anything.
        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| Error::Backend("tsort stdin unavailable".to_string()))?;
            stdin
                .write_all(input.as_bytes())
                .map_err(|e| Error::Backend(format!("write to {}: {e}", self.program)))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| Error::Backend(format!("wait for {}: {e}", self.program)))?;
        let stderr = String::from_utf8_lossy(&output.stderr);

        #[cfg(feature = "tracing")]
        tracing::trace!(program = %self.program, status = ?output.status, bytes = input.len(), "tsort finished");

        if !output.status.success() {
            let lower = stderr.to_lowercase();
            if lower.contains("loop") || lower.contains("cycle") {
                if let Err(cycle) = kahn(graph) {
                    return Err(Error::Cycle {
                        phases: registry.to_names(&cycle),
                    });
                }
            }
            return Err(Error::Backend(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| Error::Backend(format!("tsort output is not UTF-8: {e}")))?;
        Self::parse_output(registry, &stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linearize_core::config::DuplicatePolicy;

    fn setup(phases: &[&str], edges: &[(&str, &str)]) -> (PhaseRegistry, DependencyGraph) {
        let mut r = PhaseRegistry::new(DuplicatePolicy::Reject);
        let mut g = DependencyGraph::new();
        for p in phases {
            g.add_node(r.add((*p).into()).unwrap().key());
        }
        for (a, b) in edges {
            let (a, b) = r.resolve_edge(a, b).unwrap();
            g.add_edge(a, b);
        }
        (r, g)
    }

    #[test]
    fn input_puts_dependency_first_and_self_pairs_isolated() {
        let (r, g) = setup(&["a", "b", "lone"], &[("a", "b")]);
        let input = TsortBackend::render_input(&r, &g).unwrap();
        assert_eq!(input, "b a\nlone lone\n");
    }

    #[test]
    fn whitespace_in_phase_is_a_backend_error() {
        let (r, g) = setup(&["has space"], &[]);
        assert!(matches!(
            TsortBackend::render_input(&r, &g),
            Err(Error::Backend(_))
        ));
    }

    #[test]
    fn output_must_be_a_permutation() {
        let (r, _) = setup(&["a", "b"], &[]);
        assert_eq!(
            TsortBackend::parse_output(&r, "b\na\n").unwrap(),
            vec![PhaseId::from("b"), PhaseId::from("a")]
        );
        assert!(TsortBackend::parse_output(&r, "a\n").is_err());
        assert!(TsortBackend::parse_output(&r, "a\na\n").is_err());
        assert!(TsortBackend::parse_output(&r, "a\nz\n").is_err());
    }

    #[test]
    fn missing_program_maps_to_backend_error() {
        let (r, g) = setup(&["a"], &[]);
        let backend = TsortBackend::new("/nonexistent/definitely-not-tsort");
        assert!(matches!(backend.sort(&r, &g), Err(Error::Backend(_))));
    }

    /// Write an executable stand-in for `tsort` that drains stdin, prints
    /// `stderr` and exits 1.
    #[cfg(unix)]
    fn failing_tsort(name: &str, stderr: &str) -> std::path::PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = std::env::temp_dir().join(format!(
            "linearize-fake-tsort-{}-{name}",
            std::process::id()
        ));
        let script = format!("#!/bin/sh\ncat >/dev/null\necho '{stderr}' >&2\nexit 1\n");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Run `sort`, retrying while a concurrently forked test still holds the
    /// freshly written script open (ETXTBSY).
    #[cfg(unix)]
    fn sort_with(program: &std::path::Path, r: &PhaseRegistry, g: &DependencyGraph) -> Result<Vec<PhaseId>> {
        let backend = TsortBackend::new(program.to_string_lossy());
        let mut res = backend.sort(r, g);
        for _ in 0..10 {
            match &res {
                Err(Error::Backend(msg)) if msg.contains("busy") => {
                    std::thread::sleep(std::time::Duration::from_millis(20));
                    res = backend.sort(r, g);
                }
                _ => break,
            }
        }
        res
    }

    #[cfg(unix)]
    #[test]
    fn loop_diagnostic_maps_to_cycle_with_witness() {
        let stub = failing_tsort("loop", "tsort: -: input contains a loop:");
        let (r, g) = setup(&["a", "b", "c"], &[("a", "b"), ("b", "a")]);
        let res = sort_with(&stub, &r, &g);
        let _ = std::fs::remove_file(&stub);
        match res {
            Err(Error::Cycle { phases }) => {
                assert_eq!(phases, vec![PhaseId::from("a"), PhaseId::from("b")]);
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn other_failures_map_to_backend_error() {
        let stub = failing_tsort("other", "tsort: read error: disk on fire");
        let (r, g) = setup(&["a", "b"], &[("a", "b"), ("b", "a")]);
        let res = sort_with(&stub, &r, &g);
        let _ = std::fs::remove_file(&stub);
        match res {
            Err(Error::Backend(msg)) => assert!(msg.contains("disk on fire"), "{msg}"),
            other => panic!("expected a backend error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn loop_diagnostic_on_acyclic_graph_is_a_backend_error() {
        let stub = failing_tsort("bogus-loop", "tsort: input contains a loop:");
        let (r, g) = setup(&["a", "b"], &[("a", "b")]);
        let res = sort_with(&stub, &r, &g);
        let _ = std::fs::remove_file(&stub);
        assert!(matches!(res, Err(Error::Backend(_))), "{res:?}");
    }
}
