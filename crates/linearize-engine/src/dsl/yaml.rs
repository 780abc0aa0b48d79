//! YAML problem files.
//!
//! Example:
//! ```yaml
//! config:
//!   strategy: incremental
//!   cycle_policy: fail_fast
//! phases: [fetch, parse, typecheck, codegen]
//! dependencies:
//!   - phase: parse
//!     depends_on: fetch
//!   - phase: codegen
//!     depends_on: [typecheck, parse]
//! ```
//!
//! `phases` is optional. Phases named only in `dependencies` are registered
//! after the declared ones, in first-seen order.

use serde::{Deserialize, Serialize};

use linearize_core::error::{Error, Result};

use crate::problem::{ParsedProblem, ProblemBuilder, ProblemConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProblemDoc {
    #[serde(default)]
    pub config: Option<ProblemConfig>,
    #[serde(default)]
    pub phases: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<DependencyDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencyDef {
    pub phase: String,
    #[serde(default)]
    pub depends_on: OneOrMany,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl Default for OneOrMany {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl OneOrMany {
    fn as_slice(&self) -> &[String] {
        match self {
            OneOrMany::One(s) => std::slice::from_ref(s),
            OneOrMany::Many(v) => v,
        }
    }
}

fn check_name<'a>(name: &'a str, what: &str) -> Result<&'a str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Parse(format!("empty phase name in {what}")));
    }
    Ok(name)
}

/// Parse a YAML document into a problem plus its optional config block.
pub fn parse_yaml_problem(yaml_src: &str) -> Result<ParsedProblem> {
    let doc: ProblemDoc =
        serde_yaml::from_str(yaml_src).map_err(|e| Error::Parse(e.to_string()))?;

    let mut b = ProblemBuilder::default();
    for p in &doc.phases {
        b.declare(check_name(p, "phases")?);
    }
    for dep in &doc.dependencies {
        let depender = check_name(&dep.phase, "dependencies")?;
        b.ensure(depender);
        for d in dep.depends_on.as_slice() {
            b.depend(depender, check_name(d, "depends_on")?);
        }
    }

    Ok(ParsedProblem {
        problem: b.finish(),
        config: doc.config.unwrap_or_default(),
    })
}
