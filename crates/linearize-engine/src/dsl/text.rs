//! Line-oriented problem files.
//!
//! ```text
//! # phase: dependencies...
//! parse: fetch
//! codegen: typecheck parse
//! lint
//! ```
//!
//! A line without `:` declares each whitespace-separated phase on it.
//! Everything after `#` is a comment. Text files carry no config block.

use linearize_core::error::{Error, Result};

use crate::problem::{ParsedProblem, ProblemBuilder, ProblemConfig};

pub fn parse_text_problem(src: &str) -> Result<ParsedProblem> {
    let mut b = ProblemBuilder::default();

    for (idx, raw) in src.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        match line.split_once(':') {
            Some((head, deps)) => {
                let depender = head.trim();
                if depender.is_empty() || depender.contains(char::is_whitespace) {
                    return Err(Error::Parse(format!(
                        "line {}: expected a single phase before ':', got '{head}'",
                        idx + 1
                    )));
                }
                if deps.contains(':') {
                    return Err(Error::Parse(format!("line {}: more than one ':'", idx + 1)));
                }
                b.ensure(depender);
                for dep in deps.split_whitespace() {
                    b.depend(depender, dep);
                }
            }
            None => {
                for p in line.split_whitespace() {
                    b.ensure(p);
                }
            }
        }
    }

    Ok(ParsedProblem {
        problem: b.finish(),
        config: ProblemConfig::default(),
    })
}
