//! linearize CLI: order, validate, explain and check phase problems.

use clap::{Args, Parser, Subcommand};
use linearize_core::config::{CyclePolicy, DuplicatePolicy, EngineConfig, Strategy};
use linearize_core::phase::PhaseId;
use linearize_engine::{
    parse_text_problem, parse_yaml_problem, run_problem, LinearizationEngine, ParsedProblem,
};
use linearize_order::check_linearization;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "linearize")]
#[command(about = "Order named phases so every dependency comes before its dependers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a valid order for a problem file, one phase per line
    Order {
        /// Path to the problem file (.yaml/.yml, otherwise plain text)
        #[arg(short, long)]
        problem: PathBuf,

        #[command(flatten)]
        overrides: Overrides,

        /// Write the run manifest as JSON to this path
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Print the order as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Parse a problem file without ordering it
    Validate {
        /// Path to the problem file
        #[arg(short, long)]
        problem: PathBuf,
    },

    /// Show the resolved config and each phase's position and dependencies
    Explain {
        /// Path to the problem file
        #[arg(short, long)]
        problem: PathBuf,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Verify an existing order (one phase per line) against a problem file
    Check {
        /// Path to the problem file
        #[arg(short, long)]
        problem: PathBuf,

        /// Path to the order to verify
        #[arg(short, long)]
        order: PathBuf,
    },
}

/// Engine settings; these win over the problem file's `config:` block and the environment.
#[derive(Args, Debug, Default, Clone)]
struct Overrides {
    /// Ordering strategy: kahn, rounds, incremental or tsort
    #[arg(long)]
    strategy: Option<Strategy>,

    /// Duplicate phase policy: reject or ignore
    #[arg(long)]
    duplicate_policy: Option<DuplicatePolicy>,

    /// Cycle policy: deferred or fail_fast
    #[arg(long)]
    cycle_policy: Option<CyclePolicy>,

    /// Program used by the tsort strategy
    #[arg(long)]
    tsort_program: Option<String>,
}

impl Overrides {
    fn apply_to(&self, cfg: &mut EngineConfig) {
        if let Some(s) = self.strategy {
            cfg.strategy = s;
        }
        if let Some(p) = self.duplicate_policy {
            cfg.duplicate_policy = p;
        }
        if let Some(p) = self.cycle_policy {
            cfg.cycle_policy = p;
        }
        if let Some(prog) = &self.tsort_program {
            cfg.tsort_program = prog.clone();
        }
    }
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Order {
            problem,
            overrides,
            manifest,
            json,
        } => {
            if let Err(e) = order_problem(&problem, &overrides, manifest.as_deref(), json) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Validate { problem } => match validate_problem(&problem) {
            Ok((phases, edges)) => {
                println!("✓ Problem is valid ({phases} phases, {edges} dependencies)")
            }
            Err(e) => {
                eprintln!("Validation failed: {}", e);
                std::process::exit(1);
            }
        },
        Commands::Explain { problem, overrides } => {
            if let Err(e) = explain_problem(&problem, &overrides) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Check { problem, order } => {
            if let Err(e) = check_order(&problem, &order) {
                eprintln!("Check failed: {}", e);
                std::process::exit(1);
            }
            println!("✓ Order is a valid linearization");
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_problem(path: &Path) -> Result<ParsedProblem, Box<dyn std::error::Error>> {
    let src = fs::read_to_string(path)
        .map_err(|e| format!("read {}: {}", path.display(), e))?;
    Ok(parse_problem(&src, is_yaml(path))?)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn parse_problem(src: &str, yaml: bool) -> linearize_core::error::Result<ParsedProblem> {
    if yaml {
        parse_yaml_problem(src)
    } else {
        parse_text_problem(src)
    }
}

/// Defaults, then environment, then the problem file, then CLI flags.
fn resolve_config(parsed: &ParsedProblem, overrides: &Overrides) -> EngineConfig {
    let mut cfg = EngineConfig::from_env();
    parsed.config.apply_to(&mut cfg);
    overrides.apply_to(&mut cfg);
    cfg
}

fn order_problem(
    path: &Path,
    overrides: &Overrides,
    manifest_path: Option<&Path>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = load_problem(path)?;
    let cfg = resolve_config(&parsed, overrides);
    tracing::debug!(strategy = %cfg.strategy, problem = %path.display(), "ordering");

    let mut engine = LinearizationEngine::new(cfg);
    let outcome = run_problem(&mut engine, &parsed.problem)?;

    if let Some(out) = manifest_path {
        let body = serde_json::to_string_pretty(&outcome.manifest)?;
        fs::write(out, body).map_err(|e| format!("write {}: {}", out.display(), e))?;
        tracing::info!(manifest = %out.display(), "wrote manifest");
    }

    let order = outcome.order?;
    if json {
        println!("{}", serde_json::to_string(&order)?);
    } else {
        for p in &order {
            println!("{p}");
        }
    }
    Ok(())
}

fn validate_problem(path: &Path) -> Result<(usize, usize), Box<dyn std::error::Error>> {
    let parsed = load_problem(path)?;
    Ok((parsed.problem.phases.len(), parsed.problem.edges.len()))
}

fn explain_problem(path: &Path, overrides: &Overrides) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = load_problem(path)?;
    let cfg = resolve_config(&parsed, overrides);

    println!("Linearization Plan");
    println!("==================");
    println!();
    println!("Strategy:         {}", cfg.strategy);
    println!("Duplicate policy: {}", cfg.duplicate_policy);
    println!("Cycle policy:     {}", cfg.cycle_policy);
    if cfg.strategy == Strategy::Tsort {
        println!("Tsort program:    {}", cfg.tsort_program);
    }
    println!();
    println!("Phases:       {}", parsed.problem.phases.len());
    println!("Dependencies: {}", parsed.problem.edges.len());
    println!();

    let mut deps: HashMap<&str, Vec<&str>> = HashMap::new();
    for e in &parsed.problem.edges {
        deps.entry(e.depender.as_str())
            .or_default()
            .push(e.dependency.as_str());
    }

    let mut engine = LinearizationEngine::new(cfg);
    parsed.problem.apply(&mut engine)?;
    let order = engine.linearize()?;

    println!("Order:");
    for (i, p) in order.iter().enumerate() {
        match deps.get(p.as_str()) {
            Some(ds) => println!("  {}. {} (after {})", i + 1, p, ds.join(", ")),
            None => println!("  {}. {}", i + 1, p),
        }
    }
    Ok(())
}

fn check_order(problem: &Path, order: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = load_problem(problem)?;
    let src = fs::read_to_string(order)
        .map_err(|e| format!("read {}: {}", order.display(), e))?;
    let order = parse_order_list(&src);

    let mut seen = HashSet::new();
    let phases: Vec<PhaseId> = parsed
        .problem
        .phases
        .iter()
        .filter(|p| seen.insert(p.as_str()))
        .cloned()
        .collect();

    check_linearization(&order, &phases, &parsed.problem.edges)?;
    Ok(())
}

/// One phase per line; blank lines and `#` comments are skipped.
fn parse_order_list(src: &str) -> Vec<PhaseId> {
    src.lines()
        .map(|l| l.split('#').next().unwrap_or("").trim())
        .filter(|l| !l.is_empty())
        .map(PhaseId::from)
        .collect()
}
