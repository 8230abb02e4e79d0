//! CLI command implementations

use crate::cli::OutputFormat;
use crate::compiler::{CompileError, Compiler};
use crate::config::Config;
use crate::ensure;
use crate::event::Event;
use crate::fst::{GraphStats, analyzer, analyzer::AnalysisReport};
use crate::host::{FileLoader, Host, StdFileLoader, StdHost};
use crate::runtime::Driver;
use crate::Result;
use serde::Serialize;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

/// Compile report for `check`
#[derive(Debug, Serialize)]
struct CheckReport {
    file: String,
    initial_state: String,
    initial_state_found: bool,
    stats: GraphStats,
    analysis: AnalysisReport,
    errors: Vec<CompileError>,
}

/// Compile a file and report diagnostics; exits non-zero when the file
/// has compile errors
pub fn check(
    file: &Path,
    initial: Option<&str>,
    output: OutputFormat,
    config: &Config,
) -> Result<()> {
    let loader = StdFileLoader;
    let path = file.to_string_lossy();
    let compiled = Compiler::new(&loader).compile_file(&path)?;

    let initial = initial.unwrap_or(&config.engine.initial_state);
    let report = CheckReport {
        file: path.clone().into_owned(),
        initial_state: initial.to_string(),
        initial_state_found: compiled.graph.find(initial).is_some(),
        stats: compiled.graph.stats(),
        analysis: analyzer::analyze(&compiled.graph, Some(initial)),
        errors: compiled.errors,
    };

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => print_report(&report),
    }

    ensure!(
        report.errors.is_empty(),
        "{} error(s) in {}",
        report.errors.len(),
        report.file
    );
    ensure!(
        report.initial_state_found,
        "initial state {:?} not found in {}",
        report.initial_state,
        report.file
    );
    Ok(())
}

fn print_report(report: &CheckReport) {
    println!("file:            {}", report.file);
    println!(
        "states:          {} ({} anchors, {} dead ends)",
        report.stats.total_states, report.stats.anchor_states, report.stats.dead_end_states
    );
    println!("arcs:            {}", report.stats.total_arcs);
    println!(
        "initial state:   {} ({})",
        report.initial_state,
        if report.initial_state_found {
            "found"
        } else {
            "MISSING"
        }
    );
    println!("branching:       {:.2}", report.analysis.branching_factor);
    if report.analysis.has_epsilon_cycle {
        println!("warning:         epsilon-only cycle (closure may not settle)");
    }
    if report.analysis.unreachable_states > 0 {
        println!(
            "warning:         {} state(s) unreachable from the initial state",
            report.analysis.unreachable_states
        );
    }
    if report.errors.is_empty() {
        println!("errors:          none");
    } else {
        println!("errors:          {}", report.errors.len());
        for error in &report.errors {
            println!("  {}", error);
        }
    }
}

/// Load an FST and feed it events from stdin, one `TYPE|args` per line
pub fn run(file: &Path, initial: Option<&str>, config: &Config) -> Result<()> {
    let loader: Arc<dyn FileLoader> = Arc::new(StdFileLoader);
    let host: Arc<dyn Host> = Arc::new(StdHost::new());
    let path = file.to_string_lossy();

    let mut driver = Driver::spawn(loader, host, &path, initial, config.driver_options())?;
    tracing::info!(file = %path, "driver running; reading events from stdin");

    for line in std::io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        driver.post(Event::parse(line))?;
    }

    driver.shutdown();
    Ok(())
}

/// Export the compiled graph to Graphviz DOT
pub fn dot(file: &Path, out: Option<&Path>) -> Result<()> {
    let loader = StdFileLoader;
    let path = file.to_string_lossy();
    let compiled = Compiler::new(&loader).compile_file(&path)?;
    if !compiled.errors.is_empty() {
        tracing::warn!(
            errors = compiled.errors.len(),
            "exporting best-effort graph despite compile errors"
        );
    }

    let dot = compiled.graph.to_dot();
    match out {
        Some(target) => {
            std::fs::write(target, dot)?;
            tracing::info!(target = %target.display(), "graph exported");
        }
        None => print!("{}", dot),
    }
    Ok(())
}
