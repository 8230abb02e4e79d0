//! CLI module
//!
//! This module defines the command-line interface using clap and implements
//! the command execution logic.

use crate::{Config, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;

/// Dialogue FST engine CLI
#[derive(Parser, Debug)]
#[command(name = "dialog-fst")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile an FST file and report errors and graph diagnostics
    Check {
        /// FST file to compile
        file: PathBuf,

        /// Initial state label used for the reachability check
        #[arg(long)]
        initial_state: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        output: OutputFormat,
    },

    /// Load an FST and drive it with events read from stdin (TYPE|args
    /// per line); dispatched commands go to stdout
    Run {
        /// FST file to load
        file: PathBuf,

        /// Initial state label (overrides config)
        #[arg(long)]
        initial_state: Option<String>,
    },

    /// Export a compiled FST graph to Graphviz DOT
    Dot {
        /// FST file to compile
        file: PathBuf,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

/// Output format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text table
    Table,
}

/// Execute the CLI command
pub fn execute(args: Cli, config: Config) -> Result<()> {
    match args.command {
        Commands::Check {
            file,
            initial_state,
            output,
        } => commands::check(&file, initial_state.as_deref(), output, &config),
        Commands::Run {
            file,
            initial_state,
        } => commands::run(&file, initial_state.as_deref(), &config),
        Commands::Dot { file, out } => commands::dot(&file, out.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["dialog-fst", "check", "main.fst", "--output", "json"]);
        assert!(cli.is_ok());

        let cli = Cli::try_parse_from(["dialog-fst", "run", "main.fst", "--initial-state", "0"]);
        assert!(cli.is_ok());

        let cli = Cli::try_parse_from(["dialog-fst", "bogus"]);
        assert!(cli.is_err());
    }
}
