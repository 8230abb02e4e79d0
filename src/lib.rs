//! Dialogue FST Engine
//!
//! A dialogue-management engine that compiles a human-authored text
//! description of a finite-state transducer into an executable graph and
//! drives it at runtime over a serial stream of typed events.
//!
//! This library provides functionality for:
//! - Compiling the line-oriented FST text format (blocks, `%INCLUDE`,
//!   variable declarations) into a state/arc graph
//! - Matching events against exact, regex and variable-test guards with
//!   variable substitution and capture binding
//! - Driving a main transducer plus dynamically attached sub-transducers
//!   from a single worker thread with epsilon closure after every event
//! - Recording taken arcs in a fixed-capacity history ring for external
//!   debug renderers

pub mod cli;
pub mod compiler;
pub mod config;
pub mod error;
pub mod event;
pub mod fst;
pub mod host;
pub mod matcher;
pub mod runtime;

pub use config::Config;
pub use error::{Error, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize logging with the given log level
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
