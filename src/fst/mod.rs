//! FST graph model - states, arcs, and the compiled transducer arena

pub mod analyzer;
pub mod arc;
pub mod graph;
pub mod state;

// Re-export key types
pub use arc::{Arc, ArgSpec, Assignment, Guard, OutputTemplate, Provenance};
pub use graph::{ArcHandle, Graph, GraphStats};
pub use state::{State, StateIdx};
