//! Static graph diagnostics
//!
//! Surfaces authoring problems before the FST is driven: epsilon-only
//! cycles (the closure loop would never reach a fixed point), states
//! unreachable from the initial label, and basic shape metrics.

use super::Graph;
use petgraph::visit::Dfs;
use serde::Serialize;

/// Analysis report over one compiled graph
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub branching_factor: f64,
    pub has_epsilon_cycle: bool,
    pub unreachable_states: usize,
    pub dead_end_states: usize,
}

/// Analyze a compiled graph; `initial` enables the reachability check
pub fn analyze(graph: &Graph, initial: Option<&str>) -> AnalysisReport {
    let node_count = graph.state_count();
    if node_count == 0 {
        return AnalysisReport {
            branching_factor: 0.0,
            has_epsilon_cycle: false,
            unreachable_states: 0,
            dead_end_states: 0,
        };
    }

    let mut full = petgraph::Graph::<usize, ()>::new();
    let mut epsilon_only = petgraph::Graph::<usize, ()>::new();
    let mut full_nodes = Vec::with_capacity(node_count);
    let mut eps_nodes = Vec::with_capacity(node_count);
    for (idx, _) in graph.states() {
        full_nodes.push(full.add_node(idx));
        eps_nodes.push(epsilon_only.add_node(idx));
    }
    for (idx, state) in graph.states() {
        for arc in &state.arcs {
            full.add_edge(full_nodes[idx], full_nodes[arc.to], ());
            if arc.guard.is_epsilon() {
                epsilon_only.add_edge(eps_nodes[idx], eps_nodes[arc.to], ());
            }
        }
    }

    let has_epsilon_cycle = petgraph::algo::is_cyclic_directed(&epsilon_only);

    let unreachable_states = match initial.and_then(|label| graph.find(label)) {
        Some(start) => {
            let mut visited = 0usize;
            let mut dfs = Dfs::new(&full, full_nodes[start]);
            while dfs.next(&full).is_some() {
                visited += 1;
            }
            node_count - visited
        }
        None => 0,
    };

    AnalysisReport {
        branching_factor: graph.arc_count() as f64 / node_count as f64,
        has_epsilon_cycle,
        unreachable_states,
        dead_end_states: graph.stats().dead_end_states,
    }
}
