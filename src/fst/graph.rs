use crate::fst::{Arc, State, StateIdx};
use serde::Serialize;
use std::collections::HashMap;

/// Handle to one arc: owning state plus position in its arc list
pub type ArcHandle = (StateIdx, usize);

/// The compiled transducer graph.
///
/// States live in an arena and are addressed by stable index; arcs hold
/// indices rather than references, so retargeting an arc during block
/// compilation is a plain index overwrite. The label index gives O(1)
/// lookup when resolving source text and the initial state.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    states: Vec<State>,
    index: HashMap<String, StateIdx>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a state by label, creating it empty if absent
    pub fn ensure_state(&mut self, label: &str) -> StateIdx {
        if let Some(&idx) = self.index.get(label) {
            return idx;
        }
        let idx = self.states.len();
        self.states.push(State::new(label));
        self.index.insert(label.to_string(), idx);
        idx
    }

    /// Allocate a synthetic anchor state for a block alternative. Anchor
    /// labels are `#<n>` with a monotonically increasing counter owned by
    /// the compiler session, so they never collide with authored labels
    /// across included files.
    pub fn add_anchor(&mut self, seq: usize, virtual_from: &str, virtual_to: &str) -> StateIdx {
        let label = format!("#{}", seq);
        let idx = self.states.len();
        self.states
            .push(State::anchor(&label, virtual_from, virtual_to));
        self.index.insert(label, idx);
        idx
    }

    pub fn find(&self, label: &str) -> Option<StateIdx> {
        self.index.get(label).copied()
    }

    pub fn state(&self, idx: StateIdx) -> &State {
        &self.states[idx]
    }

    pub fn state_mut(&mut self, idx: StateIdx) -> &mut State {
        &mut self.states[idx]
    }

    pub fn states(&self) -> impl Iterator<Item = (StateIdx, &State)> {
        self.states.iter().enumerate()
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn arc_count(&self) -> usize {
        self.states.iter().map(|s| s.arcs.len()).sum()
    }

    /// Append an arc to a state's (ordered) arc list
    pub fn add_arc(&mut self, from: StateIdx, arc: Arc) -> ArcHandle {
        let arcs = &mut self.states[from].arcs;
        arcs.push(arc);
        (from, arcs.len() - 1)
    }

    pub fn arc(&self, handle: ArcHandle) -> &Arc {
        &self.states[handle.0].arcs[handle.1]
    }

    /// Point an existing arc at a new destination
    pub fn retarget(&mut self, handle: ArcHandle, to: StateIdx) {
        self.states[handle.0].arcs[handle.1].to = to;
    }

    /// Get graph statistics
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            total_states: self.state_count(),
            total_arcs: self.arc_count(),
            anchor_states: self.states.iter().filter(|s| s.is_anchor()).count(),
            dead_end_states: self.states.iter().filter(|s| s.is_dead_end()).count(),
        }
    }

    /// Export to DOT format for Graphviz
    pub fn to_dot(&self) -> String {
        let mut dot = "digraph Transducer {\n".to_string();
        dot.push_str("  rankdir=LR;\n");
        dot.push_str("  node [shape=circle];\n\n");

        for state in &self.states {
            let shape = if state.is_anchor() { "point" } else { "circle" };
            dot.push_str(&format!(
                "  \"{}\" [label=\"{}\", shape={}];\n",
                state.label,
                state.display_label(),
                shape
            ));
        }

        dot.push('\n');

        for state in &self.states {
            for arc in &state.arcs {
                let label = format!("{} / {}", arc.guard.display(), arc.output.cmd_type);
                dot.push_str(&format!(
                    "  \"{}\" -> \"{}\" [label=\"{}\"];\n",
                    state.label,
                    self.states[arc.to].label,
                    label.replace('"', "\\\"")
                ));
            }
        }

        dot.push_str("}\n");
        dot
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphStats {
    pub total_states: usize,
    pub total_arcs: usize,
    pub anchor_states: usize,
    pub dead_end_states: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fst::{Guard, OutputTemplate, Provenance};

    fn test_arc(to: StateIdx) -> Arc {
        Arc {
            guard: Guard::Exact {
                event_type: "A".to_string(),
                args: None,
            },
            output: OutputTemplate::parse("OUT"),
            actions: Vec::new(),
            to,
            provenance: Provenance::default(),
        }
    }

    #[test]
    fn test_empty_graph() {
        let graph = Graph::new();
        assert_eq!(graph.state_count(), 0);
        assert_eq!(graph.arc_count(), 0);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_ensure_state_dedup() {
        let mut graph = Graph::new();
        let a = graph.ensure_state("0");
        let b = graph.ensure_state("1");
        let a2 = graph.ensure_state("0");
        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(graph.state_count(), 2);
        assert_eq!(graph.find("1"), Some(b));
        assert_eq!(graph.find("missing"), None);
    }

    #[test]
    fn test_retarget() {
        let mut graph = Graph::new();
        let s0 = graph.ensure_state("0");
        let s1 = graph.ensure_state("1");
        let handle = graph.add_arc(s0, test_arc(s1));

        let anchor = graph.add_anchor(1, "0", "1");
        graph.retarget(handle, anchor);
        assert_eq!(graph.arc(handle).to, anchor);
        assert!(graph.state(anchor).is_anchor());
    }

    #[test]
    fn test_stats() {
        let mut graph = Graph::new();
        let s0 = graph.ensure_state("0");
        let s1 = graph.ensure_state("1");
        graph.add_arc(s0, test_arc(s1));

        let stats = graph.stats();
        assert_eq!(stats.total_states, 2);
        assert_eq!(stats.total_arcs, 1);
        assert_eq!(stats.anchor_states, 0);
        assert_eq!(stats.dead_end_states, 1);
    }

    #[test]
    fn test_to_dot_output() {
        let mut graph = Graph::new();
        let s0 = graph.ensure_state("0");
        let s1 = graph.ensure_state("1");
        graph.add_arc(s0, test_arc(s1));

        let dot = graph.to_dot();
        assert!(dot.contains("digraph Transducer"));
        assert!(dot.contains("\"0\" -> \"1\""));
        assert!(dot.contains("A / OUT"));
    }
}
