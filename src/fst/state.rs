//! State representation

use crate::fst::Arc;
use serde::{Deserialize, Serialize};

/// Stable handle into the graph's state arena
pub type StateIdx = usize;

/// A state in the transducer graph.
///
/// States synthesized during block compilation (anchors) carry the
/// conceptual block endpoints in `virtual_from` / `virtual_to`; this is
/// display metadata only and is never consulted by matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    pub label: String,
    /// Outgoing arcs in declaration order
    pub arcs: Vec<Arc>,
    pub virtual_from: Option<String>,
    pub virtual_to: Option<String>,
}

impl State {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            arcs: Vec::new(),
            virtual_from: None,
            virtual_to: None,
        }
    }

    /// A synthetic anchor hosting an additional block alternative
    pub fn anchor(
        label: impl Into<String>,
        virtual_from: impl Into<String>,
        virtual_to: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            arcs: Vec::new(),
            virtual_from: Some(virtual_from.into()),
            virtual_to: Some(virtual_to.into()),
        }
    }

    pub fn is_anchor(&self) -> bool {
        self.virtual_from.is_some()
    }

    /// A terminal state is a valid idle terminus, not an error
    pub fn is_dead_end(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Label shown to humans; anchors display their block endpoints
    pub fn display_label(&self) -> String {
        match (&self.virtual_from, &self.virtual_to) {
            (Some(from), Some(to)) => format!("{} ({}..{})", self.label, from, to),
            _ => self.label.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_state() {
        let s = State::new("0");
        assert_eq!(s.label, "0");
        assert!(!s.is_anchor());
        assert!(s.is_dead_end());
        assert_eq!(s.display_label(), "0");
    }

    #[test]
    fn test_anchor_state() {
        let s = State::anchor("#3", "0", "100");
        assert!(s.is_anchor());
        assert_eq!(s.display_label(), "#3 (0..100)");
    }
}
