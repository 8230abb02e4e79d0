//! Transducer - one compiled graph driven by the transition engine

use crate::compiler::Compiled;
use crate::event::{Event, Output};
use crate::fst::{Arc, Graph};
use crate::host::Host;
use crate::matcher::{VarStore, match_arc, substitute};
use crate::runtime::history::{HistoryEntry, SharedHistory};
use crate::{Error, Result};
use chrono::Utc;

/// One compiled graph plus its own variable store and current-state
/// pointer.
///
/// Before [`start`](Self::start) sets the initial state, `transition` is a
/// no-op. A state with no outgoing arcs is a valid idle terminus; entering
/// it is reported once at WARN and the transducer then waits.
pub struct Transducer {
    name: String,
    graph: Graph,
    vars: VarStore,
    current: Option<usize>,
    dead_end_reported: bool,
    epsilon_limit: usize,
    history: SharedHistory,
}

impl Transducer {
    /// Build a transducer from compiler output. Top-of-file variable
    /// declarations seed the store; compile diagnostics are the caller's
    /// to report.
    pub fn new(
        name: impl Into<String>,
        compiled: Compiled,
        history: SharedHistory,
        epsilon_limit: usize,
    ) -> Self {
        let mut vars = VarStore::new();
        for assignment in &compiled.vars {
            vars.set(assignment.name.clone(), assignment.value.clone());
        }
        Self {
            name: name.into(),
            graph: compiled.graph,
            vars,
            current: None,
            dead_end_reported: false,
            epsilon_limit,
            history,
        }
    }

    /// Set the current state to the named label; fails if the label is
    /// absent from the compiled graph.
    pub fn start(&mut self, label: &str) -> Result<()> {
        match self.graph.find(label) {
            Some(idx) => {
                self.current = Some(idx);
                self.dead_end_reported = false;
                tracing::debug!(transducer = %self.name, initial = label, "started");
                Ok(())
            }
            None => Err(Error::InitialState {
                label: label.to_string(),
                file: self.name.clone(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn vars(&self) -> &VarStore {
        &self.vars
    }

    pub fn is_started(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_label(&self) -> Option<&str> {
        self.current.map(|idx| self.graph.state(idx).label.as_str())
    }

    /// Arcs leaving the current state (empty before start)
    pub fn current_arcs(&self) -> &[Arc] {
        match self.current {
            Some(idx) => &self.graph.state(idx).arcs,
            None => &[],
        }
    }

    /// Attempt one transition on the current state.
    ///
    /// Arcs are scanned in declaration order; the first matching guard
    /// wins. On a match the output template is substituted, the variable
    /// actions run left-to-right, the state pointer advances and the taken
    /// arc is appended to the history log. Without a match this returns
    /// `None` with no side effects.
    pub fn transition(&mut self, event: &Event, host: &dyn Host) -> Option<Output> {
        let current = self.current?;

        if self.graph.state(current).arcs.is_empty() {
            if !self.dead_end_reported {
                tracing::warn!(
                    transducer = %self.name,
                    state = %self.graph.state(current).label,
                    "dead end: state has no outgoing arcs"
                );
                self.dead_end_reported = true;
            }
            return None;
        }

        let mut matched = None;
        for (idx, arc) in self.graph.state(current).arcs.iter().enumerate() {
            if match_arc(arc, event, &mut self.vars, host) {
                matched = Some(idx);
                break;
            }
        }
        let arc_idx = matched?;

        let arc = &self.graph.state(current).arcs[arc_idx];
        let output = Output {
            cmd_type: substitute(&arc.output.cmd_type, &self.vars, host),
            args: substitute(&arc.output.args, &self.vars, host),
        };

        for action in &arc.actions {
            let value = substitute(&action.value, &self.vars, host);
            if let Some(global) = action.name.strip_prefix('%') {
                host.kv_set(global, &value);
            } else {
                self.vars.set(action.name.clone(), value);
            }
        }

        let to = arc.to;
        let entry = HistoryEntry {
            transducer: self.name.clone(),
            from: self.graph.state(current).label.clone(),
            to: self.graph.state(to).label.clone(),
            event: event.wire(),
            output: (!output.is_silent()).then(|| output.wire()),
            file: arc.provenance.file.clone(),
            line: arc.provenance.line,
            timestamp: Utc::now(),
        };
        tracing::trace!(
            transducer = %entry.transducer,
            from = %entry.from,
            to = %entry.to,
            event = %entry.event,
            "transition"
        );

        self.current = Some(to);
        self.dead_end_reported = false;
        self.history
            .lock()
            .expect("history lock poisoned")
            .push(entry);

        Some(output)
    }

    /// Run epsilon closure: feed the empty event until no arc fires,
    /// collecting every produced output. The step limit keeps an authored
    /// epsilon cycle from hanging the worker.
    pub fn run_closure(&mut self, host: &dyn Host) -> Vec<Output> {
        let epsilon = Event::epsilon();
        let mut outputs = Vec::new();
        for _ in 0..self.epsilon_limit {
            match self.transition(&epsilon, host) {
                Some(output) => outputs.push(output),
                None => return outputs,
            }
        }
        tracing::error!(
            transducer = %self.name,
            limit = self.epsilon_limit,
            "epsilon closure did not settle within the step limit; epsilon cycle in the graph?"
        );
        outputs
    }
}
