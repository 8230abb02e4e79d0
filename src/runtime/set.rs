//! Transducer set - main plus dynamically attached sub-transducers
//!
//! All members consume the same event stream in lock-step: per event the
//! main transducer transitions (plus epsilon closure), then every sub in
//! attach order. Control commands reshape the set itself; everything else
//! is ordinary transition input.

use crate::compiler::Compiler;
use crate::event::{Event, Output};
use crate::fst::Guard;
use crate::host::{FileLoader, Host};
use crate::runtime::history::SharedHistory;
use crate::runtime::{DriverOptions, Transducer};
use crate::Result;
use std::collections::HashSet;

/// Full reload: `FST_LOAD|path[,initial_state]`
pub const CMD_FST_LOAD: &str = "FST_LOAD";
/// Attach a sub-transducer: `SUBFST_START|name,path`
pub const CMD_SUBFST_START: &str = "SUBFST_START";
/// Attach only if the file exists: `SUBFST_START_IF|name,path`
pub const CMD_SUBFST_START_IF: &str = "SUBFST_START_IF";
/// Detach a sub-transducer: `SUBFST_STOP|name`
pub const CMD_SUBFST_STOP: &str = "SUBFST_STOP";
/// Notification emitted when the predicted-input set changes
pub const CMD_RECOG_MODIFY: &str = "RECOG_MODIFY";
pub const PREDICTWORD: &str = "PREDICTWORD";

/// One main transducer plus zero or more named sub-transducers
pub struct TransducerSet {
    main: Transducer,
    subs: Vec<Transducer>,
    opts: DriverOptions,
    history: SharedHistory,
    /// Last comma-joined predicted-input set
    predicted: String,
}

impl TransducerSet {
    /// Compile and start a main FST plus any sibling sub-FSTs
    /// (`<path>.<name>` files discovered through the loader). Runs the
    /// startup epsilon closure and the first predicted-input pass.
    pub fn load(
        loader: &dyn FileLoader,
        host: &dyn Host,
        path: &str,
        initial: Option<&str>,
        opts: &DriverOptions,
        history: SharedHistory,
    ) -> Result<Self> {
        let compiled = Compiler::new(loader).compile_file(path)?;
        let mut main = Transducer::new(path, compiled, history.clone(), opts.epsilon_limit);
        main.start(initial.unwrap_or(&opts.initial_state))?;

        let mut set = Self {
            main,
            subs: Vec::new(),
            opts: opts.clone(),
            history,
            predicted: String::new(),
        };

        for output in set.main.run_closure(host) {
            dispatch(host, &output);
        }

        for sibling in loader.list_siblings(path) {
            let prefix = format!("{}.", path);
            let name = sibling
                .strip_prefix(&prefix)
                .unwrap_or(sibling.as_str())
                .to_string();
            if let Err(err) = set.start_sub(&name, &sibling, loader, host) {
                tracing::warn!(file = %sibling, %err, "skipping sibling sub-FST");
            }
        }

        set.recompute_predicted(host);
        Ok(set)
    }

    pub fn main(&self) -> &Transducer {
        &self.main
    }

    pub fn sub_names(&self) -> Vec<&str> {
        self.subs.iter().map(Transducer::name).collect()
    }

    pub fn predicted(&self) -> &str {
        &self.predicted
    }

    /// Process one dequeued event: control commands reshape the set,
    /// anything else transitions every member.
    pub fn handle(&mut self, event: &Event, host: &dyn Host, loader: &dyn FileLoader) {
        match event.event_type.as_str() {
            CMD_FST_LOAD => self.reload(event, host, loader),

            CMD_SUBFST_START | CMD_SUBFST_START_IF => {
                let args = event.args.as_deref().unwrap_or("");
                let Some((name, path)) = args.split_once(',') else {
                    tracing::error!(cmd = %event.event_type, args, "expected name,path");
                    return;
                };
                if event.event_type == CMD_SUBFST_START_IF && !loader.exists(path) {
                    tracing::debug!(name, path, "sub-FST file absent; not attaching");
                    return;
                }
                if let Err(err) = self.start_sub(name, path, loader, host) {
                    tracing::error!(name, path, %err, "failed to attach sub-transducer");
                }
                self.recompute_predicted(host);
            }

            CMD_SUBFST_STOP => {
                let name = event.args.as_deref().unwrap_or("");
                self.stop_sub(name);
                self.recompute_predicted(host);
            }

            _ => self.step(event, host),
        }
    }

    /// Transition every member on a real event, dispatching outputs in
    /// member order, then refresh the predicted-input set
    fn step(&mut self, event: &Event, host: &dyn Host) {
        for t in std::iter::once(&mut self.main).chain(self.subs.iter_mut()) {
            if let Some(output) = t.transition(event, host) {
                dispatch(host, &output);
                for output in t.run_closure(host) {
                    dispatch(host, &output);
                }
            }
        }
        self.recompute_predicted(host);
    }

    /// Attach a sub-transducer, replacing any running one of the same name
    pub fn start_sub(
        &mut self,
        name: &str,
        path: &str,
        loader: &dyn FileLoader,
        host: &dyn Host,
    ) -> Result<()> {
        let compiled = Compiler::new(loader).compile_file(path)?;
        let mut sub = Transducer::new(name, compiled, self.history.clone(), self.opts.epsilon_limit);
        sub.start(&self.opts.initial_state)?;

        if let Some(pos) = self.subs.iter().position(|t| t.name() == name) {
            tracing::info!(name, "replacing running sub-transducer");
            self.subs.remove(pos);
        }
        for output in sub.run_closure(host) {
            dispatch(host, &output);
        }
        self.subs.push(sub);
        tracing::info!(name, path, "sub-transducer attached");
        Ok(())
    }

    /// Detach a sub-transducer by name; detaching an unattached name is a
    /// no-op
    pub fn stop_sub(&mut self, name: &str) {
        match self.subs.iter().position(|t| t.name() == name) {
            Some(pos) => {
                self.subs.remove(pos);
                tracing::info!(name, "sub-transducer detached");
            }
            None => tracing::debug!(name, "sub-transducer not attached; nothing to stop"),
        }
    }

    /// Full reload from `FST_LOAD|path[,initial]`; a failed load leaves
    /// the current set untouched
    fn reload(&mut self, event: &Event, host: &dyn Host, loader: &dyn FileLoader) {
        let args = event.args.as_deref().unwrap_or("");
        let mut parts = args.split(',');
        let Some(path) = parts.next().filter(|p| !p.is_empty()) else {
            tracing::error!("FST_LOAD requires a path");
            return;
        };
        let initial = parts.next();

        match Self::load(loader, host, path, initial, &self.opts, self.history.clone()) {
            Ok(replacement) => {
                tracing::info!(path, "reloaded transducer set");
                *self = replacement;
            }
            Err(err) => {
                tracing::error!(path, %err, "reload failed; keeping the current transducer set")
            }
        }
    }

    /// Union the recognition-stop argument literals over every member's
    /// current state and notify the host when the set changed
    fn recompute_predicted(&mut self, host: &dyn Host) {
        let mut seen = HashSet::new();
        let mut words = Vec::new();
        for t in std::iter::once(&self.main).chain(self.subs.iter()) {
            for arc in t.current_arcs() {
                if let Guard::Exact {
                    event_type,
                    args: Some(spec),
                } = &arc.guard
                    && *event_type == self.opts.predict_event_type
                {
                    for alt in spec.alternatives() {
                        if seen.insert(alt.to_string()) {
                            words.push(alt.to_string());
                        }
                    }
                }
            }
        }

        let joined = words.join(",");
        if joined != self.predicted {
            host.send_command(CMD_RECOG_MODIFY, &format!("{}|{}", PREDICTWORD, joined));
            self.predicted = joined;
        }
    }
}

fn dispatch(host: &dyn Host, output: &Output) {
    if !output.is_silent() {
        host.send_command(&output.cmd_type, &output.args);
    }
}
