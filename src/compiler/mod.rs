//! FST compiler - turns the line-oriented text format into a transducer graph
//!
//! Compilation is tolerant: a malformed arc line is recorded and skipped so
//! the rest of the file still compiles (iterative authoring relies on
//! this). Only an unreadable root file or a malformed top-of-file variable
//! declaration fails the whole compile.

use crate::fst::{Arc, ArcHandle, Assignment, Graph, OutputTemplate, Provenance, StateIdx};
use crate::host::FileLoader;
use crate::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::path::Path;

pub mod parser;

use parser::Line;

/// One per-line compile diagnostic
#[derive(Debug, Clone, Serialize)]
pub struct CompileError {
    pub file: String,
    pub line: u32,
    pub kind: CompileErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompileErrorKind {
    MalformedLine,
    MissingColon,
    ArityMismatch,
    DanglingContinuation,
    UnterminatedBlock,
    UnresolvedInclude,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.message)
    }
}

/// Compiler output: best-effort graph, top-of-file variable assignments,
/// and the per-line diagnostics collected along the way
#[derive(Debug)]
pub struct Compiled {
    pub graph: Graph,
    pub vars: Vec<Assignment>,
    pub errors: Vec<CompileError>,
}

/// FST compiler; file access (including `%INCLUDE` resolution) goes
/// through the [`FileLoader`] seam
pub struct Compiler<'a> {
    loader: &'a dyn FileLoader,
}

impl<'a> Compiler<'a> {
    pub fn new(loader: &'a dyn FileLoader) -> Self {
        Self { loader }
    }

    /// Compile a file and, recursively, everything it includes
    pub fn compile_file(&self, path: &str) -> Result<Compiled> {
        let text = self.loader.read_text(path)?;
        let mut session = Session::new(self.loader);
        session.compile_into(&text, path)?;
        Ok(session.finish(path))
    }

    /// Compile in-memory source; `origin` names it in diagnostics and
    /// anchors relative `%INCLUDE` paths
    pub fn compile_str(&self, text: &str, origin: &str) -> Result<Compiled> {
        let mut session = Session::new(self.loader);
        session.compile_into(text, origin)?;
        Ok(session.finish(origin))
    }
}

/// Open-block context while compiling one block's alternative lines
struct BlockCtx {
    start: StateIdx,
    end: StateIdx,
    start_label: String,
    end_label: String,
    /// Arcs of this block currently pointing at the end label; these are
    /// retargeted to the next anchor when another plain line arrives
    tail: Vec<ArcHandle>,
    /// Source state of the most recently inserted arc (`+` lines fan out
    /// from here)
    last_source: Option<StateIdx>,
    last_output: Option<OutputTemplate>,
    header_line: u32,
    arcs_added: usize,
}

struct Session<'a> {
    loader: &'a dyn FileLoader,
    graph: Graph,
    vars: Vec<Assignment>,
    errors: Vec<CompileError>,
    /// Monotonic anchor counter, shared across included files
    anchor_seq: usize,
    include_stack: Vec<String>,
}

impl<'a> Session<'a> {
    fn new(loader: &'a dyn FileLoader) -> Self {
        Self {
            loader,
            graph: Graph::new(),
            vars: Vec::new(),
            errors: Vec::new(),
            anchor_seq: 0,
            include_stack: Vec::new(),
        }
    }

    fn compile_into(&mut self, text: &str, file: &str) -> Result<()> {
        self.include_stack.push(file.to_string());
        let mut block: Option<BlockCtx> = None;
        let mut seen_state_line = false;

        for (idx, raw) in text.lines().enumerate() {
            let line = idx as u32 + 1;
            match parser::classify(raw) {
                Line::Blank => self.close_block(&mut block, file),
                Line::Comment => {}

                Line::VarDecl(decl) => {
                    self.close_block(&mut block, file);
                    if seen_state_line {
                        self.push_error(
                            file,
                            line,
                            CompileErrorKind::MalformedLine,
                            "variable declarations must appear before the first state line",
                        );
                    } else {
                        match parser::parse_assignments(decl) {
                            Ok(mut assignments) => self.vars.append(&mut assignments),
                            Err(msg) => {
                                return Err(Error::compile(format!(
                                    "{}:{}: bad variable declaration: {}",
                                    file, line, msg
                                )));
                            }
                        }
                    }
                }

                Line::Include(path) => {
                    self.close_block(&mut block, file);
                    self.handle_include(path, file, line)?;
                }

                Line::BlockHeader { start, end } => {
                    self.close_block(&mut block, file);
                    seen_state_line = true;
                    let start_idx = self.graph.ensure_state(start);
                    let end_idx = self.graph.ensure_state(end);
                    block = Some(BlockCtx {
                        start: start_idx,
                        end: end_idx,
                        start_label: start.to_string(),
                        end_label: end.to_string(),
                        tail: Vec::new(),
                        last_source: None,
                        last_output: None,
                        header_line: line,
                        arcs_added: 0,
                    });
                }

                Line::Standalone { from, to, fields } => {
                    self.close_block(&mut block, file);
                    seen_state_line = true;
                    match parser::parse_arc_fields(&fields, false) {
                        Ok(parsed) => {
                            let from_idx = self.graph.ensure_state(from);
                            let to_idx = self.graph.ensure_state(to);
                            self.add_arc(from_idx, parsed, to_idx, file, line);
                        }
                        Err(msg) => {
                            self.push_error(file, line, CompileErrorKind::ArityMismatch, &msg)
                        }
                    }
                }

                Line::Alternative {
                    continuation,
                    fields,
                } => {
                    seen_state_line = true;
                    if block.is_some() {
                        self.block_line(block.as_mut().expect("checked"), continuation, &fields, file, line);
                    } else {
                        self.push_error(
                            file,
                            line,
                            CompileErrorKind::MalformedLine,
                            "transition line outside a block",
                        );
                    }
                }

                Line::Invalid { missing_colon, msg } => {
                    self.close_block(&mut block, file);
                    let kind = if missing_colon {
                        CompileErrorKind::MissingColon
                    } else {
                        CompileErrorKind::MalformedLine
                    };
                    self.push_error(file, line, kind, msg);
                }
            }
        }

        self.close_block(&mut block, file);
        self.include_stack.pop();
        Ok(())
    }

    /// Add one alternative line to the open block.
    ///
    /// The first plain line arcs the block start directly to its end. Each
    /// subsequent plain line allocates a fresh anchor, retargets the arcs
    /// currently arriving at the end label onto it, and arcs the anchor to
    /// the end: the block becomes a chain of steps threaded through
    /// anchors. A `+` line adds a parallel arc for the current step, from
    /// the previous arc's source straight to the block end.
    fn block_line(
        &mut self,
        ctx: &mut BlockCtx,
        continuation: bool,
        fields: &[&str],
        file: &str,
        line: u32,
    ) {
        let mut parsed = match parser::parse_arc_fields(fields, continuation) {
            Ok(parsed) => parsed,
            Err(msg) => {
                self.push_error(file, line, CompileErrorKind::ArityMismatch, &msg);
                return;
            }
        };

        if continuation {
            let Some(source) = ctx.last_source else {
                self.push_error(
                    file,
                    line,
                    CompileErrorKind::DanglingContinuation,
                    "'+' with no preceding transition in this block",
                );
                return;
            };
            if parsed.output.is_none() {
                parsed.output = ctx.last_output.clone();
            }
            let Some(output) = parsed.output.clone() else {
                self.push_error(
                    file,
                    line,
                    CompileErrorKind::DanglingContinuation,
                    "'+' omits its output but there is none to inherit",
                );
                return;
            };
            let handle = self.add_arc(source, parsed, ctx.end, file, line);
            ctx.tail.push(handle);
            ctx.last_output = Some(output);
            ctx.arcs_added += 1;
        } else {
            let output = parsed
                .output
                .clone()
                .expect("output required without inheritance");
            let source = if ctx.arcs_added == 0 {
                ctx.start
            } else {
                self.anchor_seq += 1;
                let anchor =
                    self.graph
                        .add_anchor(self.anchor_seq, &ctx.start_label, &ctx.end_label);
                for &handle in &ctx.tail {
                    self.graph.retarget(handle, anchor);
                }
                ctx.tail.clear();
                anchor
            };
            let handle = self.add_arc(source, parsed, ctx.end, file, line);
            ctx.tail = vec![handle];
            ctx.last_source = Some(source);
            ctx.last_output = Some(output);
            ctx.arcs_added += 1;
        }
    }

    fn handle_include(&mut self, path: &str, file: &str, line: u32) -> Result<()> {
        if path.is_empty() {
            self.push_error(
                file,
                line,
                CompileErrorKind::UnresolvedInclude,
                "%INCLUDE requires a path",
            );
            return Ok(());
        }
        let resolved = resolve_include(file, path);
        if self.include_stack.contains(&resolved) {
            self.push_error(
                file,
                line,
                CompileErrorKind::UnresolvedInclude,
                &format!("include cycle through {}", resolved),
            );
            return Ok(());
        }
        match self.loader.read_text(&resolved) {
            Ok(text) => {
                tracing::debug!(from = file, include = %resolved, "compiling include");
                self.compile_into(&text, &resolved)?;
            }
            Err(err) => self.push_error(
                file,
                line,
                CompileErrorKind::UnresolvedInclude,
                &err.to_string(),
            ),
        }
        Ok(())
    }

    fn close_block(&mut self, block: &mut Option<BlockCtx>, file: &str) {
        if let Some(ctx) = block.take()
            && ctx.arcs_added == 0
        {
            self.push_error(
                file,
                ctx.header_line,
                CompileErrorKind::UnterminatedBlock,
                &format!(
                    "block {} {}: has no transition lines",
                    ctx.start_label, ctx.end_label
                ),
            );
        }
    }

    fn add_arc(&mut self, from: StateIdx, fields: parser::ArcFields, to: StateIdx, file: &str, line: u32) -> ArcHandle {
        let output = fields
            .output
            .expect("caller resolved the output before adding the arc");
        self.graph.add_arc(
            from,
            Arc {
                guard: fields.guard,
                output,
                actions: fields.actions,
                to,
                provenance: Provenance {
                    file: file.to_string(),
                    line,
                    label: None,
                },
            },
        )
    }

    fn push_error(&mut self, file: &str, line: u32, kind: CompileErrorKind, message: &str) {
        tracing::warn!(file, line, ?kind, message, "compile error");
        self.errors.push(CompileError {
            file: file.to_string(),
            line,
            kind,
            message: message.to_string(),
        });
    }

    fn finish(self, origin: &str) -> Compiled {
        if self.errors.is_empty() {
            tracing::info!(
                file = origin,
                states = self.graph.state_count(),
                arcs = self.graph.arc_count(),
                "compiled"
            );
        } else {
            tracing::warn!(
                file = origin,
                errors = self.errors.len(),
                "compiled with errors; broken arcs were skipped"
            );
        }
        Compiled {
            graph: self.graph,
            vars: self.vars,
            errors: self.errors,
        }
    }
}

/// Resolve an include path relative to the including file
fn resolve_include(current_file: &str, include: &str) -> String {
    let path = Path::new(include);
    if path.is_absolute() {
        return include.to_string();
    }
    match Path::new(current_file).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            dir.join(include).to_string_lossy().into_owned()
        }
        _ => include.to_string(),
    }
}
