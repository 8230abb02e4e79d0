//! Arc representation: guard, output template, variable actions

use crate::event::EPSILON;
use crate::fst::StateIdx;
use serde::{Deserialize, Serialize};

/// A guarded transition between two states.
///
/// Evaluation order within a state is declaration order; the first arc
/// whose guard matches wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arc {
    pub guard: Guard,
    pub output: OutputTemplate,
    /// Variable assignments run left-to-right after a match
    pub actions: Vec<Assignment>,
    pub to: StateIdx,
    pub provenance: Provenance,
}

/// Guard kind, decided once at compile time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Guard {
    /// Exact event-type compare plus grouped-argument containment
    Exact {
        event_type: String,
        args: Option<ArgSpec>,
    },
    /// Regex over the event's `type|args` wire string; capture groups are
    /// bound to `$1..$N` on match. The pattern may contain variable
    /// references, so it is substituted and compiled per check.
    Regex { pattern: String },
    /// Binary variable test of the form `$x==y` / `$x!=y`, evaluated
    /// lazily against the variable store
    VarTest { test: String },
}

impl Guard {
    pub fn is_epsilon(&self) -> bool {
        matches!(self, Guard::Exact { event_type, .. } if event_type == EPSILON)
    }

    /// Source-form rendering for logs and DOT labels
    pub fn display(&self) -> String {
        match self {
            Guard::Exact { event_type, args } => match args {
                Some(spec) => format!("{} {}", event_type, spec.display()),
                None => event_type.clone(),
            },
            Guard::Regex { pattern } => format!("[{}]", pattern),
            Guard::VarTest { test } => test.clone(),
        }
    }
}

/// Grouped argument specification: groups split on `|`, alternatives on `,`.
///
/// A guard spec matches an event spec iff the group counts are equal and
/// every guard alternative occurs somewhere in the corresponding event
/// group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgSpec {
    pub groups: Vec<Vec<String>>,
}

impl ArgSpec {
    pub fn parse(text: &str) -> Self {
        let groups = text
            .split('|')
            .map(|g| g.split(',').map(str::to_string).collect())
            .collect();
        Self { groups }
    }

    /// Containment compare against an event's raw argument string
    pub fn matches(&self, event_args: &str) -> bool {
        let event = Self::parse(event_args);
        if self.groups.len() != event.groups.len() {
            return false;
        }
        self.groups
            .iter()
            .zip(&event.groups)
            .all(|(want, have)| want.iter().all(|alt| have.contains(alt)))
    }

    /// All alternatives across all groups, in declaration order
    pub fn alternatives(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().flatten().map(String::as_str)
    }

    pub fn display(&self) -> String {
        self.groups
            .iter()
            .map(|g| g.join(","))
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// Output command template; both fields may contain variable references
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputTemplate {
    pub cmd_type: String,
    pub args: String,
}

impl OutputTemplate {
    pub fn parse(token: &str) -> Self {
        match token.split_once('|') {
            Some((t, a)) => Self {
                cmd_type: t.to_string(),
                args: a.to_string(),
            },
            None => Self {
                cmd_type: token.to_string(),
                args: String::new(),
            },
        }
    }

    /// An output that only advances the graph, dispatching nothing
    pub fn silent() -> Self {
        Self {
            cmd_type: EPSILON.to_string(),
            args: String::new(),
        }
    }
}

/// One `name=value` variable action; a `%`-prefixed name writes to the
/// shared global store instead of the Transducer's own
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub name: String,
    pub value: String,
}

/// Source location of an arc, used only for logging and history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Provenance {
    pub file: String,
    pub line: u32,
    pub label: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argspec_parse() {
        let spec = ArgSpec::parse("a,b|c");
        assert_eq!(spec.groups, vec![vec!["a", "b"], vec!["c"]]);
        assert_eq!(spec.display(), "a,b|c");
    }

    #[test]
    fn test_argspec_containment() {
        let spec = ArgSpec::parse("x,y");
        assert!(spec.matches("x,y,z"));
        assert!(spec.matches("y,x"));
        assert!(!spec.matches("w"));
        // group count must be equal
        assert!(!spec.matches("x,y|extra"));
    }

    #[test]
    fn test_argspec_alternatives_order() {
        let spec = ArgSpec::parse("hello,hi|bye");
        let alts: Vec<&str> = spec.alternatives().collect();
        assert_eq!(alts, vec!["hello", "hi", "bye"]);
    }

    #[test]
    fn test_output_template_parse() {
        let out = OutputTemplate::parse("SYNTH_START|mei|hello");
        assert_eq!(out.cmd_type, "SYNTH_START");
        assert_eq!(out.args, "mei|hello");

        let bare = OutputTemplate::parse("STAGE_RESET");
        assert_eq!(bare.cmd_type, "STAGE_RESET");
        assert!(bare.args.is_empty());
    }

    #[test]
    fn test_guard_epsilon() {
        let eps = Guard::Exact {
            event_type: "<eps>".to_string(),
            args: None,
        };
        assert!(eps.is_epsilon());

        let real = Guard::Exact {
            event_type: "RECOG_EVENT_STOP".to_string(),
            args: Some(ArgSpec::parse("hello")),
        };
        assert!(!real.is_epsilon());
        assert_eq!(real.display(), "RECOG_EVENT_STOP hello");
    }
}
