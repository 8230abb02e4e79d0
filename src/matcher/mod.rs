//! Pattern matcher - guard evaluation against incoming events

use crate::event::Event;
use crate::fst::{Arc, Guard};
use crate::host::Host;
use regex::Regex;

pub mod substitute;

// Re-export key types
pub use substitute::{VarStore, substitute};

/// Evaluate an arc's guard against an event.
///
/// A successful regex match binds its capture groups into the store as
/// `$1..$N`; no other guard kind mutates anything. A malformed variable
/// test and an unparsable regex degrade (no-match and literal compare
/// respectively) rather than erroring.
pub fn match_arc(arc: &Arc, event: &Event, store: &mut VarStore, host: &dyn Host) -> bool {
    match &arc.guard {
        Guard::Exact { event_type, args } => {
            if *event_type != event.event_type {
                return false;
            }
            match (args, &event.args) {
                (None, None) => true,
                (Some(spec), Some(event_args)) => spec.matches(event_args),
                _ => false,
            }
        }

        Guard::Regex { pattern } => {
            let source = substitute(pattern, store, host);
            let haystack = event.wire();
            match Regex::new(&source) {
                Ok(re) => match re.captures(&haystack) {
                    Some(caps) if is_full_match(&caps, &haystack) => {
                        store.bind_captures(&caps);
                        true
                    }
                    _ => false,
                },
                Err(err) => {
                    tracing::debug!(pattern = %source, %err, "regex failed to compile, falling back to literal compare");
                    source == haystack
                }
            }
        }

        Guard::VarTest { test } => {
            let Some((lhs, rhs, negate)) = split_test(test) else {
                // neither operator present: never matches, not an error
                return false;
            };
            let lhs = substitute(lhs, store, host);
            let rhs = substitute(rhs, store, host);
            if negate { lhs != rhs } else { lhs == rhs }
        }
    }
}

fn is_full_match(caps: &regex::Captures, haystack: &str) -> bool {
    caps.get(0)
        .is_some_and(|m| m.start() == 0 && m.end() == haystack.len())
}

/// Split a variable test on its first `==` / `!=` occurrence
fn split_test(test: &str) -> Option<(&str, &str, bool)> {
    let eq = test.find("==");
    let ne = test.find("!=");
    match (eq, ne) {
        (Some(e), Some(n)) if n < e => Some((&test[..n], &test[n + 2..], true)),
        (Some(e), _) => Some((&test[..e], &test[e + 2..], false)),
        (None, Some(n)) => Some((&test[..n], &test[n + 2..], true)),
        (None, None) => None,
    }
}
