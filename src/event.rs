//! Event and output wire types
//!
//! Both inbound events and outbound commands share the same shape on the
//! host message bus: a type string plus an optional argument string of
//! `|`-separated groups, each group a `,`-separated list of alternatives.

use serde::{Deserialize, Serialize};

/// Sentinel input type for automatic (epsilon) transitions. An output
/// command of this type is never dispatched to the host bus.
pub const EPSILON: &str = "<eps>";

/// An inbound event consumed by the transition engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: String,
    pub args: Option<String>,
}

impl Event {
    pub fn new(event_type: impl Into<String>, args: Option<String>) -> Self {
        Self {
            event_type: event_type.into(),
            args,
        }
    }

    /// The distinguished empty event driving epsilon closure
    pub fn epsilon() -> Self {
        Self {
            event_type: EPSILON.to_string(),
            args: None,
        }
    }

    pub fn is_epsilon(&self) -> bool {
        self.event_type == EPSILON
    }

    /// Parse the `TYPE|args` wire form. A line without `|` is a bare type.
    pub fn parse(line: &str) -> Self {
        match line.split_once('|') {
            Some((t, a)) => Self::new(t, Some(a.to_string())),
            None => Self::new(line, None),
        }
    }

    /// Render back to the `type|args` wire form (bare `type` without args).
    /// Regex guards are matched against this exact string.
    pub fn wire(&self) -> String {
        match &self.args {
            Some(a) => format!("{}|{}", self.event_type, a),
            None => self.event_type.clone(),
        }
    }
}

/// An outbound command produced by a taken arc
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub cmd_type: String,
    pub args: String,
}

impl Output {
    pub fn new(cmd_type: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            cmd_type: cmd_type.into(),
            args: args.into(),
        }
    }

    /// Silent outputs exist only to advance the graph; they are not
    /// dispatched to the host bus.
    pub fn is_silent(&self) -> bool {
        self.cmd_type.is_empty() || self.cmd_type == EPSILON
    }

    pub fn wire(&self) -> String {
        if self.args.is_empty() {
            self.cmd_type.clone()
        } else {
            format!("{}|{}", self.cmd_type, self.args)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wire_form() {
        let ev = Event::parse("RECOG_EVENT_STOP|hello,hi");
        assert_eq!(ev.event_type, "RECOG_EVENT_STOP");
        assert_eq!(ev.args.as_deref(), Some("hello,hi"));

        let bare = Event::parse("TIMER_EXPIRED");
        assert_eq!(bare.event_type, "TIMER_EXPIRED");
        assert!(bare.args.is_none());
    }

    #[test]
    fn test_wire_roundtrip() {
        let ev = Event::new("A", Some("x|y,z".to_string()));
        assert_eq!(ev.wire(), "A|x|y,z");
        assert_eq!(Event::parse(&ev.wire()).event_type, "A");

        let bare = Event::new("A", None);
        assert_eq!(bare.wire(), "A");
    }

    #[test]
    fn test_epsilon_event() {
        let eps = Event::epsilon();
        assert!(eps.is_epsilon());
        assert_eq!(eps.wire(), "<eps>");
        assert!(!Event::parse("RECOG|x").is_epsilon());
    }

    #[test]
    fn test_silent_output() {
        assert!(Output::new(EPSILON, "").is_silent());
        assert!(Output::new("", "").is_silent());
        assert!(!Output::new("SYNTH_START", "hello").is_silent());
    }
}
