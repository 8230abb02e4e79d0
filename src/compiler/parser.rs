//! Line-level parsing of the FST text format

use crate::fst::{ArgSpec, Assignment, Guard, OutputTemplate};

/// One classified source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    Blank,
    Comment,
    /// Top-of-file variable declaration body (text after the leading `$`)
    VarDecl(&'a str),
    /// `%INCLUDE path`
    Include(&'a str),
    /// `S1 S2:` opens a block
    BlockHeader { start: &'a str, end: &'a str },
    /// Column-0 standalone arc
    Standalone {
        from: &'a str,
        to: &'a str,
        fields: Vec<&'a str>,
    },
    /// Indented line inside a block; `continuation` for `+` lines
    Alternative {
        continuation: bool,
        fields: Vec<&'a str>,
    },
    /// Unparseable line shape
    Invalid { missing_colon: bool, msg: &'static str },
}

/// Classify a raw source line. Field-level validation happens later in
/// [`parse_arc_fields`]; this only decides the line class.
pub fn classify(raw: &str) -> Line<'_> {
    let text = raw.trim_end();
    if text.trim().is_empty() {
        return Line::Blank;
    }

    let indented = raw.starts_with(' ') || raw.starts_with('\t');
    let text = text.trim_start();
    if text.starts_with('#') {
        return Line::Comment;
    }

    if indented {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens[0] == "+" {
            return Line::Alternative {
                continuation: true,
                fields: tokens[1..].to_vec(),
            };
        }
        if let Some(first) = tokens[0].strip_prefix('+') {
            let mut fields = vec![first];
            fields.extend_from_slice(&tokens[1..]);
            return Line::Alternative {
                continuation: true,
                fields,
            };
        }
        return Line::Alternative {
            continuation: false,
            fields: tokens,
        };
    }

    if let Some(rest) = text.strip_prefix('$') {
        return Line::VarDecl(rest);
    }
    if let Some(rest) = text.strip_prefix("%INCLUDE")
        && (rest.is_empty() || rest.starts_with(char::is_whitespace))
    {
        return Line::Include(rest.trim());
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    match tokens.len() {
        1 => Line::Invalid {
            missing_colon: false,
            msg: "expected a block header or an arc",
        },
        2 => match tokens[1].strip_suffix(':') {
            Some("") => Line::Invalid {
                missing_colon: false,
                msg: "missing end label before ':'",
            },
            Some(end) => Line::BlockHeader {
                start: tokens[0],
                end,
            },
            None => Line::Invalid {
                missing_colon: true,
                msg: "missing ':' after block header labels",
            },
        },
        _ if tokens[1].ends_with(':') => Line::Invalid {
            missing_colon: false,
            msg: "unexpected fields after block header",
        },
        _ => Line::Standalone {
            from: tokens[0],
            to: tokens[1],
            fields: tokens[2..].to_vec(),
        },
    }
}

/// Parsed arc fields: guard, optional output, variable actions
#[derive(Debug, Clone)]
pub struct ArcFields {
    pub guard: Guard,
    pub output: Option<OutputTemplate>,
    pub actions: Vec<Assignment>,
}

/// Parse the `GUARD OUTPUT [VARACTION]` fields of an arc line.
///
/// Regex (`[...]`) and variable-test (`$...`) guards are single tokens; an
/// exact guard takes a grouped-argument token only when another token
/// remains for the output. The output is a single `TYPE|args` wire-shape
/// token. `allow_missing_output` is set for `+` continuation lines, which
/// inherit the previous line's output when their own is omitted.
pub fn parse_arc_fields(
    fields: &[&str],
    allow_missing_output: bool,
) -> Result<ArcFields, String> {
    if fields.is_empty() {
        return Err("missing guard".to_string());
    }

    let mut fields = fields.to_vec();
    let mut actions = Vec::new();
    if fields.len() >= 2 && is_action_token(fields[fields.len() - 1]) {
        let token = fields.pop().expect("checked non-empty");
        actions = parse_assignments(token.strip_prefix('$').unwrap_or(token))?;
    }

    let first = fields[0];
    let (guard, consumed) = if is_regex_token(first) {
        (
            Guard::Regex {
                pattern: first[1..first.len() - 1].to_string(),
            },
            1,
        )
    } else if first.starts_with('$') {
        (
            Guard::VarTest {
                test: first.to_string(),
            },
            1,
        )
    } else {
        match fields.len() {
            1 | 2 => (
                Guard::Exact {
                    event_type: first.to_string(),
                    args: None,
                },
                1,
            ),
            3 => (
                Guard::Exact {
                    event_type: first.to_string(),
                    args: Some(ArgSpec::parse(fields[1])),
                },
                2,
            ),
            n => return Err(format!("too many fields ({})", n)),
        }
    };

    let rest = &fields[consumed..];
    let output = match rest.len() {
        0 if allow_missing_output => None,
        0 => return Err("missing output command".to_string()),
        1 => Some(OutputTemplate::parse(rest[0])),
        n => return Err(format!("{} extra fields after output", n - 1)),
    };

    Ok(ArcFields {
        guard,
        output,
        actions,
    })
}

/// Parse a `name=value[,name=value]*` assignment list (top-of-file
/// declarations and arc variable actions share this form)
pub fn parse_assignments(body: &str) -> Result<Vec<Assignment>, String> {
    let mut assignments = Vec::new();
    for item in body.split(',') {
        let item = item.strip_prefix('$').unwrap_or(item);
        let Some((name, value)) = item.split_once('=') else {
            return Err(format!("malformed assignment {:?}", item));
        };
        if name.is_empty() {
            return Err(format!("assignment {:?} has no variable name", item));
        }
        assignments.push(Assignment {
            name: name.to_string(),
            value: value.to_string(),
        });
    }
    Ok(assignments)
}

fn is_regex_token(token: &str) -> bool {
    token.len() >= 2 && token.starts_with('[') && token.ends_with(']')
}

/// A trailing token is a variable action iff it carries a plain `=`
/// assignment; `==` / `!=` belong to variable-test guards
fn is_action_token(token: &str) -> bool {
    token.starts_with('$')
        && token.contains('=')
        && !token.contains("==")
        && !token.contains("!=")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_basics() {
        assert_eq!(classify(""), Line::Blank);
        assert_eq!(classify("   "), Line::Blank);
        assert_eq!(classify("# a comment"), Line::Comment);
        assert_eq!(classify("  # indented comment"), Line::Comment);
        assert_eq!(classify("$count=0"), Line::VarDecl("count=0"));
        assert_eq!(classify("%INCLUDE sub.fst"), Line::Include("sub.fst"));
    }

    #[test]
    fn test_classify_block_header() {
        assert_eq!(
            classify("0 100:"),
            Line::BlockHeader {
                start: "0",
                end: "100"
            }
        );
        assert!(matches!(
            classify("0 100"),
            Line::Invalid {
                missing_colon: true,
                ..
            }
        ));
        assert!(matches!(
            classify("0 100: junk"),
            Line::Invalid {
                missing_colon: false,
                ..
            }
        ));
    }

    #[test]
    fn test_classify_standalone_and_alternative() {
        assert_eq!(
            classify("0 1 A a1 OUT_A"),
            Line::Standalone {
                from: "0",
                to: "1",
                fields: vec!["A", "a1", "OUT_A"]
            }
        );
        assert_eq!(
            classify("  A a1 OUT_A"),
            Line::Alternative {
                continuation: false,
                fields: vec!["A", "a1", "OUT_A"]
            }
        );
        assert_eq!(
            classify("  + B OUT_B"),
            Line::Alternative {
                continuation: true,
                fields: vec!["B", "OUT_B"]
            }
        );
        assert_eq!(
            classify("\t+B OUT_B"),
            Line::Alternative {
                continuation: true,
                fields: vec!["B", "OUT_B"]
            }
        );
    }

    #[test]
    fn test_parse_exact_guard_with_args() {
        let f = parse_arc_fields(&["A", "a1", "OUT_A"], false).unwrap();
        match f.guard {
            Guard::Exact { event_type, args } => {
                assert_eq!(event_type, "A");
                assert_eq!(args.unwrap().display(), "a1");
            }
            other => panic!("unexpected guard {:?}", other),
        }
        let out = f.output.unwrap();
        assert_eq!(out.cmd_type, "OUT_A");
        assert!(out.args.is_empty());
    }

    #[test]
    fn test_parse_bare_guard_and_wire_output() {
        let f = parse_arc_fields(&["<eps>", "SYNTH_START|mei|hello"], false).unwrap();
        assert!(f.guard.is_epsilon());
        let out = f.output.unwrap();
        assert_eq!(out.cmd_type, "SYNTH_START");
        assert_eq!(out.args, "mei|hello");
    }

    #[test]
    fn test_parse_regex_and_vartest_guards() {
        let f = parse_arc_fields(&[r"[RECOG\|(\w+)]", "OUT"], false).unwrap();
        assert!(matches!(f.guard, Guard::Regex { ref pattern } if pattern == r"RECOG\|(\w+)"));

        let f = parse_arc_fields(&["$count==1", "OUT"], false).unwrap();
        assert!(matches!(f.guard, Guard::VarTest { ref test } if test == "$count==1"));
    }

    #[test]
    fn test_parse_actions() {
        let f = parse_arc_fields(&["A", "a1", "OUT", "$x=1,y=2"], false).unwrap();
        assert_eq!(f.actions.len(), 2);
        assert_eq!(f.actions[0].name, "x");
        assert_eq!(f.actions[0].value, "1");
        assert_eq!(f.actions[1].name, "y");

        // a var-test guard is not mistaken for an action
        let f = parse_arc_fields(&["$mode==idle", "OUT"], false).unwrap();
        assert!(f.actions.is_empty());
        assert!(matches!(f.guard, Guard::VarTest { .. }));
    }

    #[test]
    fn test_parse_arity_errors() {
        assert!(parse_arc_fields(&[], false).is_err());
        assert!(parse_arc_fields(&["A"], false).is_err());
        assert!(parse_arc_fields(&["A", "a1", "OUT", "junk"], false).is_err());
        assert!(parse_arc_fields(&["$t==1", "OUT", "junk"], false).is_err());

        // continuation lines may omit the output
        let f = parse_arc_fields(&["B"], true).unwrap();
        assert!(f.output.is_none());
    }

    #[test]
    fn test_parse_assignments_list() {
        let a = parse_assignments("count=0,mode=idle").unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a[1].name, "mode");
        assert_eq!(a[1].value, "idle");

        assert!(parse_assignments("novalue").is_err());
        assert!(parse_assignments("=1").is_err());
    }
}
