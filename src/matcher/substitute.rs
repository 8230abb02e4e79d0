//! Variable store and template substitution

use crate::host::Host;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-Transducer variable store: case-sensitive name to string value,
/// overwrite-only (no deletion). Regex capture groups live here under the
/// numbered names `"1".."N"` and are overwritten on every successful
/// regex match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VarStore {
    vars: HashMap<String, String>,
}

impl VarStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Bind `$1..$N` from a successful regex match
    pub fn bind_captures(&mut self, caps: &regex::Captures) {
        for i in 1..caps.len() {
            let value = caps.get(i).map(|m| m.as_str()).unwrap_or("");
            self.set(i.to_string(), value);
        }
    }
}

/// Substitute variable references in a template.
///
/// Single pass, non-recursive: a substituted value is not itself rescanned.
/// `$$` yields a literal `$`; `$name` and `${name}` resolve through, in
/// order of syntax: an `ENV_`-prefixed name (with or without the `%`
/// shadow marker) reads host environment variable `X`, `%key` reads the
/// shared global store, anything else the Transducer's own store.
/// Undefined names yield the empty string. A `$` not followed by a name
/// stays literal.
pub fn substitute(template: &str, store: &VarStore, host: &dyn Host) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
        } else if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => {
                    out.push_str(&resolve(&braced[..end], store, host));
                    rest = &braced[end + 1..];
                }
                None => {
                    // unterminated brace form stays literal
                    out.push('$');
                    rest = after;
                }
            }
        } else {
            let len = name_len(after);
            if len == 0 {
                out.push('$');
                rest = after;
            } else {
                out.push_str(&resolve(&after[..len], store, host));
                rest = &after[len..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Length of a bare `$name` reference: optional leading `%` shadow marker,
/// then identifier characters
fn name_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut len = usize::from(bytes.first() == Some(&b'%'));
    while len < bytes.len() && (bytes[len].is_ascii_alphanumeric() || bytes[len] == b'_') {
        len += 1;
    }
    // a lone '%' is not a reference
    if len == 1 && bytes[0] == b'%' { 0 } else { len }
}

fn resolve(name: &str, store: &VarStore, host: &dyn Host) -> String {
    if let Some(shadow) = name.strip_prefix('%') {
        if let Some(env) = shadow.strip_prefix("ENV_") {
            host.env_get(env).unwrap_or_default()
        } else {
            host.kv_get(shadow).unwrap_or_default()
        }
    } else if let Some(env) = name.strip_prefix("ENV_") {
        host.env_get(env).unwrap_or_default()
    } else {
        store.get(name).map(str::to_string).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;

    #[test]
    fn test_literal_template_unchanged() {
        let store = VarStore::new();
        let host = MemoryHost::new();
        assert_eq!(substitute("no variables here", &store, &host), "no variables here");
        assert_eq!(substitute("", &store, &host), "");
    }

    #[test]
    fn test_plain_and_braced_names() {
        let mut store = VarStore::new();
        store.set("name", "mei");
        let host = MemoryHost::new();

        assert_eq!(substitute("hello $name!", &store, &host), "hello mei!");
        assert_eq!(substitute("${name}s", &store, &host), "meis");
        // the bare form consumes every identifier character
        assert_eq!(substitute("$names", &store, &host), "");
    }

    #[test]
    fn test_dollar_escape() {
        let store = VarStore::new();
        let host = MemoryHost::new();
        assert_eq!(substitute("cost: $$5", &store, &host), "cost: $5");
        assert_eq!(substitute("trailing $", &store, &host), "trailing $");
    }

    #[test]
    fn test_undefined_is_empty() {
        let store = VarStore::new();
        let host = MemoryHost::new();
        assert_eq!(substitute("[$missing]", &store, &host), "[]");
    }

    #[test]
    fn test_shadow_stores() {
        let store = VarStore::new();
        let host = MemoryHost::new().with_env("USER", "taro");
        host.kv_set("volume", "80");

        assert_eq!(substitute("$%ENV_USER", &store, &host), "taro");
        // the ENV_ prefix routes to the environment even without '%'
        assert_eq!(substitute("${ENV_USER}", &store, &host), "taro");
        assert_eq!(substitute("${%volume}", &store, &host), "80");
        assert_eq!(substitute("$%ENV_MISSING", &store, &host), "");
    }

    #[test]
    fn test_not_recursive() {
        let mut store = VarStore::new();
        store.set("a", "$b");
        store.set("b", "deep");
        let host = MemoryHost::new();
        // the substituted value is not rescanned
        assert_eq!(substitute("$a", &store, &host), "$b");
    }

    #[test]
    fn test_bind_captures() {
        let mut store = VarStore::new();
        let re = regex::Regex::new(r"(\w+)\|(\w+)").unwrap();
        store.bind_captures(&re.captures("RECOG|hello").unwrap());
        assert_eq!(store.get("1"), Some("RECOG"));
        assert_eq!(store.get("2"), Some("hello"));

        // overwritten by the next match
        store.bind_captures(&re.captures("TIMER|tick").unwrap());
        assert_eq!(store.get("2"), Some("tick"));
    }
}
