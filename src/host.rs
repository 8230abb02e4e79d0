//! Host collaborator interfaces
//!
//! The engine core never talks to the surrounding application directly; it
//! consumes two narrow seams. `Host` carries outbound command dispatch plus
//! the global key/value and environment namespaces backing `%`-prefixed
//! variable substitution. `FileLoader` carries all file access (FST text,
//! existence checks, sibling discovery for sub-FST autoload), which also
//! keeps decrypt-on-read concerns outside the core.

use crate::{Error, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// Outbound command bus and shared value namespaces supplied by the host
/// application.
///
/// Implementations must be thread-safe: commands are dispatched from the
/// driver worker while producers run on other threads.
pub trait Host: Send + Sync {
    /// Dispatch an output command to the rest of the application
    fn send_command(&self, cmd_type: &str, args: &str);

    /// Read a value from the global key/value store (`%name` substitution)
    fn kv_get(&self, name: &str) -> Option<String>;

    /// Write a value to the global key/value store
    fn kv_set(&self, name: &str, value: &str);

    /// Read a host environment variable (`%ENV_name` substitution)
    fn env_get(&self, name: &str) -> Option<String>;

    /// Called by the driver between dequeue and processing; a host with a
    /// global pause flag blocks here until resumed.
    fn wait_if_paused(&self) {}
}

/// File access seam used by the compiler and the driver
pub trait FileLoader: Send + Sync {
    /// Read an FST text file by path
    fn read_text(&self, path: &str) -> Result<String>;

    /// Whether the path currently exists (backs `SUBFST_START_IF`)
    fn exists(&self, path: &str) -> bool;

    /// List sibling files named `<path>.<suffix>`, sorted. Used to
    /// auto-discover sub-FSTs next to a main file on (re)load.
    fn list_siblings(&self, path: &str) -> Vec<String>;
}

/// Process-backed host: commands go to stdout (and the log), the key/value
/// store is in-process, environment lookups hit the real environment.
#[derive(Default)]
pub struct StdHost {
    kv: Mutex<HashMap<String, String>>,
}

impl StdHost {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Host for StdHost {
    fn send_command(&self, cmd_type: &str, args: &str) {
        if args.is_empty() {
            println!("{}", cmd_type);
        } else {
            println!("{}|{}", cmd_type, args);
        }
        tracing::debug!(cmd_type, args, "dispatched command");
    }

    fn kv_get(&self, name: &str) -> Option<String> {
        self.kv.lock().expect("kv store poisoned").get(name).cloned()
    }

    fn kv_set(&self, name: &str, value: &str) {
        self.kv
            .lock()
            .expect("kv store poisoned")
            .insert(name.to_string(), value.to_string());
    }

    fn env_get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Filesystem-backed loader
pub struct StdFileLoader;

impl FileLoader for StdFileLoader {
    fn read_text(&self, path: &str) -> Result<String> {
        std::fs::read_to_string(path)
            .map_err(|e| Error::load(format!("failed to read {}: {}", path, e)))
    }

    fn exists(&self, path: &str) -> bool {
        Path::new(path).exists()
    }

    fn list_siblings(&self, path: &str) -> Vec<String> {
        let p = Path::new(path);
        let (Some(dir), Some(name)) = (p.parent(), p.file_name()) else {
            return Vec::new();
        };
        let prefix = format!("{}.", name.to_string_lossy());
        let Ok(entries) = std::fs::read_dir(if dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            dir
        }) else {
            return Vec::new();
        };

        let mut siblings: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(&prefix))
            .map(|e| e.path().to_string_lossy().into_owned())
            .collect();
        siblings.sort();
        siblings
    }
}

/// Recording in-memory host for tests and offline runs: captures dispatched
/// commands, serves key/value and environment lookups from plain maps.
#[derive(Default)]
pub struct MemoryHost {
    sent: Mutex<Vec<(String, String)>>,
    kv: Mutex<HashMap<String, String>>,
    env: HashMap<String, String>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    /// Commands dispatched so far, in order
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("sent log poisoned").clone()
    }
}

impl Host for MemoryHost {
    fn send_command(&self, cmd_type: &str, args: &str) {
        self.sent
            .lock()
            .expect("sent log poisoned")
            .push((cmd_type.to_string(), args.to_string()));
    }

    fn kv_get(&self, name: &str) -> Option<String> {
        self.kv.lock().expect("kv store poisoned").get(name).cloned()
    }

    fn kv_set(&self, name: &str, value: &str) {
        self.kv
            .lock()
            .expect("kv store poisoned")
            .insert(name.to_string(), value.to_string());
    }

    fn env_get(&self, name: &str) -> Option<String> {
        self.env.get(name).cloned()
    }
}

/// In-memory loader for tests: a map from path to file text
#[derive(Default)]
pub struct MemoryLoader {
    files: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.files.insert(path.into(), text.into());
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }
}

impl FileLoader for MemoryLoader {
    fn read_text(&self, path: &str) -> Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| Error::load(format!("no such file: {}", path)))
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    fn list_siblings(&self, path: &str) -> Vec<String> {
        let prefix = format!("{}.", path);
        let mut siblings: Vec<String> = self
            .files
            .keys()
            .filter(|k| k.starts_with(&prefix))
            .cloned()
            .collect();
        siblings.sort();
        siblings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_host_records_commands() {
        let host = MemoryHost::new();
        host.send_command("SYNTH_START", "mei|hello");
        host.send_command("STAGE", "");

        let sent = host.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], ("SYNTH_START".to_string(), "mei|hello".to_string()));
    }

    #[test]
    fn test_memory_host_kv_roundtrip() {
        let host = MemoryHost::new();
        assert!(host.kv_get("mode").is_none());
        host.kv_set("mode", "idle");
        assert_eq!(host.kv_get("mode").as_deref(), Some("idle"));
    }

    #[test]
    fn test_memory_host_env() {
        let host = MemoryHost::new().with_env("LANG", "ja_JP");
        assert_eq!(host.env_get("LANG").as_deref(), Some("ja_JP"));
        assert!(host.env_get("MISSING").is_none());
    }

    #[test]
    fn test_memory_loader_siblings() {
        let loader = MemoryLoader::new()
            .with_file("main.fst", "")
            .with_file("main.fst.menu", "")
            .with_file("main.fst.clock", "")
            .with_file("other.fst", "");

        let siblings = loader.list_siblings("main.fst");
        assert_eq!(siblings, vec!["main.fst.clock", "main.fst.menu"]);
        assert!(loader.exists("other.fst"));
        assert!(!loader.exists("nope.fst"));
    }
}
