//! Transition history ring buffer
//!
//! A fixed-capacity log of taken arcs, written by the driver worker and
//! read by an external debug renderer on its own thread; the shared handle
//! wraps it in a lock. Entries are snapshots (labels and provenance, not
//! arc references) so readers stay valid across a graph reload.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Default ring capacity
pub const DEFAULT_HISTORY_CAPACITY: usize = 128;

/// Shared handle to the history log
pub type SharedHistory = Arc<Mutex<HistoryLog>>;

/// Create a shared history log with the given capacity
pub fn shared_history(capacity: usize) -> SharedHistory {
    Arc::new(Mutex::new(HistoryLog::new(capacity)))
}

/// One taken arc
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub transducer: String,
    pub from: String,
    pub to: String,
    /// Wire form of the matched event
    pub event: String,
    /// Wire form of the emitted output, if any was dispatched
    pub output: Option<String>,
    pub file: String,
    pub line: u32,
    pub timestamp: DateTime<Utc>,
}

/// Fixed-capacity ring of taken arcs.
///
/// The write pointer wraps; whether the buffer has wrapped is decided by
/// checking the slot at the write pointer, which is only still empty while
/// the first lap is incomplete.
#[derive(Debug)]
pub struct HistoryLog {
    slots: Vec<Option<HistoryEntry>>,
    head: usize,
}

impl HistoryLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity.max(1)],
            head: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        let head = self.head;
        self.slots[head] = Some(entry);
        self.head = (head + 1) % self.slots.len();
    }

    fn wrapped(&self) -> bool {
        self.slots[self.head].is_some()
    }

    /// Number of entries recorded, saturating at capacity
    pub fn len(&self) -> usize {
        if self.wrapped() {
            self.slots.len()
        } else {
            self.head
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries oldest-first
    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        let (older, newer) = if self.wrapped() {
            let (tail, head) = self.slots.split_at(self.head);
            (head, tail)
        } else {
            (&self.slots[..0], &self.slots[..self.head])
        };
        older
            .iter()
            .chain(newer)
            .filter_map(|slot| slot.clone())
            .collect()
    }

    pub fn clear(&mut self) {
        self.slots.fill(None);
        self.head = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: u32) -> HistoryEntry {
        HistoryEntry {
            transducer: "main".to_string(),
            from: n.to_string(),
            to: (n + 1).to_string(),
            event: "EV".to_string(),
            output: None,
            file: "test.fst".to_string(),
            line: n,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_empty_log() {
        let log = HistoryLog::new(4);
        assert_eq!(log.len(), 0);
        assert!(log.is_empty());
        assert!(log.snapshot().is_empty());
    }

    #[test]
    fn test_partial_fill() {
        let mut log = HistoryLog::new(4);
        log.push(entry(1));
        log.push(entry(2));
        assert_eq!(log.len(), 2);

        let snap = log.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].line, 1);
        assert_eq!(snap[1].line, 2);
    }

    #[test]
    fn test_wrap_keeps_newest() {
        let mut log = HistoryLog::new(3);
        for n in 1..=5 {
            log.push(entry(n));
        }
        assert_eq!(log.len(), 3);

        let snap = log.snapshot();
        let lines: Vec<u32> = snap.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4, 5]);
    }

    #[test]
    fn test_exact_lap_boundary() {
        let mut log = HistoryLog::new(3);
        for n in 1..=3 {
            log.push(entry(n));
        }
        // head is back at slot 0, which is occupied: the buffer counts as
        // wrapped and the snapshot is the full lap in order
        assert_eq!(log.len(), 3);
        let lines: Vec<u32> = log.snapshot().iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![1, 2, 3]);
    }

    #[test]
    fn test_clear() {
        let mut log = HistoryLog::new(2);
        log.push(entry(1));
        log.push(entry(2));
        log.clear();
        assert!(log.is_empty());
        assert!(log.snapshot().is_empty());
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut log = HistoryLog::new(0);
        assert_eq!(log.capacity(), 1);
        log.push(entry(1));
        log.push(entry(2));
        assert_eq!(log.snapshot()[0].line, 2);
    }
}
