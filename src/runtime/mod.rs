//! Runtime - transducers, the set, the thread driver and history

use crate::runtime::history::DEFAULT_HISTORY_CAPACITY;

pub mod driver;
pub mod history;
pub mod set;
pub mod transducer;

// Re-export key types
pub use driver::Driver;
pub use history::{HistoryEntry, HistoryLog, SharedHistory};
pub use set::TransducerSet;
pub use transducer::Transducer;

/// Default epsilon-closure step limit
pub const DEFAULT_EPSILON_LIMIT: usize = 4096;

/// Guard event type whose argument literals form the predicted-input set
pub const DEFAULT_PREDICT_EVENT: &str = "RECOG_EVENT_STOP";

/// Default initial-state label for main and sub transducers
pub const DEFAULT_INITIAL_STATE: &str = "0";

/// Runtime knobs shared by the driver and the transducer set
#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// Initial-state label used when a load does not name one
    pub initial_state: String,
    /// History ring capacity
    pub history_capacity: usize,
    /// Epsilon-closure step limit
    pub epsilon_limit: usize,
    /// Recognition-stop guard type scanned for predicted inputs
    pub predict_event_type: String,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            initial_state: DEFAULT_INITIAL_STATE.to_string(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            epsilon_limit: DEFAULT_EPSILON_LIMIT,
            predict_event_type: DEFAULT_PREDICT_EVENT.to_string(),
        }
    }
}
