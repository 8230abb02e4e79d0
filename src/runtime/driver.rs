//! Thread driver - event queue and the single worker
//!
//! Producers only enqueue; every graph mutation (state advance, variable
//! writes, sub-transducer add/remove, reload) happens on the one worker
//! thread, so the transition engine itself runs single-threaded and
//! lock-free. The only cross-thread state is the FIFO channel and the
//! lock-guarded history log.

use crate::event::Event;
use crate::host::{FileLoader, Host};
use crate::runtime::history::{SharedHistory, shared_history};
use crate::runtime::{DriverOptions, TransducerSet};
use crate::{Error, Result};
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

enum Msg {
    Event(Event),
    Shutdown,
}

/// Owns the queue and the worker driving one transducer set.
///
/// The initial compile runs on the caller's thread; `FST_LOAD` reloads
/// arriving through the queue compile on the worker, the only thread
/// allowed to touch the set. Dropping the driver shuts the worker down
/// and joins it.
pub struct Driver {
    tx: Sender<Msg>,
    worker: Option<JoinHandle<()>>,
    history: SharedHistory,
}

impl Driver {
    /// Compile the main FST (plus sibling sub-FSTs), start the worker and
    /// return the running driver
    pub fn spawn(
        loader: Arc<dyn FileLoader>,
        host: Arc<dyn Host>,
        path: &str,
        initial: Option<&str>,
        opts: DriverOptions,
    ) -> Result<Self> {
        let history = shared_history(opts.history_capacity);
        let mut set = TransducerSet::load(&*loader, &*host, path, initial, &opts, history.clone())?;

        let (tx, rx) = mpsc::channel::<Msg>();
        let worker = std::thread::Builder::new()
            .name("dialog-fst-worker".to_string())
            .spawn(move || {
                // block when the queue is empty; strict FIFO otherwise
                while let Ok(Msg::Event(event)) = rx.recv() {
                    host.wait_if_paused();
                    set.handle(&event, &*host, &*loader);
                }
                tracing::debug!("driver worker exiting");
            })?;

        Ok(Self {
            tx,
            worker: Some(worker),
            history,
        })
    }

    /// Enqueue an event; processed strictly in enqueue order
    pub fn post(&self, event: Event) -> Result<()> {
        self.tx
            .send(Msg::Event(event))
            .map_err(|_| Error::driver("event queue is closed"))
    }

    /// Shared history handle for the external debug renderer
    pub fn history(&self) -> SharedHistory {
        self.history.clone()
    }

    /// Stop the worker and wait for it. Events already queued ahead of
    /// the shutdown message are still processed.
    pub fn shutdown(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.tx.send(Msg::Shutdown);
            if worker.join().is_err() {
                tracing::error!("driver worker panicked");
            }
        }
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MemoryHost, MemoryLoader};

    fn spawn_driver(host: Arc<MemoryHost>) -> Driver {
        let loader = Arc::new(
            MemoryLoader::new()
                .with_file("main.fst", "0 1 GO OUT_A\n1 2 GO OUT_B\n1 0 RESET OUT_R\n"),
        );
        Driver::spawn(loader, host, "main.fst", None, DriverOptions::default()).unwrap()
    }

    #[test]
    fn test_events_processed_in_fifo_order() {
        let host = Arc::new(MemoryHost::new());
        let mut driver = spawn_driver(host.clone());

        driver.post(Event::new("GO", None)).unwrap();
        driver.post(Event::new("RESET", None)).unwrap();
        driver.post(Event::new("GO", None)).unwrap();
        driver.shutdown();

        let types: Vec<String> = host.sent().into_iter().map(|(t, _)| t).collect();
        assert_eq!(types, vec!["OUT_A", "OUT_R", "OUT_A"]);
    }

    #[test]
    fn test_shutdown_is_idempotent_and_drop_safe() {
        let host = Arc::new(MemoryHost::new());
        let mut driver = spawn_driver(host);
        driver.shutdown();
        driver.shutdown();
        assert!(driver.post(Event::new("GO", None)).is_err());
        // drop after shutdown must not hang or panic
        drop(driver);
    }

    #[test]
    fn test_history_readable_from_another_thread() {
        let host = Arc::new(MemoryHost::new());
        let mut driver = spawn_driver(host);
        driver.post(Event::new("GO", None)).unwrap();
        driver.shutdown();

        let history = driver.history();
        let reader = std::thread::spawn(move || history.lock().unwrap().snapshot().len());
        assert_eq!(reader.join().unwrap(), 1);
    }

    #[test]
    fn test_malformed_events_do_not_kill_worker() {
        let host = Arc::new(MemoryHost::new());
        let mut driver = spawn_driver(host.clone());

        driver.post(Event::new("NO_SUCH_EVENT", Some("||,".to_string()))).unwrap();
        driver.post(Event::new("FST_LOAD", Some("".to_string()))).unwrap();
        driver.post(Event::new("GO", None)).unwrap();
        driver.shutdown();

        let types: Vec<String> = host.sent().into_iter().map(|(t, _)| t).collect();
        assert_eq!(types, vec!["OUT_A"]);
    }

    #[test]
    fn test_spawn_fails_on_missing_initial_state() {
        let loader = Arc::new(MemoryLoader::new().with_file("main.fst", "0 1 GO OUT\n"));
        let host = Arc::new(MemoryHost::new());
        let result = Driver::spawn(
            loader,
            host,
            "main.fst",
            Some("MISSING"),
            DriverOptions::default(),
        );
        assert!(result.is_err());
    }
}
