use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::TailConfig;
use crate::data::model::Snapshot;
use crate::data::reader::Tailer;
use crate::error::TailError;

// ---------------------------------------------------------------------------
// Stop signal
// ---------------------------------------------------------------------------

/// Cooperative cancellation owned by whoever attached the reader.
///
/// The worker waits between cycles on the receiving end, so a stop request
/// takes effect immediately instead of after the next interval.
#[derive(Debug)]
struct StopSignal {
    stopped: Arc<AtomicBool>,
    wake: Mutex<Option<Sender<()>>>,
}

impl StopSignal {
    fn new() -> (Self, StopListener) {
        let (tx, rx) = mpsc::channel();
        let stopped = Arc::new(AtomicBool::new(false));
        let signal = Self {
            stopped: Arc::clone(&stopped),
            wake: Mutex::new(Some(tx)),
        };
        (signal, StopListener { stopped, wake: rx })
    }

    fn request(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        // Dropping the sender disconnects the channel and wakes the worker.
        self.wake
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    fn is_requested(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

struct StopListener {
    stopped: Arc<AtomicBool>,
    wake: Receiver<()>,
}

impl StopListener {
    /// Sleep for `interval`; returns `true` if the worker should exit.
    fn wait(&self, interval: Duration) -> bool {
        if self.stopped.load(Ordering::SeqCst) {
            return true;
        }
        match self.wake.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => self.stopped.load(Ordering::SeqCst),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// A running reader. Dropping the handle asks the worker to stop.
#[derive(Debug)]
pub struct TailHandle {
    tailer: Arc<Tailer>,
    stop: StopSignal,
    worker: Option<JoinHandle<()>>,
}

/// Start polling `path` in a background thread.
///
/// The file does not have to exist yet; polls fail quietly until it does.
pub fn attach(path: impl Into<PathBuf>, config: &TailConfig) -> std::io::Result<TailHandle> {
    let tailer = Arc::new(Tailer::new(path, config.on_malformed));
    let (stop, listener) = StopSignal::new();
    let interval = config.poll_interval();

    let worker = thread::Builder::new()
        .name(format!("{}-{}", config.thread_name_prefix, tailer.source_name()))
        .spawn({
            let tailer = Arc::clone(&tailer);
            move || run(&tailer, &listener, interval)
        })?;

    log::info!(
        "attached reader to {} (every {interval:?})",
        tailer.source().display()
    );
    Ok(TailHandle {
        tailer,
        stop,
        worker: Some(worker),
    })
}

impl TailHandle {
    pub fn snapshot(&self) -> Snapshot {
        self.tailer.snapshot()
    }

    pub fn source(&self) -> &Path {
        self.tailer.source()
    }

    pub fn source_name(&self) -> String {
        self.tailer.source_name()
    }

    /// Ask the worker to exit after its current cycle. Idempotent.
    pub fn request_stop(&self) {
        if !self.stop.is_requested() {
            log::debug!("{}: stop requested", self.tailer.source().display());
        }
        self.stop.request();
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_requested()
    }

    /// Clear the series; the next cycle re-reads the source from byte 0.
    pub fn reload(&self) {
        self.tailer.reload();
    }

    /// Stop the worker and wait for it to finish.
    pub fn join(mut self) {
        self.request_stop();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("{}: reader thread panicked", self.tailer.source().display());
            }
        }
    }
}

impl Drop for TailHandle {
    fn drop(&mut self) {
        self.stop.request();
    }
}

// ---------------------------------------------------------------------------
// Worker loop
// ---------------------------------------------------------------------------

fn run(tailer: &Tailer, stop: &StopListener, interval: Duration) {
    loop {
        match tailer.poll() {
            Ok(outcome) if outcome.appended > 0 || outcome.truncated => log::debug!(
                "{}: +{} samples (skipped {}), cursor {}",
                tailer.source().display(),
                outcome.appended,
                outcome.skipped,
                outcome.cursor
            ),
            Ok(_) => {}
            Err(e @ TailError::SourceUnavailable { .. }) => log::warn!("{e}"),
            Err(e) => log::error!("{e}"),
        }
        if stop.wait(interval) {
            break;
        }
    }
    log::debug!("{}: reader stopped", tailer.source().display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn stop_wakes_a_waiting_listener() {
        let (signal, listener) = StopSignal::new();
        let waiter = thread::spawn(move || {
            let start = Instant::now();
            let stopped = listener.wait(Duration::from_secs(30));
            (stopped, start.elapsed())
        });
        signal.request();
        signal.request();
        let (stopped, elapsed) = waiter.join().unwrap();
        assert!(stopped);
        assert!(elapsed < Duration::from_secs(10));
        assert!(signal.is_requested());
    }

    #[test]
    fn timeout_without_stop_keeps_going() {
        let (_signal, listener) = StopSignal::new();
        assert!(!listener.wait(Duration::from_millis(1)));
    }
}
