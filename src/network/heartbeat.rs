//! Heartbeat
//!
//! Periodic keep-alive running on its own thread.
//!
//! ## Scheduling
//! Fixed delay: the next run starts `interval` after the previous one
//! finished, so a slow device never causes overlapping runs. The first run
//! happens immediately on `start`.
//!
//! A failing run is logged and the schedule carries on.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, RecvTimeoutError, Sender};

use crate::error::{ErrorKind, HeosError, Result};
use crate::protocol::{Attributes, Command};
use super::Connection;

type Task = Arc<dyn Fn() -> Result<()> + Send + Sync>;

struct Running {
    /// Dropping this wakes the worker and ends the loop
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Background keep-alive scheduler
pub struct Heartbeat {
    interval: Duration,
    task: Task,
    runs: Arc<AtomicU64>,
    running: Option<Running>,
}

impl Heartbeat {
    /// Create a stopped scheduler running `task` every `interval`
    pub fn new<F>(interval: Duration, task: F) -> Self
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        Self {
            interval,
            task: Arc::new(task),
            runs: Arc::new(AtomicU64::new(0)),
            running: None,
        }
    }

    /// Scheduler sending `system/heart_beat` over `connection`
    pub fn for_connection(connection: Arc<Connection>, interval: Duration) -> Self {
        Self::new(interval, move || {
            connection
                .execute(&Command::SYSTEM_HEART_BEAT, &Attributes::new())
                .map(|_| ())
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Number of completed runs, successful or not
    pub fn runs(&self) -> u64 {
        self.runs.load(Ordering::SeqCst)
    }

    /// Start the schedule. No-op if already running.
    pub fn start(&mut self) -> Result<()> {
        if self.running.is_some() {
            return Ok(());
        }

        let (stop_tx, stop_rx) = channel::bounded::<()>(1);
        let task = Arc::clone(&self.task);
        let runs = Arc::clone(&self.runs);
        let interval = self.interval;

        let handle = thread::Builder::new()
            .name("heos-heartbeat".to_string())
            .spawn(move || loop {
                run_once(&task);
                runs.fetch_add(1, Ordering::SeqCst);

                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .map_err(|e| HeosError::Unexpected(format!("failed to spawn heartbeat thread: {e}")))?;

        tracing::debug!("Heartbeat started (interval {:?})", interval);
        self.running = Some(Running { stop_tx, handle });
        Ok(())
    }

    /// Cancel future runs
    ///
    /// An in-flight run finishes first; its result is discarded. Safe to call
    /// any number of times.
    pub fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        drop(running.stop_tx);
        if running.handle.join().is_err() {
            tracing::warn!("Heartbeat thread panicked");
        }
        tracing::debug!("Heartbeat stopped after {} runs", self.runs());
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_once(task: &Task) {
    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| task())) {
        Ok(outcome) => outcome,
        Err(_) => {
            tracing::error!("Heartbeat task panicked");
            return;
        }
    };

    match outcome {
        Ok(()) => tracing::trace!("Heartbeat ok"),
        Err(e) => match e.kind() {
            ErrorKind::CommandFailure | ErrorKind::Transport => {
                tracing::warn!("Heartbeat failed: {}", e);
            }
            _ => tracing::error!("Heartbeat failed unexpectedly: {}", e),
        },
    }
}
