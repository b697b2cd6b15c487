//! Dispatch Module
//!
//! Runs protocol operations off the caller's thread with a bounded
//! retry-and-reconnect policy.
//!
//! ## Retry Policy
//! - Validation / CommandFailure / Unexpected: surfaced immediately
//! - Transport: recovery hook (normally a reconnect), then another attempt,
//!   at most [`MAX_RETRIES`] times per call

use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};

use crate::error::{ErrorKind, HeosError, Result};

/// Retries allowed after the first attempt
pub const MAX_RETRIES: u32 = 3;

/// Per-call retry counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    remaining: u32,
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self {
            remaining: MAX_RETRIES,
        }
    }
}

impl RetryBudget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Use up one retry; false when none are left
    pub fn try_consume(&mut self) -> bool {
        if self.is_exhausted() {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

/// Run `op` until it succeeds, fails with a non-transport error, or the
/// retry budget runs out
///
/// `recover` runs before every retry. A failing recovery still counts as a
/// used retry.
pub fn run_with_retry<T, Op, Rec>(mut op: Op, mut recover: Rec) -> Result<T>
where
    Op: FnMut() -> Result<T>,
    Rec: FnMut() -> Result<()>,
{
    let mut budget = RetryBudget::new();

    loop {
        let err = match op() {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        match err.kind() {
            ErrorKind::Transport => {
                if budget.is_exhausted() {
                    tracing::error!("Giving up after {} retries: {}", MAX_RETRIES, err);
                    return Err(err);
                }

                tracing::warn!(
                    "Transport failure, recovering ({} retries left): {}",
                    budget.remaining(),
                    err
                );
                if let Err(e) = recover() {
                    tracing::warn!("Recovery failed: {}", e);
                }
                budget.try_consume();
            }
            ErrorKind::Unexpected => {
                tracing::error!("Unexpected error: {}", err);
                return Err(err);
            }
            ErrorKind::Validation | ErrorKind::CommandFailure => return Err(err),
        }
    }
}

// =============================================================================
// Executor
// =============================================================================

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Handle to a dispatched operation
pub struct Pending<T> {
    rx: Receiver<Result<T>>,
}

impl<T> Pending<T> {
    /// Handle that is already complete, for errors caught before dispatch
    pub fn ready(outcome: Result<T>) -> Self {
        let (tx, rx) = channel::bounded(1);
        // Capacity 1 and we hold the receiver
        let _ = tx.send(outcome);
        Self { rx }
    }

    /// Block until the operation finishes
    pub fn wait(self) -> Result<T> {
        self.rx.recv().unwrap_or_else(|_| Err(dropped_error()))
    }

    /// Wait at most `timeout`; `None` if the operation is still running
    ///
    /// Timing out does not cancel the operation.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<T>> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(dropped_error())),
        }
    }
}

fn dropped_error() -> HeosError {
    HeosError::Unexpected("operation dropped before completion".to_string())
}

/// Fixed pool of worker threads executing dispatched operations
pub struct Dispatcher {
    job_tx: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl Dispatcher {
    /// Spawn `worker_threads` workers (at least one)
    pub fn new(worker_threads: usize) -> Result<Self> {
        let (job_tx, job_rx) = channel::unbounded::<Job>();
        let mut workers = Vec::with_capacity(worker_threads.max(1));

        for id in 0..worker_threads.max(1) {
            let job_rx = job_rx.clone();
            let handle = thread::Builder::new()
                .name(format!("heos-dispatch-{id}"))
                .spawn(move || worker_loop(job_rx))
                .map_err(|e| HeosError::Unexpected(format!("failed to spawn worker: {e}")))?;
            workers.push(handle);
        }

        Ok(Self {
            job_tx: Some(job_tx),
            workers,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Run `op` on a worker with the retry policy of [`run_with_retry`]
    pub fn submit<T, Op, Rec>(&self, op: Op, recover: Rec) -> Pending<T>
    where
        T: Send + 'static,
        Op: FnMut() -> Result<T> + Send + 'static,
        Rec: FnMut() -> Result<()> + Send + 'static,
    {
        let (tx, rx) = channel::bounded(1);
        let job: Job = Box::new(move || {
            // Receiver may be gone if the caller dropped its handle
            let _ = tx.send(run_with_retry(op, recover));
        });

        match &self.job_tx {
            // A rejected job is dropped with its sender, so `wait` reports it
            Some(job_tx) => {
                if job_tx.send(job).is_err() {
                    tracing::warn!("Dispatcher queue closed, operation dropped");
                }
            }
            None => tracing::warn!("Dispatcher shut down, operation dropped"),
        }

        Pending { rx }
    }

    /// Stop accepting work and wait for queued operations to finish
    pub fn shutdown(&mut self) {
        if self.job_tx.take().is_none() {
            return;
        }
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("Dispatch worker panicked");
            }
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(job_rx: Receiver<Job>) {
    while let Ok(job) = job_rx.recv() {
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            tracing::error!("Dispatched operation panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_counts_down_to_zero() {
        let mut budget = RetryBudget::new();
        assert_eq!(budget.remaining(), MAX_RETRIES);
        for _ in 0..MAX_RETRIES {
            assert!(budget.try_consume());
        }
        assert!(budget.is_exhausted());
        assert!(!budget.try_consume());
    }
}
