//! Dispatch Tests
//!
//! These tests verify:
//! - Transport failures are retried with recovery in between
//! - Validation, command and unexpected failures are never retried
//! - Dispatched operations run off the caller's thread

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use heoslink::dispatch::{run_with_retry, MAX_RETRIES};
use heoslink::protocol::ErrorId;
use heoslink::{Dispatcher, ErrorKind, HeosError, Pending};

// =============================================================================
// Helper Functions
// =============================================================================

fn transport_error() -> HeosError {
    std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset").into()
}

fn counter() -> Arc<AtomicU32> {
    Arc::new(AtomicU32::new(0))
}

// =============================================================================
// Retry Policy Tests
// =============================================================================

#[test]
fn test_transport_failure_retried_until_budget_exhausted() {
    let attempts = counter();
    let recoveries = counter();

    let result: heoslink::Result<()> = run_with_retry(
        || {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(transport_error())
        },
        || {
            recoveries.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
    );

    assert_eq!(result.unwrap_err().kind(), ErrorKind::Transport);
    assert_eq!(attempts.load(Ordering::SeqCst), MAX_RETRIES + 1);
    assert_eq!(recoveries.load(Ordering::SeqCst), MAX_RETRIES);
}

#[test]
fn test_transport_failure_then_success() {
    let attempts = counter();
    let recoveries = counter();

    let result = run_with_retry(
        || {
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(transport_error())
            } else {
                Ok("volume=10")
            }
        },
        || {
            recoveries.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
    );

    assert_eq!(result.unwrap(), "volume=10");
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(recoveries.load(Ordering::SeqCst), 1);
}

#[test]
fn test_command_failure_never_retried() {
    let attempts = counter();
    let recoveries = counter();

    let result: heoslink::Result<()> = run_with_retry(
        || {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(HeosError::CommandFailure {
                eid: ErrorId::InvalidCredentials,
                text: "bad password".to_string(),
            })
        },
        || {
            recoveries.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
    );

    match result {
        Err(HeosError::CommandFailure { eid, text }) => {
            assert_eq!(eid, ErrorId::InvalidCredentials);
            assert_eq!(text, "bad password");
        }
        other => panic!("Expected CommandFailure, got {other:?}"),
    }
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(recoveries.load(Ordering::SeqCst), 0);
}

#[test]
fn test_validation_error_never_retried() {
    let attempts = counter();
    let recoveries = counter();

    let result: heoslink::Result<()> = run_with_retry(
        || {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(HeosError::Validation("pid is required".to_string()))
        },
        || {
            recoveries.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
    );

    assert_eq!(result.unwrap_err().kind(), ErrorKind::Validation);
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(recoveries.load(Ordering::SeqCst), 0);
}

#[test]
fn test_unexpected_error_never_retried() {
    let attempts = counter();
    let recoveries = counter();

    let result: heoslink::Result<()> = run_with_retry(
        || {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(HeosError::Unexpected("garbage".to_string()))
        },
        || {
            recoveries.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
    );

    assert_eq!(result.unwrap_err().kind(), ErrorKind::Unexpected);
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(recoveries.load(Ordering::SeqCst), 0);
}

#[test]
fn test_failed_recovery_still_uses_budget() {
    let attempts = counter();
    let recoveries = counter();

    let result: heoslink::Result<()> = run_with_retry(
        || {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(transport_error())
        },
        || {
            recoveries.fetch_add(1, Ordering::SeqCst);
            Err(transport_error())
        },
    );

    assert!(result.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), MAX_RETRIES + 1);
    assert_eq!(recoveries.load(Ordering::SeqCst), MAX_RETRIES);
}

#[test]
fn test_budget_is_per_call() {
    let recoveries = counter();

    for _ in 0..2 {
        let attempts = counter();
        let _: heoslink::Result<()> = run_with_retry(
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(transport_error())
            },
            || {
                recoveries.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        );
        assert_eq!(attempts.load(Ordering::SeqCst), MAX_RETRIES + 1);
    }
    assert_eq!(recoveries.load(Ordering::SeqCst), 2 * MAX_RETRIES);
}

// =============================================================================
// Dispatcher Tests
// =============================================================================

#[test]
fn test_submit_runs_on_worker_thread() {
    let dispatcher = Dispatcher::new(2).unwrap();
    let caller = thread::current().id();

    let pending = dispatcher.submit(move || Ok(thread::current().id()), || Ok(()));
    let worker = pending.wait().unwrap();
    assert_ne!(worker, caller);
}

#[test]
fn test_submit_applies_retry_policy() {
    let dispatcher = Dispatcher::new(1).unwrap();
    let attempts = counter();
    let recoveries = counter();

    let attempts_clone = Arc::clone(&attempts);
    let recoveries_clone = Arc::clone(&recoveries);
    let pending: Pending<()> = dispatcher.submit(
        move || {
            attempts_clone.fetch_add(1, Ordering::SeqCst);
            Err(transport_error())
        },
        move || {
            recoveries_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
    );

    assert_eq!(pending.wait().unwrap_err().kind(), ErrorKind::Transport);
    assert_eq!(attempts.load(Ordering::SeqCst), MAX_RETRIES + 1);
    assert_eq!(recoveries.load(Ordering::SeqCst), MAX_RETRIES);
}

#[test]
fn test_many_submissions_all_complete() {
    let dispatcher = Dispatcher::new(4).unwrap();
    assert_eq!(dispatcher.worker_count(), 4);

    let pendings: Vec<_> = (0..32u32)
        .map(|i| dispatcher.submit(move || Ok(i * 2), || Ok(())))
        .collect();

    let results: Vec<u32> = pendings.into_iter().map(|p| p.wait().unwrap()).collect();
    assert_eq!(results, (0..32u32).map(|i| i * 2).collect::<Vec<_>>());
}

#[test]
fn test_wait_timeout_on_slow_operation() {
    let dispatcher = Dispatcher::new(1).unwrap();
    let pending = dispatcher.submit(
        || {
            thread::sleep(Duration::from_millis(200));
            Ok(7)
        },
        || Ok(()),
    );

    assert!(pending.wait_timeout(Duration::from_millis(10)).is_none());
    assert_eq!(pending.wait().unwrap(), 7);
}

#[test]
fn test_panicking_operation_reports_unexpected() {
    let dispatcher = Dispatcher::new(1).unwrap();
    let pending: Pending<()> = dispatcher.submit(|| panic!("boom"), || Ok(()));
    assert_eq!(pending.wait().unwrap_err().kind(), ErrorKind::Unexpected);

    // The worker survives the panic
    let pending = dispatcher.submit(|| Ok(1), || Ok(()));
    assert_eq!(pending.wait().unwrap(), 1);
}

#[test]
fn test_submit_after_shutdown_reports_unexpected() {
    let mut dispatcher = Dispatcher::new(1).unwrap();
    dispatcher.shutdown();

    let pending = dispatcher.submit(|| Ok(1), || Ok(()));
    assert_eq!(pending.wait().unwrap_err().kind(), ErrorKind::Unexpected);
}

#[test]
fn test_ready_pending() {
    let pending: Pending<u8> = Pending::ready(Err(HeosError::Validation("bad".to_string())));
    assert_eq!(pending.wait().unwrap_err().kind(), ErrorKind::Validation);
}
