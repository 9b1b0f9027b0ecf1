//! Wall-clock timeout and external cancellation.

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::Interrupt;

/// Cooperative cancellation handle.
///
/// Cloned freely and tripped from any thread; the guard observes it from the
/// execution thread on each poll.
#[derive(Clone, Debug, Default)]
pub struct CancellationSignal {
    flag: Arc<AtomicBool>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request termination of the execution this signal is attached to.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Wall-clock budget for one script evaluation.
///
/// One guard per execution, confined to the executing thread. `check` is a
/// synchronous poll: cancellation is consulted first, then elapsed time, and
/// either failure is returned inline to the interpreter.
pub struct ExecutionGuard {
    timeout: Duration,
    started: Cell<Option<Instant>>,
    cancellation: Option<CancellationSignal>,
}

impl ExecutionGuard {
    /// A guard with the given budget and no cancellation signal. A zero
    /// timeout disables the time check.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            started: Cell::new(None),
            cancellation: None,
        }
    }

    pub fn with_cancellation(timeout: Duration, signal: CancellationSignal) -> Self {
        Self {
            timeout,
            started: Cell::new(None),
            cancellation: Some(signal),
        }
    }

    /// Arm the timer. Calling `start` again before `stop` is a caller error.
    pub fn start(&self) {
        debug_assert!(
            self.started.get().is_none(),
            "ExecutionGuard::start called twice without an intervening stop"
        );
        self.started.set(Some(Instant::now()));
    }

    /// Poll the guard. Cancellation outranks timeout.
    pub fn check(&self) -> Result<(), Interrupt> {
        if let Some(signal) = &self.cancellation {
            if signal.is_cancelled() {
                return Err(Interrupt::Cancelled);
            }
        }
        if !self.timeout.is_zero() {
            if let Some(started) = self.started.get() {
                if started.elapsed() > self.timeout {
                    return Err(Interrupt::Timeout {
                        timeout_ms: self.timeout.as_millis() as u64,
                    });
                }
            }
        }
        Ok(())
    }

    /// Disarm the timer unconditionally. Runs on every exit path of an
    /// evaluation so the guard can be reused or discarded cleanly.
    pub fn stop(&self) {
        self.started.set(None);
    }

    pub fn is_running(&self) -> bool {
        self.started.get().is_some()
    }
}
