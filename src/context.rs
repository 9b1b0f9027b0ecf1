//! Per-execution sandbox state.

use std::cell::Cell;
use std::sync::Arc;

use crate::config::SandboxConfig;
use crate::error::SandboxError;
use crate::guard::{CancellationSignal, ExecutionGuard, Interrupt, RecursionGuard};
use crate::policy::{ClassAccessPolicy, RuntimeObjectFilter};

/// Execution lifecycle of one sandbox context.
///
/// `Idle → Running → {Completed, Failed, TimedOut, Cancelled}`, always
/// funnelling back to `Idle` through guard teardown. The terminal state of
/// the most recent run is kept in [`SandboxContext::last_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Idle,
    Running,
    Completed,
    Failed,
    TimedOut,
    Cancelled,
}

/// Aggregate the interpreter holds per execution thread.
///
/// Shares the process-wide immutable [`ClassAccessPolicy`] and
/// [`RuntimeObjectFilter`], and owns the per-execution [`ExecutionGuard`] and
/// [`RecursionGuard`]. Thread-confined by construction (`Cell` interior, not
/// `Sync`); concurrent executions each build their own context around the
/// shared policy objects.
pub struct SandboxContext {
    policy: Arc<ClassAccessPolicy>,
    objects: Arc<RuntimeObjectFilter>,
    execution: ExecutionGuard,
    recursion: RecursionGuard,
    state: Cell<ExecutionState>,
    last_status: Cell<ExecutionState>,
    pending: Cell<Option<Interrupt>>,
}

impl SandboxContext {
    pub fn new(
        policy: Arc<ClassAccessPolicy>,
        objects: Arc<RuntimeObjectFilter>,
        config: &SandboxConfig,
        cancellation: Option<CancellationSignal>,
    ) -> Self {
        let execution = match cancellation {
            Some(signal) => ExecutionGuard::with_cancellation(config.timeout(), signal),
            None => ExecutionGuard::new(config.timeout()),
        };
        Self {
            policy,
            objects,
            execution,
            recursion: RecursionGuard::new(config.max_recursion_depth),
            state: Cell::new(ExecutionState::Idle),
            last_status: Cell::new(ExecutionState::Idle),
            pending: Cell::new(None),
        }
    }

    pub fn policy(&self) -> &ClassAccessPolicy {
        &self.policy
    }

    pub fn objects(&self) -> &RuntimeObjectFilter {
        &self.objects
    }

    pub fn state(&self) -> ExecutionState {
        self.state.get()
    }

    /// Terminal state of the most recent execution, `Idle` if none ran yet.
    pub fn last_status(&self) -> ExecutionState {
        self.last_status.get()
    }

    pub fn recursion_depth(&self) -> u32 {
        self.recursion.depth()
    }

    pub fn max_recursion_depth(&self) -> u32 {
        self.recursion.max_depth()
    }

    /// Enter one evaluation level. The outermost level clears any stale
    /// interrupt, arms the timer and moves the state to `Running`; nested
    /// levels only bump the recursion guard.
    pub fn begin(&self) -> Result<(), SandboxError> {
        if let Err(interrupt) = self.recursion.enter() {
            // Poison the run: a nested overflow must fail the whole
            // evaluation even if the script catches the thrown error.
            self.pending.set(Some(interrupt));
            return Err(interrupt.into());
        }
        if self.recursion.depth() == 1 {
            self.pending.set(None);
            self.execution.start();
            self.state.set(ExecutionState::Running);
        }
        Ok(())
    }

    /// Poll the guards from the interpreter's dispatch hook. Once an
    /// interrupt is recorded, every further poll keeps failing so the engine
    /// cannot resume a condemned execution.
    pub fn poll(&self) -> Result<(), Interrupt> {
        if let Some(pending) = self.pending.get() {
            return Err(pending);
        }
        match self.execution.check() {
            Ok(()) => Ok(()),
            Err(interrupt) => {
                self.pending.set(Some(interrupt));
                Err(interrupt)
            }
        }
    }

    /// The interrupt recorded for the current run, if any.
    pub fn pending_interrupt(&self) -> Option<Interrupt> {
        self.pending.get()
    }

    /// Replace the outcome with the recorded interrupt. Called by the
    /// evaluator at the outermost level only: an engine error caused by a
    /// guard trip surfaces as the guard's failure, not as an opaque engine
    /// error, and a caught-but-condemned run still fails.
    pub fn resolve<T>(&self, outcome: Result<T, SandboxError>) -> Result<T, SandboxError> {
        if self.recursion.depth() == 1 {
            if let Some(interrupt) = self.pending.take() {
                return Err(interrupt.into());
            }
        }
        outcome
    }

    /// Leave one evaluation level. The outermost level disarms the timer
    /// unconditionally, records the terminal status and returns to `Idle`.
    pub fn end(&self, error: Option<&SandboxError>) {
        self.recursion.leave();
        if self.recursion.depth() == 0 {
            self.execution.stop();
            let status = match error {
                None => ExecutionState::Completed,
                Some(SandboxError::Timeout(_)) => ExecutionState::TimedOut,
                Some(SandboxError::Cancelled) => ExecutionState::Cancelled,
                Some(_) => ExecutionState::Failed,
            };
            self.last_status.set(status);
            self.state.set(ExecutionState::Idle);
        }
    }
}
