//! Execution guards: wall-clock budget, cooperative cancellation, and
//! re-entrancy bounds.
//!
//! Guards are per-execution and thread-confined; none of them block or
//! suspend. The interpreter polls them inline from its dispatch loop.

pub mod execution;
pub mod recursion;

pub use execution::{CancellationSignal, ExecutionGuard};
pub use recursion::RecursionGuard;

/// Why a guard stopped an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// The configured wall-clock budget was exceeded.
    Timeout { timeout_ms: u64 },
    /// The host requested early termination.
    Cancelled,
    /// Script-triggered re-entry exceeded the configured depth.
    RecursionLimit { max: u32 },
}
