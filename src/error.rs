//! Sandbox error taxonomy.

use crate::guard::Interrupt;

/// Errors surfaced by a script evaluation.
///
/// All variants are fatal to the current evaluation; guard teardown runs on
/// every failure path before the error reaches the embedder.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("Access to host class '{0}' denied")]
    AccessDenied(String),

    #[error("Script execution timed out after {0}ms")]
    Timeout(u64),

    #[error("Script execution cancelled by host")]
    Cancelled,

    #[error("Maximum script recursion depth exceeded (max {0})")]
    RecursionLimit(u32),

    #[error("Code too large (max {max} bytes, got {actual} bytes)")]
    CodeTooLarge { max: usize, actual: usize },

    #[error("Script error: {0}")]
    ScriptError(String),

    #[error("Engine error: {0}")]
    EngineError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<Interrupt> for SandboxError {
    fn from(interrupt: Interrupt) -> Self {
        match interrupt {
            Interrupt::Timeout { timeout_ms } => SandboxError::Timeout(timeout_ms),
            Interrupt::Cancelled => SandboxError::Cancelled,
            Interrupt::RecursionLimit { max } => SandboxError::RecursionLimit(max),
        }
    }
}
