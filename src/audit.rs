//! Security audit events and best-effort denial logging.

use serde::Serialize;

/// A security-relevant occurrence inside the sandbox.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityEvent {
    pub timestamp: i64,
    pub kind: SecurityEventKind,
    pub severity: EventSeverity,
}

#[derive(Debug, Clone, Serialize)]
pub enum SecurityEventKind {
    ClassDenied { class: String, reason: DenialReason },
    ObjectDenied { type_name: String },
    ExecutionTimeout { timeout_ms: u64 },
    ExecutionCancelled,
    RecursionLimitHit { max: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DenialReason {
    Blacklisted,
    NotWhitelisted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventSeverity {
    Info,
    Warning,
    Critical,
}

impl SecurityEvent {
    fn now(kind: SecurityEventKind, severity: EventSeverity) -> Self {
        Self {
            timestamp: chrono::Utc::now().timestamp_millis(),
            kind,
            severity,
        }
    }

    pub fn class_denied(class: &str, reason: DenialReason) -> Self {
        Self::now(
            SecurityEventKind::ClassDenied {
                class: class.to_string(),
                reason,
            },
            EventSeverity::Warning,
        )
    }

    pub fn object_denied(type_name: &str) -> Self {
        Self::now(
            SecurityEventKind::ObjectDenied {
                type_name: type_name.to_string(),
            },
            EventSeverity::Warning,
        )
    }

    pub fn execution_timeout(timeout_ms: u64) -> Self {
        Self::now(
            SecurityEventKind::ExecutionTimeout { timeout_ms },
            EventSeverity::Warning,
        )
    }

    pub fn execution_cancelled() -> Self {
        Self::now(SecurityEventKind::ExecutionCancelled, EventSeverity::Info)
    }

    pub fn recursion_limit_hit(max: u32) -> Self {
        Self::now(
            SecurityEventKind::RecursionLimitHit { max },
            EventSeverity::Warning,
        )
    }
}

/// Sink for [`SecurityEvent`]s.
///
/// Implementations must not rely on being called from any particular thread;
/// policy checks dispatch events inline from script-execution threads.
pub trait AuditLogger: Send + Sync {
    fn log_event(&self, event: &SecurityEvent);
}

/// Routes events to `tracing` at a level matching the event severity.
pub struct TracingAuditLogger;

impl AuditLogger for TracingAuditLogger {
    fn log_event(&self, event: &SecurityEvent) {
        match event.severity {
            EventSeverity::Critical => {
                tracing::error!(kind = ?event.kind, "SECURITY: {:?}", event.kind);
            }
            EventSeverity::Warning => {
                tracing::warn!(kind = ?event.kind, "SECURITY: {:?}", event.kind);
            }
            EventSeverity::Info => {
                tracing::info!(kind = ?event.kind, "SECURITY: {:?}", event.kind);
            }
        }
    }
}

/// Dispatch an event, catching logger panics and falling back to stderr.
///
/// A broken logging backend degrades observability, never the security
/// decision that produced the event.
pub(crate) fn report(logger: &dyn AuditLogger, event: SecurityEvent) {
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        logger.log_event(&event);
    }));
    if outcome.is_err() {
        eprintln!("scriptbox: audit logger failed; dropped to stderr: {:?}", event.kind);
    }
}
