//! # scriptbox — an embeddable JavaScript security sandbox
//!
//! `scriptbox` guards an embedded QuickJS engine running untrusted,
//! user-supplied automation scripts (e.g. content-extraction rules) inside a
//! host application:
//!
//! - **Default-deny host access**: scripts resolve host classes by dotted
//!   name through a whitelist/blacklist [`ClassAccessPolicy`]; the blacklist
//!   always wins and unknown names are denied.
//! - **Instance filtering**: live host objects pass a [`RuntimeObjectFilter`]
//!   type check before entering script scope, independent of any class name.
//! - **Execution budget**: a wall-clock [`guard::ExecutionGuard`] polled from
//!   the engine's dispatch loop interrupts runaway scripts without
//!   cooperation from the script; host-side cancellation outranks the
//!   timeout.
//! - **Bounded re-entrancy**: a [`guard::RecursionGuard`] caps
//!   script-triggered re-entry into the evaluator.
//!
//! A failed script never crashes the host: every failure funnels through
//! guard teardown and surfaces as a structured [`SandboxError`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use scriptbox::{QuickJsSandbox, SandboxConfig, ScriptRequest, ScriptSandbox};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = SandboxConfig {
//!         whitelist_prefixes: vec!["host.app".into()],
//!         blacklist_prefixes: vec!["host.app.db".into()],
//!         ..SandboxConfig::default()
//!     };
//!     let sandbox = QuickJsSandbox::new(config);
//!     let outcome = sandbox
//!         .execute(ScriptRequest::new("1 + 1"))
//!         .await
//!         .unwrap();
//!     println!("{}", outcome.value);
//! }
//! ```
//!
//! # Feature Flags
//!
//! | Flag | Description |
//! |------|-------------|
//! | `quickjs` | Bundles the QuickJS evaluator and the async facade (default) |
//!
//! Without `quickjs` the crate is the engine-agnostic policy layer only.

pub mod audit;
pub mod config;
pub mod context;
pub mod error;
pub mod guard;
pub mod policy;

#[cfg(feature = "quickjs")]
pub mod engine;
#[cfg(feature = "quickjs")]
pub mod runner;

// Host classes are written against engine types; embedders use the same
// engine version this crate was built with.
#[cfg(feature = "quickjs")]
pub use rquickjs;

pub use audit::{
    AuditLogger, DenialReason, EventSeverity, SecurityEvent, SecurityEventKind, TracingAuditLogger,
};
pub use config::{SandboxConfig, DEFAULT_MAX_RECURSION_DEPTH, DEFAULT_TIMEOUT_MILLIS};
pub use context::{ExecutionState, SandboxContext};
pub use error::SandboxError;
pub use guard::{CancellationSignal, ExecutionGuard, Interrupt, RecursionGuard};
pub use policy::{ClassAccessPolicy, PrefixMatcher, RuntimeObjectFilter};

#[cfg(feature = "quickjs")]
pub use engine::{Evaluator, HostClass, HostGate, HostRegistry};
#[cfg(feature = "quickjs")]
pub use runner::{QuickJsSandbox, SandboxStats, ScriptOutcome, ScriptRequest, ScriptSandbox};
