//! Async embedding facade over the sandboxed evaluator.
//!
//! One fresh engine per execution on a blocking thread; executions share the
//! immutable policy objects and host registry. This is the surface the
//! embedding application (e.g. a catalog browser running extraction rules)
//! holds on to.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value as JsonValue;
use tokio::sync::RwLock;

use crate::config::SandboxConfig;
use crate::engine::{Evaluator, HostRegistry};
use crate::error::SandboxError;
use crate::guard::CancellationSignal;
use crate::policy::{ClassAccessPolicy, RuntimeObjectFilter};

/// One script evaluation request.
#[derive(Debug, Clone)]
pub struct ScriptRequest {
    /// Script source
    pub source: String,

    /// Values bound as globals before evaluation
    pub bindings: HashMap<String, JsonValue>,

    /// Per-request override of the configured budget
    pub timeout: Option<Duration>,

    /// Host-side cancellation handle
    pub cancellation: Option<CancellationSignal>,
}

impl ScriptRequest {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            bindings: HashMap::new(),
            timeout: None,
            cancellation: None,
        }
    }

    pub fn with_binding(mut self, name: impl Into<String>, value: JsonValue) -> Self {
        self.bindings.insert(name.into(), value);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancellation(mut self, signal: CancellationSignal) -> Self {
        self.cancellation = Some(signal);
        self
    }
}

/// Result of a successful evaluation.
#[derive(Debug, Clone)]
pub struct ScriptOutcome {
    /// Completion value of the script
    pub value: JsonValue,

    /// Lines captured from the script's `console`
    pub console: Vec<String>,

    /// Wall-clock execution time
    pub elapsed: Duration,
}

/// Running counters across executions.
#[derive(Debug, Clone, Default)]
pub struct SandboxStats {
    pub total_executions: u64,
    pub successful_executions: u64,
    pub failed_executions: u64,
    pub avg_execution_time: Duration,
}

/// Script execution interface for the embedding application.
///
/// Other engines can be plugged in behind this seam; the crate ships the
/// QuickJS implementation.
#[async_trait::async_trait]
pub trait ScriptSandbox: Send + Sync {
    /// Run one script to completion or structured failure.
    async fn execute(&self, request: ScriptRequest) -> Result<ScriptOutcome, SandboxError>;

    /// Resource usage counters.
    async fn stats(&self) -> SandboxStats;
}

/// QuickJS-backed [`ScriptSandbox`].
pub struct QuickJsSandbox {
    config: SandboxConfig,
    policy: Arc<ClassAccessPolicy>,
    objects: Arc<RuntimeObjectFilter>,
    registry: Arc<HostRegistry>,
    stats: Arc<RwLock<SandboxStats>>,
}

impl QuickJsSandbox {
    /// A sandbox with the policy built from `config` and the default
    /// protected-type registry.
    pub fn new(config: SandboxConfig) -> Self {
        let policy = Arc::new(ClassAccessPolicy::from_config(&config));
        Self {
            config,
            policy,
            objects: Arc::new(RuntimeObjectFilter::with_defaults()),
            registry: Arc::new(HostRegistry::new()),
            stats: Arc::new(RwLock::new(SandboxStats::default())),
        }
    }

    /// Replace the host class registry.
    pub fn with_registry(mut self, registry: HostRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Replace the object filter.
    pub fn with_object_filter(mut self, filter: RuntimeObjectFilter) -> Self {
        self.objects = Arc::new(filter);
        self
    }

    /// Replace the class access policy.
    pub fn with_policy(mut self, policy: ClassAccessPolicy) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    async fn update_stats(&self, succeeded: bool, elapsed: Duration) {
        let mut stats = self.stats.write().await;
        stats.total_executions += 1;
        if succeeded {
            stats.successful_executions += 1;
        } else {
            stats.failed_executions += 1;
        }
        if stats.total_executions == 1 {
            stats.avg_execution_time = elapsed;
        } else {
            let total_ns = stats.avg_execution_time.as_nanos() as u64;
            let new_avg = (total_ns * (stats.total_executions - 1) + elapsed.as_nanos() as u64)
                / stats.total_executions;
            stats.avg_execution_time = Duration::from_nanos(new_avg);
        }
    }
}

#[async_trait::async_trait]
impl ScriptSandbox for QuickJsSandbox {
    async fn execute(&self, request: ScriptRequest) -> Result<ScriptOutcome, SandboxError> {
        if request.source.len() > self.config.max_code_length {
            return Err(SandboxError::CodeTooLarge {
                max: self.config.max_code_length,
                actual: request.source.len(),
            });
        }

        let mut config = self.config.clone();
        if let Some(timeout) = request.timeout {
            config.timeout_millis = timeout.as_millis() as u64;
        }
        let policy = Arc::clone(&self.policy);
        let objects = Arc::clone(&self.objects);
        let registry = Arc::clone(&self.registry);

        let started = Instant::now();
        let result = tokio::task::spawn_blocking(move || {
            let evaluator =
                Evaluator::new(&config, policy, objects, registry, request.cancellation)?;
            let value = evaluator.eval_with_bindings(&request.source, &request.bindings)?;
            Ok::<_, SandboxError>((value, evaluator.take_console()))
        })
        .await
        .map_err(|e| SandboxError::InternalError(format!("sandbox worker failed: {e}")))?;

        let elapsed = started.elapsed();
        self.update_stats(result.is_ok(), elapsed).await;
        result.map(|(value, console)| ScriptOutcome {
            value,
            console,
            elapsed,
        })
    }

    async fn stats(&self) -> SandboxStats {
        self.stats.read().await.clone()
    }
}
