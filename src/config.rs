//! Sandbox configuration surface.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default wall-clock budget for one script evaluation: 30 seconds.
pub const DEFAULT_TIMEOUT_MILLIS: u64 = 30_000;

/// Default bound on script-triggered re-entry into the evaluator.
pub const DEFAULT_MAX_RECURSION_DEPTH: u32 = 10;

/// Configuration for one sandbox instance.
///
/// Supplied once at sandbox construction and never mutated afterwards; the
/// policy objects built from it are shared read-only across executions.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Wall-clock execution budget in milliseconds. 0 disables the timeout.
    pub timeout_millis: u64,

    /// Dotted-name prefixes of host classes visible to scripts.
    pub whitelist_prefixes: Vec<String>,

    /// Dotted-name prefixes denied to scripts. Takes precedence over the
    /// whitelist.
    pub blacklist_prefixes: Vec<String>,

    /// Max script-triggered re-entries into the evaluator.
    pub max_recursion_depth: u32,

    /// Max script source length (bytes)
    pub max_code_length: usize,

    /// Engine heap limit (bytes, 0 disables)
    pub max_memory: usize,

    /// Engine stack limit (bytes, 0 disables)
    pub max_stack_size: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            timeout_millis: DEFAULT_TIMEOUT_MILLIS,
            whitelist_prefixes: Vec::new(),
            blacklist_prefixes: Vec::new(),
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            max_code_length: 1_000_000, // 1MB
            max_memory: 32 * 1024 * 1024,
            max_stack_size: 1024 * 1024,
        }
    }
}

impl SandboxConfig {
    /// Execution budget as a [`Duration`]. Zero means the timeout is disabled.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_limits() {
        let config = SandboxConfig::default();
        assert_eq!(config.timeout_millis, 30_000);
        assert_eq!(config.max_recursion_depth, 10);
        assert!(config.whitelist_prefixes.is_empty());
        assert!(config.blacklist_prefixes.is_empty());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: SandboxConfig = serde_json::from_str(
            r#"{"timeout_millis": 500, "whitelist_prefixes": ["host.app"]}"#,
        )
        .unwrap();
        assert_eq!(config.timeout_millis, 500);
        assert_eq!(config.whitelist_prefixes, vec!["host.app".to_string()]);
        assert_eq!(config.max_recursion_depth, DEFAULT_MAX_RECURSION_DEPTH);
    }
}
