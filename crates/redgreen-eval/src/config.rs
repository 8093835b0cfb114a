//! Resource budgets for one sandboxed run.

use serde::{Deserialize, Serialize};

/// Default gas budget: one unit per evaluated expression or statement.
pub const DEFAULT_GAS_LIMIT: u64 = 1_000_000;

/// Default maximum depth of learner function calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 128;

/// Default maximum evaluator recursion: nested expressions and statements
/// across every active call.
pub const DEFAULT_MAX_EVAL_DEPTH: usize = 512;

/// Default cap on array elements and string chars allocated by one call.
pub const DEFAULT_MAX_ALLOCATION: usize = 1 << 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SandboxConfig {
    pub gas_limit: u64,
    pub max_call_depth: usize,
    pub max_eval_depth: usize,
    pub max_allocation: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            gas_limit: DEFAULT_GAS_LIMIT,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_eval_depth: DEFAULT_MAX_EVAL_DEPTH,
            max_allocation: DEFAULT_MAX_ALLOCATION,
        }
    }
}

impl SandboxConfig {
    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    pub fn with_max_eval_depth(mut self, max_eval_depth: usize) -> Self {
        self.max_eval_depth = max_eval_depth;
        self
    }

    pub fn with_max_allocation(mut self, max_allocation: usize) -> Self {
        self.max_allocation = max_allocation;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: SandboxConfig = serde_json::from_str(r#"{"gasLimit": 500}"#).unwrap();
        assert_eq!(config.gas_limit, 500);
        assert_eq!(config.max_call_depth, DEFAULT_MAX_CALL_DEPTH);
        assert_eq!(config.max_eval_depth, DEFAULT_MAX_EVAL_DEPTH);
    }

    #[test]
    fn test_builders() {
        let config = SandboxConfig::default()
            .with_gas_limit(10)
            .with_max_call_depth(4)
            .with_max_allocation(100);
        assert_eq!(
            config,
            SandboxConfig {
                gas_limit: 10,
                max_call_depth: 4,
                max_eval_depth: DEFAULT_MAX_EVAL_DEPTH,
                max_allocation: 100,
            }
        );
    }
}
