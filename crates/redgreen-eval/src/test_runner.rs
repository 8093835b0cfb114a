//! Test runner: executes a level's test cases against learner source.
//!
//! Each test case compiles the source into a fresh sandbox, extracts the
//! function named by the invocation expression, calls it with the parsed
//! arguments and compares the result with the expected value.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::SandboxConfig;
use crate::equality::deep_equal;
use crate::error::EvalError;
use crate::invocation::parse_invocation;
use crate::sandbox::compile_and_extract_with_config;
use crate::value::Value;

/// One test case of a level, or a learner-authored shield test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub id: String,
    pub name: String,
    /// Call expression such as `calculateThrust(5)`.
    #[serde(alias = "code")]
    pub invocation_expression: String,
    #[serde(default)]
    pub expected_output: Value,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "isEdgeCaseTest")]
    pub is_edge_case: bool,
}

/// Outcome of one test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestVerdict {
    pub test_id: String,
    pub passed: bool,
    #[serde(serialize_with = "crate::value::serialize_lossy")]
    pub expected: Value,
    #[serde(serialize_with = "crate::value::serialize_lossy")]
    pub received: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestVerdict {
    fn failed(test: &TestCase, error: String) -> Self {
        Self {
            test_id: test.id.clone(),
            passed: false,
            expected: test.expected_output.clone(),
            received: Value::Undefined,
            error: Some(error),
        }
    }
}

impl std::fmt::Display for TestVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.passed {
            write!(f, "  ✓ {}", self.test_id)
        } else {
            match &self.error {
                Some(error) => write!(f, "  ✗ {}: {error}", self.test_id),
                None => write!(
                    f,
                    "  ✗ {}: expected {}, received {}",
                    self.test_id,
                    self.expected.to_json_string(),
                    self.received.to_json_string()
                ),
            }
        }
    }
}

/// Summary of a test run.
#[derive(Debug, Clone, PartialEq)]
pub struct TestRunSummary {
    pub results: Vec<TestVerdict>,
    pub passed: usize,
    pub failed: usize,
}

impl TestRunSummary {
    pub fn new(results: Vec<TestVerdict>) -> Self {
        let passed = results.iter().filter(|r| r.passed).count();
        let failed = results.len() - passed;
        Self {
            results,
            passed,
            failed,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

impl std::fmt::Display for TestRunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for r in &self.results {
            writeln!(f, "{r}")?;
        }
        writeln!(f, "\n{} passed, {} failed", self.passed, self.failed)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Running
// ══════════════════════════════════════════════════════════════════════════════

/// Run every test case against `source`, in order.
pub fn run_all(source: &str, tests: &[TestCase]) -> Vec<TestVerdict> {
    run_all_with_config(source, tests, SandboxConfig::default())
}

pub fn run_all_with_config(
    source: &str,
    tests: &[TestCase],
    config: SandboxConfig,
) -> Vec<TestVerdict> {
    tests.iter().map(|t| run_test(source, t, config)).collect()
}

/// Run a single test case in a fresh sandbox.
pub fn run_test(source: &str, test: &TestCase, config: SandboxConfig) -> TestVerdict {
    let invocation = parse_invocation(&test.invocation_expression);
    let Some(mut function) =
        compile_and_extract_with_config(source, &invocation.function_name, config)
    else {
        return TestVerdict::failed(
            test,
            format!(
                "Function '{}' not found or invalid",
                invocation.function_name
            ),
        );
    };

    match function.call(invocation.arg_values) {
        Ok(received) => TestVerdict {
            test_id: test.id.clone(),
            passed: deep_equal(&received, &test.expected_output),
            expected: test.expected_output.clone(),
            received,
            error: None,
        },
        Err(err) => {
            if matches!(err, EvalError::GasExhausted) {
                warn!(test_id = %test.id, "execution budget exhausted");
            } else {
                debug!(test_id = %test.id, error = %err, "test invocation threw");
            }
            TestVerdict::failed(test, err.message())
        }
    }
}

/// Whether every verdict passed. True for an empty list.
pub fn all_pass(verdicts: &[TestVerdict]) -> bool {
    verdicts.iter().all(|v| v.passed)
}

/// The verdicts that failed.
pub fn failing(verdicts: &[TestVerdict]) -> Vec<&TestVerdict> {
    verdicts.iter().filter(|v| !v.passed).collect()
}

// ══════════════════════════════════════════════════════════════════════════════
// Reporting
// ══════════════════════════════════════════════════════════════════════════════

/// Human-readable result block for one test.
pub fn format_result(verdict: &TestVerdict, test: &TestCase) -> String {
    if verdict.passed {
        return format!("✓ {}", test.name);
    }
    let mut lines = vec![format!("✗ {}", test.name)];
    match &verdict.error {
        Some(error) => lines.push(format!("  Error: {error}")),
        None => {
            lines.push(format!("  Expected: {}", verdict.expected.to_json_string()));
            lines.push(format!("  Received: {}", verdict.received.to_json_string()));
        }
    }
    lines.join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    Match,
    Mismatch,
    Error,
}

/// Diff shown next to a test result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diff {
    #[serde(rename = "type")]
    pub kind: DiffKind,
    pub message: String,
}

pub fn generate_diff(verdict: &TestVerdict) -> Diff {
    if verdict.passed {
        return Diff {
            kind: DiffKind::Match,
            message: "Values match!".into(),
        };
    }
    match &verdict.error {
        Some(error) => Diff {
            kind: DiffKind::Error,
            message: error.clone(),
        },
        None => Diff {
            kind: DiffKind::Mismatch,
            message: format!(
                "Expected: {}\nReceived: {}",
                verdict.expected.to_json_string(),
                verdict.received.to_json_string()
            ),
        },
    }
}
