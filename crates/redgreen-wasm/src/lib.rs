//! Redgreen test runner as a WASM module for browser environments.
//!
//! Every function takes and returns JSON strings so the host can stay
//! framework-agnostic.
//!
//! # Usage (JavaScript)
//!
//! ```js
//! import init, { run_all, estimate, run_chaos_test } from 'redgreen-wasm';
//!
//! await init();
//!
//! const tests = JSON.stringify([{ id: "1-1", name: "Basic thrust", code: "calculateThrust(5)", expectedOutput: 50 }]);
//! const verdicts = JSON.parse(run_all(code, tests));
//! // [{ testId: "1-1", passed: true, expected: 50, received: 50 }]
//! ```

use redgreen_eval::TestCase;
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Serialize `value`, or report the serialization failure as `{"error": ...}`.
fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| error_json(&format!("Serialization error: {e}")))
}

fn error_json(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

/// Run a level's tests against learner source.
///
/// `tests_json` is an array of test cases:
/// ```json
/// [{ "id": "1-1", "name": "Basic thrust", "code": "calculateThrust(5)", "expectedOutput": 50 }]
/// ```
/// Returns an array of verdicts in the same order:
/// ```json
/// [{ "testId": "1-1", "passed": false, "expected": 50, "received": 5 }]
/// ```
/// Malformed `tests_json` yields `{"error": "Invalid tests JSON: ..."}`.
#[wasm_bindgen]
pub fn run_all(source: &str, tests_json: &str) -> String {
    match serde_json::from_str::<Vec<TestCase>>(tests_json) {
        Ok(tests) => to_json(&redgreen_eval::run_all(source, &tests)),
        Err(e) => error_json(&format!("Invalid tests JSON: {e}")),
    }
}

/// [`run_all`] taking and returning JS values instead of JSON text.
#[wasm_bindgen]
pub fn run_all_value(source: &str, tests: JsValue) -> Result<JsValue, JsError> {
    let tests: Vec<TestCase> = serde_wasm_bindgen::from_value(tests)?;
    let verdicts = redgreen_eval::run_all(source, &tests);
    Ok(serde_wasm_bindgen::to_value(&verdicts)?)
}

/// Estimate coverage. Returns
/// `{"coveredBranches": 1, "totalBranches": 1, "percentage": 100}`.
#[wasm_bindgen]
pub fn estimate(source: &str, passed: usize, total: usize) -> String {
    to_json(&redgreen_eval::estimate(source, passed, total))
}

/// Attack `function_name` with one random hostile input. Returns a verdict
/// with `testId` `"chaos-bot"` and `received` one of `"survived"`,
/// `"function-not-found"` or `"crashed"`.
#[wasm_bindgen]
pub fn run_chaos_test(source: &str, function_name: &str) -> String {
    to_json(&redgreen_eval::run_chaos_test(source, function_name))
}

/// Build a learner shield test calling `function_name(input)`.
///
/// Returns the test case as JSON, ready to append to the tests passed to
/// [`run_all`], or `null` when `input` or `expected` is blank.
#[wasm_bindgen]
pub fn shield_test(id: &str, function_name: &str, input: &str, expected: &str) -> String {
    to_json(&TestCase::shield(id, function_name, input, expected))
}

/// Return the engine version string.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
