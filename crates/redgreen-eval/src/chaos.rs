//! Chaos testing: call the learner's function with one hostile input and
//! report whether it survives.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::config::SandboxConfig;
use crate::sandbox::compile_and_extract_with_config;
use crate::test_runner::TestVerdict;
use crate::value::{PropertyMap, Value};

/// Test id carried by every chaos verdict.
pub const CHAOS_TEST_ID: &str = "chaos-bot";

/// Expected outcome of every chaos run.
pub const CHAOS_EXPECTED: &str = "no-crash";

/// The hostile inputs, one of which is picked per run.
pub fn chaos_inputs() -> Vec<Value> {
    vec![
        Value::Null,
        Value::Undefined,
        Value::string(""),
        Value::Number(-1.0),
        Value::Number(f64::INFINITY),
        Value::Number(f64::NAN),
        Value::array(Vec::new()),
        Value::object(PropertyMap::new()),
        Value::Number(0.0),
        Value::Number(-999_999.0),
        Value::Number(999_999.0),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChaosOutcome {
    Survived,
    FunctionNotFound,
    Crashed,
}

impl ChaosOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Survived => "survived",
            Self::FunctionNotFound => "function-not-found",
            Self::Crashed => "crashed",
        }
    }
}

/// Result of one chaos run. Serializes like a [`TestVerdict`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChaosVerdict {
    pub test_id: String,
    pub passed: bool,
    pub expected: String,
    pub received: ChaosOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The input the function was called with.
    #[serde(skip)]
    pub input: Value,
}

impl ChaosVerdict {
    fn new(outcome: ChaosOutcome, error: Option<String>, input: Value) -> Self {
        Self {
            test_id: CHAOS_TEST_ID.to_string(),
            passed: outcome == ChaosOutcome::Survived,
            expected: CHAOS_EXPECTED.to_string(),
            received: outcome,
            error,
            input,
        }
    }
}

impl From<ChaosVerdict> for TestVerdict {
    fn from(chaos: ChaosVerdict) -> Self {
        TestVerdict {
            test_id: chaos.test_id,
            passed: chaos.passed,
            expected: Value::String(chaos.expected),
            received: Value::string(chaos.received.as_str()),
            error: chaos.error,
        }
    }
}

/// Call `function_name` with a randomly chosen hostile input.
pub fn run_chaos_test(source: &str, function_name: &str) -> ChaosVerdict {
    run_chaos_test_with_rng(source, function_name, &mut rand::thread_rng())
}

/// [`run_chaos_test`] with a caller-supplied random source.
pub fn run_chaos_test_with_rng<R: Rng + ?Sized>(
    source: &str,
    function_name: &str,
    rng: &mut R,
) -> ChaosVerdict {
    let input = chaos_inputs()
        .choose(rng)
        .cloned()
        .unwrap_or_default();
    debug!(input = %input.to_json_string(), "chaos input selected");
    run_chaos_test_with_input(source, function_name, input)
}

/// [`run_chaos_test`] with a fixed input.
pub fn run_chaos_test_with_input(source: &str, function_name: &str, input: Value) -> ChaosVerdict {
    run_chaos_test_with_config(source, function_name, input, SandboxConfig::default())
}

pub fn run_chaos_test_with_config(
    source: &str,
    function_name: &str,
    input: Value,
    config: SandboxConfig,
) -> ChaosVerdict {
    let Some(mut function) = compile_and_extract_with_config(source, function_name, config) else {
        return ChaosVerdict::new(
            ChaosOutcome::FunctionNotFound,
            Some("Function not found".into()),
            input,
        );
    };
    // The return value is ignored; only a throw counts.
    match function.call(vec![input.clone()]) {
        Ok(_) => ChaosVerdict::new(ChaosOutcome::Survived, None, input),
        Err(err) => {
            let error = format!(
                "Chaos Bot crashed your code with input: {} - {}",
                input.to_json_string(),
                err.message()
            );
            ChaosVerdict::new(ChaosOutcome::Crashed, Some(error), input)
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn test_corpus_has_eleven_inputs() {
        assert_eq!(chaos_inputs().len(), 11);
    }

    #[test]
    fn test_crash_on_null() {
        let v = run_chaos_test_with_input(
            "function f(x){return x.toUpperCase();}",
            "f",
            Value::Null,
        );
        assert!(!v.passed);
        assert_eq!(v.received, ChaosOutcome::Crashed);
        let error = v.error.unwrap();
        assert!(error.starts_with("Chaos Bot crashed your code with input: null - "));
        assert!(error.contains("null"));
    }

    #[test]
    fn test_undefined_input_renders_as_undefined() {
        let v = run_chaos_test_with_input("function f(x){return x.length;}", "f", Value::Undefined);
        assert_eq!(
            v.error.as_deref(),
            Some("Chaos Bot crashed your code with input: undefined - Cannot read properties of undefined (reading 'length')")
        );
    }

    #[test]
    fn test_survives_and_ignores_return_value() {
        let v = run_chaos_test_with_input("function f(x){return NaN;}", "f", Value::Number(0.0));
        assert!(v.passed);
        assert_eq!(v.received, ChaosOutcome::Survived);
        assert_eq!(v.error, None);
    }

    #[test]
    fn test_function_not_found() {
        let v = run_chaos_test("function g(){}", "f");
        assert!(!v.passed);
        assert_eq!(v.received, ChaosOutcome::FunctionNotFound);
        assert_eq!(v.error.as_deref(), Some("Function not found"));
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let src = "function f(x){ return 1; }";
        let a = run_chaos_test_with_rng(src, "f", &mut StdRng::seed_from_u64(7));
        let b = run_chaos_test_with_rng(src, "f", &mut StdRng::seed_from_u64(7));
        assert_eq!(a.input.to_json_string(), b.input.to_json_string());
        assert!(a.passed);
    }

    #[test]
    fn test_serialized_shape() {
        let v = run_chaos_test_with_input("function f(x){ throw new Error('x'); }", "f", Value::Number(-1.0));
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["testId"], "chaos-bot");
        assert_eq!(json["expected"], "no-crash");
        assert_eq!(json["received"], "crashed");
        assert_eq!(json["error"], "Chaos Bot crashed your code with input: -1 - x");
        assert!(json.get("input").is_none());
    }

    #[test]
    fn test_converts_to_test_verdict() {
        let v: TestVerdict = run_chaos_test_with_input("function f(){}", "f", Value::Null).into();
        assert_eq!(v.received, Value::string("survived"));
        assert!(v.passed);
    }
}
