//! Learner-authored edge-case tests ("shield tests").

use crate::invocation::parse_invocation;
use crate::test_runner::TestCase;
use crate::value::Value;

impl TestCase {
    /// Build a shield test calling `function_name(input)`.
    ///
    /// `expected_text` is read as JSON when it parses, otherwise taken as a
    /// plain string. `None` when either field is blank.
    pub fn shield(
        id: impl Into<String>,
        function_name: &str,
        input: &str,
        expected_text: &str,
    ) -> Option<TestCase> {
        if input.trim().is_empty() || expected_text.trim().is_empty() {
            return None;
        }
        let expected_output = serde_json::from_str::<Value>(expected_text)
            .unwrap_or_else(|_| Value::string(expected_text));
        Some(TestCase {
            id: id.into(),
            name: format!("Shield Test: {input}"),
            invocation_expression: format!("{function_name}({input})"),
            expected_output,
            description: format!(
                "User test: {function_name}({input}) should return {expected_text}"
            ),
            is_edge_case: true,
        })
    }
}

/// Name of the function a test calls (`"unknown"` when it names none).
pub fn function_name_of(test: &TestCase) -> String {
    parse_invocation(&test.invocation_expression).function_name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_runner::run_all;

    #[test]
    fn test_shield_parses_json_expected() {
        let t = TestCase::shield("user-1", "calculateShields", "100, 120", "0").unwrap();
        assert_eq!(t.name, "Shield Test: 100, 120");
        assert_eq!(t.invocation_expression, "calculateShields(100, 120)");
        assert_eq!(t.expected_output, Value::Number(0.0));
        assert_eq!(
            t.description,
            "User test: calculateShields(100, 120) should return 0"
        );
        assert!(t.is_edge_case);
    }

    #[test]
    fn test_shield_falls_back_to_raw_string() {
        let t = TestCase::shield("user-2", "f", "'a'", "hello world").unwrap();
        assert_eq!(t.expected_output, Value::string("hello world"));
    }

    #[test]
    fn test_blank_fields_are_rejected() {
        assert!(TestCase::shield("u", "f", "  ", "1").is_none());
        assert!(TestCase::shield("u", "f", "1", "").is_none());
    }

    #[test]
    fn test_shield_test_runs() {
        let t = TestCase::shield("user-3", "f", "-5", "0").unwrap();
        let verdicts = run_all("function f(x) { return Math.max(0, x); }", &[t]);
        assert!(verdicts[0].passed);
    }

    #[test]
    fn test_function_name_of() {
        let t = TestCase::shield("u", "calculateThrust", "5", "50").unwrap();
        assert_eq!(function_name_of(&t), "calculateThrust");
    }
}
