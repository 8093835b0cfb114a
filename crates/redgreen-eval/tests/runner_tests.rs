//! Runner tests: verdicts for the public `run_all`, `estimate` and
//! `run_chaos_test` operations.

use redgreen_eval::chaos::ChaosOutcome;
use redgreen_eval::{
    chaos_inputs, compile_and_extract, estimate, run_all, run_all_with_config, run_chaos_test,
    run_chaos_test_with_input, SandboxConfig, TestCase, TestRunSummary, Value,
};

fn case(id: &str, invocation: &str, expected: Value) -> TestCase {
    TestCase {
        id: id.into(),
        name: format!("case {id}"),
        invocation_expression: invocation.into(),
        expected_output: expected,
        description: String::new(),
        is_edge_case: false,
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Scenarios
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_wrong_answer_is_a_plain_mismatch() {
    let verdicts = run_all("function f(x){return x;}", &[case("1", "f(5)", Value::Number(50.0))]);
    let v = &verdicts[0];
    assert!(!v.passed);
    assert_eq!(v.expected, Value::Number(50.0));
    assert_eq!(v.received, Value::Number(5.0));
    assert_eq!(v.error, None);
}

#[test]
fn test_correct_answer_passes() {
    let verdicts = run_all("function f(x){return x*10;}", &[case("1", "f(5)", Value::Number(50.0))]);
    assert!(verdicts[0].passed);
}

#[test]
fn test_missing_function_fails_every_case() {
    let tests = [
        case("a", "f(1)", Value::Number(1.0)),
        case("b", "f(2)", Value::Number(2.0)),
    ];
    let verdicts = run_all("function g(x){return x;}", &tests);
    assert_eq!(verdicts.len(), 2);
    for (v, t) in verdicts.iter().zip(&tests) {
        assert_eq!(v.test_id, t.id);
        assert!(!v.passed);
        assert!(v.error.as_deref().unwrap().contains("'f'"));
    }
}

#[test]
fn test_chaos_null_crashes_unguarded_code() {
    let v = run_chaos_test_with_input("function f(x){return x.toUpperCase();}", "f", Value::Null);
    assert!(!v.passed);
    assert_eq!(v.received, ChaosOutcome::Crashed);
    assert!(v.error.unwrap().contains("null"));
}

#[test]
fn test_guarded_division_and_its_coverage() {
    let source = "function f(a,b){if(b===0) return 0; return a/b;}";
    let verdicts = run_all(source, &[case("1", "f(100, 0)", Value::Number(0.0))]);
    assert!(verdicts[0].passed);
    let report = estimate(source, 1, 1);
    assert_eq!(report.covered_branches, 1);
    assert_eq!(report.percentage, 100);
}

// ══════════════════════════════════════════════════════════════════════════════
// Faults never escape as panics
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_infinite_loop_is_a_failed_verdict() {
    let verdicts = run_all(
        "function f(){ while(true){} }",
        &[case("1", "f()", Value::Null)],
    );
    assert!(!verdicts[0].passed);
    assert_eq!(
        verdicts[0].error.as_deref(),
        Some("Execution budget exhausted (possible infinite loop)")
    );
}

#[test]
fn test_runaway_recursion_is_a_range_error_verdict() {
    let verdicts = run_all(
        "function f(n){ return f(n + 1); }",
        &[case("1", "f(0)", Value::Null)],
    );
    assert_eq!(
        verdicts[0].error.as_deref(),
        Some("Maximum call stack size exceeded")
    );
}

#[test]
fn test_deeply_nested_array_is_dropped_safely() {
    let verdicts = run_all(
        "function f(){ var a = []; for (var i = 0; i < 50000; i++) a = [a]; return 1; }",
        &[case("1", "f()", Value::Number(1.0))],
    );
    assert!(verdicts[0].passed);
}

#[test]
fn test_deeply_nested_object_is_returned_and_dropped() {
    let verdicts = run_all(
        "function f(){ var o = null; for (var i = 0; i < 50000; i++) o = { next: o }; return o; }",
        &[case("1", "f()", Value::Null)],
    );
    assert!(!verdicts[0].passed);
    assert_eq!(verdicts[0].error, None);
}

#[test]
fn test_closure_chain_is_dropped_safely() {
    let verdicts = run_all(
        "function f(){ var g = function(){ return 0; };
           for (var i = 0; i < 50000; i++) { let h = g; g = function(){ return h; }; }
           return 1; }",
        &[case("1", "f()", Value::Number(1.0))],
    );
    assert!(verdicts[0].passed);
}

#[test]
fn test_long_flat_expression_does_not_compile() {
    let sum = vec!["1"; 20_000].join(" + ");
    let source = format!("function f(){{ return {sum}; }}");
    assert!(compile_and_extract(&source, "f").is_none());
    let verdicts = run_all(&source, &[case("1", "f()", Value::Number(20000.0))]);
    assert_eq!(
        verdicts[0].error.as_deref(),
        Some("Function 'f' not found or invalid")
    );
}

#[test]
fn test_recursion_through_nested_expressions_is_a_range_error() {
    let parens = format!("{}n + 1{}", "(".repeat(20), ")".repeat(20));
    let source = format!("function f(n){{ return [[[[[f({parens})]]]]]; }}");
    let verdicts = run_all(&source, &[case("1", "f(0)", Value::Null)]);
    assert_eq!(
        verdicts[0].error.as_deref(),
        Some("Maximum call stack size exceeded")
    );
}

#[test]
fn test_allocation_heavy_code_hits_the_memory_budget() {
    let verdicts = run_all(
        "function f(){ var keep = []; for (var i = 0; i < 10; i++) keep.push(new Array(16777216)); return keep.length; }",
        &[case("1", "f()", Value::Number(10.0))],
    );
    assert_eq!(verdicts[0].error.as_deref(), Some("Memory budget exceeded"));

    let verdicts = run_all(
        "function f(){ var s = 'x'; var keep = []; for (var i = 0; i < 200; i++) { s = s + s; keep.push(s); } return 1; }",
        &[case("1", "f()", Value::Number(1.0))],
    );
    assert!(!verdicts[0].passed);
    assert!(verdicts[0].error.is_some());
}

#[test]
fn test_syntax_error_is_not_found_or_invalid() {
    let verdicts = run_all("function f( {", &[case("1", "f()", Value::Null)]);
    assert_eq!(
        verdicts[0].error.as_deref(),
        Some("Function 'f' not found or invalid")
    );
}

#[test]
fn test_each_case_runs_in_a_fresh_sandbox() {
    let source = "var calls = 0; function f(){ calls += 1; return calls; }";
    let tests = [
        case("a", "f()", Value::Number(1.0)),
        case("b", "f()", Value::Number(1.0)),
    ];
    assert!(run_all(source, &tests).iter().all(|v| v.passed));
}

#[test]
fn test_nan_never_matches() {
    let verdicts = run_all("function f(){ return NaN; }", &[case("1", "f()", Value::Number(f64::NAN))]);
    assert!(!verdicts[0].passed);
}

#[test]
fn test_array_does_not_equal_object() {
    let expected: Value = serde_json::from_str(r#"{"0": 1}"#).unwrap();
    let verdicts = run_all("function f(){ return [1]; }", &[case("1", "f()", expected)]);
    assert!(!verdicts[0].passed);
}

#[test]
fn test_objects_compare_structurally() {
    let expected: Value = serde_json::from_str(r#"{"b": [1, {"c": null}], "a": "x"}"#).unwrap();
    let verdicts = run_all(
        "function f(){ return { a: 'x', b: [1, { c: null }] }; }",
        &[case("1", "f()", expected)],
    );
    assert!(verdicts[0].passed);
}

#[test]
fn test_small_budget_config() {
    let config = SandboxConfig::default().with_gas_limit(1_000);
    let verdicts = run_all_with_config(
        "function f(n){ var s = 0; for (var i = 0; i < n; i++) s += i; return s; }",
        &[
            case("small", "f(3)", Value::Number(3.0)),
            case("large", "f(100000)", Value::Number(4999950000.0)),
        ],
        config,
    );
    assert!(verdicts[0].passed);
    assert!(!verdicts[1].passed);
}

#[test]
fn test_summary_display() {
    let verdicts = run_all(
        "function f(x){ return x; }",
        &[case("a", "f(1)", Value::Number(1.0)), case("b", "f(2)", Value::Number(3.0))],
    );
    let summary = TestRunSummary::new(verdicts);
    let text = summary.to_string();
    assert!(text.contains("  ✓ a"));
    assert!(text.contains("  ✗ b: expected 3, received 2"));
    assert!(text.ends_with("1 passed, 1 failed\n"));
}

#[test]
fn test_random_chaos_run_reports_an_outcome() {
    let inputs: Vec<String> = chaos_inputs().iter().map(|v| format!("{v:?}")).collect();
    for _ in 0..20 {
        let v = run_chaos_test("function f(x){ return 1; }", "f");
        assert!(v.passed);
        assert_eq!(v.expected, "no-crash");
        assert!(inputs.contains(&format!("{:?}", v.input)), "unexpected input {:?}", v.input);
    }
}

#[test]
fn test_expected_object_keeps_key_order() {
    let expected: Value = serde_json::from_str(r#"{"z": 1, "a": 2}"#).unwrap();
    assert_eq!(expected.to_json_string(), r#"{"z":1,"a":2}"#);
    let verdicts = run_all("function f(){ return { a: 2, z: 1 }; }", &[case("1", "f()", expected)]);
    assert!(verdicts[0].passed);
}
