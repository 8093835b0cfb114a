//! Facade tests: JSON in, JSON out.

use serde_json::{json, Value as Json};

fn parse(text: &str) -> Json {
    serde_json::from_str(text).expect("facade returned invalid JSON")
}

const THRUST: &str = "function calculateThrust(power) { return power * 10; }";

#[test]
fn test_run_all_round_trip() {
    let tests = json!([
        { "id": "1-1", "name": "Basic thrust", "code": "calculateThrust(5)", "expectedOutput": 50 },
        { "id": "1-2", "name": "Zero", "code": "calculateThrust(0)", "expectedOutput": 1 }
    ]);
    let out = parse(&redgreen_wasm::run_all(THRUST, &tests.to_string()));
    assert_eq!(
        out,
        json!([
            { "testId": "1-1", "passed": true, "expected": 50, "received": 50 },
            { "testId": "1-2", "passed": false, "expected": 1, "received": 0 }
        ])
    );
}

#[test]
fn test_run_all_reports_missing_function() {
    let tests = json!([{ "id": "1", "name": "n", "invocationExpression": "f(1)", "expectedOutput": 1 }]);
    let out = parse(&redgreen_wasm::run_all("", &tests.to_string()));
    assert_eq!(out[0]["error"], "Function 'f' not found or invalid");
    assert_eq!(out[0]["received"], Json::Null);
}

#[test]
fn test_run_all_keeps_every_verdict_when_a_result_is_cyclic() {
    let source = "function f(){ var a = []; a.push(a); return a; }\nfunction g(){ return 2; }";
    let tests = json!([
        { "id": "cyclic", "name": "c", "code": "f()", "expectedOutput": [] },
        { "id": "plain", "name": "p", "code": "g()", "expectedOutput": 2 }
    ]);
    let out = parse(&redgreen_wasm::run_all(source, &tests.to_string()));
    let verdicts = out.as_array().expect("expected one verdict per test");
    assert_eq!(verdicts.len(), 2);
    assert_eq!(verdicts[0]["testId"], "cyclic");
    assert_eq!(verdicts[0]["passed"], false);
    assert!(verdicts[0]["received"].as_str().unwrap().contains("[Circular]"));
    assert_eq!(verdicts[1], json!({ "testId": "plain", "passed": true, "expected": 2, "received": 2 }));
}

#[test]
fn test_run_all_rejects_malformed_tests() {
    let out = parse(&redgreen_wasm::run_all(THRUST, "not json"));
    assert!(out["error"].as_str().unwrap().starts_with("Invalid tests JSON"));
}

#[test]
fn test_estimate() {
    let out = parse(&redgreen_wasm::estimate("function f(a,b){if(b===0) return 0; return a/b;}", 1, 1));
    assert_eq!(out, json!({ "coveredBranches": 1, "totalBranches": 1, "percentage": 100 }));
}

#[test]
fn test_run_chaos_test() {
    let out = parse(&redgreen_wasm::run_chaos_test(THRUST, "calculateThrust"));
    assert_eq!(out["testId"], "chaos-bot");
    assert_eq!(out["expected"], "no-crash");
    assert_eq!(out["received"], "survived");
    assert_eq!(out["passed"], true);

    let out = parse(&redgreen_wasm::run_chaos_test(THRUST, "missing"));
    assert_eq!(out["received"], "function-not-found");
}

#[test]
fn test_shield_test_feeds_run_all() {
    let shield = redgreen_wasm::shield_test("user-1", "calculateThrust", "3", "30");
    let case = parse(&shield);
    assert_eq!(case["invocationExpression"], "calculateThrust(3)");
    assert_eq!(case["isEdgeCase"], true);
    let out = parse(&redgreen_wasm::run_all(THRUST, &format!("[{shield}]")));
    assert_eq!(out[0]["passed"], true);

    assert_eq!(redgreen_wasm::shield_test("u", "f", "", "1"), "null");
}

#[test]
fn test_version() {
    assert_eq!(redgreen_wasm::version(), env!("CARGO_PKG_VERSION"));
}

#[cfg(target_arch = "wasm32")]
mod browser {
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_chaos_uses_browser_randomness() {
        let out = redgreen_wasm::run_chaos_test("function f(x) { return 1; }", "f");
        assert!(out.contains("\"survived\""));
    }
}
