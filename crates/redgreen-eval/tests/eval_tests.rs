//! Integration tests for the sandboxed interpreter.
//!
//! Tests key evaluator features:
//! - arithmetic, coercion and comparison
//! - strings, template literals, arrays and objects
//! - closures, `this`, `new`, hoisting
//! - control flow and exceptions
//! - the allow-listed standard library
//! - gas and call-depth budgets

use redgreen_eval::{compile_and_extract, compile_and_extract_with_config, EvalError, SandboxConfig, Value};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// Wrap `body` in `function main() { ... }`, call it and return the result.
fn run(body: &str) -> Value {
    try_run(body).unwrap_or_else(|e| panic!("evaluation failed: {e}"))
}

fn try_run(body: &str) -> Result<Value, EvalError> {
    let source = format!("function main() {{\n{body}\n}}");
    let mut f = compile_and_extract(&source, "main")
        .unwrap_or_else(|| panic!("source did not compile:\n{source}"));
    f.call(vec![])
}

/// Run `body` and return the message of the error it raises.
fn run_err(body: &str) -> String {
    match try_run(body) {
        Ok(v) => panic!("expected an error, got {}", v.to_json_string()),
        Err(e) => e.message(),
    }
}

fn num(n: f64) -> Value {
    Value::Number(n)
}

fn s(v: &str) -> Value {
    Value::string(v)
}

fn b(v: bool) -> Value {
    Value::Bool(v)
}

fn json(v: &Value) -> String {
    v.to_json_string()
}

// ══════════════════════════════════════════════════════════════════════════════
// Operators
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_arithmetic_and_precedence() {
    assert_eq!(run("return 1 + 2 * 3 - 4 / 2;"), num(5.0));
    assert_eq!(run("return 2 ** 3 ** 2;"), num(512.0));
    assert_eq!(run("return 7 % 3;"), num(1.0));
    assert_eq!(run("return -7 % 3;"), num(-1.0));
    assert_eq!(run("return 1 / 0;"), num(f64::INFINITY));
}

#[test]
fn test_string_coercion() {
    assert_eq!(run("return '5' + 1;"), s("51"));
    assert_eq!(run("return '5' - 1;"), num(4.0));
    assert_eq!(run("return '3' * '4';"), num(12.0));
    assert_eq!(run("return [1, 2] + '';"), s("1,2"));
    assert_eq!(run("return 'x' + null + undefined;"), s("xnullundefined"));
}

#[test]
fn test_equality_operators() {
    assert_eq!(run("return 1 == '1';"), b(true));
    assert_eq!(run("return 1 === '1';"), b(false));
    assert_eq!(run("return null == undefined;"), b(true));
    assert_eq!(run("return null === undefined;"), b(false));
    assert_eq!(run("return NaN === NaN;"), b(false));
    assert_eq!(run("var a = [1]; return a === a;"), b(true));
    assert_eq!(run("return [1] === [1];"), b(false));
}

#[test]
fn test_logical_operators_short_circuit() {
    assert_eq!(run("return 0 || 'fallback';"), s("fallback"));
    assert_eq!(run("return 0 ?? 'fallback';"), num(0.0));
    assert_eq!(run("return null ?? 'fallback';"), s("fallback"));
    assert_eq!(run("var hit = false; false && (hit = true); return hit;"), b(false));
}

#[test]
fn test_typeof() {
    assert_eq!(
        json(&run(
            "return [typeof 1, typeof 's', typeof true, typeof undefined, typeof null, typeof [], typeof {}, typeof function(){}, typeof missing];"
        )),
        r#"["number","string","boolean","undefined","object","object","object","function","undefined"]"#
    );
}

#[test]
fn test_update_and_compound_assignment() {
    assert_eq!(run("var i = 1; var a = i++; var b = ++i; return [a, b, i];"), Value::array(vec![num(1.0), num(3.0), num(3.0)]));
    assert_eq!(run("var x = 10; x -= 3; x *= 2; x **= 2; return x;"), num(196.0));
}

#[test]
fn test_optional_chaining() {
    assert_eq!(run("var o = null; return o?.a.b.c;"), Value::Undefined);
    assert_eq!(run("var o = { a: { b: 2 } }; return o?.a?.b;"), num(2.0));
    assert_eq!(run("var o = {}; return o.f?.();"), Value::Undefined);
}

#[test]
fn test_conditional_expression() {
    assert_eq!(run("var x = 5; return x > 3 ? 'big' : 'small';"), s("big"));
}

// ══════════════════════════════════════════════════════════════════════════════
// Strings, arrays, objects
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_template_literals() {
    assert_eq!(run("var n = 3; return `n=${n}, twice=${n * 2}`;"), s("n=3, twice=6"));
}

#[test]
fn test_string_methods() {
    assert_eq!(run("return 'Mission Control'.toUpperCase();"), s("MISSION CONTROL"));
    assert_eq!(run("return '  pad '.trim().padStart(5, '*');"), s("**pad"));
    assert_eq!(run("return 'a-b-c'.split('-').join('+');"), s("a+b+c"));
    assert_eq!(run("return 'abc'.length;"), num(3.0));
    assert_eq!(run("return 'abc'[1];"), s("b"));
}

#[test]
fn test_array_methods() {
    assert_eq!(
        json(&run("return [3, 1, 2].map(x => x * 2).filter(x => x > 2);")),
        "[6,4]"
    );
    assert_eq!(run("return [1, 2, 3, 4].reduce((a, b) => a + b, 0);"), num(10.0));
    assert_eq!(json(&run("return [10, 9, 1].sort();")), "[1,10,9]");
    assert_eq!(json(&run("return [10, 9, 1].sort((a, b) => a - b);")), "[1,9,10]");
    assert_eq!(run("return [1, 2, 3].includes(2);"), b(true));
    assert_eq!(run("return [5, 12, 8].find(x => x > 6);"), num(12.0));
    assert_eq!(json(&run("return [1, [2, [3]]].flat();")), "[1,2,[3]]");
}

#[test]
fn test_array_mutation_is_shared() {
    assert_eq!(
        json(&run("var a = [1]; var b = a; b.push(2); return a;")),
        "[1,2]"
    );
    assert_eq!(run("var a = [1, 2, 3]; a.length = 1; return a.length;"), num(1.0));
}

#[test]
fn test_spread() {
    assert_eq!(run("return Math.max(...[3, 9, 2]);"), num(9.0));
    assert_eq!(json(&run("var a = [1, 2]; return [0, ...a, 3];")), "[0,1,2,3]");
    assert_eq!(
        json(&run("var o = { a: 1 }; return { ...o, b: 2 };")),
        r#"{"a":1,"b":2}"#
    );
}

#[test]
fn test_object_literals_and_keys() {
    assert_eq!(
        json(&run("var x = 1; var o = { x, y: 2 }; o.z = 3; return Object.keys(o);")),
        r#"["x","y","z"]"#
    );
    assert_eq!(run("var o = { n: 2, double() { return this.n * 2; } }; return o.double();"), num(4.0));
    assert_eq!(run("return 'a' in { a: undefined };"), b(true));
}

#[test]
fn test_for_in_and_for_of() {
    assert_eq!(
        run("var out = ''; for (var k in { a: 1, b: 2 }) out += k; return out;"),
        s("ab")
    );
    assert_eq!(
        run("var sum = 0; for (const v of [1, 2, 3]) sum += v; return sum;"),
        num(6.0)
    );
}

#[test]
fn test_json_round_trip() {
    assert_eq!(
        run("return JSON.stringify(JSON.parse('{\"a\":[1,2,{\"b\":null}]}'));"),
        s(r#"{"a":[1,2,{"b":null}]}"#)
    );
    assert_eq!(run("return JSON.stringify([NaN, undefined]);"), s("[null,null]"));
}

#[test]
fn test_json_parse_keeps_key_order() {
    assert_eq!(
        run("return Object.keys(JSON.parse('{\"b\":1,\"a\":2}')).join(',');"),
        s("b,a")
    );
    assert_eq!(
        run("return JSON.stringify(JSON.parse('{\"z\":1,\"a\":2}'));"),
        s(r#"{"z":1,"a":2}"#)
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Functions
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_closures_capture_bindings() {
    assert_eq!(
        run(
            "function counter() { var c = 0; return function() { c += 1; return c; }; }
             var next = counter(); next(); next(); return next();"
        ),
        num(3.0)
    );
}

#[test]
fn test_let_in_for_loop_is_per_iteration() {
    assert_eq!(
        json(&run(
            "var fs = []; for (let i = 0; i < 3; i++) fs.push(() => i); return fs.map(f => f());"
        )),
        "[0,1,2]"
    );
}

#[test]
fn test_function_hoisting() {
    assert_eq!(run("return later(); function later() { return 'hoisted'; }"), s("hoisted"));
    assert_eq!(run("var before = v; var v = 1; return before;"), Value::Undefined);
}

#[test]
fn test_default_and_rest_parameters() {
    assert_eq!(run("function f(a, b = 10) { return a + b; } return f(1);"), num(11.0));
    assert_eq!(
        run("function f(first, ...rest) { return rest.length; } return f(1, 2, 3);"),
        num(2.0)
    );
}

#[test]
fn test_new_and_this() {
    assert_eq!(
        run("function Ship(name) { this.name = name; } var s = new Ship('Ares'); return s.name;"),
        s("Ares")
    );
}

#[test]
fn test_const_reassignment_is_type_error() {
    assert_eq!(run_err("const x = 1; x = 2;"), "Assignment to constant variable.");
}

#[test]
fn test_unbound_name_is_reference_error() {
    assert_eq!(run_err("return nope + 1;"), "nope is not defined");
}

#[test]
fn test_calling_non_function_is_type_error() {
    assert_eq!(run_err("var x = 3; return x();"), "x is not a function");
}

// ══════════════════════════════════════════════════════════════════════════════
// Control flow and exceptions
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_switch_fall_through() {
    assert_eq!(
        run("var out = ''; switch (2) { case 1: out += 'a'; case 2: out += 'b'; case 3: out += 'c'; break; default: out += 'd'; } return out;"),
        s("bc")
    );
}

#[test]
fn test_break_and_continue() {
    assert_eq!(
        run("var n = 0; for (var i = 0; i < 10; i++) { if (i % 2) continue; if (i > 6) break; n += i; } return n;"),
        num(12.0)
    );
    assert_eq!(run("var i = 0; do { i++; } while (i < 5); return i;"), num(5.0));
}

#[test]
fn test_try_catch_finally() {
    assert_eq!(
        run("var log = []; try { throw new Error('boom'); } catch (e) { log.push(e.message); } finally { log.push('done'); } return log.join(',');"),
        s("boom,done")
    );
    assert_eq!(
        run("try { null.x; } catch (e) { return e.name; }"),
        s("TypeError")
    );
}

#[test]
fn test_instanceof_builtin_constructors() {
    assert_eq!(
        run("try { null.x; } catch (e) { return [e instanceof TypeError, e instanceof Error, e instanceof RangeError]; }"),
        run("return [true, true, false];")
    );
    assert_eq!(run("return [1] instanceof Array && {} instanceof Object;"), b(true));
    assert_eq!(run("return 'text' instanceof Object;"), b(false));
    assert_eq!(run("return new RangeError('x') instanceof RangeError;"), b(true));
    assert!(run_err("return {} instanceof 1;").contains("not callable"));
}

#[test]
fn test_thrown_values() {
    assert_eq!(run_err("throw 'plain string';"), "plain string");
    assert_eq!(run_err("throw { code: 1 };"), "[object Object]");
    assert_eq!(run_err("throw new RangeError('too far');"), "too far");
}

// ══════════════════════════════════════════════════════════════════════════════
// Standard library
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_math() {
    assert_eq!(run("return Math.max(0, 30 - 100);"), num(0.0));
    assert_eq!(run("return Math.round(2.5);"), num(3.0));
    assert_eq!(run("return Math.round(-2.5);"), num(-2.0));
    assert_eq!(run("return Math.floor(-1.5);"), num(-2.0));
    assert_eq!(run("return Math.abs(-4);"), num(4.0));
    assert_eq!(run("var r = Math.random(); return r >= 0 && r < 1;"), b(true));
}

#[test]
fn test_number_formatting() {
    assert_eq!(run("return (1.005).toFixed(2);"), s("1.00"));
    assert_eq!(run("return (2.5).toFixed(0);"), s("3"));
    assert_eq!(run("return (255).toString(16);"), s("ff"));
    assert_eq!(run("return String(0.1 + 0.2);"), s("0.30000000000000004"));
    assert_eq!(run("return parseInt('42px');"), num(42.0));
    assert_eq!(run("return Number('');"), num(0.0));
    assert_eq!(run("return Number.isInteger(5.0);"), b(true));
}

#[test]
fn test_console_does_not_affect_results() {
    assert_eq!(run("console.log('debug', 1); return 2;"), num(2.0));
}

#[test]
fn test_host_globals_are_not_defined() {
    for name in ["window", "document", "globalThis", "require", "process", "fetch", "eval"] {
        assert_eq!(
            run(&format!("return typeof {name};")),
            s("undefined"),
            "{name} should not be reachable"
        );
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Budgets
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_infinite_loop_exhausts_gas() {
    let err = try_run("while (true) {}").unwrap_err();
    assert!(matches!(err, EvalError::GasExhausted));
    assert_eq!(err.message(), "Execution budget exhausted (possible infinite loop)");
}

#[test]
fn test_gas_exhaustion_is_not_catchable() {
    let err = try_run("try { for (;;) {} } catch (e) { return 'caught'; }").unwrap_err();
    assert!(matches!(err, EvalError::GasExhausted));
}

#[test]
fn test_runaway_recursion_is_range_error() {
    let err = try_run("function down(n) { return down(n + 1); } return down(0);").unwrap_err();
    assert!(matches!(err, EvalError::RangeError(_)));
    assert_eq!(err.message(), "Maximum call stack size exceeded");
}

#[test]
fn test_recursion_error_is_catchable() {
    assert_eq!(
        run("function down() { return down(); } try { down(); } catch (e) { return e.name; }"),
        s("RangeError")
    );
}

#[test]
fn test_huge_allocation_is_range_error() {
    let msg = run_err("return 'x'.repeat(1e12);");
    assert!(msg.contains("Invalid"), "unexpected message: {msg}");
}

#[test]
fn test_custom_budget() {
    let config = SandboxConfig::default().with_gas_limit(500);
    let mut f = compile_and_extract_with_config(
        "function f(n) { var s = 0; for (var i = 0; i < n; i++) s += i; return s; }",
        "f",
        config,
    )
    .unwrap();
    assert_eq!(f.call(vec![num(2.0)]).unwrap(), num(1.0));
    assert!(matches!(f.call(vec![num(1000.0)]), Err(EvalError::GasExhausted)));
}

#[test]
fn test_shallow_call_depth() {
    let config = SandboxConfig::default().with_max_call_depth(4);
    let mut f = compile_and_extract_with_config(
        "function f(n) { return n === 0 ? 0 : 1 + f(n - 1); }",
        "f",
        config,
    )
    .unwrap();
    assert_eq!(f.call(vec![num(2.0)]).unwrap(), num(2.0));
    assert!(matches!(f.call(vec![num(10.0)]), Err(EvalError::RangeError(_))));
}

#[test]
fn test_shallow_eval_depth() {
    let config = SandboxConfig::default().with_max_eval_depth(40);
    let mut f = compile_and_extract_with_config(
        "function f(n) { return n === 0 ? 0 : 1 + f(n - 1); }",
        "f",
        config,
    )
    .unwrap();
    assert_eq!(f.call(vec![num(2.0)]).unwrap(), num(2.0));
    let err = f.call(vec![num(100.0)]).unwrap_err();
    assert_eq!(err.message(), "Maximum call stack size exceeded");
    // The budget resets between calls.
    assert_eq!(f.call(vec![num(3.0)]).unwrap(), num(3.0));
}

#[test]
fn test_nested_expressions_count_toward_stack_depth() {
    let parens = format!("{}n + 1{}", "(".repeat(20), ")".repeat(20));
    let body = format!("function down(n) {{ return [[[[[down({parens})]]]]]; }} try {{ down(0); }} catch (e) {{ return e.name; }}");
    assert_eq!(run(&body), s("RangeError"));
}

#[test]
fn test_allocation_budget() {
    let config = SandboxConfig::default().with_max_allocation(1_000);
    let mut f = compile_and_extract_with_config(
        "function f(n) { return new Array(n).length; }",
        "f",
        config,
    )
    .unwrap();
    assert_eq!(f.call(vec![num(500.0)]).unwrap(), num(500.0));
    let err = f.call(vec![num(5_000.0)]).unwrap_err();
    assert!(matches!(err, EvalError::RangeError(_)));
    assert_eq!(err.message(), "Memory budget exceeded");
}

#[test]
fn test_string_doubling_hits_memory_budget() {
    let msg = run_err("var s = 'ab'; var keep = []; for (var i = 0; i < 40; i++) { s += s; keep.push(s); } return keep.length;");
    assert!(msg == "Memory budget exceeded" || msg.contains("Invalid"), "unexpected message: {msg}");
}
