//! The allow-listed globals and the built-in methods of strings, arrays,
//! numbers and objects.
//!
//! Nothing outside this module is reachable from learner code: there is no
//! `globalThis`, no timers, no I/O.

pub mod array;
pub mod global;
pub mod json;
pub mod math;
pub mod number;
pub mod object;
pub mod string;

use crate::env::Env;
use crate::error::{EvalError, EvalResult};
use crate::evaluator::{describe_value, Evaluator};
use crate::value::{NativeFn, Value};

/// Populate a fresh global scope with the allow-list.
pub fn install(global: &Env) {
    global::install(global);
    global.define("Math", math::math_object(), false);
    global.define("JSON", json::json_object(), false);
    global.define("Array", array::array_constructor(), false);
    global.define("Object", object::object_constructor(), false);
}

/// Look `name` up in a method table and wrap it as a function value.
pub(crate) fn lookup_method(table: &[(&'static str, NativeFn)], name: &str) -> Option<Value> {
    table
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(n, call)| Value::native(n, call))
}

/// Attach static members (`Array.isArray`, `Number.EPSILON`) to a function.
pub(crate) fn with_statics(func: Value, statics: Vec<(&'static str, Value)>) -> Value {
    if let Value::Function(f) = &func {
        let mut props = f.props.borrow_mut();
        for (name, value) in statics {
            props.insert(name, value);
        }
    }
    func
}

// ── Argument helpers ─────────────────────────────────────────────────────

pub(crate) fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

pub(crate) fn arg_number(args: &[Value], index: usize) -> f64 {
    args.get(index).map_or(f64::NAN, Value::to_number)
}

/// `ToIntegerOrInfinity`: truncate toward zero, `NaN` becomes 0.
pub(crate) fn to_integer(n: f64) -> f64 {
    if n.is_nan() {
        0.0
    } else {
        n.trunc()
    }
}

/// Resolve a possibly negative relative index against `len`, as `slice`
/// does. A missing argument yields `default`.
pub(crate) fn relative_index(value: Option<&Value>, len: usize, default: usize) -> usize {
    match value {
        None | Some(Value::Undefined) => default,
        Some(v) => {
            let n = to_integer(v.to_number());
            let len_f = len as f64;
            if n < 0.0 {
                (len_f + n).max(0.0) as usize
            } else {
                n.min(len_f) as usize
            }
        }
    }
}

/// The function argument of a higher-order method.
pub(crate) fn callback(args: &[Value], index: usize) -> EvalResult<Value> {
    match args.get(index) {
        Some(f @ Value::Function(_)) => Ok(f.clone()),
        Some(other) => Err(EvalError::type_error(format!(
            "{} is not a function",
            describe_value(other)
        ))),
        None => Err(EvalError::type_error("undefined is not a function")),
    }
}

/// Call a learner callback with `(item, index, receiver)`.
pub(crate) fn call_back(
    ev: &mut Evaluator,
    func: &Value,
    item: Value,
    index: usize,
    receiver: &Value,
) -> EvalResult<Value> {
    ev.call_function(
        func,
        Value::Undefined,
        vec![item, Value::Number(index as f64), receiver.clone()],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_index() {
        assert_eq!(relative_index(None, 5, 0), 0);
        assert_eq!(relative_index(Some(&Value::Number(-2.0)), 5, 0), 3);
        assert_eq!(relative_index(Some(&Value::Number(-9.0)), 5, 0), 0);
        assert_eq!(relative_index(Some(&Value::Number(9.0)), 5, 0), 5);
        assert_eq!(relative_index(Some(&Value::Number(1.7)), 5, 0), 1);
        assert_eq!(relative_index(Some(&Value::Undefined), 5, 5), 5);
    }

    #[test]
    fn test_install_defines_only_the_allow_list() {
        let global = Env::new_global();
        install(&global);
        for name in [
            "Math", "JSON", "Array", "Object", "String", "Number", "Boolean", "parseInt",
            "parseFloat", "isNaN", "isFinite", "console", "undefined", "NaN", "Infinity",
            "Error", "TypeError", "RangeError",
        ] {
            assert!(global.has(name), "missing global {name}");
        }
        for name in ["window", "globalThis", "process", "require", "fetch", "eval", "setTimeout"] {
            assert!(!global.has(name), "unexpected global {name}");
        }
        global.clear();
    }
}
