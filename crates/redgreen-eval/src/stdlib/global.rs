//! Global functions, conversion functions, error constructors and the
//! capturing `console`.

use crate::env::Env;
use crate::error::EvalResult;
use crate::evaluator::Evaluator;
use crate::stdlib::{arg, arg_number, to_integer, with_statics};
use crate::value::{parse_radix_digits, Value};

pub fn install(global: &Env) {
    global.define("undefined", Value::Undefined, false);
    global.define("NaN", Value::Number(f64::NAN), false);
    global.define("Infinity", Value::Number(f64::INFINITY), false);

    global.define("parseInt", Value::native("parseInt", parse_int), false);
    global.define("parseFloat", Value::native("parseFloat", parse_float), false);
    global.define("isNaN", Value::native("isNaN", is_nan), false);
    global.define("isFinite", Value::native("isFinite", is_finite), false);

    global.define("String", string_constructor(), false);
    global.define("Number", number_constructor(), false);
    global.define("Boolean", Value::native("Boolean", boolean), false);

    global.define("Error", Value::native_constructor("Error", error), false);
    global.define("TypeError", Value::native_constructor("TypeError", type_error), false);
    global.define("RangeError", Value::native_constructor("RangeError", range_error), false);

    global.define("console", console_object(), false);
}

// ══════════════════════════════════════════════════════════════════════════════
// Number parsing
// ══════════════════════════════════════════════════════════════════════════════

fn parse_int(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let text = arg(args, 0).to_display_string();
    let radix = to_integer(arg_number(args, 1)) as i64;
    Ok(Value::Number(parse_int_str(&text, radix)))
}

/// `parseInt` on an already-converted string. A radix of 0 means "detect".
pub(crate) fn parse_int_str(text: &str, radix: i64) -> f64 {
    let mut s = text.trim_start();
    let mut sign = 1.0;
    if let Some(rest) = s.strip_prefix('-') {
        sign = -1.0;
        s = rest;
    } else if let Some(rest) = s.strip_prefix('+') {
        s = rest;
    }
    let mut radix = radix;
    let has_hex_prefix = s.starts_with("0x") || s.starts_with("0X");
    if radix == 0 {
        radix = if has_hex_prefix { 16 } else { 10 };
    }
    if !(2..=36).contains(&radix) {
        return f64::NAN;
    }
    if radix == 16 && has_hex_prefix {
        s = &s[2..];
    }
    let radix = radix as u32;
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_digit(radix))
        .map_or(s.len(), |(i, _)| i);
    match parse_radix_digits(&s[..end], radix) {
        Some(n) => sign * n,
        None => f64::NAN,
    }
}

fn parse_float(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Number(parse_float_str(&arg(args, 0).to_display_string())))
}

/// Parse the longest numeric prefix of `text`.
pub(crate) fn parse_float_str(text: &str) -> f64 {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    if s[i..].starts_with("Infinity") {
        return if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }
    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    let mantissa_digits = s[digits_start..i].chars().filter(char::is_ascii_digit).count();
    if mantissa_digits == 0 {
        return f64::NAN;
    }
    // Only consume an exponent that has digits.
    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    s[..i].parse().unwrap_or(f64::NAN)
}

fn is_nan(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(arg_number(args, 0).is_nan()))
}

fn is_finite(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(arg_number(args, 0).is_finite()))
}

// ══════════════════════════════════════════════════════════════════════════════
// Conversion functions
// ══════════════════════════════════════════════════════════════════════════════

fn string_constructor() -> Value {
    with_statics(
        Value::native("String", string),
        vec![("fromCharCode", Value::native("fromCharCode", from_char_code))],
    )
}

fn string(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::String(match args.first() {
        Some(v) => v.to_display_string(),
        None => String::new(),
    }))
}

fn from_char_code(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let units: Vec<u16> = args
        .iter()
        .map(|v| {
            let n = v.to_number();
            if n.is_finite() {
                n.trunc().rem_euclid(65536.0) as u16
            } else {
                0
            }
        })
        .collect();
    Ok(Value::String(String::from_utf16_lossy(&units)))
}

fn number_constructor() -> Value {
    with_statics(
        Value::native("Number", number),
        vec![
            ("isInteger", Value::native("isInteger", number_is_integer)),
            ("isSafeInteger", Value::native("isSafeInteger", number_is_safe_integer)),
            ("isFinite", Value::native("isFinite", number_is_finite)),
            ("isNaN", Value::native("isNaN", number_is_nan)),
            ("parseInt", Value::native("parseInt", parse_int)),
            ("parseFloat", Value::native("parseFloat", parse_float)),
            ("EPSILON", Value::Number(f64::EPSILON)),
            ("MAX_SAFE_INTEGER", Value::Number(9_007_199_254_740_991.0)),
            ("MIN_SAFE_INTEGER", Value::Number(-9_007_199_254_740_991.0)),
            ("MAX_VALUE", Value::Number(f64::MAX)),
            ("MIN_VALUE", Value::Number(5e-324)),
            ("POSITIVE_INFINITY", Value::Number(f64::INFINITY)),
            ("NEGATIVE_INFINITY", Value::Number(f64::NEG_INFINITY)),
            ("NaN", Value::Number(f64::NAN)),
        ],
    )
}

fn number(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Number(match args.first() {
        Some(v) => v.to_number(),
        None => 0.0,
    }))
}

/// The `Number.is*` predicates do not convert their argument.
fn number_arg(args: &[Value]) -> Option<f64> {
    match args.first() {
        Some(Value::Number(n)) => Some(*n),
        _ => None,
    }
}

fn number_is_integer(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(
        number_arg(args).is_some_and(|n| n.is_finite() && n.fract() == 0.0),
    ))
}

fn number_is_safe_integer(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(number_arg(args).is_some_and(|n| {
        n.is_finite() && n.fract() == 0.0 && n.abs() <= 9_007_199_254_740_991.0
    })))
}

fn number_is_finite(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(number_arg(args).is_some_and(f64::is_finite)))
}

fn number_is_nan(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(number_arg(args).is_some_and(f64::is_nan)))
}

fn boolean(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(arg(args, 0).is_truthy()))
}

// ══════════════════════════════════════════════════════════════════════════════
// Errors
// ══════════════════════════════════════════════════════════════════════════════

fn make_error(name: &str, args: &[Value]) -> Value {
    let message = match args.first() {
        None | Some(Value::Undefined) => String::new(),
        Some(v) => v.to_display_string(),
    };
    Value::error(name, &message)
}

fn error(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(make_error("Error", args))
}

fn type_error(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(make_error("TypeError", args))
}

fn range_error(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(make_error("RangeError", args))
}

// ══════════════════════════════════════════════════════════════════════════════
// Console
// ══════════════════════════════════════════════════════════════════════════════

fn console_object() -> Value {
    Value::object_from([
        ("log", Value::native("log", console_log)),
        ("info", Value::native("info", console_log)),
        ("warn", Value::native("warn", console_log)),
        ("error", Value::native("error", console_log)),
    ])
}

/// Learner output is captured, never printed.
fn console_log(ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let line = args
        .iter()
        .map(|v| match v {
            Value::String(s) => s.clone(),
            Value::Array(_) | Value::Object(_) => format!("{v:?}"),
            other => other.to_display_string(),
        })
        .collect::<Vec<_>>()
        .join(" ");
    ev.log(line);
    Ok(Value::Undefined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int_str("42px", 0), 42.0);
        assert_eq!(parse_int_str("  -17", 0), -17.0);
        assert_eq!(parse_int_str("0x1A", 0), 26.0);
        assert_eq!(parse_int_str("ff", 16), 255.0);
        assert_eq!(parse_int_str("3.9", 10), 3.0);
        assert!(parse_int_str("abc", 0).is_nan());
        assert!(parse_int_str("10", 1).is_nan());
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float_str("3.14abc"), 3.14);
        assert_eq!(parse_float_str(".5"), 0.5);
        assert_eq!(parse_float_str("1e3x"), 1000.0);
        assert_eq!(parse_float_str("2e"), 2.0);
        assert_eq!(parse_float_str("-Infinity"), f64::NEG_INFINITY);
        assert!(parse_float_str("x1").is_nan());
        assert!(parse_float_str(".").is_nan());
    }

    #[test]
    fn test_console_is_captured() {
        let mut ev = Evaluator::new(Default::default());
        console_log(
            &mut ev,
            &Value::Undefined,
            &[Value::string("fuel"), Value::Number(3.0), Value::array(vec![Value::Number(1.0)])],
        )
        .unwrap();
        assert_eq!(ev.log_output, vec!["fuel 3 [1]".to_string()]);
    }
}
