//! Number methods.

use crate::error::{EvalError, EvalResult};
use crate::evaluator::Evaluator;
use crate::stdlib::{arg, lookup_method, to_integer};
use crate::value::{number_to_string, NativeFn, Value};

const METHODS: &[(&str, NativeFn)] = &[
    ("toFixed", to_fixed),
    ("toString", to_string),
    ("toLocaleString", to_string),
    ("valueOf", value_of),
];

pub fn method(name: &str) -> Option<Value> {
    lookup_method(METHODS, name)
}

fn this_number(this: &Value) -> f64 {
    this.to_number()
}

fn to_fixed(_ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let digits = to_integer(arg(args, 0).to_number());
    if !(0.0..=100.0).contains(&digits) {
        return Err(EvalError::range_error(
            "toFixed() digits argument must be between 0 and 100",
        ));
    }
    Ok(Value::String(format_fixed(this_number(this), digits as usize)))
}

/// `toFixed`: round the exact binary value to `digits` decimals, with exact
/// ties rounding away from zero.
pub(crate) fn format_fixed(x: f64, digits: usize) -> String {
    if !x.is_finite() || x.abs() >= 1e21 {
        return number_to_string(x);
    }
    let abs = x.abs();
    let wide = format!("{abs:.prec$}", prec = digits + 30);
    let cut = match wide.find('.') {
        Some(dot) if digits == 0 => dot,
        Some(dot) => dot + 1 + digits,
        None => wide.len(),
    };
    let rest = wide[cut..].trim_start_matches('.');
    let is_tie = rest.starts_with('5') && rest[1..].bytes().all(|b| b == b'0');
    let body = if is_tie {
        increment_last_digit(&wide[..cut])
    } else {
        format!("{abs:.digits$}")
    };
    if x < 0.0 {
        format!("-{body}")
    } else {
        body
    }
}

/// Add one unit in the last place of a decimal string (`"1.29"` → `"1.30"`).
fn increment_last_digit(text: &str) -> String {
    let mut bytes = text.as_bytes().to_vec();
    let mut i = bytes.len();
    while i > 0 {
        i -= 1;
        match bytes[i] {
            b'.' => continue,
            b'9' => bytes[i] = b'0',
            d => {
                bytes[i] = d + 1;
                return String::from_utf8_lossy(&bytes).into_owned();
            }
        }
    }
    let mut out = String::from("1");
    out.push_str(&String::from_utf8_lossy(&bytes));
    out
}

fn to_string(_ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let n = this_number(this);
    let radix = match args.first() {
        None | Some(Value::Undefined) => 10.0,
        Some(v) => to_integer(v.to_number()),
    };
    if !(2.0..=36.0).contains(&radix) {
        return Err(EvalError::range_error(
            "toString() radix must be between 2 and 36",
        ));
    }
    if radix == 10.0 || !n.is_finite() {
        return Ok(Value::String(number_to_string(n)));
    }
    Ok(Value::String(to_radix_string(n, radix as u32)))
}

/// Render `n` in base `radix`, with at most 20 fractional digits.
fn to_radix_string(n: f64, radix: u32) -> String {
    let negative = n < 0.0;
    let abs = n.abs();
    let mut int_part = abs.trunc();
    let mut frac = abs - int_part;
    let mut int_digits = Vec::new();
    let r = f64::from(radix);
    loop {
        let digit = (int_part % r) as u32;
        int_digits.push(std::char::from_digit(digit, radix).unwrap_or('0'));
        int_part = (int_part / r).trunc();
        if int_part < 1.0 {
            break;
        }
    }
    let mut out: String = int_digits.iter().rev().collect();
    if frac > 0.0 {
        out.push('.');
        for _ in 0..20 {
            frac *= r;
            let digit = frac.trunc() as u32;
            out.push(std::char::from_digit(digit, radix).unwrap_or('0'));
            frac -= frac.trunc();
            if frac == 0.0 {
                break;
            }
        }
    }
    if negative {
        format!("-{out}")
    } else {
        out
    }
}

fn value_of(_ev: &mut Evaluator, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Number(this_number(this)))
}
