//! `Math`

use crate::error::EvalResult;
use crate::evaluator::Evaluator;
use crate::stdlib::arg_number;
use crate::value::{NativeFn, Value};

const FUNCTIONS: &[(&str, NativeFn)] = &[
    ("abs", abs),
    ("ceil", ceil),
    ("floor", floor),
    ("round", round),
    ("trunc", trunc),
    ("sign", sign),
    ("sqrt", sqrt),
    ("cbrt", cbrt),
    ("exp", exp),
    ("log", log),
    ("log2", log2),
    ("log10", log10),
    ("sin", sin),
    ("cos", cos),
    ("tan", tan),
    ("asin", asin),
    ("acos", acos),
    ("atan", atan),
    ("atan2", atan2),
    ("pow", pow),
    ("hypot", hypot),
    ("min", min),
    ("max", max),
    ("random", random),
];

pub fn math_object() -> Value {
    let mut entries: Vec<(&str, Value)> = vec![
        ("PI", Value::Number(std::f64::consts::PI)),
        ("E", Value::Number(std::f64::consts::E)),
        ("LN2", Value::Number(std::f64::consts::LN_2)),
        ("LN10", Value::Number(std::f64::consts::LN_10)),
        ("LOG2E", Value::Number(std::f64::consts::LOG2_E)),
        ("LOG10E", Value::Number(std::f64::consts::LOG10_E)),
        ("SQRT2", Value::Number(std::f64::consts::SQRT_2)),
        ("SQRT1_2", Value::Number(std::f64::consts::FRAC_1_SQRT_2)),
    ];
    entries.extend(FUNCTIONS.iter().map(|&(name, call)| (name, Value::native(name, call))));
    Value::object_from(entries)
}

fn unary(args: &[Value], f: fn(f64) -> f64) -> EvalResult<Value> {
    Ok(Value::Number(f(arg_number(args, 0))))
}

fn abs(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    unary(args, f64::abs)
}

fn ceil(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    unary(args, f64::ceil)
}

fn floor(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    unary(args, f64::floor)
}

/// Halves round toward positive infinity (`Math.round(-2.5)` is `-2`).
fn round(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    unary(args, |x| {
        if !x.is_finite() {
            return x;
        }
        let floor = x.floor();
        if x - floor >= 0.5 {
            floor + 1.0
        } else {
            floor
        }
    })
}

fn trunc(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    unary(args, f64::trunc)
}

fn sign(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    unary(args, |x| if x.is_nan() || x == 0.0 { x } else { x.signum() })
}

fn sqrt(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    unary(args, f64::sqrt)
}

fn cbrt(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    unary(args, f64::cbrt)
}

fn exp(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    unary(args, f64::exp)
}

fn log(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    unary(args, f64::ln)
}

fn log2(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    unary(args, f64::log2)
}

fn log10(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    unary(args, f64::log10)
}

fn sin(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    unary(args, f64::sin)
}

fn cos(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    unary(args, f64::cos)
}

fn tan(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    unary(args, f64::tan)
}

fn asin(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    unary(args, f64::asin)
}

fn acos(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    unary(args, f64::acos)
}

fn atan(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    unary(args, f64::atan)
}

fn atan2(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Number(arg_number(args, 0).atan2(arg_number(args, 1))))
}

fn pow(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    crate::ops::binary(
        redgreen_types::ast::BinOp::Pow,
        &Value::Number(arg_number(args, 0)),
        &Value::Number(arg_number(args, 1)),
    )
}

fn hypot(ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    ev.charge_bulk(args.len())?;
    let sum: f64 = args.iter().map(|v| v.to_number().powi(2)).sum();
    Ok(Value::Number(sum.sqrt()))
}

/// `Math.min()` is `Infinity`; any `NaN` argument makes the result `NaN`.
fn min(ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    ev.charge_bulk(args.len())?;
    let mut result = f64::INFINITY;
    for n in args.iter().map(Value::to_number) {
        if n.is_nan() {
            return Ok(Value::Number(f64::NAN));
        }
        result = result.min(n);
    }
    Ok(Value::Number(result))
}

fn max(ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    ev.charge_bulk(args.len())?;
    let mut result = f64::NEG_INFINITY;
    for n in args.iter().map(Value::to_number) {
        if n.is_nan() {
            return Ok(Value::Number(f64::NAN));
        }
        result = result.max(n);
    }
    Ok(Value::Number(result))
}

fn random(ev: &mut Evaluator, _this: &Value, _args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Number(ev.random()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(f: NativeFn, args: &[f64]) -> f64 {
        let mut ev = Evaluator::new(Default::default());
        let args: Vec<Value> = args.iter().map(|n| Value::Number(*n)).collect();
        match f(&mut ev, &Value::Undefined, &args).unwrap() {
            Value::Number(n) => n,
            other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(call(round, &[2.5]), 3.0);
        assert_eq!(call(round, &[-2.5]), -2.0);
        assert_eq!(call(round, &[0.49999999999999994]), 0.0);
    }

    #[test]
    fn test_min_max() {
        assert_eq!(call(min, &[50.0, 30.0, 10.0]), 10.0);
        assert_eq!(call(min, &[]), f64::INFINITY);
        assert_eq!(call(max, &[0.0, -30.0]), 0.0);
        assert!(call(max, &[1.0, f64::NAN]).is_nan());
    }

    #[test]
    fn test_random_is_deterministic_per_evaluator() {
        let a = call(random, &[]);
        let b = call(random, &[]);
        assert_eq!(a, b);
        assert!((0.0..1.0).contains(&a));
    }
}
