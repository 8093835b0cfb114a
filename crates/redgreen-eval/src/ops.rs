//! Operator semantics: arithmetic, comparison and the two equalities.

use std::cmp::Ordering;
use std::rc::Rc;

use redgreen_types::ast::BinOp;

use crate::error::{EvalError, EvalResult};
use crate::value::{FunctionKind, Value, MAX_COLLECTION_LEN};

/// Apply a binary operator other than `in` and `instanceof`.
pub fn binary(op: BinOp, lv: &Value, rv: &Value) -> EvalResult<Value> {
    let result = match op {
        BinOp::Add => return add(lv, rv),
        BinOp::Sub => Value::Number(lv.to_number() - rv.to_number()),
        BinOp::Mul => Value::Number(lv.to_number() * rv.to_number()),
        BinOp::Div => Value::Number(lv.to_number() / rv.to_number()),
        BinOp::Mod => Value::Number(lv.to_number() % rv.to_number()),
        BinOp::Pow => Value::Number(pow(lv.to_number(), rv.to_number())),
        BinOp::Less => Value::Bool(compare(lv, rv) == Some(Ordering::Less)),
        BinOp::Greater => Value::Bool(compare(lv, rv) == Some(Ordering::Greater)),
        BinOp::LessEq => Value::Bool(matches!(
            compare(lv, rv),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinOp::GreaterEq => Value::Bool(matches!(
            compare(lv, rv),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinOp::LooseEq => Value::Bool(loose_equals(lv, rv)),
        BinOp::LooseNotEq => Value::Bool(!loose_equals(lv, rv)),
        BinOp::StrictEq => Value::Bool(strict_equals(lv, rv)),
        BinOp::StrictNotEq => Value::Bool(!strict_equals(lv, rv)),
        BinOp::In | BinOp::InstanceOf => {
            return Err(EvalError::type_error(format!(
                "'{}' requires a property lookup",
                op.symbol()
            )))
        }
    };
    Ok(result)
}

/// `value instanceof constructor`, answered for the built-in constructors.
/// Objects built by learner constructors carry no prototype link and never
/// match.
pub fn instance_of(value: &Value, constructor: &Value) -> EvalResult<bool> {
    let Value::Function(ctor) = constructor else {
        return Err(EvalError::type_error(
            "Right-hand side of 'instanceof' is not callable",
        ));
    };
    let FunctionKind::Native(native) = &ctor.kind else {
        return Ok(false);
    };
    Ok(match (native.name, value) {
        ("Object", Value::Array(_) | Value::Object(_) | Value::Function(_)) => true,
        ("Array", Value::Array(_)) => true,
        ("Error", _) => value.error_message().is_some(),
        (name, Value::Object(obj)) if name.ends_with("Error") => {
            let obj = obj.borrow();
            obj.is_error
                && obj
                    .props
                    .get("name")
                    .is_some_and(|n| n.to_display_string() == name)
        }
        _ => false,
    })
}

/// `+`: string concatenation when either side is (or converts to) a string,
/// numeric addition otherwise.
fn add(lv: &Value, rv: &Value) -> EvalResult<Value> {
    let lp = to_primitive(lv);
    let rp = to_primitive(rv);
    if matches!(lp, Value::String(_)) || matches!(rp, Value::String(_)) {
        let mut s = lp.to_display_string();
        s.push_str(&rp.to_display_string());
        check_string_len(&s)?;
        Ok(Value::String(s))
    } else {
        Ok(Value::Number(lp.to_number() + rp.to_number()))
    }
}

/// `**` with the learner language's NaN rules (`1 ** NaN` is `NaN`).
fn pow(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        f64::NAN
    } else {
        base.powf(exponent)
    }
}

/// Composites become their string form; primitives are unchanged.
pub fn to_primitive(value: &Value) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) | Value::Function(_) => {
            Value::String(value.to_display_string())
        }
        other => other.clone(),
    }
}

/// Relational comparison. `None` when either side is `NaN`.
pub fn compare(lv: &Value, rv: &Value) -> Option<Ordering> {
    let lp = to_primitive(lv);
    let rp = to_primitive(rv);
    match (&lp, &rp) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => lp.to_number().partial_cmp(&rp.to_number()),
    }
}

/// `===`
pub fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => Rc::ptr_eq(x, y),
        (Value::Object(x), Value::Object(y)) => Rc::ptr_eq(x, y),
        (Value::Function(x), Value::Function(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

/// `==`
pub fn loose_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
        (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
        (Value::Number(_), Value::String(_))
        | (Value::String(_), Value::Number(_))
        | (Value::Bool(_), _)
        | (_, Value::Bool(_)) => {
            if std::mem::discriminant(a) == std::mem::discriminant(b) {
                strict_equals(a, b)
            } else {
                loose_equals(&Value::Number(a.to_number()), &Value::Number(b.to_number()))
            }
        }
        (Value::Array(_) | Value::Object(_) | Value::Function(_), Value::Number(_) | Value::String(_))
        | (Value::Number(_) | Value::String(_), Value::Array(_) | Value::Object(_) | Value::Function(_)) => {
            loose_equals(&to_primitive(a), &to_primitive(b))
        }
        _ => strict_equals(a, b),
    }
}

/// Equality used by `includes`: like `===` but `NaN` equals `NaN`.
pub fn same_value_zero(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_nan() && y.is_nan() => true,
        _ => strict_equals(a, b),
    }
}

pub fn check_string_len(s: &str) -> EvalResult<()> {
    if s.len() > MAX_COLLECTION_LEN {
        Err(EvalError::range_error("Invalid string length"))
    } else {
        Ok(())
    }
}

pub fn check_array_len(len: usize) -> EvalResult<()> {
    if len > MAX_COLLECTION_LEN {
        Err(EvalError::range_error("Invalid array length"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    #[test]
    fn test_add_concatenates_with_strings() {
        let v = binary(BinOp::Add, &Value::string("a"), &num(1.0)).unwrap();
        assert_eq!(v, Value::string("a1"));
        let v = binary(BinOp::Add, &num(1.0), &num(2.0)).unwrap();
        assert_eq!(v, num(3.0));
        let v = binary(BinOp::Add, &Value::array(vec![num(1.0), num(2.0)]), &num(3.0)).unwrap();
        assert_eq!(v, Value::string("1,23"));
    }

    #[test]
    fn test_division_by_zero_is_infinity() {
        let v = binary(BinOp::Div, &num(100.0), &num(0.0)).unwrap();
        assert_eq!(v, num(f64::INFINITY));
    }

    #[test]
    fn test_modulo_keeps_dividend_sign() {
        assert_eq!(binary(BinOp::Mod, &num(-7.0), &num(3.0)).unwrap(), num(-1.0));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(compare(&num(1.0), &num(2.0)), Some(Ordering::Less));
        assert_eq!(compare(&Value::string("b"), &Value::string("a")), Some(Ordering::Greater));
        assert_eq!(compare(&Value::string("10"), &num(9.0)), Some(Ordering::Greater));
        assert_eq!(compare(&num(f64::NAN), &num(1.0)), None);
        assert_eq!(compare(&Value::Null, &num(0.0)), Some(Ordering::Equal));
    }

    #[test]
    fn test_strict_vs_loose_equality() {
        assert!(!strict_equals(&num(1.0), &Value::string("1")));
        assert!(loose_equals(&num(1.0), &Value::string("1")));
        assert!(loose_equals(&Value::Null, &Value::Undefined));
        assert!(!loose_equals(&Value::Null, &num(0.0)));
        assert!(loose_equals(&Value::Bool(true), &num(1.0)));
        assert!(!strict_equals(&num(f64::NAN), &num(f64::NAN)));
        assert!(same_value_zero(&num(f64::NAN), &num(f64::NAN)));
    }

    #[test]
    fn test_composites_compare_by_reference() {
        let a = Value::array(vec![]);
        let b = Value::array(vec![]);
        assert!(strict_equals(&a, &a.clone()));
        assert!(!strict_equals(&a, &b));
    }

    #[test]
    fn test_pow_nan_rules() {
        assert!(pow(1.0, f64::NAN).is_nan());
        assert_eq!(pow(2.0, 10.0), 1024.0);
    }

    #[test]
    fn test_instance_of_builtins() {
        fn ctor(name: &'static str) -> Value {
            Value::native_constructor(name, |_, _, _| Ok(Value::Undefined))
        }
        let err = Value::error("TypeError", "bad");
        assert!(instance_of(&err, &ctor("TypeError")).unwrap());
        assert!(instance_of(&err, &ctor("Error")).unwrap());
        assert!(!instance_of(&err, &ctor("RangeError")).unwrap());
        assert!(instance_of(&Value::array(vec![]), &ctor("Array")).unwrap());
        assert!(instance_of(&Value::array(vec![]), &ctor("Object")).unwrap());
        assert!(!instance_of(&num(1.0), &ctor("Object")).unwrap());
        assert!(instance_of(&err, &num(1.0)).is_err());
    }
}
