//! Deep structural equality used to score test results.

use std::rc::Rc;

use crate::value::Value;

/// Nesting depth past which two structures are reported unequal.
const MAX_DEPTH: usize = 128;

/// Deep structural equality.
///
/// Primitives compare by value (`NaN` never equals anything, `0 == -0`).
/// Arrays compare positionally, objects by key set and values with key order
/// ignored. An array never equals an object. Functions equal only
/// themselves. The same array or object is always equal to itself.
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    equal_at(a, b, 0)
}

fn equal_at(a: &Value, b: &Value, depth: usize) -> bool {
    if depth > MAX_DEPTH {
        return false;
    }
    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Function(x), Value::Function(y)) => Rc::ptr_eq(x, y),
        (Value::Array(x), Value::Array(y)) => {
            if Rc::ptr_eq(x, y) {
                return true;
            }
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len()
                && x
                    .iter()
                    .zip(y.iter())
                    .all(|(l, r)| equal_at(l, r, depth + 1))
        }
        (Value::Object(x), Value::Object(y)) => {
            if Rc::ptr_eq(x, y) {
                return true;
            }
            let (x, y) = (x.borrow(), y.borrow());
            x.props.len() == y.props.len()
                && x.props.iter().all(|(key, l)| {
                    y.props
                        .get(key)
                        .is_some_and(|r| equal_at(l, r, depth + 1))
                })
        }
        _ => false,
    }
}
