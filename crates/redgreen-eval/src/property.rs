//! Property access on every kind of value.
//!
//! Arrays, strings and numbers have no prototype objects; their methods are
//! looked up by name in the `stdlib` tables and returned as native functions
//! that receive the receiver as `this`.

use crate::error::{EvalError, EvalResult};
use crate::ops;
use crate::stdlib;
use crate::value::Value;

/// Parse a canonical array index (`"0"`, `"12"`, never `"01"` or `"-1"`).
pub fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse().ok()
}

/// `obj[key]`
pub fn get_property(obj: &Value, key: &str) -> EvalResult<Value> {
    match obj {
        Value::Undefined | Value::Null => Err(EvalError::type_error(format!(
            "Cannot read properties of {} (reading '{key}')",
            obj.to_display_string()
        ))),
        Value::String(s) => {
            if key == "length" {
                return Ok(Value::Number(s.chars().count() as f64));
            }
            if let Some(index) = array_index(key) {
                return Ok(s
                    .chars()
                    .nth(index)
                    .map(|c| Value::String(c.to_string()))
                    .unwrap_or_default());
            }
            Ok(stdlib::string::method(key).unwrap_or_default())
        }
        Value::Array(items) => {
            if key == "length" {
                return Ok(Value::Number(items.borrow().len() as f64));
            }
            if let Some(index) = array_index(key) {
                return Ok(items.borrow().get(index).cloned().unwrap_or_default());
            }
            Ok(stdlib::array::method(key).unwrap_or_default())
        }
        Value::Object(obj) => {
            if let Some(value) = obj.borrow().props.get(key) {
                return Ok(value.clone());
            }
            Ok(stdlib::object::method(key).unwrap_or_default())
        }
        Value::Function(func) => {
            if let Some(value) = func.props.borrow().get(key) {
                return Ok(value.clone());
            }
            Ok(match key {
                "name" => Value::String(func.name()),
                "length" => Value::Number(func.arity() as f64),
                _ => Value::Undefined,
            })
        }
        Value::Number(_) => Ok(stdlib::number::method(key).unwrap_or_default()),
        Value::Bool(_) => Ok(match key {
            "toString" | "valueOf" => stdlib::object::method(key).unwrap_or_default(),
            _ => Value::Undefined,
        }),
    }
}

/// `obj[key] = value`. Writes to primitives and to non-index array keys are
/// silently dropped.
pub fn set_property(obj: &Value, key: &str, value: Value) -> EvalResult<()> {
    match obj {
        Value::Undefined | Value::Null => Err(EvalError::type_error(format!(
            "Cannot set properties of {} (setting '{key}')",
            obj.to_display_string()
        ))),
        Value::Array(items) => {
            if key == "length" {
                let len = value.to_number();
                if len < 0.0 || len.fract() != 0.0 || !len.is_finite() {
                    return Err(EvalError::range_error("Invalid array length"));
                }
                let len = len as usize;
                ops::check_array_len(len)?;
                items.borrow_mut().resize(len, Value::Undefined);
            } else if let Some(index) = array_index(key) {
                ops::check_array_len(index.saturating_add(1))?;
                let mut items = items.borrow_mut();
                if index >= items.len() {
                    items.resize(index + 1, Value::Undefined);
                }
                items[index] = value;
            }
            Ok(())
        }
        Value::Object(obj) => {
            obj.borrow_mut().props.insert(key, value);
            Ok(())
        }
        Value::Function(func) => {
            func.props.borrow_mut().insert(key, value);
            Ok(())
        }
        Value::Bool(_) | Value::Number(_) | Value::String(_) => Ok(()),
    }
}

/// `key in obj`
pub fn has_property(obj: &Value, key: &str) -> EvalResult<bool> {
    match obj {
        Value::Object(obj) => Ok(obj.borrow().props.contains_key(key)),
        Value::Array(items) => Ok(key == "length"
            || array_index(key).is_some_and(|i| i < items.borrow().len())),
        Value::Function(func) => Ok(func.props.borrow().contains_key(key)),
        other => Err(EvalError::type_error(format!(
            "Cannot use 'in' operator to search for '{key}' in {}",
            other.to_display_string()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::PropertyMap;

    #[test]
    fn test_array_index_is_canonical() {
        assert_eq!(array_index("0"), Some(0));
        assert_eq!(array_index("42"), Some(42));
        assert_eq!(array_index("01"), None);
        assert_eq!(array_index("-1"), None);
        assert_eq!(array_index("1.5"), None);
        assert_eq!(array_index(""), None);
    }

    #[test]
    fn test_read_from_null_is_type_error() {
        let err = get_property(&Value::Null, "toUpperCase").unwrap_err();
        assert_eq!(
            err.message(),
            "Cannot read properties of null (reading 'toUpperCase')"
        );
    }

    #[test]
    fn test_string_length_and_index() {
        let s = Value::string("héllo");
        assert_eq!(get_property(&s, "length").unwrap(), Value::Number(5.0));
        assert_eq!(get_property(&s, "1").unwrap(), Value::string("é"));
        assert_eq!(get_property(&s, "9").unwrap(), Value::Undefined);
    }

    #[test]
    fn test_array_writes_extend_with_holes() {
        let arr = Value::array(vec![Value::Number(1.0)]);
        set_property(&arr, "3", Value::Number(4.0)).unwrap();
        assert_eq!(get_property(&arr, "length").unwrap(), Value::Number(4.0));
        assert_eq!(get_property(&arr, "2").unwrap(), Value::Undefined);
        set_property(&arr, "length", Value::Number(1.0)).unwrap();
        assert_eq!(get_property(&arr, "length").unwrap(), Value::Number(1.0));
    }

    #[test]
    fn test_huge_index_write_is_range_error() {
        let arr = Value::array(vec![]);
        assert!(set_property(&arr, "999999999", Value::Null).is_err());
    }

    #[test]
    fn test_object_props_and_in() {
        let obj = Value::object(PropertyMap::new());
        set_property(&obj, "a", Value::Number(1.0)).unwrap();
        assert!(has_property(&obj, "a").unwrap());
        assert!(!has_property(&obj, "b").unwrap());
        assert!(has_property(&Value::Number(1.0), "a").is_err());
    }

    #[test]
    fn test_methods_resolve_on_primitives() {
        assert!(matches!(
            get_property(&Value::string("x"), "toUpperCase").unwrap(),
            Value::Function(_)
        ));
        assert!(matches!(
            get_property(&Value::array(vec![]), "map").unwrap(),
            Value::Function(_)
        ));
        assert_eq!(get_property(&Value::array(vec![]), "nope").unwrap(), Value::Undefined);
    }
}
