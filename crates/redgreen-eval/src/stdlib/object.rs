//! `Object` statics and the methods every object answers to.

use crate::error::{EvalError, EvalResult};
use crate::evaluator::Evaluator;
use crate::property::{has_property, set_property};
use crate::stdlib::{arg, lookup_method, with_statics};
use crate::value::{NativeFn, PropertyMap, Value};

const METHODS: &[(&str, NativeFn)] = &[
    ("hasOwnProperty", has_own_property),
    ("toString", to_string),
    ("valueOf", value_of),
];

pub fn method(name: &str) -> Option<Value> {
    lookup_method(METHODS, name)
}

pub fn object_constructor() -> Value {
    with_statics(
        Value::native("Object", construct),
        vec![
            ("keys", Value::native("keys", keys)),
            ("values", Value::native("values", values)),
            ("entries", Value::native("entries", entries)),
            ("assign", Value::native("assign", assign)),
            ("fromEntries", Value::native("fromEntries", from_entries)),
            ("freeze", Value::native("freeze", identity)),
        ],
    )
}

/// Enumerable own `(key, value)` pairs: object properties in insertion
/// order, array and string indices in order.
pub fn own_entries(value: &Value) -> Vec<(String, Value)> {
    match value {
        Value::Object(obj) => obj
            .borrow()
            .props
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
        Value::Array(items) => items
            .borrow()
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v.clone()))
            .collect(),
        Value::String(s) => s
            .chars()
            .enumerate()
            .map(|(i, c)| (i.to_string(), Value::String(c.to_string())))
            .collect(),
        Value::Function(f) => f
            .props
            .borrow()
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
        _ => Vec::new(),
    }
}

fn entries_of(ev: &mut Evaluator, args: &[Value]) -> EvalResult<Vec<(String, Value)>> {
    let target = arg(args, 0);
    if target.is_nullish() {
        return Err(EvalError::type_error(
            "Cannot convert undefined or null to object",
        ));
    }
    let entries = own_entries(&target);
    ev.charge_bulk(entries.len())?;
    Ok(entries)
}

fn construct(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    match arg(args, 0) {
        v @ (Value::Object(_) | Value::Array(_) | Value::Function(_)) => Ok(v),
        _ => Ok(Value::object(PropertyMap::new())),
    }
}

fn keys(ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let entries = entries_of(ev, args)?;
    Ok(Value::array(
        entries.into_iter().map(|(k, _)| Value::String(k)).collect(),
    ))
}

fn values(ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let entries = entries_of(ev, args)?;
    Ok(Value::array(entries.into_iter().map(|(_, v)| v).collect()))
}

fn entries(ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let entries = entries_of(ev, args)?;
    Ok(Value::array(
        entries
            .into_iter()
            .map(|(k, v)| Value::array(vec![Value::String(k), v]))
            .collect(),
    ))
}

/// `Object.assign(target, ...sources)`
fn assign(ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let target = arg(args, 0);
    if target.is_nullish() {
        return Err(EvalError::type_error(
            "Cannot convert undefined or null to object",
        ));
    }
    for source in args.iter().skip(1) {
        let entries = own_entries(source);
        ev.charge_bulk(entries.len())?;
        for (key, value) in entries {
            set_property(&target, &key, value)?;
        }
    }
    Ok(target)
}

fn from_entries(ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let pairs = ev.iterate(&arg(args, 0))?;
    let mut props = PropertyMap::new();
    for pair in pairs {
        let Value::Array(pair) = pair else {
            return Err(EvalError::type_error(
                "Iterator value is not an entry object",
            ));
        };
        let pair = pair.borrow();
        let key = pair.first().cloned().unwrap_or_default().to_property_key();
        props.insert(key, pair.get(1).cloned().unwrap_or_default());
    }
    Ok(Value::object(props))
}

/// `Object.freeze` returns its argument; objects are not made immutable.
fn identity(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(arg(args, 0))
}

fn has_own_property(_ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let key = arg(args, 0).to_property_key();
    match this {
        Value::Object(_) | Value::Array(_) | Value::Function(_) => {
            Ok(Value::Bool(has_property(this, &key)?))
        }
        _ => Ok(Value::Bool(false)),
    }
}

fn to_string(_ev: &mut Evaluator, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    Ok(Value::String(this.to_display_string()))
}

fn value_of(_ev: &mut Evaluator, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    Ok(this.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_own_entries_keep_insertion_order() {
        let obj = Value::object_from([("b", Value::Number(1.0)), ("a", Value::Number(2.0))]);
        let keys: Vec<String> = own_entries(&obj).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_keys_of_null_is_type_error() {
        let mut ev = Evaluator::new(Default::default());
        assert!(keys(&mut ev, &Value::Undefined, &[Value::Null]).is_err());
    }

    #[test]
    fn test_assign_and_from_entries() {
        let mut ev = Evaluator::new(Default::default());
        let target = Value::object(PropertyMap::new());
        let source = Value::object_from([("fuel", Value::Number(10.0))]);
        assign(&mut ev, &Value::Undefined, &[target.clone(), source.clone()]).unwrap();
        assert_eq!(target, source);

        let pairs = Value::array(vec![Value::array(vec![Value::string("k"), Value::Bool(true)])]);
        let built = from_entries(&mut ev, &Value::Undefined, &[pairs]).unwrap();
        assert_eq!(built, Value::object_from([("k", Value::Bool(true))]));
    }

    #[test]
    fn test_has_own_property() {
        let mut ev = Evaluator::new(Default::default());
        let obj = Value::object_from([("x", Value::Null)]);
        assert_eq!(
            has_own_property(&mut ev, &obj, &[Value::string("x")]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            has_own_property(&mut ev, &obj, &[Value::string("y")]).unwrap(),
            Value::Bool(false)
        );
    }
}
