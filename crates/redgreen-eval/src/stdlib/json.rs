//! `JSON`, backed by `serde_json`.

use crate::error::{EvalError, EvalResult};
use crate::evaluator::Evaluator;
use crate::ops;
use crate::stdlib::arg;
use crate::value::Value;

/// Largest indent `JSON.stringify` honours.
const MAX_INDENT: usize = 10;

pub fn json_object() -> Value {
    Value::object_from([
        ("parse", Value::native("parse", parse)),
        ("stringify", Value::native("stringify", stringify)),
    ])
}

fn parse(ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let text = arg(args, 0).to_display_string();
    ev.charge_bulk(text.len())?;
    serde_json::from_str::<serde_json::Value>(&text)
        .map(Value::from)
        .map_err(|e| EvalError::SyntaxError(format!("Unexpected token in JSON: {e}")))
}

/// `JSON.stringify(value, replacer, space)`. Replacers are not supported and
/// are ignored.
fn stringify(ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let indent = match args.get(2) {
        Some(Value::Number(n)) if *n >= 1.0 => Some(" ".repeat((*n as usize).min(MAX_INDENT))),
        Some(Value::String(s)) => Some(s.chars().take(MAX_INDENT).collect()),
        _ => None,
    };
    let text = arg(args, 0)
        .json_stringify(indent.as_deref())
        .map_err(EvalError::type_error)?;
    match text {
        Some(text) => {
            ops::check_string_len(&text)?;
            ev.charge_bulk(text.len())?;
            Ok(Value::String(text))
        }
        None => Ok(Value::Undefined),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let mut ev = Evaluator::new(Default::default());
        let v = parse(&mut ev, &Value::Undefined, &[Value::string(r#"{"a":[1,2]}"#)]).unwrap();
        assert_eq!(
            v,
            Value::object_from([("a", Value::array(vec![Value::Number(1.0), Value::Number(2.0)]))])
        );
        let err = parse(&mut ev, &Value::Undefined, &[Value::string("{bad")]).unwrap_err();
        assert!(matches!(err, EvalError::SyntaxError(_)));
    }

    #[test]
    fn test_parse_keeps_key_order() {
        let mut ev = Evaluator::new(Default::default());
        let v = parse(&mut ev, &Value::Undefined, &[Value::string(r#"{"z":1,"a":2,"m":3}"#)]).unwrap();
        let Value::Object(obj) = &v else {
            panic!("expected object");
        };
        let keys: Vec<String> = obj.borrow().props.keys().map(str::to_string).collect();
        assert_eq!(keys, ["z", "a", "m"]);
        assert_eq!(v.to_json_string(), r#"{"z":1,"a":2,"m":3}"#);
    }

    #[test]
    fn test_stringify_with_indent() {
        let mut ev = Evaluator::new(Default::default());
        let v = Value::object_from([("a", Value::Number(1.0))]);
        let text = stringify(&mut ev, &Value::Undefined, &[v, Value::Null, Value::Number(2.0)]).unwrap();
        assert_eq!(text, Value::string("{\n  \"a\": 1\n}"));
        let undefined = stringify(&mut ev, &Value::Undefined, &[Value::Undefined]).unwrap();
        assert_eq!(undefined, Value::Undefined);
    }
}
