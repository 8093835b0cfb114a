//! String methods. Indices count Unicode scalar values.

use crate::error::{EvalError, EvalResult};
use crate::evaluator::Evaluator;
use crate::ops;
use crate::stdlib::{arg, lookup_method, relative_index, to_integer};
use crate::value::{NativeFn, Value, MAX_COLLECTION_LEN};

const METHODS: &[(&str, NativeFn)] = &[
    ("charAt", char_at),
    ("charCodeAt", char_code_at),
    ("at", at),
    ("indexOf", index_of),
    ("lastIndexOf", last_index_of),
    ("includes", includes),
    ("startsWith", starts_with),
    ("endsWith", ends_with),
    ("slice", slice),
    ("substring", substring),
    ("substr", substr),
    ("toUpperCase", to_upper_case),
    ("toLowerCase", to_lower_case),
    ("trim", trim),
    ("trimStart", trim_start),
    ("trimEnd", trim_end),
    ("split", split),
    ("replace", replace),
    ("replaceAll", replace_all),
    ("repeat", repeat),
    ("padStart", pad_start),
    ("padEnd", pad_end),
    ("concat", concat),
    ("toString", value_of),
    ("valueOf", value_of),
];

pub fn method(name: &str) -> Option<Value> {
    lookup_method(METHODS, name)
}

fn this_string(ev: &mut Evaluator, this: &Value) -> EvalResult<String> {
    if this.is_nullish() {
        return Err(EvalError::type_error(
            "String.prototype method called on null or undefined",
        ));
    }
    let s = this.to_display_string();
    ev.charge_bulk(s.len())?;
    Ok(s)
}

fn this_chars(ev: &mut Evaluator, this: &Value) -> EvalResult<Vec<char>> {
    Ok(this_string(ev, this)?.chars().collect())
}

fn string_arg(args: &[Value], index: usize) -> String {
    arg(args, index).to_display_string()
}

/// Char index of the first occurrence of `needle` at or after `from`.
fn find_from(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(from.min(haystack.len()));
    }
    if needle.len() > haystack.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&i| haystack[i..].starts_with(needle))
}

fn char_at(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let chars = this_chars(ev, this)?;
    let index = to_integer(arg(args, 0).to_number());
    Ok(Value::String(
        (index >= 0.0)
            .then(|| chars.get(index as usize))
            .flatten()
            .map(char::to_string)
            .unwrap_or_default(),
    ))
}

fn char_code_at(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let chars = this_chars(ev, this)?;
    let index = to_integer(arg(args, 0).to_number());
    Ok(Value::Number(
        (index >= 0.0)
            .then(|| chars.get(index as usize))
            .flatten()
            .map_or(f64::NAN, |c| f64::from(u32::from(*c))),
    ))
}

fn at(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let chars = this_chars(ev, this)?;
    let index = to_integer(arg(args, 0).to_number());
    let index = if index < 0.0 { chars.len() as f64 + index } else { index };
    if index < 0.0 {
        return Ok(Value::Undefined);
    }
    Ok(chars
        .get(index as usize)
        .map(|c| Value::String(c.to_string()))
        .unwrap_or_default())
}

fn index_of(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let chars = this_chars(ev, this)?;
    let needle: Vec<char> = string_arg(args, 0).chars().collect();
    let from = to_integer(arg(args, 1).to_number()).max(0.0) as usize;
    Ok(Value::Number(
        find_from(&chars, &needle, from).map_or(-1.0, |i| i as f64),
    ))
}

fn last_index_of(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let chars = this_chars(ev, this)?;
    let needle: Vec<char> = string_arg(args, 0).chars().collect();
    if needle.len() > chars.len() {
        return Ok(Value::Number(-1.0));
    }
    let found = (0..=chars.len() - needle.len())
        .rev()
        .find(|&i| chars[i..].starts_with(&needle));
    Ok(Value::Number(found.map_or(-1.0, |i| i as f64)))
}

fn includes(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let s = this_string(ev, this)?;
    Ok(Value::Bool(s.contains(string_arg(args, 0).as_str())))
}

fn starts_with(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let chars = this_chars(ev, this)?;
    let needle: Vec<char> = string_arg(args, 0).chars().collect();
    let from = relative_index(args.get(1), chars.len(), 0).min(chars.len());
    Ok(Value::Bool(chars[from..].starts_with(&needle)))
}

fn ends_with(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let chars = this_chars(ev, this)?;
    let needle: Vec<char> = string_arg(args, 0).chars().collect();
    let end = match args.get(1) {
        None | Some(Value::Undefined) => chars.len(),
        Some(v) => (to_integer(v.to_number()).max(0.0) as usize).min(chars.len()),
    };
    Ok(Value::Bool(chars[..end].ends_with(&needle)))
}

fn slice(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let chars = this_chars(ev, this)?;
    let len = chars.len();
    let start = relative_index(args.first(), len, 0);
    let end = relative_index(args.get(1), len, len);
    Ok(Value::String(if start < end {
        chars[start..end].iter().collect()
    } else {
        String::new()
    }))
}

fn substring(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let chars = this_chars(ev, this)?;
    let len = chars.len();
    let clamp = |v: Option<&Value>, default: usize| match v {
        None | Some(Value::Undefined) => default,
        Some(v) => (to_integer(v.to_number()).max(0.0) as usize).min(len),
    };
    let a = clamp(args.first(), 0);
    let b = clamp(args.get(1), len);
    let (start, end) = if a <= b { (a, b) } else { (b, a) };
    Ok(Value::String(chars[start..end].iter().collect()))
}

fn substr(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let chars = this_chars(ev, this)?;
    let len = chars.len();
    let start = relative_index(args.first(), len, 0);
    let count = match args.get(1) {
        None | Some(Value::Undefined) => len,
        Some(v) => to_integer(v.to_number()).max(0.0).min(len as f64) as usize,
    };
    let end = start.saturating_add(count).min(len);
    Ok(Value::String(chars[start..end].iter().collect()))
}

fn to_upper_case(ev: &mut Evaluator, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    Ok(Value::String(this_string(ev, this)?.to_uppercase()))
}

fn to_lower_case(ev: &mut Evaluator, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    Ok(Value::String(this_string(ev, this)?.to_lowercase()))
}

fn trim(ev: &mut Evaluator, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    Ok(Value::string(this_string(ev, this)?.trim()))
}

fn trim_start(ev: &mut Evaluator, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    Ok(Value::string(this_string(ev, this)?.trim_start()))
}

fn trim_end(ev: &mut Evaluator, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    Ok(Value::string(this_string(ev, this)?.trim_end()))
}

fn split(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let s = this_string(ev, this)?;
    let limit = match args.get(1) {
        None | Some(Value::Undefined) => usize::MAX,
        Some(v) => to_integer(v.to_number()).max(0.0) as usize,
    };
    let parts: Vec<Value> = match args.first() {
        None | Some(Value::Undefined) => vec![Value::String(s)],
        Some(sep) => {
            let sep = sep.to_display_string();
            if sep.is_empty() {
                s.chars().map(|c| Value::String(c.to_string())).collect()
            } else {
                s.split(sep.as_str()).map(Value::string).collect()
            }
        }
    };
    Ok(Value::array(parts.into_iter().take(limit).collect()))
}

/// Replacement text for one match: a function replacement is called with
/// the matched text, anything else is converted to a string.
fn replacement(ev: &mut Evaluator, with: &Value, matched: &str, offset: usize) -> EvalResult<String> {
    match with {
        Value::Function(_) => Ok(ev
            .call_function(
                with,
                Value::Undefined,
                vec![Value::string(matched), Value::Number(offset as f64)],
            )?
            .to_display_string()),
        other => Ok(other.to_display_string()),
    }
}

fn replace(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let s = this_string(ev, this)?;
    let pattern = string_arg(args, 0);
    let with = arg(args, 1);
    let Some(pos) = s.find(pattern.as_str()) else {
        return Ok(Value::String(s));
    };
    let offset = s[..pos].chars().count();
    let text = replacement(ev, &with, &pattern, offset)?;
    let out = format!("{}{}{}", &s[..pos], text, &s[pos + pattern.len()..]);
    ops::check_string_len(&out)?;
    Ok(Value::String(out))
}

fn replace_all(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let s = this_string(ev, this)?;
    let pattern = string_arg(args, 0);
    let with = arg(args, 1);
    if pattern.is_empty() {
        let text = replacement(ev, &with, "", 0)?;
        let mut out = text.clone();
        for c in s.chars() {
            out.push(c);
            out.push_str(&text);
            ops::check_string_len(&out)?;
        }
        return Ok(Value::String(out));
    }
    let mut out = String::new();
    let mut rest = 0;
    for (pos, matched) in s.match_indices(pattern.as_str()) {
        out.push_str(&s[rest..pos]);
        let offset = s[..pos].chars().count();
        out.push_str(&replacement(ev, &with, matched, offset)?);
        ops::check_string_len(&out)?;
        rest = pos + matched.len();
    }
    out.push_str(&s[rest..]);
    Ok(Value::String(out))
}

fn repeat(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let s = this_string(ev, this)?;
    let count = to_integer(arg(args, 0).to_number());
    if count < 0.0 || count.is_infinite() {
        return Err(EvalError::range_error(format!(
            "Invalid count value: {}",
            Value::Number(count)
        )));
    }
    if s.len() as f64 * count > MAX_COLLECTION_LEN as f64 {
        return Err(EvalError::range_error("Invalid string length"));
    }
    let count = count as usize;
    ev.charge_bulk(s.len() * count)?;
    ev.charge_alloc(s.len() * count)?;
    Ok(Value::String(s.repeat(count)))
}

fn pad(ev: &mut Evaluator, this: &Value, args: &[Value], at_start: bool) -> EvalResult<Value> {
    let s = this_string(ev, this)?;
    let target = to_integer(arg(args, 0).to_number());
    let filler = match args.get(1) {
        None | Some(Value::Undefined) => " ".to_string(),
        Some(v) => v.to_display_string(),
    };
    let len = s.chars().count();
    if target <= len as f64 || filler.is_empty() {
        return Ok(Value::String(s));
    }
    if target > MAX_COLLECTION_LEN as f64 {
        return Err(EvalError::range_error("Invalid string length"));
    }
    let missing = target as usize - len;
    ev.charge_bulk(missing)?;
    ev.charge_alloc(missing)?;
    let padding: String = filler.chars().cycle().take(missing).collect();
    Ok(Value::String(if at_start {
        padding + &s
    } else {
        s + &padding
    }))
}

fn pad_start(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    pad(ev, this, args, true)
}

fn pad_end(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    pad(ev, this, args, false)
}

fn concat(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let mut s = this_string(ev, this)?;
    for a in args {
        s.push_str(&a.to_display_string());
        ops::check_string_len(&s)?;
    }
    Ok(Value::String(s))
}

fn value_of(ev: &mut Evaluator, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    Ok(Value::String(this_string(ev, this)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(f: NativeFn, this: &str, args: &[Value]) -> Value {
        let mut ev = Evaluator::new(Default::default());
        f(&mut ev, &Value::string(this), args).unwrap()
    }

    #[test]
    fn test_slicing() {
        assert_eq!(call(slice, "thrusters", &[Value::Number(-3.0)]), Value::string("ers"));
        assert_eq!(
            call(substring, "thrusters", &[Value::Number(5.0), Value::Number(1.0)]),
            Value::string("hrus")
        );
        assert_eq!(
            call(substr, "thrusters", &[Value::Number(1.0), Value::Number(3.0)]),
            Value::string("hru")
        );
    }

    #[test]
    fn test_search() {
        assert_eq!(call(index_of, "oxygen", &[Value::string("y")]), Value::Number(2.0));
        assert_eq!(call(index_of, "oxygen", &[Value::string("z")]), Value::Number(-1.0));
        assert_eq!(call(last_index_of, "abab", &[Value::string("ab")]), Value::Number(2.0));
        assert_eq!(call(includes, "shield", &[Value::string("iel")]), Value::Bool(true));
        assert_eq!(call(starts_with, "shield", &[Value::string("sh")]), Value::Bool(true));
        assert_eq!(call(ends_with, "shield", &[Value::string("d")]), Value::Bool(true));
    }

    #[test]
    fn test_split() {
        assert_eq!(
            call(split, "a,b,c", &[Value::string(",")]),
            Value::array(vec![Value::string("a"), Value::string("b"), Value::string("c")])
        );
        assert_eq!(
            call(split, "ab", &[Value::string("")]),
            Value::array(vec![Value::string("a"), Value::string("b")])
        );
        assert_eq!(call(split, "ab", &[]), Value::array(vec![Value::string("ab")]));
    }

    #[test]
    fn test_replace_first_and_all() {
        assert_eq!(
            call(replace, "a-b-c", &[Value::string("-"), Value::string("+")]),
            Value::string("a+b-c")
        );
        assert_eq!(
            call(replace_all, "a-b-c", &[Value::string("-"), Value::string("+")]),
            Value::string("a+b+c")
        );
    }

    #[test]
    fn test_padding_and_repeat() {
        assert_eq!(
            call(pad_start, "7", &[Value::Number(3.0), Value::string("0")]),
            Value::string("007")
        );
        assert_eq!(call(pad_end, "ab", &[Value::Number(4.0)]), Value::string("ab  "));
        assert_eq!(call(repeat, "ab", &[Value::Number(3.0)]), Value::string("ababab"));
    }

    #[test]
    fn test_repeat_rejects_huge_counts() {
        let mut ev = Evaluator::new(Default::default());
        let err = repeat(&mut ev, &Value::string("x"), &[Value::Number(1e12)]).unwrap_err();
        assert_eq!(err.message(), "Invalid string length");
        let err = repeat(&mut ev, &Value::string("x"), &[Value::Number(-1.0)]).unwrap_err();
        assert_eq!(err.message(), "Invalid count value: -1");
    }

    #[test]
    fn test_method_on_null_receiver_is_type_error() {
        let mut ev = Evaluator::new(Default::default());
        assert!(to_upper_case(&mut ev, &Value::Null, &[]).is_err());
    }
}
