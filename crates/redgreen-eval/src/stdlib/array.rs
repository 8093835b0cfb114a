//! `Array` and array methods.

use std::cmp::Ordering;

use crate::error::{EvalError, EvalResult};
use crate::evaluator::{describe_value, Evaluator};
use crate::ops;
use crate::stdlib::{arg, call_back, callback, lookup_method, relative_index, to_integer, with_statics};
use crate::value::{ArrayRef, NativeFn, Value};

const METHODS: &[(&str, NativeFn)] = &[
    ("push", push),
    ("pop", pop),
    ("shift", shift),
    ("unshift", unshift),
    ("slice", slice),
    ("splice", splice),
    ("concat", concat),
    ("join", join),
    ("toString", to_string),
    ("reverse", reverse),
    ("indexOf", index_of),
    ("lastIndexOf", last_index_of),
    ("includes", includes),
    ("find", find),
    ("findIndex", find_index),
    ("findLast", find_last),
    ("findLastIndex", find_last_index),
    ("filter", filter),
    ("map", map),
    ("forEach", for_each),
    ("reduce", reduce),
    ("reduceRight", reduce_right),
    ("some", some),
    ("every", every),
    ("sort", sort),
    ("flat", flat),
    ("flatMap", flat_map),
    ("fill", fill),
    ("at", at),
];

/// Nesting depth past which `flat` stops descending.
const MAX_FLAT_DEPTH: usize = 128;

pub fn method(name: &str) -> Option<Value> {
    lookup_method(METHODS, name)
}

pub fn array_constructor() -> Value {
    with_statics(
        Value::native_constructor("Array", construct),
        vec![
            ("isArray", Value::native("isArray", is_array)),
            ("from", Value::native("from", from)),
            ("of", Value::native("of", of)),
        ],
    )
}

fn this_array(this: &Value) -> EvalResult<ArrayRef> {
    match this {
        Value::Array(items) => Ok(items.clone()),
        other => Err(EvalError::type_error(format!(
            "Array method called on {}",
            describe_value(other)
        ))),
    }
}

/// Snapshot of the elements, charged by length.
fn snapshot(ev: &mut Evaluator, items: &ArrayRef) -> EvalResult<Vec<Value>> {
    let items = items.borrow().clone();
    ev.charge_bulk(items.len())?;
    Ok(items)
}

fn element(items: &ArrayRef, index: usize) -> Option<Value> {
    items.borrow().get(index).cloned()
}

// ══════════════════════════════════════════════════════════════════════════════
// Constructor & statics
// ══════════════════════════════════════════════════════════════════════════════

/// `Array(n)` makes `n` empty slots; any other arguments become the elements.
fn construct(ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    match args {
        [Value::Number(n)] => {
            if *n < 0.0 || n.fract() != 0.0 || !n.is_finite() {
                return Err(EvalError::range_error("Invalid array length"));
            }
            let len = *n as usize;
            ops::check_array_len(len)?;
            ev.charge_bulk(len)?;
            ev.charge_alloc(len)?;
            Ok(Value::array(vec![Value::Undefined; len]))
        }
        _ => Ok(Value::array(args.to_vec())),
    }
}

fn is_array(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(matches!(arg(args, 0), Value::Array(_))))
}

/// `Array.from(iterable | {length}, mapFn?)`
fn from(ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let source = arg(args, 0);
    let items = match &source {
        Value::Array(_) | Value::String(_) => ev.iterate(&source)?,
        Value::Object(obj) => {
            let len = obj.borrow().props.get("length").map_or(0.0, Value::to_number);
            let len = to_integer(len).max(0.0);
            if len > crate::value::MAX_COLLECTION_LEN as f64 {
                return Err(EvalError::range_error("Invalid array length"));
            }
            ev.charge_bulk(len as usize)?;
            ev.charge_alloc(len as usize)?;
            (0..len as usize)
                .map(|i| obj.borrow().props.get(&i.to_string()).cloned().unwrap_or_default())
                .collect()
        }
        Value::Undefined | Value::Null => {
            return Err(EvalError::type_error(format!(
                "{} is not iterable",
                source.to_display_string()
            )))
        }
        _ => Vec::new(),
    };
    match args.get(1) {
        None | Some(Value::Undefined) => Ok(Value::array(items)),
        Some(_) => {
            let f = callback(args, 1)?;
            let mut mapped = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                mapped.push(ev.call_function(
                    &f,
                    Value::Undefined,
                    vec![item, Value::Number(i as f64)],
                )?);
            }
            Ok(Value::array(mapped))
        }
    }
}

fn of(_ev: &mut Evaluator, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::array(args.to_vec()))
}

// ══════════════════════════════════════════════════════════════════════════════
// Mutators
// ══════════════════════════════════════════════════════════════════════════════

fn push(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let items = this_array(this)?;
    let mut items = items.borrow_mut();
    ops::check_array_len(items.len() + args.len())?;
    ev.charge_alloc(args.len())?;
    items.extend_from_slice(args);
    Ok(Value::Number(items.len() as f64))
}

fn pop(_ev: &mut Evaluator, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    let items = this_array(this)?;
    let popped = items.borrow_mut().pop();
    Ok(popped.unwrap_or_default())
}

fn shift(ev: &mut Evaluator, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    let items = this_array(this)?;
    let mut items = items.borrow_mut();
    ev.charge_bulk(items.len())?;
    if items.is_empty() {
        Ok(Value::Undefined)
    } else {
        Ok(items.remove(0))
    }
}

fn unshift(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let items = this_array(this)?;
    let mut items = items.borrow_mut();
    ops::check_array_len(items.len() + args.len())?;
    ev.charge_bulk(items.len())?;
    ev.charge_alloc(args.len())?;
    items.splice(0..0, args.iter().cloned());
    Ok(Value::Number(items.len() as f64))
}

/// `splice(start, deleteCount?, ...items)`
fn splice(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let items = this_array(this)?;
    let mut items = items.borrow_mut();
    let len = items.len();
    ev.charge_bulk(len)?;
    let start = relative_index(args.first(), len, 0);
    let delete = match args.get(1) {
        None if args.is_empty() => 0,
        None => len - start,
        Some(v) => (to_integer(v.to_number()).max(0.0) as usize).min(len - start),
    };
    let inserted = args.get(2..).unwrap_or_default();
    ops::check_array_len(len - delete + inserted.len())?;
    ev.charge_alloc(inserted.len())?;
    let removed: Vec<Value> = items
        .splice(start..start + delete, inserted.iter().cloned())
        .collect();
    Ok(Value::array(removed))
}

fn reverse(_ev: &mut Evaluator, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    this_array(this)?.borrow_mut().reverse();
    Ok(this.clone())
}

fn fill(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let items = this_array(this)?;
    let mut items = items.borrow_mut();
    let len = items.len();
    ev.charge_bulk(len)?;
    let start = relative_index(args.get(1), len, 0);
    let end = relative_index(args.get(2), len, len);
    let value = arg(args, 0);
    for slot in items.iter_mut().take(end).skip(start) {
        *slot = value.clone();
    }
    Ok(this.clone())
}

/// Stable sort. `undefined` sorts last; without a comparator elements are
/// compared by their string forms.
fn sort(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let items = this_array(this)?;
    let comparator = match args.first() {
        None | Some(Value::Undefined) => None,
        Some(_) => Some(callback(args, 0)?),
    };
    let all = snapshot(ev, &items)?;
    let (defined, undefined): (Vec<Value>, Vec<Value>) =
        all.into_iter().partition(|v| !matches!(v, Value::Undefined));
    let mut sorted = merge_sort(ev, defined, comparator.as_ref())?;
    sorted.extend(undefined);
    *items.borrow_mut() = sorted;
    Ok(this.clone())
}

fn merge_sort(ev: &mut Evaluator, mut items: Vec<Value>, cmp: Option<&Value>) -> EvalResult<Vec<Value>> {
    if items.len() <= 1 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(ev, items, cmp)?;
    let right = merge_sort(ev, right, cmp)?;
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
        if compare_elements(ev, l, r, cmp)? == Ordering::Greater {
            merged.extend(right.next());
        } else {
            merged.extend(left.next());
        }
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

fn compare_elements(ev: &mut Evaluator, a: &Value, b: &Value, cmp: Option<&Value>) -> EvalResult<Ordering> {
    match cmp {
        Some(f) => {
            let result = ev
                .call_function(f, Value::Undefined, vec![a.clone(), b.clone()])?
                .to_number();
            Ok(if result > 0.0 {
                Ordering::Greater
            } else if result < 0.0 {
                Ordering::Less
            } else {
                Ordering::Equal
            })
        }
        None => {
            ev.tick()?;
            Ok(a.to_display_string().cmp(&b.to_display_string()))
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Accessors
// ══════════════════════════════════════════════════════════════════════════════

fn slice(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let items = snapshot(ev, &this_array(this)?)?;
    let len = items.len();
    let start = relative_index(args.first(), len, 0);
    let end = relative_index(args.get(1), len, len);
    if start >= end {
        return Ok(Value::array(Vec::new()));
    }
    ev.charge_alloc(end - start)?;
    Ok(Value::array(items[start..end].to_vec()))
}

fn concat(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let mut out = snapshot(ev, &this_array(this)?)?;
    for a in args {
        match a {
            Value::Array(more) => out.extend(snapshot(ev, more)?),
            other => out.push(other.clone()),
        }
        ops::check_array_len(out.len())?;
    }
    ev.charge_alloc(out.len())?;
    Ok(Value::array(out))
}

fn join(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let items = snapshot(ev, &this_array(this)?)?;
    let sep = match args.first() {
        None | Some(Value::Undefined) => ",".to_string(),
        Some(v) => v.to_display_string(),
    };
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(&sep);
        }
        if !item.is_nullish() {
            out.push_str(&item.to_display_string());
        }
        ops::check_string_len(&out)?;
    }
    ev.charge_alloc(out.len())?;
    Ok(Value::String(out))
}

fn to_string(ev: &mut Evaluator, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    join(ev, this, &[])
}

fn index_of(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let items = snapshot(ev, &this_array(this)?)?;
    let needle = arg(args, 0);
    let from = relative_index(args.get(1), items.len(), 0);
    let found = items
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, v)| ops::strict_equals(v, &needle));
    Ok(Value::Number(found.map_or(-1.0, |(i, _)| i as f64)))
}

fn last_index_of(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let items = snapshot(ev, &this_array(this)?)?;
    let needle = arg(args, 0);
    let found = items.iter().rposition(|v| ops::strict_equals(v, &needle));
    Ok(Value::Number(found.map_or(-1.0, |i| i as f64)))
}

fn includes(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let items = snapshot(ev, &this_array(this)?)?;
    let needle = arg(args, 0);
    Ok(Value::Bool(items.iter().any(|v| ops::same_value_zero(v, &needle))))
}

fn at(_ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let items = this_array(this)?;
    let len = items.borrow().len() as f64;
    let index = to_integer(arg(args, 0).to_number());
    let index = if index < 0.0 { len + index } else { index };
    if index < 0.0 || index >= len {
        return Ok(Value::Undefined);
    }
    Ok(element(&items, index as usize).unwrap_or_default())
}

fn flat(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let items = snapshot(ev, &this_array(this)?)?;
    let depth = match args.first() {
        None | Some(Value::Undefined) => 1,
        Some(v) => to_integer(v.to_number()).clamp(0.0, MAX_FLAT_DEPTH as f64) as usize,
    };
    let mut out = Vec::new();
    flatten_into(ev, &items, depth, &mut out)?;
    ev.charge_alloc(out.len())?;
    Ok(Value::array(out))
}

fn flatten_into(ev: &mut Evaluator, items: &[Value], depth: usize, out: &mut Vec<Value>) -> EvalResult<()> {
    for item in items {
        match item {
            Value::Array(inner) if depth > 0 => {
                let inner = snapshot(ev, inner)?;
                flatten_into(ev, &inner, depth - 1, out)?;
            }
            other => out.push(other.clone()),
        }
        ops::check_array_len(out.len())?;
    }
    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════════
// Iteration
// ══════════════════════════════════════════════════════════════════════════════

/// Visit each index below the starting length that still exists.
fn each(
    ev: &mut Evaluator,
    this: &Value,
    args: &[Value],
    mut visit: impl FnMut(&mut Evaluator, usize, Value, Value) -> EvalResult<bool>,
) -> EvalResult<()> {
    let items = this_array(this)?;
    let f = callback(args, 0)?;
    let len = items.borrow().len();
    for i in 0..len {
        let Some(item) = element(&items, i) else {
            break;
        };
        let result = call_back(ev, &f, item.clone(), i, this)?;
        if !visit(ev, i, item, result)? {
            break;
        }
    }
    Ok(())
}

fn for_each(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    each(ev, this, args, |_, _, _, _| Ok(true))?;
    Ok(Value::Undefined)
}

fn map(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let mut out = Vec::new();
    each(ev, this, args, |_, _, _, result| {
        out.push(result);
        Ok(true)
    })?;
    Ok(Value::array(out))
}

fn filter(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let mut out = Vec::new();
    each(ev, this, args, |_, _, item, result| {
        if result.is_truthy() {
            out.push(item);
        }
        Ok(true)
    })?;
    Ok(Value::array(out))
}

fn flat_map(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let mut out = Vec::new();
    each(ev, this, args, |ev, _, _, result| {
        match result {
            Value::Array(inner) => out.extend(snapshot(ev, &inner)?),
            other => out.push(other),
        }
        ops::check_array_len(out.len())?;
        Ok(true)
    })?;
    Ok(Value::array(out))
}

fn find(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let mut found = Value::Undefined;
    each(ev, this, args, |_, _, item, result| {
        if result.is_truthy() {
            found = item;
            return Ok(false);
        }
        Ok(true)
    })?;
    Ok(found)
}

fn find_index(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let mut found = -1.0;
    each(ev, this, args, |_, i, _, result| {
        if result.is_truthy() {
            found = i as f64;
            return Ok(false);
        }
        Ok(true)
    })?;
    Ok(Value::Number(found))
}

fn some(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let mut any = false;
    each(ev, this, args, |_, _, _, result| {
        any = result.is_truthy();
        Ok(!any)
    })?;
    Ok(Value::Bool(any))
}

fn every(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let mut all = true;
    each(ev, this, args, |_, _, _, result| {
        all = result.is_truthy();
        Ok(all)
    })?;
    Ok(Value::Bool(all))
}

/// Search from the end; returns `(index, item)` of the last match.
fn find_last_match(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Option<(usize, Value)>> {
    let items = this_array(this)?;
    let f = callback(args, 0)?;
    let len = items.borrow().len();
    for i in (0..len).rev() {
        let item = element(&items, i).unwrap_or_default();
        if call_back(ev, &f, item.clone(), i, this)?.is_truthy() {
            return Ok(Some((i, item)));
        }
    }
    Ok(None)
}

fn find_last(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(find_last_match(ev, this, args)?.map(|(_, v)| v).unwrap_or_default())
}

fn find_last_index(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Number(
        find_last_match(ev, this, args)?.map_or(-1.0, |(i, _)| i as f64),
    ))
}

fn reduce_with(ev: &mut Evaluator, this: &Value, args: &[Value], backwards: bool) -> EvalResult<Value> {
    let items = snapshot(ev, &this_array(this)?)?;
    let f = callback(args, 0)?;
    let mut order: Vec<usize> = (0..items.len()).collect();
    if backwards {
        order.reverse();
    }
    let mut order = order.into_iter();
    let mut acc = match args.get(1) {
        Some(initial) => initial.clone(),
        None => match order.next() {
            Some(first) => items[first].clone(),
            None => {
                return Err(EvalError::type_error(
                    "Reduce of empty array with no initial value",
                ))
            }
        },
    };
    for i in order {
        acc = ev.call_function(
            &f,
            Value::Undefined,
            vec![acc, items[i].clone(), Value::Number(i as f64), this.clone()],
        )?;
    }
    Ok(acc)
}

fn reduce(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    reduce_with(ev, this, args, false)
}

fn reduce_right(ev: &mut Evaluator, this: &Value, args: &[Value]) -> EvalResult<Value> {
    reduce_with(ev, this, args, true)
}
