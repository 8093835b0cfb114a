//! Runtime values of the learner language.
//!
//! Arrays and objects are shared, mutable references (`Rc<RefCell<..>>`), so
//! mutation through one alias is visible through every other alias. Values
//! serialize the way `JSON.stringify` renders them.

use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use redgreen_types::ast::FunctionDecl;
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::env::Env;
use crate::error::EvalResult;
use crate::evaluator::Evaluator;

/// Largest array length or string length (in chars) a program may build.
pub const MAX_COLLECTION_LEN: usize = 1 << 24;

/// Nesting depth past which rendering treats a structure as circular.
const MAX_RENDER_DEPTH: usize = 128;

pub type ArrayRef = Rc<ArrayCell>;
pub type ObjectRef = Rc<RefCell<Object>>;

/// Host function: `(evaluator, this, args) -> result`.
pub type NativeFn = fn(&mut Evaluator, &Value, &[Value]) -> EvalResult<Value>;

// ══════════════════════════════════════════════════════════════════════════════
// Teardown
// ══════════════════════════════════════════════════════════════════════════════

/// Drop `pending` without recursing once per nesting level.
///
/// Every uniquely owned composite gives its children to the work list before
/// it is freed, so its own drop finds nothing left to recurse into.
pub(crate) fn release(mut pending: Vec<Value>) {
    while let Some(mut value) = pending.pop() {
        value.detach_children(&mut pending);
    }
}

/// Element storage of an array.
#[derive(Debug, Default)]
pub struct ArrayCell(RefCell<Vec<Value>>);

impl Deref for ArrayCell {
    type Target = RefCell<Vec<Value>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Drop for ArrayCell {
    fn drop(&mut self) {
        let items = std::mem::take(self.0.get_mut());
        if !items.is_empty() {
            release(items);
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Property maps
// ══════════════════════════════════════════════════════════════════════════════

/// Insertion-ordered string-keyed properties.
#[derive(Debug, Clone, Default)]
pub struct PropertyMap {
    entries: Vec<(String, Value)>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Insert or overwrite; an overwritten key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn drain_values_into(&mut self, out: &mut Vec<Value>) {
        out.extend(self.entries.drain(..).map(|(_, v)| v));
    }
}

impl Drop for PropertyMap {
    fn drop(&mut self) {
        if !self.entries.is_empty() {
            let mut values = Vec::with_capacity(self.entries.len());
            self.drain_values_into(&mut values);
            release(values);
        }
    }
}

impl FromIterator<(String, Value)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut map = PropertyMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// A plain object. Objects built by the `Error` constructors carry
/// `is_error`, which changes how they print.
#[derive(Debug, Clone, Default)]
pub struct Object {
    pub props: PropertyMap,
    pub is_error: bool,
}

// ══════════════════════════════════════════════════════════════════════════════
// Functions
// ══════════════════════════════════════════════════════════════════════════════

/// A callable value. Functions are objects too, so they carry properties
/// (`Array.isArray` is a property of the `Array` function).
pub struct Function {
    pub kind: FunctionKind,
    pub props: RefCell<PropertyMap>,
}

pub enum FunctionKind {
    Closure(Closure),
    Native(Native),
}

/// A learner-defined function and the scope it closes over.
pub struct Closure {
    pub decl: Rc<FunctionDecl>,
    pub env: Env,
    /// Lexical `this`, captured when an arrow function is created.
    pub this: Option<Value>,
}

#[derive(Clone, Copy)]
pub struct Native {
    pub name: &'static str,
    pub call: NativeFn,
    /// Whether `new` may be applied.
    pub constructor: bool,
}

impl Function {
    pub fn name(&self) -> String {
        match &self.kind {
            FunctionKind::Closure(c) => c
                .decl
                .name
                .as_ref()
                .map(|n| n.name.clone())
                .unwrap_or_default(),
            FunctionKind::Native(n) => n.name.to_string(),
        }
    }

    /// Number of declared parameters before any default or rest parameter.
    pub fn arity(&self) -> usize {
        match &self.kind {
            FunctionKind::Closure(c) => c
                .decl
                .params
                .iter()
                .take_while(|p| p.default.is_none() && !p.rest)
                .count(),
            FunctionKind::Native(_) => 0,
        }
    }

    pub fn is_constructor(&self) -> bool {
        match &self.kind {
            FunctionKind::Closure(c) => !c.decl.is_arrow,
            FunctionKind::Native(n) => n.constructor,
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Function: {}]", self.name())
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Value
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(ArrayRef),
    Object(ObjectRef),
    Function(Rc<Function>),
}

impl Value {
    // ── Constructors ──────────────────────────────────────────────────────

    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    pub fn array(items: Vec<Value>) -> Self {
        Self::Array(Rc::new(ArrayCell(RefCell::new(items))))
    }

    pub fn object(props: PropertyMap) -> Self {
        Self::Object(Rc::new(RefCell::new(Object {
            props,
            is_error: false,
        })))
    }

    /// Build an object from `(key, value)` pairs.
    pub fn object_from<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::object(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// An error object as built by `new TypeError(message)`.
    pub fn error(name: &str, message: &str) -> Self {
        let mut props = PropertyMap::new();
        props.insert("name", Value::string(name));
        props.insert("message", Value::string(message));
        Self::Object(Rc::new(RefCell::new(Object {
            props,
            is_error: true,
        })))
    }

    pub fn native(name: &'static str, call: NativeFn) -> Self {
        Self::function(FunctionKind::Native(Native {
            name,
            call,
            constructor: false,
        }))
    }

    /// A native function that also accepts `new`.
    pub fn native_constructor(name: &'static str, call: NativeFn) -> Self {
        Self::function(FunctionKind::Native(Native {
            name,
            call,
            constructor: true,
        }))
    }

    pub fn function(kind: FunctionKind) -> Self {
        Self::Function(Rc::new(Function {
            kind,
            props: RefCell::new(PropertyMap::new()),
        }))
    }

    /// Move the children of a uniquely owned composite into `out`. Shared
    /// composites are left alone.
    fn detach_children(&mut self, out: &mut Vec<Value>) {
        match self {
            Self::Array(items) => {
                if let Some(cell) = Rc::get_mut(items) {
                    out.append(cell.0.get_mut());
                }
            }
            Self::Object(obj) => {
                if let Some(obj) = Rc::get_mut(obj) {
                    obj.get_mut().props.drain_values_into(out);
                }
            }
            Self::Function(func) => {
                if let Some(func) = Rc::get_mut(func) {
                    func.props.get_mut().drain_values_into(out);
                    if let FunctionKind::Closure(closure) = &mut func.kind {
                        out.extend(closure.this.take());
                        closure.env.detach_bindings(out);
                    }
                }
            }
            _ => {}
        }
    }

    // ── Classification ────────────────────────────────────────────────────

    /// The `typeof` string.
    pub fn type_of(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null | Self::Array(_) | Self::Object(_) => "object",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Function(_) => "function",
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            Self::Array(_) | Self::Object(_) | Self::Function(_) => true,
        }
    }

    /// `message` of an `Error` object, `None` for anything else.
    pub fn error_message(&self) -> Option<String> {
        let Self::Object(obj) = self else {
            return None;
        };
        let obj = obj.borrow();
        if !obj.is_error {
            return None;
        }
        Some(
            obj.props
                .get("message")
                .map(Value::to_display_string)
                .unwrap_or_default(),
        )
    }

    // ── Conversions ───────────────────────────────────────────────────────

    /// Numeric conversion (`Number(value)`).
    pub fn to_number(&self) -> f64 {
        match self {
            Self::Undefined => f64::NAN,
            Self::Null => 0.0,
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Number(n) => *n,
            Self::String(s) => string_to_number(s),
            Self::Array(_) => string_to_number(&self.to_display_string()),
            Self::Object(_) | Self::Function(_) => f64::NAN,
        }
    }

    /// String conversion (`String(value)`), as used by `+` and templates.
    pub fn to_display_string(&self) -> String {
        self.display_at(0)
    }

    fn display_at(&self, depth: usize) -> String {
        match self {
            Self::Undefined => "undefined".into(),
            Self::Null => "null".into(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => number_to_string(*n),
            Self::String(s) => s.clone(),
            Self::Array(items) => {
                if depth >= MAX_RENDER_DEPTH {
                    return String::new();
                }
                items
                    .borrow()
                    .iter()
                    .map(|item| match item {
                        Self::Undefined | Self::Null => String::new(),
                        other => other.display_at(depth + 1),
                    })
                    .collect::<Vec<_>>()
                    .join(",")
            }
            Self::Object(obj) => {
                let obj = obj.borrow();
                if !obj.is_error {
                    return "[object Object]".into();
                }
                let name = obj
                    .props
                    .get("name")
                    .map(Value::to_display_string)
                    .unwrap_or_else(|| "Error".into());
                let message = obj
                    .props
                    .get("message")
                    .map(Value::to_display_string)
                    .unwrap_or_default();
                if message.is_empty() {
                    name
                } else {
                    format!("{name}: {message}")
                }
            }
            Self::Function(f) => format!("function {}() {{ [native code] }}", f.name()),
        }
    }

    /// Property-key conversion for `obj[key]`.
    pub fn to_property_key(&self) -> String {
        self.to_display_string()
    }

    /// JSON text for diagnostics: `JSON.stringify` output, with the bare word
    /// `undefined` where `JSON.stringify` would produce nothing.
    pub fn to_json_string(&self) -> String {
        match self.json_stringify(None) {
            Ok(Some(text)) => text,
            Ok(None) => "undefined".into(),
            Err(_) => self.to_display_string(),
        }
    }

    /// `JSON.stringify(value, null, indent)`. `Ok(None)` when the value has
    /// no JSON form (`undefined`, functions).
    pub fn json_stringify(&self, indent: Option<&str>) -> Result<Option<String>, String> {
        if matches!(self, Self::Undefined | Self::Function(_)) {
            return Ok(None);
        }
        let json = JsonRef {
            value: self,
            depth: 0,
        };
        let text = match indent {
            Some(indent) if !indent.is_empty() => {
                let mut out = Vec::new();
                let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
                let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
                json.serialize(&mut ser).map_err(|e| e.to_string())?;
                String::from_utf8(out).map_err(|e| e.to_string())?
            }
            _ => serde_json::to_string(&json).map_err(|e| e.to_string())?,
        };
        Ok(Some(text))
    }

    fn inspect(&self, depth: usize) -> String {
        match self {
            Self::String(s) => format!("{s:?}"),
            Self::Array(items) => {
                if depth >= MAX_RENDER_DEPTH {
                    return "[Circular]".into();
                }
                let parts: Vec<String> = items
                    .borrow()
                    .iter()
                    .map(|v| v.inspect(depth + 1))
                    .collect();
                format!("[{}]", parts.join(", "))
            }
            Self::Object(obj) => {
                if depth >= MAX_RENDER_DEPTH {
                    return "[Circular]".into();
                }
                let obj = obj.borrow();
                let parts: Vec<String> = obj
                    .props
                    .iter()
                    .map(|(k, v)| format!("{k}: {}", v.inspect(depth + 1)))
                    .collect();
                format!("{{ {} }}", parts.join(", "))
            }
            Self::Function(f) => format!("{f:?}"),
            other => other.to_display_string(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inspect(0))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        crate::equality::deep_equal(self, other)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Serialization
// ══════════════════════════════════════════════════════════════════════════════

/// Serializer view that tracks depth so cyclic structures fail instead of
/// recursing forever.
struct JsonRef<'a> {
    value: &'a Value,
    depth: usize,
}

impl Serialize for JsonRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.depth > MAX_RENDER_DEPTH {
            return Err(S::Error::custom("Converting circular structure to JSON"));
        }
        match self.value {
            Value::Undefined | Value::Null | Value::Function(_) => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) if !n.is_finite() => serializer.serialize_unit(),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 => {
                serializer.serialize_i64(*n as i64)
            }
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let items = items.borrow();
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(&JsonRef {
                        value: item,
                        depth: self.depth + 1,
                    })?;
                }
                seq.end()
            }
            Value::Object(obj) => {
                let obj = obj.borrow();
                let mut map = serializer.serialize_map(None)?;
                for (key, value) in obj.props.iter() {
                    if matches!(value, Value::Undefined | Value::Function(_)) {
                        continue;
                    }
                    map.serialize_entry(
                        key,
                        &JsonRef {
                            value,
                            depth: self.depth + 1,
                        },
                    )?;
                }
                map.end()
            }
        }
    }
}

/// `serialize_with` helper: the JSON form of `value`, or its inspected text
/// when it has none (cyclic or nested past the render depth).
pub fn serialize_lossy<S: Serializer>(value: &Value, serializer: S) -> Result<S::Ok, S::Error> {
    match serde_json::to_value(value) {
        Ok(json) => json.serialize(serializer),
        Err(_) => serializer.serialize_str(&value.inspect(0)),
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        JsonRef {
            value: self,
            depth: 0,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Number formatting & parsing
// ══════════════════════════════════════════════════════════════════════════════

/// Render a number the way the learner language prints it: integers without
/// a fractional part, `NaN`/`Infinity` spelled out, `-0` as `0`, exponent
/// notation outside `[1e-6, 1e21)`.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".into();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.into();
    }
    if n == 0.0 {
        return "0".into();
    }
    let abs = n.abs();
    if (1e-6..1e21).contains(&abs) {
        return format!("{n}");
    }
    let text = format!("{n:e}");
    match text.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => text,
    }
}

/// String-to-number conversion: surrounding whitespace ignored, empty string
/// is `0`, `0x`/`0o`/`0b` prefixes accepted, anything else malformed is `NaN`.
pub fn string_to_number(s: &str) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return 0.0;
    }
    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    let radix = match t.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return parse_radix_digits(&t[2..], radix).unwrap_or(f64::NAN);
    }
    let well_formed = t
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
        && t.chars().any(|c| c.is_ascii_digit());
    if !well_formed {
        return f64::NAN;
    }
    t.parse::<f64>().unwrap_or(f64::NAN)
}

/// Parse a full string of digits in `radix`; `None` if empty or malformed.
pub fn parse_radix_digits(digits: &str, radix: u32) -> Option<f64> {
    if digits.is_empty() {
        return None;
    }
    let mut value = 0.0f64;
    for c in digits.chars() {
        let d = c.to_digit(radix)?;
        value = value * f64::from(radix) + f64::from(d);
    }
    Some(value)
}
