//! Extract the function name and argument values from a test's invocation
//! expression (`calculateThrust(5)`).

use std::sync::LazyLock;

use redgreen_parser::parse_expression;
use redgreen_types::ast::{Argument, Expr, ExprKind};
use redgreen_types::SourceFile;
use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::config::SandboxConfig;
use crate::error::EvalResult;
use crate::evaluator::Evaluator;
use crate::value::Value;

/// Name reported when no function name can be found.
pub const UNKNOWN_FUNCTION: &str = "unknown";

/// First identifier directly followed by `(`.
static CALLEE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)\s*\(").expect("valid callee regex"));

/// The pieces of one invocation expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedInvocation {
    pub function_name: String,
    /// Source text of each argument, in order.
    pub raw_args: Vec<String>,
    /// Evaluated arguments; empty when evaluation failed.
    pub arg_values: Vec<Value>,
}

/// Split an invocation expression into a function name and argument values.
///
/// Never fails: text that is not a plain call falls back to scanning for the
/// first `name(`, and arguments that cannot be evaluated become an empty
/// list.
pub fn parse_invocation(expr: &str) -> ExtractedInvocation {
    let file = SourceFile::new("invocation", expr);
    let parsed = parse_expression(&file);
    if !parsed.errors.has_errors() {
        if let Some(invocation) = parsed.expr.as_ref().and_then(|e| from_call(&file, e)) {
            return invocation;
        }
    }
    scan_invocation(expr)
}

/// Primary path: the whole text is `name(args...)`.
fn from_call(file: &SourceFile, expr: &Expr) -> Option<ExtractedInvocation> {
    let ExprKind::Call {
        callee,
        args,
        optional: false,
    } = &expr.kind
    else {
        return None;
    };
    let ExprKind::Identifier(name) = &callee.kind else {
        return None;
    };
    let raw_args = args
        .iter()
        .map(|arg| match arg {
            Argument::Expr(e) => file.slice(e.span).unwrap_or_default().to_string(),
            Argument::Spread(e) => format!("...{}", file.slice(e.span).unwrap_or_default()),
        })
        .collect();
    let mut evaluator = Evaluator::new(SandboxConfig::default());
    let arg_values = match evaluator.eval_arguments(args) {
        Ok(values) => values,
        Err(err) => {
            warn!(invocation = file.source.as_str(), error = %err, "could not evaluate test arguments");
            Vec::new()
        }
    };
    Some(ExtractedInvocation {
        function_name: name.clone(),
        raw_args,
        arg_values,
    })
}

/// Fallback path: regex for the name, balanced-paren scan for the argument
/// text, which is then evaluated as an array literal.
fn scan_invocation(expr: &str) -> ExtractedInvocation {
    let function_name = CALLEE_NAME
        .captures(expr)
        .and_then(|c| c.get(1))
        .map_or_else(|| UNKNOWN_FUNCTION.to_string(), |m| m.as_str().to_string());
    let args_text = argument_text(expr).unwrap_or_default();
    if args_text.trim().is_empty() {
        return ExtractedInvocation {
            function_name,
            raw_args: Vec::new(),
            arg_values: Vec::new(),
        };
    }
    let arg_values = match evaluate_literal_list(args_text) {
        Ok(values) => values,
        Err(message) => {
            warn!(invocation = expr, error = %message, "could not evaluate test arguments");
            Vec::new()
        }
    };
    ExtractedInvocation {
        function_name,
        raw_args: split_top_level(args_text),
        arg_values,
    }
}

/// Text between the first `(` and its matching `)`, or to the end of the
/// input if it is never closed.
fn argument_text(expr: &str) -> Option<&str> {
    let open = expr.find('(')?;
    let body = &expr[open + 1..];
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' if depth == 0 => return Some(&body[..i]),
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Some(body)
}

/// Split argument text on commas that are not nested or quoted.
fn split_top_level(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(text[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(text[start..].trim().to_string());
    parts.retain(|p| !p.is_empty());
    parts
}

/// Evaluate `[text]` in an empty sandbox.
fn evaluate_literal_list(text: &str) -> Result<Vec<Value>, String> {
    let file = SourceFile::new("arguments", format!("[{text}]"));
    let parsed = parse_expression(&file);
    if let Some(first) = parsed.errors.errors.first() {
        return Err(first.message.clone());
    }
    let expr = parsed.expr.ok_or_else(|| "empty argument list".to_string())?;
    let mut evaluator = Evaluator::new(SandboxConfig::default());
    let list: EvalResult<Value> = evaluator.eval_expr(&expr);
    match list.map_err(|e| e.to_string())? {
        Value::Array(items) => Ok(items.borrow().clone()),
        other => Ok(vec![other]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_call() {
        let inv = parse_invocation("calculateThrust(5)");
        assert_eq!(inv.function_name, "calculateThrust");
        assert_eq!(inv.raw_args, vec!["5"]);
        assert_eq!(inv.arg_values, vec![Value::Number(5.0)]);
    }

    #[test]
    fn test_composite_arguments() {
        let inv = parse_invocation(r#"findNearest([50, 30, 80, 10], {"a": 1}, 'x, y')"#);
        assert_eq!(inv.function_name, "findNearest");
        assert_eq!(inv.raw_args, vec!["[50, 30, 80, 10]", r#"{"a": 1}"#, "'x, y'"]);
        assert_eq!(inv.arg_values.len(), 3);
        assert_eq!(inv.arg_values[2], Value::string("x, y"));
    }

    #[test]
    fn test_constant_expressions() {
        let inv = parse_invocation("f(-1, Infinity, Math.PI, undefined, null)");
        assert_eq!(inv.arg_values[0], Value::Number(-1.0));
        assert_eq!(inv.arg_values[1], Value::Number(f64::INFINITY));
        assert_eq!(inv.arg_values[2], Value::Number(std::f64::consts::PI));
        assert_eq!(inv.arg_values[3], Value::Undefined);
        assert_eq!(inv.arg_values[4], Value::Null);
    }

    #[test]
    fn test_empty_argument_list() {
        let inv = parse_invocation("f(   )");
        assert_eq!(inv.function_name, "f");
        assert!(inv.raw_args.is_empty());
        assert!(inv.arg_values.is_empty());
    }

    #[test]
    fn test_unevaluable_arguments_degrade_to_empty() {
        let inv = parse_invocation("f(missingVariable)");
        assert_eq!(inv.function_name, "f");
        assert_eq!(inv.raw_args, vec!["missingVariable"]);
        assert!(inv.arg_values.is_empty());
    }

    #[test]
    fn test_fallback_for_non_call_text() {
        let inv = parse_invocation("expect f(1, 2) toBe 3");
        assert_eq!(inv.function_name, "f");
        assert_eq!(inv.arg_values, vec![Value::Number(1.0), Value::Number(2.0)]);
        let inv = parse_invocation("result = calc(2, [3]);");
        assert_eq!(inv.function_name, "calc");
        assert_eq!(inv.raw_args, vec!["2", "[3]"]);
        assert_eq!(
            inv.arg_values,
            vec![Value::Number(2.0), Value::array(vec![Value::Number(3.0)])]
        );
    }

    #[test]
    fn test_no_call_at_all() {
        let inv = parse_invocation("just words");
        assert_eq!(inv.function_name, UNKNOWN_FUNCTION);
        assert!(inv.arg_values.is_empty());
    }

    #[test]
    fn test_argument_text_respects_nesting_and_quotes() {
        assert_eq!(argument_text("f(g(1), ')')"), Some("g(1), ')'"));
        assert_eq!(argument_text("f(1"), Some("1"));
        assert_eq!(argument_text("f"), None);
    }
}
