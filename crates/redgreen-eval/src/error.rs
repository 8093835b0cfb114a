//! Runtime error types for the evaluator.

use crate::value::Value;

/// Message reported when a run exceeds its gas budget.
pub const BUDGET_EXHAUSTED_MESSAGE: &str = "Execution budget exhausted (possible infinite loop)";

/// Evaluation error: learner-visible exceptions, budget exhaustion, and the
/// internal control-flow signals used by the tree walker.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EvalError {
    /// Wrong kind of value: calling a non-function, reading a property of `null`.
    #[error("TypeError: {0}")]
    TypeError(String),
    /// Reading an unbound name.
    #[error("ReferenceError: {0}")]
    ReferenceError(String),
    /// Stack depth, invalid lengths, bad radix.
    #[error("RangeError: {0}")]
    RangeError(String),
    /// `JSON.parse` failures.
    #[error("SyntaxError: {0}")]
    SyntaxError(String),
    /// A value thrown by learner code with `throw`.
    #[error("Uncaught {}", .0.to_display_string())]
    Thrown(Value),
    /// Gas exhaustion. Learner `try/catch` cannot intercept this.
    #[error("{}", BUDGET_EXHAUSTED_MESSAGE)]
    GasExhausted,

    /// `return` statement (used internally for control flow)
    #[error("return")]
    Return(Value),
    /// `break` statement (used internally for control flow)
    #[error("break")]
    Break,
    /// `continue` statement (used internally for control flow)
    #[error("continue")]
    Continue,
    /// A nullish `?.` link; caught by the enclosing optional chain.
    #[error("optional chain short-circuit")]
    ShortCircuit,
}

impl EvalError {
    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::TypeError(msg.into())
    }

    pub fn range_error(msg: impl Into<String>) -> Self {
        Self::RangeError(msg.into())
    }

    /// Whether learner `try/catch` may intercept this error.
    pub fn is_catchable(&self) -> bool {
        matches!(
            self,
            Self::TypeError(_)
                | Self::ReferenceError(_)
                | Self::RangeError(_)
                | Self::SyntaxError(_)
                | Self::Thrown(_)
        )
    }

    /// The text a learner would see as `error.message`.
    ///
    /// A thrown `Error` object yields its `message` property; any other
    /// thrown value yields its string form.
    pub fn message(&self) -> String {
        match self {
            Self::TypeError(msg)
            | Self::ReferenceError(msg)
            | Self::RangeError(msg)
            | Self::SyntaxError(msg) => msg.clone(),
            Self::Thrown(value) => match value.error_message() {
                Some(msg) => msg,
                None => value.to_display_string(),
            },
            Self::GasExhausted => BUDGET_EXHAUSTED_MESSAGE.to_string(),
            Self::Return(_) => "Illegal return statement".to_string(),
            Self::Break => "Illegal break statement".to_string(),
            Self::Continue => "Illegal continue statement".to_string(),
            Self::ShortCircuit => "Unexpected optional chain".to_string(),
        }
    }

    /// The value bound by `catch (e)`.
    pub fn to_thrown_value(&self) -> Value {
        match self {
            Self::Thrown(value) => value.clone(),
            Self::TypeError(msg) => Value::error("TypeError", msg),
            Self::ReferenceError(msg) => Value::error("ReferenceError", msg),
            Self::RangeError(msg) => Value::error("RangeError", msg),
            Self::SyntaxError(msg) => Value::error("SyntaxError", msg),
            other => Value::error("Error", &other.message()),
        }
    }
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;
