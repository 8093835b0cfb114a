//! Shared types for the redgreen engine.
//!
//! This crate defines the AST node types for the learner language, source
//! spans, diagnostic types, and other data structures shared by the lexer,
//! parser and evaluator.

mod error;
mod span;
pub mod ast;

pub use error::{CompileErrors, ErrorCategory, ErrorCode, RedgreenError, MAX_ERRORS};
pub use span::{SourceFile, Span};
