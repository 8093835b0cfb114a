//! Redgreen parser: converts a token stream into an AST.

mod parse_decl;
mod parse_expr;
mod parse_stmt;
mod parser;

pub use parser::{ExprParseResult, ParseResult, Parser, MAX_NESTING_DEPTH};

use redgreen_lexer::Lexer;
use redgreen_types::SourceFile;

/// Lex and parse a whole program. Lexer and parser errors are merged, lexer
/// errors first.
pub fn parse_program(source: &SourceFile) -> ParseResult {
    let lexed = Lexer::new(source).lex();
    let mut result = Parser::new(lexed.tokens, source).parse();
    let mut errors = lexed.errors;
    errors.extend(result.errors);
    result.errors = errors;
    result
}

/// Lex and parse a single expression such as `calculateThrust(100, 2)`.
pub fn parse_expression(source: &SourceFile) -> ExprParseResult {
    let lexed = Lexer::new(source).lex();
    let mut result = Parser::new(lexed.tokens, source).parse_standalone_expression();
    let mut errors = lexed.errors;
    errors.extend(result.errors);
    result.errors = errors;
    result
}
