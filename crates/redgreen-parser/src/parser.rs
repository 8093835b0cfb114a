//! Core parser infrastructure: token cursor, error reporting, helpers.

use redgreen_lexer::token::{Token, TokenKind};
use redgreen_types::ast::{Expr, Ident, Program};
use redgreen_types::{CompileErrors, ErrorCode, RedgreenError, SourceFile, Span, MAX_ERRORS};

/// Maximum syntactic nesting (statements, expressions, literals) before the
/// parser gives up on a program.
pub const MAX_NESTING_DEPTH: u32 = 64;

/// The learner-language parser.
///
/// Consumes a token stream produced by the lexer and builds an AST.
/// Collects errors and attempts recovery when possible.
pub struct Parser<'src> {
    /// The token stream.
    tokens: Vec<Token>,
    /// Current index into `tokens`.
    pos: usize,
    /// Source file for error context.
    source_file: &'src SourceFile,
    /// File name for error messages.
    file_name: String,
    /// Collected errors.
    errors: CompileErrors,
    /// Current nesting depth across statements and expressions.
    depth: u32,
    /// Whether `in` is a binary operator here (false in a `for (...)` head).
    pub(crate) allow_in: bool,
}

/// Result of parsing a program.
pub struct ParseResult {
    pub program: Option<Program>,
    pub errors: CompileErrors,
}

/// Result of parsing a single standalone expression.
pub struct ExprParseResult {
    pub expr: Option<Expr>,
    pub errors: CompileErrors,
}

impl<'src> Parser<'src> {
    /// Create a new parser from a token stream and source file.
    pub fn new(mut tokens: Vec<Token>, source_file: &'src SourceFile) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let span = tokens.last().map_or(Span::point(1, 1), |t| t.span);
            tokens.push(Token::new(TokenKind::Eof, span));
        }
        Self {
            tokens,
            pos: 0,
            file_name: source_file.name.clone(),
            source_file,
            errors: CompileErrors::empty(),
            depth: 0,
            allow_in: true,
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// Returns the current token without advancing.
    pub(crate) fn peek(&self) -> &Token {
        // `new` guarantees a trailing Eof, so the stream is never empty
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    /// Returns the kind of the current token.
    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    /// Advance the cursor by one and return the consumed token.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    /// Returns the previously consumed token's span.
    pub(crate) fn previous_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            Span::point(1, 1)
        }
    }

    /// Returns the span of the current token.
    pub(crate) fn current_span(&self) -> Span {
        self.peek().span
    }

    /// Current cursor position, for progress checks during recovery.
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    /// Returns `true` if the current token is `Eof`.
    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    /// Check if the current token matches the given kind exactly.
    pub(crate) fn check_exact(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check_exact(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Look ahead by `n` tokens from current position.
    pub(crate) fn look_ahead(&self, n: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    /// Whether a line break precedes the current token.
    pub(crate) fn newline_before(&self) -> bool {
        self.peek().newline_before
    }

    /// Returns `true` if the current token is the contextual identifier `name`
    /// (e.g. `of`).
    pub(crate) fn check_contextual(&self, name: &str) -> bool {
        matches!(self.peek_kind(), TokenKind::Identifier(n) if n == name)
    }

    /// Check whether the current `(` opens an arrow function's parameter
    /// list: scans to the matching `)` and looks for `=>` right after it.
    pub(crate) fn at_arrow_params(&self) -> bool {
        let mut depth = 0usize;
        let mut idx = self.pos;
        while let Some(token) = self.tokens.get(idx) {
            match token.kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return matches!(
                            self.tokens.get(idx + 1),
                            Some(t) if t.kind == TokenKind::Arrow && !t.newline_before
                        );
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            idx += 1;
        }
        false
    }

    // ── Statement Termination ─────────────────────────────────────────────────

    /// Consume a statement terminator. A `;` is optional before `}`, at the
    /// end of input, and when the next token starts on a new line.
    pub(crate) fn consume_semicolon(&mut self) {
        if self.eat(&TokenKind::Semicolon) {
            return;
        }
        if self.at_end() || self.check_exact(&TokenKind::RBrace) || self.newline_before() {
            return;
        }
        self.error_at_current(
            ErrorCode::MISSING_SEMICOLON,
            format!("Unexpected token '{}'", self.peek_kind()),
        );
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    /// Expect a specific token kind. Returns the token if matched, or emits an error.
    pub(crate) fn expect(&mut self, expected: &TokenKind) -> Option<Token> {
        if self.check_exact(expected) {
            Some(self.advance())
        } else {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("expected '{}', got '{}'", expected, self.peek_kind()),
            );
            None
        }
    }

    /// Expect a binding identifier (variable, parameter or function name).
    pub(crate) fn expect_identifier(&mut self) -> Option<Ident> {
        match self.peek_kind().clone() {
            TokenKind::Identifier(name) => {
                let span = self.advance().span;
                Some(Ident::new(name, span))
            }
            TokenKind::LBrace | TokenKind::LBracket => {
                self.error_at_current(
                    ErrorCode::UNSUPPORTED_SYNTAX,
                    "Destructuring patterns are not supported",
                );
                None
            }
            TokenKind::Reserved(word) => {
                self.reserved_word_error(&word);
                None
            }
            other => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected identifier, got '{other}'"),
                );
                None
            }
        }
    }

    /// Expect a property name after `.` or as an object key. Reserved words
    /// are valid property names: `obj.default`, `{ new: 1 }`.
    pub(crate) fn expect_property_name(&mut self) -> Option<Ident> {
        let kind = self.peek_kind().clone();
        match &kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                let span = self.advance().span;
                Some(Ident::new(name, span))
            }
            _ if kind.is_keyword() => {
                let name = kind.to_string();
                let span = self.advance().span;
                Some(Ident::new(name, span))
            }
            _ => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected property name, got '{kind}'"),
                );
                None
            }
        }
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    /// Report an error at the current token position.
    pub(crate) fn error_at_current(&mut self, code: ErrorCode, message: impl Into<String>) {
        let span = self.current_span();
        self.error_at(code, message, span);
    }

    /// Report an error at a specific span.
    pub(crate) fn error_at(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self
            .source_file
            .line(span.start_line)
            .unwrap_or("")
            .to_string();
        let error = RedgreenError::new(&self.file_name, code, message, span, source_line);
        self.errors.push_error(error);
    }

    /// Report use of a reserved word whose feature is not supported.
    pub(crate) fn reserved_word_error(&mut self, word: &str) {
        let message = match word {
            "class" | "extends" | "super" => "Classes are not supported".to_string(),
            "async" | "await" => "async/await is not supported".to_string(),
            "yield" => "Generators are not supported".to_string(),
            "import" | "export" => "Modules are not supported".to_string(),
            _ => format!("'{word}' is not supported"),
        };
        self.error_at_current(ErrorCode::RESERVED_WORD, message);
    }

    /// Returns `true` if we've hit the error limit and should stop.
    pub(crate) fn too_many_errors(&self) -> bool {
        self.errors.total_errors >= MAX_ERRORS
    }

    // ── Nesting ───────────────────────────────────────────────────────────────

    /// Enter one level of syntactic nesting. Returns `false` (and reports an
    /// error) when the limit is exceeded; the caller must not call
    /// [`Parser::leave`] in that case.
    pub(crate) fn enter(&mut self) -> bool {
        if self.depth >= MAX_NESTING_DEPTH {
            self.error_at_current(
                ErrorCode::NESTING_LIMIT_EXCEEDED,
                format!("Code is nested too deeply (maximum depth is {MAX_NESTING_DEPTH})"),
            );
            return false;
        }
        self.depth += 1;
        true
    }

    /// Leave one level of syntactic nesting.
    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Parse a left-associative chain with `f`. Each [`Parser::fold`] made
    /// inside nests the tree one level deeper and stays counted until the
    /// chain ends.
    pub(crate) fn chain<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let depth = self.depth;
        let result = f(self);
        self.depth = depth;
        result
    }

    /// Account for one more link of the current chain.
    pub(crate) fn fold(&mut self) -> Option<()> {
        self.enter().then_some(())
    }

    /// Run `f` with the `in` operator enabled (inside brackets, braces,
    /// parentheses and function bodies).
    pub(crate) fn with_in_allowed<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = std::mem::replace(&mut self.allow_in, true);
        let result = f(self);
        self.allow_in = saved;
        result
    }

    // ── Synchronization ───────────────────────────────────────────────────────

    /// Skip tokens until we reach a synchronization point.
    /// Used after an error to resume at a known-good position.
    pub(crate) fn synchronize(&mut self, start_pos: usize) {
        // Always make progress past the token that failed
        if self.pos == start_pos && !self.at_end() && !self.check_exact(&TokenKind::RBrace) {
            self.advance();
        }
        while !self.at_end() {
            if self.eat(&TokenKind::Semicolon) {
                return;
            }
            if self.newline_before() {
                return;
            }
            match self.peek_kind() {
                TokenKind::Function
                | TokenKind::Var
                | TokenKind::Let
                | TokenKind::Const
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Do
                | TokenKind::For
                | TokenKind::Switch
                | TokenKind::Return
                | TokenKind::Throw
                | TokenKind::Try
                | TokenKind::RBrace => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ── Public API ────────────────────────────────────────────────────────────

    /// Parse the token stream into a [`Program`] AST.
    pub fn parse(mut self) -> ParseResult {
        let program = self.parse_program();
        ParseResult {
            program,
            errors: self.errors,
        }
    }

    /// Parse the token stream as exactly one expression (an optional
    /// trailing `;` is allowed).
    pub fn parse_standalone_expression(mut self) -> ExprParseResult {
        let expr = self.parse_expression();
        if expr.is_some() {
            self.eat(&TokenKind::Semicolon);
            if !self.at_end() {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected end of input, got '{}'", self.peek_kind()),
                );
            }
        }
        ExprParseResult {
            expr,
            errors: self.errors,
        }
    }

    fn parse_program(&mut self) -> Option<Program> {
        let start = self.current_span();
        let mut body = Vec::new();
        while !self.at_end() {
            if self.too_many_errors() {
                break;
            }
            if self.check_exact(&TokenKind::RBrace) {
                self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, "Unexpected token '}'");
                self.advance();
                continue;
            }
            let before = self.position();
            match self.parse_statement() {
                Some(stmt) => body.push(stmt),
                None => self.synchronize(before),
            }
        }
        let span = start.merge(self.previous_span());
        Some(Program { body, span })
    }
}
