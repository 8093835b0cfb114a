//! Core lexer: converts learner source text to a token stream.
//!
//! Features:
//! - Every token of the supported JavaScript subset (keywords, operators,
//!   punctuation, number/string/template literals)
//! - Template literal interpolation with `${expr}` via a mode stack
//! - Line (`//`) and block (`/* */`) comments stripped
//! - Line breaks recorded on the following token for semicolon insertion
//! - Error recovery: collects up to 20 errors instead of stopping at the first

use redgreen_types::{CompileErrors, ErrorCode, RedgreenError, SourceFile, Span, MAX_ERRORS};

use crate::token::{Token, TokenKind};

/// Lexer mode: tracks whether we're scanning code or the text of a
/// template literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Normal code scanning.
    Normal,
    /// Inside a template literal, scanning text until `` ` `` or `${`.
    Template,
    /// Inside a `${...}` interpolation expression. The `u32` tracks the
    /// brace depth so we know when the interpolation's closing `}` is reached.
    Interpolation { brace_depth: u32 },
}

/// The learner-language lexer.
///
/// Converts source text into a vector of [`Token`]s, collecting up to
/// [`MAX_ERRORS`] errors along the way.
pub struct Lexer<'src> {
    /// The full source text.
    source: &'src str,
    /// Source file for error reporting.
    source_file: &'src SourceFile,
    /// File name (for errors).
    file_name: &'src str,
    /// Current byte offset into `source`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based, in characters).
    col: u32,
    /// Set when trivia skipped since the last token contained a line break.
    saw_newline: bool,
    /// Collected errors.
    errors: CompileErrors,
    /// Mode stack for template interpolation.
    mode_stack: Vec<Mode>,
    /// Pending tokens to emit before the next scan (used for interpolation).
    pending: Vec<Token>,
}

/// Result of lexing: tokens + any errors collected.
pub struct LexResult {
    /// The token stream (always ends with [`TokenKind::Eof`]).
    pub tokens: Vec<Token>,
    /// Errors encountered during lexing.
    pub errors: CompileErrors,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source file.
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source: &source_file.source,
            source_file,
            file_name: &source_file.name,
            pos: 0,
            line: 1,
            col: 1,
            saw_newline: false,
            errors: CompileErrors::empty(),
            mode_stack: vec![Mode::Normal],
            pending: Vec::new(),
        }
    }

    /// Lex the entire source file into a token stream.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();

        loop {
            if self.too_many_errors() {
                break;
            }

            // Drain any pending tokens first (e.g. InterpolationStart after TemplateStart)
            if let Some(pending) = self.pending.pop() {
                tokens.push(pending);
                continue;
            }

            let mut token = match self.current_mode() {
                Mode::Template => self.scan_template_continuation(),
                Mode::Normal | Mode::Interpolation { .. } => self.scan_normal(),
            };
            token.newline_before = std::mem::take(&mut self.saw_newline);

            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);

            if is_eof {
                break;
            }
        }

        // Ensure token stream always ends with Eof
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            tokens.push(Token::new(TokenKind::Eof, self.current_span()));
        }

        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Mode stack helpers
    // ─────────────────────────────────────────────────────────────

    fn current_mode(&self) -> Mode {
        *self.mode_stack.last().unwrap_or(&Mode::Normal)
    }

    fn push_mode(&mut self, mode: Mode) {
        self.mode_stack.push(mode);
    }

    fn pop_mode(&mut self) {
        if self.mode_stack.len() > 1 {
            self.mode_stack.pop();
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn too_many_errors(&self) -> bool {
        self.errors.total_errors >= MAX_ERRORS
    }

    fn current_span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    fn span_from(&self, start_line: u32, start_col: u32) -> Span {
        Span::new(
            start_line,
            start_col,
            self.line,
            self.col.saturating_sub(1).max(1),
        )
    }

    fn token(&self, kind: TokenKind, start_line: u32, start_col: u32) -> Token {
        Token::new(kind, self.span_from(start_line, start_col))
    }

    fn source_line_at(&self, line: u32) -> String {
        self.source_file.line(line).unwrap_or("").to_string()
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_line_at(span.start_line);
        let err = RedgreenError::new(self.file_name, code, message, span, source_line);
        self.errors.push_error(err);
    }

    fn emit_error_with_suggestion(
        &mut self,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        suggestion: impl Into<String>,
    ) {
        let source_line = self.source_line_at(span.start_line);
        let err = RedgreenError::new(self.file_name, code, message, span, source_line)
            .with_suggestion(suggestion);
        self.errors.push_error(err);
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace & comments
    // ─────────────────────────────────────────────────────────────

    /// Skip whitespace, line breaks and comments, remembering whether any
    /// line break was crossed.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some('\n') | Some('\u{2028}') | Some('\u{2029}') => {
                    self.saw_newline = true;
                    self.advance();
                }
                Some(ch) if ch.is_whitespace() || ch == '\u{feff}' => {
                    self.advance();
                }
                Some('/') if self.peek_at(1) == Some('/') => self.skip_line_comment(),
                Some('/') if self.peek_at(1) == Some('*') => self.skip_block_comment(),
                _ => break,
            }
        }
    }

    /// Skip a single-line comment (`// ...`), leaving the newline in place.
    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Skip a block comment (`/* ... */`). A line break inside counts as a
    /// line break between the surrounding tokens.
    fn skip_block_comment(&mut self) {
        let start_line = self.line;
        let start_col = self.col;
        self.advance();
        self.advance();
        loop {
            match self.peek() {
                None => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error_with_suggestion(
                        ErrorCode::UNCLOSED_DELIMITER,
                        "Unterminated comment",
                        span,
                        "Close the comment with */",
                    );
                    return;
                }
                Some('*') if self.peek_at(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    return;
                }
                Some('\n') => {
                    self.saw_newline = true;
                    self.advance();
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Normal-mode scanning
    // ─────────────────────────────────────────────────────────────

    /// Scan one token in normal (non-template) mode.
    fn scan_normal(&mut self) -> Token {
        loop {
            self.skip_trivia();

            // If we've hit the error cap, stop immediately
            if self.too_many_errors() {
                return Token::new(TokenKind::Eof, self.current_span());
            }

            if self.at_end() {
                if self
                    .mode_stack
                    .iter()
                    .any(|m| matches!(m, Mode::Template | Mode::Interpolation { .. }))
                {
                    self.emit_error(
                        ErrorCode::UNTERMINATED_STRING,
                        "Unterminated template literal",
                        self.current_span(),
                    );
                }
                return Token::new(TokenKind::Eof, self.current_span());
            }

            if let Some(token) = self.scan_token() {
                return token;
            }
            // Error recovery: the offending character was skipped, try again
        }
    }

    /// Scan the token starting at the current position. Returns `None` after
    /// reporting an unexpected character.
    fn scan_token(&mut self) -> Option<Token> {
        let start_pos = self.pos;
        let start_line = self.line;
        let start_col = self.col;
        let ch = self.advance()?;

        let kind = match ch {
            // ── String literals ──
            '"' | '\'' => return Some(self.scan_string(ch, start_line, start_col)),
            '`' => return Some(self.scan_template(start_line, start_col)),

            // ── Number literals ──
            '0'..='9' => return Some(self.scan_number(ch, start_pos, start_line, start_col)),
            '.' if matches!(self.peek(), Some('0'..='9')) => {
                return Some(self.scan_number(ch, start_pos, start_line, start_col))
            }

            // ── Identifiers & keywords ──
            c if is_ident_start(c) => {
                return Some(self.scan_identifier(start_pos, start_line, start_col))
            }

            // ── Operators ──
            '+' => {
                if self.eat('+') {
                    TokenKind::PlusPlus
                } else if self.eat('=') {
                    TokenKind::PlusEq
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.eat('-') {
                    TokenKind::MinusMinus
                } else if self.eat('=') {
                    TokenKind::MinusEq
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.eat('*') {
                    if self.eat('=') {
                        TokenKind::StarStarEq
                    } else {
                        TokenKind::StarStar
                    }
                } else if self.eat('=') {
                    TokenKind::StarEq
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                if self.eat('=') {
                    TokenKind::SlashEq
                } else {
                    TokenKind::Slash
                }
            }
            '%' => {
                if self.eat('=') {
                    TokenKind::PercentEq
                } else {
                    TokenKind::Percent
                }
            }
            '=' => {
                if self.eat('=') {
                    if self.eat('=') {
                        TokenKind::EqEqEq
                    } else {
                        TokenKind::EqEq
                    }
                } else if self.eat('>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Eq
                }
            }
            '!' => {
                if self.eat('=') {
                    if self.eat('=') {
                        TokenKind::BangEqEq
                    } else {
                        TokenKind::BangEq
                    }
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if self.eat('=') {
                    TokenKind::LessEq
                } else if self.peek() == Some('<') {
                    return self.unsupported_operator(start_line, start_col);
                } else {
                    TokenKind::Less
                }
            }
            '>' => {
                if self.eat('=') {
                    TokenKind::GreaterEq
                } else if self.peek() == Some('>') {
                    return self.unsupported_operator(start_line, start_col);
                } else {
                    TokenKind::Greater
                }
            }
            '&' => {
                if self.eat('&') {
                    TokenKind::AmpAmp
                } else {
                    return self.unsupported_operator(start_line, start_col);
                }
            }
            '|' => {
                if self.eat('|') {
                    TokenKind::PipePipe
                } else {
                    return self.unsupported_operator(start_line, start_col);
                }
            }
            '^' | '~' => return self.unsupported_operator(start_line, start_col),
            '?' => {
                if self.eat('?') {
                    TokenKind::QuestionQuestion
                } else if self.peek() == Some('.') && !matches!(self.peek_at(1), Some('0'..='9'))
                {
                    // `a ? .5 : 1` is a conditional, not an optional chain
                    self.advance();
                    TokenKind::QuestionDot
                } else {
                    TokenKind::Question
                }
            }
            '.' => {
                if self.peek() == Some('.') && self.peek_at(1) == Some('.') {
                    self.advance();
                    self.advance();
                    TokenKind::DotDotDot
                } else {
                    TokenKind::Dot
                }
            }

            // ── Punctuation ──
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,

            '{' => {
                // If we're in interpolation mode, track brace depth
                if let Some(Mode::Interpolation { brace_depth }) = self.mode_stack.last_mut() {
                    *brace_depth += 1;
                }
                TokenKind::LBrace
            }

            '}' => {
                if let Some(Mode::Interpolation { brace_depth }) = self.mode_stack.last_mut() {
                    if *brace_depth == 0 {
                        // This `}` ends the interpolation: back to template text
                        self.pop_mode();
                        self.push_mode(Mode::Template);
                        return Some(self.token(
                            TokenKind::InterpolationEnd,
                            start_line,
                            start_col,
                        ));
                    }
                    *brace_depth -= 1;
                }
                TokenKind::RBrace
            }

            other => {
                let span = self.span_from(start_line, start_col);
                self.emit_error(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("Unexpected character '{other}'"),
                    span,
                );
                return None;
            }
        };

        Some(self.token(kind, start_line, start_col))
    }

    /// Report a bitwise or shift operator and skip it.
    fn unsupported_operator(&mut self, start_line: u32, start_col: u32) -> Option<Token> {
        while matches!(self.peek(), Some('<' | '>' | '&' | '|' | '^' | '~' | '=')) {
            self.advance();
        }
        let span = self.span_from(start_line, start_col);
        let text = self.source_file.slice(span).unwrap_or("").to_string();
        self.emit_error_with_suggestion(
            ErrorCode::UNSUPPORTED_SYNTAX,
            format!("Bitwise operator '{text}' is not supported"),
            span,
            "Use '&&' / '||' for logic, or Math functions for arithmetic",
        );
        None
    }

    // ─────────────────────────────────────────────────────────────
    // Number literals
    // ─────────────────────────────────────────────────────────────

    fn scan_number(&mut self, first: char, start: usize, start_line: u32, start_col: u32) -> Token {

        // Hex / octal / binary prefixes
        if first == '0' {
            let radix = match self.peek() {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                Some('b' | 'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.advance();
                return self.scan_radix_number(radix, start_line, start_col);
            }
        }

        if first != '.' {
            self.scan_digits();
            if self.peek() == Some('.') {
                self.advance();
                self.scan_digits();
            }
        } else {
            self.scan_digits();
        }

        // Exponent
        if matches!(self.peek(), Some('e' | 'E')) {
            let has_digits = match self.peek_at(1) {
                Some('0'..='9') => true,
                Some('+' | '-') => matches!(self.peek_at(2), Some('0'..='9')),
                _ => false,
            };
            if has_digits {
                self.advance();
                if matches!(self.peek(), Some('+' | '-')) {
                    self.advance();
                }
                self.scan_digits();
            }
        }

        let text: String = self.source[start..self.pos]
            .chars()
            .filter(|&c| c != '_')
            .collect();
        let value = text.parse::<f64>().unwrap_or(f64::NAN);
        self.finish_number(value, start_line, start_col)
    }

    fn scan_radix_number(&mut self, radix: u32, start_line: u32, start_col: u32) -> Token {
        let mut value = 0.0f64;
        let mut any = false;
        while let Some(ch) = self.peek() {
            if ch == '_' {
                self.advance();
                continue;
            }
            match ch.to_digit(radix) {
                Some(d) => {
                    value = value * radix as f64 + d as f64;
                    any = true;
                    self.advance();
                }
                None => break,
            }
        }
        if !any {
            let span = self.span_from(start_line, start_col);
            self.emit_error(ErrorCode::INVALID_NUMBER, "Invalid or unexpected token", span);
        }
        self.finish_number(value, start_line, start_col)
    }

    fn scan_digits(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() || (ch == '_' && matches!(self.peek_at(1), Some('0'..='9'))) {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// A number must not run straight into an identifier: `3in`, `1px`.
    fn finish_number(&mut self, value: f64, start_line: u32, start_col: u32) -> Token {
        if self.peek().is_some_and(is_ident_part) {
            while self.peek().is_some_and(is_ident_part) {
                self.advance();
            }
            let span = self.span_from(start_line, start_col);
            self.emit_error(
                ErrorCode::INVALID_NUMBER,
                "Invalid or unexpected token",
                span,
            );
        }
        self.token(TokenKind::NumberLit(value), start_line, start_col)
    }

    // ─────────────────────────────────────────────────────────────
    // Identifiers & keywords
    // ─────────────────────────────────────────────────────────────

    fn scan_identifier(&mut self, start: usize, start_line: u32, start_col: u32) -> Token {
        // First character was already consumed
        while self.peek().is_some_and(is_ident_part) {
            self.advance();
        }

        let text = &self.source[start..self.pos];
        let kind = TokenKind::from_keyword(text)
            .unwrap_or_else(|| TokenKind::Identifier(text.to_string()));

        self.token(kind, start_line, start_col)
    }

    // ─────────────────────────────────────────────────────────────
    // String literals
    // ─────────────────────────────────────────────────────────────

    /// Scan a quoted string literal starting after the opening quote.
    fn scan_string(&mut self, quote: char, start_line: u32, start_col: u32) -> Token {
        let mut buf = String::new();

        loop {
            match self.peek() {
                None | Some('\n') => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error_with_suggestion(
                        ErrorCode::UNTERMINATED_STRING,
                        "Unterminated string literal",
                        span,
                        format!("Close the string with {quote}"),
                    );
                    return self.token(TokenKind::StringLit(buf), start_line, start_col);
                }
                Some(c) if c == quote => {
                    self.advance();
                    return self.token(TokenKind::StringLit(buf), start_line, start_col);
                }
                Some('\\') => {
                    if let Some(escaped) = self.scan_escape_sequence() {
                        buf.push(escaped);
                    }
                }
                Some(ch) => {
                    self.advance();
                    buf.push(ch);
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Template literals & interpolation
    // ─────────────────────────────────────────────────────────────

    /// Scan a template literal starting after the opening backtick.
    /// Handles two cases:
    /// 1. Plain template (no interpolation) → `TemplateString`
    /// 2. Template with interpolation → `TemplateStart`, then mode switch
    fn scan_template(&mut self, start_line: u32, start_col: u32) -> Token {
        match self.scan_template_text() {
            TemplateStop::Closed(buf) => {
                self.token(TokenKind::TemplateString(buf), start_line, start_col)
            }
            TemplateStop::Interpolation(buf) => {
                self.push_mode(Mode::Interpolation { brace_depth: 0 });
                self.queue_interpolation_start();
                self.token(TokenKind::TemplateStart(buf), start_line, start_col)
            }
            TemplateStop::Eof(buf) => {
                self.report_unterminated_template(start_line, start_col);
                self.token(TokenKind::TemplateString(buf), start_line, start_col)
            }
        }
    }

    /// Continue scanning template text after an interpolation ends.
    /// Called when we're in `Mode::Template`.
    fn scan_template_continuation(&mut self) -> Token {
        let start_line = self.line;
        let start_col = self.col;

        match self.scan_template_text() {
            TemplateStop::Closed(buf) => {
                self.pop_mode();
                self.token(TokenKind::TemplateEnd(buf), start_line, start_col)
            }
            TemplateStop::Interpolation(buf) => {
                // Replace current Template mode with Interpolation
                self.pop_mode();
                self.push_mode(Mode::Interpolation { brace_depth: 0 });
                self.queue_interpolation_start();
                self.token(TokenKind::TemplatePart(buf), start_line, start_col)
            }
            TemplateStop::Eof(buf) => {
                self.report_unterminated_template(start_line, start_col);
                self.pop_mode();
                self.token(TokenKind::TemplateEnd(buf), start_line, start_col)
            }
        }
    }

    /// Read template text up to the closing backtick, a `${`, or EOF.
    /// Template text may span lines.
    fn scan_template_text(&mut self) -> TemplateStop {
        let mut buf = String::new();
        loop {
            match self.peek() {
                None => return TemplateStop::Eof(buf),
                Some('`') => {
                    self.advance();
                    return TemplateStop::Closed(buf);
                }
                Some('$') if self.peek_at(1) == Some('{') => {
                    self.advance(); // consume '$'
                    self.advance(); // consume '{'
                    return TemplateStop::Interpolation(buf);
                }
                Some('\\') => {
                    if let Some(escaped) = self.scan_escape_sequence() {
                        buf.push(escaped);
                    }
                }
                Some('\r') => {
                    // Template text normalises CRLF to LF
                    self.advance();
                    if self.peek() != Some('\n') {
                        buf.push('\n');
                    }
                }
                Some(ch) => {
                    self.advance();
                    buf.push(ch);
                }
            }
        }
    }

    /// Queue `InterpolationStart` so it is emitted after the text token.
    fn queue_interpolation_start(&mut self) {
        let span = Span::new(
            self.line,
            self.col.saturating_sub(2).max(1),
            self.line,
            self.col.saturating_sub(1).max(1),
        );
        self.pending
            .push(Token::new(TokenKind::InterpolationStart, span));
    }

    fn report_unterminated_template(&mut self, start_line: u32, start_col: u32) {
        let span = self.span_from(start_line, start_col);
        self.emit_error_with_suggestion(
            ErrorCode::UNTERMINATED_STRING,
            "Unterminated template literal",
            span,
            "Close the template with `",
        );
    }

    // ─────────────────────────────────────────────────────────────
    // Escape sequences
    // ─────────────────────────────────────────────────────────────

    /// Scan an escape sequence starting at the `\`.
    /// Returns the unescaped character, or `None` for a line continuation
    /// or an invalid sequence (error emitted).
    fn scan_escape_sequence(&mut self) -> Option<char> {
        let start_line = self.line;
        let start_col = self.col;
        self.advance(); // consume the '\'

        match self.advance() {
            Some('n') => Some('\n'),
            Some('t') => Some('\t'),
            Some('r') => Some('\r'),
            Some('b') => Some('\u{0008}'),
            Some('f') => Some('\u{000c}'),
            Some('v') => Some('\u{000b}'),
            Some('0') if !matches!(self.peek(), Some('0'..='9')) => Some('\0'),
            Some('x') => self.scan_hex_escape(2, start_line, start_col),
            Some('u') => {
                if self.eat('{') {
                    self.scan_braced_unicode_escape(start_line, start_col)
                } else {
                    self.scan_hex_escape(4, start_line, start_col)
                }
            }
            // Line continuation
            Some('\n') => None,
            Some('\r') => {
                self.eat('\n');
                None
            }
            // Any other escaped character stands for itself: \" \' \\ \` \$
            Some(ch) => Some(ch),
            None => {
                let span = self.span_from(start_line, start_col);
                self.emit_error(
                    ErrorCode::UNTERMINATED_STRING,
                    "Unexpected end of input in escape sequence",
                    span,
                );
                None
            }
        }
    }

    fn scan_hex_escape(&mut self, digits: usize, start_line: u32, start_col: u32) -> Option<char> {
        let mut code = 0u32;
        for _ in 0..digits {
            match self.peek().and_then(|c| c.to_digit(16)) {
                Some(d) => {
                    code = code * 16 + d;
                    self.advance();
                }
                None => {
                    self.invalid_escape(start_line, start_col);
                    return None;
                }
            }
        }
        // Lone surrogates have no `char`; substitute the replacement character
        Some(char::from_u32(code).unwrap_or('\u{fffd}'))
    }

    fn scan_braced_unicode_escape(&mut self, start_line: u32, start_col: u32) -> Option<char> {
        let mut code = 0u32;
        let mut any = false;
        loop {
            match self.peek() {
                Some('}') if any => {
                    self.advance();
                    break;
                }
                Some(c) if c.is_ascii_hexdigit() && code <= 0x10ffff => {
                    code = code * 16 + c.to_digit(16).unwrap_or(0);
                    any = true;
                    self.advance();
                }
                _ => {
                    self.invalid_escape(start_line, start_col);
                    return None;
                }
            }
        }
        match char::from_u32(code) {
            Some(c) => Some(c),
            None if code <= 0x10ffff => Some('\u{fffd}'),
            None => {
                self.invalid_escape(start_line, start_col);
                None
            }
        }
    }

    fn invalid_escape(&mut self, start_line: u32, start_col: u32) {
        let span = self.span_from(start_line, start_col);
        self.emit_error(
            ErrorCode::INVALID_ESCAPE,
            "Invalid hexadecimal escape sequence",
            span,
        );
    }
}

/// Where a run of template text stopped.
enum TemplateStop {
    Closed(String),
    Interpolation(String),
    Eof(String),
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

fn is_ident_part(c: char) -> bool {
    is_ident_start(c) || c.is_alphanumeric()
}
