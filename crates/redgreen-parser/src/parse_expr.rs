//! Expression parsing with full operator precedence.
//!
//! Precedence (lowest → highest):
//! 12. `=`, `+=`, `-=`, `*=`, `/=`, `%=`, `**=`, arrow functions (right-assoc)
//! 11. `? :` (conditional)
//! 10. `??`
//! 9. `||`
//! 8. `&&`
//! 7. `==`, `!=`, `===`, `!==`
//! 6. `<`, `>`, `<=`, `>=`, `in`, `instanceof`
//! 5. `+`, `-`
//! 4. `*`, `/`, `%`
//! 3. `**` (right-assoc)
//! 2. unary `!`, `-`, `+`, `typeof`, `void`, prefix `++`/`--`; postfix `++`/`--`
//! 1. `new`, `.` / `?.` / `[]` (member access), `()` (call)

use std::rc::Rc;

use redgreen_lexer::token::TokenKind;
use redgreen_types::ast::*;
use redgreen_types::{ErrorCode, Span};

use crate::parser::Parser;

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Point
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse an expression.
    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        self.parse_assignment()
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Precedence Chain
    // ══════════════════════════════════════════════════════════════════════════

    /// `AssignExpr = ArrowFunction | CondExpr [ AssignOp AssignExpr ]`
    pub(crate) fn parse_assignment(&mut self) -> Option<Expr> {
        if !self.enter() {
            return None;
        }
        let result = self.parse_assignment_inner();
        self.leave();
        result
    }

    fn parse_assignment_inner(&mut self) -> Option<Expr> {
        // Arrow functions: `x => ...` and `(a, b) => ...`
        match self.peek_kind() {
            TokenKind::Identifier(_) if *self.look_ahead(1) == TokenKind::Arrow => {
                return self.parse_arrow_function();
            }
            TokenKind::LParen if self.at_arrow_params() => return self.parse_arrow_function(),
            TokenKind::Reserved(word) if word == "async" => {
                let word = word.clone();
                self.reserved_word_error(&word);
                return None;
            }
            _ => {}
        }

        let target = self.parse_conditional()?;
        let op = match self.peek_kind() {
            TokenKind::Eq => AssignOp::Assign,
            TokenKind::PlusEq => AssignOp::Add,
            TokenKind::MinusEq => AssignOp::Sub,
            TokenKind::StarEq => AssignOp::Mul,
            TokenKind::SlashEq => AssignOp::Div,
            TokenKind::PercentEq => AssignOp::Mod,
            TokenKind::StarStarEq => AssignOp::Pow,
            _ => return Some(target),
        };
        if !is_assignment_target(&target) {
            self.error_at(
                ErrorCode::INVALID_ASSIGNMENT_TARGET,
                "Invalid left-hand side in assignment",
                target.span,
            );
            return None;
        }
        self.advance(); // consume operator
        let value = self.parse_assignment()?;
        let span = target.span.merge(value.span);
        Some(Expr::new(
            ExprKind::Assign {
                target: Box::new(target),
                op,
                value: Box::new(value),
            },
            span,
        ))
    }

    /// `CondExpr = NullishExpr [ "?" AssignExpr ":" AssignExpr ]`
    fn parse_conditional(&mut self) -> Option<Expr> {
        let test = self.parse_nullish()?;
        if !self.eat(&TokenKind::Question) {
            return Some(test);
        }
        let consequent = self.with_in_allowed(|p| p.parse_assignment())?;
        self.expect(&TokenKind::Colon)?;
        let alternate = self.parse_assignment()?;
        let span = test.span.merge(alternate.span);
        Some(Expr::new(
            ExprKind::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            },
            span,
        ))
    }

    /// `NullishExpr = OrExpr { "??" OrExpr }`
    fn parse_nullish(&mut self) -> Option<Expr> {
        self.chain(|p| {
            let mut left = p.parse_or()?;
            while p.eat(&TokenKind::QuestionQuestion) {
                p.fold()?;
                let right = p.parse_or()?;
                left = logical(left, LogicalOp::Nullish, right);
            }
            Some(left)
        })
    }

    /// `OrExpr = AndExpr { "||" AndExpr }`
    fn parse_or(&mut self) -> Option<Expr> {
        self.chain(|p| {
            let mut left = p.parse_and()?;
            while p.eat(&TokenKind::PipePipe) {
                p.fold()?;
                let right = p.parse_and()?;
                left = logical(left, LogicalOp::Or, right);
            }
            Some(left)
        })
    }

    /// `AndExpr = EqExpr { "&&" EqExpr }`
    fn parse_and(&mut self) -> Option<Expr> {
        self.chain(|p| {
            let mut left = p.parse_equality()?;
            while p.eat(&TokenKind::AmpAmp) {
                p.fold()?;
                let right = p.parse_equality()?;
                left = logical(left, LogicalOp::And, right);
            }
            Some(left)
        })
    }

    /// `EqExpr = RelExpr { ("==" | "!=" | "===" | "!==") RelExpr }`
    fn parse_equality(&mut self) -> Option<Expr> {
        self.chain(|p| {
            let mut left = p.parse_relational()?;
            loop {
                let op = match p.peek_kind() {
                    TokenKind::EqEq => BinOp::LooseEq,
                    TokenKind::BangEq => BinOp::LooseNotEq,
                    TokenKind::EqEqEq => BinOp::StrictEq,
                    TokenKind::BangEqEq => BinOp::StrictNotEq,
                    _ => break,
                };
                p.advance();
                p.fold()?;
                let right = p.parse_relational()?;
                left = binary(left, op, right);
            }
            Some(left)
        })
    }

    /// `RelExpr = AddExpr { ("<" | ">" | "<=" | ">=" | "in" | "instanceof") AddExpr }`
    fn parse_relational(&mut self) -> Option<Expr> {
        self.chain(|p| {
            let mut left = p.parse_additive()?;
            loop {
                let op = match p.peek_kind() {
                    TokenKind::Less => BinOp::Less,
                    TokenKind::Greater => BinOp::Greater,
                    TokenKind::LessEq => BinOp::LessEq,
                    TokenKind::GreaterEq => BinOp::GreaterEq,
                    TokenKind::In if p.allow_in => BinOp::In,
                    TokenKind::Reserved(word) if word == "instanceof" => BinOp::InstanceOf,
                    _ => break,
                };
                p.advance();
                p.fold()?;
                let right = p.parse_additive()?;
                left = binary(left, op, right);
            }
            Some(left)
        })
    }

    /// `AddExpr = MulExpr { ("+" | "-") MulExpr }`
    fn parse_additive(&mut self) -> Option<Expr> {
        self.chain(|p| {
            let mut left = p.parse_multiplicative()?;
            loop {
                let op = match p.peek_kind() {
                    TokenKind::Plus => BinOp::Add,
                    TokenKind::Minus => BinOp::Sub,
                    _ => break,
                };
                p.advance();
                p.fold()?;
                let right = p.parse_multiplicative()?;
                left = binary(left, op, right);
            }
            Some(left)
        })
    }

    /// `MulExpr = ExpExpr { ("*" | "/" | "%") ExpExpr }`
    fn parse_multiplicative(&mut self) -> Option<Expr> {
        self.chain(|p| {
            let mut left = p.parse_exponent()?;
            loop {
                let op = match p.peek_kind() {
                    TokenKind::Star => BinOp::Mul,
                    TokenKind::Slash => BinOp::Div,
                    TokenKind::Percent => BinOp::Mod,
                    _ => break,
                };
                p.advance();
                p.fold()?;
                let right = p.parse_exponent()?;
                left = binary(left, op, right);
            }
            Some(left)
        })
    }

    /// `ExpExpr = UnaryExpr [ "**" ExpExpr ]`
    ///
    /// A bare unary operand on the left (`-2 ** 2`) is ambiguous and rejected.
    fn parse_exponent(&mut self) -> Option<Expr> {
        let base = self.parse_unary()?;
        if !self.check_exact(&TokenKind::StarStar) {
            return Some(base);
        }
        if matches!(base.kind, ExprKind::Unary { .. }) {
            self.error_at(
                ErrorCode::UNEXPECTED_TOKEN,
                "Unary operator used immediately before exponentiation expression; wrap it in parentheses",
                base.span,
            );
            return None;
        }
        self.advance(); // consume `**`
        if !self.enter() {
            return None;
        }
        let exponent = self.parse_exponent();
        self.leave();
        Some(binary(base, BinOp::Pow, exponent?))
    }

    /// `UnaryExpr = ("!" | "-" | "+" | "typeof" | "void") UnaryExpr
    ///            | ("++" | "--") UnaryExpr
    ///            | PostfixExpr`
    fn parse_unary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let op = match self.peek_kind() {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Typeof => UnaryOp::TypeOf,
            TokenKind::Void => UnaryOp::Void,
            TokenKind::PlusPlus | TokenKind::MinusMinus => return self.parse_prefix_update(),
            TokenKind::Reserved(word) if word == "delete" || word == "await" => {
                let word = word.clone();
                self.reserved_word_error(&word);
                return None;
            }
            _ => return self.parse_postfix(),
        };
        self.advance();
        if !self.enter() {
            return None;
        }
        let operand = self.parse_unary();
        self.leave();
        let operand = operand?;
        let span = start.merge(operand.span);
        Some(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    /// `++x` / `--x`
    fn parse_prefix_update(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let op = if self.advance().kind == TokenKind::PlusPlus {
            UpdateOp::Increment
        } else {
            UpdateOp::Decrement
        };
        if !self.enter() {
            return None;
        }
        let target = self.parse_unary();
        self.leave();
        let target = target?;
        if !is_assignment_target(&target) {
            self.error_at(
                ErrorCode::INVALID_ASSIGNMENT_TARGET,
                "Invalid left-hand side expression in prefix operation",
                target.span,
            );
            return None;
        }
        let span = start.merge(target.span);
        Some(Expr::new(
            ExprKind::Update {
                op,
                prefix: true,
                target: Box::new(target),
            },
            span,
        ))
    }

    /// `PostfixExpr = CallExpr [ "++" | "--" ]` (no line break before the operator)
    fn parse_postfix(&mut self) -> Option<Expr> {
        let expr = self.parse_call_member()?;
        let op = match self.peek_kind() {
            TokenKind::PlusPlus if !self.newline_before() => UpdateOp::Increment,
            TokenKind::MinusMinus if !self.newline_before() => UpdateOp::Decrement,
            _ => return Some(expr),
        };
        if !is_assignment_target(&expr) {
            self.error_at(
                ErrorCode::INVALID_ASSIGNMENT_TARGET,
                "Invalid left-hand side expression in postfix operation",
                expr.span,
            );
            return None;
        }
        self.advance();
        let span = expr.span.merge(self.previous_span());
        Some(Expr::new(
            ExprKind::Update {
                op,
                prefix: false,
                target: Box::new(expr),
            },
            span,
        ))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Member Access & Calls
    // ══════════════════════════════════════════════════════════════════════════

    /// `CallExpr = (NewExpr | PrimaryExpr) { "." Name | "?." Name | "[" Expr "]"
    ///           | "?.[" Expr "]" | "(" Args ")" | "?.(" Args ")" }`
    ///
    /// A chain containing `?.` is wrapped in [`ExprKind::OptionalChain`].
    fn parse_call_member(&mut self) -> Option<Expr> {
        self.chain(|p| p.parse_call_member_links())
    }

    fn parse_call_member_links(&mut self) -> Option<Expr> {
        let mut expr = if self.check_exact(&TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        let mut has_optional = false;
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance(); // eat `.`
                    self.fold()?;
                    let name = self.expect_property_name()?;
                    expr = member(expr, MemberProperty::Named(name), false, self.previous_span());
                }
                TokenKind::LBracket => {
                    self.fold()?;
                    expr = self.parse_computed_member(expr, false)?;
                }
                TokenKind::LParen => {
                    self.fold()?;
                    let args = self.parse_arguments()?;
                    expr = call(expr, args, false, self.previous_span());
                }
                TokenKind::QuestionDot => {
                    self.advance(); // eat `?.`
                    self.fold()?;
                    has_optional = true;
                    match self.peek_kind() {
                        TokenKind::LParen => {
                            let args = self.parse_arguments()?;
                            expr = call(expr, args, true, self.previous_span());
                        }
                        TokenKind::LBracket => {
                            expr = self.parse_computed_member(expr, true)?;
                        }
                        _ => {
                            let name = self.expect_property_name()?;
                            expr = member(
                                expr,
                                MemberProperty::Named(name),
                                true,
                                self.previous_span(),
                            );
                        }
                    }
                }
                TokenKind::TemplateString(_) | TokenKind::TemplateStart(_) => {
                    self.error_at_current(
                        ErrorCode::UNSUPPORTED_SYNTAX,
                        "Tagged templates are not supported",
                    );
                    return None;
                }
                _ => break,
            }
        }
        if has_optional {
            let span = expr.span;
            expr = Expr::new(ExprKind::OptionalChain(Box::new(expr)), span);
        }
        Some(expr)
    }

    /// `"[" Expr "]"` after an object expression.
    fn parse_computed_member(&mut self, object: Expr, optional: bool) -> Option<Expr> {
        self.advance(); // eat `[`
        let index = self.with_in_allowed(|p| p.parse_expression())?;
        self.expect(&TokenKind::RBracket)?;
        Some(member(
            object,
            MemberProperty::Computed(Box::new(index)),
            optional,
            self.previous_span(),
        ))
    }

    /// `new Callee [ "(" Args ")" ]`, where `Callee` is a primary expression
    /// followed by property accesses only.
    fn parse_new(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.advance(); // eat `new`
        if !self.enter() {
            return None;
        }
        let callee = self.parse_new_callee();
        self.leave();
        let callee = callee?;
        let args = if self.check_exact(&TokenKind::LParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        let span = start.merge(self.previous_span());
        Some(Expr::new(
            ExprKind::New {
                callee: Box::new(callee),
                args,
            },
            span,
        ))
    }

    fn parse_new_callee(&mut self) -> Option<Expr> {
        self.chain(|p| p.parse_new_callee_links())
    }

    fn parse_new_callee_links(&mut self) -> Option<Expr> {
        let mut callee = if self.check_exact(&TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance();
                    self.fold()?;
                    let name = self.expect_property_name()?;
                    callee = member(callee, MemberProperty::Named(name), false, self.previous_span());
                }
                TokenKind::LBracket => {
                    self.fold()?;
                    callee = self.parse_computed_member(callee, false)?;
                }
                _ => break,
            }
        }
        Some(callee)
    }

    /// Parse a parenthesised argument list, including spread arguments.
    pub(crate) fn parse_arguments(&mut self) -> Option<Vec<Argument>> {
        self.expect(&TokenKind::LParen)?;
        self.with_in_allowed(|p| {
            let mut args = Vec::new();
            while !p.check_exact(&TokenKind::RParen) {
                if p.eat(&TokenKind::DotDotDot) {
                    args.push(Argument::Spread(p.parse_assignment()?));
                } else {
                    args.push(Argument::Expr(p.parse_assignment()?));
                }
                if !p.eat(&TokenKind::Comma) {
                    break;
                }
            }
            p.expect(&TokenKind::RParen)?;
            Some(args)
        })
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Primary Expressions
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse a primary expression.
    fn parse_primary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        match self.peek_kind().clone() {
            // ── Literals ────────────────────────────────────────────────
            TokenKind::NumberLit(n) => {
                self.advance();
                Some(Expr::new(ExprKind::NumberLit(n), start))
            }
            TokenKind::StringLit(s) => {
                self.advance();
                Some(Expr::new(ExprKind::StringLit(s), start))
            }
            TokenKind::TemplateString(s) => {
                self.advance();
                Some(Expr::new(
                    ExprKind::TemplateLit(vec![TemplatePart::Literal(s)]),
                    start,
                ))
            }
            TokenKind::TemplateStart(s) => {
                self.advance();
                self.parse_template_interpolation(s, start)
            }
            TokenKind::True => {
                self.advance();
                Some(Expr::new(ExprKind::BoolLit(true), start))
            }
            TokenKind::False => {
                self.advance();
                Some(Expr::new(ExprKind::BoolLit(false), start))
            }
            TokenKind::Null => {
                self.advance();
                Some(Expr::new(ExprKind::NullLit, start))
            }

            // ── Names ───────────────────────────────────────────────────
            TokenKind::Identifier(name) => {
                self.advance();
                Some(Expr::new(ExprKind::Identifier(name), start))
            }
            TokenKind::This => {
                self.advance();
                Some(Expr::new(ExprKind::This, start))
            }

            // ── Collections ─────────────────────────────────────────────
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_object_literal(),

            // ── Grouping ────────────────────────────────────────────────
            TokenKind::LParen => {
                self.advance(); // eat `(`
                let inner = self.with_in_allowed(|p| p.parse_expression())?;
                if self.check_exact(&TokenKind::Comma) {
                    self.error_at_current(
                        ErrorCode::UNSUPPORTED_SYNTAX,
                        "The comma operator is not supported",
                    );
                    return None;
                }
                self.expect(&TokenKind::RParen)?;
                let span = start.merge(self.previous_span());
                Some(Expr::new(ExprKind::Paren(Box::new(inner)), span))
            }

            // ── Functions ───────────────────────────────────────────────
            TokenKind::Function => {
                let decl = self.parse_function(false)?;
                let span = decl.span;
                Some(Expr::new(ExprKind::Function(Rc::new(decl)), span))
            }

            // ── Unsupported ─────────────────────────────────────────────
            TokenKind::Reserved(word) => {
                self.reserved_word_error(&word);
                None
            }
            TokenKind::Slash | TokenKind::SlashEq => {
                self.error_at_current(
                    ErrorCode::UNSUPPORTED_SYNTAX,
                    "Regular expression literals are not supported",
                );
                None
            }

            other => {
                let message = if other == TokenKind::Eof {
                    "Unexpected end of input".to_string()
                } else {
                    format!("Unexpected token '{other}'")
                };
                self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, message);
                None
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Literals
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse `[expr, ...spread, , ...]`
    fn parse_array_literal(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.advance(); // eat `[`
        let elements = self.with_in_allowed(|p| {
            let mut elements = Vec::new();
            while !p.check_exact(&TokenKind::RBracket) {
                if p.check_exact(&TokenKind::Comma) {
                    // Hole: `[1, , 3]` reads as `undefined`
                    let span = p.current_span();
                    p.advance();
                    elements.push(ArrayElement::Expr(undefined_expr(span)));
                    continue;
                }
                if p.eat(&TokenKind::DotDotDot) {
                    elements.push(ArrayElement::Spread(p.parse_assignment()?));
                } else {
                    elements.push(ArrayElement::Expr(p.parse_assignment()?));
                }
                if !p.eat(&TokenKind::Comma) {
                    break;
                }
            }
            Some(elements)
        })?;
        self.expect(&TokenKind::RBracket)?;
        let span = start.merge(self.previous_span());
        Some(Expr::new(ExprKind::ArrayLit(elements), span))
    }

    /// Parse `{ key: expr, shorthand, method() { }, ...spread }` or `{}`
    fn parse_object_literal(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.advance(); // eat `{`
        let entries = self.with_in_allowed(|p| {
            let mut entries = Vec::new();
            while !p.check_exact(&TokenKind::RBrace) {
                entries.push(p.parse_property_entry()?);
                if !p.eat(&TokenKind::Comma) {
                    break;
                }
            }
            Some(entries)
        })?;
        self.expect(&TokenKind::RBrace)?;
        let span = start.merge(self.previous_span());
        Some(Expr::new(ExprKind::ObjectLit(entries), span))
    }

    fn parse_property_entry(&mut self) -> Option<PropertyEntry> {
        if self.eat(&TokenKind::DotDotDot) {
            return Some(PropertyEntry::Spread(self.parse_assignment()?));
        }

        let key_span = self.current_span();
        let is_identifier = matches!(self.peek_kind(), TokenKind::Identifier(_));
        let key = match self.peek_kind().clone() {
            TokenKind::StringLit(s) => {
                self.advance();
                s
            }
            TokenKind::NumberLit(n) => {
                self.advance();
                number_key(n)
            }
            TokenKind::LBracket => {
                self.error_at_current(
                    ErrorCode::UNSUPPORTED_SYNTAX,
                    "Computed property names are not supported",
                );
                return None;
            }
            _ => self.expect_property_name()?.name,
        };

        // Accessors: `get name() {}` / `set name(v) {}`
        if is_identifier
            && (key == "get" || key == "set")
            && !matches!(
                self.peek_kind(),
                TokenKind::Colon | TokenKind::Comma | TokenKind::RBrace | TokenKind::LParen
            )
        {
            self.error_at(
                ErrorCode::UNSUPPORTED_SYNTAX,
                "Getters and setters are not supported",
                key_span,
            );
            return None;
        }

        match self.peek_kind() {
            TokenKind::Colon => {
                self.advance();
                let value = self.parse_assignment()?;
                Some(PropertyEntry::Field { key, value })
            }
            // Method shorthand: `name(params) { body }`
            TokenKind::LParen => {
                let decl = self.parse_method(Ident::new(key.clone(), key_span))?;
                let span = decl.span;
                let value = Expr::new(ExprKind::Function(Rc::new(decl)), span);
                Some(PropertyEntry::Field { key, value })
            }
            // Shorthand: `{ name }`
            TokenKind::Comma | TokenKind::RBrace if is_identifier => {
                let value = Expr::new(ExprKind::Identifier(key.clone()), key_span);
                Some(PropertyEntry::Field { key, value })
            }
            _ => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected ':', got '{}'", self.peek_kind()),
                );
                None
            }
        }
    }

    /// Parse a template literal with interpolations: `` `text ${expr} more` ``
    ///
    /// Called after the `TemplateStart` token has been consumed.
    fn parse_template_interpolation(&mut self, start_text: String, start_span: Span) -> Option<Expr> {
        let mut parts = Vec::new();
        if !start_text.is_empty() {
            parts.push(TemplatePart::Literal(start_text));
        }
        loop {
            // Expect InterpolationStart: the `${`
            self.expect(&TokenKind::InterpolationStart)?;
            let expr = self.with_in_allowed(|p| p.parse_expression())?;
            parts.push(TemplatePart::Expr(expr));
            // Expect InterpolationEnd: the `}`
            self.expect(&TokenKind::InterpolationEnd)?;
            // What follows: TemplatePart (more interpolations) or TemplateEnd
            match self.peek_kind().clone() {
                TokenKind::TemplatePart(s) => {
                    self.advance();
                    if !s.is_empty() {
                        parts.push(TemplatePart::Literal(s));
                    }
                }
                TokenKind::TemplateEnd(s) => {
                    self.advance();
                    if !s.is_empty() {
                        parts.push(TemplatePart::Literal(s));
                    }
                    break;
                }
                _ => {
                    self.error_at_current(
                        ErrorCode::UNTERMINATED_STRING,
                        "Unterminated template literal",
                    );
                    return None;
                }
            }
        }
        let span = start_span.merge(self.previous_span());
        Some(Expr::new(ExprKind::TemplateLit(parts), span))
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Node Builders
// ══════════════════════════════════════════════════════════════════════════════

fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr::new(
        ExprKind::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        span,
    )
}

fn logical(left: Expr, op: LogicalOp, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr::new(
        ExprKind::Logical {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        span,
    )
}

fn member(object: Expr, property: MemberProperty, optional: bool, end: Span) -> Expr {
    let span = object.span.merge(end);
    Expr::new(
        ExprKind::Member {
            object: Box::new(object),
            property,
            optional,
        },
        span,
    )
}

fn call(callee: Expr, args: Vec<Argument>, optional: bool, end: Span) -> Expr {
    let span = callee.span.merge(end);
    Expr::new(
        ExprKind::Call {
            callee: Box::new(callee),
            args,
            optional,
        },
        span,
    )
}

/// `void 0`: an `undefined` that no binding can shadow.
fn undefined_expr(span: Span) -> Expr {
    Expr::new(
        ExprKind::Unary {
            op: UnaryOp::Void,
            operand: Box::new(Expr::new(ExprKind::NumberLit(0.0), span)),
        },
        span,
    )
}

/// Identifiers and non-optional member accesses (possibly parenthesised)
/// can be assigned to.
fn is_assignment_target(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Identifier(_) => true,
        ExprKind::Member { optional, .. } => !optional,
        ExprKind::Paren(inner) => is_assignment_target(inner),
        _ => false,
    }
}

/// Property key for a numeric literal key: `{ 1: "a", 1.5: "b" }`.
fn number_key(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
