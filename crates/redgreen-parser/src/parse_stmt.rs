//! Statement parsing.

use std::rc::Rc;

use crate::parser::Parser;
use redgreen_lexer::token::TokenKind;
use redgreen_types::ast::*;
use redgreen_types::{ErrorCode, Span};

impl<'src> Parser<'src> {
    /// Parse a block of statements: `{ stmts... }`
    pub(crate) fn parse_block(&mut self) -> Option<Block> {
        let start = self.current_span();
        self.expect(&TokenKind::LBrace)?;
        let stmts = self.parse_statement_list(|kind| *kind == TokenKind::RBrace);
        self.expect(&TokenKind::RBrace)?;
        let span = start.merge(self.previous_span());
        Some(Block { stmts, span })
    }

    /// Parse statements until `stop` matches the current token (or input ends).
    fn parse_statement_list(&mut self, stop: impl Fn(&TokenKind) -> bool) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        while !stop(self.peek_kind()) && !self.at_end() {
            if self.too_many_errors() {
                break;
            }
            let before = self.position();
            match self.parse_statement() {
                Some(stmt) => stmts.push(stmt),
                None => self.synchronize(before),
            }
        }
        stmts
    }

    /// Parse a single statement.
    pub(crate) fn parse_statement(&mut self) -> Option<Stmt> {
        if !self.enter() {
            return None;
        }
        let stmt = self.parse_statement_inner();
        self.leave();
        stmt
    }

    fn parse_statement_inner(&mut self) -> Option<Stmt> {
        match self.peek_kind().clone() {
            TokenKind::LBrace => self.parse_block().map(Stmt::Block),
            TokenKind::Function => {
                let decl = self.parse_function(true)?;
                Some(Stmt::Function(Rc::new(decl)))
            }
            TokenKind::Var | TokenKind::Let | TokenKind::Const => {
                let decl = self.parse_var_decl()?;
                self.consume_semicolon();
                Some(Stmt::VarDecl(decl))
            }
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::While => self.parse_while_stmt(),
            TokenKind::Do => self.parse_do_while_stmt(),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::Switch => self.parse_switch_stmt(),
            TokenKind::Break => {
                let span = self.advance().span;
                self.reject_label();
                self.consume_semicolon();
                Some(Stmt::Break(span))
            }
            TokenKind::Continue => {
                let span = self.advance().span;
                self.reject_label();
                self.consume_semicolon();
                Some(Stmt::Continue(span))
            }
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::Throw => self.parse_throw_stmt(),
            TokenKind::Try => self.parse_try_stmt(),
            TokenKind::Semicolon => {
                let span = self.advance().span;
                Some(Stmt::Empty(span))
            }
            TokenKind::Reserved(word) => {
                self.reserved_word_error(&word);
                None
            }
            TokenKind::Identifier(_) if *self.look_ahead(1) == TokenKind::Colon => {
                self.error_at_current(ErrorCode::UNSUPPORTED_SYNTAX, "Labels are not supported");
                None
            }
            _ => {
                // Expression statement
                let expr = self.parse_expression()?;
                let span = expr.span;
                self.consume_semicolon();
                Some(Stmt::Expr(ExprStmt { expr, span }))
            }
        }
    }

    /// `break label;` / `continue label;`
    fn reject_label(&mut self) {
        if matches!(self.peek_kind(), TokenKind::Identifier(_)) && !self.newline_before() {
            self.error_at_current(ErrorCode::UNSUPPORTED_SYNTAX, "Labels are not supported");
            self.advance();
        }
    }

    /// `( expr )` around a statement head.
    fn parse_paren_condition(&mut self) -> Option<Expr> {
        self.expect(&TokenKind::LParen)?;
        let condition = self.with_in_allowed(|p| p.parse_expression())?;
        self.expect(&TokenKind::RParen)?;
        Some(condition)
    }

    /// `if (cond) stmt [else stmt]`
    fn parse_if_stmt(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        self.advance(); // eat `if`
        let condition = self.parse_paren_condition()?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.eat(&TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        let span = start.merge(self.previous_span());
        Some(Stmt::If(IfStmt {
            condition,
            then_branch,
            else_branch,
            span,
        }))
    }

    /// `while (cond) stmt`
    fn parse_while_stmt(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        self.advance(); // eat `while`
        let condition = self.parse_paren_condition()?;
        let body = Box::new(self.parse_statement()?);
        let span = start.merge(self.previous_span());
        Some(Stmt::While(WhileStmt {
            condition,
            body,
            span,
        }))
    }

    /// `do stmt while (cond) [;]`
    fn parse_do_while_stmt(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        self.advance(); // eat `do`
        let body = Box::new(self.parse_statement()?);
        self.expect(&TokenKind::While)?;
        let condition = self.parse_paren_condition()?;
        self.eat(&TokenKind::Semicolon);
        let span = start.merge(self.previous_span());
        Some(Stmt::DoWhile(WhileStmt {
            condition,
            body,
            span,
        }))
    }

    /// `for (init; test; update) stmt`, `for (x of xs) stmt`,
    /// `for (k in obj) stmt`
    fn parse_for_stmt(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        self.advance(); // eat `for`
        if matches!(self.peek_kind(), TokenKind::Reserved(w) if w == "await") {
            self.reserved_word_error("await");
            return None;
        }
        self.expect(&TokenKind::LParen)?;

        // ── Head ──
        let init = match self.peek_kind() {
            TokenKind::Semicolon => None,
            TokenKind::Var | TokenKind::Let | TokenKind::Const => {
                let decl_start = self.current_span();
                let kind = match self.advance().kind {
                    TokenKind::Var => VarKind::Var,
                    TokenKind::Let => VarKind::Let,
                    _ => VarKind::Const,
                };
                let binding = self.expect_identifier()?;
                if self.at_for_each_keyword() {
                    return self.parse_for_each_rest(start, Some(kind), binding);
                }
                let saved = std::mem::replace(&mut self.allow_in, false);
                let decl = self.parse_var_declarators(kind, binding, decl_start);
                self.allow_in = saved;
                Some(ForInit::VarDecl(decl?))
            }
            TokenKind::Identifier(name)
                if *self.look_ahead(1) == TokenKind::In
                    || matches!(self.look_ahead(1), TokenKind::Identifier(n) if n == "of") =>
            {
                let name = name.clone();
                let binding = Ident::new(name, self.advance().span);
                return self.parse_for_each_rest(start, None, binding);
            }
            _ => {
                let saved = std::mem::replace(&mut self.allow_in, false);
                let expr = self.parse_expression();
                self.allow_in = saved;
                Some(ForInit::Expr(expr?))
            }
        };
        self.expect(&TokenKind::Semicolon)?;

        let test = if self.check_exact(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.with_in_allowed(|p| p.parse_expression())?)
        };
        self.expect(&TokenKind::Semicolon)?;

        let update = if self.check_exact(&TokenKind::RParen) {
            None
        } else {
            Some(self.with_in_allowed(|p| p.parse_expression())?)
        };
        self.expect(&TokenKind::RParen)?;

        let body = Box::new(self.parse_statement()?);
        let span = start.merge(self.previous_span());
        Some(Stmt::For(ForStmt {
            init,
            test,
            update,
            body,
            span,
        }))
    }

    /// The rest of `for (<binding> of|in iterable) stmt`, with the cursor on
    /// `of` / `in`.
    fn parse_for_each_rest(
        &mut self,
        start: Span,
        kind: Option<VarKind>,
        binding: Ident,
    ) -> Option<Stmt> {
        let is_of = self.check_contextual("of");
        self.advance(); // eat `of` / `in`
        let iterable = self.with_in_allowed(|p| p.parse_expression())?;
        self.expect(&TokenKind::RParen)?;
        let body = Box::new(self.parse_statement()?);
        let span = start.merge(self.previous_span());
        let stmt = ForEachStmt {
            kind,
            binding,
            iterable,
            body,
            span,
        };
        Some(if is_of {
            Stmt::ForOf(stmt)
        } else {
            Stmt::ForIn(stmt)
        })
    }

    /// `switch (expr) { case a: ... default: ... }`
    fn parse_switch_stmt(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        self.advance(); // eat `switch`
        let discriminant = self.parse_paren_condition()?;
        self.expect(&TokenKind::LBrace)?;

        let mut cases = Vec::new();
        let mut seen_default = false;
        while !self.check_exact(&TokenKind::RBrace) && !self.at_end() {
            if self.too_many_errors() {
                break;
            }
            let case_start = self.current_span();
            let test = match self.peek_kind() {
                TokenKind::Case => {
                    self.advance();
                    Some(self.with_in_allowed(|p| p.parse_expression())?)
                }
                TokenKind::Default => {
                    if seen_default {
                        self.error_at_current(
                            ErrorCode::UNEXPECTED_TOKEN,
                            "More than one default clause in switch statement",
                        );
                        return None;
                    }
                    seen_default = true;
                    self.advance();
                    None
                }
                other => {
                    let message = format!("expected 'case' or 'default', got '{other}'");
                    self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, message);
                    return None;
                }
            };
            self.expect(&TokenKind::Colon)?;
            let body = self.parse_statement_list(|kind| {
                matches!(kind, TokenKind::Case | TokenKind::Default | TokenKind::RBrace)
            });
            let span = case_start.merge(self.previous_span());
            cases.push(SwitchCase { test, body, span });
        }
        self.expect(&TokenKind::RBrace)?;
        let span = start.merge(self.previous_span());
        Some(Stmt::Switch(SwitchStmt {
            discriminant,
            cases,
            span,
        }))
    }

    /// `return [expr]`; a line break right after `return` ends the statement.
    fn parse_return_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // eat `return`
        let value = if self.check_exact(&TokenKind::Semicolon)
            || self.check_exact(&TokenKind::RBrace)
            || self.at_end()
            || self.newline_before()
        {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let span = start.merge(self.previous_span());
        self.consume_semicolon();
        Some(Stmt::Return(ReturnStmt { value, span }))
    }

    /// `throw expr`
    fn parse_throw_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // eat `throw`
        if self.newline_before() {
            self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, "Illegal newline after throw");
            return None;
        }
        let value = self.parse_expression()?;
        let span = start.merge(self.previous_span());
        self.consume_semicolon();
        Some(Stmt::Throw(ThrowStmt { value, span }))
    }

    /// `try { } [catch [(e)] { }] [finally { }]`
    fn parse_try_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // eat `try`
        let block = self.parse_block()?;

        let handler = if self.eat(&TokenKind::Catch) {
            let param = if self.eat(&TokenKind::LParen) {
                let param = self.expect_identifier()?;
                self.expect(&TokenKind::RParen)?;
                Some(param)
            } else {
                None
            };
            let body = self.parse_block()?;
            Some(CatchClause { param, body })
        } else {
            None
        };

        let finalizer = if self.eat(&TokenKind::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                "Missing catch or finally after try",
            );
            return None;
        }

        let span = start.merge(self.previous_span());
        Some(Stmt::Try(TryStmt {
            block,
            handler,
            finalizer,
            span,
        }))
    }
}
