//! Declaration parsing: functions, arrow functions, parameters and
//! `var` / `let` / `const` declarations.

use std::rc::Rc;

use redgreen_lexer::token::TokenKind;
use redgreen_types::ast::*;
use redgreen_types::{ErrorCode, Span};

use crate::parser::Parser;

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Functions
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse `function [name](params) { body }`.
    ///
    /// Declarations (`require_name`) must be named; function expressions may
    /// be anonymous.
    pub(crate) fn parse_function(&mut self, require_name: bool) -> Option<FunctionDecl> {
        let start = self.current_span();
        self.expect(&TokenKind::Function)?;
        if self.check_exact(&TokenKind::Star) {
            self.error_at_current(ErrorCode::UNSUPPORTED_SYNTAX, "Generators are not supported");
            return None;
        }
        let name = if require_name || !self.check_exact(&TokenKind::LParen) {
            Some(self.expect_identifier()?)
        } else {
            None
        };
        let params = self.parse_params()?;
        let body = self.parse_function_block()?;
        let span = start.merge(self.previous_span());
        Some(FunctionDecl {
            name,
            params,
            body: FunctionBody::Block(body),
            is_arrow: false,
            span,
        })
    }

    /// Parse the `(params) { body }` part of an object-literal method.
    pub(crate) fn parse_method(&mut self, name: Ident) -> Option<FunctionDecl> {
        let start = name.span;
        let params = self.parse_params()?;
        let body = self.parse_function_block()?;
        let span = start.merge(self.previous_span());
        Some(FunctionDecl {
            name: Some(name),
            params,
            body: FunctionBody::Block(body),
            is_arrow: false,
            span,
        })
    }

    /// Parse `x => body` or `(params) => body`, where `body` is a block or
    /// a single expression.
    pub(crate) fn parse_arrow_function(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let params = if self.check_exact(&TokenKind::LParen) {
            self.parse_params()?
        } else {
            let name = self.expect_identifier()?;
            vec![Param {
                name,
                default: None,
                rest: false,
            }]
        };
        self.expect(&TokenKind::Arrow)?;
        let body = if self.check_exact(&TokenKind::LBrace) {
            FunctionBody::Block(self.parse_function_block()?)
        } else {
            FunctionBody::Expr(Box::new(self.parse_assignment()?))
        };
        let span = start.merge(self.previous_span());
        let decl = FunctionDecl {
            name: None,
            params,
            body,
            is_arrow: true,
            span,
        };
        Some(Expr::new(ExprKind::Function(Rc::new(decl)), span))
    }

    /// Parse `(a, b = 1, ...rest)`.
    fn parse_params(&mut self) -> Option<Vec<Param>> {
        self.expect(&TokenKind::LParen)?;
        let params = self.with_in_allowed(|p| {
            let mut params: Vec<Param> = Vec::new();
            while !p.check_exact(&TokenKind::RParen) {
                let rest = p.eat(&TokenKind::DotDotDot);
                let name = p.expect_identifier()?;
                if params.iter().any(|existing| existing.name.name == name.name) {
                    p.error_at(
                        ErrorCode::UNEXPECTED_TOKEN,
                        "Duplicate parameter name not allowed in this context",
                        name.span,
                    );
                    return None;
                }
                let default = if !rest && p.eat(&TokenKind::Eq) {
                    Some(p.parse_assignment()?)
                } else {
                    None
                };
                params.push(Param {
                    name,
                    default,
                    rest,
                });
                if rest {
                    if !p.check_exact(&TokenKind::RParen) {
                        p.error_at_current(
                            ErrorCode::UNEXPECTED_TOKEN,
                            "Rest parameter must be last formal parameter",
                        );
                        return None;
                    }
                    break;
                }
                if !p.eat(&TokenKind::Comma) {
                    break;
                }
            }
            Some(params)
        })?;
        self.expect(&TokenKind::RParen)?;
        Some(params)
    }

    /// A function body: a block in which `in` is always an operator.
    fn parse_function_block(&mut self) -> Option<Block> {
        self.with_in_allowed(|p| p.parse_block())
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Variable Declarations
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse `var|let|const name [= init] {, name [= init]}` without the
    /// terminator. The keyword is the current token.
    pub(crate) fn parse_var_decl(&mut self) -> Option<VarDecl> {
        let start = self.current_span();
        let kind = match self.advance().kind {
            TokenKind::Var => VarKind::Var,
            TokenKind::Let => VarKind::Let,
            _ => VarKind::Const,
        };
        let first = self.expect_identifier()?;
        self.parse_var_declarators(kind, first, start)
    }

    /// Continue a declaration whose first binding name has been consumed.
    pub(crate) fn parse_var_declarators(
        &mut self,
        kind: VarKind,
        first: Ident,
        start: Span,
    ) -> Option<VarDecl> {
        let mut declarators = Vec::new();
        let mut name = first;
        loop {
            let init = if self.eat(&TokenKind::Eq) {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            if kind == VarKind::Const && init.is_none() && !self.at_for_each_keyword() {
                self.error_at(
                    ErrorCode::UNEXPECTED_TOKEN,
                    "Missing initializer in const declaration",
                    name.span,
                );
                return None;
            }
            declarators.push(VarDeclarator { name, init });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
            name = self.expect_identifier()?;
        }
        let span = start.merge(self.previous_span());
        Some(VarDecl {
            kind,
            declarators,
            span,
        })
    }

    /// `of` / `in` directly after a loop binding.
    pub(crate) fn at_for_each_keyword(&self) -> bool {
        self.check_contextual("of") || self.check_exact(&TokenKind::In)
    }
}
