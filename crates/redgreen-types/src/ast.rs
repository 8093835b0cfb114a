//! AST node types for the learner language (a JavaScript subset).
//!
//! Every node carries a [`Span`] for error reporting.
//! Function bodies are reference-counted so closures can share them
//! without cloning the tree.

use crate::Span;
use std::rc::Rc;

// ══════════════════════════════════════════════════════════════════════════════
// Top Level
// ══════════════════════════════════════════════════════════════════════════════

/// A complete learner program: a sequence of top-level statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Functions
// ══════════════════════════════════════════════════════════════════════════════

/// `function name(params) { body }`, a function expression, or an arrow.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Option<Ident>,
    pub params: Vec<Param>,
    pub body: FunctionBody,
    /// Arrow functions do not bind their own `this`.
    pub is_arrow: bool,
    pub span: Span,
}

/// A formal parameter: `x`, `x = 1`, or `...rest`.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Ident,
    pub default: Option<Expr>,
    pub rest: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    Block(Block),
    /// Arrow function with an expression body: `x => x * 2`
    Expr(Box<Expr>),
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

/// `{ statements... }`
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Function(Rc<FunctionDecl>),
    VarDecl(VarDecl),
    Expr(ExprStmt),
    Block(Block),
    If(IfStmt),
    While(WhileStmt),
    DoWhile(WhileStmt),
    For(ForStmt),
    ForOf(ForEachStmt),
    ForIn(ForEachStmt),
    Switch(SwitchStmt),
    Break(Span),
    Continue(Span),
    Return(ReturnStmt),
    Throw(ThrowStmt),
    Try(TryStmt),
    Empty(Span),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

/// `let a = 1, b;`
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub kind: VarKind,
    pub declarators: Vec<VarDeclarator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclarator {
    pub name: Ident,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

/// `if (cond) stmt [else stmt]`
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
    pub span: Span,
}

/// `while (cond) stmt` and `do stmt while (cond)`
#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

/// `for (init; test; update) stmt`
#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub init: Option<ForInit>,
    pub test: Option<Expr>,
    pub update: Option<Expr>,
    pub body: Box<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    VarDecl(VarDecl),
    Expr(Expr),
}

/// `for (const x of xs) stmt` and `for (const k in obj) stmt`
#[derive(Debug, Clone, PartialEq)]
pub struct ForEachStmt {
    /// `None` when the loop assigns to an existing binding: `for (x of xs)`.
    pub kind: Option<VarKind>,
    pub binding: Ident,
    pub iterable: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

/// `switch (expr) { case a: ... default: ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStmt {
    pub discriminant: Expr,
    pub cases: Vec<SwitchCase>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// `None` for `default:`
    pub test: Option<Expr>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// `return [expr]`
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}

/// `throw expr`
#[derive(Debug, Clone, PartialEq)]
pub struct ThrowStmt {
    pub value: Expr,
    pub span: Span,
}

/// `try { } catch (e) { } finally { }`
#[derive(Debug, Clone, PartialEq)]
pub struct TryStmt {
    pub block: Block,
    pub handler: Option<CatchClause>,
    pub finalizer: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub param: Option<Ident>,
    pub body: Block,
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // ── Literals ──
    NumberLit(f64),
    StringLit(String),
    TemplateLit(Vec<TemplatePart>),
    BoolLit(bool),
    NullLit,
    ArrayLit(Vec<ArrayElement>),
    ObjectLit(Vec<PropertyEntry>),
    Function(Rc<FunctionDecl>),

    // ── Names ──
    Identifier(String),
    This,

    // ── Access & calls ──
    Member {
        object: Box<Expr>,
        property: MemberProperty,
        /// `a?.b`
        optional: bool,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Argument>,
        /// `f?.()`
        optional: bool,
    },
    New {
        callee: Box<Expr>,
        args: Vec<Argument>,
    },
    /// Root of a member/call chain that contains at least one `?.`.
    /// A nullish optional link short-circuits the whole chain to `undefined`.
    OptionalChain(Box<Expr>),

    // ── Operators ──
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Update {
        op: UpdateOp,
        prefix: bool,
        target: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    Logical {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Assign {
        target: Box<Expr>,
        op: AssignOp,
        value: Box<Expr>,
    },
    Paren(Box<Expr>),
}

/// Piece of a template literal: `` `a ${b} c` ``
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Literal(String),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayElement {
    Expr(Expr),
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyEntry {
    /// `key: value`, `key` (shorthand) or `key() { }` (method)
    Field { key: String, value: Expr },
    /// `...expr`
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberProperty {
    /// `.name`
    Named(Ident),
    /// `[expr]`
    Computed(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Expr(Expr),
    Spread(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Neg,
    /// `+`
    Plus,
    /// `typeof`
    TypeOf,
    /// `void`
    Void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    /// `==`
    LooseEq,
    /// `!=`
    LooseNotEq,
    /// `===`
    StrictEq,
    /// `!==`
    StrictNotEq,
    /// `in`
    In,
    /// `instanceof`
    InstanceOf,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Pow => "**",
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessEq => "<=",
            Self::GreaterEq => ">=",
            Self::LooseEq => "==",
            Self::LooseNotEq => "!=",
            Self::StrictEq => "===",
            Self::StrictNotEq => "!==",
            Self::In => "in",
            Self::InstanceOf => "instanceof",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    /// `&&`
    And,
    /// `||`
    Or,
    /// `??`
    Nullish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl AssignOp {
    /// The binary operator a compound assignment applies, if any.
    pub fn binary(self) -> Option<BinOp> {
        match self {
            Self::Assign => None,
            Self::Add => Some(BinOp::Add),
            Self::Sub => Some(BinOp::Sub),
            Self::Mul => Some(BinOp::Mul),
            Self::Div => Some(BinOp::Div),
            Self::Mod => Some(BinOp::Mod),
            Self::Pow => Some(BinOp::Pow),
        }
    }
}
