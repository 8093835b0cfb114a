//! Token types for the learner-language lexer.
//!
//! Defines [`TokenKind`] covering every lexeme of the supported JavaScript
//! subset and [`Token`], which pairs a kind with a source [`Span`].

use redgreen_types::Span;
use std::fmt;

/// Every reserved word the lexer recognises.
///
/// The first group is supported by the parser. The second group is reserved
/// so that programs using those features fail to compile with a clear
/// message instead of being misread as identifiers.
pub const ALL_KEYWORDS: &[&str] = &[
    // Declarations & control flow
    "function", "var", "let", "const", "if", "else", "while", "do", "for", "in",
    "switch", "case", "default", "break", "continue", "return", "throw", "try",
    "catch", "finally",
    // Expressions
    "new", "typeof", "void", "true", "false", "null", "this",
    // Reserved but unsupported
    "class", "async", "await", "yield", "delete", "instanceof", "with", "import",
    "export", "extends", "super", "enum",
];

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

/// A single token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What kind of token this is.
    pub kind: TokenKind,
    /// Source location.
    pub span: Span,
    /// Whether a line break separates this token from the previous one.
    /// Drives automatic semicolon insertion in the parser.
    pub newline_before: bool,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            span,
            newline_before: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────

/// Every token kind in the learner language.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Literals ──────────────────────────────────────────────

    /// Numeric literal: `42`, `3.14`, `1e3`, `0xff`
    NumberLit(f64),
    /// Single- or double-quoted string literal.
    StringLit(String),
    /// Template literal without substitutions: `` `hello` ``
    TemplateString(String),

    // ── Template Interpolation ───────────────────────────────

    /// Text before the first `${` of a template literal.
    TemplateStart(String),
    /// Text between a `}` and the next `${`.
    TemplatePart(String),
    /// Text after the last `}` up to the closing backtick.
    TemplateEnd(String),
    /// The `${` that opens an interpolation expression.
    InterpolationStart,
    /// The `}` that closes an interpolation expression.
    InterpolationEnd,

    // ── Identifiers ──────────────────────────────────────────

    /// User-defined identifier: `calculateThrust`, `$x`, `_tmp`
    Identifier(String),

    // ── Keywords ─────────────────────────────────────────────

    Function,
    Var,
    Let,
    Const,
    If,
    Else,
    While,
    Do,
    For,
    In,
    Switch,
    Case,
    Default,
    Break,
    Continue,
    Return,
    Throw,
    Try,
    Catch,
    Finally,
    New,
    Typeof,
    Void,
    True,
    False,
    Null,
    This,
    /// Reserved word whose feature is not supported (`class`, `async`, ...).
    Reserved(String),

    // ── Operators ────────────────────────────────────────────

    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `**`
    StarStar,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,
    /// `=`
    Eq,
    /// `+=`
    PlusEq,
    /// `-=`
    MinusEq,
    /// `*=`
    StarEq,
    /// `/=`
    SlashEq,
    /// `%=`
    PercentEq,
    /// `**=`
    StarStarEq,
    /// `==`
    EqEq,
    /// `!=`
    BangEq,
    /// `===`
    EqEqEq,
    /// `!==`
    BangEqEq,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `<=`
    LessEq,
    /// `>=`
    GreaterEq,
    /// `&&`
    AmpAmp,
    /// `||`
    PipePipe,
    /// `??`
    QuestionQuestion,
    /// `!`
    Bang,
    /// `?`
    Question,
    /// `?.`
    QuestionDot,
    /// `=>`
    Arrow,
    /// `...`
    DotDotDot,

    // ── Punctuation ──────────────────────────────────────────

    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `:`
    Colon,
    /// `.`
    Dot,

    // ── Special ──────────────────────────────────────────────

    /// End of file
    Eof,
}

impl TokenKind {
    /// Look up a reserved word. Returns `Some(kind)` for every entry of
    /// [`ALL_KEYWORDS`], `None` for user identifiers.
    pub fn from_keyword(s: &str) -> Option<TokenKind> {
        Some(match s {
            "function" => TokenKind::Function,
            "var" => TokenKind::Var,
            "let" => TokenKind::Let,
            "const" => TokenKind::Const,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "do" => TokenKind::Do,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "switch" => TokenKind::Switch,
            "case" => TokenKind::Case,
            "default" => TokenKind::Default,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "return" => TokenKind::Return,
            "throw" => TokenKind::Throw,
            "try" => TokenKind::Try,
            "catch" => TokenKind::Catch,
            "finally" => TokenKind::Finally,
            "new" => TokenKind::New,
            "typeof" => TokenKind::Typeof,
            "void" => TokenKind::Void,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "this" => TokenKind::This,
            "class" | "async" | "await" | "yield" | "delete" | "instanceof" | "with"
            | "import" | "export" | "extends" | "super" | "enum" => {
                TokenKind::Reserved(s.to_string())
            }
            _ => return None,
        })
    }

    /// Returns `true` if this token is a reserved word.
    ///
    /// Reserved words are still valid property names: `obj.default`,
    /// `{ new: 1 }`.
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Function
                | TokenKind::Var
                | TokenKind::Let
                | TokenKind::Const
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::While
                | TokenKind::Do
                | TokenKind::For
                | TokenKind::In
                | TokenKind::Switch
                | TokenKind::Case
                | TokenKind::Default
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Return
                | TokenKind::Throw
                | TokenKind::Try
                | TokenKind::Catch
                | TokenKind::Finally
                | TokenKind::New
                | TokenKind::Typeof
                | TokenKind::Void
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::This
                | TokenKind::Reserved(_)
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::NumberLit(n) => return write!(f, "{n}"),
            TokenKind::StringLit(s) => return write!(f, "\"{s}\""),
            TokenKind::TemplateString(s) => return write!(f, "`{s}`"),
            TokenKind::TemplateStart(s) => return write!(f, "`{s}${{"),
            TokenKind::TemplatePart(s) => return write!(f, "}}{s}${{"),
            TokenKind::TemplateEnd(s) => return write!(f, "}}{s}`"),
            TokenKind::InterpolationStart => "${",
            TokenKind::InterpolationEnd => "}",
            TokenKind::Identifier(name) => return write!(f, "{name}"),
            TokenKind::Reserved(word) => return write!(f, "{word}"),

            TokenKind::Function => "function",
            TokenKind::Var => "var",
            TokenKind::Let => "let",
            TokenKind::Const => "const",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::Do => "do",
            TokenKind::For => "for",
            TokenKind::In => "in",
            TokenKind::Switch => "switch",
            TokenKind::Case => "case",
            TokenKind::Default => "default",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Return => "return",
            TokenKind::Throw => "throw",
            TokenKind::Try => "try",
            TokenKind::Catch => "catch",
            TokenKind::Finally => "finally",
            TokenKind::New => "new",
            TokenKind::Typeof => "typeof",
            TokenKind::Void => "void",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::This => "this",

            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::StarStar => "**",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::PlusPlus => "++",
            TokenKind::MinusMinus => "--",
            TokenKind::Eq => "=",
            TokenKind::PlusEq => "+=",
            TokenKind::MinusEq => "-=",
            TokenKind::StarEq => "*=",
            TokenKind::SlashEq => "/=",
            TokenKind::PercentEq => "%=",
            TokenKind::StarStarEq => "**=",
            TokenKind::EqEq => "==",
            TokenKind::BangEq => "!=",
            TokenKind::EqEqEq => "===",
            TokenKind::BangEqEq => "!==",
            TokenKind::Less => "<",
            TokenKind::Greater => ">",
            TokenKind::LessEq => "<=",
            TokenKind::GreaterEq => ">=",
            TokenKind::AmpAmp => "&&",
            TokenKind::PipePipe => "||",
            TokenKind::QuestionQuestion => "??",
            TokenKind::Bang => "!",
            TokenKind::Question => "?",
            TokenKind::QuestionDot => "?.",
            TokenKind::Arrow => "=>",
            TokenKind::DotDotDot => "...",

            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Colon => ":",
            TokenKind::Dot => ".",

            TokenKind::Eof => "end of input",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_keyword_round_trips_through_from_keyword() {
        for kw in ALL_KEYWORDS {
            let kind = TokenKind::from_keyword(kw)
                .unwrap_or_else(|| panic!("'{kw}' should be a keyword"));
            assert!(kind.is_keyword(), "'{kw}' should report is_keyword");
            assert_eq!(kind.to_string(), *kw);
        }
    }

    #[test]
    fn identifiers_are_not_keywords() {
        for name in ["of", "undefined", "NaN", "Math", "calculateThrust"] {
            assert_eq!(TokenKind::from_keyword(name), None, "'{name}'");
        }
    }
}
