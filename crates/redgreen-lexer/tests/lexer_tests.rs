//! Lexer tests.
//!
//! Covers: keywords and reserved words, operators, number/string/template
//! literals, comments, line-break tracking, error recovery, spans, and the
//! 100-iteration determinism test.

use redgreen_lexer::{Lexer, Token, TokenKind};
use redgreen_types::{ErrorCode, SourceFile};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

/// Lex source text and return all tokens (including the final Eof).
fn tokens(source: &str) -> Vec<Token> {
    let sf = SourceFile::new("learner.js", source);
    Lexer::new(&sf).lex().tokens
}

/// Lex source text and return just the token kinds (excluding final Eof).
fn kinds(source: &str) -> Vec<TokenKind> {
    tokens(source)
        .into_iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .map(|t| t.kind)
        .collect()
}

/// Lex and return the error count.
fn error_count(source: &str) -> usize {
    let sf = SourceFile::new("learner.js", source);
    Lexer::new(&sf).lex().errors.total_errors
}

/// Lex and return the first error's code and message.
fn first_error(source: &str) -> (ErrorCode, String) {
    let sf = SourceFile::new("learner.js", source);
    let result = Lexer::new(&sf).lex();
    let err = result.errors.errors.first().expect("expected an error");
    (err.code, err.message.clone())
}

fn ident(name: &str) -> TokenKind {
    TokenKind::Identifier(name.to_string())
}

// ─────────────────────────────────────────────────────────────────────
// Keywords
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_declaration_keywords() {
    let pairs = [
        ("function", TokenKind::Function),
        ("var", TokenKind::Var),
        ("let", TokenKind::Let),
        ("const", TokenKind::Const),
        ("return", TokenKind::Return),
    ];
    for (src, expected) in &pairs {
        assert_eq!(kinds(src), vec![expected.clone()], "keyword '{src}'");
    }
}

#[test]
fn test_control_flow_keywords() {
    let src = "if else while do for in switch case default break continue throw try catch finally";
    assert_eq!(
        kinds(src),
        vec![
            TokenKind::If,
            TokenKind::Else,
            TokenKind::While,
            TokenKind::Do,
            TokenKind::For,
            TokenKind::In,
            TokenKind::Switch,
            TokenKind::Case,
            TokenKind::Default,
            TokenKind::Break,
            TokenKind::Continue,
            TokenKind::Throw,
            TokenKind::Try,
            TokenKind::Catch,
            TokenKind::Finally,
        ]
    );
}

#[test]
fn test_reserved_words_lex_as_reserved() {
    for word in ["class", "async", "await", "delete", "instanceof"] {
        assert_eq!(
            kinds(word),
            vec![TokenKind::Reserved(word.to_string())],
            "reserved '{word}'"
        );
    }
}

#[test]
fn test_of_is_an_identifier() {
    assert_eq!(kinds("of"), vec![ident("of")]);
}

#[test]
fn test_identifier_characters() {
    assert_eq!(
        kinds("$el _tmp fuel2 naïve"),
        vec![ident("$el"), ident("_tmp"), ident("fuel2"), ident("naïve")]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Operators
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_all_operator_tokens() {
    let src = "+ - * ** / % ++ -- = += -= *= /= %= **= == != === !== < > <= >= && || ?? ! ? ?. => ...";
    assert_eq!(
        kinds(src),
        vec![
            TokenKind::Plus,
            TokenKind::Minus,
            TokenKind::Star,
            TokenKind::StarStar,
            TokenKind::Slash,
            TokenKind::Percent,
            TokenKind::PlusPlus,
            TokenKind::MinusMinus,
            TokenKind::Eq,
            TokenKind::PlusEq,
            TokenKind::MinusEq,
            TokenKind::StarEq,
            TokenKind::SlashEq,
            TokenKind::PercentEq,
            TokenKind::StarStarEq,
            TokenKind::EqEq,
            TokenKind::BangEq,
            TokenKind::EqEqEq,
            TokenKind::BangEqEq,
            TokenKind::Less,
            TokenKind::Greater,
            TokenKind::LessEq,
            TokenKind::GreaterEq,
            TokenKind::AmpAmp,
            TokenKind::PipePipe,
            TokenKind::QuestionQuestion,
            TokenKind::Bang,
            TokenKind::Question,
            TokenKind::QuestionDot,
            TokenKind::Arrow,
            TokenKind::DotDotDot,
        ]
    );
}

#[test]
fn test_punctuation() {
    assert_eq!(
        kinds("( ) { } [ ] , ; : ."),
        vec![
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::LBrace,
            TokenKind::RBrace,
            TokenKind::LBracket,
            TokenKind::RBracket,
            TokenKind::Comma,
            TokenKind::Semicolon,
            TokenKind::Colon,
            TokenKind::Dot,
        ]
    );
}

#[test]
fn test_question_dot_before_digit_is_conditional() {
    assert_eq!(
        kinds("a?.5:1"),
        vec![
            ident("a"),
            TokenKind::Question,
            TokenKind::NumberLit(0.5),
            TokenKind::Colon,
            TokenKind::NumberLit(1.0),
        ]
    );
}

#[test]
fn test_bitwise_operators_rejected() {
    let (code, msg) = first_error("a & b");
    assert_eq!(code, ErrorCode::UNSUPPORTED_SYNTAX);
    assert!(msg.contains("'&'"), "{msg}");

    let (code, msg) = first_error("a >>> 2");
    assert_eq!(code, ErrorCode::UNSUPPORTED_SYNTAX);
    assert!(msg.contains("'>>>'"), "{msg}");
}

// ─────────────────────────────────────────────────────────────────────
// Numbers
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_integer_and_decimal_literals() {
    assert_eq!(
        kinds("0 42 3.14 .5 10."),
        vec![
            TokenKind::NumberLit(0.0),
            TokenKind::NumberLit(42.0),
            TokenKind::NumberLit(3.14),
            TokenKind::NumberLit(0.5),
            TokenKind::NumberLit(10.0),
        ]
    );
}

#[test]
fn test_exponent_and_radix_literals() {
    assert_eq!(
        kinds("1e3 2.5E-2 0xff 0b101 0o17 1_000"),
        vec![
            TokenKind::NumberLit(1000.0),
            TokenKind::NumberLit(0.025),
            TokenKind::NumberLit(255.0),
            TokenKind::NumberLit(5.0),
            TokenKind::NumberLit(15.0),
            TokenKind::NumberLit(1000.0),
        ]
    );
}

#[test]
fn test_member_access_after_number() {
    assert_eq!(
        kinds("3.5.toFixed"),
        vec![TokenKind::NumberLit(3.5), TokenKind::Dot, ident("toFixed")]
    );
}

#[test]
fn test_number_running_into_identifier_is_error() {
    let (code, _) = first_error("3in");
    assert_eq!(code, ErrorCode::INVALID_NUMBER);
}

// ─────────────────────────────────────────────────────────────────────
// Strings
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_single_and_double_quoted_strings() {
    assert_eq!(
        kinds(r#"'hello' "world" 'it"s' "it's""#),
        vec![
            TokenKind::StringLit("hello".into()),
            TokenKind::StringLit("world".into()),
            TokenKind::StringLit("it\"s".into()),
            TokenKind::StringLit("it's".into()),
        ]
    );
}

#[test]
fn test_string_escape_sequences() {
    assert_eq!(
        kinds(r#""a\nb\t\\\"\x41B\u{1F680}\q""#),
        vec![TokenKind::StringLit("a\nb\t\\\"AB\u{1F680}q".into())]
    );
}

#[test]
fn test_unterminated_string() {
    let (code, msg) = first_error("'abc\nreturn");
    assert_eq!(code, ErrorCode::UNTERMINATED_STRING);
    assert_eq!(msg, "Unterminated string literal");
}

#[test]
fn test_invalid_hex_escape() {
    let (code, _) = first_error(r#""\xZZ""#);
    assert_eq!(code, ErrorCode::INVALID_ESCAPE);
}

// ─────────────────────────────────────────────────────────────────────
// Template literals
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_plain_template() {
    assert_eq!(
        kinds("`line1\nline2`"),
        vec![TokenKind::TemplateString("line1\nline2".into())]
    );
}

#[test]
fn test_template_interpolation_simple() {
    assert_eq!(
        kinds("`Hello ${name}!`"),
        vec![
            TokenKind::TemplateStart("Hello ".into()),
            TokenKind::InterpolationStart,
            ident("name"),
            TokenKind::InterpolationEnd,
            TokenKind::TemplateEnd("!".into()),
        ]
    );
}

#[test]
fn test_template_interpolation_multiple() {
    assert_eq!(
        kinds("`${a} + ${b}`"),
        vec![
            TokenKind::TemplateStart("".into()),
            TokenKind::InterpolationStart,
            ident("a"),
            TokenKind::InterpolationEnd,
            TokenKind::TemplatePart(" + ".into()),
            TokenKind::InterpolationStart,
            ident("b"),
            TokenKind::InterpolationEnd,
            TokenKind::TemplateEnd("".into()),
        ]
    );
}

#[test]
fn test_template_interpolation_with_braces() {
    assert_eq!(
        kinds("`${ {a: 1}.a }`"),
        vec![
            TokenKind::TemplateStart("".into()),
            TokenKind::InterpolationStart,
            TokenKind::LBrace,
            ident("a"),
            TokenKind::Colon,
            TokenKind::NumberLit(1.0),
            TokenKind::RBrace,
            TokenKind::Dot,
            ident("a"),
            TokenKind::InterpolationEnd,
            TokenKind::TemplateEnd("".into()),
        ]
    );
}

#[test]
fn test_nested_template() {
    assert_eq!(
        kinds("`a${`b${c}`}`"),
        vec![
            TokenKind::TemplateStart("a".into()),
            TokenKind::InterpolationStart,
            TokenKind::TemplateStart("b".into()),
            TokenKind::InterpolationStart,
            ident("c"),
            TokenKind::InterpolationEnd,
            TokenKind::TemplateEnd("".into()),
            TokenKind::InterpolationEnd,
            TokenKind::TemplateEnd("".into()),
        ]
    );
}

#[test]
fn test_escaped_dollar_in_template() {
    assert_eq!(
        kinds(r"`\${x}`"),
        vec![TokenKind::TemplateString("${x}".into())]
    );
}

#[test]
fn test_unterminated_template() {
    let (code, msg) = first_error("`abc ${x}");
    assert_eq!(code, ErrorCode::UNTERMINATED_STRING);
    assert_eq!(msg, "Unterminated template literal");
}

// ─────────────────────────────────────────────────────────────────────
// Comments & line breaks
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_comments_stripped() {
    assert_eq!(
        kinds("a // trailing\n/* block\n comment */ b /* inline */ c"),
        vec![ident("a"), ident("b"), ident("c")]
    );
}

#[test]
fn test_unterminated_block_comment() {
    let (code, msg) = first_error("a /* never closed");
    assert_eq!(code, ErrorCode::UNCLOSED_DELIMITER);
    assert_eq!(msg, "Unterminated comment");
}

#[test]
fn test_newline_before_flag() {
    let toks = tokens("a\nb c /*\n*/ d // x\ne");
    let flags: Vec<bool> = toks.iter().map(|t| t.newline_before).collect();
    // a, b, c, d, e, Eof
    assert_eq!(flags, vec![false, true, false, true, true, false]);
}

// ─────────────────────────────────────────────────────────────────────
// Spans
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_token_spans_are_char_based() {
    let toks = tokens("let s = \"héllo\";\n  s");
    assert_eq!(toks[0].span.start_col, 1);
    assert_eq!(toks[0].span.end_col, 3);
    // "héllo" spans columns 9..=15 even though é is two bytes
    assert_eq!(toks[3].span.start_col, 9);
    assert_eq!(toks[3].span.end_col, 15);
    assert_eq!(toks[4].kind, TokenKind::Semicolon);
    assert_eq!(toks[4].span.start_col, 16);
    assert_eq!(toks[5].span.start_line, 2);
    assert_eq!(toks[5].span.start_col, 3);
}

// ─────────────────────────────────────────────────────────────────────
// Error recovery
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_unexpected_character_recovers() {
    assert_eq!(kinds("a # b"), vec![ident("a"), ident("b")]);
    let (code, msg) = first_error("a # b");
    assert_eq!(code, ErrorCode::UNEXPECTED_TOKEN);
    assert_eq!(msg, "Unexpected character '#'");
}

#[test]
fn test_error_cap() {
    let src = "#".repeat(50);
    assert_eq!(error_count(&src), 20);
}

#[test]
fn test_empty_source() {
    let toks = tokens("");
    assert_eq!(toks.len(), 1);
    assert_eq!(toks[0].kind, TokenKind::Eof);
}

// ─────────────────────────────────────────────────────────────────────
// Determinism
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_determinism_100_iterations() {
    let src = r#"function findNearest(distances) {
  if (!distances || distances.length === 0) return null;
  const valid = distances.filter(d => d > 0);
  return `nearest: ${Math.min(...valid)}`;
}"#;
    let first = tokens(src);
    for _ in 0..100 {
        assert_eq!(tokens(src), first);
    }
}
