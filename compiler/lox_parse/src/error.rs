//! Parse errors.

use std::fmt;

use lox_diagnostic::{Diagnostic, ErrorCode};
use lox_ir::{Span, Token, TokenKind};

/// What the parser wanted but did not get.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A `(` group not closed by `)`.
    ExpectedRightParen,
    /// No expression could start at this token.
    ExpectedExpression,
    /// A complete expression followed by more tokens.
    TrailingTokens,
}

impl ParseErrorKind {
    pub fn code(self) -> ErrorCode {
        match self {
            ParseErrorKind::ExpectedRightParen => ErrorCode::E1001,
            ParseErrorKind::ExpectedExpression => ErrorCode::E1002,
            ParseErrorKind::TrailingTokens => ErrorCode::E1003,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ParseErrorKind::ExpectedRightParen => "expected ')' after expression",
            ParseErrorKind::ExpectedExpression => "expected expression",
            ParseErrorKind::TrailingTokens => "unexpected token after expression",
        }
    }
}

/// Where a parse error was found: the end of input or a specific token.
#[derive(Clone, Debug, PartialEq)]
pub enum Location {
    End,
    Lexeme(String),
}

impl Location {
    pub(crate) fn of(token: &Token) -> Self {
        match &token.kind {
            TokenKind::Eof => Location::End,
            kind => Location::Lexeme(spelling(kind)),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::End => f.write_str("at end"),
            Location::Lexeme(text) => write!(f, "at '{text}'"),
        }
    }
}

/// Reconstruct a token's source spelling from its kind.
fn spelling(kind: &TokenKind) -> String {
    let fixed = match kind {
        TokenKind::LeftParen => "(",
        TokenKind::RightParen => ")",
        TokenKind::LeftBrace => "{",
        TokenKind::RightBrace => "}",
        TokenKind::Comma => ",",
        TokenKind::Dot => ".",
        TokenKind::Minus => "-",
        TokenKind::Plus => "+",
        TokenKind::Semicolon => ";",
        TokenKind::Slash => "/",
        TokenKind::Star => "*",
        TokenKind::Bang => "!",
        TokenKind::BangEqual => "!=",
        TokenKind::Equal => "=",
        TokenKind::EqualEqual => "==",
        TokenKind::Greater => ">",
        TokenKind::GreaterEqual => ">=",
        TokenKind::Less => "<",
        TokenKind::LessEqual => "<=",
        TokenKind::Identifier(name) => return name.clone(),
        TokenKind::String(s) => return format!("\"{s}\""),
        TokenKind::Number(n) => return n.to_string(),
        TokenKind::Eof => "",
        keyword => return keyword.name().to_ascii_lowercase(),
    };
    fixed.to_string()
}

/// A parse error with its location.
#[derive(Clone, Debug, PartialEq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub line: u32,
    pub location: Location,
}

impl ParseError {
    pub(crate) fn at(kind: ParseErrorKind, token: &Token) -> Self {
        ParseError {
            kind,
            span: token.span,
            line: token.line,
            location: Location::of(token),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.kind.code()
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.code())
            .with_message(format!("{} {}", self.kind.message(), self.location))
            .with_label(self.span, self.kind.message());
        match self.kind {
            ParseErrorKind::ExpectedRightParen => {
                diag.with_suggestion("close the group with `)`")
            }
            ParseErrorKind::ExpectedExpression => {
                diag.with_note("operands must be literals or parenthesised groups")
            }
            ParseErrorKind::TrailingTokens => {
                diag.with_note("a program is exactly one expression")
            }
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[line {}] error {}: {}",
            self.line,
            self.location,
            self.kind.message()
        )
    }
}

impl std::error::Error for ParseError {}
