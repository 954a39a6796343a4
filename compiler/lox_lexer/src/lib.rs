//! Scanner for llox source text.
//!
//! [`lex`] turns source into a token list that always ends with one
//! [`TokenKind::Eof`]. Scanning does not stop at the first problem: every
//! error is recorded in [`LexOutput::errors`] and the scanner resumes after
//! the offending text.
//!
//! [`TokenKind::Eof`]: lox_ir::TokenKind::Eof

mod cursor;
mod scanner;

use std::fmt;

use lox_diagnostic::{Diagnostic, ErrorCode};
use lox_ir::{Span, Token};

/// What went wrong while scanning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LexErrorKind {
    /// A `"` with no closing quote before end of input.
    UnterminatedString,
    /// A character that starts no token. Holds the character.
    UnexpectedCharacter(String),
    /// A `/*` whose nesting is still open at end of input.
    UnterminatedBlockComment,
    /// A string literal holding a NUL byte.
    NulInString,
}

/// A lexical error with its location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
    /// Line where the offending text starts.
    pub line: u32,
}

impl LexError {
    pub fn code(&self) -> ErrorCode {
        match self.kind {
            LexErrorKind::UnterminatedString => ErrorCode::E0001,
            LexErrorKind::UnexpectedCharacter(_) => ErrorCode::E0002,
            LexErrorKind::UnterminatedBlockComment => ErrorCode::E0003,
            LexErrorKind::NulInString => ErrorCode::E0004,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.code()).with_message(self.to_string());
        match &self.kind {
            LexErrorKind::UnterminatedString => diag
                .with_label(self.span, "string starts here")
                .with_note("strings may span lines but must end with `\"`"),
            LexErrorKind::UnexpectedCharacter(_) => {
                diag.with_label(self.span, "not part of any token")
            }
            LexErrorKind::UnterminatedBlockComment => diag
                .with_label(self.span, "comment starts here")
                .with_note("block comments nest; each `/*` needs its own `*/`"),
            LexErrorKind::NulInString => diag
                .with_label(self.span, "string contains a NUL byte")
                .with_note("strings are printed and compared as C strings"),
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LexErrorKind::UnterminatedString => {
                write!(f, "unterminated string at line {}", self.line)
            }
            LexErrorKind::UnexpectedCharacter(ch) => {
                write!(f, "unexpected character '{ch}' at line {}", self.line)
            }
            LexErrorKind::UnterminatedBlockComment => {
                write!(f, "unterminated block comment at line {}", self.line)
            }
            LexErrorKind::NulInString => {
                write!(f, "NUL byte in string at line {}", self.line)
            }
        }
    }
}

impl std::error::Error for LexError {}

/// Result of scanning one source text.
#[derive(Clone, Debug, PartialEq)]
pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexError>,
}

impl LexOutput {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.errors.iter().map(LexError::to_diagnostic).collect()
    }
}

/// Scan `source` into tokens.
///
/// # Panics
/// Panics if `source` is larger than `u32::MAX` bytes; spans are 32-bit.
#[tracing::instrument(level = "debug", skip(source), fields(len = source.len()))]
pub fn lex(source: &str) -> LexOutput {
    assert!(
        u32::try_from(source.len()).is_ok(),
        "source exceeds u32::MAX bytes"
    );
    let output = scanner::Scanner::new(source).run();
    tracing::debug!(
        tokens = output.tokens.len(),
        errors = output.errors.len(),
        "lexed"
    );
    output
}
