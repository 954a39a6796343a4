//! Parser for llox expressions.
//!
//! A program is a single expression. [`parse`] builds it into an
//! [`ExprArena`] and stops at the first error; there is nothing to
//! recover into when the whole input is one expression.

mod error;
mod parser;

use lox_diagnostic::Diagnostic;
use lox_ir::{ExprArena, ExprId, Span, Token, TokenKind};

pub use error::{Location, ParseError, ParseErrorKind};

/// Result of parsing a token list.
#[derive(Debug)]
pub struct ParseOutput {
    pub arena: ExprArena,
    /// Root expression; `None` exactly when `errors` is non-empty.
    pub root: Option<ExprId>,
    pub errors: Vec<ParseError>,
}

impl ParseOutput {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.errors.iter().map(ParseError::to_diagnostic).collect()
    }
}

/// Parse a token list produced by the lexer.
#[tracing::instrument(level = "debug", skip(tokens), fields(tokens = tokens.len()))]
pub fn parse(tokens: &[Token]) -> ParseOutput {
    let eof;
    let tokens = if tokens.is_empty() {
        eof = [Token::new(TokenKind::Eof, Span::DUMMY, 1)];
        &eof[..]
    } else {
        tokens
    };

    let mut parser = parser::Parser::new(tokens);
    let result = parser.parse_program();
    let arena = parser.arena;
    match result {
        Ok(root) => {
            tracing::debug!(nodes = arena.expr_count(), "parsed");
            ParseOutput {
                arena,
                root: Some(root),
                errors: Vec::new(),
            }
        }
        Err(error) => {
            tracing::debug!(%error, "parse failed");
            ParseOutput {
                arena,
                root: None,
                errors: vec![error],
            }
        }
    }
}

/// A successfully parsed program.
#[derive(Debug)]
pub struct ParsedProgram {
    pub arena: ExprArena,
    pub root: ExprId,
}

/// Lex and parse `source`, collecting every lexer and parser diagnostic.
///
/// Lexer errors do not prevent parsing, so one run can report both a bad
/// character and the expression it broke.
pub fn parse_source(source: &str) -> Result<ParsedProgram, Vec<Diagnostic>> {
    let lexed = lox_lexer::lex(source);
    let parsed = parse(&lexed.tokens);
    let mut diagnostics = lexed.diagnostics();
    diagnostics.extend(parsed.diagnostics());
    match parsed.root {
        Some(root) if diagnostics.is_empty() => Ok(ParsedProgram {
            arena: parsed.arena,
            root,
        }),
        _ => Err(diagnostics),
    }
}
