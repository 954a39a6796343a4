//! Token recognition.

use lox_ir::{Span, Token, TokenKind};

use crate::cursor::Cursor;
use crate::{LexError, LexErrorKind, LexOutput};

pub(crate) struct Scanner<'a> {
    cursor: Cursor<'a>,
    line: u32,
    tokens: Vec<Token>,
    errors: Vec<LexError>,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Scanner {
            cursor: Cursor::new(source),
            line: 1,
            tokens: Vec::with_capacity(source.len() / 2 + 1),
            errors: Vec::new(),
        }
    }

    pub(crate) fn run(mut self) -> LexOutput {
        while !self.cursor.is_eof() {
            self.scan_token();
        }
        let end = self.cursor.pos();
        self.tokens
            .push(Token::new(TokenKind::Eof, Span::point(end), self.line));
        LexOutput {
            tokens: self.tokens,
            errors: self.errors,
        }
    }

    fn push(&mut self, kind: TokenKind, start: u32, line: u32) {
        let span = Span::new(start, self.cursor.pos());
        self.tokens.push(Token::new(kind, span, line));
    }

    fn error(&mut self, kind: LexErrorKind, start: u32, line: u32) {
        let span = Span::new(start, self.cursor.pos());
        tracing::trace!(?kind, ?span, line, "lex error");
        self.errors.push(LexError { kind, span, line });
    }

    fn either(&mut self, second: u8, matched: TokenKind, single: TokenKind) -> TokenKind {
        if self.cursor.eat(second) {
            matched
        } else {
            single
        }
    }

    fn scan_token(&mut self) {
        let start = self.cursor.pos();
        let line = self.line;
        let c = self.cursor.current();
        self.cursor.advance();

        let kind = match c {
            b'(' => TokenKind::LeftParen,
            b')' => TokenKind::RightParen,
            b'{' => TokenKind::LeftBrace,
            b'}' => TokenKind::RightBrace,
            b',' => TokenKind::Comma,
            b'.' => TokenKind::Dot,
            b'-' => TokenKind::Minus,
            b'+' => TokenKind::Plus,
            b';' => TokenKind::Semicolon,
            b'*' => TokenKind::Star,
            b'!' => self.either(b'=', TokenKind::BangEqual, TokenKind::Bang),
            b'=' => self.either(b'=', TokenKind::EqualEqual, TokenKind::Equal),
            b'<' => self.either(b'=', TokenKind::LessEqual, TokenKind::Less),
            b'>' => self.either(b'=', TokenKind::GreaterEqual, TokenKind::Greater),
            b'/' => {
                if self.cursor.eat(b'/') {
                    self.cursor.eat_until_newline_or_eof();
                    return;
                }
                if self.cursor.eat(b'*') {
                    self.block_comment(start, line);
                    return;
                }
                TokenKind::Slash
            }
            b' ' | b'\r' | b'\t' => return,
            b'\n' => {
                self.line += 1;
                return;
            }
            b'"' => match self.string(start, line) {
                Some(kind) => kind,
                None => return,
            },
            b'0'..=b'9' => self.number(start),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(start),
            lead => {
                self.unexpected(lead, start, line);
                return;
            }
        };
        self.push(kind, start, line);
    }

    /// `lead` was already consumed; step over the rest of its character
    /// so a multi-byte character is reported once.
    fn unexpected(&mut self, lead: u8, start: u32, line: u32) {
        let width = match lead {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        for _ in 1..width {
            self.cursor.advance();
        }
        let ch = self.cursor.slice_from(start).to_string();
        self.error(LexErrorKind::UnexpectedCharacter(ch), start, line);
    }

    fn string(&mut self, start: u32, line: u32) -> Option<TokenKind> {
        let (newlines, closed) = self.cursor.skip_to_quote();
        self.line += newlines;
        if !closed {
            self.error(LexErrorKind::UnterminatedString, start, line);
            return None;
        }
        let body = self.cursor.slice_from(start + 1).to_string();
        self.cursor.advance();
        // Runtime strings are C strings; a NUL would end them early.
        if body.contains('\0') {
            self.error(LexErrorKind::NulInString, start, line);
            return None;
        }
        Some(TokenKind::String(body))
    }

    fn number(&mut self, start: u32) -> TokenKind {
        self.cursor.eat_while(|b| b.is_ascii_digit());
        if self.cursor.current() == b'.' && self.cursor.peek().is_ascii_digit() {
            self.cursor.advance();
            self.cursor.eat_while(|b| b.is_ascii_digit());
        }
        // Digits with at most one interior '.' always parse.
        let value = self.cursor.slice_from(start).parse().unwrap_or(0.0);
        TokenKind::Number(value)
    }

    fn identifier(&mut self, start: u32) -> TokenKind {
        self.cursor
            .eat_while(|b| b.is_ascii_alphanumeric() || b == b'_');
        let text = self.cursor.slice_from(start);
        TokenKind::keyword(text).unwrap_or_else(|| TokenKind::Identifier(text.to_string()))
    }

    /// Block comments nest: `/* a /* b */ c */` is one comment.
    fn block_comment(&mut self, start: u32, line: u32) {
        let mut depth = 1u32;
        while depth > 0 && !self.cursor.is_eof() {
            match (self.cursor.current(), self.cursor.peek()) {
                (b'/', b'*') => {
                    self.cursor.advance();
                    self.cursor.advance();
                    depth += 1;
                }
                (b'*', b'/') => {
                    self.cursor.advance();
                    self.cursor.advance();
                    depth -= 1;
                }
                (b'\n', _) => {
                    self.line += 1;
                    self.cursor.advance();
                }
                _ => self.cursor.advance(),
            }
        }
        if depth > 0 {
            self.error(LexErrorKind::UnterminatedBlockComment, start, line);
        }
    }
}
