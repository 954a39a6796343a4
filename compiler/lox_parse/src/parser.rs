//! Recursive descent over the expression grammar.
//!
//! Each precedence level is one method; binary levels loop so operators
//! associate to the left.

use lox_ir::stack::ensure_sufficient_stack;
use lox_ir::{BinaryOp, Expr, ExprArena, ExprId, ExprKind, Token, TokenKind, UnaryOp, Value};

use crate::error::{ParseError, ParseErrorKind};

type ParseResult<T> = Result<T, ParseError>;

pub(crate) struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    pub(crate) arena: ExprArena,
}

impl<'t> Parser<'t> {
    /// `tokens` must end with `Eof`.
    pub(crate) fn new(tokens: &'t [Token]) -> Self {
        Parser {
            tokens,
            pos: 0,
            arena: ExprArena::new(),
        }
    }

    /// Parse one expression that must consume all input.
    pub(crate) fn parse_program(&mut self) -> ParseResult<ExprId> {
        let root = self.expression()?;
        if !self.is_at_end() {
            return Err(ParseError::at(ParseErrorKind::TrailingTokens, self.current()));
        }
        Ok(root)
    }

    // Cursor

    fn current(&self) -> &'t Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> &'t Token {
        let token = self.current();
        if !self.is_at_end() {
            self.pos += 1;
        }
        token
    }

    // Grammar

    fn expression(&mut self) -> ParseResult<ExprId> {
        ensure_sufficient_stack(|| self.equality())
    }

    fn equality(&mut self) -> ParseResult<ExprId> {
        self.binary_level(Self::comparison, |kind| match kind {
            TokenKind::EqualEqual => Some(BinaryOp::Eq),
            TokenKind::BangEqual => Some(BinaryOp::NotEq),
            _ => None,
        })
    }

    fn comparison(&mut self) -> ParseResult<ExprId> {
        self.binary_level(Self::term, |kind| match kind {
            TokenKind::Greater => Some(BinaryOp::Gt),
            TokenKind::GreaterEqual => Some(BinaryOp::GtEq),
            TokenKind::Less => Some(BinaryOp::Lt),
            TokenKind::LessEqual => Some(BinaryOp::LtEq),
            _ => None,
        })
    }

    fn term(&mut self) -> ParseResult<ExprId> {
        self.binary_level(Self::factor, |kind| match kind {
            TokenKind::Minus => Some(BinaryOp::Sub),
            TokenKind::Plus => Some(BinaryOp::Add),
            _ => None,
        })
    }

    fn factor(&mut self) -> ParseResult<ExprId> {
        self.binary_level(Self::unary, |kind| match kind {
            TokenKind::Slash => Some(BinaryOp::Div),
            TokenKind::Star => Some(BinaryOp::Mul),
            _ => None,
        })
    }

    /// `operand ( op operand )*`, folding left.
    fn binary_level(
        &mut self,
        operand: fn(&mut Self) -> ParseResult<ExprId>,
        op_for: fn(&TokenKind) -> Option<BinaryOp>,
    ) -> ParseResult<ExprId> {
        let mut left = operand(self)?;
        while let Some(op) = op_for(&self.current().kind) {
            let op_token = self.advance();
            let right = operand(self)?;
            let span = self
                .arena
                .get_expr(left)
                .span
                .merge(self.arena.get_expr(right).span);
            left = self.arena.alloc_expr(Expr::new(
                ExprKind::Binary { op, left, right },
                span,
                op_token.line,
            ));
        }
        Ok(left)
    }

    fn unary(&mut self) -> ParseResult<ExprId> {
        let op = match self.current().kind {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            _ => return self.primary(),
        };
        let op_token = self.advance();
        let operand = ensure_sufficient_stack(|| self.unary())?;
        let span = op_token.span.merge(self.arena.get_expr(operand).span);
        Ok(self.arena.alloc_expr(Expr::new(
            ExprKind::Unary { op, operand },
            span,
            op_token.line,
        )))
    }

    fn primary(&mut self) -> ParseResult<ExprId> {
        let token = self.current();
        let value = match &token.kind {
            TokenKind::Number(n) => Value::Number(*n),
            TokenKind::String(s) => Value::Str(s.clone()),
            TokenKind::True => Value::Bool(true),
            TokenKind::False => Value::Bool(false),
            TokenKind::Nil => Value::Nil,
            TokenKind::LeftParen => return self.grouping(),
            _ => {
                return Err(ParseError::at(
                    ParseErrorKind::ExpectedExpression,
                    token,
                ))
            }
        };
        self.advance();
        Ok(self.arena.literal(value, token.span, token.line))
    }

    fn grouping(&mut self) -> ParseResult<ExprId> {
        let open = self.advance();
        let inner = self.expression()?;
        let close = self.current();
        if close.kind != TokenKind::RightParen {
            return Err(ParseError::at(ParseErrorKind::ExpectedRightParen, close));
        }
        self.advance();
        Ok(self.arena.alloc_expr(Expr::new(
            ExprKind::Grouping(inner),
            open.span.merge(close.span),
            open.line,
        )))
    }
}
