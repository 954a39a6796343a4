//! Flat expression tree.
//!
//! Nodes live in an [`ExprArena`] and refer to their children by [`ExprId`],
//! so the whole tree is one `Vec` owned by the parse result. The node set is
//! closed (`Binary`, `Unary`, `Grouping`, `Literal`); every pass over the
//! tree is a single exhaustive `match` on [`ExprKind`].

use std::fmt;

use crate::{Span, Value};

/// Index into an [`ExprArena`].
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct ExprId(u32);

impl ExprId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        ExprId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExprId({})", self.0)
    }
}

/// Binary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,

    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 10] = [
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Eq,
        BinaryOp::NotEq,
        BinaryOp::Lt,
        BinaryOp::LtEq,
        BinaryOp::Gt,
        BinaryOp::GtEq,
    ];

    /// Source-level spelling, used in diagnostics and the AST printer.
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
        }
    }

    /// Whether the operator yields a boolean regardless of operand type.
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq
        )
    }

    /// Whether the operator is an (in)equality test, defined for every type.
    pub const fn is_equality(self) -> bool {
        matches!(self, Self::Eq | Self::NotEq)
    }
}

/// Unary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "!",
        }
    }
}

/// Expression node kinds.
#[derive(Clone, PartialEq, Debug)]
pub enum ExprKind {
    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    Grouping(ExprId),
    Literal(Value),
}

/// An expression node.
#[derive(Clone, PartialEq, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    /// Source line of the operator (binary/unary) or the literal token.
    /// Runtime diagnostics embed this number.
    pub line: u32,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span, line: u32) -> Self {
        Expr { kind, span, line }
    }
}

/// Owner of every node of one parsed expression.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct ExprArena {
    exprs: Vec<Expr>,
}

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node and return its id.
    ///
    /// # Panics
    /// Panics if the arena already holds `u32::MAX` nodes.
    pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        let index = u32::try_from(self.exprs.len())
            .unwrap_or_else(|_| panic!("expression arena exceeded u32::MAX nodes"));
        self.exprs.push(expr);
        ExprId::new(index)
    }

    /// Shorthand for allocating a literal node.
    pub fn literal(&mut self, value: Value, span: Span, line: u32) -> ExprId {
        self.alloc_expr(Expr::new(ExprKind::Literal(value), span, line))
    }

    #[inline]
    pub fn get_expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_hands_out_sequential_ids() {
        let mut arena = ExprArena::new();
        let one = arena.literal(Value::Number(1.0), Span::new(0, 1), 1);
        let two = arena.literal(Value::Number(2.0), Span::new(4, 5), 1);
        let sum = arena.alloc_expr(Expr::new(
            ExprKind::Binary {
                op: BinaryOp::Add,
                left: one,
                right: two,
            },
            Span::new(0, 5),
            1,
        ));

        assert_eq!(one.index(), 0);
        assert_eq!(sum.index(), 2);
        assert_eq!(arena.expr_count(), 3);
        assert!(matches!(
            arena.get_expr(sum).kind,
            ExprKind::Binary { op: BinaryOp::Add, .. }
        ));
    }

    #[test]
    fn operator_classes() {
        assert!(BinaryOp::LtEq.is_comparison());
        assert!(!BinaryOp::Add.is_comparison());
        assert!(BinaryOp::NotEq.is_equality());
        assert!(!BinaryOp::Gt.is_equality());
        assert_eq!(BinaryOp::GtEq.as_symbol(), ">=");
        assert_eq!(UnaryOp::Not.as_symbol(), "!");
    }
}
