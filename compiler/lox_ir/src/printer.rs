//! Parenthesised prefix rendering of an expression tree, for `llox parse`.

use std::fmt::Write;

use crate::stack::ensure_sufficient_stack;
use crate::{ExprArena, ExprId, ExprKind, Value};

/// Render `id` as `(+ 1 (group (- 2)))`.
pub fn print_expr(arena: &ExprArena, id: ExprId) -> String {
    let mut out = String::new();
    write_expr(arena, id, &mut out);
    out
}

fn write_expr(arena: &ExprArena, id: ExprId, out: &mut String) {
    ensure_sufficient_stack(|| match &arena.get_expr(id).kind {
        ExprKind::Binary { op, left, right } => {
            out.push('(');
            out.push_str(op.as_symbol());
            out.push(' ');
            write_expr(arena, *left, out);
            out.push(' ');
            write_expr(arena, *right, out);
            out.push(')');
        }
        ExprKind::Unary { op, operand } => {
            out.push('(');
            out.push_str(op.as_symbol());
            out.push(' ');
            write_expr(arena, *operand, out);
            out.push(')');
        }
        ExprKind::Grouping(inner) => {
            out.push_str("(group ");
            write_expr(arena, *inner, out);
            out.push(')');
        }
        ExprKind::Literal(value) => write_literal(value, out),
    });
}

fn write_literal(value: &Value, out: &mut String) {
    // Writing into a String cannot fail.
    let _ = match value {
        Value::Nil => write!(out, "nil"),
        Value::Bool(b) => write!(out, "{b}"),
        Value::Number(n) => write!(out, "{n}"),
        Value::Str(s) => write!(out, "\"{s}\""),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BinaryOp, Expr, Span, UnaryOp};
    use pretty_assertions::assert_eq;

    #[test]
    fn nested_expression() {
        let mut arena = ExprArena::new();
        let one = arena.literal(Value::Number(1.0), Span::DUMMY, 1);
        let half = arena.literal(Value::Number(2.5), Span::DUMMY, 1);
        let neg = arena.alloc_expr(Expr::new(
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand: half,
            },
            Span::DUMMY,
            1,
        ));
        let group = arena.alloc_expr(Expr::new(ExprKind::Grouping(neg), Span::DUMMY, 1));
        let root = arena.alloc_expr(Expr::new(
            ExprKind::Binary {
                op: BinaryOp::Mul,
                left: one,
                right: group,
            },
            Span::DUMMY,
            1,
        ));

        assert_eq!(print_expr(&arena, root), "(* 1 (group (- 2.5)))");
    }

    #[test]
    fn literals() {
        let mut arena = ExprArena::new();
        let s = arena.literal(Value::Str("hi".into()), Span::DUMMY, 1);
        let n = arena.literal(Value::Nil, Span::DUMMY, 1);
        let b = arena.literal(Value::Bool(false), Span::DUMMY, 1);
        assert_eq!(print_expr(&arena, s), "\"hi\"");
        assert_eq!(print_expr(&arena, n), "nil");
        assert_eq!(print_expr(&arena, b), "false");
    }
}
