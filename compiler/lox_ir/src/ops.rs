//! Operator semantics.
//!
//! [`binary_result_tag`] is the one table that says which operators a type
//! supports and what they produce. The generation-time folder
//! ([`fold_binary`], [`fold_unary`]) and the LLVM dispatcher both consult
//! it, so a combination is either valid in both evaluation strategies or
//! in neither.

use crate::{BinaryOp, TypeTag, UnaryOp, Value};

/// Result type of `left op right` when both operands carry `operand`.
///
/// `None` means the operator is undefined for that type. Operands of
/// different types never reach this table; that is a type mismatch.
pub const fn binary_result_tag(op: BinaryOp, operand: TypeTag) -> Option<TypeTag> {
    match operand {
        TypeTag::Number => {
            if op.is_comparison() {
                Some(TypeTag::Boolean)
            } else {
                Some(TypeTag::Number)
            }
        }
        TypeTag::String => match op {
            BinaryOp::Add => Some(TypeTag::String),
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => None,
            _ => Some(TypeTag::Boolean),
        },
        TypeTag::Boolean | TypeTag::Nil => {
            if op.is_equality() {
                Some(TypeTag::Boolean)
            } else {
                None
            }
        }
    }
}

/// Operand type a unary operator requires, if any.
///
/// `-` only accepts numbers; `!` works on every value through truthiness.
pub const fn unary_operand_tag(op: UnaryOp) -> Option<TypeTag> {
    match op {
        UnaryOp::Neg => Some(TypeTag::Number),
        UnaryOp::Not => None,
    }
}

/// Evaluate `left op right` at generation time.
///
/// Returns `None` when the operands have different types or the operator
/// is undefined for their type; the caller then emits the runtime path,
/// which reports the error when the program runs.
pub fn fold_binary(op: BinaryOp, left: &Value, right: &Value) -> Option<Value> {
    let tag = left.tag();
    if tag != right.tag() {
        return None;
    }
    binary_result_tag(op, tag)?;

    let folded = match (left, right) {
        (Value::Number(l), Value::Number(r)) => fold_numbers(op, *l, *r),
        (Value::Str(l), Value::Str(r)) => fold_strings(op, l, r),
        (Value::Bool(l), Value::Bool(r)) => Value::Bool(equality(op, l == r)),
        (Value::Nil, Value::Nil) => Value::Bool(equality(op, true)),
        _ => return None,
    };
    Some(folded)
}

/// Evaluate `op operand` at generation time.
pub fn fold_unary(op: UnaryOp, operand: &Value) -> Option<Value> {
    match (op, operand) {
        (UnaryOp::Neg, Value::Number(n)) => Some(Value::Number(-n)),
        (UnaryOp::Neg, _) => None,
        (UnaryOp::Not, value) => Some(Value::Bool(!value.is_truthy())),
    }
}

#[expect(
    clippy::float_cmp,
    reason = "IEEE equality is the language's number equality"
)]
fn fold_numbers(op: BinaryOp, l: f64, r: f64) -> Value {
    match op {
        BinaryOp::Add => Value::Number(l + r),
        BinaryOp::Sub => Value::Number(l - r),
        BinaryOp::Mul => Value::Number(l * r),
        BinaryOp::Div => Value::Number(l / r),
        BinaryOp::Eq => Value::Bool(l == r),
        BinaryOp::NotEq => Value::Bool(l != r),
        BinaryOp::Lt => Value::Bool(l < r),
        BinaryOp::LtEq => Value::Bool(l <= r),
        BinaryOp::Gt => Value::Bool(l > r),
        BinaryOp::GtEq => Value::Bool(l >= r),
    }
}

// `str` ordering is byte-wise, the same answer `strcmp` gives at runtime.
fn fold_strings(op: BinaryOp, l: &str, r: &str) -> Value {
    match op {
        BinaryOp::Add => Value::Str(format!("{l}{r}")),
        BinaryOp::Eq => Value::Bool(l == r),
        BinaryOp::NotEq => Value::Bool(l != r),
        BinaryOp::Lt => Value::Bool(l < r),
        BinaryOp::LtEq => Value::Bool(l <= r),
        BinaryOp::Gt => Value::Bool(l > r),
        BinaryOp::GtEq => Value::Bool(l >= r),
        // Rejected by `binary_result_tag` before we get here.
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => Value::Nil,
    }
}

fn equality(op: BinaryOp, equal: bool) -> bool {
    match op {
        BinaryOp::NotEq => !equal,
        _ => equal,
    }
}
