//! Constant folding fast path.
//!
//! When every operand is a constant global, the operation is evaluated with
//! [`lox_ir::ops`] at generation time and the result becomes a new constant;
//! no instructions are emitted. Anything the folder declines (mismatched
//! tags, undefined operator, folding disabled) goes to the runtime
//! dispatcher, which reports errors exactly as it would for computed
//! operands.

use tracing::trace;

use lox_ir::ops::{fold_binary, fold_unary};
use lox_ir::{BinaryOp, UnaryOp};

use crate::builder::Builder;
use crate::value::LoxValue;

impl<'ll> Builder<'_, 'll> {
    pub(crate) fn try_fold_binary(
        &self,
        op: BinaryOp,
        left: &LoxValue<'ll>,
        right: &LoxValue<'ll>,
    ) -> Option<LoxValue<'ll>> {
        if !self.cx().options.fold_constants {
            return None;
        }
        let (l, r) = (left.as_constant()?, right.as_constant()?);
        let Some(folded) = fold_binary(op, l, r) else {
            trace!(op = op.as_symbol(), %l, %r, "fold declined");
            return None;
        };
        trace!(op = op.as_symbol(), %l, %r, %folded, "folded");
        Some(self.make_constant(&folded))
    }

    pub(crate) fn try_fold_unary(
        &self,
        op: UnaryOp,
        operand: &LoxValue<'ll>,
    ) -> Option<LoxValue<'ll>> {
        if !self.cx().options.fold_constants {
            return None;
        }
        let value = operand.as_constant()?;
        let folded = fold_unary(op, value)?;
        trace!(op = op.as_symbol(), %value, %folded, "folded");
        Some(self.make_constant(&folded))
    }
}
