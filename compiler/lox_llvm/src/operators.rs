//! Operator lowering.
//!
//! Each operator first offers its operands to the folder. If that declines,
//! the runtime dispatcher builds this control flow:
//!
//! ```text
//! bin_check ──same tag──▶ bin_compute ──switch tag──▶ num_bin / str_bin / bool_bin / nil_bin
//!     │                        │                               │
//!     ▼                        ▼ (unknown tag)                 ▼
//! type_error            unsupported_error                   cmp_end ──valid──▶ bin_merge
//!                                                              │
//!                                                              ▼
//!                                                        invalid_result
//! ```
//!
//! Every `*_error`/`invalid_result` block is a fatal report. `cmp_end` joins
//! result tag, payload and validity with one phi each; validity comes from
//! [`binary_result_tag`], the same table the folder uses.

use inkwell::basic_block::BasicBlock;
use inkwell::values::{BasicValueEnum, IntValue, PointerValue};
use inkwell::{FloatPredicate, IntPredicate};
use tracing::{instrument, trace};

use lox_ir::ops::{binary_result_tag, unary_operand_tag};
use lox_ir::{BinaryOp, TypeTag, UnaryOp};

use crate::builder::Builder;
use crate::declare::RuntimeFn;
use crate::report::{invalid_operation_message, TYPE_MISMATCH_FORMAT, UNSUPPORTED_TYPE_FORMAT};
use crate::value::LoxValue;

/// One incoming edge of `cmp_end`.
struct Arm<'ll> {
    block: BasicBlock<'ll>,
    tag: IntValue<'ll>,
    payload: PointerValue<'ll>,
    valid: IntValue<'ll>,
}

/// Which operands of a binary operator were computed at run time.
///
/// A computed STRING owns a heap buffer that the operator must release.
#[derive(Copy, Clone)]
struct Owned {
    left: bool,
    right: bool,
}

/// Per-type block name in the dispatch switch.
fn arm_block_name(tag: TypeTag) -> &'static str {
    match tag {
        TypeTag::Number => "num_bin",
        TypeTag::String => "str_bin",
        TypeTag::Boolean => "bool_bin",
        TypeTag::Nil => "nil_bin",
    }
}

/// Float and signed-int predicates for a comparison; `None` for arithmetic.
///
/// Ordered float predicates make every comparison with NaN false, except
/// `!=`, which is true.
fn comparison_predicates(op: BinaryOp) -> Option<(FloatPredicate, IntPredicate)> {
    let preds = match op {
        BinaryOp::Eq => (FloatPredicate::OEQ, IntPredicate::EQ),
        BinaryOp::NotEq => (FloatPredicate::UNE, IntPredicate::NE),
        BinaryOp::Lt => (FloatPredicate::OLT, IntPredicate::SLT),
        BinaryOp::LtEq => (FloatPredicate::OLE, IntPredicate::SLE),
        BinaryOp::Gt => (FloatPredicate::OGT, IntPredicate::SGT),
        BinaryOp::GtEq => (FloatPredicate::OGE, IntPredicate::SGE),
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => return None,
    };
    Some(preds)
}

impl<'ll> Builder<'_, 'll> {
    /// Lower `left op right`.
    #[instrument(skip(self, left, right), level = "trace")]
    pub fn compile_binary(
        &self,
        op: BinaryOp,
        left: LoxValue<'ll>,
        right: LoxValue<'ll>,
        line: u32,
    ) -> LoxValue<'ll> {
        if let Some(folded) = self.try_fold_binary(op, &left, &right) {
            return folded;
        }
        self.binary_dynamic(op, &left, &right, line)
    }

    /// Lower `op operand`.
    #[instrument(skip(self, operand), level = "trace")]
    pub fn compile_unary(&self, op: UnaryOp, operand: LoxValue<'ll>, line: u32) -> LoxValue<'ll> {
        if let Some(folded) = self.try_fold_unary(op, &operand) {
            return folded;
        }
        self.unary_dynamic(op, &operand, line)
    }

    fn line_const(&self, line: u32) -> BasicValueEnum<'ll> {
        self.cx()
            .scx
            .type_i32()
            .const_int(u64::from(line), false)
            .into()
    }

    /// Widen an `i8` tag for a `%d` argument.
    fn tag_arg(&self, tag: IntValue<'ll>) -> BasicValueEnum<'ll> {
        self.zext(tag, self.cx().scx.type_i32(), "tag_code").into()
    }

    /// Call a runtime routine that returns a value.
    fn call_value(
        &self,
        f: RuntimeFn,
        args: &[BasicValueEnum<'ll>],
        name: &str,
    ) -> BasicValueEnum<'ll> {
        self.call(self.cx().runtime_fn(f), args, name)
            .unwrap_or_else(|| panic!("{} returns a value", f.symbol()))
    }

    fn binary_dynamic(
        &self,
        op: BinaryOp,
        left: &LoxValue<'ll>,
        right: &LoxValue<'ll>,
        line: u32,
    ) -> LoxValue<'ll> {
        trace!(op = op.as_symbol(), line, "dispatch binary");
        let cx = self.cx();

        let check = self.append_block("bin_check");
        let type_error = self.append_block("type_error");
        let compute = self.append_block("bin_compute");
        let arm_blocks: Vec<(TypeTag, BasicBlock<'ll>)> =
            [TypeTag::Number, TypeTag::String, TypeTag::Boolean, TypeTag::Nil]
                .into_iter()
                .map(|tag| (tag, self.append_block(arm_block_name(tag))))
                .collect();
        let unsupported = self.append_block("unsupported_error");
        let end = self.append_block("cmp_end");
        let invalid = self.append_block("invalid_result");
        let merge = self.append_block("bin_merge");

        self.br(check);
        self.position_at_end(check);
        let (left_tag, left_payload) = self.unwrap(left);
        let (right_tag, right_payload) = self.unwrap(right);
        let same = self.icmp(IntPredicate::EQ, left_tag, right_tag, "same_type");
        self.cond_br(same, compute, type_error);

        self.position_at_end(type_error);
        self.emit_fatal(
            TYPE_MISMATCH_FORMAT,
            &[
                self.tag_arg(left_tag),
                self.tag_arg(right_tag),
                self.line_const(line),
            ],
        );

        self.position_at_end(compute);
        let cases: Vec<_> = arm_blocks
            .iter()
            .map(|&(tag, block)| (self.tag_const(tag), block))
            .collect();
        self.switch(left_tag, unsupported, &cases);

        self.position_at_end(unsupported);
        self.emit_fatal(UNSUPPORTED_TYPE_FORMAT, &[self.tag_arg(left_tag)]);

        let owned = Owned {
            left: left.as_constant().is_none(),
            right: right.as_constant().is_none(),
        };
        let arms: Vec<Arm<'ll>> = arm_blocks
            .iter()
            .map(|&(tag, block)| {
                self.position_at_end(block);
                let arm = self.binary_arm(op, tag, left_payload, right_payload, owned);
                self.br(end);
                arm
            })
            .collect();

        self.position_at_end(end);
        let tag_phi = self.phi(cx.scx.type_i8().into(), "result_tag");
        let payload_phi = self.phi(cx.scx.type_ptr().into(), "result_payload");
        let valid_phi = self.phi(cx.scx.type_i1().into(), "is_valid");
        for arm in &arms {
            self.add_incoming(tag_phi, &[(&arm.tag, arm.block)]);
            self.add_incoming(payload_phi, &[(&arm.payload, arm.block)]);
            self.add_incoming(valid_phi, &[(&arm.valid, arm.block)]);
        }
        self.cond_br(
            valid_phi.as_basic_value().into_int_value(),
            merge,
            invalid,
        );

        self.position_at_end(invalid);
        let message = invalid_operation_message(op.as_symbol()).replace('%', "%%");
        // The operand tag is passed along for the formatter; the message has
        // no conversion for it.
        self.emit_fatal(&message, &[self.tag_arg(left_tag)]);

        self.position_at_end(merge);
        self.wrap_payload(
            payload_phi.as_basic_value().into_pointer_value(),
            tag_phi.as_basic_value().into_int_value(),
        )
    }

    /// Emit the body of one per-type block. Leaves the builder at the end
    /// of the block that branches to `cmp_end`.
    fn binary_arm(
        &self,
        op: BinaryOp,
        tag: TypeTag,
        left: PointerValue<'ll>,
        right: PointerValue<'ll>,
        owned: Owned,
    ) -> Arm<'ll> {
        let i1 = self.cx().scx.type_i1();
        let computed = binary_result_tag(op, tag).and_then(|result| {
            let payload = match tag {
                TypeTag::Number => self.number_op(op, left, right),
                TypeTag::String => self.string_op(op, left, right, owned),
                TypeTag::Boolean => self.bool_op(op, left, right),
                TypeTag::Nil => self.nil_op(op),
            }?;
            Some((result, payload))
        });
        let block = self.current_block().expect("arm block");
        match computed {
            Some((result, payload)) => Arm {
                block,
                tag: self.tag_const(result),
                payload,
                valid: i1.const_int(1, false),
            },
            None => Arm {
                block,
                tag: self.tag_const(TypeTag::Nil),
                payload: self.cx().scx.type_ptr().const_null(),
                valid: i1.const_zero(),
            },
        }
    }

    fn number_op(
        &self,
        op: BinaryOp,
        left: PointerValue<'ll>,
        right: PointerValue<'ll>,
    ) -> Option<PointerValue<'ll>> {
        let l = self.load_number(left);
        let r = self.load_number(right);
        if let Some((pred, _)) = comparison_predicates(op) {
            let cmp = self.fcmp(pred, l, r, "num_cmp");
            return Some(self.box_scalar(cmp.into(), "bool_mem"));
        }
        let result = match op {
            BinaryOp::Add => self.fadd(l, r, "num_add"),
            BinaryOp::Sub => self.fsub(l, r, "num_sub"),
            BinaryOp::Mul => self.fmul(l, r, "num_mul"),
            BinaryOp::Div => self.fdiv(l, r, "num_div"),
            _ => return None,
        };
        Some(self.box_scalar(result.into(), "num_mem"))
    }

    /// Computed operands are released once the result no longer needs them.
    fn string_op(
        &self,
        op: BinaryOp,
        left: PointerValue<'ll>,
        right: PointerValue<'ll>,
        owned: Owned,
    ) -> Option<PointerValue<'ll>> {
        let result = if let Some((_, pred)) = comparison_predicates(op) {
            let order = self
                .call_value(RuntimeFn::Strcmp, &[left.into(), right.into()], "str_order")
                .into_int_value();
            let zero = self.cx().scx.type_i32().const_zero();
            let cmp = self.icmp(pred, order, zero, "str_cmp");
            self.box_scalar(cmp.into(), "bool_mem")
        } else if op == BinaryOp::Add {
            self.concat(left, right)
        } else {
            return None;
        };
        if owned.left {
            self.release_string(left);
        }
        if owned.right {
            self.release_string(right);
        }
        Some(result)
    }

    /// `malloc(strlen(l) + strlen(r) + 1)`, then `strcpy` and `strcat`.
    /// Neither operand is modified; the new buffer belongs to the result.
    fn concat(&self, left: PointerValue<'ll>, right: PointerValue<'ll>) -> PointerValue<'ll> {
        let left_len = self
            .call_value(RuntimeFn::Strlen, &[left.into()], "left_len")
            .into_int_value();
        let right_len = self
            .call_value(RuntimeFn::Strlen, &[right.into()], "right_len")
            .into_int_value();
        let len = self.add(left_len, right_len, "concat_len");
        let one = self.cx().scx.type_i64().const_int(1, false);
        let size = self.add(len, one, "concat_size");
        let buffer = self
            .call_value(RuntimeFn::Malloc, &[size.into()], "concat_buf")
            .into_pointer_value();
        self.call_value(RuntimeFn::Strcpy, &[buffer.into(), left.into()], "");
        self.call_value(RuntimeFn::Strcat, &[buffer.into(), right.into()], "");
        buffer
    }

    fn bool_op(
        &self,
        op: BinaryOp,
        left: PointerValue<'ll>,
        right: PointerValue<'ll>,
    ) -> Option<PointerValue<'ll>> {
        if !op.is_equality() {
            return None;
        }
        let (_, pred) = comparison_predicates(op)?;
        let l = self.load_bool(left);
        let r = self.load_bool(right);
        let cmp = self.icmp(pred, l, r, "bool_cmp");
        Some(self.box_scalar(cmp.into(), "bool_mem"))
    }

    /// Two nils are always equal.
    fn nil_op(&self, op: BinaryOp) -> Option<PointerValue<'ll>> {
        if !op.is_equality() {
            return None;
        }
        let result = self
            .cx()
            .scx
            .type_i1()
            .const_int(u64::from(op == BinaryOp::Eq), false);
        Some(self.box_scalar(result.into(), "bool_mem"))
    }

    fn unary_dynamic(&self, op: UnaryOp, operand: &LoxValue<'ll>, line: u32) -> LoxValue<'ll> {
        trace!(op = op.as_symbol(), line, "dispatch unary");
        let check = self.append_block("unary_check");
        let error = unary_operand_tag(op).map(|_| self.append_block("unary_error"));
        let compute = self.append_block("unary_compute");
        let merge = self.append_block("unary_merge");

        self.br(check);
        self.position_at_end(check);
        let (tag, payload) = self.unwrap(operand);
        match (unary_operand_tag(op), error) {
            (Some(required), Some(error)) => {
                let ok = self.icmp(IntPredicate::EQ, tag, self.tag_const(required), "tag_ok");
                self.cond_br(ok, compute, error);

                self.position_at_end(error);
                self.emit_fatal(
                    TYPE_MISMATCH_FORMAT,
                    &[
                        self.tag_arg(tag),
                        self.tag_arg(self.tag_const(required)),
                        self.line_const(line),
                    ],
                );
            }
            _ => self.br(compute),
        }

        self.position_at_end(compute);
        match op {
            UnaryOp::Neg => {
                let n = self.load_number(payload);
                let negated = self.fneg(n, "neg");
                self.br(merge);
                self.position_at_end(merge);
                self.wrap(negated.into(), TypeTag::Number)
            }
            UnaryOp::Not => {
                let owned = operand.as_constant().is_none();
                let result = self.falsiness(tag, payload, owned, merge);
                self.wrap(result.into(), TypeTag::Boolean)
            }
        }
    }

    /// `true` exactly for `nil` and `false`. Branches so the payload is only
    /// read when it is a boolean; ends positioned in `merge`.
    ///
    /// When the operand was computed, a string payload is released in
    /// `not_free` on the way out.
    fn falsiness(
        &self,
        tag: IntValue<'ll>,
        payload: PointerValue<'ll>,
        owned: bool,
        merge: BasicBlock<'ll>,
    ) -> IntValue<'ll> {
        let i1 = self.cx().scx.type_i1();
        let bool_block = self.append_block("not_bool");
        let other_block = self.append_block("not_other");

        let is_bool = self.icmp(
            IntPredicate::EQ,
            tag,
            self.tag_const(TypeTag::Boolean),
            "is_bool",
        );
        self.cond_br(is_bool, bool_block, other_block);

        self.position_at_end(bool_block);
        let b = self.load_bool(payload);
        let flipped = self.xor(b, i1.const_int(1, false), "not");
        self.br(merge);

        self.position_at_end(other_block);
        let is_nil = self.icmp(IntPredicate::EQ, tag, self.tag_const(TypeTag::Nil), "is_nil");
        let free_block = owned.then(|| {
            let free_block = self.append_block("not_free");
            let is_str = self.icmp(
                IntPredicate::EQ,
                tag,
                self.tag_const(TypeTag::String),
                "is_str",
            );
            self.cond_br(is_str, free_block, merge);
            self.position_at_end(free_block);
            self.release_string(payload);
            free_block
        });
        self.br(merge);

        self.position_at_end(merge);
        let phi = self.phi(i1.into(), "not_result");
        self.add_incoming(phi, &[(&flipped, bool_block), (&is_nil, other_block)]);
        if let Some(free_block) = free_block {
            self.add_incoming(phi, &[(&is_nil, free_block)]);
        }
        phi.as_basic_value().into_int_value()
    }
}
