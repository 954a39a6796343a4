//! LLVM instruction builder.
//!
//! The Builder wraps an LLVM `IRBuilder` and is positioned at one basic
//! block at a time. Low-level operations live here; expression lowering is
//! split by concern:
//!
//! | Concern | Location |
//! |---------|----------|
//! | Low-level LLVM ops | `builder.rs` (this file) |
//! | Runtime value wrap/unwrap/constants | `value.rs` |
//! | Constant folding | `fold.rs` |
//! | Runtime operator dispatch | `operators.rs` |
//! | Printing | `print.rs` |
//! | Fatal diagnostics | `report.rs` |

use inkwell::basic_block::BasicBlock;
use inkwell::builder::Builder as LLVMBuilder;
use inkwell::types::BasicTypeEnum;
use inkwell::values::{
    BasicMetadataValueEnum, BasicValue, BasicValueEnum, FloatValue, FunctionValue, IntValue,
    PhiValue, PointerValue,
};
use inkwell::{FloatPredicate, IntPredicate};
use tracing::instrument;

use lox_ir::stack::ensure_sufficient_stack;
use lox_ir::{ExprArena, ExprId, ExprKind};

use crate::context::CodegenCx;
use crate::value::LoxValue;

/// LLVM instruction builder bound to a codegen context.
pub struct Builder<'a, 'll> {
    llbuilder: LLVMBuilder<'ll>,
    cx: &'a CodegenCx<'ll>,
}

/// RAII guard that restores the builder's position when dropped.
pub struct BuilderPositionGuard<'a, 'b, 'll> {
    builder: &'a Builder<'b, 'll>,
    saved_block: Option<BasicBlock<'ll>>,
}

impl Drop for BuilderPositionGuard<'_, '_, '_> {
    fn drop(&mut self) {
        if let Some(block) = self.saved_block {
            self.builder.position_at_end(block);
        }
    }
}

impl<'a, 'll> Builder<'a, 'll> {
    /// Create a new builder positioned at the end of `bb`.
    pub fn build(cx: &'a CodegenCx<'ll>, bb: BasicBlock<'ll>) -> Self {
        let llbuilder = cx.llcx().create_builder();
        llbuilder.position_at_end(bb);
        Self { llbuilder, cx }
    }

    #[inline]
    pub fn cx(&self) -> &'a CodegenCx<'ll> {
        self.cx
    }

    pub fn current_block(&self) -> Option<BasicBlock<'ll>> {
        self.llbuilder.get_insert_block()
    }

    /// The function that contains the current insertion point.
    pub fn get_current_function(&self) -> FunctionValue<'ll> {
        self.current_block()
            .expect("builder has insertion point")
            .get_parent()
            .expect("block has parent function")
    }

    pub fn position_at_end(&self, bb: BasicBlock<'ll>) {
        self.llbuilder.position_at_end(bb);
    }

    /// Save the current position; the guard restores it when dropped.
    pub fn save_position(&self) -> BuilderPositionGuard<'_, 'a, 'll> {
        BuilderPositionGuard {
            builder: self,
            saved_block: self.current_block(),
        }
    }

    /// Append a block to the current function.
    pub fn append_block(&self, name: &str) -> BasicBlock<'ll> {
        self.cx
            .llcx()
            .append_basic_block(self.get_current_function(), name)
    }

    // -- Terminators --

    pub fn ret(&self, val: BasicValueEnum<'ll>) {
        self.llbuilder
            .build_return(Some(&val))
            .expect("build_return");
    }

    pub fn br(&self, dest: BasicBlock<'ll>) {
        self.llbuilder
            .build_unconditional_branch(dest)
            .expect("build_br");
    }

    pub fn cond_br(&self, cond: IntValue<'ll>, then_bb: BasicBlock<'ll>, else_bb: BasicBlock<'ll>) {
        self.llbuilder
            .build_conditional_branch(cond, then_bb, else_bb)
            .expect("build_cond_br");
    }

    /// Multi-way branch on an integer value.
    pub fn switch(
        &self,
        value: IntValue<'ll>,
        default: BasicBlock<'ll>,
        cases: &[(IntValue<'ll>, BasicBlock<'ll>)],
    ) {
        self.llbuilder
            .build_switch(value, default, cases)
            .expect("build_switch");
    }

    pub fn unreachable(&self) {
        self.llbuilder
            .build_unreachable()
            .expect("build_unreachable");
    }

    // -- Arithmetic --

    pub fn add(&self, lhs: IntValue<'ll>, rhs: IntValue<'ll>, name: &str) -> IntValue<'ll> {
        self.llbuilder.build_int_add(lhs, rhs, name).expect("add")
    }

    pub fn xor(&self, lhs: IntValue<'ll>, rhs: IntValue<'ll>, name: &str) -> IntValue<'ll> {
        self.llbuilder.build_xor(lhs, rhs, name).expect("xor")
    }

    pub fn fadd(&self, lhs: FloatValue<'ll>, rhs: FloatValue<'ll>, name: &str) -> FloatValue<'ll> {
        self.llbuilder.build_float_add(lhs, rhs, name).expect("fadd")
    }

    pub fn fsub(&self, lhs: FloatValue<'ll>, rhs: FloatValue<'ll>, name: &str) -> FloatValue<'ll> {
        self.llbuilder.build_float_sub(lhs, rhs, name).expect("fsub")
    }

    pub fn fmul(&self, lhs: FloatValue<'ll>, rhs: FloatValue<'ll>, name: &str) -> FloatValue<'ll> {
        self.llbuilder.build_float_mul(lhs, rhs, name).expect("fmul")
    }

    pub fn fdiv(&self, lhs: FloatValue<'ll>, rhs: FloatValue<'ll>, name: &str) -> FloatValue<'ll> {
        self.llbuilder.build_float_div(lhs, rhs, name).expect("fdiv")
    }

    pub fn fneg(&self, val: FloatValue<'ll>, name: &str) -> FloatValue<'ll> {
        self.llbuilder.build_float_neg(val, name).expect("fneg")
    }

    // -- Comparisons and conversions --

    pub fn icmp(
        &self,
        pred: IntPredicate,
        lhs: IntValue<'ll>,
        rhs: IntValue<'ll>,
        name: &str,
    ) -> IntValue<'ll> {
        self.llbuilder
            .build_int_compare(pred, lhs, rhs, name)
            .expect("icmp")
    }

    pub fn fcmp(
        &self,
        pred: FloatPredicate,
        lhs: FloatValue<'ll>,
        rhs: FloatValue<'ll>,
        name: &str,
    ) -> IntValue<'ll> {
        self.llbuilder
            .build_float_compare(pred, lhs, rhs, name)
            .expect("fcmp")
    }

    pub fn zext(
        &self,
        val: IntValue<'ll>,
        ty: inkwell::types::IntType<'ll>,
        name: &str,
    ) -> IntValue<'ll> {
        self.llbuilder
            .build_int_z_extend(val, ty, name)
            .expect("zext")
    }

    pub fn select(
        &self,
        cond: IntValue<'ll>,
        then_val: BasicValueEnum<'ll>,
        else_val: BasicValueEnum<'ll>,
        name: &str,
    ) -> BasicValueEnum<'ll> {
        self.llbuilder
            .build_select(cond, then_val, else_val, name)
            .expect("select")
    }

    // -- Memory operations --

    pub fn alloca(&self, ty: BasicTypeEnum<'ll>, name: &str) -> PointerValue<'ll> {
        self.llbuilder.build_alloca(ty, name).expect("alloca")
    }

    pub fn load(
        &self,
        ty: BasicTypeEnum<'ll>,
        ptr: PointerValue<'ll>,
        name: &str,
    ) -> BasicValueEnum<'ll> {
        self.llbuilder.build_load(ty, ptr, name).expect("load")
    }

    pub fn store(&self, val: BasicValueEnum<'ll>, ptr: PointerValue<'ll>) {
        self.llbuilder.build_store(ptr, val).expect("store");
    }

    pub fn struct_gep(
        &self,
        ty: inkwell::types::StructType<'ll>,
        ptr: PointerValue<'ll>,
        index: u32,
        name: &str,
    ) -> PointerValue<'ll> {
        self.llbuilder
            .build_struct_gep(ty, ptr, index, name)
            .expect("struct_gep")
    }

    /// Create an alloca in the function's entry block.
    ///
    /// Entry-block allocas are what `mem2reg` promotes, and they are
    /// allocated once per call even when created inside a branch.
    pub fn create_entry_alloca(&self, name: &str, ty: BasicTypeEnum<'ll>) -> PointerValue<'ll> {
        let entry = self
            .get_current_function()
            .get_first_basic_block()
            .expect("function has entry block");
        let _guard = self.save_position();
        match entry.get_first_instruction() {
            Some(first) => self.llbuilder.position_before(&first),
            None => self.llbuilder.position_at_end(entry),
        }
        self.alloca(ty, name)
    }

    // -- Calls --

    /// Build a function call. Returns `None` for void callees.
    pub fn call(
        &self,
        callee: FunctionValue<'ll>,
        args: &[BasicValueEnum<'ll>],
        name: &str,
    ) -> Option<BasicValueEnum<'ll>> {
        let args_meta: Vec<BasicMetadataValueEnum<'ll>> =
            args.iter().map(|v| (*v).into()).collect();

        let call_val = self
            .llbuilder
            .build_call(callee, &args_meta, name)
            .expect("call");

        call_val.try_as_basic_value().basic()
    }

    // -- Phi nodes --

    pub fn phi(&self, ty: BasicTypeEnum<'ll>, name: &str) -> PhiValue<'ll> {
        self.llbuilder.build_phi(ty, name).expect("phi")
    }

    pub fn add_incoming(
        &self,
        phi: PhiValue<'ll>,
        incoming: &[(&dyn BasicValue<'ll>, BasicBlock<'ll>)],
    ) {
        phi.add_incoming(incoming);
    }

    // -- Expression lowering --

    /// Lower `id` to a runtime value handle.
    ///
    /// Returns `None` when the expression cannot be lowered; the caller
    /// abandons the whole unit. Every `ExprKind` and literal `Value` lowers
    /// today, so `None` only appears once a variant without a lowering is
    /// added; the match below stops compiling until one is written.
    #[instrument(skip(self, arena), level = "trace")]
    pub fn compile_expr(&self, arena: &ExprArena, id: ExprId) -> Option<LoxValue<'ll>> {
        ensure_sufficient_stack(|| {
            let expr = arena.get_expr(id);
            match &expr.kind {
                ExprKind::Literal(value) => Some(self.make_constant(value)),
                ExprKind::Grouping(inner) => self.compile_expr(arena, *inner),
                ExprKind::Unary { op, operand } => {
                    let operand = self.compile_expr(arena, *operand)?;
                    Some(self.compile_unary(*op, operand, expr.line))
                }
                ExprKind::Binary { op, left, right } => {
                    let left = self.compile_expr(arena, *left)?;
                    let right = self.compile_expr(arena, *right)?;
                    Some(self.compile_binary(*op, left, right, expr.line))
                }
            }
        })
    }
}
