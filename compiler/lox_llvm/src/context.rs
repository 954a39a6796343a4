//! LLVM codegen context hierarchy.
//!
//! - `SimpleCx`: the LLVM context, the module, and basic types
//! - `CodegenCx`: adds the runtime value layout, codegen options and the
//!   C-string cache used by the print and report emitters
//!
//! Instruction generation lives on [`Builder`](crate::builder::Builder);
//! nothing here needs an insertion point.

use std::cell::{Cell, RefCell};

use inkwell::context::Context;
use inkwell::module::{Linkage, Module};
use inkwell::types::{BasicTypeEnum, FloatType, IntType, PointerType, StructType};
use inkwell::values::{BasicValueEnum, GlobalValue, PointerValue};
use inkwell::AddressSpace;
use rustc_hash::FxHashMap;

use crate::module::CodegenOptions;

/// Name of the runtime value struct type.
pub const VALUE_TYPE_NAME: &str = "lox.value";

/// Prefix of every constant `lox.value` global.
pub const CONST_VALUE_PREFIX: &str = "const.loxval";

/// Simple LLVM context with minimal state.
pub struct SimpleCx<'ll> {
    /// The LLVM context (owns all LLVM types and values).
    pub llcx: &'ll Context,
    /// The LLVM module being compiled.
    pub llmod: Module<'ll>,
    /// Opaque pointer type.
    pub ptr_type: PointerType<'ll>,
}

impl<'ll> SimpleCx<'ll> {
    #[must_use]
    pub fn new(context: &'ll Context, module_name: &str) -> Self {
        let llmod = context.create_module(module_name);
        let ptr_type = context.ptr_type(AddressSpace::default());
        Self {
            llcx: context,
            llmod,
            ptr_type,
        }
    }

    #[inline]
    pub fn type_i1(&self) -> IntType<'ll> {
        self.llcx.bool_type()
    }

    #[inline]
    pub fn type_i8(&self) -> IntType<'ll> {
        self.llcx.i8_type()
    }

    #[inline]
    pub fn type_i32(&self) -> IntType<'ll> {
        self.llcx.i32_type()
    }

    #[inline]
    pub fn type_i64(&self) -> IntType<'ll> {
        self.llcx.i64_type()
    }

    #[inline]
    pub fn type_f64(&self) -> FloatType<'ll> {
        self.llcx.f64_type()
    }

    #[inline]
    pub fn type_ptr(&self) -> PointerType<'ll> {
        self.ptr_type
    }

    /// Create a function type.
    pub fn type_func(
        &self,
        args: &[inkwell::types::BasicMetadataTypeEnum<'ll>],
        ret: BasicTypeEnum<'ll>,
        is_var_args: bool,
    ) -> inkwell::types::FunctionType<'ll> {
        use inkwell::types::BasicType;
        ret.fn_type(args, is_var_args)
    }

    /// Create a void function type.
    pub fn type_void_func(
        &self,
        args: &[inkwell::types::BasicMetadataTypeEnum<'ll>],
    ) -> inkwell::types::FunctionType<'ll> {
        self.llcx.void_type().fn_type(args, false)
    }
}

/// Full codegen context.
pub struct CodegenCx<'ll> {
    pub scx: SimpleCx<'ll>,
    /// `{ i8 tag, ptr payload }`, shared by constant globals and stack slots.
    pub value_type: StructType<'ll>,
    pub options: CodegenOptions,
    /// Interned NUL-terminated strings, keyed by content.
    cstrings: RefCell<FxHashMap<String, GlobalValue<'ll>>>,
    /// Suffix counter for constant global names.
    const_counter: Cell<u32>,
}

impl<'ll> CodegenCx<'ll> {
    pub fn new(context: &'ll Context, module_name: &str, options: CodegenOptions) -> Self {
        let scx = SimpleCx::new(context, module_name);
        let value_type = context.opaque_struct_type(VALUE_TYPE_NAME);
        value_type.set_body(&[scx.type_i8().into(), scx.type_ptr().into()], false);
        Self {
            scx,
            value_type,
            options,
            cstrings: RefCell::new(FxHashMap::default()),
            const_counter: Cell::new(0),
        }
    }

    #[inline]
    pub fn llcx(&self) -> &'ll Context {
        self.scx.llcx
    }

    #[inline]
    pub fn llmod(&self) -> &Module<'ll> {
        &self.scx.llmod
    }

    /// Next unique name under `prefix`: `const.num`, `const.num.1`, ...
    pub fn const_name(&self, prefix: &str) -> String {
        let n = self.const_counter.get();
        self.const_counter.set(n + 1);
        if n == 0 {
            prefix.to_string()
        } else {
            format!("{prefix}.{n}")
        }
    }

    /// Add a private, immutable global with `initializer`.
    pub fn add_private_constant(
        &self,
        name: &str,
        initializer: BasicValueEnum<'ll>,
    ) -> GlobalValue<'ll> {
        let global = self
            .llmod()
            .add_global(initializer.get_type(), None, name);
        global.set_initializer(&initializer);
        global.set_constant(true);
        global.set_linkage(Linkage::Private);
        global
    }

    /// Pointer to a NUL-terminated copy of `text`, shared across uses.
    pub fn cstring(&self, text: &str) -> PointerValue<'ll> {
        if let Some(global) = self.cstrings.borrow().get(text) {
            return global.as_pointer_value();
        }
        let bytes = self.llcx().const_string(text.as_bytes(), true);
        let name = format!(".str.{}", self.cstrings.borrow().len());
        let global = self.add_private_constant(&name, bytes.into());
        global.set_unnamed_addr(true);
        self.cstrings.borrow_mut().insert(text.to_string(), global);
        global.as_pointer_value()
    }
}
