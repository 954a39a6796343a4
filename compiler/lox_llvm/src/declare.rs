//! C runtime declarations.
//!
//! Generated programs only call into libc. Each routine is declared on
//! first use with external linkage and resolved at link (or JIT) time.

use inkwell::module::Linkage;
use inkwell::types::BasicMetadataTypeEnum;
use inkwell::values::{FunctionValue, GlobalValue};

use crate::context::CodegenCx;

/// libc routines used by generated code.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RuntimeFn {
    Printf,
    Fprintf,
    Snprintf,
    Exit,
    Strlen,
    Strcpy,
    Strcat,
    Strcmp,
    Malloc,
    Free,
}

impl RuntimeFn {
    pub const ALL: [RuntimeFn; 10] = [
        RuntimeFn::Printf,
        RuntimeFn::Fprintf,
        RuntimeFn::Snprintf,
        RuntimeFn::Exit,
        RuntimeFn::Strlen,
        RuntimeFn::Strcpy,
        RuntimeFn::Strcat,
        RuntimeFn::Strcmp,
        RuntimeFn::Malloc,
        RuntimeFn::Free,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            RuntimeFn::Printf => "printf",
            RuntimeFn::Fprintf => "fprintf",
            RuntimeFn::Snprintf => "snprintf",
            RuntimeFn::Exit => "exit",
            RuntimeFn::Strlen => "strlen",
            RuntimeFn::Strcpy => "strcpy",
            RuntimeFn::Strcat => "strcat",
            RuntimeFn::Strcmp => "strcmp",
            RuntimeFn::Malloc => "malloc",
            RuntimeFn::Free => "free",
        }
    }
}

/// Symbol of the C `stderr` stream object.
pub const STDERR_SYMBOL: &str = if cfg!(target_vendor = "apple") {
    "__stderrp"
} else {
    "stderr"
};

impl<'ll> CodegenCx<'ll> {
    /// Get or declare a libc routine.
    pub fn runtime_fn(&self, f: RuntimeFn) -> FunctionValue<'ll> {
        let name = f.symbol();
        if let Some(func) = self.llmod().get_function(name) {
            return func;
        }

        let scx = &self.scx;
        let ptr: BasicMetadataTypeEnum<'ll> = scx.type_ptr().into();
        let i32_ty = scx.type_i32().into();
        let i64_ty = scx.type_i64();
        let fn_type = match f {
            RuntimeFn::Printf => scx.type_func(&[ptr], i32_ty, true),
            RuntimeFn::Fprintf => scx.type_func(&[ptr, ptr], i32_ty, true),
            RuntimeFn::Snprintf => scx.type_func(&[ptr, i64_ty.into(), ptr], i32_ty, true),
            RuntimeFn::Exit => scx.type_void_func(&[scx.type_i32().into()]),
            RuntimeFn::Strlen => scx.type_func(&[ptr], i64_ty.into(), false),
            RuntimeFn::Strcpy | RuntimeFn::Strcat => {
                scx.type_func(&[ptr, ptr], scx.type_ptr().into(), false)
            }
            RuntimeFn::Strcmp => scx.type_func(&[ptr, ptr], i32_ty, false),
            RuntimeFn::Malloc => scx.type_func(&[i64_ty.into()], scx.type_ptr().into(), false),
            RuntimeFn::Free => scx.type_void_func(&[ptr]),
        };
        self.llmod()
            .add_function(name, fn_type, Some(Linkage::External))
    }

    /// Declare every routine up front.
    ///
    /// Only needed when the module is inspected before code is generated;
    /// [`runtime_fn`](Self::runtime_fn) declares lazily otherwise.
    pub fn declare_runtime_functions(&self) {
        for f in RuntimeFn::ALL {
            self.runtime_fn(f);
        }
    }

    /// The external `stderr` stream pointer global.
    pub fn stderr_global(&self) -> GlobalValue<'ll> {
        if let Some(global) = self.llmod().get_global(STDERR_SYMBOL) {
            return global;
        }
        let global = self
            .llmod()
            .add_global(self.scx.type_ptr(), None, STDERR_SYMBOL);
        global.set_linkage(Linkage::External);
        global
    }
}
