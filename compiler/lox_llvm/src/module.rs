//! Module-level LLVM compilation.
//!
//! A llox program is one expression. [`ModuleCompiler::generate`] wraps it
//! in `i32 main()`, prints the result and returns 0; runtime type errors
//! leave through the fatal blocks instead.
//!
//! [`ModuleCompiler::compile_probe`] builds side-effect-free functions that
//! return one component of an expression's value. Tests JIT them to check
//! generated code without capturing stdout.

use std::fmt;

use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::types::BasicTypeEnum;
use inkwell::values::FunctionValue;
use tracing::{debug, instrument};

use lox_ir::{ExprArena, ExprId};

use crate::builder::Builder;
use crate::context::CodegenCx;

/// Settings that change the generated code.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CodegenOptions {
    /// Evaluate operations on constants at generation time. When off,
    /// every operator goes through runtime dispatch.
    pub fold_constants: bool,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            fold_constants: true,
        }
    }
}

/// Generation-time failure. Nothing usable is left in the module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodegenError {
    /// Some sub-expression could not be lowered.
    Unsupported,
    /// LLVM rejected the module.
    InvalidModule(String),
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported => write!(f, "expression could not be compiled"),
            Self::InvalidModule(msg) => write!(f, "generated module is invalid: {msg}"),
        }
    }
}

impl std::error::Error for CodegenError {}

/// Which part of a value a probe function returns.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProbeKind {
    /// `i8` type tag.
    Tag,
    /// `double` loaded from a NUMBER payload.
    Number,
    /// `i1` loaded from a BOOLEAN payload, returned as `i8` 0 or 1.
    Boolean,
    /// The STRING payload pointer.
    String,
}

/// Compiler for one llox program.
pub struct ModuleCompiler<'ll> {
    cx: CodegenCx<'ll>,
}

impl<'ll> ModuleCompiler<'ll> {
    pub fn new(context: &'ll Context, module_name: &str) -> Self {
        Self::with_options(context, module_name, CodegenOptions::default())
    }

    pub fn with_options(context: &'ll Context, module_name: &str, options: CodegenOptions) -> Self {
        Self {
            cx: CodegenCx::new(context, module_name, options),
        }
    }

    pub fn cx(&self) -> &CodegenCx<'ll> {
        &self.cx
    }

    pub fn module(&self) -> &Module<'ll> {
        self.cx.llmod()
    }

    /// Emit `main` for the expression rooted at `root` and verify the module.
    #[instrument(skip(self, arena), level = "debug")]
    pub fn generate(&self, arena: &ExprArena, root: ExprId) -> Result<(), CodegenError> {
        let cx = &self.cx;
        let main_ty = cx.scx.type_func(&[], cx.scx.type_i32().into(), false);
        let main = cx.llmod().add_function("main", main_ty, None);
        let entry = cx.llcx().append_basic_block(main, "entry");
        let bx = Builder::build(cx, entry);

        let Some(value) = bx.compile_expr(arena, root) else {
            // Leave no half-built `main` behind.
            // SAFETY: nothing else refers to `main`.
            unsafe { main.delete() };
            return Err(CodegenError::Unsupported);
        };
        bx.compile_print(&value);
        bx.ret(cx.scx.type_i32().const_zero().into());

        if std::env::var_os("LOX_DEBUG_LLVM").is_some() {
            eprintln!("=== LLVM IR for {} ===", self.module_name());
            eprintln!("{}", self.print_to_string());
            eprintln!("=== END IR ===");
        }

        self.verify()?;
        debug!(module = %self.module_name(), "generated");
        Ok(())
    }

    /// Emit `name() -> <kind>` returning one component of the expression's
    /// value. Fatal paths still exit the process when taken.
    pub fn compile_probe(
        &self,
        name: &str,
        arena: &ExprArena,
        root: ExprId,
        kind: ProbeKind,
    ) -> Result<FunctionValue<'ll>, CodegenError> {
        let cx = &self.cx;
        let ret_ty: BasicTypeEnum<'ll> = match kind {
            ProbeKind::Tag | ProbeKind::Boolean => cx.scx.type_i8().into(),
            ProbeKind::Number => cx.scx.type_f64().into(),
            ProbeKind::String => cx.scx.type_ptr().into(),
        };
        let func = cx
            .llmod()
            .add_function(name, cx.scx.type_func(&[], ret_ty, false), None);
        let entry = cx.llcx().append_basic_block(func, "entry");
        let bx = Builder::build(cx, entry);

        let Some(value) = bx.compile_expr(arena, root) else {
            // SAFETY: the probe was just created and has no users.
            unsafe { func.delete() };
            return Err(CodegenError::Unsupported);
        };
        let (tag, payload) = bx.unwrap(&value);
        let result = match kind {
            ProbeKind::Tag => tag.into(),
            ProbeKind::Number => bx.load_number(payload).into(),
            ProbeKind::Boolean => bx
                .zext(bx.load_bool(payload), cx.scx.type_i8(), "bool_byte")
                .into(),
            ProbeKind::String => payload.into(),
        };
        bx.ret(result);

        self.verify()?;
        Ok(func)
    }

    fn verify(&self) -> Result<(), CodegenError> {
        self.cx
            .llmod()
            .verify()
            .map_err(|e| CodegenError::InvalidModule(e.to_string()))
    }

    fn module_name(&self) -> String {
        self.cx.llmod().get_name().to_string_lossy().into_owned()
    }

    /// Print LLVM IR to string.
    pub fn print_to_string(&self) -> String {
        self.cx.llmod().print_to_string().to_string()
    }
}
