//! Test modules for LLVM codegen.
//!
//! Non-fatal behavior is checked by JIT-running probe functions; fatal
//! paths call `exit`, so they are checked on IR text here and end to end
//! in `tests/aot`.

mod dispatch_tests;
mod fold_tests;
mod print_tests;
mod value_tests;

pub mod helper {
    use std::ffi::{c_char, CStr};

    use inkwell::context::Context;
    use inkwell::execution_engine::ExecutionEngine;
    use inkwell::OptimizationLevel;

    use lox_ir::TypeTag;

    use crate::aot::TargetConfig;
    use crate::module::{CodegenOptions, ModuleCompiler, ProbeKind};

    /// Constants are folded.
    pub const FOLDED: CodegenOptions = CodegenOptions {
        fold_constants: true,
    };
    /// Every operator goes through runtime dispatch.
    pub const DYNAMIC: CodegenOptions = CodegenOptions {
        fold_constants: false,
    };

    fn parse(source: &str) -> lox_parse::ParsedProgram {
        lox_parse::parse_source(source)
            .unwrap_or_else(|diags| panic!("{source:?} does not parse: {diags:?}"))
    }

    /// Generate the full program and return its IR.
    pub fn compile_ir(source: &str, options: CodegenOptions) -> String {
        let program = parse(source);
        let context = Context::create();
        let compiler = ModuleCompiler::with_options(&context, "test", options);
        compiler
            .generate(&program.arena, program.root)
            .unwrap_or_else(|e| panic!("{source:?}: {e}"));
        compiler.print_to_string()
    }

    /// JIT a probe for `source` and hand the engine to `call`.
    fn with_probe<R>(
        source: &str,
        options: CodegenOptions,
        kind: ProbeKind,
        call: impl FnOnce(&ExecutionEngine<'_>) -> R,
    ) -> R {
        crate::init_tracing();
        TargetConfig::native().unwrap();

        let program = parse(source);
        let context = Context::create();
        let compiler = ModuleCompiler::with_options(&context, "probe_test", options);
        compiler
            .compile_probe("probe", &program.arena, program.root, kind)
            .unwrap_or_else(|e| panic!("{source:?}: {e}"));
        if std::env::var_os("LOX_DEBUG_LLVM").is_some() {
            eprintln!("{}", compiler.print_to_string());
        }
        let ee = compiler
            .module()
            .create_jit_execution_engine(OptimizationLevel::None)
            .unwrap();
        call(&ee)
    }

    #[allow(unsafe_code)]
    pub fn eval_tag(source: &str, options: CodegenOptions) -> TypeTag {
        let raw = with_probe(source, options, ProbeKind::Tag, |ee| unsafe {
            ee.get_function::<unsafe extern "C" fn() -> u8>("probe")
                .unwrap()
                .call()
        });
        TypeTag::from_u8(raw).unwrap_or_else(|| panic!("{source:?}: bad tag {raw}"))
    }

    #[allow(unsafe_code)]
    pub fn eval_number(source: &str, options: CodegenOptions) -> f64 {
        with_probe(source, options, ProbeKind::Number, |ee| unsafe {
            ee.get_function::<unsafe extern "C" fn() -> f64>("probe")
                .unwrap()
                .call()
        })
    }

    #[allow(unsafe_code)]
    pub fn eval_bool(source: &str, options: CodegenOptions) -> bool {
        let raw = with_probe(source, options, ProbeKind::Boolean, |ee| unsafe {
            ee.get_function::<unsafe extern "C" fn() -> u8>("probe")
                .unwrap()
                .call()
        });
        raw != 0
    }

    /// The string is copied out while the engine still owns its memory.
    #[allow(unsafe_code)]
    pub fn eval_string(source: &str, options: CodegenOptions) -> String {
        with_probe(source, options, ProbeKind::String, |ee| unsafe {
            let ptr = ee
                .get_function::<unsafe extern "C" fn() -> *const c_char>("probe")
                .unwrap()
                .call();
            assert!(!ptr.is_null(), "{source:?}: null string payload");
            CStr::from_ptr(ptr).to_string_lossy().into_owned()
        })
    }
}
