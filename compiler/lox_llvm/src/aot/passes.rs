//! IR optimization through the LLVM new pass manager.
//!
//! inkwell does not wrap `LLVMRunPasses`, so this goes through `llvm-sys`.
//! Levels map onto the stock `default<OX>` pipelines.
//!
//! ```ignore
//! use lox_llvm::aot::{run_optimization_passes, OptimizationLevel};
//!
//! run_optimization_passes(compiler.module(), emitter.machine(), OptimizationLevel::O2)?;
//! ```

use std::ffi::{CStr, CString};
use std::fmt;

use inkwell::module::Module;
use inkwell::targets::TargetMachine;
use llvm_sys::error::{LLVMDisposeErrorMessage, LLVMErrorRef, LLVMGetErrorMessage};
use llvm_sys::transforms::pass_builder::{
    LLVMCreatePassBuilderOptions, LLVMDisposePassBuilderOptions, LLVMPassBuilderOptionsRef,
    LLVMPassBuilderOptionsSetVerifyEach, LLVMRunPasses,
};
use tracing::debug;

/// Optimization level for the pass pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizationLevel {
    /// Only the passes `default<O0>` always runs.
    #[default]
    O0,
    O1,
    O2,
    O3,
    /// Like O2, preferring smaller code.
    Os,
    /// Smallest code.
    Oz,
}

impl OptimizationLevel {
    /// Parse the value of `--opt=`.
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag {
            "0" => Some(Self::O0),
            "1" => Some(Self::O1),
            "2" => Some(Self::O2),
            "3" => Some(Self::O3),
            "s" => Some(Self::Os),
            "z" => Some(Self::Oz),
            _ => None,
        }
    }

    #[must_use]
    pub fn pipeline_string(&self) -> &'static str {
        match self {
            Self::O0 => "default<O0>",
            Self::O1 => "default<O1>",
            Self::O2 => "default<O2>",
            Self::O3 => "default<O3>",
            Self::Os => "default<Os>",
            Self::Oz => "default<Oz>",
        }
    }

    /// Matching backend level for the target machine.
    #[must_use]
    pub fn codegen_level(&self) -> inkwell::OptimizationLevel {
        match self {
            Self::O0 => inkwell::OptimizationLevel::None,
            Self::O1 => inkwell::OptimizationLevel::Less,
            Self::O2 | Self::Os | Self::Oz => inkwell::OptimizationLevel::Default,
            Self::O3 => inkwell::OptimizationLevel::Aggressive,
        }
    }
}

impl fmt::Display for OptimizationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::O0 => "O0",
            Self::O1 => "O1",
            Self::O2 => "O2",
            Self::O3 => "O3",
            Self::Os => "Os",
            Self::Oz => "Oz",
        };
        f.write_str(name)
    }
}

/// Error type for optimization operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptimizationError {
    PassBuilderOptionsCreationFailed,
    PassesFailed { message: String },
    InvalidPipeline { pipeline: String, message: String },
}

impl fmt::Display for OptimizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PassBuilderOptionsCreationFailed => {
                write!(f, "failed to create pass builder options")
            }
            Self::PassesFailed { message } => {
                write!(f, "optimization passes failed: {message}")
            }
            Self::InvalidPipeline { pipeline, message } => {
                write!(f, "invalid pipeline '{pipeline}': {message}")
            }
        }
    }
}

impl std::error::Error for OptimizationError {}

/// Take the message out of an LLVM error and dispose of it.
///
/// # Safety
/// `error` must be a valid, non-null error that has not been consumed.
unsafe fn extract_llvm_error_message(error: LLVMErrorRef) -> String {
    let msg_ptr = LLVMGetErrorMessage(error);
    if msg_ptr.is_null() {
        return "unknown error".to_string();
    }
    let msg = CStr::from_ptr(msg_ptr).to_string_lossy().into_owned();
    LLVMDisposeErrorMessage(msg_ptr);
    msg
}

/// Owns an `LLVMPassBuilderOptionsRef`.
struct PassBuilderOptionsGuard {
    options: LLVMPassBuilderOptionsRef,
}

impl PassBuilderOptionsGuard {
    fn new() -> Option<Self> {
        let options = unsafe { LLVMCreatePassBuilderOptions() };
        if options.is_null() {
            None
        } else {
            Some(Self { options })
        }
    }

    fn as_ptr(&self) -> LLVMPassBuilderOptionsRef {
        self.options
    }
}

impl Drop for PassBuilderOptionsGuard {
    fn drop(&mut self) {
        unsafe { LLVMDisposePassBuilderOptions(self.options) };
    }
}

/// Run the `level` pipeline over `module`.
///
/// The module should already carry the machine's triple and data layout.
///
/// # Errors
///
/// Returns an error if LLVM cannot build or run the pipeline.
pub fn run_optimization_passes(
    module: &Module<'_>,
    target_machine: &TargetMachine,
    level: OptimizationLevel,
) -> Result<(), OptimizationError> {
    run_pipeline(module, target_machine, level.pipeline_string(), false)
}

/// Run an arbitrary pipeline such as `"function(mem2reg,instcombine)"`.
/// With `verify_each`, the module is verified after every pass.
///
/// # Errors
///
/// Returns an error if the pipeline does not parse or a pass fails.
pub fn run_pipeline(
    module: &Module<'_>,
    target_machine: &TargetMachine,
    pipeline: &str,
    verify_each: bool,
) -> Result<(), OptimizationError> {
    debug!(pipeline, verify_each, "running passes");
    let guard = PassBuilderOptionsGuard::new()
        .ok_or(OptimizationError::PassBuilderOptionsCreationFailed)?;
    unsafe { LLVMPassBuilderOptionsSetVerifyEach(guard.as_ptr(), verify_each.into()) };

    let pipeline_cstr = CString::new(pipeline).map_err(|_| OptimizationError::InvalidPipeline {
        pipeline: pipeline.to_string(),
        message: "pipeline contains null bytes".to_string(),
    })?;

    let error = unsafe {
        LLVMRunPasses(
            module.as_mut_ptr(),
            pipeline_cstr.as_ptr(),
            target_machine.as_mut_ptr(),
            guard.as_ptr(),
        )
    };
    if !error.is_null() {
        let message = unsafe { extract_llvm_error_message(error) };
        return Err(OptimizationError::PassesFailed { message });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use inkwell::context::Context;

    use super::*;
    use crate::aot::TargetConfig;

    #[test]
    fn opt_flags() {
        assert_eq!(OptimizationLevel::from_flag("2"), Some(OptimizationLevel::O2));
        assert_eq!(OptimizationLevel::from_flag("z"), Some(OptimizationLevel::Oz));
        assert_eq!(OptimizationLevel::from_flag("4"), None);
        assert_eq!(OptimizationLevel::default(), OptimizationLevel::O0);
    }

    #[test]
    fn pipeline_strings() {
        assert_eq!(OptimizationLevel::O0.pipeline_string(), "default<O0>");
        assert_eq!(OptimizationLevel::O2.pipeline_string(), "default<O2>");
        assert_eq!(OptimizationLevel::Os.pipeline_string(), "default<Os>");
        assert_eq!(OptimizationLevel::O3.to_string(), "O3");
    }

    #[test]
    fn runs_default_pipelines() {
        let context = Context::create();
        let module = context.create_module("opt");
        let i32_ty = context.i32_type();
        let main = module.add_function("main", i32_ty.fn_type(&[], false), None);
        let builder = context.create_builder();
        builder.position_at_end(context.append_basic_block(main, "entry"));
        let slot = builder.build_alloca(i32_ty, "slot").unwrap();
        builder
            .build_store(slot, i32_ty.const_int(7, false))
            .unwrap();
        let loaded = builder.build_load(i32_ty, slot, "v").unwrap();
        builder.build_return(Some(&loaded)).unwrap();

        let config = TargetConfig::native().unwrap();
        config.configure_module(&module).unwrap();
        let machine = config.create_target_machine().unwrap();

        run_optimization_passes(&module, &machine, OptimizationLevel::O2).unwrap();
        assert!(module.verify().is_ok());
        // mem2reg folds the slot away.
        let ir = module.print_to_string().to_string();
        assert!(!ir.contains("alloca"), "{ir}");
        assert!(ir.contains("ret i32 7"), "{ir}");
    }

    #[test]
    fn rejects_unknown_pass() {
        let context = Context::create();
        let module = context.create_module("opt");
        let config = TargetConfig::native().unwrap();
        let machine = config.create_target_machine().unwrap();
        let err = run_pipeline(&module, &machine, "no-such-pass", false).unwrap_err();
        assert!(matches!(err, OptimizationError::PassesFailed { .. }), "{err}");
    }
}
