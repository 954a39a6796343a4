//! Shared LLVM pipeline for `build`, `run`, `ir` and `repl`.
//!
//! Every backend failure is funnelled into [`CompileError`]; this module is
//! the only place those errors become diagnostics and exit codes.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::exit;

use lox_diagnostic::emitter::{ColorMode, DiagnosticEmitter};
use lox_diagnostic::{Diagnostic, ErrorCode};
use lox_llvm::aot::{
    run_optimization_passes, EmitError, LinkInput, LinkerDriver, LinkerError, ObjectEmitter,
    OptimizationError, OptimizationLevel, OutputFormat, TargetConfig, TargetError,
};
use lox_llvm::inkwell::context::Context;
use lox_llvm::{CodegenError, CodegenOptions, ModuleCompiler};
use lox_parse::ParsedProgram;
use tracing::debug;

use super::build::{BuildOptions, EmitType, OptLevel};
use super::{exit_code, stderr_emitter};

/// A backend failure after the front end succeeded.
#[derive(Debug)]
pub(super) enum CompileError {
    Codegen(CodegenError),
    Target(TargetError),
    Emit(EmitError),
    Optimize(OptimizationError),
    Link(LinkerError),
    Io { what: &'static str, error: std::io::Error },
}

impl CompileError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Codegen(CodegenError::Unsupported) => ErrorCode::E5001,
            Self::Codegen(CodegenError::InvalidModule(_)) => ErrorCode::E5002,
            Self::Target(_) | Self::Emit(_) => ErrorCode::E5003,
            Self::Optimize(_) => ErrorCode::E5004,
            Self::Link(_) => ErrorCode::E5005,
            Self::Io { .. } => ErrorCode::E9001,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.code()).with_message(self.to_string());
        match self {
            Self::Link(LinkerError::LinkerNotFound { .. }) => diag.with_suggestion(
                "install a C compiler, or name one with --linker=<program> or LOX_LINKER",
            ),
            _ => diag,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codegen(e) => write!(f, "code generation failed: {e}"),
            Self::Target(e) => write!(f, "{e}"),
            Self::Emit(e) => write!(f, "{e}"),
            Self::Optimize(e) => write!(f, "{e}"),
            Self::Link(e) => write!(f, "{e}"),
            Self::Io { what, error } => write!(f, "failed to {what}: {error}"),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Codegen(e) => Some(e),
            Self::Target(e) => Some(e),
            Self::Emit(e) => Some(e),
            Self::Optimize(e) => Some(e),
            Self::Link(e) => Some(e),
            Self::Io { error, .. } => Some(error),
        }
    }
}

impl From<CodegenError> for CompileError {
    fn from(e: CodegenError) -> Self {
        Self::Codegen(e)
    }
}

impl From<TargetError> for CompileError {
    fn from(e: TargetError) -> Self {
        Self::Target(e)
    }
}

impl From<EmitError> for CompileError {
    fn from(e: EmitError) -> Self {
        Self::Emit(e)
    }
}

impl From<OptimizationError> for CompileError {
    fn from(e: OptimizationError) -> Self {
        Self::Optimize(e)
    }
}

impl From<LinkerError> for CompileError {
    fn from(e: LinkerError) -> Self {
        Self::Link(e)
    }
}

/// Report `error` on stderr.
pub(super) fn report_compile_error(error: &CompileError, color: ColorMode) {
    let mut emitter = stderr_emitter(color, "<llox>", "");
    emitter.emit(&error.to_diagnostic());
    emitter.flush();
}

/// Report `error` and exit with the backend failure status.
pub(super) fn exit_on_compile_error(error: &CompileError, color: ColorMode) -> ! {
    report_compile_error(error, color);
    exit(exit_code::SOFTWARE);
}

fn codegen_options(options: &BuildOptions) -> CodegenOptions {
    CodegenOptions {
        fold_constants: options.fold_constants,
    }
}

fn optimization_level(level: OptLevel) -> OptimizationLevel {
    match level {
        OptLevel::O0 => OptimizationLevel::O0,
        OptLevel::O1 => OptimizationLevel::O1,
        OptLevel::O2 => OptimizationLevel::O2,
        OptLevel::O3 => OptimizationLevel::O3,
        OptLevel::Os => OptimizationLevel::Os,
        OptLevel::Oz => OptimizationLevel::Oz,
    }
}

fn output_format(emit: EmitType) -> OutputFormat {
    match emit {
        EmitType::Object => OutputFormat::Object,
        EmitType::LlvmIr => OutputFormat::LlvmIr,
        EmitType::LlvmBc => OutputFormat::Bitcode,
        EmitType::Assembly => OutputFormat::Assembly,
    }
}

/// Module name for `path`: its file stem.
fn module_name(path: &str) -> &str {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("main")
}

/// Generate, configure and optimize the module for `program`.
///
/// The returned compiler is ready for emission; the emitter is returned
/// alongside since it owns the target machine the module was tuned for.
pub(super) fn compile_to_llvm<'ll>(
    context: &'ll Context,
    path: &str,
    program: &ParsedProgram,
    options: &BuildOptions,
) -> Result<(ModuleCompiler<'ll>, ObjectEmitter), CompileError> {
    lox_llvm::init_tracing();

    let level = optimization_level(options.opt_level);
    let target = TargetConfig::native()?.with_opt_level(level.codegen_level());
    let emitter = ObjectEmitter::new(&target)?;

    let compiler =
        ModuleCompiler::with_options(context, module_name(path), codegen_options(options));
    compiler.generate(&program.arena, program.root)?;
    emitter.configure_module(compiler.module())?;
    run_optimization_passes(compiler.module(), emitter.machine(), level)?;

    if options.verbose {
        eprintln!("  Target: {}", target.triple());
        eprintln!("  Optimization: {level}");
    }
    debug!(module = module_name(path), %level, "module ready");
    Ok((compiler, emitter))
}

/// Compile `program` into `output`: the `--emit` format when one was asked
/// for, otherwise a linked executable.
pub(super) fn compile_to_file(
    path: &str,
    program: &ParsedProgram,
    options: &BuildOptions,
    output: &Path,
) -> Result<(), CompileError> {
    let context = Context::create();
    let (compiler, emitter) = compile_to_llvm(&context, path, program, options)?;

    if let Some(emit) = options.emit {
        emitter.emit(compiler.module(), output, output_format(emit))?;
        return Ok(());
    }

    let temp_dir = tempfile::tempdir().map_err(|error| CompileError::Io {
        what: "create a temporary directory",
        error,
    })?;
    let object = temp_dir
        .path()
        .join(format!("{}.o", module_name(path)));
    emitter.emit_object(compiler.module(), &object)?;
    link(&[object], output, options)
}

fn link(objects: &[PathBuf], output: &Path, options: &BuildOptions) -> Result<(), CompileError> {
    let driver = match &options.linker {
        Some(program) => LinkerDriver::with_linker(program.as_str()),
        None => LinkerDriver::new(),
    };
    if options.verbose {
        eprintln!("  Linking with {}", driver.program());
    }
    driver.link(&LinkInput::executable(objects.to_vec(), output))?;
    Ok(())
}

/// Build `program` into an executable inside `dir` and return its path.
pub(super) fn compile_to_executable(
    path: &str,
    program: &ParsedProgram,
    options: &BuildOptions,
    dir: &Path,
) -> Result<PathBuf, CompileError> {
    let binary = dir.join(module_name(path));
    let options = BuildOptions {
        emit: None,
        ..options.clone()
    };
    compile_to_file(path, program, &options, &binary)?;
    Ok(binary)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn error_codes_by_phase() {
        assert_eq!(
            CompileError::from(CodegenError::Unsupported).code(),
            ErrorCode::E5001
        );
        assert_eq!(
            CompileError::from(CodegenError::InvalidModule("bad".into())).code(),
            ErrorCode::E5002
        );
        assert_eq!(
            CompileError::from(OptimizationError::PassBuilderOptionsCreationFailed).code(),
            ErrorCode::E5004
        );
        assert_eq!(
            CompileError::from(LinkerError::LinkerNotFound {
                linker: "nope".into(),
                message: "not found".into(),
            })
            .code(),
            ErrorCode::E5005
        );
    }

    #[test]
    fn missing_linker_suggests_override() {
        let diag = CompileError::from(LinkerError::LinkerNotFound {
            linker: "nope".into(),
            message: "not found".into(),
        })
        .to_diagnostic();
        assert!(diag.to_string().contains("nope"), "{diag}");
        assert!(diag.suggestions.iter().any(|s| s.contains("LOX_LINKER")));
    }

    #[test]
    fn module_names_come_from_the_stem() {
        assert_eq!(module_name("dir/demo.lox"), "demo");
        assert_eq!(module_name("demo"), "demo");
        assert_eq!(module_name(""), "main");
    }

    #[test]
    fn flags_map_onto_the_backend() {
        assert_eq!(optimization_level(OptLevel::Os), OptimizationLevel::Os);
        assert_eq!(output_format(EmitType::LlvmBc), OutputFormat::Bitcode);
        let options = BuildOptions {
            fold_constants: false,
            ..BuildOptions::default()
        };
        assert!(!codegen_options(&options).fold_constants);
    }
}
