//! The `run` command: compile to a temporary executable and run it.

use lox_diagnostic::emitter::ColorMode;

use super::build::BuildOptions;

/// Compile and run `path`, exiting with the program's status.
#[cfg(feature = "llvm")]
pub fn run_file(path: &str, options: &BuildOptions, color: ColorMode) {
    use super::compile_common::exit_on_compile_error;
    use super::load_program;

    let program = load_program(path, color);
    match run_program(path, &program, options) {
        Ok(status) => std::process::exit(status),
        Err(e) => exit_on_compile_error(&e, color),
    }
}

#[cfg(not(feature = "llvm"))]
pub fn run_file(_path: &str, _options: &BuildOptions, _color: ColorMode) {
    super::llvm_unavailable("run");
}

/// Build `program` in a temporary directory, run it with inherited stdio
/// and return its exit status.
///
/// A program killed by a signal reports the backend failure status.
#[cfg(feature = "llvm")]
pub(super) fn run_program(
    name: &str,
    program: &lox_parse::ParsedProgram,
    options: &BuildOptions,
) -> Result<i32, super::compile_common::CompileError> {
    use std::process::Command;

    use super::compile_common::{compile_to_executable, CompileError};
    use super::exit_code;

    let temp_dir = tempfile::tempdir().map_err(|error| CompileError::Io {
        what: "create a temporary directory",
        error,
    })?;
    let binary = compile_to_executable(name, program, options, temp_dir.path())?;
    tracing::debug!(binary = %binary.display(), "running");

    let status = Command::new(&binary)
        .status()
        .map_err(|error| CompileError::Io {
            what: "run the compiled program",
            error,
        })?;
    Ok(status.code().unwrap_or(exit_code::SOFTWARE))
}
