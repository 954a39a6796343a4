//! Command handlers for the llox CLI.
//!
//! Each submodule implements one command. Shared front-end plumbing
//! (`read_file`, diagnostic rendering) lives here in the module root.

use std::io::IsTerminal;
use std::process::exit;

use lox_diagnostic::emitter::{ColorMode, DiagnosticEmitter, TerminalEmitter};
use lox_diagnostic::{count_by_severity, Diagnostic};
use lox_parse::ParsedProgram;

pub mod build;
#[cfg(feature = "llvm")]
mod compile_common;
mod debug;
mod repl;
mod run;

pub use build::{build_file, parse_build_options, BuildOptions, EmitType, OptLevel};
pub use debug::{ir_file, lex_file, parse_file};
pub use repl::{repl_loop, run_repl};
pub use run::run_file;

/// Process exit codes, following `sysexits.h`.
pub mod exit_code {
    /// Bad command line.
    pub const USAGE: i32 = 64;
    /// The source has lexical or syntax errors.
    pub const DATA_ERR: i32 = 65;
    /// Code generation, emission or linking failed.
    pub const SOFTWARE: i32 = 70;
    /// The input file could not be read.
    pub const IO_ERR: i32 = 74;
}

/// Read a file from disk, exiting with a user-friendly error message on failure.
pub(crate) fn read_file(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            let msg = match e.kind() {
                std::io::ErrorKind::NotFound => format!("cannot find file '{path}'"),
                std::io::ErrorKind::PermissionDenied => {
                    format!("permission denied reading '{path}'")
                }
                std::io::ErrorKind::InvalidData => {
                    format!("'{path}' contains invalid UTF-8 data")
                }
                _ => format!("error reading '{path}': {e}"),
            };
            eprintln!("error: {msg}");
            exit(exit_code::IO_ERR);
        }
    }
}

/// Stderr emitter with `name`/`source` attached for snippets.
pub(crate) fn stderr_emitter(
    color: ColorMode,
    name: &str,
    source: &str,
) -> TerminalEmitter<std::io::Stderr> {
    let is_tty = std::io::stderr().is_terminal();
    TerminalEmitter::<std::io::Stderr>::stderr(color, is_tty).with_source(name, source)
}

/// Render `diagnostics` against `source` on stderr.
pub(crate) fn report_diagnostics(
    diagnostics: &[Diagnostic],
    name: &str,
    source: &str,
    color: ColorMode,
) {
    let mut emitter = stderr_emitter(color, name, source);
    emitter.emit_all(diagnostics);
    let (errors, warnings) = count_by_severity(diagnostics);
    emitter.emit_summary(errors, warnings);
    emitter.flush();
}

/// Lex and parse `source`, reporting every diagnostic.
///
/// Returns `None` when anything went wrong.
pub(crate) fn check_source(name: &str, source: &str, color: ColorMode) -> Option<ParsedProgram> {
    match lox_parse::parse_source(source) {
        Ok(program) => Some(program),
        Err(diagnostics) => {
            tracing::debug!(count = diagnostics.len(), "front-end errors");
            report_diagnostics(&diagnostics, name, source, color);
            None
        }
    }
}

/// Read and parse `path`, exiting on any error.
pub(crate) fn load_program(path: &str, color: ColorMode) -> ParsedProgram {
    let source = read_file(path);
    match check_source(path, &source, color) {
        Some(program) => program,
        None => exit(exit_code::DATA_ERR),
    }
}

/// Stop with a note that `command` needs code generation.
#[cfg(not(feature = "llvm"))]
pub(crate) fn llvm_unavailable(command: &str) -> ! {
    eprintln!("error: the '{command}' command requires the LLVM backend");
    eprintln!();
    eprintln!("llox was built without LLVM support.");
    eprintln!("Rebuild with the 'llvm' feature (LLVM 17 must be installed):");
    eprintln!();
    eprintln!("  cargo build -p loxc --features llvm");
    exit(exit_code::SOFTWARE);
}
