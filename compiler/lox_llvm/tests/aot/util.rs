//! Shared helpers for AOT tests.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test helpers fail loudly"
)]

use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};

use inkwell::context::Context;
use tempfile::TempDir;

use lox_llvm::aot::{LinkInput, LinkerDriver, ObjectEmitter};
use lox_llvm::{CodegenOptions, ModuleCompiler};

/// Constants are folded.
pub const FOLDED: CodegenOptions = CodegenOptions {
    fold_constants: true,
};
/// Every operator goes through runtime dispatch.
pub const DYNAMIC: CodegenOptions = CodegenOptions {
    fold_constants: false,
};

/// Whether `name --version` runs.
pub fn tool_available(name: &str) -> bool {
    Command::new(name)
        .arg("--version")
        .output()
        .is_ok_and(|out| out.status.success())
}

/// Whether the default linker is usable.
pub fn linker_available() -> bool {
    tool_available(LinkerDriver::new().program())
}

/// Result of running a compiled program.
#[derive(Debug)]
pub struct RunOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Compile `source` to a native executable, run it and capture its output.
pub fn compile_and_run_capture(source: &str, options: CodegenOptions) -> RunOutput {
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let object_path = temp_dir.path().join(format!("test_{id}.o"));
    let binary_path = temp_dir.path().join(format!("test_{id}"));

    let program = lox_parse::parse_source(source)
        .unwrap_or_else(|diags| panic!("{source:?} does not parse: {diags:?}"));
    let context = Context::create();
    let compiler = ModuleCompiler::with_options(&context, &format!("test_{id}"), options);
    compiler
        .generate(&program.arena, program.root)
        .unwrap_or_else(|e| panic!("{source:?}: {e}"));

    let emitter = ObjectEmitter::native().expect("native target");
    emitter
        .configure_module(compiler.module())
        .expect("configure module");
    emitter
        .emit_object(compiler.module(), &object_path)
        .expect("emit object");

    LinkerDriver::new()
        .link(&LinkInput::executable(vec![object_path], &binary_path))
        .unwrap_or_else(|e| panic!("link failed: {e}"));

    let run = Command::new(&binary_path)
        .output()
        .expect("Failed to execute binary");
    RunOutput {
        exit_code: run.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&run.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&run.stderr).into_owned(),
    }
}
