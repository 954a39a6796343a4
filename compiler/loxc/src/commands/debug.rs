//! Debug commands: `lex`, `parse` and `ir` for inspecting compiler stages.

use std::process::exit;

use lox_diagnostic::emitter::ColorMode;
use lox_ir::printer::print_expr;

use super::build::BuildOptions;
use super::{exit_code, load_program, read_file, report_diagnostics};

/// Lex a file and display the token stream.
pub fn lex_file(path: &str, color: ColorMode) {
    let content = read_file(path);
    let output = lox_lexer::lex(&content);

    println!("Tokens for '{}' ({} tokens):", path, output.tokens.len());
    for tok in &output.tokens {
        println!(
            "  {} '{}' @ line {}",
            tok.kind.name(),
            tok.lexeme(&content),
            tok.line
        );
    }

    if output.has_errors() {
        report_diagnostics(&output.diagnostics(), path, &content, color);
        exit(exit_code::DATA_ERR);
    }
}

/// Parse a file and display the expression tree.
pub fn parse_file(path: &str, color: ColorMode) {
    let program = load_program(path, color);
    println!("{}", print_expr(&program.arena, program.root));
}

/// Print the module generated for `path`, after optimization.
#[cfg(feature = "llvm")]
pub fn ir_file(path: &str, options: &BuildOptions, color: ColorMode) {
    use lox_llvm::inkwell::context::Context;

    use super::compile_common::{compile_to_llvm, exit_on_compile_error};

    let program = load_program(path, color);
    let context = Context::create();
    match compile_to_llvm(&context, path, &program, options) {
        Ok((compiler, _)) => print!("{}", compiler.print_to_string()),
        Err(e) => exit_on_compile_error(&e, color),
    }
}

#[cfg(not(feature = "llvm"))]
pub fn ir_file(_path: &str, _options: &BuildOptions, _color: ColorMode) {
    super::llvm_unavailable("ir");
}
