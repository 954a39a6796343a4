//! The interactive prompt: every line is a complete program.

use std::io::{self, BufRead, Write};

use lox_diagnostic::emitter::ColorMode;

use super::build::BuildOptions;

const PROMPT: &str = "> ";

/// Prompt on `output`, hand each non-blank line of `input` to `eval`.
///
/// Stops at end of input.
pub fn repl_loop<R: BufRead, W: Write>(
    mut input: R,
    mut output: W,
    mut eval: impl FnMut(&str),
) -> io::Result<()> {
    let mut line = String::new();
    loop {
        write!(output, "{PROMPT}")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(());
        }
        let source = line.trim_end_matches(['\n', '\r']);
        if !source.trim().is_empty() {
            eval(source);
        }
    }
}

/// Run the prompt on stdin/stdout.
pub fn run_repl(options: &BuildOptions, color: ColorMode) {
    #[cfg(not(feature = "llvm"))]
    {
        let _ = (options, color);
        super::llvm_unavailable("repl");
    }

    #[cfg(feature = "llvm")]
    {
        use super::check_source;
        use super::compile_common::report_compile_error;
        use super::run::run_program;

        let stdin = io::stdin();
        let result = repl_loop(stdin.lock(), io::stdout(), |source| {
            let Some(program) = check_source("<repl>", source, color) else {
                return;
            };
            match run_program("repl", &program, options) {
                Ok(0) => {}
                Ok(status) => tracing::debug!(status, "program exited"),
                Err(e) => report_compile_error(&e, color),
            }
        });
        if let Err(e) = result {
            eprintln!("error: {e}");
            std::process::exit(super::exit_code::IO_ERR);
        }
    }
}
