//! llox compiler CLI

use std::process::exit;

use lox_diagnostic::emitter::ColorMode;
use loxc::commands::{
    build_file, exit_code, ir_file, lex_file, parse_build_options, parse_file, run_file,
    run_repl, BuildOptions,
};

fn main() {
    loxc::init_logging();

    // `--color=` is accepted anywhere on the command line.
    let mut color = ColorMode::Auto;
    let mut args: Vec<String> = Vec::new();
    for arg in std::env::args() {
        if let Some(value) = arg.strip_prefix("--color=") {
            let Some(mode) = ColorMode::from_flag(value) else {
                eprintln!("error: unknown color mode '{value}', options: auto, always, never");
                exit(exit_code::USAGE);
            };
            color = mode;
        } else {
            args.push(arg);
        }
    }

    if args.len() < 2 {
        run_repl(&BuildOptions::default(), color);
        return;
    }

    let command = &args[1];

    match command.as_str() {
        "build" => {
            if args.len() < 3 {
                eprintln!("Usage: llox build <file.lox> [options]");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  -o <path>           Output file");
                eprintln!("  --emit=<type>       Emit: obj, llvm-ir, llvm-bc, asm");
                eprintln!("  --opt=<level>       Optimization: 0, 1, 2, 3, s, z");
                eprintln!("  --no-fold           Dispatch every operator at runtime");
                eprintln!("  --linker=<program>  C compiler driver used to link");
                eprintln!("  -v, --verbose       Verbose output");
                exit(exit_code::USAGE);
            }
            let options = collect_build_options(&args[3..]);
            build_file(&args[2], &options, color);
        }
        "run" => {
            let mut file_path = None;
            let mut rest = Vec::new();
            for arg in args.iter().skip(2) {
                if !arg.starts_with('-') && file_path.is_none() {
                    file_path = Some(arg.as_str());
                } else {
                    rest.push(arg.clone());
                }
            }
            let Some(path) = file_path else {
                eprintln!("error: missing file path");
                eprintln!("Usage: llox run <file.lox> [--no-fold] [--opt=<level>]");
                exit(exit_code::USAGE);
            };
            let options = collect_build_options(&rest);
            run_file(path, &options, color);
        }
        "ir" => {
            if args.len() < 3 {
                eprintln!("Usage: llox ir <file.lox> [--no-fold] [--opt=<level>]");
                exit(exit_code::USAGE);
            }
            let options = collect_build_options(&args[3..]);
            ir_file(&args[2], &options, color);
        }
        "parse" => {
            if args.len() < 3 {
                eprintln!("Usage: llox parse <file.lox>");
                exit(exit_code::USAGE);
            }
            parse_file(&args[2], color);
        }
        "lex" => {
            if args.len() < 3 {
                eprintln!("Usage: llox lex <file.lox>");
                exit(exit_code::USAGE);
            }
            lex_file(&args[2], color);
        }
        "repl" => {
            let options = collect_build_options(&args[2..]);
            run_repl(&options, color);
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        "version" | "--version" | "-V" => {
            println!("llox {}", env!("CARGO_PKG_VERSION"));
        }
        _ => {
            // A bare `.lox` path runs the file.
            if std::path::Path::new(command)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("lox"))
            {
                run_file(command, &BuildOptions::default(), color);
            } else {
                eprintln!("Unknown command: {command}");
                eprintln!();
                print_usage();
                exit(exit_code::USAGE);
            }
        }
    }
}

/// Parse build flags, handling `-o` specially since it takes the next argument.
fn collect_build_options(args: &[String]) -> BuildOptions {
    let mut options = BuildOptions::default();
    let mut i = 0;
    while i < args.len() {
        if args[i] == "-o" {
            let Some(path) = args.get(i + 1) else {
                eprintln!("error: `-o` needs a path");
                exit(exit_code::USAGE);
            };
            options.output = Some(std::path::PathBuf::from(path));
            i += 2;
        } else {
            let parsed = parse_build_options(&args[i..=i]);
            options.merge(&parsed);
            i += 1;
        }
    }
    options
}

fn print_usage() {
    println!("llox: compile Lox expressions to native code");
    println!();
    println!("Usage: llox <command> [options]");
    println!();
    println!("Commands:");
    println!("  run <file.lox>       Compile and run a program");
    println!("  build <file.lox>     Compile to a native executable");
    println!("  ir <file.lox>        Print the generated LLVM IR");
    println!("  parse <file.lox>     Print the parsed expression");
    println!("  lex <file.lox>       Print the token stream");
    println!("  repl                 Compile and run one line at a time (default)");
    println!("  help                 Show this help message");
    println!("  version              Show version information");
    println!();
    println!("Build options:");
    println!("  -o <path>            Output file path");
    println!("  --emit=<type>        Emit: obj, llvm-ir, llvm-bc, asm");
    println!("  --opt=<level>        Optimization: 0, 1, 2, 3, s, z");
    println!("  --no-fold            Dispatch every operator at runtime");
    println!("  --linker=<program>   C compiler driver used to link (default: cc, or $LOX_LINKER)");
    println!("  -v, --verbose        Verbose output");
    println!();
    println!("Global options:");
    println!("  --color=<mode>       Diagnostics color: auto, always, never");
    println!();
    println!("Environment:");
    println!("  LOX_LOG / RUST_LOG   Tracing filter, e.g. LOX_LOG=lox_llvm=trace");
    println!("  LOX_DEBUG_LLVM=1     Dump generated IR to stderr");
    println!("  LOX_LINKER           Default linker program");
    println!();
    println!("Examples:");
    println!("  llox run demo.lox");
    println!("  llox build demo.lox -o demo --opt=2");
    println!("  llox build demo.lox --emit=llvm-ir");
    println!("  llox ir demo.lox --no-fold");
}
