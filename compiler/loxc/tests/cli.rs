// Test code uses unwrap/expect for clarity - panics provide good test failure messages
#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end tests of the `llox` binary.
//!
//! Front-end commands run everywhere; compiling commands are checked
//! against whichever backend the binary was built with.

use std::path::PathBuf;
use std::process::{Command, Output};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn llox(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_llox"))
        .args(args)
        .arg("--color=never")
        .env_remove("LOX_LOG")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to start llox")
}

/// Write `source` to `name` in a fresh directory.
fn source_file(name: &str, source: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, source).unwrap();
    (dir, path)
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn parse_prints_the_tree() {
    let (_dir, path) = source_file("demo.lox", "1 + 2 * -(3)");
    let out = llox(&["parse", path.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(0), "{}", stderr(&out));
    assert_eq!(stdout(&out), "(+ 1 (* 2 (- (group 3))))\n");
}

#[test]
fn lex_lists_tokens() {
    let (_dir, path) = source_file("demo.lox", "\"a\" !=\nnil");
    let out = llox(&["lex", path.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(0), "{}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("(4 tokens)"), "{text}");
    assert!(text.contains("BANG_EQUAL '!=' @ line 1"), "{text}");
    assert!(text.contains("NIL 'nil' @ line 2"), "{text}");
    assert!(text.trim_end().ends_with("EOF '' @ line 2"), "{text}");
}

#[test]
fn lex_errors_exit_with_data_error() {
    let (_dir, path) = source_file("bad.lox", "1 @ 2");
    let out = llox(&["lex", path.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(65));
    assert!(stderr(&out).contains("error[E0002]"), "{}", stderr(&out));
}

#[test]
fn nul_in_string_is_a_data_error() {
    let (_dir, path) = source_file("nul.lox", "\"a\0b\" == \"a\0c\"");
    let out = llox(&["parse", path.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(65));
    assert!(stderr(&out).contains("error[E0004]"), "{}", stderr(&out));
}

#[test]
fn syntax_errors_exit_with_data_error() {
    let (_dir, path) = source_file("bad.lox", "1 +");
    let out = llox(&["parse", path.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(65));
    let err = stderr(&out);
    assert!(err.contains("error[E1002]"), "{err}");
    assert!(err.contains("bad.lox:1:"), "{err}");
    assert_eq!(stdout(&out), "");
}

#[test]
fn missing_file_is_an_io_error() {
    let out = llox(&["parse", "definitely/not/here.lox"]);
    assert_eq!(out.status.code(), Some(74));
    assert!(stderr(&out).contains("cannot find file"), "{}", stderr(&out));
}

#[test]
fn usage_errors() {
    assert_eq!(llox(&["frobnicate"]).status.code(), Some(64));
    assert_eq!(llox(&["parse"]).status.code(), Some(64));
    assert_eq!(llox(&["build"]).status.code(), Some(64));

    let out = Command::new(env!("CARGO_BIN_EXE_llox"))
        .args(["--color=sometimes", "help"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(64));
}

#[test]
fn help_and_version() {
    let help = llox(&["help"]);
    assert_eq!(help.status.code(), Some(0));
    assert!(stdout(&help).contains("Usage: llox <command>"));

    let version = llox(&["version"]);
    assert_eq!(
        stdout(&version),
        format!("llox {}\n", env!("CARGO_PKG_VERSION"))
    );
}

#[cfg(not(feature = "llvm"))]
#[test]
fn compiling_needs_the_backend() {
    let (_dir, path) = source_file("demo.lox", "1 + 2");
    for command in ["build", "run", "ir"] {
        let out = llox(&[command, path.to_str().unwrap()]);
        assert_eq!(out.status.code(), Some(70), "{command}");
        assert!(stderr(&out).contains("requires the LLVM backend"), "{command}");
    }
}

#[cfg(feature = "llvm")]
mod backend {
    use super::*;

    fn linker_available() -> bool {
        let linker = std::env::var("LOX_LINKER").unwrap_or_else(|_| "cc".to_string());
        Command::new(linker)
            .arg("--version")
            .output()
            .is_ok_and(|out| out.status.success())
    }

    #[test]
    fn ir_prints_main() {
        let (_dir, path) = source_file("demo.lox", "1 + 2");
        let out = llox(&["ir", path.to_str().unwrap()]);
        assert_eq!(out.status.code(), Some(0), "{}", stderr(&out));
        let ir = stdout(&out);
        assert!(ir.contains("define i32 @main()"), "{ir}");
        assert!(!ir.contains("bin_check"), "{ir}");

        let dynamic = stdout(&llox(&["ir", path.to_str().unwrap(), "--no-fold"]));
        assert!(dynamic.contains("bin_check"), "{dynamic}");
    }

    #[test]
    fn build_emits_llvm_ir() {
        let (dir, path) = source_file("demo.lox", "\"a\" + \"b\"");
        let output = dir.path().join("demo.ll");
        let out = llox(&[
            "build",
            path.to_str().unwrap(),
            "--emit=llvm-ir",
            "-o",
            output.to_str().unwrap(),
        ]);
        assert_eq!(out.status.code(), Some(0), "{}", stderr(&out));
        let ir = std::fs::read_to_string(&output).unwrap();
        assert!(ir.contains("@main"), "{ir}");
    }

    #[test]
    fn run_prints_and_propagates_status() {
        if !linker_available() {
            eprintln!("skipping: no linker available");
            return;
        }
        let (_dir, ok) = source_file("ok.lox", "(1 + 2) * 2 == 6");
        let out = llox(&["run", ok.to_str().unwrap()]);
        assert_eq!(out.status.code(), Some(0), "{}", stderr(&out));
        assert_eq!(stdout(&out), "true\n");

        let (_dir, bad) = source_file("bad.lox", "1 +\n\"a\"");
        let out = llox(&["run", bad.to_str().unwrap()]);
        assert_eq!(out.status.code(), Some(1));
        assert_eq!(
            stderr(&out),
            "error: type mismatch (code 2 vs 3) at line 1\n"
        );
    }

    #[test]
    fn build_links_an_executable() {
        if !linker_available() {
            eprintln!("skipping: no linker available");
            return;
        }
        let (dir, path) = source_file("demo.lox", "\"ab\" + \"cd\"");
        let binary = dir.path().join("demo");
        let out = llox(&["build", path.to_str().unwrap(), "-o", binary.to_str().unwrap(), "--opt=2"]);
        assert_eq!(out.status.code(), Some(0), "{}", stderr(&out));

        let run = Command::new(&binary).output().unwrap();
        assert_eq!(stdout(&run), "abcd\n");
    }

    #[test]
    fn missing_linker_is_a_backend_error() {
        let (dir, path) = source_file("demo.lox", "1");
        let binary = dir.path().join("demo");
        let out = llox(&[
            "build",
            path.to_str().unwrap(),
            "-o",
            binary.to_str().unwrap(),
            "--linker=lox-definitely-not-a-linker",
        ]);
        assert_eq!(out.status.code(), Some(70));
        assert!(stderr(&out).contains("error[E5005]"), "{}", stderr(&out));
    }
}
