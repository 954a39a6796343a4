//! Programs compiled, linked and run as native executables.

use pretty_assertions::assert_eq;

use super::util::{compile_and_run_capture, linker_available, DYNAMIC, FOLDED};

/// Skip the calling test when no linker is installed.
macro_rules! require_linker {
    () => {
        if !linker_available() {
            eprintln!("skipping: no linker available");
            return;
        }
    };
}

fn assert_prints(source: &str, expected: &str) {
    for options in [FOLDED, DYNAMIC] {
        let out = compile_and_run_capture(source, options);
        assert_eq!(out.exit_code, 0, "{source:?} ({options:?}): {out:?}");
        assert_eq!(out.stdout, expected, "{source:?} ({options:?})");
        assert_eq!(out.stderr, "", "{source:?} ({options:?})");
    }
}

fn assert_fails(source: &str, expected_stderr: &str) {
    for options in [FOLDED, DYNAMIC] {
        let out = compile_and_run_capture(source, options);
        assert_eq!(out.exit_code, 1, "{source:?} ({options:?}): {out:?}");
        assert_eq!(out.stdout, "", "{source:?} ({options:?})");
        assert_eq!(out.stderr, expected_stderr, "{source:?} ({options:?})");
    }
}

#[test]
fn prints_numbers() {
    require_linker!();
    assert_prints("1 + 2", "3\n");
    assert_prints("1 / 4", "0.25\n");
    assert_prints("-(2 * 3)", "-6\n");
}

#[test]
fn prints_booleans() {
    require_linker!();
    assert_prints("\"foo\" == \"foo\"", "true\n");
    assert_prints("nil != nil", "false\n");
    assert_prints("!nil", "true\n");
}

#[test]
fn prints_strings() {
    require_linker!();
    assert_prints("\"ab\" + \"cd\"", "abcd\n");
    assert_prints("\"hi\"", "hi\n");
}

#[test]
fn prints_nil() {
    require_linker!();
    assert_prints("nil", "nil\n");
}

#[test]
fn negating_a_string_is_fatal() {
    require_linker!();
    assert_fails(
        "-(\"x\")",
        "error: type mismatch (code 3 vs 2) at line 1\n",
    );
}

#[test]
fn mismatched_operands_are_fatal() {
    require_linker!();
    assert_fails(
        "1 < \"a\"",
        "error: type mismatch (code 2 vs 3) at line 1\n",
    );
    assert_fails(
        "nil\n== 1",
        "error: type mismatch (code 0 vs 2) at line 2\n",
    );
}

#[test]
fn undefined_operator_is_fatal() {
    require_linker!();
    // No tag code in the output: the message has no conversion for it.
    assert_fails("true + true", "error: invalide operation +\n");
    assert_fails("nil < nil", "error: invalide operation <\n");
}
