use pretty_assertions::assert_eq;

use lox_ir::TypeTag;

use super::helper::{compile_ir, eval_bool, eval_number, eval_string, eval_tag, DYNAMIC, FOLDED};

#[test]
fn arithmetic_folds_to_constants() {
    assert_eq!(eval_number("1 + 2", FOLDED), 3.0);
    assert_eq!(eval_number("(1 + 2) * 4 - 6 / 3", FOLDED), 10.0);
    assert_eq!(eval_number("-(2 * 3)", FOLDED), -6.0);
}

#[test]
fn folded_program_has_no_dispatch() {
    let ir = compile_ir("(1 + 2) * 3 == 9", FOLDED);
    assert!(!ir.contains("bin_check"), "{ir}");
    assert!(!ir.contains("bin_merge"), "{ir}");
    assert!(!ir.contains("@malloc"), "{ir}");
}

#[test]
fn folding_disabled_dispatches() {
    let ir = compile_ir("1 + 2", DYNAMIC);
    assert!(ir.contains("bin_check:"), "{ir}");
    assert!(ir.contains("bin_merge:"), "{ir}");
}

#[test]
fn comparisons_fold_to_booleans() {
    assert_eq!(eval_tag("1 < 2", FOLDED), TypeTag::Boolean);
    assert!(eval_bool("1 < 2", FOLDED));
    assert!(!eval_bool("2 <= 1", FOLDED));
    assert!(eval_bool("\"foo\" == \"foo\"", FOLDED));
    assert!(eval_bool("\"abc\" < \"abd\"", FOLDED));
    assert!(!eval_bool("nil != nil", FOLDED));
    assert!(eval_bool("true != false", FOLDED));
}

#[test]
fn string_concat_folds() {
    assert_eq!(eval_string("\"ab\" + \"cd\"", FOLDED), "abcd");
    let ir = compile_ir("\"ab\" + \"cd\"", FOLDED);
    assert!(ir.contains("c\"abcd\\00\""), "{ir}");
    assert!(!ir.contains("@strcat"), "{ir}");
}

#[test]
fn not_uses_truthiness() {
    assert!(eval_bool("!nil", FOLDED));
    assert!(eval_bool("!false", FOLDED));
    assert!(!eval_bool("!true", FOLDED));
    assert!(!eval_bool("!0", FOLDED));
    assert!(!eval_bool("!\"\"", FOLDED));
    assert!(eval_bool("!!1", FOLDED));
}

#[test]
fn mismatched_constants_are_left_to_runtime() {
    let ir = compile_ir("1 < \"a\"", FOLDED);
    assert!(ir.contains("type_error:"), "{ir}");
    assert!(ir.contains("type mismatch (code %d vs %d) at line %d"), "{ir}");
}

#[test]
fn undefined_operator_is_left_to_runtime() {
    let ir = compile_ir("true + true", FOLDED);
    assert!(ir.contains("invalid_result:"), "{ir}");
    assert!(ir.contains("invalide operation +"), "{ir}");
}

#[test]
fn negating_a_string_is_left_to_runtime() {
    let ir = compile_ir("-(\"x\")", FOLDED);
    assert!(ir.contains("unary_error:"), "{ir}");
}

#[test]
fn folding_stops_at_the_failing_node() {
    // The sum folds; the comparison with a string does not.
    let ir = compile_ir("(1 + 2) < \"a\"", FOLDED);
    assert_eq!(ir.matches("bin_check:").count(), 1, "{ir}");
}
