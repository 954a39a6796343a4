//! Runtime dispatch, checked against the folder.
//!
//! With folding off, literal operands reach the dispatcher exactly as
//! computed values would, so every valid program must give the same value
//! either way.

use pretty_assertions::assert_eq;

use lox_ir::TypeTag;

use super::helper::{compile_ir, eval_bool, eval_number, eval_string, eval_tag, DYNAMIC, FOLDED};

/// Programs with a defined result.
const VALID: &[&str] = &[
    "1 + 2",
    "7 - 10",
    "6 * 7",
    "1 / 4",
    "1 / 0",
    "-(3 - 5)",
    "2 * (3 + 4) / 7",
    "1 < 2",
    "2 <= 2",
    "3 > 4",
    "4 >= 5",
    "1 == 1",
    "1 != 1",
    "\"ab\" + \"cd\"",
    "\"\" + \"x\"",
    "\"a\" + \"b\" + \"c\"",
    "\"foo\" == \"foo\"",
    "\"foo\" != \"bar\"",
    "\"abc\" < \"abd\"",
    "\"b\" >= \"a\"",
    "\"a\" > \"ab\"",
    "true == true",
    "true != false",
    "false == true",
    "nil == nil",
    "nil != nil",
    "!nil",
    "!true",
    "!false",
    "!0",
    "!\"s\"",
    "!(1 < 2)",
    "!(\"a\" + \"b\")",
    "(1 + 2 == 3) == true",
];

#[test]
fn dispatch_matches_folding() {
    for &source in VALID {
        let tag = eval_tag(source, FOLDED);
        assert_eq!(eval_tag(source, DYNAMIC), tag, "tag of {source}");
        match tag {
            TypeTag::Number => {
                let folded = eval_number(source, FOLDED);
                let dynamic = eval_number(source, DYNAMIC);
                assert_eq!(folded.to_bits(), dynamic.to_bits(), "{source}");
            }
            TypeTag::Boolean => {
                assert_eq!(
                    eval_bool(source, FOLDED),
                    eval_bool(source, DYNAMIC),
                    "{source}"
                );
            }
            TypeTag::String => {
                assert_eq!(
                    eval_string(source, FOLDED),
                    eval_string(source, DYNAMIC),
                    "{source}"
                );
            }
            TypeTag::Nil => {}
        }
    }
}

#[test]
fn nul_strings_never_reach_either_strategy() {
    // strcmp and strcat stop at a NUL while the folder would not.
    for source in ["\"a\0b\" == \"a\0c\"", "\"a\0b\" + \"c\""] {
        let diags = lox_parse::parse_source(source).expect_err(source);
        assert!(diags.iter().any(|d| d.code.as_str() == "E0004"), "{diags:?}");
    }
}

#[test]
fn dynamic_values() {
    assert_eq!(eval_number("1 + 2", DYNAMIC), 3.0);
    assert_eq!(eval_number("-(4)", DYNAMIC), -4.0);
    assert!(eval_bool("\"foo\" == \"foo\"", DYNAMIC));
    assert!(!eval_bool("nil != nil", DYNAMIC));
    assert_eq!(eval_string("\"ab\" + \"cd\"", DYNAMIC), "abcd");
    assert_eq!(eval_tag("\"ab\" + \"cd\"", DYNAMIC), TypeTag::String);
}

#[test]
fn nan_compares_false_except_not_equal() {
    // 0/0 is NaN in both strategies.
    for source in ["0/0 == 0/0", "0/0 < 1", "0/0 >= 1"] {
        assert!(!eval_bool(source, DYNAMIC), "{source}");
        assert!(!eval_bool(source, FOLDED), "{source}");
    }
    assert!(eval_bool("0/0 != 0/0", DYNAMIC));
    assert!(eval_bool("0/0 != 0/0", FOLDED));
}

#[test]
fn concat_leaves_operands_intact() {
    // A fresh buffer feeds the second concatenation.
    assert_eq!(
        eval_string("\"ab\" + \"cd\" + \"ef\"", DYNAMIC),
        "abcdef"
    );
    assert!(eval_bool("\"ab\" + \"cd\" == \"abcd\"", DYNAMIC));
}

#[test]
fn computed_strings_are_released() {
    // The inner sum is freed by the outer `+`, the outer one after printing.
    let chain = compile_ir("\"a\" + \"b\" + \"c\"", DYNAMIC);
    assert_eq!(chain.matches("call void @free(").count(), 2, "{chain}");

    // Literal operands are globals and never freed; only the print arm frees.
    let literals = compile_ir("\"a\" == \"b\"", DYNAMIC);
    assert_eq!(literals.matches("call void @free(").count(), 1, "{literals}");

    let not = compile_ir("!(\"a\" + \"b\")", DYNAMIC);
    assert!(not.contains("not_free:"), "{not}");
    assert!(!compile_ir("!\"a\"", DYNAMIC).contains("not_free:"));

    assert!(!compile_ir("\"a\" + \"b\"", FOLDED).contains("@free"));
}

#[test]
fn binary_blocks() {
    let ir = compile_ir("1 + 2", DYNAMIC);
    for block in [
        "bin_check:",
        "type_error:",
        "bin_compute:",
        "num_bin:",
        "str_bin:",
        "bool_bin:",
        "nil_bin:",
        "unsupported_error:",
        "cmp_end:",
        "invalid_result:",
        "bin_merge:",
    ] {
        assert!(ir.contains(block), "missing {block}\n{ir}");
    }
    assert!(ir.contains("switch i8"), "{ir}");
    assert!(ir.contains("%result_tag = phi i8"), "{ir}");
    assert!(ir.contains("%result_payload = phi ptr"), "{ir}");
    assert!(ir.contains("%is_valid = phi i1"), "{ir}");
}

#[test]
fn string_arm_uses_libc() {
    let ir = compile_ir("\"a\" + \"b\"", DYNAMIC);
    for routine in ["@strlen", "@malloc", "@strcpy", "@strcat", "@strcmp"] {
        assert!(ir.contains(routine), "missing {routine}\n{ir}");
    }
}

#[test]
fn unary_blocks() {
    let neg = compile_ir("-(1)", DYNAMIC);
    for block in ["unary_check:", "unary_error:", "unary_compute:", "unary_merge:"] {
        assert!(neg.contains(block), "missing {block}\n{neg}");
    }
    assert!(neg.contains("fneg double"), "{neg}");

    // `!` accepts every type, so it has nothing to reject.
    let not = compile_ir("!1", DYNAMIC);
    assert!(not.contains("unary_check:"), "{not}");
    assert!(!not.contains("unary_error:"), "{not}");
    assert!(not.contains("not_bool:"), "{not}");
    assert!(not.contains("not_other:"), "{not}");
}

#[test]
fn line_numbers_reach_type_errors() {
    let ir = compile_ir("1\n\n+ \"a\"", DYNAMIC);
    // The operator sits on line 3.
    assert!(ir.contains("i32 3)"), "{ir}");
}

#[test]
fn deep_nesting_compiles() {
    let source = format!("{}1{}", "(".repeat(2_000), ")".repeat(2_000));
    assert_eq!(eval_number(&source, DYNAMIC), 1.0);
    let chain = vec!["1"; 300].join(" + ");
    assert_eq!(eval_number(&chain, DYNAMIC), 300.0);
}
