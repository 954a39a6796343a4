use super::helper::{compile_ir, DYNAMIC, FOLDED};

#[test]
fn constant_print_is_one_call() {
    for source in ["nil", "true", "3", "\"hi\"", "1 + 2"] {
        let ir = compile_ir(source, FOLDED);
        assert_eq!(ir.matches("call i32 (ptr, ...) @printf").count(), 1, "{ir}");
        assert!(!ir.contains("print_exit"), "{ir}");
    }
}

#[test]
fn constant_formats() {
    let nil = compile_ir("nil", FOLDED);
    assert!(nil.contains("c\"nil\\0A\\00\""), "{nil}");

    let boolean = compile_ir("1 < 2", FOLDED);
    assert!(boolean.contains("c\"%s\\0A\\00\""), "{boolean}");
    assert!(boolean.contains("c\"true\\00\""), "{boolean}");

    let number = compile_ir("1 + 2", FOLDED);
    assert!(number.contains("c\"%g\\0A\\00\""), "{number}");
    assert!(number.contains("double 3.000000e+00"), "{number}");

    let string = compile_ir("\"hi\"", FOLDED);
    assert!(string.contains("c\"hi\\00\""), "{string}");
}

#[test]
fn dynamic_print_switches_on_tag() {
    let ir = compile_ir("1 + 2", DYNAMIC);
    for block in [
        "print_nil:",
        "print_bool:",
        "print_num:",
        "print_str:",
        "print_err:",
        "print_exit:",
    ] {
        assert!(ir.contains(block), "missing {block}\n{ir}");
    }
    assert!(ir.contains("Unknown type to print\\0A"), "{ir}");
    assert!(ir.contains("%bool_text = select i1"), "{ir}");
}

#[test]
fn unknown_type_is_not_fatal() {
    let ir = compile_ir("1 + 2", DYNAMIC);
    let (_, after) = ir.split_once("print_err:").unwrap();
    let block = after.split("\n\n").next().unwrap();
    assert!(block.contains("@printf"), "{block}");
    assert!(!block.contains("@exit"), "{block}");
    assert!(block.contains("br label %print_exit"), "{block}");
}

#[test]
fn main_returns_zero() {
    let ir = compile_ir("nil", FOLDED);
    assert!(ir.contains("define i32 @main()"), "{ir}");
    assert!(ir.contains("ret i32 0"), "{ir}");
}
