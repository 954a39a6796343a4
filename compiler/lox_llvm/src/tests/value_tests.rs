use inkwell::context::Context;
use inkwell::values::BasicValueEnum;
use inkwell::{IntPredicate, OptimizationLevel};

use lox_ir::{TypeTag, Value};

use crate::aot::TargetConfig;
use crate::builder::Builder;
use crate::context::CodegenCx;
use crate::module::CodegenOptions;
use crate::value::LoxValue;

/// Build `i8 check()` from `body`, JIT it and return the result.
#[allow(unsafe_code)]
fn run_i8(body: impl for<'a, 'll> Fn(&Builder<'a, 'll>) -> BasicValueEnum<'ll>) -> u8 {
    TargetConfig::native().unwrap();
    let context = Context::create();
    let cx = CodegenCx::new(&context, "value_test", CodegenOptions::default());
    let fn_ty = cx.scx.type_func(&[], cx.scx.type_i8().into(), false);
    let func = cx.llmod().add_function("check", fn_ty, None);
    let bx = Builder::build(&cx, cx.llcx().append_basic_block(func, "entry"));
    let result = body(&bx);
    bx.ret(result);
    cx.llmod().verify().unwrap();

    let ee = cx
        .llmod()
        .create_jit_execution_engine(OptimizationLevel::None)
        .unwrap();
    unsafe {
        ee.get_function::<unsafe extern "C" fn() -> u8>("check")
            .unwrap()
            .call()
    }
}

fn widen<'ll>(bx: &Builder<'_, 'll>, flag: inkwell::values::IntValue<'ll>) -> BasicValueEnum<'ll> {
    bx.zext(flag, bx.cx().scx.type_i8(), "flag").into()
}

#[test]
fn number_round_trip() {
    let ok = run_i8(|bx| {
        let n = bx.cx().scx.type_f64().const_float(4.5);
        let value = bx.wrap(n.into(), TypeTag::Number);
        let (tag, payload) = bx.unwrap(&value);
        let same_tag = bx.icmp(IntPredicate::EQ, tag, bx.tag_const(TypeTag::Number), "t");
        let loaded = bx.load_number(payload);
        let same_num = bx.fcmp(inkwell::FloatPredicate::OEQ, loaded, n, "n");
        let all = bx.select(
            same_tag,
            same_num.into(),
            bx.cx().scx.type_i1().const_zero().into(),
            "all",
        );
        widen(bx, all.into_int_value())
    });
    assert_eq!(ok, 1);
}

#[test]
fn boolean_round_trip() {
    for b in [false, true] {
        let loaded = run_i8(|bx| {
            let flag = bx.cx().scx.type_i1().const_int(u64::from(b), false);
            let value = bx.wrap(flag.into(), TypeTag::Boolean);
            let (_, payload) = bx.unwrap(&value);
            widen(bx, bx.load_bool(payload))
        });
        assert_eq!(loaded, u8::from(b));
    }
}

#[test]
fn string_payload_is_the_buffer() {
    let same = run_i8(|bx| {
        let text = bx.cx().cstring("hello");
        let value = bx.wrap(text.into(), TypeTag::String);
        let (_, payload) = bx.unwrap(&value);
        let order = bx
            .call(
                bx.cx().runtime_fn(crate::declare::RuntimeFn::Strcmp),
                &[payload.into(), text.into()],
                "cmp",
            )
            .unwrap()
            .into_int_value();
        let zero = bx.cx().scx.type_i32().const_zero();
        widen(bx, bx.icmp(IntPredicate::EQ, order, zero, "same"))
    });
    assert_eq!(same, 1);
}

#[test]
fn tags_round_trip() {
    for tag in TypeTag::ALL {
        let raw = run_i8(|bx| {
            let cx = bx.cx();
            let scalar: BasicValueEnum<'_> = match tag {
                TypeTag::Nil => cx.scx.type_ptr().const_null().into(),
                TypeTag::Boolean => cx.scx.type_i1().const_zero().into(),
                TypeTag::Number => cx.scx.type_f64().const_float(1.0).into(),
                TypeTag::String => cx.cstring("s").into(),
            };
            let value = bx.wrap(scalar, tag);
            bx.unwrap(&value).0.into()
        });
        assert_eq!(TypeTag::from_u8(raw), Some(tag));
    }
}

#[test]
fn nil_payload_is_null() {
    let is_null = run_i8(|bx| {
        let value = bx.wrap(bx.cx().scx.type_ptr().const_null().into(), TypeTag::Nil);
        let (_, payload) = bx.unwrap(&value);
        let int = bx.cx().scx.type_i64();
        let as_int = bx.load(int.into(), bx.box_scalar(payload.into(), "p"), "as_int");
        widen(
            bx,
            bx.icmp(IntPredicate::EQ, as_int.into_int_value(), int.const_zero(), "null"),
        )
    });
    assert_eq!(is_null, 1);
}

#[test]
fn constants_read_like_slots() {
    for value in [
        Value::Nil,
        Value::Bool(true),
        Value::Number(2.0),
        Value::Str("x".into()),
    ] {
        let raw = run_i8(|bx| {
            let constant = bx.make_constant(&value);
            assert!(matches!(constant, LoxValue::Constant { .. }));
            assert_eq!(constant.as_constant(), Some(&value));
            bx.unwrap(&constant).0.into()
        });
        assert_eq!(TypeTag::from_u8(raw), Some(value.tag()));
    }
}

#[test]
fn constant_globals_are_named_and_immutable() {
    let context = Context::create();
    let cx = CodegenCx::new(&context, "names", CodegenOptions::default());
    let func = cx
        .llmod()
        .add_function("f", cx.scx.type_void_func(&[]), None);
    let bx = Builder::build(&cx, cx.llcx().append_basic_block(func, "entry"));

    let LoxValue::Constant { global, .. } = bx.make_constant(&Value::Number(1.5)) else {
        panic!("expected a constant");
    };
    assert!(global.is_constant());
    let name = global.get_name().to_string_lossy().into_owned();
    assert!(name.starts_with("const.loxval"), "{name}");

    let ir = cx.llmod().print_to_string().to_string();
    assert!(ir.contains("@const.num"), "{ir}");
    assert!(ir.contains("double 1.5"), "{ir}");
    assert!(ir.contains("%lox.value = type { i8, ptr }"), "{ir}");
}
