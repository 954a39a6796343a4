//! `print` lowering.
//!
//! Output formats, one line per value:
//!
//! | Type | Format |
//! |------|--------|
//! | nil | `nil` |
//! | boolean | `true` / `false` |
//! | number | `%g` |
//! | string | the bytes as-is |
//!
//! A constant is printed with a single `printf` chosen at generation time.
//! A runtime value switches on its tag; an unknown tag prints
//! `Unknown type to print` to stdout and the program carries on. Printing
//! consumes a runtime string, so its buffer is freed afterwards.

use inkwell::values::BasicValueEnum;
use tracing::{instrument, trace};

use lox_ir::{TypeTag, Value};

use crate::builder::Builder;
use crate::declare::RuntimeFn;
use crate::value::LoxValue;

pub const UNKNOWN_TYPE_MESSAGE: &str = "Unknown type to print\n";

impl<'ll> Builder<'_, 'll> {
    fn printf(&self, format: &str, args: &[BasicValueEnum<'ll>]) {
        let mut call_args: Vec<BasicValueEnum<'ll>> = vec![self.cx().cstring(format).into()];
        call_args.extend_from_slice(args);
        self.call(self.cx().runtime_fn(RuntimeFn::Printf), &call_args, "");
    }

    /// Print `value` followed by a newline.
    #[instrument(skip(self, value), level = "trace")]
    pub fn compile_print(&self, value: &LoxValue<'ll>) {
        match value.as_constant() {
            Some(constant) => self.print_constant(constant),
            None => self.print_dynamic(value),
        }
    }

    fn print_constant(&self, value: &Value) {
        trace!(%value, "print constant");
        let cx = self.cx();
        match value {
            Value::Nil => self.printf("nil\n", &[]),
            Value::Bool(b) => {
                let text = cx.cstring(if *b { "true" } else { "false" });
                self.printf("%s\n", &[text.into()]);
            }
            Value::Number(n) => {
                let n = cx.scx.type_f64().const_float(*n);
                self.printf("%g\n", &[n.into()]);
            }
            Value::Str(s) => self.printf("%s\n", &[cx.cstring(s).into()]),
        }
    }

    fn print_dynamic(&self, value: &LoxValue<'ll>) {
        let cx = self.cx();
        let (tag, payload) = self.unwrap(value);

        let nil_block = self.append_block("print_nil");
        let bool_block = self.append_block("print_bool");
        let num_block = self.append_block("print_num");
        let str_block = self.append_block("print_str");
        let err_block = self.append_block("print_err");
        let exit = self.append_block("print_exit");

        self.switch(
            tag,
            err_block,
            &[
                (self.tag_const(TypeTag::Nil), nil_block),
                (self.tag_const(TypeTag::Boolean), bool_block),
                (self.tag_const(TypeTag::Number), num_block),
                (self.tag_const(TypeTag::String), str_block),
            ],
        );

        self.position_at_end(nil_block);
        self.printf("nil\n", &[]);
        self.br(exit);

        self.position_at_end(bool_block);
        let b = self.load_bool(payload);
        let text = self.select(
            b,
            cx.cstring("true").into(),
            cx.cstring("false").into(),
            "bool_text",
        );
        self.printf("%s\n", &[text]);
        self.br(exit);

        self.position_at_end(num_block);
        let n = self.load_number(payload);
        self.printf("%g\n", &[n.into()]);
        self.br(exit);

        self.position_at_end(str_block);
        self.printf("%s\n", &[payload.into()]);
        self.release_string(payload);
        self.br(exit);

        self.position_at_end(err_block);
        self.printf(UNKNOWN_TYPE_MESSAGE, &[]);
        self.br(exit);

        self.position_at_end(exit);
    }
}
