//! Fatal runtime diagnostics.
//!
//! A fatal block formats its message into a stack buffer, writes
//! `error: <message>` to stderr and exits with status 1. It never falls
//! through; the block ends in `unreachable`.

use inkwell::values::BasicValueEnum;
use tracing::trace;

use crate::builder::Builder;
use crate::declare::RuntimeFn;

/// Size of the message buffer, terminator included.
pub const ERROR_BUFFER_LEN: u32 = 256;

pub const TYPE_MISMATCH_FORMAT: &str = "type mismatch (code %d vs %d) at line %d";
pub const UNSUPPORTED_TYPE_FORMAT: &str = "unsupported type: %d";

/// The misspelling is part of the message format existing tooling matches.
pub fn invalid_operation_message(op_symbol: &str) -> String {
    format!("invalide operation {op_symbol}")
}

impl<'ll> Builder<'_, 'll> {
    /// Terminate the current block with a fatal report.
    ///
    /// `format` is an `snprintf` format; `args` must match it.
    pub fn emit_fatal(&self, format: &str, args: &[BasicValueEnum<'ll>]) {
        trace!(format, "fatal report");
        let cx = self.cx();
        let buffer = self.create_entry_alloca(
            "err_buf",
            cx.scx.type_i8().array_type(ERROR_BUFFER_LEN).into(),
        );

        let len = cx.scx.type_i64().const_int(u64::from(ERROR_BUFFER_LEN), false);
        let mut snprintf_args: Vec<BasicValueEnum<'ll>> =
            vec![buffer.into(), len.into(), cx.cstring(format).into()];
        snprintf_args.extend_from_slice(args);
        self.call(cx.runtime_fn(RuntimeFn::Snprintf), &snprintf_args, "");

        let stderr = self.load(
            cx.scx.type_ptr().into(),
            cx.stderr_global().as_pointer_value(),
            "stderr",
        );
        self.call(
            cx.runtime_fn(RuntimeFn::Fprintf),
            &[stderr, cx.cstring("error: %s\n").into(), buffer.into()],
            "",
        );

        let status = cx.scx.type_i32().const_int(1, false);
        self.call(cx.runtime_fn(RuntimeFn::Exit), &[status.into()], "");
        self.unreachable();
    }
}
