//! Runtime value model.
//!
//! Every llox value is a `lox.value = { i8 tag, ptr payload }`. It exists
//! in two forms with the same layout:
//!
//! - constant: a private `const.loxval*` global whose payload points at a
//!   `const.num*` / `const.bool*` / `const.str*` global (or is `null` for
//!   nil)
//! - runtime: an entry-block stack slot written by generated code
//!
//! Both are reached through a pointer, so [`Builder::unwrap`] reads either
//! one with the same two loads.

use inkwell::values::{BasicValueEnum, GlobalValue, IntValue, PointerValue};
use tracing::trace;

use lox_ir::{TypeTag, Value};

use crate::builder::Builder;
use crate::context::CONST_VALUE_PREFIX;
use crate::declare::RuntimeFn;

/// Field index of the tag in `lox.value`.
pub const TAG_FIELD: u32 = 0;
/// Field index of the payload pointer in `lox.value`.
pub const PAYLOAD_FIELD: u32 = 1;

/// Handle to a runtime value produced by the generator.
#[derive(Clone, Debug)]
pub enum LoxValue<'ll> {
    /// A `const.loxval` global. `value` is what its initializer encodes.
    Constant {
        global: GlobalValue<'ll>,
        value: Value,
    },
    /// A stack slot written at run time. A runtime STRING owns its heap
    /// payload; whoever consumes the value frees it.
    Runtime(PointerValue<'ll>),
}

impl<'ll> LoxValue<'ll> {
    /// Pointer to the `lox.value` aggregate.
    pub fn ptr(&self) -> PointerValue<'ll> {
        match self {
            LoxValue::Constant { global, .. } => global.as_pointer_value(),
            LoxValue::Runtime(slot) => *slot,
        }
    }

    /// The known value, if this handle is a constant.
    pub fn as_constant(&self) -> Option<&Value> {
        match self {
            LoxValue::Constant { value, .. } => Some(value),
            LoxValue::Runtime(_) => None,
        }
    }
}

impl<'ll> Builder<'_, 'll> {
    /// The `i8` constant for `tag`.
    pub fn tag_const(&self, tag: TypeTag) -> IntValue<'ll> {
        self.cx()
            .scx
            .type_i8()
            .const_int(u64::from(tag.as_u8()), false)
    }

    /// Materialize `value` as an immutable global.
    pub fn make_constant(&self, value: &Value) -> LoxValue<'ll> {
        let cx = self.cx();
        let payload: PointerValue<'ll> = match value {
            Value::Nil => cx.scx.type_ptr().const_null(),
            Value::Bool(b) => {
                let init = cx.scx.type_i1().const_int(u64::from(*b), false);
                cx.add_private_constant(&cx.const_name("const.bool"), init.into())
                    .as_pointer_value()
            }
            Value::Number(n) => {
                let init = cx.scx.type_f64().const_float(*n);
                cx.add_private_constant(&cx.const_name("const.num"), init.into())
                    .as_pointer_value()
            }
            Value::Str(s) => {
                let init = cx.llcx().const_string(s.as_bytes(), true);
                cx.add_private_constant(&cx.const_name("const.str"), init.into())
                    .as_pointer_value()
            }
        };
        let aggregate = cx
            .value_type
            .const_named_struct(&[self.tag_const(value.tag()).into(), payload.into()]);
        let global = cx.add_private_constant(&cx.const_name(CONST_VALUE_PREFIX), aggregate.into());
        trace!(%value, name = ?global.get_name(), "constant");
        LoxValue::Constant {
            global,
            value: value.clone(),
        }
    }

    /// Store a scalar into a fresh slot so it can serve as a payload.
    pub fn box_scalar(&self, scalar: BasicValueEnum<'ll>, name: &str) -> PointerValue<'ll> {
        let slot = self.create_entry_alloca(name, scalar.get_type());
        self.store(scalar, slot);
        slot
    }

    /// `free` a consumed runtime string payload.
    pub fn release_string(&self, payload: PointerValue<'ll>) {
        self.call(self.cx().runtime_fn(RuntimeFn::Free), &[payload.into()], "");
    }

    /// Write `tag` and an already-prepared payload pointer into a new slot.
    pub fn wrap_payload(&self, payload: PointerValue<'ll>, tag: IntValue<'ll>) -> LoxValue<'ll> {
        let ty = self.cx().value_type;
        let slot = self.create_entry_alloca("lox_value", ty.into());
        let tag_ptr = self.struct_gep(ty, slot, TAG_FIELD, "tag_ptr");
        self.store(tag.into(), tag_ptr);
        let payload_ptr = self.struct_gep(ty, slot, PAYLOAD_FIELD, "payload_ptr");
        self.store(payload.into(), payload_ptr);
        LoxValue::Runtime(slot)
    }

    /// Wrap a scalar or pointer as a runtime value of type `tag`.
    ///
    /// Numbers (`double`) and booleans (`i1`) are boxed; strings are passed
    /// as their byte pointer and nil as `null`.
    pub fn wrap(&self, scalar: BasicValueEnum<'ll>, tag: TypeTag) -> LoxValue<'ll> {
        let payload = match tag {
            TypeTag::Number => self.box_scalar(scalar, "num_mem"),
            TypeTag::Boolean => self.box_scalar(scalar, "bool_mem"),
            TypeTag::String => scalar.into_pointer_value(),
            TypeTag::Nil => self.cx().scx.type_ptr().const_null(),
        };
        self.wrap_payload(payload, self.tag_const(tag))
    }

    /// Load the tag and payload pointer of a value.
    pub fn unwrap(&self, value: &LoxValue<'ll>) -> (IntValue<'ll>, PointerValue<'ll>) {
        let ty = self.cx().value_type;
        let ptr = value.ptr();
        let tag_ptr = self.struct_gep(ty, ptr, TAG_FIELD, "tag_ptr");
        let tag = self
            .load(self.cx().scx.type_i8().into(), tag_ptr, "tag")
            .into_int_value();
        let payload_ptr = self.struct_gep(ty, ptr, PAYLOAD_FIELD, "payload_ptr");
        let payload = self
            .load(self.cx().scx.type_ptr().into(), payload_ptr, "payload")
            .into_pointer_value();
        (tag, payload)
    }

    /// Load the `double` a NUMBER payload points at.
    pub fn load_number(&self, payload: PointerValue<'ll>) -> inkwell::values::FloatValue<'ll> {
        self.load(self.cx().scx.type_f64().into(), payload, "num")
            .into_float_value()
    }

    /// Load the `i1` a BOOLEAN payload points at.
    pub fn load_bool(&self, payload: PointerValue<'ll>) -> IntValue<'ll> {
        self.load(self.cx().scx.type_i1().into(), payload, "bool")
            .into_int_value()
    }
}
