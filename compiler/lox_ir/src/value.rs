//! Runtime value model.
//!
//! A Lox value is a tagged union. The tag numbering is part of the compiled
//! program's ABI: generated code stores it in the first field of every
//! `lox.value` and runtime diagnostics print it, so the discriminants below
//! must not change.

use std::fmt;

/// Dynamic type of a value.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(u8)]
pub enum TypeTag {
    Nil = 0,
    Boolean = 1,
    Number = 2,
    String = 3,
}

impl TypeTag {
    pub const ALL: [TypeTag; 4] = [
        TypeTag::Nil,
        TypeTag::Boolean,
        TypeTag::Number,
        TypeTag::String,
    ];

    pub const fn from_u8(raw: u8) -> Option<TypeTag> {
        match raw {
            0 => Some(TypeTag::Nil),
            1 => Some(TypeTag::Boolean),
            2 => Some(TypeTag::Number),
            3 => Some(TypeTag::String),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            TypeTag::Nil => "nil",
            TypeTag::Boolean => "boolean",
            TypeTag::Number => "number",
            TypeTag::String => "string",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value known at compile time.
#[derive(Clone, PartialEq, Debug)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
}

impl Value {
    pub fn tag(&self) -> TypeTag {
        match self {
            Value::Nil => TypeTag::Nil,
            Value::Bool(_) => TypeTag::Boolean,
            Value::Number(_) => TypeTag::Number,
            Value::Str(_) => TypeTag::String,
        }
    }

    /// `nil` and `false` are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }
}

/// Prints the way the compiled program's `print` would.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Str(s) => f.write_str(s),
        }
    }
}

/// Format a number the way C's `printf("%g")` does: six significant
/// digits, trailing zeros dropped, exponent form outside `1e-4..1e6`.
pub fn format_number(n: f64) -> String {
    const PRECISION: i32 = 6;

    if n.is_nan() {
        return "nan".to_string();
    }
    if n.is_infinite() {
        return if n < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    if n == 0.0 {
        return if n.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // Rounding to six significant digits can bump the exponent (999999.5
    // becomes 1e+06), so read it back from the rounded scientific form.
    let sci = format!("{:.*e}", (PRECISION - 1) as usize, n);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);

    if (-4..PRECISION).contains(&exp) {
        let decimals = (PRECISION - 1 - exp) as usize;
        let fixed = format!("{n:.decimals$}");
        strip_fraction_zeros(&fixed).to_string()
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        format!(
            "{}e{sign}{:02}",
            strip_fraction_zeros(mantissa),
            exp.unsigned_abs()
        )
    }
}

fn strip_fraction_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn tags_are_stable() {
        for tag in TypeTag::ALL {
            assert_eq!(TypeTag::from_u8(tag.as_u8()), Some(tag));
        }
        assert_eq!(TypeTag::Nil.as_u8(), 0);
        assert_eq!(TypeTag::Boolean.as_u8(), 1);
        assert_eq!(TypeTag::Number.as_u8(), 2);
        assert_eq!(TypeTag::String.as_u8(), 3);
        assert_eq!(TypeTag::from_u8(4), None);
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Number(0.0).is_truthy());
        assert!(Value::Str(String::new()).is_truthy());
    }

    #[test]
    fn numbers_print_like_percent_g() {
        let cases = [
            (3.0, "3"),
            (-2.5, "-2.5"),
            (0.1, "0.1"),
            (1.0 / 3.0, "0.333333"),
            (123_456.0, "123456"),
            (1_234_567.0, "1.23457e+06"),
            (1_000_000.0, "1e+06"),
            (999_999.5, "1e+06"),
            (0.0001, "0.0001"),
            (0.000_012_5, "1.25e-05"),
            (1e100, "1e+100"),
            (f64::INFINITY, "inf"),
            (f64::NEG_INFINITY, "-inf"),
            (0.0, "0"),
        ];
        for (n, expected) in cases {
            assert_eq!(format_number(n), expected, "formatting {n:?}");
        }
    }

    #[test]
    fn values_display() {
        assert_eq!(Value::Nil.to_string(), "nil");
        assert_eq!(Value::Bool(false).to_string(), "false");
        assert_eq!(Value::Number(7.0).to_string(), "7");
        assert_eq!(Value::Str("hi there".into()).to_string(), "hi there");
    }

    proptest! {
        #[test]
        fn integers_below_a_million_print_exactly(n in -999_999i32..=999_999) {
            prop_assert_eq!(format_number(f64::from(n)), n.to_string());
        }

        #[test]
        fn formatted_numbers_parse_back_close(n in -1e12f64..1e12) {
            let text = format_number(n);
            let parsed: f64 = text.parse().unwrap();
            let tolerance = n.abs() * 1e-5 + 1e-9;
            prop_assert!((parsed - n).abs() <= tolerance, "{} -> {}", n, text);
        }
    }
}
