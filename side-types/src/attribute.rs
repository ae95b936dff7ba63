// Licensed under the MIT license.

use std::fmt;

/// The value half of an [`Attribute`]. Attributes are opaque to the core —
/// tracers interpret them (e.g. the key `std.integer.base` selects display
/// radix).
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    /// No value.
    Null,
    /// A boolean value.
    Bool(bool),
    /// Signed 8-bit integer.
    I8(i8),
    /// Signed 16-bit integer.
    I16(i16),
    /// Signed 32-bit integer.
    I32(i32),
    /// Signed 64-bit integer.
    I64(i64),
    /// Signed 128-bit integer.
    I128(i128),
    /// Unsigned 8-bit integer.
    U8(u8),
    /// Unsigned 16-bit integer.
    U16(u16),
    /// Unsigned 32-bit integer.
    U32(u32),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// Unsigned 128-bit integer.
    U128(u128),
    /// 16-bit float, stored as its raw bit pattern (stable Rust has no
    /// native `f16`).
    F16Bits(u16),
    /// 32-bit float.
    F32(f32),
    /// 64-bit float.
    F64(f64),
    /// 128-bit float, stored as its raw bit pattern (stable Rust has no
    /// native `f128`).
    F128Bits(u128),
    /// A UTF-8 string.
    Str(Box<str>),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Null => write!(f, "null"),
            AttrValue::Bool(v) => write!(f, "{v}"),
            AttrValue::I8(v) => write!(f, "{v}"),
            AttrValue::I16(v) => write!(f, "{v}"),
            AttrValue::I32(v) => write!(f, "{v}"),
            AttrValue::I64(v) => write!(f, "{v}"),
            AttrValue::I128(v) => write!(f, "{v}"),
            AttrValue::U8(v) => write!(f, "{v}"),
            AttrValue::U16(v) => write!(f, "{v}"),
            AttrValue::U32(v) => write!(f, "{v}"),
            AttrValue::U64(v) => write!(f, "{v}"),
            AttrValue::U128(v) => write!(f, "{v}"),
            AttrValue::F16Bits(bits) => write!(f, "f16({bits:#06x})"),
            AttrValue::F32(v) => write!(f, "{v}"),
            AttrValue::F64(v) => write!(f, "{v}"),
            AttrValue::F128Bits(bits) => write!(f, "f128({bits:#034x})"),
            AttrValue::Str(v) => write!(f, "{v}"),
        }
    }
}

/// A (key, value) pair attached to a [`crate::ty::Type`] or an
/// [`crate::event::EventDescription`]. Attributes are opaque to the core.
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    key: String,
    value: AttrValue,
}

impl Attribute {
    /// Creates a new attribute.
    pub fn new(key: impl Into<String>, value: AttrValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// Returns the attribute's key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the attribute's value.
    pub fn value(&self) -> &AttrValue {
        &self.value
    }
}
