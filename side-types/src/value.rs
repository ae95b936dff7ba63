// Licensed under the MIT license.

//! The `Arg` algebra: values passed at call time, mirroring [`crate::ty::Type`].

use std::boxed::Box;

use crate::ty::Type;

/// A scalar or small compound value copied onto the argument stack, as
/// opposed to one reached by pointer ([`ArgKind::Gather`]) or carrying its
/// own type ([`ArgKind::Dynamic`]).
#[derive(Clone, Debug, PartialEq)]
pub enum StaticValue {
    /// No value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A single byte.
    Byte(u8),
    /// An integer, stored widened to 128 bits; the paired `Type::Integer`
    /// carries the declared width, signedness, and bit window.
    Integer(i128),
    /// A pointer-sized value.
    Pointer(usize),
    /// A 16-bit float's raw bits (stable Rust has no native `f16`).
    F16Bits(u16),
    /// A 32-bit float.
    F32(f32),
    /// A 64-bit float.
    F64(f64),
    /// A 128-bit float's raw bits.
    F128Bits(u128),
    /// A UTF-8 string.
    Str(Box<str>),
    /// A struct's fields, in declaration order.
    Struct(Vec<StaticValue>),
    /// A fixed- or variable-length array's elements.
    Array(Vec<StaticValue>),
}

/// A self-describing value: a type paired with the value it describes,
/// used wherever a [`crate::ty::TypeKind::Dynamic`] placeholder or a
/// variadic extra field needs its shape supplied at call time.
#[derive(Clone, Debug, PartialEq)]
pub struct DynamicValue {
    ty: Type,
    value: StaticValue,
}

impl DynamicValue {
    /// Creates a new dynamic value.
    pub fn new(ty: Type, value: StaticValue) -> Self {
        Self { ty, value }
    }

    /// Returns the value's type.
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// Returns the value itself.
    pub fn value(&self) -> &StaticValue {
        &self.value
    }
}

/// The payload half of an [`Arg`], mirroring how its paired [`Type`] is
/// reached: inline, by pointer, or self-describing.
#[derive(Clone, Debug, PartialEq)]
pub enum ArgKind {
    /// Value copied inline onto the argument stack.
    Static(StaticValue),
    /// Value reached through a base pointer plus the paired
    /// [`crate::ty::GatherType`]'s offset/access-mode. The pointer is not
    /// dereferenced here; dispatch performs that read under the RCU
    /// critical section, after the enabled check.
    Gather(*const u8),
    /// A self-describing value supplying both type and payload.
    Dynamic(Box<DynamicValue>),
}

// `Arg` carries a raw pointer for the `Gather` case; the pointee is never
// read through this type, only forwarded, so `Send`/`Sync` hold as long as
// callers uphold the same discipline any builder of this value type relies on.
unsafe impl Send for ArgKind {}
unsafe impl Sync for ArgKind {}

/// One positional argument supplied to `dispatch`/`dispatch_variadic`,
/// paired against the event's declared fields (or, for variadic extras,
/// carrying its own [`DynamicValue`] type).
#[derive(Clone, Debug)]
pub struct Arg {
    kind: ArgKind,
}

impl Arg {
    /// Creates a new argument.
    pub fn new(kind: ArgKind) -> Self {
        Self { kind }
    }

    /// Returns the argument's kind.
    pub fn kind(&self) -> &ArgKind {
        &self.kind
    }

    /// Convenience constructor for a static value.
    pub fn from_static(value: StaticValue) -> Self {
        Self::new(ArgKind::Static(value))
    }

    /// Convenience constructor for a gathered value, described by `base`.
    ///
    /// # Safety
    ///
    /// `base`, together with the paired `GatherType`'s offset and access
    /// mode, must address valid memory for the lifetime of the dispatch
    /// call this argument is passed to.
    pub unsafe fn from_gather(base: *const u8) -> Self {
        Self::new(ArgKind::Gather(base))
    }

    /// Convenience constructor for a self-describing value.
    pub fn from_dynamic(value: DynamicValue) -> Self {
        Self::new(ArgKind::Dynamic(Box::new(value)))
    }
}
