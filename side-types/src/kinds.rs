// Licensed under the MIT license.

#![allow(non_upper_case_globals)]

use core::fmt;

/// Severity of an event, from most to least severe. Use `Debug` if unsure.
///
/// This is a stable numeric enumeration per the ABI contract: values must not
/// change across revisions and unknown values are treated as `Invalid`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct LogLevel(u8);

impl LogLevel {
    /// Returns a `LogLevel` with the specified value.
    pub const fn from_int(value: u8) -> Self {
        Self(value)
    }

    /// Returns the numeric value of this level.
    pub const fn as_int(self) -> u8 {
        self.0
    }

    /// Unrecognized or unset level.
    pub const Invalid: Self = Self(0);
    /// System is unusable.
    pub const Emerg: Self = Self(1);
    /// Action must be taken immediately.
    pub const Alert: Self = Self(2);
    /// Critical condition.
    pub const Crit: Self = Self(3);
    /// Error condition.
    pub const Err: Self = Self(4);
    /// Warning condition.
    pub const Warning: Self = Self(5);
    /// Normal but significant condition.
    pub const Notice: Self = Self(6);
    /// Informational message.
    pub const Info: Self = Self(7);
    /// Debug-level message.
    pub const Debug: Self = Self(8);
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u8> for LogLevel {
    fn from(val: u8) -> Self {
        Self(val)
    }
}

impl From<LogLevel> for u8 {
    fn from(val: LogLevel) -> Self {
        val.0
    }
}

/// Byte order used to interpret a scalar's on-the-wire/in-memory bytes.
///
/// Integer and float byte order are tracked independently because some
/// architectures and some gathered data (e.g. a struct copied from a
/// different-endian source) disagree between the two.
#[repr(C)]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ByteOrder {
    /// Least-significant byte first.
    Little,
    /// Most-significant byte first.
    Big,
}

impl ByteOrder {
    /// The byte order of the machine this code is compiled for.
    #[inline]
    pub const fn host() -> Self {
        if cfg!(target_endian = "little") {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        }
    }

    /// True if this order matches the host's native order.
    #[inline]
    pub const fn is_host(self) -> bool {
        matches!(
            (self, Self::host()),
            (ByteOrder::Little, ByteOrder::Little) | (ByteOrder::Big, ByteOrder::Big)
        )
    }
}

/// How a `Gather` type's base pointer is used to reach the described value.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct AccessMode(u8);

impl AccessMode {
    /// Returns an `AccessMode` with the specified value.
    pub const fn from_int(value: u8) -> Self {
        Self(value)
    }

    /// Returns the numeric value of this access mode.
    pub const fn as_int(self) -> u8 {
        self.0
    }

    /// Invalid/unrecognized access mode.
    pub const Invalid: Self = Self(0);

    /// The base pointer, plus offset, addresses the value directly.
    pub const Direct: Self = Self(1);

    /// The base pointer, plus offset, addresses a pointer to the value; one
    /// machine word is dereferenced before the offset is applied to reach the
    /// actual value.
    pub const Pointer: Self = Self(2);
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u8> for AccessMode {
    fn from(val: u8) -> Self {
        Self(val)
    }
}

impl From<AccessMode> for u8 {
    fn from(val: AccessMode) -> Self {
        val.0
    }
}

/// Bit flags recorded in an `EventDescription`.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct EventFlags(u32);

impl EventFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);

    /// The event accepts extra dynamically-typed fields at call time, in
    /// addition to its statically declared fields.
    pub const VARIADIC: Self = Self(1 << 0);

    /// Returns an `EventFlags` with the specified bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True if `other`'s bits are a subset of `self`'s.
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Bitwise-or of two flag sets.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl core::ops::BitOr for EventFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Stable numeric tag identifying a [`crate::ty::TypeKind`] variant. Kept in
/// sync with the variant list by construction (see `TypeKind::tag`); unknown
/// values encountered while interpreting foreign data are treated as
/// `Invalid`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TypeTag(u8);

impl TypeTag {
    /// Returns a `TypeTag` with the specified value.
    pub const fn from_int(value: u8) -> Self {
        Self(value)
    }

    /// Returns the numeric value of this tag.
    pub const fn as_int(self) -> u8 {
        self.0
    }

    /// Invalid/unrecognized type tag.
    pub const Invalid: Self = Self(0);
    pub const Null: Self = Self(1);
    pub const Bool: Self = Self(2);
    pub const Byte: Self = Self(3);
    pub const Integer: Self = Self(4);
    pub const Pointer: Self = Self(5);
    pub const Float: Self = Self(6);
    pub const Str: Self = Self(7);
    pub const Struct: Self = Self(8);
    pub const Variant: Self = Self(9);
    pub const Array: Self = Self(10);
    pub const Vla: Self = Self(11);
    pub const VlaVisitor: Self = Self(12);
    pub const Enum: Self = Self(13);
    pub const EnumBitmap: Self = Self(14);
    pub const Gather: Self = Self(15);
    pub const Dynamic: Self = Self(16);
    pub const Optional: Self = Self(17);

    /// Reserved for future use; must be treated as `Invalid` by readers built
    /// against this version.
    pub const Reserved18: Self = Self(18);
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
