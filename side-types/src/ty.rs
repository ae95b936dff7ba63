// Licensed under the MIT license.

//! The `Type` algebra: a tagged union over scalar, compound, enumeration,
//! gather, dynamic, and optional type descriptions.

use std::boxed::Box;
use std::vec::Vec;

use crate::attribute::Attribute;
use crate::field::Field;
use crate::kinds::{AccessMode, ByteOrder, TypeTag};

/// Width, in bits, of an integer or float scalar.
pub type Width = u16;

/// A fixed-width integer type.
#[derive(Clone, Debug, PartialEq)]
pub struct IntegerType {
    /// Declared storage width: 8, 16, 32, 64, or 128.
    pub width: Width,
    /// Whether the value is interpreted as two's-complement signed.
    pub signed: bool,
    /// Byte order used to load the raw storage before any bit-window
    /// extraction.
    pub byte_order: ByteOrder,
    /// Number of significant bits, starting at `offset_bits`. Equal to
    /// `width` unless the integer is a sub-word bitfield.
    pub effective_bits: u16,
    /// Bit offset (0 = least significant bit after host-order load) of the
    /// first significant bit.
    pub offset_bits: u16,
}

impl IntegerType {
    /// A plain, full-width integer with no bit-window narrowing.
    pub fn plain(width: Width, signed: bool, byte_order: ByteOrder) -> Self {
        Self {
            width,
            signed,
            byte_order,
            effective_bits: width,
            offset_bits: 0,
        }
    }
}

/// A floating-point type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FloatType {
    /// Declared storage width: 16, 32, 64, or 128.
    pub width: Width,
    /// Byte order, tracked independently from any integer in the same
    /// struct.
    pub byte_order: ByteOrder,
}

/// Character/code-unit encoding for a [`Type::Str`] or gather string.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StrEncoding {
    /// 1-byte code units.
    Utf8,
    /// 2-byte code units.
    Utf16,
    /// 4-byte code units.
    Utf32,
}

impl StrEncoding {
    /// Size in bytes of one code unit; must be 1, 2, or 4 rule).
    pub const fn unit_size(self) -> usize {
        match self {
            StrEncoding::Utf8 => 1,
            StrEncoding::Utf16 => 2,
            StrEncoding::Utf32 => 4,
        }
    }
}

/// A string type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrType {
    /// Code unit encoding.
    pub encoding: StrEncoding,
    /// Byte order of each code unit.
    pub byte_order: ByteOrder,
}

/// A tagged-union compound type: a selector integer picks which of several
/// ranges of the payload applies.
#[derive(Clone, Debug, PartialEq)]
pub struct VariantType {
    /// The integer type used to select among `options`. Must be an
    /// `Integer` (enforced by `validate()`).
    pub selector: Box<IntegerType>,
    /// `(range_begin, range_end, type)` triples; the first matching range
    /// (inclusive) determines how the payload is interpreted.
    pub options: Vec<(i128, i128, Type)>,
}

/// A fixed-length homogeneous array.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayType {
    /// Element type.
    pub element: Box<Type>,
    /// Element count.
    pub length: usize,
}

/// A variable-length homogeneous array whose length is supplied as a value
/// at call time rather than declared statically.
#[derive(Clone, Debug, PartialEq)]
pub struct VlaType {
    /// Type of the length value (typically an unsigned `Integer`).
    pub length: Box<Type>,
    /// Element type.
    pub element: Box<Type>,
}

/// A variable-length array whose elements are produced on demand by an
/// application-supplied visitor callback rather than laid out contiguously.
#[derive(Clone, Debug, PartialEq)]
pub struct VlaVisitorType {
    /// Type of the length value.
    pub length: Box<Type>,
    /// Type of each element the visitor produces.
    pub element: Box<Type>,
    /// Opaque identifier for the visitor function; interpreted by the
    /// argument side (`Arg`), not by the type description itself.
    pub visitor_fn: usize,
}

/// An integer-valued enumeration: ranges of the underlying integer map to
/// labels.
#[derive(Clone, Debug, PartialEq)]
pub struct EnumType {
    /// Underlying storage.
    pub element: IntegerType,
    /// `(range_begin, range_end, label)` triples.
    pub mappings: Vec<(i128, i128, Box<str>)>,
}

/// The underlying storage kind accepted by an [`EnumBitmapType`].
#[derive(Clone, Debug, PartialEq)]
pub enum BitmapElement {
    /// A single integer's bits are interpreted directly.
    Integer(IntegerType),
    /// A fixed-length array of integers; bit numbering continues across
    /// elements in element-stride order.
    Array(ArrayType),
    /// A variable-length array of integers, same bit-numbering rule.
    Vla(VlaType),
}

/// A bitmap enumeration: each set bit (or bit range) maps to a label.
#[derive(Clone, Debug, PartialEq)]
pub struct EnumBitmapType {
    /// Underlying storage.
    pub element: Box<BitmapElement>,
    /// `(bit_range, label)` pairs, where `bit_range` is `(first_bit,
    /// last_bit)` inclusive.
    pub mappings: Vec<((u32, u32), Box<str>)>,
}

/// The scalar/compound kind embedded inside a [`GatherType`].
#[derive(Clone, Debug, PartialEq)]
pub enum GatherKind {
    /// A single byte.
    Byte,
    /// A boolean.
    Bool,
    /// An integer.
    Integer(IntegerType),
    /// A pointer-sized integer.
    Pointer,
    /// A float.
    Float(FloatType),
    /// A string.
    Str(StrType),
    /// A struct of gathered fields.
    Struct(Vec<Field>),
    /// A fixed-length array of gathered elements.
    Array(Box<GatherType>),
    /// A variable-length array of gathered elements. Nesting a `Vla` kind
    /// (directly or via `Array`) inside this is forbidden — enforced by
    /// [`crate::validate::validate`].
    Vla {
        /// Type describing the runtime-supplied length value.
        length: Box<Type>,
        /// Element kind.
        element: Box<GatherType>,
    },
}

/// A value described *by pointer and offset* rather than inlined in the
/// argument vector.
#[derive(Clone, Debug, PartialEq)]
pub struct GatherType {
    /// Offset from the base pointer, in units of the base pointer's element
    /// size.
    pub offset: usize,
    /// How the base pointer reaches the value.
    pub access_mode: AccessMode,
    /// The scalar/compound shape at that location.
    pub kind: GatherKind,
}

/// The tag-plus-payload half of [`Type`] (attributes live on the wrapping
/// struct so every variant shares one representation instead of repeating
/// the field on twenty-odd enum arms).
#[derive(Clone, Debug, PartialEq)]
pub enum TypeKind {
    /// No value.
    Null,
    /// A boolean.
    Bool,
    /// A single byte, no format semantics attached.
    Byte,
    /// A fixed-width integer.
    Integer(IntegerType),
    /// A pointer, an integer specialization sized to the host pointer.
    Pointer,
    /// A floating-point value.
    Float(FloatType),
    /// A string.
    Str(StrType),
    /// A struct of named fields.
    Struct(Vec<Field>),
    /// A tagged-union compound type.
    Variant(VariantType),
    /// A fixed-length array.
    Array(ArrayType),
    /// A variable-length array (length supplied at call time).
    Vla(VlaType),
    /// A variable-length, visitor-produced array.
    VlaVisitor(VlaVisitorType),
    /// An integer-valued enumeration.
    Enum(EnumType),
    /// A bitmap enumeration.
    EnumBitmap(EnumBitmapType),
    /// A value described by pointer and offset.
    Gather(GatherType),
    /// A placeholder whose actual type is supplied per call.
    Dynamic,
    /// An optional value; the per-call argument carries a presence
    /// selector.
    Optional(Box<Type>),
}

impl TypeKind {
    /// Returns the stable numeric tag identifying this variant.
    pub fn tag(&self) -> TypeTag {
        match self {
            TypeKind::Null => TypeTag::Null,
            TypeKind::Bool => TypeTag::Bool,
            TypeKind::Byte => TypeTag::Byte,
            TypeKind::Integer(_) => TypeTag::Integer,
            TypeKind::Pointer => TypeTag::Pointer,
            TypeKind::Float(_) => TypeTag::Float,
            TypeKind::Str(_) => TypeTag::Str,
            TypeKind::Struct(_) => TypeTag::Struct,
            TypeKind::Variant(_) => TypeTag::Variant,
            TypeKind::Array(_) => TypeTag::Array,
            TypeKind::Vla(_) => TypeTag::Vla,
            TypeKind::VlaVisitor(_) => TypeTag::VlaVisitor,
            TypeKind::Enum(_) => TypeTag::Enum,
            TypeKind::EnumBitmap(_) => TypeTag::EnumBitmap,
            TypeKind::Gather(_) => TypeTag::Gather,
            TypeKind::Dynamic => TypeTag::Dynamic,
            TypeKind::Optional(_) => TypeTag::Optional,
        }
    }
}

/// A complete type description: a [`TypeKind`] plus its attribute list.
#[derive(Clone, Debug, PartialEq)]
pub struct Type {
    kind: TypeKind,
    attrs: Vec<Attribute>,
}

impl Type {
    /// Creates a `Type` with no attributes.
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            attrs: Vec::new(),
        }
    }

    /// Creates a `Type` with the given attributes.
    pub fn with_attrs(kind: TypeKind, attrs: Vec<Attribute>) -> Self {
        Self { kind, attrs }
    }

    /// Returns the kind of this type.
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Returns this type's attributes.
    pub fn attrs(&self) -> &[Attribute] {
        &self.attrs
    }

    /// Returns the stable numeric tag for this type's kind.
    pub fn tag(&self) -> TypeTag {
        self.kind.tag()
    }

    /// Convenience constructor: `Null`.
    pub fn null() -> Self {
        Self::new(TypeKind::Null)
    }

    /// Convenience constructor: `Bool`.
    pub fn bool() -> Self {
        Self::new(TypeKind::Bool)
    }

    /// Convenience constructor: a plain full-width integer.
    pub fn integer(width: Width, signed: bool, byte_order: ByteOrder) -> Self {
        Self::new(TypeKind::Integer(IntegerType::plain(
            width, signed, byte_order,
        )))
    }

    /// Convenience constructor: `Pointer`.
    pub fn pointer() -> Self {
        Self::new(TypeKind::Pointer)
    }

    /// Convenience constructor: `Float`.
    pub fn float(width: Width, byte_order: ByteOrder) -> Self {
        Self::new(TypeKind::Float(FloatType { width, byte_order }))
    }

    /// Convenience constructor: a UTF-8 string in host byte order.
    pub fn utf8_str() -> Self {
        Self::new(TypeKind::Str(StrType {
            encoding: StrEncoding::Utf8,
            byte_order: ByteOrder::host(),
        }))
    }

    /// Convenience constructor: `Struct`.
    pub fn struct_of(fields: Vec<Field>) -> Self {
        Self::new(TypeKind::Struct(fields))
    }

    /// Convenience constructor: `Array`.
    pub fn array(element: Type, length: usize) -> Self {
        Self::new(TypeKind::Array(ArrayType {
            element: Box::new(element),
            length,
        }))
    }

    /// Convenience constructor: `Dynamic`.
    pub fn dynamic() -> Self {
        Self::new(TypeKind::Dynamic)
    }

    /// Convenience constructor: `Optional`.
    pub fn optional(element: Type) -> Self {
        Self::new(TypeKind::Optional(Box::new(element)))
    }
}
