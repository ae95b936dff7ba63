// Licensed under the MIT license.

#![warn(missing_docs)]

//! # SIDE type and value model
//!
//! `side-types` describes the tagged-union type system shared by every
//! event in a SIDE (Static Instrumentation Dynamically Enabled) provider:
//! a [`ty::Type`] describes the *shape* a field can take, a
//! [`value::Arg`] carries the *value* supplied for it at call time, and an
//! [`event::EventDescription`] groups a set of named, typed fields under a
//! provider and event name.
//!
//! The type algebra covers scalars (`Bool`, `Byte`, `Integer`, `Pointer`,
//! `Float`), strings, compounds (`Struct`, `Variant`, `Array`, `Vla`,
//! `VlaVisitor`), integer and bitmap enumerations, pointer-and-offset
//! described memory (`Gather`), self-describing values (`Dynamic`), and
//! `Optional` wrapping. See [`ty`] for the full list and [`value`] for the
//! matching value-side representation.
//!
//! This crate is deliberately inert: it has no registry, no dispatch, and
//! no notion of "enabled" — those live in the runtime crate built on top of
//! it. `side-types` only describes events; it never fires them.

pub mod attribute;
pub mod event;
pub mod field;
pub mod kinds;
pub mod numeric;
pub mod ty;
pub mod validate;
pub mod value;
pub mod visitor;

pub use attribute::{AttrValue, Attribute};
pub use event::{describe_event, EventDescription, ABI_VERSION};
pub use field::Field;
pub use kinds::{AccessMode, ByteOrder, EventFlags, LogLevel, TypeTag};
pub use ty::{
    ArrayType, BitmapElement, EnumBitmapType, EnumType, FloatType, GatherKind, GatherType,
    IntegerType, StrEncoding, StrType, Type, TypeKind, VariantType, VlaType, VlaVisitorType, Width,
};
pub use validate::{validate, TypeError};
pub use value::{Arg, ArgKind, DynamicValue, StaticValue};
pub use visitor::{walk_arguments, walk_description, walk_type, ArgVisitor, TypeVisitor};
