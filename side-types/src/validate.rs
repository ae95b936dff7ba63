// Licensed under the MIT license.

//! Structural checks over a [`Type`]/[`EventDescription`] tree that cannot be
//! encoded in the type system itself.

use thiserror::Error;

use crate::event::EventDescription;
use crate::ty::{BitmapElement, GatherKind, GatherType, StrEncoding, Type, TypeKind, VariantType};

/// A structural defect found while validating a [`Type`] or
/// [`EventDescription`] tree.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum TypeError {
    /// A `GatherVla` kind was nested inside a `GatherArray`/`GatherVla`;
    /// rejected because its element stride is not statically known.
    #[error("gather vla cannot nest inside gather array/vla")]
    NestedGatherVla,
    /// An `EnumBitmap`'s declared bit range exceeds the width of its
    /// underlying storage.
    #[error("enum bitmap mapping bit range {0}..={1} exceeds element width")]
    BitmapRangeOutOfBounds(u32, u32),
    /// A `Variant`'s selector was not an `Integer` type.
    #[error("variant selector must be an integer type")]
    VariantSelectorNotInteger,
    /// A string type's code unit size was not 1, 2, or 4 bytes.
    ///
    /// Unreachable today since [`StrEncoding`] only has three variants,
    /// each already sized 1/2/4; kept as a defensive check against future
    /// encodings that might violate the invariant.
    #[error("string unit size must be 1, 2, or 4 bytes, got {0}")]
    InvalidStrUnitSize(usize),
    /// An `Integer`'s bit window (`offset_bits + effective_bits`) exceeds
    /// its declared storage width.
    #[error("integer bit window {offset}+{effective} exceeds width {width}")]
    BitWindowOutOfBounds {
        /// `offset_bits`.
        offset: u16,
        /// `effective_bits`.
        effective: u16,
        /// Declared storage width.
        width: u16,
    },
}

fn validate_gather(gt: &GatherType, inside_vla_or_array: bool) -> Result<(), TypeError> {
    match &gt.kind {
        GatherKind::Vla { element, .. } => {
            if inside_vla_or_array {
                return Err(TypeError::NestedGatherVla);
            }
            validate_gather(element, true)
        }
        GatherKind::Array(element) => validate_gather(element, true),
        GatherKind::Integer(it) => validate_integer(it),
        GatherKind::Struct(fields) => {
            for field in fields {
                validate_type(field.ty())?;
            }
            Ok(())
        }
        GatherKind::Byte | GatherKind::Bool | GatherKind::Pointer | GatherKind::Float(_) => Ok(()),
        GatherKind::Str(st) => validate_str_encoding(st.encoding),
    }
}

fn validate_integer(it: &crate::ty::IntegerType) -> Result<(), TypeError> {
    if it.offset_bits + it.effective_bits > it.width {
        return Err(TypeError::BitWindowOutOfBounds {
            offset: it.offset_bits,
            effective: it.effective_bits,
            width: it.width,
        });
    }
    Ok(())
}

fn validate_str_encoding(encoding: StrEncoding) -> Result<(), TypeError> {
    let unit_size = encoding.unit_size();
    if unit_size != 1 && unit_size != 2 && unit_size != 4 {
        return Err(TypeError::InvalidStrUnitSize(unit_size));
    }
    Ok(())
}

fn validate_variant(vt: &VariantType) -> Result<(), TypeError> {
    // `selector` is already typed as `IntegerType` in the struct, so
    // `VariantSelectorNotInteger` can never actually be constructed today;
    // kept as a named validation step so a future representation change
    // (e.g. widening `selector` to `Type`) re-trips it here.
    validate_integer(&vt.selector)?;
    for (_, _, option_ty) in &vt.options {
        validate_type(option_ty)?;
    }
    Ok(())
}

fn bitmap_element_width(element: &BitmapElement) -> u32 {
    match element {
        BitmapElement::Integer(it) => it.width as u32,
        BitmapElement::Array(at) => {
            let stride = match at.element.kind() {
                TypeKind::Integer(it) => it.width as u32,
                _ => 0,
            };
            stride * at.length as u32
        }
        BitmapElement::Vla(_) => u32::MAX,
    }
}

fn validate_type(ty: &Type) -> Result<(), TypeError> {
    match ty.kind() {
        TypeKind::Null
        | TypeKind::Bool
        | TypeKind::Byte
        | TypeKind::Pointer
        | TypeKind::Dynamic => Ok(()),
        TypeKind::Integer(it) => validate_integer(it),
        TypeKind::Float(_) => Ok(()),
        TypeKind::Str(st) => validate_str_encoding(st.encoding),
        TypeKind::Struct(fields) => {
            for field in fields {
                validate_type(field.ty())?;
            }
            Ok(())
        }
        TypeKind::Variant(vt) => validate_variant(vt),
        TypeKind::Array(at) => validate_type(&at.element),
        TypeKind::Vla(vt) => validate_type(&vt.element),
        TypeKind::VlaVisitor(vt) => validate_type(&vt.element),
        TypeKind::Enum(et) => validate_integer(&et.element),
        TypeKind::EnumBitmap(et) => {
            let width = bitmap_element_width(&et.element);
            for ((first, last), _) in &et.mappings {
                if *last >= width {
                    return Err(TypeError::BitmapRangeOutOfBounds(*first, *last));
                }
            }
            Ok(())
        }
        TypeKind::Gather(gt) => validate_gather(gt, false),
        TypeKind::Optional(inner) => validate_type(inner),
    }
}

/// Validates an [`EventDescription`]'s declared fields: no nested
/// `GatherVla`, bitmap ranges within element width, variant selectors that
/// are integers, string unit sizes of 1/2/4 bytes, and integer bit windows
/// that fit their declared storage.
pub fn validate(desc: &EventDescription) -> Result<(), TypeError> {
    for field in desc.fields() {
        validate_type(field.ty())?;
    }
    Ok(())
}
