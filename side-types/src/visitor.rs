// Licensed under the MIT license.

//! A walk over a [`Type`]/[`EventDescription`] tree, one callback per leaf
//! kind, with no-op defaults for composite/uninteresting kinds.

use crate::event::EventDescription;
use crate::ty::{
    ArrayType, EnumBitmapType, EnumType, FloatType, GatherType, IntegerType, StrType, Type,
    TypeKind, VariantType, VlaType, VlaVisitorType,
};
use crate::value::{Arg, ArgKind, StaticValue};

/// Callbacks invoked while walking a type tree. Every method has a default
/// no-op implementation so implementers only override the kinds they care
/// about.
pub trait TypeVisitor {
    /// Visits a `Null` type.
    fn visit_null(&mut self) {}
    /// Visits a `Bool` type.
    fn visit_bool(&mut self) {}
    /// Visits a `Byte` type.
    fn visit_byte(&mut self) {}
    /// Visits an `Integer` type.
    fn visit_integer(&mut self, _ty: &IntegerType) {}
    /// Visits a `Pointer` type.
    fn visit_pointer(&mut self) {}
    /// Visits a `Float` type.
    fn visit_float(&mut self, _ty: &FloatType) {}
    /// Visits a `Str` type.
    fn visit_str(&mut self, _ty: &StrType) {}
    /// Visits a `Dynamic` placeholder type.
    fn visit_dynamic(&mut self) {}

    /// Called before descending into a `Struct`'s fields.
    fn enter_struct(&mut self) {}
    /// Called after a `Struct`'s fields have all been visited.
    fn leave_struct(&mut self) {}

    /// Called before descending into a `Variant`'s selected option.
    fn enter_variant(&mut self, _ty: &VariantType) {}
    /// Called after the option has been visited.
    fn leave_variant(&mut self) {}

    /// Called before descending into an `Array`'s element type.
    fn enter_array(&mut self, _ty: &ArrayType) {}
    /// Called after the element type has been visited.
    fn leave_array(&mut self) {}

    /// Called before descending into a `Vla`'s element type.
    fn enter_vla(&mut self, _ty: &VlaType) {}
    /// Called after the element type has been visited.
    fn leave_vla(&mut self) {}

    /// Visits a `VlaVisitor` type; the visitor-produced elements are not
    /// walked here since their count is only known at dispatch time.
    fn visit_vla_visitor(&mut self, _ty: &VlaVisitorType) {}

    /// Visits an `Enum` type.
    fn visit_enum(&mut self, _ty: &EnumType) {}

    /// Visits an `EnumBitmap` type.
    fn visit_enum_bitmap(&mut self, _ty: &EnumBitmapType) {}

    /// Visits a `Gather` type.
    fn visit_gather(&mut self, _ty: &GatherType) {}

    /// Called before descending into an `Optional`'s inner type.
    fn enter_optional(&mut self) {}
    /// Called after the inner type has been visited.
    fn leave_optional(&mut self) {}
}

/// Walks a single [`Type`], invoking the matching `visit_*`/`enter_*`/
/// `leave_*` callbacks on `visitor`.
pub fn walk_type<V: TypeVisitor + ?Sized>(visitor: &mut V, ty: &Type) {
    match ty.kind() {
        TypeKind::Null => visitor.visit_null(),
        TypeKind::Bool => visitor.visit_bool(),
        TypeKind::Byte => visitor.visit_byte(),
        TypeKind::Integer(it) => visitor.visit_integer(it),
        TypeKind::Pointer => visitor.visit_pointer(),
        TypeKind::Float(ft) => visitor.visit_float(ft),
        TypeKind::Str(st) => visitor.visit_str(st),
        TypeKind::Dynamic => visitor.visit_dynamic(),
        TypeKind::Struct(fields) => {
            visitor.enter_struct();
            for field in fields {
                walk_type(visitor, field.ty());
            }
            visitor.leave_struct();
        }
        TypeKind::Variant(vt) => {
            visitor.enter_variant(vt);
            for (_, _, option_ty) in &vt.options {
                walk_type(visitor, option_ty);
            }
            visitor.leave_variant();
        }
        TypeKind::Array(at) => {
            visitor.enter_array(at);
            walk_type(visitor, &at.element);
            visitor.leave_array();
        }
        TypeKind::Vla(vt) => {
            visitor.enter_vla(vt);
            walk_type(visitor, &vt.element);
            visitor.leave_vla();
        }
        TypeKind::VlaVisitor(vt) => visitor.visit_vla_visitor(vt),
        TypeKind::Enum(et) => visitor.visit_enum(et),
        TypeKind::EnumBitmap(et) => visitor.visit_enum_bitmap(et),
        TypeKind::Gather(gt) => visitor.visit_gather(gt),
        TypeKind::Optional(inner) => {
            visitor.enter_optional();
            walk_type(visitor, inner);
            visitor.leave_optional();
        }
    }
}

/// Walks every field of an [`EventDescription`]'s static type shape. Does
/// not inspect any particular call's arguments — use [`walk_arguments`] for
/// that.
pub fn walk_description<V: TypeVisitor + ?Sized>(visitor: &mut V, event: &EventDescription) {
    visitor.enter_struct();
    for field in event.fields() {
        walk_type(visitor, field.ty());
    }
    visitor.leave_struct();
}

/// Callback invoked by [`walk_arguments`] for each positional argument,
/// alongside the static value it carries (when not a `Gather`/`Dynamic`
/// indirection the walk cannot resolve without dereferencing memory).
pub trait ArgVisitor {
    /// Visits one argument's static payload, if it has one inline.
    fn visit_value(&mut self, _value: &StaticValue) {}
    /// Visits a gathered argument; `base` is the pointer it carries,
    /// un-dereferenced.
    fn visit_gather(&mut self, _base: *const u8) {}
    /// Visits a dynamic argument's declared type and value.
    fn visit_dynamic(&mut self, _ty: &Type, _value: &StaticValue) {}
}

/// Walks an argument vector in order, invoking the matching `ArgVisitor`
/// method for each one. Does not correlate arguments against the paired
/// `EventDescription`'s field types; callers that need that pairing should
/// zip `description.fields()` with `args` themselves.
pub fn walk_arguments<V: ArgVisitor + ?Sized>(visitor: &mut V, args: &[Arg]) {
    for arg in args {
        match arg.kind() {
            ArgKind::Static(value) => visitor.visit_value(value),
            ArgKind::Gather(base) => visitor.visit_gather(*base),
            ArgKind::Dynamic(dyn_value) => {
                visitor.visit_dynamic(dyn_value.ty(), dyn_value.value())
            }
        }
    }
}
