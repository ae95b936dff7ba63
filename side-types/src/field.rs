// Licensed under the MIT license.

use crate::ty::Type;

/// A named, typed slot inside a `Struct` type or an event's field list.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    name: Box<str>,
    ty: Type,
}

impl Field {
    /// Creates a new field.
    pub fn new(name: impl Into<Box<str>>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    /// Returns the field's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field's type.
    pub fn ty(&self) -> &Type {
        &self.ty
    }
}
