// Licensed under the MIT license.

//! The static, immutable half of an event: its name, provider, fields, and
//! declared attributes.

use std::vec::Vec;

use crate::attribute::Attribute;
use crate::field::Field;
use crate::kinds::{EventFlags, LogLevel};

/// The ABI version this crate's wire-level layout assumptions were written
/// against. Bumped only when the on-the-wire shape of `EventDescription`
/// changes in a way readers must be aware of.
pub const ABI_VERSION: u32 = 1;

/// The static description of an event: everything known at registration
/// time, independent of whether or how it is ever dispatched.
///
/// `struct_size` records `core::mem::size_of::<EventDescription>()` as
/// measured by the producing crate version, so a tracer loading an
/// `EventDescription` compiled against a newer minor version can detect
/// and skip fields it doesn't understand rather than misinterpret them.
#[derive(Clone, Debug, PartialEq)]
pub struct EventDescription {
    struct_size: u32,
    abi_version: u32,
    provider: Box<str>,
    name: Box<str>,
    fields: Vec<Field>,
    attrs: Vec<Attribute>,
    level: LogLevel,
    flags: EventFlags,
    extra_type_codes: Vec<u8>,
    extra_attr_codes: Vec<u8>,
}

impl EventDescription {
    /// Returns the provider name this event belongs to.
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Returns the event's name, unique within its provider.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the event's statically declared fields.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Returns the event's declared attributes.
    pub fn attrs(&self) -> &[Attribute] {
        &self.attrs
    }

    /// Returns the event's severity level.
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Returns the event's flags.
    pub fn flags(&self) -> EventFlags {
        self.flags
    }

    /// True if the event accepts extra dynamically-typed fields at call
    /// time.
    pub fn is_variadic(&self) -> bool {
        self.flags.contains(EventFlags::VARIADIC)
    }

    /// Returns the ABI version this description's layout was produced
    /// against.
    pub fn abi_version(&self) -> u32 {
        self.abi_version
    }

    /// Returns `size_of::<EventDescription>()` as recorded by the producing
    /// crate version, for forward-compatible field skipping.
    pub fn struct_size(&self) -> u32 {
        self.struct_size
    }

    /// Vendor/tracer-specific type codes reserved for future extension
    /// without an ABI bump.
    pub fn extra_type_codes(&self) -> &[u8] {
        &self.extra_type_codes
    }

    /// Vendor/tracer-specific attribute codes reserved the same way.
    pub fn extra_attr_codes(&self) -> &[u8] {
        &self.extra_attr_codes
    }
}

/// Builds an [`EventDescription`], stamping in the current crate's ABI
/// version and struct size.
pub fn describe_event(
    provider: impl Into<Box<str>>,
    name: impl Into<Box<str>>,
    fields: Vec<Field>,
    attrs: Vec<Attribute>,
    level: LogLevel,
    flags: EventFlags,
) -> EventDescription {
    EventDescription {
        struct_size: core::mem::size_of::<EventDescription>() as u32,
        abi_version: ABI_VERSION,
        provider: provider.into(),
        name: name.into(),
        fields,
        attrs,
        level,
        flags,
        extra_type_codes: Vec::new(),
        extra_attr_codes: Vec::new(),
    }
}
