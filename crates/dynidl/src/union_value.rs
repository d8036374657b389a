// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Discriminated-union runtime: active-case tracking and discriminator
//! resolution.
//!
//! A constructed [`UnionValue`] always has exactly one active field: a named
//! case or the default. Reading any other case is a checked operation that
//! fails with [`UnionError::InactiveCase`].

use crate::descriptor::{TypeDescriptor, TypeKind, UnionDescriptor};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Errors for union value operations.
#[derive(Debug, Clone, PartialEq)]
pub enum UnionError {
    /// The named field exists but is not the active case.
    InactiveCase(String),
    /// No case or default field with that name.
    UnknownField(String),
    /// Discriminator matches no case and the union has no default.
    UnknownDiscriminator(i64),
    /// The descriptor handed to a constructor is not a union.
    NotAUnion(String),
}

impl fmt::Display for UnionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InactiveCase(name) => write!(f, "tried to get inactive case: {}", name),
            Self::UnknownField(name) => write!(f, "no union case named {}", name),
            Self::UnknownDiscriminator(d) => {
                write!(f, "discriminator {} matches no case and union has no default", d)
            }
            Self::NotAUnion(name) => write!(f, "{} is not a union type", name),
        }
    }
}

impl std::error::Error for UnionError {}

/// The single active field of a union value.
#[derive(Debug, Clone, PartialEq)]
pub enum ActiveField {
    /// A declared case: (field name, value).
    Case(String, Value),
    /// The default case's value.
    Default(Value),
}

/// A union instance: its descriptor, the active field, and the raw
/// discriminator. `discriminator` stays `None` when the default case was
/// selected by name; it resolves to the descriptor's synthesized default
/// discriminator on the wire and in comparisons.
#[derive(Debug, Clone)]
pub struct UnionValue {
    descriptor: Arc<TypeDescriptor>,
    active: ActiveField,
    discriminator: Option<i64>,
}

impl UnionValue {
    /// Construct by named case (or default field name).
    pub fn with_field(
        descriptor: Arc<TypeDescriptor>,
        name: &str,
        value: Value,
    ) -> Result<Self, UnionError> {
        let udesc = require_union(&descriptor)?;
        let (active, discriminator) = resolve_field(udesc, name, value)?;
        Ok(Self {
            descriptor,
            active,
            discriminator,
        })
    }

    /// Construct by explicit discriminator and value. An out-of-band
    /// discriminator falls through to the default case (when one exists)
    /// and is preserved verbatim for serialization.
    pub fn with_discriminator(
        descriptor: Arc<TypeDescriptor>,
        discriminator: i64,
        value: Value,
    ) -> Result<Self, UnionError> {
        let udesc = require_union(&descriptor)?;
        let active = resolve_discriminator(udesc, discriminator, value)?;
        Ok(Self {
            descriptor,
            active,
            discriminator: Some(discriminator),
        })
    }

    /// Replace the active field by name, dropping the previous value.
    pub fn set_field(&mut self, name: &str, value: Value) -> Result<(), UnionError> {
        let (active, discriminator) = resolve_field(self.udesc(), name, value)?;
        self.active = active;
        self.discriminator = discriminator;
        Ok(())
    }

    /// Replace the active field by explicit discriminator and value.
    pub fn set(&mut self, discriminator: i64, value: Value) -> Result<(), UnionError> {
        self.active = resolve_discriminator(self.udesc(), discriminator, value)?;
        self.discriminator = Some(discriminator);
        Ok(())
    }

    /// The (resolved discriminator, value) pair.
    pub fn get(&self) -> (i64, &Value) {
        (self.resolved_discriminator(), self.value())
    }

    /// Raw discriminator; `None` means "default selected, not yet resolved".
    pub fn discriminator(&self) -> Option<i64> {
        self.discriminator
    }

    /// Wire discriminator, resolving `None` to the synthesized default.
    pub fn resolved_discriminator(&self) -> i64 {
        match self.discriminator {
            Some(d) => d,
            // Some(default_discriminator) is a build-time invariant of any
            // union that has a default case.
            None => self.udesc().default_discriminator.unwrap_or(0),
        }
    }

    /// The active field's value.
    pub fn value(&self) -> &Value {
        match &self.active {
            ActiveField::Case(_, v) | ActiveField::Default(v) => v,
        }
    }

    /// Name of the active field.
    pub fn active_field_name(&self) -> &str {
        match &self.active {
            ActiveField::Case(name, _) => name,
            ActiveField::Default(_) => self
                .udesc()
                .default_case
                .as_ref()
                .map_or("", |(name, _)| name.as_str()),
        }
    }

    pub fn active(&self) -> &ActiveField {
        &self.active
    }

    /// Checked access to a case by name: the active case's value, or
    /// `InactiveCase` for a declared-but-inactive case.
    pub fn field(&self, name: &str) -> Result<&Value, UnionError> {
        let udesc = self.udesc();
        let known = udesc.case_by_name(name).is_some() || udesc.is_default_name(name);
        if !known {
            return Err(UnionError::UnknownField(name.to_string()));
        }
        if self.active_field_name() == name {
            Ok(self.value())
        } else {
            Err(UnionError::InactiveCase(name.to_string()))
        }
    }

    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    /// Descriptor of the active field's payload type.
    pub fn active_type(&self) -> Option<&Arc<TypeDescriptor>> {
        let udesc = self.udesc();
        match &self.active {
            ActiveField::Case(name, _) => udesc.case_by_name(name).map(|c| &c.ty),
            ActiveField::Default(_) => udesc.default_case.as_ref().map(|(_, ty)| ty),
        }
    }

    fn udesc(&self) -> &UnionDescriptor {
        match &self.descriptor.kind {
            TypeKind::Union(u) => u,
            // Constructors only accept union descriptors.
            _ => unreachable!("UnionValue holds a non-union descriptor"),
        }
    }
}

/// Equal iff same declared type, same resolved discriminator, same value.
impl PartialEq for UnionValue {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor.name == other.descriptor.name
            && self.resolved_discriminator() == other.resolved_discriminator()
            && self.value() == other.value()
    }
}

fn require_union(descriptor: &Arc<TypeDescriptor>) -> Result<&UnionDescriptor, UnionError> {
    descriptor
        .as_union()
        .ok_or_else(|| UnionError::NotAUnion(descriptor.name.clone()))
}

fn resolve_field(
    udesc: &UnionDescriptor,
    name: &str,
    value: Value,
) -> Result<(ActiveField, Option<i64>), UnionError> {
    if let Some(case) = udesc.case_by_name(name) {
        let label = case.labels.first().copied().unwrap_or(0);
        return Ok((ActiveField::Case(name.to_string(), value), Some(label)));
    }
    if udesc.is_default_name(name) {
        return Ok((ActiveField::Default(value), None));
    }
    Err(UnionError::UnknownField(name.to_string()))
}

fn resolve_discriminator(
    udesc: &UnionDescriptor,
    discriminator: i64,
    value: Value,
) -> Result<ActiveField, UnionError> {
    if let Some(case) = udesc.case_by_label(discriminator) {
        return Ok(ActiveField::Case(case.name.clone(), value));
    }
    if udesc.default_case.is_some() {
        return Ok(ActiveField::Default(value));
    }
    Err(UnionError::UnknownDiscriminator(discriminator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::UnionBuilder;
    use crate::descriptor::PrimitiveKind;

    fn sample_union() -> Arc<TypeDescriptor> {
        Arc::new(
            UnionBuilder::new("Sample", TypeDescriptor::primitive(PrimitiveKind::U8))
                .primitive_case("as_int", 0, PrimitiveKind::I32)
                .primitive_case("as_float", 1, PrimitiveKind::F64)
                .default_case("other", Arc::new(TypeDescriptor::string()))
                .build()
                .expect("valid union"),
        )
    }

    #[test]
    fn test_single_active_field() {
        let desc = sample_union();
        let mut u = UnionValue::with_field(desc, "as_int", 42i32.into()).unwrap();
        assert_eq!(u.field("as_int").unwrap().as_i32(), Some(42));

        u.set_field("as_float", 2.5f64.into()).unwrap();
        assert_eq!(
            u.field("as_int"),
            Err(UnionError::InactiveCase("as_int".into()))
        );
        let (disc, value) = u.get();
        assert_eq!(disc, 1);
        assert_eq!(value.as_f64(), Some(2.5));
    }

    #[test]
    fn test_default_selected_by_name_resolves_synthesized() {
        let desc = sample_union();
        let u = UnionValue::with_field(desc, "other", "x".into()).unwrap();
        assert_eq!(u.discriminator(), None);
        // cases {0, 1}, unsigned scan from 0 -> first free is 2
        assert_eq!(u.resolved_discriminator(), 2);
    }

    #[test]
    fn test_out_of_band_discriminator_preserved() {
        let desc = sample_union();
        let u = UnionValue::with_discriminator(desc, 200, "y".into()).unwrap();
        assert!(matches!(u.active(), ActiveField::Default(_)));
        assert_eq!(u.resolved_discriminator(), 200);
    }

    #[test]
    fn test_unknown_discriminator_without_default_fails() {
        let desc = Arc::new(
            UnionBuilder::new("NoDefault", TypeDescriptor::primitive(PrimitiveKind::U8))
                .primitive_case("only", 0, PrimitiveKind::I32)
                .build()
                .unwrap(),
        );
        assert_eq!(
            UnionValue::with_discriminator(desc, 9, 1i32.into()).unwrap_err(),
            UnionError::UnknownDiscriminator(9)
        );
    }

    #[test]
    fn test_equality_resolves_default_discriminator() {
        let desc = sample_union();
        let by_name = UnionValue::with_field(desc.clone(), "other", "z".into()).unwrap();
        let explicit = UnionValue::with_discriminator(desc, 2, "z".into()).unwrap();
        assert_eq!(by_name, explicit);
    }

    #[test]
    fn test_unknown_field() {
        let desc = sample_union();
        let u = UnionValue::with_field(desc, "as_int", 1i32.into()).unwrap();
        assert_eq!(
            u.field("nope"),
            Err(UnionError::UnknownField("nope".into()))
        );
    }
}
