// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builders for [`TypeDescriptor`].
//!
//! All construction-time validation happens in `build()`: duplicate
//! labels/fields, multiple defaults, zero bounds, and default-discriminator
//! synthesis. Encode/decode never re-raise these.

use crate::descriptor::{
    synthesize_default_discriminator, ArrayDescriptor, AutoIdPolicy, BitFlag, BitmaskDescriptor,
    ConstructionError, EnumDescriptor, EnumVariant, Extensibility, FieldDescriptor, PrimitiveKind,
    SequenceDescriptor, StructDescriptor, TypeDescriptor, TypeKind, UnionCase, UnionDescriptor,
};
use std::sync::Arc;

/// Builder for struct types.
#[derive(Debug)]
pub struct StructBuilder {
    name: String,
    parent: Option<Arc<TypeDescriptor>>,
    fields: Vec<FieldDescriptor>,
    extensibility: Extensibility,
    autoid: AutoIdPolicy,
}

impl StructBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            fields: Vec::new(),
            extensibility: Extensibility::Final,
            autoid: AutoIdPolicy::Sequential,
        }
    }

    /// Inherit from a parent struct; its fields serialize first.
    pub fn parent(mut self, parent: Arc<TypeDescriptor>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn extensibility(mut self, extensibility: Extensibility) -> Self {
        self.extensibility = extensibility;
        self
    }

    pub fn autoid(mut self, autoid: AutoIdPolicy) -> Self {
        self.autoid = autoid;
        self
    }

    /// Add a primitive field.
    pub fn field(mut self, name: impl Into<String>, kind: PrimitiveKind) -> Self {
        let ty = Arc::new(TypeDescriptor::primitive(kind));
        self.fields.push(FieldDescriptor::new(name, ty));
        self
    }

    /// Add a key-annotated primitive field.
    pub fn key_field(mut self, name: impl Into<String>, kind: PrimitiveKind) -> Self {
        let ty = Arc::new(TypeDescriptor::primitive(kind));
        self.fields.push(FieldDescriptor::new(name, ty).key());
        self
    }

    /// Add a field with an arbitrary type descriptor.
    pub fn typed_field(mut self, name: impl Into<String>, ty: Arc<TypeDescriptor>) -> Self {
        self.fields.push(FieldDescriptor::new(name, ty));
        self
    }

    /// Add a key-annotated field with an arbitrary type descriptor.
    pub fn typed_key_field(mut self, name: impl Into<String>, ty: Arc<TypeDescriptor>) -> Self {
        self.fields.push(FieldDescriptor::new(name, ty).key());
        self
    }

    /// Add a pre-built field descriptor (for annotated members).
    pub fn member(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Add an unbounded string field.
    pub fn string_field(mut self, name: impl Into<String>) -> Self {
        self.fields
            .push(FieldDescriptor::new(name, Arc::new(TypeDescriptor::string())));
        self
    }

    /// Add a bounded string field.
    pub fn bounded_string_field(mut self, name: impl Into<String>, max_length: u32) -> Self {
        self.fields.push(FieldDescriptor::new(
            name,
            Arc::new(TypeDescriptor::bounded_string(max_length)),
        ));
        self
    }

    /// Add an unbounded sequence field of primitives.
    pub fn sequence_field(mut self, name: impl Into<String>, element: PrimitiveKind) -> Self {
        let element = Arc::new(TypeDescriptor::primitive(element));
        let ty = Arc::new(TypeDescriptor::new(
            "sequence",
            TypeKind::Sequence(SequenceDescriptor::unbounded(element)),
        ));
        self.fields.push(FieldDescriptor::new(name, ty));
        self
    }

    /// Add a bounded sequence field of primitives.
    pub fn bounded_sequence_field(
        mut self,
        name: impl Into<String>,
        element: PrimitiveKind,
        max_length: u32,
    ) -> Self {
        let element = Arc::new(TypeDescriptor::primitive(element));
        let ty = Arc::new(TypeDescriptor::new(
            "sequence",
            TypeKind::Sequence(SequenceDescriptor::bounded(element, max_length)),
        ));
        self.fields.push(FieldDescriptor::new(name, ty));
        self
    }

    /// Add a fixed-length array field of primitives.
    pub fn array_field(
        mut self,
        name: impl Into<String>,
        element: PrimitiveKind,
        length: u32,
    ) -> Self {
        let element = Arc::new(TypeDescriptor::primitive(element));
        let ty = Arc::new(TypeDescriptor::new(
            "array",
            TypeKind::Array(ArrayDescriptor::new(element, length)),
        ));
        self.fields.push(FieldDescriptor::new(name, ty));
        self
    }

    pub fn build(self) -> Result<TypeDescriptor, ConstructionError> {
        let desc = TypeDescriptor::new(
            self.name,
            TypeKind::Struct(StructDescriptor {
                parent: self.parent,
                fields: self.fields,
                extensibility: self.extensibility,
                autoid: self.autoid,
            }),
        );
        desc.validate()?;
        Ok(desc)
    }
}

/// Builder for union types.
#[derive(Debug)]
pub struct UnionBuilder {
    name: String,
    discriminator: Arc<TypeDescriptor>,
    cases: Vec<UnionCase>,
    defaults: Vec<(String, Arc<TypeDescriptor>)>,
}

impl UnionBuilder {
    pub fn new(name: impl Into<String>, discriminator: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            discriminator: Arc::new(discriminator),
            cases: Vec::new(),
            defaults: Vec::new(),
        }
    }

    /// Add a case with a single label.
    pub fn case(
        mut self,
        name: impl Into<String>,
        label: i64,
        ty: Arc<TypeDescriptor>,
    ) -> Self {
        self.cases.push(UnionCase::single(name, label, ty));
        self
    }

    /// Add a case covering multiple labels.
    pub fn case_labels(
        mut self,
        name: impl Into<String>,
        labels: Vec<i64>,
        ty: Arc<TypeDescriptor>,
    ) -> Self {
        self.cases.push(UnionCase::new(name, labels, ty));
        self
    }

    /// Add a primitive-typed case.
    pub fn primitive_case(self, name: impl Into<String>, label: i64, kind: PrimitiveKind) -> Self {
        self.case(name, label, Arc::new(TypeDescriptor::primitive(kind)))
    }

    /// Declare the default case. At most one; a second is a build error.
    pub fn default_case(mut self, name: impl Into<String>, ty: Arc<TypeDescriptor>) -> Self {
        self.defaults.push((name.into(), ty));
        self
    }

    pub fn build(self) -> Result<TypeDescriptor, ConstructionError> {
        if self.defaults.len() > 1 {
            return Err(ConstructionError::MultipleDefaultCases);
        }
        let default_case = self.defaults.into_iter().next();
        let default_discriminator = match &default_case {
            Some(_) => Some(synthesize_default_discriminator(
                &self.discriminator,
                &self.cases,
            )?),
            None => None,
        };
        let desc = TypeDescriptor::new(
            self.name,
            TypeKind::Union(UnionDescriptor {
                discriminator: self.discriminator,
                cases: self.cases,
                default_case,
                default_discriminator,
            }),
        );
        desc.validate()?;
        Ok(desc)
    }
}

/// Builder for enum types.
#[derive(Debug)]
pub struct EnumBuilder {
    name: String,
    variants: Vec<EnumVariant>,
    next_value: i32,
}

impl EnumBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variants: Vec::new(),
            next_value: 0,
        }
    }

    /// Add a variant with auto-incrementing value.
    pub fn variant(mut self, name: impl Into<String>) -> Self {
        self.variants.push(EnumVariant::new(name, self.next_value));
        self.next_value += 1;
        self
    }

    /// Add a variant with explicit value.
    pub fn variant_value(mut self, name: impl Into<String>, value: i32) -> Self {
        self.variants.push(EnumVariant::new(name, value));
        self.next_value = value + 1;
        self
    }

    pub fn build(self) -> Result<TypeDescriptor, ConstructionError> {
        let desc = TypeDescriptor::new(self.name, TypeKind::Enum(EnumDescriptor::new(self.variants)));
        desc.validate()?;
        Ok(desc)
    }
}

/// Builder for bitmask types.
#[derive(Debug)]
pub struct BitmaskBuilder {
    name: String,
    bits: Vec<BitFlag>,
    invalid_position: Option<u32>,
}

impl BitmaskBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bits: Vec::new(),
            invalid_position: None,
        }
    }

    /// Add a flag with an explicit mask value.
    pub fn flag(mut self, name: impl Into<String>, mask: u64) -> Self {
        self.bits.push(BitFlag {
            mask,
            name: name.into(),
        });
        self
    }

    /// Add a flag at a bit position (mask `1 << position`). Positions past
    /// 63 are reported by `build()`.
    pub fn bit(mut self, name: impl Into<String>, position: u32) -> Self {
        match 1u64.checked_shl(position) {
            Some(mask) => self.flag(name, mask),
            None => {
                self.invalid_position = Some(position);
                self
            }
        }
    }

    pub fn build(self) -> Result<TypeDescriptor, ConstructionError> {
        if let Some(position) = self.invalid_position {
            return Err(ConstructionError::InvalidBound(format!(
                "bitmask {} bit position {} exceeds 63",
                self.name, position
            )));
        }
        let desc = TypeDescriptor::new(self.name, TypeKind::Bitmask(BitmaskDescriptor::new(self.bits)));
        desc.validate()?;
        Ok(desc)
    }
}
