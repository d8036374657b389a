// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors for runtime type information.
//!
//! Descriptors are constructed once (through [`crate::builder`] or by hand),
//! validated at registration time, and shared read-only via `Arc` afterwards.

use std::fmt;
use std::sync::Arc;

/// Primitive type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    Char8,
    Char16,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl PrimitiveKind {
    /// Get the size in bytes.
    pub fn size(&self) -> usize {
        match self {
            Self::Bool | Self::Char8 | Self::U8 | Self::I8 => 1,
            Self::Char16 | Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }

    /// Get CDR alignment requirement (equal to the natural width).
    pub fn alignment(&self) -> usize {
        self.size()
    }

    /// Integer kinds are valid union discriminators.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::I8
                | Self::I16
                | Self::I32
                | Self::I64
                | Self::U8
                | Self::U16
                | Self::U32
                | Self::U64
        )
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    /// Representable range for integer kinds, as (min, max).
    pub fn integer_range(&self) -> Option<(i64, i64)> {
        match self {
            Self::I8 => Some((i64::from(i8::MIN), i64::from(i8::MAX))),
            Self::I16 => Some((i64::from(i16::MIN), i64::from(i16::MAX))),
            Self::I32 => Some((i64::from(i32::MIN), i64::from(i32::MAX))),
            Self::I64 => Some((i64::MIN, i64::MAX)),
            Self::U8 => Some((0, i64::from(u8::MAX))),
            Self::U16 => Some((0, i64::from(u16::MAX))),
            Self::U32 => Some((0, i64::from(u32::MAX))),
            // u64 labels above i64::MAX are not representable in the label
            // model; IDL discriminators in practice never reach them.
            Self::U64 => Some((0, i64::MAX)),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Struct/union extensibility kind. Only `Final` affects the wire here;
/// the others are carried as metadata (mutable/appendable encodings are
/// out of scope).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Extensibility {
    #[default]
    Final,
    Appendable,
    Mutable,
}

/// Member-id assignment policy (metadata only under final extensibility).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoIdPolicy {
    #[default]
    Sequential,
    Hash,
}

/// Type kind enumeration.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    /// Primitive type.
    Primitive(PrimitiveKind),
    /// UTF-8 string with 32-bit length prefix counting the trailing NUL.
    String { max_length: Option<u32> },
    /// Array (fixed length, no count on the wire).
    Array(ArrayDescriptor),
    /// Sequence (32-bit count prefix).
    Sequence(SequenceDescriptor),
    /// Struct with named fields and optional parent.
    Struct(StructDescriptor),
    /// Union with discriminator.
    Union(UnionDescriptor),
    /// Enumeration (32-bit on the wire).
    Enum(EnumDescriptor),
    /// Bitmask (smallest covering unsigned width on the wire).
    Bitmask(BitmaskDescriptor),
}

/// A complete type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    /// Type name.
    pub name: String,
    /// Type kind.
    pub kind: TypeKind,
}

impl TypeDescriptor {
    /// Create a new type descriptor.
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Create a primitive type descriptor.
    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self::new(kind.to_string(), TypeKind::Primitive(kind))
    }

    /// Create an unbounded string descriptor.
    pub fn string() -> Self {
        Self::new("string", TypeKind::String { max_length: None })
    }

    /// Create a bounded string descriptor.
    pub fn bounded_string(max_length: u32) -> Self {
        Self::new(
            "string",
            TypeKind::String {
                max_length: Some(max_length),
            },
        )
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.kind, TypeKind::Struct(_))
    }

    pub fn is_union(&self) -> bool {
        matches!(self.kind, TypeKind::Union(_))
    }

    /// Get the struct descriptor if this is a struct.
    pub fn as_struct(&self) -> Option<&StructDescriptor> {
        match &self.kind {
            TypeKind::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Get the union descriptor if this is a union.
    pub fn as_union(&self) -> Option<&UnionDescriptor> {
        match &self.kind {
            TypeKind::Union(u) => Some(u),
            _ => None,
        }
    }

    /// Get alignment requirement of the first encoded byte.
    pub fn alignment(&self) -> usize {
        match &self.kind {
            TypeKind::Primitive(p) => p.alignment(),
            TypeKind::String { .. } => 4,
            TypeKind::Array(arr) => arr.element.alignment(),
            TypeKind::Sequence(_) => 4,
            TypeKind::Struct(s) => s
                .all_fields()
                .iter()
                .map(|f| f.ty.alignment())
                .max()
                .unwrap_or(1),
            TypeKind::Union(u) => u.discriminator.alignment().max(
                u.cases
                    .iter()
                    .map(|c| c.ty.alignment())
                    .max()
                    .unwrap_or(1),
            ),
            TypeKind::Enum(_) => 4,
            TypeKind::Bitmask(b) => b.wire_width().alignment(),
        }
    }

    /// Lower bound on the encoded size, used to reject absurd sequence
    /// counts before allocating.
    pub fn min_size(&self) -> usize {
        match &self.kind {
            TypeKind::Primitive(p) => p.size(),
            // 4-byte length + mandatory NUL.
            TypeKind::String { .. } => 5,
            TypeKind::Array(arr) => arr.element.min_size() * arr.length as usize,
            TypeKind::Sequence(_) => 4,
            TypeKind::Struct(s) => {
                let mut size = 0usize;
                for field in s.all_fields() {
                    let align = field.ty.alignment();
                    size = (size + align - 1) & !(align - 1);
                    size += field.ty.min_size();
                }
                size
            }
            TypeKind::Union(u) => {
                let arm = u
                    .cases
                    .iter()
                    .map(|c| c.ty.min_size())
                    .chain(u.default_case.as_ref().map(|(_, ty)| ty.min_size()))
                    .min()
                    .unwrap_or(0);
                u.discriminator.min_size() + arm
            }
            TypeKind::Enum(_) => 4,
            TypeKind::Bitmask(b) => b.wire_width().size(),
        }
    }

    /// Re-check every construction-time invariant, recursively.
    ///
    /// Builders enforce these on `build()`; hand-assembled descriptors are
    /// caught here when registered with [`crate::TopicType::new`].
    pub fn validate(&self) -> Result<(), ConstructionError> {
        match &self.kind {
            TypeKind::Primitive(_) => Ok(()),
            TypeKind::String { max_length } => match max_length {
                Some(0) => Err(ConstructionError::InvalidBound(format!(
                    "bounded string {} with zero bound",
                    self.name
                ))),
                _ => Ok(()),
            },
            TypeKind::Array(arr) => {
                if arr.length == 0 {
                    return Err(ConstructionError::InvalidBound(format!(
                        "array {} with zero length",
                        self.name
                    )));
                }
                arr.element.validate()
            }
            TypeKind::Sequence(seq) => {
                if seq.max_length == Some(0) {
                    return Err(ConstructionError::InvalidBound(format!(
                        "bounded sequence {} with zero bound",
                        self.name
                    )));
                }
                seq.element.validate()
            }
            TypeKind::Struct(s) => s.validate(),
            TypeKind::Union(u) => u.validate(),
            TypeKind::Enum(e) => e.validate(),
            TypeKind::Bitmask(b) => b.validate(),
        }
    }
}

/// Field descriptor for struct members, with IDL annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Field type.
    pub ty: Arc<TypeDescriptor>,
    /// Participates in the instance key (@key).
    pub key: bool,
    /// @optional annotation (metadata, no wire effect under final).
    pub optional: bool,
    /// @external annotation (ownership indirection, no wire effect).
    pub external: bool,
    /// Explicit member id (@id), relevant for mutable/appendable only.
    pub id: Option<u32>,
}

impl FieldDescriptor {
    /// Create a new field descriptor.
    pub fn new(name: impl Into<String>, ty: Arc<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            ty,
            key: false,
            optional: false,
            external: false,
            id: None,
        }
    }

    /// Mark as a key field.
    pub fn key(mut self) -> Self {
        self.key = true;
        self
    }

    /// Mark as optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Mark as external.
    pub fn external(mut self) -> Self {
        self.external = true;
        self
    }

    /// Set explicit member id.
    pub fn with_id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }
}

/// Struct type descriptor. `parent` holds the inherited base struct; its
/// fields serialize before this struct's own fields, root ancestor first.
#[derive(Debug, Clone, PartialEq)]
pub struct StructDescriptor {
    pub parent: Option<Arc<TypeDescriptor>>,
    pub fields: Vec<FieldDescriptor>,
    pub extensibility: Extensibility,
    pub autoid: AutoIdPolicy,
}

impl StructDescriptor {
    /// All fields in wire order: ancestors first, then own declaration order.
    pub fn all_fields(&self) -> Vec<&FieldDescriptor> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a FieldDescriptor>) {
        if let Some(parent) = &self.parent {
            if let TypeKind::Struct(p) = &parent.kind {
                p.collect_fields(out);
            }
        }
        out.extend(self.fields.iter());
    }

    /// Get own or inherited field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.all_fields().into_iter().find(|f| f.name == name)
    }

    /// True if any field in the lineage is key-annotated.
    pub fn has_key_fields(&self) -> bool {
        self.all_fields().iter().any(|f| f.key)
    }

    fn validate(&self) -> Result<(), ConstructionError> {
        if let Some(parent) = &self.parent {
            if !parent.is_struct() {
                return Err(ConstructionError::NotAStruct(parent.name.clone()));
            }
            parent.validate()?;
        }
        let all = self.all_fields();
        for (i, field) in all.iter().enumerate() {
            if all[..i].iter().any(|f| f.name == field.name) {
                return Err(ConstructionError::DuplicateFieldName(field.name.clone()));
            }
        }
        for field in &self.fields {
            field.ty.validate()?;
        }
        Ok(())
    }
}

/// Sequence type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceDescriptor {
    /// Element type.
    pub element: Arc<TypeDescriptor>,
    /// Maximum element count (None = unbounded). Validation bound only,
    /// never encoded.
    pub max_length: Option<u32>,
}

impl SequenceDescriptor {
    pub fn unbounded(element: Arc<TypeDescriptor>) -> Self {
        Self {
            element,
            max_length: None,
        }
    }

    pub fn bounded(element: Arc<TypeDescriptor>, max_length: u32) -> Self {
        Self {
            element,
            max_length: Some(max_length),
        }
    }
}

/// Array type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayDescriptor {
    pub element: Arc<TypeDescriptor>,
    pub length: u32,
}

impl ArrayDescriptor {
    pub fn new(element: Arc<TypeDescriptor>, length: u32) -> Self {
        Self { element, length }
    }
}

/// Enumeration type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDescriptor {
    pub variants: Vec<EnumVariant>,
}

impl EnumDescriptor {
    pub fn new(variants: Vec<EnumVariant>) -> Self {
        Self { variants }
    }

    /// Get variant by name.
    pub fn variant(&self, name: &str) -> Option<&EnumVariant> {
        self.variants.iter().find(|v| v.name == name)
    }

    /// Get variant by value.
    pub fn variant_by_value(&self, value: i32) -> Option<&EnumVariant> {
        self.variants.iter().find(|v| v.value == value)
    }

    fn validate(&self) -> Result<(), ConstructionError> {
        for (i, v) in self.variants.iter().enumerate() {
            if self.variants[..i].iter().any(|o| o.name == v.name) {
                return Err(ConstructionError::DuplicateEnumerator(v.name.clone()));
            }
            if self.variants[..i].iter().any(|o| o.value == v.value) {
                return Err(ConstructionError::DuplicateEnumerator(format!(
                    "{} = {}",
                    v.name, v.value
                )));
            }
        }
        Ok(())
    }
}

/// Enum variant.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumVariant {
    pub name: String,
    pub value: i32,
}

impl EnumVariant {
    pub fn new(name: impl Into<String>, value: i32) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// One named bit of a bitmask.
#[derive(Debug, Clone, PartialEq)]
pub struct BitFlag {
    pub mask: u64,
    pub name: String,
}

/// Bitmask type descriptor. Encoded as the smallest unsigned width
/// (8/16/32/64-bit) that holds the highest declared mask bit.
#[derive(Debug, Clone, PartialEq)]
pub struct BitmaskDescriptor {
    pub bits: Vec<BitFlag>,
}

impl BitmaskDescriptor {
    pub fn new(bits: Vec<BitFlag>) -> Self {
        Self { bits }
    }

    /// OR of every declared mask.
    pub fn full_mask(&self) -> u64 {
        self.bits.iter().fold(0, |acc, b| acc | b.mask)
    }

    /// Wire representation width.
    pub fn wire_width(&self) -> PrimitiveKind {
        let highest = self.full_mask();
        if highest <= u64::from(u8::MAX) {
            PrimitiveKind::U8
        } else if highest <= u64::from(u16::MAX) {
            PrimitiveKind::U16
        } else if highest <= u64::from(u32::MAX) {
            PrimitiveKind::U32
        } else {
            PrimitiveKind::U64
        }
    }

    /// Get flag mask by name.
    pub fn flag(&self, name: &str) -> Option<u64> {
        self.bits.iter().find(|b| b.name == name).map(|b| b.mask)
    }

    /// Combined mask for a set of flag names; `None` if any is unknown.
    pub fn mask_of(&self, names: &[&str]) -> Option<u64> {
        names
            .iter()
            .try_fold(0u64, |acc, name| Some(acc | self.flag(name)?))
    }

    /// Names of the flags set in `mask`, in declaration order.
    pub fn flags_of(&self, mask: u64) -> Vec<&str> {
        self.bits
            .iter()
            .filter(|b| mask & b.mask == b.mask)
            .map(|b| b.name.as_str())
            .collect()
    }

    fn validate(&self) -> Result<(), ConstructionError> {
        if self.bits.is_empty() {
            return Err(ConstructionError::InvalidBound("empty bitmask".into()));
        }
        for (i, bit) in self.bits.iter().enumerate() {
            if bit.mask == 0 {
                return Err(ConstructionError::InvalidBound(format!(
                    "bitmask flag {} with zero mask",
                    bit.name
                )));
            }
            if self.bits[..i].iter().any(|o| o.name == bit.name) {
                return Err(ConstructionError::DuplicateFieldName(bit.name.clone()));
            }
        }
        Ok(())
    }
}

/// Union case.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionCase {
    /// Case field name.
    pub name: String,
    /// Discriminator labels selecting this case.
    pub labels: Vec<i64>,
    /// Case type.
    pub ty: Arc<TypeDescriptor>,
}

impl UnionCase {
    pub fn new(name: impl Into<String>, labels: Vec<i64>, ty: Arc<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            labels,
            ty,
        }
    }

    pub fn single(name: impl Into<String>, label: i64, ty: Arc<TypeDescriptor>) -> Self {
        Self::new(name, vec![label], ty)
    }
}

/// Union type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionDescriptor {
    /// Discriminator type: integer primitive, bool, char8 or enum.
    pub discriminator: Arc<TypeDescriptor>,
    /// Declared cases.
    pub cases: Vec<UnionCase>,
    /// Default case, independent of the explicit case list.
    pub default_case: Option<(String, Arc<TypeDescriptor>)>,
    /// Wire discriminator used when the default case is active and no
    /// explicit discriminator was supplied. Synthesized at build time.
    pub default_discriminator: Option<i64>,
}

impl UnionDescriptor {
    /// Get declared case by discriminator label. Never falls through to the
    /// default case; callers handle that explicitly.
    pub fn case_by_label(&self, label: i64) -> Option<&UnionCase> {
        self.cases.iter().find(|c| c.labels.contains(&label))
    }

    /// Get declared case by field name.
    pub fn case_by_name(&self, name: &str) -> Option<&UnionCase> {
        self.cases.iter().find(|c| c.name == name)
    }

    /// True if `name` names the default case field.
    pub fn is_default_name(&self, name: &str) -> bool {
        self.default_case.as_ref().is_some_and(|(n, _)| n == name)
    }

    fn validate(&self) -> Result<(), ConstructionError> {
        let disc_ok = matches!(
            &self.discriminator.kind,
            TypeKind::Enum(_) | TypeKind::Primitive(PrimitiveKind::Bool | PrimitiveKind::Char8)
        ) || matches!(&self.discriminator.kind, TypeKind::Primitive(p) if p.is_integer());
        if !disc_ok {
            return Err(ConstructionError::InvalidDiscriminator(
                self.discriminator.name.clone(),
            ));
        }

        let mut seen = Vec::new();
        for case in &self.cases {
            for label in &case.labels {
                if seen.contains(label) {
                    return Err(ConstructionError::DuplicateDiscriminatorLabel(*label));
                }
                if !label_in_range(&self.discriminator, *label) {
                    return Err(ConstructionError::LabelOutOfRange {
                        label: *label,
                        discriminator: self.discriminator.name.clone(),
                    });
                }
                seen.push(*label);
            }
            if self
                .cases
                .iter()
                .filter(|c| c.name == case.name)
                .count()
                > 1
            {
                return Err(ConstructionError::DuplicateFieldName(case.name.clone()));
            }
            case.ty.validate()?;
        }
        if let Some((name, ty)) = &self.default_case {
            if self.cases.iter().any(|c| &c.name == name) {
                return Err(ConstructionError::DuplicateFieldName(name.clone()));
            }
            ty.validate()?;
            let expect = synthesize_default_discriminator(&self.discriminator, &self.cases)?;
            if self.default_discriminator != Some(expect) {
                return Err(ConstructionError::InvalidDiscriminator(format!(
                    "default discriminator must be {} for union with default case",
                    expect
                )));
            }
        }
        Ok(())
    }
}

/// Scan seed and step for default-discriminator synthesis: unsigned kinds
/// scan upward from 0, signed kinds downward from -1, enum discriminators
/// scan as signed 32-bit from -1.
fn discriminator_scan_params(disc: &TypeDescriptor) -> Result<(i64, i64, i64), ConstructionError> {
    match &disc.kind {
        TypeKind::Primitive(p) if p.is_integer() => {
            let (min, max) = p
                .integer_range()
                .ok_or_else(|| ConstructionError::InvalidDiscriminator(disc.name.clone()))?;
            if p.is_signed() {
                Ok((-1, -1, min))
            } else {
                Ok((0, 1, max))
            }
        }
        // Bool and char8 discriminate fine but have no scan space worth
        // speaking of; unions over them may not declare a default case.
        TypeKind::Primitive(PrimitiveKind::Bool | PrimitiveKind::Char8) => {
            Err(ConstructionError::InvalidDiscriminator(disc.name.clone()))
        }
        TypeKind::Enum(_) => Ok((-1, -1, i64::from(i32::MIN))),
        _ => Err(ConstructionError::InvalidDiscriminator(disc.name.clone())),
    }
}

fn label_in_range(disc: &TypeDescriptor, label: i64) -> bool {
    match &disc.kind {
        TypeKind::Primitive(PrimitiveKind::Bool) => label == 0 || label == 1,
        TypeKind::Primitive(PrimitiveKind::Char8) => (0..=255).contains(&label),
        TypeKind::Primitive(p) => p
            .integer_range()
            .is_some_and(|(min, max)| (min..=max).contains(&label)),
        TypeKind::Enum(_) => i32::try_from(label).is_ok(),
        _ => false,
    }
}

/// Pick the wire discriminator for "default case active, no explicit
/// discriminator given": first representable value not claimed by any
/// declared case, scanning from the type-dependent seed.
pub fn synthesize_default_discriminator(
    disc: &TypeDescriptor,
    cases: &[UnionCase],
) -> Result<i64, ConstructionError> {
    let (seed, step, end) = discriminator_scan_params(disc)?;
    let claimed = |v: i64| cases.iter().any(|c| c.labels.contains(&v));
    let mut val = seed;
    loop {
        if !claimed(val) {
            return Ok(val);
        }
        if val == end {
            return Err(ConstructionError::ExhaustedDiscriminatorSpace);
        }
        val += step;
    }
}

/// Malformed type descriptor, raised at type-registration time only.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstructionError {
    DuplicateDiscriminatorLabel(i64),
    MultipleDefaultCases,
    DuplicateFieldName(String),
    DuplicateEnumerator(String),
    InvalidDiscriminator(String),
    LabelOutOfRange { label: i64, discriminator: String },
    InvalidBound(String),
    ExhaustedDiscriminatorSpace,
    NotAStruct(String),
    NotAUnion(String),
}

impl fmt::Display for ConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateDiscriminatorLabel(label) => {
                write!(f, "discriminator label {} used by multiple cases", label)
            }
            Self::MultipleDefaultCases => write!(f, "union declares more than one default case"),
            Self::DuplicateFieldName(name) => write!(f, "duplicate field name: {}", name),
            Self::DuplicateEnumerator(name) => write!(f, "duplicate enumerator: {}", name),
            Self::InvalidDiscriminator(ty) => write!(f, "invalid discriminator type: {}", ty),
            Self::LabelOutOfRange {
                label,
                discriminator,
            } => write!(
                f,
                "case label {} not representable by discriminator {}",
                label, discriminator
            ),
            Self::InvalidBound(what) => write!(f, "invalid bound: {}", what),
            Self::ExhaustedDiscriminatorSpace => {
                write!(f, "no free discriminator value left for the default case")
            }
            Self::NotAStruct(name) => write!(f, "{} is not a struct type", name),
            Self::NotAUnion(name) => write!(f, "{} is not a union type", name),
        }
    }
}

impl std::error::Error for ConstructionError {}
