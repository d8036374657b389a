// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Descriptor-driven CDR encode/decode.
//!
//! Walks a [`TypeDescriptor`] and a [`Value`] in lockstep. Output carries a
//! 4-byte encapsulation header; alignment is relative to the first byte after
//! it. Decoding is strict about structure (string NUL, discriminator match,
//! sequence bounds) and tolerant of trailing bytes, which RTPS pads to a
//! 4-byte boundary.

use crate::cursor::{CdrReader, CdrWriter, Endianness};
use crate::descriptor::{PrimitiveKind, TypeDescriptor, TypeKind};
use crate::encap::{self, CdrProfile};
use crate::union_value::UnionValue;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Cap on decoded sequence/array element counts when no descriptor bound is
/// declared. Keeps a forged 32-bit count from driving allocation.
pub const DEFAULT_SEQUENCE_SANITY_BOUND: usize = 1 << 24;

/// Errors during CDR serialization or deserialization.
#[derive(Debug, Clone, PartialEq)]
pub enum CdrError {
    /// Buffer ended before a complete value.
    Underflow { need: usize, have: usize },
    /// Structurally invalid payload or value.
    Malformed(String),
    /// Value shape does not match the descriptor.
    TypeMismatch {
        expected: String,
        found: &'static str,
    },
    /// Declared or sanity bound exceeded.
    BoundExceeded { len: usize, max: usize },
    /// Struct value missing a declared field.
    MissingField(String),
    /// String payload is not valid UTF-8.
    Utf8(std::string::FromUtf8Error),
}

impl fmt::Display for CdrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Underflow { need, have } => {
                write!(f, "buffer underflow: need {} bytes, have {}", need, have)
            }
            Self::Malformed(what) => write!(f, "malformed payload: {}", what),
            Self::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {}, found {}", expected, found)
            }
            Self::BoundExceeded { len, max } => {
                write!(f, "bound exceeded: length {} over maximum {}", len, max)
            }
            Self::MissingField(name) => write!(f, "missing struct field: {}", name),
            Self::Utf8(e) => write!(f, "invalid UTF-8 in string: {}", e),
        }
    }
}

impl std::error::Error for CdrError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Utf8(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::string::FromUtf8Error> for CdrError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Self::Utf8(e)
    }
}

pub type CdrResult<T> = Result<T, CdrError>;

/// Encoding knobs: CDR profile, payload byte order, and whether to emit
/// the 4-byte encapsulation header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    pub profile: CdrProfile,
    pub endianness: Endianness,
    pub with_header: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            profile: CdrProfile::default(),
            endianness: Endianness::default(),
            with_header: true,
        }
    }
}

impl EncodeOptions {
    pub fn new(profile: CdrProfile, endianness: Endianness) -> Self {
        Self {
            profile,
            endianness,
            with_header: true,
        }
    }

    /// Bare payload without the encapsulation header.
    pub fn headerless(profile: CdrProfile, endianness: Endianness) -> Self {
        Self {
            profile,
            endianness,
            with_header: false,
        }
    }
}

/// Decoding knobs. With a header present, profile and byte order come from
/// the header and the fields here are ignored; headerless payloads use them
/// as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    pub has_header: bool,
    pub profile: CdrProfile,
    pub endianness: Endianness,
    /// Element-count ceiling for unbounded sequences.
    pub sequence_sanity_bound: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            profile: CdrProfile::default(),
            endianness: Endianness::default(),
            sequence_sanity_bound: DEFAULT_SEQUENCE_SANITY_BOUND,
        }
    }
}

impl DecodeOptions {
    /// Bare payload without an encapsulation header.
    pub fn headerless(profile: CdrProfile, endianness: Endianness) -> Self {
        Self {
            has_header: false,
            profile,
            endianness,
            ..Self::default()
        }
    }
}

/// Encode `value` as a CDR message, headered per `options`.
pub fn encode(
    descriptor: &Arc<TypeDescriptor>,
    value: &Value,
    options: &EncodeOptions,
) -> CdrResult<Vec<u8>> {
    let mut writer = CdrWriter::new(options.endianness, options.profile.max_align());
    if options.with_header {
        writer.write_bytes(&encap::header(options.profile, options.endianness));
        writer.mark_payload_start();
    }
    encode_value(&mut writer, descriptor, value)?;
    Ok(writer.into_bytes())
}

/// Decode a CDR message. With a header, profile and byte order are taken
/// from it. Trailing bytes after the value are ignored.
pub fn decode(
    descriptor: &Arc<TypeDescriptor>,
    bytes: &[u8],
    options: &DecodeOptions,
) -> CdrResult<Value> {
    let (profile, endianness, payload) = if options.has_header {
        let (profile, endianness) = encap::parse_header(bytes)?;
        (profile, endianness, &bytes[encap::HEADER_LEN..])
    } else {
        (options.profile, options.endianness, bytes)
    };
    let mut reader = CdrReader::new(payload, endianness, profile.max_align());
    decode_value(&mut reader, descriptor, options)
}

fn mismatch(expected: impl Into<String>, found: &Value) -> CdrError {
    CdrError::TypeMismatch {
        expected: expected.into(),
        found: found.kind_name(),
    }
}

pub(crate) fn encode_value(
    writer: &mut CdrWriter,
    descriptor: &Arc<TypeDescriptor>,
    value: &Value,
) -> CdrResult<()> {
    match &descriptor.kind {
        TypeKind::Primitive(p) => encode_primitive(writer, *p, value),
        TypeKind::String { max_length } => {
            let s = value
                .as_str()
                .ok_or_else(|| mismatch("string", value))?;
            encode_string(writer, s, *max_length)
        }
        TypeKind::Array(arr) => {
            let elements = value
                .as_elements()
                .ok_or_else(|| mismatch("array", value))?;
            if elements.len() != arr.length as usize {
                return Err(CdrError::Malformed(format!(
                    "array {} expects {} elements, value has {}",
                    descriptor.name,
                    arr.length,
                    elements.len()
                )));
            }
            for element in elements {
                encode_value(writer, &arr.element, element)?;
            }
            Ok(())
        }
        TypeKind::Sequence(seq) => {
            let elements = value
                .as_elements()
                .ok_or_else(|| mismatch("sequence", value))?;
            if let Some(max) = seq.max_length {
                if elements.len() > max as usize {
                    return Err(CdrError::BoundExceeded {
                        len: elements.len(),
                        max: max as usize,
                    });
                }
            }
            writer.write_u32(elements.len() as u32);
            for element in elements {
                encode_value(writer, &seq.element, element)?;
            }
            Ok(())
        }
        TypeKind::Struct(s) => {
            for field in s.all_fields() {
                let field_value = value
                    .field(&field.name)
                    .ok_or_else(|| CdrError::MissingField(field.name.clone()))?;
                encode_value(writer, &field.ty, field_value)?;
            }
            Ok(())
        }
        TypeKind::Union(u) => {
            let union_value = value
                .as_union()
                .ok_or_else(|| mismatch("union", value))?;
            write_discriminator(
                writer,
                &u.discriminator,
                union_value.resolved_discriminator(),
            )?;
            let arm = union_value.active_type().ok_or_else(|| {
                CdrError::Malformed(format!(
                    "union {} value has no payload type for its active case",
                    descriptor.name
                ))
            })?;
            encode_value(writer, arm, union_value.value())
        }
        TypeKind::Enum(e) => {
            let v = value
                .enum_value()
                .ok_or_else(|| mismatch("enum", value))?;
            if e.variant_by_value(v).is_none() {
                return Err(CdrError::Malformed(format!(
                    "enum {} has no variant with value {}",
                    descriptor.name, v
                )));
            }
            writer.write_i32(v);
            Ok(())
        }
        TypeKind::Bitmask(b) => {
            let mask = value
                .as_mask()
                .ok_or_else(|| mismatch("bitmask", value))?;
            let stray = mask & !b.full_mask();
            if stray != 0 {
                return Err(CdrError::Malformed(format!(
                    "bitmask {} value sets undeclared bits 0x{:x}",
                    descriptor.name, stray
                )));
            }
            write_unsigned(writer, b.wire_width(), mask);
            Ok(())
        }
    }
}

fn encode_primitive(writer: &mut CdrWriter, kind: PrimitiveKind, value: &Value) -> CdrResult<()> {
    match (kind, value) {
        (PrimitiveKind::Bool, Value::Bool(v)) => writer.write_u8(u8::from(*v)),
        (PrimitiveKind::Char8, Value::Char(c)) => {
            let code = u32::from(*c);
            if code > 0xFF {
                return Err(CdrError::Malformed(format!(
                    "char8 cannot hold U+{:04X}",
                    code
                )));
            }
            writer.write_u8(code as u8);
        }
        (PrimitiveKind::Char16, Value::WChar(v)) => writer.write_u16(*v),
        (PrimitiveKind::I8, Value::I8(v)) => writer.write_i8(*v),
        (PrimitiveKind::I16, Value::I16(v)) => writer.write_i16(*v),
        (PrimitiveKind::I32, Value::I32(v)) => writer.write_i32(*v),
        (PrimitiveKind::I64, Value::I64(v)) => writer.write_i64(*v),
        (PrimitiveKind::U8, Value::U8(v)) => writer.write_u8(*v),
        (PrimitiveKind::U16, Value::U16(v)) => writer.write_u16(*v),
        (PrimitiveKind::U32, Value::U32(v)) => writer.write_u32(*v),
        (PrimitiveKind::U64, Value::U64(v)) => writer.write_u64(*v),
        (PrimitiveKind::F32, Value::F32(v)) => writer.write_f32(*v),
        (PrimitiveKind::F64, Value::F64(v)) => writer.write_f64(*v),
        (kind, other) => return Err(mismatch(kind.to_string(), other)),
    }
    Ok(())
}

fn encode_string(writer: &mut CdrWriter, s: &str, max_length: Option<u32>) -> CdrResult<()> {
    if let Some(max) = max_length {
        if s.len() > max as usize {
            return Err(CdrError::BoundExceeded {
                len: s.len(),
                max: max as usize,
            });
        }
    }
    // Length prefix counts the mandatory trailing NUL.
    writer.write_u32(s.len() as u32 + 1);
    writer.write_bytes(s.as_bytes());
    writer.write_u8(0);
    Ok(())
}

/// Write a discriminator at its declared wire width.
pub(crate) fn write_discriminator(
    writer: &mut CdrWriter,
    discriminator: &TypeDescriptor,
    value: i64,
) -> CdrResult<()> {
    let out_of_range = || {
        CdrError::Malformed(format!(
            "discriminator value {} not representable by {}",
            value, discriminator.name
        ))
    };
    match &discriminator.kind {
        TypeKind::Enum(_) => {
            writer.write_i32(i32::try_from(value).map_err(|_| out_of_range())?);
        }
        TypeKind::Primitive(p) => match p {
            PrimitiveKind::Bool | PrimitiveKind::Char8 | PrimitiveKind::U8 => {
                writer.write_u8(u8::try_from(value).map_err(|_| out_of_range())?);
            }
            PrimitiveKind::I8 => writer.write_i8(i8::try_from(value).map_err(|_| out_of_range())?),
            PrimitiveKind::I16 => {
                writer.write_i16(i16::try_from(value).map_err(|_| out_of_range())?);
            }
            PrimitiveKind::U16 => {
                writer.write_u16(u16::try_from(value).map_err(|_| out_of_range())?);
            }
            PrimitiveKind::I32 => {
                writer.write_i32(i32::try_from(value).map_err(|_| out_of_range())?);
            }
            PrimitiveKind::U32 => {
                writer.write_u32(u32::try_from(value).map_err(|_| out_of_range())?);
            }
            PrimitiveKind::I64 => writer.write_i64(value),
            PrimitiveKind::U64 => {
                writer.write_u64(u64::try_from(value).map_err(|_| out_of_range())?);
            }
            _ => return Err(out_of_range()),
        },
        _ => return Err(out_of_range()),
    }
    Ok(())
}

fn write_unsigned(writer: &mut CdrWriter, width: PrimitiveKind, value: u64) {
    match width {
        PrimitiveKind::U8 => writer.write_u8(value as u8),
        PrimitiveKind::U16 => writer.write_u16(value as u16),
        PrimitiveKind::U32 => writer.write_u32(value as u32),
        _ => writer.write_u64(value),
    }
}

fn decode_value(
    reader: &mut CdrReader<'_>,
    descriptor: &Arc<TypeDescriptor>,
    options: &DecodeOptions,
) -> CdrResult<Value> {
    match &descriptor.kind {
        TypeKind::Primitive(p) => decode_primitive(reader, *p),
        TypeKind::String { max_length } => decode_string(reader, *max_length),
        TypeKind::Array(arr) => {
            check_element_budget(reader, arr.length as usize, &arr.element)?;
            let mut elements = Vec::with_capacity(arr.length as usize);
            for _ in 0..arr.length {
                elements.push(decode_value(reader, &arr.element, options)?);
            }
            Ok(Value::Array(elements))
        }
        TypeKind::Sequence(seq) => {
            let count = reader.read_u32()? as usize;
            let max = seq
                .max_length
                .map_or(options.sequence_sanity_bound, |m| m as usize);
            if count > max {
                return Err(CdrError::BoundExceeded { len: count, max });
            }
            check_element_budget(reader, count, &seq.element)?;
            let mut elements = Vec::with_capacity(count);
            for _ in 0..count {
                elements.push(decode_value(reader, &seq.element, options)?);
            }
            Ok(Value::Sequence(elements))
        }
        TypeKind::Struct(s) => {
            let mut fields = HashMap::new();
            for field in s.all_fields() {
                let v = decode_value(reader, &field.ty, options)?;
                fields.insert(field.name.clone(), v);
            }
            Ok(Value::Struct(fields))
        }
        TypeKind::Union(u) => {
            let discriminator = read_discriminator(reader, &u.discriminator)?;
            let arm = match u.case_by_label(discriminator) {
                Some(case) => &case.ty,
                None => match &u.default_case {
                    Some((_, ty)) => ty,
                    None => {
                        return Err(CdrError::Malformed(format!(
                            "union {} discriminator {} matches no case",
                            descriptor.name, discriminator
                        )))
                    }
                },
            };
            let payload = decode_value(reader, arm, options)?;
            let union_value =
                UnionValue::with_discriminator(Arc::clone(descriptor), discriminator, payload)
                    .map_err(|e| CdrError::Malformed(e.to_string()))?;
            Ok(Value::Union(Box::new(union_value)))
        }
        TypeKind::Enum(e) => {
            let v = reader.read_i32()?;
            let variant = e.variant_by_value(v).ok_or_else(|| {
                CdrError::Malformed(format!(
                    "enum {} has no variant with value {}",
                    descriptor.name, v
                ))
            })?;
            Ok(Value::Enum(v, variant.name.clone()))
        }
        TypeKind::Bitmask(b) => {
            let mask = read_unsigned(reader, b.wire_width())?;
            // A peer's bitmask may have gained flags we don't know about;
            // keep only the declared bits.
            Ok(Value::Bitmask(mask & b.full_mask()))
        }
    }
}

/// Reject element counts the remaining buffer cannot possibly satisfy,
/// before `Vec::with_capacity` sees them.
fn check_element_budget(
    reader: &CdrReader<'_>,
    count: usize,
    element: &TypeDescriptor,
) -> CdrResult<()> {
    let need = count.saturating_mul(element.min_size());
    if need > reader.remaining() {
        return Err(CdrError::Underflow {
            need,
            have: reader.remaining(),
        });
    }
    Ok(())
}

fn decode_primitive(reader: &mut CdrReader<'_>, kind: PrimitiveKind) -> CdrResult<Value> {
    Ok(match kind {
        // Any nonzero byte reads as true; peers differ on the exact byte.
        PrimitiveKind::Bool => Value::Bool(reader.read_u8()? != 0),
        PrimitiveKind::Char8 => Value::Char(char::from(reader.read_u8()?)),
        PrimitiveKind::Char16 => Value::WChar(reader.read_u16()?),
        PrimitiveKind::I8 => Value::I8(reader.read_i8()?),
        PrimitiveKind::I16 => Value::I16(reader.read_i16()?),
        PrimitiveKind::I32 => Value::I32(reader.read_i32()?),
        PrimitiveKind::I64 => Value::I64(reader.read_i64()?),
        PrimitiveKind::U8 => Value::U8(reader.read_u8()?),
        PrimitiveKind::U16 => Value::U16(reader.read_u16()?),
        PrimitiveKind::U32 => Value::U32(reader.read_u32()?),
        PrimitiveKind::U64 => Value::U64(reader.read_u64()?),
        PrimitiveKind::F32 => Value::F32(reader.read_f32()?),
        PrimitiveKind::F64 => Value::F64(reader.read_f64()?),
    })
}

fn decode_string(reader: &mut CdrReader<'_>, max_length: Option<u32>) -> CdrResult<Value> {
    let len = reader.read_u32()? as usize;
    if len == 0 {
        return Err(CdrError::Malformed(
            "string length 0, must count the trailing NUL".into(),
        ));
    }
    if let Some(max) = max_length {
        if len - 1 > max as usize {
            return Err(CdrError::BoundExceeded {
                len: len - 1,
                max: max as usize,
            });
        }
    }
    let bytes = reader.read_bytes(len)?;
    let (content, terminator) = bytes.split_at(len - 1);
    if terminator != [0] {
        return Err(CdrError::Malformed("string missing NUL terminator".into()));
    }
    Ok(Value::String(String::from_utf8(content.to_vec())?))
}

/// Read a discriminator at its declared wire width, widened to i64.
pub(crate) fn read_discriminator(
    reader: &mut CdrReader<'_>,
    discriminator: &TypeDescriptor,
) -> CdrResult<i64> {
    Ok(match &discriminator.kind {
        TypeKind::Enum(_) => i64::from(reader.read_i32()?),
        TypeKind::Primitive(p) => match p {
            PrimitiveKind::Bool | PrimitiveKind::Char8 | PrimitiveKind::U8 => {
                i64::from(reader.read_u8()?)
            }
            PrimitiveKind::I8 => i64::from(reader.read_i8()?),
            PrimitiveKind::I16 => i64::from(reader.read_i16()?),
            PrimitiveKind::U16 => i64::from(reader.read_u16()?),
            PrimitiveKind::I32 => i64::from(reader.read_i32()?),
            PrimitiveKind::U32 => i64::from(reader.read_u32()?),
            PrimitiveKind::I64 => reader.read_i64()?,
            PrimitiveKind::U64 => {
                let raw = reader.read_u64()?;
                i64::try_from(raw).map_err(|_| {
                    CdrError::Malformed(format!("uint64 discriminator {} out of label range", raw))
                })?
            }
            other => {
                return Err(CdrError::Malformed(format!(
                    "{} cannot discriminate a union",
                    other
                )))
            }
        },
        _ => {
            return Err(CdrError::Malformed(format!(
                "{} cannot discriminate a union",
                discriminator.name
            )))
        }
    })
}

fn read_unsigned(reader: &mut CdrReader<'_>, width: PrimitiveKind) -> CdrResult<u64> {
    Ok(match width {
        PrimitiveKind::U8 => u64::from(reader.read_u8()?),
        PrimitiveKind::U16 => u64::from(reader.read_u16()?),
        PrimitiveKind::U32 => u64::from(reader.read_u32()?),
        _ => reader.read_u64()?,
    })
}
