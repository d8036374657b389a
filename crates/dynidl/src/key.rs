// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RTPS instance-key extraction.
//!
//! Key fields serialize as headerless big-endian classic CDR in declaration
//! order, ancestors first. A raw key of at most 16 bytes goes into the
//! keyhash verbatim (zero-padded); anything longer is replaced by its MD5
//! digest. Keyless types map to the all-zero keyhash.

use crate::cdr::{self, CdrError, CdrResult};
use crate::cursor::{CdrWriter, Endianness};
use crate::descriptor::{TypeDescriptor, TypeKind};
use crate::value::Value;
use md5::{Digest, Md5};
use std::fmt;
use std::sync::Arc;

pub const KEYHASH_LENGTH: usize = 16;

/// 16-byte RTPS keyhash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyHash([u8; KEYHASH_LENGTH]);

impl KeyHash {
    /// Keyhash of every keyless instance.
    pub const ZERO: Self = Self([0; KEYHASH_LENGTH]);

    pub fn from_bytes(bytes: [u8; KEYHASH_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEYHASH_LENGTH] {
        &self.0
    }
}

impl fmt::Debug for KeyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyHash(")?;
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for KeyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// True when the type carries at least one key-annotated field.
pub fn is_keyed(descriptor: &TypeDescriptor) -> bool {
    descriptor.as_struct().is_some_and(|s| s.has_key_fields())
}

/// Serialize the key fields of `value` as headerless big-endian CDR.
/// Keyless types produce an empty buffer.
pub fn raw_key(descriptor: &Arc<TypeDescriptor>, value: &Value) -> CdrResult<Vec<u8>> {
    let mut writer = CdrWriter::new(Endianness::Big, 8);
    if is_keyed(descriptor) {
        append_key_fields(&mut writer, descriptor, value)?;
    }
    Ok(writer.into_bytes())
}

/// Compute the 16-byte keyhash for an instance of `descriptor`.
pub fn instance_key(descriptor: &Arc<TypeDescriptor>, value: &Value) -> CdrResult<KeyHash> {
    if !is_keyed(descriptor) {
        return Ok(KeyHash::ZERO);
    }
    let raw = raw_key(descriptor, value)?;
    let hash = if raw.len() <= KEYHASH_LENGTH {
        let mut out = [0u8; KEYHASH_LENGTH];
        out[..raw.len()].copy_from_slice(&raw);
        KeyHash(out)
    } else {
        KeyHash(Md5::digest(&raw).into())
    };
    log::trace!(
        "keyhash for {}: raw {} bytes -> {}",
        descriptor.name,
        raw.len(),
        hash
    );
    Ok(hash)
}

/// Walk a struct's key fields in wire order. A keyed nested struct
/// contributes its own key fields, a key-less nested struct contributes all
/// of them, and a keyed union contributes its discriminator only.
fn append_key_fields(
    writer: &mut CdrWriter,
    descriptor: &Arc<TypeDescriptor>,
    value: &Value,
) -> CdrResult<()> {
    match &descriptor.kind {
        TypeKind::Struct(s) => {
            let keyed = s.has_key_fields();
            for field in s.all_fields() {
                if keyed && !field.key {
                    continue;
                }
                let field_value = value
                    .field(&field.name)
                    .ok_or_else(|| CdrError::MissingField(field.name.clone()))?;
                append_key_fields(writer, &field.ty, field_value)?;
            }
            Ok(())
        }
        TypeKind::Union(u) => {
            let union_value = value.as_union().ok_or_else(|| CdrError::TypeMismatch {
                expected: "union".into(),
                found: value.kind_name(),
            })?;
            cdr::write_discriminator(
                writer,
                &u.discriminator,
                union_value.resolved_discriminator(),
            )
        }
        _ => cdr::encode_value(writer, descriptor, value),
    }
}
