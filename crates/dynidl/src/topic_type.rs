// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Registered topic type: a validated descriptor plus the operations a
//! reader/writer needs (encode, decode, instance key).

use crate::cdr::{self, CdrResult, DecodeOptions, EncodeOptions};
use crate::descriptor::{ConstructionError, TypeDescriptor};
use crate::key::{self, KeyHash};
use crate::value::Value;
use std::sync::Arc;

/// A topic-registered type. Construction validates the descriptor once;
/// afterwards the type is immutable and cheap to clone across
/// readers/writers.
#[derive(Debug, Clone)]
pub struct TopicType {
    descriptor: Arc<TypeDescriptor>,
}

impl TopicType {
    /// Register a descriptor, re-checking every construction-time invariant.
    pub fn new(descriptor: Arc<TypeDescriptor>) -> Result<Self, ConstructionError> {
        descriptor.validate()?;
        log::debug!(
            "registered topic type {} (keyed: {})",
            descriptor.name,
            key::is_keyed(&descriptor)
        );
        Ok(Self { descriptor })
    }

    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn is_keyed(&self) -> bool {
        key::is_keyed(&self.descriptor)
    }

    /// Encode with the default profile (classic CDR, little-endian).
    pub fn encode(&self, value: &Value) -> CdrResult<Vec<u8>> {
        self.encode_with(value, &EncodeOptions::default())
    }

    pub fn encode_with(&self, value: &Value, options: &EncodeOptions) -> CdrResult<Vec<u8>> {
        cdr::encode(&self.descriptor, value, options)
    }

    /// Decode a headered CDR message; profile and byte order come from the
    /// encapsulation header.
    pub fn decode(&self, bytes: &[u8]) -> CdrResult<Value> {
        self.decode_with(bytes, &DecodeOptions::default())
    }

    pub fn decode_with(&self, bytes: &[u8], options: &DecodeOptions) -> CdrResult<Value> {
        cdr::decode(&self.descriptor, bytes, options)
    }

    /// Headerless big-endian serialization of the key fields.
    pub fn raw_key(&self, value: &Value) -> CdrResult<Vec<u8>> {
        key::raw_key(&self.descriptor, value)
    }

    /// 16-byte RTPS keyhash for `value`'s instance.
    pub fn instance_key(&self, value: &Value) -> CdrResult<KeyHash> {
        key::instance_key(&self.descriptor, value)
    }
}
