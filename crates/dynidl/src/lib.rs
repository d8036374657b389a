// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # dynidl - Runtime IDL types over CDR
//!
//! Runtime type descriptors for IDL-defined data (structs, discriminated
//! unions, bitmasks, enums, arrays, sequences, bounded strings), a byte-exact
//! CDR serializer/deserializer (classic CDR and the XCDR2 final profile), and
//! RTPS instance-key extraction that interoperates with native DDS stacks.
//!
//! Descriptors are built once through the builder API, validated at
//! registration time, and shared immutably (`Arc`) across any number of
//! concurrent encode/decode/key calls.
//!
//! ## Quick Start
//!
//! ```rust
//! use dynidl::{PrimitiveKind, StructBuilder, TopicType, Value};
//! use std::sync::Arc;
//!
//! let descriptor = Arc::new(
//!     StructBuilder::new("SensorReading")
//!         .key_field("sensor_id", PrimitiveKind::U32)
//!         .field("temperature", PrimitiveKind::F64)
//!         .build()
//!         .unwrap(),
//! );
//!
//! let topic = TopicType::new(descriptor).unwrap();
//!
//! let mut sample = Value::new_struct();
//! sample.set_field("sensor_id", 42u32.into());
//! sample.set_field("temperature", 23.5f64.into());
//!
//! let bytes = topic.encode(&sample).unwrap();
//! let decoded = topic.decode(&bytes).unwrap();
//! assert_eq!(sample, decoded);
//!
//! let key = topic.instance_key(&sample).unwrap();
//! assert_eq!(key.as_bytes()[..4], [0, 0, 0, 42]);
//! ```
//!
//! ## Modules Overview
//!
//! - [`descriptor`] - runtime type model and construction-time validation
//! - [`builder`] - fluent builders for descriptors
//! - [`value`] - type-erased runtime values
//! - [`union_value`] - discriminated-union runtime (active-case tracking)
//! - [`cursor`] - aligned read/write cursors over CDR payloads
//! - [`encap`] - encapsulation header and CDR profile selection
//! - [`cdr`] - descriptor-driven CDR encode/decode
//! - [`key`] - instance-key extraction (inline / MD5 keyhash)
//! - [`topic_type`] - registered-type facade over the above

pub mod builder;
pub mod cdr;
pub mod cursor;
pub mod descriptor;
pub mod encap;
pub mod key;
pub mod topic_type;
pub mod union_value;
pub mod value;

pub use builder::{BitmaskBuilder, EnumBuilder, StructBuilder, UnionBuilder};
pub use cdr::{decode, encode, CdrError, CdrResult, DecodeOptions, EncodeOptions};
pub use cursor::{CdrReader, CdrWriter, Endianness};
pub use descriptor::{
    ArrayDescriptor, AutoIdPolicy, BitFlag, BitmaskDescriptor, ConstructionError, EnumDescriptor,
    EnumVariant, Extensibility, FieldDescriptor, PrimitiveKind, SequenceDescriptor,
    StructDescriptor, TypeDescriptor, TypeKind, UnionCase, UnionDescriptor,
};
pub use encap::CdrProfile;
pub use key::{KeyHash, KEYHASH_LENGTH};
pub use topic_type::TopicType;
pub use union_value::{ActiveField, UnionError, UnionValue};
pub use value::{FromValue, IntoValue, Value};
