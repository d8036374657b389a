// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fuzz target for CDR deserialization
//!
//! Feeds arbitrary bytes to the header parser, the low-level read cursor
//! and the descriptor-driven decoder. None of these operations should
//! panic or over-allocate on any input.

#![no_main]

use dynidl::{
    DecodeOptions, PrimitiveKind, StructBuilder, TopicType, TypeDescriptor, UnionBuilder,
};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;
use std::sync::OnceLock;

fn topics() -> &'static Vec<TopicType> {
    static TOPICS: OnceLock<Vec<TopicType>> = OnceLock::new();
    TOPICS.get_or_init(|| {
        let union = Arc::new(
            UnionBuilder::new("Choice", TypeDescriptor::primitive(PrimitiveKind::I16))
                .primitive_case("num", 0, PrimitiveKind::I64)
                .primitive_case("flag", 1, PrimitiveKind::Bool)
                .default_case("text", Arc::new(TypeDescriptor::string()))
                .build()
                .unwrap(),
        );
        let plain = Arc::new(
            StructBuilder::new("Plain")
                .key_field("id", PrimitiveKind::U32)
                .field("stamp", PrimitiveKind::U64)
                .string_field("name")
                .bounded_sequence_field("data", PrimitiveKind::F64, 128)
                .array_field("tag", PrimitiveKind::U8, 4)
                .build()
                .unwrap(),
        );
        let nested = Arc::new(
            StructBuilder::new("Nested")
                .typed_key_field("choice", union)
                .sequence_field("extra", PrimitiveKind::U16)
                .build()
                .unwrap(),
        );
        vec![
            TopicType::new(plain).unwrap(),
            TopicType::new(nested).unwrap(),
        ]
    })
}

fuzz_target!(|data: &[u8]| {
    // Header parsing must not panic
    let _ = dynidl::encap::parse_header(data);

    // Low-level cursor reads must not panic
    for endianness in [dynidl::Endianness::Little, dynidl::Endianness::Big] {
        let mut reader = dynidl::CdrReader::new(data, endianness, 8);
        let _ = reader.read_u8();
        let _ = reader.read_u32();
        let _ = reader.read_f64();
        let _ = reader.read_bytes(16);
    }

    // Descriptor-driven decode must neither panic nor allocate off a forged
    // sequence count. If decode succeeds, the keyhash must succeed too.
    let options = DecodeOptions::default();
    for topic in topics() {
        if let Ok(value) = topic.decode_with(data, &options) {
            let _ = topic.instance_key(&value);
        }
    }
});
