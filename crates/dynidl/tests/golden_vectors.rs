// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// CDR golden vectors: hand-computed byte images for wire compliance.
//
// Each test encodes a known deterministic value, compares against the
// expected bytes, then verifies decode -> re-encode is byte-identical.

#![allow(clippy::unreadable_literal)]
#![allow(clippy::missing_panics_doc)]

use dynidl::{
    CdrProfile, DecodeOptions, EncodeOptions, Endianness, PrimitiveKind, StructBuilder,
    TypeDescriptor, UnionBuilder, UnionValue, Value,
};
use std::sync::Arc;

fn golden(desc: &Arc<TypeDescriptor>, value: &Value, options: &EncodeOptions, expected: &[u8]) {
    let encoded = dynidl::encode(desc, value, options).unwrap();
    assert_eq!(encoded, expected, "encoded bytes differ from golden image");

    let decoded = dynidl::decode(desc, &encoded, &DecodeOptions::default()).unwrap();
    let re_encoded = dynidl::encode(desc, &decoded, options).unwrap();
    assert_eq!(re_encoded, encoded, "re-encoded bytes differ from original");
}

fn le1() -> EncodeOptions {
    EncodeOptions::new(CdrProfile::Cdr1, Endianness::Little)
}

fn be1() -> EncodeOptions {
    EncodeOptions::new(CdrProfile::Cdr1, Endianness::Big)
}

#[test]
fn golden_primitive_padding_le() {
    let desc = Arc::new(
        StructBuilder::new("Padded")
            .field("a", PrimitiveKind::U8)
            .field("b", PrimitiveKind::U32)
            .field("c", PrimitiveKind::U16)
            .field("d", PrimitiveKind::U64)
            .build()
            .unwrap(),
    );
    let mut v = Value::new_struct();
    v.set_field("a", 0x11u8.into());
    v.set_field("b", 0x2222_2222u32.into());
    v.set_field("c", 0x3333u16.into());
    v.set_field("d", 0x4444_4444_4444_4444u64.into());

    golden(
        &desc,
        &v,
        &le1(),
        &[
            0x00, 0x01, 0x00, 0x00, // encapsulation: CDR_LE
            0x11, 0x00, 0x00, 0x00, // a + 3 pad to u32
            0x22, 0x22, 0x22, 0x22, // b
            0x33, 0x33, // c
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // pad to u64 (offset 10 -> 16)
            0x44, 0x44, 0x44, 0x44, 0x44, 0x44, 0x44, 0x44, // d
        ],
    );
}

#[test]
fn golden_primitive_padding_xcdr2() {
    let desc = Arc::new(
        StructBuilder::new("Padded")
            .field("a", PrimitiveKind::U8)
            .field("d", PrimitiveKind::F64)
            .build()
            .unwrap(),
    );
    let mut v = Value::new_struct();
    v.set_field("a", 0x7Fu8.into());
    v.set_field("d", 1.0f64.into());

    golden(
        &desc,
        &v,
        &EncodeOptions::new(CdrProfile::Xcdr2, Endianness::Little),
        &[
            0x00, 0x07, 0x00, 0x00, // encapsulation: CDR2_LE
            0x7F, 0x00, 0x00, 0x00, // a + 3 pad (8-byte align clamps to 4)
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xF0, 0x3F, // 1.0f64 LE
        ],
    );
}

#[test]
fn golden_sequence_and_string_be() {
    let desc = Arc::new(
        StructBuilder::new("Msg")
            .string_field("name")
            .sequence_field("vals", PrimitiveKind::I32)
            .build()
            .unwrap(),
    );
    let mut v = Value::new_struct();
    v.set_field("name", "abc".into());
    v.set_field("vals", vec![-1i32, 2].into());

    golden(
        &desc,
        &v,
        &be1(),
        &[
            0x00, 0x00, 0x00, 0x00, // encapsulation: CDR_BE
            0x00, 0x00, 0x00, 0x04, // string length including NUL
            b'a', b'b', b'c', 0x00, // content + NUL
            0x00, 0x00, 0x00, 0x02, // element count
            0xFF, 0xFF, 0xFF, 0xFF, // -1
            0x00, 0x00, 0x00, 0x02, // 2
        ],
    );
}

#[test]
fn golden_union_default_case_le() {
    let desc = Arc::new(
        UnionBuilder::new("Choice", TypeDescriptor::primitive(PrimitiveKind::U16))
            .primitive_case("num", 0, PrimitiveKind::I32)
            .primitive_case("wide", 4, PrimitiveKind::F64)
            .default_case("flag", Arc::new(TypeDescriptor::primitive(PrimitiveKind::U8)))
            .build()
            .unwrap(),
    );

    // cases claim {0, 4}; unsigned scan picks 1 for the default
    let v: Value = UnionValue::with_field(desc.clone(), "flag", 0xAAu8.into())
        .unwrap()
        .into();
    golden(
        &desc,
        &v,
        &le1(),
        &[
            0x00, 0x01, 0x00, 0x00, // encapsulation: CDR_LE
            0x01, 0x00, // synthesized u16 discriminator
            0xAA, // default payload, no padding needed
        ],
    );
}

#[test]
fn golden_keyhash_inline_and_md5() {
    let inline = Arc::new(
        StructBuilder::new("Inline")
            .key_field("id", PrimitiveKind::U32)
            .field("body", PrimitiveKind::F64)
            .build()
            .unwrap(),
    );
    let mut v = Value::new_struct();
    v.set_field("id", 0x01020304u32.into());
    v.set_field("body", 0.0f64.into());

    let hash = dynidl::key::instance_key(&inline, &v).unwrap();
    assert_eq!(
        hash.as_bytes(),
        &[1, 2, 3, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
    );

    // 17 raw key bytes force the MD5 path
    let wide = Arc::new(
        StructBuilder::new("Wide")
            .key_field("a", PrimitiveKind::U64)
            .key_field("b", PrimitiveKind::U64)
            .key_field("c", PrimitiveKind::U8)
            .build()
            .unwrap(),
    );
    let mut w = Value::new_struct();
    w.set_field("a", 0u64.into());
    w.set_field("b", 0u64.into());
    w.set_field("c", 0u8.into());

    let raw = dynidl::key::raw_key(&wide, &w).unwrap();
    assert_eq!(raw.len(), 17);
    // MD5 of 17 zero bytes
    assert_eq!(
        dynidl::key::instance_key(&wide, &w).unwrap().as_bytes(),
        &[
            0xF3, 0xC8, 0xBD, 0xB6, 0xB9, 0xDF, 0x47, 0x8F, 0x22, 0x7A, 0xF2, 0xCE, 0x61, 0xC8,
            0xA5, 0xA1
        ]
    );
}

#[test]
fn golden_header_bytes() {
    let desc = Arc::new(
        StructBuilder::new("One")
            .field("x", PrimitiveKind::U8)
            .build()
            .unwrap(),
    );
    let mut v = Value::new_struct();
    v.set_field("x", 1u8.into());

    let cases = [
        (CdrProfile::Cdr1, Endianness::Big, 0x00u8),
        (CdrProfile::Cdr1, Endianness::Little, 0x01),
        (CdrProfile::Xcdr2, Endianness::Big, 0x06),
        (CdrProfile::Xcdr2, Endianness::Little, 0x07),
    ];
    for (profile, endianness, rep_id) in cases {
        let bytes = dynidl::encode(&desc, &v, &EncodeOptions::new(profile, endianness)).unwrap();
        assert_eq!(&bytes[..4], &[0x00, rep_id, 0x00, 0x00]);
    }
}
