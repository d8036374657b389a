// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Randomized encode/decode roundtrips over a telemetry-shaped type that
// exercises every descriptor kind: nested struct, inheritance, enum,
// bitmask, union with default case, sequences, arrays and bounded strings.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_panics_doc)]

use dynidl::{
    BitmaskBuilder, CdrProfile, EncodeOptions, Endianness, EnumBuilder, PrimitiveKind,
    StructBuilder, TopicType, TypeDescriptor, UnionBuilder, UnionValue, Value,
};
use std::sync::Arc;

fn telemetry_type() -> TopicType {
    let status = Arc::new(
        EnumBuilder::new("Status")
            .variant("IDLE")
            .variant("ACTIVE")
            .variant_value("FAULT", 100)
            .build()
            .unwrap(),
    );
    let flags = Arc::new(
        BitmaskBuilder::new("Flags")
            .bit("calibrated", 0)
            .bit("saturated", 3)
            .bit("degraded", 12)
            .build()
            .unwrap(),
    );
    let position = Arc::new(
        StructBuilder::new("Position")
            .field("x", PrimitiveKind::F64)
            .field("y", PrimitiveKind::F64)
            .build()
            .unwrap(),
    );
    let reading = Arc::new(
        UnionBuilder::new("Reading", status.as_ref().clone())
            .primitive_case("raw", 0, PrimitiveKind::I64)
            .case("position", 1, position.clone())
            .default_case("note", Arc::new(TypeDescriptor::string()))
            .build()
            .unwrap(),
    );
    let header = Arc::new(
        StructBuilder::new("Header")
            .key_field("device_id", PrimitiveKind::U32)
            .field("stamp", PrimitiveKind::U64)
            .build()
            .unwrap(),
    );
    let desc = Arc::new(
        StructBuilder::new("Telemetry")
            .parent(header)
            .bounded_string_field("label", 32)
            .typed_field("status", status)
            .typed_field("flags", flags)
            .typed_field("reading", reading)
            .bounded_sequence_field("samples", PrimitiveKind::F32, 64)
            .array_field("checksum", PrimitiveKind::U8, 4)
            .build()
            .unwrap(),
    );
    TopicType::new(desc).unwrap()
}

fn random_telemetry(topic: &TopicType, rng: &mut fastrand::Rng) -> Value {
    let enum_pick = [(0, "IDLE"), (1, "ACTIVE"), (100, "FAULT")][rng.usize(..3)];

    let reading_desc = topic
        .descriptor()
        .as_struct()
        .unwrap()
        .field("reading")
        .unwrap()
        .ty
        .clone();
    let reading = match rng.u8(..3) {
        0 => UnionValue::with_field(reading_desc, "raw", rng.i64(..).into()).unwrap(),
        1 => {
            let mut p = Value::new_struct();
            p.set_field("x", rng.f64().into());
            p.set_field("y", rng.f64().into());
            UnionValue::with_discriminator(reading_desc, 1, p).unwrap()
        }
        _ => UnionValue::with_field(reading_desc, "note", "fallback".into()).unwrap(),
    };

    let samples: Vec<Value> = (0..rng.usize(..=64)).map(|_| rng.f32().into()).collect();
    let checksum: Vec<Value> = (0..4).map(|_| rng.u8(..).into()).collect();

    let mut v = Value::new_struct();
    v.set_field("device_id", rng.u32(..).into());
    v.set_field("stamp", rng.u64(..).into());
    v.set_field("label", format!("dev-{}", rng.u16(..)).into());
    v.set_field("status", Value::Enum(enum_pick.0, enum_pick.1.into()));
    v.set_field("flags", Value::Bitmask(0b1_0000_0000_1001 & rng.u64(..)));
    v.set_field("reading", reading.into());
    v.set_field("samples", Value::Sequence(samples));
    v.set_field("checksum", Value::Array(checksum));
    v
}

#[test]
fn roundtrip_all_profiles_randomized() {
    let topic = telemetry_type();
    let mut rng = fastrand::Rng::with_seed(0x5EED_CAFE);

    for _ in 0..200 {
        let v = random_telemetry(&topic, &mut rng);
        for profile in [CdrProfile::Cdr1, CdrProfile::Xcdr2] {
            for endianness in [Endianness::Little, Endianness::Big] {
                let options = EncodeOptions::new(profile, endianness);
                let bytes = topic.encode_with(&v, &options).unwrap();
                let decoded = topic.decode(&bytes).unwrap();
                assert_eq!(decoded, v);

                // re-encode must be byte-identical
                let again = topic.encode_with(&decoded, &options).unwrap();
                assert_eq!(again, bytes);
            }
        }
    }
}

#[test]
fn keyhash_is_stable_across_profiles() {
    let topic = telemetry_type();
    let mut rng = fastrand::Rng::with_seed(7);

    for _ in 0..50 {
        let v = random_telemetry(&topic, &mut rng);
        let reference = topic.instance_key(&v).unwrap();
        // the keyhash only depends on key fields, not encoding options
        for profile in [CdrProfile::Cdr1, CdrProfile::Xcdr2] {
            for endianness in [Endianness::Little, Endianness::Big] {
                let bytes = topic
                    .encode_with(&v, &EncodeOptions::new(profile, endianness))
                    .unwrap();
                let decoded = topic.decode(&bytes).unwrap();
                assert_eq!(topic.instance_key(&decoded).unwrap(), reference);
            }
        }
    }
}

#[test]
fn same_key_fields_same_hash_different_payload() {
    let topic = telemetry_type();
    let mut rng = fastrand::Rng::with_seed(99);

    let mut a = random_telemetry(&topic, &mut rng);
    let mut b = random_telemetry(&topic, &mut rng);
    a.set_field("device_id", 1234u32.into());
    b.set_field("device_id", 1234u32.into());

    assert_eq!(
        topic.instance_key(&a).unwrap(),
        topic.instance_key(&b).unwrap()
    );
}
