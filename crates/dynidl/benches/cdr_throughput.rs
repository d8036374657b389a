// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::cast_precision_loss)] // Stats/metrics need this
#![allow(clippy::missing_panics_doc)] // Benchmarks panic on failure
#![allow(clippy::semicolon_if_nothing_returned)] // Benchmark code formatting

//! CDR encode/decode and keyhash throughput.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dynidl::{
    CdrProfile, EncodeOptions, Endianness, PrimitiveKind, StructBuilder, TopicType, Value,
};
use std::sync::Arc;

fn sensor_topic() -> TopicType {
    let desc = Arc::new(
        StructBuilder::new("SensorFrame")
            .key_field("sensor_id", PrimitiveKind::U32)
            .field("stamp", PrimitiveKind::U64)
            .string_field("label")
            .sequence_field("samples", PrimitiveKind::F64)
            .build()
            .unwrap(),
    );
    TopicType::new(desc).unwrap()
}

fn sensor_frame(sample_count: usize) -> Value {
    let mut v = Value::new_struct();
    v.set_field("sensor_id", 7u32.into());
    v.set_field("stamp", 1_700_000_000_000u64.into());
    v.set_field("label", "bench-sensor".into());
    v.set_field(
        "samples",
        Value::Sequence((0..sample_count).map(|i| (i as f64 * 0.5).into()).collect()),
    );
    v
}

fn bench_encode(c: &mut Criterion) {
    let topic = sensor_topic();
    let mut group = c.benchmark_group("cdr_encode");

    for count in [16usize, 256, 4096] {
        let value = sensor_frame(count);
        let bytes = topic.encode(&value).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        for (name, profile) in [("cdr1", CdrProfile::Cdr1), ("xcdr2", CdrProfile::Xcdr2)] {
            let options = EncodeOptions::new(profile, Endianness::Little);
            group.bench_with_input(
                BenchmarkId::new(name, count),
                &value,
                |b, value| {
                    b.iter(|| topic.encode_with(black_box(value), &options).unwrap())
                },
            );
        }
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let topic = sensor_topic();
    let mut group = c.benchmark_group("cdr_decode");

    for count in [16usize, 256, 4096] {
        let bytes = topic.encode(&sensor_frame(count)).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(count),
            &bytes,
            |b, bytes| b.iter(|| topic.decode(black_box(bytes)).unwrap()),
        );
    }
    group.finish();
}

fn bench_instance_key(c: &mut Criterion) {
    let topic = sensor_topic();
    let value = sensor_frame(256);

    c.bench_function("instance_key", |b| {
        b.iter(|| topic.instance_key(black_box(&value)).unwrap())
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_instance_key);
criterion_main!(benches);
