//! Codec benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dataorbit_bench::utils::{generate_dataset, random_data, BENCH_KEY};
use dataorbit_codec::{
    decode_dataset, deobfuscate, encode_dataset, obfuscate, open, seal, ObfuscationKey, RawDataset,
};

/// Benchmark the XOR layer with varying sizes.
fn bench_obfuscate(c: &mut Criterion) {
    let mut group = c.benchmark_group("obfuscate");
    let key = BENCH_KEY.as_bytes();

    for size in [64, 1024, 16384, 262144].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let data = random_data(size);
            b.iter(|| {
                let result = obfuscate(black_box(&data), key).unwrap();
                black_box(result);
            });
        });
    }

    group.finish();
}

/// Benchmark reversing the XOR layer.
fn bench_deobfuscate(c: &mut Criterion) {
    let mut group = c.benchmark_group("deobfuscate");
    let key = BENCH_KEY.as_bytes();

    for size in [1024, 262144].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let blob = obfuscate(&random_data(size), key).unwrap();
            b.iter(|| {
                let result = deobfuscate(black_box(&blob), key).unwrap();
                black_box(result);
            });
        });
    }

    group.finish();
}

/// Benchmark the in-place form used when sealing.
fn bench_apply_in_place(c: &mut Criterion) {
    let key = ObfuscationKey::new(BENCH_KEY).unwrap();
    let mut data = random_data(65536);

    c.bench_function("apply_in_place_64k", |b| {
        b.iter(|| {
            key.apply_in_place(black_box(&mut data));
        });
    });
}

/// Benchmark pretty JSON encoding and decoding of whole datasets.
fn bench_dataset_json(c: &mut Criterion) {
    let mut group = c.benchmark_group("dataset_json");

    for rows in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*rows as u64));
        let dataset = generate_dataset(*rows, 32);
        let encoded = encode_dataset(&dataset).unwrap();

        group.bench_with_input(BenchmarkId::new("encode", rows), &dataset, |b, dataset| {
            b.iter(|| {
                let result = encode_dataset(black_box(dataset)).unwrap();
                black_box(result);
            });
        });

        group.bench_with_input(BenchmarkId::new("decode", rows), &encoded, |b, encoded| {
            b.iter(|| {
                let result: RawDataset = decode_dataset(black_box(encoded)).unwrap();
                black_box(result);
            });
        });
    }

    group.finish();
}

/// Benchmark seal + open (encode, obfuscate, and back).
fn bench_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("roundtrip");
    let key = ObfuscationKey::new(BENCH_KEY).unwrap();

    for rows in [100, 1000].iter() {
        group.throughput(Throughput::Elements(*rows as u64));
        let dataset = generate_dataset(*rows, 32);

        group.bench_with_input(BenchmarkId::from_parameter(rows), &dataset, |b, dataset| {
            b.iter(|| {
                let blob = seal(black_box(dataset), &key).unwrap();
                let decoded: RawDataset = open(&blob, &key).unwrap();
                black_box(decoded);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_obfuscate,
    bench_deobfuscate,
    bench_apply_in_place,
    bench_dataset_json,
    bench_roundtrip,
);

criterion_main!(benches);
