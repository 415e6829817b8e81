//! Data file benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dataorbit_bench::utils::random_data;
use dataorbit_storage::{backup_dir_for, list_snapshots, snapshot_file_name, DataFile};
use tempfile::TempDir;

/// Benchmark atomic saves (temp file, fsync, rename).
fn bench_save(c: &mut Criterion) {
    let mut group = c.benchmark_group("save");
    // Every save fsyncs, so keep the sample count low.
    group.sample_size(20);

    for size in [1024, 65536, 1048576].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let dir = TempDir::new().unwrap();
            let file = DataFile::new(&dir.path().join("bench.json")).unwrap();
            let data = random_data(size);

            b.iter(|| {
                file.save(black_box(&data)).unwrap();
            });
        });
    }

    group.finish();
}

/// Benchmark whole-file loads.
fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load");

    for size in [1024, 65536, 1048576].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let dir = TempDir::new().unwrap();
            let file = DataFile::new(&dir.path().join("bench.json")).unwrap();
            file.save(&random_data(size)).unwrap();

            b.iter(|| {
                let result = file.load().unwrap();
                black_box(result);
            });
        });
    }

    group.finish();
}

/// Benchmark copying the data file into the backup directory.
fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");
    group.sample_size(20);

    let size = 65536;
    group.throughput(Throughput::Bytes(size as u64));
    group.bench_function("64k", |b| {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bench.json");
        let file = DataFile::new(&path).unwrap();
        file.save(&random_data(size)).unwrap();
        let backups = backup_dir_for(&path);
        let mut n = 0u64;

        b.iter(|| {
            n += 1;
            let copied = file.snapshot_to(&backups.join(snapshot_file_name(n))).unwrap();
            black_box(copied);
        });
    });

    group.finish();
}

/// Benchmark listing a backup directory.
fn bench_list_snapshots(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bench.json");
    let file = DataFile::new(&path).unwrap();
    file.save(b"{}").unwrap();
    let backups = backup_dir_for(&path);
    for n in 0..500 {
        file.snapshot_to(&backups.join(snapshot_file_name(n))).unwrap();
    }

    c.bench_function("list_snapshots_500", |b| {
        b.iter(|| {
            let entries = list_snapshots(black_box(&backups)).unwrap();
            black_box(entries);
        });
    });
}

criterion_group!(
    benches,
    bench_save,
    bench_load,
    bench_snapshot,
    bench_list_snapshots,
);

criterion_main!(benches);
