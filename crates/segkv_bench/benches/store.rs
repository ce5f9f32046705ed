//! Store benchmarks: write path, read path, recovery scan, compaction.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use segkv_bench::{fill_store, temp_store, value_of_size};
use segkv_core::Store;

const SEGMENT_SIZE: u64 = 4 * 1024 * 1024;

/// Benchmark put throughput across value sizes.
fn bench_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("put");

    for size in [64, 256, 1024, 4096].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let (_dir, store) = temp_store(SEGMENT_SIZE);
            let value = value_of_size(size);
            let mut i = 0u64;

            b.iter(|| {
                i += 1;
                store
                    .put(format!("key-{}", i % 1024), black_box(&value))
                    .unwrap();
            });
        });
    }

    group.finish();
}

/// Benchmark get latency across value sizes.
fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("get");

    for size in [64, 256, 1024, 4096].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let (_dir, store) = temp_store(SEGMENT_SIZE);
            fill_store(&store, 1024, 1, size);
            let mut i = 0u64;

            b.iter(|| {
                i += 1;
                let value = store.get(&format!("key-{}", i % 1024)).unwrap();
                black_box(value);
            });
        });
    }

    group.finish();
}

/// Benchmark the recovery scan performed by open.
fn bench_reopen(c: &mut Criterion) {
    let mut group = c.benchmark_group("reopen");
    group.sample_size(20);

    for keys in [1_000usize, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(keys), keys, |b, &keys| {
            let (dir, store) = temp_store(SEGMENT_SIZE);
            fill_store(&store, keys, 2, 256);
            store.close().unwrap();

            b.iter(|| {
                let store = Store::open(dir.path(), SEGMENT_SIZE).unwrap();
                black_box(store.key_count());
                store.close().unwrap();
            });
        });
    }

    group.finish();
}

/// Benchmark a full compaction over heavily overwritten data.
fn bench_compact(c: &mut Criterion) {
    let mut group = c.benchmark_group("compact");
    group.sample_size(10);

    group.bench_function("overwrite_heavy", |b| {
        b.iter_with_setup(
            || {
                let (dir, store) = temp_store(64 * 1024);
                fill_store(&store, 256, 8, 256);
                (dir, store)
            },
            |(_dir, store)| {
                store.compact();
                store.wait_for_compaction();
                black_box(store.segment_count());
            },
        );
    });

    group.finish();
}

criterion_group!(benches, bench_put, bench_get, bench_reopen, bench_compact);
criterion_main!(benches);
