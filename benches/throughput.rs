//! Throughput Benchmark for indexkv
//!
//! This benchmark measures the store variants under various workloads.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use indexkv::{IndexedMap, IndexedStore, Store, StrictStore, Value};
use std::sync::Arc;
use std::time::Duration;

/// Benchmark Insert operations
fn bench_insert(c: &mut Criterion) {
    let store = Arc::new(Store::new());
    let value = Bytes::from("x".repeat(1024)); // 1KB value

    let mut group = c.benchmark_group("insert");
    group.throughput(Throughput::Elements(1));

    group.bench_function("insert_no_index", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let _ = store.insert(format!("plain:{}", i), value.clone(), []);
            i += 1;
        });
    });

    group.bench_function("insert_three_indices", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let indices = [
                format!("user:{}", i % 1_000),
                format!("shard:{}", i % 16),
                "all".to_string(),
            ];
            let _ = store.insert(format!("indexed:{}", i), value.clone(), indices);
            i += 1;
        });
    });

    group.bench_function("insert_unsynchronized", |b| {
        let mut map = IndexedMap::new();
        let mut i = 0u64;
        b.iter(|| {
            let _ = map.insert(i, value.clone(), [i % 1_000]);
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark FetchByKey and FetchByIndex operations
fn bench_fetch(c: &mut Criterion) {
    let store = Arc::new(Store::new());

    // Pre-populate: 100 keys per index
    for i in 0..100_000u64 {
        store
            .insert(i, Bytes::from(format!("value:{}", i)), [i % 1_000])
            .unwrap();
    }

    let mut group = c.benchmark_group("fetch");
    group.throughput(Throughput::Elements(1));

    group.bench_function("fetch_by_key", |b| {
        let mut i = 0u64;
        b.iter(|| {
            black_box(store.fetch_by_key(&(i % 100_000)).ok());
            i += 1;
        });
    });

    group.bench_function("fetch_by_key_missing", |b| {
        let mut i = 100_000u64;
        b.iter(|| {
            black_box(store.fetch_by_key(&i).ok());
            i += 1;
        });
    });

    group.bench_function("fetch_by_index_100", |b| {
        let mut i = 0u64;
        b.iter(|| {
            black_box(store.fetch_by_index(&(i % 1_000)).ok());
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark DeleteByIndex cascades
fn bench_cascade(c: &mut Criterion) {
    let mut group = c.benchmark_group("cascade");
    group.throughput(Throughput::Elements(1_000));

    group.bench_function("delete_by_index_1000_keys", |b| {
        b.iter(|| {
            let mut map = IndexedMap::with_capacity(1_000);
            for i in 0..1_000u32 {
                map.insert(i, i, ["all", if i % 2 == 0 { "even" } else { "odd" }])
                    .unwrap();
            }
            map.delete_by_index(&"all").unwrap();
            black_box(map.index_num());
        });
    });

    group.finish();
}

/// Benchmark the type-checked store against a plain one
fn bench_strict(c: &mut Criterion) {
    let strict = StrictStore::new("", 0, "").unwrap();
    let plain = Store::new();

    let mut group = c.benchmark_group("strict");
    group.throughput(Throughput::Elements(1));

    group.bench_function("strict_insert", |b| {
        let mut i = 0i64;
        b.iter(|| {
            let _ = strict.insert(
                Value::from(format!("key:{}", i)),
                Value::from(i),
                [Value::from("ix")],
            );
            i += 1;
        });
    });

    group.bench_function("plain_insert_dynamic", |b| {
        let mut i = 0i64;
        b.iter(|| {
            let _ = plain.insert(
                Value::from(format!("key:{}", i)),
                Value::from(i),
                [Value::from("ix")],
            );
            i += 1;
        });
    });

    group.bench_function("strict_rejected", |b| {
        b.iter(|| {
            black_box(strict.insert(Value::from(1), Value::from(1), []).is_err());
        });
    });

    group.finish();
}

/// Benchmark concurrent access
fn bench_concurrent(c: &mut Criterion) {
    use std::thread;

    let mut group = c.benchmark_group("concurrent");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("4_threads_mixed", |b| {
        b.iter(|| {
            let store = Arc::new(Store::new());
            let handles: Vec<_> = (0..4u64)
                .map(|t| {
                    let store = Arc::clone(&store);
                    thread::spawn(move || {
                        for i in 0..10_000u64 {
                            let key = t * 100_000 + i;
                            store.insert(key, Bytes::from("value"), [t, i % 64]).unwrap();
                            let _ = store.fetch_by_key(&key);
                            if i % 8 == 0 {
                                let _ = store.fetch_by_index(&(i % 64));
                            }
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            black_box(store.key_num());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_insert,
    bench_fetch,
    bench_cascade,
    bench_strict,
    bench_concurrent,
);

criterion_main!(benches);
