//! Table store benchmarks for csvd.
//!
//! Benchmarks for:
//! - Puts to distinct names and to a single hot name
//! - Gets of committed tables
//! - Generated-name inserts
//! - Concurrent writers across threads

use std::sync::Arc;
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use csvd_bench::utils::{generate_names, generate_random_names, generate_table};
use csvd_core::TableStore;

/// Benchmark puts to distinct names.
fn bench_put_distinct(c: &mut Criterion) {
    let mut group = c.benchmark_group("store/put_distinct");
    let table = generate_table(10, 2);

    for size in [1000, 10_000].iter() {
        let names = generate_names(*size, "t_");

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let store = TableStore::in_memory();
                for name in &names {
                    store.put(name, table.clone()).unwrap();
                }
                black_box(store.len())
            });
        });
    }

    group.finish();
}

/// Benchmark repeated replacement of one name.
fn bench_put_same_name(c: &mut Criterion) {
    let mut group = c.benchmark_group("store/put_same_name");
    let table = generate_table(10, 2);
    let names = generate_names(1, "hot_");
    let store = TableStore::in_memory();

    group.throughput(Throughput::Elements(1));
    group.bench_function("replace", |b| {
        b.iter(|| black_box(store.put(&names[0], table.clone()).unwrap()));
    });

    group.finish();
}

/// Benchmark gets of committed tables.
fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("store/get");
    let table = generate_table(10, 2);

    for size in [1000, 10_000].iter() {
        let names = generate_random_names(*size);
        let store = TableStore::in_memory();
        for name in &names {
            store.put(name, table.clone()).unwrap();
        }

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                for name in &names {
                    black_box(store.get(name.as_str()).unwrap());
                }
            });
        });
    }

    group.finish();
}

/// Benchmark inserts under generated names.
fn bench_insert_generated(c: &mut Criterion) {
    let mut group = c.benchmark_group("store/insert_generated");
    let table = generate_table(10, 2);

    group.throughput(Throughput::Elements(1000));
    group.bench_function("1000", |b| {
        b.iter(|| {
            let store = TableStore::in_memory();
            for _ in 0..1000 {
                black_box(store.insert_generated(table.clone()).unwrap());
            }
        });
    });

    group.finish();
}

/// Benchmark concurrent writers, one name per thread.
fn bench_concurrent_writers(c: &mut Criterion) {
    let mut group = c.benchmark_group("store/concurrent_writers");
    let table = Arc::new(generate_table(10, 2));

    for threads in [2, 4, 8].iter() {
        let names = generate_names(*threads, "w_");
        const PUTS_PER_THREAD: usize = 1000;

        group.throughput(Throughput::Elements((*threads * PUTS_PER_THREAD) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(threads), threads, |b, _| {
            b.iter(|| {
                let store = Arc::new(TableStore::in_memory());
                let handles: Vec<_> = names
                    .iter()
                    .cloned()
                    .map(|name| {
                        let store = store.clone();
                        let table = table.clone();
                        thread::spawn(move || {
                            for _ in 0..PUTS_PER_THREAD {
                                store.put(&name, (*table).clone()).unwrap();
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }
                black_box(store.len())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_put_distinct,
    bench_put_same_name,
    bench_get,
    bench_insert_generated,
    bench_concurrent_writers,
);
criterion_main!(benches);
