//! Microbenchmarks for the `update()` hot path and windowed iteration.
//!
//! Run with: `cargo bench -p windrow -- update`

#![allow(missing_docs)]

use std::cell::Cell;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use windrow::{Bucket, RingBuffer, Store, TimeStamped, WindowConfig};

struct Sample {
    ts: i64,
    amount: i64,
}

impl TimeStamped for Sample {
    fn timestamp(&self) -> i64 {
        self.ts
    }
}

#[derive(Default)]
struct SummingBucket {
    ts: Cell<i64>,
    sum: Cell<i64>,
}

impl Bucket for SummingBucket {
    type Value = Sample;

    fn timestamp(&self) -> i64 {
        self.ts.get()
    }

    fn reset(&self, value: &Sample) {
        self.ts.set(value.ts);
        self.sum.set(value.amount);
    }

    fn aggregate(&self, value: &Sample) {
        self.sum.set(self.sum.get() + value.amount);
    }
}

fn ring(max_buckets: usize) -> RingBuffer<SummingBucket> {
    let config = WindowConfig::new(max_buckets, max_buckets - 2, 1_000).unwrap();
    RingBuffer::new(config, SummingBucket::default).unwrap()
}

fn bench_update_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("update/ring");

    for max_buckets in [64, 256, 1_024, 4_096] {
        let buffer = ring(max_buckets);
        let mut ts = 0i64;

        group.bench_with_input(BenchmarkId::from_parameter(max_buckets), &max_buckets, |b, _| {
            b.iter(|| {
                ts += 1_000;
                buffer
                    .update(black_box(&Sample { ts, amount: 1 }))
                    .unwrap();
            });
        });
    }

    group.finish();
}

fn bench_iteration(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate/ring");

    for max_buckets in [64, 1_024, 16_384] {
        let buffer = ring(max_buckets);
        let base = 1_202_000i64;
        for i in 0..max_buckets as i64 {
            buffer
                .update(&Sample {
                    ts: base + i * 1_000,
                    amount: i,
                })
                .unwrap();
        }

        group.bench_with_input(BenchmarkId::from_parameter(max_buckets), &max_buckets, |b, _| {
            b.iter(|| {
                let total: i64 = buffer.iter(black_box(base)).map(|bucket| bucket.sum.get()).sum();
                black_box(total);
            });
        });
    }

    group.finish();
}

fn bench_store_put(c: &mut Criterion) {
    let store = Store::new(
        WindowConfig::new(64, 60, 1_000).unwrap(),
        SummingBucket::default,
    )
    .unwrap();
    let mut ts = 0i64;

    c.bench_function("update/store_single_key", |b| {
        b.iter(|| {
            ts += 1_000;
            store
                .put(black_box("hot-key"), black_box(&Sample { ts, amount: 1 }))
                .unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_update_throughput,
    bench_iteration,
    bench_store_put
);
criterion_main!(benches);
