use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use strata_hlc::{HybridLogicalClock, SystemClock};
use strata_types::{HlcTimestamp, NodeId};

fn new_timestamp_bench(c: &mut Criterion) {
    let mut hlc = HybridLogicalClock::new(Arc::new(SystemClock), NodeId([1; 32]));

    c.bench_function("hlc_new_timestamp", |b| b.iter(|| black_box(hlc.new_timestamp())));
}

fn observe_bench(c: &mut Criterion) {
    let mut hlc = HybridLogicalClock::new(Arc::new(SystemClock), NodeId([1; 32]));
    let remote = HlcTimestamp::new(hlc.physical_now_ns(), 7, NodeId([2; 32]));

    c.bench_function("hlc_observe", |b| b.iter(|| hlc.observe(black_box(&remote))));
}

fn compare_bench(c: &mut Criterion) {
    let a = HlcTimestamp::new(1_000, 3, NodeId([1; 32]));
    let b = HlcTimestamp::new(1_000, 3, NodeId([2; 32]));

    c.bench_function("hlc_compare", |bench| {
        bench.iter(|| HybridLogicalClock::compare(black_box(&a), black_box(&b)))
    });
}

criterion_group!(benches, new_timestamp_bench, observe_bench, compare_bench);
criterion_main!(benches);
