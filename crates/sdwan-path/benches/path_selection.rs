//! Path selection benchmark
//!
//! Target: selection over a handful of WAN paths well under 1μs

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sdwan_common::{PathGroup, PathId, PriorityClass, Timestamp};
use sdwan_path::{MetricSample, PathScore, PathSelector, PathTable};

fn scoring_benchmark(c: &mut Criterion) {
    c.bench_function("path_score", |b| {
        b.iter(|| {
            PathScore::compute(
                black_box(20.0),
                black_box(1.0),
                black_box(10.0),
                black_box(100.0),
                black_box(true),
            )
        })
    });
}

fn selection_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_best_path");
    let selector = PathSelector::new();
    let key = PathGroup::from("site-a");

    for size in [2u64, 4, 16, 64].iter() {
        let mut table = PathTable::default();
        for id in 0..*size {
            let sample = MetricSample::measured(
                10.0 + (id * 7 % 90) as f64,
                (id % 5) as f64 * 0.5,
                (id * 13 % 100) as f64,
            );
            table.update(&key, PathId(id), &sample, Timestamp::from_secs(1));
        }

        group.bench_with_input(BenchmarkId::new("normal", size), size, |b, _| {
            b.iter(|| selector.select_best_path(table.candidates(&key), black_box(PriorityClass::Normal)))
        });
        group.bench_with_input(BenchmarkId::new("critical", size), size, |b, _| {
            b.iter(|| selector.select_best_path(table.candidates(&key), black_box(PriorityClass::Critical)))
        });
    }

    group.finish();
}

criterion_group!(benches, scoring_benchmark, selection_benchmark);
criterion_main!(benches);
