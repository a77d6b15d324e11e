//! Benchmarks for the SMA indicator, comparing streaming (per-bar `tick`)
//! against whole-history batch (`run_once`) evaluation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lp_core::indicator::{run_once, tick};
use lp_core::indicators::sma::Sma;
use lp_core::line::new_line_handle;

fn feed(data: &[f64]) -> lp_core::LineHandle {
    let line = new_line_handle();
    for &v in data {
        line.borrow_mut().append(v);
    }
    line
}

fn bench_sma_streaming(c: &mut Criterion) {
    let mut group = c.benchmark_group("sma_streaming");
    let period = 20;

    for size in [10, 100, 500, 1000, 2000, 5000, 10000].iter() {
        let data: Vec<f64> = (0..*size).map(|i| i as f64 + 1.0).collect();

        group.bench_with_input(BenchmarkId::new("tick", size), size, |b, &_size| {
            b.iter(|| {
                let input = feed(&data);
                let mut sma = Sma::new(input, period).unwrap();
                for _ in 0..data.len() {
                    tick(black_box(&mut sma));
                }
            })
        });
    }

    group.finish();
}

fn bench_sma_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("sma_batch");
    let period = 20;

    for size in [10, 100, 500, 1000, 2000, 5000, 10000].iter() {
        let data: Vec<f64> = (0..*size).map(|i| i as f64 + 1.0).collect();

        group.bench_with_input(BenchmarkId::new("run_once", size), size, |b, &_size| {
            b.iter(|| {
                let input = feed(&data);
                let mut sma = Sma::new(input, period).unwrap();
                run_once(black_box(&mut sma), data.len());
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sma_streaming, bench_sma_batch);
criterion_main!(benches);
