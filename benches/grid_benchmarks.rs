//! Spatial grid engine throughput: scatter, stencil, and gather in isolation.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use evolimo_core::grid::{gather, scatter, stencil};
use evolimo_core::ir::GridConfig;
use ndarray::Array2;

fn agents(n: usize, extent: f32) -> (Array2<f32>, Array2<f32>, Array2<f32>) {
    let value = Array2::from_shape_fn((n, 1), |(i, _)| i as f32);
    let x = Array2::from_shape_fn((n, 1), |(i, _)| (i as f32 * 2.3) % extent);
    let y = Array2::from_shape_fn((n, 1), |(i, _)| (i as f32 * 1.7) % extent);
    (value, x, y)
}

fn bench_scatter(c: &mut Criterion) {
    let mut group = c.benchmark_group("scatter");
    for n in [100usize, 1_000, 5_000] {
        let (value, x, y) = agents(n, 32.0);
        let config = GridConfig { width: 32, height: 32, capacity: 8, cell_size: [1.0, 1.0] };
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| scatter(&value, &x, &y, &config));
        });
    }
    group.finish();
}

fn bench_stencil(c: &mut Criterion) {
    let mut group = c.benchmark_group("stencil_range");
    let (value, x, y) = agents(2_000, 32.0);
    let config = GridConfig { width: 32, height: 32, capacity: 8, cell_size: [1.0, 1.0] };
    let (grid, index, _) = scatter(&value, &x, &y, &config);

    for range in [1usize, 2, 3] {
        group.bench_with_input(BenchmarkId::from_parameter(range), &range, |b, &range| {
            b.iter(|| stencil(&grid, &index.occupancy, range, |_cc, c, _nc, n| &n - &c));
        });
    }
    group.finish();
}

fn bench_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("scatter_stencil_gather");
    for n in [500usize, 2_000] {
        let (value, x, y) = agents(n, 32.0);
        let config = GridConfig { width: 32, height: 32, capacity: 8, cell_size: [1.0, 1.0] };
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let (grid, index, _) = scatter(&value, &x, &y, &config);
                let stenciled = stencil(&grid, &index.occupancy, 1, |_cc, c, _nc, n| &n - &c);
                gather(&stenciled, &index)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_scatter, bench_stencil, bench_round_trip);
criterion_main!(benches);
