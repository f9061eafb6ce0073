//! Benchmarks for axis reductions and flips

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use tensile::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn filled(shape: &[usize], dtype: DType) -> Tensor {
    let n: usize = shape.iter().product();
    let data: Vec<f64> = (0..n).map(|i| ((i * 17 + 3) % 1000) as f64 / 1000.0).collect();
    Tensor::from_slice(&data, shape).to_dtype(dtype).unwrap()
}

// ---------------------------------------------------------------------------
// Reductions
// ---------------------------------------------------------------------------

fn bench_norm2(c: &mut Criterion) {
    let mut group = c.benchmark_group("norm2_f32");
    for size in [64usize, 256, 1024] {
        let t = filled(&[size, size], DType::F32);
        group.throughput(Throughput::Elements((size * size) as u64));

        group.bench_with_input(BenchmarkId::new("last_axis", size), &t, |b, t| {
            b.iter(|| black_box(t.norm2(1, false).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("first_axis", size), &t, |b, t| {
            b.iter(|| black_box(t.norm2(0, false).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("all_axes", size), &t, |b, t| {
            b.iter(|| black_box(t.norm2(Axes::All, false).unwrap()))
        });
    }
    group.finish();
}

fn bench_general_norm(c: &mut Criterion) {
    let mut group = c.benchmark_group("norm_p3_f64");
    for size in [64usize, 512] {
        let t = filled(&[size, size], DType::F64);
        group.throughput(Throughput::Elements((size * size) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &t, |b, t| {
            b.iter(|| black_box(t.norm(3.0, 1, false).unwrap()))
        });
    }
    group.finish();
}

fn bench_min_max(c: &mut Criterion) {
    let mut group = c.benchmark_group("minimum");
    for dtype in [DType::F32, DType::F16, DType::I32] {
        let t = filled(&[32, 64, 64], dtype);
        group.bench_with_input(BenchmarkId::new("axes_0_2", dtype), &t, |b, t| {
            b.iter(|| black_box(t.minimum([0, 2], false).unwrap()))
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Flips
// ---------------------------------------------------------------------------

fn bench_fliplr(c: &mut Criterion) {
    let mut group = c.benchmark_group("fliplr_f32");
    let t = filled(&[512, 512], DType::F32);
    group.bench_function("copy", |b| b.iter(|| black_box(t.fliplr(false).unwrap())));
    group.bench_function("in_place", |b| b.iter(|| black_box(t.fliplr(true).unwrap())));
    group.finish();
}

criterion_group!(benches, bench_norm2, bench_general_norm, bench_min_max, bench_fliplr);
criterion_main!(benches);
