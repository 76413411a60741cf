//! Benchmarks for mpyr operations.
//!
//! Run with: `cargo bench -p mpyr-bench`

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use mpyr_bench::{ramp_f32, textured_u16};
use mpyr_core::{HostImage, ImageAdapter};
use mpyr_gain::{GainKernel, SplitDispatcher, apply_gain_transform, fast_pow};
use mpyr_pool::ThreadPool;
use mpyr_vision::{ClaheParams, CpuVision, UnsharpParams, VisionBackend};

/// FastPow against `f64::powf`.
fn bench_fast_pow(c: &mut Criterion) {
    let mut group = c.benchmark_group("pow");
    let bases: Vec<f64> = (1..=10_000).map(|i| f64::from(i) * 0.1).collect();
    group.throughput(Throughput::Elements(bases.len() as u64));

    group.bench_function("fast_pow", |b| {
        b.iter(|| bases.iter().map(|&x| fast_pow(black_box(x), 0.4545)).sum::<f64>())
    });
    group.bench_function("powf", |b| {
        b.iter(|| bases.iter().map(|&x| black_box(x).powf(0.4545)).sum::<f64>())
    });

    group.finish();
}

/// Sequential kernel over whole images.
fn bench_kernel(c: &mut Criterion) {
    let mut group = c.benchmark_group("gain_kernel");
    let kernel = GainKernel::from_parts(4096.0, 1.0 / 2.2, 65535.0);

    for size in [256usize, 1024, 2048] {
        let input = ramp_f32(size, size);
        group.throughput(Throughput::Elements((size * size) as u64));
        group.bench_with_input(BenchmarkId::new("sequential", size), &input, |b, input| {
            let mut img = input.clone();
            b.iter(|| {
                img.clone_from(input);
                apply_gain_transform(black_box(&mut img), &kernel)
            })
        });
    }

    group.finish();
}

/// Split dispatch with varying band counts on one pool.
fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_dispatch");
    let kernel = GainKernel::from_parts(4096.0, 1.0 / 2.2, 65535.0);
    let Ok(pool) = ThreadPool::new(4) else {
        return;
    };
    let size = 2048usize;
    let input = ramp_f32(size, size);
    group.throughput(Throughput::Elements((size * size) as u64));

    for parts in [1usize, 2, 4, 8] {
        let Ok(dispatcher) = SplitDispatcher::new(parts) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::new("parts", parts), &input, |b, input| {
            let mut img = input.clone();
            b.iter(|| {
                img.clone_from(input);
                let view = img.resolve_mut().and_then(|v| v.into_f32("bench"));
                if let Ok(view) = view {
                    black_box(dispatcher.dispatch(&pool, view, &kernel)).ok();
                }
            })
        });
    }

    group.finish();
    pool.discard();
}

/// Vision operations on a U16 image.
fn bench_vision(c: &mut Criterion) {
    let mut group = c.benchmark_group("vision");
    let size = 1024usize;
    let src = textured_u16(size, size);
    group.throughput(Throughput::Elements((size * size) as u64));

    group.bench_function("pyr_down", |b| {
        let mut dst = HostImage::u16(0, 0);
        b.iter(|| CpuVision.pyr_down(black_box(&src), &mut dst))
    });
    group.bench_function("pyr_up", |b| {
        let mut dst = HostImage::u16(0, 0);
        b.iter(|| CpuVision.pyr_up(black_box(&src), &mut dst))
    });
    group.bench_function("clahe_8x8", |b| {
        let mut dst = HostImage::u16(0, 0);
        b.iter(|| {
            let mut params = ClaheParams::default();
            CpuVision.clahe(black_box(&src), &mut dst, &mut params)
        })
    });
    group.bench_function("unsharp_r2", |b| {
        let mut dst = HostImage::u16(0, 0);
        let params = UnsharpParams::new(2.0, 1.5, 4.0);
        b.iter(|| CpuVision.unsharp_mask(black_box(&src), &mut dst, &params))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_fast_pow,
    bench_kernel,
    bench_split,
    bench_vision
);
criterion_main!(benches);
