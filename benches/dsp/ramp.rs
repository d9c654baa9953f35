//! Benchmarks for ramped parameters.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_automation::dsp::RampedParameter;

use crate::BLOCK_SIZES;

pub fn bench_ramp(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/ramp");

    for &size in BLOCK_SIZES {
        // Long ramp so every iteration interpolates
        let mut param = RampedParameter::new(0.0, 48_000.0);
        param.set_target(1.0, 1.0e6);
        group.bench_with_input(BenchmarkId::new("ramping", size), &size, |b, &size| {
            b.iter(|| black_box(param.tick(black_box(size))))
        });

        // Settled: the common case
        let mut param = RampedParameter::new(0.5, 48_000.0);
        group.bench_with_input(BenchmarkId::new("settled", size), &size, |b, &size| {
            b.iter(|| black_box(param.tick(black_box(size))))
        });
    }

    group.finish();
}
