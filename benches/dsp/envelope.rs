//! Benchmarks for ADSR envelope generator.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_automation::dsp::EnvelopeGenerator;

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f64 = 48_000.0;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f64; size];

        // Attack phase (ramping up)
        let mut env = EnvelopeGenerator::adsr(SAMPLE_RATE, 10.0, 0.1, 0.7, 0.3);
        env.trigger();
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer));
            })
        });

        // Sustain phase (holding steady)
        let mut env = EnvelopeGenerator::adsr(SAMPLE_RATE, 0.001, 0.001, 0.7, 0.3);
        env.trigger();
        env.advance(200);
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer));
            })
        });

        // Block-rate stepping, one call per block
        let mut env = EnvelopeGenerator::adsr(SAMPLE_RATE, 10.0, 0.1, 0.7, 0.3);
        env.trigger();
        group.bench_with_input(BenchmarkId::new("advance", size), &size, |b, &size| {
            b.iter(|| black_box(env.advance(black_box(size))))
        });
    }

    group.finish();
}
