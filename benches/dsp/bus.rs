//! Benchmarks for the parameter bus with a live control handle.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_automation::params::{ParamSpec, ParameterBus};

use crate::BLOCK_SIZES;

const SPECS: [ParamSpec; 8] = [
    ParamSpec::new("p0", 0.0, 1.0, 0.5),
    ParamSpec::new("p1", 0.0, 1.0, 0.5),
    ParamSpec::new("p2", 0.0, 1.0, 0.5),
    ParamSpec::new("p3", 0.0, 1.0, 0.5),
    ParamSpec::new("p4", 0.0, 1.0, 0.5),
    ParamSpec::new("p5", 0.0, 1.0, 0.5),
    ParamSpec::new("p6", 0.0, 1.0, 0.5),
    ParamSpec::new("p7", 0.0, 1.0, 0.5),
];

pub fn bench_bus(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/bus");

    for &size in BLOCK_SIZES {
        let (mut bus, _handle) = ParameterBus::new(&SPECS, 48_000.0);
        group.bench_with_input(BenchmarkId::new("idle_tick", size), &size, |b, &size| {
            b.iter(|| bus.tick(black_box(size)))
        });

        // A new target on every block, as with a knob being dragged
        let (mut bus, mut handle) = ParameterBus::new(&SPECS, 48_000.0);
        let ids: Vec<_> = SPECS.iter().map(|s| handle.id(s.name).unwrap()).collect();
        let mut value = 0.0;
        group.bench_with_input(BenchmarkId::new("automated_tick", size), &size, |b, &size| {
            b.iter(|| {
                value = if value > 0.5 { 0.0 } else { 1.0 };
                for &id in &ids {
                    handle.set_by_id(id, value, 0.01);
                }
                bus.tick(black_box(size));
            })
        });
    }

    group.finish();
}
