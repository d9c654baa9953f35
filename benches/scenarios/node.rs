//! Benchmarks for complete envelope node processing.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_automation::{
    graph::{EnvelopeNode, EnvelopeParam, GraphNode, RenderCtx},
    patch::{EnvelopeSettings, GainMix},
};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f64 = 48_000.0;

pub fn bench_node(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/node");
    let ctx = RenderCtx::new(SAMPLE_RATE);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.5f32; size];

        // === SINGLE VOICE ===
        // Baseline: one held note, nothing changing
        let settings = EnvelopeSettings::adsr(0.01, 0.1, 0.6, 0.2);
        let (mut mono, _handle) = EnvelopeNode::new(&settings, SAMPLE_RATE);
        mono.note_on(60u8);
        group.bench_with_input(BenchmarkId::new("single_voice", size), &size, |b, _| {
            b.iter(|| {
                mono.render_block(black_box(&mut buffer), black_box(&ctx));
            })
        });

        // === FULL CHORD ===
        // Every voice sounding, summed
        let settings = EnvelopeSettings::adsr(0.5, 0.5, 0.6, 0.5)
            .with_max_voices(16)
            .with_gain_mix(GainMix::Sum);
        let (mut poly, _handle) = EnvelopeNode::new(&settings, SAMPLE_RATE);
        for note in 48u8..64 {
            poly.note_on(note);
        }
        group.bench_with_input(BenchmarkId::new("sixteen_voices", size), &size, |b, _| {
            b.iter(|| {
                poly.render_block(black_box(&mut buffer), black_box(&ctx));
            })
        });

        // === LIVE AUTOMATION ===
        // Notes and parameter changes arriving through the handle every block
        let settings = EnvelopeSettings::adsr(0.005, 0.05, 0.6, 0.05).with_max_voices(8);
        let (mut live, mut handle) = EnvelopeNode::new(&settings, SAMPLE_RATE);
        let mut note = 0u8;
        group.bench_with_input(BenchmarkId::new("live_automation", size), &size, |b, _| {
            b.iter(|| {
                note = (note + 1) % 12;
                let _ = handle.note_on(48 + note);
                let _ = handle.note_off(48 + (note + 6) % 12);
                handle.set_param(EnvelopeParam::Sustain, f64::from(note) / 12.0, 0.01);
                live.render_block(black_box(&mut buffer), black_box(&ctx));
                while handle.pop_event().is_some() {}
            })
        });
    }

    group.finish();
}
