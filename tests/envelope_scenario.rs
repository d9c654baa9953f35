use std::thread;

use saavy_automation::{
    dsp::{EnvelopeGenerator, EnvelopeState, RampedParameter},
    graph::{EnvelopeNode, EnvelopeParam, GraphNode, RenderCtx},
    patch::EnvelopeSettings,
    synth::VoiceId,
};

const SAMPLE_RATE: f64 = 44_100.0;

fn seconds(s: f64) -> usize {
    (s * SAMPLE_RATE).round() as usize
}

#[test]
fn adsr_scenario_at_44k() {
    let mut env = EnvelopeGenerator::adsr(SAMPLE_RATE, 0.1, 0.1, 0.5, 0.2);

    env.trigger();
    env.advance(seconds(0.1));
    assert!((env.gain() - 1.0).abs() < 1e-9, "peak at 100 ms");

    env.advance(seconds(0.1));
    assert!((env.gain() - 0.5).abs() < 1e-9, "sustain at 200 ms");
    assert_eq!(env.state(), EnvelopeState::Sustain);

    env.release();
    env.advance(seconds(0.2));
    assert_eq!(env.gain(), 0.0);
    assert_eq!(env.state(), EnvelopeState::Idle);
}

#[test]
fn adsr_scenario_through_the_node() {
    let settings = EnvelopeSettings::adsr(0.1, 0.1, 0.5, 0.2);
    let (mut node, mut handle) = EnvelopeNode::new(&settings, SAMPLE_RATE);
    let ctx = RenderCtx::new(SAMPLE_RATE);

    handle.note_on(VoiceId(60)).unwrap();

    // 0.1 s = 4410 samples in host-sized blocks
    let mut block = vec![1.0f32; 441];
    for _ in 0..10 {
        block.fill(1.0);
        node.render_block(&mut block, &ctx);
    }
    assert!((block[440] - 1.0).abs() < 1e-6);

    for _ in 0..10 {
        block.fill(1.0);
        node.render_block(&mut block, &ctx);
    }
    assert!((block[440] - 0.5).abs() < 1e-6);

    handle.note_off(VoiceId(60)).unwrap();
    for _ in 0..20 {
        block.fill(1.0);
        node.render_block(&mut block, &ctx);
    }
    assert_eq!(block[440], 0.0);
    assert!(!node.is_active());
    assert!(!handle.is_active());
}

#[test]
fn ramp_lands_exactly_on_target() {
    for &(target, duration) in &[(0.0, 0.0), (1.0, 0.1), (-7.25, 0.05), (1e6, 1.0)] {
        let mut param = RampedParameter::new(0.3, SAMPLE_RATE);
        param.set_target(target, duration);

        let total = (duration * SAMPLE_RATE).round() as usize;
        let mut done = 0;
        while done < total {
            let block = (total - done).min(512);
            param.tick(block);
            done += block;
        }

        assert_eq!(param.current(), target, "target {target} over {duration}s");
    }
}

#[test]
fn unknown_voice_release_leaves_others_alone() {
    let settings = EnvelopeSettings::adsr(0.0, 0.0, 0.7, 0.1);
    let (mut node, _handle) = EnvelopeNode::new(&settings, SAMPLE_RATE);
    node.note_on(1u8);
    node.note_on(2u8);

    node.note_off(VoiceId(999));

    let mut block = vec![1.0f32; 64];
    node.process_in_place(&mut block);
    assert_eq!(node.voices().active_count(), 2);
    assert!(block.iter().all(|&s| (s - 0.7).abs() < 1e-6));
}

#[test]
fn control_thread_drives_audio_thread() {
    let settings = EnvelopeSettings::adsr(0.001, 0.001, 0.6, 0.001).with_ramp_time(0.0);
    let (mut node, mut handle) = EnvelopeNode::new(&settings, SAMPLE_RATE);

    let audio = thread::spawn(move || {
        let mut block = vec![1.0f32; 128];
        let mut peak_seen = 0.0f32;
        let ctx = RenderCtx::new(SAMPLE_RATE);

        // Render until the control side has played and released a note
        for _ in 0..1_000_000 {
            block.fill(1.0);
            node.render_block(&mut block, &ctx);
            peak_seen = block.iter().fold(peak_seen, |acc, &s| acc.max(s));
            if peak_seen > 0.0 && !node.is_active() {
                break;
            }
            thread::yield_now();
        }

        (node, peak_seen)
    });

    handle.set_param(EnvelopeParam::Sustain, 0.9, 0.0);
    handle.note_on(VoiceId(5)).unwrap();
    while !handle.is_active() && !audio.is_finished() {
        thread::yield_now();
    }
    handle.note_off(VoiceId(5)).unwrap();

    let (node, peak_seen) = audio.join().unwrap();
    assert!(peak_seen > 0.0);
    assert!(!node.is_active());
    assert_eq!(node.param(EnvelopeParam::Sustain), 0.9);
}

/// Render `samples` of a constant 1.0 input in 64-sample host blocks.
fn render_gain(node: &mut EnvelopeNode, samples: usize) -> Vec<f32> {
    let ctx = RenderCtx::new(SAMPLE_RATE);
    let mut out = Vec::with_capacity(samples);
    let mut block = [0.0f32; 64];

    while out.len() < samples {
        let len = (samples - out.len()).min(block.len());
        block[..len].fill(1.0);
        node.render_block(&mut block[..len], &ctx);
        out.extend_from_slice(&block[..len]);
    }
    out
}

/// Largest sample-to-sample move across `previous` followed by `gains`.
fn largest_step(previous: f32, gains: &[f32]) -> f32 {
    gains
        .iter()
        .scan(previous, |last, &g| {
            let step = (g - *last).abs();
            *last = g;
            Some(step)
        })
        .fold(0.0, f32::max)
}

#[test]
fn automating_stage_lengths_while_a_note_sounds_stays_smooth() {
    let settings = EnvelopeSettings::adsr(0.1, 0.1, 0.5, 0.2);
    let (mut node, mut handle) = EnvelopeNode::new(&settings, SAMPLE_RATE);
    handle.note_on(VoiceId(1)).unwrap();

    // Halfway up the attack, stretch it to a full second
    let head = render_gain(&mut node, seconds(0.05));
    let last = head[head.len() - 1];
    assert!((last - 0.5).abs() < 1e-3);

    handle.set_param_value(EnvelopeParam::Attack, 1.0);
    let attack = render_gain(&mut node, seconds(0.1));
    assert!(attack.windows(2).all(|w| w[1] >= w[0]), "attack kept rising");
    assert!(largest_step(last, &attack) <= 1.0 / seconds(1.0) as f32 + 1e-6);
    assert!(attack[attack.len() - 1] < 1.0);

    // Finish the attack, then shorten the decay halfway through it
    render_gain(&mut node, seconds(0.4));
    let decay_head = render_gain(&mut node, seconds(0.05));
    let last = decay_head[decay_head.len() - 1];
    assert!(last < 1.0 && last > 0.5);

    handle.set_param_value(EnvelopeParam::Decay, 0.02);
    let decay = render_gain(&mut node, seconds(0.005));
    assert!(decay.windows(2).all(|w| w[1] <= w[0]), "decay kept falling");
    assert!(largest_step(last, &decay) <= 0.5 / seconds(0.02) as f32 + 1e-6);

    let sustain = render_gain(&mut node, seconds(0.1));
    assert!(sustain.iter().rev().take(64).all(|&g| (g - 0.5).abs() < 1e-6));

    // Release, then lengthen it midway
    handle.note_off(VoiceId(1)).unwrap();
    let release_head = render_gain(&mut node, seconds(0.1));
    let last = release_head[release_head.len() - 1];
    assert!((last - 0.25).abs() < 1e-3);

    handle.set_param_value(EnvelopeParam::Release, 2.0);
    let release = render_gain(&mut node, seconds(0.1));
    assert!(release.windows(2).all(|w| w[1] <= w[0]), "release kept falling");
    assert!(largest_step(last, &release) <= 0.5 / seconds(2.0) as f32 + 1e-6);
    assert!(handle.is_active());
}
