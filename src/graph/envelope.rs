use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use rtrb::{Consumer, Producer, RingBuffer};

use crate::{
    dsp::sanitize_sample_rate,
    error::{AutomationError, Result},
    graph::node::{GraphNode, RenderCtx},
    params::{ParamId, ParamSpec, ParameterBus, ParameterHandle},
    patch::{velocity_peak, EnvelopeSettings, GainMix},
    synth::{EnvelopeMessage, NodeEvent, VoiceId, VoicePool},
    COMMAND_QUEUE_SIZE, EVENT_QUEUE_SIZE, MAX_BLOCK_SIZE,
};

/*
Envelope Node
=============

Applies an ADSR amplitude envelope to an input signal, one envelope per
voice.

    input ──→ × ──→ output
              ↑
         mixed gain  ←── voice 0 envelope
                     ←── voice 1 envelope
                     ←── ...

Two contexts touch a node:

  control   UI, sequencer or MIDI thread. Holds the EnvelopeHandle: sets
            parameter targets, queues note events, reads status back.

  audio     The host's render callback. Owns the EnvelopeNode and calls
            render_block/process once per block.

Per block, in order:

  1. Drain queued note events (note on/off, all notes off, start/stop).
  2. Tick the parameter bus once: new targets picked up, ramps advanced.
  3. Copy the ramped ADSR values into every voice's envelope.
  4. Render each sounding voice's gain per sample and mix them (GainMix).
  5. Multiply the input by the mixed gain.
  6. Publish status and push engine events back to the control context.

Nothing in this path locks, allocates, or logs. Queue overflow drops the
message; a bad block (mismatched lengths, non-finite gain) passes input
through unchanged.


Bypass
------

A stopped node passes input through untouched and freezes its envelopes.
Parameters keep ramping, so values are current when the node starts again.
*/

/// Longest accepted attack, decay or release time in seconds.
pub const MAX_STAGE_SECONDS: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeParam {
    Attack,
    Decay,
    Sustain,
    Release,
}

impl EnvelopeParam {
    pub const ALL: [EnvelopeParam; 4] = [
        EnvelopeParam::Attack,
        EnvelopeParam::Decay,
        EnvelopeParam::Sustain,
        EnvelopeParam::Release,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EnvelopeParam::Attack => "attack_duration",
            EnvelopeParam::Decay => "decay_duration",
            EnvelopeParam::Sustain => "sustain_level",
            EnvelopeParam::Release => "release_duration",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Position on every envelope node's parameter bus.
    pub fn id(self) -> ParamId {
        ParamId::new(self as usize)
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn spec(self, default: f64) -> ParamSpec {
        let max = match self {
            EnvelopeParam::Sustain => 1.0,
            _ => MAX_STAGE_SECONDS,
        };
        let default = if default.is_finite() { default } else { 0.0 };
        ParamSpec::new(self.name(), 0.0, max, default.clamp(0.0, max))
    }

    /// The value `settings` configures for this parameter.
    pub fn configured(self, settings: &EnvelopeSettings) -> f64 {
        match self {
            EnvelopeParam::Attack => settings.attack_duration,
            EnvelopeParam::Decay => settings.decay_duration,
            EnvelopeParam::Sustain => settings.sustain_level,
            EnvelopeParam::Release => settings.release_duration,
        }
    }

    pub(crate) fn configure(self, settings: &mut EnvelopeSettings, value: f64) {
        match self {
            EnvelopeParam::Attack => settings.attack_duration = value,
            EnvelopeParam::Decay => settings.decay_duration = value,
            EnvelopeParam::Sustain => settings.sustain_level = value,
            EnvelopeParam::Release => settings.release_duration = value,
        }
    }
}

fn param_specs(settings: &EnvelopeSettings) -> [ParamSpec; 4] {
    EnvelopeParam::ALL.map(|p| p.spec(p.configured(settings)))
}

/// Status mirrored from the audio context for lock-free readback.
#[derive(Debug, Default)]
struct NodeStatus {
    active: AtomicBool,
    started: AtomicBool,
    active_voices: AtomicUsize,
}

pub struct EnvelopeNode {
    params: ParameterBus,
    voices: VoicePool,
    gain_mix: GainMix,
    velocity_sensitivity: f64,
    sample_rate: f64,
    started: bool,
    was_active: bool,
    gain_buffer: Vec<f64>,
    voice_buffer: Vec<f64>,
    rx: Consumer<EnvelopeMessage>,
    events: Producer<NodeEvent>,
    status: Arc<NodeStatus>,
}

/// Control-side handle for an [`EnvelopeNode`].
pub struct EnvelopeHandle {
    tx: Producer<EnvelopeMessage>,
    events: Consumer<NodeEvent>,
    params: ParameterHandle,
    status: Arc<NodeStatus>,
}

impl EnvelopeNode {
    pub fn new(settings: &EnvelopeSettings, sample_rate: f64) -> (Self, EnvelopeHandle) {
        let sample_rate = sanitize_sample_rate(sample_rate);
        let (params, mut param_handle) = ParameterBus::new(&param_specs(settings), sample_rate);
        param_handle.set_ramp_time(settings.ramp_time);

        let voices = VoicePool::new(settings.max_voices, sample_rate);
        let (tx, rx) = RingBuffer::<EnvelopeMessage>::new(COMMAND_QUEUE_SIZE);
        let (event_tx, event_rx) = RingBuffer::<NodeEvent>::new(EVENT_QUEUE_SIZE);

        let status = Arc::new(NodeStatus {
            started: AtomicBool::new(true),
            ..NodeStatus::default()
        });

        tracing::debug!(
            sample_rate,
            max_voices = voices.capacity(),
            gain_mix = ?settings.gain_mix,
            "envelope node created"
        );

        let mut node = Self {
            params,
            voices,
            gain_mix: settings.gain_mix,
            velocity_sensitivity: settings.velocity_sensitivity,
            sample_rate,
            started: true,
            was_active: false,
            gain_buffer: vec![0.0; MAX_BLOCK_SIZE],
            voice_buffer: vec![0.0; MAX_BLOCK_SIZE],
            rx,
            events: event_tx,
            status: Arc::clone(&status),
        };
        node.apply_shape();

        let handle = EnvelopeHandle {
            tx,
            events: event_rx,
            params: param_handle,
            status,
        };

        (node, handle)
    }

    /// Trigger `voice` at full velocity, starting it if it isn't sounding.
    pub fn note_on(&mut self, voice: impl Into<VoiceId>) {
        self.note_on_with_velocity(voice, 127);
    }

    /// Velocity 0 is treated as a note off, the way MIDI senders use it.
    pub fn note_on_with_velocity(&mut self, voice: impl Into<VoiceId>, velocity: u8) {
        let voice = voice.into();
        if velocity == 0 {
            self.note_off(voice);
            return;
        }

        let peak = velocity_peak(self.velocity_sensitivity, velocity);
        self.voices.note_on(voice, peak);
    }

    /// Release `voice`. Unknown or already released voices are ignored.
    pub fn note_off(&mut self, voice: impl Into<VoiceId>) {
        self.voices.note_off(voice.into());
    }

    /// Release every sounding voice (each fades out over the release time).
    pub fn all_notes_off(&mut self) {
        self.voices.release_all();
    }

    pub fn start(&mut self) {
        self.started = true;
    }

    pub fn stop(&mut self) {
        self.started = false;
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// True while any voice is outside Idle.
    pub fn is_active(&self) -> bool {
        self.voices.is_active()
    }

    pub fn params(&self) -> &ParameterBus {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut ParameterBus {
        &mut self.params
    }

    /// Current (ramped) value of an envelope parameter.
    pub fn param(&self, param: EnvelopeParam) -> f64 {
        self.params.value(param.id())
    }

    pub fn voices(&self) -> &VoicePool {
        &self.voices
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        let sample_rate = sanitize_sample_rate(sample_rate);
        if sample_rate == self.sample_rate {
            return;
        }
        self.sample_rate = sample_rate;
        self.params.set_sample_rate(sample_rate);
        self.voices.set_sample_rate(sample_rate);
    }

    /// Apply the envelope to `input`, writing the result to `output`.
    ///
    /// Buffers of different lengths are copied through unprocessed. Queued
    /// commands, ramps and envelopes still advance by the copied length.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        if input.len() != output.len() {
            let len = input.len().min(output.len());
            output[..len].copy_from_slice(&input[..len]);
            output[len..].fill(0.0);

            self.drain_messages();
            let mut remaining = len;
            while remaining > 0 {
                let samples = remaining.min(MAX_BLOCK_SIZE);
                self.advance_block(samples);
                remaining -= samples;
            }
            self.publish_status();
            return;
        }

        output.copy_from_slice(input);
        self.process_in_place(output);
    }

    /// Apply the envelope to `buffer` in place.
    pub fn process_in_place(&mut self, buffer: &mut [f32]) {
        self.drain_messages();

        for block in buffer.chunks_mut(MAX_BLOCK_SIZE) {
            self.process_block(block);
        }

        self.publish_status();
    }

    fn drain_messages(&mut self) {
        while let Ok(msg) = self.rx.pop() {
            match msg {
                EnvelopeMessage::NoteOn { voice, velocity } => {
                    self.note_on_with_velocity(voice, velocity)
                }
                EnvelopeMessage::NoteOff { voice } => self.note_off(voice),
                EnvelopeMessage::AllNotesOff => self.all_notes_off(),
                EnvelopeMessage::Start => self.start(),
                EnvelopeMessage::Stop => self.stop(),
            }
        }
    }

    fn process_block(&mut self, block: &mut [f32]) {
        if !self.advance_block(block.len()) {
            return;
        }

        // Non-finite gain leaves the sample untouched
        for (sample, &gain) in block.iter_mut().zip(self.gain_buffer.iter()) {
            if gain.is_finite() {
                *sample = (f64::from(*sample) * gain.clamp(0.0, 1.0)) as f32;
            }
        }
    }

    /// Move parameters and voices forward by `len` samples, leaving the
    /// mixed gains in `gain_buffer`. Returns false while bypassed.
    fn advance_block(&mut self, len: usize) -> bool {
        self.params.tick(len);
        for (id, value) in self.params.settled() {
            let _ = self.events.push(NodeEvent::ParameterSettled { id, value });
        }

        if !self.started {
            return false;
        }

        self.apply_shape();

        let gain_mix = self.gain_mix;
        let gains = &mut self.gain_buffer[..len];
        let scratch = &mut self.voice_buffer[..len];
        gains.fill(0.0);

        for voice in self.voices.iter_mut() {
            if voice.is_free() {
                continue;
            }

            voice.render(scratch);
            for (g, &v) in gains.iter_mut().zip(scratch.iter()) {
                *g = gain_mix.combine(*g, v);
            }

            if voice.is_free() {
                if let Some(id) = voice.id() {
                    let _ = self.events.push(NodeEvent::VoiceFinished { voice: id });
                }
            }
        }

        true
    }

    fn apply_shape(&mut self) {
        let attack = self.param(EnvelopeParam::Attack);
        let decay = self.param(EnvelopeParam::Decay);
        let sustain = self.param(EnvelopeParam::Sustain);
        let release = self.param(EnvelopeParam::Release);
        self.voices.set_shape(attack, decay, sustain, release);
    }

    fn publish_status(&mut self) {
        let active = self.voices.is_active();
        if active != self.was_active {
            self.was_active = active;
            let _ = self.events.push(NodeEvent::ActivityChanged { active });
        }

        self.status.active.store(active, Ordering::Relaxed);
        self.status.started.store(self.started, Ordering::Relaxed);
        self.status
            .active_voices
            .store(self.voices.active_count(), Ordering::Relaxed);
    }
}

impl GraphNode for EnvelopeNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.set_sample_rate(ctx.sample_rate);
        self.process_in_place(out);
    }

    fn is_active(&self) -> bool {
        EnvelopeNode::is_active(self)
    }
}

impl EnvelopeHandle {
    pub fn note_on(&mut self, voice: impl Into<VoiceId>) -> Result<()> {
        self.note_on_with_velocity(voice, 127)
    }

    pub fn note_on_with_velocity(&mut self, voice: impl Into<VoiceId>, velocity: u8) -> Result<()> {
        self.send(EnvelopeMessage::NoteOn {
            voice: voice.into(),
            velocity,
        })
    }

    pub fn note_off(&mut self, voice: impl Into<VoiceId>) -> Result<()> {
        self.send(EnvelopeMessage::NoteOff {
            voice: voice.into(),
        })
    }

    pub fn all_notes_off(&mut self) -> Result<()> {
        self.send(EnvelopeMessage::AllNotesOff)
    }

    pub fn start(&mut self) -> Result<()> {
        self.send(EnvelopeMessage::Start)
    }

    pub fn stop(&mut self) -> Result<()> {
        self.send(EnvelopeMessage::Stop)
    }

    fn send(&mut self, msg: EnvelopeMessage) -> Result<()> {
        self.tx.push(msg).map_err(|_| {
            tracing::warn!(?msg, "envelope command queue full, dropping message");
            AutomationError::QueueFull
        })
    }

    /// Ramp an envelope parameter to `value` over `ramp_seconds`.
    pub fn set_param(&mut self, param: EnvelopeParam, value: f64, ramp_seconds: f64) {
        self.params.set_by_id(param.id(), value, ramp_seconds);
    }

    /// Ramp an envelope parameter using the default ramp time.
    pub fn set_param_value(&mut self, param: EnvelopeParam, value: f64) {
        let ramp_seconds = self.params.ramp_time();
        self.params.set_by_id(param.id(), value, ramp_seconds);
    }

    pub fn set(&mut self, name: &str, value: f64, ramp_seconds: f64) -> Result<()> {
        self.params.set(name, value, ramp_seconds)
    }

    /// Last value the audio context published for `name`.
    pub fn get(&self, name: &str) -> Result<f64> {
        self.params.get(name)
    }

    pub fn param(&self, param: EnvelopeParam) -> f64 {
        self.params.value(param.id())
    }

    pub fn params(&self) -> &ParameterHandle {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut ParameterHandle {
        &mut self.params
    }

    /// True while any voice is sounding, as of the last processed block.
    pub fn is_active(&self) -> bool {
        self.status.active.load(Ordering::Relaxed)
    }

    pub fn is_started(&self) -> bool {
        self.status.started.load(Ordering::Relaxed)
    }

    pub fn active_voices(&self) -> usize {
        self.status.active_voices.load(Ordering::Relaxed)
    }

    /// Next event pushed by the audio context, if any.
    pub fn pop_event(&mut self) -> Option<NodeEvent> {
        self.events.pop().ok()
    }
}
