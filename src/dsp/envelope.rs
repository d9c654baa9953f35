use crate::dsp::{clamp_duration, sanitize_sample_rate, LENGTH_EPSILON};

/*
ADSR Envelope Generator
=======================

A linear ADSR envelope: the gain curve that shapes a note's loudness over
time. One generator runs per voice.

Vocabulary
----------

  gain        The envelope's output (0.0 to 1.0). Multiplies the audio signal.

  stage       Which phase we're in: Idle, Attack, Decay, Sustain or Release.

  trigger     Note on. Starts Attack from wherever the gain currently is.

  release     Note off. Starts Release from wherever the gain currently is.

  peak        The level Attack climbs to. 1.0 unless the caller scales it by
              velocity.


The Shape
---------

  Gain
    1.0 ┐     ╱╲
        │    ╱  ╲___________
    S   │   ╱               ╲
        │  ╱                 ╲
    0.0 └─╱───────────────────╲──→ Time
        Attack Decay  Sustain  Release


Stage Interpolation
-------------------

Every timed stage is a straight line between two levels:

    progress = clamp(elapsed_in_stage / stage_length, 0, 1)
    gain     = start_level + (stage_target - start_level) * progress

  stage     start_level               stage_target     length
  Attack    gain at trigger()         peak             attack
  Decay     peak                      sustain * peak   decay
  Release   gain at release()         0.0              release

Sustain holds `sustain * peak` until release. Idle outputs 0.0.

Interpolating from a snapshot (rather than adding a per-sample increment)
means the stage ends exactly on its target level, and a retrigger never
snaps: if Decay has fallen to 0.6, the new Attack rises from 0.6.


The State Machine
-----------------

    ┌──────┐  trigger  ┌────────┐  done   ┌───────┐  done   ┌─────────┐
    │ Idle │ ────────→ │ Attack │ ──────→ │ Decay │ ──────→ │ Sustain │
    └──────┘           └────────┘         └───────┘         └─────────┘
        ↑                  │ release          │ release          │ release
        │  done        ┌─────────┐            │                  │
        └───────────── │ Release │ ←──────────┴──────────────────┘
                       └─────────┘

trigger() is accepted from every stage (including Release and Idle).
release() is ignored in Idle and Release.


Zero-Length Stages
------------------

A stage of length zero completes the moment it is reached, inside the same
`advance` call, and leftover samples flow into the next stage. There is no
division by zero and no stage that holds forever.


Live Shape Changes
------------------

Stage lengths are automated while notes sound. A running stage keeps its
progress when its length changes:

    elapsed_in_stage *= new_length / old_length

so `progress`, and with it the gain, is the same before and after the
change. Only the slope of the remaining part changes. Attack never dips and
Release never jumps to silence because a knob moved.
*/

/// The current stage of the envelope state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Idle,    // Inactive, gain = 0
    Attack,  // Rising toward peak
    Decay,   // Falling from peak toward sustain
    Sustain, // Holding until release
    Release, // Falling toward 0
}

#[derive(Debug, Clone)]
pub struct EnvelopeGenerator {
    // Shape (seconds and level)
    attack: f64,
    decay: f64,
    sustain: f64,
    release: f64,
    sample_rate: f64,

    // Runtime state
    state: EnvelopeState,
    gain: f64,
    peak: f64,
    level_at_stage_start: f64,
    elapsed_in_stage: f64, // samples
}

impl EnvelopeGenerator {
    /// 100 ms attack, decay and release with full sustain.
    pub fn new(sample_rate: f64) -> Self {
        Self::adsr(sample_rate, 0.1, 0.1, 1.0, 0.1)
    }

    pub fn adsr(sample_rate: f64, attack: f64, decay: f64, sustain: f64, release: f64) -> Self {
        let mut env = Self {
            attack: 0.0,
            decay: 0.0,
            sustain: 1.0,
            release: 0.0,
            sample_rate: sanitize_sample_rate(sample_rate),

            state: EnvelopeState::Idle,
            gain: 0.0,
            peak: 1.0,
            level_at_stage_start: 0.0,
            elapsed_in_stage: 0.0,
        };
        env.set_shape(attack, decay, sustain, release);
        env
    }

    /// Update the ADSR shape. Takes effect immediately, including for the
    /// stage in flight.
    ///
    /// A stage in flight keeps its progress: the part still to go is played
    /// over the new length, so the gain does not jump.
    pub fn set_shape(&mut self, attack: f64, decay: f64, sustain: f64, release: f64) {
        let old_len = self.stage_len();

        self.attack = clamp_duration(attack);
        self.decay = clamp_duration(decay);
        self.sustain = if sustain.is_nan() {
            self.sustain
        } else {
            sustain.clamp(0.0, 1.0)
        };
        self.release = clamp_duration(release);

        if let (Some(old), Some(new)) = (old_len, self.stage_len()) {
            if old > LENGTH_EPSILON && new != old {
                self.elapsed_in_stage *= new / old;
            }
        }
    }

    /// Change the sample rate, keeping the progress of the current stage.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        let sample_rate = sanitize_sample_rate(sample_rate);
        self.elapsed_in_stage *= sample_rate / self.sample_rate;
        self.sample_rate = sample_rate;
    }

    /// Note on: attack toward full level from the current gain.
    pub fn trigger(&mut self) {
        self.trigger_with_peak(1.0);
    }

    /// Note on with a scaled attack level (e.g. from velocity).
    pub fn trigger_with_peak(&mut self, peak: f64) {
        self.peak = if peak.is_finite() {
            peak.clamp(0.0, 1.0)
        } else {
            1.0
        };
        self.enter(EnvelopeState::Attack);
    }

    /// Note off: release from the current gain. Ignored when Idle or
    /// already releasing.
    pub fn release(&mut self) {
        if matches!(
            self.state,
            EnvelopeState::Attack | EnvelopeState::Decay | EnvelopeState::Sustain
        ) {
            self.enter(EnvelopeState::Release);
        }
    }

    /// Advance by `samples` samples and return the gain at the end.
    pub fn advance(&mut self, samples: usize) -> f64 {
        let mut remaining = samples as f64;

        while let Some(length) = self.stage_len() {
            let left = (length - self.elapsed_in_stage).max(0.0);
            if remaining + LENGTH_EPSILON >= left {
                remaining = (remaining - left).max(0.0);
                self.complete_stage();
            } else {
                self.elapsed_in_stage += remaining;
                break;
            }
        }

        self.gain = self.stage_gain();
        self.gain
    }

    /// Advance by one sample.
    #[inline]
    pub fn next_sample(&mut self) -> f64 {
        self.advance(1)
    }

    /// Render a block of per-sample gains into the buffer.
    pub fn render(&mut self, buffer: &mut [f64]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample();
        }
    }

    /// Force the generator back to Idle with zero gain.
    pub fn reset(&mut self) {
        self.state = EnvelopeState::Idle;
        self.gain = 0.0;
        self.peak = 1.0;
        self.level_at_stage_start = 0.0;
        self.elapsed_in_stage = 0.0;
    }

    pub fn is_active(&self) -> bool {
        self.state != EnvelopeState::Idle
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    fn enter(&mut self, state: EnvelopeState) {
        self.level_at_stage_start = self.gain;
        self.elapsed_in_stage = 0.0;
        self.state = state;
    }

    fn complete_stage(&mut self) {
        self.gain = self.stage_target();
        let next = match self.state {
            EnvelopeState::Attack => EnvelopeState::Decay,
            EnvelopeState::Decay => EnvelopeState::Sustain,
            EnvelopeState::Release => EnvelopeState::Idle,
            other => other,
        };
        self.enter(next);
    }

    /// Length in samples of a timed stage; `None` for Idle and Sustain.
    fn stage_len(&self) -> Option<f64> {
        let seconds = match self.state {
            EnvelopeState::Attack => self.attack,
            EnvelopeState::Decay => self.decay,
            EnvelopeState::Release => self.release,
            EnvelopeState::Idle | EnvelopeState::Sustain => return None,
        };
        Some(seconds * self.sample_rate)
    }

    fn stage_target(&self) -> f64 {
        match self.state {
            EnvelopeState::Attack => self.peak,
            EnvelopeState::Decay | EnvelopeState::Sustain => self.sustain * self.peak,
            EnvelopeState::Release | EnvelopeState::Idle => 0.0,
        }
    }

    fn stage_gain(&self) -> f64 {
        let gain = match self.state {
            EnvelopeState::Idle => 0.0,
            EnvelopeState::Sustain => self.sustain * self.peak,
            EnvelopeState::Attack | EnvelopeState::Decay | EnvelopeState::Release => {
                let length = self.stage_len().unwrap_or(0.0);
                let progress = if length <= LENGTH_EPSILON {
                    1.0
                } else {
                    (self.elapsed_in_stage / length).clamp(0.0, 1.0)
                };
                let start = self.level_at_stage_start;
                start + (self.stage_target() - start) * progress
            }
        };

        gain.clamp(0.0, 1.0)
    }
}
