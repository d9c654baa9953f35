//! Configuration for envelope nodes.
//!
//! Settings are plain data: build them in code, or load them from a preset
//! file with the `serde` feature enabled. Missing fields fall back to
//! [`EnvelopeSettings::default`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{DEFAULT_MAX_VOICES, DEFAULT_RAMP_TIME};

/// How the gains of simultaneous voices combine into one multiplier.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GainMix {
    /// Loudest voice wins. A single voice passes straight through.
    #[default]
    Max,
    /// Voices add up, clamped to 1.0.
    Sum,
}

impl GainMix {
    #[inline]
    pub fn combine(self, acc: f64, gain: f64) -> f64 {
        match self {
            GainMix::Max => acc.max(gain),
            GainMix::Sum => acc + gain,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeSettings {
    /// Seconds from trigger to peak.
    pub attack_duration: f64,
    /// Seconds from peak to sustain level.
    pub decay_duration: f64,
    /// Level held while the note is down (0.0 - 1.0).
    pub sustain_level: f64,
    /// Seconds from note-off to silence.
    pub release_duration: f64,
    /// Seconds a parameter change takes to glide to its new value.
    pub ramp_time: f64,
    pub max_voices: usize,
    pub gain_mix: GainMix,
    /// How much note velocity scales the attack peak (0.0 = ignored).
    pub velocity_sensitivity: f64,
}

impl Default for EnvelopeSettings {
    fn default() -> Self {
        Self {
            attack_duration: 0.1,
            decay_duration: 0.1,
            sustain_level: 1.0,
            release_duration: 0.1,
            ramp_time: DEFAULT_RAMP_TIME,
            max_voices: DEFAULT_MAX_VOICES,
            gain_mix: GainMix::Max,
            velocity_sensitivity: 0.0,
        }
    }
}

impl EnvelopeSettings {
    pub fn adsr(attack: f64, decay: f64, sustain: f64, release: f64) -> Self {
        Self {
            attack_duration: attack,
            decay_duration: decay,
            sustain_level: sustain,
            release_duration: release,
            ..Self::default()
        }
    }

    pub fn with_ramp_time(mut self, seconds: f64) -> Self {
        self.ramp_time = seconds;
        self
    }

    pub fn with_max_voices(mut self, max_voices: usize) -> Self {
        self.max_voices = max_voices;
        self
    }

    pub fn with_gain_mix(mut self, gain_mix: GainMix) -> Self {
        self.gain_mix = gain_mix;
        self
    }

    pub fn with_velocity_sensitivity(mut self, amount: f64) -> Self {
        self.velocity_sensitivity = amount;
        self
    }

    /// Attack peak for a MIDI velocity under these settings.
    pub fn peak_for_velocity(&self, velocity: u8) -> f64 {
        velocity_peak(self.velocity_sensitivity, velocity)
    }
}

/// Attack peak for a MIDI velocity: 1.0 at zero sensitivity, velocity/127 at
/// full sensitivity.
pub fn velocity_peak(sensitivity: f64, velocity: u8) -> f64 {
    let sensitivity = if sensitivity.is_finite() {
        sensitivity.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let normalized = f64::from(velocity.min(127)) / 127.0;
    1.0 - sensitivity + sensitivity * normalized
}
