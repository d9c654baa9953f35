use crate::dsp::{clamp_duration, sanitize_sample_rate, LENGTH_EPSILON};

/*
Parameter Ramping
=================

Changing a control value instantly (gain 0.2 -> 0.8 between two samples)
puts a step into the signal. A step contains energy at every frequency, so
the ear hears it as a click. Ramping spreads the change over a short time.

Vocabulary
----------

  current     The value the audio path uses right now.

  target      Where the value is heading. Set from the control context.

  start       Snapshot of `current` when the target was set. The ramp is a
              straight line from `start` to `target`.

  ramp time   Seconds the line takes. Zero means jump immediately.

  elapsed     Samples processed since the target was set.


The Math
--------

    length   = ramp_seconds * sample_rate        (in samples)
    progress = elapsed / length                  (0.0 .. 1.0)
    current  = start + (target - start) * progress

Once `elapsed >= length` we stop interpolating and assign `target` directly.
Interpolation accumulates rounding error; assignment does not, so the value
lands on the target bit-for-bit.


Block Rate
----------

The ramp advances once per audio block (`tick(block_len)`), not per sample.
At 48 kHz with 64-sample blocks that is 750 updates per second, far above
what is needed for smooth control changes.


Retargeting
-----------

Setting a new target mid-ramp snapshots the current value as the new start.
The value never jumps and never leaves [min(start, target), max(start, target)]
for the ramp in flight, so repeated retargets cannot oscillate.
*/

#[derive(Debug, Clone)]
pub struct RampedParameter {
    current: f64,
    target: f64,
    start: f64,
    ramp_seconds: f64,
    sample_rate: f64,
    elapsed_samples: u64,
}

impl RampedParameter {
    pub fn new(value: f64, sample_rate: f64) -> Self {
        let value = if value.is_finite() { value } else { 0.0 };

        Self {
            current: value,
            target: value,
            start: value,
            ramp_seconds: 0.0,
            sample_rate: sanitize_sample_rate(sample_rate),
            elapsed_samples: 0,
        }
    }

    /// Start a ramp from the current value toward `value`.
    ///
    /// Negative durations are clamped to zero (an immediate jump). Non-finite
    /// values are ignored.
    pub fn set_target(&mut self, value: f64, ramp_seconds: f64) {
        if !value.is_finite() {
            return;
        }

        self.start = self.current;
        self.target = value;
        self.ramp_seconds = clamp_duration(ramp_seconds);
        self.elapsed_samples = 0;

        if self.ramp_len() <= LENGTH_EPSILON {
            self.current = value;
        }
    }

    /// Jump straight to `value`, cancelling any ramp in flight.
    pub fn jump_to(&mut self, value: f64) {
        self.set_target(value, 0.0);
    }

    /// Advance by `sample_count` samples and return the new current value.
    pub fn tick(&mut self, sample_count: usize) -> f64 {
        if !self.is_ramping() {
            return self.current;
        }

        self.elapsed_samples = self.elapsed_samples.saturating_add(sample_count as u64);

        let length = self.ramp_len();
        if self.elapsed_samples as f64 + LENGTH_EPSILON >= length {
            self.current = self.target;
        } else {
            let progress = self.elapsed_samples as f64 / length;
            let value = self.start + (self.target - self.start) * progress;
            let (low, high) = if self.start <= self.target {
                (self.start, self.target)
            } else {
                (self.target, self.start)
            };
            self.current = value.clamp(low, high);
        }

        self.current
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn is_ramping(&self) -> bool {
        self.current != self.target
    }

    /// Change the sample rate, keeping the progress of a ramp in flight.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        let sample_rate = sanitize_sample_rate(sample_rate);
        if sample_rate == self.sample_rate {
            return;
        }

        let scale = sample_rate / self.sample_rate;
        self.elapsed_samples = (self.elapsed_samples as f64 * scale).round() as u64;
        self.sample_rate = sample_rate;
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn ramp_len(&self) -> f64 {
        self.ramp_seconds * self.sample_rate
    }
}
