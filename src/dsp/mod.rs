//! Low-level control-signal primitives used by the graph nodes.
//!
//! These components are allocation-free and realtime-safe, making them safe to
//! embed directly inside voice structs. They stay focused on the ramp and
//! envelope math so the node layer can handle queues, voices and mixing.

/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// Linear parameter ramp (click-free value changes).
pub mod ramp;

pub use envelope::{EnvelopeGenerator, EnvelopeState};
pub use ramp::RampedParameter;

/// Slack used when comparing elapsed samples against a stage or ramp length.
///
/// `seconds * sample_rate` rarely lands on an exact integer in binary floating
/// point, so a ramp that has run for exactly its length must still complete.
pub(crate) const LENGTH_EPSILON: f64 = 1e-9;

/// Negative or NaN durations mean "no ramp".
#[inline]
pub(crate) fn clamp_duration(seconds: f64) -> f64 {
    if seconds.is_nan() || seconds < 0.0 {
        0.0
    } else {
        seconds
    }
}

/// Non-positive or non-finite sample rates fall back to 48 kHz.
#[inline]
pub(crate) fn sanitize_sample_rate(sample_rate: f64) -> f64 {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        sample_rate
    } else {
        48_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_and_nan_durations_become_zero() {
        assert_eq!(clamp_duration(-1.0), 0.0);
        assert_eq!(clamp_duration(f64::NAN), 0.0);
        assert_eq!(clamp_duration(0.25), 0.25);
    }

    #[test]
    fn bad_sample_rates_fall_back() {
        assert_eq!(sanitize_sample_rate(0.0), 48_000.0);
        assert_eq!(sanitize_sample_rate(f64::INFINITY), 48_000.0);
        assert_eq!(sanitize_sample_rate(44_100.0), 44_100.0);
    }
}
