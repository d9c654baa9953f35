//! Named parameter sets shared between the control and audio contexts.
//!
//! A [`ParameterBus`] lives on the audio side and owns one
//! [`RampedParameter`](crate::dsp::RampedParameter) per name. Its paired
//! [`ParameterHandle`] lives on the control side and publishes new targets
//! through versioned lock-free slots. Neither side ever waits for the other.

/// Audio-side bus and control-side handle.
pub mod bus;
/// Versioned single-writer slot carrying one parameter target.
pub mod slot;

pub use bus::{ParameterBus, ParameterHandle};
pub use slot::{TargetRequest, TargetSlot};

/// Description of one registered parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

impl ParamSpec {
    pub const fn new(name: &'static str, min: f64, max: f64, default: f64) -> Self {
        Self {
            name,
            min,
            max,
            default,
        }
    }

    /// Clamp a requested value into this parameter's range.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Index of a parameter within its bus. Cheaper than a name lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamId(usize);

impl ParamId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}
