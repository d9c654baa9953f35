pub mod dsp; // Ramps and envelope math
pub mod error;
pub mod graph; // Block-processing nodes and their control handles
pub mod params; // Named parameter sets shared across threads
pub mod patch; // Node configuration
pub mod synth; // Voice pool and control messages

pub use error::{AutomationError, Result};

pub const MAX_BLOCK_SIZE: usize = 2048;

/// Default time in seconds a parameter takes to reach a new value.
pub const DEFAULT_RAMP_TIME: f64 = 0.0002;
pub const DEFAULT_MAX_VOICES: usize = 16;

pub(crate) const COMMAND_QUEUE_SIZE: usize = 256;
pub(crate) const EVENT_QUEUE_SIZE: usize = 256;
