use crate::params::ParamId;

/// Identifies a voice: a MIDI note number, an allocation index, or anything
/// else the caller uses to pair note-on with note-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId(pub u32);

impl From<u8> for VoiceId {
    fn from(note: u8) -> Self {
        Self(u32::from(note))
    }
}

impl From<u32> for VoiceId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Control context → audio context.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EnvelopeMessage {
    NoteOn { voice: VoiceId, velocity: u8 },
    NoteOff { voice: VoiceId },
    AllNotesOff,
    Start,
    Stop,
}

/// Audio context → control context.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum NodeEvent {
    /// A parameter ramp reached its target.
    ParameterSettled { id: ParamId, value: f64 },
    /// A voice finished its release and went idle.
    VoiceFinished { voice: VoiceId },
    /// The node went from silent to sounding or back.
    ActivityChanged { active: bool },
}
