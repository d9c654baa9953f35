// Purpose: voice management and the messages that drive it
// This layer sits between the control handles and the envelope generators

pub mod message;
pub mod voice;

pub use message::{EnvelopeMessage, NodeEvent, VoiceId};
pub use voice::{Voice, VoicePool, VoiceState};
