use crate::{
    dsp::{EnvelopeGenerator, EnvelopeState},
    synth::message::VoiceId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,      // Available for allocation
    Active,    // Envelope in attack/decay/sustain
    Releasing, // Note released, envelope in release phase
}

/// One envelope generator plus the bookkeeping needed to find it again.
///
/// A voice keeps its id after going idle; the slot is only reclaimed when a
/// later note-on needs it.
#[derive(Debug, Clone)]
pub struct Voice {
    id: Option<VoiceId>,
    age: u64,
    envelope: EnvelopeGenerator,
}

impl Voice {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            id: None,
            age: 0,
            envelope: EnvelopeGenerator::new(sample_rate),
        }
    }

    pub fn start(&mut self, id: VoiceId, peak: f64, age: u64) {
        self.id = Some(id);
        self.age = age;
        self.envelope.trigger_with_peak(peak);
    }

    pub fn release(&mut self) {
        self.envelope.release();
    }

    /// Render per-sample gains for this voice.
    pub fn render(&mut self, out: &mut [f64]) {
        self.envelope.render(out);
    }

    pub fn state(&self) -> VoiceState {
        match self.envelope.state() {
            EnvelopeState::Idle => VoiceState::Free,
            EnvelopeState::Release => VoiceState::Releasing,
            EnvelopeState::Attack | EnvelopeState::Decay | EnvelopeState::Sustain => {
                VoiceState::Active
            }
        }
    }

    pub fn is_free(&self) -> bool {
        self.state() == VoiceState::Free
    }

    pub fn id(&self) -> Option<VoiceId> {
        self.id
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn gain(&self) -> f64 {
        self.envelope.gain()
    }

    pub fn envelope(&self) -> &EnvelopeGenerator {
        &self.envelope
    }

    pub fn envelope_mut(&mut self) -> &mut EnvelopeGenerator {
        &mut self.envelope
    }
}

/// Fixed-size set of voices. Never allocates after construction.
pub struct VoicePool {
    voices: Vec<Voice>,
    note_counter: u64,
}

impl VoicePool {
    pub fn new(max_voices: usize, sample_rate: f64) -> Self {
        let voices = (0..max_voices.max(1))
            .map(|_| Voice::new(sample_rate))
            .collect();

        Self {
            voices,
            note_counter: 0,
        }
    }

    /// Start (or restart) the voice for `id`.
    ///
    /// Returns `false` only when the pool is empty of candidates, which
    /// cannot happen with at least one voice.
    pub fn note_on(&mut self, id: VoiceId, peak: f64) -> bool {
        let age = self.note_counter;
        self.note_counter += 1;

        match self.allocate(id) {
            Some(voice) => {
                voice.start(id, peak, age);
                true
            }
            None => false,
        }
    }

    /// Release the sounding voice for `id`. Unknown ids are ignored.
    pub fn note_off(&mut self, id: VoiceId) -> bool {
        match self.find_sounding(id) {
            Some(voice) => {
                voice.release();
                true
            }
            None => false,
        }
    }

    pub fn release_all(&mut self) {
        for voice in &mut self.voices {
            voice.release();
        }
    }

    pub fn set_shape(&mut self, attack: f64, decay: f64, sustain: f64, release: f64) {
        for voice in &mut self.voices {
            voice.envelope_mut().set_shape(attack, decay, sustain, release);
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        for voice in &mut self.voices {
            voice.envelope_mut().set_sample_rate(sample_rate);
        }
    }

    pub fn is_active(&self) -> bool {
        self.voices.iter().any(|v| !v.is_free())
    }

    pub fn active_count(&self) -> usize {
        self.voices.iter().filter(|v| !v.is_free()).count()
    }

    pub fn capacity(&self) -> usize {
        self.voices.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Voice> {
        self.voices.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Voice> {
        self.voices.iter_mut()
    }

    fn allocate(&mut self, id: VoiceId) -> Option<&mut Voice> {
        // Same id already sounding: retrigger in place
        if let Some(idx) = self
            .voices
            .iter()
            .position(|v| v.id() == Some(id) && !v.is_free())
        {
            return Some(&mut self.voices[idx]);
        }

        // Free voice, preferring one that last played this id
        let free_idx = self
            .voices
            .iter()
            .position(|v| v.is_free() && v.id() == Some(id))
            .or_else(|| self.voices.iter().position(Voice::is_free));
        if let Some(idx) = free_idx {
            return Some(&mut self.voices[idx]);
        }

        // Steal the oldest releasing voice, then the oldest of all
        let steal_idx = self
            .voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.state() == VoiceState::Releasing)
            .min_by_key(|(_, v)| v.age())
            .or_else(|| self.voices.iter().enumerate().min_by_key(|(_, v)| v.age()))
            .map(|(idx, _)| idx);

        steal_idx.map(|idx| &mut self.voices[idx])
    }

    fn find_sounding(&mut self, id: VoiceId) -> Option<&mut Voice> {
        self.voices
            .iter_mut()
            .find(|v| v.id() == Some(id) && !v.is_free())
    }
}
