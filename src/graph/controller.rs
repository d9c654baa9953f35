//! Control-side facade for an envelope node.
//!
//! A controller can be configured before any audio engine exists. Until
//! [`EnvelopeController::bind`] it is *unbound*: parameter writes are kept in
//! its settings. Binding creates the node from those settings (so every
//! buffered value is in place for the first block) and switches the
//! controller to writing through the node's handle. The switch happens once.

use crate::{
    error::{AutomationError, Result},
    graph::envelope::{EnvelopeHandle, EnvelopeNode, EnvelopeParam},
    patch::EnvelopeSettings,
    synth::{NodeEvent, VoiceId},
};

enum Binding {
    Unbound(EnvelopeSettings),
    Bound(EnvelopeHandle),
}

pub struct EnvelopeController {
    binding: Binding,
    // Last known value of each EnvelopeParam, for UI readback
    values: [f64; 4],
    ramp_time: f64,
}

impl EnvelopeController {
    pub fn new(settings: EnvelopeSettings) -> Self {
        let values = EnvelopeParam::ALL.map(|p| p.spec(p.configured(&settings)).default);
        let ramp_time = crate::dsp::clamp_duration(settings.ramp_time);

        Self {
            binding: Binding::Unbound(settings),
            values,
            ramp_time,
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.binding, Binding::Bound(_))
    }

    /// Create the audio-side node from the buffered settings.
    ///
    /// Fails with [`AutomationError::AlreadyBound`] on every call after the
    /// first.
    pub fn bind(&mut self, sample_rate: f64) -> Result<EnvelopeNode> {
        let Binding::Unbound(settings) = &mut self.binding else {
            return Err(AutomationError::AlreadyBound);
        };

        for param in EnvelopeParam::ALL {
            param.configure(settings, self.values[param.index()]);
        }
        settings.ramp_time = self.ramp_time;

        let (node, handle) = EnvelopeNode::new(settings, sample_rate);
        tracing::info!(
            sample_rate,
            attack = self.values[0],
            decay = self.values[1],
            sustain = self.values[2],
            release = self.values[3],
            "envelope controller bound"
        );

        self.binding = Binding::Bound(handle);
        Ok(node)
    }

    /// Set a parameter, ramping over the controller's ramp time once bound.
    pub fn set(&mut self, param: EnvelopeParam, value: f64) {
        if !value.is_finite() {
            tracing::warn!(param = param.name(), value, "ignoring non-finite value");
            return;
        }

        let spec = param.spec(value);
        let value = spec.clamp(value);
        self.values[param.index()] = value;

        match &mut self.binding {
            Binding::Unbound(settings) => param.configure(settings, value),
            Binding::Bound(handle) => handle.set_param(param, value, self.ramp_time),
        }
    }

    /// Set a parameter by name.
    pub fn set_by_name(&mut self, name: &str, value: f64) -> Result<()> {
        let param = EnvelopeParam::from_name(name).ok_or_else(|| {
            tracing::warn!(name, "unknown parameter");
            AutomationError::UnknownParameter(name.to_string())
        })?;
        self.set(param, value);
        Ok(())
    }

    /// Last value set here or reported back by the engine.
    pub fn value(&self, param: EnvelopeParam) -> f64 {
        self.values[param.index()]
    }

    pub fn ramp_time(&self) -> f64 {
        self.ramp_time
    }

    pub fn set_ramp_time(&mut self, seconds: f64) {
        self.ramp_time = crate::dsp::clamp_duration(seconds);
        if let Binding::Bound(handle) = &mut self.binding {
            handle.params_mut().set_ramp_time(self.ramp_time);
        }
    }

    pub fn note_on(&mut self, voice: impl Into<VoiceId>, velocity: u8) -> Result<()> {
        let voice = voice.into();
        match self.handle_mut() {
            Some(handle) => handle.note_on_with_velocity(voice, velocity),
            None => {
                tracing::debug!(?voice, "note on before bind ignored");
                Ok(())
            }
        }
    }

    pub fn note_off(&mut self, voice: impl Into<VoiceId>) -> Result<()> {
        let voice = voice.into();
        match self.handle_mut() {
            Some(handle) => handle.note_off(voice),
            None => Ok(()),
        }
    }

    pub fn all_notes_off(&mut self) -> Result<()> {
        match self.handle_mut() {
            Some(handle) => handle.all_notes_off(),
            None => Ok(()),
        }
    }

    pub fn start(&mut self) -> Result<()> {
        match self.handle_mut() {
            Some(handle) => handle.start(),
            None => Ok(()),
        }
    }

    pub fn stop(&mut self) -> Result<()> {
        match self.handle_mut() {
            Some(handle) => handle.stop(),
            None => Ok(()),
        }
    }

    /// True while the bound node has a sounding voice.
    pub fn is_active(&self) -> bool {
        self.handle().is_some_and(EnvelopeHandle::is_active)
    }

    pub fn is_started(&self) -> bool {
        self.handle().map_or(true, EnvelopeHandle::is_started)
    }

    pub fn active_voices(&self) -> usize {
        self.handle().map_or(0, EnvelopeHandle::active_voices)
    }

    /// Drain the engine's mailbox, updating readback values and handing each
    /// event to `on_event`.
    pub fn poll_events(&mut self, mut on_event: impl FnMut(NodeEvent)) {
        let Binding::Bound(handle) = &mut self.binding else {
            return;
        };

        while let Some(event) = handle.pop_event() {
            if let NodeEvent::ParameterSettled { id, value } = event {
                if let Some(slot) = self.values.get_mut(id.index()) {
                    *slot = value;
                }
            }
            tracing::trace!(?event, "engine event");
            on_event(event);
        }
    }

    pub fn handle(&self) -> Option<&EnvelopeHandle> {
        match &self.binding {
            Binding::Bound(handle) => Some(handle),
            Binding::Unbound(_) => None,
        }
    }

    pub fn handle_mut(&mut self) -> Option<&mut EnvelopeHandle> {
        match &mut self.binding {
            Binding::Bound(handle) => Some(handle),
            Binding::Unbound(_) => None,
        }
    }
}

impl Default for EnvelopeController {
    fn default() -> Self {
        Self::new(EnvelopeSettings::default())
    }
}
