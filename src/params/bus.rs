use std::sync::Arc;

use crate::{
    dsp::RampedParameter,
    error::{AutomationError, Result},
    params::{ParamId, ParamSpec, TargetRequest, TargetSlot},
    DEFAULT_RAMP_TIME,
};

/// Audio-side owner of a node's ramped parameters.
///
/// `tick` is the only place the audio context mutates parameter values: it
/// picks up new targets from the control side, advances every ramp by one
/// block and publishes the results for readback.
pub struct ParameterBus {
    specs: Arc<[ParamSpec]>,
    slots: Arc<[TargetSlot]>,
    params: Vec<RampedParameter>,
    seen_versions: Vec<u64>,
    settled: Vec<bool>,
}

/// Control-side writer for a [`ParameterBus`].
///
/// There is exactly one handle per bus, which keeps each slot single-writer.
pub struct ParameterHandle {
    specs: Arc<[ParamSpec]>,
    slots: Arc<[TargetSlot]>,
    ramp_time: f64,
}

fn find(specs: &[ParamSpec], name: &str) -> Result<ParamId> {
    specs
        .iter()
        .position(|spec| spec.name == name)
        .map(ParamId::new)
        .ok_or_else(|| AutomationError::UnknownParameter(name.to_string()))
}

impl ParameterBus {
    /// Register `specs` (names must be unique) and split into the audio-side
    /// bus and its control-side handle.
    pub fn new(specs: &[ParamSpec], sample_rate: f64) -> (Self, ParameterHandle) {
        debug_assert!(
            specs
                .iter()
                .enumerate()
                .all(|(i, a)| specs[..i].iter().all(|b| b.name != a.name)),
            "parameter names must be unique"
        );

        let specs: Arc<[ParamSpec]> = specs.into();
        let slots: Arc<[TargetSlot]> = specs
            .iter()
            .map(|spec| TargetSlot::new(spec.clamp(spec.default)))
            .collect();
        let params = specs
            .iter()
            .map(|spec| RampedParameter::new(spec.clamp(spec.default), sample_rate))
            .collect();

        let bus = Self {
            specs: Arc::clone(&specs),
            slots: Arc::clone(&slots),
            params,
            seen_versions: vec![0; specs.len()],
            settled: vec![false; specs.len()],
        };
        let handle = ParameterHandle {
            specs,
            slots,
            ramp_time: DEFAULT_RAMP_TIME,
        };

        (bus, handle)
    }

    pub fn id(&self, name: &str) -> Result<ParamId> {
        find(&self.specs, name)
    }

    /// Set a target directly on the audio side.
    pub fn set(&mut self, name: &str, value: f64, ramp_seconds: f64) -> Result<()> {
        let id = self.id(name)?;
        self.set_by_id(id, value, ramp_seconds);
        Ok(())
    }

    pub fn set_by_id(&mut self, id: ParamId, value: f64, ramp_seconds: f64) {
        if let (Some(spec), Some(param)) = (self.specs.get(id.0), self.params.get_mut(id.0)) {
            param.set_target(spec.clamp(value), ramp_seconds);
        }
    }

    /// Current (ramped) value.
    pub fn get(&self, name: &str) -> Result<f64> {
        let id = self.id(name)?;
        Ok(self.value(id))
    }

    /// Current (ramped) value by id. Unknown ids read as 0.
    #[inline]
    pub fn value(&self, id: ParamId) -> f64 {
        self.params.get(id.0).map_or(0.0, RampedParameter::current)
    }

    /// Pull pending targets, advance every ramp by one block and publish.
    pub fn tick(&mut self, samples: usize) {
        let entries = self
            .params
            .iter_mut()
            .zip(self.slots.iter())
            .zip(self.specs.iter())
            .zip(self.seen_versions.iter_mut())
            .zip(self.settled.iter_mut());

        for ((((param, slot), spec), seen), settled) in entries {
            let applied = match slot.read_if_newer(seen) {
                Some(request) => {
                    param.set_target(spec.clamp(request.value), request.ramp_seconds);
                    true
                }
                None => false,
            };

            // Immediate jumps count as settled in the block they land
            let was_ramping = param.is_ramping();
            let current = param.tick(samples);
            *settled = (applied || was_ramping) && !param.is_ramping();
            slot.publish(current);
        }
    }

    /// Parameters that reached a new target during the last `tick`, whether
    /// by ramp or by jump.
    pub fn settled(&self) -> impl Iterator<Item = (ParamId, f64)> + '_ {
        self.settled
            .iter()
            .enumerate()
            .filter(|(_, done)| **done)
            .map(|(i, _)| (ParamId::new(i), self.params[i].current()))
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        for param in &mut self.params {
            param.set_sample_rate(sample_rate);
        }
    }

    pub fn specs(&self) -> &[ParamSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl ParameterHandle {
    pub fn id(&self, name: &str) -> Result<ParamId> {
        find(&self.specs, name).inspect_err(|_| {
            tracing::warn!(name, "unknown parameter");
        })
    }

    /// Request a ramp to `value` over `ramp_seconds`.
    pub fn set(&mut self, name: &str, value: f64, ramp_seconds: f64) -> Result<()> {
        let id = self.id(name)?;
        self.set_by_id(id, value, ramp_seconds);
        Ok(())
    }

    /// Request a ramp to `value` using the handle's default ramp time.
    pub fn set_value(&mut self, name: &str, value: f64) -> Result<()> {
        let ramp_seconds = self.ramp_time;
        self.set(name, value, ramp_seconds)
    }

    pub fn set_by_id(&mut self, id: ParamId, value: f64, ramp_seconds: f64) {
        let (Some(spec), Some(slot)) = (self.specs.get(id.0), self.slots.get(id.0)) else {
            return;
        };

        if !value.is_finite() {
            tracing::warn!(name = spec.name, value, "ignoring non-finite parameter value");
            return;
        }

        let clamped = spec.clamp(value);
        if clamped != value {
            tracing::debug!(name = spec.name, value, clamped, "parameter value clamped");
        }

        slot.write(TargetRequest {
            value: clamped,
            ramp_seconds,
        });
    }

    /// Value last published by the audio side.
    pub fn get(&self, name: &str) -> Result<f64> {
        let id = self.id(name)?;
        Ok(self.value(id))
    }

    pub fn value(&self, id: ParamId) -> f64 {
        self.slots.get(id.0).map_or(0.0, TargetSlot::published)
    }

    pub fn ramp_time(&self) -> f64 {
        self.ramp_time
    }

    pub fn set_ramp_time(&mut self, seconds: f64) {
        self.ramp_time = crate::dsp::clamp_duration(seconds);
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.specs.iter().map(|spec| spec.name)
    }

    pub fn specs(&self) -> &[ParamSpec] {
        &self.specs
    }
}
