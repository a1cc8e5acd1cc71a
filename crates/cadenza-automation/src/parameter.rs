//! Automated parameters and per-track parameter sets.
//!
//! An [`AutomatedParameter`] combines four sources into one normalized value:
//!
//! ```text
//! value = clamp(source + lfo(t)·lfo_intensity + envelope·envelope_intensity, 0, 1)
//! source = base_value        (Off, Write)
//!        = curve.value_at(t) (Read)
//! ```

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use cadenza_core::{Stateful, decode_or_warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::{AutomationCurve, AutomationPoint, Envelope, Lfo};

/// How the curve participates in a parameter's value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutomationMode {
    /// Curve ignored; the base value drives the parameter.
    Off,
    /// Curve drives the parameter.
    #[default]
    Read,
    /// Writes are recorded into the curve; the last written value drives.
    Write,
}

/// One automatable parameter.
///
/// ```rust
/// use cadenza_automation::{AutomatedParameter, AutomationMode, AutomationPoint};
///
/// let mut cutoff = AutomatedParameter::new("cutoff", 0.5, 48000.0);
/// cutoff.curve_mut().add_point(AutomationPoint::new(0, 0.2));
/// assert_eq!(cutoff.value_at(0), 0.2);
///
/// cutoff.set_mode(AutomationMode::Off);
/// assert_eq!(cutoff.value_at(0), 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct AutomatedParameter {
    name: String,
    base_value: f32,
    mode: AutomationMode,
    curve: AutomationCurve,
    lfo: Lfo,
    envelope: Envelope,
    lfo_intensity: f32,
    envelope_intensity: f32,
}

impl AutomatedParameter {
    /// Creates a parameter in `Read` mode with an empty curve and no
    /// modulation.
    pub fn new(name: impl Into<String>, base_value: f32, sample_rate: f32) -> Self {
        let base_value = base_value.clamp(0.0, 1.0);
        Self {
            name: name.into(),
            base_value,
            mode: AutomationMode::Read,
            curve: AutomationCurve::new(base_value),
            lfo: Lfo::new(sample_rate),
            envelope: Envelope::new(sample_rate),
            lfo_intensity: 0.0,
            envelope_intensity: 0.0,
        }
    }

    /// Parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value used outside `Read` mode, and in `Read` mode while the curve
    /// has no points.
    pub fn base_value(&self) -> f32 {
        self.base_value
    }

    /// Sets the base value, clamped to `[0, 1]`.
    pub fn set_base_value(&mut self, value: f32) {
        self.base_value = value.clamp(0.0, 1.0);
    }

    /// Current mode.
    pub fn mode(&self) -> AutomationMode {
        self.mode
    }

    /// Switches mode.
    pub fn set_mode(&mut self, mode: AutomationMode) {
        self.mode = mode;
    }

    /// The automation curve.
    pub fn curve(&self) -> &AutomationCurve {
        &self.curve
    }

    /// Mutable access to the automation curve.
    pub fn curve_mut(&mut self) -> &mut AutomationCurve {
        &mut self.curve
    }

    /// The modulation LFO.
    pub fn lfo(&self) -> &Lfo {
        &self.lfo
    }

    /// Mutable access to the modulation LFO.
    pub fn lfo_mut(&mut self) -> &mut Lfo {
        &mut self.lfo
    }

    /// The modulation envelope.
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Mutable access to the modulation envelope.
    pub fn envelope_mut(&mut self) -> &mut Envelope {
        &mut self.envelope
    }

    /// LFO contribution scale.
    pub fn lfo_intensity(&self) -> f32 {
        self.lfo_intensity
    }

    /// Sets the LFO contribution, clamped to `[0, 1]`.
    pub fn set_lfo_intensity(&mut self, intensity: f32) {
        self.lfo_intensity = intensity.clamp(0.0, 1.0);
    }

    /// Envelope contribution scale.
    pub fn envelope_intensity(&self) -> f32 {
        self.envelope_intensity
    }

    /// Sets the envelope contribution, clamped to `[0, 1]`.
    pub fn set_envelope_intensity(&mut self, intensity: f32) {
        self.envelope_intensity = intensity.clamp(0.0, 1.0);
    }

    /// Sets the base value and, in `Write` mode, records it at `time_samples`.
    ///
    /// Returns true when a point was recorded.
    pub fn write(&mut self, time_samples: u64, value: f32) -> bool {
        self.set_base_value(value);
        if self.mode != AutomationMode::Write {
            return false;
        }
        self.curve.add_point(AutomationPoint::new(time_samples, self.base_value));
        true
    }

    /// Starts the modulation envelope.
    pub fn trigger(&mut self) {
        self.envelope.trigger();
    }

    /// Releases the modulation envelope.
    pub fn release(&mut self) {
        self.envelope.release();
    }

    /// Steps the envelope and the streaming LFO forward.
    pub fn advance(&mut self, samples: usize) {
        self.envelope.advance(samples);
        self.lfo.advance(samples);
    }

    /// Final value at `time_samples`, in `[0, 1]`.
    ///
    /// The LFO is evaluated at `time_samples`; the envelope contributes its
    /// current level.
    pub fn value_at(&self, time_samples: u64) -> f32 {
        let source = match self.mode {
            AutomationMode::Off | AutomationMode::Write => self.base_value,
            AutomationMode::Read if self.curve.is_empty() => self.base_value,
            AutomationMode::Read => self.curve.value_at(time_samples),
        };
        let modulation = self.lfo.value_at(time_samples) * self.lfo_intensity
            + self.envelope.level() * self.envelope_intensity;
        (source + modulation).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
struct ParameterState {
    name: String,
    base_value: f32,
    mode: AutomationMode,
    lfo_intensity: f32,
    envelope_intensity: f32,
    curve: Value,
    lfo: Value,
    envelope: Value,
}

impl Default for ParameterState {
    fn default() -> Self {
        Self {
            name: String::new(),
            base_value: 0.0,
            mode: AutomationMode::Read,
            lfo_intensity: 0.0,
            envelope_intensity: 0.0,
            curve: Value::Null,
            lfo: Value::Null,
            envelope: Value::Null,
        }
    }
}

impl Stateful for AutomatedParameter {
    fn to_dict(&self) -> Value {
        json!({
            "name": self.name,
            "base_value": self.base_value,
            "mode": self.mode,
            "lfo_intensity": self.lfo_intensity,
            "envelope_intensity": self.envelope_intensity,
            "curve": self.curve.to_dict(),
            "lfo": self.lfo.to_dict(),
            "envelope": self.envelope.to_dict(),
        })
    }

    /// Keeps the current name when the dict has none.
    fn load_dict(&mut self, dict: &Value) {
        let state: ParameterState = decode_or_warn("automated parameter", dict).unwrap_or_default();
        if !state.name.is_empty() {
            self.name = state.name;
        }
        self.set_base_value(state.base_value);
        self.mode = state.mode;
        self.set_lfo_intensity(state.lfo_intensity);
        self.set_envelope_intensity(state.envelope_intensity);
        self.curve.load_dict(&state.curve);
        self.lfo.load_dict(&state.lfo);
        self.envelope.load_dict(&state.envelope);
    }
}

/// Named set of automated parameters belonging to one track or effect.
///
/// Parameters are kept in name order, so [`values_at`](Self::values_at) and
/// saved dicts are deterministic.
#[derive(Debug, Clone)]
pub struct ParameterTrack {
    name: String,
    sample_rate: f32,
    parameters: BTreeMap<String, AutomatedParameter>,
}

impl ParameterTrack {
    /// Creates an empty track.
    pub fn new(name: impl Into<String>, sample_rate: f32) -> Self {
        Self {
            name: name.into(),
            sample_rate,
            parameters: BTreeMap::new(),
        }
    }

    /// Track name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a parameter, replacing any with the same name.
    pub fn add_parameter(&mut self, name: &str, base_value: f32) -> &mut AutomatedParameter {
        let parameter = AutomatedParameter::new(name, base_value, self.sample_rate);
        match self.parameters.entry(name.to_owned()) {
            Entry::Occupied(mut entry) => {
                entry.insert(parameter);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(parameter),
        }
    }

    /// Removes a parameter.
    pub fn remove_parameter(&mut self, name: &str) -> Option<AutomatedParameter> {
        self.parameters.remove(name)
    }

    /// Looks up a parameter.
    pub fn parameter(&self, name: &str) -> Option<&AutomatedParameter> {
        self.parameters.get(name)
    }

    /// Looks up a parameter for editing.
    pub fn parameter_mut(&mut self, name: &str) -> Option<&mut AutomatedParameter> {
        self.parameters.get_mut(name)
    }

    /// Parameter names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parameters.keys().map(String::as_str)
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// True when the track holds no parameters.
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Puts every parameter in `mode`.
    pub fn set_mode_all(&mut self, mode: AutomationMode) {
        for parameter in self.parameters.values_mut() {
            parameter.set_mode(mode);
        }
    }

    /// Every parameter's value at `time_samples`.
    pub fn values_at(&self, time_samples: u64) -> BTreeMap<String, f32> {
        self.parameters
            .iter()
            .map(|(name, p)| (name.clone(), p.value_at(time_samples)))
            .collect()
    }

    /// Steps every parameter's modulators forward.
    pub fn advance(&mut self, samples: usize) {
        for parameter in self.parameters.values_mut() {
            parameter.advance(samples);
        }
    }
}

impl Stateful for ParameterTrack {
    fn to_dict(&self) -> Value {
        let parameters: Map<String, Value> = self
            .parameters
            .iter()
            .map(|(name, p)| (name.clone(), p.to_dict()))
            .collect();
        json!({ "name": self.name, "parameters": parameters })
    }

    fn load_dict(&mut self, dict: &Value) {
        if let Some(name) = dict.get("name").and_then(Value::as_str) {
            self.name = name.to_owned();
        }
        self.parameters.clear();
        let Some(parameters) = dict.get("parameters").and_then(Value::as_object) else {
            tracing::warn!(track = %self.name, "parameter track dict has no parameters");
            return;
        };
        for (name, state) in parameters {
            let mut parameter = AutomatedParameter::new(name.as_str(), 0.0, self.sample_rate);
            parameter.load_dict(state);
            self.parameters.insert(name.clone(), parameter);
        }
    }
}
