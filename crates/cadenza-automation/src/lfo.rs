//! Automation LFO: a depth-scaled oscillator addressable by sample time.

use cadenza_core::{LfoWaveform, Stateful, decode_or_warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Slowest allowed rate.
pub const MIN_RATE_HZ: f32 = 0.01;
/// Fastest allowed rate.
pub const MAX_RATE_HZ: f32 = 100.0;

/// Serializable LFO settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LfoSettings {
    /// Oscillator shape.
    pub waveform: LfoWaveform,
    /// Rate in Hz.
    pub rate_hz: f32,
    /// Output scale in `[0, 1]`.
    pub depth: f32,
    /// Starting phase in `[0, 1)`.
    pub phase_offset: f32,
}

impl Default for LfoSettings {
    fn default() -> Self {
        Self {
            waveform: LfoWaveform::Sine,
            rate_hz: 1.0,
            depth: 1.0,
            phase_offset: 0.0,
        }
    }
}

/// Modulation source for [`AutomatedParameter`](crate::AutomatedParameter).
///
/// Output is bipolar in `[-depth, depth]`. [`next`](Self::next) streams one
/// sample at a time; [`value_at`](Self::value_at) evaluates the same waveform
/// at an absolute transport position without touching the running phase.
///
/// ```rust
/// use cadenza_automation::Lfo;
/// use cadenza_core::LfoWaveform;
///
/// let mut lfo = Lfo::new(1000.0);
/// lfo.set_waveform(LfoWaveform::Square);
/// lfo.set_depth(0.5);
/// assert_eq!(lfo.value_at(0), 0.5);
/// assert_eq!(lfo.value_at(750), -0.5);
/// ```
#[derive(Debug, Clone)]
pub struct Lfo {
    osc: cadenza_core::Lfo,
    settings: LfoSettings,
    sample_rate: f32,
}

impl Lfo {
    /// Creates a 1 Hz full-depth sine.
    pub fn new(sample_rate: f32) -> Self {
        let mut lfo = Self {
            osc: cadenza_core::Lfo::new(sample_rate, 1.0),
            settings: LfoSettings::default(),
            sample_rate,
        };
        lfo.apply(LfoSettings::default());
        lfo
    }

    /// Current settings.
    pub fn settings(&self) -> &LfoSettings {
        &self.settings
    }

    /// Applies every setting, clamping each to its range, and rewinds.
    pub fn apply(&mut self, settings: LfoSettings) {
        self.set_waveform(settings.waveform);
        self.set_rate(settings.rate_hz);
        self.set_depth(settings.depth);
        self.set_phase_offset(settings.phase_offset);
        self.reset();
    }

    /// Sets the rate, clamped to `[0.01, 100]` Hz.
    pub fn set_rate(&mut self, hz: f32) {
        self.settings.rate_hz = hz.clamp(MIN_RATE_HZ, MAX_RATE_HZ);
        self.osc.set_frequency(self.settings.rate_hz);
    }

    /// Rate in Hz.
    pub fn rate(&self) -> f32 {
        self.settings.rate_hz
    }

    /// Sets the depth, clamped to `[0, 1]`.
    pub fn set_depth(&mut self, depth: f32) {
        self.settings.depth = depth.clamp(0.0, 1.0);
    }

    /// Output scale.
    pub fn depth(&self) -> f32 {
        self.settings.depth
    }

    /// Sets the waveform.
    pub fn set_waveform(&mut self, waveform: LfoWaveform) {
        self.settings.waveform = waveform;
        self.osc.set_waveform(waveform);
    }

    /// Current waveform.
    pub fn waveform(&self) -> LfoWaveform {
        self.settings.waveform
    }

    /// Sets the phase at time zero; wraps into `[0, 1)`.
    pub fn set_phase_offset(&mut self, phase: f32) {
        self.settings.phase_offset = phase.rem_euclid(1.0);
    }

    /// Rewinds the running phase to the offset.
    pub fn reset(&mut self) {
        self.osc.set_phase(self.settings.phase_offset);
    }

    /// Returns the current value and advances one sample.
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> f32 {
        self.osc.next() * self.settings.depth
    }

    /// Advances the running phase by `samples`.
    pub fn advance(&mut self, samples: usize) {
        self.osc.advance(samples);
    }

    /// Value at an absolute position, as if started at sample zero.
    pub fn value_at(&self, time_samples: u64) -> f32 {
        let cycles = time_samples as f64 * f64::from(self.settings.rate_hz)
            / f64::from(self.sample_rate)
            + f64::from(self.settings.phase_offset);
        let phase = cycles.fract() as f32;
        self.settings.waveform.sample(phase) * self.settings.depth
    }
}

impl Stateful for Lfo {
    fn to_dict(&self) -> Value {
        serde_json::to_value(self.settings).unwrap_or_default()
    }

    fn load_dict(&mut self, dict: &Value) {
        self.apply(decode_or_warn("lfo", dict).unwrap_or_default());
    }
}
