//! Tremolo: amplitude modulation by an LFO.
//!
//! Gain is `1 - depth * lfo` with the LFO mapped to `[0, 1]`, so it stays in
//! `[1 - depth, 1]` and never boosts.

use cadenza_core::{Effect, Lfo, LfoWaveform};
use serde::{Deserialize, Serialize};

/// Tremolo parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TremoloParams {
    /// Modulation rate, Hz.
    pub rate_hz: f32,
    /// Modulation depth (0 to 1).
    pub depth: f32,
    /// LFO shape.
    pub waveform: LfoWaveform,
}

impl Default for TremoloParams {
    fn default() -> Self {
        Self {
            rate_hz: 5.0,
            depth: 0.5,
            waveform: LfoWaveform::Sine,
        }
    }
}

/// Tremolo.
///
/// # Example
///
/// ```rust
/// use cadenza_core::{Effect, LfoWaveform};
/// use cadenza_effects::Tremolo;
///
/// let mut trem = Tremolo::new(48000.0);
/// trem.set_waveform(LfoWaveform::Square);
/// trem.set_depth(1.0);
/// assert_eq!(trem.process(0.5), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Tremolo {
    params: TremoloParams,
    lfo: Lfo,
    enabled: bool,
}

impl Tremolo {
    /// Registry tag.
    pub const KIND: &'static str = "tremolo";

    /// Creates a 5 Hz sine tremolo at half depth.
    pub fn new(sample_rate: f32) -> Self {
        let params = TremoloParams::default();
        let mut trem = Self {
            params,
            lfo: Lfo::new(sample_rate, params.rate_hz),
            enabled: true,
        };
        trem.set_params(params);
        trem
    }

    /// Current parameters.
    pub fn params(&self) -> &TremoloParams {
        &self.params
    }

    /// Applies every parameter, clamping each to its range.
    pub fn set_params(&mut self, params: TremoloParams) {
        self.set_rate_hz(params.rate_hz);
        self.set_depth(params.depth);
        self.set_waveform(params.waveform);
    }

    /// Sets the rate (0.1 to 20 Hz).
    pub fn set_rate_hz(&mut self, hz: f32) {
        self.params.rate_hz = hz.clamp(0.1, 20.0);
        self.lfo.set_frequency(self.params.rate_hz);
    }

    /// Sets the depth (0 to 1).
    pub fn set_depth(&mut self, depth: f32) {
        self.params.depth = depth.clamp(0.0, 1.0);
    }

    /// Sets the LFO shape.
    pub fn set_waveform(&mut self, waveform: LfoWaveform) {
        self.params.waveform = waveform;
        self.lfo.set_waveform(waveform);
    }

    #[inline]
    fn next_gain(&mut self) -> f32 {
        1.0 - self.params.depth * self.lfo.next_unipolar()
    }
}

impl Effect for Tremolo {
    effect_identity!();

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        input * self.next_gain()
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let gain = self.next_gain();
        (left * gain, right * gain)
    }

    fn reset(&mut self) {
        self.lfo.reset();
    }
}

impl_stateful!(Tremolo, TremoloParams);
