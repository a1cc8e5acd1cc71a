//! Chorus: a short delay swept by a sine LFO.
//!
//! Each channel has its own line and LFO; the right LFO starts a quarter
//! cycle ahead so the two voices drift against each other.

use cadenza_core::{DelayLine, Effect, Lfo, ms_to_samples, wet_dry_mix};
use serde::{Deserialize, Serialize};

const LINE_MS: f32 = 50.0;
const RIGHT_PHASE_OFFSET: f32 = 0.25;

/// Chorus parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChorusParams {
    /// LFO rate, Hz.
    pub rate_hz: f32,
    /// Sweep depth either side of the centre delay.
    pub depth_ms: f32,
    /// Centre delay.
    pub delay_ms: f32,
    /// Wet/dry blend.
    pub mix: f32,
}

impl Default for ChorusParams {
    fn default() -> Self {
        Self {
            rate_hz: 1.5,
            depth_ms: 2.0,
            delay_ms: 15.0,
            mix: 0.5,
        }
    }
}

/// Stereo chorus.
///
/// # Example
///
/// ```rust
/// use cadenza_core::Effect;
/// use cadenza_effects::Chorus;
///
/// let mut chorus = Chorus::new(44100.0);
/// chorus.set_rate_hz(2.0);
/// chorus.set_mix(0.5);
/// let out = chorus.process(0.5);
/// assert_eq!(out, 0.25);
/// ```
#[derive(Debug, Clone)]
pub struct Chorus {
    params: ChorusParams,
    line_l: DelayLine,
    line_r: DelayLine,
    lfo_l: Lfo,
    lfo_r: Lfo,
    sample_rate: f32,
    enabled: bool,
}

impl Chorus {
    /// Registry tag.
    pub const KIND: &'static str = "chorus";

    /// Creates a chorus with default settings.
    pub fn new(sample_rate: f32) -> Self {
        let params = ChorusParams::default();
        let mut lfo_r = Lfo::new(sample_rate, params.rate_hz);
        lfo_r.set_phase(RIGHT_PHASE_OFFSET);
        let mut chorus = Self {
            params,
            line_l: DelayLine::for_duration(LINE_MS / 1000.0, sample_rate),
            line_r: DelayLine::for_duration(LINE_MS / 1000.0, sample_rate),
            lfo_l: Lfo::new(sample_rate, params.rate_hz),
            lfo_r,
            sample_rate,
            enabled: true,
        };
        chorus.set_params(params);
        chorus
    }

    /// Current parameters.
    pub fn params(&self) -> &ChorusParams {
        &self.params
    }

    /// Applies every parameter, clamping each to its range.
    pub fn set_params(&mut self, params: ChorusParams) {
        self.set_rate_hz(params.rate_hz);
        self.set_depth_ms(params.depth_ms);
        self.set_delay_ms(params.delay_ms);
        self.set_mix(params.mix);
    }

    /// Sets the LFO rate (0.05 to 10 Hz).
    pub fn set_rate_hz(&mut self, hz: f32) {
        self.params.rate_hz = hz.clamp(0.05, 10.0);
        self.lfo_l.set_frequency(self.params.rate_hz);
        self.lfo_r.set_frequency(self.params.rate_hz);
    }

    /// Sets the sweep depth (0 to 10 ms).
    pub fn set_depth_ms(&mut self, ms: f32) {
        self.params.depth_ms = ms.clamp(0.0, 10.0);
    }

    /// Sets the centre delay (1 to 30 ms).
    pub fn set_delay_ms(&mut self, ms: f32) {
        self.params.delay_ms = ms.clamp(1.0, 30.0);
    }

    /// Sets the wet/dry blend (0 to 1).
    pub fn set_mix(&mut self, mix: f32) {
        self.params.mix = mix.clamp(0.0, 1.0);
    }
}

#[inline]
fn voice(line: &mut DelayLine, lfo: &mut Lfo, p: &ChorusParams, sample_rate: f32, input: f32) -> f32 {
    let ms = p.delay_ms + p.depth_ms * lfo.next();
    let wet = line.read_fractional(ms_to_samples(ms, sample_rate));
    line.write(input);
    wet_dry_mix(input, wet, p.mix)
}

impl Effect for Chorus {
    effect_identity!();

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        voice(&mut self.line_l, &mut self.lfo_l, &self.params, self.sample_rate, input)
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        (
            voice(&mut self.line_l, &mut self.lfo_l, &self.params, self.sample_rate, left),
            voice(&mut self.line_r, &mut self.lfo_r, &self.params, self.sample_rate, right),
        )
    }

    fn reset(&mut self) {
        self.line_l.clear();
        self.line_r.clear();
        self.lfo_l.reset();
        self.lfo_r.set_phase(RIGHT_PHASE_OFFSET);
    }
}

impl_stateful!(Chorus, ChorusParams);
