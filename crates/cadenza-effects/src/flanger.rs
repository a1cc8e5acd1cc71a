//! Flanger: a very short swept delay with feedback of its own output.

use cadenza_core::{DelayLine, Effect, Lfo, clip_unit, ms_to_samples, wet_dry_mix};
use serde::{Deserialize, Serialize};

const LINE_MS: f32 = 15.0;

/// Flanger parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlangerParams {
    /// Sweep rate, Hz.
    pub rate_hz: f32,
    /// Sweep range above the base delay.
    pub depth_ms: f32,
    /// Minimum delay.
    pub base_ms: f32,
    /// Feedback of the delayed signal; negative values invert it.
    pub feedback: f32,
    /// Wet/dry blend.
    pub mix: f32,
}

impl Default for FlangerParams {
    fn default() -> Self {
        Self {
            rate_hz: 0.25,
            depth_ms: 2.0,
            base_ms: 1.0,
            feedback: 0.5,
            mix: 0.5,
        }
    }
}

/// Stereo flanger with a shared sweep.
#[derive(Debug, Clone)]
pub struct Flanger {
    params: FlangerParams,
    line_l: DelayLine,
    line_r: DelayLine,
    lfo: Lfo,
    sample_rate: f32,
    enabled: bool,
}

impl Flanger {
    /// Registry tag.
    pub const KIND: &'static str = "flanger";

    /// Creates a flanger with default settings.
    pub fn new(sample_rate: f32) -> Self {
        let params = FlangerParams::default();
        let mut flanger = Self {
            params,
            line_l: DelayLine::for_duration(LINE_MS / 1000.0, sample_rate),
            line_r: DelayLine::for_duration(LINE_MS / 1000.0, sample_rate),
            lfo: Lfo::new(sample_rate, params.rate_hz),
            sample_rate,
            enabled: true,
        };
        flanger.set_params(params);
        flanger
    }

    /// Current parameters.
    pub fn params(&self) -> &FlangerParams {
        &self.params
    }

    /// Applies every parameter, clamping each to its range.
    pub fn set_params(&mut self, params: FlangerParams) {
        self.set_rate_hz(params.rate_hz);
        self.set_depth_ms(params.depth_ms);
        self.set_base_ms(params.base_ms);
        self.set_feedback(params.feedback);
        self.set_mix(params.mix);
    }

    /// Sets the sweep rate (0.05 to 5 Hz).
    pub fn set_rate_hz(&mut self, hz: f32) {
        self.params.rate_hz = hz.clamp(0.05, 5.0);
        self.lfo.set_frequency(self.params.rate_hz);
    }

    /// Sets the sweep range (0 to 5 ms).
    pub fn set_depth_ms(&mut self, ms: f32) {
        self.params.depth_ms = ms.clamp(0.0, 5.0);
    }

    /// Sets the minimum delay (0.1 to 5 ms).
    pub fn set_base_ms(&mut self, ms: f32) {
        self.params.base_ms = ms.clamp(0.1, 5.0);
    }

    /// Sets the feedback (-0.95 to 0.95).
    pub fn set_feedback(&mut self, feedback: f32) {
        self.params.feedback = feedback.clamp(-0.95, 0.95);
    }

    /// Sets the wet/dry blend (0 to 1).
    pub fn set_mix(&mut self, mix: f32) {
        self.params.mix = mix.clamp(0.0, 1.0);
    }

    #[inline]
    fn sweep_samples(&mut self) -> f32 {
        let ms = self.params.base_ms + self.params.depth_ms * self.lfo.next_unipolar();
        ms_to_samples(ms, self.sample_rate)
    }
}

#[inline]
fn comb(line: &mut DelayLine, delay: f32, feedback: f32, mix: f32, input: f32) -> f32 {
    let delayed = line.read_fractional(delay);
    line.write(clip_unit(input + feedback * delayed));
    clip_unit(wet_dry_mix(input, delayed, mix))
}

impl Effect for Flanger {
    effect_identity!();

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let delay = self.sweep_samples();
        comb(&mut self.line_l, delay, self.params.feedback, self.params.mix, input)
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let delay = self.sweep_samples();
        let (fb, mix) = (self.params.feedback, self.params.mix);
        (
            comb(&mut self.line_l, delay, fb, mix, left),
            comb(&mut self.line_r, delay, fb, mix, right),
        )
    }

    fn reset(&mut self) {
        self.line_l.clear();
        self.line_r.clear();
        self.lfo.reset();
    }
}

impl_stateful!(Flanger, FlangerParams);
