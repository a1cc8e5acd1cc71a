//! Downward expander.
//!
//! Below the threshold the signal is attenuated by
//! `(threshold - level) * (1 - 1/ratio)` dB, bottoming out at `range_db`.
//! Above the threshold the expander is transparent.

use cadenza_core::{Effect, EnvelopeFollower, db_to_linear, linear_to_db};
use serde::{Deserialize, Serialize};

/// Expander parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpanderParams {
    /// Level below which expansion starts, dBFS.
    pub threshold_db: f32,
    /// Expansion ratio (1 to 20).
    pub ratio: f32,
    /// Envelope attack time.
    pub attack_ms: f32,
    /// Envelope release time.
    pub release_ms: f32,
    /// Maximum attenuation (negative dB).
    pub range_db: f32,
}

impl Default for ExpanderParams {
    fn default() -> Self {
        Self {
            threshold_db: -40.0,
            ratio: 2.0,
            attack_ms: 1.0,
            release_ms: 100.0,
            range_db: -60.0,
        }
    }
}

/// Downward expander with linked stereo detection.
#[derive(Debug, Clone)]
pub struct Expander {
    params: ExpanderParams,
    envelope: EnvelopeFollower,
    enabled: bool,
}

impl Expander {
    /// Registry tag.
    pub const KIND: &'static str = "expander";

    /// Creates an expander with default settings.
    pub fn new(sample_rate: f32) -> Self {
        let params = ExpanderParams::default();
        let mut expander = Self {
            params,
            envelope: EnvelopeFollower::new(sample_rate),
            enabled: true,
        };
        expander.set_params(params);
        expander
    }

    /// Current parameters.
    pub fn params(&self) -> &ExpanderParams {
        &self.params
    }

    /// Applies every parameter, clamping each to its range.
    pub fn set_params(&mut self, params: ExpanderParams) {
        self.set_threshold_db(params.threshold_db);
        self.set_ratio(params.ratio);
        self.set_attack_ms(params.attack_ms);
        self.set_release_ms(params.release_ms);
        self.set_range_db(params.range_db);
    }

    /// Sets the threshold (-80 to 0 dB).
    pub fn set_threshold_db(&mut self, db: f32) {
        self.params.threshold_db = db.clamp(-80.0, 0.0);
    }

    /// Sets the ratio (1 to 20).
    pub fn set_ratio(&mut self, ratio: f32) {
        self.params.ratio = ratio.clamp(1.0, 20.0);
    }

    /// Sets the attack time (0 to 500 ms).
    pub fn set_attack_ms(&mut self, ms: f32) {
        self.params.attack_ms = ms.clamp(0.0, 500.0);
        self.envelope.set_attack_ms(self.params.attack_ms);
    }

    /// Sets the release time (0 to 5000 ms).
    pub fn set_release_ms(&mut self, ms: f32) {
        self.params.release_ms = ms.clamp(0.0, 5000.0);
        self.envelope.set_release_ms(self.params.release_ms);
    }

    /// Sets the attenuation floor (-120 to 0 dB).
    pub fn set_range_db(&mut self, db: f32) {
        self.params.range_db = db.clamp(-120.0, 0.0);
    }

    #[inline]
    fn gain_for(&mut self, detector: f32) -> f32 {
        let level_db = linear_to_db(self.envelope.process(detector));
        let p = &self.params;
        let under = p.threshold_db - level_db;
        if under <= 0.0 {
            1.0
        } else {
            let gain_db = (-under * (1.0 - 1.0 / p.ratio)).max(p.range_db);
            db_to_linear(gain_db)
        }
    }
}

impl Effect for Expander {
    effect_identity!();

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        input * self.gain_for(input)
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let gain = self.gain_for(left.abs().max(right.abs()));
        (left * gain, right * gain)
    }

    fn reset(&mut self) {
        self.envelope.reset();
    }
}

impl_stateful!(Expander, ExpanderParams);

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(expander: &mut Expander, level: f32) -> f32 {
        let mut out = 0.0;
        for _ in 0..4000 {
            out = expander.process(level);
        }
        out
    }

    #[test]
    fn test_above_threshold_transparent() {
        let mut exp = Expander::new(48000.0);
        let out = settle(&mut exp, 0.5);
        assert_eq!(out, 0.5);
    }

    #[test]
    fn test_below_threshold_attenuated() {
        let mut exp = Expander::new(48000.0);
        exp.set_ratio(2.0);
        // -50 dB is 10 dB under, slope 0.5 → -5 dB of gain
        let input = db_to_linear(-50.0);
        let out_db = linear_to_db(settle(&mut exp, input));
        assert!((out_db + 55.0).abs() < 0.3, "expected ≈-55 dB, got {out_db}");
    }

    #[test]
    fn test_range_floor() {
        let mut exp = Expander::new(48000.0);
        exp.set_ratio(20.0);
        exp.set_range_db(-6.0);
        let input = db_to_linear(-100.0);
        let out_db = linear_to_db(settle(&mut exp, input));
        assert!((out_db + 106.0).abs() < 0.3, "range should cap attenuation, got {out_db}");
    }
}
