//! Feed-forward dynamics compressor.
//!
//! # Signal Flow
//!
//! ```text
//! Input → Envelope Follower → dB → Gain Computer → linear → × Input × Makeup
//! ```
//!
//! Above the threshold the output level rises at `1/ratio` of the input rate,
//! i.e. the gain is `-(level - threshold) * (1 - 1/ratio)` dB. An optional soft
//! knee blends quadratically across `knee_db` around the threshold.
//!
//! # Parameters
//!
//! | Parameter | Range | Default |
//! |-----------|-------|---------|
//! | threshold_db | -60–0 dB | -20 |
//! | ratio | 1–20 | 4 |
//! | attack_ms | 0–500 ms | 10 |
//! | release_ms | 0–5000 ms | 100 |
//! | knee_db | 0–24 dB | 0 |
//! | makeup_db | -24–24 dB | 0 |

use cadenza_core::{Effect, EnvelopeFollower, db_to_linear, linear_to_db};
use serde::{Deserialize, Serialize};

/// Compressor parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressorParams {
    /// Level where compression begins, dBFS.
    pub threshold_db: f32,
    /// Compression ratio (N:1).
    pub ratio: f32,
    /// Envelope attack time.
    pub attack_ms: f32,
    /// Envelope release time.
    pub release_ms: f32,
    /// Soft-knee width; 0 is a hard knee.
    pub knee_db: f32,
    /// Output gain applied after compression.
    pub makeup_db: f32,
}

impl Default for CompressorParams {
    fn default() -> Self {
        Self {
            threshold_db: -20.0,
            ratio: 4.0,
            attack_ms: 10.0,
            release_ms: 100.0,
            knee_db: 0.0,
            makeup_db: 0.0,
        }
    }
}

/// Static gain curve of a downward compressor.
#[inline]
pub(crate) fn compress_gain_db(level_db: f32, threshold_db: f32, ratio: f32, knee_db: f32) -> f32 {
    let overshoot = level_db - threshold_db;
    let slope = 1.0 - 1.0 / ratio;
    let half_knee = knee_db * 0.5;

    if overshoot <= -half_knee {
        0.0
    } else if overshoot > half_knee {
        -overshoot * slope
    } else {
        let x = overshoot + half_knee;
        -slope * x * x / (2.0 * knee_db)
    }
}

/// Dynamics compressor.
///
/// Stereo input is detected linked (`max(|L|, |R|)`) so both channels receive
/// the same gain and the image does not shift.
///
/// # Example
///
/// ```rust
/// use cadenza_core::Effect;
/// use cadenza_effects::Compressor;
///
/// let mut comp = Compressor::new(48000.0);
/// comp.set_threshold_db(-20.0);
/// comp.set_ratio(4.0);
/// let out = comp.process(0.5);
/// assert!(out.abs() <= 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct Compressor {
    params: CompressorParams,
    envelope: EnvelopeFollower,
    makeup: f32,
    gain_reduction_db: f32,
    enabled: bool,
}

impl Compressor {
    /// Registry tag.
    pub const KIND: &'static str = "compressor";

    /// Creates a compressor with default settings.
    pub fn new(sample_rate: f32) -> Self {
        let params = CompressorParams::default();
        let mut comp = Self {
            params,
            envelope: EnvelopeFollower::new(sample_rate),
            makeup: 1.0,
            gain_reduction_db: 0.0,
            enabled: true,
        };
        comp.set_params(params);
        comp
    }

    /// Current parameters.
    pub fn params(&self) -> &CompressorParams {
        &self.params
    }

    /// Applies every parameter, clamping each to its range.
    pub fn set_params(&mut self, params: CompressorParams) {
        self.set_threshold_db(params.threshold_db);
        self.set_ratio(params.ratio);
        self.set_attack_ms(params.attack_ms);
        self.set_release_ms(params.release_ms);
        self.set_knee_db(params.knee_db);
        self.set_makeup_db(params.makeup_db);
    }

    /// Sets the threshold (-60 to 0 dB).
    pub fn set_threshold_db(&mut self, db: f32) {
        self.params.threshold_db = db.clamp(-60.0, 0.0);
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

    /// Sets the soft-knee width (0 to 24 dB).
    pub fn set_knee_db(&mut self, db: f32) {
        self.params.knee_db = db.clamp(0.0, 24.0);
    }

    /// Sets the makeup gain (-24 to 24 dB).
    pub fn set_makeup_db(&mut self, db: f32) {
        self.params.makeup_db = db.clamp(-24.0, 24.0);
        self.makeup = db_to_linear(self.params.makeup_db);
    }

    /// Gain reduction applied to the last sample, in dB (≤ 0).
    pub fn gain_reduction_db(&self) -> f32 {
        self.gain_reduction_db
    }

    #[inline]
    fn gain_for(&mut self, detector: f32) -> f32 {
        let level_db = linear_to_db(self.envelope.process(detector));
        let p = &self.params;
        self.gain_reduction_db = compress_gain_db(level_db, p.threshold_db, p.ratio, p.knee_db);
        db_to_linear(self.gain_reduction_db) * self.makeup
    }
}

impl Effect for Compressor {
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
        self.gain_reduction_db = 0.0;
    }
}

impl_stateful!(Compressor, CompressorParams);

#[cfg(test)]
mod tests {
    use super::*;
    use cadenza_core::Stateful;

    #[test]
    fn test_gain_curve_hard_knee() {
        assert_eq!(compress_gain_db(-30.0, -20.0, 4.0, 0.0), 0.0);
        // 12 dB over at 4:1 leaves 3 dB over, so 9 dB of reduction
        assert!((compress_gain_db(-8.0, -20.0, 4.0, 0.0) + 9.0).abs() < 1e-5);
    }

    #[test]
    fn test_soft_knee_is_continuous() {
        let below = compress_gain_db(-23.0 - 1e-3, -20.0, 4.0, 6.0);
        let above = compress_gain_db(-17.0 + 1e-3, -20.0, 4.0, 6.0);
        assert!(below.abs() < 1e-3);
        assert!((above + 3.0 * 0.75).abs() < 1e-2);
    }

    #[test]
    fn test_compressor_reduces_peaks() {
        let mut comp = Compressor::new(44100.0);
        comp.set_threshold_db(-20.0);
        comp.set_ratio(4.0);
        comp.set_attack_ms(1.0);

        let mut output = 0.0;
        for _ in 0..2000 {
            output = comp.process(0.5);
        }
        // 0.5 ≈ -6 dB, 14 dB over, expect ≈ -16.5 dB out
        let out_db = linear_to_db(output);
        assert!((out_db + 16.5).abs() < 0.5, "expected ≈-16.5 dB, got {out_db}");
        assert!(comp.gain_reduction_db() < -10.0);
    }

    #[test]
    fn test_quiet_signal_untouched() {
        let mut comp = Compressor::new(48000.0);
        for _ in 0..1000 {
            let out = comp.process(0.01);
            assert!((out - 0.01).abs() < 1e-6);
        }
    }

    #[test]
    fn test_stereo_linked() {
        let mut comp = Compressor::new(48000.0);
        comp.set_attack_ms(0.0);
        let (mut l, mut r) = (0.0, 0.0);
        for _ in 0..100 {
            (l, r) = comp.process_stereo(0.9, 0.05);
        }
        assert!((l / 0.9 - r / 0.05).abs() < 1e-4, "both channels share one gain");
    }

    #[test]
    fn test_setters_clamp() {
        let mut comp = Compressor::new(48000.0);
        comp.set_ratio(100.0);
        comp.set_threshold_db(12.0);
        assert_eq!(comp.params().ratio, 20.0);
        assert_eq!(comp.params().threshold_db, 0.0);
    }

    #[test]
    fn test_dict_roundtrip() {
        let mut comp = Compressor::new(48000.0);
        comp.set_ratio(8.0);
        comp.set_makeup_db(3.5);
        comp.set_enabled(false);

        let mut other = Compressor::new(48000.0);
        other.load_dict(&comp.to_dict());
        assert_eq!(other.to_dict(), comp.to_dict());
        assert!(!other.is_enabled());
    }
}
