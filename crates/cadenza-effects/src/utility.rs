//! Gain and stereo width utilities.

use cadenza_core::{Effect, db_to_linear, mid_side_width};
use serde::{Deserialize, Serialize};

/// Gain parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GainParams {
    /// Gain, dB.
    pub gain_db: f32,
}

impl Default for GainParams {
    fn default() -> Self {
        Self { gain_db: 0.0 }
    }
}

/// Static gain stage.
#[derive(Debug, Clone)]
pub struct Gain {
    params: GainParams,
    gain: f32,
    enabled: bool,
}

impl Gain {
    /// Registry tag.
    pub const KIND: &'static str = "gain";

    /// Creates a unity gain stage.
    pub fn new(_sample_rate: f32) -> Self {
        Self {
            params: GainParams::default(),
            gain: 1.0,
            enabled: true,
        }
    }

    /// Current parameters.
    pub fn params(&self) -> &GainParams {
        &self.params
    }

    /// Applies every parameter, clamping each to its range.
    pub fn set_params(&mut self, params: GainParams) {
        self.set_gain_db(params.gain_db);
    }

    /// Sets the gain (-60 to 24 dB).
    pub fn set_gain_db(&mut self, db: f32) {
        self.params.gain_db = db.clamp(-60.0, 24.0);
        self.gain = db_to_linear(self.params.gain_db);
    }
}

impl Effect for Gain {
    effect_identity!();

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        input * self.gain
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        (left * self.gain, right * self.gain)
    }

    fn reset(&mut self) {}
}

impl_stateful!(Gain, GainParams);

/// Width parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidthParams {
    /// Side scale: 0 mono, 1 unchanged, 2 doubled.
    pub width: f32,
}

impl Default for WidthParams {
    fn default() -> Self {
        Self { width: 1.0 }
    }
}

/// Mid/side width control. Mono input passes through untouched.
#[derive(Debug, Clone)]
pub struct WidthControl {
    params: WidthParams,
    enabled: bool,
}

impl WidthControl {
    /// Registry tag.
    pub const KIND: &'static str = "width";

    /// Creates a width control at unity.
    pub fn new(_sample_rate: f32) -> Self {
        Self {
            params: WidthParams::default(),
            enabled: true,
        }
    }

    /// Current parameters.
    pub fn params(&self) -> &WidthParams {
        &self.params
    }

    /// Applies every parameter, clamping each to its range.
    pub fn set_params(&mut self, params: WidthParams) {
        self.set_width(params.width);
    }

    /// Sets the width (0 to 2).
    pub fn set_width(&mut self, width: f32) {
        self.params.width = width.clamp(0.0, 2.0);
    }
}

impl Effect for WidthControl {
    effect_identity!();

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        input
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        mid_side_width(left, right, self.params.width)
    }

    fn reset(&mut self) {}
}

impl_stateful!(WidthControl, WidthParams);

#[cfg(test)]
mod tests {
    use super::*;
    use cadenza_core::AudioBuffer;

    #[test]
    fn test_gain_db() {
        let mut gain = Gain::new(48000.0);
        gain.set_gain_db(-6.0);
        assert!((gain.process(1.0) - 0.501_187).abs() < 1e-4);
        gain.set_gain_db(100.0);
        assert_eq!(gain.params().gain_db, 24.0);
    }

    #[test]
    fn test_width_zero_collapses_to_mono() {
        let mut width = WidthControl::new(48000.0);
        width.set_width(0.0);
        let (l, r) = width.process_stereo(1.0, 0.0);
        assert_eq!((l, r), (0.5, 0.5));
    }

    #[test]
    fn test_width_mono_block_untouched() {
        let mut width = WidthControl::new(48000.0);
        width.set_width(2.0);
        let mut block = AudioBuffer::from_mono(vec![0.1, -0.2, 0.3]);
        width.process_block(&mut block);
        assert_eq!(block.left(), &[0.1, -0.2, 0.3]);
        assert!(!block.is_stereo());
    }
}
