//! Saturation and hard clipping.
//!
//! [`Saturation`] is a warm tanh stage:
//!
//! ```text
//! Input → Drive → tanh → One-pole Tone → Makeup → Wet/Dry
//! ```
//!
//! [`HardClip`] clamps to a dB threshold and counts clipped samples so a
//! meter can show how often it engages.

use cadenza_core::{Effect, OnePole, db_to_linear, soft_clip, wet_dry_mix};
use serde::{Deserialize, Serialize};

/// Saturation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaturationParams {
    /// Input gain into the tanh stage.
    pub drive_db: f32,
    /// Lowpass cutoff of the tone filter.
    pub tone_hz: f32,
    /// Output gain after the tone filter.
    pub makeup_db: f32,
    /// Wet/dry blend.
    pub mix: f32,
}

impl Default for SaturationParams {
    fn default() -> Self {
        Self {
            drive_db: 6.0,
            tone_hz: 8000.0,
            makeup_db: 0.0,
            mix: 1.0,
        }
    }
}

/// Tanh saturation with tone control.
#[derive(Debug, Clone)]
pub struct Saturation {
    params: SaturationParams,
    tone_l: OnePole,
    tone_r: OnePole,
    drive: f32,
    makeup: f32,
    enabled: bool,
}

impl Saturation {
    /// Registry tag.
    pub const KIND: &'static str = "saturation";

    /// Creates a saturation stage with default settings.
    pub fn new(sample_rate: f32) -> Self {
        let params = SaturationParams::default();
        let mut sat = Self {
            params,
            tone_l: OnePole::new(sample_rate, params.tone_hz),
            tone_r: OnePole::new(sample_rate, params.tone_hz),
            drive: 1.0,
            makeup: 1.0,
            enabled: true,
        };
        sat.set_params(params);
        sat
    }

    /// Current parameters.
    pub fn params(&self) -> &SaturationParams {
        &self.params
    }

    /// Applies every parameter, clamping each to its range.
    pub fn set_params(&mut self, params: SaturationParams) {
        self.set_drive_db(params.drive_db);
        self.set_tone_hz(params.tone_hz);
        self.set_makeup_db(params.makeup_db);
        self.set_mix(params.mix);
    }

    /// Sets the drive (0 to 40 dB).
    pub fn set_drive_db(&mut self, db: f32) {
        self.params.drive_db = db.clamp(0.0, 40.0);
        self.drive = db_to_linear(self.params.drive_db);
    }

    /// Sets the tone cutoff (200 to 20000 Hz).
    pub fn set_tone_hz(&mut self, hz: f32) {
        self.params.tone_hz = hz.clamp(200.0, 20000.0);
        self.tone_l.set_frequency(self.params.tone_hz);
        self.tone_r.set_frequency(self.params.tone_hz);
    }

    /// Sets the makeup gain (-24 to 24 dB).
    pub fn set_makeup_db(&mut self, db: f32) {
        self.params.makeup_db = db.clamp(-24.0, 24.0);
        self.makeup = db_to_linear(self.params.makeup_db);
    }

    /// Sets the wet/dry blend (0 to 1).
    pub fn set_mix(&mut self, mix: f32) {
        self.params.mix = mix.clamp(0.0, 1.0);
    }

}

#[inline]
fn shape(tone: &mut OnePole, drive: f32, makeup: f32, mix: f32, input: f32) -> f32 {
    let wet = tone.process(soft_clip(input * drive)) * makeup;
    wet_dry_mix(input, wet, mix)
}

impl Effect for Saturation {
    effect_identity!();

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        shape(&mut self.tone_l, self.drive, self.makeup, self.params.mix, input)
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let (drive, makeup, mix) = (self.drive, self.makeup, self.params.mix);
        (
            shape(&mut self.tone_l, drive, makeup, mix, left),
            shape(&mut self.tone_r, drive, makeup, mix, right),
        )
    }

    fn reset(&mut self) {
        self.tone_l.reset();
        self.tone_r.reset();
    }
}

impl_stateful!(Saturation, SaturationParams);

/// Hard clipper parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardClipParams {
    /// Clip level, dBFS.
    pub threshold_db: f32,
}

impl Default for HardClipParams {
    fn default() -> Self {
        Self { threshold_db: -6.0 }
    }
}

/// Symmetric hard clipper with a clipped-sample counter.
///
/// # Example
///
/// ```rust
/// use cadenza_core::Effect;
/// use cadenza_effects::HardClip;
///
/// let mut clip = HardClip::new(48000.0);
/// clip.set_threshold_db(0.0);
/// assert_eq!(clip.process(1.5), 1.0);
/// assert_eq!(clip.clip_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct HardClip {
    params: HardClipParams,
    threshold: f32,
    clip_count: u64,
    enabled: bool,
}

impl HardClip {
    /// Registry tag.
    pub const KIND: &'static str = "hard_clip";

    /// Creates a clipper at -6 dBFS.
    pub fn new(_sample_rate: f32) -> Self {
        let mut clip = Self {
            params: HardClipParams::default(),
            threshold: 1.0,
            clip_count: 0,
            enabled: true,
        };
        clip.set_params(HardClipParams::default());
        clip
    }

    /// Current parameters.
    pub fn params(&self) -> &HardClipParams {
        &self.params
    }

    /// Applies every parameter, clamping each to its range.
    pub fn set_params(&mut self, params: HardClipParams) {
        self.set_threshold_db(params.threshold_db);
    }

    /// Sets the clip level (-60 to 0 dB).
    pub fn set_threshold_db(&mut self, db: f32) {
        self.params.threshold_db = db.clamp(-60.0, 0.0);
        self.threshold = db_to_linear(self.params.threshold_db);
    }

    /// Samples clipped since construction or the last reset.
    pub fn clip_count(&self) -> u64 {
        self.clip_count
    }

    #[inline]
    fn clip(&mut self, x: f32) -> f32 {
        if x.abs() > self.threshold {
            self.clip_count += 1;
        }
        x.clamp(-self.threshold, self.threshold)
    }
}

impl Effect for HardClip {
    effect_identity!();

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        self.clip(input)
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        (self.clip(left), self.clip(right))
    }

    fn reset(&mut self) {
        self.clip_count = 0;
    }
}

impl_stateful!(HardClip, HardClipParams);
