//! Freeverb-style algorithmic reverb.
//!
//! # Topology
//!
//! ```text
//!              ┌─ comb ×8 (L) ─┐ avg   ┌─ allpass ×4 ─┐
//! (L+R)/2 ─────┤               ├──────►│   series     ├─► wet L ┐
//!              └─ comb ×8 (R) ─┘ avg   └─ allpass ×4 ─┘  wet R ┤ width → + dry → clip
//! ```
//!
//! Comb lengths are the canonical 44.1 kHz tunings scaled to the running
//! rate; the right bank adds a stereo spread of 23 samples. Comb feedback is
//! `0.84 + room_size * 0.16`, capped at 0.99. Every internal write is
//! clipped to `[-1, 1]`, so the output is bounded for any parameter set.

use cadenza_core::{AllpassFilter, CombFilter, DelayLine, Effect, clip_unit, mid_side_width};
use serde::{Deserialize, Serialize};

/// Snapshot key for the comb damping filter states, left bank first.
const COMB_FILTERS_KEY: &str = "comb_filters";

/// Freeverb comb filter delay times at 44.1 kHz; mutually prime.
const COMB_TUNINGS_44K: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];

/// Freeverb allpass filter delay times at 44.1 kHz.
const ALLPASS_TUNINGS_44K: [usize; 4] = [556, 441, 341, 225];

/// Right channel offset, in samples at 44.1 kHz.
const STEREO_SPREAD: usize = 23;

const REFERENCE_RATE: f32 = 44100.0;
const FEEDBACK_BASE: f32 = 0.84;
const ALLPASS_FEEDBACK: f32 = 0.5;

/// Scale delay times from the reference rate to the target rate.
fn scale_to_rate(samples: usize, sample_rate: f32) -> usize {
    ((samples as f32 * sample_rate / REFERENCE_RATE).round() as usize).max(1)
}

/// Reverb parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverbParams {
    /// 0 to 1; scales comb feedback.
    pub room_size: f32,
    /// 0 (bright) to 1 (dark).
    pub damping: f32,
    /// Reverberated signal level.
    pub wet_level: f32,
    /// Direct signal level.
    pub dry_level: f32,
    /// Stereo width of the wet signal (0 mono, 1 full).
    pub width: f32,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            room_size: 0.5,
            damping: 0.5,
            wet_level: 0.33,
            dry_level: 0.7,
            width: 1.0,
        }
    }
}

/// Immutable bundle of reverb settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbPreset {
    /// Room size.
    pub room_size: f32,
    /// Damping.
    pub damping: f32,
    /// Wet level.
    pub wet_level: f32,
    /// Dry level.
    pub dry_level: f32,
    /// Width.
    pub width: f32,
}

impl ReverbPreset {
    /// Large, bright hall.
    pub const HALL: Self = Self {
        room_size: 0.9,
        damping: 0.3,
        wet_level: 0.45,
        dry_level: 0.6,
        width: 1.0,
    };

    /// Dense, very bright plate.
    pub const PLATE: Self = Self {
        room_size: 0.7,
        damping: 0.1,
        wet_level: 0.4,
        dry_level: 0.7,
        width: 0.9,
    };

    /// Small, dark room.
    pub const ROOM: Self = Self {
        room_size: 0.4,
        damping: 0.6,
        wet_level: 0.3,
        dry_level: 0.8,
        width: 0.7,
    };
}

impl From<ReverbPreset> for ReverbParams {
    fn from(p: ReverbPreset) -> Self {
        Self {
            room_size: p.room_size,
            damping: p.damping,
            wet_level: p.wet_level,
            dry_level: p.dry_level,
            width: p.width,
        }
    }
}

/// Stereo Freeverb.
///
/// # Example
///
/// ```rust
/// use cadenza_core::Effect;
/// use cadenza_effects::Reverb;
///
/// let mut reverb = Reverb::hall(48000.0);
/// let (l, r) = reverb.process_stereo(0.5, 0.5);
/// assert!(l.abs() <= 1.0 && r.abs() <= 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct Reverb {
    params: ReverbParams,
    combs_l: Vec<CombFilter>,
    combs_r: Vec<CombFilter>,
    allpasses_l: Vec<AllpassFilter>,
    allpasses_r: Vec<AllpassFilter>,
    enabled: bool,
}

impl Reverb {
    /// Registry tag.
    pub const KIND: &'static str = "reverb";

    /// Creates a reverb with default settings.
    pub fn new(sample_rate: f32) -> Self {
        let bank = |spread: usize| -> Vec<CombFilter> {
            COMB_TUNINGS_44K
                .iter()
                .map(|&t| CombFilter::new(scale_to_rate(t + spread, sample_rate)))
                .collect()
        };
        let diffusers = |spread: usize| -> Vec<AllpassFilter> {
            ALLPASS_TUNINGS_44K
                .iter()
                .map(|&t| {
                    let mut ap = AllpassFilter::new(scale_to_rate(t + spread, sample_rate));
                    ap.set_feedback(ALLPASS_FEEDBACK);
                    ap
                })
                .collect()
        };

        let mut reverb = Self {
            params: ReverbParams::default(),
            combs_l: bank(0),
            combs_r: bank(STEREO_SPREAD),
            allpasses_l: diffusers(0),
            allpasses_r: diffusers(STEREO_SPREAD),
            enabled: true,
        };
        reverb.set_params(ReverbParams::default());
        reverb
    }

    /// Creates a reverb with a preset applied.
    pub fn with_preset(sample_rate: f32, preset: ReverbPreset) -> Self {
        let mut reverb = Self::new(sample_rate);
        reverb.apply_preset(preset);
        reverb
    }

    /// Large hall.
    pub fn hall(sample_rate: f32) -> Self {
        Self::with_preset(sample_rate, ReverbPreset::HALL)
    }

    /// Plate.
    pub fn plate(sample_rate: f32) -> Self {
        Self::with_preset(sample_rate, ReverbPreset::PLATE)
    }

    /// Small room.
    pub fn room(sample_rate: f32) -> Self {
        Self::with_preset(sample_rate, ReverbPreset::ROOM)
    }

    /// Current parameters.
    pub fn params(&self) -> &ReverbParams {
        &self.params
    }

    /// Applies every parameter, clamping each to its range.
    pub fn set_params(&mut self, params: ReverbParams) {
        self.set_room_size(params.room_size);
        self.set_damping(params.damping);
        self.set_wet_level(params.wet_level);
        self.set_dry_level(params.dry_level);
        self.set_width(params.width);
    }

    /// Replaces every setting with the preset's.
    pub fn apply_preset(&mut self, preset: ReverbPreset) {
        self.set_params(preset.into());
    }

    /// Sets the room size (0 to 1).
    pub fn set_room_size(&mut self, size: f32) {
        self.params.room_size = size.clamp(0.0, 1.0);
        let feedback = (FEEDBACK_BASE + self.params.room_size * (1.0 - FEEDBACK_BASE)).min(0.99);
        for comb in self.combs_l.iter_mut().chain(&mut self.combs_r) {
            comb.set_feedback(feedback);
        }
    }

    /// Sets the damping (0 to 1).
    pub fn set_damping(&mut self, damping: f32) {
        self.params.damping = damping.clamp(0.0, 1.0);
        for comb in self.combs_l.iter_mut().chain(&mut self.combs_r) {
            comb.set_damp(self.params.damping);
        }
    }

    /// Sets the wet level (0 to 1).
    pub fn set_wet_level(&mut self, level: f32) {
        self.params.wet_level = level.clamp(0.0, 1.0);
    }

    /// Sets the dry level (0 to 1).
    pub fn set_dry_level(&mut self, level: f32) {
        self.params.dry_level = level.clamp(0.0, 1.0);
    }

    /// Sets the wet stereo width (0 to 1).
    pub fn set_width(&mut self, width: f32) {
        self.params.width = width.clamp(0.0, 1.0);
    }

    /// Comb feedback currently in use.
    pub fn feedback(&self) -> f32 {
        self.combs_l.first().map_or(0.0, CombFilter::feedback)
    }

    #[inline]
    fn tank(combs: &mut [CombFilter], allpasses: &mut [AllpassFilter], input: f32) -> f32 {
        let sum: f32 = combs.iter_mut().map(|c| c.process(input)).sum();
        let mut out = sum / combs.len() as f32;
        for ap in allpasses.iter_mut() {
            out = ap.process(out);
        }
        out
    }

    fn delay_lines(&self) -> Vec<&DelayLine> {
        let combs = self.combs_l.iter().chain(&self.combs_r).map(CombFilter::delay_line);
        let aps = self
            .allpasses_l
            .iter()
            .chain(&self.allpasses_r)
            .map(AllpassFilter::delay_line);
        combs.chain(aps).collect()
    }

    fn delay_lines_mut(&mut self) -> Vec<&mut DelayLine> {
        let combs = self
            .combs_l
            .iter_mut()
            .chain(&mut self.combs_r)
            .map(CombFilter::delay_line_mut);
        let aps = self
            .allpasses_l
            .iter_mut()
            .chain(&mut self.allpasses_r)
            .map(AllpassFilter::delay_line_mut);
        combs.chain(aps).collect()
    }
}

impl Effect for Reverb {
    effect_identity!();

    /// Mono path runs the left bank only.
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let wet = Self::tank(&mut self.combs_l, &mut self.allpasses_l, input);
        clip_unit(wet * self.params.wet_level + input * self.params.dry_level)
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let input = (left + right) * 0.5;
        let wet_l = Self::tank(&mut self.combs_l, &mut self.allpasses_l, input);
        let wet_r = Self::tank(&mut self.combs_r, &mut self.allpasses_r, input);
        let (wet_l, wet_r) = mid_side_width(wet_l, wet_r, self.params.width);

        let p = &self.params;
        (
            clip_unit(wet_l * p.wet_level + left * p.dry_level),
            clip_unit(wet_r * p.wet_level + right * p.dry_level),
        )
    }

    fn reset(&mut self) {
        for comb in self.combs_l.iter_mut().chain(&mut self.combs_r) {
            comb.clear();
        }
        for ap in self.allpasses_l.iter_mut().chain(&mut self.allpasses_r) {
            ap.clear();
        }
    }
}

impl cadenza_core::Stateful for Reverb {
    fn to_dict(&self) -> serde_json::Value {
        cadenza_core::effect_dict(Self::KIND, self.enabled, &self.params)
    }

    fn load_dict(&mut self, dict: &serde_json::Value) {
        let (params, enabled) = cadenza_core::decode_effect::<ReverbParams>(Self::KIND, dict);
        self.set_params(params);
        self.enabled = enabled;
        cadenza_core::restore_buffers(Self::KIND, dict, self.delay_lines_mut());

        let Some(value) = dict.get(COMB_FILTERS_KEY) else {
            return;
        };
        let states: Vec<f32> = match serde_json::from_value(value.clone()) {
            Ok(states) => states,
            Err(err) => {
                tracing::warn!(kind = Self::KIND, %err, "malformed comb filter state ignored");
                return;
            }
        };
        let combs = self.combs_l.iter_mut().chain(&mut self.combs_r);
        if states.len() != 2 * COMB_TUNINGS_44K.len() {
            tracing::warn!(
                kind = Self::KIND,
                captured = states.len(),
                "comb filter count mismatch"
            );
        }
        for (comb, state) in combs.zip(states) {
            comb.set_filter_state(state);
        }
    }

    /// Captures the delay lines plus each comb's damping filter memory, so a
    /// restored reverb continues sample-exactly.
    fn snapshot(&self) -> serde_json::Value {
        let mut dict = self.to_dict();
        cadenza_core::attach_buffers(&mut dict, self.delay_lines());
        let states: Vec<f32> = self
            .combs_l
            .iter()
            .chain(&self.combs_r)
            .map(CombFilter::filter_state)
            .collect();
        if let Some(map) = dict.as_object_mut() {
            map.insert(COMB_FILTERS_KEY.to_owned(), serde_json::json!(states));
        }
        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadenza_core::Stateful;

    #[test]
    fn test_comb_lengths_scale_with_rate() {
        let at_44 = Reverb::new(44100.0);
        let at_88 = Reverb::new(88200.0);
        assert_eq!(at_44.combs_l[0].len(), 1116);
        assert_eq!(at_44.combs_r[0].len(), 1116 + 23);
        assert_eq!(at_88.combs_l[0].len(), 2232);
        assert_eq!(at_44.allpasses_l[3].len(), 225);
    }

    #[test]
    fn test_feedback_formula() {
        let mut reverb = Reverb::new(48000.0);
        reverb.set_room_size(0.0);
        assert!((reverb.feedback() - 0.84).abs() < 1e-6);
        reverb.set_room_size(0.5);
        assert!((reverb.feedback() - 0.92).abs() < 1e-6);
        reverb.set_room_size(1.0);
        assert!((reverb.feedback() - 0.99).abs() < 1e-6);
    }

    #[test]
    fn test_presets() {
        let hall = Reverb::hall(48000.0);
        assert_eq!(hall.params().room_size, 0.9);
        assert_eq!(hall.params().wet_level, 0.45);

        let mut reverb = Reverb::room(48000.0);
        assert_eq!(reverb.params().width, 0.7);
        reverb.apply_preset(ReverbPreset::PLATE);
        assert_eq!(*reverb.params(), ReverbParams::from(ReverbPreset::PLATE));
    }

    #[test]
    fn test_tail_after_impulse() {
        let mut reverb = Reverb::new(44100.0);
        reverb.set_dry_level(0.0);
        reverb.process_stereo(1.0, 1.0);
        let tail: f32 = (0..44100)
            .map(|_| {
                let (l, r) = reverb.process_stereo(0.0, 0.0);
                l.abs() + r.abs()
            })
            .sum();
        assert!(tail > 0.1, "reverb should ring after an impulse, got {tail}");
    }

    #[test]
    fn test_zero_width_is_mono_wet() {
        let mut reverb = Reverb::new(44100.0);
        reverb.set_width(0.0);
        reverb.set_dry_level(0.0);
        reverb.process_stereo(1.0, 1.0);
        for _ in 0..3000 {
            let (l, r) = reverb.process_stereo(0.0, 0.0);
            assert!((l - r).abs() < 1e-6);
        }
    }

    #[test]
    fn test_snapshot_captures_all_lines() {
        let mut reverb = Reverb::new(44100.0);
        for i in 0..500 {
            reverb.process_stereo((i as f32 * 0.1).sin(), 0.0);
        }
        let snap = reverb.snapshot();
        assert_eq!(snap["buffers"].as_array().map(Vec::len), Some(24));

        let mut restored = Reverb::new(44100.0);
        restored.load_dict(&snap);
        assert_eq!(
            restored.combs_l[3].delay_line().contents(),
            reverb.combs_l[3].delay_line().contents()
        );
    }

    #[test]
    fn test_restored_reverb_continues_identically() {
        let mut reverb = Reverb::new(44100.0);
        reverb.set_damping(0.7);
        for i in 0..3000 {
            reverb.process_stereo((i as f32 * 0.05).sin(), (i as f32 * 0.07).cos());
        }
        let snap = reverb.snapshot();
        assert_eq!(snap["comb_filters"].as_array().map(Vec::len), Some(16));

        let mut restored = Reverb::new(44100.0);
        restored.load_dict(&snap);
        assert_eq!(restored.combs_r[5].filter_state(), reverb.combs_r[5].filter_state());
        for _ in 0..2000 {
            assert_eq!(restored.process_stereo(0.0, 0.0), reverb.process_stereo(0.0, 0.0));
        }
    }

    #[test]
    fn test_plain_dict_leaves_comb_filters_cleared() {
        let mut reverb = Reverb::new(44100.0);
        for _ in 0..2000 {
            reverb.process(0.5);
        }
        let mut fresh = Reverb::new(44100.0);
        fresh.load_dict(&reverb.to_dict());
        assert!(fresh.combs_l.iter().all(|c| c.filter_state() == 0.0));
    }
}
