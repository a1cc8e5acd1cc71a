//! Feedback delays.
//!
//! All four variants share the same core loop per channel:
//!
//! ```text
//! delayed = line.read(delay)
//! line.write(clip(input + feedback * delayed))
//! output  = clip(dry * (1 - mix) + delayed * mix)
//! ```
//!
//! Lines are sized for [`MAX_DELAY_S`] at construction and never reallocated.
//! The read happens before the write, so an impulse at sample 0 with a delay
//! of `d` samples appears at output index `d`.

use cadenza_core::{DelayLine, Effect, clip_unit, ms_to_samples, wet_dry_mix};
use serde::{Deserialize, Serialize};

/// Longest delay any variant can hold, in seconds.
pub const MAX_DELAY_S: f32 = 5.0;
/// Feedback ceiling shared by every variant.
pub const MAX_FEEDBACK: f32 = 0.95;
/// Tap slots in [`MultiTapDelay`].
pub const MAX_TAPS: usize = 8;

/// Converts a delay time to an integer tap that fits in `line`.
#[inline]
fn delay_samples(ms: f32, sample_rate: f32, line: &DelayLine) -> usize {
    let samples = libm::roundf(ms_to_samples(ms, sample_rate)) as usize;
    samples.clamp(1, line.len() - 1)
}

/// One feedback-delay step on a single line.
#[inline]
fn feedback_tap(line: &mut DelayLine, input: f32, delay: usize, feedback: f32, mix: f32) -> f32 {
    let delayed = line.read(delay);
    line.write(clip_unit(input + feedback * delayed));
    clip_unit(wet_dry_mix(input, delayed, mix))
}

fn line_pair(sample_rate: f32) -> (DelayLine, DelayLine) {
    (
        DelayLine::for_duration(MAX_DELAY_S, sample_rate),
        DelayLine::for_duration(MAX_DELAY_S, sample_rate),
    )
}

// ---------------------------------------------------------------------------
// SimpleDelay
// ---------------------------------------------------------------------------

/// Simple delay parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimpleDelayParams {
    /// Delay time.
    pub time_ms: f32,
    /// Feedback amount (0 to 0.95).
    pub feedback: f32,
    /// Wet/dry blend.
    pub mix: f32,
}

impl Default for SimpleDelayParams {
    fn default() -> Self {
        Self {
            time_ms: 250.0,
            feedback: 0.3,
            mix: 0.5,
        }
    }
}

/// Single-tap feedback delay.
///
/// # Example
///
/// ```rust
/// use cadenza_core::Effect;
/// use cadenza_effects::SimpleDelay;
///
/// let mut delay = SimpleDelay::new(44100.0);
/// delay.set_time_ms(100.0);
/// delay.set_mix(1.0);
/// let out: Vec<f32> = (0..4411).map(|i| delay.process(if i == 0 { 1.0 } else { 0.0 })).collect();
/// assert_eq!(out[4410], 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct SimpleDelay {
    params: SimpleDelayParams,
    line_l: DelayLine,
    line_r: DelayLine,
    delay: usize,
    sample_rate: f32,
    enabled: bool,
}

impl SimpleDelay {
    /// Registry tag.
    pub const KIND: &'static str = "simple_delay";

    /// Creates a 250 ms delay with 5 s of buffer.
    pub fn new(sample_rate: f32) -> Self {
        let (line_l, line_r) = line_pair(sample_rate);
        let mut delay = Self {
            params: SimpleDelayParams::default(),
            line_l,
            line_r,
            delay: 1,
            sample_rate,
            enabled: true,
        };
        delay.set_params(SimpleDelayParams::default());
        delay
    }

    /// Current parameters.
    pub fn params(&self) -> &SimpleDelayParams {
        &self.params
    }

    /// Applies every parameter, clamping each to its range.
    pub fn set_params(&mut self, params: SimpleDelayParams) {
        self.set_time_ms(params.time_ms);
        self.set_feedback(params.feedback);
        self.set_mix(params.mix);
    }

    /// Sets the delay time (1 to 5000 ms).
    pub fn set_time_ms(&mut self, ms: f32) {
        self.params.time_ms = ms.clamp(1.0, MAX_DELAY_S * 1000.0);
        self.delay = delay_samples(self.params.time_ms, self.sample_rate, &self.line_l);
    }

    /// Sets the feedback (0 to 0.95).
    pub fn set_feedback(&mut self, feedback: f32) {
        self.params.feedback = feedback.clamp(0.0, MAX_FEEDBACK);
    }

    /// Sets the wet/dry blend (0 to 1).
    pub fn set_mix(&mut self, mix: f32) {
        self.params.mix = mix.clamp(0.0, 1.0);
    }

    /// Delay in whole samples.
    pub fn delay_samples(&self) -> usize {
        self.delay
    }

    fn delay_lines(&self) -> Vec<&DelayLine> {
        vec![&self.line_l, &self.line_r]
    }

    fn delay_lines_mut(&mut self) -> Vec<&mut DelayLine> {
        vec![&mut self.line_l, &mut self.line_r]
    }
}

impl Effect for SimpleDelay {
    effect_identity!();

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let p = self.params;
        feedback_tap(&mut self.line_l, input, self.delay, p.feedback, p.mix)
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let p = self.params;
        (
            feedback_tap(&mut self.line_l, left, self.delay, p.feedback, p.mix),
            feedback_tap(&mut self.line_r, right, self.delay, p.feedback, p.mix),
        )
    }

    fn reset(&mut self) {
        self.line_l.clear();
        self.line_r.clear();
    }
}

impl_stateful!(SimpleDelay, SimpleDelayParams, buffered);

// ---------------------------------------------------------------------------
// PingPongDelay
// ---------------------------------------------------------------------------

/// Ping-pong delay parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PingPongParams {
    /// Delay time.
    pub time_ms: f32,
    /// Feedback amount (0 to 0.95).
    pub feedback: f32,
    /// Wet/dry blend.
    pub mix: f32,
    /// Cross-feed amount; 1 bounces fully between channels, 0 is dual mono.
    pub width: f32,
}

impl Default for PingPongParams {
    fn default() -> Self {
        Self {
            time_ms: 250.0,
            feedback: 0.4,
            mix: 0.5,
            width: 1.0,
        }
    }
}

/// Stereo delay whose repeats alternate between channels.
///
/// Each line is fed from the other channel's delayed signal scaled by `width`
/// and from its own by `1 - width`.
#[derive(Debug, Clone)]
pub struct PingPongDelay {
    params: PingPongParams,
    line_l: DelayLine,
    line_r: DelayLine,
    delay: usize,
    sample_rate: f32,
    enabled: bool,
}

impl PingPongDelay {
    /// Registry tag.
    pub const KIND: &'static str = "ping_pong_delay";

    /// Creates a full-width ping-pong delay.
    pub fn new(sample_rate: f32) -> Self {
        let (line_l, line_r) = line_pair(sample_rate);
        let mut delay = Self {
            params: PingPongParams::default(),
            line_l,
            line_r,
            delay: 1,
            sample_rate,
            enabled: true,
        };
        delay.set_params(PingPongParams::default());
        delay
    }

    /// Current parameters.
    pub fn params(&self) -> &PingPongParams {
        &self.params
    }

    /// Applies every parameter, clamping each to its range.
    pub fn set_params(&mut self, params: PingPongParams) {
        self.set_time_ms(params.time_ms);
        self.set_feedback(params.feedback);
        self.set_mix(params.mix);
        self.set_width(params.width);
    }

    /// Sets the delay time (1 to 5000 ms).
    pub fn set_time_ms(&mut self, ms: f32) {
        self.params.time_ms = ms.clamp(1.0, MAX_DELAY_S * 1000.0);
        self.delay = delay_samples(self.params.time_ms, self.sample_rate, &self.line_l);
    }

    /// Sets the feedback (0 to 0.95).
    pub fn set_feedback(&mut self, feedback: f32) {
        self.params.feedback = feedback.clamp(0.0, MAX_FEEDBACK);
    }

    /// Sets the wet/dry blend (0 to 1).
    pub fn set_mix(&mut self, mix: f32) {
        self.params.mix = mix.clamp(0.0, 1.0);
    }

    /// Sets the cross-feed amount (0 to 1).
    pub fn set_width(&mut self, width: f32) {
        self.params.width = width.clamp(0.0, 1.0);
    }

    fn delay_lines(&self) -> Vec<&DelayLine> {
        vec![&self.line_l, &self.line_r]
    }

    fn delay_lines_mut(&mut self) -> Vec<&mut DelayLine> {
        vec![&mut self.line_l, &mut self.line_r]
    }
}

impl Effect for PingPongDelay {
    effect_identity!();

    /// Mono input has nothing to bounce against; behaves as a simple delay.
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let p = self.params;
        feedback_tap(&mut self.line_l, input, self.delay, p.feedback, p.mix)
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let p = self.params;
        let dl = self.line_l.read(self.delay);
        let dr = self.line_r.read(self.delay);
        let w = p.width;

        self.line_l
            .write(clip_unit(left + p.feedback * (w * dr + (1.0 - w) * dl)));
        self.line_r
            .write(clip_unit(right + p.feedback * (w * dl + (1.0 - w) * dr)));

        (
            clip_unit(wet_dry_mix(left, dl, p.mix)),
            clip_unit(wet_dry_mix(right, dr, p.mix)),
        )
    }

    fn reset(&mut self) {
        self.line_l.clear();
        self.line_r.clear();
    }
}

impl_stateful!(PingPongDelay, PingPongParams, buffered);

// ---------------------------------------------------------------------------
// MultiTapDelay
// ---------------------------------------------------------------------------

/// Multi-tap delay parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiTapParams {
    /// Spacing between taps; tap `i` sits at `i * base_ms`.
    pub base_ms: f32,
    /// Active taps (1 to 8).
    pub taps: usize,
    /// Per-tap levels; only the first `taps` are used.
    pub levels: [f32; MAX_TAPS],
    /// Feedback of the summed taps.
    pub feedback: f32,
    /// Wet/dry blend.
    pub mix: f32,
}

impl Default for MultiTapParams {
    fn default() -> Self {
        Self {
            base_ms: 125.0,
            taps: 4,
            levels: [0.4, 0.3, 0.2, 0.1, 0.0, 0.0, 0.0, 0.0],
            feedback: 0.2,
            mix: 0.5,
        }
    }
}

/// Delay with up to eight equally spaced taps.
#[derive(Debug, Clone)]
pub struct MultiTapDelay {
    params: MultiTapParams,
    line_l: DelayLine,
    line_r: DelayLine,
    tap_delays: [usize; MAX_TAPS],
    sample_rate: f32,
    enabled: bool,
}

impl MultiTapDelay {
    /// Registry tag.
    pub const KIND: &'static str = "multi_tap_delay";

    /// Creates a four-tap delay at 125 ms spacing.
    pub fn new(sample_rate: f32) -> Self {
        let (line_l, line_r) = line_pair(sample_rate);
        let mut delay = Self {
            params: MultiTapParams::default(),
            line_l,
            line_r,
            tap_delays: [1; MAX_TAPS],
            sample_rate,
            enabled: true,
        };
        delay.set_params(MultiTapParams::default());
        delay
    }

    /// Current parameters.
    pub fn params(&self) -> &MultiTapParams {
        &self.params
    }

    /// Applies every parameter, clamping each to its range.
    ///
    /// Levels are taken as given; they are not renormalised here.
    pub fn set_params(&mut self, params: MultiTapParams) {
        self.params.taps = params.taps.clamp(1, MAX_TAPS);
        for (i, level) in params.levels.into_iter().enumerate() {
            self.set_tap_level(i, level);
        }
        self.set_base_ms(params.base_ms);
        self.set_feedback(params.feedback);
        self.set_mix(params.mix);
    }

    /// Sets the tap spacing (1 to 625 ms, so eight taps fit in the buffer).
    pub fn set_base_ms(&mut self, ms: f32) {
        self.params.base_ms = ms.clamp(1.0, MAX_DELAY_S * 1000.0 / MAX_TAPS as f32);
        for (i, slot) in self.tap_delays.iter_mut().enumerate() {
            let ms = self.params.base_ms * (i + 1) as f32;
            *slot = delay_samples(ms, self.sample_rate, &self.line_l);
        }
    }

    /// Sets the number of active taps (1 to 8).
    ///
    /// A change in count rescales the active levels so they sum to 1.
    pub fn set_taps(&mut self, taps: usize) {
        let taps = taps.clamp(1, MAX_TAPS);
        if taps == self.params.taps {
            return;
        }
        self.params.taps = taps;

        let active = &mut self.params.levels[..taps];
        let sum: f32 = active.iter().sum();
        if sum > 0.0 {
            active.iter_mut().for_each(|l| *l /= sum);
        } else {
            active.fill(1.0 / taps as f32);
        }
    }

    /// Sets one tap's level (0 to 1). Out-of-range indices are ignored.
    pub fn set_tap_level(&mut self, index: usize, level: f32) {
        if let Some(slot) = self.params.levels.get_mut(index) {
            *slot = level.clamp(0.0, 1.0);
        }
    }

    /// Sets the feedback (0 to 0.95).
    pub fn set_feedback(&mut self, feedback: f32) {
        self.params.feedback = feedback.clamp(0.0, MAX_FEEDBACK);
    }

    /// Sets the wet/dry blend (0 to 1).
    pub fn set_mix(&mut self, mix: f32) {
        self.params.mix = mix.clamp(0.0, 1.0);
    }

    #[inline]
    fn taps_of(&self, line: &DelayLine) -> f32 {
        let n = self.params.taps;
        self.tap_delays[..n]
            .iter()
            .zip(&self.params.levels[..n])
            .map(|(&d, &level)| line.read(d) * level)
            .sum()
    }

    fn delay_lines(&self) -> Vec<&DelayLine> {
        vec![&self.line_l, &self.line_r]
    }

    fn delay_lines_mut(&mut self) -> Vec<&mut DelayLine> {
        vec![&mut self.line_l, &mut self.line_r]
    }
}

impl Effect for MultiTapDelay {
    effect_identity!();

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let wet = self.taps_of(&self.line_l);
        self.line_l.write(clip_unit(input + self.params.feedback * wet));
        clip_unit(wet_dry_mix(input, wet, self.params.mix))
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let wet_l = self.taps_of(&self.line_l);
        let wet_r = self.taps_of(&self.line_r);
        let (fb, mix) = (self.params.feedback, self.params.mix);
        self.line_l.write(clip_unit(left + fb * wet_l));
        self.line_r.write(clip_unit(right + fb * wet_r));
        (
            clip_unit(wet_dry_mix(left, wet_l, mix)),
            clip_unit(wet_dry_mix(right, wet_r, mix)),
        )
    }

    fn reset(&mut self) {
        self.line_l.clear();
        self.line_r.clear();
    }
}

impl_stateful!(MultiTapDelay, MultiTapParams, buffered);

// ---------------------------------------------------------------------------
// StereoDelay
// ---------------------------------------------------------------------------

/// Stereo delay parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StereoDelayParams {
    /// Left channel delay time.
    pub left_ms: f32,
    /// Right channel delay time.
    pub right_ms: f32,
    /// Feedback amount (0 to 0.95).
    pub feedback: f32,
    /// Wet/dry blend.
    pub mix: f32,
}

impl Default for StereoDelayParams {
    fn default() -> Self {
        Self {
            left_ms: 250.0,
            right_ms: 375.0,
            feedback: 0.3,
            mix: 0.5,
        }
    }
}

/// Dual delay with independent per-channel times.
#[derive(Debug, Clone)]
pub struct StereoDelay {
    params: StereoDelayParams,
    line_l: DelayLine,
    line_r: DelayLine,
    delay_l: usize,
    delay_r: usize,
    sample_rate: f32,
    enabled: bool,
}

impl StereoDelay {
    /// Registry tag.
    pub const KIND: &'static str = "stereo_delay";

    /// Creates a 250/375 ms stereo delay.
    pub fn new(sample_rate: f32) -> Self {
        let (line_l, line_r) = line_pair(sample_rate);
        let mut delay = Self {
            params: StereoDelayParams::default(),
            line_l,
            line_r,
            delay_l: 1,
            delay_r: 1,
            sample_rate,
            enabled: true,
        };
        delay.set_params(StereoDelayParams::default());
        delay
    }

    /// Current parameters.
    pub fn params(&self) -> &StereoDelayParams {
        &self.params
    }

    /// Applies every parameter, clamping each to its range.
    pub fn set_params(&mut self, params: StereoDelayParams) {
        self.set_left_ms(params.left_ms);
        self.set_right_ms(params.right_ms);
        self.set_feedback(params.feedback);
        self.set_mix(params.mix);
    }

    /// Sets the left delay time (1 to 5000 ms).
    pub fn set_left_ms(&mut self, ms: f32) {
        self.params.left_ms = ms.clamp(1.0, MAX_DELAY_S * 1000.0);
        self.delay_l = delay_samples(self.params.left_ms, self.sample_rate, &self.line_l);
    }

    /// Sets the right delay time (1 to 5000 ms).
    pub fn set_right_ms(&mut self, ms: f32) {
        self.params.right_ms = ms.clamp(1.0, MAX_DELAY_S * 1000.0);
        self.delay_r = delay_samples(self.params.right_ms, self.sample_rate, &self.line_r);
    }

    /// Sets the feedback (0 to 0.95).
    pub fn set_feedback(&mut self, feedback: f32) {
        self.params.feedback = feedback.clamp(0.0, MAX_FEEDBACK);
    }

    /// Sets the wet/dry blend (0 to 1).
    pub fn set_mix(&mut self, mix: f32) {
        self.params.mix = mix.clamp(0.0, 1.0);
    }

    fn delay_lines(&self) -> Vec<&DelayLine> {
        vec![&self.line_l, &self.line_r]
    }

    fn delay_lines_mut(&mut self) -> Vec<&mut DelayLine> {
        vec![&mut self.line_l, &mut self.line_r]
    }
}

impl Effect for StereoDelay {
    effect_identity!();

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let p = self.params;
        feedback_tap(&mut self.line_l, input, self.delay_l, p.feedback, p.mix)
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let p = self.params;
        (
            feedback_tap(&mut self.line_l, left, self.delay_l, p.feedback, p.mix),
            feedback_tap(&mut self.line_r, right, self.delay_r, p.feedback, p.mix),
        )
    }

    fn reset(&mut self) {
        self.line_l.clear();
        self.line_r.clear();
    }
}

impl_stateful!(StereoDelay, StereoDelayParams, buffered);

#[cfg(test)]
mod tests {
    use super::*;
    use cadenza_core::Stateful;

    fn impulse_response(effect: &mut dyn Effect, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| effect.process(if i == 0 { 1.0 } else { 0.0 }))
            .collect()
    }

    fn argmax(samples: &[f32]) -> usize {
        samples
            .iter()
            .enumerate()
            .skip(1)
            .fold((0, 0.0f32), |best, (i, &x)| if x.abs() > best.1 { (i, x.abs()) } else { best })
            .0
    }

    #[test]
    fn test_simple_delay_timing() {
        let mut delay = SimpleDelay::new(44100.0);
        delay.set_time_ms(100.0);
        delay.set_feedback(0.0);
        let out = impulse_response(&mut delay, 6000);
        assert_eq!(argmax(&out), 4410);
        assert_eq!(delay.delay_samples(), 4410);
    }

    #[test]
    fn test_feedback_repeats_decay() {
        let mut delay = SimpleDelay::new(1000.0);
        delay.set_time_ms(10.0);
        delay.set_feedback(0.5);
        delay.set_mix(1.0);
        let out = impulse_response(&mut delay, 40);
        assert_eq!(out[10], 1.0);
        assert_eq!(out[20], 0.5);
        assert_eq!(out[30], 0.25);
    }

    #[test]
    fn test_feedback_clamped() {
        let mut delay = SimpleDelay::new(48000.0);
        delay.set_feedback(1.5);
        assert_eq!(delay.params().feedback, MAX_FEEDBACK);
    }

    #[test]
    fn test_ping_pong_alternates() {
        let mut delay = PingPongDelay::new(1000.0);
        delay.set_time_ms(10.0);
        delay.set_feedback(0.5);
        delay.set_mix(1.0);

        let mut out = Vec::new();
        for i in 0..30 {
            out.push(delay.process_stereo(if i == 0 { 1.0 } else { 0.0 }, 0.0));
        }
        assert_eq!(out[10], (1.0, 0.0));
        assert_eq!(out[20], (0.0, 0.5));
    }

    #[test]
    fn test_multi_tap_positions() {
        let mut delay = MultiTapDelay::new(1000.0);
        delay.set_base_ms(5.0);
        delay.set_feedback(0.0);
        delay.set_mix(1.0);
        let out = impulse_response(&mut delay, 25);
        assert_eq!(out[5], 0.4);
        assert_eq!(out[10], 0.3);
        assert_eq!(out[15], 0.2);
        assert!((out[20] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_multi_tap_normalises_on_count_change() {
        let mut delay = MultiTapDelay::new(48000.0);
        delay.set_tap_level(0, 1.0);
        delay.set_tap_level(1, 1.0);
        // Editing levels alone never rescales
        assert_eq!(delay.params().levels[0], 1.0);

        delay.set_taps(2);
        let levels = delay.params().levels;
        assert!((levels[0] - 0.5).abs() < 1e-6);
        assert!((levels[1] - 0.5).abs() < 1e-6);

        delay.set_taps(2);
        assert_eq!(delay.params().levels, levels);
    }

    #[test]
    fn test_stereo_delay_independent_times() {
        let mut delay = StereoDelay::new(1000.0);
        delay.set_left_ms(5.0);
        delay.set_right_ms(8.0);
        delay.set_mix(1.0);
        delay.set_feedback(0.0);

        let out: Vec<(f32, f32)> = (0..10)
            .map(|i| {
                let x = if i == 0 { 1.0 } else { 0.0 };
                delay.process_stereo(x, x)
            })
            .collect();
        assert_eq!(out[5].0, 1.0);
        assert_eq!(out[5].1, 0.0);
        assert_eq!(out[8].1, 1.0);
    }

    #[test]
    fn test_snapshot_continues_tail() {
        let mut delay = SimpleDelay::new(1000.0);
        delay.set_time_ms(10.0);
        delay.set_mix(1.0);
        delay.process(1.0);
        for _ in 0..3 {
            delay.process(0.0);
        }

        let mut restored = SimpleDelay::new(1000.0);
        restored.load_dict(&delay.snapshot());
        for _ in 0..20 {
            assert_eq!(restored.process(0.0), delay.process(0.0));
        }
    }
}
