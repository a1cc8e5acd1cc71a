//! Brickwall lookahead limiter.
//!
//! # Algorithm
//!
//! 1. **Lookahead**: input is written to a delay line; the output is read
//!    `lookahead` samples later.
//! 2. **Peak detection**: the whole lookahead window is scanned every sample,
//!    so gain reduction starts before a peak reaches the output.
//! 3. **Gain**: if the window peak exceeds the threshold the target gain is
//!    `threshold / peak`. Reductions apply instantly; recovery follows the
//!    release coefficient `1 - exp(-1 / (release_s * sample_rate))`.
//! 4. **Safety clip**: the result is hard-clipped to `[-1, 1]`.
//!
//! Stereo detection is linked: a peak on either channel reduces both.

use cadenza_core::{DelayLine, Effect, db_to_linear, ms_to_samples, time_coefficient};
use serde::{Deserialize, Serialize};

const MAX_LOOKAHEAD_MS: f32 = 10.0;

/// Limiter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimiterParams {
    /// Ceiling for detected peaks, dBFS.
    pub threshold_db: f32,
    /// Recovery time after a reduction.
    pub release_ms: f32,
    /// Lookahead window; also the reported latency.
    pub lookahead_ms: f32,
}

impl Default for LimiterParams {
    fn default() -> Self {
        Self {
            threshold_db: -1.0,
            release_ms: 50.0,
            lookahead_ms: 5.0,
        }
    }
}

/// Lookahead peak limiter.
#[derive(Debug, Clone)]
pub struct Limiter {
    params: LimiterParams,
    line_l: DelayLine,
    line_r: DelayLine,
    threshold: f32,
    release_coeff: f32,
    lookahead_samples: usize,
    gain: f32,
    sample_rate: f32,
    enabled: bool,
}

impl Limiter {
    /// Registry tag.
    pub const KIND: &'static str = "limiter";

    /// Creates a limiter with default settings.
    pub fn new(sample_rate: f32) -> Self {
        let capacity = ms_to_samples(MAX_LOOKAHEAD_MS, sample_rate) as usize + 2;
        let params = LimiterParams::default();
        let mut limiter = Self {
            params,
            line_l: DelayLine::new(capacity),
            line_r: DelayLine::new(capacity),
            threshold: 1.0,
            release_coeff: 1.0,
            lookahead_samples: 0,
            gain: 1.0,
            sample_rate,
            enabled: true,
        };
        limiter.set_params(params);
        limiter
    }

    /// Current parameters.
    pub fn params(&self) -> &LimiterParams {
        &self.params
    }

    /// Applies every parameter, clamping each to its range.
    pub fn set_params(&mut self, params: LimiterParams) {
        self.set_threshold_db(params.threshold_db);
        self.set_release_ms(params.release_ms);
        self.set_lookahead_ms(params.lookahead_ms);
    }

    /// Sets the threshold (-30 to 0 dB).
    pub fn set_threshold_db(&mut self, db: f32) {
        self.params.threshold_db = db.clamp(-30.0, 0.0);
        self.threshold = db_to_linear(self.params.threshold_db);
    }

    /// Sets the release time (1 to 1000 ms).
    pub fn set_release_ms(&mut self, ms: f32) {
        self.params.release_ms = ms.clamp(1.0, 1000.0);
        self.release_coeff = time_coefficient(self.params.release_ms / 1000.0, self.sample_rate);
    }

    /// Sets the lookahead (0 to 10 ms).
    pub fn set_lookahead_ms(&mut self, ms: f32) {
        self.params.lookahead_ms = ms.clamp(0.0, MAX_LOOKAHEAD_MS);
        self.lookahead_samples = (ms_to_samples(self.params.lookahead_ms, self.sample_rate)
            as usize)
            .min(self.line_l.len() - 1);
    }

    /// Current gain applied to the output (1.0 = no reduction).
    pub fn gain(&self) -> f32 {
        self.gain
    }

    fn delay_lines(&self) -> Vec<&DelayLine> {
        vec![&self.line_l, &self.line_r]
    }

    fn delay_lines_mut(&mut self) -> Vec<&mut DelayLine> {
        vec![&mut self.line_l, &mut self.line_r]
    }

    #[inline]
    fn window_peak(line: &DelayLine, window: usize) -> f32 {
        (1..=window).fold(0.0f32, |peak, d| peak.max(line.read(d).abs()))
    }

    #[inline]
    fn update_gain(&mut self, peak: f32) {
        let target = if peak > self.threshold {
            self.threshold / peak
        } else {
            1.0
        };
        if target < self.gain {
            self.gain = target;
        } else {
            self.gain += self.release_coeff * (target - self.gain);
        }
    }
}

impl Effect for Limiter {
    effect_identity!();

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        self.line_l.write(input);
        let window = self.lookahead_samples + 1;
        let peak = Self::window_peak(&self.line_l, window);
        self.update_gain(peak);
        (self.line_l.read(window) * self.gain).clamp(-1.0, 1.0)
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        self.line_l.write(left);
        self.line_r.write(right);
        let window = self.lookahead_samples + 1;
        let peak = Self::window_peak(&self.line_l, window)
            .max(Self::window_peak(&self.line_r, window));
        self.update_gain(peak);
        (
            (self.line_l.read(window) * self.gain).clamp(-1.0, 1.0),
            (self.line_r.read(window) * self.gain).clamp(-1.0, 1.0),
        )
    }

    fn reset(&mut self) {
        self.line_l.clear();
        self.line_r.clear();
        self.gain = 1.0;
    }

    fn latency_samples(&self) -> usize {
        self.lookahead_samples
    }
}

impl_stateful!(Limiter, LimiterParams, buffered);

#[cfg(test)]
mod tests {
    use super::*;
    use cadenza_core::Stateful;

    #[test]
    fn test_sustained_signal_limited() {
        let mut lim = Limiter::new(48000.0);
        lim.set_threshold_db(-6.0);
        let ceiling = db_to_linear(-6.0);
        let mut last = 0.0;
        for _ in 0..2048 {
            last = lim.process(0.9);
        }
        assert!((last - ceiling).abs() < 1e-4, "expected {ceiling}, got {last}");
    }

    #[test]
    fn test_lookahead_catches_transient() {
        let mut lim = Limiter::new(48000.0);
        lim.set_threshold_db(-6.0);
        let ceiling = db_to_linear(-6.0);

        let mut signal = vec![0.1f32; 1000];
        signal[600] = 1.0;
        for &x in &signal {
            let out = lim.process(x);
            assert!(out.abs() <= ceiling + 1e-6, "peak leaked: {out}");
        }
    }

    #[test]
    fn test_delay_equals_latency() {
        let mut lim = Limiter::new(48000.0);
        let latency = lim.latency_samples();
        assert_eq!(latency, 240);

        let mut first_nonzero = None;
        for i in 0..1000 {
            let x = if i == 0 { 0.1 } else { 0.0 };
            if lim.process(x) != 0.0 && first_nonzero.is_none() {
                first_nonzero = Some(i);
            }
        }
        assert_eq!(first_nonzero, Some(latency));
    }

    #[test]
    fn test_output_always_clipped() {
        let mut lim = Limiter::new(48000.0);
        lim.set_threshold_db(0.0);
        lim.set_lookahead_ms(0.0);
        for i in 0..500 {
            let x = if i % 3 == 0 { 4.0 } else { -3.0 };
            let (l, r) = lim.process_stereo(x, -x);
            assert!(l.abs() <= 1.0 && r.abs() <= 1.0);
        }
    }

    #[test]
    fn test_snapshot_restores_buffers() {
        let mut lim = Limiter::new(48000.0);
        for i in 0..100 {
            lim.process_stereo(i as f32 * 0.001, -0.2);
        }
        let snap = lim.snapshot();
        assert_eq!(snap["buffers"].as_array().map(Vec::len), Some(2));

        let mut restored = Limiter::new(48000.0);
        restored.load_dict(&snap);
        assert_eq!(restored.line_l.contents(), lim.line_l.contents());
        assert_eq!(restored.to_dict(), lim.to_dict());
    }
}
