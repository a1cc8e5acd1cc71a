//! Stereo phase correlation and mid/side energy.

use cadenza_core::{AudioBuffer, EPSILON, ms_to_samples};

use crate::MeterSettings;
use crate::running::RunningMean;

/// Windowed phase correlation meter.
///
/// ```text
/// correlation = Σ(L·R) / sqrt(ΣL² · ΣR²)
/// ```
///
/// `+1` is mono, `0` unrelated channels, `-1` polarity-inverted. A silent
/// window has no defined correlation and reads 0.
///
/// # Example
///
/// ```rust
/// use cadenza_analysis::Correlometer;
/// use cadenza_core::AudioBuffer;
///
/// let mut meter = Correlometer::new(48000.0);
/// let left: Vec<f32> = (0..4800).map(|i| (i as f32 * 0.01).sin()).collect();
/// let right = left.iter().map(|x| -x).collect();
/// meter.process(&AudioBuffer::from_stereo(left, right));
/// assert!((meter.correlation() + 1.0).abs() < 1e-3);
/// ```
#[derive(Debug, Clone)]
pub struct Correlometer {
    lr: RunningMean,
    ll: RunningMean,
    rr: RunningMean,
    mid: RunningMean,
    side: RunningMean,
}

impl Correlometer {
    /// Creates a meter with a 100 ms window.
    pub fn new(sample_rate: f32) -> Self {
        Self::with_settings(sample_rate, &MeterSettings::default())
    }

    /// Creates a meter from explicit settings.
    pub fn with_settings(sample_rate: f32, settings: &MeterSettings) -> Self {
        let settings = settings.clamped();
        let window = ms_to_samples(settings.correlation_window_ms, sample_rate).round() as usize;
        Self {
            lr: RunningMean::new(window),
            ll: RunningMean::new(window),
            rr: RunningMean::new(window),
            mid: RunningMean::new(window),
            side: RunningMean::new(window),
        }
    }

    /// Feeds one block. Mono buffers read as perfectly correlated.
    pub fn process(&mut self, buffer: &AudioBuffer) {
        for i in 0..buffer.len() {
            let (l, r) = buffer.frame(i);
            self.lr.push(l * r);
            self.ll.push(l * l);
            self.rr.push(r * r);
            let (m, s) = ((l + r) * 0.5, (l - r) * 0.5);
            self.mid.push(m * m);
            self.side.push(s * s);
        }
    }

    /// Correlation in `[-1, 1]`; 0 when either channel is silent.
    pub fn correlation(&self) -> f32 {
        let denom = (self.ll.sum().max(0.0) * self.rr.sum().max(0.0)).sqrt();
        if denom < f64::from(EPSILON) {
            return 0.0;
        }
        ((self.lr.sum() / denom) as f32).clamp(-1.0, 1.0)
    }

    /// Mean square of the mid signal `(L + R) / 2`.
    pub fn mid_energy(&self) -> f32 {
        self.mid.mean().max(0.0)
    }

    /// Mean square of the side signal `(L - R) / 2`.
    pub fn side_energy(&self) -> f32 {
        self.side.mean().max(0.0)
    }

    /// Share of energy in the side channel, 0 for mono and 1 for fully
    /// out-of-phase material.
    pub fn side_ratio(&self) -> f32 {
        let total = self.mid_energy() + self.side_energy();
        if total < EPSILON { 0.0 } else { self.side_energy() / total }
    }

    /// Clears the window.
    pub fn reset(&mut self) {
        for window in [&mut self.lr, &mut self.ll, &mut self.rr, &mut self.mid, &mut self.side] {
            window.clear();
        }
    }
}
