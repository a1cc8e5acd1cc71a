//! VU meter: RMS level on a -40..+6 VU scale with needle ballistics.

use cadenza_core::{AudioBuffer, linear_to_db, ms_to_samples, time_coefficient};

use crate::MeterSettings;
use crate::running::RunningMean;

/// Bottom of the scale.
pub const VU_MIN_DB: f32 = -40.0;
/// Top of the scale.
pub const VU_MAX_DB: f32 = 6.0;

/// Needle time constant.
const NEEDLE_TIME_S: f32 = 0.3;

/// Averaging VU meter.
///
/// The mono sum of each block is integrated over the RMS window, offset so
/// `vu_reference_dbfs` reads 0 VU, and clamped to `[-40, +6]`. The needle
/// then moves toward that target with a 300 ms time constant.
#[derive(Debug, Clone)]
pub struct VuMeter {
    squares: RunningMean,
    reference_dbfs: f32,
    needle_coeff: f32,
    needle_db: f32,
}

impl VuMeter {
    /// Creates a meter with 0 VU at -18 dBFS.
    pub fn new(sample_rate: f32) -> Self {
        Self::with_settings(sample_rate, &MeterSettings::default())
    }

    /// Creates a meter from explicit settings.
    pub fn with_settings(sample_rate: f32, settings: &MeterSettings) -> Self {
        let settings = settings.clamped();
        let window = ms_to_samples(settings.rms_window_ms, sample_rate).round() as usize;
        Self {
            squares: RunningMean::new(window),
            reference_dbfs: settings.vu_reference_dbfs,
            needle_coeff: time_coefficient(NEEDLE_TIME_S, sample_rate),
            needle_db: VU_MIN_DB,
        }
    }

    /// Feeds one block.
    pub fn process(&mut self, buffer: &AudioBuffer) {
        for i in 0..buffer.len() {
            let (l, r) = buffer.frame(i);
            let mono = (l + r) * 0.5;
            self.squares.push(mono * mono);
        }
        let target = self.target_db();
        // Closed form of `len` one-pole steps toward a fixed target.
        let remaining = (1.0 - self.needle_coeff).powi(buffer.len() as i32);
        self.needle_db = target + (self.needle_db - target) * remaining;
    }

    /// Unsmoothed reading for the current window.
    pub fn target_db(&self) -> f32 {
        let rms = self.squares.mean().max(0.0).sqrt();
        (linear_to_db(rms) - self.reference_dbfs).clamp(VU_MIN_DB, VU_MAX_DB)
    }

    /// Needle reading in VU dB.
    pub fn vu_db(&self) -> f32 {
        self.needle_db
    }

    /// Needle position on the scale, 0 at -40 and 1 at +6.
    pub fn needle_position(&self) -> f32 {
        (self.needle_db - VU_MIN_DB) / (VU_MAX_DB - VU_MIN_DB)
    }

    /// Sets the dBFS level that reads 0 VU, clamped to `[-40, 0]`.
    pub fn set_reference_dbfs(&mut self, dbfs: f32) {
        self.reference_dbfs = dbfs.clamp(-40.0, 0.0);
    }

    /// Drops the needle to the bottom of the scale.
    pub fn reset(&mut self) {
        self.squares.clear();
        self.needle_db = VU_MIN_DB;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadenza_core::db_to_linear;

    fn tone(dbfs: f32, len: usize) -> AudioBuffer {
        // Peak amplitude whose RMS equals `dbfs`.
        let amp = db_to_linear(dbfs) * core::f32::consts::SQRT_2;
        AudioBuffer::from_mono((0..len).map(|i| amp * (i as f32 * 0.05).sin()).collect())
    }

    #[test]
    fn test_reference_reads_zero_vu() {
        let mut vu = VuMeter::new(48000.0);
        for _ in 0..100 {
            vu.process(&tone(-18.0, 4800));
        }
        assert!(vu.vu_db().abs() < 0.2, "needle at {}", vu.vu_db());
    }

    #[test]
    fn test_scale_limits() {
        let mut vu = VuMeter::new(48000.0);
        assert_eq!(vu.vu_db(), VU_MIN_DB);
        assert_eq!(vu.needle_position(), 0.0);

        for _ in 0..50 {
            vu.process(&tone(0.0, 4800));
        }
        assert!((vu.vu_db() - VU_MAX_DB).abs() < 0.01);
        assert!((vu.needle_position() - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_needle_lags_target() {
        let mut vu = VuMeter::new(48000.0);
        vu.process(&tone(-18.0, 480));
        assert!(vu.vu_db() < vu.target_db(), "needle should still be rising");
    }

    #[test]
    fn test_reference_shift() {
        let mut vu = VuMeter::new(48000.0);
        vu.set_reference_dbfs(-12.0);
        for _ in 0..100 {
            vu.process(&tone(-18.0, 4800));
        }
        assert!((vu.vu_db() + 6.0).abs() < 0.2);
        vu.reset();
        assert_eq!(vu.vu_db(), VU_MIN_DB);
    }
}
