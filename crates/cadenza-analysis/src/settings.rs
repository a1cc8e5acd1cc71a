//! Meter configuration shared by the meters and session config.

use serde::{Deserialize, Serialize};

use crate::Window;

/// Ballistics and analysis sizes for a [`MeterBank`](crate::MeterBank).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterSettings {
    /// How long a new peak is held before it starts to fall.
    pub peak_hold_ms: f32,
    /// Fall rate of the held peak.
    pub peak_decay_db_per_s: f32,
    /// RMS integration window, also used by the VU meter.
    pub rms_window_ms: f32,
    /// Blocks of level history kept.
    pub history_len: usize,
    /// FFT frame length; rounded up to a power of two.
    pub fft_size: usize,
    /// Spectrum frame window.
    pub window: Window,
    /// Spectrum smoothing factor in `[0, 0.99]`; 0 shows each frame raw.
    pub spectrum_smoothing: f32,
    /// Logarithmic summary bands reported by the spectrum.
    pub band_count: usize,
    /// dBFS level that reads 0 VU.
    pub vu_reference_dbfs: f32,
    /// Phase correlation window.
    pub correlation_window_ms: f32,
}

impl Default for MeterSettings {
    fn default() -> Self {
        Self {
            peak_hold_ms: 1000.0,
            peak_decay_db_per_s: 20.0,
            rms_window_ms: 300.0,
            history_len: 64,
            fft_size: 2048,
            window: Window::Hann,
            spectrum_smoothing: 0.8,
            band_count: 10,
            vu_reference_dbfs: -18.0,
            correlation_window_ms: 100.0,
        }
    }
}

impl MeterSettings {
    /// Smallest accepted FFT size.
    pub const MIN_FFT_SIZE: usize = 64;
    /// Largest accepted FFT size.
    pub const MAX_FFT_SIZE: usize = 32768;

    /// Copy with every field forced into its valid range.
    pub fn clamped(&self) -> Self {
        Self {
            peak_hold_ms: self.peak_hold_ms.clamp(0.0, 10_000.0),
            peak_decay_db_per_s: self.peak_decay_db_per_s.clamp(1.0, 200.0),
            rms_window_ms: self.rms_window_ms.clamp(1.0, 5000.0),
            history_len: self.history_len.clamp(1, 4096),
            fft_size: self
                .fft_size
                .clamp(Self::MIN_FFT_SIZE, Self::MAX_FFT_SIZE)
                .next_power_of_two(),
            window: self.window,
            spectrum_smoothing: self.spectrum_smoothing.clamp(0.0, 0.99),
            band_count: self.band_count.clamp(1, 64),
            vu_reference_dbfs: self.vu_reference_dbfs.clamp(-40.0, 0.0),
            correlation_window_ms: self.correlation_window_ms.clamp(1.0, 5000.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_already_valid() {
        let settings = MeterSettings::default();
        assert_eq!(settings.clamped(), settings);
    }

    #[test]
    fn test_fft_size_rounded() {
        let settings = MeterSettings {
            fft_size: 3000,
            spectrum_smoothing: 2.0,
            ..MeterSettings::default()
        };
        let clamped = settings.clamped();
        assert_eq!(clamped.fft_size, 4096);
        assert_eq!(clamped.spectrum_smoothing, 0.99);
        assert_eq!(MeterSettings { fft_size: 1, ..settings }.clamped().fft_size, 64);
    }
}
