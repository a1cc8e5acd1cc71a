//! Streaming FFT spectrum analyzer.
//!
//! Samples (mono sum of the block) are written into a circular frame buffer.
//! Every half frame the latest `fft_size` samples are windowed and
//! transformed; bin magnitudes are normalized by the window's coherent gain
//! so a full-scale sine reads close to 1.0 (0 dB) in its bin, then blended
//! into the displayed spectrum:
//!
//! ```text
//! shown[k] = smoothing * shown[k] + (1 - smoothing) * |X[k]|
//! ```
//!
//! All buffers are sized at construction; `process` does not allocate.

use std::sync::Arc;

use cadenza_core::{AudioBuffer, linear_to_db};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};

use crate::{MeterSettings, Window};

/// Lowest frequency covered by [`SpectrumAnalyzer::frequency_bands`].
pub const BANDS_LOW_HZ: f32 = 20.0;

/// One logarithmic summary band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    /// Lower edge.
    pub low_hz: f32,
    /// Upper edge.
    pub high_hz: f32,
    /// Loudest bin in the band, dBFS.
    pub level_db: f32,
}

/// Real-input spectrum analyzer built on `rustfft`.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    sample_rate: f32,
    size: usize,
    window: Window,
    coefficients: Vec<f32>,
    /// Amplitude scale undoing the window's coherent gain.
    norm: f32,
    ring: Vec<f32>,
    write_pos: usize,
    since_frame: usize,
    frame: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
    smoothing: f32,
    band_count: usize,
    frames: u64,
}

impl core::fmt::Debug for SpectrumAnalyzer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpectrumAnalyzer")
            .field("size", &self.size)
            .field("window", &self.window)
            .field("smoothing", &self.smoothing)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

impl SpectrumAnalyzer {
    /// Creates an analyzer with default settings (2048-point Hann).
    pub fn new(sample_rate: f32) -> Self {
        Self::with_settings(sample_rate, &MeterSettings::default())
    }

    /// Creates an analyzer from explicit settings.
    pub fn with_settings(sample_rate: f32, settings: &MeterSettings) -> Self {
        let settings = settings.clamped();
        let size = settings.fft_size;
        let fft = FftPlanner::new().plan_fft_forward(size);
        let scratch = vec![Complex::default(); fft.get_inplace_scratch_len()];
        let mut analyzer = Self {
            fft,
            sample_rate,
            size,
            window: settings.window,
            coefficients: Vec::new(),
            norm: 1.0,
            ring: vec![0.0; size],
            write_pos: 0,
            since_frame: 0,
            frame: vec![Complex::default(); size],
            scratch,
            magnitudes: vec![0.0; size / 2 + 1],
            smoothing: settings.spectrum_smoothing,
            band_count: settings.band_count,
            frames: 0,
        };
        analyzer.set_window(settings.window);
        analyzer
    }

    /// FFT length.
    pub fn fft_size(&self) -> usize {
        self.size
    }

    /// Current window.
    pub fn window(&self) -> Window {
        self.window
    }

    /// Changes the window. Recomputes the coefficient table.
    pub fn set_window(&mut self, window: Window) {
        self.window = window;
        self.coefficients = window.coefficients(self.size);
        let gain: f32 = self.coefficients.iter().sum();
        self.norm = if gain > 0.0 { 2.0 / gain } else { 0.0 };
    }

    /// Sets the smoothing factor, clamped to `[0, 0.99]`.
    pub fn set_smoothing(&mut self, smoothing: f32) {
        self.smoothing = smoothing.clamp(0.0, 0.99);
    }

    /// Sets how many bands [`frequency_bands`](Self::frequency_bands) reports.
    pub fn set_band_count(&mut self, count: usize) {
        self.band_count = count.clamp(1, 64);
    }

    /// Frames analysed since creation or reset.
    pub fn frames_analyzed(&self) -> u64 {
        self.frames
    }

    /// Feeds one block; analyses a frame every `fft_size / 2` samples.
    pub fn process(&mut self, buffer: &AudioBuffer) {
        let hop = self.size / 2;
        for i in 0..buffer.len() {
            let (l, r) = buffer.frame(i);
            self.ring[self.write_pos] = (l + r) * 0.5;
            self.write_pos = (self.write_pos + 1) % self.size;
            self.since_frame += 1;
            if self.since_frame >= hop {
                self.since_frame = 0;
                self.analyze();
            }
        }
    }

    /// Transforms the most recent `fft_size` samples now.
    pub fn analyze(&mut self) {
        // Oldest sample sits at the write position.
        let (newer, older) = self.ring.split_at(self.write_pos);
        for ((slot, &x), &w) in self
            .frame
            .iter_mut()
            .zip(older.iter().chain(newer))
            .zip(&self.coefficients)
        {
            *slot = Complex::new(x * w, 0.0);
        }
        self.fft.process_with_scratch(&mut self.frame, &mut self.scratch);

        let keep = if self.frames == 0 { 0.0 } else { self.smoothing };
        for (shown, bin) in self.magnitudes.iter_mut().zip(&self.frame) {
            let magnitude = bin.norm() * self.norm;
            *shown = keep * *shown + (1.0 - keep) * magnitude;
        }
        self.frames += 1;
    }

    /// Smoothed linear magnitudes, DC to Nyquist.
    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }

    /// Smoothed magnitudes in dBFS.
    pub fn magnitudes_db(&self) -> Vec<f32> {
        self.magnitudes.iter().map(|&m| linear_to_db(m)).collect()
    }

    /// Centre frequency of bin `index`.
    pub fn bin_frequency(&self, index: usize) -> f32 {
        index as f32 * self.sample_rate / self.size as f32
    }

    /// Frequency of the loudest non-DC bin.
    pub fn peak_frequency(&self) -> f32 {
        let peak = self
            .magnitudes
            .iter()
            .enumerate()
            .skip(1)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map_or(0, |(i, _)| i);
        self.bin_frequency(peak)
    }

    /// Log-spaced bands from 20 Hz to Nyquist, each reporting its loudest
    /// bin. A band narrower than one bin reads the bin nearest its centre.
    pub fn frequency_bands(&self) -> Vec<FrequencyBand> {
        let nyquist = self.sample_rate * 0.5;
        let ratio = nyquist / BANDS_LOW_HZ;
        let count = self.band_count;
        let edge = |k: usize| BANDS_LOW_HZ * ratio.powf(k as f32 / count as f32);
        let bin_hz = self.sample_rate / self.size as f32;
        let last_bin = self.magnitudes.len() - 1;

        (0..count)
            .map(|k| {
                let (low_hz, high_hz) = (edge(k), edge(k + 1));
                let first = ((low_hz / bin_hz).ceil() as usize).min(last_bin);
                let last = ((high_hz / bin_hz).floor() as usize).min(last_bin);
                let peak = if first <= last {
                    self.magnitudes[first..=last].iter().fold(0.0f32, |m, &v| m.max(v))
                } else {
                    let centre = (low_hz * high_hz).sqrt();
                    self.magnitudes[((centre / bin_hz).round() as usize).min(last_bin)]
                };
                FrequencyBand {
                    low_hz,
                    high_hz,
                    level_db: linear_to_db(peak),
                }
            })
            .collect()
    }

    /// Clears the input history and the displayed spectrum.
    pub fn reset(&mut self) {
        self.ring.fill(0.0);
        self.magnitudes.fill(0.0);
        self.write_pos = 0;
        self.since_frame = 0;
        self.frames = 0;
    }
}
