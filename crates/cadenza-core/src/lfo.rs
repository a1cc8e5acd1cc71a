//! Low-frequency oscillator for modulation effects and automation.
//!
//! A phase accumulator in `[0, 1)` that wraps at 1.0, shaped into one of four
//! bipolar waveforms.

use core::f32::consts::TAU;
use libm::sinf;
use serde::{Deserialize, Serialize};

/// LFO waveform shapes. All are bipolar in `[-1, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LfoWaveform {
    /// Smooth sine.
    #[default]
    Sine,
    /// Linear ramp up then down.
    Triangle,
    /// High for the first half cycle, low for the second.
    Square,
    /// Ramp from -1 to 1.
    Sawtooth,
}

impl LfoWaveform {
    /// Evaluates the waveform at `phase ∈ [0, 1)`.
    #[inline]
    pub fn sample(self, phase: f32) -> f32 {
        match self {
            Self::Sine => sinf(phase * TAU),
            Self::Triangle => {
                if phase < 0.5 {
                    4.0 * phase - 1.0
                } else {
                    3.0 - 4.0 * phase
                }
            }
            Self::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Self::Sawtooth => 2.0 * phase - 1.0,
        }
    }
}

/// Phase-accumulating oscillator.
///
/// # Example
///
/// ```rust
/// use cadenza_core::{Lfo, LfoWaveform};
///
/// let mut lfo = Lfo::new(48000.0, 2.0);
/// lfo.set_waveform(LfoWaveform::Triangle);
/// let value = lfo.next();
/// assert!((-1.0..=1.0).contains(&value));
/// ```
#[derive(Debug, Clone)]
pub struct Lfo {
    phase: f32,
    phase_inc: f32,
    sample_rate: f32,
    waveform: LfoWaveform,
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new(48000.0, 1.0)
    }
}

impl Lfo {
    /// Creates a sine LFO at `freq_hz`.
    pub fn new(sample_rate: f32, freq_hz: f32) -> Self {
        Self {
            phase: 0.0,
            phase_inc: freq_hz / sample_rate,
            sample_rate,
            waveform: LfoWaveform::Sine,
        }
    }

    /// Sets the frequency in Hz.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.phase_inc = freq_hz / self.sample_rate;
    }

    /// Frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.phase_inc * self.sample_rate
    }

    /// Sets the waveform.
    pub fn set_waveform(&mut self, waveform: LfoWaveform) {
        self.waveform = waveform;
    }

    /// Current waveform.
    pub fn waveform(&self) -> LfoWaveform {
        self.waveform
    }

    /// Rewinds the phase to zero.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Sets the phase; values outside `[0, 1)` are wrapped.
    pub fn set_phase(&mut self, phase: f32) {
        self.phase = phase.rem_euclid(1.0);
    }

    /// Current phase in `[0, 1)`.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Value at the current phase without advancing.
    #[inline]
    pub fn value(&self) -> f32 {
        self.waveform.sample(self.phase)
    }

    /// Returns the current value, then advances one sample.
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> f32 {
        let output = self.value();
        self.advance(1);
        output
    }

    /// Current value mapped to `[0, 1]`, then advances one sample.
    #[inline]
    pub fn next_unipolar(&mut self) -> f32 {
        (self.next() + 1.0) * 0.5
    }

    /// Advances the phase by `samples` without producing output.
    #[inline]
    pub fn advance(&mut self, samples: usize) {
        self.phase += self.phase_inc * samples as f32;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }
    }

    /// Updates the sample rate, keeping the frequency.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        let freq = self.frequency();
        self.sample_rate = sample_rate;
        self.set_frequency(freq);
    }
}
