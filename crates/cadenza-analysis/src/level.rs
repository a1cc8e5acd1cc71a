//! Peak and RMS level metering.
//!
//! Peaks jump up instantly, hold for `peak_hold_ms`, then fall at
//! `peak_decay_db_per_s`. RMS is the root of the mean square over the last
//! `rms_window_ms`. Readings are reported in dBFS with the [`EPSILON`] floor
//! from `linear_to_db`, so silence reads about -200 dB instead of `-inf`.
//!
//! [`EPSILON`]: cadenza_core::EPSILON

use std::collections::VecDeque;

use cadenza_core::{AudioBuffer, db_to_linear, linear_to_db, ms_to_samples};
use serde::{Deserialize, Serialize};

use crate::MeterSettings;
use crate::running::RunningMean;

/// One block's levels, as kept in the history ring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelSample {
    /// Held peak in dBFS.
    pub peak_db: f32,
    /// RMS in dBFS.
    pub rms_db: f32,
}

#[derive(Debug, Clone)]
struct ChannelLevel {
    peak: f32,
    hold_remaining: usize,
    squares: RunningMean,
}

impl ChannelLevel {
    fn new(window: usize) -> Self {
        Self {
            peak: 0.0,
            hold_remaining: 0,
            squares: RunningMean::new(window),
        }
    }

    #[inline]
    fn push(&mut self, x: f32, hold: usize, decay: f32) {
        let a = x.abs();
        if a >= self.peak {
            self.peak = a;
            self.hold_remaining = hold;
        } else if self.hold_remaining > 0 {
            self.hold_remaining -= 1;
        } else {
            self.peak *= decay;
        }
        self.squares.push(x * x);
    }

    fn rms(&self) -> f32 {
        self.squares.mean().max(0.0).sqrt()
    }

    fn reset(&mut self) {
        self.peak = 0.0;
        self.hold_remaining = 0;
        self.squares.clear();
    }
}

/// Stereo peak/RMS meter with clip counting and a short level history.
///
/// Mono buffers drive both channels.
///
/// # Example
///
/// ```rust
/// use cadenza_analysis::LevelMeter;
/// use cadenza_core::AudioBuffer;
///
/// let mut meter = LevelMeter::new(48000.0);
/// meter.process(&AudioBuffer::from_mono(vec![0.5; 480]));
/// assert!((meter.peak_db() + 6.02).abs() < 0.01);
/// ```
#[derive(Debug, Clone)]
pub struct LevelMeter {
    channels: [ChannelLevel; 2],
    hold_samples: usize,
    decay_per_sample: f32,
    clip_count: u64,
    history: VecDeque<LevelSample>,
    history_len: usize,
}

impl LevelMeter {
    /// Creates a meter with default ballistics.
    pub fn new(sample_rate: f32) -> Self {
        Self::with_settings(sample_rate, &MeterSettings::default())
    }

    /// Creates a meter from explicit settings.
    pub fn with_settings(sample_rate: f32, settings: &MeterSettings) -> Self {
        let settings = settings.clamped();
        let window = ms_to_samples(settings.rms_window_ms, sample_rate).round() as usize;
        Self {
            channels: [ChannelLevel::new(window), ChannelLevel::new(window)],
            hold_samples: ms_to_samples(settings.peak_hold_ms, sample_rate).round() as usize,
            decay_per_sample: db_to_linear(-settings.peak_decay_db_per_s / sample_rate),
            clip_count: 0,
            history: VecDeque::with_capacity(settings.history_len),
            history_len: settings.history_len,
        }
    }

    /// Feeds one block.
    pub fn process(&mut self, buffer: &AudioBuffer) {
        let (hold, decay) = (self.hold_samples, self.decay_per_sample);
        let left = buffer.left();
        let right = buffer.right().unwrap_or(left);

        for &x in left {
            self.channels[0].push(x, hold, decay);
        }
        for &x in right {
            self.channels[1].push(x, hold, decay);
        }

        let clipped = |samples: &[f32]| samples.iter().filter(|x| x.abs() >= 1.0).count() as u64;
        self.clip_count += clipped(left);
        if let Some(right) = buffer.right() {
            self.clip_count += clipped(right);
        }

        if self.history.len() == self.history_len {
            self.history.pop_front();
        }
        self.history.push_back(LevelSample {
            peak_db: self.peak_db(),
            rms_db: self.rms_db(),
        });
    }

    /// Louder channel's held peak in dBFS.
    pub fn peak_db(&self) -> f32 {
        linear_to_db(self.channels[0].peak.max(self.channels[1].peak))
    }

    /// Louder channel's RMS in dBFS.
    pub fn rms_db(&self) -> f32 {
        linear_to_db(self.channels[0].rms().max(self.channels[1].rms()))
    }

    /// Held peak of channel 0 (left) or 1 (right).
    pub fn channel_peak_db(&self, channel: usize) -> f32 {
        linear_to_db(self.channels[channel.min(1)].peak)
    }

    /// RMS of channel 0 (left) or 1 (right).
    pub fn channel_rms_db(&self, channel: usize) -> f32 {
        linear_to_db(self.channels[channel.min(1)].rms())
    }

    /// Samples at or beyond full scale since the last reset.
    pub fn clip_count(&self) -> u64 {
        self.clip_count
    }

    /// Zeroes the clip counter only.
    pub fn reset_clips(&mut self) {
        self.clip_count = 0;
    }

    /// Per-block levels, oldest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &LevelSample> {
        self.history.iter()
    }

    /// Clears levels, clips and history.
    pub fn reset(&mut self) {
        self.channels.iter_mut().for_each(ChannelLevel::reset);
        self.clip_count = 0;
        self.history.clear();
    }
}
