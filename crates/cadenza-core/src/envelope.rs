//! Envelope follower for dynamics processing.
//!
//! Attack and release are time constants in milliseconds converted to
//! per-sample coefficients with [`time_coefficient`]. Each sample the
//! envelope moves that fraction of the way toward the rectified input.

use crate::time_coefficient;

/// Peak envelope follower with independent attack and release.
///
/// # Example
///
/// ```rust
/// use cadenza_core::EnvelopeFollower;
///
/// let mut env = EnvelopeFollower::with_times(48000.0, 1.0, 100.0);
/// for _ in 0..1000 {
///     env.process(0.5);
/// }
/// assert!((env.level() - 0.5).abs() < 0.01);
/// ```
#[derive(Debug, Clone)]
pub struct EnvelopeFollower {
    envelope: f32,
    attack_coeff: f32,
    release_coeff: f32,
    sample_rate: f32,
    attack_ms: f32,
    release_ms: f32,
}

impl EnvelopeFollower {
    /// Creates a follower with 10 ms attack and 100 ms release.
    pub fn new(sample_rate: f32) -> Self {
        Self::with_times(sample_rate, 10.0, 100.0)
    }

    /// Creates a follower with the given times.
    pub fn with_times(sample_rate: f32, attack_ms: f32, release_ms: f32) -> Self {
        let mut follower = Self {
            envelope: 0.0,
            attack_coeff: 1.0,
            release_coeff: 1.0,
            sample_rate,
            attack_ms: attack_ms.max(0.0),
            release_ms: release_ms.max(0.0),
        };
        follower.recalculate_coefficients();
        follower
    }

    /// Sets the attack time in milliseconds (0 = instant).
    pub fn set_attack_ms(&mut self, attack_ms: f32) {
        self.attack_ms = attack_ms.max(0.0);
        self.recalculate_coefficients();
    }

    /// Attack time in milliseconds.
    pub fn attack_ms(&self) -> f32 {
        self.attack_ms
    }

    /// Sets the release time in milliseconds (0 = instant).
    pub fn set_release_ms(&mut self, release_ms: f32) {
        self.release_ms = release_ms.max(0.0);
        self.recalculate_coefficients();
    }

    /// Release time in milliseconds.
    pub fn release_ms(&self) -> f32 {
        self.release_ms
    }

    /// Updates the sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coefficients();
    }

    /// Tracks one sample and returns the new envelope.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let input_abs = input.abs();
        let coeff = if input_abs > self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope += coeff * (input_abs - self.envelope);
        self.envelope
    }

    /// Current envelope without advancing.
    pub fn level(&self) -> f32 {
        self.envelope
    }

    /// Resets the envelope to zero.
    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }

    fn recalculate_coefficients(&mut self) {
        self.attack_coeff = time_coefficient(self.attack_ms / 1000.0, self.sample_rate);
        self.release_coeff = time_coefficient(self.release_ms / 1000.0, self.sample_rate);
    }
}

impl Default for EnvelopeFollower {
    fn default() -> Self {
        Self::new(48000.0)
    }
}
