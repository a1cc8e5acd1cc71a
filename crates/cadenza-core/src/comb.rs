//! Comb filter for reverb algorithms.
//!
//! A feedback comb with a one-pole lowpass in the feedback path, the basic
//! resonator of Schroeder and Freeverb reverbs.

use crate::{DelayLine, clip_unit, flush_denormal};

/// Feedback comb filter with damping.
///
/// The damping filter attenuates high frequencies on every trip around the
/// loop, so a damped tail darkens as it decays. The value written back into
/// the delay line is clipped to `[-1, 1]`, which keeps the output bounded for
/// any feedback the setter accepts.
///
/// # Example
///
/// ```rust
/// use cadenza_core::CombFilter;
///
/// let mut comb = CombFilter::new(1000);
/// comb.set_feedback(0.8);
/// comb.set_damp(0.3);
///
/// let output = comb.process(1.0);
/// assert_eq!(output, 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct CombFilter {
    delay: DelayLine,
    feedback: f32,
    damp1: f32,
    damp2: f32,
    filterstore: f32,
}

impl CombFilter {
    /// Creates a comb with a delay of `delay_samples`.
    pub fn new(delay_samples: usize) -> Self {
        Self {
            delay: DelayLine::new(delay_samples),
            feedback: 0.5,
            damp1: 0.5,
            damp2: 0.5,
            filterstore: 0.0,
        }
    }

    /// Sets the feedback amount, clamped to `[0, 0.99]`.
    #[inline]
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.99);
    }

    /// Current feedback.
    #[inline]
    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Sets damping: 0.0 is bright, 1.0 fully muffled.
    #[inline]
    pub fn set_damp(&mut self, damp: f32) {
        self.damp1 = damp.clamp(0.0, 1.0);
        self.damp2 = 1.0 - self.damp1;
    }

    /// Current damping.
    #[inline]
    pub fn damp(&self) -> f32 {
        self.damp1
    }

    /// Processes one sample, returning the delayed output.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.delay.read(self.delay.len());

        // filterstore = output * (1 - damp) + filterstore * damp
        self.filterstore = flush_denormal(output * self.damp2 + self.filterstore * self.damp1);

        self.delay
            .write(clip_unit(input + self.filterstore * self.feedback));

        output
    }

    /// Clears the delay line and the damping filter.
    pub fn clear(&mut self) {
        self.delay.clear();
        self.filterstore = 0.0;
    }

    /// Delay length in samples.
    pub fn len(&self) -> usize {
        self.delay.len()
    }

    /// Always false.
    pub fn is_empty(&self) -> bool {
        self.delay.is_empty()
    }

    /// Read access to the internal delay line.
    pub fn delay_line(&self) -> &DelayLine {
        &self.delay
    }

    /// Mutable access to the internal delay line, used for state restore.
    pub fn delay_line_mut(&mut self) -> &mut DelayLine {
        &mut self.delay
    }

    /// Current output of the one-pole damping filter.
    pub fn filter_state(&self) -> f32 {
        self.filterstore
    }

    /// Overwrites the damping filter memory, used for state restore.
    pub fn set_filter_state(&mut self, value: f32) {
        self.filterstore = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comb_echo() {
        let mut comb = CombFilter::new(100);
        comb.set_feedback(0.5);
        comb.set_damp(0.2);

        assert_eq!(comb.process(1.0), 0.0);
        for _ in 0..99 {
            comb.process(0.0);
        }
        let echo = comb.process(0.0);
        assert!((echo - 1.0).abs() < 1e-6, "impulse should return after 100 samples, got {echo}");
    }

    #[test]
    fn test_comb_feedback_decay() {
        let mut comb = CombFilter::new(10);
        comb.set_feedback(0.8);
        comb.set_damp(0.0);
        comb.process(1.0);

        let mut last_peak = 0.0f32;
        for _ in 0..100 {
            let out = comb.process(0.0);
            if out.abs() > 0.01 {
                if last_peak > 0.0 {
                    assert!(out.abs() <= last_peak + 1e-6, "echo should decay");
                }
                last_peak = out.abs();
            }
        }
    }

    #[test]
    fn test_comb_bounded_under_full_scale_input() {
        let mut comb = CombFilter::new(7);
        comb.set_feedback(0.99);
        comb.set_damp(0.0);
        for _ in 0..10_000 {
            let out = comb.process(1.0);
            assert!(out.abs() <= 1.0, "comb output escaped full scale: {out}");
        }
    }

    #[test]
    fn test_comb_damping_darkens() {
        let mut bright = CombFilter::new(20);
        bright.set_feedback(0.8);
        bright.set_damp(0.0);

        let mut dark = CombFilter::new(20);
        dark.set_feedback(0.8);
        dark.set_damp(0.8);

        bright.process(1.0);
        dark.process(1.0);

        let mut bright_sum = 0.0f32;
        let mut dark_sum = 0.0f32;
        for _ in 0..200 {
            bright_sum += bright.process(0.0).abs();
            dark_sum += dark.process(0.0).abs();
        }
        assert!(dark_sum < bright_sum, "damped comb should carry less energy");
    }

    #[test]
    fn test_comb_clear() {
        let mut comb = CombFilter::new(10);
        for _ in 0..20 {
            comb.process(1.0);
        }
        comb.clear();
        for _ in 0..20 {
            assert_eq!(comb.process(0.0), 0.0);
        }
    }

    #[test]
    fn test_comb_copy_with_filter_state_tracks_original() {
        let mut comb = CombFilter::new(13);
        comb.set_feedback(0.7);
        comb.set_damp(0.5);
        for i in 0..40 {
            comb.process((i as f32 * 0.3).sin());
        }
        assert!(comb.filter_state() != 0.0);

        let mut copy = CombFilter::new(13);
        copy.set_feedback(0.7);
        copy.set_damp(0.5);
        let line = comb.delay_line();
        assert!(copy.delay_line_mut().restore(line.contents(), line.write_pos()));
        copy.set_filter_state(comb.filter_state());

        for _ in 0..40 {
            assert_eq!(copy.process(0.0), comb.process(0.0));
        }
    }
}
