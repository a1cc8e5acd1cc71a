//! Allpass filter for reverb diffusion.

use crate::{DelayLine, clip_unit, flush_denormal};

/// Schroeder allpass filter.
///
/// Passes every frequency at (nominally) unit gain while smearing phase, which
/// thickens the echo density of a reverb tail. Both the stored value and the
/// output are clipped to `[-1, 1]`.
///
/// # Example
///
/// ```rust
/// use cadenza_core::AllpassFilter;
///
/// let mut allpass = AllpassFilter::new(500);
/// allpass.set_feedback(0.5);
/// assert_eq!(allpass.process(1.0), -1.0);
/// ```
#[derive(Debug, Clone)]
pub struct AllpassFilter {
    delay: DelayLine,
    feedback: f32,
}

impl AllpassFilter {
    /// Creates an allpass with a delay of `delay_samples`.
    pub fn new(delay_samples: usize) -> Self {
        Self {
            delay: DelayLine::new(delay_samples),
            feedback: 0.5,
        }
    }

    /// Sets the feedback coefficient, clamped to `[-0.99, 0.99]`.
    #[inline]
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(-0.99, 0.99);
    }

    /// Current feedback.
    #[inline]
    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Processes one sample.
    ///
    /// `output = -input + delayed`, `store = input + delayed * feedback`.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let delayed = self.delay.read(self.delay.len());
        let output = clip_unit(-input + delayed);
        self.delay
            .write(clip_unit(flush_denormal(input + delayed * self.feedback)));
        output
    }

    /// Clears the internal delay line.
    pub fn clear(&mut self) {
        self.delay.clear();
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
}
