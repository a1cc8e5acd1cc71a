//! Circular delay line.
//!
//! The storage is allocated once in [`DelayLine::new`] and never resized.
//! Every index is reduced modulo the buffer length, so reads and writes can
//! not escape `[0, len)` regardless of the requested delay.

/// Fixed-length circular buffer with integer and fractional taps.
///
/// Reading with delay `d` returns the sample written `d` writes ago, so a tap
/// read immediately before the write at time `n` yields `x[n - d]`.
///
/// # Example
///
/// ```rust
/// use cadenza_core::DelayLine;
///
/// let mut line = DelayLine::new(8);
/// line.write(1.0);
/// line.write(0.0);
/// assert_eq!(line.read(2), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    /// Creates a zeroed delay line holding `len` samples (minimum 1).
    pub fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len.max(1)],
            write_pos: 0,
        }
    }

    /// Creates a delay line long enough for `max_seconds` at `sample_rate`.
    pub fn for_duration(max_seconds: f32, sample_rate: f32) -> Self {
        let len = (max_seconds * sample_rate).ceil() as usize + 1;
        Self::new(len)
    }

    /// Buffer length in samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Always false; a delay line holds at least one sample.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Reads the sample written `delay` writes ago.
    ///
    /// `delay` is clamped to `[1, len]`.
    #[inline]
    pub fn read(&self, delay: usize) -> f32 {
        let len = self.buffer.len();
        let delay = delay.clamp(1, len);
        self.buffer[(self.write_pos + len - delay) % len]
    }

    /// Reads at a fractional delay using linear interpolation.
    #[inline]
    pub fn read_fractional(&self, delay: f32) -> f32 {
        let max = (self.buffer.len() - 1) as f32;
        let delay = delay.clamp(1.0, max.max(1.0));
        let whole = delay as usize;
        let frac = delay - whole as f32;
        let a = self.read(whole);
        let b = self.read(whole + 1);
        a + (b - a) * frac
    }

    /// Stores `sample` and advances the write head.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Zeroes the buffer and rewinds the write head.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    /// Raw buffer contents in storage order.
    pub fn contents(&self) -> &[f32] {
        &self.buffer
    }

    /// Current write position.
    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    /// Restores previously captured contents.
    ///
    /// Copies as many samples as fit; the write position is taken modulo the
    /// length. Returns false when the captured length differed.
    pub fn restore(&mut self, samples: &[f32], write_pos: usize) -> bool {
        let n = samples.len().min(self.buffer.len());
        self.buffer.fill(0.0);
        self.buffer[..n].copy_from_slice(&samples[..n]);
        self.write_pos = write_pos % self.buffer.len();
        samples.len() == self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_delay() {
        let mut line = DelayLine::new(100);
        line.write(1.0);
        for _ in 0..9 {
            line.write(0.0);
        }
        assert_eq!(line.read(10), 1.0);
        assert_eq!(line.read(9), 0.0);
    }

    #[test]
    fn test_read_clamps_delay() {
        let mut line = DelayLine::new(4);
        for i in 0..4 {
            line.write(i as f32);
        }
        // delay 0 clamps to 1, oversize clamps to len
        assert_eq!(line.read(0), 3.0);
        assert_eq!(line.read(1000), 0.0);
    }

    #[test]
    fn test_fractional_read() {
        let mut line = DelayLine::new(16);
        line.write(1.0);
        line.write(0.0);
        // delay 1 reads 0.0, delay 2 reads 1.0
        assert!((line.read_fractional(1.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_for_duration() {
        let line = DelayLine::for_duration(5.0, 44100.0);
        assert!(line.len() > 5 * 44100);
    }

    #[test]
    fn test_wraparound_stays_in_bounds() {
        let mut line = DelayLine::new(3);
        for i in 0..1000 {
            line.write(i as f32);
            assert!(line.write_pos() < 3);
        }
        assert_eq!(line.read(1), 999.0);
    }

    #[test]
    fn test_restore() {
        let mut a = DelayLine::new(8);
        for i in 0..5 {
            a.write(i as f32);
        }
        let mut b = DelayLine::new(8);
        assert!(b.restore(a.contents(), a.write_pos()));
        assert_eq!(b.read(1), 4.0);
        assert!(!b.restore(&[1.0, 2.0], 1));
    }
}
