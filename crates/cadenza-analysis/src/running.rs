//! Fixed-length running mean over a sample stream.

/// Ring of the last `len` values with a running sum.
///
/// The sum is kept in `f64` so drift over hours of audio stays far below
/// anything a meter can display.
#[derive(Debug, Clone)]
pub(crate) struct RunningMean {
    ring: Vec<f32>,
    pos: usize,
    sum: f64,
}

impl RunningMean {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            ring: vec![0.0; len.max(1)],
            pos: 0,
            sum: 0.0,
        }
    }

    #[inline]
    pub(crate) fn push(&mut self, value: f32) {
        self.sum += f64::from(value) - f64::from(self.ring[self.pos]);
        self.ring[self.pos] = value;
        self.pos += 1;
        if self.pos == self.ring.len() {
            self.pos = 0;
        }
    }

    /// Mean over the window; zeros fill the window until it has seen `len`
    /// values.
    #[inline]
    pub(crate) fn mean(&self) -> f32 {
        (self.sum / self.ring.len() as f64) as f32
    }

    pub(crate) fn sum(&self) -> f64 {
        self.sum
    }

    pub(crate) fn clear(&mut self) {
        self.ring.fill(0.0);
        self.pos = 0;
        self.sum = 0.0;
    }
}
