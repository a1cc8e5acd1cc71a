//! Block buffers passed between effects, nodes and meters.
//!
//! An [`AudioBuffer`] is either mono (left channel only) or stereo. Its shape
//! is fixed at construction; effects process it in place and never change the
//! channel count or length.

/// A mono or stereo block of `f32` samples.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AudioBuffer {
    left: Vec<f32>,
    right: Option<Vec<f32>>,
}

impl AudioBuffer {
    /// Creates a zeroed mono buffer.
    pub fn mono(len: usize) -> Self {
        Self {
            left: vec![0.0; len],
            right: None,
        }
    }

    /// Creates a zeroed stereo buffer.
    pub fn stereo(len: usize) -> Self {
        Self {
            left: vec![0.0; len],
            right: Some(vec![0.0; len]),
        }
    }

    /// Wraps existing samples as a mono buffer.
    pub fn from_mono(samples: Vec<f32>) -> Self {
        Self {
            left: samples,
            right: None,
        }
    }

    /// Wraps two channels as a stereo buffer.
    ///
    /// The shorter channel is zero-padded so both have the same length.
    pub fn from_stereo(mut left: Vec<f32>, mut right: Vec<f32>) -> Self {
        let len = left.len().max(right.len());
        left.resize(len, 0.0);
        right.resize(len, 0.0);
        Self {
            left,
            right: Some(right),
        }
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// Returns true if the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Returns true for two-channel buffers.
    pub fn is_stereo(&self) -> bool {
        self.right.is_some()
    }

    /// Number of channels (1 or 2).
    pub fn channels(&self) -> usize {
        if self.is_stereo() { 2 } else { 1 }
    }

    /// Left (or only) channel.
    pub fn left(&self) -> &[f32] {
        &self.left
    }

    /// Right channel, if stereo.
    pub fn right(&self) -> Option<&[f32]> {
        self.right.as_deref()
    }

    /// Mutable left (or only) channel.
    pub fn left_mut(&mut self) -> &mut [f32] {
        &mut self.left
    }

    /// Mutable access to both channels at once.
    pub fn channels_mut(&mut self) -> (&mut [f32], Option<&mut [f32]>) {
        (&mut self.left, self.right.as_deref_mut())
    }

    /// Sample pair at `index`; mono buffers return the same value twice.
    #[inline]
    pub fn frame(&self, index: usize) -> (f32, f32) {
        let l = self.left[index];
        let r = self.right.as_ref().map_or(l, |right| right[index]);
        (l, r)
    }

    /// Fills every channel with zeros.
    pub fn clear(&mut self) {
        self.left.fill(0.0);
        if let Some(right) = self.right.as_mut() {
            right.fill(0.0);
        }
    }

    /// Copies `other` into `self`, adapting shape.
    ///
    /// Mono into stereo duplicates the channel, stereo into mono takes the
    /// average. Only the overlapping length is copied.
    pub fn copy_from(&mut self, other: &AudioBuffer) {
        self.clear();
        self.accumulate_from(other, 1.0);
    }

    /// Adds `other * gain` into `self`, adapting shape like [`copy_from`](Self::copy_from).
    pub fn accumulate_from(&mut self, other: &AudioBuffer, gain: f32) {
        let n = self.len().min(other.len());
        match (self.right.as_mut(), other.right.as_ref()) {
            (Some(dst_r), Some(src_r)) => {
                for i in 0..n {
                    self.left[i] += other.left[i] * gain;
                    dst_r[i] += src_r[i] * gain;
                }
            }
            (Some(dst_r), None) => {
                for i in 0..n {
                    self.left[i] += other.left[i] * gain;
                    dst_r[i] += other.left[i] * gain;
                }
            }
            (None, Some(src_r)) => {
                for i in 0..n {
                    self.left[i] += (other.left[i] + src_r[i]) * 0.5 * gain;
                }
            }
            (None, None) => {
                for i in 0..n {
                    self.left[i] += other.left[i] * gain;
                }
            }
        }
    }

    /// Multiplies every sample by `gain`.
    pub fn apply_gain(&mut self, gain: f32) {
        self.left.iter_mut().for_each(|s| *s *= gain);
        if let Some(right) = self.right.as_mut() {
            right.iter_mut().for_each(|s| *s *= gain);
        }
    }

    /// Largest absolute sample across all channels.
    pub fn peak(&self) -> f32 {
        let left = self.left.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        self.right
            .as_ref()
            .map_or(left, |r| r.iter().fold(left, |m, s| m.max(s.abs())))
    }

    /// Consumes the buffer, returning `(left, right)`.
    pub fn into_channels(self) -> (Vec<f32>, Option<Vec<f32>>) {
        (self.left, self.right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape() {
        let mono = AudioBuffer::mono(64);
        assert_eq!(mono.len(), 64);
        assert_eq!(mono.channels(), 1);
        assert!(mono.right().is_none());

        let stereo = AudioBuffer::stereo(32);
        assert_eq!(stereo.channels(), 2);
        assert_eq!(stereo.right().map(<[f32]>::len), Some(32));
    }

    #[test]
    fn test_from_stereo_pads_shorter_channel() {
        let buf = AudioBuffer::from_stereo(vec![1.0, 2.0, 3.0], vec![4.0]);
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.right(), Some(&[4.0, 0.0, 0.0][..]));
    }

    #[test]
    fn test_accumulate_mono_into_stereo() {
        let src = AudioBuffer::from_mono(vec![0.5, -0.5]);
        let mut dst = AudioBuffer::stereo(2);
        dst.accumulate_from(&src, 2.0);
        assert_eq!(dst.left(), &[1.0, -1.0]);
        assert_eq!(dst.right(), Some(&[1.0, -1.0][..]));
    }

    #[test]
    fn test_copy_stereo_into_mono_averages() {
        let src = AudioBuffer::from_stereo(vec![1.0], vec![0.0]);
        let mut dst = AudioBuffer::mono(1);
        dst.copy_from(&src);
        assert_eq!(dst.left(), &[0.5]);
    }

    #[test]
    fn test_peak() {
        let buf = AudioBuffer::from_stereo(vec![0.1, -0.3], vec![0.2, 0.9]);
        assert_eq!(buf.peak(), 0.9);
    }
}
