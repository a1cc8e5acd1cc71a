//! Analysis window functions

use core::f32::consts::PI;

use serde::{Deserialize, Serialize};

/// Window applied to each FFT frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Window {
    /// No windowing.
    Rectangular,
    /// Raised cosine.
    #[default]
    Hann,
    /// Hamming.
    Hamming,
    /// Three-term Blackman.
    Blackman,
}

impl Window {
    /// Coefficient `i` of an `n`-point periodic window.
    #[inline]
    pub fn coefficient(self, i: usize, n: usize) -> f32 {
        let x = 2.0 * PI * i as f32 / n as f32;
        match self {
            Self::Rectangular => 1.0,
            Self::Hann => 0.5 * (1.0 - x.cos()),
            Self::Hamming => 0.54 - 0.46 * x.cos(),
            Self::Blackman => 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos(),
        }
    }

    /// Multiplies `buffer` by the window in place.
    pub fn apply(self, buffer: &mut [f32]) {
        let n = buffer.len();
        for (i, sample) in buffer.iter_mut().enumerate() {
            *sample *= self.coefficient(i, n);
        }
    }

    /// Window coefficients for a frame of `size` samples.
    pub fn coefficients(self, size: usize) -> Vec<f32> {
        (0..size).map(|i| self.coefficient(i, size)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes() {
        let hann = Window::Hann.coefficients(8);
        assert_eq!(hann[0], 0.0);
        assert!((hann[4] - 1.0).abs() < 1e-6);

        let hamming = Window::Hamming.coefficients(8);
        assert!((hamming[0] - 0.08).abs() < 1e-6);

        let blackman = Window::Blackman.coefficients(8);
        assert!(blackman[0].abs() < 1e-6);

        assert!(Window::Rectangular.coefficients(8).iter().all(|&w| w == 1.0));
    }

    #[test]
    fn test_apply_matches_coefficients() {
        let mut buffer = vec![2.0; 16];
        Window::Blackman.apply(&mut buffer);
        for (a, w) in buffer.iter().zip(Window::Blackman.coefficients(16)) {
            assert_eq!(*a, 2.0 * w);
        }
    }
}
