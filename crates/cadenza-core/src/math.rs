//! Mathematical utility functions for DSP.
//!
//! Everything here is allocation-free and safe to call from the audio thread.
//!
//! # Level Conversions
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear gain.
//!   `linear_to_db` floors its input at [`EPSILON`] so silence maps to a finite
//!   value instead of `-inf`.
//!
//! # Time Constants
//!
//! - [`time_coefficient`] - One-pole smoothing coefficient from a time constant
//! - [`ms_to_samples`] - Millisecond to sample conversion
//!
//! # Shaping
//!
//! - [`soft_clip`] / [`hard_clip`] - Saturating transfer curves
//! - [`smoothstep`] / [`lerp`] - Interpolation helpers

use libm::{expf, logf, sqrtf, tanhf};

/// Floor applied before any logarithm so `log(0)` never happens.
pub const EPSILON: f32 = 1e-10;

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use cadenza_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels, flooring the input at [`EPSILON`].
///
/// # Example
/// ```rust
/// use cadenza_core::linear_to_db;
///
/// assert!((linear_to_db(1.0) - 0.0).abs() < 0.001);
/// assert!(linear_to_db(0.0).is_finite());
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.abs().max(EPSILON)) * FACTOR
}

/// Per-sample smoothing coefficient for a time constant.
///
/// Returns `1 - exp(-1 / (time_s * sample_rate))`, the fraction of the
/// distance to the target covered each sample. A zero (or negative) time
/// yields `1.0`, i.e. an instant response.
#[inline]
pub fn time_coefficient(time_s: f32, sample_rate: f32) -> f32 {
    let samples = time_s * sample_rate;
    if samples <= 0.0 {
        1.0
    } else {
        1.0 - expf(-1.0 / samples)
    }
}

/// Soft clip using hyperbolic tangent. Output is in `(-1, 1)`.
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    tanhf(x)
}

/// Hard clip to `[-threshold, threshold]`.
#[inline]
pub fn hard_clip(x: f32, threshold: f32) -> f32 {
    x.clamp(-threshold, threshold)
}

/// Clamp to the `[-1, 1]` full-scale range.
///
/// Every feedback write in the delay, comb and allpass stages passes through
/// this so recirculating energy can never exceed full scale.
#[inline]
pub fn clip_unit(x: f32) -> f32 {
    x.clamp(-1.0, 1.0)
}

/// Linear interpolation between `a` (t=0) and `b` (t=1).
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Smoothstep `3t² - 2t³`, slow at both ends. `t` is clamped to `[0, 1]`.
#[inline]
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Convert milliseconds to samples.
#[inline]
pub fn ms_to_samples(ms: f32, sample_rate: f32) -> f32 {
    ms * sample_rate / 1000.0
}

/// Flush subnormal floats to zero.
///
/// Feedback paths decay toward zero indefinitely; values below `1e-20` are
/// replaced before they reach the subnormal range and stall the CPU.
#[inline]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// Blend dry and wet signals. `mix = 0` is fully dry, `mix = 1` fully wet.
#[inline]
pub fn wet_dry_mix(dry: f32, wet: f32, mix: f32) -> f32 {
    dry * (1.0 - mix) + wet * mix
}

/// Constant-power pan gains for `pan ∈ [-1, 1]`.
///
/// Returns `(sqrt(0.5 * (1 - pan)), sqrt(0.5 * (1 + pan)))`. Centre pan gives
/// both channels `√0.5` (-3 dB).
#[inline]
pub fn constant_power_pan(pan: f32) -> (f32, f32) {
    let pan = pan.clamp(-1.0, 1.0);
    (sqrtf(0.5 * (1.0 - pan)), sqrtf(0.5 * (1.0 + pan)))
}

/// Mid/side width transform.
///
/// `mid = (L+R)/2`, `side = (L-R)/2 * width`, reconstructed as
/// `(mid + side, mid - side)`. `width = 1` is the identity, `0` collapses to
/// mono.
#[inline]
pub fn mid_side_width(left: f32, right: f32, width: f32) -> (f32, f32) {
    let mid = (left + right) * 0.5;
    let side = (left - right) * 0.5 * width;
    (mid + side, mid - side)
}
