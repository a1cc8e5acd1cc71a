//! Lock-free parameter hand-off between threads.
//!
//! A [`SharedParam`] stores an `f32` as its bit pattern in an `AtomicU32`.
//! Clones share the same cell, so a control thread can hold one handle and
//! write while the audio thread reads from another without locking.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Shared `f32` cell with relaxed atomic access.
///
/// # Example
///
/// ```rust
/// use cadenza_core::SharedParam;
///
/// let audio_side = SharedParam::new(0.0);
/// let ui_side = audio_side.clone();
/// ui_side.set(-6.0);
/// assert_eq!(audio_side.get(), -6.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedParam(Arc<AtomicU32>);

impl SharedParam {
    /// Creates a new cell holding `value`.
    pub fn new(value: f32) -> Self {
        Self(Arc::new(AtomicU32::new(value.to_bits())))
    }

    /// Reads the current value.
    #[inline]
    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    /// Writes a new value.
    #[inline]
    pub fn set(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Reads as a flag (non-zero is true).
    #[inline]
    pub fn get_bool(&self) -> bool {
        self.get() != 0.0
    }

    /// Writes a flag as `1.0` / `0.0`.
    #[inline]
    pub fn set_bool(&self, value: bool) {
        self.set(if value { 1.0 } else { 0.0 });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_cell() {
        let a = SharedParam::new(1.5);
        let b = a.clone();
        b.set(0.25);
        assert_eq!(a.get(), 0.25);
    }

    #[test]
    fn test_cross_thread_write() {
        let param = SharedParam::new(0.0);
        let writer = param.clone();
        std::thread::spawn(move || writer.set_bool(true))
            .join()
            .expect("writer thread panicked");
        assert!(param.get_bool());
    }
}
