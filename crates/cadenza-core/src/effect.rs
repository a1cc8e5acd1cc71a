//! Core Effect trait.
//!
//! All processors in the effects library implement [`Effect`]. The trait is
//! object-safe so tracks and graph nodes can hold `Box<dyn Effect>` chains.
//!
//! ## Contract
//!
//! - **Bypass**: when [`is_enabled`](Effect::is_enabled) is false,
//!   [`process_block`](Effect::process_block) leaves the buffer untouched.
//! - **Shape**: blocks keep their channel count and length.
//! - **Real-time**: `process*` never allocates, locks or fails. Parameter
//!   setters are plain value writes and clamp out-of-range input.

use crate::{AudioBuffer, Stateful};

/// A stateful audio processor.
pub trait Effect: Stateful + Send {
    /// Registry tag, also written as `"type"` in [`Stateful::to_dict`].
    fn kind(&self) -> &'static str;

    /// Processes one mono sample.
    fn process(&mut self, input: f32) -> f32;

    /// Processes one stereo frame.
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32);

    /// Processes a block in place.
    ///
    /// Mono buffers go through [`process`](Self::process), stereo buffers
    /// through [`process_stereo`](Self::process_stereo). Disabled effects
    /// return immediately.
    fn process_block(&mut self, buffer: &mut AudioBuffer) {
        if !self.is_enabled() {
            return;
        }
        match buffer.channels_mut() {
            (left, Some(right)) => {
                for (l, r) in left.iter_mut().zip(right.iter_mut()) {
                    (*l, *r) = self.process_stereo(*l, *r);
                }
            }
            (left, None) => {
                for sample in left.iter_mut() {
                    *sample = self.process(*sample);
                }
            }
        }
    }

    /// Bypass state.
    fn is_enabled(&self) -> bool;

    /// Enables or bypasses the effect.
    fn set_enabled(&mut self, enabled: bool);

    /// Clears internal state (delay lines, envelopes) without touching
    /// parameters.
    fn reset(&mut self);

    /// Processing latency introduced by the effect, in samples.
    fn latency_samples(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    struct Scale {
        gain: f32,
        enabled: bool,
    }

    impl Stateful for Scale {
        fn to_dict(&self) -> Value {
            json!({ "type": "scale", "enabled": self.enabled, "params": { "gain": self.gain } })
        }

        fn load_dict(&mut self, _dict: &Value) {}
    }

    impl Effect for Scale {
        fn kind(&self) -> &'static str {
            "scale"
        }

        fn process(&mut self, input: f32) -> f32 {
            input * self.gain
        }

        fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
            (left * self.gain, right * self.gain * 2.0)
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        fn set_enabled(&mut self, enabled: bool) {
            self.enabled = enabled;
        }

        fn reset(&mut self) {}
    }

    #[test]
    fn test_block_dispatch_by_shape() {
        let mut fx = Scale {
            gain: 0.5,
            enabled: true,
        };

        let mut mono = AudioBuffer::from_mono(vec![1.0, 2.0]);
        fx.process_block(&mut mono);
        assert_eq!(mono.left(), &[0.5, 1.0]);

        let mut stereo = AudioBuffer::from_stereo(vec![1.0], vec![1.0]);
        fx.process_block(&mut stereo);
        assert_eq!(stereo.left(), &[0.5]);
        assert_eq!(stereo.right(), Some(&[1.0][..]));
    }

    #[test]
    fn test_disabled_block_untouched() {
        let mut fx = Scale {
            gain: 0.0,
            enabled: false,
        };
        let mut buffer = AudioBuffer::from_stereo(vec![0.3, -0.7], vec![0.1, 0.2]);
        let before = buffer.clone();
        fx.process_block(&mut buffer);
        assert_eq!(buffer, before);
    }
}
