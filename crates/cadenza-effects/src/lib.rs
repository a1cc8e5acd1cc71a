//! Cadenza Effects - Audio effect implementations
//!
//! Every processor here implements [`cadenza_core::Effect`] and
//! [`cadenza_core::Stateful`]:
//!
//! - **Dynamics**: [`Compressor`], [`Limiter`], [`Expander`], [`Gate`],
//!   [`NoiseGate`]
//! - **Saturation**: [`Saturation`], [`HardClip`], [`Distortion`],
//!   [`WaveShaper`]
//! - **Delay**: [`SimpleDelay`], [`PingPongDelay`], [`MultiTapDelay`],
//!   [`StereoDelay`]
//! - **Reverb**: [`Reverb`] with [`ReverbPreset`]s
//! - **Modulation / utility**: [`Chorus`], [`Flanger`], [`Tremolo`], [`Gain`],
//!   [`WidthControl`], [`DynamicEq`]
//!
//! [`create_effect`] and [`effect_from_dict`] build any of them by kind tag.
//!
//! ## Example
//!
//! ```rust
//! use cadenza_core::{AudioBuffer, Effect, Stateful};
//! use cadenza_effects::{SimpleDelay, effect_from_dict};
//!
//! let mut delay = SimpleDelay::new(48000.0);
//! delay.set_time_ms(120.0);
//!
//! let mut block = AudioBuffer::stereo(256);
//! delay.process_block(&mut block);
//!
//! let copy = effect_from_dict(&delay.to_dict(), 48000.0).unwrap();
//! assert_eq!(copy.to_dict(), delay.to_dict());
//! ```

/// Implements the bypass plumbing shared by every effect.
macro_rules! effect_identity {
    () => {
        fn kind(&self) -> &'static str {
            Self::KIND
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        fn set_enabled(&mut self, enabled: bool) {
            self.enabled = enabled;
        }
    };
}

/// Implements `Stateful` for an effect with a `params` field and a
/// `set_params` method. The `buffered` form also captures delay lines
/// returned by `delay_lines` / `delay_lines_mut`.
macro_rules! impl_stateful {
    ($ty:ty, $params:ty) => {
        impl cadenza_core::Stateful for $ty {
            fn to_dict(&self) -> serde_json::Value {
                cadenza_core::effect_dict(Self::KIND, self.enabled, &self.params)
            }

            fn load_dict(&mut self, dict: &serde_json::Value) {
                let (params, enabled) = cadenza_core::decode_effect::<$params>(Self::KIND, dict);
                self.set_params(params);
                self.enabled = enabled;
            }
        }
    };
    ($ty:ty, $params:ty, buffered) => {
        impl cadenza_core::Stateful for $ty {
            fn to_dict(&self) -> serde_json::Value {
                cadenza_core::effect_dict(Self::KIND, self.enabled, &self.params)
            }

            fn load_dict(&mut self, dict: &serde_json::Value) {
                let (params, enabled) = cadenza_core::decode_effect::<$params>(Self::KIND, dict);
                self.set_params(params);
                self.enabled = enabled;
                cadenza_core::restore_buffers(Self::KIND, dict, self.delay_lines_mut());
            }

            fn snapshot(&self) -> serde_json::Value {
                let mut dict = self.to_dict();
                cadenza_core::attach_buffers(&mut dict, self.delay_lines());
                dict
            }
        }
    };
}

pub mod chorus;
pub mod compressor;
pub mod delay;
pub mod distortion;
pub mod dynamic_eq;
pub mod expander;
pub mod flanger;
pub mod gate;
pub mod limiter;
pub mod registry;
pub mod reverb;
pub mod saturation;
pub mod tremolo;
pub mod utility;

pub use chorus::{Chorus, ChorusParams};
pub use compressor::{Compressor, CompressorParams};
pub use delay::{
    MultiTapDelay, MultiTapParams, PingPongDelay, PingPongParams, SimpleDelay, SimpleDelayParams,
    StereoDelay, StereoDelayParams,
};
pub use distortion::{Distortion, DistortionMode, DistortionParams, ShaperCurve, WaveShaper, WaveShaperParams};
pub use dynamic_eq::{DynamicEq, DynamicEqBand, DynamicEqParams};
pub use expander::{Expander, ExpanderParams};
pub use flanger::{Flanger, FlangerParams};
pub use gate::{Gate, GateParams, NoiseGate, NoiseGateParams};
pub use limiter::{Limiter, LimiterParams};
pub use registry::{
    EFFECT_KINDS, EffectCategory, EffectDescriptor, create_effect, descriptor, descriptors,
    effect_from_dict,
};
pub use reverb::{Reverb, ReverbParams, ReverbPreset};
pub use saturation::{HardClip, HardClipParams, Saturation, SaturationParams};
pub use tremolo::{Tremolo, TremoloParams};
pub use utility::{Gain, GainParams, WidthControl, WidthParams};
