//! Effect factory keyed by kind tag.
//!
//! Every effect's `to_dict` output carries its kind under `"type"`, so
//! [`effect_from_dict`] can rebuild any chain from saved state.
//!
//! ```rust
//! use cadenza_core::Effect;
//! use cadenza_effects::{EFFECT_KINDS, create_effect};
//!
//! for kind in EFFECT_KINDS {
//!     let effect = create_effect(kind, 48000.0).unwrap();
//!     assert_eq!(effect.kind(), kind);
//! }
//! ```

use cadenza_core::{Effect, Stateful};
use serde_json::Value;

use crate::{
    Chorus, Compressor, Distortion, DynamicEq, Expander, Flanger, Gain, Gate, HardClip, Limiter,
    MultiTapDelay, NoiseGate, PingPongDelay, Reverb, Saturation, SimpleDelay, StereoDelay,
    Tremolo, WaveShaper, WidthControl,
};

/// Family of an effect, for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectCategory {
    /// Compressors, limiters, gates.
    Dynamics,
    /// Saturation, clipping, distortion.
    Saturation,
    /// Feedback delays.
    Delay,
    /// Reverbs.
    Reverb,
    /// LFO-driven effects.
    Modulation,
    /// Gain, width, EQ.
    Utility,
}

impl EffectCategory {
    /// Human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dynamics => "Dynamics",
            Self::Saturation => "Saturation",
            Self::Delay => "Delay",
            Self::Reverb => "Reverb",
            Self::Modulation => "Modulation",
            Self::Utility => "Utility",
        }
    }
}

/// Describes one registered effect.
#[derive(Debug, Clone, Copy)]
pub struct EffectDescriptor {
    /// Kind tag, as found under `"type"` in effect dicts.
    pub kind: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Family.
    pub category: EffectCategory,
}

type EffectFactory = fn(f32) -> Box<dyn Effect>;

const fn entry(
    kind: &'static str,
    name: &'static str,
    category: EffectCategory,
    factory: EffectFactory,
) -> (EffectDescriptor, EffectFactory) {
    (EffectDescriptor { kind, name, category }, factory)
}

use EffectCategory::{Delay, Dynamics, Modulation, Saturation as Sat, Utility};

static REGISTRY: [(EffectDescriptor, EffectFactory); 20] = [
    entry(Compressor::KIND, "Compressor", Dynamics, |sr| Box::new(Compressor::new(sr))),
    entry(Limiter::KIND, "Limiter", Dynamics, |sr| Box::new(Limiter::new(sr))),
    entry(Expander::KIND, "Expander", Dynamics, |sr| Box::new(Expander::new(sr))),
    entry(Gate::KIND, "Gate", Dynamics, |sr| Box::new(Gate::new(sr))),
    entry(NoiseGate::KIND, "Noise Gate", Dynamics, |sr| Box::new(NoiseGate::new(sr))),
    entry(Saturation::KIND, "Saturation", Sat, |sr| Box::new(Saturation::new(sr))),
    entry(HardClip::KIND, "Hard Clip", Sat, |sr| Box::new(HardClip::new(sr))),
    entry(Distortion::KIND, "Distortion", Sat, |sr| Box::new(Distortion::new(sr))),
    entry(WaveShaper::KIND, "Waveshaper", Sat, |sr| Box::new(WaveShaper::new(sr))),
    entry(SimpleDelay::KIND, "Simple Delay", Delay, |sr| Box::new(SimpleDelay::new(sr))),
    entry(PingPongDelay::KIND, "Ping-Pong Delay", Delay, |sr| {
        Box::new(PingPongDelay::new(sr))
    }),
    entry(MultiTapDelay::KIND, "Multi-Tap Delay", Delay, |sr| {
        Box::new(MultiTapDelay::new(sr))
    }),
    entry(StereoDelay::KIND, "Stereo Delay", Delay, |sr| Box::new(StereoDelay::new(sr))),
    entry(Reverb::KIND, "Reverb", EffectCategory::Reverb, |sr| Box::new(Reverb::new(sr))),
    entry(Chorus::KIND, "Chorus", Modulation, |sr| Box::new(Chorus::new(sr))),
    entry(Flanger::KIND, "Flanger", Modulation, |sr| Box::new(Flanger::new(sr))),
    entry(Tremolo::KIND, "Tremolo", Modulation, |sr| Box::new(Tremolo::new(sr))),
    entry(Gain::KIND, "Gain", Utility, |sr| Box::new(Gain::new(sr))),
    entry(WidthControl::KIND, "Width", Utility, |sr| Box::new(WidthControl::new(sr))),
    entry(DynamicEq::KIND, "Dynamic EQ", Utility, |sr| Box::new(DynamicEq::new(sr))),
];

/// Reverb presets reachable by name; they build a plain [`Reverb`].
static PRESET_ALIASES: [(&str, EffectFactory); 3] = [
    ("hall_reverb", |sr| Box::new(Reverb::hall(sr))),
    ("plate_reverb", |sr| Box::new(Reverb::plate(sr))),
    ("room_reverb", |sr| Box::new(Reverb::room(sr))),
];

/// Every canonical kind tag, in registry order.
pub const EFFECT_KINDS: [&str; 20] = [
    Compressor::KIND,
    Limiter::KIND,
    Expander::KIND,
    Gate::KIND,
    NoiseGate::KIND,
    Saturation::KIND,
    HardClip::KIND,
    Distortion::KIND,
    WaveShaper::KIND,
    SimpleDelay::KIND,
    PingPongDelay::KIND,
    MultiTapDelay::KIND,
    StereoDelay::KIND,
    Reverb::KIND,
    Chorus::KIND,
    Flanger::KIND,
    Tremolo::KIND,
    Gain::KIND,
    WidthControl::KIND,
    DynamicEq::KIND,
];

/// All registered effects.
pub fn descriptors() -> impl Iterator<Item = &'static EffectDescriptor> {
    REGISTRY.iter().map(|(descriptor, _)| descriptor)
}

/// Looks up a descriptor by kind.
pub fn descriptor(kind: &str) -> Option<&'static EffectDescriptor> {
    descriptors().find(|d| d.kind == kind)
}

/// Creates an effect with default settings.
///
/// Accepts every entry of [`EFFECT_KINDS`] plus the reverb preset names
/// `hall_reverb`, `plate_reverb` and `room_reverb`.
pub fn create_effect(kind: &str, sample_rate: f32) -> Option<Box<dyn Effect>> {
    REGISTRY
        .iter()
        .map(|(d, factory)| (d.kind, factory))
        .chain(PRESET_ALIASES.iter().map(|(alias, factory)| (*alias, factory)))
        .find(|(k, _)| *k == kind)
        .map(|(_, factory)| factory(sample_rate))
}

/// Rebuilds an effect from a dict produced by `to_dict` or `snapshot`.
///
/// Returns `None` when `"type"` is missing or unknown. Malformed parameters
/// fall back to defaults inside `load_dict`.
pub fn effect_from_dict(dict: &Value, sample_rate: f32) -> Option<Box<dyn Effect>> {
    let Some(kind) = dict.get("type").and_then(Value::as_str) else {
        tracing::warn!("effect dict has no type tag");
        return None;
    };
    let Some(mut effect) = create_effect(kind, sample_rate) else {
        tracing::warn!(kind, "unknown effect kind");
        return None;
    };
    effect.load_dict(dict);
    Some(effect)
}
