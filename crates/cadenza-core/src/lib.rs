//! Cadenza Core - DSP primitives and the audio graph engine
//!
//! This crate holds the building blocks shared by every other cadenza crate,
//! designed for real-time processing with no allocation in the audio path.
//!
//! # Core Abstractions
//!
//! - [`Effect`] - Object-safe trait for all audio effects, with a bypass flag
//!   and mono/stereo block processing over [`AudioBuffer`]
//! - [`Stateful`] - `to_dict` / `load_dict` parameter round-trip
//! - [`SharedParam`] - Lock-free `f32` cell for cross-thread parameter writes
//!
//! ## Filters and Delay Lines
//!
//! - [`DelayLine`] - Fixed-length circular buffer
//! - [`CombFilter`] - Feedback comb with damping for reverbs
//! - [`AllpassFilter`] - Schroeder allpass for diffusion
//! - [`OnePole`] - 6 dB/oct lowpass for tone and damping
//!
//! ## Modulation & Dynamics
//!
//! - [`Lfo`] - Low-frequency oscillator (4 waveforms)
//! - [`EnvelopeFollower`] - Amplitude envelope detection
//!
//! ## Graph
//!
//! - [`graph::AudioEngine`] - Arena-backed DAG with Kahn scheduling
//!
//! # Example
//!
//! ```rust
//! use cadenza_core::{CombFilter, db_to_linear};
//!
//! let mut comb = CombFilter::new(1116);
//! comb.set_feedback(0.84);
//! let out = comb.process(db_to_linear(-6.0));
//! assert_eq!(out, 0.0);
//! ```

pub mod allpass;
pub mod buffer;
pub mod comb;
pub mod delay;
pub mod effect;
pub mod envelope;
pub mod graph;
pub mod lfo;
pub mod math;
pub mod one_pole;
pub mod param;
pub mod state;

pub use allpass::AllpassFilter;
pub use buffer::AudioBuffer;
pub use comb::CombFilter;
pub use delay::DelayLine;
pub use effect::Effect;
pub use envelope::EnvelopeFollower;
pub use graph::{AudioEngine, GraphError, NodeId, NodeKind};
pub use lfo::{Lfo, LfoWaveform};
pub use math::{
    EPSILON, clip_unit, constant_power_pan, db_to_linear, flush_denormal, hard_clip, lerp,
    linear_to_db, mid_side_width, ms_to_samples, smoothstep, soft_clip, time_coefficient,
    wet_dry_mix,
};
pub use one_pole::OnePole;
pub use param::SharedParam;
pub use state::{
    BufferState, Stateful, attach_buffers, decode_effect, decode_or_warn, effect_dict,
    restore_buffers,
};
