//! Cadenza Automation - time-varying control of normalized parameters
//!
//! Every automatable value in cadenza is a normalized `f32` in `[0, 1]`
//! addressed by transport position in samples.
//!
//! - [`AutomationCurve`] - Sorted breakpoints with per-segment [`Interpolation`]
//! - [`Lfo`] - Depth-scaled oscillator, rate clamped to `[0.01, 100]` Hz
//! - [`Envelope`] - Linear ADSR state machine
//! - [`AutomatedParameter`] - Base value + curve + LFO + envelope, clamped
//! - [`ParameterTrack`] - Named parameter set with bulk mode switching
//! - [`Transport`] - Play/pause/seek/loop clock that drives the above
//!
//! # Example
//!
//! ```rust
//! use cadenza_automation::{AutomationPoint, ParameterTrack, Transport};
//!
//! let mut transport = Transport::new(48000.0);
//! let mut track = ParameterTrack::new("lead", 48000.0);
//! let volume = track.add_parameter("volume", 0.8);
//! volume.curve_mut().add_point(AutomationPoint::new(0, 0.0));
//! volume.curve_mut().add_point(AutomationPoint::new(48000, 1.0));
//!
//! transport.play();
//! transport.advance(24000);
//! let values = track.values_at(transport.sample_pos());
//! assert_eq!(values["volume"], 0.5);
//! ```

pub mod curve;
pub mod envelope;
pub mod lfo;
pub mod parameter;
pub mod transport;

pub use curve::{AutomationCurve, AutomationPoint, Interpolation};
pub use envelope::{Envelope, EnvelopeSettings, EnvelopeStage};
pub use lfo::{Lfo, LfoSettings};
pub use parameter::{AutomatedParameter, AutomationMode, ParameterTrack};
pub use transport::{Transport, TransportState};
