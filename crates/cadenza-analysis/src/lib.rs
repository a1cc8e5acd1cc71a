//! Cadenza Analysis - metering for the mixer and offline tools
//!
//! Every meter observes audio through `&AudioBuffer` and never modifies it,
//! so meters can sit anywhere in a signal chain.
//!
//! # Meters
//!
//! - [`LevelMeter`] - Peak (hold + decay), RMS, clip counter, level history
//! - [`VuMeter`] - Averaging meter on a -40..+6 VU scale
//! - [`Correlometer`] - Stereo phase correlation and mid/side energy
//! - [`SpectrumAnalyzer`] - Windowed FFT via `rustfft` with smoothing and
//!   logarithmic summary bands
//!
//! [`MeterBank`] feeds all four from the same blocks and summarises them in a
//! serializable [`MeterReadout`].
//!
//! # Example
//!
//! ```rust
//! use cadenza_analysis::{LevelMeter, SpectrumAnalyzer};
//! use cadenza_core::AudioBuffer;
//!
//! let block = AudioBuffer::from_mono(
//!     (0..4096).map(|i| 0.5 * (i as f32 * 0.1).sin()).collect(),
//! );
//!
//! let mut level = LevelMeter::new(48000.0);
//! level.process(&block);
//! assert!(level.peak_db() < -5.9);
//!
//! let mut spectrum = SpectrumAnalyzer::new(48000.0);
//! spectrum.process(&block);
//! assert!(spectrum.frames_analyzed() > 0);
//! ```

pub mod correlation;
pub mod level;
pub mod readout;
mod running;
pub mod settings;
pub mod spectrum;
pub mod vu;
pub mod window;

pub use correlation::Correlometer;
pub use level::{LevelMeter, LevelSample};
pub use readout::{MeterBank, MeterReadout};
pub use settings::MeterSettings;
pub use spectrum::{FrequencyBand, SpectrumAnalyzer};
pub use vu::{VU_MAX_DB, VU_MIN_DB, VuMeter};
pub use window::Window;
