//! Cadenza Mixer - tracks, sends and bus routing
//!
//! A [`Track`] is a channel strip: input trim, an insert chain of
//! [`cadenza_core::Effect`]s, then fader, constant-power pan, mute and phase.
//! Pre-fader sends tap after the inserts, post-fader sends after the fader.
//!
//! The [`Router`] owns the tracks, an id-keyed routing matrix and the mix
//! loop. Routing edits are never rejected for creating feedback;
//! [`Router::validate_routing`] finds cycles with a depth-first search and
//! [`Router::process_block`] refuses to mix while one exists.
//!
//! # Example
//!
//! ```rust
//! use cadenza_core::AudioBuffer;
//! use cadenza_effects::create_effect;
//! use cadenza_mixer::{Router, TrackType};
//!
//! let mut router = Router::new(48000.0, 256);
//! router.create_master_bus().unwrap();
//! router.add_track("vox", "Vocals", TrackType::Audio).unwrap();
//! router.add_track("verb", "Reverb", TrackType::Aux).unwrap();
//!
//! let vox = router.track_mut("vox").unwrap();
//! vox.add_insert(create_effect("compressor", 48000.0).unwrap());
//! vox.set_volume(-3.0);
//! router.add_send("vox", "verb", -12.0, false).unwrap();
//! router.track_mut("verb").unwrap().add_insert(create_effect("hall_reverb", 48000.0).unwrap());
//!
//! assert!(router.validate_routing().valid);
//! router.set_input("vox", &AudioBuffer::from_mono(vec![0.1; 256])).unwrap();
//! router.process_block().unwrap();
//! assert_eq!(router.output().len(), 256);
//! ```

pub mod error;
pub mod router;
pub mod track;

pub use error::MixerError;
pub use router::{MASTER_ID, Router, RoutingReport};
pub use track::{
    MAX_INPUT_GAIN_DB, MAX_VOLUME_DB, MIN_VOLUME_DB, Track, TrackControls, TrackSend, TrackType,
};
