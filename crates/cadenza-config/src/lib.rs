//! Session configuration and project files for cadenza.
//!
//! - [`SessionConfig`] - TOML engine settings: sample rate, block size,
//!   master level, meter settings and an insert chain
//! - [`ProjectFile`] - JSON project holding a session plus captured router
//!   and automation state
//!
//! Every field has a default, so partial files load. [`SessionConfig::validate`]
//! clamps out-of-range values and reports what it changed.
//!
//! # Example
//!
//! ```rust
//! use cadenza_config::{InsertConfig, SessionConfig};
//!
//! let mut config = SessionConfig::from_toml_str(r#"
//!     sample_rate = 44100
//!     master_volume_db = -2.0
//!
//!     [[inserts]]
//!     type = "gain"
//!     params = { gain_db = 3.0 }
//! "#).unwrap();
//! assert!(config.validate().is_empty());
//!
//! config.inserts.push(InsertConfig::new("room_reverb"));
//! let router = config.build_router().unwrap();
//! assert_eq!(router.track("main").unwrap().insert_count(), 2);
//! ```

mod error;
pub mod project;
pub mod session;

pub use error::ConfigError;
pub use project::ProjectFile;
pub use session::{
    ConfigIssue, InsertConfig, MAIN_TRACK_ID, MAX_BLOCK_SIZE, MAX_SAMPLE_RATE, MIN_BLOCK_SIZE,
    MIN_SAMPLE_RATE, SessionConfig,
};
