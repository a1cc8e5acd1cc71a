//! Session configuration file format.

use std::fmt;
use std::path::Path;

use cadenza_analysis::MeterSettings;
use cadenza_core::Effect;
use cadenza_effects::{create_effect, effect_from_dict};
use cadenza_mixer::{MAX_VOLUME_DB, MIN_VOLUME_DB, Router, TrackType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ConfigError, read_text, write_creating_dirs};

/// Lowest accepted sample rate, Hz.
pub const MIN_SAMPLE_RATE: u32 = 8000;
/// Highest accepted sample rate, Hz.
pub const MAX_SAMPLE_RATE: u32 = 384_000;
/// Smallest accepted block size.
pub const MIN_BLOCK_SIZE: usize = 16;
/// Largest accepted block size.
pub const MAX_BLOCK_SIZE: usize = 8192;

/// Id of the track [`SessionConfig::build_router`] places the inserts on.
pub const MAIN_TRACK_ID: &str = "main";

/// One effect in the session's insert chain.
///
/// `params` uses the same names as the effect's `to_dict()["params"]`;
/// missing parameters keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertConfig {
    /// Registry tag, e.g. `"compressor"` or `"hall_reverb"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Bypass flag.
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    /// Parameter overrides.
    #[serde(default)]
    pub params: Map<String, Value>,
}

fn enabled_default() -> bool {
    true
}

impl InsertConfig {
    /// An enabled insert with default parameters.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            enabled: true,
            params: Map::new(),
        }
    }

    /// Builder-style parameter override.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Builder-style bypass.
    pub fn bypassed(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Creates the configured effect.
    ///
    /// Preset aliases such as `"hall_reverb"` start from the preset and then
    /// apply `params` on top.
    pub fn build(&self, sample_rate: f32) -> Result<Box<dyn Effect>, ConfigError> {
        let mut effect = create_effect(&self.kind, sample_rate)
            .ok_or_else(|| ConfigError::UnknownEffect(self.kind.clone()))?;
        let mut dict = effect.to_dict();
        if let Some(map) = dict.as_object_mut() {
            map.insert("enabled".to_owned(), Value::Bool(self.enabled));
            if let Some(params) = map.get_mut("params").and_then(Value::as_object_mut) {
                for (name, value) in &self.params {
                    params.insert(name.clone(), value.clone());
                }
            }
        }
        match effect_from_dict(&dict, sample_rate) {
            Some(configured) => effect = configured,
            None => tracing::warn!(kind = %self.kind, "insert params not applied"),
        }
        Ok(effect)
    }
}

/// A problem found and corrected by [`SessionConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Offending field, dotted for nested values.
    pub field: String,
    /// What was wrong and what was done about it.
    pub message: String,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Engine-wide settings for a session.
///
/// # TOML Format
///
/// ```toml
/// sample_rate = 48000
/// block_size = 512
/// master_volume_db = -1.0
///
/// [meter]
/// peak_hold_ms = 1500.0
/// window = "blackman"
///
/// [[inserts]]
/// type = "compressor"
/// [inserts.params]
/// threshold_db = -18.0
///
/// [[inserts]]
/// type = "plate_reverb"
/// enabled = false
/// ```
///
/// Every field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Processing sample rate, Hz.
    pub sample_rate: u32,
    /// Samples per processed block.
    pub block_size: usize,
    /// Master fader, dB.
    pub master_volume_db: f32,
    /// Meter ballistics and spectrum settings.
    pub meter: MeterSettings,
    /// Insert chain applied to the main track.
    pub inserts: Vec<InsertConfig>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            block_size: 512,
            master_volume_db: 0.0,
            meter: MeterSettings::default(),
            inserts: Vec::new(),
        }
    }
}

impl SessionConfig {
    /// Load a session from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = read_text(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), inserts = config.inserts.len(), "session_load");
        Ok(config)
    }

    /// Parse a session from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Convert the session to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save the session to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        write_creating_dirs(path.as_ref(), &self.to_toml()?)
    }

    /// Sample rate as `f32`, the type the DSP code takes.
    pub fn sample_rate_hz(&self) -> f32 {
        self.sample_rate as f32
    }

    /// Forces every field into range and drops inserts with unknown types.
    ///
    /// Returns one issue per correction; an empty list means the session was
    /// already valid.
    pub fn validate(&mut self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let mut report = |field: &str, message: String| {
            tracing::warn!(field, %message, "session_validate");
            issues.push(ConfigIssue {
                field: field.to_owned(),
                message,
            });
        };

        let sample_rate = self.sample_rate.clamp(MIN_SAMPLE_RATE, MAX_SAMPLE_RATE);
        if sample_rate != self.sample_rate {
            report(
                "sample_rate",
                format!("{} Hz out of range, using {sample_rate}", self.sample_rate),
            );
            self.sample_rate = sample_rate;
        }

        let block_size = self.block_size.clamp(MIN_BLOCK_SIZE, MAX_BLOCK_SIZE);
        if block_size != self.block_size {
            report(
                "block_size",
                format!("{} out of range, using {block_size}", self.block_size),
            );
            self.block_size = block_size;
        }

        let volume = if self.master_volume_db.is_nan() {
            0.0
        } else {
            self.master_volume_db.clamp(MIN_VOLUME_DB, MAX_VOLUME_DB)
        };
        if volume.to_bits() != self.master_volume_db.to_bits() {
            report(
                "master_volume_db",
                format!("{} dB out of range, using {volume}", self.master_volume_db),
            );
            self.master_volume_db = volume;
        }

        let meter = self.meter.clamped();
        if meter != self.meter {
            report("meter", "settings out of range, clamped".to_owned());
            self.meter = meter;
        }

        let sample_rate = self.sample_rate_hz();
        let mut index = 0;
        self.inserts.retain(|insert| {
            let known = create_effect(&insert.kind, sample_rate).is_some();
            if !known {
                report(
                    &format!("inserts[{index}]"),
                    format!("unknown effect type '{}', removed", insert.kind),
                );
            }
            index += 1;
            known
        });

        issues
    }

    /// Builds the insert chain in order.
    pub fn build_inserts(&self) -> Result<Vec<Box<dyn Effect>>, ConfigError> {
        let sample_rate = self.sample_rate_hz();
        self.inserts
            .iter()
            .map(|insert| insert.build(sample_rate))
            .collect()
    }

    /// A router holding a master bus at `master_volume_db` and one audio
    /// track, [`MAIN_TRACK_ID`], carrying the insert chain.
    pub fn build_router(&self) -> Result<Router, ConfigError> {
        let mut router = Router::new(self.sample_rate_hz(), self.block_size);
        let master = router.create_master_bus()?;
        if let Some(track) = router.track_mut(&master) {
            track.set_volume(self.master_volume_db);
        }
        let main = router.add_track(MAIN_TRACK_ID, "Main", TrackType::Audio)?;
        for effect in self.build_inserts()? {
            main.add_insert(effect);
        }
        Ok(router)
    }
}
