//! ADSR envelope for parameter modulation.
//!
//! Segments are linear in time so a given setting always reaches its target
//! after the same number of samples:
//!
//! ```text
//! Idle --trigger--> Attack --> Decay --> Sustain --release--> Release --> Idle
//! ```
//!
//! Sustain is held until [`Envelope::release`]. Triggering or releasing
//! ramps from the current level, so each stage lasts exactly its set time
//! whatever level it starts from.

use cadenza_core::{Stateful, decode_or_warn, ms_to_samples};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStage {
    /// Output is zero.
    #[default]
    Idle,
    /// Rising to 1.
    Attack,
    /// Falling to the sustain level.
    Decay,
    /// Holding at the sustain level.
    Sustain,
    /// Falling to zero.
    Release,
}

/// Serializable ADSR settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeSettings {
    /// Attack time.
    pub attack_ms: f32,
    /// Decay time.
    pub decay_ms: f32,
    /// Sustain level in `[0, 1]`.
    pub sustain: f32,
    /// Release time.
    pub release_ms: f32,
}

impl Default for EnvelopeSettings {
    fn default() -> Self {
        Self {
            attack_ms: 10.0,
            decay_ms: 100.0,
            sustain: 0.7,
            release_ms: 200.0,
        }
    }
}

impl EnvelopeSettings {
    fn clamped(self) -> Self {
        Self {
            attack_ms: self.attack_ms.clamp(0.0, 60_000.0),
            decay_ms: self.decay_ms.clamp(0.0, 60_000.0),
            sustain: self.sustain.clamp(0.0, 1.0),
            release_ms: self.release_ms.clamp(0.0, 60_000.0),
        }
    }
}

/// Linear ADSR state machine.
///
/// ```rust
/// use cadenza_automation::{Envelope, EnvelopeStage};
///
/// let mut env = Envelope::new(1000.0);
/// env.set_attack_ms(10.0);
/// env.trigger();
/// for _ in 0..10 {
///     env.next();
/// }
/// assert_eq!(env.stage(), EnvelopeStage::Decay);
/// assert_eq!(env.level(), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct Envelope {
    settings: EnvelopeSettings,
    sample_rate: f32,
    stage: EnvelopeStage,
    level: f32,
    target: f32,
    step: f32,
    remaining: u32,
}

impl Envelope {
    /// Creates an idle envelope with 10/100/0.7/200 settings.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            settings: EnvelopeSettings::default(),
            sample_rate,
            stage: EnvelopeStage::Idle,
            level: 0.0,
            target: 0.0,
            step: 0.0,
            remaining: 0,
        }
    }

    /// Current settings.
    pub fn settings(&self) -> &EnvelopeSettings {
        &self.settings
    }

    /// Applies every setting, clamping each to its range.
    ///
    /// A stage already in progress keeps its original slope.
    pub fn apply(&mut self, settings: EnvelopeSettings) {
        self.settings = settings.clamped();
    }

    /// Sets the attack time.
    pub fn set_attack_ms(&mut self, ms: f32) {
        self.apply(EnvelopeSettings { attack_ms: ms, ..self.settings });
    }

    /// Sets the decay time.
    pub fn set_decay_ms(&mut self, ms: f32) {
        self.apply(EnvelopeSettings { decay_ms: ms, ..self.settings });
    }

    /// Sets the sustain level.
    pub fn set_sustain(&mut self, level: f32) {
        self.apply(EnvelopeSettings { sustain: level, ..self.settings });
    }

    /// Sets the release time.
    pub fn set_release_ms(&mut self, ms: f32) {
        self.apply(EnvelopeSettings { release_ms: ms, ..self.settings });
    }

    /// Current stage.
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    /// Current output without advancing.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// True unless idle.
    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Idle
    }

    /// Starts the attack from the current level.
    pub fn trigger(&mut self) {
        self.enter(EnvelopeStage::Attack);
    }

    /// Starts the release from the current level. Ignored while idle.
    pub fn release(&mut self) {
        if self.stage != EnvelopeStage::Idle {
            self.enter(EnvelopeStage::Release);
        }
    }

    /// Returns to idle at level zero.
    pub fn reset(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.level = 0.0;
        self.remaining = 0;
    }

    fn enter(&mut self, stage: EnvelopeStage) {
        self.stage = stage;
        let (target, ms) = match stage {
            EnvelopeStage::Attack => (1.0, self.settings.attack_ms),
            EnvelopeStage::Decay => (self.settings.sustain, self.settings.decay_ms),
            EnvelopeStage::Release => (0.0, self.settings.release_ms),
            EnvelopeStage::Sustain => {
                self.level = self.settings.sustain;
                return;
            }
            EnvelopeStage::Idle => {
                self.level = 0.0;
                return;
            }
        };

        let samples = ms_to_samples(ms, self.sample_rate).round() as u32;
        self.target = target;
        if samples == 0 {
            self.level = target;
            self.finish_stage();
        } else {
            self.step = (target - self.level) / samples as f32;
            self.remaining = samples;
        }
    }

    fn finish_stage(&mut self) {
        match self.stage {
            EnvelopeStage::Attack => self.enter(EnvelopeStage::Decay),
            EnvelopeStage::Decay => self.enter(EnvelopeStage::Sustain),
            EnvelopeStage::Release => self.enter(EnvelopeStage::Idle),
            EnvelopeStage::Sustain | EnvelopeStage::Idle => {}
        }
    }

    /// Advances one sample and returns the new level.
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => {}
            EnvelopeStage::Sustain => self.level = self.settings.sustain,
            EnvelopeStage::Attack | EnvelopeStage::Decay | EnvelopeStage::Release => {
                self.remaining -= 1;
                if self.remaining == 0 {
                    self.level = self.target;
                    self.finish_stage();
                } else {
                    self.level += self.step;
                }
            }
        }
        self.level
    }

    /// Advances `samples` steps and returns the final level.
    pub fn advance(&mut self, samples: usize) -> f32 {
        for _ in 0..samples {
            self.next();
            if matches!(self.stage, EnvelopeStage::Idle | EnvelopeStage::Sustain) {
                break;
            }
        }
        self.level
    }
}

impl Stateful for Envelope {
    fn to_dict(&self) -> Value {
        serde_json::to_value(self.settings).unwrap_or_default()
    }

    fn load_dict(&mut self, dict: &Value) {
        self.apply(decode_or_warn("envelope", dict).unwrap_or_default());
        self.reset();
    }
}
