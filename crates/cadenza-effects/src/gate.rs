//! Gates for silencing signals below a threshold.
//!
//! [`Gate`] opens whenever the detected level reaches its threshold and stays
//! fully open for `hold_ms` after the last loud sample. [`NoiseGate`] adds
//! hysteresis: it opens above `open_threshold_db` but only closes once the
//! level has fallen below the lower `close_threshold_db`, so material that
//! hovers around a single threshold does not chatter.

use cadenza_core::{Effect, EnvelopeFollower, db_to_linear, time_coefficient};
use serde::{Deserialize, Serialize};

/// Detector ballistics: fast attack, short release.
const DETECTOR_ATTACK_MS: f32 = 0.1;
const DETECTOR_RELEASE_MS: f32 = 20.0;

/// Smoothed open/closed gain shared by both gates.
#[derive(Debug, Clone)]
struct GateGain {
    gain: f32,
    attack_coeff: f32,
    release_coeff: f32,
}

impl GateGain {
    fn new() -> Self {
        Self {
            gain: 0.0,
            attack_coeff: 1.0,
            release_coeff: 1.0,
        }
    }

    fn set_times(&mut self, attack_ms: f32, release_ms: f32, sample_rate: f32) {
        self.attack_coeff = time_coefficient(attack_ms / 1000.0, sample_rate);
        self.release_coeff = time_coefficient(release_ms / 1000.0, sample_rate);
    }

    #[inline]
    fn follow(&mut self, open: bool) -> f32 {
        let (target, coeff) = if open {
            (1.0, self.attack_coeff)
        } else {
            (0.0, self.release_coeff)
        };
        self.gain += coeff * (target - self.gain);
        self.gain
    }
}

fn detector(sample_rate: f32) -> EnvelopeFollower {
    EnvelopeFollower::with_times(sample_rate, DETECTOR_ATTACK_MS, DETECTOR_RELEASE_MS)
}

#[inline]
fn ms_to_count(ms: f32, sample_rate: f32) -> u32 {
    (ms * sample_rate / 1000.0) as u32
}

/// Gate parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateParams {
    /// Open threshold, dBFS.
    pub threshold_db: f32,
    /// Opening time.
    pub attack_ms: f32,
    /// Time held fully open after the last loud sample.
    pub hold_ms: f32,
    /// Closing time.
    pub release_ms: f32,
}

impl Default for GateParams {
    fn default() -> Self {
        Self {
            threshold_db: -40.0,
            attack_ms: 1.0,
            hold_ms: 50.0,
            release_ms: 100.0,
        }
    }
}

/// Gate with hold.
#[derive(Debug, Clone)]
pub struct Gate {
    params: GateParams,
    detector: EnvelopeFollower,
    gain: GateGain,
    threshold: f32,
    hold_samples: u32,
    hold_counter: u32,
    sample_rate: f32,
    enabled: bool,
}

impl Gate {
    /// Registry tag.
    pub const KIND: &'static str = "gate";

    /// Creates a gate with default settings.
    pub fn new(sample_rate: f32) -> Self {
        let params = GateParams::default();
        let mut gate = Self {
            params,
            detector: detector(sample_rate),
            gain: GateGain::new(),
            threshold: 0.0,
            hold_samples: 0,
            hold_counter: 0,
            sample_rate,
            enabled: true,
        };
        gate.set_params(params);
        gate
    }

    /// Current parameters.
    pub fn params(&self) -> &GateParams {
        &self.params
    }

    /// Applies every parameter, clamping each to its range.
    pub fn set_params(&mut self, params: GateParams) {
        self.set_threshold_db(params.threshold_db);
        self.params.attack_ms = params.attack_ms.clamp(0.0, 100.0);
        self.params.release_ms = params.release_ms.clamp(0.0, 2000.0);
        self.update_times();
        self.set_hold_ms(params.hold_ms);
    }

    /// Sets the threshold (-80 to 0 dB).
    pub fn set_threshold_db(&mut self, db: f32) {
        self.params.threshold_db = db.clamp(-80.0, 0.0);
        self.threshold = db_to_linear(self.params.threshold_db);
    }

    /// Sets the attack time (0 to 100 ms).
    pub fn set_attack_ms(&mut self, ms: f32) {
        self.params.attack_ms = ms.clamp(0.0, 100.0);
        self.update_times();
    }

    /// Sets the hold time (0 to 1000 ms).
    pub fn set_hold_ms(&mut self, ms: f32) {
        self.params.hold_ms = ms.clamp(0.0, 1000.0);
        self.hold_samples = ms_to_count(self.params.hold_ms, self.sample_rate);
    }

    /// Sets the release time (0 to 2000 ms).
    pub fn set_release_ms(&mut self, ms: f32) {
        self.params.release_ms = ms.clamp(0.0, 2000.0);
        self.update_times();
    }

    /// Returns true while the gate is open or holding.
    pub fn is_open(&self) -> bool {
        self.detector.level() >= self.threshold || self.hold_counter > 0
    }

    fn update_times(&mut self) {
        self.gain
            .set_times(self.params.attack_ms, self.params.release_ms, self.sample_rate);
    }

    #[inline]
    fn gain_for(&mut self, detector: f32) -> f32 {
        let level = self.detector.process(detector);
        let open = if level >= self.threshold {
            self.hold_counter = self.hold_samples;
            true
        } else if self.hold_counter > 0 {
            self.hold_counter -= 1;
            true
        } else {
            false
        };
        self.gain.follow(open)
    }
}

impl Effect for Gate {
    effect_identity!();

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        input * self.gain_for(input)
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let gain = self.gain_for(left.abs().max(right.abs()));
        (left * gain, right * gain)
    }

    fn reset(&mut self) {
        self.detector.reset();
        self.gain.gain = 0.0;
        self.hold_counter = 0;
    }
}

impl_stateful!(Gate, GateParams);

/// Noise gate parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseGateParams {
    /// Level that opens a closed gate, dBFS.
    pub open_threshold_db: f32,
    /// Level below which an open gate starts closing, dBFS. Never above the
    /// open threshold.
    pub close_threshold_db: f32,
    /// Opening time.
    pub attack_ms: f32,
    /// Time held open after the level drops below the close threshold.
    pub hold_ms: f32,
    /// Closing time.
    pub release_ms: f32,
}

impl Default for NoiseGateParams {
    fn default() -> Self {
        Self {
            open_threshold_db: -35.0,
            close_threshold_db: -40.0,
            attack_ms: 1.0,
            hold_ms: 10.0,
            release_ms: 50.0,
        }
    }
}

/// Noise gate with hysteresis.
///
/// # Example
///
/// ```rust
/// use cadenza_core::Effect;
/// use cadenza_effects::NoiseGate;
///
/// let mut gate = NoiseGate::new(48000.0);
/// gate.set_thresholds_db(-35.0, -40.0);
/// for _ in 0..480 {
///     gate.process(0.1);
/// }
/// assert!(gate.is_open());
/// assert_eq!(gate.toggle_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct NoiseGate {
    params: NoiseGateParams,
    detector: EnvelopeFollower,
    gain: GateGain,
    open_threshold: f32,
    close_threshold: f32,
    hold_samples: u32,
    hold_counter: u32,
    is_open: bool,
    toggles: u64,
    sample_rate: f32,
    enabled: bool,
}

impl NoiseGate {
    /// Registry tag.
    pub const KIND: &'static str = "noise_gate";

    /// Creates a noise gate with default settings.
    pub fn new(sample_rate: f32) -> Self {
        let params = NoiseGateParams::default();
        let mut gate = Self {
            params,
            detector: detector(sample_rate),
            gain: GateGain::new(),
            open_threshold: 0.0,
            close_threshold: 0.0,
            hold_samples: 0,
            hold_counter: 0,
            is_open: false,
            toggles: 0,
            sample_rate,
            enabled: true,
        };
        gate.set_params(params);
        gate
    }

    /// Current parameters.
    pub fn params(&self) -> &NoiseGateParams {
        &self.params
    }

    /// Applies every parameter, clamping each to its range.
    pub fn set_params(&mut self, params: NoiseGateParams) {
        self.set_thresholds_db(params.open_threshold_db, params.close_threshold_db);
        self.params.attack_ms = params.attack_ms.clamp(0.0, 100.0);
        self.params.release_ms = params.release_ms.clamp(0.0, 2000.0);
        self.gain
            .set_times(self.params.attack_ms, self.params.release_ms, self.sample_rate);
        self.set_hold_ms(params.hold_ms);
    }

    /// Sets both thresholds (-80 to 0 dB); `close_db` is capped at `open_db`.
    pub fn set_thresholds_db(&mut self, open_db: f32, close_db: f32) {
        let open_db = open_db.clamp(-80.0, 0.0);
        let close_db = close_db.clamp(-80.0, open_db);
        self.params.open_threshold_db = open_db;
        self.params.close_threshold_db = close_db;
        self.open_threshold = db_to_linear(open_db);
        self.close_threshold = db_to_linear(close_db);
    }

    /// Sets the attack time (0 to 100 ms).
    pub fn set_attack_ms(&mut self, ms: f32) {
        self.params.attack_ms = ms.clamp(0.0, 100.0);
        self.gain
            .set_times(self.params.attack_ms, self.params.release_ms, self.sample_rate);
    }

    /// Sets the hold time (0 to 1000 ms).
    pub fn set_hold_ms(&mut self, ms: f32) {
        self.params.hold_ms = ms.clamp(0.0, 1000.0);
        self.hold_samples = ms_to_count(self.params.hold_ms, self.sample_rate);
    }

    /// Sets the release time (0 to 2000 ms).
    pub fn set_release_ms(&mut self, ms: f32) {
        self.params.release_ms = ms.clamp(0.0, 2000.0);
        self.gain
            .set_times(self.params.attack_ms, self.params.release_ms, self.sample_rate);
    }

    /// Current open/closed state.
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Number of open/close transitions since construction or the last
    /// [`reset`](Effect::reset).
    pub fn toggle_count(&self) -> u64 {
        self.toggles
    }

    #[inline]
    fn gain_for(&mut self, detector: f32) -> f32 {
        let level = self.detector.process(detector);
        if self.is_open {
            if level >= self.close_threshold {
                self.hold_counter = self.hold_samples;
            } else if self.hold_counter > 0 {
                self.hold_counter -= 1;
            } else {
                self.is_open = false;
                self.toggles += 1;
            }
        } else if level >= self.open_threshold {
            self.is_open = true;
            self.hold_counter = self.hold_samples;
            self.toggles += 1;
        }
        self.gain.follow(self.is_open)
    }
}

impl Effect for NoiseGate {
    effect_identity!();

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        input * self.gain_for(input)
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let gain = self.gain_for(left.abs().max(right.abs()));
        (left * gain, right * gain)
    }

    fn reset(&mut self) {
        self.detector.reset();
        self.gain.gain = 0.0;
        self.hold_counter = 0;
        self.is_open = false;
        self.toggles = 0;
    }
}

impl_stateful!(NoiseGate, NoiseGateParams);
