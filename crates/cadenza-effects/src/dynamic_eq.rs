//! Dynamic EQ: per-band compression that only acts when a band is hot.
//!
//! Each band is extracted as the difference of two one-pole lowpasses placed
//! half an octave either side of the centre frequency:
//!
//! ```text
//! band = lp(f·√2) - lp(f/√2)
//! ```
//!
//! At the centre frequency this difference is in phase with the input at
//! about a third of its amplitude. When the band's envelope exceeds the
//! threshold the band is partly subtracted from the signal:
//!
//! ```text
//! g = db_to_linear((threshold - level) * (1 - 1/ratio))
//! y = x - band * (1 - g)
//! ```
//!
//! Bands run in series; a band below its threshold leaves the signal
//! bit-identical.

use core::f32::consts::SQRT_2;

use cadenza_core::{Effect, EnvelopeFollower, OnePole, db_to_linear, linear_to_db};
use serde::{Deserialize, Serialize};

/// Number of band slots.
pub const MAX_BANDS: usize = 4;

/// One dynamic EQ band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicEqBand {
    /// Whether the band is active.
    pub enabled: bool,
    /// Centre frequency.
    pub freq_hz: f32,
    /// Band level where reduction starts, dBFS.
    pub threshold_db: f32,
    /// Reduction ratio above the threshold.
    pub ratio: f32,
}

impl Default for DynamicEqBand {
    fn default() -> Self {
        Self {
            enabled: false,
            freq_hz: 1000.0,
            threshold_db: -24.0,
            ratio: 3.0,
        }
    }
}

impl DynamicEqBand {
    fn clamped(self) -> Self {
        Self {
            enabled: self.enabled,
            freq_hz: self.freq_hz.clamp(20.0, 20000.0),
            threshold_db: self.threshold_db.clamp(-60.0, 0.0),
            ratio: self.ratio.clamp(1.0, 20.0),
        }
    }
}

/// Dynamic EQ parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicEqParams {
    /// Band slots.
    pub bands: [DynamicEqBand; MAX_BANDS],
    /// Band envelope attack.
    pub attack_ms: f32,
    /// Band envelope release.
    pub release_ms: f32,
}

impl Default for DynamicEqParams {
    fn default() -> Self {
        let band = |freq_hz, enabled| DynamicEqBand {
            enabled,
            freq_hz,
            ..DynamicEqBand::default()
        };
        Self {
            bands: [
                band(120.0, false),
                band(500.0, false),
                band(3000.0, true),
                band(8000.0, false),
            ],
            attack_ms: 5.0,
            release_ms: 80.0,
        }
    }
}

/// Filter and detector state of one band on one channel.
#[derive(Debug, Clone)]
struct BandState {
    upper: OnePole,
    lower: OnePole,
    envelope: EnvelopeFollower,
}

impl BandState {
    fn new(sample_rate: f32) -> Self {
        Self {
            upper: OnePole::new(sample_rate, 1000.0 * SQRT_2),
            lower: OnePole::new(sample_rate, 1000.0 / SQRT_2),
            envelope: EnvelopeFollower::new(sample_rate),
        }
    }

    fn tune(&mut self, band: &DynamicEqBand, attack_ms: f32, release_ms: f32) {
        self.upper.set_frequency(band.freq_hz * SQRT_2);
        self.lower.set_frequency(band.freq_hz / SQRT_2);
        self.envelope.set_attack_ms(attack_ms);
        self.envelope.set_release_ms(release_ms);
    }

    #[inline]
    fn process(&mut self, band: &DynamicEqBand, x: f32) -> f32 {
        let content = self.upper.process(x) - self.lower.process(x);
        let level_db = linear_to_db(self.envelope.process(content));
        let over = level_db - band.threshold_db;
        if over <= 0.0 {
            return x;
        }
        let g = db_to_linear(-over * (1.0 - 1.0 / band.ratio));
        x - content * (1.0 - g)
    }

    fn reset(&mut self) {
        self.upper.reset();
        self.lower.reset();
        self.envelope.reset();
    }
}

/// Four-band dynamic EQ.
#[derive(Debug, Clone)]
pub struct DynamicEq {
    params: DynamicEqParams,
    states_l: [BandState; MAX_BANDS],
    states_r: [BandState; MAX_BANDS],
    enabled: bool,
}

impl DynamicEq {
    /// Registry tag.
    pub const KIND: &'static str = "dynamic_eq";

    /// Creates a dynamic EQ with a single active band at 3 kHz.
    pub fn new(sample_rate: f32) -> Self {
        let mut eq = Self {
            params: DynamicEqParams::default(),
            states_l: core::array::from_fn(|_| BandState::new(sample_rate)),
            states_r: core::array::from_fn(|_| BandState::new(sample_rate)),
            enabled: true,
        };
        eq.set_params(DynamicEqParams::default());
        eq
    }

    /// Current parameters.
    pub fn params(&self) -> &DynamicEqParams {
        &self.params
    }

    /// Applies every parameter, clamping each to its range.
    pub fn set_params(&mut self, params: DynamicEqParams) {
        self.params.attack_ms = params.attack_ms.clamp(0.0, 500.0);
        self.params.release_ms = params.release_ms.clamp(0.0, 5000.0);
        for (i, band) in params.bands.into_iter().enumerate() {
            self.set_band(i, band);
        }
    }

    /// Replaces one band slot. Out-of-range indices are ignored.
    pub fn set_band(&mut self, index: usize, band: DynamicEqBand) {
        let Some(slot) = self.params.bands.get_mut(index) else {
            return;
        };
        *slot = band.clamped();
        let (attack, release) = (self.params.attack_ms, self.params.release_ms);
        let band = *slot;
        self.states_l[index].tune(&band, attack, release);
        self.states_r[index].tune(&band, attack, release);
    }

    /// Band slot at `index`.
    pub fn band(&self, index: usize) -> Option<&DynamicEqBand> {
        self.params.bands.get(index)
    }
}

#[inline]
fn run_bands(states: &mut [BandState; MAX_BANDS], bands: &[DynamicEqBand; MAX_BANDS], x: f32) -> f32 {
    states
        .iter_mut()
        .zip(bands)
        .filter(|(_, band)| band.enabled)
        .fold(x, |acc, (state, band)| state.process(band, acc))
}

impl Effect for DynamicEq {
    effect_identity!();

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        run_bands(&mut self.states_l, &self.params.bands, input)
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        (
            run_bands(&mut self.states_l, &self.params.bands, left),
            run_bands(&mut self.states_r, &self.params.bands, right),
        )
    }

    fn reset(&mut self) {
        self.states_l.iter_mut().chain(&mut self.states_r).for_each(BandState::reset);
    }
}

impl_stateful!(DynamicEq, DynamicEqParams);
