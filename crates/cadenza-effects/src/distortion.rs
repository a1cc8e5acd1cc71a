//! Multi-mode distortion and a static waveshaper.
//!
//! | Mode | Curve | Character |
//! |------|-------|-----------|
//! | Soft | `tanh(x)` | smooth, tube-like |
//! | Hard | linear to 0.5, then log-compressed toward 1.0 | transistor bite |
//! | Fuzz | hard clip plus a flip-flop sub-octave | gated, octave-down fuzz |

use core::f32::consts::FRAC_PI_2;

use cadenza_core::{Effect, db_to_linear, soft_clip, wet_dry_mix};
use libm::{logf, sinf};
use serde::{Deserialize, Serialize};

/// Knee of the hard curve; below it the signal passes linearly.
const HARD_KNEE: f32 = 0.5;
/// Level of the synthetic sub-octave in fuzz mode.
const SUB_OCTAVE_LEVEL: f32 = 0.3;

/// Distortion algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistortionMode {
    /// Hyperbolic tangent.
    #[default]
    Soft,
    /// Piecewise linear/logarithmic.
    Hard,
    /// Hard clip with sub-octave.
    Fuzz,
}

/// Distortion parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistortionParams {
    /// Algorithm.
    pub mode: DistortionMode,
    /// Input gain, dB.
    pub drive_db: f32,
    /// Output gain, dB.
    pub output_db: f32,
    /// Wet/dry blend.
    pub mix: f32,
}

impl Default for DistortionParams {
    fn default() -> Self {
        Self {
            mode: DistortionMode::Soft,
            drive_db: 12.0,
            output_db: 0.0,
            mix: 1.0,
        }
    }
}

/// Hard curve: linear below the knee, then `knee + (1-knee) * L/(1+L)` with
/// `L = ln(1 + |x| - knee)`. Never reaches 1.0.
#[inline]
fn hard_curve(x: f32) -> f32 {
    let a = x.abs();
    if a <= HARD_KNEE {
        x
    } else {
        let l = logf(1.0 + a - HARD_KNEE);
        (HARD_KNEE + (1.0 - HARD_KNEE) * l / (1.0 + l)).copysign(x)
    }
}

/// Per-channel state of the sub-octave divider.
#[derive(Debug, Clone, Copy)]
struct SubOctave {
    last: f32,
    polarity: f32,
}

impl SubOctave {
    const fn new() -> Self {
        Self {
            last: 0.0,
            polarity: 1.0,
        }
    }

    /// Flips polarity on each rising zero crossing, halving the frequency.
    #[inline]
    fn process(&mut self, x: f32) -> f32 {
        if self.last < 0.0 && x >= 0.0 {
            self.polarity = -self.polarity;
        }
        self.last = x;
        self.polarity * x.abs()
    }
}

/// Drive → mode curve → output gain → wet/dry.
///
/// # Example
///
/// ```rust
/// use cadenza_core::Effect;
/// use cadenza_effects::{Distortion, DistortionMode};
///
/// let mut dist = Distortion::new(48000.0);
/// dist.set_mode(DistortionMode::Hard);
/// dist.set_drive_db(30.0);
/// assert!(dist.process(0.8) < 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct Distortion {
    params: DistortionParams,
    drive: f32,
    output: f32,
    sub_l: SubOctave,
    sub_r: SubOctave,
    enabled: bool,
}

impl Distortion {
    /// Registry tag.
    pub const KIND: &'static str = "distortion";

    /// Creates a soft-mode distortion with 12 dB of drive.
    pub fn new(_sample_rate: f32) -> Self {
        let mut dist = Self {
            params: DistortionParams::default(),
            drive: 1.0,
            output: 1.0,
            sub_l: SubOctave::new(),
            sub_r: SubOctave::new(),
            enabled: true,
        };
        dist.set_params(DistortionParams::default());
        dist
    }

    /// Current parameters.
    pub fn params(&self) -> &DistortionParams {
        &self.params
    }

    /// Applies every parameter, clamping each to its range.
    pub fn set_params(&mut self, params: DistortionParams) {
        self.set_mode(params.mode);
        self.set_drive_db(params.drive_db);
        self.set_output_db(params.output_db);
        self.set_mix(params.mix);
    }

    /// Selects the algorithm.
    pub fn set_mode(&mut self, mode: DistortionMode) {
        self.params.mode = mode;
    }

    /// Sets the drive (0 to 40 dB).
    pub fn set_drive_db(&mut self, db: f32) {
        self.params.drive_db = db.clamp(0.0, 40.0);
        self.drive = db_to_linear(self.params.drive_db);
    }

    /// Sets the output gain (-24 to 12 dB).
    pub fn set_output_db(&mut self, db: f32) {
        self.params.output_db = db.clamp(-24.0, 12.0);
        self.output = db_to_linear(self.params.output_db);
    }

    /// Sets the wet/dry blend (0 to 1).
    pub fn set_mix(&mut self, mix: f32) {
        self.params.mix = mix.clamp(0.0, 1.0);
    }

    #[inline]
    fn distort(&self, sub: &mut SubOctave, input: f32) -> f32 {
        let driven = input * self.drive;
        let shaped = match self.params.mode {
            DistortionMode::Soft => soft_clip(driven),
            DistortionMode::Hard => hard_curve(driven),
            DistortionMode::Fuzz => {
                let clipped = driven.clamp(-1.0, 1.0);
                (clipped + SUB_OCTAVE_LEVEL * sub.process(clipped)).clamp(-1.0, 1.0)
            }
        };
        wet_dry_mix(input, shaped * self.output, self.params.mix)
    }
}

impl Effect for Distortion {
    effect_identity!();

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let mut sub = self.sub_l;
        let out = self.distort(&mut sub, input);
        self.sub_l = sub;
        out
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let (mut sl, mut sr) = (self.sub_l, self.sub_r);
        let out = (self.distort(&mut sl, left), self.distort(&mut sr, right));
        self.sub_l = sl;
        self.sub_r = sr;
        out
    }

    fn reset(&mut self) {
        self.sub_l = SubOctave::new();
        self.sub_r = SubOctave::new();
    }
}

impl_stateful!(Distortion, DistortionParams);

/// Static transfer curve of [`WaveShaper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaperCurve {
    /// `sin(x·π/2)` on the clamped input.
    Sine,
    /// Signed square, clamped.
    Square,
    /// `1.5(x - x³/3)`, saturating at ±1.
    Cubic,
    /// `tanh(x)`.
    #[default]
    Tanh,
}

impl ShaperCurve {
    /// Evaluates the curve.
    #[inline]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Self::Sine => sinf(x.clamp(-1.0, 1.0) * FRAC_PI_2),
            Self::Square => (x * x.abs()).clamp(-1.0, 1.0),
            Self::Cubic => {
                if x.abs() <= 1.0 {
                    1.5 * (x - x * x * x / 3.0)
                } else {
                    1.0f32.copysign(x)
                }
            }
            Self::Tanh => soft_clip(x),
        }
    }
}

/// Waveshaper parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveShaperParams {
    /// Transfer curve.
    pub curve: ShaperCurve,
    /// Input gain, dB.
    pub drive_db: f32,
    /// Output gain, dB.
    pub output_db: f32,
    /// Wet/dry blend.
    pub mix: f32,
}

impl Default for WaveShaperParams {
    fn default() -> Self {
        Self {
            curve: ShaperCurve::Tanh,
            drive_db: 6.0,
            output_db: 0.0,
            mix: 1.0,
        }
    }
}

/// Memoryless waveshaper applied after a drive stage.
#[derive(Debug, Clone)]
pub struct WaveShaper {
    params: WaveShaperParams,
    drive: f32,
    output: f32,
    enabled: bool,
}

impl WaveShaper {
    /// Registry tag.
    pub const KIND: &'static str = "waveshaper";

    /// Creates a tanh shaper with 6 dB of drive.
    pub fn new(_sample_rate: f32) -> Self {
        let mut shaper = Self {
            params: WaveShaperParams::default(),
            drive: 1.0,
            output: 1.0,
            enabled: true,
        };
        shaper.set_params(WaveShaperParams::default());
        shaper
    }

    /// Current parameters.
    pub fn params(&self) -> &WaveShaperParams {
        &self.params
    }

    /// Applies every parameter, clamping each to its range.
    pub fn set_params(&mut self, params: WaveShaperParams) {
        self.set_curve(params.curve);
        self.set_drive_db(params.drive_db);
        self.set_output_db(params.output_db);
        self.set_mix(params.mix);
    }

    /// Selects the transfer curve.
    pub fn set_curve(&mut self, curve: ShaperCurve) {
        self.params.curve = curve;
    }

    /// Sets the drive (0 to 24 dB).
    pub fn set_drive_db(&mut self, db: f32) {
        self.params.drive_db = db.clamp(0.0, 24.0);
        self.drive = db_to_linear(self.params.drive_db);
    }

    /// Sets the output gain (-24 to 12 dB).
    pub fn set_output_db(&mut self, db: f32) {
        self.params.output_db = db.clamp(-24.0, 12.0);
        self.output = db_to_linear(self.params.output_db);
    }

    /// Sets the wet/dry blend (0 to 1).
    pub fn set_mix(&mut self, mix: f32) {
        self.params.mix = mix.clamp(0.0, 1.0);
    }
}

impl Effect for WaveShaper {
    effect_identity!();

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let wet = self.params.curve.apply(input * self.drive) * self.output;
        wet_dry_mix(input, wet, self.params.mix)
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        (self.process(left), self.process(right))
    }

    fn reset(&mut self) {}
}

impl_stateful!(WaveShaper, WaveShaperParams);
