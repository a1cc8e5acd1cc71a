//! All meters behind one call, and the serializable summary they produce.

use cadenza_core::AudioBuffer;
use serde::{Deserialize, Serialize};

use crate::{Correlometer, FrequencyBand, LevelMeter, MeterSettings, SpectrumAnalyzer, VuMeter};

/// Snapshot of every meter, handed to presentation and suggestion layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterReadout {
    /// Held peak, dBFS.
    pub peak_db: f32,
    /// RMS, dBFS.
    pub rms_db: f32,
    /// VU needle, VU dB.
    pub vu_db: f32,
    /// Phase correlation in `[-1, 1]`.
    pub correlation: f32,
    /// Mean-square mid energy.
    pub mid_energy: f32,
    /// Mean-square side energy.
    pub side_energy: f32,
    /// Full-scale samples seen.
    pub clip_count: u64,
    /// Logarithmic spectrum summary.
    pub bands: Vec<FrequencyBand>,
}

/// Level, VU, correlation and spectrum meters fed from the same blocks.
///
/// # Example
///
/// ```rust
/// use cadenza_analysis::MeterBank;
/// use cadenza_core::AudioBuffer;
///
/// let mut meters = MeterBank::new(48000.0);
/// meters.process(&AudioBuffer::from_mono(vec![0.25; 4096]));
/// let readout = meters.readout();
/// assert!(readout.correlation > 0.99);
/// assert_eq!(readout.clip_count, 0);
/// ```
#[derive(Debug)]
pub struct MeterBank {
    /// Peak/RMS meter.
    pub level: LevelMeter,
    /// VU meter.
    pub vu: VuMeter,
    /// Phase correlation meter.
    pub correlation: Correlometer,
    /// Spectrum analyzer.
    pub spectrum: SpectrumAnalyzer,
}

impl MeterBank {
    /// Creates every meter with default settings.
    pub fn new(sample_rate: f32) -> Self {
        Self::with_settings(sample_rate, &MeterSettings::default())
    }

    /// Creates every meter from one settings block.
    pub fn with_settings(sample_rate: f32, settings: &MeterSettings) -> Self {
        Self {
            level: LevelMeter::with_settings(sample_rate, settings),
            vu: VuMeter::with_settings(sample_rate, settings),
            correlation: Correlometer::with_settings(sample_rate, settings),
            spectrum: SpectrumAnalyzer::with_settings(sample_rate, settings),
        }
    }

    /// Feeds one block to every meter.
    pub fn process(&mut self, buffer: &AudioBuffer) {
        self.level.process(buffer);
        self.vu.process(buffer);
        self.correlation.process(buffer);
        self.spectrum.process(buffer);
    }

    /// Current readings.
    pub fn readout(&self) -> MeterReadout {
        MeterReadout {
            peak_db: self.level.peak_db(),
            rms_db: self.level.rms_db(),
            vu_db: self.vu.vu_db(),
            correlation: self.correlation.correlation(),
            mid_energy: self.correlation.mid_energy(),
            side_energy: self.correlation.side_energy(),
            clip_count: self.level.clip_count(),
            bands: self.spectrum.frequency_bands(),
        }
    }

    /// Resets every meter.
    pub fn reset(&mut self) {
        self.level.reset();
        self.vu.reset();
        self.correlation.reset();
        self.spectrum.reset();
    }
}
