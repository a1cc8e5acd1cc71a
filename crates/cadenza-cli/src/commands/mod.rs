//! CLI command implementations.

pub mod analyze;
pub mod effects;
pub mod render;

use cadenza_analysis::MeterReadout;

/// Prints a meter readout as an indented block.
pub(crate) fn print_readout(label: &str, readout: &MeterReadout, show_bands: bool) {
    println!("{label}:");
    println!("  Peak         {:>8.1} dBFS", readout.peak_db);
    println!("  RMS          {:>8.1} dBFS", readout.rms_db);
    println!("  VU           {:>8.1} VU", readout.vu_db);
    println!("  Correlation  {:>8.2}", readout.correlation);
    println!("  Clips        {:>8}", readout.clip_count);

    if show_bands && !readout.bands.is_empty() {
        println!();
        println!("  {:>16}  {:>9}", "Band (Hz)", "Level");
        for band in &readout.bands {
            println!(
                "  {:>7.0}-{:<8.0}  {:>6.1} dB",
                band.low_hz, band.high_hz, band.level_db
            );
        }
    }
}
