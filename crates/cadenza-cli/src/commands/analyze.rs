//! Meter readout of a WAV file.

use std::path::PathBuf;

use anyhow::bail;
use cadenza_analysis::{MeterBank, MeterSettings, Window};
use clap::Args;

use super::print_readout;
use crate::wav::read_wav;

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// FFT size, rounded up to a power of two
    #[arg(long, default_value = "4096")]
    fft_size: usize,

    /// Window function (rectangular, hann, hamming, blackman)
    #[arg(long, default_value = "hann")]
    window: String,

    /// Number of logarithmic frequency bands
    #[arg(long, default_value = "10")]
    bands: usize,

    /// Print the readout as JSON instead of a table
    #[arg(long)]
    json: bool,
}

pub fn run(args: AnalyzeArgs) -> anyhow::Result<()> {
    let (audio, info) = read_wav(&args.input)?;

    let settings = MeterSettings {
        fft_size: args.fft_size,
        window: parse_window(&args.window)?,
        band_count: args.bands,
        // Whole-file view: average frames instead of following the latest.
        spectrum_smoothing: 0.95,
        ..MeterSettings::default()
    }
    .clamped();

    let mut meters = MeterBank::with_settings(info.sample_rate as f32, &settings);
    meters.process(&audio);
    let readout = meters.readout();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&readout)?);
        return Ok(());
    }

    println!("File: {}", args.input.display());
    println!(
        "  {} ch, {} Hz, {} bit, {:.2} s",
        info.channels,
        info.sample_rate,
        info.bits_per_sample,
        audio.len() as f32 / info.sample_rate as f32
    );
    println!();
    print_readout("Levels", &readout, true);
    if meters.spectrum.frames_analyzed() > 0 {
        println!();
        println!("  Peak frequency: {:.1} Hz", meters.spectrum.peak_frequency());
    }

    Ok(())
}

fn parse_window(name: &str) -> anyhow::Result<Window> {
    Ok(match name.to_ascii_lowercase().as_str() {
        "rectangular" | "rect" | "none" => Window::Rectangular,
        "hann" | "hanning" => Window::Hann,
        "hamming" => Window::Hamming,
        "blackman" => Window::Blackman,
        other => bail!("unknown window '{other}'"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_window() {
        assert_eq!(parse_window("Blackman").unwrap(), Window::Blackman);
        assert_eq!(parse_window("hanning").unwrap(), Window::Hann);
        assert!(parse_window("kaiser").is_err());
    }
}
