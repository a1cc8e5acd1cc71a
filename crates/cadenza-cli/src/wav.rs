//! WAV file reading and writing via `hound`.

use std::path::Path;

use anyhow::{Context, bail};
use cadenza_core::AudioBuffer;
use hound::{SampleFormat, WavReader, WavWriter};

/// Format details of a loaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavInfo {
    /// Channels in the file.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
}

/// Reads a WAV file into a buffer.
///
/// Mono files stay mono. Files with more than two channels keep the first
/// two.
pub fn read_wav(path: &Path) -> anyhow::Result<(AudioBuffer, WavInfo)> {
    let reader =
        WavReader::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let spec = reader.spec();
    let info = WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
    };
    if spec.channels == 0 {
        bail!("{} has no channels", path.display());
    }

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .with_context(|| format!("failed to decode {}", path.display()))?,
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<_, _>>()
                .with_context(|| format!("failed to decode {}", path.display()))?
        }
    };

    let channels = usize::from(spec.channels);
    let buffer = if channels == 1 {
        AudioBuffer::from_mono(samples)
    } else {
        let (left, right) = samples
            .chunks_exact(channels)
            .map(|frame| (frame[0], frame[1]))
            .unzip();
        AudioBuffer::from_stereo(left, right)
    };

    tracing::debug!(
        path = %path.display(),
        channels = info.channels,
        sample_rate = info.sample_rate,
        frames = buffer.len(),
        "wav_read"
    );
    Ok((buffer, info))
}

/// Writes a buffer as a mono or stereo WAV file.
///
/// 32-bit output is IEEE float; 16 and 24 bit are clamped integer PCM.
pub fn write_wav(
    path: &Path,
    buffer: &AudioBuffer,
    sample_rate: u32,
    bits_per_sample: u16,
) -> anyhow::Result<()> {
    if !matches!(bits_per_sample, 16 | 24 | 32) {
        bail!("unsupported bit depth {bits_per_sample}, expected 16, 24 or 32");
    }
    let spec = hound::WavSpec {
        channels: buffer.channels() as u16,
        sample_rate,
        bits_per_sample,
        sample_format: if bits_per_sample == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };
    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("failed to create {}", path.display()))?;

    let max_val = (1i64 << (bits_per_sample - 1)) as f32;
    let mut write = |sample: f32| -> hound::Result<()> {
        if bits_per_sample == 32 {
            writer.write_sample(sample)
        } else {
            writer.write_sample((sample * max_val).clamp(-max_val, max_val - 1.0) as i32)
        }
    };
    for i in 0..buffer.len() {
        let (left, right) = buffer.frame(i);
        write(left)?;
        if buffer.is_stereo() {
            write(right)?;
        }
    }

    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_stereo_float_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("st.wav");
        let buffer = AudioBuffer::from_stereo(vec![0.5, -0.25, 0.0], vec![-0.5, 0.25, 1.0]);
        write_wav(&path, &buffer, 44100, 32).unwrap();

        let (read, info) = read_wav(&path).unwrap();
        assert_eq!(info.channels, 2);
        assert_eq!(info.sample_rate, 44100);
        assert_eq!(read.left(), buffer.left());
        assert_eq!(read.right(), buffer.right());
    }

    #[test]
    fn test_mono_16_bit_quantizes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mono.wav");
        write_wav(&path, &AudioBuffer::from_mono(vec![0.5, 2.0]), 48000, 16).unwrap();

        let (read, info) = read_wav(&path).unwrap();
        assert!(!read.is_stereo());
        assert_eq!(info.bits_per_sample, 16);
        assert!((read.left()[0] - 0.5).abs() < 1e-4);
        // Over-range samples clamp to the top code.
        assert!((read.left()[1] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_rejects_odd_bit_depth() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.wav");
        assert!(write_wav(&path, &AudioBuffer::mono(4), 48000, 12).is_err());
    }

    #[test]
    fn test_missing_file_errors() {
        let err = read_wav(Path::new("/nonexistent/in.wav")).unwrap_err();
        assert!(err.to_string().contains("failed to open"));
    }
}
