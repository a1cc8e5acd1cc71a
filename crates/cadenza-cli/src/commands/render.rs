//! Offline render through the mixer.

use std::path::PathBuf;

use anyhow::Context;
use cadenza_analysis::MeterBank;
use cadenza_config::{MAIN_TRACK_ID, ProjectFile, SessionConfig};
use cadenza_core::AudioBuffer;
use cadenza_mixer::Router;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use super::print_readout;
use crate::wav::{read_wav, write_wav};

#[derive(Args)]
pub struct RenderArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Session TOML file (sample rate, block size, insert chain)
    #[arg(short, long, conflicts_with = "project")]
    session: Option<PathBuf>,

    /// Project JSON file with a saved mixer layout
    #[arg(short, long)]
    project: Option<PathBuf>,

    /// Track that receives the input
    #[arg(short, long, default_value = MAIN_TRACK_ID)]
    track: String,

    /// Seconds of silence to render after the input, for reverb and delay tails
    #[arg(long, default_value = "0")]
    tail: f32,

    /// Output bit depth (16, 24 or 32)
    #[arg(long, default_value = "32")]
    bit_depth: u16,

    /// Print the frequency band summary
    #[arg(long)]
    bands: bool,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    println!("Reading {}...", args.input.display());
    let (input, info) = read_wav(&args.input)?;

    let mut router = build_router(&args, info.sample_rate)?;
    let report = router.validate_routing();
    if !report.valid {
        anyhow::bail!("cannot render: {}", report.message);
    }
    if router.track(&args.track).is_none() {
        anyhow::bail!(
            "no track '{}' in the mix (available: {})",
            args.track,
            router.track_ids().join(", ")
        );
    }

    let sample_rate = router.sample_rate();
    let block_size = router.block_size();
    let tail = (args.tail.max(0.0) * sample_rate) as usize;
    let total = input.len() + tail;

    println!(
        "Rendering {} frames at {} Hz, block size {}",
        total, info.sample_rate, block_size
    );

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let mut in_meters = MeterBank::new(sample_rate);
    let mut out_meters = MeterBank::new(sample_rate);
    in_meters.process(&input);

    let mut left = Vec::with_capacity(total);
    let mut right = Vec::with_capacity(total);
    let mut block = if input.is_stereo() {
        AudioBuffer::stereo(block_size)
    } else {
        AudioBuffer::mono(block_size)
    };

    let mut pos = 0;
    while pos < total {
        let len = block_size.min(total - pos);
        fill_block(&mut block, &input, pos);
        router.set_input(&args.track, &block)?;
        router.process_block()?;

        let mix = router.output();
        out_meters.process(mix);
        for i in 0..len {
            let (l, r) = mix.frame(i);
            left.push(l);
            right.push(r);
        }
        pos += len;
        pb.set_position(pos as u64);
    }
    pb.finish_with_message("done");

    println!();
    print_readout("Input", &in_meters.readout(), false);
    println!();
    print_readout("Output", &out_meters.readout(), args.bands);

    println!("\nWriting {}...", args.output.display());
    write_wav(
        &args.output,
        &AudioBuffer::from_stereo(left, right),
        info.sample_rate,
        args.bit_depth,
    )?;
    println!("Done!");

    Ok(())
}

/// Builds the mix at the input file's sample rate.
fn build_router(args: &RenderArgs, sample_rate: u32) -> anyhow::Result<Router> {
    if let Some(path) = &args.project {
        let mut project = ProjectFile::load(path)
            .with_context(|| format!("failed to load project {}", path.display()))?;
        project.session.sample_rate = sample_rate;
        warn_issues(&mut project.session);
        println!("Project: {}", project.name);
        return Ok(project.restore_router()?);
    }

    let mut session = match &args.session {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("failed to load session {}", path.display()))?,
        None => SessionConfig::default(),
    };
    session.sample_rate = sample_rate;
    warn_issues(&mut session);
    if !session.inserts.is_empty() {
        let kinds: Vec<&str> = session.inserts.iter().map(|i| i.kind.as_str()).collect();
        println!("Inserts: {}", kinds.join(" -> "));
    }
    Ok(session.build_router()?)
}

fn warn_issues(session: &mut SessionConfig) {
    for issue in session.validate() {
        println!("Warning: {issue}");
    }
}

/// Copies the next block of `input` starting at `pos`, zero-padding past
/// the end.
fn fill_block(block: &mut AudioBuffer, input: &AudioBuffer, pos: usize) {
    let end = input.len().min(pos + block.len());
    let (left, right) = block.channels_mut();
    left.fill(0.0);
    if pos < end {
        left[..end - pos].copy_from_slice(&input.left()[pos..end]);
    }
    if let Some(right) = right {
        right.fill(0.0);
        if pos < end {
            if let Some(src) = input.right() {
                right[..end - pos].copy_from_slice(&src[pos..end]);
            }
        }
    }
}
