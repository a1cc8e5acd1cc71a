//! Effect listing and default parameter command.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use anyhow::anyhow;
use cadenza_core::Stateful;
use cadenza_effects::{create_effect, descriptor, descriptors};
use clap::Args;

/// Rate used to instantiate effects for their default state.
const LISTING_SAMPLE_RATE: f32 = 48000.0;

#[derive(Args)]
pub struct EffectsArgs {
    /// Show the default parameters of one effect kind
    #[arg(value_name = "KIND")]
    kind: Option<String>,
}

pub fn run(args: EffectsArgs) -> anyhow::Result<()> {
    if let Some(kind) = &args.kind {
        let effect = create_effect(kind, LISTING_SAMPLE_RATE)
            .ok_or_else(|| anyhow!("Unknown effect: {kind}"))?;
        let title = descriptor(effect.kind()).map_or(kind.as_str(), |d| d.name);

        println!("{title}");
        println!("{}", "=".repeat(title.len()));
        println!();
        println!("Kind:     {}", effect.kind());
        println!("Latency:  {} samples", effect.latency_samples());
        println!();
        println!("Default parameters:");
        println!("{}", serde_json::to_string_pretty(&effect.to_dict())?);
        println!();
        println!("Session insert:");
        println!();
        println!("  [[inserts]]");
        println!("  type = \"{kind}\"");
    } else {
        println!("Available Effects");
        println!("=================");
        println!();
        println!("  {:18}  {:20}  {}", "Kind", "Name", "Category");
        println!("  {:18}  {:20}  {}", "----", "----", "--------");

        for d in descriptors() {
            println!("  {:18}  {:20}  {}", d.kind, d.name, d.category.name());
        }

        println!();
        println!("Reverb presets: hall_reverb, plate_reverb, room_reverb");
        println!("Use 'cadenza effects <kind>' for default parameters.");
    }

    Ok(())
}
