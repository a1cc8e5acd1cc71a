//! Cadenza CLI - offline rendering and metering for the cadenza mixing core.

mod commands;
mod wav;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cadenza")]
#[command(author, version, about = "Cadenza mixing core CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a WAV file through a session or project mix
    Render(commands::render::RenderArgs),

    /// Print level, VU, correlation and spectrum readings of a WAV file
    Analyze(commands::analyze::AnalyzeArgs),

    /// List available effects and their default parameters
    Effects(commands::effects::EffectsArgs),
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays clean for readouts
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Analyze(args) => commands::analyze::run(args),
        Commands::Effects(args) => commands::effects::run(args),
    }
}
