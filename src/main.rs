//! pointerkit - multi-pointer ray interaction and virtual touch surfaces
//!
//! Headless driver: runs a scripted scenario and writes a JSONL trace of
//! every pointer event and synthesized surface input.

mod config;
mod driver;
mod scenario;

use anyhow::{Context, Result};
use clap::Parser;
use config::{PointerkitConfig, DEFAULT_CONFIG_PATH};
use driver::ScenarioDriver;
use pointerkit_testkit::JsonlSink;
use scenario::ScenarioPlayer;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run a pointerkit interaction scenario headlessly", long_about = None)]
struct Args {
    /// TOML configuration (missing or invalid files fall back to defaults)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// JSON scenario of `{tick, action}` steps
    #[arg(long)]
    scenario: PathBuf,
    /// Write pointer events and surface input as newline-delimited JSON
    #[arg(long)]
    trace: Option<PathBuf>,
    /// Run exactly this many ticks instead of stopping after the last step
    #[arg(long)]
    ticks: Option<u64>,
    /// Frames per second fed to the fixed timestep (defaults to the tick rate)
    #[arg(long)]
    frame_rate: Option<f32>,
    /// Save the effective configuration (defaults and fixes applied) to this path
    #[arg(long)]
    write_config: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize tracing with WARN level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    info!("Starting pointerkit v{}", env!("CARGO_PKG_VERSION"));

    let config = PointerkitConfig::load_from_path(&args.config);
    if let Some(path) = &args.write_config {
        config
            .save_to_path(path)
            .with_context(|| format!("failed to write config {}", path.display()))?;
    }
    let script = ScenarioPlayer::from_path(&args.scenario)?;
    let trace = args
        .trace
        .as_ref()
        .map(JsonlSink::create)
        .transpose()
        .context("failed to open trace")?;

    let mut driver = ScenarioDriver::new(config, trace)?;
    if let Some(rate) = args.frame_rate {
        driver = driver.with_frame_rate(rate)?;
    }
    let summary = driver.run(script, args.ticks)?;
    println!(
        "ran {} ticks in {} frames ({:.3}s simulated): {} pointer events, {} surface inputs, {} skipped actions",
        summary.ticks,
        summary.frames,
        summary.simulated_seconds,
        summary.pointer_events,
        summary.surface_inputs,
        summary.skipped_actions
    );
    Ok(())
}
