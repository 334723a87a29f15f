//! Headless runner: loads device data, builds a demo scene and ticks it.

mod report;
mod scene;

use clap::Parser;
use devicecraft_data::load_device_data;
use report::RunReport;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Run fishers and collectors without a game attached
#[derive(Parser, Debug)]
#[command(name = "devicecraft-headless", version, about)]
struct Args {
    /// Directory holding config, items, augments, loot_tables and device_types
    #[arg(long, default_value = concat!(env!("CARGO_MANIFEST_DIR"), "/data"))]
    data: PathBuf,

    /// Ticks to simulate (20 per second)
    #[arg(long, default_value_t = 12_000)]
    ticks: u64,

    /// Override the seed from the config file
    #[arg(long)]
    seed: Option<u64>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// Ticks between event drains; keeps the ring buffer from overflowing.
const DRAIN_INTERVAL: u64 = 200;

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut data = load_device_data(&args.data)?;
    if let Some(seed) = args.seed {
        data.config.seed = seed;
    }
    let mut engine = data.into_engine();
    let scene = scene::build(&mut engine)?;
    tracing::debug!(
        lake_fisher = ?scene.lake_fisher,
        dry_fisher = ?scene.dry_fisher,
        collector = ?scene.collector,
        "scene devices"
    );

    let mut report = RunReport::default();
    let mut remaining = args.ticks;
    while remaining > 0 {
        let chunk = remaining.min(DRAIN_INTERVAL);
        report.record_steps(engine.run(chunk));
        report.record_events(&engine.drain_events());
        remaining -= chunk;
    }
    report.finish(&engine);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print_text();
    }
    Ok(())
}
