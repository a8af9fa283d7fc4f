#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs headless Horde Defence sessions.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use horde_defence_core::WELCOME_BANNER;
use horde_defence_system_outcome::Outcome;

mod config;
mod session;

use config::SessionConfig;
use session::Session;

/// Runs a Horde Defence session headlessly and reports its outcome.
#[derive(Debug, Parser)]
#[command(name = "horde-defence", version)]
struct Args {
    /// Path to a JSON session config; the built-in demo session runs when
    /// omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for the deterministic spawn RNG.
    #[arg(long, default_value_t = 0x0c0f_f3e5)]
    seed: u64,
    /// Fixed simulation step in milliseconds.
    #[arg(long, default_value_t = 100)]
    step_ms: u64,
    /// Wall-clock cap on simulated time, in seconds.
    #[arg(long, default_value_t = 600)]
    max_seconds: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    anyhow::ensure!(args.step_ms > 0, "--step-ms must be at least 1");

    let config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::demo(),
    };

    println!("{WELCOME_BANNER}");
    let mut session = Session::new(config, args.seed);
    let report = session.run(
        Duration::from_millis(args.step_ms),
        Duration::from_secs(args.max_seconds),
    );

    println!(
        "waves started: {}, enemies spawned: {}, player level: {}, ticks: {}",
        report.waves_started, report.enemies_spawned, report.player_level, report.ticks
    );
    match report.outcome {
        Some(Outcome::Victory { stars }) => println!("victory! stars: {stars}"),
        Some(Outcome::Defeat) => println!("defeat."),
        None => println!("session hit the time cap without a decision."),
    }
    Ok(())
}
