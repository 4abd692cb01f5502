//! # Lair Sim
//!
//! Runs a headless simulation of hostile creatures guarding their spawn
//! areas against a scripted intruder, then prints a summary.
//!
//! Usage: `lair-sim [config.toml]` (defaults to `lair.toml`).

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use anyhow::{Context, Result};
use lair_sim::config::CONFIG_FILE;
use lair_sim::{SimConfig, World};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("lair=info".parse()?))
        .init();

    info!("Lair simulation starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| CONFIG_FILE.to_string());
    let config = SimConfig::load_from(&path)
        .with_context(|| format!("failed to load simulation config from {path}"))?;

    info!("Configuration loaded:");
    info!("  Seed: {:#x}", config.seed);
    info!("  Frames: {} at {:.4}s", config.frames, config.frame_dt);
    info!("  Fixed step: {:.4}s", config.fixed_dt);
    info!("  Territories: {}", config.territories.len());

    let mut world = World::new(config).context("failed to build world")?;
    let summary = world.run();

    println!("{}", serde_json::to_string_pretty(&summary)?);
    info!("Lair simulation complete");
    Ok(())
}
