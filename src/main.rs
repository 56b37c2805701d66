mod config;
mod core;
mod error;
mod headless;
mod render;
mod types;
mod ui;

use std::{io, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use crate::{config::SimConfig, core::Simulation};

/// Bouncing point masses under constant gravity in a wrap-around arena.
#[derive(Parser, Debug)]
struct Args {
    /// YAML file overriding the reference configuration.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run this many steps without the terminal UI and print the final bodies.
    #[arg(long, value_name = "STEPS")]
    headless: Option<u64>,

    /// Step size in seconds for headless runs.
    #[arg(long, default_value_t = config::DT)]
    dt: f32,
}

fn load_config(path: Option<&PathBuf>) -> Result<SimConfig> {
    match path {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(SimConfig::default()),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;
    let mut sim = Simulation::new(config);

    match args.headless {
        Some(steps) => headless::run(&mut sim, steps, args.dt, &mut io::stdout().lock()),
        None => ui::run(sim),
    }
}
