#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a headless tower defence session.

mod placement;
mod simulation;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tower_defence_core::{Catalog, DifficultyLevel, Event};
use tower_defence_engine::{Lobby, Session};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    placement::TowerPlacement,
    simulation::{RunLimits, RunReport},
};

/// Runs a tower defence session without a display and reports the outcome.
#[derive(Debug, Parser)]
#[command(name = "tower-defence", version, about)]
struct CliArgs {
    /// Menu index of the map to play.
    #[arg(long, default_value_t = 0)]
    map: usize,

    /// Difficulty preset: fun, easy, normal or hard.
    #[arg(long, default_value = "normal")]
    difficulty: DifficultyLevel,

    /// Tower to build before the first wave, as kind@column,row. Repeatable.
    #[arg(long = "tower", value_name = "KIND@COLUMN,ROW")]
    towers: Vec<TowerPlacement>,

    /// Waves to play.
    #[arg(long, default_value_t = 1)]
    waves: u32,

    /// Simulated milliseconds between frames.
    #[arg(long, default_value_t = 16.0)]
    frame_ms: f64,

    /// Frames to simulate before giving up.
    #[arg(long, default_value_t = 200_000)]
    max_frames: u64,

    /// TOML catalog replacing the built-in maps and stat tables.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Seed for shot pitch hints.
    #[arg(long)]
    seed: Option<u64>,

    /// Print the final report as JSON instead of a summary.
    #[arg(long)]
    json: bool,

    /// Log rejected commands and other debug detail.
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    if !(args.frame_ms > 0.0 && args.frame_ms.is_finite()) {
        bail!("--frame-ms must be a positive number, got {}", args.frame_ms);
    }

    let catalog = match args.catalog.as_deref() {
        Some(path) => load_catalog(path)?,
        None => Catalog::builtin(),
    };
    let mut lobby = Lobby::new(catalog).context("catalog failed validation")?;
    let maps = lobby.catalog().maps.len();
    if args.map >= maps {
        bail!("map index {} is out of range, the catalog has {maps} maps", args.map);
    }
    if let Some(seed) = args.seed {
        lobby = lobby.with_seed(seed);
    }
    lobby.select_difficulty(args.difficulty);
    lobby.select_map(args.map);
    info!(
        map = %lobby.map().name,
        difficulty = args.difficulty.name(),
        "starting session"
    );

    let mut session = lobby.start();
    build_towers(&mut session, &args.towers);

    let report = simulation::run(
        &mut session,
        RunLimits {
            waves: args.waves,
            frame_ms: args.frame_ms,
            max_frames: args.max_frames,
        },
    );

    if args.json {
        let json =
            serde_json::to_string_pretty(&report).context("failed to serialize run report")?;
        println!("{json}");
    } else {
        print_summary(&lobby, args.difficulty, &report);
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_catalog(path: &Path) -> Result<Catalog> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog {}", path.display()))?;
    Catalog::from_toml_str(&contents)
        .with_context(|| format!("failed to load catalog {}", path.display()))
}

fn build_towers(session: &mut Session, towers: &[TowerPlacement]) {
    for placement in towers {
        session.select_tower_type(placement.kind);
        session.place_tower(placement.cell);
    }

    for event in session.drain_events() {
        if let Event::TowerPlacementRejected { kind, cell, reason } = event {
            warn!(kind = kind.name(), %cell, ?reason, "tower was not built");
        }
    }
    let _ = session.drain_audio_cues();
}

fn print_summary(lobby: &Lobby, difficulty: DifficultyLevel, report: &RunReport) {
    let hud = report.snapshot.hud;
    println!("map:           {} ({})", lobby.map().name, difficulty.name());
    println!("frames:        {}", report.frames);
    println!("waves cleared: {}", report.waves_cleared);
    println!("towers:        {}", report.snapshot.towers.len());
    println!("kills:         {}", report.kills);
    println!("escapes:       {}", report.escapes);
    println!("shots:         {}", report.shots);
    println!("cash:          {}", hud.cash);
    println!("lives:         {}", hud.lives);
    if hud.defeated {
        println!("result:        defeated on wave {}", hud.wave);
    }
}
