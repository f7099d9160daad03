#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Pattern Recall experience.

mod simulation;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use pattern_recall_core::GAME_TITLE;
use pattern_recall_rendering::{Palette, Presentation, RenderingBackend};
use pattern_recall_rendering_macroquad::{AssetManifest, MacroquadBackend};
use tracing_subscriber::EnvFilter;

use crate::simulation::Simulation;

/// Memory game in which a pattern of cells is flashed and must be picked back.
#[derive(Debug, Parser)]
#[command(name = "pattern-recall", version, about)]
struct Args {
    /// Seed for pattern generation; random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Asset manifest naming optional images and the viewport.
    #[arg(long, value_name = "PATH")]
    assets: Option<PathBuf>,

    /// Initial window width in pixels.
    #[arg(long, default_value_t = 900)]
    width: u32,

    /// Initial window height in pixels.
    #[arg(long, default_value_t = 700)]
    height: u32,

    /// Synchronise presentation with the display refresh rate.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    vsync: bool,

    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

/// Entry point for the Pattern Recall command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.verbose)?;

    let seed = args.seed.unwrap_or_else(rand::random);
    log::info!("starting session with seed {seed}");

    let assets = load_assets(args.assets.as_deref())?;
    let mut simulation = Simulation::new(seed);
    let scene = simulation
        .scene()
        .context("failed to build the initial scene")?;
    let presentation = Presentation::new(GAME_TITLE, Palette::default(), assets.viewport(), scene);

    MacroquadBackend::new()
        .with_vsync(args.vsync)
        .with_window_size(args.width, args.height)
        .with_assets(assets)
        .run(presentation, move |dt, input, scene| {
            simulation.frame(dt, input, scene);
        })
}

fn init_logging(verbose: &Verbosity<InfoLevel>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbose.log_level_filter().to_string().to_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow!(error))
}

fn load_assets(path: Option<&Path>) -> Result<AssetManifest> {
    if let Some(path) = path {
        return AssetManifest::load(path);
    }

    let default = AssetManifest::default_path();
    if default.exists() {
        AssetManifest::load(&default)
    } else {
        log::debug!(
            "no asset manifest at {}, drawing without images",
            default.display()
        );
        Ok(AssetManifest::default())
    }
}
