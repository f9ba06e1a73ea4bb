// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use facemark::config::Config;
use facemark::state::DisplayMode;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "facemark")]
#[command(about = "Real-time facial landmark overlay for live webcam feeds")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Camera index to use (from 'facemark list')
    #[arg(short, long)]
    camera: Option<usize>,

    /// Inference service endpoint (host:port)
    #[arg(long)]
    engine: Option<String>,

    /// Model asset path passed to the inference service
    #[arg(long)]
    model: Option<String>,

    /// Connector topology file shipped with the model data
    #[arg(long)]
    topology: Option<PathBuf>,

    /// Initial overlay mode
    #[arg(long, value_parser = ["landmark", "contour", "mesh"])]
    mode: Option<String>,

    /// Start with the mirror (selfie view) disabled
    #[arg(long)]
    no_mirror: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Track faces headless, printing per-second stats
    Track {
        /// Stop after this many seconds (default: run until Ctrl+C)
        #[arg(short, long)]
        duration: Option<u64>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=facemark=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load();
    if let Some(camera) = cli.camera {
        config.camera_index = camera;
    }
    if let Some(engine) = cli.engine {
        config.engine.endpoint = engine;
    }
    if let Some(model) = cli.model {
        config.engine.model_asset_path = model;
    }
    if let Some(topology) = cli.topology {
        config.engine.topology_path = Some(topology);
    }
    if let Some(mode) = cli.mode.as_deref() {
        config.mode = match mode {
            "contour" => DisplayMode::Contour,
            "mesh" => DisplayMode::Mesh,
            _ => DisplayMode::Landmark,
        };
    }
    if cli.no_mirror {
        config.mirror_preview = false;
    }

    match cli.command {
        Some(Commands::List) => cli::list_cameras(),
        Some(Commands::Track { duration }) => cli::track(config, duration),
        None => facemark::terminal::run(config),
    }
}
