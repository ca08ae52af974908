//! Folio CLI
//!
//! Run the compositor headless and inspect what it draws.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use folio_app::{logging, FolioConfig, Simulation, Step};
use folio_core::geometry::{Point, Size};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "folio")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Scroll-synchronised canvas compositor", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./folio.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the demo page, replay input and print the scene graph as JSON
    Simulate {
        /// Frames to run after the input
        #[arg(short, long, default_value = "120")]
        frames: u32,

        /// Wheel delta in pixels
        #[arg(short, long)]
        scroll: Option<f32>,

        /// Pointer position as `x,y`
        #[arg(short, long, value_parser = parse_point)]
        pointer: Option<Point>,

        /// Scroll to a named section (intro, work, contact)
        #[arg(long)]
        section: Option<String>,

        /// Resize the viewport to `width,height` before running
        #[arg(long, value_parser = parse_size)]
        resize: Option<Size>,

        /// Print the report without the scene graph
        #[arg(long)]
        stats_only: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    logging::init(config.log_filter(), cli.verbose);

    match cli.command {
        Commands::Simulate {
            frames,
            scroll,
            pointer,
            section,
            resize,
            stats_only,
        } => {
            let mut script = vec![Step::Frames(1)];
            script.extend(resize.map(Step::Resize));
            script.extend(pointer.map(Step::Pointer));
            script.extend(scroll.map(Step::Scroll));
            script.extend(section.map(Step::Section));
            script.push(Step::Frames(frames));
            cmd_simulate(&config, &script, stats_only)
        }
        Commands::Config => cmd_config(&config),
    }
}

fn load_config(path: Option<&Path>) -> Result<FolioConfig> {
    match path {
        Some(path) => FolioConfig::load(path),
        None => FolioConfig::load_from_dir(Path::new(".")),
    }
}

fn cmd_simulate(config: &FolioConfig, script: &[Step], stats_only: bool) -> Result<()> {
    let mut simulation = Simulation::new(config)?;
    let report = simulation.run(script);
    info!(
        "ran {} frames, scroll at {}, {} containers ready",
        report.frames, report.scroll.y, report.ready_containers
    );

    let mut json = serde_json::to_value(&report).context("Failed to serialize report")?;
    if stats_only {
        if let Some(report) = json.as_object_mut() {
            report.remove("scene");
        }
    }
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn cmd_config(config: &FolioConfig) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}

fn parse_pair(value: &str) -> Result<(f32, f32), String> {
    let (a, b) = value
        .split_once(',')
        .ok_or_else(|| format!("expected two comma-separated numbers, got '{}'", value))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<f32>()
            .map_err(|err| format!("invalid number '{}': {}", part, err))
    };
    Ok((parse(a)?, parse(b)?))
}

fn parse_point(value: &str) -> Result<Point, String> {
    parse_pair(value).map(|(x, y)| Point::new(x, y))
}

fn parse_size(value: &str) -> Result<Size, String> {
    parse_pair(value).map(|(width, height)| Size::new(width, height))
}
