//! Cinemap CLI
//!
//! Headless host for the cinematic camera engine and the viewer sync layer:
//! - `init` scaffolds a project with a `cinemap.toml`
//! - `tour` plays the full cinematic sequence on a simulated map surface
//! - `sync-demo` runs a receiver and several controllers on an in-process bus

mod config;
mod project;
mod surface;
mod sync_demo;
mod tour;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::CinemapConfig;
use crate::sync_demo::{SyncDemoOptions, SyncDemoReport};
use crate::tour::{TourOptions, TourReport};

#[derive(Parser, Debug)]
#[command(name = "cinemap")]
#[command(about = "Cinematic map camera and viewer sync, headless")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new project
    Init {
        /// Project directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Project name (defaults to the directory name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Play the cinematic tour over the project's landmarks
    Tour {
        /// Project directory or cinemap.toml
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Simulated frames per second
        #[arg(long, default_value_t = 60)]
        fps: u32,

        /// Pace frames with the wall clock
        #[arg(long)]
        realtime: bool,

        /// Idle breathing after the last shot, milliseconds
        #[arg(long, default_value_t = 3000)]
        breathing_ms: u64,
    },

    /// Run a receiver and controllers against each other
    SyncDemo {
        /// Project directory or cinemap.toml
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Number of controller peers
        #[arg(short, long, default_value_t = 2)]
        controllers: usize,

        /// Simulated run time, milliseconds
        #[arg(long, default_value_t = 30_000)]
        duration_ms: u64,

        /// Simulated time per step, milliseconds
        #[arg(long, default_value_t = 100)]
        step_ms: u64,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Commands::Init { path, name } => {
            let name = match name {
                Some(name) => name,
                None => project_name(&path)?,
            };
            project::create_project(&path, &name)
        }
        Commands::Tour {
            path,
            fps,
            realtime,
            breathing_ms,
        } => {
            let config = CinemapConfig::load_from_dir(&path)?;
            tracing::info!("Touring {}", config.project.name);
            let options = TourOptions {
                fps,
                realtime,
                breathing_ms,
            };
            let report = tour::run_tour(&config, &options).await?;
            print_tour(&report);
            Ok(())
        }
        Commands::SyncDemo {
            path,
            controllers,
            duration_ms,
            step_ms,
        } => {
            let config = CinemapConfig::load_from_dir(&path)?;
            let options = SyncDemoOptions {
                controllers,
                duration_ms,
                step_ms,
            };
            let report = sync_demo::run_sync_demo(&config, &options)?;
            print_sync(&report);
            Ok(())
        }
    }
}

fn project_name(path: &std::path::Path) -> Result<String> {
    let absolute = std::env::current_dir()?.join(path);
    absolute
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Cannot infer a project name from {}", path.display()))
}

fn print_tour(report: &TourReport) {
    println!("{:<36} {:<10} {:>7} {:>9} {:>10}", "shot", "outcome", "frames", "seconds", "meters");
    for shot in &report.shots {
        println!(
            "{:<36} {:<10} {:>7} {:>9.1} {:>10.0}",
            shot.label,
            format!("{:?}", shot.outcome),
            shot.frames,
            shot.duration_ms / 1000.0,
            shot.distance_m
        );
    }
    let camera = report.final_camera;
    println!();
    println!(
        "{} frames, {} camera writes, {:.1} km travelled",
        report.frames,
        report.applied,
        report.distance_m() / 1000.0
    );
    println!(
        "final camera: {:.5},{:.5} zoom {:.2} pitch {:.1} bearing {:.1}",
        camera.center.lng, camera.center.lat, camera.zoom, camera.pitch, camera.bearing
    );
}

fn print_sync(report: &SyncDemoReport) {
    for peer in &report.peers {
        let aspect = peer
            .aspect_ratio
            .map_or_else(|| "-".to_string(), |ratio| format!("{ratio:.3}"));
        println!("{} ({:?}) aspect {}", peer.label, peer.role, aspect);
        println!(
            "  sent {} queued {} skipped {} received {} applied {}",
            peer.stats.sent, peer.stats.queued, peer.stats.skipped, peer.stats.received, peer.stats.applied
        );
        println!("  held back: {}", peer.breakdown(cinemap_sync::SyncStats::suppressed));
        println!("  dropped:   {}", peer.breakdown(cinemap_sync::SyncStats::dropped));
    }
    let camera = report.receiver_camera;
    println!(
        "receiver camera: {:.5},{:.5} zoom {:.2}",
        camera.center.lng, camera.center.lat, camera.zoom
    );
}
