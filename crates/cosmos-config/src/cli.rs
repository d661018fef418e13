//! Command-line argument parsing for Cosmos.

use std::path::PathBuf;

use clap::Parser;

use crate::{CameraType, Config};

/// Cosmos command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "cosmos", about = "Interactive procedural starfield")]
pub struct CliArgs {
    /// Window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Number of background stars.
    #[arg(long)]
    pub star_count: Option<u32>,

    /// Camera projection.
    #[arg(long, value_enum)]
    pub camera: Option<CameraType>,

    /// Vertical field of view in degrees.
    #[arg(long)]
    pub fov: Option<f32>,

    /// Seed for procedural generation.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Add the galaxy point cloud.
    #[arg(long)]
    pub galaxy: Option<bool>,

    /// Add the planet mesh.
    #[arg(long)]
    pub planet: Option<bool>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(count) = args.star_count {
            self.stars.count = count;
        }
        if let Some(camera) = args.camera {
            self.camera.camera_type = camera;
        }
        if let Some(fov) = args.fov {
            self.camera.fov = fov;
        }
        if let Some(seed) = args.seed {
            self.seed = Some(seed);
        }
        if let Some(galaxy) = args.galaxy {
            self.galaxy.enabled = galaxy;
        }
        if let Some(planet) = args.planet {
            self.planet.enabled = planet;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
