//! The `cosmos` binary: load config, apply CLI overrides, open the window.

use clap::Parser;
use cosmos_app::platform::PlatformDirs;
use cosmos_config::{CliArgs, Config};

fn main() {
    let args = CliArgs::parse();

    let dirs = match PlatformDirs::resolve() {
        Ok(dirs) => dirs,
        Err(e) => {
            eprintln!("Failed to resolve platform directories: {e}");
            std::process::exit(1);
        }
    };
    let dirs = match args.config.clone() {
        Some(config_dir) => dirs.with_config_dir(config_dir),
        None => dirs,
    };
    if let Err(e) = dirs.create_dirs() {
        eprintln!("Failed to create {}: {e}", dirs.config_dir.display());
        std::process::exit(1);
    }

    let mut config = match Config::load_or_create(&dirs.config_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration, using defaults: {e}");
            Config::default()
        }
    };
    config.apply_cli_overrides(&args);

    cosmos_log::init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config));

    if let Err(e) = config.validate() {
        tracing::error!("Configuration rejected: {e}");
        std::process::exit(2);
    }
    tracing::info!("Config dir: {}", dirs.config_dir.display());

    if let Err(e) = cosmos_app::run(config) {
        tracing::error!("Event loop failed: {e}");
        std::process::exit(1);
    }
}
