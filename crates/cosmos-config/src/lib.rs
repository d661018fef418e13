//! Configuration system for Cosmos.
//!
//! Settings persist to disk as a RON file, are validated once after loading,
//! and can be overridden from the command line via clap.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CameraConfig, CameraType, Config, ControlsConfig, DebugConfig, GalaxyConfig, PlanetConfig,
    StarsConfig, WindowConfig,
};
pub use error::ConfigError;
