//! Cosmos desktop application: a winit window hosting one mounted scene.

pub mod content;
pub mod platform;
pub mod window;

pub use window::{AppState, MountError, run, run_with_update};
