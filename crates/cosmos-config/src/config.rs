//! Configuration structs with defaults, validation, and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name of the persisted configuration inside the config directory.
const CONFIG_FILE: &str = "config.ron";

/// Top-level scene configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window settings.
    pub window: WindowConfig,
    /// Camera projection settings.
    pub camera: CameraConfig,
    /// Orbit controller settings.
    pub controls: ControlsConfig,
    /// Background starfield settings.
    pub stars: StarsConfig,
    /// Optional multi-coloured galaxy point cloud.
    pub galaxy: GalaxyConfig,
    /// Optional planet mesh.
    pub planet: PlanetConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
    /// Seed for procedural generation. `None` draws a fresh seed per run.
    pub seed: Option<u64>,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
    /// Window title.
    pub title: String,
}

/// Projection kind used by the scene camera.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum CameraType {
    /// Perspective projection driven by `fov`.
    #[default]
    Perspective,
    /// Orthographic projection with bounds derived from the viewport size.
    Orthographic,
}

/// Camera configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Projection kind.
    pub camera_type: CameraType,
    /// Vertical field of view in degrees (perspective only).
    pub fov: f32,
    /// Near clip plane distance.
    pub near: f32,
    /// Far clip plane distance.
    pub far: f32,
    /// Initial camera position.
    pub position: [f32; 3],
    /// Point the camera initially looks at; also the orbit target.
    pub look_at: [f32; 3],
}

/// Orbit controller configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControlsConfig {
    /// Closest the camera may get to the orbit target.
    pub min_zoom_distance: f64,
    /// Farthest the camera may get from the orbit target.
    pub max_zoom_distance: f64,
    /// Allow right-drag panning.
    pub enable_pan: bool,
    /// Allow wheel/pinch zooming.
    pub enable_zoom: bool,
    /// Allow left-drag orbiting.
    pub enable_rotate: bool,
    /// Keep rotating after release, decaying by `damping_factor` each frame.
    pub enable_damping: bool,
    /// Fraction of the remaining motion applied per frame when damping.
    pub damping_factor: f32,
    /// Orbit speed multiplier.
    pub rotate_speed: f32,
    /// Zoom speed multiplier.
    pub zoom_speed: f32,
    /// Pan speed multiplier.
    pub pan_speed: f32,
}

/// Starfield configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StarsConfig {
    /// Number of stars.
    pub count: u32,
    /// Point size in world units.
    pub size: f32,
    /// Edge length of the cube the stars are scattered in.
    pub spread: f32,
    /// Star colour as `0xRRGGBB`.
    pub color: u32,
    /// Star opacity in `[0, 1]`.
    pub opacity: f32,
    /// Give every star its own random tint with one emphasised channel.
    pub tint_vertices: bool,
}

/// Galaxy point-cloud configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GalaxyConfig {
    /// Add the galaxy to the scene.
    pub enabled: bool,
    /// Number of points.
    pub count: u32,
    /// Base point size; the generated size lands in `[size * 0.5, size * 2]`.
    pub size: f32,
    /// Edge length of the cube the points are scattered in.
    pub spread: f32,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
    /// Candidate sprite textures; one is picked at random.
    pub texture_paths: Vec<PathBuf>,
}

/// Planet mesh configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlanetConfig {
    /// Add the planet to the scene.
    pub enabled: bool,
    /// Sphere radius.
    pub radius: f32,
    /// Colour as `0xRRGGBB`.
    pub color: u32,
    /// Width and height segment count.
    pub segments: u32,
    /// Planet centre.
    pub position: [f32; 3],
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            vsync: true,
            title: "Cosmos".to_string(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            camera_type: CameraType::Perspective,
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
            position: [0.0, 0.0, 5.0],
            look_at: [0.0, 0.0, 0.0],
        }
    }
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            min_zoom_distance: 10.0,
            max_zoom_distance: 500_000_000.0,
            enable_pan: false,
            enable_zoom: true,
            enable_rotate: true,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
        }
    }
}

impl Default for StarsConfig {
    fn default() -> Self {
        Self {
            count: 10_000,
            size: 0.1,
            spread: 2000.0,
            color: 0xffffff,
            opacity: 0.8,
            tint_vertices: true,
        }
    }
}

impl Default for GalaxyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            count: 10_000,
            size: 0.1,
            spread: 2000.0,
            opacity: 0.8,
            texture_paths: Vec::new(),
        }
    }
}

impl Default for PlanetConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            radius: 100.0,
            color: 0x00ff00,
            segments: 32,
            position: [0.0, 0.0, 0.0],
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

// --- Validation ---

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn check_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be finite and > 0, got {value}")))
    }
}

fn check_non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be finite and >= 0, got {value}")))
    }
}

fn check_unit(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, format!("must lie in [0, 1], got {value}")))
    }
}

impl Config {
    /// Check every range constraint. Values are never clamped silently; the
    /// first violation is reported.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(invalid(
                "window",
                format!(
                    "size must be non-zero, got {}x{}",
                    self.window.width, self.window.height
                ),
            ));
        }

        let camera = &self.camera;
        if camera.camera_type == CameraType::Perspective
            && !(camera.fov > 0.0 && camera.fov < 180.0)
        {
            return Err(invalid(
                "camera.fov",
                format!("must lie in (0, 180), got {}", camera.fov),
            ));
        }
        check_positive("camera.near", camera.near)?;
        if !(camera.far.is_finite() && camera.far > camera.near) {
            return Err(invalid(
                "camera.far",
                format!("must exceed near ({}), got {}", camera.near, camera.far),
            ));
        }

        let controls = &self.controls;
        if !(controls.min_zoom_distance.is_finite() && controls.min_zoom_distance >= 0.0) {
            return Err(invalid(
                "controls.min_zoom_distance",
                format!("must be finite and >= 0, got {}", controls.min_zoom_distance),
            ));
        }
        if !(controls.max_zoom_distance >= controls.min_zoom_distance) {
            return Err(invalid(
                "controls.max_zoom_distance",
                format!(
                    "must be >= min_zoom_distance ({}), got {}",
                    controls.min_zoom_distance, controls.max_zoom_distance
                ),
            ));
        }
        if !(controls.damping_factor > 0.0 && controls.damping_factor <= 1.0) {
            return Err(invalid(
                "controls.damping_factor",
                format!("must lie in (0, 1], got {}", controls.damping_factor),
            ));
        }
        check_non_negative("controls.rotate_speed", controls.rotate_speed)?;
        check_non_negative("controls.zoom_speed", controls.zoom_speed)?;
        check_non_negative("controls.pan_speed", controls.pan_speed)?;

        check_positive("stars.size", self.stars.size)?;
        check_non_negative("stars.spread", self.stars.spread)?;
        check_unit("stars.opacity", self.stars.opacity)?;

        check_positive("galaxy.size", self.galaxy.size)?;
        check_non_negative("galaxy.spread", self.galaxy.spread)?;
        check_unit("galaxy.opacity", self.galaxy.opacity)?;

        check_positive("planet.radius", self.planet.radius)?;
        if self.planet.segments < 3 {
            return Err(invalid(
                "planet.segments",
                format!("must be >= 3, got {}", self.planet.segments),
            ));
        }

        Ok(())
    }
}

// --- Load / Save ---

impl Config {
    /// Load and validate config from the given directory, or create a default
    /// config file when none exists.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            config.validate()?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_defaults_match_starfield_scene() {
        let config = Config::default();
        assert_eq!(config.stars.count, 10_000);
        assert_eq!(config.stars.color, 0xffffff);
        assert!((config.stars.spread - 2000.0).abs() < f32::EPSILON);
        assert!((config.controls.min_zoom_distance - 10.0).abs() < f64::EPSILON);
        assert!((config.controls.max_zoom_distance - 500_000_000.0).abs() < f64::EPSILON);
        assert!(!config.controls.enable_pan);
        assert!(config.controls.enable_zoom);
        assert_eq!(config.camera.camera_type, CameraType::Perspective);
        assert_eq!(config.camera.position, [0.0, 0.0, 5.0]);
    }

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("width: 1280"));
        assert!(ron_str.contains("count: 10000"));
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(window: (), stars: (count: 5))";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.stars.count, 5);
        assert_eq!(config.planet, PlanetConfig::default());
        assert_eq!(config.controls, ControlsConfig::default());
    }

    #[test]
    fn test_min_zoom_above_max_is_rejected() {
        let mut config = Config::default();
        config.controls.min_zoom_distance = 100.0;
        config.controls.max_zoom_distance = 50.0;
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => {
                assert_eq!(field, "controls.max_zoom_distance")
            }
            other => panic!("expected invalid max zoom, got {other:?}"),
        }
    }

    #[test]
    fn test_equal_zoom_bounds_are_accepted() {
        let mut config = Config::default();
        config.controls.min_zoom_distance = 42.0;
        config.controls.max_zoom_distance = 42.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_far_must_exceed_near() {
        let mut config = Config::default();
        config.camera.near = 10.0;
        config.camera.far = 5.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "camera.far",
                ..
            })
        ));
    }

    #[test]
    fn test_non_finite_control_speed_is_rejected() {
        let mut config = Config::default();
        config.controls.rotate_speed = f32::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "controls.rotate_speed", .. })
        ));

        let mut config = Config::default();
        config.controls.zoom_speed = f32::INFINITY;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "controls.zoom_speed", .. })
        ));

        let mut config = Config::default();
        config.controls.pan_speed = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "controls.pan_speed", .. })
        ));
    }

    #[test]
    fn test_opacity_out_of_range_is_rejected() {
        let mut config = Config::default();
        config.stars.opacity = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "stars.opacity",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_star_count_is_valid() {
        let mut config = Config::default();
        config.stars.count = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_orthographic_ignores_fov() {
        let mut config = Config::default();
        config.camera.camera_type = CameraType::Orthographic;
        config.camera.fov = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.window.width = 1920;
        config.galaxy.enabled = true;
        config.galaxy.texture_paths = vec![PathBuf::from("assets/star.png")];
        config.seed = Some(7);

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join(CONFIG_FILE).exists());
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "(controls: (min_zoom_distance: 10.0, max_zoom_distance: 1.0))",
        )
        .unwrap();
        assert!(matches!(
            Config::load_or_create(dir.path()),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let result: Result<Config, _> = ron::from_str("{{not valid}}");
        assert!(result.is_err());
    }
}
