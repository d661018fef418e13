//! Translate the loaded [`Config`] into scene inputs and populate the scene.

use std::path::PathBuf;
use std::sync::Arc;

use cosmos_bodies::{BodyKind, Color, ObjectSpec, Palette, generate};
use cosmos_config::{CameraType, Config};
use cosmos_scene::{
    CameraSpec, ControlSettings, InsertMode, NodeId, ProjectionKind, SceneError, SceneGraph,
    Viewport, ViewportSpec,
};
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

/// Assembly inputs for a `width` x `height` window.
pub fn viewport_spec(config: &Config, width: u32, height: u32) -> ViewportSpec {
    let camera = &config.camera;
    let controls = &config.controls;
    ViewportSpec {
        viewport: Viewport::new(width, height),
        camera: CameraSpec {
            kind: match camera.camera_type {
                CameraType::Perspective => ProjectionKind::Perspective,
                CameraType::Orthographic => ProjectionKind::Orthographic,
            },
            fov_degrees: camera.fov,
            near: camera.near,
            far: camera.far,
            position: Vec3::from_array(camera.position),
            look_at: Vec3::from_array(camera.look_at),
        },
        controls: ControlSettings {
            enable_rotate: controls.enable_rotate,
            enable_zoom: controls.enable_zoom,
            enable_pan: controls.enable_pan,
            enable_damping: controls.enable_damping,
            damping_factor: controls.damping_factor,
            min_distance: controls.min_zoom_distance as f32,
            max_distance: controls.max_zoom_distance as f32,
            rotate_speed: controls.rotate_speed,
            zoom_speed: controls.zoom_speed,
            pan_speed: controls.pan_speed,
        },
    }
}

pub fn star_spec(config: &Config) -> ObjectSpec {
    let stars = &config.stars;
    ObjectSpec {
        count: stars.count as usize,
        size: stars.size,
        spread: stars.spread,
        color: Color::from_hex(stars.color),
        opacity: stars.opacity,
        ..ObjectSpec::star()
    }
}

pub fn galaxy_spec(config: &Config) -> ObjectSpec {
    let galaxy = &config.galaxy;
    ObjectSpec {
        count: galaxy.count as usize,
        size: galaxy.size,
        spread: galaxy.spread,
        opacity: galaxy.opacity,
        texture_paths: galaxy.texture_paths.clone(),
        ..ObjectSpec::galaxy()
    }
}

pub fn planet_spec(config: &Config) -> ObjectSpec {
    let planet = &config.planet;
    ObjectSpec {
        radius: Some(planet.radius),
        segments: Some(planet.segments),
        color: Color::from_hex(planet.color),
        ..ObjectSpec::planet()
    }
}

/// Reproducible generator for a configured seed, otherwise seeded from the
/// thread RNG.
pub fn scene_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_rng(&mut rand::rng()),
    }
}

/// What [`populate`] placed into the graph.
#[derive(Debug, Default)]
pub struct PopulatedScene {
    pub nodes: Vec<NodeId>,
    /// Textures named by the generated materials, to be loaded in the
    /// background.
    pub textures: Vec<PathBuf>,
}

/// Generate the configured bodies and insert them: the star field always,
/// the galaxy and the planet when enabled.
pub fn populate(
    root: &mut SceneGraph,
    config: &Config,
    rng: &mut impl Rng,
) -> Result<PopulatedScene, SceneError> {
    let mut specs = vec![star_spec(config)];
    if config.galaxy.enabled {
        specs.push(galaxy_spec(config));
    }
    if config.planet.enabled {
        specs.push(planet_spec(config));
    }

    let mut scene = PopulatedScene::default();
    for spec in &specs {
        let object = Arc::new(generate(spec, rng)?);
        if let Some(texture) = &object.material().texture
            && !scene.textures.contains(texture)
        {
            scene.textures.push(texture.clone());
        }
        let mode = match spec.kind {
            BodyKind::Star => InsertMode::PointCloud {
                palette: config.stars.tint_vertices.then_some(Palette::Emphasized),
            },
            BodyKind::Galaxy => InsertMode::PointCloud { palette: None },
            BodyKind::Planet => InsertMode::Mesh {
                position: Vec3::from_array(config.planet.position),
            },
        };
        scene
            .nodes
            .extend(cosmos_scene::insert_object(root, object, mode, rng)?);
    }

    info!(
        "Populated scene: {} nodes, {} textures requested",
        scene.nodes.len(),
        scene.textures.len()
    );
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmos_scene::Node;

    fn small_config() -> Config {
        let mut config = Config::default();
        config.stars.count = 500;
        config.galaxy.count = 300;
        config.planet.segments = 8;
        config
    }

    #[test]
    fn test_default_config_gives_starfield_controls() {
        let spec = viewport_spec(&Config::default(), 800, 600);
        assert_eq!(spec.controls.min_distance, 10.0);
        assert_eq!(spec.controls.max_distance, 500_000_000.0);
        assert!(!spec.controls.enable_pan);
        assert!(spec.controls.enable_zoom);
        assert_eq!(spec.camera.kind, ProjectionKind::Perspective);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_orthographic_camera_type_maps() {
        let mut config = Config::default();
        config.camera.camera_type = CameraType::Orthographic;
        let spec = viewport_spec(&config, 800, 600);
        assert_eq!(spec.camera.kind, ProjectionKind::Orthographic);
    }

    #[test]
    fn test_star_spec_follows_config() {
        let mut config = Config::default();
        config.stars.count = 42;
        config.stars.color = 0xff0000;
        let spec = star_spec(&config);
        assert_eq!(spec.kind, BodyKind::Star);
        assert_eq!(spec.count, 42);
        assert_eq!(spec.color, Color::new(1.0, 0.0, 0.0));
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_default_population_is_one_star_cloud() {
        let mut root = SceneGraph::new();
        let mut rng = scene_rng(Some(7));
        let scene = populate(&mut root, &small_config(), &mut rng).unwrap();
        assert_eq!(scene.nodes.len(), 1);
        assert!(scene.textures.is_empty());
        let node = root.get(scene.nodes[0]).unwrap();
        assert!(matches!(node, Node::PointCloud { object } if object.len() == 500));
    }

    #[test]
    fn test_stars_get_emphasized_vertex_colors() {
        let mut config = small_config();
        config.stars.count = 100;
        let mut root = SceneGraph::new();
        let mut rng = scene_rng(Some(3));
        let scene = populate(&mut root, &config, &mut rng).unwrap();

        let stars = root.get(scene.nodes[0]).unwrap().object();
        let colors = stars.colors().unwrap();
        assert_eq!(colors.len(), 100);
        assert!(stars.material().vertex_colors);
        for color in colors {
            assert!(color.iter().all(|c| (0.0..=1.0).contains(c)));
        }
    }

    #[test]
    fn test_star_tint_can_be_disabled() {
        let mut config = small_config();
        config.stars.tint_vertices = false;
        let mut root = SceneGraph::new();
        let mut rng = scene_rng(Some(3));
        let scene = populate(&mut root, &config, &mut rng).unwrap();

        let stars = root.get(scene.nodes[0]).unwrap().object();
        assert!(stars.colors().is_none());
        assert!(!stars.material().vertex_colors);
    }

    #[test]
    fn test_galaxy_and_planet_when_enabled() {
        let mut config = small_config();
        config.galaxy.enabled = true;
        config.galaxy.texture_paths = vec![PathBuf::from("textures/spark.png")];
        config.planet.enabled = true;
        config.planet.position = [50.0, 0.0, 0.0];

        let mut root = SceneGraph::new();
        let mut rng = scene_rng(Some(7));
        let scene = populate(&mut root, &config, &mut rng).unwrap();
        assert_eq!(root.len(), 3);
        assert_eq!(scene.textures, [PathBuf::from("textures/spark.png")]);

        let planet = root
            .iter()
            .find_map(|(_, node)| match node {
                Node::Mesh { position, .. } => Some(*position),
                Node::PointCloud { .. } => None,
            })
            .unwrap();
        assert_eq!(planet, Vec3::new(50.0, 0.0, 0.0));
    }

    #[test]
    fn test_seeded_population_is_reproducible() {
        let build = || {
            let mut root = SceneGraph::new();
            let mut rng = scene_rng(Some(99));
            let scene = populate(&mut root, &small_config(), &mut rng).unwrap();
            root.get(scene.nodes[0]).unwrap().object().positions().to_vec()
        };
        assert_eq!(build(), build());
    }
}
