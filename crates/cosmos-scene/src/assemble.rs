//! Scene assembly: camera, controls and surface for a viewport, plus
//! placement of generated objects into the graph.

use std::sync::Arc;

use cosmos_bodies::{Color, GeneratedObject, Palette};
use glam::Vec3;
use rand::Rng;
use tracing::{debug, info};

use crate::camera::Camera;
use crate::controls::OrbitControls;
use crate::error::SceneError;
use crate::graph::{Node, NodeId, SceneGraph};
use crate::surface::RenderSurface;
use crate::viewport::{Viewport, ViewportSpec};

/// Everything one mounted view renders with.
pub struct SceneSetup<S> {
    pub root: SceneGraph,
    pub camera: Camera,
    pub surface: S,
    pub controls: OrbitControls,
    pub viewport: Viewport,
}

/// How [`insert_object`] places an object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InsertMode {
    /// One batched node drawing every vertex as a point. With a palette, an
    /// object without vertex colours is recoloured one palette draw per
    /// vertex.
    PointCloud { palette: Option<Palette> },
    /// A single mesh node at `position`.
    Mesh { position: Vec3 },
    /// `count` mesh nodes sharing the object, each at an independent uniform
    /// position in the cube of side `spread` and tinted from `palette`
    /// (white without one).
    Instances {
        count: usize,
        spread: f32,
        palette: Option<Palette>,
    },
}

/// Build the camera, controls and graph for `spec` around `surface`.
///
/// The surface is resized to the viewport and the controls are applied once,
/// so the camera already respects the distance bounds before the first frame.
pub fn assemble_scene<S: RenderSurface>(
    spec: &ViewportSpec,
    mut surface: S,
) -> Result<SceneSetup<S>, SceneError> {
    spec.validate()?;

    let viewport = spec.viewport;
    let mut camera = spec.camera.build(viewport);
    let mut controls = OrbitControls::new(&camera, spec.camera.look_at, spec.controls.clone())?;
    controls.update(&mut camera);

    surface.resize(viewport.width(), viewport.height());

    info!(
        "Assembled scene: {}x{} {:?} camera, zoom {}..{}",
        viewport.width(),
        viewport.height(),
        spec.camera.kind,
        spec.controls.min_distance,
        spec.controls.max_distance
    );

    Ok(SceneSetup {
        root: SceneGraph::new(),
        camera,
        surface,
        controls,
        viewport,
    })
}

/// Place `object` into `root` and return the ids of the new nodes.
pub fn insert_object(
    root: &mut SceneGraph,
    object: Arc<GeneratedObject>,
    mode: InsertMode,
    rng: &mut impl Rng,
) -> Result<Vec<NodeId>, SceneError> {
    let is_mesh = object.triangles().is_some();

    let ids = match mode {
        InsertMode::PointCloud { palette } => {
            if is_mesh {
                return Err(SceneError::config(
                    "mode",
                    "point-cloud insertion needs a point object, got a mesh",
                ));
            }
            let object = match palette {
                Some(palette) if object.colors().is_none() => {
                    let colors = (0..object.len())
                        .map(|_| palette.sample(rng).to_array())
                        .collect();
                    Arc::new(object.with_vertex_colors(colors)?)
                }
                _ => object,
            };
            vec![root.insert(Node::PointCloud { object })]
        }
        InsertMode::Mesh { position } => {
            require_mesh(is_mesh)?;
            vec![root.insert(Node::Mesh {
                object,
                position,
                color: Color::WHITE,
            })]
        }
        InsertMode::Instances {
            count,
            spread,
            palette,
        } => {
            require_mesh(is_mesh)?;
            if !(spread.is_finite() && spread >= 0.0) {
                return Err(SceneError::config(
                    "spread",
                    format!("must be >= 0, got {spread}"),
                ));
            }
            let half = spread * 0.5;
            (0..count)
                .map(|_| {
                    let position = Vec3::new(
                        rng.random_range(-half..=half),
                        rng.random_range(-half..=half),
                        rng.random_range(-half..=half),
                    );
                    let color = palette.map_or(Color::WHITE, |p| p.sample(rng));
                    root.insert(Node::Mesh {
                        object: Arc::clone(&object),
                        position,
                        color,
                    })
                })
                .collect()
        }
    };

    debug!(nodes = ids.len(), ?mode, "Inserted object");
    Ok(ids)
}

fn require_mesh(is_mesh: bool) -> Result<(), SceneError> {
    if is_mesh {
        Ok(())
    } else {
        Err(SceneError::config(
            "mode",
            "mesh insertion needs a triangle mesh, got a point object",
        ))
    }
}
