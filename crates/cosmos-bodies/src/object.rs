//! Generated vertex data and material parameters.

use std::path::PathBuf;

use crate::color::Color;
use crate::spec::{BodyError, BodyKind};

/// Material parameters shared by every vertex of a generated object.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialParams {
    /// Base colour, multiplied with vertex colours when those are enabled.
    pub color: Color,
    /// Point size in world units (point clouds only).
    pub size: f32,
    /// Shrink points with distance from a perspective camera.
    pub size_attenuation: bool,
    pub opacity: f32,
    pub transparent: bool,
    /// Use the per-vertex colour attribute.
    pub vertex_colors: bool,
    /// Sprite or surface texture, resolved asynchronously by the renderer.
    pub texture: Option<PathBuf>,
}

/// Triangle topology for mesh bodies. Attribute arrays are parallel to the
/// owning object's positions.
#[derive(Clone, Debug, PartialEq)]
pub struct Triangles {
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

/// Immutable geometry + material produced from an
/// [`ObjectSpec`](crate::spec::ObjectSpec).
///
/// Every attribute array has exactly one entry per position. There is no
/// mutable access; deriving a variant (e.g. recolouring) builds a new object.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedObject {
    kind: BodyKind,
    positions: Vec<[f32; 3]>,
    colors: Option<Vec<[f32; 3]>>,
    triangles: Option<Triangles>,
    material: MaterialParams,
}

fn check_len(expected: usize, actual: usize) -> Result<(), BodyError> {
    if expected == actual {
        Ok(())
    } else {
        Err(BodyError::AttributeMismatch { expected, actual })
    }
}

impl GeneratedObject {
    /// Assemble an object, checking attribute counts against `positions`.
    pub fn new(
        kind: BodyKind,
        positions: Vec<[f32; 3]>,
        colors: Option<Vec<[f32; 3]>>,
        triangles: Option<Triangles>,
        material: MaterialParams,
    ) -> Result<Self, BodyError> {
        if let Some(colors) = &colors {
            check_len(positions.len(), colors.len())?;
        }
        if let Some(triangles) = &triangles {
            check_len(positions.len(), triangles.normals.len())?;
            check_len(positions.len(), triangles.uvs.len())?;
        }
        Ok(Self {
            kind,
            positions,
            colors,
            triangles,
            material,
        })
    }

    /// A copy of this object with per-vertex colours enabled.
    pub fn with_vertex_colors(&self, colors: Vec<[f32; 3]>) -> Result<Self, BodyError> {
        let material = MaterialParams {
            vertex_colors: true,
            ..self.material.clone()
        };
        Self::new(
            self.kind,
            self.positions.clone(),
            Some(colors),
            self.triangles.clone(),
            material,
        )
    }

    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn colors(&self) -> Option<&[[f32; 3]]> {
        self.colors.as_deref()
    }

    pub fn triangles(&self) -> Option<&Triangles> {
        self.triangles.as_ref()
    }

    pub fn material(&self) -> &MaterialParams {
        &self.material
    }

    /// Number of vertices (points for point clouds).
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
