//! Viewport dimensions and the fully specified inputs to scene assembly.

use glam::Vec3;

use crate::camera::Camera;
use crate::controls::ControlSettings;
use crate::error::SceneError;

/// Drawable size in physical pixels. Never zero in either dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    width: u32,
    height: u32,
}

impl Viewport {
    /// Zero dimensions are raised to 1 so the aspect ratio stays finite.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionKind {
    #[default]
    Perspective,
    Orthographic,
}

/// Camera parameters for [`assemble_scene`](crate::assemble::assemble_scene).
#[derive(Debug, Clone, PartialEq)]
pub struct CameraSpec {
    pub kind: ProjectionKind,
    /// Vertical field of view in degrees (perspective only).
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub look_at: Vec3,
}

impl Default for CameraSpec {
    fn default() -> Self {
        Self {
            kind: ProjectionKind::Perspective,
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            position: Vec3::new(0.0, 0.0, 5.0),
            look_at: Vec3::ZERO,
        }
    }
}

impl CameraSpec {
    pub fn validate(&self) -> Result<(), SceneError> {
        if !(self.near.is_finite() && self.near > 0.0) {
            return Err(SceneError::config(
                "near",
                format!("must be > 0, got {}", self.near),
            ));
        }
        if !(self.far.is_finite() && self.far > self.near) {
            return Err(SceneError::config(
                "far",
                format!("must exceed near ({}), got {}", self.near, self.far),
            ));
        }
        if self.kind == ProjectionKind::Perspective
            && !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0)
        {
            return Err(SceneError::config(
                "fov",
                format!("must lie in (0, 180) degrees, got {}", self.fov_degrees),
            ));
        }
        if !(self.position.is_finite() && self.look_at.is_finite()) {
            return Err(SceneError::config("position", "must be finite"));
        }
        Ok(())
    }

    /// Build the camera for `viewport`, positioned and aimed.
    pub fn build(&self, viewport: Viewport) -> Camera {
        let mut camera = match self.kind {
            ProjectionKind::Perspective => {
                Camera::perspective(self.fov_degrees, viewport.aspect(), self.near, self.far)
            }
            ProjectionKind::Orthographic => Camera::orthographic(
                viewport.width() as f32,
                viewport.height() as f32,
                self.near,
                self.far,
            ),
        };
        camera.position = self.position;
        camera.look_at(self.look_at);
        camera
    }
}

/// Everything scene assembly needs, validated once.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportSpec {
    pub viewport: Viewport,
    pub camera: CameraSpec,
    pub controls: ControlSettings,
}

impl Default for ViewportSpec {
    fn default() -> Self {
        Self {
            viewport: Viewport::new(1280, 720),
            camera: CameraSpec::default(),
            controls: ControlSettings::default(),
        }
    }
}

impl ViewportSpec {
    pub fn validate(&self) -> Result<(), SceneError> {
        self.camera.validate()?;
        self.controls.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Projection;

    #[test]
    fn test_zero_dimensions_clamp_to_one() {
        let viewport = Viewport::new(0, 0);
        assert_eq!((viewport.width(), viewport.height()), (1, 1));
        assert_eq!(viewport.aspect(), 1.0);
    }

    #[test]
    fn test_build_orthographic_uses_viewport_bounds() {
        let spec = CameraSpec {
            kind: ProjectionKind::Orthographic,
            ..CameraSpec::default()
        };
        let camera = spec.build(Viewport::new(800, 600));
        assert_eq!(
            camera.projection,
            Projection::Orthographic {
                left: -400.0,
                right: 400.0,
                top: 300.0,
                bottom: -300.0,
            }
        );
    }

    #[test]
    fn test_far_must_exceed_near() {
        let spec = CameraSpec {
            near: 10.0,
            far: 5.0,
            ..CameraSpec::default()
        };
        assert!(matches!(
            spec.validate(),
            Err(SceneError::Configuration { field: "far", .. })
        ));
    }

    #[test]
    fn test_fov_out_of_range_rejected() {
        let spec = CameraSpec {
            fov_degrees: 180.0,
            ..CameraSpec::default()
        };
        assert!(spec.validate().is_err());
    }
}
