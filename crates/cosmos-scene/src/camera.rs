//! Camera with perspective or orthographic projection.

use glam::{Mat3, Mat4, Quat, Vec3};

/// A camera that generates view and projection matrices for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Rotation as a unit quaternion.
    pub rotation: Quat,
    pub projection: Projection,
    /// Near clip plane distance (always positive).
    pub near: f32,
    /// Far clip plane distance (always positive, > near).
    pub far: f32,
    /// Orthographic magnification: the visible bounds are the projection
    /// bounds divided by this. Ignored by perspective projections.
    pub zoom: f32,
}

/// Projection type for the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective {
        /// Vertical field of view in radians.
        fov_y: f32,
        /// Width / height.
        aspect_ratio: f32,
    },
    /// Explicit view-volume bounds, kept at `±width/2`, `±height/2` of the
    /// viewport in pixels.
    Orthographic {
        left: f32,
        right: f32,
        top: f32,
        bottom: f32,
    },
}

impl Projection {
    /// Orthographic bounds centred on the view axis for a `width` x `height`
    /// viewport.
    pub fn orthographic_for(width: f32, height: f32) -> Self {
        Projection::Orthographic {
            left: -width / 2.0,
            right: width / 2.0,
            top: height / 2.0,
            bottom: -height / 2.0,
        }
    }
}

impl Camera {
    /// Perspective camera at `position`. `fov_y_degrees` is vertical.
    pub fn perspective(fov_y_degrees: f32, aspect_ratio: f32, near: f32, far: f32) -> Self {
        Self {
            projection: Projection::Perspective {
                fov_y: fov_y_degrees.to_radians(),
                aspect_ratio,
            },
            near,
            far,
            ..Self::default()
        }
    }

    /// Orthographic camera covering a `width` x `height` viewport.
    pub fn orthographic(width: f32, height: f32, near: f32, far: f32) -> Self {
        Self {
            projection: Projection::orthographic_for(width, height),
            near,
            far,
            ..Self::default()
        }
    }

    /// Compute the view matrix (inverse of camera transform).
    pub fn view_matrix(&self) -> Mat4 {
        (Mat4::from_translation(self.position) * Mat4::from_quat(self.rotation)).inverse()
    }

    /// Compute the projection matrix with reverse-Z.
    pub fn projection_matrix(&self) -> Mat4 {
        // Reverse-Z: near maps to depth 1, far to 0. Swapping near/far does it.
        match self.projection {
            Projection::Perspective {
                fov_y,
                aspect_ratio,
            } => Mat4::perspective_rh(fov_y, aspect_ratio, self.far, self.near),
            Projection::Orthographic {
                left,
                right,
                top,
                bottom,
            } => {
                let zoom = self.zoom;
                Mat4::orthographic_rh(
                    left / zoom,
                    right / zoom,
                    bottom / zoom,
                    top / zoom,
                    self.far,
                    self.near,
                )
            }
        }
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// The forward direction vector (-Z in camera space).
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn is_perspective(&self) -> bool {
        matches!(self.projection, Projection::Perspective { .. })
    }

    /// Rotate the camera so it faces `target`, keeping world +Y up.
    pub fn look_at(&mut self, target: Vec3) {
        let back = self.position - target;
        if back.length_squared() < 1e-12 {
            return;
        }
        let back = back.normalize();
        let mut right = Vec3::Y.cross(back);
        if right.length_squared() < 1e-12 {
            // Looking straight up or down.
            right = Vec3::X;
        }
        let right = right.normalize();
        let up = back.cross(right);
        self.rotation = Quat::from_mat3(&Mat3::from_cols(right, up, back)).normalize();
    }

    /// Recompute the projection for a new viewport size: the aspect ratio for
    /// perspective, the view-volume bounds for orthographic.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        let (w, h) = (width as f32, height as f32);
        self.projection = match self.projection {
            Projection::Perspective { fov_y, .. } => Projection::Perspective {
                fov_y,
                aspect_ratio: w / h,
            },
            Projection::Orthographic { .. } => Projection::orthographic_for(w, h),
        };
    }
}

impl Default for Camera {
    fn default() -> Self {
        let mut camera = Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            rotation: Quat::IDENTITY,
            projection: Projection::Perspective {
                fov_y: 75f32.to_radians(),
                aspect_ratio: 1.0,
            },
            near: 0.1,
            far: 1000.0,
            zoom: 1.0,
        };
        camera.look_at(Vec3::ZERO);
        camera
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn test_default_camera_looks_at_origin() {
        let camera = Camera::default();
        assert_eq!(camera.position, Vec3::new(0.0, 0.0, 5.0));
        let forward = camera.forward();
        assert!((forward - Vec3::NEG_Z).length() < 1e-6);
        assert_eq!(camera.near, 0.1);
        assert_eq!(camera.far, 1000.0);
    }

    #[test]
    fn test_default_fov_is_75_degrees() {
        let camera = Camera::default();
        if let Projection::Perspective { fov_y, .. } = camera.projection {
            assert!((fov_y - 75f32.to_radians()).abs() < 1e-6);
        } else {
            panic!("expected perspective projection");
        }
    }

    #[test]
    fn test_look_at_from_arbitrary_position() {
        let mut camera = Camera {
            position: Vec3::new(10.0, 20.0, -30.0),
            ..Camera::default()
        };
        let target = Vec3::new(1.0, 2.0, 3.0);
        camera.look_at(target);
        let expected = (target - camera.position).normalize();
        assert!((camera.forward() - expected).length() < 1e-5);
        // Up stays in the plane containing world +Y.
        assert!(camera.right().y.abs() < 1e-5);
    }

    #[test]
    fn test_look_at_straight_down() {
        let mut camera = Camera {
            position: Vec3::new(0.0, 10.0, 0.0),
            ..Camera::default()
        };
        camera.look_at(Vec3::ZERO);
        assert!((camera.forward() - Vec3::NEG_Y).length() < 1e-5);
    }

    #[test]
    fn test_set_viewport_updates_aspect() {
        let mut camera = Camera::perspective(75.0, 1.0, 0.1, 1000.0);
        camera.set_viewport(800, 600);
        camera.set_viewport(400, 300);
        if let Projection::Perspective { aspect_ratio, .. } = camera.projection {
            assert!((aspect_ratio - 400.0 / 300.0).abs() < 1e-6);
        } else {
            panic!("expected perspective projection");
        }
    }

    #[test]
    fn test_set_viewport_updates_ortho_bounds() {
        let mut camera = Camera::orthographic(100.0, 100.0, 0.1, 1000.0);
        camera.set_viewport(640, 480);
        assert_eq!(
            camera.projection,
            Projection::Orthographic {
                left: -320.0,
                right: 320.0,
                top: 240.0,
                bottom: -240.0,
            }
        );
    }

    #[test]
    fn test_ortho_projection_maps_bounds_to_ndc_edges() {
        let camera = Camera::orthographic(20.0, 10.0, 0.1, 100.0);
        let proj = camera.projection_matrix();
        let right_edge = proj * Vec4::new(10.0, 0.0, -50.0, 1.0);
        assert!((right_edge.x / right_edge.w - 1.0).abs() < 1e-4);
        let top_edge = proj * Vec4::new(0.0, 5.0, -50.0, 1.0);
        assert!((top_edge.y / top_edge.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_ortho_zoom_narrows_visible_bounds() {
        let mut camera = Camera::orthographic(20.0, 10.0, 0.1, 100.0);
        camera.zoom = 2.0;
        let proj = camera.projection_matrix();
        let edge = proj * Vec4::new(5.0, 2.5, -50.0, 1.0);
        assert!((edge.x / edge.w - 1.0).abs() < 1e-4);
        assert!((edge.y / edge.w - 1.0).abs() < 1e-4);

        // Resizing keeps the magnification.
        camera.set_viewport(40, 20);
        assert_eq!(camera.zoom, 2.0);
    }

    #[test]
    fn test_reverse_z_depth() {
        let camera = Camera::perspective(60.0, 1.0, 0.1, 1000.0);
        let proj = camera.projection_matrix();
        let near = proj * Vec4::new(0.0, 0.0, -0.1, 1.0);
        let far = proj * Vec4::new(0.0, 0.0, -1000.0, 1.0);
        assert!((near.z / near.w - 1.0).abs() < 1e-4);
        assert!((far.z / far.w).abs() < 1e-4);
    }

    #[test]
    fn test_view_matrix_inverse_is_camera_transform() {
        let camera = Camera {
            position: Vec3::new(10.0, 20.0, 30.0),
            rotation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            ..Camera::default()
        };
        let reconstructed = camera.view_matrix().inverse().col(3).truncate();
        assert!((reconstructed - camera.position).length() < 1e-4);
    }
}
