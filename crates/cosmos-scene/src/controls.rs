//! Orbit camera controller: drag to orbit, right-drag to pan, wheel or pinch
//! to zoom, all around a movable target point.
//!
//! Input is accumulated into pending deltas by [`OrbitControls::handle_input`]
//! and applied to the camera by [`OrbitControls::update`] once per frame.
//! With damping enabled, each update applies only a fraction of the pending
//! rotation and pan and decays the rest, giving the camera inertia.

use std::f32::consts::{PI, TAU};

use cosmos_input::MouseState;
use glam::Vec3;
use winit::event::MouseButton;

use crate::camera::{Camera, Projection};
use crate::error::SceneError;
use crate::viewport::Viewport;

/// Keeps the polar angle off the poles so the up vector stays defined.
const POLE_EPSILON: f32 = 1e-4;

/// Per-wheel-line zoom factor at `zoom_speed = 1`.
const ZOOM_STEP: f32 = 0.95;

/// Magnification range of an orthographic camera.
const MIN_ORTHO_ZOOM: f32 = 1e-4;
const MAX_ORTHO_ZOOM: f32 = 1e4;

/// Below this, pending motion is treated as settled.
const SETTLE_EPSILON: f32 = 1e-6;

/// Controller configuration. Validated by [`OrbitControls::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct ControlSettings {
    pub enable_rotate: bool,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    pub enable_damping: bool,
    /// Fraction of pending motion applied per update when damping.
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            enable_rotate: true,
            enable_zoom: true,
            enable_pan: true,
            enable_damping: false,
            damping_factor: 0.05,
            min_distance: 1.0,
            max_distance: 1000.0,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
        }
    }
}

impl ControlSettings {
    /// Settings for exploring a very large star field: zoom from 10 units out
    /// to 500 million, no panning.
    pub fn starfield() -> Self {
        Self {
            enable_pan: false,
            min_distance: 10.0,
            max_distance: 500_000_000.0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), SceneError> {
        if !(self.min_distance.is_finite() && self.min_distance >= 0.0) {
            return Err(SceneError::config(
                "min_distance",
                format!("must be finite and >= 0, got {}", self.min_distance),
            ));
        }
        if !self.max_distance.is_finite() {
            return Err(SceneError::config(
                "max_distance",
                format!("must be finite, got {}", self.max_distance),
            ));
        }
        if self.min_distance > self.max_distance {
            return Err(SceneError::config(
                "min_distance",
                format!(
                    "{} exceeds max_distance {}",
                    self.min_distance, self.max_distance
                ),
            ));
        }
        if !(self.damping_factor > 0.0 && self.damping_factor <= 1.0) {
            return Err(SceneError::config(
                "damping_factor",
                format!("must lie in (0, 1], got {}", self.damping_factor),
            ));
        }
        for (field, speed) in [
            ("rotate_speed", self.rotate_speed),
            ("zoom_speed", self.zoom_speed),
            ("pan_speed", self.pan_speed),
        ] {
            if !(speed.is_finite() && speed >= 0.0) {
                return Err(SceneError::config(
                    field,
                    format!("must be finite and >= 0, got {speed}"),
                ));
            }
        }
        Ok(())
    }
}

/// Camera offset from the target in Y-up spherical coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Spherical {
    radius: f32,
    /// Polar angle from +Y.
    phi: f32,
    /// Azimuth around Y, measured from +Z toward +X.
    theta: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self::default();
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi = self.phi.sin();
        Vec3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }
}

/// Orbit controller bound to one camera.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    settings: ControlSettings,
    target: Vec3,
    spherical: Spherical,
    /// Pending azimuth/polar change (radius unused).
    spherical_delta: Spherical,
    /// Pending multiplicative change of the distance.
    scale: f32,
    pan_offset: Vec3,
}

impl OrbitControls {
    /// Controller orbiting `target`, starting from the camera's current
    /// position. The initial distance is clamped into range.
    pub fn new(camera: &Camera, target: Vec3, settings: ControlSettings) -> Result<Self, SceneError> {
        settings.validate()?;
        let mut spherical = Spherical::from_offset(camera.position - target);
        spherical.radius = spherical
            .radius
            .clamp(settings.min_distance, settings.max_distance);
        Ok(Self {
            settings,
            target,
            spherical,
            spherical_delta: Spherical::default(),
            scale: 1.0,
            pan_offset: Vec3::ZERO,
        })
    }

    pub fn settings(&self) -> &ControlSettings {
        &self.settings
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Current camera distance from the target, as of the last update.
    pub fn distance(&self) -> f32 {
        self.spherical.radius
    }

    /// Translate pointer state into pending orbit, pan and zoom.
    pub fn handle_input(&mut self, mouse: &MouseState, camera: &Camera, viewport: Viewport) {
        let height = viewport.height() as f32;

        if self.settings.enable_rotate {
            let drag = mouse.drag(MouseButton::Left);
            if drag != glam::Vec2::ZERO {
                let speed = self.settings.rotate_speed;
                self.rotate_left(TAU * drag.x / height * speed);
                self.rotate_up(TAU * drag.y / height * speed);
            }
        }

        if self.settings.enable_pan {
            let drag = mouse.drag(MouseButton::Right);
            if drag != glam::Vec2::ZERO {
                self.pan(drag.x, drag.y, camera, viewport);
            }
        }

        if self.settings.enable_zoom {
            let zoom = mouse.zoom_input();
            if zoom.abs() > SETTLE_EPSILON {
                self.dolly(ZOOM_STEP.powf(zoom * self.settings.zoom_speed));
            }
        }
    }

    /// Orbit around the vertical axis by `angle` radians.
    pub fn rotate_left(&mut self, angle: f32) {
        self.spherical_delta.theta -= angle;
    }

    /// Tilt toward the poles by `angle` radians.
    pub fn rotate_up(&mut self, angle: f32) {
        self.spherical_delta.phi -= angle;
    }

    /// Multiply the distance to the target by `factor` (< 1 moves closer).
    /// Orthographic cameras magnify by `1 / factor` instead.
    pub fn dolly(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.scale *= factor;
        }
    }

    /// Screen-space pan by a pixel delta. The world distance per pixel
    /// matches what is under the target, so the target tracks the cursor.
    pub fn pan(&mut self, dx: f32, dy: f32, camera: &Camera, viewport: Viewport) {
        let (width, height) = (viewport.width() as f32, viewport.height() as f32);
        let speed = self.settings.pan_speed;
        let (world_x, world_y) = match camera.projection {
            Projection::Perspective { fov_y, .. } => {
                let target_distance = (camera.position - self.target).length() * (fov_y / 2.0).tan();
                (
                    2.0 * dx * target_distance / height,
                    2.0 * dy * target_distance / height,
                )
            }
            Projection::Orthographic {
                left,
                right,
                top,
                bottom,
            } => (
                dx * (right - left) / (width * camera.zoom),
                dy * (top - bottom) / (height * camera.zoom),
            ),
        };
        self.pan_offset += camera.right() * (-world_x * speed) + camera.up() * (world_y * speed);
    }

    /// Apply pending input to the camera. Returns whether the camera moved.
    ///
    /// The distance is clamped to `[min_distance, max_distance]` on every
    /// call, including when a custom hook has moved the camera.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let step = if self.settings.enable_damping {
            self.settings.damping_factor
        } else {
            1.0
        };

        let mut spherical = Spherical::from_offset(camera.position - self.target);
        if spherical.radius == 0.0 {
            spherical = self.spherical;
        }
        spherical.theta += self.spherical_delta.theta * step;
        spherical.phi = (spherical.phi + self.spherical_delta.phi * step)
            .clamp(POLE_EPSILON, PI - POLE_EPSILON);
        let previous_zoom = camera.zoom;
        if camera.is_perspective() {
            spherical.radius *= self.scale;
        } else {
            camera.zoom = (camera.zoom / self.scale).clamp(MIN_ORTHO_ZOOM, MAX_ORTHO_ZOOM);
        }
        spherical.radius = spherical
            .radius
            .clamp(self.settings.min_distance, self.settings.max_distance);
        self.spherical = spherical;

        self.target += self.pan_offset * step;

        let previous = camera.position;
        camera.position = self.target + spherical.to_offset();
        camera.look_at(self.target);

        if self.settings.enable_damping {
            let decay = 1.0 - self.settings.damping_factor;
            self.spherical_delta.theta *= decay;
            self.spherical_delta.phi *= decay;
            self.pan_offset *= decay;
            if self.spherical_delta.theta.abs() < SETTLE_EPSILON
                && self.spherical_delta.phi.abs() < SETTLE_EPSILON
            {
                self.spherical_delta = Spherical::default();
            }
        } else {
            self.spherical_delta = Spherical::default();
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        (camera.position - previous).length_squared() > SETTLE_EPSILON * SETTLE_EPSILON
            || camera.zoom != previous_zoom
    }
}
