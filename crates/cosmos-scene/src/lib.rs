//! Scene assembly and the per-frame machinery around it: camera, orbit
//! controls, scene graph, animation driver and the mounted-view lifecycle.
//!
//! Rendering itself sits behind the [`RenderSurface`] trait so everything in
//! this crate runs without a GPU.

pub mod assemble;
pub mod camera;
pub mod clock;
pub mod controls;
pub mod driver;
pub mod error;
pub mod graph;
pub mod lifecycle;
pub mod surface;
pub mod viewport;

pub use assemble::{InsertMode, SceneSetup, assemble_scene, insert_object};
pub use camera::{Camera, Projection};
pub use clock::{FrameClock, MAX_FRAME_TIME};
pub use controls::{ControlSettings, OrbitControls};
pub use driver::{
    AnimationDriver, CancelToken, DriverState, FrameContext, FrameScheduler, StepOutcome,
    UpdateHook,
};
pub use error::{FrameError, LifecycleError, SceneError};
pub use graph::{Node, NodeId, SceneGraph};
pub use lifecycle::MountedView;
pub use surface::RenderSurface;
pub use viewport::{CameraSpec, ProjectionKind, Viewport, ViewportSpec};
