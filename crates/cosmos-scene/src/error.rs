//! Error types for scene construction, per-frame faults and view lifecycle.

use cosmos_bodies::BodyError;

/// Rejected scene or controller configuration.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SceneError {
    #[error("invalid scene configuration: {field} {reason}")]
    Configuration { field: &'static str, reason: String },

    #[error(transparent)]
    Body(#[from] BodyError),
}

impl SceneError {
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field,
            reason: reason.into(),
        }
    }
}

/// A fault raised while producing one frame.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum FrameError {
    /// The custom update hook failed.
    #[error("update hook failed: {0}")]
    Hook(String),

    /// The presentation surface was lost and could not be reconfigured.
    #[error("render surface lost")]
    SurfaceLost,

    /// The GPU ran out of memory.
    #[error("out of memory")]
    OutOfMemory,

    /// Acquiring the next frame timed out (recoverable - skip frame).
    #[error("timeout")]
    Timeout,
}

impl FrameError {
    /// Whether the driver may keep scheduling frames after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FrameError::Timeout)
    }
}

/// Misuse of a mounted view's lifecycle. Reported, never a panic.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("view has already been torn down")]
    AlreadyTornDown,

    #[error("view is not mounted")]
    NotMounted,

    #[error("animation driver is already running")]
    AlreadyRunning,
}
