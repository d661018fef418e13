//! Per-frame animation driver.
//!
//! The driver does not own a loop. The host calls [`AnimationDriver::step`]
//! once per display refresh (winit's `RedrawRequested`) and schedules the
//! next refresh only while steps return [`StepOutcome::Continue`]. Hosts that
//! own their loop use [`AnimationDriver::run`] with a [`FrameScheduler`].
//!
//! Cancellation is a shared flag checked at the top of every step, so once
//! the token is cancelled no further frame reaches the surface.

use std::cell::Cell;
use std::rc::Rc;

use tracing::{error, info, warn};

use crate::assemble::SceneSetup;
use crate::camera::Camera;
use crate::clock::FrameClock;
use crate::error::{FrameError, LifecycleError};
use crate::graph::SceneGraph;
use crate::surface::RenderSurface;

/// What a custom update hook may touch each frame.
pub struct FrameContext<'a> {
    pub root: &'a mut SceneGraph,
    pub camera: &'a mut Camera,
    /// Clamped seconds since the previous frame.
    pub dt: f64,
    /// Index of this frame since the driver started.
    pub frame: u64,
}

/// Custom per-frame logic run before controls and rendering.
pub type UpdateHook = Box<dyn FnMut(FrameContext<'_>) -> Result<(), FrameError>>;

/// Single-threaded cancellation flag shared between a driver and its owner.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Stopped,
    Running,
}

/// Result of one frame step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Frame rendered (or skipped after a timeout); schedule the next one.
    Continue,
    /// The driver is not running or its token was cancelled. Nothing rendered.
    Cancelled,
    /// The hook or the surface failed; the driver has stopped.
    Faulted(FrameError),
}

/// Source of display-refresh ticks for hosts that own their loop.
pub trait FrameScheduler {
    /// Block until the next frame is due. `false` means the host is shutting
    /// down and no more frames will come.
    fn wait_for_frame(&mut self) -> bool;
}

pub struct AnimationDriver {
    state: DriverState,
    token: Option<CancelToken>,
    hook: Option<UpdateHook>,
    clock: FrameClock,
    frames_rendered: u64,
}

impl AnimationDriver {
    pub fn new() -> Self {
        Self {
            state: DriverState::Stopped,
            token: None,
            hook: None,
            clock: FrameClock::new(),
            frames_rendered: 0,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Frames that reached the surface since creation.
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Move from Stopped to Running. The returned token stops the driver when
    /// cancelled; a fresh token is issued on every start.
    pub fn start(&mut self, hook: Option<UpdateHook>) -> Result<CancelToken, LifecycleError> {
        if self.state == DriverState::Running {
            return Err(LifecycleError::AlreadyRunning);
        }
        let token = CancelToken::new();
        self.token = Some(token.clone());
        self.hook = hook;
        self.clock.reset();
        self.state = DriverState::Running;
        info!("Animation driver started");
        Ok(token)
    }

    fn halt(&mut self) {
        self.state = DriverState::Stopped;
        self.hook = None;
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }

    /// Run one frame: custom hook, controls, one render.
    pub fn step<S: RenderSurface>(&mut self, setup: &mut SceneSetup<S>) -> StepOutcome {
        if self.state != DriverState::Running {
            return StepOutcome::Cancelled;
        }
        if self.token.as_ref().is_none_or(CancelToken::is_cancelled) {
            self.halt();
            info!("Animation driver cancelled");
            return StepOutcome::Cancelled;
        }

        let dt = self.clock.tick();
        let frame = self.clock.frame_count() - 1;

        if let Some(hook) = self.hook.as_mut() {
            let context = FrameContext {
                root: &mut setup.root,
                camera: &mut setup.camera,
                dt,
                frame,
            };
            if let Err(err) = hook(context) {
                error!("Update hook failed on frame {frame}, stopping driver: {err}");
                self.halt();
                return StepOutcome::Faulted(err);
            }
        }

        setup.controls.update(&mut setup.camera);

        match setup.surface.render(&setup.root, &setup.camera) {
            Ok(()) => {
                self.frames_rendered += 1;
                StepOutcome::Continue
            }
            Err(err) if err.is_recoverable() => {
                warn!("Skipping frame {frame}: {err}");
                StepOutcome::Continue
            }
            Err(err) => {
                error!("Render failed on frame {frame}, stopping driver: {err}");
                self.halt();
                StepOutcome::Faulted(err)
            }
        }
    }

    /// Step on every scheduler tick until cancelled, faulted or the
    /// scheduler stops.
    pub fn run<S: RenderSurface>(
        &mut self,
        setup: &mut SceneSetup<S>,
        scheduler: &mut impl FrameScheduler,
    ) -> StepOutcome {
        loop {
            if !scheduler.wait_for_frame() {
                self.halt();
                return StepOutcome::Cancelled;
            }
            match self.step(setup) {
                StepOutcome::Continue => {}
                outcome => return outcome,
            }
        }
    }
}

impl Default for AnimationDriver {
    fn default() -> Self {
        Self::new()
    }
}
