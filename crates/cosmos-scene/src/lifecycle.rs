//! A scene mounted into a host window, from assembly to teardown.

use cosmos_input::MouseState;
use tracing::{info, warn};

use crate::assemble::{SceneSetup, assemble_scene};
use crate::driver::{AnimationDriver, CancelToken, StepOutcome, UpdateHook};
use crate::error::{LifecycleError, SceneError};
use crate::surface::RenderSurface;
use crate::viewport::{Viewport, ViewportSpec};

/// Owns a [`SceneSetup`] and the driver animating it.
///
/// Teardown cancels the driver, detaches the surface and releases it. It
/// happens once: explicitly through [`teardown`](Self::teardown) or, failing
/// that, on drop.
pub struct MountedView<S: RenderSurface> {
    setup: Option<SceneSetup<S>>,
    driver: AnimationDriver,
    token: Option<CancelToken>,
}

impl<S: RenderSurface> MountedView<S> {
    /// Assemble a scene for `spec` on `surface` and mount it.
    pub fn mount(spec: &ViewportSpec, surface: S) -> Result<Self, SceneError> {
        Ok(Self::from_setup(assemble_scene(spec, surface)?))
    }

    pub fn from_setup(setup: SceneSetup<S>) -> Self {
        Self {
            setup: Some(setup),
            driver: AnimationDriver::new(),
            token: None,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.setup.is_some()
    }

    pub fn setup(&self) -> Option<&SceneSetup<S>> {
        self.setup.as_ref()
    }

    pub fn setup_mut(&mut self) -> Option<&mut SceneSetup<S>> {
        self.setup.as_mut()
    }

    pub fn driver(&self) -> &AnimationDriver {
        &self.driver
    }

    /// Start animating. The view keeps a copy of the token for teardown.
    pub fn start(&mut self, hook: Option<UpdateHook>) -> Result<CancelToken, LifecycleError> {
        if self.setup.is_none() {
            return Err(LifecycleError::NotMounted);
        }
        let token = self.driver.start(hook)?;
        self.token = Some(token.clone());
        Ok(token)
    }

    /// Produce one frame. A torn-down view never renders.
    pub fn frame(&mut self) -> StepOutcome {
        match self.setup.as_mut() {
            Some(setup) => self.driver.step(setup),
            None => StepOutcome::Cancelled,
        }
    }

    /// Feed this frame's pointer state to the orbit controls.
    pub fn handle_input(&mut self, mouse: &MouseState) -> Result<(), LifecycleError> {
        let setup = self.setup.as_mut().ok_or(LifecycleError::NotMounted)?;
        setup
            .controls
            .handle_input(mouse, &setup.camera, setup.viewport);
        Ok(())
    }

    /// React to a host size change: zero dimensions clamp to 1, the camera
    /// projection is recomputed and the surface backing buffer resized.
    pub fn on_resize(&mut self, width: u32, height: u32) -> Result<Viewport, LifecycleError> {
        let Some(setup) = self.setup.as_mut() else {
            warn!("Resize to {width}x{height} ignored: view not mounted");
            return Err(LifecycleError::NotMounted);
        };
        let viewport = Viewport::new(width, height);
        setup.viewport = viewport;
        setup.camera.set_viewport(viewport.width(), viewport.height());
        setup.surface.resize(viewport.width(), viewport.height());
        Ok(viewport)
    }

    /// Stop the driver and release the surface. Only the first call does
    /// anything; later calls report [`LifecycleError::AlreadyTornDown`].
    pub fn teardown(&mut self) -> Result<(), LifecycleError> {
        let Some(mut setup) = self.setup.take() else {
            warn!("Teardown requested twice; ignoring");
            return Err(LifecycleError::AlreadyTornDown);
        };
        if let Some(token) = self.token.take() {
            token.cancel();
        }
        // Let the driver observe the cancellation and drop its hook.
        self.driver.step(&mut setup);
        setup.surface.detach();
        setup.surface.release();
        info!("View torn down");
        Ok(())
    }
}

impl<S: RenderSurface> Drop for MountedView<S> {
    fn drop(&mut self) {
        if self.is_mounted() {
            let _ = self.teardown();
        }
    }
}
