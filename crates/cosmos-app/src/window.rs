//! The winit host: one window, one mounted view.
//!
//! Pointer events accumulate in a [`MouseState`]. Every `RedrawRequested`
//! drains finished texture loads, feeds the pointer state to the orbit
//! controls and steps the animation driver once. The next redraw is only
//! requested while the driver keeps going, so a cancelled or faulted driver
//! leaves the window idle.

use std::sync::Arc;

use cosmos_assets::TextureLoader;
use cosmos_config::Config;
use cosmos_input::MouseState;
use cosmos_render::{GpuSurface, RenderContextError};
use cosmos_scene::{LifecycleError, MountedView, SceneError, StepOutcome, UpdateHook};
use tracing::{debug, error, info, instrument, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::content;

/// Why a view could not be mounted into the window.
#[derive(Debug, thiserror::Error)]
pub enum MountError {
    #[error("window creation failed: {0}")]
    Window(#[from] winit::error::OsError),

    #[error(transparent)]
    Gpu(#[from] RenderContextError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

pub fn window_attributes(config: &Config) -> WindowAttributes {
    WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ))
}

pub struct AppState {
    config: Config,
    window: Option<Arc<Window>>,
    view: Option<MountedView<GpuSurface>>,
    mouse: MouseState,
    textures: TextureLoader,
    update_hook: Option<UpdateHook>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            window: None,
            view: None,
            mouse: MouseState::new(),
            textures: TextureLoader::new(),
            update_hook: None,
        }
    }

    /// Run `hook` before the controls on every frame.
    pub fn with_update_hook(mut self, hook: UpdateHook) -> Self {
        self.update_hook = Some(hook);
        self
    }

    pub fn is_mounted(&self) -> bool {
        self.view.as_ref().is_some_and(MountedView::is_mounted)
    }

    fn mount(&mut self, event_loop: &ActiveEventLoop) -> Result<(), MountError> {
        let window = Arc::new(event_loop.create_window(window_attributes(&self.config))?);
        let size = window.inner_size();
        info!(
            "Window created: {}x{} (scale {:.2})",
            size.width,
            size.height,
            window.scale_factor()
        );

        let surface = GpuSurface::new(Arc::clone(&window), self.config.window.vsync)?;
        let spec = content::viewport_spec(&self.config, size.width, size.height);
        let mut view = MountedView::mount(&spec, surface)?;

        let mut rng = content::scene_rng(self.config.seed);
        if let Some(setup) = view.setup_mut() {
            let scene = content::populate(&mut setup.root, &self.config, &mut rng)?;
            for path in scene.textures {
                self.textures.request(path);
            }
        }

        view.start(self.update_hook.take())?;
        window.request_redraw();
        self.window = Some(window);
        self.view = Some(view);
        Ok(())
    }

    /// Hand finished background decodes to the GPU surface.
    fn install_textures(&mut self) {
        let results = self.textures.drain();
        let Some(setup) = self.view.as_mut().and_then(MountedView::setup_mut) else {
            return;
        };
        for result in results {
            match result {
                Ok(texture) => {
                    if let Err(e) = setup.surface.install_texture(
                        &texture.path,
                        &texture.rgba,
                        texture.width,
                        texture.height,
                    ) {
                        warn!("Texture {} rejected: {e}", texture.path.display());
                    }
                }
                Err(e) => warn!("Texture load failed, keeping base colour: {e}"),
            }
        }
    }

    fn redraw(&mut self) {
        self.install_textures();
        let Some(view) = self.view.as_mut() else {
            return;
        };
        if let Err(e) = view.handle_input(&self.mouse) {
            debug!("Input ignored: {e}");
        }
        self.mouse.clear_transients();

        match view.frame() {
            StepOutcome::Continue => {
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            StepOutcome::Cancelled => debug!("Frame skipped: driver not running"),
            StepOutcome::Faulted(e) => error!("Rendering stopped: {e}"),
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        let Some(view) = self.view.as_mut() else {
            return;
        };
        match view.on_resize(width, height) {
            Ok(viewport) => debug!("Viewport now {}x{}", viewport.width(), viewport.height()),
            Err(e) => warn!("Resize to {width}x{height} failed: {e}"),
        }
    }

    fn teardown(&mut self) {
        if let Some(view) = self.view.as_mut()
            && view.is_mounted()
            && let Err(e) = view.teardown()
        {
            warn!("Teardown failed: {e}");
        }
        self.textures.shutdown();
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.mount(event_loop) {
            error!("Failed to start: {e}");
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                self.teardown();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.window.as_ref().map(|w| w.inner_size()) {
                    self.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse.on_cursor_moved(position.x, position.y);
            }
            WindowEvent::CursorEntered { .. } => self.mouse.on_cursor_entered(),
            WindowEvent::CursorLeft { .. } => self.mouse.on_cursor_left(),
            WindowEvent::MouseInput { state, button, .. } => self.mouse.on_button(button, state),
            WindowEvent::MouseWheel { delta, .. } => self.mouse.on_scroll(delta),
            WindowEvent::PinchGesture { delta, .. } => self.mouse.on_pinch(delta),
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.teardown();
    }
}

/// Open the window and block until it is closed.
#[instrument(skip_all)]
pub fn run(config: Config) -> Result<(), winit::error::EventLoopError> {
    run_app(AppState::new(config))
}

/// Like [`run`], with custom logic invoked every frame.
#[instrument(skip_all)]
pub fn run_with_update(
    config: Config,
    hook: UpdateHook,
) -> Result<(), winit::error::EventLoopError> {
    run_app(AppState::new(config).with_update_hook(hook))
}

fn run_app(mut app: AppState) -> Result<(), winit::error::EventLoopError> {
    let event_loop = EventLoop::new()?;
    event_loop.run_app(&mut app)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_unmounted() {
        let state = AppState::new(Config::default());
        assert!(!state.is_mounted());
        assert!(state.window.is_none());
        assert!(state.update_hook.is_none());
    }

    #[test]
    fn test_update_hook_kept_until_mount() {
        let hook: UpdateHook = Box::new(|_ctx: cosmos_scene::FrameContext<'_>| Ok(()));
        let state = AppState::new(Config::default()).with_update_hook(hook);
        assert!(state.update_hook.is_some());
    }

    #[test]
    fn test_events_before_mount_are_harmless() {
        let mut state = AppState::new(Config::default());
        state.resize(640, 480);
        state.redraw();
        state.teardown();
        assert!(!state.is_mounted());
    }

    #[test]
    fn test_window_attributes_from_config() {
        let mut config = Config::default();
        config.window.title = "Deep field".to_string();
        let attrs = window_attributes(&config);
        assert_eq!(attrs.title, "Deep field");
    }
}
