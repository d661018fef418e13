//! The seam between scene logic and the GPU.

use crate::camera::Camera;
use crate::error::FrameError;
use crate::graph::SceneGraph;

/// A drawable target owned by exactly one mounted view.
///
/// `detach` and `release` are each called once, in that order, during
/// teardown. Implementations need not tolerate calls after `release`.
pub trait RenderSurface {
    /// Current backing-buffer size in physical pixels.
    fn size(&self) -> (u32, u32);

    /// Resize the backing buffer. Called with non-zero dimensions only.
    fn resize(&mut self, width: u32, height: u32);

    /// Draw one frame of `root` as seen from `camera`.
    fn render(&mut self, root: &SceneGraph, camera: &Camera) -> Result<(), FrameError>;

    /// Stop presenting into the host window.
    fn detach(&mut self);

    /// Free GPU-side resources.
    fn release(&mut self);
}

#[cfg(test)]
pub(crate) mod test_surface {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;

    /// Call counters shared between a [`CountingSurface`] and the test.
    #[derive(Debug, Default)]
    pub(crate) struct Counters {
        pub renders: Cell<u32>,
        pub resizes: Cell<u32>,
        pub detaches: Cell<u32>,
        pub releases: Cell<u32>,
        pub size: Cell<(u32, u32)>,
        /// Errors returned by upcoming `render` calls, front first.
        pub fail_with: RefCell<Vec<FrameError>>,
    }

    pub(crate) struct CountingSurface {
        pub counters: Rc<Counters>,
    }

    impl CountingSurface {
        pub fn new() -> (Self, Rc<Counters>) {
            let counters = Rc::new(Counters::default());
            (
                Self {
                    counters: Rc::clone(&counters),
                },
                counters,
            )
        }
    }

    impl RenderSurface for CountingSurface {
        fn size(&self) -> (u32, u32) {
            self.counters.size.get()
        }

        fn resize(&mut self, width: u32, height: u32) {
            self.counters.resizes.set(self.counters.resizes.get() + 1);
            self.counters.size.set((width, height));
        }

        fn render(&mut self, _root: &SceneGraph, _camera: &Camera) -> Result<(), FrameError> {
            self.counters.renders.set(self.counters.renders.get() + 1);
            let mut failures = self.counters.fail_with.borrow_mut();
            if failures.is_empty() {
                Ok(())
            } else {
                Err(failures.remove(0))
            }
        }

        fn detach(&mut self) {
            self.counters.detaches.set(self.counters.detaches.get() + 1);
        }

        fn release(&mut self) {
            self.counters.releases.set(self.counters.releases.get() + 1);
        }
    }
}
