//! Pointer input for the orbit camera: drag, wheel and pinch gestures
//! collected from winit events into a per-frame snapshot.

pub mod mouse;

pub use mouse::MouseState;
