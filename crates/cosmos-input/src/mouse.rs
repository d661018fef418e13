//! Frame-coherent pointer state tracker.
//!
//! [`MouseState`] accumulates winit pointer events during a frame and exposes
//! position, movement, button, wheel and pinch queries to the camera
//! controller. Transients are cleared once per frame after the controller has
//! consumed them.

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta};

/// Pixels of a trackpad scroll that count as one wheel line.
const PIXELS_PER_LINE: f64 = 40.0;

#[derive(Debug, Clone, Copy, Default)]
struct ButtonFrame {
    pressed: bool,
    just_pressed: bool,
    just_released: bool,
}

fn button_index(button: MouseButton) -> usize {
    match button {
        MouseButton::Left => 0,
        MouseButton::Right => 1,
        MouseButton::Middle => 2,
        MouseButton::Back | MouseButton::Forward | MouseButton::Other(_) => 3,
    }
}

/// Frame-coherent pointer state.
///
/// 1. Forward winit events via the `on_*` methods.
/// 2. Let the controller read the accessors.
/// 3. Call [`clear_transients`](Self::clear_transients) at end of frame.
#[derive(Debug, Clone)]
pub struct MouseState {
    position: Vec2,
    delta: Vec2,
    buttons: [ButtonFrame; 4],
    scroll: f32,
    pinch: f32,
    cursor_in_window: bool,
}

impl Default for MouseState {
    fn default() -> Self {
        Self::new()
    }
}

impl MouseState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec2::ZERO,
            delta: Vec2::ZERO,
            buttons: [ButtonFrame::default(); 4],
            scroll: 0.0,
            pinch: 0.0,
            cursor_in_window: false,
        }
    }

    // ── Event handlers ──────────────────────────────────────────────

    /// Process a `CursorMoved` event (physical pixels).
    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        let new_pos = Vec2::new(x as f32, y as f32);
        if self.cursor_in_window {
            self.delta += new_pos - self.position;
        }
        self.position = new_pos;
        self.cursor_in_window = true;
    }

    /// Process a `MouseInput` event.
    pub fn on_button(&mut self, button: MouseButton, state: ElementState) {
        let frame = &mut self.buttons[button_index(button)];
        match state {
            ElementState::Pressed => {
                frame.pressed = true;
                frame.just_pressed = true;
            }
            ElementState::Released => {
                frame.pressed = false;
                frame.just_released = true;
            }
        }
    }

    /// Process a `MouseWheel` event.
    pub fn on_scroll(&mut self, delta: MouseScrollDelta) {
        match delta {
            MouseScrollDelta::LineDelta(_x, y) => self.scroll += y,
            MouseScrollDelta::PixelDelta(pos) => self.scroll += (pos.y / PIXELS_PER_LINE) as f32,
        }
    }

    /// Process a `PinchGesture` event. Positive deltas spread the fingers
    /// apart (zoom in).
    pub fn on_pinch(&mut self, delta: f64) {
        self.pinch += delta as f32;
    }

    pub fn on_cursor_entered(&mut self) {
        self.cursor_in_window = true;
    }

    /// Process a `CursorLeft` event. Held buttons are released so a drag
    /// that leaves the window does not stick.
    pub fn on_cursor_left(&mut self) {
        self.cursor_in_window = false;
        for b in &mut self.buttons {
            if b.pressed {
                b.pressed = false;
                b.just_released = true;
            }
        }
    }

    /// Clears per-frame transients: delta, scroll, pinch and edge flags.
    pub fn clear_transients(&mut self) {
        self.delta = Vec2::ZERO;
        self.scroll = 0.0;
        self.pinch = 0.0;
        for b in &mut self.buttons {
            b.just_pressed = false;
            b.just_released = false;
        }
    }

    // ── Queries ─────────────────────────────────────────────────────

    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Movement since the last clear.
    #[must_use]
    pub fn delta(&self) -> Vec2 {
        self.delta
    }

    /// Movement since the last clear while `button` is held, zero otherwise.
    #[must_use]
    pub fn drag(&self, button: MouseButton) -> Vec2 {
        if self.is_button_pressed(button) {
            self.delta
        } else {
            Vec2::ZERO
        }
    }

    #[must_use]
    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.buttons[button_index(button)].pressed
    }

    #[must_use]
    pub fn just_button_pressed(&self, button: MouseButton) -> bool {
        self.buttons[button_index(button)].just_pressed
    }

    #[must_use]
    pub fn just_button_released(&self, button: MouseButton) -> bool {
        self.buttons[button_index(button)].just_released
    }

    /// Wheel lines accumulated this frame (positive = scroll up).
    #[must_use]
    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    /// Pinch magnification accumulated this frame.
    #[must_use]
    pub fn pinch(&self) -> f32 {
        self.pinch
    }

    /// Combined zoom input: wheel lines plus pinch scaled to roughly one line
    /// per 10% magnification.
    #[must_use]
    pub fn zoom_input(&self) -> f32 {
        self.scroll + self.pinch * 10.0
    }

    #[must_use]
    pub fn is_cursor_in_window(&self) -> bool {
        self.cursor_in_window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_move_has_no_delta() {
        let mut ms = MouseState::new();
        ms.on_cursor_moved(100.0, 200.0);
        assert_eq!(ms.position(), Vec2::new(100.0, 200.0));
        assert_eq!(ms.delta(), Vec2::ZERO);
    }

    #[test]
    fn test_delta_is_difference_between_frames() {
        let mut ms = MouseState::new();
        ms.on_cursor_moved(100.0, 200.0);
        ms.clear_transients();
        ms.on_cursor_moved(110.0, 195.0);
        let d = ms.delta();
        assert!((d.x - 10.0).abs() < f32::EPSILON);
        assert!((d.y - (-5.0)).abs() < f32::EPSILON);
    }

    #[test]
    fn test_drag_only_while_pressed() {
        let mut ms = MouseState::new();
        ms.on_cursor_moved(0.0, 0.0);
        ms.on_cursor_moved(5.0, 0.0);
        assert_eq!(ms.drag(MouseButton::Left), Vec2::ZERO);

        ms.on_button(MouseButton::Left, ElementState::Pressed);
        assert_eq!(ms.drag(MouseButton::Left), Vec2::new(5.0, 0.0));
        assert_eq!(ms.drag(MouseButton::Right), Vec2::ZERO);
    }

    #[test]
    fn test_button_press_and_release_tracked() {
        let mut ms = MouseState::new();
        ms.on_button(MouseButton::Right, ElementState::Pressed);
        assert!(ms.is_button_pressed(MouseButton::Right));
        assert!(ms.just_button_pressed(MouseButton::Right));

        ms.on_button(MouseButton::Right, ElementState::Released);
        assert!(!ms.is_button_pressed(MouseButton::Right));
        assert!(ms.just_button_released(MouseButton::Right));
    }

    #[test]
    fn test_scroll_accumulates_within_frame() {
        let mut ms = MouseState::new();
        ms.on_scroll(MouseScrollDelta::LineDelta(0.0, 1.0));
        ms.on_scroll(MouseScrollDelta::LineDelta(0.0, 0.5));
        assert!((ms.scroll() - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_pinch_feeds_zoom_input() {
        let mut ms = MouseState::new();
        ms.on_pinch(0.1);
        assert!((ms.zoom_input() - 1.0).abs() < 1e-5);
        ms.clear_transients();
        assert_eq!(ms.zoom_input(), 0.0);
    }

    #[test]
    fn test_leaving_window_releases_buttons() {
        let mut ms = MouseState::new();
        ms.on_cursor_entered();
        ms.on_button(MouseButton::Left, ElementState::Pressed);
        ms.on_cursor_left();
        assert!(!ms.is_button_pressed(MouseButton::Left));
        assert!(ms.just_button_released(MouseButton::Left));
        assert!(!ms.is_cursor_in_window());
    }
}
