//! Frame timing for the animation driver.

use std::time::Instant;

use tracing::warn;

/// Maximum frame time handed to update hooks. A long stall (window drag,
/// debugger break) is reported as one slow frame rather than a jump.
pub const MAX_FRAME_TIME: f64 = 0.25;

/// Measures wall-clock time between frames.
#[derive(Debug)]
pub struct FrameClock {
    previous: Option<Instant>,
    elapsed: f64,
    frame_count: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            previous: None,
            elapsed: 0.0,
            frame_count: 0,
        }
    }

    /// Start a frame and return its clamped duration in seconds. The first
    /// frame after creation or [`reset`](Self::reset) has zero duration.
    pub fn tick(&mut self) -> f64 {
        let now = Instant::now();
        let frame_time = self
            .previous
            .map_or(0.0, |previous| now.duration_since(previous).as_secs_f64());
        self.previous = Some(now);
        self.advance(frame_time)
    }

    /// Advance by an explicit frame time instead of measuring it.
    pub fn advance(&mut self, frame_time: f64) -> f64 {
        let dt = if frame_time > MAX_FRAME_TIME {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                frame_time * 1000.0,
                MAX_FRAME_TIME * 1000.0
            );
            MAX_FRAME_TIME
        } else {
            frame_time.max(0.0)
        };
        self.elapsed += dt;
        self.frame_count += 1;
        dt
    }

    /// Forget the previous instant so a restarted loop does not see the gap.
    pub fn reset(&mut self) {
        self.previous = None;
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Sum of clamped frame times in seconds.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tick_is_zero() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick(), 0.0);
        assert_eq!(clock.frame_count(), 1);
    }

    #[test]
    fn test_long_frame_clamped() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(1.0), MAX_FRAME_TIME);
        assert!((clock.elapsed() - MAX_FRAME_TIME).abs() < 1e-12);
    }

    #[test]
    fn test_elapsed_accumulates() {
        let mut clock = FrameClock::new();
        for _ in 0..10 {
            clock.advance(0.016);
        }
        assert_eq!(clock.frame_count(), 10);
        assert!((clock.elapsed() - 0.16).abs() < 1e-9);
    }

    #[test]
    fn test_negative_frame_time_ignored() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(-0.5), 0.0);
    }
}
