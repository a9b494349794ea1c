/// Frame timing

use std::time::{Duration, Instant};

/// Wall-clock time between frames
#[derive(Debug, Clone)]
pub struct FrameTimer {
    last: Instant,
    /// Seconds taken by the previous frame
    delta: f64,
    /// Seconds since the timer was created
    elapsed: f64,
    frame_count: u64,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            delta: 0.0,
            elapsed: 0.0,
            frame_count: 0,
        }
    }

    /// Close the current frame against the wall clock
    pub fn tick(&mut self) -> f64 {
        let now = Instant::now();
        let delta = now.duration_since(self.last);
        self.last = now;
        self.advance(delta)
    }

    /// Close the current frame with a fixed duration
    pub fn advance(&mut self, delta: Duration) -> f64 {
        self.delta = delta.as_secs_f64();
        self.elapsed += self.delta;
        self.frame_count += 1;
        self.delta
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Average frames per second since creation
    pub fn average_fps(&self) -> f64 {
        if self.elapsed > 0.0 {
            self.frame_count as f64 / self.elapsed
        } else {
            0.0
        }
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}
