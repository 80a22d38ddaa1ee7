//! Simulated frame timing
//!
//! The streaming core never reads the wall clock: every delay is measured in
//! simulated seconds advanced by a fixed step per frame, which keeps runs
//! reproducible and lets tests fast-forward.

/// Fixed-step frame clock
#[derive(Debug, Clone)]
pub struct FrameClock {
    fixed_delta: f64,
    total_time: f64,
    frame_count: u64,
}

impl FrameClock {
    /// Create a new clock advancing `fixed_delta` seconds per frame
    pub fn new(fixed_delta: f64) -> Self {
        Self {
            fixed_delta,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Advance one frame and return the step in seconds
    pub fn tick(&mut self) -> f32 {
        self.total_time += self.fixed_delta;
        self.frame_count += 1;
        self.delta_time()
    }

    /// Get the time step of a single frame in seconds
    #[allow(clippy::cast_possible_truncation)]
    pub fn delta_time(&self) -> f32 {
        self.fixed_delta as f32
    }

    /// Get the total simulated time since clock creation
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(1.0 / 60.0)
    }
}
