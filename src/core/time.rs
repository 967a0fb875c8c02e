//! Frame timing

use std::time::{Duration, Instant};

/// Longest frame step handed to the simulation, in seconds
const MAX_DELTA: f32 = 0.1;

/// Tracks time between frames
#[derive(Debug, Clone)]
pub struct Time {
    start: Instant,
    last: Instant,
    delta: Duration,
    frame: u64,
}

impl Time {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            delta: Duration::ZERO,
            frame: 0,
        }
    }

    /// Mark the start of a new frame
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta = now - self.last;
        self.last = now;
        self.frame += 1;
    }

    /// Time since the previous frame
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Seconds since the previous frame, capped so a stall does not
    /// produce one huge step.
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32().min(MAX_DELTA)
    }

    /// Seconds since creation
    pub fn elapsed_seconds(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }

    /// Frames counted so far
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_counts_frames() {
        let mut time = Time::new();
        assert_eq!(time.frame(), 0);
        assert_eq!(time.delta_seconds(), 0.0);

        time.update();
        time.update();
        assert_eq!(time.frame(), 2);
    }

    #[test]
    fn test_delta_is_capped() {
        let mut time = Time::new();
        time.last -= Duration::from_secs(5);
        time.update();

        assert!(time.delta() >= Duration::from_secs(5));
        assert_eq!(time.delta_seconds(), MAX_DELTA);
    }
}
