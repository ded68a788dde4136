use std::time::{Duration, Instant};

/// The session clock: milliseconds elapsed since a fixed per-session
/// epoch. Blink phases are computed against this clock so that every
/// light with the same interval stays synchronized.
pub struct TimeState {
    epoch: Instant,
    base_offset: Duration,
}
impl TimeState {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            base_offset: Duration::ZERO,
        }
    }
    /// Starts the clock as if `offset` had already elapsed. Useful for
    /// resuming a session at a known point in the blink cycle.
    pub fn with_offset(offset: Duration) -> Self {
        Self {
            epoch: Instant::now(),
            base_offset: offset,
        }
    }
    pub fn elapsed(&self) -> Duration {
        self.base_offset + self.epoch.elapsed()
    }
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }
}
impl Default for TimeState {
    fn default() -> Self {
        Self::new()
    }
}
