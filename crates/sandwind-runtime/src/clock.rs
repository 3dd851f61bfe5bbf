//! Frame clock for the host animation loop

use std::time::Instant;

/// Shortest frame duration ever reported, in milliseconds
pub const MIN_FRAME_MS: f64 = 8.0;

/// Timing for one animation frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Seconds since the clock started
    pub elapsed_sec: f64,
    /// Measured duration of the previous frame in milliseconds (≥ `MIN_FRAME_MS`)
    pub frame_ms: f64,
    /// Frame duration in seconds
    pub dt_sec: f64,
    /// Frame counter, starting at 1 for the first tick
    pub frame: u64,
}

/// Tracks elapsed time and per-frame duration.
///
/// `tick` measures wall-clock time between calls; `advance` feeds a synthetic
/// frame duration so headless hosts and tests get reproducible timing.
pub struct FrameClock {
    /// Total elapsed time in seconds
    pub elapsed_sec: f64,
    /// Frames produced so far
    pub frame: u64,
    last_instant: Instant,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self {
            elapsed_sec: 0.0,
            frame: 0,
            last_instant: Instant::now(),
        }
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by the wall-clock time since the previous tick (or creation).
    pub fn tick(&mut self) -> FrameTick {
        let now = Instant::now();
        let measured_ms = now.duration_since(self.last_instant).as_secs_f64() * 1000.0;
        self.last_instant = now;
        self.advance(measured_ms)
    }

    /// Advance by a given frame duration in milliseconds.
    pub fn advance(&mut self, frame_ms: f64) -> FrameTick {
        let frame_ms = if frame_ms.is_finite() {
            frame_ms.max(MIN_FRAME_MS)
        } else {
            MIN_FRAME_MS
        };
        let dt_sec = frame_ms / 1000.0;
        self.elapsed_sec += dt_sec;
        self.frame += 1;

        FrameTick {
            elapsed_sec: self.elapsed_sec,
            frame_ms,
            dt_sec,
            frame: self.frame,
        }
    }
}
