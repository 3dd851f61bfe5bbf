//! Logical surface dimensions

use serde::{Deserialize, Serialize};

/// Upper bound on device pixel density used for the backing store
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// Logical size of the drawing surface plus its pixel density.
///
/// Width and height are clamped to at least 1 so margin and scale
/// computations never divide by zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: f32,
    pub height: f32,
    pub pixel_ratio: f32,
}

impl SurfaceSize {
    pub fn new(width: f32, height: f32, pixel_ratio: f32) -> Self {
        let dim = |v: f32| if v.is_finite() { v.max(1.0) } else { 1.0 };
        let pixel_ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            pixel_ratio.min(MAX_PIXEL_RATIO)
        } else {
            1.0
        };
        Self {
            width: dim(width),
            height: dim(height),
            pixel_ratio,
        }
    }

    /// Backing-store size in device pixels
    pub fn device_pixels(&self) -> (u32, u32) {
        (
            (self.width * self.pixel_ratio).round().max(1.0) as u32,
            (self.height * self.pixel_ratio).round().max(1.0) as u32,
        )
    }
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self::new(1280.0, 720.0, 1.0)
    }
}
