//! SandWind Runtime - Host animation loop building blocks
//!
//! Provides what a host scheduler needs to drive an ambient animation:
//! - `FrameClock` / `FrameTick` - elapsed time and measured frame duration
//! - `SurfaceSize` - clamped logical surface dimensions and pixel density
//! - `RuntimeSystem` - trait for systems ticked once per animation frame

mod clock;
mod surface;
mod system;

pub use clock::{FrameClock, FrameTick, MIN_FRAME_MS};
pub use surface::{SurfaceSize, MAX_PIXEL_RATIO};
pub use system::RuntimeSystem;
