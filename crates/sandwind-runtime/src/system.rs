//! Runtime system trait

use crate::{FrameTick, SurfaceSize};
use sandwind_core::Result;

/// A system driven by the host animation scheduler
///
/// The host calls `update` once per display refresh with the current frame
/// timing. Systems never block or spawn background work; stopping the host
/// loop and calling `shutdown` is all the teardown needed.
pub trait RuntimeSystem {
    /// Called once before the first frame with the initial surface size
    fn initialize(&mut self, size: SurfaceSize) -> Result<()>;

    /// Called once per animation frame
    fn update(&mut self, tick: &FrameTick) -> Result<()>;

    /// Called when the host surface changes size or pixel density
    fn resize(&mut self, size: SurfaceSize) -> Result<()>;

    /// Called when the host stops driving the system
    fn shutdown(&mut self) -> Result<()>;

    /// Human-readable name for this system
    fn name(&self) -> &str;
}
