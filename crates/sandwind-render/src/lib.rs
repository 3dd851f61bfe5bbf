//! SandWind Render - CPU rasterization for SandWind frames
//!
//! - `PixmapSurface` - anti-aliased software `DrawSurface` over an RGBA image
//! - `HeadlessRenderer` - runs a `SandWindSystem` on a synthetic clock and
//!   captures the final frame, optionally as PNG

mod error;
mod headless;
mod pixmap;

pub use error::RenderError;
pub use headless::{save_png, HeadlessRenderer, DEFAULT_FRAME_MS, MAX_FRAME_MS};
pub use pixmap::PixmapSurface;
