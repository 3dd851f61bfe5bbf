//! Headless frame renderer: drives a system with a synthetic clock and
//! rasterizes the final frame into an image

use crate::error::RenderError;
use crate::pixmap::PixmapSurface;
use image::RgbaImage;
use sandwind_core::Color;
use sandwind_engine::SandWindSystem;
use sandwind_runtime::{FrameClock, RuntimeSystem, SurfaceSize, MIN_FRAME_MS};
use std::path::Path;

/// Longest synthetic frame accepted, in milliseconds
pub const MAX_FRAME_MS: f64 = 1000.0;

pub const DEFAULT_FRAME_MS: f64 = 1000.0 / 60.0;

pub struct HeadlessRenderer {
    size: SurfaceSize,
    frame_ms: f64,
    background: Option<Color>,
}

impl HeadlessRenderer {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            frame_ms: DEFAULT_FRAME_MS,
            background: None,
        }
    }

    /// Fixed duration of every simulated frame
    pub fn with_frame_ms(mut self, frame_ms: f64) -> Result<Self, RenderError> {
        if !frame_ms.is_finite() || !(MIN_FRAME_MS..=MAX_FRAME_MS).contains(&frame_ms) {
            return Err(RenderError::InvalidFrameTime {
                value: frame_ms,
                min: MIN_FRAME_MS,
                max: MAX_FRAME_MS,
            });
        }
        self.frame_ms = frame_ms;
        Ok(self)
    }

    /// Opaque colour behind the particles; `None` keeps transparency
    pub fn with_background(mut self, background: Option<Color>) -> Self {
        self.background = background;
        self
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn frame_ms(&self) -> f64 {
        self.frame_ms
    }

    /// Initialize `system`, run `frames` updates and draw the last one
    pub fn render(&self, system: &mut SandWindSystem, frames: u32) -> Result<RgbaImage, RenderError> {
        system.initialize(self.size)?;

        let mut clock = FrameClock::new();
        for _ in 0..frames {
            let tick = clock.advance(self.frame_ms);
            system.update(&tick)?;
        }

        let mut surface = PixmapSurface::new(self.size);
        system.draw(&mut surface);
        log::debug!(
            "rendered frame {} at {:.2}s ({} pixels painted)",
            clock.frame,
            clock.elapsed_sec,
            surface.painted_pixels()
        );

        Ok(match self.background {
            Some(color) => surface.flatten(color),
            None => surface.into_image(),
        })
    }

    /// `render` and write the frame as PNG
    pub fn render_to_file(
        &self,
        system: &mut SandWindSystem,
        frames: u32,
        path: &Path,
    ) -> Result<RgbaImage, RenderError> {
        let image = self.render(system, frames)?;
        save_png(&image, path)?;
        Ok(image)
    }
}

/// Write an image as PNG, creating parent directories as needed
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<(), RenderError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| RenderError::ImageSave {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    log::info!("saved {}x{} frame to {}", image.width(), image.height(), path.display());
    Ok(())
}
