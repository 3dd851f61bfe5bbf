//! Render errors

use sandwind_core::SandError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Frame time must be a finite number of milliseconds between {min} and {max}, got {value}")]
    InvalidFrameTime { value: f64, min: f64, max: f64 },
    #[error("Failed to save image to {path}: {message}")]
    ImageSave { path: String, message: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("System error: {0}")]
    System(#[from] SandError),
}
