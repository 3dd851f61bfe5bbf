//! CLI command implementations

pub mod config;
pub mod render;
pub mod signals;
pub mod simulate;

use anyhow::{Context, Result};
use clap::Args;
use sandwind_engine::{Intensity, QualityMode, SandSettings, StormStyle};

/// Flags shared by every command; each overrides the layered settings
#[derive(Args, Debug, Clone, Default)]
pub struct SandArgs {
    /// Seed string; identical seeds replay identical animations
    #[arg(long)]
    pub seed: Option<String>,

    /// Density preset (faint, subtle, soft)
    #[arg(long)]
    pub intensity: Option<Intensity>,

    /// Storm drama (ambient, moderate, cinematic)
    #[arg(long)]
    pub storm_style: Option<StormStyle>,

    /// Quality mode (auto, low, medium, high)
    #[arg(long)]
    pub quality: Option<QualityMode>,
}

impl SandArgs {
    /// Load layered settings and apply command-line overrides
    pub fn resolve(&self) -> Result<SandSettings> {
        let mut settings = SandSettings::load().context("Failed to load sandwind settings")?;
        self.apply(&mut settings);
        Ok(settings)
    }

    fn apply(&self, settings: &mut SandSettings) {
        if let Some(seed) = &self.seed {
            settings.seed = seed.clone();
        }
        if let Some(intensity) = self.intensity {
            settings.intensity = intensity;
        }
        if let Some(storm_style) = self.storm_style {
            settings.storm_style = storm_style;
        }
        if let Some(quality) = self.quality {
            settings.quality = quality;
        }
    }
}
