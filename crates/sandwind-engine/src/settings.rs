//! Layered settings
//!
//! Settings are loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `SANDWIND_SEED`, `SANDWIND_INTENSITY`,
//!    `SANDWIND_STORM_STYLE`, `SANDWIND_QUALITY`, `SANDWIND_ENABLED`
//! 2. Project-local: `.sandwind/config.toml`
//! 3. Global: `~/.sandwind/config.toml`
//!
//! Both files use a `[sand]` table; keys left out fall through to the
//! layer below.

use crate::config::{Intensity, StormStyle};
use crate::quality::QualityMode;
use sandwind_core::{Result, SandError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_SEED: &str = "dunes-page-v1";

const ENV_SEED: &str = "SANDWIND_SEED";
const ENV_INTENSITY: &str = "SANDWIND_INTENSITY";
const ENV_STORM_STYLE: &str = "SANDWIND_STORM_STYLE";
const ENV_QUALITY: &str = "SANDWIND_QUALITY";
const ENV_ENABLED: &str = "SANDWIND_ENABLED";

/// One `[sand]` table as written in a config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SandSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<Intensity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storm_style: Option<StormStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// Top-level config file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SandConfigFile {
    #[serde(default)]
    pub sand: SandSection,
}

/// Resolved settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandSettings {
    pub seed: String,
    pub intensity: Intensity,
    pub storm_style: StormStyle,
    pub quality: QualityMode,
    /// Host-level switch; reduced-motion hosts set this to false
    pub enabled: bool,
}

impl Default for SandSettings {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED.to_string(),
            intensity: Intensity::default(),
            storm_style: StormStyle::default(),
            quality: QualityMode::default(),
            enabled: true,
        }
    }
}

impl SandSettings {
    /// Load settings with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut settings = SandSettings::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                settings.merge(Self::load_file(&global_path)?.sand);
            }
        }

        let local_path = PathBuf::from(".sandwind/config.toml");
        if local_path.exists() {
            settings.merge(Self::load_file(&local_path)?.sand);
        }

        settings.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Load settings from a specific file path only, without env overrides
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut settings = SandSettings::default();
        settings.merge(Self::load_file(path)?.sand);
        Ok(settings)
    }

    /// Render these settings as a config file body
    pub fn to_toml(&self) -> Result<String> {
        let file = SandConfigFile {
            sand: SandSection {
                seed: Some(self.seed.clone()),
                intensity: Some(self.intensity),
                storm_style: Some(self.storm_style),
                quality: Some(self.quality),
                enabled: Some(self.enabled),
            },
        };
        Ok(toml::to_string_pretty(&file)?)
    }

    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".sandwind").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<SandConfigFile> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            SandError::ConfigError(format!("Failed to parse config {}: {}", path.display(), e))
        })
    }

    /// Overlay the keys present in `section`
    pub fn merge(&mut self, section: SandSection) {
        if let Some(seed) = section.seed {
            self.seed = seed;
        }
        if let Some(intensity) = section.intensity {
            self.intensity = intensity;
        }
        if let Some(storm_style) = section.storm_style {
            self.storm_style = storm_style;
        }
        if let Some(quality) = section.quality {
            self.quality = quality;
        }
        if let Some(enabled) = section.enabled {
            self.enabled = enabled;
        }
    }

    /// Apply overrides from an environment lookup. Unparseable values are errors.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(seed) = lookup(ENV_SEED) {
            if !seed.trim().is_empty() {
                self.seed = seed;
            }
        }
        if let Some(value) = lookup(ENV_INTENSITY) {
            self.intensity = value.parse()?;
        }
        if let Some(value) = lookup(ENV_STORM_STYLE) {
            self.storm_style = value.parse()?;
        }
        if let Some(value) = lookup(ENV_QUALITY) {
            self.quality = value.parse()?;
        }
        if let Some(value) = lookup(ENV_ENABLED) {
            self.enabled = parse_flag(ENV_ENABLED, &value)?;
        }
        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(SandError::ConfigError(format!(
            "{key} must be a boolean, got '{other}'"
        ))),
    }
}
