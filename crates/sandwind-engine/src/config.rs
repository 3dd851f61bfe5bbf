//! Presets, layer profiles and the resolved runtime configuration
//!
//! A `RuntimeConfig` is built once per simulation from an intensity preset,
//! a seed, a storm style and the surface size. Only the surface fields change
//! afterwards (see [`RuntimeConfig::resize`]).

use sandwind_core::{hash_seed, hash_seed_unit, Color, SandError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of depth layers (near, mid, far)
pub const LAYER_COUNT: usize = 3;

/// Capacity headroom over the nominal particle count, so storms can exceed
/// baseline density without reallocation
const CAPACITY_MULTIPLIER: f32 = 2.6;
const MIN_CAPACITY: usize = 120;

macro_rules! named_enum {
    ($ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl FromStr for $ty {
            type Err = SandError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok($ty::$variant),)+
                    _ => Err(SandError::invalid_enum(s, &[$($name),+])),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        // case-insensitive, same as FromStr
        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let value = <String as serde::Deserialize>::deserialize(deserializer)?;
                value.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use named_enum;

/// Overall particle density preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    #[default]
    Faint,
    Subtle,
    Soft,
}

named_enum!(Intensity { Faint => "faint", Subtle => "subtle", Soft => "soft" });

/// How dramatic storms get
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StormStyle {
    Ambient,
    Moderate,
    #[default]
    Cinematic,
}

named_enum!(StormStyle { Ambient => "ambient", Moderate => "moderate", Cinematic => "cinematic" });

/// Depth band of a particle layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerRole {
    Near,
    Mid,
    Far,
}

named_enum!(LayerRole { Near => "near", Mid => "mid", Far => "far" });

impl LayerRole {
    /// Buffer index: near 0, mid 1, far 2 (larger index = farther)
    pub fn index(self) -> usize {
        match self {
            LayerRole::Near => 0,
            LayerRole::Mid => 1,
            LayerRole::Far => 2,
        }
    }

    fn ttl_range(self) -> (f32, f32) {
        match self {
            LayerRole::Near => (2.5, 5.5),
            LayerRole::Mid => (4.0, 8.0),
            LayerRole::Far => (6.0, 11.0),
        }
    }

    fn spawn_weight(self) -> f32 {
        match self {
            LayerRole::Near => 1.0,
            LayerRole::Mid => 0.82,
            LayerRole::Far => 0.64,
        }
    }

    fn streak_bias(self) -> f32 {
        match self {
            LayerRole::Near => 1.0,
            LayerRole::Mid => 0.74,
            LayerRole::Far => 0.44,
        }
    }

    fn speed_bonus(self) -> f32 {
        match self {
            LayerRole::Near => 8.0,
            LayerRole::Mid => 6.0,
            LayerRole::Far => 4.0,
        }
    }

    /// (hue°, saturation %, lightness %)
    fn hsl(self) -> (f32, f32, f32) {
        match self {
            LayerRole::Near => (39.0, 47.0, 80.0),
            LayerRole::Mid => (41.0, 42.0, 82.0),
            LayerRole::Far => (44.0, 34.0, 84.0),
        }
    }
}

/// Static per-layer preset values (sizes in px, opacity in [0, 1], drift in
/// percent of the layer width travelled per loop)
#[derive(Debug, Clone, Copy)]
pub struct LayerPreset {
    pub role: LayerRole,
    pub count: usize,
    pub duration: f32,
    pub size: (f32, f32),
    pub opacity: (f32, f32),
    pub drift: (f32, f32),
    pub jitter: f32,
    pub vertical_noise: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct IntensityPreset {
    pub density: f32,
    pub layers: [LayerPreset; LAYER_COUNT],
}

impl Intensity {
    pub fn preset(self) -> IntensityPreset {
        let (density, counts) = match self {
            Intensity::Faint => (0.55, [18, 30, 44]),
            Intensity::Subtle => (0.7, [26, 42, 60]),
            Intensity::Soft => (0.85, [34, 56, 80]),
        };

        IntensityPreset {
            density,
            layers: [
                LayerPreset {
                    role: LayerRole::Near,
                    count: counts[0],
                    duration: 26.0,
                    size: (1.6, 2.8),
                    opacity: (0.35, 0.7),
                    drift: (-8.0, 108.0),
                    jitter: 2.2,
                    vertical_noise: 1.4,
                },
                LayerPreset {
                    role: LayerRole::Mid,
                    count: counts[1],
                    duration: 34.0,
                    size: (1.1, 2.0),
                    opacity: (0.28, 0.55),
                    drift: (-6.0, 106.0),
                    jitter: 1.6,
                    vertical_noise: 1.0,
                },
                LayerPreset {
                    role: LayerRole::Far,
                    count: counts[2],
                    duration: 44.0,
                    size: (0.7, 1.4),
                    opacity: (0.2, 0.42),
                    drift: (-4.0, 104.0),
                    jitter: 1.1,
                    vertical_noise: 0.7,
                },
            ],
        }
    }

    fn base_wind_speed(self) -> f32 {
        match self {
            Intensity::Faint => 12.0,
            Intensity::Subtle => 17.0,
            Intensity::Soft => 22.0,
        }
    }

    fn flow_scale(self) -> f32 {
        match self {
            Intensity::Faint => 0.0034,
            Intensity::Subtle => 0.0031,
            Intensity::Soft => 0.0028,
        }
    }
}

/// Storm thresholds and boost ceilings for one storm style
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StormProfile {
    pub enter_threshold: f32,
    pub exit_threshold: f32,
    pub spawn_boost_max: f32,
    pub turbulence_boost_max: f32,
    pub highlight_boost_max: f32,
    pub near_weight_boost_max: f32,
    pub supply_exponent: f32,
}

impl StormStyle {
    pub fn profile(self) -> StormProfile {
        match self {
            StormStyle::Ambient => StormProfile {
                enter_threshold: 0.78,
                exit_threshold: 0.62,
                spawn_boost_max: 1.5,
                turbulence_boost_max: 1.25,
                highlight_boost_max: 0.08,
                near_weight_boost_max: 1.15,
                supply_exponent: 1.25,
            },
            StormStyle::Moderate => StormProfile {
                enter_threshold: 0.74,
                exit_threshold: 0.6,
                spawn_boost_max: 1.85,
                turbulence_boost_max: 1.45,
                highlight_boost_max: 0.13,
                near_weight_boost_max: 1.25,
                supply_exponent: 1.0,
            },
            StormStyle::Cinematic => StormProfile {
                enter_threshold: 0.72,
                exit_threshold: 0.58,
                spawn_boost_max: 2.2,
                turbulence_boost_max: 1.8,
                highlight_boost_max: 0.18,
                near_weight_boost_max: 1.4,
                supply_exponent: 0.78,
            },
        }
    }

    /// Range of gust pulse peaks for this style
    pub fn gust_peak_range(self) -> (f64, f64) {
        match self {
            StormStyle::Ambient => (0.22, 0.48),
            StormStyle::Moderate => (0.35, 0.68),
            StormStyle::Cinematic => (0.5, 0.95),
        }
    }
}

/// Resolved physical and visual parameters for one depth layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerProfile {
    pub role: LayerRole,
    pub index: usize,
    pub base_count: usize,
    pub size_min: f32,
    pub size_max: f32,
    pub alpha_min: f32,
    pub alpha_max: f32,
    pub ttl_min: f32,
    pub ttl_max: f32,
    pub base_speed: f32,
    pub turbulence: f32,
    pub spawn_weight: f32,
    pub streak_bias: f32,
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
}

impl LayerProfile {
    fn from_preset(layer: &LayerPreset, density: f32) -> Self {
        let role = layer.role;
        let drift_speed = (layer.drift.1 - layer.drift.0).abs() / layer.duration.max(1.0) * 30.0;
        let (ttl_min, ttl_max) = role.ttl_range();
        let (hue, saturation, lightness) = role.hsl();

        Self {
            role,
            index: role.index(),
            base_count: layer.count,
            size_min: layer.size.0,
            size_max: layer.size.1,
            alpha_min: (layer.opacity.0 * density * 0.56).clamp(0.03, 0.88),
            alpha_max: (layer.opacity.1 * density * 0.72).clamp(0.06, 0.96),
            ttl_min,
            ttl_max,
            base_speed: drift_speed + role.speed_bonus(),
            turbulence: layer.vertical_noise * 9.5 + layer.jitter * 1.3,
            spawn_weight: role.spawn_weight(),
            streak_bias: role.streak_bias(),
            hue,
            saturation,
            lightness,
        }
    }

    pub fn color(&self) -> Color {
        Color::from_hsl(self.hue, self.saturation, self.lightness)
    }

    /// Warmer, slightly deeper tone used for storm highlights
    pub fn highlight_color(&self, highlight_boost: f32) -> Color {
        Color::from_hsl(
            self.hue - 4.0,
            (self.saturation + 10.0).clamp(0.0, 100.0),
            (self.lightness - 5.0 + highlight_boost * 15.0).clamp(0.0, 100.0),
        )
    }
}

/// Fully resolved configuration for one simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub seed: String,
    pub intensity: Intensity,
    pub storm_style: StormStyle,
    pub width: f32,
    pub height: f32,
    pub pixel_ratio: f32,
    pub density: f32,
    pub total_base_count: usize,
    pub capacity: usize,
    pub base_wind_direction: f32,
    pub base_wind_speed: f32,
    pub heading_drift: f32,
    pub flow_scale: f32,
    pub flow_time_scale: f32,
    pub spawn_margin_base: f32,
    pub fade_in_sec_min: f32,
    pub fade_in_sec_max: f32,
    pub fade_out_sec_min: f32,
    pub fade_out_sec_max: f32,
    pub drag_base: f32,
    pub drag_by_layer: [f32; LAYER_COUNT],
    pub settle_base: f32,
    pub settle_by_layer: [f32; LAYER_COUNT],
    pub shear_strength: f32,
    pub noise_seed: u32,
    pub heading_noise_offset: f64,
    pub storm_profile: StormProfile,
    pub layer_profiles: Vec<LayerProfile>,
}

fn spawn_margin_base(width: f32, height: f32) -> f32 {
    (width.min(height) * 0.12).max(80.0)
}

impl RuntimeConfig {
    pub fn build(
        intensity: Intensity,
        seed: &str,
        storm_style: StormStyle,
        width: f32,
        height: f32,
        pixel_ratio: f32,
    ) -> Self {
        let preset = intensity.preset();
        let width = width.max(1.0);
        let height = height.max(1.0);

        let layer_profiles: Vec<LayerProfile> = preset
            .layers
            .iter()
            .map(|layer| LayerProfile::from_preset(layer, preset.density))
            .collect();

        let total_base_count: usize = layer_profiles.iter().map(|l| l.base_count).sum();
        let capacity = ((total_base_count as f32 * CAPACITY_MULTIPLIER).ceil() as usize).max(MIN_CAPACITY);

        Self {
            seed: seed.to_string(),
            intensity,
            storm_style,
            width,
            height,
            pixel_ratio,
            density: preset.density,
            total_base_count,
            capacity,
            base_wind_direction: 0.0,
            base_wind_speed: intensity.base_wind_speed(),
            heading_drift: 0.42,
            flow_scale: intensity.flow_scale(),
            flow_time_scale: 0.18,
            spawn_margin_base: spawn_margin_base(width, height),
            fade_in_sec_min: 0.45,
            fade_in_sec_max: 1.1,
            fade_out_sec_min: 0.7,
            fade_out_sec_max: 1.6,
            drag_base: 0.32,
            drag_by_layer: [0.9, 1.0, 1.12],
            settle_base: 6.0,
            settle_by_layer: [1.35, 1.0, 0.7],
            shear_strength: 0.22,
            noise_seed: hash_seed(&format!("{seed}:{intensity}:{storm_style}:noise")),
            heading_noise_offset: hash_seed_unit(&format!("{seed}:{storm_style}:heading")),
            storm_profile: storm_style.profile(),
            layer_profiles,
        }
    }

    /// Update surface dimensions and the derived spawn margin
    pub fn resize(&mut self, width: f32, height: f32, pixel_ratio: f32) {
        self.width = width.max(1.0);
        self.height = height.max(1.0);
        self.pixel_ratio = pixel_ratio;
        self.spawn_margin_base = spawn_margin_base(self.width, self.height);
    }

    /// Key for a seeded generator derived from this configuration
    pub fn rng_key(&self, purpose: &str) -> String {
        format!("{}:{}:{}:{purpose}", self.seed, self.intensity, self.storm_style)
    }

    pub fn layer(&self, index: usize) -> &LayerProfile {
        self.layer_profiles.get(index).unwrap_or(&self.layer_profiles[0])
    }
}
