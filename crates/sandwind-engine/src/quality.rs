//! Adaptive rendering quality
//!
//! Frame timings are smoothed into a single quality scalar in `[0.45, 1]`
//! that scales particle count, spawn rate and rendering detail. The scalar
//! falls quickly and recovers slowly, with a cooldown after every drop, so
//! jittery frame times don't make the animation flicker between levels.

use crate::config::named_enum;
use crate::curves::remap_clamped;
use sandwind_core::SandError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const QUALITY_FLOOR: f32 = 0.45;

const GOOD_FRAME_MS: f64 = 16.67;
const BAD_FRAME_MS: f64 = 33.33;
const FRAME_MS_MIN: f64 = 8.0;
const FRAME_MS_MAX: f64 = 60.0;
const EMA_ALPHA: f64 = 0.12;
const MAX_DROP_PER_UPDATE: f32 = 0.06;
const MAX_RISE_PER_UPDATE: f32 = 0.02;
const UPSCALE_COOLDOWN_UPDATES: u32 = 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityMode {
    #[default]
    Auto,
    Low,
    Medium,
    High,
}

named_enum!(QualityMode { Auto => "auto", Low => "low", Medium => "medium", High => "high" });

impl QualityMode {
    /// Fixed scalar for manual modes; `None` for auto
    pub fn manual_scalar(self) -> Option<f32> {
        match self {
            QualityMode::Auto => None,
            QualityMode::Low => Some(0.58),
            QualityMode::Medium => Some(0.79),
            QualityMode::High => Some(1.0),
        }
    }
}

/// Scale factors derived from one quality scalar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityState {
    pub mode: QualityMode,
    pub quality_scalar: f32,
    pub particle_scale: f32,
    pub spawn_scale: f32,
    pub detail_scale: f32,
    pub streak_scale: f32,
    pub glow_scale: f32,
}

impl QualityState {
    pub fn from_scalar(mode: QualityMode, quality_scalar: f32) -> Self {
        let scalar = quality_scalar.clamp(QUALITY_FLOOR, 1.0);
        let detail_scale = ((scalar - QUALITY_FLOOR) / (1.0 - QUALITY_FLOOR)).clamp(0.0, 1.0);

        Self {
            mode,
            quality_scalar: scalar,
            particle_scale: scalar,
            spawn_scale: (0.58 + scalar * 0.72).clamp(0.62, 1.35),
            detail_scale,
            streak_scale: 0.72 + detail_scale * 0.68,
            glow_scale: 0.08 + detail_scale * 0.32,
        }
    }

    /// Fixed profile for a manual mode (auto maps to full quality)
    pub fn manual(mode: QualityMode) -> Self {
        Self::from_scalar(mode, mode.manual_scalar().unwrap_or(1.0))
    }
}

impl Default for QualityState {
    fn default() -> Self {
        Self::from_scalar(QualityMode::Auto, 1.0)
    }
}

/// Persistent controller state
#[derive(Debug, Clone)]
pub struct AdaptiveQuality {
    pub mode: QualityMode,
    pub ema_frame_ms: f64,
    pub quality_scalar: f32,
    pub upscale_cooldown: u32,
}

impl AdaptiveQuality {
    pub fn new(mode: QualityMode) -> Self {
        Self {
            mode,
            ema_frame_ms: GOOD_FRAME_MS,
            quality_scalar: mode.manual_scalar().unwrap_or(1.0),
            upscale_cooldown: 0,
        }
    }

    /// Feed one measured frame duration and get the quality to use this frame
    pub fn update(&mut self, frame_ms: f64) -> QualityState {
        if self.mode != QualityMode::Auto {
            return QualityState::manual(self.mode);
        }

        let frame_ms = if frame_ms.is_finite() { frame_ms } else { FRAME_MS_MAX };
        let clamped = frame_ms.clamp(FRAME_MS_MIN, FRAME_MS_MAX);
        self.ema_frame_ms += (clamped - self.ema_frame_ms) * EMA_ALPHA;

        let target = remap_clamped(
            self.ema_frame_ms,
            GOOD_FRAME_MS,
            BAD_FRAME_MS,
            1.0,
            f64::from(QUALITY_FLOOR),
        ) as f32;

        if target < self.quality_scalar {
            let previous = self.quality_scalar;
            self.quality_scalar = target.max(self.quality_scalar - MAX_DROP_PER_UPDATE);
            self.upscale_cooldown = UPSCALE_COOLDOWN_UPDATES;
            log::debug!(
                "quality {previous:.2} -> {:.2} (avg frame {:.1}ms)",
                self.quality_scalar,
                self.ema_frame_ms
            );
        } else if target > self.quality_scalar {
            if self.upscale_cooldown > 0 {
                self.upscale_cooldown -= 1;
            } else {
                self.quality_scalar = target.min(self.quality_scalar + MAX_RISE_PER_UPDATE);
            }
        }

        self.quality_scalar = self.quality_scalar.clamp(QUALITY_FLOOR, 1.0);
        QualityState::from_scalar(QualityMode::Auto, self.quality_scalar)
    }
}

impl Default for AdaptiveQuality {
    fn default() -> Self {
        Self::new(QualityMode::Auto)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_under_sustained_slow_frames() {
        let mut adaptive = AdaptiveQuality::new(QualityMode::Auto);
        let mut quality = adaptive.update(16.67);
        for _ in 0..90 {
            quality = adaptive.update(41.0);
        }
        assert!(quality.quality_scalar < 0.8);
        assert!(quality.quality_scalar >= QUALITY_FLOOR);
    }

    #[test]
    fn recovers_gradually() {
        let mut adaptive = AdaptiveQuality::new(QualityMode::Auto);
        let mut quality = adaptive.update(16.67);
        for _ in 0..90 {
            quality = adaptive.update(40.0);
        }
        let degraded = quality.quality_scalar;

        for _ in 0..160 {
            quality = adaptive.update(16.0);
        }
        assert!(quality.quality_scalar > degraded);
        assert!(quality.quality_scalar <= 1.0);
    }

    #[test]
    fn drop_is_capped_per_update() {
        let mut adaptive = AdaptiveQuality::new(QualityMode::Auto);
        let mut previous = 1.0;
        for _ in 0..60 {
            let q = adaptive.update(60.0).quality_scalar;
            assert!(previous - q <= MAX_DROP_PER_UPDATE + 1e-6);
            previous = q;
        }
        assert_eq!(previous, QUALITY_FLOOR);
    }

    #[test]
    fn cooldown_freezes_recovery() {
        let mut adaptive = AdaptiveQuality::new(QualityMode::Auto);
        for _ in 0..40 {
            adaptive.update(45.0);
        }
        let floor = adaptive.quality_scalar;
        // ema needs a few fast frames before target exceeds the scalar,
        // then the cooldown holds it for 22 more updates
        for _ in 0..22 {
            assert_eq!(adaptive.update(10.0).quality_scalar, floor);
        }
    }

    #[test]
    fn manual_modes_are_fixed_and_ordered() {
        let low = AdaptiveQuality::new(QualityMode::Low).update(12.0);
        let medium = AdaptiveQuality::new(QualityMode::Medium).update(40.0);
        let high = AdaptiveQuality::new(QualityMode::High).update(28.0);

        assert_eq!(low.mode, QualityMode::Low);
        assert_eq!(medium.mode, QualityMode::Medium);
        assert_eq!(high.mode, QualityMode::High);
        assert!(low.quality_scalar < medium.quality_scalar);
        assert!(medium.quality_scalar < high.quality_scalar);
    }

    #[test]
    fn derived_scales_at_floor_and_ceiling() {
        let floor = QualityState::from_scalar(QualityMode::Auto, 0.1);
        assert_eq!(floor.quality_scalar, QUALITY_FLOOR);
        assert_eq!(floor.detail_scale, 0.0);
        assert!((floor.glow_scale - 0.08).abs() < 1e-6);

        let full = QualityState::from_scalar(QualityMode::Auto, 1.0);
        assert!((full.detail_scale - 1.0).abs() < 1e-6);
        assert!((full.streak_scale - 1.4).abs() < 1e-5);
        assert!((full.spawn_scale - 1.3).abs() < 1e-5);
    }
}
