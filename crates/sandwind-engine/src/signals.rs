//! Wind signal generator: gust strength, sand supply and the storm state machine
//!
//! Two continuous signals drive everything downstream:
//! - **gust** - a slow two-sine baseline plus scheduled pulse envelopes
//! - **supply** - three slow LFOs with a noise warp, curved per storm style
//!
//! The only state that persists between samples (besides the RNG and pulse
//! schedule) is whether a storm is active, which gives the hysteresis.

use crate::config::{StormProfile, StormStyle};
use crate::curves::{clamp01, ease_in_out_cubic, ease_out_cubic};
use crate::noise::value_noise_1d;
use crate::rand::SeededRng;
use sandwind_core::hash_seed;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Wind never fully dies below this supply
pub const SUPPLY_FLOOR: f64 = 0.18;
pub const GUST_MIN: f64 = 0.45;
pub const GUST_MAX: f64 = 2.35;

/// Pulses are scheduled this far ahead of the sampled time
const SCHEDULE_HORIZON_SEC: f64 = 30.0;
/// Pulses that ended this long before the horizon are dropped
const PRUNE_AGE_SEC: f64 = 120.0;
/// Pruning only kicks in once the schedule holds more pulses than this
const PRUNE_THRESHOLD: usize = 18;
/// Envelope value above which a pulse counts as active
const PULSE_ACTIVE_LEVEL: f64 = 0.04;
const TREND_DELTA_SEC: f64 = 0.2;

/// One scheduled gust pulse: ease-out attack, flat hold, ease-in-out decay
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GustPulse {
    pub start: f64,
    pub attack: f64,
    pub hold: f64,
    pub decay: f64,
    pub peak: f64,
    pub end: f64,
}

impl GustPulse {
    /// Envelope value at `time_sec` (zero outside the pulse)
    pub fn sample(&self, time_sec: f64) -> f64 {
        if time_sec < self.start || time_sec > self.end {
            return 0.0;
        }

        let elapsed = time_sec - self.start;
        if elapsed <= self.attack {
            return ease_out_cubic(clamp01(elapsed / self.attack)) * self.peak;
        }
        if elapsed <= self.attack + self.hold {
            return self.peak;
        }

        let decay_progress = clamp01((elapsed - self.attack - self.hold) / self.decay);
        (1.0 - ease_in_out_cubic(decay_progress)) * self.peak
    }
}

/// Wind/storm state at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindSample {
    pub time_sec: f64,
    pub gust: f32,
    pub supply: f32,
    pub supply_trend: f32,
    pub storm_level: f32,
    pub storm_active: bool,
    pub gust_pulse_active: bool,
    pub spawn_boost: f32,
    pub turbulence_boost: f32,
    pub highlight_boost: f32,
    pub near_weight_boost: f32,
}

impl WindSample {
    /// Neutral mid-supply calm sample
    pub fn calm(time_sec: f64) -> Self {
        Self {
            time_sec,
            gust: 1.0,
            supply: 0.5,
            supply_trend: 0.0,
            storm_level: 0.0,
            storm_active: false,
            gust_pulse_active: false,
            spawn_boost: 1.0,
            turbulence_boost: 1.0,
            highlight_boost: 0.0,
            near_weight_boost: 1.0,
        }
    }
}

impl Default for WindSample {
    fn default() -> Self {
        Self::calm(0.0)
    }
}

/// Persistent signal generator state for one seed and storm style
#[derive(Debug, Clone)]
pub struct WindSignals {
    storm_style: StormStyle,
    profile: StormProfile,
    rng: SeededRng,
    supply_noise_seed_a: u32,
    supply_noise_seed_b: u32,
    gust_periods: [f64; 2],
    gust_phases: [f64; 2],
    supply_phases: [f64; 3],
    supply_warp_offset: f64,
    gust_pulses: Vec<GustPulse>,
    next_gust_start: f64,
    storm_active: bool,
}

impl WindSignals {
    pub fn new(seed: &str, storm_style: StormStyle) -> Self {
        let mut rng = SeededRng::new(&format!("{seed}:{storm_style}:signals"));
        let signal_hash = hash_seed(&format!("{seed}:{storm_style}:signal-noise"));

        let gust_periods = [rng.range(8.0, 13.0), rng.range(12.0, 18.0)];
        let gust_phases = [rng.next_f64(), rng.next_f64()];
        let supply_phases = [rng.next_f64(), rng.next_f64(), rng.next_f64()];
        let supply_warp_offset = rng.range(50.0, 500.0);
        let next_gust_start = rng.range(0.8, 6.2);

        Self {
            storm_style,
            profile: storm_style.profile(),
            rng,
            supply_noise_seed_a: signal_hash,
            supply_noise_seed_b: signal_hash ^ 0x9e37_79b9,
            gust_periods,
            gust_phases,
            supply_phases,
            supply_warp_offset,
            gust_pulses: Vec::new(),
            next_gust_start,
            storm_active: false,
        }
    }

    pub fn storm_style(&self) -> StormStyle {
        self.storm_style
    }

    pub fn storm_active(&self) -> bool {
        self.storm_active
    }

    /// Currently scheduled pulses (past, present and up to 30 s ahead)
    pub fn pulses(&self) -> &[GustPulse] {
        &self.gust_pulses
    }

    /// Sample gust/supply/storm at `time_sec`, advancing the pulse schedule
    /// and the storm state machine.
    pub fn sample(&mut self, time_sec: f64) -> WindSample {
        self.schedule_until(time_sec + SCHEDULE_HORIZON_SEC);

        let baseline = self.gust_baseline(time_sec);
        let mut pulse = 0.0_f64;
        let mut pulse_active = false;
        for event in &self.gust_pulses {
            let value = event.sample(time_sec);
            pulse = pulse.max(value);
            pulse_active |= value > PULSE_ACTIVE_LEVEL;
        }
        let gust = (baseline + pulse).clamp(GUST_MIN, GUST_MAX);

        // thresholds compare against the published f32 value
        let supply = f64::from(self.supply(time_sec) as f32);
        let supply_trend = self.supply_trend(time_sec);

        let profile = self.profile;
        let enter = f64::from(profile.enter_threshold);
        let exit = f64::from(profile.exit_threshold);

        if self.storm_active {
            if supply <= exit && !pulse_active {
                self.storm_active = false;
                log::debug!("storm ended at {time_sec:.1}s (supply {supply:.3})");
            }
        } else if (supply > enter && supply_trend > 0.0) || (pulse_active && supply > enter * 0.88) {
            self.storm_active = true;
            log::debug!("storm started at {time_sec:.1}s (supply {supply:.3}, pulse {pulse_active})");
        }

        let storm_level = clamp01((supply - enter) / (1.0 - enter)) as f32;
        let ramp = |max: f32, base: f32| 1.0 + (max - 1.0) * (base + storm_level * (1.0 - base));

        let (spawn_boost, turbulence_boost, highlight_boost, near_weight_boost) = if self.storm_active {
            (
                ramp(profile.spawn_boost_max, 0.35),
                ramp(profile.turbulence_boost_max, 0.3),
                profile.highlight_boost_max * (0.35 + storm_level * 0.65),
                ramp(profile.near_weight_boost_max, 0.3),
            )
        } else {
            (1.0, 1.0, 0.0, 1.0)
        };

        WindSample {
            time_sec,
            gust: gust as f32,
            supply: supply as f32,
            supply_trend: supply_trend as f32,
            storm_level,
            storm_active: self.storm_active,
            gust_pulse_active: pulse_active,
            spawn_boost,
            turbulence_boost,
            highlight_boost,
            near_weight_boost,
        }
    }

    fn schedule_until(&mut self, horizon_sec: f64) {
        let (peak_min, peak_max) = self.storm_style.gust_peak_range();

        while self.next_gust_start <= horizon_sec {
            let attack = self.rng.range(0.8, 2.0);
            let hold = self.rng.range(1.5, 4.0);
            let decay = self.rng.range(3.0, 8.0);
            let peak = self.rng.range(peak_min, peak_max);

            let start = self.next_gust_start;
            let end = start + attack + hold + decay;
            self.gust_pulses.push(GustPulse {
                start,
                attack,
                hold,
                decay,
                peak,
                end,
            });
            self.next_gust_start = end + self.rng.range(4.0, 12.0);
        }

        if self.gust_pulses.len() > PRUNE_THRESHOLD {
            let prune_before = horizon_sec - PRUNE_AGE_SEC;
            self.gust_pulses.retain(|event| event.end >= prune_before);
        }
    }

    fn gust_baseline(&self, time_sec: f64) -> f64 {
        let wave = (TAU * (time_sec / self.gust_periods[0] + self.gust_phases[0])).sin() * 0.62
            + (TAU * (time_sec / self.gust_periods[1] + self.gust_phases[1])).sin() * 0.38;
        0.64 + clamp01(wave * 0.5 + 0.5) * 0.44
    }

    fn supply_raw(&self, time_sec: f64) -> f64 {
        let offset = self.supply_warp_offset;
        let warp = value_noise_1d(time_sec * 0.018 + offset, self.supply_noise_seed_a) * 0.24
            + value_noise_1d(time_sec * 0.007 + offset * 1.7, self.supply_noise_seed_b) * 0.12;

        let lfo_a = (TAU * (time_sec / 65.0 + self.supply_phases[0] + warp * 0.07)).sin();
        let lfo_b = (TAU * (time_sec / 110.0 + self.supply_phases[1] - warp * 0.05)).sin();
        let lfo_c = (TAU * (time_sec / 175.0 + self.supply_phases[2] + warp * 0.035)).sin();

        lfo_a * 0.5 + lfo_b * 0.32 + lfo_c * 0.18
    }

    fn supply(&self, time_sec: f64) -> f64 {
        let normalized = clamp01(self.supply_raw(time_sec) * 0.5 + 0.5);
        let curved = normalized.powf(f64::from(self.profile.supply_exponent));
        SUPPLY_FLOOR + (1.0 - SUPPLY_FLOOR) * curved
    }

    fn supply_trend(&self, time_sec: f64) -> f64 {
        let previous = self.supply((time_sec - TREND_DELTA_SEC).max(0.0));
        let next = self.supply(time_sec + TREND_DELTA_SEC);
        (next - previous) / (TREND_DELTA_SEC * 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse_envelope_shape() {
        let pulse = GustPulse {
            start: 10.0,
            attack: 1.0,
            hold: 2.0,
            decay: 4.0,
            peak: 0.8,
            end: 17.0,
        };
        assert_eq!(pulse.sample(9.9), 0.0);
        assert!(pulse.sample(10.5) > 0.0 && pulse.sample(10.5) < 0.8);
        assert_eq!(pulse.sample(12.0), 0.8);
        assert!(pulse.sample(15.0) < 0.8);
        assert!(pulse.sample(16.99) < 0.01);
        assert_eq!(pulse.sample(17.5), 0.0);
    }

    #[test]
    fn same_seed_same_samples() {
        let mut a = WindSignals::new("dunes-page-v1", StormStyle::Cinematic);
        let mut b = WindSignals::new("dunes-page-v1", StormStyle::Cinematic);
        let mut t = 0.0;
        while t <= 120.0 {
            assert_eq!(a.sample(t), b.sample(t));
            t += 3.0;
        }
    }

    #[test]
    fn different_seed_different_samples() {
        let mut a = WindSignals::new("dunes-page-v1", StormStyle::Cinematic);
        let mut b = WindSignals::new("dunes-page-v2", StormStyle::Cinematic);
        assert_ne!(a.sample(57.2), b.sample(57.2));
    }

    #[test]
    fn pulses_scheduled_ahead_and_pruned() {
        let mut signals = WindSignals::new("prune", StormStyle::Moderate);
        signals.sample(0.0);
        assert!(signals.pulses().iter().any(|p| p.start <= 30.0));

        for t in 0..2000 {
            signals.sample(t as f64);
        }
        let oldest_end = signals.pulses().iter().map(|p| p.end).fold(f64::INFINITY, f64::min);
        assert!(oldest_end > 1000.0);
        assert!(signals.pulses().len() <= PRUNE_THRESHOLD);
    }

    #[test]
    fn calm_boosts_are_neutral() {
        let mut signals = WindSignals::new("calm-check", StormStyle::Ambient);
        for t in 0..600 {
            let s = signals.sample(t as f64);
            if !s.storm_active {
                assert_eq!(s.spawn_boost, 1.0);
                assert_eq!(s.turbulence_boost, 1.0);
                assert_eq!(s.highlight_boost, 0.0);
                assert_eq!(s.near_weight_boost, 1.0);
            } else {
                assert!(s.spawn_boost >= 1.0);
                assert!(s.highlight_boost > 0.0);
            }
        }
    }
}
