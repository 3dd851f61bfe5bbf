//! Structure-of-arrays sand particle simulation
//!
//! Every slot in the fixed-capacity buffers is in one of three lifecycle
//! states. A slot is spawned into [`Lifecycle::Active`] at zero fade and
//! fades in; ageing out, leaving the surface or being trimmed moves it to
//! [`Lifecycle::Retiring`], where it fades out and is only then returned to
//! [`Lifecycle::Inactive`]. Nothing visible is ever removed in one step.
//!
//! Freed slots per step are capped by the same budget as trimming, so the
//! active count never falls faster than [`SandSimulation::trim_budget`].
//! Slots that finish fading beyond the cap stay invisible and are freed on
//! a later step.

use crate::config::{RuntimeConfig, LAYER_COUNT};
use crate::noise::{sample_flow_vector, value_noise_1d};
use crate::quality::QualityState;
use crate::rand::SeededRng;
use crate::signals::WindSample;

/// Longest step the integrator accepts (seconds)
pub const MAX_STEP_SEC: f32 = 1.0 / 30.0;

const INITIAL_FILL_RATIO: f32 = 0.72;
const TARGET_FLOOR_RATIO: f32 = 0.26;
const TARGET_SMOOTHING_RATE: f32 = 1.8;
const TRIM_RATE_PER_FRAME: f32 = 0.01;
const AGE_TIE_EPSILON: f32 = 1e-6;
const HEADING_NOISE_SALT: u32 = 0x6d2b_79f5;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifecycle {
    #[default]
    Inactive = 0,
    Active = 1,
    Retiring = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetireReason {
    TrimExcess,
    OutOfBounds,
    Expired,
}

/// Per-step input supplied by the host loop
#[derive(Debug, Clone, Copy)]
pub struct StepInput {
    pub dt_sec: f64,
    pub elapsed_sec: f64,
    pub wind: WindSample,
    pub quality: QualityState,
}

/// Lifecycle traffic produced by one [`SandSimulation::step`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    pub spawned: usize,
    pub trimmed: usize,
    pub trim_budget: usize,
    pub expired: usize,
    pub out_of_bounds: usize,
    /// Slots freed after fading out (at most `trim_budget`)
    pub deactivated: usize,
    /// Faded-out slots waiting for a later step's budget
    pub held: usize,
    pub sanitized: usize,
}

impl StepReport {
    pub fn retired(&self) -> usize {
        self.trimmed + self.expired + self.out_of_bounds
    }
}

pub struct SandSimulation {
    config: RuntimeConfig,
    capacity: usize,
    active_count: usize,
    width: f32,
    height: f32,
    pixel_ratio: f32,

    x: Vec<f32>,
    y: Vec<f32>,
    vx: Vec<f32>,
    vy: Vec<f32>,
    life: Vec<f32>,
    ttl: Vec<f32>,
    size: Vec<f32>,
    alpha: Vec<f32>,
    layer: Vec<u8>,
    active: Vec<bool>,
    lifecycle: Vec<Lifecycle>,
    fade: Vec<f32>,
    fade_rate: Vec<f32>,
    age_norm: Vec<f32>,

    spawn_cursor: usize,
    target_active_smoothed: f32,
    rng: SeededRng,
}

impl SandSimulation {
    /// Allocate buffers for `config.capacity` slots and scatter the initial
    /// population across the surface so the first frame isn't empty.
    pub fn new(config: RuntimeConfig) -> Self {
        let capacity = config.capacity;
        let rng = SeededRng::new(&config.rng_key("particles"));

        let mut sim = Self {
            capacity,
            active_count: 0,
            width: config.width,
            height: config.height,
            pixel_ratio: config.pixel_ratio,
            x: vec![0.0; capacity],
            y: vec![0.0; capacity],
            vx: vec![0.0; capacity],
            vy: vec![0.0; capacity],
            life: vec![0.0; capacity],
            ttl: vec![1.0; capacity],
            size: vec![0.0; capacity],
            alpha: vec![0.0; capacity],
            layer: vec![0; capacity],
            active: vec![false; capacity],
            lifecycle: vec![Lifecycle::Inactive; capacity],
            fade: vec![0.0; capacity],
            fade_rate: vec![0.0; capacity],
            age_norm: vec![0.0; capacity],
            spawn_cursor: 0,
            target_active_smoothed: 0.0,
            rng,
            config,
        };

        let initial = ((sim.config.total_base_count as f32 * INITIAL_FILL_RATIO).round() as usize)
            .min(capacity);
        let neutral = WindSample::calm(0.0);
        for i in 0..initial {
            let layer = sim.pick_layer(&neutral);
            sim.spawn(i, layer, &neutral, 1.0, 0.0, true);
        }

        sim.spawn_cursor = if capacity > 0 { initial % capacity } else { 0 };
        sim.target_active_smoothed = sim.active_count as f32;
        sim
    }

    /// Update surface dimensions. Live particles keep their state.
    pub fn resize(&mut self, width: f32, height: f32, pixel_ratio: f32) {
        self.config.resize(width, height, pixel_ratio);
        self.width = self.config.width;
        self.height = self.config.height;
        self.pixel_ratio = self.config.pixel_ratio;
    }

    /// Per-step trim cap: about 1% of capacity per 60 Hz frame, at least one
    pub fn trim_budget(&self, dt_sec: f32) -> usize {
        let dt = dt_sec.clamp(0.0, MAX_STEP_SEC);
        ((self.capacity as f32 * TRIM_RATE_PER_FRAME * dt * 60.0).floor() as usize).max(1)
    }

    /// Advance the simulation by one frame
    pub fn step(&mut self, input: &StepInput) -> StepReport {
        let mut report = StepReport::default();

        let dt = (input.dt_sec as f32).clamp(0.0, MAX_STEP_SEC);
        if dt.is_nan() || dt <= 0.0 {
            return report;
        }

        let wind = &input.wind;
        let heading = self.heading(input.elapsed_sec);
        let (heading_sin, heading_cos) = heading.sin_cos();

        let margin = self.spawn_margin();
        let target_raw = self.target_active_count(wind, &input.quality);
        self.target_active_smoothed += (target_raw as f32 - self.target_active_smoothed)
            * (dt * TARGET_SMOOTHING_RATE).clamp(0.0, 1.0);
        let target_smoothed =
            (self.target_active_smoothed.round().max(0.0) as usize).min(self.capacity);

        let gust = wind.gust;
        let supply = wind.supply;
        let supply_speed = 0.72 + supply * 0.85;
        let response_rate = 2.4 + gust * 0.35;
        let settle_reduction = ((gust - 1.0) * 0.42).clamp(0.0, 0.78);
        let height_safe = self.height.max(1.0);
        let release_budget = self.trim_budget(dt);

        for i in 0..self.capacity {
            if !self.active[i] {
                continue;
            }

            let layer_index = usize::from(self.layer[i]).min(LAYER_COUNT - 1);
            let profile = self.config.layer(layer_index);

            let flow = sample_flow_vector(
                f64::from(self.x[i]),
                f64::from(self.y[i]),
                input.elapsed_sec,
                self.config.noise_seed,
                f64::from(self.config.flow_scale),
                f64::from(self.config.flow_time_scale),
            );

            let target_speed = (self.config.base_wind_speed + profile.base_speed) * gust * supply_speed;
            let turbulence = profile.turbulence
                * (0.55 + supply * 0.95)
                * wind.turbulence_boost
                * (0.82 + gust * 0.28);

            let advection_x = heading_cos * target_speed + flow.x * turbulence;
            let advection_y = heading_sin * target_speed + flow.y * turbulence * 0.84;

            let shear_x = target_speed * self.config.shear_strength * (self.y[i] / height_safe - 0.5);
            let settle = self.config.settle_base
                * self.config.settle_by_layer[layer_index]
                * (1.0 - settle_reduction);

            let ax = (advection_x - self.vx[i]) * response_rate + shear_x;
            let ay = (advection_y - self.vy[i]) * response_rate + settle;
            self.vx[i] += ax * dt;
            self.vy[i] += ay * dt;

            let speed = self.vx[i].hypot(self.vy[i]);
            let drag = self.config.drag_base * self.config.drag_by_layer[layer_index] * (0.48 + speed * 0.022);
            let damping = (1.0 - drag * dt).max(0.0);
            self.vx[i] *= damping;
            self.vy[i] *= damping;

            self.x[i] += self.vx[i] * dt;
            self.y[i] += self.vy[i] * dt;

            self.life[i] += dt;
            self.age_norm[i] = (self.life[i] / self.ttl[i].max(0.001)).clamp(0.0, 1.0);

            if self.fade_rate[i] != 0.0 {
                self.fade[i] = (self.fade[i] + self.fade_rate[i] * dt).clamp(0.0, 1.0);
                match self.lifecycle[i] {
                    Lifecycle::Active if self.fade[i] >= 1.0 => {
                        self.fade[i] = 1.0;
                        self.fade_rate[i] = 0.0;
                    }
                    Lifecycle::Retiring if self.fade[i] <= 0.0 => {
                        if report.deactivated < release_budget {
                            self.deactivate(i);
                            report.deactivated += 1;
                            continue;
                        }
                        report.held += 1;
                    }
                    _ => {}
                }
            }

            if !self.is_finite(i) {
                log::warn!(
                    "deactivating particle {i}: non-finite state ({}, {}, {}, {})",
                    self.x[i],
                    self.y[i],
                    self.vx[i],
                    self.vy[i]
                );
                self.deactivate(i);
                report.sanitized += 1;
                continue;
            }

            if self.lifecycle[i] != Lifecycle::Active {
                continue;
            }

            let out_of_bounds = self.x[i] < -margin
                || self.x[i] > self.width + margin
                || self.y[i] < -margin
                || self.y[i] > self.height + margin;

            if out_of_bounds {
                self.retire(i, RetireReason::OutOfBounds);
                report.out_of_bounds += 1;
            } else if self.life[i] >= self.ttl[i] {
                self.retire(i, RetireReason::Expired);
                report.expired += 1;
            }
        }

        report.trim_budget = release_budget;
        if self.active_count > target_smoothed {
            let excess = (self.active_count - target_smoothed).min(report.trim_budget);
            report.trimmed = self.retire_oldest(excess);
        }

        let spawn_rate = self.config.total_base_count as f32
            * (0.55 + supply * 1.2)
            * wind.spawn_boost
            * input.quality.spawn_scale;
        let spawn_budget = ((spawn_rate * dt).floor() as usize).max(1);
        let spawn_target = target_raw.min(self.active_count + spawn_budget);

        while self.active_count < spawn_target {
            let Some(slot) = self.allocate_slot() else {
                break;
            };
            let layer = self.pick_layer(wind);
            self.spawn(slot, layer, wind, heading_cos, heading_sin, false);
            report.spawned += 1;
        }

        report
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    pub fn target_active_smoothed(&self) -> f32 {
        self.target_active_smoothed
    }

    pub fn x(&self) -> &[f32] {
        &self.x
    }

    pub fn y(&self) -> &[f32] {
        &self.y
    }

    pub fn vx(&self) -> &[f32] {
        &self.vx
    }

    pub fn vy(&self) -> &[f32] {
        &self.vy
    }

    pub fn life(&self) -> &[f32] {
        &self.life
    }

    pub fn ttl(&self) -> &[f32] {
        &self.ttl
    }

    pub fn size(&self) -> &[f32] {
        &self.size
    }

    pub fn alpha(&self) -> &[f32] {
        &self.alpha
    }

    pub fn layer(&self) -> &[u8] {
        &self.layer
    }

    pub fn active(&self) -> &[bool] {
        &self.active
    }

    pub fn lifecycle(&self) -> &[Lifecycle] {
        &self.lifecycle
    }

    pub fn fade(&self) -> &[f32] {
        &self.fade
    }

    pub fn fade_rate(&self) -> &[f32] {
        &self.fade_rate
    }

    pub fn age_norm(&self) -> &[f32] {
        &self.age_norm
    }

    /// Number of slots currently fading out
    pub fn retiring_count(&self) -> usize {
        self.lifecycle
            .iter()
            .filter(|l| **l == Lifecycle::Retiring)
            .count()
    }

    fn spawn_margin(&self) -> f32 {
        self.config.spawn_margin_base + self.width.max(self.height) * 0.18
    }

    fn heading(&self, elapsed_sec: f64) -> f32 {
        let drift = value_noise_1d(
            elapsed_sec * 0.03 + self.config.heading_noise_offset * 12.0,
            self.config.noise_seed ^ HEADING_NOISE_SALT,
        );
        self.config.base_wind_direction + drift as f32 * self.config.heading_drift
    }

    fn target_active_count(&self, wind: &WindSample, quality: &QualityState) -> usize {
        let base = self.config.total_base_count as f32 * quality.particle_scale;
        let target = (base * (0.42 + wind.supply * 0.95) * wind.spawn_boost).round();
        let floor = (base * TARGET_FLOOR_RATIO).round();
        let capacity = self.capacity as f32;

        target.max(floor).min(capacity).max(0.0) as usize
    }

    fn pick_layer(&mut self, wind: &WindSample) -> usize {
        let weights: [f32; LAYER_COUNT] = [
            self.config.layer(0).spawn_weight * wind.near_weight_boost,
            self.config.layer(1).spawn_weight,
            self.config.layer(2).spawn_weight,
        ];
        self.rng.pick_weighted(&weights)
    }

    /// Round-robin search for a free slot starting at the spawn cursor
    fn allocate_slot(&mut self) -> Option<usize> {
        for step in 0..self.capacity {
            let index = (self.spawn_cursor + step) % self.capacity;
            if !self.active[index] {
                self.spawn_cursor = (index + 1) % self.capacity;
                return Some(index);
            }
        }
        None
    }

    fn spawn(
        &mut self,
        index: usize,
        layer_index: usize,
        wind: &WindSample,
        heading_cos: f32,
        heading_sin: f32,
        initial_fill: bool,
    ) {
        let profile = self.config.layer(layer_index).clone();
        let margin = self.spawn_margin();

        if !self.active[index] {
            self.active_count += 1;
        }
        self.layer[index] = layer_index as u8;
        self.active[index] = true;
        self.lifecycle[index] = Lifecycle::Active;

        self.place(index, heading_cos, heading_sin, margin, initial_fill);

        let size_scale = 1.0 + wind.supply * 0.12 + if wind.storm_active { 0.08 } else { 0.0 };
        self.size[index] = self.rng.range_f32(profile.size_min, profile.size_max) * size_scale;

        let storm_lift = if wind.storm_active {
            0.06 + wind.highlight_boost * 0.5
        } else {
            0.0
        };
        self.alpha[index] = (self.rng.range_f32(profile.alpha_min, profile.alpha_max)
            * (0.65 + wind.supply * 0.45 + storm_lift))
            .clamp(0.03, 0.98);

        self.ttl[index] = self.rng.range_f32(profile.ttl_min, profile.ttl_max);
        self.life[index] = if initial_fill {
            self.rng.range_f32(0.0, self.ttl[index])
        } else {
            0.0
        };
        self.age_norm[index] = (self.life[index] / self.ttl[index].max(0.001)).clamp(0.0, 1.0);

        if initial_fill {
            self.vx[index] = self.rng.range_f32(-2.0, 2.0);
            self.vy[index] = self.rng.range_f32(-1.8, 1.8);
            self.fade[index] = 1.0;
            self.fade_rate[index] = 0.0;
            return;
        }

        let speed = profile.base_speed * (0.7 + wind.gust * 0.35);
        self.vx[index] = heading_cos * speed;
        self.vy[index] = heading_sin * speed;

        let fade_in = self
            .rng
            .range_f32(self.config.fade_in_sec_min, self.config.fade_in_sec_max);
        self.fade[index] = 0.0;
        self.fade_rate[index] = 1.0 / fade_in.max(0.001);
    }

    /// Initial fill scatters over the whole surface; regular spawns enter
    /// just outside the upwind edge of the dominant heading axis.
    fn place(&mut self, index: usize, heading_cos: f32, heading_sin: f32, margin: f32, initial_fill: bool) {
        let (w, h) = (self.width, self.height);

        if initial_fill {
            self.x[index] = self.rng.range_f32(-margin, w + margin);
            self.y[index] = self.rng.range_f32(-margin, h + margin);
            return;
        }

        if heading_cos.abs() >= heading_sin.abs() {
            self.x[index] = if heading_cos >= 0.0 {
                self.rng.range_f32(-margin, -margin * 0.15)
            } else {
                self.rng.range_f32(w + margin * 0.15, w + margin)
            };
            self.y[index] = self.rng.range_f32(-margin, h + margin);
        } else {
            self.y[index] = if heading_sin >= 0.0 {
                self.rng.range_f32(-margin, -margin * 0.15)
            } else {
                self.rng.range_f32(h + margin * 0.15, h + margin)
            };
            self.x[index] = self.rng.range_f32(-margin, w + margin);
        }
    }

    fn retire(&mut self, index: usize, reason: RetireReason) {
        if !self.active[index] || self.lifecycle[index] == Lifecycle::Retiring {
            return;
        }

        let (min, max) = match reason {
            RetireReason::OutOfBounds => (
                self.config.fade_out_sec_min * 0.9,
                self.config.fade_out_sec_max * 0.95,
            ),
            RetireReason::TrimExcess | RetireReason::Expired => {
                (self.config.fade_out_sec_min, self.config.fade_out_sec_max)
            }
        };
        let fade_out = self.rng.range_f32(min, max);

        self.lifecycle[index] = Lifecycle::Retiring;
        self.fade_rate[index] = -1.0 / fade_out.max(0.001);
    }

    /// Retire up to `count` Active slots: oldest normalised age first, then
    /// farther layer, then scan order from the spawn cursor.
    fn retire_oldest(&mut self, count: usize) -> usize {
        let count = count.min(self.active_count);
        let mut selected: Vec<usize> = Vec::with_capacity(count);

        for _ in 0..count {
            let mut best: Option<(usize, f32, u8)> = None;

            for step in 0..self.capacity {
                let index = (self.spawn_cursor + step) % self.capacity;
                if !self.active[index]
                    || self.lifecycle[index] != Lifecycle::Active
                    || selected.contains(&index)
                {
                    continue;
                }

                let age = self.life[index] / self.ttl[index].max(0.001);
                let layer = self.layer[index];
                let better = match best {
                    None => true,
                    Some((_, best_age, best_layer)) => {
                        age > best_age + AGE_TIE_EPSILON
                            || ((age - best_age).abs() <= AGE_TIE_EPSILON && layer > best_layer)
                    }
                };
                if better {
                    best = Some((index, age, layer));
                }
            }

            match best {
                Some((index, _, _)) => selected.push(index),
                None => break,
            }
        }

        for &index in &selected {
            self.retire(index, RetireReason::TrimExcess);
        }
        selected.len()
    }

    fn deactivate(&mut self, index: usize) {
        if self.active[index] {
            self.active_count = self.active_count.saturating_sub(1);
        }
        self.active[index] = false;
        self.lifecycle[index] = Lifecycle::Inactive;
        self.fade[index] = 0.0;
        self.fade_rate[index] = 0.0;
        self.age_norm[index] = 0.0;
        self.life[index] = 0.0;
        self.ttl[index] = 1.0;
    }

    fn is_finite(&self, index: usize) -> bool {
        self.x[index].is_finite()
            && self.y[index].is_finite()
            && self.vx[index].is_finite()
            && self.vy[index].is_finite()
    }
}
