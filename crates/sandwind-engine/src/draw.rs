//! Rasterizer: turns simulation state into drawing-surface calls
//!
//! The engine only needs a handful of 2D primitives, collected in the
//! [`DrawSurface`] trait. `sandwind-render` implements it over an RGBA
//! pixmap; tests implement it with a call recorder.

use crate::config::LAYER_COUNT;
use crate::quality::QualityState;
use crate::signals::WindSample;
use crate::simulation::{Lifecycle, SandSimulation};
use glam::Vec2;
use sandwind_core::Color;

const STROKE_ALPHA_BY_LAYER: [f32; LAYER_COUNT] = [0.9, 0.72, 0.56];
const DOT_SCALE_BY_LAYER: [f32; LAYER_COUNT] = [1.0, 0.92, 0.84];
const MIN_GLOW_SCALE: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeMode {
    #[default]
    SourceOver,
    /// Additive blending, used for storm glow
    Lighter,
}

/// Minimal immediate-mode 2D surface, in logical (CSS-like) pixels
pub trait DrawSurface {
    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32);
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32);
    fn stroke_line(&mut self, from: Vec2, to: Vec2);
    fn set_fill_color(&mut self, color: Color);
    fn set_stroke_color(&mut self, color: Color);
    fn set_line_width(&mut self, width: f32);
    fn set_line_cap(&mut self, cap: LineCap);
    fn set_global_alpha(&mut self, alpha: f32);
    fn set_composite_mode(&mut self, mode: CompositeMode);
}

#[derive(Debug, Clone, Copy)]
pub struct DrawInput {
    pub width: f32,
    pub height: f32,
    pub wind: WindSample,
    pub quality: QualityState,
}

/// Alpha ramp over the first 8% and last 35% of a particle's life
pub fn life_envelope(age_norm: f32, lifecycle: Lifecycle) -> f32 {
    let early = (age_norm / 0.08).clamp(0.0, 1.0);
    let late = ((1.0 - age_norm) / 0.35).clamp(0.0, 1.0);
    let envelope = (0.24 + 0.76 * early.min(late + 0.25)).clamp(0.2, 1.0);

    if lifecycle == Lifecycle::Retiring {
        envelope * 0.92
    } else {
        envelope
    }
}

/// Draw one frame: clear, then every visible particle back to front
pub fn draw<S: DrawSurface + ?Sized>(surface: &mut S, sim: &SandSimulation, input: &DrawInput) {
    let wind = &input.wind;
    let quality = &input.quality;

    surface.clear_rect(0.0, 0.0, input.width, input.height);
    surface.set_composite_mode(CompositeMode::SourceOver);

    let common_alpha = (0.58 + wind.supply * 0.68)
        * (0.72 + wind.gust * 0.42)
        * (0.88 + quality.detail_scale * 0.22);
    let storm_streak = if wind.storm_active { 1.2 } else { 1.0 };
    let highlight = wind.highlight_boost > 0.0 && quality.glow_scale > MIN_GLOW_SCALE;

    let (xs, ys) = (sim.x(), sim.y());
    let (vxs, vys) = (sim.vx(), sim.vy());

    for layer_index in (0..LAYER_COUNT).rev() {
        let profile = sim.config().layer(layer_index);
        let color = profile.color();
        let dot_scale = DOT_SCALE_BY_LAYER[layer_index];
        let base_threshold = 0.7 + (1.0 - dot_scale) * 0.8;
        let highlight_color = profile.highlight_color(wind.highlight_boost);

        surface.set_fill_color(color);
        surface.set_stroke_color(color);
        surface.set_line_cap(LineCap::Round);

        for i in 0..sim.capacity() {
            let lifecycle = sim.lifecycle()[i];
            if !sim.active()[i]
                || usize::from(sim.layer()[i]) != layer_index
                || lifecycle == Lifecycle::Inactive
            {
                continue;
            }

            let fade = sim.fade()[i].clamp(0.0, 1.0);
            if fade <= 0.0 {
                continue;
            }

            let (x, y) = (xs[i], ys[i]);
            let velocity = Vec2::new(vxs[i], vys[i]);
            let speed = velocity.length();

            let envelope = life_envelope(sim.age_norm()[i], lifecycle);
            let threshold_adjust = if layer_index == 0 {
                ((speed - 28.0) / 90.0).clamp(0.0, 0.16)
            } else {
                0.0
            };
            let threshold = (base_threshold - threshold_adjust).max(0.48);

            let size = sim.size()[i] * (1.0 + wind.supply * 0.08) * dot_scale;
            let alpha = (sim.alpha()[i] * common_alpha * fade * envelope).clamp(0.002, 0.92);

            let streak = (speed * 0.045 * profile.streak_bias * quality.streak_scale * storm_streak)
                .clamp(0.55, 8.0);

            if streak > size * threshold {
                let dir = if speed > 0.0 { velocity / speed } else { velocity };
                let head = Vec2::new(x, y);
                surface.set_global_alpha(alpha * STROKE_ALPHA_BY_LAYER[layer_index]);
                surface.set_line_width((size * 0.78).max(0.35));
                surface.stroke_line(head, head - dir * streak);
            }

            surface.set_global_alpha(alpha);
            surface.fill_rect(x - size * 0.5, y - size * 0.5, size, size);

            if highlight && layer_index == 0 {
                let glow = size * (1.4 + quality.detail_scale * 0.5);
                surface.set_composite_mode(CompositeMode::Lighter);
                surface.set_fill_color(highlight_color);
                surface.set_global_alpha(alpha * wind.highlight_boost * quality.glow_scale);
                surface.fill_rect(x - glow * 0.5, y - glow * 0.5, glow, glow);
                surface.set_fill_color(color);
                surface.set_composite_mode(CompositeMode::SourceOver);
            }
        }
    }

    surface.set_global_alpha(1.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Intensity, RuntimeConfig, StormStyle};
    use crate::quality::QualityMode;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Clear,
        Fill { alpha: f32, color: Color },
        Stroke { alpha: f32, width: f32 },
        FillColor(Color),
        Alpha(f32),
        Composite(CompositeMode),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
        alpha: f32,
        fill: Color,
        width: f32,
    }

    impl DrawSurface for Recorder {
        fn clear_rect(&mut self, _x: f32, _y: f32, _width: f32, _height: f32) {
            self.calls.push(Call::Clear);
        }
        fn fill_rect(&mut self, _x: f32, _y: f32, _width: f32, _height: f32) {
            self.calls.push(Call::Fill {
                alpha: self.alpha,
                color: self.fill,
            });
        }
        fn stroke_line(&mut self, _from: Vec2, _to: Vec2) {
            self.calls.push(Call::Stroke {
                alpha: self.alpha,
                width: self.width,
            });
        }
        fn set_fill_color(&mut self, color: Color) {
            self.fill = color;
            self.calls.push(Call::FillColor(color));
        }
        fn set_stroke_color(&mut self, _color: Color) {}
        fn set_line_width(&mut self, width: f32) {
            self.width = width;
        }
        fn set_line_cap(&mut self, _cap: LineCap) {}
        fn set_global_alpha(&mut self, alpha: f32) {
            self.alpha = alpha;
            self.calls.push(Call::Alpha(alpha));
        }
        fn set_composite_mode(&mut self, mode: CompositeMode) {
            self.calls.push(Call::Composite(mode));
        }
    }

    fn sim() -> SandSimulation {
        SandSimulation::new(RuntimeConfig::build(
            Intensity::Soft,
            "dunes-page-v1",
            StormStyle::Cinematic,
            800.0,
            450.0,
            1.0,
        ))
    }

    fn input(wind: WindSample) -> DrawInput {
        DrawInput {
            width: 800.0,
            height: 450.0,
            wind,
            quality: QualityState::manual(QualityMode::High),
        }
    }

    #[test]
    fn envelope_ramps_at_both_ends() {
        assert!((life_envelope(0.0, Lifecycle::Active) - 0.24).abs() < 1e-6);
        assert!((life_envelope(0.5, Lifecycle::Active) - 1.0).abs() < 1e-6);
        assert!(life_envelope(0.95, Lifecycle::Active) < 0.6);
        assert!(life_envelope(1.0, Lifecycle::Active) >= 0.2);
        let steady = life_envelope(0.5, Lifecycle::Active);
        assert!((life_envelope(0.5, Lifecycle::Retiring) - steady * 0.92).abs() < 1e-6);
    }

    #[test]
    fn frame_starts_with_clear_and_ends_opaque() {
        let sim = sim();
        let mut surface = Recorder::default();
        draw(&mut surface, &sim, &input(WindSample::calm(0.0)));

        assert_eq!(surface.calls[0], Call::Clear);
        assert_eq!(surface.calls[1], Call::Composite(CompositeMode::SourceOver));
        assert_eq!(surface.calls.last(), Some(&Call::Alpha(1.0)));
    }

    #[test]
    fn one_square_per_visible_particle_in_calm() {
        let sim = sim();
        let mut surface = Recorder::default();
        draw(&mut surface, &sim, &input(WindSample::calm(0.0)));

        let fills = surface
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Fill { .. }))
            .count();
        assert_eq!(fills, sim.active_count());

        for call in &surface.calls {
            match call {
                Call::Fill { alpha, .. } => assert!((0.002..=0.92).contains(alpha)),
                Call::Stroke { width, .. } => assert!(*width >= 0.35),
                _ => {}
            }
        }
    }

    #[test]
    fn layers_drawn_far_to_near() {
        let sim = sim();
        let mut surface = Recorder::default();
        draw(&mut surface, &sim, &input(WindSample::calm(0.0)));

        let layer_colors: Vec<Color> = (0..LAYER_COUNT).map(|i| sim.config().layer(i).color()).collect();
        let order: Vec<usize> = surface
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::FillColor(color) => layer_colors.iter().position(|l| l == color),
                _ => None,
            })
            .collect();
        assert_eq!(order, vec![2, 1, 0]);
    }

    #[test]
    fn storm_highlight_adds_near_glow() {
        let sim = sim();
        let mut wind = WindSample::calm(0.0);
        wind.storm_active = true;
        wind.highlight_boost = 0.18;

        let mut surface = Recorder::default();
        draw(&mut surface, &sim, &input(wind));

        let near = sim.config().layer(0);
        let glow = near.highlight_color(0.18);
        let near_count = (0..sim.capacity())
            .filter(|i| sim.active()[*i] && sim.layer()[*i] == 0)
            .count();
        let glows = surface
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Fill { color, .. } if *color == glow))
            .count();
        assert_eq!(glows, near_count);

        // every glow is additive and the mode is restored right after
        for (i, call) in surface.calls.iter().enumerate() {
            if matches!(call, Call::Fill { color, .. } if *color == glow) {
                assert_eq!(surface.calls[i - 3], Call::Composite(CompositeMode::Lighter));
                assert_eq!(surface.calls[i + 2], Call::Composite(CompositeMode::SourceOver));
            }
        }
    }

    #[test]
    fn low_glow_scale_suppresses_highlight() {
        let sim = sim();
        let mut wind = WindSample::calm(0.0);
        wind.storm_active = true;
        wind.highlight_boost = 0.18;
        let mut draw_input = input(wind);
        draw_input.quality = QualityState::from_scalar(QualityMode::Auto, 0.45);

        let mut surface = Recorder::default();
        draw(&mut surface, &sim, &draw_input);

        let fills = surface
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Fill { .. }))
            .count();
        assert_eq!(fills, sim.active_count());
        assert!(!surface.calls.contains(&Call::Composite(CompositeMode::Lighter)));
    }
}
