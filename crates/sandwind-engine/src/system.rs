//! Runtime system wiring signals, quality, simulation and rasterizer together

use crate::config::RuntimeConfig;
use crate::draw::{draw, DrawInput, DrawSurface};
use crate::quality::{AdaptiveQuality, QualityState};
use crate::settings::SandSettings;
use crate::signals::{WindSample, WindSignals};
use crate::simulation::{SandSimulation, StepInput, StepReport};
use sandwind_core::Result;
use sandwind_runtime::{FrameTick, RuntimeSystem, SurfaceSize};

/// Everything allocated for a running animation
struct EngineState {
    signals: WindSignals,
    quality: AdaptiveQuality,
    simulation: SandSimulation,
    wind: WindSample,
    quality_state: QualityState,
    report: StepReport,
}

impl EngineState {
    fn new(settings: &SandSettings, size: SurfaceSize) -> Self {
        let config = RuntimeConfig::build(
            settings.intensity,
            &settings.seed,
            settings.storm_style,
            size.width,
            size.height,
            size.pixel_ratio,
        );
        let quality = AdaptiveQuality::new(settings.quality);
        let quality_state = QualityState::from_scalar(settings.quality, quality.quality_scalar);

        Self {
            signals: WindSignals::new(&settings.seed, settings.storm_style),
            quality,
            simulation: SandSimulation::new(config),
            wind: WindSample::calm(0.0),
            quality_state,
            report: StepReport::default(),
        }
    }
}

/// The sand wind system: one `update` per animation frame, then `draw`.
///
/// When disabled (for example because the host honours a reduced-motion
/// preference) nothing is allocated and `draw` only clears the surface.
pub struct SandWindSystem {
    settings: SandSettings,
    size: SurfaceSize,
    initialized: bool,
    state: Option<EngineState>,
}

impl SandWindSystem {
    pub fn new(settings: SandSettings) -> Self {
        Self {
            settings,
            size: SurfaceSize::default(),
            initialized: false,
            state: None,
        }
    }

    pub fn settings(&self) -> &SandSettings {
        &self.settings
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    /// Toggle the animation. Disabling releases all buffers; re-enabling
    /// starts a fresh simulation from the same seed.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.settings.enabled == enabled {
            return;
        }
        self.settings.enabled = enabled;

        if !enabled {
            self.state = None;
            log::info!("[sand] Disabled");
        } else if self.initialized {
            self.state = Some(EngineState::new(&self.settings, self.size));
            log::info!("[sand] Enabled");
        }
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn simulation(&self) -> Option<&SandSimulation> {
        self.state.as_ref().map(|s| &s.simulation)
    }

    pub fn wind(&self) -> Option<&WindSample> {
        self.state.as_ref().map(|s| &s.wind)
    }

    pub fn quality(&self) -> Option<&QualityState> {
        self.state.as_ref().map(|s| &s.quality_state)
    }

    pub fn last_report(&self) -> Option<&StepReport> {
        self.state.as_ref().map(|s| &s.report)
    }

    /// Rasterize the current frame
    pub fn draw<S: DrawSurface + ?Sized>(&self, surface: &mut S) {
        match &self.state {
            Some(state) => {
                let input = DrawInput {
                    width: self.size.width,
                    height: self.size.height,
                    wind: state.wind,
                    quality: state.quality_state,
                };
                draw(surface, &state.simulation, &input);
            }
            None => surface.clear_rect(0.0, 0.0, self.size.width, self.size.height),
        }
    }
}

impl RuntimeSystem for SandWindSystem {
    fn initialize(&mut self, size: SurfaceSize) -> Result<()> {
        self.size = size;
        self.initialized = true;

        if !self.settings.enabled {
            log::info!("[sand] Disabled; nothing allocated");
            return Ok(());
        }

        let state = EngineState::new(&self.settings, size);
        log::info!(
            "[sand] {} / {} seed '{}' at {}x{}@{}: {} particles (capacity {})",
            self.settings.intensity,
            self.settings.storm_style,
            self.settings.seed,
            size.width,
            size.height,
            size.pixel_ratio,
            state.simulation.active_count(),
            state.simulation.capacity()
        );
        self.state = Some(state);
        Ok(())
    }

    fn update(&mut self, tick: &FrameTick) -> Result<()> {
        let Some(state) = self.state.as_mut() else {
            return Ok(());
        };

        state.quality_state = state.quality.update(tick.frame_ms);
        state.wind = state.signals.sample(tick.elapsed_sec);
        state.report = state.simulation.step(&StepInput {
            dt_sec: tick.dt_sec,
            elapsed_sec: tick.elapsed_sec,
            wind: state.wind,
            quality: state.quality_state,
        });
        Ok(())
    }

    fn resize(&mut self, size: SurfaceSize) -> Result<()> {
        self.size = size;
        if let Some(state) = self.state.as_mut() {
            state
                .simulation
                .resize(size.width, size.height, size.pixel_ratio);
            log::info!(
                "[sand] Resized to {}x{}@{}",
                size.width,
                size.height,
                size.pixel_ratio
            );
        }
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        self.state = None;
        self.initialized = false;
        Ok(())
    }

    fn name(&self) -> &str {
        "sand"
    }
}
