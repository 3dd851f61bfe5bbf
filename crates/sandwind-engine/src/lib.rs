//! SandWind Engine - Procedural wind-blown sand
//!
//! An ambient field of sand grains drifting across one rectangular surface:
//! - Seeded RNG and value noise with a divergence-free flow field
//! - Intensity presets resolved into a per-surface runtime config
//! - Gust/supply wind signals with a hysteretic storm state machine
//! - Adaptive quality driven by measured frame times
//! - Structure-of-arrays particle simulation with fade-in/fade-out lifecycle
//! - Rasterizer onto any [`DrawSurface`]
//!
//! Everything is single-threaded and deterministic for a given seed and
//! sequence of frame timings.

pub mod config;
pub mod curves;
pub mod draw;
pub mod noise;
pub mod quality;
pub mod rand;
pub mod settings;
pub mod signals;
pub mod simulation;
pub mod system;

pub use config::{Intensity, LayerProfile, LayerRole, RuntimeConfig, StormProfile, StormStyle, LAYER_COUNT};
pub use draw::{draw, CompositeMode, DrawInput, DrawSurface, LineCap};
pub use quality::{AdaptiveQuality, QualityMode, QualityState};
pub use settings::SandSettings;
pub use signals::{GustPulse, WindSample, WindSignals};
pub use simulation::{Lifecycle, SandSimulation, StepInput, StepReport};
pub use system::SandWindSystem;
