//! Headless stress run: drive the full system and report statistics

use super::SandArgs;
use anyhow::{bail, Result};
use sandwind_engine::{SandSettings, SandWindSystem};
use sandwind_runtime::{FrameClock, RuntimeSystem, SurfaceSize};
use serde::Serialize;

pub struct SimulateArgs {
    pub sand: SandArgs,
    pub seconds: f64,
    pub frame_ms: f64,
    pub jank_every: u32,
    pub jank_ms: f64,
    pub width: f32,
    pub height: f32,
    pub format: String,
}

#[derive(Debug, Default, Serialize)]
struct SimulationStats {
    frames: u64,
    simulated_sec: f64,
    capacity: usize,
    min_active: usize,
    max_active: usize,
    mean_active: f64,
    final_active: usize,
    largest_drop_per_frame: usize,
    storm_frames: u64,
    storms: usize,
    min_quality: f32,
    final_quality: f32,
    spawned: usize,
    expired: usize,
    out_of_bounds: usize,
    trimmed: usize,
    max_trimmed_per_frame: usize,
    deactivated: usize,
    sanitized: usize,
}

pub fn run(args: SimulateArgs) -> Result<()> {
    if !(args.seconds.is_finite() && args.seconds > 0.0) {
        bail!("--seconds must be a positive number");
    }
    if !(args.frame_ms.is_finite() && args.frame_ms > 0.0) {
        bail!("--frame-ms must be a positive number");
    }

    let mut settings = args.sand.resolve()?;
    settings.enabled = true;
    let stats = simulate(&settings, &args)?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&stats)?),
        "text" => {
            println!(
                "Simulated {:.1}s ({} frames) of {} / {} seed '{}'",
                stats.simulated_sec,
                stats.frames,
                settings.intensity,
                settings.storm_style,
                settings.seed
            );
            println!(
                "Active particles: min {}, max {}, mean {:.1}, final {} (capacity {}, largest drop {}/frame)",
                stats.min_active,
                stats.max_active,
                stats.mean_active,
                stats.final_active,
                stats.capacity,
                stats.largest_drop_per_frame
            );
            println!(
                "Storms: {} ({} frames in storm)",
                stats.storms, stats.storm_frames
            );
            println!(
                "Quality: min {:.2}, final {:.2} ({})",
                stats.min_quality, stats.final_quality, settings.quality
            );
            println!(
                "Lifecycle: {} spawned, {} expired, {} out of bounds, {} trimmed (max {}/frame), {} faded out",
                stats.spawned,
                stats.expired,
                stats.out_of_bounds,
                stats.trimmed,
                stats.max_trimmed_per_frame,
                stats.deactivated
            );
            if stats.sanitized > 0 {
                println!("Sanitized: {} particles with non-finite state", stats.sanitized);
            }
        }
        other => bail!("Unknown format '{other}'. Use 'text' or 'json'."),
    }

    Ok(())
}

fn simulate(settings: &SandSettings, args: &SimulateArgs) -> Result<SimulationStats> {
    let mut system = SandWindSystem::new(settings.clone());
    system.initialize(SurfaceSize::new(args.width, args.height, 1.0))?;

    let mut stats = SimulationStats {
        min_active: usize::MAX,
        min_quality: 1.0,
        ..SimulationStats::default()
    };
    let mut clock = FrameClock::new();
    let mut active_sum = 0.0;
    let mut previous_storm = false;
    let mut previous_active = system.simulation().map_or(0, |sim| sim.active_count());

    while clock.elapsed_sec < args.seconds {
        let jank = args.jank_every > 0 && (clock.frame + 1) % u64::from(args.jank_every) == 0;
        let tick = clock.advance(if jank { args.jank_ms } else { args.frame_ms });
        system.update(&tick)?;

        let (Some(sim), Some(wind), Some(quality), Some(report)) = (
            system.simulation(),
            system.wind(),
            system.quality(),
            system.last_report(),
        ) else {
            break;
        };

        let active = sim.active_count();
        stats.capacity = sim.capacity();
        stats.min_active = stats.min_active.min(active);
        stats.max_active = stats.max_active.max(active);
        stats.final_active = active;
        stats.largest_drop_per_frame = stats
            .largest_drop_per_frame
            .max(previous_active.saturating_sub(active));
        previous_active = active;
        active_sum += active as f64;

        if wind.storm_active {
            stats.storm_frames += 1;
            if !previous_storm {
                stats.storms += 1;
            }
        }
        previous_storm = wind.storm_active;

        stats.min_quality = stats.min_quality.min(quality.quality_scalar);
        stats.final_quality = quality.quality_scalar;

        stats.spawned += report.spawned;
        stats.expired += report.expired;
        stats.out_of_bounds += report.out_of_bounds;
        stats.trimmed += report.trimmed;
        stats.max_trimmed_per_frame = stats.max_trimmed_per_frame.max(report.trimmed);
        stats.deactivated += report.deactivated;
        stats.sanitized += report.sanitized;
    }

    stats.frames = clock.frame;
    stats.simulated_sec = clock.elapsed_sec;
    if stats.frames > 0 {
        stats.mean_active = active_sum / stats.frames as f64;
    } else {
        stats.min_active = 0;
    }
    system.shutdown()?;
    Ok(stats)
}
