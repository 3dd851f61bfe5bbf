//! Dump wind signal samples and a storm summary

use super::SandArgs;
use anyhow::{bail, Result};
use sandwind_engine::{WindSample, WindSignals};
use serde::Serialize;

/// The generator is advanced at display rate so storm transitions match
/// what an animation would see, even when printing sparsely
const SAMPLE_RATE_HZ: f64 = 60.0;

pub struct SignalsArgs {
    pub sand: SandArgs,
    pub duration: f64,
    pub step: f64,
    pub format: String,
}

#[derive(Debug, Default, Serialize)]
struct StormSummary {
    duration_sec: f64,
    storms: usize,
    storm_sec: f64,
    longest_storm_sec: f64,
    max_gust: f32,
    min_supply: f32,
    max_supply: f32,
}

#[derive(Serialize)]
struct SignalsReport {
    seed: String,
    storm_style: String,
    samples: Vec<WindSample>,
    summary: StormSummary,
}

pub fn run(args: SignalsArgs) -> Result<()> {
    if !(args.duration.is_finite() && args.duration > 0.0) {
        bail!("--duration must be a positive number of seconds");
    }
    if !(args.step.is_finite() && args.step > 0.0) {
        bail!("--step must be a positive number of seconds");
    }

    let settings = args.sand.resolve()?;
    let mut signals = WindSignals::new(&settings.seed, settings.storm_style);
    let (samples, summary) = collect(&mut signals, args.duration, args.step);

    match args.format.as_str() {
        "json" => {
            let report = SignalsReport {
                seed: settings.seed.clone(),
                storm_style: settings.storm_style.to_string(),
                samples,
                summary,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "text" => {
            println!(
                "Wind signals for seed '{}' ({}), {:.0}s",
                settings.seed, settings.storm_style, args.duration
            );
            println!(
                "{:>8}  {:>5}  {:>6}  {:>7}  {:>5}  {:>5}  {:>5}",
                "time", "gust", "supply", "trend", "storm", "level", "pulse"
            );
            for s in &samples {
                println!(
                    "{:>7.1}s  {:>5.2}  {:>6.3}  {:>+7.4}  {:>5}  {:>5.2}  {:>5}",
                    s.time_sec,
                    s.gust,
                    s.supply,
                    s.supply_trend,
                    if s.storm_active { "yes" } else { "-" },
                    s.storm_level,
                    if s.gust_pulse_active { "yes" } else { "-" }
                );
            }
            println!();
            println!(
                "Storms: {} ({:.1}s total, longest {:.1}s)",
                summary.storms, summary.storm_sec, summary.longest_storm_sec
            );
            println!(
                "Supply: {:.3}..{:.3}, max gust {:.2}",
                summary.min_supply, summary.max_supply, summary.max_gust
            );
        }
        other => bail!("Unknown format '{other}'. Use 'text' or 'json'."),
    }

    Ok(())
}

fn collect(signals: &mut WindSignals, duration: f64, step: f64) -> (Vec<WindSample>, StormSummary) {
    let dt = 1.0 / SAMPLE_RATE_HZ;
    let total = (duration * SAMPLE_RATE_HZ).ceil() as u64;

    let mut printed = Vec::new();
    let mut next_print = 0.0;
    let mut summary = StormSummary {
        duration_sec: duration,
        min_supply: f32::INFINITY,
        ..StormSummary::default()
    };
    let mut previous_storm = false;
    let mut current_storm_sec = 0.0;

    for frame in 0..=total {
        let t = (frame as f64 * dt).min(duration);
        let sample = signals.sample(t);

        summary.max_gust = summary.max_gust.max(sample.gust);
        summary.min_supply = summary.min_supply.min(sample.supply);
        summary.max_supply = summary.max_supply.max(sample.supply);

        if sample.storm_active {
            if !previous_storm {
                summary.storms += 1;
                current_storm_sec = 0.0;
            }
            if frame > 0 {
                summary.storm_sec += dt;
                current_storm_sec += dt;
            }
            summary.longest_storm_sec = summary.longest_storm_sec.max(current_storm_sec);
        }
        previous_storm = sample.storm_active;

        if t + 1e-9 >= next_print {
            printed.push(sample);
            next_print += step;
        }
    }

    (printed, summary)
}
