//! Headless animation-to-PNG render command

use super::SandArgs;
use anyhow::{bail, Context, Result};
use sandwind_core::Color;
use sandwind_engine::SandWindSystem;
use sandwind_render::HeadlessRenderer;
use sandwind_runtime::SurfaceSize;
use std::path::Path;

pub struct RenderArgs {
    pub sand: SandArgs,
    pub output: String,
    pub width: f32,
    pub height: f32,
    pub pixel_ratio: f32,
    pub frames: u32,
    pub frame_ms: f64,
    pub background: String,
}

pub fn run(args: RenderArgs) -> Result<()> {
    let mut settings = args.sand.resolve()?;
    // an explicit render request always animates
    settings.enabled = true;

    let background = parse_background(&args.background)?;
    let size = SurfaceSize::new(args.width, args.height, args.pixel_ratio);
    let renderer = HeadlessRenderer::new(size)
        .with_frame_ms(args.frame_ms)
        .context("Invalid --frame-ms")?
        .with_background(background);

    println!(
        "Rendering {} / {} seed '{}' after {} frames",
        settings.intensity, settings.storm_style, settings.seed, args.frames
    );

    let mut system = SandWindSystem::new(settings);
    let image = renderer
        .render_to_file(&mut system, args.frames, Path::new(&args.output))
        .context(format!("Failed to render to {}", args.output))?;

    if let (Some(sim), Some(wind)) = (system.simulation(), system.wind()) {
        println!(
            "Particles: {} active / {} capacity",
            sim.active_count(),
            sim.capacity()
        );
        println!(
            "Wind: gust {:.2}, supply {:.2}, storm {}",
            wind.gust,
            wind.supply,
            if wind.storm_active { "active" } else { "calm" }
        );
    }
    println!(
        "Rendered {}x{} image to {}",
        image.width(),
        image.height(),
        args.output
    );
    Ok(())
}

fn parse_background(value: &str) -> Result<Option<Color>> {
    if value.eq_ignore_ascii_case("none") || value.eq_ignore_ascii_case("transparent") {
        return Ok(None);
    }
    match Color::parse_hex(value) {
        Some(color) => Ok(Some(color)),
        None => bail!("Invalid --background '{value}': expected #rrggbb or 'none'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_background() {
        assert_eq!(parse_background("none").unwrap(), None);
        assert_eq!(
            parse_background("#ff0000").unwrap(),
            Some(Color::new(1.0, 0.0, 0.0, 1.0))
        );
        assert!(parse_background("sand").is_err());
    }
}
