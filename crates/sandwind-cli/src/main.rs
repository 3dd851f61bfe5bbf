//! SandWind CLI - Command-line interface for the SandWind engine

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{config, render, signals, simulate, SandArgs};

#[derive(Parser)]
#[command(name = "sandwind")]
#[command(about = "Procedural wind-blown sand for ambient backgrounds", long_about = None)]
#[command(version)]
struct Cli {
    /// Log engine diagnostics (storm transitions, quality drops) to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a frame of the animation to a PNG image (headless)
    Render {
        #[command(flatten)]
        sand: SandArgs,

        /// Output image path
        #[arg(long, short, default_value = "sandwind.png")]
        output: String,

        /// Surface width in logical pixels
        #[arg(long, default_value = "1280")]
        width: f32,

        /// Surface height in logical pixels
        #[arg(long, default_value = "720")]
        height: f32,

        /// Device pixel ratio (clamped to 2)
        #[arg(long, default_value = "1")]
        pixel_ratio: f32,

        /// Number of frames to simulate before capturing
        #[arg(long, default_value = "180")]
        frames: u32,

        /// Duration of each simulated frame in milliseconds
        #[arg(long, default_value = "16.667")]
        frame_ms: f64,

        /// Background colour as hex (e.g. "#1a1410"); "none" keeps transparency
        #[arg(long, default_value = "#1a1410")]
        background: String,
    },

    /// Sample the wind signal generator over time
    Signals {
        #[command(flatten)]
        sand: SandArgs,

        /// Seconds to sample
        #[arg(long, default_value = "900")]
        duration: f64,

        /// Seconds between printed samples
        #[arg(long, default_value = "5")]
        step: f64,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Print the resolved runtime configuration
    Config {
        #[command(flatten)]
        sand: SandArgs,

        /// Surface width in logical pixels
        #[arg(long, default_value = "1280")]
        width: f32,

        /// Surface height in logical pixels
        #[arg(long, default_value = "720")]
        height: f32,

        /// Device pixel ratio (clamped to 2)
        #[arg(long, default_value = "1")]
        pixel_ratio: f32,

        /// Print the layered settings instead of the runtime config
        #[arg(long)]
        settings: bool,

        /// Output format (toml or json)
        #[arg(long, default_value = "toml")]
        format: String,
    },

    /// Run the simulation headless and report population, storm and quality stats
    Simulate {
        #[command(flatten)]
        sand: SandArgs,

        /// Simulated seconds
        #[arg(long, default_value = "120")]
        seconds: f64,

        /// Duration of a normal frame in milliseconds
        #[arg(long, default_value = "16.667")]
        frame_ms: f64,

        /// Every N frames, inject a slow frame (0 disables)
        #[arg(long, default_value = "0")]
        jank_every: u32,

        /// Duration of an injected slow frame in milliseconds
        #[arg(long, default_value = "45")]
        jank_ms: f64,

        /// Surface width in logical pixels
        #[arg(long, default_value = "1280")]
        width: f32,

        /// Surface height in logical pixels
        #[arg(long, default_value = "720")]
        height: f32,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Render {
            sand,
            output,
            width,
            height,
            pixel_ratio,
            frames,
            frame_ms,
            background,
        } => render::run(render::RenderArgs {
            sand,
            output,
            width,
            height,
            pixel_ratio,
            frames,
            frame_ms,
            background,
        }),
        Commands::Signals {
            sand,
            duration,
            step,
            format,
        } => signals::run(signals::SignalsArgs {
            sand,
            duration,
            step,
            format,
        }),
        Commands::Config {
            sand,
            width,
            height,
            pixel_ratio,
            settings,
            format,
        } => config::run(config::ConfigArgs {
            sand,
            width,
            height,
            pixel_ratio,
            settings,
            format,
        }),
        Commands::Simulate {
            sand,
            seconds,
            frame_ms,
            jank_every,
            jank_ms,
            width,
            height,
            format,
        } => simulate::run(simulate::SimulateArgs {
            sand,
            seconds,
            frame_ms,
            jank_every,
            jank_ms,
            width,
            height,
            format,
        }),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .init();
}
