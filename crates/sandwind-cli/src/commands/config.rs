//! Print the resolved runtime configuration or layered settings

use super::SandArgs;
use anyhow::{bail, Context, Result};
use sandwind_engine::{RuntimeConfig, SandSettings};
use sandwind_runtime::SurfaceSize;

pub struct ConfigArgs {
    pub sand: SandArgs,
    pub width: f32,
    pub height: f32,
    pub pixel_ratio: f32,
    pub settings: bool,
    pub format: String,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    let settings = args.sand.resolve()?;

    let output = if args.settings {
        format_settings(&settings, &args.format)?
    } else {
        let size = SurfaceSize::new(args.width, args.height, args.pixel_ratio);
        let config = RuntimeConfig::build(
            settings.intensity,
            &settings.seed,
            settings.storm_style,
            size.width,
            size.height,
            size.pixel_ratio,
        );
        format_config(&config, &args.format)?
    };
    println!("{output}");
    Ok(())
}

fn format_settings(settings: &SandSettings, format: &str) -> Result<String> {
    Ok(match format {
        "toml" => settings.to_toml().context("Failed to serialize settings")?,
        "json" => serde_json::to_string_pretty(settings)?,
        other => bail!("Unknown format '{other}'. Use 'toml' or 'json'."),
    })
}

fn format_config(config: &RuntimeConfig, format: &str) -> Result<String> {
    Ok(match format {
        "toml" => toml::to_string_pretty(config).context("Failed to serialize config")?,
        "json" => serde_json::to_string_pretty(config)?,
        other => bail!("Unknown format '{other}'. Use 'toml' or 'json'."),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandwind_engine::{Intensity, StormStyle};

    fn config() -> RuntimeConfig {
        RuntimeConfig::build(Intensity::Subtle, "canyon", StormStyle::Moderate, 1280.0, 720.0, 1.5)
    }

    #[test]
    fn test_config_toml_reloads() {
        let config = config();
        let output = format_config(&config, "toml").unwrap();
        let reloaded: RuntimeConfig = toml::from_str(&output).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_config_json_reloads() {
        let config = config();
        let output = format_config(&config, "json").unwrap();
        let reloaded: RuntimeConfig = serde_json::from_str(&output).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_settings_json_reloads() {
        let settings = SandSettings {
            seed: "canyon".into(),
            quality: sandwind_engine::QualityMode::Low,
            ..SandSettings::default()
        };
        let output = format_settings(&settings, "json").unwrap();
        let reloaded: SandSettings = serde_json::from_str(&output).unwrap();
        assert_eq!(reloaded, settings);
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(format_config(&config(), "yaml").is_err());
        assert!(format_settings(&SandSettings::default(), "yaml").is_err());
    }
}
