//! Error types for SandWind

use thiserror::Error;

/// The main error type for SandWind operations
#[derive(Debug, Error)]
pub enum SandError {
    #[error("Invalid enum value: {value} is not one of {allowed:?}")]
    InvalidEnumValue {
        value: String,
        allowed: Vec<String>,
    },

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("TOML serialization error: {0}")]
    TomlSerError(String),
}

impl SandError {
    /// Build an `InvalidEnumValue` from the offending value and the accepted names
    pub fn invalid_enum(value: &str, allowed: &[&str]) -> Self {
        SandError::InvalidEnumValue {
            value: value.to_string(),
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Result type alias for SandWind operations
pub type Result<T> = std::result::Result<T, SandError>;

impl From<toml::de::Error> for SandError {
    fn from(err: toml::de::Error) -> Self {
        SandError::TomlParseError(err.to_string())
    }
}

impl From<toml::ser::Error> for SandError {
    fn from(err: toml::ser::Error) -> Self {
        SandError::TomlSerError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_enum_lists_allowed_values() {
        let err = SandError::invalid_enum("gale", &["ambient", "moderate", "cinematic"]);
        let msg = err.to_string();
        assert!(msg.contains("gale"));
        assert!(msg.contains("cinematic"));
    }

    #[test]
    fn toml_errors_convert() {
        let parse: std::result::Result<toml::Value, _> = toml::from_str("seed = ");
        let err: SandError = parse.unwrap_err().into();
        assert!(matches!(err, SandError::TomlParseError(_)));
    }
}
