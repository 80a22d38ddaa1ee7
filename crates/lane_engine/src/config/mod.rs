//! Configuration system
//!
//! Settings structs implement [`Config`] to be read from and written to TOML
//! or RON files, picked by file extension. Loading runs [`Config::validate`]
//! so a bad file is rejected before anything is built from it.

pub use serde::{Deserialize, Serialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Check cross-field constraints after parsing
    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Parse and validate TOML text
    fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate RON text
    fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;

        if path.ends_with(".toml") {
            Self::from_toml_str(&contents)
        } else if path.ends_with(".ron") {
            Self::from_ron_str(&contents)
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Parsed but violates a constraint
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Limits {
        low: u32,
        high: u32,
    }

    impl Config for Limits {
        fn validate(&self) -> Result<(), ConfigError> {
            if self.low > self.high {
                return Err(ConfigError::Invalid(format!(
                    "low ({}) exceeds high ({})",
                    self.low, self.high
                )));
            }
            Ok(())
        }
    }

    #[test]
    fn test_toml_and_ron_parse_the_same_settings() {
        let from_toml = Limits::from_toml_str("low = 1\nhigh = 3\n").expect("valid toml");
        let from_ron = Limits::from_ron_str("(low: 1, high: 3)").expect("valid ron");
        assert_eq!(from_toml, from_ron);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let limits = Limits::from_toml_str("high = 4").expect("valid toml");
        assert_eq!(limits, Limits { low: 0, high: 4 });
    }

    #[test]
    fn test_validation_runs_on_load() {
        let err = Limits::from_toml_str("low = 5\nhigh = 1").expect_err("low > high");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = Limits::load_from_file("settings.ini").expect_err("unknown format");
        // The file doesn't exist either; reading fails first
        assert!(matches!(err, ConfigError::Io(_)));

        let err = Limits::default().save_to_file("settings.ini").expect_err("unknown format");
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_save_then_load_file() {
        let path = std::env::temp_dir().join(format!("lane_engine_limits_{}.ron", std::process::id()));
        let path = path.to_string_lossy().into_owned();
        let limits = Limits { low: 2, high: 9 };
        limits.save_to_file(&path).expect("writable temp dir");
        let loaded = Limits::load_from_file(&path).expect("just written");
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, limits);
    }
}
