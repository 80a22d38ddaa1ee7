//! # Engine Configuration
//!
//! Settings that control the main loop itself: logging, the simulated
//! timestep, the random seed and an optional frame limit for headless runs.
//! Game-specific settings embed [`EngineConfig`] and implement
//! [`Config`] at their own top level.

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};

/// # Engine Configuration
///
/// Core engine behavior shared by every application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log level used when `RUST_LOG` is unset
    pub log_level: String,
    /// Seed for the engine random source; `None` seeds from the OS
    pub seed: Option<u64>,
    /// Simulated seconds per frame
    pub fixed_timestep: f64,
    /// Stop after this many frames; `None` runs until the application quits
    pub max_frames: Option<u64>,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            seed: None,
            fixed_timestep: 1.0 / 60.0,
            max_frames: None,
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Use a fixed random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the simulated timestep
    pub fn with_fixed_timestep(mut self, seconds: f64) -> Self {
        self.fixed_timestep = seconds;
        self
    }

    /// Stop after a number of frames
    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fixed_timestep.is_finite() && self.fixed_timestep > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "fixed_timestep must be positive, got {}",
                self.fixed_timestep
            )));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for EngineConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        EngineConfig::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.log_level, "info");
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_timestep() {
        assert!(EngineConfig::new().with_fixed_timestep(0.0).validate().is_err());
        assert!(EngineConfig::new().with_fixed_timestep(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let config = EngineConfig::from_toml_str("seed = 42\nmax_frames = 600").expect("valid");
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.max_frames, Some(600));
        assert_eq!(config.log_level, "info");
    }
}
