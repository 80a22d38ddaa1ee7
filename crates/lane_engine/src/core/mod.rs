//! # Core Engine Module
//!
//! Shared settings used by the engine loop and the applications it drives.

pub mod config;

pub use config::{Config, ConfigError, EngineConfig};
