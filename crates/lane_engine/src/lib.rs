//! # Lane Engine
//!
//! A small headless game engine for streaming worlds: an entity store with
//! explicit activation state, variant-keyed object pools, a cooperative
//! scheduler over simulated time and a fixed-step main loop.
//!
//! ## Features
//!
//! - **Entity World**: Generation-checked handles, parent links and named markers
//! - **Pooling**: Per-variant or shared capacity with reuse statistics
//! - **Scheduling**: Cancellable timers in simulated time
//! - **Configuration**: TOML/RON settings with validation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lane_engine::prelude::*;
//!
//! struct MyApp;
//!
//! impl Application for MyApp {
//!     fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
//!         // Spawn the initial entities
//!         Ok(())
//!     }
//!
//!     fn update(&mut self, engine: &mut Engine, delta_time: f32) -> Result<(), AppError> {
//!         // Update game logic
//!         Ok(())
//!     }
//!
//!     fn cleanup(&mut self, engine: &mut Engine) {
//!         // Cancel timers
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::default().with_max_frames(600);
//!     let mut app = MyApp;
//!     Engine::run(config, &mut app)?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod ecs;
pub mod foundation;
pub mod pool;
pub mod scheduler;

mod application;
mod engine;

pub use application::{AppError, AppEvent, Application};
pub use crate::core::config::EngineConfig;
pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError},
        ecs::{Entity, EntityRecord, Marker, VariantId, World},
        foundation::{
            math::{Quat, Transform, Vec3},
            random::{RandomSource, ScriptedRandom, SeededRandom},
            time::FrameClock,
        },
        pool::{Acquire, Capacity, Pool, PoolStats},
        scheduler::{Due, Scheduler, TaskId},
        AppError, AppEvent, Application, Engine, EngineConfig, EngineError,
    };
}
