//! # Lane Runner
//!
//! Endless three-lane runner built on `lane_engine`. Platforms stream in
//! ahead of the runner and are recycled behind it, obstacles spawn in
//! random lane patterns and expire after a fixed lifetime, and score items
//! on each platform can be picked up.
//!
//! ## Modules
//!
//! - [`streamer`]: platform placement, recycling and the process-wide guard
//! - [`spawner`]: timed obstacle spawn loop over a shared pool
//! - [`sequence`]: non-repeating shuffled variant order
//! - [`patterns`]: lane subsets used by spawns and decorations
//! - [`decor`]: static obstacles and score items on each platform
//! - [`player`]: runner movement between lanes
//! - [`game`]: the [`RunnerGame`] application tying it all together

pub mod components;
pub mod config;
pub mod decor;
pub mod game;
pub mod patterns;
pub mod player;
pub mod sequence;
pub mod spawner;
pub mod streamer;

pub use config::GameConfig;
pub use game::{RunSummary, RunnerGame};
