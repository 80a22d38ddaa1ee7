//! Lane runner
//!
//! Runs the game headless for the configured number of frames and logs a
//! summary. Settings come from `config/lane_runner.toml` when present.

use lane_engine::{foundation::logging, Engine};
use lane_runner::{GameConfig, RunnerGame};

const CONFIG_PATH: &str = "config/lane_runner.toml";

/// Frames simulated when the config sets no limit (one minute at 60 Hz)
const DEFAULT_FRAMES: u64 = 3600;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = GameConfig::load_or_default(CONFIG_PATH)?;
    logging::init(&config.engine.log_level);
    log::info!("Starting lane runner");

    if config.engine.max_frames.is_none() {
        config.engine.max_frames = Some(DEFAULT_FRAMES);
    }

    let mut game = RunnerGame::new(config.clone());
    Engine::run(config.engine, &mut game)?;

    if let Some(summary) = game.summary() {
        log::info!(
            "Distance {:.1}, score {}, segment pool {:?}, obstacle pool {:?}",
            summary.distance,
            summary.score.points,
            summary.segment_pool,
            summary.obstacle_pool
        );
    }
    Ok(())
}
