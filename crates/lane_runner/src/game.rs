//! Runner game application
//!
//! Wires the streaming core into the engine loop. Each frame the runner
//! slides towards its lane, the streamer places and recycles platforms
//! around it, obstacle timers run up to the current simulated time, and
//! nearby score items are picked up.

use lane_engine::prelude::*;

use crate::components::Score;
use crate::config::GameConfig;
use crate::decor::SegmentDecorator;
use crate::player::Runner;
use crate::spawner::{ObstacleSpawner, SpawnerStats};
use crate::streamer::{SegmentStreamer, StreamerError, StreamerStats};

impl From<StreamerError> for AppError {
    fn from(error: StreamerError) -> Self {
        AppError::GameLogic(error.to_string())
    }
}

/// Live game objects, present between `initialize` and `cleanup`
#[derive(Debug)]
pub struct Session {
    streamer: SegmentStreamer,
    spawner: ObstacleSpawner,
    runner: Runner,
    decor: SegmentDecorator,
}

impl Session {
    /// Platform streamer
    pub fn streamer(&self) -> &SegmentStreamer {
        &self.streamer
    }

    /// Obstacle spawner
    pub fn spawner(&self) -> &ObstacleSpawner {
        &self.spawner
    }

    /// Runner
    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    /// Segment decorations
    pub fn decor(&self) -> &SegmentDecorator {
        &self.decor
    }
}

/// Totals reported when a run ends
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Frames simulated
    pub frames: u64,

    /// Runner z at the end of the run
    pub distance: f32,

    /// Points collected
    pub score: Score,

    /// Platform counters
    pub streamer: StreamerStats,

    /// Obstacle counters
    pub spawner: SpawnerStats,

    /// Platform pool counters
    pub segment_pool: PoolStats,

    /// Obstacle pool counters
    pub obstacle_pool: PoolStats,
}

/// Endless lane runner
#[derive(Debug)]
pub struct RunnerGame {
    config: GameConfig,
    session: Option<Session>,
    score: Score,
    reloads: u32,
    summary: Option<RunSummary>,
}

impl RunnerGame {
    /// Create the game; nothing is spawned until the engine initializes it
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            session: None,
            score: Score::default(),
            reloads: 0,
            summary: None,
        }
    }

    /// Game configuration
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Live game objects, if running
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Points collected since the last scene load
    pub fn score(&self) -> Score {
        self.score
    }

    /// Number of scene reloads so far
    pub fn reloads(&self) -> u32 {
        self.reloads
    }

    /// Totals of the finished run
    pub fn summary(&self) -> Option<&RunSummary> {
        self.summary.as_ref()
    }

    /// Restart the scene: runner, obstacles and platforms go back to the
    /// start while the installed streamer and its pools carry over
    pub fn reload_scene(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        let now = engine.total_time();
        let Some(session) = self.session.as_mut() else {
            return Err(AppError::GameLogic("no scene loaded".to_string()));
        };
        let world = &mut engine.world;
        let random = engine.random.as_mut();

        session.runner.reset(world);
        session.spawner.restart(world, now);
        let (released, spawned) = session.streamer.restart(world, random);
        for segment in released {
            session.decor.clear(world, segment);
        }
        for segment in spawned {
            session.decor.decorate(world, random, segment);
        }

        self.score = Score::default();
        self.reloads += 1;
        log::info!("Scene reloaded ({} so far)", self.reloads);
        Ok(())
    }

    fn summarize(&self, engine: &Engine, session: &Session) -> RunSummary {
        RunSummary {
            frames: engine.clock().frame_count(),
            distance: session.runner.position(&engine.world).z,
            score: self.score,
            streamer: *session.streamer.stats(),
            spawner: *session.spawner.stats(),
            segment_pool: *session.streamer.pool_stats(),
            obstacle_pool: *session.spawner.pool_stats(),
        }
    }
}

impl Application for RunnerGame {
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        log::info!("Initializing lane runner...");
        self.config
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;

        let mut streamer = SegmentStreamer::install(self.config.streamer.clone())?;
        let now = engine.total_time();
        let world = &mut engine.world;
        let random = engine.random.as_mut();

        let runner = Runner::spawn(world, self.config.player.clone());
        let mut decor = SegmentDecorator::new(self.config.decor.clone());
        for segment in streamer.start(world, random) {
            decor.decorate(world, random, segment);
        }
        let mut spawner = ObstacleSpawner::new(self.config.spawner.clone(), world);
        spawner.start(now);

        self.session = Some(Session {
            streamer,
            spawner,
            runner,
            decor,
        });
        self.score = Score::default();
        self.summary = None;
        log::info!("Lane runner ready with {} entities", engine.world.len());
        Ok(())
    }

    fn update(&mut self, engine: &mut Engine, delta_time: f32) -> Result<(), AppError> {
        let now = engine.total_time();
        let Some(session) = self.session.as_mut() else {
            return Err(AppError::GameLogic("update before initialize".to_string()));
        };
        let world = &mut engine.world;
        let random = engine.random.as_mut();

        session.runner.update(world, delta_time);
        let player = session.runner.position(world);

        let report = session.streamer.tick(world, random, player);
        if let Some(segment) = report.spawned {
            session.decor.decorate(world, random, segment);
        }
        for segment in report.recycled {
            session.decor.clear(world, segment);
        }

        session.spawner.advance(world, random, now, player.z);

        session.decor.spin(world, delta_time);
        let radius = self.config.player.pickup_radius;
        for (_, item) in session.decor.collect(world, player, radius) {
            self.score.add(item.value);
        }
        Ok(())
    }

    fn handle_event(&mut self, engine: &mut Engine, event: AppEvent) -> Result<(), AppError> {
        match event {
            AppEvent::LaneChange(direction) => {
                if let Some(session) = self.session.as_mut() {
                    session.runner.request_lane(direction);
                }
                Ok(())
            }
            AppEvent::ReloadScene => self.reload_scene(engine),
            AppEvent::QuitRequested => {
                engine.handle_event(&event);
                Ok(())
            }
        }
    }

    fn cleanup(&mut self, engine: &mut Engine) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        session.spawner.shutdown();
        let summary = self.summarize(engine, &session);
        log::info!(
            "Run finished after {} frames: distance {:.1}, score {} ({} pickups), {} platforms placed, {} recycled, {} obstacles spawned",
            summary.frames,
            summary.distance,
            summary.score.points,
            summary.score.pickups,
            summary.streamer.spawned,
            summary.streamer.recycled,
            summary.spawner.spawned
        );
        self.summary = Some(summary);
        // Dropping the session releases the streamer guard
        drop(session);
    }
}
