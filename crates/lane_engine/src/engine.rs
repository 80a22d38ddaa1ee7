//! Core engine implementation
//!
//! Headless main loop over simulated time. Each frame the engine advances
//! the [`FrameClock`] by its fixed step, delivers queued [`AppEvent`]s,
//! translates moving entities and then hands control to the application.

use std::collections::VecDeque;

use crate::{
    application::{AppError, AppEvent, Application},
    config::ConfigError,
    core::config::EngineConfig,
    ecs::World,
    foundation::{
        random::{RandomSource, SeededRandom},
        time::FrameClock,
    },
};
use thiserror::Error;

/// Main engine struct
///
/// The engine owns the entity world, the frame clock and the random source
/// shared by everything it drives.
pub struct Engine {
    /// Entity world
    pub world: World,

    /// Random source for all game randomness
    pub random: Box<dyn RandomSource>,

    /// Frame timing
    clock: FrameClock,

    /// Engine configuration
    config: EngineConfig,

    /// Events waiting for the next frame
    events: VecDeque<AppEvent>,

    /// Whether the main loop is executing
    running: bool,

    /// Whether a stop has been requested
    stop_requested: bool,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("entities", &self.world.len())
            .field("clock", &self.clock)
            .field("config", &self.config)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Create a new engine instance
    ///
    /// The random source is seeded from `config.seed`, or from the OS when no
    /// seed is configured.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let random: Box<dyn RandomSource> = match config.seed {
            Some(seed) => Box::new(SeededRandom::new(seed)),
            None => Box::new(SeededRandom::from_entropy()),
        };
        Self::with_random(config, random)
    }

    /// Create an engine with a caller-supplied random source
    pub fn with_random(config: EngineConfig, random: Box<dyn RandomSource>) -> Result<Self, EngineError> {
        log::info!("Initializing engine...");
        config.validate()?;

        Ok(Self {
            world: World::new(),
            random,
            clock: FrameClock::new(config.fixed_timestep),
            config,
            events: VecDeque::new(),
            running: false,
            stop_requested: false,
        })
    }

    /// Run the engine main loop with the given application
    pub fn run<T: Application>(config: EngineConfig, app: &mut T) -> Result<(), EngineError> {
        let mut engine = Self::new(config)?;
        Self::run_with(&mut engine, app)
    }

    /// Run the main loop on an existing engine
    ///
    /// Stops when the application calls [`Self::quit`] or after
    /// `max_frames` frames. The application's `cleanup` runs on both paths,
    /// and also when `update` fails.
    pub fn run_with<T: Application>(engine: &mut Self, app: &mut T) -> Result<(), EngineError> {
        if engine.running {
            return Err(EngineError::AlreadyRunning);
        }

        // Initialize application
        app.initialize(engine)
            .map_err(|e| EngineError::ApplicationError(format!("App initialization: {e}")))?;

        engine.running = true;
        engine.stop_requested = false;
        log::info!("Starting main loop...");

        let result = engine.main_loop(app);

        // Cleanup
        app.cleanup(engine);
        engine.running = false;

        log::info!(
            "Engine shutdown complete after {} frames ({:.2}s simulated)",
            engine.clock.frame_count(),
            engine.clock.total_time()
        );
        result
    }

    fn main_loop<T: Application>(&mut self, app: &mut T) -> Result<(), EngineError> {
        while !self.stop_requested {
            if self
                .config
                .max_frames
                .is_some_and(|max| self.clock.frame_count() >= max)
            {
                log::debug!("Frame limit reached");
                break;
            }

            self.step(app)?;
        }
        Ok(())
    }

    /// Advance one frame: tick the clock, deliver queued events, translate
    /// moving entities and update the application
    ///
    /// [`Self::run_with`] calls this in a loop; tests and tools may drive
    /// frames directly after calling the application's `initialize`.
    pub fn step<T: Application>(&mut self, app: &mut T) -> Result<(), EngineError> {
        let delta_time = self.clock.tick();

        while let Some(event) = self.events.pop_front() {
            app.handle_event(self, event)
                .map_err(|e| EngineError::ApplicationError(format!("App event: {e}")))?;
        }

        // Translate moving entities
        self.world.integrate(delta_time);

        // Update application
        app.update(self, delta_time)
            .map_err(|e| EngineError::ApplicationError(format!("App update: {e}")))
    }

    /// Queue an event for delivery at the start of the next frame
    pub fn push_event(&mut self, event: AppEvent) {
        self.events.push_back(event);
    }

    /// Apply engine-level handling of an event
    pub fn handle_event(&mut self, event: &AppEvent) {
        if *event == AppEvent::QuitRequested {
            self.quit();
        }
    }

    /// Request engine shutdown
    pub fn quit(&mut self) {
        log::info!("Engine shutdown requested");
        self.stop_requested = true;
    }

    /// Whether the main loop is executing
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Get the ECS world
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get mutable access to the ECS world
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Get mutable access to the random source
    pub fn random_mut(&mut self) -> &mut dyn RandomSource {
        self.random.as_mut()
    }

    /// Frame clock
    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Simulated seconds since the loop started
    pub fn total_time(&self) -> f64 {
        self.clock.total_time()
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Engine initialization failed
    #[error("Engine initialization failed: {0}")]
    InitializationFailed(String),

    /// Invalid engine configuration
    #[error("Engine configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Application error
    #[error("Application error: {0}")]
    ApplicationError(String),

    /// The main loop was entered while already running
    #[error("Engine main loop is already running")]
    AlreadyRunning,
}

impl From<AppError> for EngineError {
    fn from(error: AppError) -> Self {
        Self::ApplicationError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{EntityRecord, VariantId};
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;

    #[derive(Default)]
    struct Recorder {
        initialized: bool,
        updates: u32,
        cleaned_up: bool,
        events: Vec<AppEvent>,
        quit_after: Option<u32>,
        fail_initialize: bool,
    }

    impl Application for Recorder {
        fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
            if self.fail_initialize {
                return Err(AppError::Config("bad settings".to_string()));
            }
            self.initialized = true;
            engine.world.spawn(
                EntityRecord::new("Mover", VariantId(0))
                    .with_velocity(Vec3::new(0.0, 0.0, 6.0))
                    .with_active(true),
            );
            Ok(())
        }

        fn update(&mut self, engine: &mut Engine, _delta_time: f32) -> Result<(), AppError> {
            self.updates += 1;
            if self.quit_after == Some(self.updates) {
                engine.quit();
            }
            Ok(())
        }

        fn handle_event(&mut self, engine: &mut Engine, event: AppEvent) -> Result<(), AppError> {
            self.events.push(event);
            engine.handle_event(&event);
            Ok(())
        }

        fn cleanup(&mut self, _engine: &mut Engine) {
            self.cleaned_up = true;
        }
    }

    #[test]
    fn test_runs_until_frame_limit() {
        let config = EngineConfig::new().with_seed(1).with_fixed_timestep(0.5).with_max_frames(4);
        let mut engine = Engine::new(config).expect("valid config");
        let mut app = Recorder::default();

        Engine::run_with(&mut engine, &mut app).expect("loop completes");

        assert!(app.initialized && app.cleaned_up);
        assert_eq!(app.updates, 4);
        assert_relative_eq!(engine.total_time(), 2.0);
        let (_, mover) = engine.world.iter().next().expect("spawned in initialize");
        assert_relative_eq!(mover.transform().position.z, 12.0);
    }

    #[test]
    fn test_quit_stops_loop() {
        let config = EngineConfig::new().with_seed(1).with_max_frames(100);
        let mut app = Recorder {
            quit_after: Some(3),
            ..Recorder::default()
        };
        let mut engine = Engine::new(config).expect("valid config");
        Engine::run_with(&mut engine, &mut app).expect("loop completes");
        assert_eq!(app.updates, 3);
        assert!(!engine.is_running());
    }

    #[test]
    fn test_events_are_delivered_before_update() {
        let config = EngineConfig::new().with_seed(1).with_max_frames(10);
        let mut engine = Engine::new(config).expect("valid config");
        engine.push_event(AppEvent::LaneChange(1));
        engine.push_event(AppEvent::QuitRequested);
        let mut app = Recorder::default();

        Engine::run_with(&mut engine, &mut app).expect("loop completes");
        assert_eq!(app.events, vec![AppEvent::LaneChange(1), AppEvent::QuitRequested]);
        assert_eq!(app.updates, 1);
    }

    #[test]
    fn test_failed_initialize_is_reported() {
        let mut app = Recorder {
            fail_initialize: true,
            ..Recorder::default()
        };
        let err = Engine::run(EngineConfig::new().with_seed(1), &mut app).expect_err("init fails");
        assert!(matches!(err, EngineError::ApplicationError(_)));
        assert!(!app.cleaned_up);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let err = Engine::new(EngineConfig::new().with_fixed_timestep(-1.0)).expect_err("invalid");
        assert!(matches!(err, EngineError::Config(ConfigError::Invalid(_))));
    }
}
