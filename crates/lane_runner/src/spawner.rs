//! Obstacle spawning
//!
//! A perpetual spawn loop on the cooperative [`Scheduler`]: each cycle picks
//! a lane pattern, activates one pooled obstacle per lane and schedules its
//! despawn, then reschedules itself after a random interval. Obstacles come
//! from one shared pool that is pre-warmed and may grow to twice its initial
//! size; past that, lanes simply stay empty.

use lane_engine::ecs::{Entity, EntityRecord, VariantId, World};
use lane_engine::foundation::math::{Transform, Vec3};
use lane_engine::foundation::random::RandomSource;
use lane_engine::pool::{Capacity, Pool, PoolStats};
use lane_engine::scheduler::{Scheduler, TaskId};

use crate::config::SpawnerConfig;
use crate::patterns::{choose, OBSTACLE_PATTERNS};

/// Work queued on the spawner's scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnerTask {
    /// Run one spawn cycle and reschedule
    Cycle,

    /// Return an obstacle to the pool, if it is still on the same activation
    Despawn {
        /// Obstacle to despawn
        entity: Entity,
        /// Activation counter when the timer was set
        activation: u32,
    },
}

/// Spawning counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpawnerStats {
    /// Spawn cycles run
    pub cycles: u64,

    /// Obstacles activated
    pub spawned: u64,

    /// Obstacles deactivated by their lifetime timer
    pub despawned: u64,

    /// Timers that fired for an obstacle already deactivated or reused
    pub stale_timers: u64,

    /// Lanes left empty because the pool was exhausted
    pub starved: u64,
}

/// Spawns short-lived obstacles in lane patterns
#[derive(Debug)]
pub struct ObstacleSpawner {
    config: SpawnerConfig,
    pool: Pool<VariantId>,
    scheduler: Scheduler<SpawnerTask>,
    cycle: Option<TaskId>,
    stats: SpawnerStats,
}

impl ObstacleSpawner {
    /// Create a spawner and pre-warm its pool with inactive obstacles
    ///
    /// Variants are assigned round-robin. The configuration must list at
    /// least one obstacle variant.
    pub fn new(config: SpawnerConfig, world: &mut World) -> Self {
        let mut pool = Pool::new(Capacity::Shared(config.max_pool_size * 2));
        let variant_count = config.obstacle_variants.len();
        if variant_count > 0 {
            for i in 0..config.max_pool_size {
                let variant = VariantId(i % variant_count);
                pool.insert(variant, spawn_obstacle(world, &config.obstacle_variants, variant));
            }
        }
        log::info!(
            "Obstacle pool pre-warmed with {} entities over {} variants",
            pool.len(),
            variant_count
        );

        Self {
            config,
            pool,
            scheduler: Scheduler::new(),
            cycle: None,
            stats: SpawnerStats::default(),
        }
    }

    /// Start the spawn loop; the first cycle runs at `now`
    pub fn start(&mut self, now: f64) {
        if let Some(cycle) = self.cycle.take() {
            self.scheduler.cancel(cycle);
        }
        self.scheduler.settle(now);
        self.cycle = Some(self.scheduler.schedule_at(now, SpawnerTask::Cycle));
        log::debug!("Obstacle spawn loop started at t={now:.2}");
    }

    /// Whether the spawn loop is scheduled
    pub fn is_running(&self) -> bool {
        self.cycle.is_some_and(|cycle| self.scheduler.is_pending(cycle))
    }

    /// Run every task due by `now`
    ///
    /// `origin_z` is the runner's position, used to place lanes when
    /// `follow_player` is set. Returns the number of obstacles activated.
    pub fn advance(&mut self, world: &mut World, random: &mut dyn RandomSource, now: f64, origin_z: f32) -> usize {
        let mut spawned = 0;
        while let Some(due) = self.scheduler.pop_due(now) {
            match due.payload {
                SpawnerTask::Cycle => {
                    spawned += self.spawn_pattern(world, random, due.at, origin_z);
                    let (min, max) = (self.config.min_spawn_interval, self.config.max_spawn_interval);
                    let wait = min + (max - min).max(0.0) * f64::from(random.next_f32());
                    self.cycle = Some(self.scheduler.schedule_at(due.at + wait, SpawnerTask::Cycle));
                }
                SpawnerTask::Despawn { entity, activation } => {
                    self.despawn(world, entity, activation);
                }
            }
        }
        self.scheduler.settle(now);
        spawned
    }

    /// Activate obstacles for one randomly chosen lane pattern at time `at`
    ///
    /// Returns the number activated, which is lower than the pattern size
    /// when the pool is exhausted.
    pub fn spawn_pattern(&mut self, world: &mut World, random: &mut dyn RandomSource, at: f64, origin_z: f32) -> usize {
        self.stats.cycles += 1;
        let Some(pattern) = choose(&OBSTACLE_PATTERNS, random) else {
            return 0;
        };
        self.spawn_lanes(world, random, pattern, at, origin_z)
    }

    /// Activate one obstacle in each of `lanes` at time `at`
    pub fn spawn_lanes(
        &mut self,
        world: &mut World,
        random: &mut dyn RandomSource,
        lanes: &[usize],
        at: f64,
        origin_z: f32,
    ) -> usize {
        let mut spawned = 0;
        for &lane in lanes {
            let Some(&lane_position) = self.config.lane_positions.get(lane) else {
                log::warn!("No spawn position for lane {lane}");
                continue;
            };

            let variants = &self.config.obstacle_variants;
            let acquired = self.pool.acquire_any(world, |world| {
                let variant = VariantId(random.range_usize(0, variants.len()));
                (variant, spawn_obstacle(world, variants, variant))
            });
            let Some(obstacle) = acquired.entity() else {
                self.stats.starved += 1;
                log::trace!("No obstacle available for lane {lane}");
                continue;
            };

            let mut position = Vec3::from(lane_position);
            if self.config.follow_player {
                position.z += origin_z;
            }
            world.set_velocity(obstacle, Vec3::zeros());
            world.set_transform(obstacle, Transform::from_position_rotation(position, random.rotation()));
            world.activate(obstacle);

            let activation = world.activations(obstacle).unwrap_or_default();
            self.scheduler.schedule_at(
                at + self.config.obstacle_lifetime,
                SpawnerTask::Despawn {
                    entity: obstacle,
                    activation,
                },
            );
            self.stats.spawned += 1;
            spawned += 1;
        }
        spawned
    }

    /// Lifetime timer handler; a no-op unless the obstacle is still on the
    /// activation the timer was set for
    fn despawn(&mut self, world: &mut World, entity: Entity, activation: u32) {
        let current = world.activations(entity) == Some(activation);
        if current && self.pool.release(world, entity) {
            self.stats.despawned += 1;
            log::debug!("Despawned obstacle {entity:?}");
        } else {
            self.stats.stale_timers += 1;
            log::trace!("Despawn timer for {entity:?} outdated, ignoring");
        }
    }

    /// Deactivate an obstacle before its lifetime ends
    ///
    /// Its pending timer becomes a no-op.
    pub fn remove(&mut self, world: &mut World, entity: Entity) -> bool {
        self.pool.release(world, entity)
    }

    /// Cancel all timers, release every active obstacle and start again at `now`
    pub fn restart(&mut self, world: &mut World, now: f64) {
        self.scheduler.cancel_all();
        let active = self.active_obstacles(world);
        for entity in &active {
            self.pool.release(world, *entity);
        }
        log::info!("Obstacle spawner restarted, released {} obstacles", active.len());
        self.cycle = None;
        self.start(now);
    }

    /// Cancel the spawn loop and every pending despawn timer
    pub fn shutdown(&mut self) {
        let cancelled = self.scheduler.cancel_all();
        self.cycle = None;
        if cancelled > 0 {
            log::debug!("Obstacle spawner stopped, cancelled {cancelled} tasks");
        }
    }

    /// Obstacles currently active, in pool order
    pub fn active_obstacles(&self, world: &World) -> Vec<Entity> {
        self.pool
            .iter()
            .map(|(_, entity)| entity)
            .filter(|&entity| world.is_active(entity))
            .collect()
    }

    /// Due time of the next spawn cycle
    pub fn next_cycle_at(&self) -> Option<f64> {
        self.cycle.and_then(|cycle| self.scheduler.due_at(cycle))
    }

    /// Tasks waiting on the scheduler
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending()
    }

    /// Obstacle pool
    pub fn pool(&self) -> &Pool<VariantId> {
        &self.pool
    }

    /// Pool counters
    pub fn pool_stats(&self) -> &PoolStats {
        self.pool.stats()
    }

    /// Spawning counters
    pub fn stats(&self) -> &SpawnerStats {
        &self.stats
    }

    /// Configuration
    pub fn config(&self) -> &SpawnerConfig {
        &self.config
    }
}

impl Drop for ObstacleSpawner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn_obstacle(world: &mut World, names: &[String], variant: VariantId) -> Entity {
    let name = names.get(variant.index()).map_or("Obstacle", String::as_str);
    world.spawn(EntityRecord::new(name, variant))
}
