//! Platform streaming
//!
//! Keeps a chain of platform segments ahead of the runner and recycles the
//! ones left behind. Each segment is placed at the attachment point exposed
//! by the previous one, variants come from a [`SequenceGenerator`] so no
//! variant repeats within a cycle, and all segments are pooled per variant.
//!
//! # Lifecycle of a segment
//!
//! ```text
//! Pooled (inactive) -> Active (placed, appended) -> Pooled (threshold crossed)
//! ```
//!
//! Under capacity pressure the oldest active segment of the requested
//! variant is taken over ("forced recycle"); if there is none, one more
//! segment is created past the pool bound.
//!
//! # Process-wide guard
//!
//! Only one installed streamer may exist per process. [`SegmentStreamer::install`]
//! refuses a second one while the first is alive; the guard is released when
//! the installed streamer is dropped.

use std::sync::atomic::{AtomicBool, Ordering};

use lane_engine::ecs::{Entity, EntityRecord, Marker, VariantId, World};
use lane_engine::foundation::math::{utils::forward_distance, Transform, Vec3};
use lane_engine::foundation::random::RandomSource;
use lane_engine::pool::{Acquire, Capacity, Pool, PoolStats};
use thiserror::Error;

use crate::components::SlotKind;
use crate::config::{SegmentBlueprint, StreamerConfig};
use crate::sequence::SequenceGenerator;

static STREAMER_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Streamer errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamerError {
    /// Another streamer already holds the process-wide guard
    #[error("a segment streamer is already active in this process")]
    AlreadyActive,
}

/// Proof of being the only installed streamer; released on drop
#[derive(Debug)]
pub struct StreamerGuard {
    _private: (),
}

impl StreamerGuard {
    /// Take the process-wide guard
    pub fn acquire() -> Result<Self, StreamerError> {
        STREAMER_INSTALLED
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self { _private: () })
            .map_err(|_| {
                log::warn!("Refusing second segment streamer; keeping the existing one");
                StreamerError::AlreadyActive
            })
    }

    /// Whether some streamer currently holds the guard
    pub fn is_held() -> bool {
        STREAMER_INSTALLED.load(Ordering::Acquire)
    }
}

impl Drop for StreamerGuard {
    fn drop(&mut self) {
        STREAMER_INSTALLED.store(false, Ordering::Release);
        log::debug!("Segment streamer guard released");
    }
}

/// What a frame tick changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Segment placed this frame
    pub spawned: Option<Entity>,

    /// Segments returned to the pool this frame, oldest first
    pub recycled: Vec<Entity>,
}

/// Streaming counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamerStats {
    /// Segments placed
    pub spawned: u64,

    /// Segments recycled behind the runner
    pub recycled: u64,

    /// Active segments taken over under capacity pressure
    pub forced_recycles: u64,

    /// Segments created past the pool bound
    pub overflow: u64,

    /// Placed segments without an attachment marker
    pub missing_markers: u64,
}

/// Streams platform segments ahead of the runner
#[derive(Debug)]
pub struct SegmentStreamer {
    config: StreamerConfig,
    pool: Pool<VariantId>,
    sequence: SequenceGenerator,
    /// Active segments in spawn order, oldest first
    active: Vec<Entity>,
    next_attachment: Transform,
    instantiated: usize,
    stats: StreamerStats,
    guard: Option<StreamerGuard>,
}

impl SegmentStreamer {
    /// Create a streamer without taking the process-wide guard
    ///
    /// The configuration must list at least one segment variant.
    pub fn new(config: StreamerConfig) -> Self {
        let variant_count = config.segments.len();
        let capacity = Capacity::PerVariant(config.max_pool_size);
        let start = config.start.to_transform();
        Self {
            pool: Pool::new(capacity),
            sequence: SequenceGenerator::new(variant_count),
            active: Vec::new(),
            next_attachment: start,
            instantiated: 0,
            stats: StreamerStats::default(),
            guard: None,
            config,
        }
    }

    /// Create the process-wide streamer
    ///
    /// Fails while another installed streamer is alive.
    pub fn install(config: StreamerConfig) -> Result<Self, StreamerError> {
        let guard = StreamerGuard::acquire()?;
        log::info!(
            "Segment streamer installed with {} variants",
            config.segments.len()
        );
        let mut streamer = Self::new(config);
        streamer.guard = Some(guard);
        Ok(streamer)
    }

    /// Whether this streamer holds the process-wide guard
    pub fn is_installed(&self) -> bool {
        self.guard.is_some()
    }

    /// Spawn the initial run of segments from the start transform
    ///
    /// Returns the placed segments in spawn order.
    pub fn start(&mut self, world: &mut World, random: &mut dyn RandomSource) -> Vec<Entity> {
        self.next_attachment = self.config.start.to_transform();
        let spawned: Vec<Entity> = (0..self.config.initial_segment_count)
            .filter_map(|_| self.spawn_next(world, random))
            .collect();
        log::info!(
            "Spawned {} initial segments, next attachment at z={:.1}",
            spawned.len(),
            self.next_attachment.position.z
        );
        spawned
    }

    /// Release every active segment and spawn the initial run again
    ///
    /// Pools and the variant sequence carry over. Returns the released and
    /// the newly placed segments.
    pub fn restart(&mut self, world: &mut World, random: &mut dyn RandomSource) -> (Vec<Entity>, Vec<Entity>) {
        let released: Vec<Entity> = self.active.drain(..).collect();
        for &segment in &released {
            self.pool.release(world, segment);
        }
        log::info!("Restarting stream, released {} segments", released.len());
        let spawned = self.start(world, random);
        (released, spawned)
    }

    /// Per-frame update: spawn at most one segment, then recycle
    pub fn tick(&mut self, world: &mut World, random: &mut dyn RandomSource, player: Vec3) -> TickReport {
        let spawned = if self.should_spawn(world, player) {
            self.spawn_next(world, random)
        } else {
            None
        };
        let recycled = self.recycle_behind(world, player);
        TickReport { spawned, recycled }
    }

    /// Whether the runner is within the spawn threshold of the newest segment
    pub fn should_spawn(&self, world: &World, player: Vec3) -> bool {
        let Some(tail) = self.active.last().and_then(|&e| world.position(e)) else {
            return false;
        };
        forward_distance(&player, &tail) < self.config.player_threshold
    }

    /// Place the next segment of the sequence at the current attachment point
    ///
    /// Returns `None` only when no segment variants are configured.
    pub fn spawn_next(&mut self, world: &mut World, random: &mut dyn RandomSource) -> Option<Entity> {
        let index = self.sequence.next(random)?;
        let variant = VariantId(index);
        let blueprint = self.config.segments.get(index)?;
        let start = self.config.start.to_transform();
        let serial = self.instantiated;

        let segment = match self.pool.acquire(world, variant, |world| {
            instantiate(world, blueprint, variant, start, serial)
        }) {
            Acquire::Reused(segment) => segment,
            Acquire::Created(segment) => {
                self.instantiated += 1;
                segment
            }
            Acquire::Full => match Self::take_oldest(&mut self.active, &mut self.stats, world, variant) {
                Some(segment) => segment,
                None => {
                    let segment = instantiate(world, blueprint, variant, start, serial);
                    self.instantiated += 1;
                    self.pool.insert(variant, segment);
                    self.stats.overflow += 1;
                    log::warn!(
                        "Pool for {} exhausted with nothing to take over, created {} past capacity",
                        blueprint.name,
                        world.get(segment).map_or("segment", |r| r.name())
                    );
                    segment
                }
            },
        };

        world.set_transform(segment, self.next_attachment);
        world.activate(segment);
        self.active.push(segment);
        self.stats.spawned += 1;

        match world.find_marker(segment, &self.config.attachment_marker) {
            Some(attachment) => self.next_attachment = attachment,
            None => {
                self.stats.missing_markers += 1;
                log::warn!(
                    "No {} marker on {}; next segment reuses the current attachment point",
                    self.config.attachment_marker,
                    world.get(segment).map_or("segment", |r| r.name())
                );
            }
        }

        log::debug!(
            "Spawned {} at z={:.1} ({} active)",
            world.get(segment).map_or("segment", |r| r.name()),
            world.position(segment).map_or(0.0, |p| p.z),
            self.active.len()
        );
        Some(segment)
    }

    /// Detach the oldest active segment of `variant` for reuse
    fn take_oldest(
        active: &mut Vec<Entity>,
        stats: &mut StreamerStats,
        world: &World,
        variant: VariantId,
    ) -> Option<Entity> {
        let index = active
            .iter()
            .position(|&e| world.get(e).is_some_and(|r| r.variant() == variant))?;
        let segment = active.remove(index);
        stats.forced_recycles += 1;
        log::warn!(
            "Forced recycle of {} at z={:.1} for reuse",
            world.get(segment).map_or("segment", |r| r.name()),
            world.position(segment).map_or(0.0, |p| p.z)
        );
        Some(segment)
    }

    /// Return segments the runner has left behind to their pools
    ///
    /// Nothing is recycled while two or fewer segments are active.
    pub fn recycle_behind(&mut self, world: &mut World, player: Vec3) -> Vec<Entity> {
        if self.active.len() <= 2 {
            return Vec::new();
        }

        let length = self.config.segment_length;
        let threshold = self.config.recycle_threshold;
        let mut recycled = Vec::new();
        self.active.retain(|&segment| {
            let Some(position) = world.position(segment) else {
                return false;
            };
            let distance_behind = player.z - (position.z + length);
            if distance_behind > threshold {
                log::info!(
                    "Recycling {} at z={:.1}, player at z={:.1}, distance {:.1}",
                    world.get(segment).map_or("segment", |r| r.name()),
                    position.z,
                    player.z,
                    distance_behind
                );
                recycled.push(segment);
                false
            } else {
                true
            }
        });

        for &segment in &recycled {
            self.pool.release(world, segment);
        }
        self.stats.recycled += recycled.len() as u64;
        recycled
    }

    /// Active segments, oldest first
    pub fn active(&self) -> &[Entity] {
        &self.active
    }

    /// Newest active segment
    pub fn tail(&self) -> Option<Entity> {
        self.active.last().copied()
    }

    /// Where the next segment will be placed
    pub fn next_attachment(&self) -> &Transform {
        &self.next_attachment
    }

    /// Segment pool
    pub fn pool(&self) -> &Pool<VariantId> {
        &self.pool
    }

    /// Pool counters
    pub fn pool_stats(&self) -> &PoolStats {
        self.pool.stats()
    }

    /// Streaming counters
    pub fn stats(&self) -> &StreamerStats {
        &self.stats
    }

    /// Configuration
    pub fn config(&self) -> &StreamerConfig {
        &self.config
    }

    /// Blueprint of a segment variant
    pub fn blueprint(&self, variant: VariantId) -> Option<&SegmentBlueprint> {
        self.config.segments.get(variant.index())
    }
}

/// Build an inactive segment with its attachment marker and slot children
fn instantiate(
    world: &mut World,
    blueprint: &SegmentBlueprint,
    variant: VariantId,
    start: Transform,
    serial: usize,
) -> Entity {
    let mut record = EntityRecord::new(format!("{}({serial})", blueprint.name), variant).with_transform(start);
    if let Some(attachment) = &blueprint.attachment {
        let mut marker = Marker::new(attachment.name.clone(), attachment.local.to_transform());
        if let Some(tag) = &attachment.tag {
            marker = marker.with_tag(tag.clone());
        }
        record = record.with_marker(marker);
    }
    let segment = world.spawn(record);

    let slots = blueprint
        .static_slots
        .iter()
        .map(|offset| (SlotKind::StaticObstacle, offset))
        .chain(blueprint.score_slots.iter().map(|offset| (SlotKind::ScoreItem, offset)));
    for (kind, offset) in slots {
        let child = EntityRecord::new(kind.entity_name(), kind.variant())
            .with_transform(Transform::from_position(Vec3::from(*offset)));
        world.spawn_child(segment, child);
    }
    segment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Placement, NEXT_PLATFORM_MARKER};
    use approx::assert_relative_eq;
    use lane_engine::foundation::random::SeededRandom;

    fn config(variants: usize) -> StreamerConfig {
        StreamerConfig {
            segments: (0..variants)
                .map(|i| SegmentBlueprint::straight(format!("Platform{i}"), 30.0, &[-2.0, 0.0, 2.0]))
                .collect(),
            ..StreamerConfig::default()
        }
    }

    fn z(world: &World, entity: Entity) -> f32 {
        world.position(entity).expect("segment exists").z
    }

    #[test]
    fn test_start_chains_segments_through_markers() {
        let mut world = World::new();
        let mut random = SeededRandom::new(1);
        let mut streamer = SegmentStreamer::new(config(5));

        let spawned = streamer.start(&mut world, &mut random);

        assert_eq!(spawned.len(), 5);
        assert_eq!(streamer.active(), spawned.as_slice());
        for (i, &segment) in spawned.iter().enumerate() {
            assert!(world.is_active(segment));
            assert_relative_eq!(z(&world, segment), 30.0 * i as f32);
        }
        assert_relative_eq!(streamer.next_attachment().position.z, 150.0);

        // One full cycle: every variant once
        let mut variants: Vec<usize> = spawned
            .iter()
            .map(|&e| world.get(e).expect("exists").variant().index())
            .collect();
        variants.sort_unstable();
        assert_eq!(variants, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_spawn_threshold_scenario() {
        let mut world = World::new();
        let mut random = SeededRandom::new(2);
        let mut streamer = SegmentStreamer::new(StreamerConfig {
            start: Placement::at(0.0, 0.0, 40.0),
            initial_segment_count: 3,
            ..config(5)
        });
        streamer.start(&mut world, &mut random);
        let tail = streamer.tail().expect("started");
        assert_relative_eq!(z(&world, tail), 100.0);

        assert!(streamer.should_spawn(&world, Vec3::new(0.0, 0.0, 96.0)));
        assert!(!streamer.should_spawn(&world, Vec3::new(0.0, 0.0, 94.0)));

        let report = streamer.tick(&mut world, &mut random, Vec3::new(0.0, 0.0, 96.0));
        let spawned = report.spawned.expect("within threshold");
        assert_relative_eq!(z(&world, spawned), 130.0);
        // The segment at z=40 ends 26 behind the runner
        assert_eq!(report.recycled.len(), 1);
        assert_eq!(streamer.active().len(), 3);

        // The new tail is far away again: no second spawn
        let report = streamer.tick(&mut world, &mut random, Vec3::new(0.0, 0.0, 96.0));
        assert!(report.spawned.is_none());
    }

    #[test]
    fn test_recycle_threshold_scenario() {
        let mut world = World::new();
        let mut random = SeededRandom::new(3);
        let mut streamer = SegmentStreamer::new(config(5));
        let spawned = streamer.start(&mut world, &mut random);
        let first = spawned[0];
        assert_relative_eq!(z(&world, first), 0.0);

        assert!(streamer.recycle_behind(&mut world, Vec3::new(0.0, 0.0, 49.0)).is_empty());
        assert!(world.is_active(first));

        let recycled = streamer.recycle_behind(&mut world, Vec3::new(0.0, 0.0, 51.0));
        assert_eq!(recycled, vec![first]);
        assert!(!world.is_active(first));
        assert!(!streamer.active().contains(&first));
        assert_eq!(streamer.stats().recycled, 1);
    }

    #[test]
    fn test_no_recycling_with_two_or_fewer_active() {
        let mut world = World::new();
        let mut random = SeededRandom::new(4);
        let mut streamer = SegmentStreamer::new(StreamerConfig {
            initial_segment_count: 2,
            ..config(5)
        });
        streamer.start(&mut world, &mut random);
        assert!(streamer.recycle_behind(&mut world, Vec3::new(0.0, 0.0, 10_000.0)).is_empty());
        assert_eq!(streamer.active().len(), 2);
    }

    #[test]
    fn test_multiple_segments_recycle_in_one_frame() {
        let mut world = World::new();
        let mut random = SeededRandom::new(5);
        let mut streamer = SegmentStreamer::new(config(5));
        let spawned = streamer.start(&mut world, &mut random);

        // Segments at 0, 30, 60 are more than 20 behind z=111
        let recycled = streamer.recycle_behind(&mut world, Vec3::new(0.0, 0.0, 111.0));
        assert_eq!(recycled, spawned[..3].to_vec());
        assert_eq!(streamer.active(), &spawned[3..]);
    }

    #[test]
    fn test_recycled_segment_is_reused() {
        let mut world = World::new();
        let mut random = SeededRandom::new(6);
        let mut streamer = SegmentStreamer::new(StreamerConfig {
            initial_segment_count: 3,
            ..config(1)
        });
        let spawned = streamer.start(&mut world, &mut random);
        let recycled = streamer.recycle_behind(&mut world, Vec3::new(0.0, 0.0, 60.0));
        assert_eq!(recycled, vec![spawned[0]]);

        let again = streamer.spawn_next(&mut world, &mut random).expect("one variant");
        assert_eq!(again, spawned[0]);
        assert_relative_eq!(z(&world, again), 90.0);
        assert_eq!(streamer.pool().len(), 3);
        assert_eq!(streamer.pool_stats().reused, 1);
    }

    #[test]
    fn test_forced_recycle_takes_oldest_of_variant() {
        let mut world = World::new();
        let mut random = SeededRandom::new(7);
        let mut streamer = SegmentStreamer::new(StreamerConfig {
            initial_segment_count: 2,
            max_pool_size: 2,
            ..config(1)
        });
        let spawned = streamer.start(&mut world, &mut random);

        let third = streamer.spawn_next(&mut world, &mut random).expect("forced");
        assert_eq!(third, spawned[0]);
        assert_eq!(streamer.active(), &[spawned[1], spawned[0]]);
        assert_relative_eq!(z(&world, third), 60.0);
        assert_relative_eq!(streamer.next_attachment().position.z, 90.0);
        assert_eq!(streamer.stats().forced_recycles, 1);
        assert_eq!(streamer.pool().len(), 2);
    }

    #[test]
    fn test_soft_cap_when_nothing_to_take_over() {
        let mut world = World::new();
        let mut random = SeededRandom::new(8);
        let mut streamer = SegmentStreamer::new(StreamerConfig {
            initial_segment_count: 0,
            max_pool_size: 0,
            ..config(1)
        });
        let segment = streamer.spawn_next(&mut world, &mut random).expect("soft cap");
        assert!(world.is_active(segment));
        assert_eq!(streamer.pool().len(), 1);
        assert_eq!(streamer.stats().overflow, 1);
        assert_eq!(streamer.pool_stats().overflow, 1);
    }

    #[test]
    fn test_missing_marker_keeps_attachment_point() {
        let mut world = World::new();
        let mut random = SeededRandom::new(9);
        let mut broken = SegmentBlueprint::straight("Broken", 30.0, &[0.0]);
        broken.attachment = None;
        let mut streamer = SegmentStreamer::new(StreamerConfig {
            segments: vec![broken],
            initial_segment_count: 2,
            ..StreamerConfig::default()
        });

        let spawned = streamer.start(&mut world, &mut random);
        assert_relative_eq!(z(&world, spawned[0]), 0.0);
        assert_relative_eq!(z(&world, spawned[1]), 0.0);
        assert_eq!(streamer.stats().missing_markers, 2);
    }

    #[test]
    fn test_tagged_marker_and_rotation_are_followed() {
        let mut world = World::new();
        let mut random = SeededRandom::new(10);
        let mut turning = SegmentBlueprint::straight("Turn", 30.0, &[]);
        if let Some(marker) = turning.attachment.as_mut() {
            marker.name = "Exit".to_string();
            marker.tag = Some(NEXT_PLATFORM_MARKER.to_string());
            marker.local.yaw_degrees = 90.0;
        }
        let mut streamer = SegmentStreamer::new(StreamerConfig {
            segments: vec![turning],
            initial_segment_count: 2,
            ..StreamerConfig::default()
        });

        let spawned = streamer.start(&mut world, &mut random);
        let second = world.world_transform(spawned[1]).expect("exists");
        assert_relative_eq!(second.position.z, 30.0, epsilon = 1e-4);
        // The second segment is turned, so its exit lies along +x
        let exit = streamer.next_attachment().position;
        assert_relative_eq!(exit.x, 30.0, epsilon = 1e-4);
        assert_relative_eq!(exit.z, 30.0, epsilon = 1e-4);
    }

    #[test]
    fn test_segments_carry_slot_children() {
        let mut world = World::new();
        let mut random = SeededRandom::new(11);
        let mut streamer = SegmentStreamer::new(StreamerConfig {
            initial_segment_count: 1,
            ..config(1)
        });
        let segment = streamer.start(&mut world, &mut random)[0];
        let kinds: Vec<SlotKind> = world
            .children(segment)
            .iter()
            .filter_map(|&c| SlotKind::from_variant(world.get(c).expect("child").variant()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                SlotKind::StaticObstacle,
                SlotKind::StaticObstacle,
                SlotKind::StaticObstacle,
                SlotKind::ScoreItem,
                SlotKind::ScoreItem,
                SlotKind::ScoreItem,
            ]
        );
        assert!(world.children(segment).iter().all(|&c| !world.is_active(c)));
    }

    #[test]
    fn test_restart_releases_and_respawns() {
        let mut world = World::new();
        let mut random = SeededRandom::new(12);
        let mut streamer = SegmentStreamer::new(config(5));
        streamer.start(&mut world, &mut random);
        streamer.spawn_next(&mut world, &mut random);

        let (released, spawned) = streamer.restart(&mut world, &mut random);
        assert_eq!(released.len(), 6);
        assert_eq!(spawned.len(), 5);
        assert_eq!(streamer.active(), spawned.as_slice());
        assert_relative_eq!(z(&world, spawned[0]), 0.0);
        assert_relative_eq!(streamer.next_attachment().position.z, 150.0);
        for segment in released.iter().filter(|e| !spawned.contains(*e)) {
            assert!(!world.is_active(*segment));
        }
    }
}
