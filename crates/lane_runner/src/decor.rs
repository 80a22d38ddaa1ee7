//! Segment decorations
//!
//! Every platform carries static obstacle slots and score item slots as
//! child entities. When a platform is placed, a lane pattern is rolled for
//! each group; when it is recycled, all slots are switched off.

use std::collections::HashMap;

use lane_engine::ecs::{Entity, World};
use lane_engine::foundation::math::{utils::yaw, Vec3};
use lane_engine::foundation::random::RandomSource;

use crate::components::{ScoreItem, SlotKind};
use crate::config::DecorConfig;
use crate::patterns::{choose, lane_subsets, STATIC_PATTERNS};

/// Score items turn this many degrees per second
const SCORE_SPIN_DEGREES: f32 = 90.0;

/// Rolls and clears decoration patterns on platform segments
#[derive(Debug)]
pub struct SegmentDecorator {
    config: DecorConfig,
    scores: HashMap<Entity, ScoreItem>,
}

impl SegmentDecorator {
    /// Create a decorator
    pub fn new(config: DecorConfig) -> Self {
        Self {
            config,
            scores: HashMap::new(),
        }
    }

    /// Slot children of a segment, in slot order
    pub fn slots(world: &World, segment: Entity, kind: SlotKind) -> Vec<Entity> {
        world
            .children(segment)
            .iter()
            .copied()
            .filter(|&child| {
                world
                    .get(child)
                    .and_then(|record| SlotKind::from_variant(record.variant()))
                    == Some(kind)
            })
            .collect()
    }

    /// Clear every slot, then roll a static pattern and a score pattern
    pub fn decorate(&mut self, world: &mut World, random: &mut dyn RandomSource, segment: Entity) {
        self.clear(world, segment);

        let statics = Self::slots(world, segment, SlotKind::StaticObstacle);
        if let Some(pattern) = choose(&STATIC_PATTERNS, random) {
            for &lane in pattern.iter() {
                if let Some(&slot) = statics.get(lane) {
                    world.activate(slot);
                }
            }
        }

        let scores = Self::slots(world, segment, SlotKind::ScoreItem);
        if !self.config.score_kinds.is_empty() {
            for &slot in &scores {
                let kind = random.range_usize(0, self.config.score_kinds.len());
                let value = self.config.score_kinds[kind].value;
                self.scores.insert(slot, ScoreItem { kind, value });
            }
        }
        let subsets = lane_subsets(scores.len());
        if let Some(subset) = choose(&subsets, random) {
            for &lane in subset {
                if let Some(&slot) = scores.get(lane) {
                    if self.scores.contains_key(&slot) {
                        world.activate(slot);
                    }
                }
            }
        }
    }

    /// Switch off every decoration slot of a segment
    pub fn clear(&mut self, world: &mut World, segment: Entity) {
        let children: Vec<Entity> = world.children(segment).to_vec();
        for child in children {
            world.deactivate(child);
        }
    }

    /// Turn visible score items about +y
    pub fn spin(&self, world: &mut World, delta_time: f32) {
        let turn = yaw(SCORE_SPIN_DEGREES * delta_time);
        for &item in self.scores.keys() {
            if world.is_active_in_hierarchy(item) {
                if let Some(record) = world.get(item) {
                    let rotation = turn * record.transform().rotation;
                    world.set_rotation(item, rotation);
                }
            }
        }
    }

    /// Pick up every visible score item within `radius` of `player`
    ///
    /// Picked items are switched off and returned with their values.
    pub fn collect(&mut self, world: &mut World, player: Vec3, radius: f32) -> Vec<(Entity, ScoreItem)> {
        let mut picked: Vec<(Entity, ScoreItem)> = self
            .scores
            .iter()
            .filter(|(item, _)| world.is_active_in_hierarchy(**item))
            .filter(|(item, _)| {
                world
                    .position(**item)
                    .is_some_and(|position| (position - player).norm() <= radius)
            })
            .map(|(&item, &score)| (item, score))
            .collect();
        picked.sort_by_key(|&(item, _)| item);

        for &(item, score) in &picked {
            world.deactivate(item);
            log::info!(
                "Score added: {} worth {}",
                self.config.score_kinds.get(score.kind).map_or("item", |k| k.name.as_str()),
                score.value
            );
        }
        picked
    }

    /// Score data of a slot, once it has been decorated
    pub fn score_item(&self, slot: Entity) -> Option<&ScoreItem> {
        self.scores.get(&slot)
    }
}
