//! Runner movement
//!
//! The runner moves along +z at a constant speed through its velocity and
//! slides between three lanes. A lane request shifts the target x by one
//! lane width; each frame x closes part of the gap.

use lane_engine::ecs::{Entity, EntityRecord, VariantId, World};
use lane_engine::foundation::math::{utils::lerp, Vec3};

use crate::config::PlayerConfig;

/// The player-controlled runner
#[derive(Debug)]
pub struct Runner {
    entity: Entity,
    config: PlayerConfig,
    target_x: f32,
}

impl Runner {
    /// Spawn the runner at its configured start, already moving
    pub fn spawn(world: &mut World, config: PlayerConfig) -> Self {
        let entity = world.spawn(
            EntityRecord::new("Player", VariantId(0))
                .with_transform(config.start.to_transform())
                .with_velocity(Vec3::new(0.0, 0.0, config.forward_speed))
                .with_active(true),
        );
        let target_x = config.start.position[0].clamp(-config.lane_distance, config.lane_distance);
        log::debug!("Runner spawned at z={:.1}", config.start.position[2]);
        Self {
            entity,
            config,
            target_x,
        }
    }

    /// Runner entity
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Lane x the runner is sliding towards
    pub fn target_x(&self) -> f32 {
        self.target_x
    }

    /// World position; the origin if the entity is gone
    pub fn position(&self, world: &World) -> Vec3 {
        world.position(self.entity).unwrap_or_else(Vec3::zeros)
    }

    /// Shift the target one lane left (negative) or right (positive)
    pub fn request_lane(&mut self, direction: i8) {
        let step = match direction.signum() {
            1 => self.config.lane_distance,
            -1 => -self.config.lane_distance,
            _ => return,
        };
        self.target_x =
            (self.target_x + step).clamp(-self.config.lane_distance, self.config.lane_distance);
        log::trace!("Lane target now x={:.1}", self.target_x);
    }

    /// Slide x towards the lane target
    pub fn update(&self, world: &mut World, delta_time: f32) {
        let position = self.position(world);
        let x = lerp(position.x, self.target_x, self.config.lerp_speed * delta_time);
        world.set_position(self.entity, Vec3::new(x, position.y, position.z));
    }

    /// Put the runner back at its start
    pub fn reset(&mut self, world: &mut World) {
        world.set_transform(self.entity, self.config.start.to_transform());
        world.set_velocity(self.entity, Vec3::new(0.0, 0.0, self.config.forward_speed));
        world.activate(self.entity);
        self.target_x = self.config.start.position[0]
            .clamp(-self.config.lane_distance, self.config.lane_distance);
    }
}
