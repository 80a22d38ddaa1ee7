//! Entity world
//!
//! Explicit replacement for an engine-managed scene graph: every entity is a
//! record with a transform, a velocity, an `active` flag and an optional
//! parent. Visibility queries are plain field reads.

use slotmap::SlotMap;

use super::entity::{Entity, VariantId};
use crate::foundation::math::{Quat, Transform, Vec3};

/// Named frame attached to an entity (e.g. where the next platform goes)
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Marker name
    pub name: String,
    /// Optional tag, matched when no marker carries the requested name
    pub tag: Option<String>,
    /// Frame relative to the owning entity
    pub local: Transform,
}

impl Marker {
    /// Create a marker with a name and a local frame
    pub fn new(name: impl Into<String>, local: Transform) -> Self {
        Self {
            name: name.into(),
            tag: None,
            local,
        }
    }

    /// Set the tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// State of a single entity
#[derive(Debug, Clone)]
pub struct EntityRecord {
    name: String,
    variant: VariantId,
    transform: Transform,
    velocity: Vec3,
    active: bool,
    activations: u32,
    parent: Option<Entity>,
    children: Vec<Entity>,
    markers: Vec<Marker>,
}

impl EntityRecord {
    /// Create an inactive record at the origin
    pub fn new(name: impl Into<String>, variant: VariantId) -> Self {
        Self {
            name: name.into(),
            variant,
            transform: Transform::identity(),
            velocity: Vec3::zeros(),
            active: false,
            activations: 0,
            parent: None,
            children: Vec::new(),
            markers: Vec::new(),
        }
    }

    /// Set the initial transform (local to the parent, if any)
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Set the initial velocity
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Spawn already active
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Attach a named marker
    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    /// Entity name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Variant tag assigned at creation
    pub fn variant(&self) -> VariantId {
        self.variant
    }

    /// Transform relative to the parent (world space for roots)
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Current velocity
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Own active flag, ignoring ancestors
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Number of inactive → active transitions so far
    pub fn activations(&self) -> u32 {
        self.activations
    }

    /// Parent entity
    pub fn parent(&self) -> Option<Entity> {
        self.parent
    }

    /// Child entities in creation order
    pub fn children(&self) -> &[Entity] {
        &self.children
    }

    /// Attached markers
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }
}

/// World containing all entities
#[derive(Debug, Default)]
pub struct World {
    entities: SlotMap<Entity, EntityRecord>,
}

impl World {
    /// Create a new world
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a root entity
    pub fn spawn(&mut self, record: EntityRecord) -> Entity {
        self.entities.insert(record)
    }

    /// Insert an entity parented to `parent`
    ///
    /// The child's transform is interpreted relative to the parent. Returns
    /// `None` if the parent does not exist.
    pub fn spawn_child(&mut self, parent: Entity, mut record: EntityRecord) -> Option<Entity> {
        if !self.entities.contains_key(parent) {
            return None;
        }
        record.parent = Some(parent);
        let child = self.entities.insert(record);
        self.entities[parent].children.push(child);
        Some(child)
    }

    /// Get an entity record
    pub fn get(&self, entity: Entity) -> Option<&EntityRecord> {
        self.entities.get(entity)
    }

    /// Check whether an entity exists
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains_key(entity)
    }

    /// Number of entities, active or not
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the world holds no entities
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of entities whose own flag is active
    pub fn active_count(&self) -> usize {
        self.entities.values().filter(|record| record.active).count()
    }

    /// Iterate over all entities
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &EntityRecord)> {
        self.entities.iter()
    }

    /// Own active flag; `false` for unknown entities
    pub fn is_active(&self, entity: Entity) -> bool {
        self.entities.get(entity).is_some_and(|record| record.active)
    }

    /// Active flag of the entity and every ancestor
    pub fn is_active_in_hierarchy(&self, entity: Entity) -> bool {
        let mut current = Some(entity);
        while let Some(e) = current {
            match self.entities.get(e) {
                Some(record) if record.active => current = record.parent,
                _ => return false,
            }
        }
        true
    }

    /// Mark an entity active; returns `true` if the flag changed
    pub fn activate(&mut self, entity: Entity) -> bool {
        match self.entities.get_mut(entity) {
            Some(record) if !record.active => {
                record.active = true;
                record.activations = record.activations.wrapping_add(1);
                true
            }
            _ => false,
        }
    }

    /// Mark an entity inactive; returns `true` if the flag changed
    pub fn deactivate(&mut self, entity: Entity) -> bool {
        match self.entities.get_mut(entity) {
            Some(record) if record.active => {
                record.active = false;
                true
            }
            _ => false,
        }
    }

    /// Activation counter, used to tell one activation of a pooled entity
    /// from the next
    pub fn activations(&self, entity: Entity) -> Option<u32> {
        self.entities.get(entity).map(|record| record.activations)
    }

    /// Replace an entity's transform
    pub fn set_transform(&mut self, entity: Entity, transform: Transform) -> bool {
        self.entities
            .get_mut(entity)
            .map(|record| record.transform = transform)
            .is_some()
    }

    /// Replace an entity's position
    pub fn set_position(&mut self, entity: Entity, position: Vec3) -> bool {
        self.entities
            .get_mut(entity)
            .map(|record| record.transform.position = position)
            .is_some()
    }

    /// Replace an entity's rotation
    pub fn set_rotation(&mut self, entity: Entity, rotation: Quat) -> bool {
        self.entities
            .get_mut(entity)
            .map(|record| record.transform.rotation = rotation)
            .is_some()
    }

    /// Replace an entity's velocity
    pub fn set_velocity(&mut self, entity: Entity, velocity: Vec3) -> bool {
        self.entities
            .get_mut(entity)
            .map(|record| record.velocity = velocity)
            .is_some()
    }

    /// Children of an entity; empty for unknown entities
    pub fn children(&self, entity: Entity) -> &[Entity] {
        self.entities
            .get(entity)
            .map(|record| record.children.as_slice())
            .unwrap_or(&[])
    }

    /// Transform of an entity in world space, composed through its parents
    pub fn world_transform(&self, entity: Entity) -> Option<Transform> {
        let record = self.entities.get(entity)?;
        match record.parent {
            Some(parent) => Some(self.world_transform(parent)?.compose(&record.transform)),
            None => Some(record.transform),
        }
    }

    /// World position of an entity
    pub fn position(&self, entity: Entity) -> Option<Vec3> {
        self.world_transform(entity).map(|t| t.position)
    }

    /// Locate a marker on an entity and return its world-space frame
    ///
    /// Markers are matched by name first, then by tag.
    pub fn find_marker(&self, entity: Entity, name: &str) -> Option<Transform> {
        let record = self.entities.get(entity)?;
        let marker = record
            .markers
            .iter()
            .find(|m| m.name == name)
            .or_else(|| record.markers.iter().find(|m| m.tag.as_deref() == Some(name)))?;
        Some(self.world_transform(entity)?.compose(&marker.local))
    }

    /// Translate every active root entity by its velocity
    pub fn integrate(&mut self, delta_time: f32) {
        for record in self.entities.values_mut() {
            if record.active && record.parent.is_none() && record.velocity != Vec3::zeros() {
                record.transform.position += record.velocity * delta_time;
            }
        }
    }
}
