//! Entity Pool
//!
//! Reusable entity storage keyed by variant. Handles are created once and
//! then cycled between "active in the world" and "inactive in the pool" by
//! flipping the entity's `active` flag; nothing is ever destroyed.
//!
//! # Capacity
//!
//! - [`Capacity::PerVariant`]: each variant may hold up to `n` handles
//!   (platform segments).
//! - [`Capacity::Shared`]: all variants together may hold up to `n` handles
//!   (transient obstacles).
//!
//! Once the bound is reached [`Pool::acquire`] reports [`Acquire::Full`] and
//! the caller decides what to do: evict something it owns, give up, or
//! [`Pool::insert`] one more handle past the bound.
//!
//! # Usage
//!
//! ```rust
//! use lane_engine::ecs::{EntityRecord, VariantId, World};
//! use lane_engine::pool::{Capacity, Pool};
//!
//! let mut world = World::new();
//! let mut pool = Pool::new(Capacity::PerVariant(4));
//!
//! let acquired = pool.acquire(&mut world, VariantId(0), |world| {
//!     world.spawn(EntityRecord::new("Platform", VariantId(0)))
//! });
//! let entity = acquired.entity().expect("pool has room");
//! world.activate(entity);
//!
//! // Later, return it
//! pool.release(&mut world, entity);
//! ```

use std::collections::HashMap;
use std::hash::Hash;

use crate::ecs::{Entity, World};

/// Upper bound on the number of handles a pool creates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    /// Bound applies to each variant separately
    PerVariant(usize),
    /// Bound applies to all variants together
    Shared(usize),
}

/// Outcome of [`Pool::acquire`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    /// An inactive pooled handle was found
    Reused(Entity),
    /// A new handle was created and registered
    Created(Entity),
    /// No inactive handle and the capacity bound is reached
    Full,
}

impl Acquire {
    /// The acquired entity, if any
    pub fn entity(self) -> Option<Entity> {
        match self {
            Self::Reused(entity) | Self::Created(entity) => Some(entity),
            Self::Full => None,
        }
    }
}

/// Counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Handles created within capacity
    pub created: u64,
    /// Acquisitions served by an inactive handle
    pub reused: u64,
    /// Handles registered beyond capacity
    pub overflow: u64,
    /// Acquisitions that hit the capacity bound
    pub exhausted: u64,
    /// Handles returned to the pool
    pub released: u64,
}

/// Pool of reusable entities keyed by variant
#[derive(Debug)]
pub struct Pool<V> {
    /// Handles per variant, in creation order
    slots: HashMap<V, Vec<Entity>>,
    /// Every handle with its variant, in creation order
    all: Vec<(V, Entity)>,
    capacity: Capacity,
    stats: PoolStats,
}

impl<V: Copy + Eq + Hash> Pool<V> {
    /// Create an empty pool
    pub fn new(capacity: Capacity) -> Self {
        Self {
            slots: HashMap::new(),
            all: Vec::new(),
            capacity,
            stats: PoolStats::default(),
        }
    }

    /// Configured capacity
    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// Total number of handles owned by the pool
    pub fn len(&self) -> usize {
        self.all.len()
    }

    /// Whether the pool owns no handles
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// Handles of one variant, in creation order
    pub fn handles(&self, variant: V) -> &[Entity] {
        self.slots.get(&variant).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every handle with its variant, in creation order
    pub fn iter(&self) -> impl Iterator<Item = (V, Entity)> + '_ {
        self.all.iter().copied()
    }

    /// Whether the pool owns `entity`
    pub fn contains(&self, entity: Entity) -> bool {
        self.all.iter().any(|&(_, e)| e == entity)
    }

    /// Variant of a pooled entity
    pub fn variant_of(&self, entity: Entity) -> Option<V> {
        self.all.iter().find(|&&(_, e)| e == entity).map(|&(v, _)| v)
    }

    /// Whether another handle of `variant` may be created within capacity
    pub fn has_room(&self, variant: V) -> bool {
        match self.capacity {
            Capacity::PerVariant(max) => self.handles(variant).len() < max,
            Capacity::Shared(max) => self.all.len() < max,
        }
    }

    /// First inactive handle of `variant`
    pub fn find_inactive(&self, world: &World, variant: V) -> Option<Entity> {
        self.handles(variant)
            .iter()
            .copied()
            .find(|&e| !world.is_active(e))
    }

    /// First inactive handle of any variant
    pub fn find_any_inactive(&self, world: &World) -> Option<Entity> {
        self.all
            .iter()
            .map(|&(_, e)| e)
            .find(|&e| !world.is_active(e))
    }

    /// Number of handles of `variant` currently active in the world
    pub fn active_count(&self, world: &World, variant: V) -> usize {
        self.handles(variant)
            .iter()
            .filter(|&&e| world.is_active(e))
            .count()
    }

    /// Number of handles of any variant currently inactive
    pub fn inactive_count(&self, world: &World) -> usize {
        self.all.iter().filter(|&&(_, e)| !world.is_active(e)).count()
    }

    /// Register a handle, ignoring the capacity bound
    ///
    /// Used for pre-warming and as the soft-cap fallback; handles past the
    /// bound are counted as overflow.
    pub fn insert(&mut self, variant: V, entity: Entity) {
        if self.contains(entity) {
            return;
        }
        if self.has_room(variant) {
            self.stats.created += 1;
        } else {
            self.stats.overflow += 1;
        }
        self.slots.entry(variant).or_default().push(entity);
        self.all.push((variant, entity));
    }

    /// Get an inactive handle of `variant`, creating one if capacity allows
    ///
    /// `create` must spawn an inactive entity; the caller activates the
    /// returned handle once it has been positioned.
    pub fn acquire<F>(&mut self, world: &mut World, variant: V, create: F) -> Acquire
    where
        F: FnOnce(&mut World) -> Entity,
    {
        if let Some(entity) = self.find_inactive(world, variant) {
            self.stats.reused += 1;
            return Acquire::Reused(entity);
        }
        if self.has_room(variant) {
            let entity = create(world);
            self.insert(variant, entity);
            return Acquire::Created(entity);
        }
        self.stats.exhausted += 1;
        log::trace!("Pool exhausted ({} handles)", self.all.len());
        Acquire::Full
    }

    /// Get an inactive handle of any variant, creating one if capacity allows
    ///
    /// `create` picks the variant of the new handle.
    pub fn acquire_any<F>(&mut self, world: &mut World, create: F) -> Acquire
    where
        F: FnOnce(&mut World) -> (V, Entity),
    {
        if let Some(entity) = self.find_any_inactive(world) {
            self.stats.reused += 1;
            return Acquire::Reused(entity);
        }
        let has_room = match self.capacity {
            Capacity::Shared(max) => self.all.len() < max,
            // Without a variant there is nothing to bound per variant
            Capacity::PerVariant(_) => true,
        };
        if has_room {
            let (variant, entity) = create(world);
            self.insert(variant, entity);
            return Acquire::Created(entity);
        }
        self.stats.exhausted += 1;
        log::trace!("Pool exhausted ({} handles)", self.all.len());
        Acquire::Full
    }

    /// Return a handle to the pool by deactivating it
    ///
    /// Returns `false` for handles the pool does not own or that are already
    /// inactive.
    pub fn release(&mut self, world: &mut World, entity: Entity) -> bool {
        if !self.contains(entity) || !world.deactivate(entity) {
            return false;
        }
        self.stats.released += 1;
        true
    }

    /// Counters
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }
}
