//! Entity storage
//!
//! Flat entity records with explicit activation state, parent links and
//! named markers. Game crates attach their own behavior on top.

pub mod entity;
pub mod world;

pub use entity::{Entity, VariantId};
pub use world::{EntityRecord, Marker, World};
