//! Game-specific entity data
//!
//! The engine world only knows transforms and activation; everything else
//! the game tracks per entity lives here.

use lane_engine::ecs::VariantId;

/// Kind of child slot owned by a platform segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// Static obstacle that blocks a lane for the segment's lifetime
    StaticObstacle,

    /// Collectible worth points
    ScoreItem,
}

impl SlotKind {
    /// Variant tag stored on slot entities
    pub fn variant(self) -> VariantId {
        match self {
            Self::StaticObstacle => VariantId(0),
            Self::ScoreItem => VariantId(1),
        }
    }

    /// Slot kind of a variant tag
    pub fn from_variant(variant: VariantId) -> Option<Self> {
        match variant.index() {
            0 => Some(Self::StaticObstacle),
            1 => Some(Self::ScoreItem),
            _ => None,
        }
    }

    /// Entity name for slots of this kind
    pub fn entity_name(self) -> &'static str {
        match self {
            Self::StaticObstacle => "StaticObstacle",
            Self::ScoreItem => "ScoreItem",
        }
    }
}

/// Score item currently shown on a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreItem {
    /// Index into the configured score kinds
    pub kind: usize,

    /// Points awarded on pickup
    pub value: u32,
}

/// Running score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    /// Points collected
    pub points: u64,

    /// Items picked up
    pub pickups: u32,
}

impl Score {
    /// Add one pickup worth `value`
    pub fn add(&mut self, value: u32) {
        self.points += u64::from(value);
        self.pickups += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_variant_round_trip() {
        for kind in [SlotKind::StaticObstacle, SlotKind::ScoreItem] {
            assert_eq!(SlotKind::from_variant(kind.variant()), Some(kind));
        }
        assert_eq!(SlotKind::from_variant(VariantId(7)), None);
    }

    #[test]
    fn test_score_accumulates() {
        let mut score = Score::default();
        score.add(1);
        score.add(5);
        assert_eq!(score, Score { points: 6, pickups: 2 });
    }
}
