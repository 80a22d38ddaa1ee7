//! Entity implementation

use serde::{Deserialize, Serialize};

slotmap::new_key_type! {
    /// Entity identifier
    ///
    /// Generation-checked: a handle to a despawned entity never aliases a
    /// newer entity that reuses the same slot.
    pub struct Entity;
}

/// Variant (prefab) tag stored on each entity at creation
///
/// Identifies which blueprint an entity was instantiated from, replacing
/// name-prefix comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariantId(pub usize);

impl VariantId {
    /// Get the variant index
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for VariantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "variant#{}", self.0)
    }
}
