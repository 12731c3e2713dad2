use serde::{Deserialize, Serialize};

use super::token::LayerEffects;
use crate::model::{Bounds, FactionId, Position};

/// Identifier for an overlay layer. Monotonically assigned, never reused.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct LayerId(pub u64);

/// A time-limited, radius-bounded rule layer anchored at a position.
///
/// Layers are independent value objects; erasing one never affects another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayLayer {
    pub id: LayerId,
    pub center: Position,
    /// Manhattan radius of effect.
    pub radius: u32,
    /// Higher priority wins exclusive-field conflicts.
    pub priority: i32,
    /// Raw tokens as inscribed, kept for display and round-tripping.
    pub tokens: Vec<String>,
    pub turns_remaining: u32,
    pub effects: LayerEffects,
    /// Faction that inscribed the layer, when known. Conquest cleanup
    /// targets layers by this field.
    pub owner: Option<FactionId>,
}

impl OverlayLayer {
    /// Whether the layer's rules apply at `pos`.
    pub fn covers(&self, pos: Position) -> bool {
        self.center.manhattan_distance(pos) <= self.radius
    }

    /// Whether the layer's area touches the given district bounds.
    pub fn overlaps(&self, bounds: &Bounds) -> bool {
        bounds.manhattan_distance_to(self.center) <= self.radius
    }
}
