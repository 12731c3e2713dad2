use serde::{Deserialize, Serialize};

use super::district::{DistrictId, FactionId};
use super::tension::{EscalationStage, IncidentKind};
use crate::overlay::LayerId;

/// Something notable the simulation did, kept for UI and debugging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldEvent {
    /// In-game day the event occurred on.
    pub day: u32,
    pub kind: WorldEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorldEventKind {
    /// A faction's control collapsed below the loss threshold for too long.
    DistrictLost {
        district: DistrictId,
        faction: FactionId,
        new_owner: Option<FactionId>,
    },

    /// A faction pair's escalation stage changed.
    StageChanged {
        district: DistrictId,
        a: FactionId,
        b: FactionId,
        from: EscalationStage,
        to: EscalationStage,
    },

    /// An inscription layer was registered.
    LayerRegistered { layer: LayerId },

    /// A layer ran out of turns and was removed.
    LayerExpired { layer: LayerId },

    /// A layer was erased before expiry (cleanup or conquest).
    LayerErased { layer: LayerId },

    /// The daily tick generated an incident between two factions.
    IncidentOccurred {
        district: DistrictId,
        a: FactionId,
        b: FactionId,
        incident: IncidentKind,
    },
}

/// Append-only log of world events. Not part of the persisted snapshot.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<WorldEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, day: u32, kind: WorldEventKind) {
        self.events.push(WorldEvent { day, kind });
    }

    pub fn events(&self) -> &[WorldEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_appends_in_order() {
        let mut log = EventLog::new();
        log.push(1, WorldEventKind::LayerExpired { layer: LayerId(7) });
        log.push(
            2,
            WorldEventKind::DistrictLost {
                district: DistrictId(0),
                faction: FactionId(1),
                new_owner: None,
            },
        );
        assert_eq!(log.len(), 2);
        assert_eq!(log.events()[0].day, 1);
        assert_eq!(log.events()[1].day, 2);
    }

    #[test]
    fn clear_empties_log() {
        let mut log = EventLog::new();
        log.push(1, WorldEventKind::LayerExpired { layer: LayerId(1) });
        log.clear();
        assert!(log.is_empty());
    }
}
