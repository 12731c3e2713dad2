use serde::{Deserialize, Serialize};

use super::position::{Bounds, Position};

/// A faction slot index into per-district standing arrays.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct FactionId(pub u8);

impl FactionId {
    pub fn slot(self) -> usize {
        self.0 as usize
    }
}

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct DistrictId(pub u16);

/// A faction holds no effective presence below this control level.
pub const OWNERSHIP_EPSILON: f64 = 0.05;

/// Static district data. Immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct District {
    pub id: DistrictId,
    pub name: String,
    pub bounds: Bounds,
    pub population: u32,
    /// How observable activity in this district is, 0.0-1.0.
    pub visibility: f64,
    /// Economic weight of the district, 0.0-1.0.
    pub economic_value: f64,
    /// Baseline disorder `q`, the floor of the instability equation, 0.0-1.0.
    pub baseline_disorder: f64,
}

impl District {
    pub fn contains(&self, pos: Position) -> bool {
        self.bounds.contains(pos)
    }
}

/// One faction's standing within a single district. All rate fields 0.0-1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactionStanding {
    pub control: f64,
    pub patrol: f64,
    pub legitimacy: f64,
    pub institutions: f64,
    pub registry: f64,
    pub corruption: f64,
    /// Consecutive days this faction's control has sat below the loss threshold.
    pub loss_streak: u32,
}

impl Default for FactionStanding {
    fn default() -> Self {
        Self {
            control: 0.0,
            patrol: 0.0,
            legitimacy: 0.5,
            institutions: 0.0,
            registry: 0.0,
            corruption: 0.0,
            loss_streak: 0,
        }
    }
}

impl FactionStanding {
    /// Clamp every rate field back into 0.0-1.0.
    pub fn clamp_all(&mut self) {
        self.control = self.control.clamp(0.0, 1.0);
        self.patrol = self.patrol.clamp(0.0, 1.0);
        self.legitimacy = self.legitimacy.clamp(0.0, 1.0);
        self.institutions = self.institutions.clamp(0.0, 1.0);
        self.registry = self.registry.clamp(0.0, 1.0);
        self.corruption = self.corruption.clamp(0.0, 1.0);
    }
}

/// Dynamic per-district state, owned by the control engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictState {
    /// Indexed by faction slot; fixed length for the life of the simulation.
    pub factions: Vec<FactionStanding>,
    pub heat: f64,
    pub contradiction_density: f64,
    /// Heat accumulated from palimpsest edits/cleanups, consumed on the next day tick.
    pub pending_heat: f64,
}

impl DistrictState {
    pub fn new(faction_count: usize) -> Self {
        Self {
            factions: vec![FactionStanding::default(); faction_count],
            heat: 0.0,
            contradiction_density: 0.0,
            pending_heat: 0.0,
        }
    }

    pub fn faction(&self, id: FactionId) -> Option<&FactionStanding> {
        self.factions.get(id.slot())
    }

    pub fn faction_mut(&mut self, id: FactionId) -> Option<&mut FactionStanding> {
        self.factions.get_mut(id.slot())
    }

    /// The faction with the highest effective control, if any holds the district.
    pub fn owner(&self) -> Option<FactionId> {
        self.factions
            .iter()
            .enumerate()
            .filter(|(_, f)| f.control > OWNERSHIP_EPSILON)
            .max_by(|(_, a), (_, b)| a.control.total_cmp(&b.control))
            .map(|(slot, _)| FactionId(slot as u8))
    }

    /// Top and second control values (0.0 when fewer than two factions present).
    pub fn top_two_control(&self) -> (f64, f64) {
        let mut top = 0.0f64;
        let mut second = 0.0f64;
        for f in &self.factions {
            if f.control > top {
                second = top;
                top = f.control;
            } else if f.control > second {
                second = f.control;
            }
        }
        (top, second)
    }

    /// Highest control held by any faction other than `id`.
    pub fn opponent_pressure(&self, id: FactionId) -> f64 {
        self.factions
            .iter()
            .enumerate()
            .filter(|(slot, _)| *slot != id.slot())
            .map(|(_, f)| f.control)
            .fold(0.0, f64::max)
    }
}
