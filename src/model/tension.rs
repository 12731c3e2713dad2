use serde::{Deserialize, Serialize};

use super::district::{DistrictId, FactionId};

/// Discrete escalation bucket derived from accumulated tension.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EscalationStage {
    Calm,
    Uneasy,
    Tense,
    Volatile,
    Explosive,
}

impl EscalationStage {
    /// Pure bucket mapping over five contiguous half-open intervals covering 0.0-1.0.
    pub fn for_tension(tension: f64) -> Self {
        match tension {
            t if t >= 0.8 => EscalationStage::Explosive,
            t if t >= 0.6 => EscalationStage::Volatile,
            t if t >= 0.4 => EscalationStage::Tense,
            t if t >= 0.2 => EscalationStage::Uneasy,
            _ => EscalationStage::Calm,
        }
    }
}

/// Catalog of incidents that feed the tension pipeline.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IncidentKind {
    Insult,
    Vandalism,
    Theft,
    Intimidation,
    Sabotage,
    Assault,
    Arson,
    Murder,
}

impl IncidentKind {
    /// Fixed tension delta contributed by one incident of this kind.
    pub fn delta(self) -> f64 {
        match self {
            IncidentKind::Insult => 0.05,
            IncidentKind::Vandalism => 0.10,
            IncidentKind::Theft => 0.15,
            IncidentKind::Intimidation => 0.20,
            IncidentKind::Sabotage => 0.30,
            IncidentKind::Assault => 0.35,
            IncidentKind::Arson => 0.40,
            IncidentKind::Murder => 0.50,
        }
    }
}

/// Baseline diplomatic stance between two factions, independent of tension.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    Allied,
    #[default]
    Neutral,
    Hostile,
}

/// Key for a tension record: an unordered faction pair within one district.
///
/// Construction normalizes the pair so `(a, b)` and `(b, a)` address the
/// same record — tension is symmetric.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TensionKey {
    pub low: FactionId,
    pub high: FactionId,
    pub district: DistrictId,
}

impl TensionKey {
    pub fn new(a: FactionId, b: FactionId, district: DistrictId) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self { low, high, district }
    }
}

/// Accumulated hostility between a faction pair within one district.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensionRecord {
    pub a: FactionId,
    pub b: FactionId,
    pub district: DistrictId,
    /// Current tension, 0.0-1.0.
    pub tension: f64,
    pub stage: EscalationStage,
    pub last_incident_day: u32,
    pub last_incident: Option<IncidentKind>,
    pub incident_count: u64,
}

impl TensionRecord {
    pub fn new(a: FactionId, b: FactionId, district: DistrictId) -> Self {
        let key = TensionKey::new(a, b, district);
        Self {
            a: key.low,
            b: key.high,
            district,
            tension: 0.0,
            stage: EscalationStage::Calm,
            last_incident_day: 0,
            last_incident: None,
            incident_count: 0,
        }
    }

    pub fn key(&self) -> TensionKey {
        TensionKey::new(self.a, self.b, self.district)
    }
}
