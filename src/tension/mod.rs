//! Tension and hostility pipeline: incident accounting per faction pair and
//! district, escalation stages, and the single fight-authorization gate.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::control::ControlEngine;
use crate::model::{
    DistrictId, EscalationStage, EventLog, FactionId, IncidentKind, Position, Stance, TensionKey,
    TensionRecord, WorldEventKind,
};
use crate::overlay::OverlayResolver;

/// Tuning knobs for the tension pipeline.
#[derive(Debug, Clone)]
pub struct TensionConfig {
    /// Tension removed per idle day from every pair without an incident.
    pub idle_decay: f64,
    /// Tension at or above which a fight is authorized absent overrides.
    pub hostility_threshold: f64,
}

impl Default for TensionConfig {
    fn default() -> Self {
        Self {
            idle_decay: 0.05,
            hostility_threshold: 0.6,
        }
    }
}

/// Why a fight request was authorized or denied.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FightReason {
    Truce,
    AllyOverride,
    HuntOverride,
    SameFaction,
    StandingHostility,
    TensionThreshold,
    BelowThreshold,
}

impl FightReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FightReason::Truce => "truce",
            FightReason::AllyOverride => "ally_override",
            FightReason::HuntOverride => "hunt_override",
            FightReason::SameFaction => "same_faction",
            FightReason::StandingHostility => "standing_hostility",
            FightReason::TensionThreshold => "tension_threshold",
            FightReason::BelowThreshold => "below_threshold",
        }
    }
}

impl fmt::Display for FightReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one authorization query. Ephemeral: computed fresh per request,
/// never cached, since overlay and tension state move between turns.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FightAuthorization {
    pub authorized: bool,
    pub reason: FightReason,
    pub stage: EscalationStage,
    pub tension: f64,
}

impl FightAuthorization {
    fn denied(reason: FightReason, stage: EscalationStage, tension: f64) -> Self {
        Self {
            authorized: false,
            reason,
            stage,
            tension,
        }
    }

    fn authorized(reason: FightReason, stage: EscalationStage, tension: f64) -> Self {
        Self {
            authorized: true,
            reason,
            stage,
            tension,
        }
    }
}

/// Owns every tension record and the baseline stance table.
#[derive(Debug)]
pub struct TensionPipeline {
    records: BTreeMap<TensionKey, TensionRecord>,
    stances: BTreeMap<(FactionId, FactionId), Stance>,
    config: TensionConfig,
}

impl TensionPipeline {
    pub fn new(config: TensionConfig) -> Self {
        Self {
            records: BTreeMap::new(),
            stances: BTreeMap::new(),
            config,
        }
    }

    /// Record one incident between two factions in a district, lazily
    /// creating the tension record and re-deriving the escalation stage.
    pub fn record_incident(
        &mut self,
        a: FactionId,
        b: FactionId,
        district: DistrictId,
        kind: IncidentKind,
        day: u32,
        events: &mut EventLog,
    ) {
        if a == b {
            tracing::warn!(faction = a.0, "incident between a faction and itself ignored");
            return;
        }
        let key = TensionKey::new(a, b, district);
        let record = self
            .records
            .entry(key)
            .or_insert_with(|| TensionRecord::new(a, b, district));

        let before = record.stage;
        record.tension = (record.tension + kind.delta()).clamp(0.0, 1.0);
        record.stage = EscalationStage::for_tension(record.tension);
        record.last_incident_day = day;
        record.last_incident = Some(kind);
        record.incident_count += 1;

        if record.stage != before {
            tracing::debug!(
                district = district.0,
                a = key.low.0,
                b = key.high.0,
                ?before,
                after = ?record.stage,
                "escalation stage changed"
            );
            events.push(
                day,
                WorldEventKind::StageChanged {
                    district,
                    a: key.low,
                    b: key.high,
                    from: before,
                    to: record.stage,
                },
            );
        }
    }

    /// Apply the per-day idle decay to every pair with no incident today.
    /// Tension floors at zero; records are kept until explicitly cleared.
    pub fn decay_idle(&mut self, today: u32) {
        for record in self.records.values_mut() {
            if record.last_incident_day == today && record.incident_count > 0 {
                continue;
            }
            record.tension = (record.tension - self.config.idle_decay).max(0.0);
            record.stage = EscalationStage::for_tension(record.tension);
        }
    }

    /// Drop a pair's record entirely (diplomacy resets, debug tooling).
    pub fn clear(&mut self, a: FactionId, b: FactionId, district: DistrictId) -> bool {
        self.records
            .remove(&TensionKey::new(a, b, district))
            .is_some()
    }

    pub fn record(
        &self,
        a: FactionId,
        b: FactionId,
        district: DistrictId,
    ) -> Option<&TensionRecord> {
        self.records.get(&TensionKey::new(a, b, district))
    }

    pub fn records(&self) -> impl Iterator<Item = &TensionRecord> {
        self.records.values()
    }

    /// Set the baseline stance between two factions. Symmetric; stance with
    /// oneself is a logged no-op.
    pub fn set_stance(&mut self, a: FactionId, b: FactionId, stance: Stance) {
        if a == b {
            tracing::warn!(faction = a.0, "stance toward own faction ignored");
            return;
        }
        self.stances.insert(stance_key(a, b), stance);
    }

    pub fn stance(&self, a: FactionId, b: FactionId) -> Stance {
        self.stances.get(&stance_key(a, b)).copied().unwrap_or_default()
    }

    /// The single gate every attack request goes through.
    ///
    /// Precedence: truce denies everything; an area alliance protecting the
    /// target denies; an area hunt on the target authorizes regardless of
    /// tension; then standing hostility or the tension threshold decide.
    /// A position outside any district has no record and defaults to deny.
    pub fn authorize_fight(
        &self,
        attacker: FactionId,
        target: FactionId,
        position: Position,
        overlay: &OverlayResolver,
        control: &ControlEngine,
    ) -> FightAuthorization {
        let (stage, tension) = match control.district_by_position(position) {
            Some(district) => self
                .record(attacker, target, district.id)
                .map(|r| (r.stage, r.tension))
                .unwrap_or((EscalationStage::Calm, 0.0)),
            None => (EscalationStage::Calm, 0.0),
        };

        let rules = overlay.rules_at(position);
        if rules.truce {
            return FightAuthorization::denied(FightReason::Truce, stage, tension);
        }
        if rules.ally == Some(target) {
            return FightAuthorization::denied(FightReason::AllyOverride, stage, tension);
        }
        if rules.hunt == Some(target) {
            return FightAuthorization::authorized(FightReason::HuntOverride, stage, tension);
        }
        if attacker == target {
            return FightAuthorization::denied(FightReason::SameFaction, stage, tension);
        }
        if self.stance(attacker, target) == Stance::Hostile {
            return FightAuthorization::authorized(FightReason::StandingHostility, stage, tension);
        }
        if tension >= self.config.hostility_threshold {
            return FightAuthorization::authorized(FightReason::TensionThreshold, stage, tension);
        }
        FightAuthorization::denied(FightReason::BelowThreshold, stage, tension)
    }

    /// Persistable parts: all records plus the stance table.
    pub fn to_parts(&self) -> (Vec<TensionRecord>, Vec<(FactionId, FactionId, Stance)>) {
        let records = self.records.values().cloned().collect();
        let stances = self
            .stances
            .iter()
            .map(|(&(a, b), &s)| (a, b, s))
            .collect();
        (records, stances)
    }

    pub fn from_parts(
        records: Vec<TensionRecord>,
        stances: Vec<(FactionId, FactionId, Stance)>,
        config: TensionConfig,
    ) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.key(), r)).collect(),
            stances: stances
                .into_iter()
                .map(|(a, b, s)| (stance_key(a, b), s))
                .collect(),
            config,
        }
    }

    /// Replace records and stances in place, keeping the current configuration.
    pub fn restore_parts(
        &mut self,
        records: Vec<TensionRecord>,
        stances: Vec<(FactionId, FactionId, Stance)>,
    ) {
        self.records = records.into_iter().map(|r| (r.key(), r)).collect();
        self.stances = stances
            .into_iter()
            .map(|(a, b, s)| (stance_key(a, b), s))
            .collect();
    }
}

fn stance_key(a: FactionId, b: FactionId) -> (FactionId, FactionId) {
    if a <= b { (a, b) } else { (b, a) }
}
