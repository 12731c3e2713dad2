//! Territorial control engine: per-district, per-faction standing and the
//! daily tick that moves it.

mod formula;
mod incidents;

use std::collections::BTreeMap;

use rand::{Rng, RngCore};

use crate::model::{
    District, DistrictId, DistrictState, EventLog, FactionId, Position, WorldEventKind,
    OWNERSHIP_EPSILON,
};
use crate::overlay::OverlayResolver;
use crate::tension::TensionPipeline;

pub use formula::quick_control_step;

/// Tuning knobs for the control engine.
#[derive(Debug, Clone)]
pub struct ControlConfig {
    /// Heat removed from every district each day before new heat lands.
    pub baseline_heat_decay: f64,
    /// Summed control a faction can administer before enforcement degrades.
    pub admin_capacity: f64,
    /// Control below this level counts toward the loss streak.
    pub loss_threshold: f64,
    /// Consecutive days below the threshold before the district is lost.
    pub loss_streak_days: u32,
    /// Expected incidents per day in a fully hot, contested, rich district.
    pub incident_base_rate: f64,
    /// Lifetime of the unrest layer a vandalism incident inscribes.
    pub vandalism_layer_turns: u32,
    /// Manhattan radius of that layer.
    pub vandalism_layer_radius: u32,
    /// Unrest magnitude of that layer.
    pub vandalism_unrest: f64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            baseline_heat_decay: 0.05,
            admin_capacity: 3.0,
            loss_threshold: 0.15,
            loss_streak_days: 3,
            incident_base_rate: 0.8,
            vandalism_layer_turns: 6,
            vandalism_layer_radius: 3,
            vandalism_unrest: 0.04,
        }
    }
}

/// Owns all district static data and dynamic state. Mutation happens only in
/// [`advance_day`](Self::advance_day) and the explicit adjustment calls.
#[derive(Debug)]
pub struct ControlEngine {
    districts: BTreeMap<DistrictId, District>,
    states: BTreeMap<DistrictId, DistrictState>,
    faction_count: usize,
    config: ControlConfig,
}

impl ControlEngine {
    pub fn new(districts: Vec<District>, faction_count: usize, config: ControlConfig) -> Self {
        let states = districts
            .iter()
            .map(|d| (d.id, DistrictState::new(faction_count)))
            .collect();
        Self {
            districts: districts.into_iter().map(|d| (d.id, d)).collect(),
            states,
            faction_count,
            config,
        }
    }

    pub fn faction_count(&self) -> usize {
        self.faction_count
    }

    pub fn district(&self, id: DistrictId) -> Option<&District> {
        self.districts.get(&id)
    }

    pub fn districts(&self) -> impl Iterator<Item = &District> {
        self.districts.values()
    }

    pub fn district_by_position(&self, pos: Position) -> Option<&District> {
        self.districts.values().find(|d| d.contains(pos))
    }

    pub fn state_by_id(&self, id: DistrictId) -> Option<&DistrictState> {
        self.states.get(&id)
    }

    pub fn state_by_position(&self, pos: Position) -> Option<&DistrictState> {
        let district = self.district_by_position(pos)?;
        self.states.get(&district.id)
    }

    /// Faction with the highest effective control of a district.
    pub fn owner(&self, id: DistrictId) -> Option<FactionId> {
        self.states.get(&id)?.owner()
    }

    /// Clamp a faction's patrol by `delta` and synchronously recompute its
    /// control, so callers observe the effect immediately rather than after
    /// the next day tick. Unknown district/faction is a logged no-op.
    pub fn adjust_patrol(&mut self, district: DistrictId, faction: FactionId, delta: f64) {
        let Some(state) = self.states.get_mut(&district) else {
            tracing::warn!(district = district.0, "adjust_patrol on unknown district");
            return;
        };
        let heat = state.heat;
        let Some(standing) = state.faction_mut(faction) else {
            tracing::warn!(
                district = district.0,
                faction = faction.0,
                "adjust_patrol on unknown faction slot"
            );
            return;
        };
        standing.patrol = (standing.patrol + delta).clamp(0.0, 1.0);
        standing.control = quick_control_step(standing.control, standing.patrol, heat);
    }

    /// Queue heat from a palimpsest edit (inscribing over older text).
    /// Consumed on the next day tick.
    pub fn apply_palimpsest_edit(&mut self, district: DistrictId, intensity: f64) {
        match self.states.get_mut(&district) {
            Some(state) => state.pending_heat += intensity.max(0.0),
            None => tracing::warn!(district = district.0, "palimpsest edit on unknown district"),
        }
    }

    /// Queue heat relief from a cleanup action.
    pub fn apply_cleanup(&mut self, district: DistrictId, intensity: f64) {
        match self.states.get_mut(&district) {
            Some(state) => state.pending_heat -= intensity.max(0.0),
            None => tracing::warn!(district = district.0, "cleanup on unknown district"),
        }
    }

    /// Re-derive contradiction density from the current layer set, so queries
    /// in the same turn as an inscription see its effect.
    pub fn refresh_contradiction(&mut self, overlay: &OverlayResolver) {
        for (id, state) in &mut self.states {
            if let Some(district) = self.districts.get(id) {
                state.contradiction_density = overlay.contradiction_heat(&district.bounds);
            }
        }
    }

    /// The full daily tick, in fixed step order: derived quantities, stat
    /// drift, enforcement and control updates, heat settlement, incident
    /// generation, loss-streak resolution.
    pub fn advance_day(
        &mut self,
        day: u32,
        rng: &mut dyn RngCore,
        overlay: &mut OverlayResolver,
        tension: &mut TensionPipeline,
        events: &mut EventLog,
    ) {
        // Step 1: per-district instability and closeness from start-of-day state.
        let mut derived: BTreeMap<DistrictId, (f64, f64)> = BTreeMap::new();
        for (id, state) in &self.states {
            let Some(district) = self.districts.get(id) else {
                continue;
            };
            let instability = formula::instability(
                district.baseline_disorder,
                state.heat,
                state.contradiction_density,
            );
            let (top, second) = state.top_two_control();
            derived.insert(*id, (instability, formula::closeness(top, second)));
        }

        // Overcap from each faction's start-of-day global admin load.
        let mut overcap = vec![1.0f64; self.faction_count];
        for (slot, multiplier) in overcap.iter_mut().enumerate() {
            let load: f64 = self
                .states
                .values()
                .filter_map(|s| s.factions.get(slot))
                .map(|f| f.control)
                .sum();
            *multiplier = formula::overcap_multiplier(load, self.config.admin_capacity);
        }

        // Steps 2-4: stat drift, then enforcement-driven control updates.
        for (id, state) in &mut self.states {
            let (instability, _) = derived.get(id).copied().unwrap_or((0.0, 0.0));
            let heat = state.heat;

            // Opponent pressure is read from start-of-day control so update
            // order within the district cannot matter.
            let pressures: Vec<f64> = (0..state.factions.len())
                .map(|slot| state.opponent_pressure(FactionId(slot as u8)))
                .collect();

            for (slot, standing) in state.factions.iter_mut().enumerate() {
                standing.patrol = formula::patrol_step(standing.patrol, instability);
                standing.institutions =
                    formula::institutions_step(standing.institutions, standing.control, instability);
                standing.registry =
                    formula::registry_step(standing.registry, standing.institutions, standing.corruption);
                standing.corruption =
                    formula::corruption_step(standing.corruption, standing.legitimacy, standing.registry);
                standing.legitimacy =
                    formula::legitimacy_step(standing.legitimacy, instability, heat);
                standing.clamp_all();

                let enforcement = formula::enforcement(
                    standing.patrol,
                    standing.institutions,
                    standing.registry,
                    standing.corruption,
                );
                standing.control = formula::control_step(
                    standing.control,
                    enforcement,
                    standing.legitimacy,
                    overcap.get(slot).copied().unwrap_or(1.0),
                    instability,
                    pressures.get(slot).copied().unwrap_or(0.0),
                );
            }
        }

        // Step 5: settle heat and refresh contradiction density.
        for (id, state) in &mut self.states {
            let Some(district) = self.districts.get(id) else {
                continue;
            };
            let ambient = overlay.ambient_unrest(&district.bounds);
            state.heat = (state.heat + state.pending_heat + ambient
                - self.config.baseline_heat_decay)
                .clamp(0.0, 1.0);
            state.pending_heat = 0.0;
            state.contradiction_density = overlay.contradiction_heat(&district.bounds);
        }

        // Step 6: incident generation.
        self.generate_incidents(day, rng, overlay, tension, events, &derived);

        // Step 7: loss streaks and district flips.
        self.resolve_loss_streaks(day, overlay, events);
    }

    fn generate_incidents(
        &mut self,
        day: u32,
        rng: &mut dyn RngCore,
        overlay: &mut OverlayResolver,
        tension: &mut TensionPipeline,
        events: &mut EventLog,
        derived: &BTreeMap<DistrictId, (f64, f64)>,
    ) {
        for (id, state) in &self.states {
            let Some(district) = self.districts.get(id) else {
                continue;
            };
            let Some((a, b)) = top_two_slots(state) else {
                continue;
            };
            let (instability, closeness) = derived.get(id).copied().unwrap_or((0.0, 0.0));

            let mut rate = incidents::incident_rate(
                self.config.incident_base_rate,
                district.economic_value,
                instability,
                closeness,
                state.heat,
            );
            // Only observed incidents feed the pipeline; quiet districts
            // swallow some of theirs.
            rate *= 0.5 + 0.5 * district.visibility;
            if overlay.curfew_touching(&district.bounds) {
                rate *= incidents::CURFEW_SUPPRESSION;
            }

            for _ in 0..incidents::poisson(rng, rate) {
                let kind = incidents::pick_kind(rng);
                events.push(
                    day,
                    WorldEventKind::IncidentOccurred {
                        district: *id,
                        a,
                        b,
                        incident: kind,
                    },
                );
                tension.record_incident(a, b, *id, kind, day, events);

                if kind == crate::model::IncidentKind::Vandalism {
                    // The challenger scrawls unrest into the district.
                    let pos = random_position_in(rng, district);
                    let token = format!("UNREST:{}", self.config.vandalism_unrest);
                    let layer = overlay.register_layer_for(
                        Some(b),
                        pos,
                        self.config.vandalism_layer_radius,
                        0,
                        vec![token],
                        self.config.vandalism_layer_turns,
                    );
                    events.push(day, WorldEventKind::LayerRegistered { layer });
                }
            }
        }
    }

    fn resolve_loss_streaks(
        &mut self,
        day: u32,
        overlay: &mut OverlayResolver,
        events: &mut EventLog,
    ) {
        for (id, state) in &mut self.states {
            // Several factions can collapse on the same day.
            let mut losers: Vec<FactionId> = Vec::new();
            for (slot, standing) in state.factions.iter_mut().enumerate() {
                if standing.control < self.config.loss_threshold {
                    standing.loss_streak += 1;
                } else {
                    standing.loss_streak = 0;
                }
                if standing.loss_streak >= self.config.loss_streak_days && standing.control > 0.0 {
                    standing.control = 0.0;
                    standing.loss_streak = 0;
                    losers.push(FactionId(slot as u8));
                }
            }
            if losers.is_empty() {
                continue;
            }

            let new_owner = state.owner();
            for loser in losers {
                tracing::debug!(
                    district = id.0,
                    faction = loser.0,
                    "faction lost district after sustained collapse"
                );
                events.push(
                    day,
                    WorldEventKind::DistrictLost {
                        district: *id,
                        faction: loser,
                        new_owner,
                    },
                );

                // Conquest scrubs the loser's inscriptions from the district.
                if new_owner.is_some() {
                    if let Some(district) = self.districts.get(id) {
                        let erased = overlay.erase_where(|l| {
                            l.owner == Some(loser) && l.overlaps(&district.bounds)
                        });
                        for layer in erased {
                            events.push(day, WorldEventKind::LayerErased { layer });
                        }
                    }
                }
            }
        }
    }

    /// Dynamic state for persistence, keyed by district.
    pub fn to_parts(&self) -> Vec<(DistrictId, DistrictState)> {
        self.states.iter().map(|(id, s)| (*id, s.clone())).collect()
    }

    /// Replace dynamic state from a snapshot. Entries for unknown districts
    /// are logged and dropped.
    pub fn restore_parts(&mut self, entries: Vec<(DistrictId, DistrictState)>) {
        for (id, state) in entries {
            if self.states.contains_key(&id) {
                self.states.insert(id, state);
            } else {
                tracing::warn!(district = id.0, "snapshot state for unknown district dropped");
            }
        }
    }
}

/// Top two factions by control, both above the presence epsilon.
fn top_two_slots(state: &DistrictState) -> Option<(FactionId, FactionId)> {
    let mut slots: Vec<(usize, f64)> = state
        .factions
        .iter()
        .enumerate()
        .filter(|(_, f)| f.control > OWNERSHIP_EPSILON)
        .map(|(slot, f)| (slot, f.control))
        .collect();
    if slots.len() < 2 {
        return None;
    }
    slots.sort_by(|a, b| b.1.total_cmp(&a.1));
    Some((FactionId(slots[0].0 as u8), FactionId(slots[1].0 as u8)))
}

fn random_position_in(rng: &mut dyn RngCore, district: &District) -> Position {
    Position::new(
        rng.random_range(district.bounds.min.x..=district.bounds.max.x),
        rng.random_range(district.bounds.min.y..=district.bounds.max.y),
    )
}
