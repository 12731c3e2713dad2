//! World simulation orchestrator: owns the three components, the RNG, the
//! turn clock, and the event log, and drives the fixed turn-phase sequence.

use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::control::{ControlConfig, ControlEngine};
use crate::model::{
    District, DistrictId, DistrictState, EventLog, FactionId, IncidentKind, Position, Stance,
    TensionRecord, WorldEvent, WorldEventKind,
};
use crate::overlay::{LayerId, OverlayConfig, OverlayResolver, RuleSet};
use crate::snapshot::Snapshot;
use crate::tension::{FightAuthorization, TensionConfig, TensionPipeline};

/// Top-level simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub seed: u64,
    /// World turns per in-game day; the day tick runs on the boundary.
    pub turns_per_day: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            turns_per_day: 12,
        }
    }
}

/// The phases of one world turn, always run in this order.
///
/// Commands execute during Act (the open window between `end_turn` calls)
/// and are visible to queries later in the same turn. `end_turn` drives the
/// remaining phases.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TurnPhase {
    Act,
    Resolve,
    Decay,
    Advance,
}

impl TurnPhase {
    pub const SEQUENCE: [TurnPhase; 4] = [
        TurnPhase::Act,
        TurnPhase::Resolve,
        TurnPhase::Decay,
        TurnPhase::Advance,
    ];
}

/// The complete world state: control engine, overlay resolver, tension
/// pipeline, RNG, and clock. Single-threaded by design; build a fresh
/// instance per scenario or test.
#[derive(Debug)]
pub struct WorldSim {
    control: ControlEngine,
    overlay: OverlayResolver,
    tension: TensionPipeline,
    rng: SmallRng,
    events: EventLog,
    turn: u64,
    day: u32,
    config: SimConfig,
}

impl WorldSim {
    pub fn new(districts: Vec<District>, faction_count: usize, config: SimConfig) -> Self {
        Self::with_component_configs(
            districts,
            faction_count,
            config,
            ControlConfig::default(),
            OverlayConfig::default(),
            TensionConfig::default(),
        )
    }

    pub fn with_component_configs(
        districts: Vec<District>,
        faction_count: usize,
        config: SimConfig,
        control: ControlConfig,
        overlay: OverlayConfig,
        tension: TensionConfig,
    ) -> Self {
        Self {
            control: ControlEngine::new(districts, faction_count, control),
            overlay: OverlayResolver::new(overlay),
            tension: TensionPipeline::new(tension),
            rng: SmallRng::seed_from_u64(config.seed),
            events: EventLog::new(),
            turn: 0,
            day: 0,
            config,
        }
    }

    // --- Commands (Act phase) ---

    pub fn register_layer(
        &mut self,
        center: Position,
        radius: u32,
        priority: i32,
        tokens: Vec<String>,
        turns_remaining: u32,
    ) -> LayerId {
        self.register_layer_for(None, center, radius, priority, tokens, turns_remaining)
    }

    pub fn register_layer_for(
        &mut self,
        owner: Option<FactionId>,
        center: Position,
        radius: u32,
        priority: i32,
        tokens: Vec<String>,
        turns_remaining: u32,
    ) -> LayerId {
        let layer = self
            .overlay
            .register_layer_for(owner, center, radius, priority, tokens, turns_remaining);
        self.events
            .push(self.day, WorldEventKind::LayerRegistered { layer });
        layer
    }

    pub fn erase_layer(&mut self, layer: LayerId) -> bool {
        let erased = self.overlay.erase_layer(layer);
        if erased {
            self.events
                .push(self.day, WorldEventKind::LayerErased { layer });
        }
        erased
    }

    pub fn adjust_patrol(&mut self, district: DistrictId, faction: FactionId, delta: f64) {
        self.control.adjust_patrol(district, faction, delta);
    }

    pub fn apply_palimpsest_edit(&mut self, district: DistrictId, intensity: f64) {
        self.control.apply_palimpsest_edit(district, intensity);
    }

    pub fn apply_cleanup(&mut self, district: DistrictId, intensity: f64) {
        self.control.apply_cleanup(district, intensity);
    }

    /// Record an externally observed incident (player actions, scripted
    /// scenes) against the pair's tension.
    pub fn record_incident(
        &mut self,
        a: FactionId,
        b: FactionId,
        district: DistrictId,
        kind: IncidentKind,
    ) {
        if a == b {
            tracing::warn!(faction = a.0, "incident between a faction and itself ignored");
            return;
        }
        self.events.push(
            self.day,
            WorldEventKind::IncidentOccurred {
                district,
                a,
                b,
                incident: kind,
            },
        );
        self.tension
            .record_incident(a, b, district, kind, self.day, &mut self.events);
    }

    pub fn set_stance(&mut self, a: FactionId, b: FactionId, stance: Stance) {
        self.tension.set_stance(a, b, stance);
    }

    // --- Queries (read-only) ---

    pub fn rules_at(&self, pos: Position) -> RuleSet {
        self.overlay.rules_at(pos)
    }

    pub fn authorize_fight(
        &self,
        attacker: FactionId,
        target: FactionId,
        position: Position,
    ) -> FightAuthorization {
        self.tension
            .authorize_fight(attacker, target, position, &self.overlay, &self.control)
    }

    pub fn state_by_position(&self, pos: Position) -> Option<&DistrictState> {
        self.control.state_by_position(pos)
    }

    pub fn state_by_id(&self, id: DistrictId) -> Option<&DistrictState> {
        self.control.state_by_id(id)
    }

    pub fn district(&self, id: DistrictId) -> Option<&District> {
        self.control.district(id)
    }

    pub fn owner(&self, id: DistrictId) -> Option<FactionId> {
        self.control.owner(id)
    }

    pub fn stance(&self, a: FactionId, b: FactionId) -> Stance {
        self.tension.stance(a, b)
    }

    pub fn tension_record(
        &self,
        a: FactionId,
        b: FactionId,
        district: DistrictId,
    ) -> Option<&TensionRecord> {
        self.tension.record(a, b, district)
    }

    pub fn overlay(&self) -> &OverlayResolver {
        &self.overlay
    }

    pub fn events(&self) -> &[WorldEvent] {
        self.events.events()
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    // --- Turn driving ---

    /// Close the current turn: run Resolve, Decay, and Advance in order.
    /// The next Act window opens when this returns.
    pub fn end_turn(&mut self) {
        for phase in TurnPhase::SEQUENCE {
            self.run_phase(phase);
        }
    }

    fn run_phase(&mut self, phase: TurnPhase) {
        match phase {
            // Commands already executed synchronously during the window.
            TurnPhase::Act => {}
            // Reconcile cross-component effects of this turn's commands.
            TurnPhase::Resolve => self.control.refresh_contradiction(&self.overlay),
            TurnPhase::Decay => {
                for layer in self.overlay.tick_decay() {
                    self.events
                        .push(self.day, WorldEventKind::LayerExpired { layer });
                }
            }
            TurnPhase::Advance => {
                self.turn += 1;
                if self.turn % self.config.turns_per_day == 0 {
                    // Close the elapsed day before the clock moves on, so
                    // idle decay never touches pairs whose incidents fell
                    // within the day being closed.
                    let closing = self.day;
                    self.control.advance_day(
                        closing,
                        &mut self.rng,
                        &mut self.overlay,
                        &mut self.tension,
                        &mut self.events,
                    );
                    self.tension.decay_idle(closing);
                    self.day += 1;
                }
            }
        }
    }

    // --- Persistence ---

    pub fn snapshot(&self) -> Snapshot {
        let (layers, next_layer_id) = self.overlay.to_parts();
        let (tension_records, stances) = self.tension.to_parts();
        Snapshot {
            turn: self.turn,
            day: self.day,
            districts: self.control.to_parts(),
            layers,
            next_layer_id,
            tension_records,
            stances,
        }
    }

    /// Replace all dynamic state from a snapshot. The RNG is re-seeded from
    /// the configured seed and the restored turn, so two restores of the same
    /// snapshot replay identically.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.turn = snapshot.turn;
        self.day = snapshot.day;
        self.control.restore_parts(snapshot.districts);
        self.overlay
            .restore_parts(snapshot.layers, snapshot.next_layer_id);
        self.tension
            .restore_parts(snapshot.tension_records, snapshot.stances);
        self.rng = SmallRng::seed_from_u64(self.config.seed.wrapping_add(snapshot.turn));
        self.events.clear();
    }
}
