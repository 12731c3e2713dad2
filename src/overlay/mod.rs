//! Spatial overlay resolver: time-limited, radius-bounded rule layers
//! created by written inscriptions, and the point queries that aggregate them.

mod layer;
mod rules;
mod token;

use std::collections::BTreeMap;

pub use layer::{LayerId, OverlayLayer};
pub use rules::RuleSet;
pub use token::{LayerEffects, TokenKind, parse_tokens};

use crate::id::IdGenerator;
use crate::model::{Bounds, FactionId, Position};

/// Two token kinds whose simultaneous assertion over the same area is
/// contradictory, and the heat that contradiction contributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContradictionPair {
    pub a: TokenKind,
    pub b: TokenKind,
    pub weight: f64,
}

/// Tuning knobs for the resolver. The contradiction table is configuration,
/// not code: new mutually-exclusive pairs need no new query path.
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    pub contradiction_pairs: Vec<ContradictionPair>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            contradiction_pairs: vec![
                ContradictionPair {
                    a: TokenKind::Truce,
                    b: TokenKind::Hunt,
                    weight: 0.30,
                },
                ContradictionPair {
                    a: TokenKind::Ally,
                    b: TokenKind::Hunt,
                    weight: 0.20,
                },
                ContradictionPair {
                    a: TokenKind::Truce,
                    b: TokenKind::Unrest,
                    weight: 0.10,
                },
            ],
        }
    }
}

/// Owns the live layer set and answers all overlay queries.
#[derive(Debug)]
pub struct OverlayResolver {
    layers: BTreeMap<LayerId, OverlayLayer>,
    ids: IdGenerator,
    config: OverlayConfig,
}

impl Default for OverlayResolver {
    fn default() -> Self {
        Self::new(OverlayConfig::default())
    }
}

impl OverlayResolver {
    pub fn new(config: OverlayConfig) -> Self {
        Self {
            layers: BTreeMap::new(),
            ids: IdGenerator::new(),
            config,
        }
    }

    /// Register an anonymous layer (no owning faction).
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

    /// Register a layer inscribed by a faction.
    ///
    /// Tokens are parsed through the registry; unknown or malformed tokens
    /// are skipped with a diagnostic. A layer whose tokens all fail to parse
    /// is still registered (with empty effects) so ids stay predictable.
    pub fn register_layer_for(
        &mut self,
        owner: Option<FactionId>,
        center: Position,
        radius: u32,
        priority: i32,
        tokens: Vec<String>,
        turns_remaining: u32,
    ) -> LayerId {
        let effects = parse_tokens(&tokens);
        let id = LayerId(self.ids.next_id());
        self.layers.insert(
            id,
            OverlayLayer {
                id,
                center,
                radius,
                priority,
                tokens,
                turns_remaining,
                effects,
                owner,
            },
        );
        id
    }

    /// Remove a layer immediately. Returns false for an unknown id (no-op).
    pub fn erase_layer(&mut self, id: LayerId) -> bool {
        self.layers.remove(&id).is_some()
    }

    /// Remove every layer matching the predicate; returns the erased ids.
    /// Used by cleanup actions and by conquest erasing rival inscriptions.
    pub fn erase_where(&mut self, mut pred: impl FnMut(&OverlayLayer) -> bool) -> Vec<LayerId> {
        let doomed: Vec<LayerId> = self
            .layers
            .values()
            .filter(|l| pred(l))
            .map(|l| l.id)
            .collect();
        for id in &doomed {
            self.layers.remove(id);
        }
        doomed
    }

    /// Aggregate the rules of every layer covering `pos`.
    pub fn rules_at(&self, pos: Position) -> RuleSet {
        RuleSet::fold(self.layers.values().filter(|l| l.covers(pos)))
    }

    /// Decrement every layer's remaining turns, removing those that reach
    /// zero. Returns the expired ids. Must run exactly once per world turn,
    /// after all per-turn actions and before the next turn's queries.
    pub fn tick_decay(&mut self) -> Vec<LayerId> {
        let mut expired = Vec::new();
        for layer in self.layers.values_mut() {
            layer.turns_remaining = layer.turns_remaining.saturating_sub(1);
            if layer.turns_remaining == 0 {
                expired.push(layer.id);
            }
        }
        for id in &expired {
            self.layers.remove(id);
        }
        expired
    }

    /// Heat contribution from mutually exclusive token pairs asserted by
    /// distinct layers that both touch `bounds`. Clamped to 0.0-1.0.
    pub fn contradiction_heat(&self, bounds: &Bounds) -> f64 {
        let touching: Vec<&OverlayLayer> =
            self.layers.values().filter(|l| l.overlaps(bounds)).collect();

        let mut heat = 0.0;
        for (i, first) in touching.iter().enumerate() {
            for second in &touching[i + 1..] {
                for pair in &self.config.contradiction_pairs {
                    let forward = first.effects.has(pair.a) && second.effects.has(pair.b);
                    let backward = first.effects.has(pair.b) && second.effects.has(pair.a);
                    if forward || backward {
                        heat += pair.weight;
                    }
                }
            }
        }
        heat.clamp(0.0, 1.0)
    }

    /// Whether any curfew layer touches the given district bounds.
    pub fn curfew_touching(&self, bounds: &Bounds) -> bool {
        self.layers
            .values()
            .any(|l| l.effects.curfew && l.overlaps(bounds))
    }

    /// Sum of UNREST contributions from layers touching `bounds`.
    /// Consumed by the control engine's day tick as a heat feed.
    pub fn ambient_unrest(&self, bounds: &Bounds) -> f64 {
        self.layers
            .values()
            .filter(|l| l.overlaps(bounds))
            .filter_map(|l| l.effects.unrest)
            .sum()
    }

    pub fn layer(&self, id: LayerId) -> Option<&OverlayLayer> {
        self.layers.get(&id)
    }

    pub fn layers(&self) -> impl Iterator<Item = &OverlayLayer> {
        self.layers.values()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Decompose into persistable parts: the layer set and the id counter.
    pub fn to_parts(&self) -> (Vec<OverlayLayer>, u64) {
        (self.layers.values().cloned().collect(), self.ids.peek())
    }

    /// Rebuild from persisted parts. Layer ids and the counter round-trip
    /// exactly so decay schedules and id uniqueness are preserved.
    pub fn from_parts(layers: Vec<OverlayLayer>, next_id: u64, config: OverlayConfig) -> Self {
        Self {
            layers: layers.into_iter().map(|l| (l.id, l)).collect(),
            ids: IdGenerator::starting_from(next_id),
            config,
        }
    }

    /// Replace the layer set and id counter in place, keeping the current
    /// configuration.
    pub fn restore_parts(&mut self, layers: Vec<OverlayLayer>, next_id: u64) {
        self.layers = layers.into_iter().map(|l| (l.id, l)).collect();
        self.ids = IdGenerator::starting_from(next_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn origin() -> Position {
        Position::new(0, 0)
    }

    #[test]
    fn register_assigns_increasing_ids() {
        let mut resolver = OverlayResolver::default();
        let a = resolver.register_layer(origin(), 3, 0, toks(&["TRUCE"]), 5);
        let b = resolver.register_layer(origin(), 3, 0, toks(&["CURFEW"]), 5);
        assert!(b > a);
        assert_eq!(resolver.len(), 2);
    }

    #[test]
    fn ids_not_reused_after_erase() {
        let mut resolver = OverlayResolver::default();
        let a = resolver.register_layer(origin(), 3, 0, toks(&["TRUCE"]), 5);
        assert!(resolver.erase_layer(a));
        let b = resolver.register_layer(origin(), 3, 0, toks(&["TRUCE"]), 5);
        assert!(b > a);
    }

    #[test]
    fn erase_unknown_id_is_noop() {
        let mut resolver = OverlayResolver::default();
        assert!(!resolver.erase_layer(LayerId(99)));
    }

    #[test]
    fn rules_at_ignores_out_of_radius_layers() {
        let mut resolver = OverlayResolver::default();
        resolver.register_layer(Position::new(0, 0), 2, 0, toks(&["TRUCE"]), 5);
        assert!(resolver.rules_at(Position::new(1, 1)).truce);
        assert!(!resolver.rules_at(Position::new(2, 1)).truce);
    }

    #[test]
    fn decay_removes_layer_after_exact_turn_count() {
        let mut resolver = OverlayResolver::default();
        let id = resolver.register_layer(origin(), 3, 0, toks(&["TRUCE"]), 3);

        // Present for exactly 3 decay calls.
        for _ in 0..2 {
            assert!(resolver.tick_decay().is_empty());
            assert!(resolver.layer(id).is_some());
        }
        let expired = resolver.tick_decay();
        assert_eq!(expired, vec![id]);
        assert!(resolver.layer(id).is_none());
    }

    #[test]
    fn erase_where_targets_owner() {
        let mut resolver = OverlayResolver::default();
        let mine =
            resolver.register_layer_for(Some(FactionId(0)), origin(), 3, 0, toks(&["TRUCE"]), 5);
        let theirs =
            resolver.register_layer_for(Some(FactionId(1)), origin(), 3, 0, toks(&["HUNT:0"]), 5);
        let erased = resolver.erase_where(|l| l.owner == Some(FactionId(1)));
        assert_eq!(erased, vec![theirs]);
        assert!(resolver.layer(mine).is_some());
    }

    #[test]
    fn contradiction_heat_from_truce_hunt_pair() {
        let bounds = Bounds::new(Position::new(0, 0), Position::new(10, 10));
        let mut resolver = OverlayResolver::default();
        resolver.register_layer(Position::new(5, 5), 3, 0, toks(&["TRUCE"]), 5);
        resolver.register_layer(Position::new(6, 5), 3, 0, toks(&["HUNT:1"]), 5);
        let heat = resolver.contradiction_heat(&bounds);
        assert!((heat - 0.30).abs() < 1e-12);
    }

    #[test]
    fn contradiction_heat_zero_for_compatible_layers() {
        let bounds = Bounds::new(Position::new(0, 0), Position::new(10, 10));
        let mut resolver = OverlayResolver::default();
        resolver.register_layer(Position::new(5, 5), 3, 0, toks(&["TRUCE"]), 5);
        resolver.register_layer(Position::new(6, 5), 3, 0, toks(&["TAX:0.1"]), 5);
        assert_eq!(resolver.contradiction_heat(&bounds), 0.0);
    }

    #[test]
    fn contradiction_heat_ignores_layers_outside_district() {
        let bounds = Bounds::new(Position::new(0, 0), Position::new(10, 10));
        let mut resolver = OverlayResolver::default();
        resolver.register_layer(Position::new(5, 5), 3, 0, toks(&["TRUCE"]), 5);
        // Far away hunt layer: no pair inside this district.
        resolver.register_layer(Position::new(100, 100), 3, 0, toks(&["HUNT:1"]), 5);
        assert_eq!(resolver.contradiction_heat(&bounds), 0.0);
    }

    #[test]
    fn contradiction_heat_clamped() {
        let bounds = Bounds::new(Position::new(0, 0), Position::new(10, 10));
        let mut resolver = OverlayResolver::default();
        // Enough contradictory pairs to exceed 1.0 before the clamp.
        for _ in 0..4 {
            resolver.register_layer(Position::new(5, 5), 3, 0, toks(&["TRUCE"]), 5);
            resolver.register_layer(Position::new(6, 5), 3, 0, toks(&["HUNT:1"]), 5);
        }
        assert_eq!(resolver.contradiction_heat(&bounds), 1.0);
    }

    #[test]
    fn ambient_unrest_sums_touching_layers() {
        let bounds = Bounds::new(Position::new(0, 0), Position::new(10, 10));
        let mut resolver = OverlayResolver::default();
        resolver.register_layer(Position::new(2, 2), 2, 0, toks(&["UNREST:0.05"]), 5);
        resolver.register_layer(Position::new(8, 8), 2, 0, toks(&["UNREST:0.10"]), 5);
        resolver.register_layer(Position::new(50, 50), 2, 0, toks(&["UNREST:0.90"]), 5);
        assert!((resolver.ambient_unrest(&bounds) - 0.15).abs() < 1e-12);
    }

    #[test]
    fn curfew_touching_counts_edge_layers() {
        let bounds = Bounds::new(Position::new(0, 0), Position::new(10, 10));
        let mut resolver = OverlayResolver::default();
        assert!(!resolver.curfew_touching(&bounds));

        // Touches the east edge without covering the center.
        resolver.register_layer(Position::new(13, 5), 3, 0, toks(&["CURFEW"]), 5);
        assert!(resolver.curfew_touching(&bounds));

        let mut far = OverlayResolver::default();
        far.register_layer(Position::new(50, 50), 3, 0, toks(&["CURFEW"]), 5);
        assert!(!far.curfew_touching(&bounds));
    }

    #[test]
    fn parts_round_trip_preserves_id_counter() {
        let mut resolver = OverlayResolver::default();
        let a = resolver.register_layer(origin(), 3, 0, toks(&["TRUCE"]), 5);
        let (layers, next) = resolver.to_parts();

        let mut restored = OverlayResolver::from_parts(layers, next, OverlayConfig::default());
        assert!(restored.layer(a).is_some());
        let b = restored.register_layer(origin(), 3, 0, toks(&["CURFEW"]), 5);
        assert!(b > a);
    }
}
