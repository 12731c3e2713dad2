mod common;

use common::{docks_pos, world, DOCKS};
use district_sim::model::{FactionId, Position, WorldEventKind};

fn toks(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

#[test]
fn layer_survives_exactly_its_remaining_turns() {
    let mut sim = world(1);
    let id = sim.register_layer(docks_pos(), 4, 0, toks(&["CURFEW"]), 3);

    for _ in 0..2 {
        sim.end_turn();
        assert!(sim.rules_at(docks_pos()).curfew);
    }
    sim.end_turn();
    assert!(!sim.rules_at(docks_pos()).curfew);
    assert!(sim
        .events()
        .iter()
        .any(|e| e.kind == WorldEventKind::LayerExpired { layer: id }));
}

#[test]
fn exclusive_fields_resolve_by_priority_then_recency() {
    let mut sim = world(1);
    sim.register_layer(docks_pos(), 4, 1, toks(&["HUNT:0"]), 10);
    sim.register_layer(docks_pos(), 4, 3, toks(&["HUNT:1"]), 10);
    assert_eq!(sim.rules_at(docks_pos()).hunt, Some(FactionId(1)));

    // Same priority as the winner: the later inscription takes over.
    sim.register_layer(docks_pos(), 4, 3, toks(&["HUNT:2"]), 10);
    assert_eq!(sim.rules_at(docks_pos()).hunt, Some(FactionId(2)));
}

#[test]
fn numeric_modifiers_accumulate_across_layers() {
    let mut sim = world(1);
    sim.register_layer(docks_pos(), 4, 0, toks(&["TAX:0.10", "PRICE:2.0"]), 10);
    sim.register_layer(docks_pos(), 4, 5, toks(&["TAX:0.05", "PRICE:0.5"]), 10);
    let rules = sim.rules_at(docks_pos());
    assert!((rules.tax_delta - 0.15).abs() < 1e-12);
    assert!((rules.price_factor - 1.0).abs() < 1e-12);
    assert_eq!(rules.sources.len(), 2);
}

#[test]
fn erasing_one_layer_leaves_others_untouched() {
    let mut sim = world(1);
    let truce = sim.register_layer(docks_pos(), 4, 0, toks(&["TRUCE"]), 10);
    sim.register_layer(docks_pos(), 4, 0, toks(&["CURFEW"]), 10);

    assert!(sim.erase_layer(truce));
    let rules = sim.rules_at(docks_pos());
    assert!(!rules.truce);
    assert!(rules.curfew);
    // Erasing again is a no-op.
    assert!(!sim.erase_layer(truce));
}

#[test]
fn malformed_tokens_do_not_poison_a_layer() {
    let mut sim = world(1);
    sim.register_layer(
        docks_pos(),
        4,
        0,
        toks(&["TRUCE", "GLYPH_OF_DOOM", "HUNT:notaslot"]),
        10,
    );
    let rules = sim.rules_at(docks_pos());
    assert!(rules.truce);
    assert_eq!(rules.hunt, None);
}

#[test]
fn contradictory_inscriptions_raise_district_contradiction() {
    let mut sim = world(1);
    sim.register_layer(docks_pos(), 3, 0, toks(&["TRUCE"]), 20);
    sim.register_layer(Position::new(11, 10), 3, 0, toks(&["HUNT:1"]), 20);
    sim.end_turn();
    let state = sim.state_by_id(DOCKS).unwrap();
    assert!((state.contradiction_density - 0.30).abs() < 1e-12);
}

#[test]
fn out_of_radius_queries_see_nothing() {
    let mut sim = world(1);
    sim.register_layer(docks_pos(), 2, 0, toks(&["TRUCE"]), 10);
    assert!(sim.rules_at(Position::new(11, 11)).truce);
    assert!(!sim.rules_at(Position::new(13, 10)).truce);
}
