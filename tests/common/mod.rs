#![allow(dead_code)]

use district_sim::model::{Bounds, District, DistrictId, DistrictState, Position};
use district_sim::{SimConfig, WorldSim};

pub const DOCKS: DistrictId = DistrictId(0);
pub const TEMPLE_WARD: DistrictId = DistrictId(1);

/// A point inside the docks district.
pub fn docks_pos() -> Position {
    Position::new(10, 10)
}

pub fn districts() -> Vec<District> {
    vec![
        District {
            id: DOCKS,
            name: "docks".into(),
            bounds: Bounds::new(Position::new(0, 0), Position::new(20, 20)),
            population: 800,
            visibility: 0.6,
            economic_value: 0.7,
            baseline_disorder: 0.3,
        },
        District {
            id: TEMPLE_WARD,
            name: "temple-ward".into(),
            bounds: Bounds::new(Position::new(100, 0), Position::new(120, 20)),
            population: 400,
            visibility: 0.8,
            economic_value: 0.4,
            baseline_disorder: 0.1,
        },
    ]
}

pub fn world(seed: u64) -> WorldSim {
    WorldSim::new(
        districts(),
        3,
        SimConfig {
            seed,
            ..SimConfig::default()
        },
    )
}

/// Run whole in-game days (12 turns each by default config).
pub fn run_days(sim: &mut WorldSim, days: u32) {
    for _ in 0..days * 12 {
        sim.end_turn();
    }
}

/// Seed the docks with a hand-built state by restoring a snapshot around it.
pub fn seed_docks_state(sim: &mut WorldSim, build: impl FnOnce(&mut DistrictState)) {
    let mut snapshot = sim.snapshot();
    if let Some((_, state)) = snapshot.districts.iter_mut().find(|(id, _)| *id == DOCKS) {
        build(state);
    }
    sim.restore(snapshot);
}
