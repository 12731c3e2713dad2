//! Stochastic incident generation for the daily tick: how many incidents a
//! district produces and what kind each one is.

use rand::{Rng, RngCore};

use crate::model::IncidentKind;

/// Relative weights for drawing an incident kind. Petty friction dominates;
/// killings are rare.
const KIND_WEIGHTS: [(IncidentKind, u32); 8] = [
    (IncidentKind::Insult, 30),
    (IncidentKind::Vandalism, 22),
    (IncidentKind::Theft, 16),
    (IncidentKind::Intimidation, 12),
    (IncidentKind::Sabotage, 8),
    (IncidentKind::Assault, 6),
    (IncidentKind::Arson, 4),
    (IncidentKind::Murder, 2),
];

/// Rate-shaping floors so no single factor can zero the district out entirely
/// except an explicit curfew.
const ECONOMY_FLOOR: f64 = 0.25;
const INSTABILITY_FLOOR: f64 = 0.30;
const CLOSENESS_FLOOR: f64 = 0.50;

/// Multiplier applied to the incident rate when a curfew rule covers the
/// district center.
pub const CURFEW_SUPPRESSION: f64 = 0.25;

/// Guard against pathological rates locking the tick in the sampling loop.
const MAX_INCIDENTS_PER_DAY: u32 = 32;

/// Expected incidents per day for one district.
pub fn incident_rate(
    base_rate: f64,
    economic_value: f64,
    instability: f64,
    closeness: f64,
    heat: f64,
) -> f64 {
    base_rate
        * (ECONOMY_FLOOR + (1.0 - ECONOMY_FLOOR) * economic_value)
        * (INSTABILITY_FLOOR + (1.0 - INSTABILITY_FLOOR) * instability)
        * (CLOSENESS_FLOOR + (1.0 - CLOSENESS_FLOOR) * closeness)
        * (1.0 + heat)
}

/// Sample a Poisson count with mean `lambda` (Knuth's method). Fine for the
/// small means this simulation uses.
pub fn poisson(rng: &mut dyn RngCore, lambda: f64) -> u32 {
    if lambda <= 0.0 {
        return 0;
    }
    let limit = (-lambda).exp();
    let mut count = 0u32;
    let mut product = 1.0f64;
    loop {
        product *= rng.random::<f64>();
        if product <= limit || count >= MAX_INCIDENTS_PER_DAY {
            return count;
        }
        count += 1;
    }
}

/// Draw an incident kind from the weighted catalog.
pub fn pick_kind(rng: &mut dyn RngCore) -> IncidentKind {
    let total: u32 = KIND_WEIGHTS.iter().map(|(_, w)| w).sum();
    let mut roll = rng.random_range(0..total);
    for (kind, weight) in KIND_WEIGHTS {
        if roll < weight {
            return kind;
        }
        roll -= weight;
    }
    // Unreachable: roll < total and the weights sum to total.
    IncidentKind::Insult
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn rate_grows_with_every_factor() {
        let base = incident_rate(0.8, 0.5, 0.5, 0.5, 0.0);
        assert!(incident_rate(0.8, 0.9, 0.5, 0.5, 0.0) > base);
        assert!(incident_rate(0.8, 0.5, 0.9, 0.5, 0.0) > base);
        assert!(incident_rate(0.8, 0.5, 0.5, 0.9, 0.0) > base);
        assert!(incident_rate(0.8, 0.5, 0.5, 0.5, 0.5) > base);
    }

    #[test]
    fn rate_never_zero_without_curfew() {
        assert!(incident_rate(0.8, 0.0, 0.0, 0.0, 0.0) > 0.0);
    }

    #[test]
    fn poisson_zero_lambda_is_zero() {
        let mut rng = SmallRng::seed_from_u64(7);
        assert_eq!(poisson(&mut rng, 0.0), 0);
        assert_eq!(poisson(&mut rng, -1.0), 0);
    }

    #[test]
    fn poisson_mean_roughly_matches_lambda() {
        let mut rng = SmallRng::seed_from_u64(42);
        let lambda = 2.0;
        let draws = 2000;
        let total: u64 = (0..draws).map(|_| poisson(&mut rng, lambda) as u64).sum();
        let mean = total as f64 / draws as f64;
        assert!((mean - lambda).abs() < 0.15, "mean {mean}");
    }

    #[test]
    fn poisson_capped() {
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(poisson(&mut rng, 1e6) <= MAX_INCIDENTS_PER_DAY);
    }

    #[test]
    fn pick_kind_covers_catalog_and_favors_petty_incidents() {
        let mut rng = SmallRng::seed_from_u64(9);
        let mut insults = 0u32;
        let mut murders = 0u32;
        for _ in 0..2000 {
            match pick_kind(&mut rng) {
                IncidentKind::Insult => insults += 1,
                IncidentKind::Murder => murders += 1,
                _ => {}
            }
        }
        assert!(insults > murders);
        assert!(murders > 0);
    }
}
