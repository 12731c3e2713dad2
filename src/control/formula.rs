//! The numeric core of the control engine: instability, enforcement, and the
//! bounded growth/decay update equations. Pure functions, no state.

// --- Instability U ---

const INSTABILITY_DISORDER_WEIGHT: f64 = 0.40;
const INSTABILITY_HEAT_WEIGHT: f64 = 0.30;
const INSTABILITY_CONTRADICTION_WEIGHT: f64 = 0.30;

// --- Enforcement E ---

const ENFORCEMENT_PATROL_WEIGHT: f64 = 0.35;
const ENFORCEMENT_INSTITUTIONS_WEIGHT: f64 = 0.35;
const ENFORCEMENT_REGISTRY_WEIGHT: f64 = 0.20;
const ENFORCEMENT_PROBITY_WEIGHT: f64 = 0.10;

// --- Overcap multiplier O ---

/// Floor on the overcap multiplier so an overstretched faction still
/// projects some enforcement.
const OVERCAP_FLOOR: f64 = 0.25;

// --- Quick-response control update (AdjustPatrol) ---

const QUICK_GROWTH_COEFF: f64 = 0.08;
const QUICK_DECAY_COEFF: f64 = 0.10;

// --- Daily stat drift coefficients ---

const PATROL_INVEST: f64 = 0.04;
const PATROL_FRICTION: f64 = 0.03;
const PATROL_INSTABILITY_DRAG: f64 = 0.05;

const INSTITUTIONS_INVEST: f64 = 0.05;
const INSTITUTIONS_DECAY: f64 = 0.06;

const REGISTRY_INVEST: f64 = 0.04;
const REGISTRY_DECAY: f64 = 0.02;

const CORRUPTION_GROWTH: f64 = 0.03;
const CORRUPTION_PURGE: f64 = 0.05;

const LEGITIMACY_GAIN: f64 = 0.02;
const LEGITIMACY_EROSION: f64 = 0.04;

pub fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Instability `U` for one district.
pub fn instability(baseline_disorder: f64, heat: f64, contradiction_density: f64) -> f64 {
    clamp01(
        INSTABILITY_DISORDER_WEIGHT * baseline_disorder
            + INSTABILITY_HEAT_WEIGHT * heat
            + INSTABILITY_CONTRADICTION_WEIGHT * contradiction_density,
    )
}

/// How contested a district is: 1.0 when the top two factions are level,
/// 0.0 when one dominates outright.
pub fn closeness(top_control: f64, second_control: f64) -> f64 {
    clamp01(1.0 - (top_control - second_control).abs())
}

/// Enforcement capacity `E` for one faction in one district.
pub fn enforcement(patrol: f64, institutions: f64, registry: f64, corruption: f64) -> f64 {
    clamp01(
        ENFORCEMENT_PATROL_WEIGHT * patrol
            + ENFORCEMENT_INSTITUTIONS_WEIGHT * institutions
            + ENFORCEMENT_REGISTRY_WEIGHT * registry
            + ENFORCEMENT_PROBITY_WEIGHT * (1.0 - corruption),
    )
}

/// Overcap multiplier `O`: 1.0 while a faction's summed control across all
/// districts fits its admin capacity, degrading (floored) beyond it.
pub fn overcap_multiplier(admin_load: f64, admin_capacity: f64) -> f64 {
    if admin_capacity <= 0.0 {
        return OVERCAP_FLOOR;
    }
    if admin_load <= admin_capacity {
        1.0
    } else {
        (admin_capacity / admin_load).max(OVERCAP_FLOOR)
    }
}

/// Full daily control update.
pub fn control_step(
    control: f64,
    enforcement: f64,
    legitimacy: f64,
    overcap: f64,
    instability: f64,
    opponent_pressure: f64,
) -> f64 {
    let growth = enforcement * legitimacy * overcap * (1.0 - control);
    let decay = (instability + opponent_pressure) * (1.0 - enforcement) * control;
    clamp01(control + growth - decay)
}

/// Quick-response control update used by the synchronous patrol adjustment,
/// so debug/editor tools see an immediate effect without waiting a day.
pub fn quick_control_step(control: f64, patrol: f64, heat: f64) -> f64 {
    clamp01(
        control + QUICK_GROWTH_COEFF * patrol * (1.0 - control)
            - QUICK_DECAY_COEFF * heat * control,
    )
}

// --- Daily stat drift ---
// Each is an investment term toward 1.0 minus one or more decay terms,
// clamped by the caller via FactionStanding::clamp_all.

pub fn patrol_step(patrol: f64, instability: f64) -> f64 {
    patrol + PATROL_INVEST * (1.0 - patrol)
        - PATROL_FRICTION * patrol
        - PATROL_INSTABILITY_DRAG * instability * patrol
}

pub fn institutions_step(institutions: f64, control: f64, instability: f64) -> f64 {
    institutions + INSTITUTIONS_INVEST * control * (1.0 - institutions)
        - INSTITUTIONS_DECAY * instability * institutions
}

pub fn registry_step(registry: f64, institutions: f64, corruption: f64) -> f64 {
    registry + REGISTRY_INVEST * institutions * (1.0 - registry)
        - REGISTRY_DECAY * corruption * registry
}

pub fn corruption_step(corruption: f64, legitimacy: f64, registry: f64) -> f64 {
    corruption + CORRUPTION_GROWTH * (1.0 - legitimacy) * (1.0 - corruption)
        - CORRUPTION_PURGE * registry * corruption
}

pub fn legitimacy_step(legitimacy: f64, instability: f64, heat: f64) -> f64 {
    legitimacy + LEGITIMACY_GAIN * (1.0 - instability) * (1.0 - legitimacy)
        - LEGITIMACY_EROSION * heat * legitimacy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instability_weights_sum_to_one() {
        assert!((instability(1.0, 1.0, 1.0) - 1.0).abs() < 1e-12);
        assert_eq!(instability(0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn instability_reference_mix() {
        let u = instability(0.5, 0.2, 0.1);
        assert!((u - (0.40 * 0.5 + 0.30 * 0.2 + 0.30 * 0.1)).abs() < 1e-12);
    }

    #[test]
    fn closeness_of_level_factions_is_one() {
        assert_eq!(closeness(0.4, 0.4), 1.0);
        assert!((closeness(0.8, 0.2) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn enforcement_clean_full_stats() {
        assert!((enforcement(1.0, 1.0, 1.0, 0.0) - 1.0).abs() < 1e-12);
        // Fully corrupt faction loses only the probity term.
        assert!((enforcement(1.0, 1.0, 1.0, 1.0) - 0.90).abs() < 1e-12);
    }

    #[test]
    fn overcap_is_identity_within_capacity() {
        assert_eq!(overcap_multiplier(2.0, 3.0), 1.0);
        assert_eq!(overcap_multiplier(3.0, 3.0), 1.0);
    }

    #[test]
    fn overcap_degrades_and_floors() {
        assert!((overcap_multiplier(6.0, 3.0) - 0.5).abs() < 1e-12);
        assert_eq!(overcap_multiplier(100.0, 3.0), 0.25);
    }

    #[test]
    fn quick_step_matches_reference_scenario() {
        // control 0.30, patrol already raised to 0.40, heat 0.10.
        let control = quick_control_step(0.30, 0.40, 0.10);
        assert!((control - 0.3194).abs() < 1e-9);
    }

    #[test]
    fn control_step_bounded() {
        assert_eq!(control_step(1.0, 1.0, 1.0, 1.0, 0.0, 0.0), 1.0);
        assert_eq!(control_step(0.0, 0.0, 0.0, 1.0, 1.0, 1.0), 0.0);
        let c = control_step(0.5, 0.6, 0.5, 1.0, 0.3, 0.2);
        assert!((0.0..=1.0).contains(&c));
    }

    #[test]
    fn control_grows_without_opposition() {
        let c = control_step(0.3, 0.5, 0.6, 1.0, 0.0, 0.0);
        assert!(c > 0.3);
    }

    #[test]
    fn control_shrinks_under_pressure_with_no_enforcement() {
        let c = control_step(0.5, 0.0, 0.5, 1.0, 0.4, 0.6);
        assert!(c < 0.5);
    }

    #[test]
    fn stat_steps_stay_near_unit_interval() {
        // A full day of drift from extreme values stays clamped after
        // the standing-level clamp the engine applies.
        for &v in &[0.0, 0.5, 1.0] {
            assert!(patrol_step(v, 1.0).clamp(0.0, 1.0).is_finite());
            assert!(institutions_step(v, 1.0, 1.0).clamp(0.0, 1.0).is_finite());
            assert!(registry_step(v, 1.0, 1.0).clamp(0.0, 1.0).is_finite());
            assert!(corruption_step(v, 0.0, 0.0).clamp(0.0, 1.0).is_finite());
            assert!(legitimacy_step(v, 0.0, 1.0).clamp(0.0, 1.0).is_finite());
        }
    }

    #[test]
    fn corruption_purged_by_registry() {
        let high_registry = corruption_step(0.5, 0.5, 1.0);
        let no_registry = corruption_step(0.5, 0.5, 0.0);
        assert!(high_registry < no_registry);
    }
}
