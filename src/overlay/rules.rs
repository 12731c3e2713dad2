use serde::{Deserialize, Serialize};

use super::layer::{LayerId, OverlayLayer};
use crate::model::FactionId;

/// The aggregated rules active at a queried position.
///
/// Computed fresh on every query; overlay state can change between turns, so
/// rule sets must never be cached across them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub truce: bool,
    pub curfew: bool,
    pub ally: Option<FactionId>,
    pub hunt: Option<FactionId>,
    /// Additive across contributing layers.
    pub tax_delta: f64,
    /// Multiplicative across contributing layers.
    pub price_factor: f64,
    /// Additive across contributing layers; consumed by the control engine.
    pub unrest: f64,
    /// Ids of the layers that contributed, ascending by (priority, id).
    pub sources: Vec<LayerId>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            truce: false,
            curfew: false,
            ally: None,
            hunt: None,
            tax_delta: 0.0,
            price_factor: 1.0,
            unrest: 0.0,
            sources: Vec::new(),
        }
    }
}

impl RuleSet {
    /// Fold a set of covering layers into one rule set.
    ///
    /// `layers` may arrive in any order; folding sorts ascending by
    /// (priority, id) so that for exclusive fields the last write wins:
    /// highest priority, ties broken by the larger (most recent) layer id.
    /// Boolean flags are OR'd and numeric modifiers accumulate per their
    /// documented combination rule, so ordering does not affect them.
    pub fn fold<'a>(layers: impl IntoIterator<Item = &'a OverlayLayer>) -> Self {
        let mut sorted: Vec<&OverlayLayer> = layers.into_iter().collect();
        sorted.sort_by_key(|l| (l.priority, l.id));

        let mut rules = RuleSet::default();
        for layer in sorted {
            let fx = &layer.effects;
            rules.truce |= fx.truce;
            rules.curfew |= fx.curfew;
            if fx.ally.is_some() {
                rules.ally = fx.ally;
            }
            if fx.hunt.is_some() {
                rules.hunt = fx.hunt;
            }
            if let Some(tax) = fx.tax_delta {
                rules.tax_delta += tax;
            }
            if let Some(price) = fx.price_factor {
                rules.price_factor *= price;
            }
            if let Some(unrest) = fx.unrest {
                rules.unrest += unrest;
            }
            rules.sources.push(layer.id);
        }
        rules
    }
}
