use serde::{Deserialize, Serialize};

use crate::model::FactionId;

/// Numeric token parameters are clamped into these ranges rather than rejected,
/// since layer content is player- or data-authored.
const TAX_DELTA_MIN: f64 = -1.0;
const TAX_DELTA_MAX: f64 = 1.0;
const PRICE_FACTOR_MIN: f64 = 0.1;
const PRICE_FACTOR_MAX: f64 = 10.0;
const UNREST_MAX: f64 = 1.0;

/// The registry of known token names. A raw token is `NAME` or `NAME:param`;
/// lookup matches on the name prefix before the `:`.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// No fighting inside the layer, regardless of tension.
    Truce,
    /// Suppresses incident generation in districts the layer touches.
    Curfew,
    /// Declares a faction allied within the area. Exclusive field.
    Ally,
    /// Declares a faction hunted within the area. Exclusive field.
    Hunt,
    /// Additive tax-rate delta.
    Tax,
    /// Multiplicative price factor.
    Price,
    /// Additive local unrest, fed into district heat on the day tick.
    Unrest,
}

impl TokenKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "TRUCE" => Some(TokenKind::Truce),
            "CURFEW" => Some(TokenKind::Curfew),
            "ALLY" => Some(TokenKind::Ally),
            "HUNT" => Some(TokenKind::Hunt),
            "TAX" => Some(TokenKind::Tax),
            "PRICE" => Some(TokenKind::Price),
            "UNREST" => Some(TokenKind::Unrest),
            _ => None,
        }
    }
}

/// Structured effects parsed from a layer's raw token list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerEffects {
    pub truce: bool,
    pub curfew: bool,
    pub ally: Option<FactionId>,
    pub hunt: Option<FactionId>,
    pub tax_delta: Option<f64>,
    pub price_factor: Option<f64>,
    pub unrest: Option<f64>,
}

impl LayerEffects {
    /// Whether this layer asserts the given token kind at all.
    pub fn has(&self, kind: TokenKind) -> bool {
        match kind {
            TokenKind::Truce => self.truce,
            TokenKind::Curfew => self.curfew,
            TokenKind::Ally => self.ally.is_some(),
            TokenKind::Hunt => self.hunt.is_some(),
            TokenKind::Tax => self.tax_delta.is_some(),
            TokenKind::Price => self.price_factor.is_some(),
            TokenKind::Unrest => self.unrest.is_some(),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == LayerEffects::default()
    }
}

/// Parse a raw token list into structured effects.
///
/// Unknown names and malformed parameters are skipped with a diagnostic,
/// never fatal. Out-of-range numeric parameters are clamped.
pub fn parse_tokens(tokens: &[String]) -> LayerEffects {
    let mut effects = LayerEffects::default();
    for raw in tokens {
        let (name, param) = match raw.split_once(':') {
            Some((n, p)) => (n, Some(p)),
            None => (raw.as_str(), None),
        };
        let Some(kind) = TokenKind::from_name(name) else {
            tracing::warn!(token = raw.as_str(), "skipping unknown overlay token");
            continue;
        };
        apply_token(&mut effects, kind, raw, param);
    }
    effects
}

fn apply_token(effects: &mut LayerEffects, kind: TokenKind, raw: &str, param: Option<&str>) {
    match kind {
        TokenKind::Truce => effects.truce = true,
        TokenKind::Curfew => effects.curfew = true,
        TokenKind::Ally => match parse_faction(param) {
            Some(f) => effects.ally = Some(f),
            None => tracing::warn!(token = raw, "ALLY token missing or bad faction slot"),
        },
        TokenKind::Hunt => match parse_faction(param) {
            Some(f) => effects.hunt = Some(f),
            None => tracing::warn!(token = raw, "HUNT token missing or bad faction slot"),
        },
        TokenKind::Tax => match parse_number(param) {
            Some(v) => effects.tax_delta = Some(v.clamp(TAX_DELTA_MIN, TAX_DELTA_MAX)),
            None => tracing::warn!(token = raw, "TAX token missing or bad amount"),
        },
        TokenKind::Price => match parse_number(param) {
            Some(v) => effects.price_factor = Some(v.clamp(PRICE_FACTOR_MIN, PRICE_FACTOR_MAX)),
            None => tracing::warn!(token = raw, "PRICE token missing or bad factor"),
        },
        TokenKind::Unrest => match parse_number(param) {
            Some(v) => effects.unrest = Some(v.clamp(0.0, UNREST_MAX)),
            None => tracing::warn!(token = raw, "UNREST token missing or bad amount"),
        },
    }
}

fn parse_faction(param: Option<&str>) -> Option<FactionId> {
    param?.trim().parse::<u8>().ok().map(FactionId)
}

fn parse_number(param: Option<&str>) -> Option<f64> {
    let value = param?.trim().parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}
