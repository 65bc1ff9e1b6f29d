//! Bounded effect vectors and the shared normalization pipeline.
//!
//! Every path that produces indicator deltas (catalog options, generated
//! options, provider analysis, keyword fallback) funnels through
//! [`normalize_effects`] so out-of-band values can never reach the state.
use serde::{Deserialize, Serialize};

use crate::constants::{
    BOUND_APPROVAL, BOUND_DEBT, BOUND_DIPLOMACY, BOUND_ENVIRONMENT, BOUND_EXCHANGE_RATE,
    BOUND_GDP, BOUND_MARKET_INDEX, BOUND_TECHNOLOGY, CRITICAL_RISK_AMPLIFIER,
    LOW_APPROVAL_DAMPENER, LOW_APPROVAL_THRESHOLD,
};
use crate::numbers::{round_f64_to_i32, trunc_f64_to_i32};
use crate::state::RiskLevel;

/// Per-turn delta against the eight national indicators.
///
/// Fields are deltas, not absolutes. Each is bounded symmetrically around
/// zero; [`EffectVector::clamp_to_bounds`] re-asserts the bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EffectVector {
    pub approval: i32,
    pub gdp: i32,
    pub debt: i32,
    pub technology: i32,
    pub environment: i32,
    pub market_index: i32,
    pub exchange_rate: i32,
    pub diplomacy: i32,
}

impl EffectVector {
    /// Clamp every field into its symmetric band. Idempotent.
    #[must_use]
    pub fn clamp_to_bounds(self) -> Self {
        Self {
            approval: self.approval.clamp(-BOUND_APPROVAL, BOUND_APPROVAL),
            gdp: self.gdp.clamp(-BOUND_GDP, BOUND_GDP),
            debt: self.debt.clamp(-BOUND_DEBT, BOUND_DEBT),
            technology: self.technology.clamp(-BOUND_TECHNOLOGY, BOUND_TECHNOLOGY),
            environment: self
                .environment
                .clamp(-BOUND_ENVIRONMENT, BOUND_ENVIRONMENT),
            market_index: self
                .market_index
                .clamp(-BOUND_MARKET_INDEX, BOUND_MARKET_INDEX),
            exchange_rate: self
                .exchange_rate
                .clamp(-BOUND_EXCHANGE_RATE, BOUND_EXCHANGE_RATE),
            diplomacy: self.diplomacy.clamp(-BOUND_DIPLOMACY, BOUND_DIPLOMACY),
        }
    }

    /// True when every field already sits inside its band.
    #[must_use]
    pub fn is_within_bounds(&self) -> bool {
        *self == self.clamp_to_bounds()
    }

    /// True when no field moves any indicator.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.approval == 0
            && self.gdp == 0
            && self.debt == 0
            && self.technology == 0
            && self.environment == 0
            && self.market_index == 0
            && self.exchange_rate == 0
            && self.diplomacy == 0
    }
}

/// Horizon over which an analyzed effect vector is expected to land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Immediate,
    #[default]
    ShortTerm,
    LongTerm,
}

impl Timeframe {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::ShortTerm => "short_term",
            Self::LongTerm => "long_term",
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State the normalizer is allowed to see. Built by the caller; keeps
/// [`normalize_effects`] a pure function of its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeContext {
    pub risk: RiskLevel,
    pub approval: i32,
}

impl NormalizeContext {
    #[must_use]
    pub const fn new(risk: RiskLevel, approval: i32) -> Self {
        Self { risk, approval }
    }

    const fn amplifies(&self) -> bool {
        matches!(self.risk, RiskLevel::Critical)
    }

    const fn dampens(&self) -> bool {
        self.approval < LOW_APPROVAL_THRESHOLD
    }
}

fn amplify(value: i32) -> i32 {
    if value == 0 {
        return 0;
    }
    round_f64_to_i32(f64::from(value) * CRITICAL_RISK_AMPLIFIER)
}

fn dampen_positive(value: i32) -> i32 {
    if value <= 0 {
        return value;
    }
    trunc_f64_to_i32(f64::from(value) * LOW_APPROVAL_DAMPENER)
}

/// Normalize a raw effect vector against the current turn context.
///
/// Order is fixed: clamp the raw input, amplify everything under critical
/// risk, dampen positive approval / gdp / market gains while approval is
/// under the confidence floor, then clamp once more so the amplifier can
/// never push a field back out of band.
#[must_use]
pub fn normalize_effects(raw: EffectVector, ctx: NormalizeContext) -> EffectVector {
    let mut out = raw.clamp_to_bounds();

    if ctx.amplifies() {
        out = EffectVector {
            approval: amplify(out.approval),
            gdp: amplify(out.gdp),
            debt: amplify(out.debt),
            technology: amplify(out.technology),
            environment: amplify(out.environment),
            market_index: amplify(out.market_index),
            exchange_rate: amplify(out.exchange_rate),
            diplomacy: amplify(out.diplomacy),
        };
    }

    if ctx.dampens() {
        out.approval = dampen_positive(out.approval);
        out.gdp = dampen_positive(out.gdp);
        out.market_index = dampen_positive(out.market_index);
    }

    out.clamp_to_bounds()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calm() -> NormalizeContext {
        NormalizeContext::new(RiskLevel::Low, 50)
    }

    #[test]
    fn clamp_is_idempotent() {
        let wild = EffectVector {
            approval: 999,
            gdp: -999,
            debt: 400,
            technology: -80,
            environment: 80,
            market_index: 9_999,
            exchange_rate: -60,
            diplomacy: 55,
        };
        let once = wild.clamp_to_bounds();
        assert_eq!(once, once.clamp_to_bounds());
        assert!(once.is_within_bounds());
        assert_eq!(once.approval, 20);
        assert_eq!(once.gdp, -50);
        assert_eq!(once.debt, 100);
        assert_eq!(once.market_index, 2_500);
    }

    #[test]
    fn normalize_is_identity_for_in_band_calm_input() {
        let vector = EffectVector {
            approval: -5,
            gdp: 12,
            debt: 30,
            market_index: 400,
            ..EffectVector::default()
        };
        assert_eq!(normalize_effects(vector, calm()), vector);
    }

    #[test]
    fn critical_risk_amplifies_both_signs() {
        let ctx = NormalizeContext::new(RiskLevel::Critical, 50);
        let vector = EffectVector {
            approval: 10,
            gdp: -10,
            exchange_rate: 5,
            ..EffectVector::default()
        };
        let out = normalize_effects(vector, ctx);
        assert_eq!(out.approval, 12);
        assert_eq!(out.gdp, -12);
        assert_eq!(out.exchange_rate, 6);
    }

    #[test]
    fn amplifier_cannot_escape_bounds() {
        let ctx = NormalizeContext::new(RiskLevel::Critical, 50);
        let vector = EffectVector {
            approval: 20,
            debt: -100,
            ..EffectVector::default()
        };
        let out = normalize_effects(vector, ctx);
        assert_eq!(out.approval, 20);
        assert_eq!(out.debt, -100);
        assert!(out.is_within_bounds());
    }

    #[test]
    fn low_approval_dampens_only_positive_gains() {
        let ctx = NormalizeContext::new(RiskLevel::Low, 25);
        let vector = EffectVector {
            approval: 10,
            gdp: -10,
            market_index: 9,
            diplomacy: 10,
            ..EffectVector::default()
        };
        let out = normalize_effects(vector, ctx);
        assert_eq!(out.approval, 8);
        assert_eq!(out.gdp, -10);
        assert_eq!(out.market_index, 7);
        assert_eq!(out.diplomacy, 10);
    }

    #[test]
    fn amplify_applies_before_dampener() {
        let ctx = NormalizeContext::new(RiskLevel::Critical, 20);
        let vector = EffectVector {
            gdp: 10,
            ..EffectVector::default()
        };
        // 10 -> amplified 12 -> dampened trunc(9.6) = 9.
        let out = normalize_effects(vector, ctx);
        assert_eq!(out.gdp, 9);
    }

    #[test]
    fn zero_vector_survives_every_context() {
        for risk in [
            RiskLevel::Low,
            RiskLevel::Medium,
            RiskLevel::High,
            RiskLevel::Critical,
        ] {
            for approval in [0, 29, 30, 100] {
                let ctx = NormalizeContext::new(risk, approval);
                let out = normalize_effects(EffectVector::default(), ctx);
                assert!(out.is_zero());
            }
        }
    }
}
