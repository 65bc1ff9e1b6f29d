//! National indicators and read-only turn context.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_TURN_LIMIT, INDICATOR_PCT_MAX, INDICATOR_PCT_MIN, PHASE_EARLY_FRACTION,
    PHASE_MID_FRACTION, START_APPROVAL, START_DEBT, START_DIPLOMACY, START_ENVIRONMENT,
    START_EXCHANGE_RATE, START_GDP, START_MARKET_INDEX, START_TECHNOLOGY,
};
use crate::effect::EffectVector;
use crate::event::Ideology;

/// Composite risk tier derived from recent history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(()),
        }
    }
}

/// Direction of the economy over the trend window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EconomicTrend {
    Expansion,
    #[default]
    Stable,
    Recession,
}

impl EconomicTrend {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Expansion => "expansion",
            Self::Stable => "stable",
            Self::Recession => "recession",
        }
    }
}

impl fmt::Display for EconomicTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of public approval over the trend window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalTrend {
    Rising,
    #[default]
    Steady,
    Falling,
}

impl ApprovalTrend {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rising => "rising",
            Self::Steady => "steady",
            Self::Falling => "falling",
        }
    }
}

impl fmt::Display for ApprovalTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse position inside the term, derived from turn vs. turn limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    #[default]
    Early,
    Mid,
    Late,
}

impl GamePhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Early => "early",
            Self::Mid => "mid",
            Self::Late => "late",
        }
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived, read-only turn context. Computed by the caller (the session)
/// from a short history window and handed to the core untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TrendSnapshot {
    pub approval_trend: ApprovalTrend,
    pub economic_trend: EconomicTrend,
    pub risk: RiskLevel,
}

impl TrendSnapshot {
    #[must_use]
    pub const fn new(
        approval_trend: ApprovalTrend,
        economic_trend: EconomicTrend,
        risk: RiskLevel,
    ) -> Self {
        Self {
            approval_trend,
            economic_trend,
            risk,
        }
    }
}

/// One resolved turn: which event fired and which option the player took.
/// The last few of these feed generation prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceRecord {
    pub turn: u32,
    pub event_id: String,
    pub title: String,
    pub option_text: String,
    pub ideology: Ideology,
    pub effects: EffectVector,
}

/// The eight national indicators plus the turn clock.
///
/// The core never mutates this directly; it only produces [`EffectVector`]s.
/// The caller applies them via [`NationalState::apply_effects`], which also
/// enforces the indicator floors and ceilings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NationalState {
    pub approval: i32,
    pub gdp: i32,
    pub debt: i32,
    pub technology: i32,
    pub environment: i32,
    pub market_index: i32,
    pub exchange_rate: i32,
    pub diplomacy: i32,
    pub turn: u32,
    pub turn_limit: u32,
}

impl Default for NationalState {
    fn default() -> Self {
        Self {
            approval: START_APPROVAL,
            gdp: START_GDP,
            debt: START_DEBT,
            technology: START_TECHNOLOGY,
            environment: START_ENVIRONMENT,
            market_index: START_MARKET_INDEX,
            exchange_rate: START_EXCHANGE_RATE,
            diplomacy: START_DIPLOMACY,
            turn: 1,
            turn_limit: DEFAULT_TURN_LIMIT,
        }
    }
}

impl NationalState {
    /// Start a fresh term with a custom turn limit (minimum 1).
    #[must_use]
    pub fn with_turn_limit(turn_limit: u32) -> Self {
        Self {
            turn_limit: turn_limit.max(1),
            ..Self::default()
        }
    }

    /// Term phase derived from the turn clock.
    #[must_use]
    pub fn phase(&self) -> GamePhase {
        let limit = self.turn_limit.max(1);
        let progress = f64::from(self.turn) / f64::from(limit);
        if progress < PHASE_EARLY_FRACTION {
            GamePhase::Early
        } else if progress < PHASE_MID_FRACTION {
            GamePhase::Mid
        } else {
            GamePhase::Late
        }
    }

    /// Whether the term has reached its final turn.
    #[must_use]
    pub const fn is_final_turn(&self) -> bool {
        self.turn >= self.turn_limit
    }

    /// Apply a (pre-normalized) effect vector and re-assert indicator
    /// floors and ceilings. Percentage indicators stay in 0..=100; output
    /// and market indices never go negative; the exchange rate never
    /// reaches zero.
    pub fn apply_effects(&mut self, effects: &EffectVector) {
        self.approval = (self.approval + effects.approval)
            .clamp(INDICATOR_PCT_MIN, INDICATOR_PCT_MAX);
        self.gdp = (self.gdp + effects.gdp).max(0);
        self.debt = (self.debt + effects.debt).max(0);
        self.technology = (self.technology + effects.technology)
            .clamp(INDICATOR_PCT_MIN, INDICATOR_PCT_MAX);
        self.environment = (self.environment + effects.environment)
            .clamp(INDICATOR_PCT_MIN, INDICATOR_PCT_MAX);
        self.market_index = (self.market_index + effects.market_index).max(0);
        self.exchange_rate = (self.exchange_rate + effects.exchange_rate).max(1);
        self.diplomacy = (self.diplomacy + effects.diplomacy)
            .clamp(INDICATOR_PCT_MIN, INDICATOR_PCT_MAX);
    }

    /// Advance the turn clock, saturating at the turn limit.
    pub fn advance_turn(&mut self) {
        self.turn = self.turn.saturating_add(1).min(self.turn_limit.max(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_tracks_turn_progress() {
        let mut state = NationalState::with_turn_limit(20);
        state.turn = 1;
        assert_eq!(state.phase(), GamePhase::Early);
        state.turn = 10;
        assert_eq!(state.phase(), GamePhase::Mid);
        state.turn = 15;
        assert_eq!(state.phase(), GamePhase::Late);
    }

    #[test]
    fn apply_effects_respects_floors_and_ceilings() {
        let mut state = NationalState {
            approval: 95,
            exchange_rate: 5,
            ..NationalState::default()
        };
        let effects = EffectVector {
            approval: 20,
            gdp: -50,
            debt: -100,
            technology: -15,
            environment: 15,
            market_index: -2500,
            exchange_rate: -12,
            diplomacy: 20,
        };
        state.apply_effects(&effects);
        assert_eq!(state.approval, 100);
        assert_eq!(state.gdp, 950);
        assert_eq!(state.debt, 400);
        assert_eq!(state.technology, 35);
        assert_eq!(state.environment, 65);
        assert_eq!(state.market_index, 9500);
        assert_eq!(state.exchange_rate, 1);
        assert_eq!(state.diplomacy, 70);
    }

    #[test]
    fn apply_effects_never_drops_output_below_zero() {
        let mut state = NationalState {
            gdp: 10,
            market_index: 100,
            ..NationalState::default()
        };
        let effects = EffectVector {
            gdp: -50,
            market_index: -2500,
            ..EffectVector::default()
        };
        state.apply_effects(&effects);
        assert_eq!(state.gdp, 0);
        assert_eq!(state.market_index, 0);
    }

    #[test]
    fn turn_clock_saturates_at_limit() {
        let mut state = NationalState::with_turn_limit(3);
        state.turn = 3;
        state.advance_turn();
        assert_eq!(state.turn, 3);
        assert!(state.is_final_turn());
    }

    #[test]
    fn risk_labels_round_trip() {
        for risk in [
            RiskLevel::Low,
            RiskLevel::Medium,
            RiskLevel::High,
            RiskLevel::Critical,
        ] {
            assert_eq!(risk.as_str().parse::<RiskLevel>(), Ok(risk));
        }
        assert!("apocalyptic".parse::<RiskLevel>().is_err());
    }
}
