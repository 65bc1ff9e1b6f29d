//! Political events, response options, and the ideology archetypes used to
//! pad generated events to a full slate.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

use crate::constants::{MAX_EVENT_OPTIONS, MIN_EVENT_OPTIONS};
use crate::effect::EffectVector;

/// Where an event came from. `Fallback` marks the literal template path
/// taken when generation fails end to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    #[default]
    Static,
    Generated,
    Emergency,
    Fallback,
}

impl Provenance {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Generated => "generated",
            Self::Emergency => "emergency",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How quickly the administration must respond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Urgency {
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

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How tangled the trade-offs are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    #[default]
    Moderate,
    Complex,
}

impl Complexity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Moderate => "moderate",
            Self::Complex => "complex",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Posture of a response option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    Aggressive,
    #[default]
    Moderate,
    Cautious,
}

impl Stance {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aggressive => "aggressive",
            Self::Moderate => "moderate",
            Self::Cautious => "cautious",
        }
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The ten ideology archetypes. Generated events are padded to one option
/// per archetype; each carries a house effect profile used as the padding
/// baseline before jitter and normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Ideology {
    Progressive,
    Conservative,
    Libertarian,
    Authoritarian,
    Technocratic,
    Populist,
    Environmentalist,
    Nationalist,
    Globalist,
    #[default]
    Centrist,
}

impl Ideology {
    pub const ALL: [Self; 10] = [
        Self::Progressive,
        Self::Conservative,
        Self::Libertarian,
        Self::Authoritarian,
        Self::Technocratic,
        Self::Populist,
        Self::Environmentalist,
        Self::Nationalist,
        Self::Globalist,
        Self::Centrist,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Progressive => "progressive",
            Self::Conservative => "conservative",
            Self::Libertarian => "libertarian",
            Self::Authoritarian => "authoritarian",
            Self::Technocratic => "technocratic",
            Self::Populist => "populist",
            Self::Environmentalist => "environmentalist",
            Self::Nationalist => "nationalist",
            Self::Globalist => "globalist",
            Self::Centrist => "centrist",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Progressive => "Progressive",
            Self::Conservative => "Conservative",
            Self::Libertarian => "Libertarian",
            Self::Authoritarian => "Authoritarian",
            Self::Technocratic => "Technocratic",
            Self::Populist => "Populist",
            Self::Environmentalist => "Environmentalist",
            Self::Nationalist => "Nationalist",
            Self::Globalist => "Globalist",
            Self::Centrist => "Centrist",
        }
    }

    /// Default posture a padded option takes for this archetype.
    #[must_use]
    pub const fn default_stance(self) -> Stance {
        match self {
            Self::Authoritarian | Self::Populist | Self::Nationalist | Self::Libertarian => {
                Stance::Aggressive
            }
            Self::Progressive | Self::Globalist | Self::Environmentalist => Stance::Moderate,
            Self::Conservative | Self::Technocratic | Self::Centrist => Stance::Cautious,
        }
    }

    /// House phrase stitched into padded option text.
    #[must_use]
    pub const fn padding_line(self) -> &'static str {
        match self {
            Self::Progressive => "Expand public programs and shield affected households",
            Self::Conservative => "Hold the fiscal line and lean on existing institutions",
            Self::Libertarian => "Deregulate, cut spending, and let markets absorb the shock",
            Self::Authoritarian => "Centralize command and push an executive decree through",
            Self::Technocratic => "Commission experts and pilot a data-driven remedy",
            Self::Populist => "Promise direct relief and call out the establishment",
            Self::Environmentalist => "Prioritize long-term sustainability over short-term output",
            Self::Nationalist => "Put domestic industry and sovereignty first",
            Self::Globalist => "Coordinate the response with allies and multilateral bodies",
            Self::Centrist => "Broker a cross-party compromise and stage the rollout",
        }
    }

    /// Baseline effect profile for a padded option. Jittered by the caller
    /// and then normalized, so bounds are re-asserted downstream.
    #[must_use]
    pub const fn house_effects(self) -> EffectVector {
        match self {
            Self::Progressive => EffectVector {
                approval: 6,
                gdp: -5,
                debt: 20,
                technology: 2,
                environment: 6,
                market_index: -200,
                exchange_rate: 0,
                diplomacy: 4,
            },
            Self::Conservative => EffectVector {
                approval: -2,
                gdp: 8,
                debt: -15,
                technology: 0,
                environment: -4,
                market_index: 300,
                exchange_rate: -2,
                diplomacy: 0,
            },
            Self::Libertarian => EffectVector {
                approval: -1,
                gdp: 10,
                debt: -25,
                technology: 4,
                environment: -5,
                market_index: 450,
                exchange_rate: -3,
                diplomacy: -2,
            },
            Self::Authoritarian => EffectVector {
                approval: -6,
                gdp: 4,
                debt: 10,
                technology: 3,
                environment: -3,
                market_index: -150,
                exchange_rate: 4,
                diplomacy: -6,
            },
            Self::Technocratic => EffectVector {
                approval: 1,
                gdp: 6,
                debt: 15,
                technology: 8,
                environment: 2,
                market_index: 250,
                exchange_rate: -1,
                diplomacy: 2,
            },
            Self::Populist => EffectVector {
                approval: 9,
                gdp: -3,
                debt: 30,
                technology: -2,
                environment: 0,
                market_index: -350,
                exchange_rate: 3,
                diplomacy: -3,
            },
            Self::Environmentalist => EffectVector {
                approval: 3,
                gdp: -6,
                debt: 18,
                technology: 3,
                environment: 9,
                market_index: -300,
                exchange_rate: 1,
                diplomacy: 3,
            },
            Self::Nationalist => EffectVector {
                approval: 4,
                gdp: -2,
                debt: 8,
                technology: 1,
                environment: -2,
                market_index: -100,
                exchange_rate: 5,
                diplomacy: -7,
            },
            Self::Globalist => EffectVector {
                approval: -2,
                gdp: 7,
                debt: 5,
                technology: 3,
                environment: 1,
                market_index: 400,
                exchange_rate: -4,
                diplomacy: 8,
            },
            Self::Centrist => EffectVector {
                approval: 2,
                gdp: 2,
                debt: 5,
                technology: 1,
                environment: 1,
                market_index: 100,
                exchange_rate: 0,
                diplomacy: 2,
            },
        }
    }
}

impl fmt::Display for Ideology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ideology {
    type Err = ();

    /// Accepts provider spellings loosely ("Progressive", " populist ").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|i| i.as_str() == needle)
            .ok_or(())
    }
}

/// Crisis families the emergency path draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrisisArchetype {
    NaturalDisaster,
    EconomicShock,
    DiplomaticIncident,
    SecurityIncident,
    CivilUnrest,
    InfrastructureFailure,
}

impl CrisisArchetype {
    pub const ALL: [Self; 6] = [
        Self::NaturalDisaster,
        Self::EconomicShock,
        Self::DiplomaticIncident,
        Self::SecurityIncident,
        Self::CivilUnrest,
        Self::InfrastructureFailure,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NaturalDisaster => "natural_disaster",
            Self::EconomicShock => "economic_shock",
            Self::DiplomaticIncident => "diplomatic_incident",
            Self::SecurityIncident => "security_incident",
            Self::CivilUnrest => "civil_unrest",
            Self::InfrastructureFailure => "infrastructure_failure",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::NaturalDisaster => "Natural Disaster",
            Self::EconomicShock => "Economic Shock",
            Self::DiplomaticIncident => "Diplomatic Incident",
            Self::SecurityIncident => "Security Incident",
            Self::CivilUnrest => "Civil Unrest",
            Self::InfrastructureFailure => "Infrastructure Failure",
        }
    }

    /// Scene-setting line embedded in the emergency prompt.
    #[must_use]
    pub const fn prompt_theme(self) -> &'static str {
        match self {
            Self::NaturalDisaster => {
                "a sudden natural disaster overwhelming regional response capacity"
            }
            Self::EconomicShock => {
                "an abrupt financial shock rattling markets and the currency"
            }
            Self::DiplomaticIncident => {
                "a diplomatic incident straining relations with a key partner state"
            }
            Self::SecurityIncident => {
                "a security incident demanding an immediate national response"
            }
            Self::CivilUnrest => {
                "mass civil unrest spreading across major cities"
            }
            Self::InfrastructureFailure => {
                "a cascading infrastructure failure disrupting essential services"
            }
        }
    }
}

impl fmt::Display for CrisisArchetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One way the administration can respond to an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventOption {
    pub text: String,
    #[serde(default)]
    pub ideology: Ideology,
    #[serde(default)]
    pub stance: Stance,
    #[serde(default)]
    pub effects: EffectVector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_note: Option<String>,
}

/// A turn's political dilemma. Built by the event director and read-only
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub complexity: Complexity,
    #[serde(default)]
    pub background: String,
    #[serde(default, skip_serializing_if = "SmallVec::is_empty")]
    pub stakeholders: SmallVec<[String; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_constraint: Option<String>,
    #[serde(default)]
    pub provenance: Provenance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archetype: Option<CrisisArchetype>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_reason: Option<String>,
    pub options: Vec<EventOption>,
}

impl Event {
    /// Whether the option slate sits in the allowed 3..=10 band.
    #[must_use]
    pub fn has_valid_option_count(&self) -> bool {
        (MIN_EVENT_OPTIONS..=MAX_EVENT_OPTIONS).contains(&self.options.len())
    }
}
