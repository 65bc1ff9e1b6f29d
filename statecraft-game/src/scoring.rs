//! Weighted Policy Scoring Model.
//!
//! Ten fixed fields, five named sub-parameters each, weights summing to
//! exactly 100. `score_policy` is pure apart from the injected RNG.
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{
    KEYWORD_BUMP_MAX, KEYWORD_BUMP_MIN, SCORE_ADEQUATE, SCORE_EXCELLENT, SCORE_GOOD,
    SUB_PARAM_MAX, SUB_PARAM_MIN, SUB_PARAM_NEUTRAL,
};
use crate::state::NationalState;

/// The ten scored policy areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreField {
    Economic,
    Fiscal,
    Welfare,
    Education,
    Diplomatic,
    Environmental,
    Governance,
    Social,
    Technological,
    Informational,
}

impl ScoreField {
    pub const ALL: [Self; 10] = [
        Self::Economic,
        Self::Fiscal,
        Self::Welfare,
        Self::Education,
        Self::Diplomatic,
        Self::Environmental,
        Self::Governance,
        Self::Social,
        Self::Technological,
        Self::Informational,
    ];

    /// Fixed percentage weight; the ten weights sum to exactly 100.
    #[must_use]
    pub const fn weight(self) -> i32 {
        match self {
            Self::Economic => 15,
            Self::Informational => 5,
            _ => 10,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Economic => "economic",
            Self::Fiscal => "fiscal",
            Self::Welfare => "welfare",
            Self::Education => "education",
            Self::Diplomatic => "diplomatic",
            Self::Environmental => "environmental",
            Self::Governance => "governance",
            Self::Social => "social",
            Self::Technological => "technological",
            Self::Informational => "informational",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Economic => "Economic",
            Self::Fiscal => "Fiscal",
            Self::Welfare => "Welfare",
            Self::Education => "Education",
            Self::Diplomatic => "Diplomatic",
            Self::Environmental => "Environmental",
            Self::Governance => "Governance",
            Self::Social => "Social",
            Self::Technological => "Technological",
            Self::Informational => "Informational",
        }
    }

    /// Terms that mark a policy text as touching this field.
    const fn vocabulary(self) -> &'static [&'static str] {
        match self {
            Self::Economic => &[
                "econom", "invest", "trade", "industr", "growth", "manufactur", "export",
                "market",
            ],
            Self::Fiscal => &[
                "tax", "budget", "deficit", "debt", "spending", "fiscal", "revenue", "subsid",
            ],
            Self::Welfare => &[
                "welfare", "healthcare", "health", "housing", "pension", "poverty", "benefit",
                "unemploy",
            ],
            Self::Education => &[
                "education", "school", "universit", "teacher", "student", "curriculum",
                "literacy", "vocational",
            ],
            Self::Diplomatic => &[
                "diplomat", "internation", "treaty", "alliance", "foreign", "embassy",
                "summit", "sanction",
            ],
            Self::Environmental => &[
                "environment", "climate", "emission", "renewable", "green", "conserv",
                "pollut", "wildlife",
            ],
            Self::Governance => &[
                "reform", "corrupt", "transparen", "institution", "judicial", "constitution",
                "oversight", "rule of law",
            ],
            Self::Social => &[
                "communit", "equality", "civil", "culture", "inclusion", "minorit", "family",
                "safety",
            ],
            Self::Technological => &[
                "technolog", "digital", "innovat", "research", "broadband", "automation",
                "cyber", "data",
            ],
            Self::Informational => &[
                "press", "media", "information", "broadcast", "journalis", "misinformation",
                "communication",
            ],
        }
    }
}

impl std::fmt::Display for ScoreField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evaluation label from fixed total-score thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankLabel {
    Excellent,
    Good,
    Adequate,
    NeedsImprovement,
}

impl RankLabel {
    #[must_use]
    pub const fn for_score(total: i32) -> Self {
        if total >= SCORE_EXCELLENT {
            Self::Excellent
        } else if total >= SCORE_GOOD {
            Self::Good
        } else if total >= SCORE_ADEQUATE {
            Self::Adequate
        } else {
            Self::NeedsImprovement
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Adequate => "adequate",
            Self::NeedsImprovement => "needs_improvement",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Adequate => "Adequate",
            Self::NeedsImprovement => "Needs Improvement",
        }
    }
}

impl std::fmt::Display for RankLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomicParams {
    pub growth: i32,
    pub stability: i32,
    pub employment: i32,
    pub investment: i32,
    pub productivity: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiscalParams {
    pub revenue: i32,
    pub spending_discipline: i32,
    pub debt_management: i32,
    pub procurement: i32,
    pub reserves: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WelfareParams {
    pub healthcare: i32,
    pub housing: i32,
    pub pensions: i32,
    pub poverty_relief: i32,
    pub childcare: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationParams {
    pub access: i32,
    pub quality: i32,
    pub research_funding: i32,
    pub vocational_training: i32,
    pub adult_literacy: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiplomaticParams {
    pub alliances: i32,
    pub trade_relations: i32,
    pub reputation: i32,
    pub conflict_resolution: i32,
    pub consular_services: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentalParams {
    pub emissions_control: i32,
    pub conservation: i32,
    pub renewables: i32,
    pub climate_resilience: i32,
    pub enforcement: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceParams {
    pub rule_of_law: i32,
    pub anticorruption: i32,
    pub efficiency: i32,
    pub accountability: i32,
    pub decentralization: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialParams {
    pub cohesion: i32,
    pub equality: i32,
    pub civil_liberties: i32,
    pub cultural_life: i32,
    pub public_safety: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnologicalParams {
    pub infrastructure: i32,
    pub adoption: i32,
    pub innovation: i32,
    pub cybersecurity: i32,
    pub digital_services: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InformationalParams {
    pub press_freedom: i32,
    pub open_data: i32,
    pub media_literacy: i32,
    pub public_messaging: i32,
    pub data_protection: i32,
}

impl Default for EconomicParams {
    fn default() -> Self {
        Self {
            growth: SUB_PARAM_NEUTRAL,
            stability: SUB_PARAM_NEUTRAL,
            employment: SUB_PARAM_NEUTRAL,
            investment: SUB_PARAM_NEUTRAL,
            productivity: SUB_PARAM_NEUTRAL,
        }
    }
}

impl EconomicParams {
    fn apply<F: FnMut(i32) -> i32>(&mut self, f: &mut F) {
        self.growth = f(self.growth);
        self.stability = f(self.stability);
        self.employment = f(self.employment);
        self.investment = f(self.investment);
        self.productivity = f(self.productivity);
    }

    fn sum(&self) -> i32 {
        self.growth + self.stability + self.employment + self.investment + self.productivity
    }
}

impl Default for FiscalParams {
    fn default() -> Self {
        Self {
            revenue: SUB_PARAM_NEUTRAL,
            spending_discipline: SUB_PARAM_NEUTRAL,
            debt_management: SUB_PARAM_NEUTRAL,
            procurement: SUB_PARAM_NEUTRAL,
            reserves: SUB_PARAM_NEUTRAL,
        }
    }
}

impl FiscalParams {
    fn apply<F: FnMut(i32) -> i32>(&mut self, f: &mut F) {
        self.revenue = f(self.revenue);
        self.spending_discipline = f(self.spending_discipline);
        self.debt_management = f(self.debt_management);
        self.procurement = f(self.procurement);
        self.reserves = f(self.reserves);
    }

    fn sum(&self) -> i32 {
        self.revenue
            + self.spending_discipline
            + self.debt_management
            + self.procurement
            + self.reserves
    }
}

impl Default for WelfareParams {
    fn default() -> Self {
        Self {
            healthcare: SUB_PARAM_NEUTRAL,
            housing: SUB_PARAM_NEUTRAL,
            pensions: SUB_PARAM_NEUTRAL,
            poverty_relief: SUB_PARAM_NEUTRAL,
            childcare: SUB_PARAM_NEUTRAL,
        }
    }
}

impl WelfareParams {
    fn apply<F: FnMut(i32) -> i32>(&mut self, f: &mut F) {
        self.healthcare = f(self.healthcare);
        self.housing = f(self.housing);
        self.pensions = f(self.pensions);
        self.poverty_relief = f(self.poverty_relief);
        self.childcare = f(self.childcare);
    }

    fn sum(&self) -> i32 {
        self.healthcare + self.housing + self.pensions + self.poverty_relief + self.childcare
    }
}

impl Default for EducationParams {
    fn default() -> Self {
        Self {
            access: SUB_PARAM_NEUTRAL,
            quality: SUB_PARAM_NEUTRAL,
            research_funding: SUB_PARAM_NEUTRAL,
            vocational_training: SUB_PARAM_NEUTRAL,
            adult_literacy: SUB_PARAM_NEUTRAL,
        }
    }
}

impl EducationParams {
    fn apply<F: FnMut(i32) -> i32>(&mut self, f: &mut F) {
        self.access = f(self.access);
        self.quality = f(self.quality);
        self.research_funding = f(self.research_funding);
        self.vocational_training = f(self.vocational_training);
        self.adult_literacy = f(self.adult_literacy);
    }

    fn sum(&self) -> i32 {
        self.access
            + self.quality
            + self.research_funding
            + self.vocational_training
            + self.adult_literacy
    }
}

impl Default for DiplomaticParams {
    fn default() -> Self {
        Self {
            alliances: SUB_PARAM_NEUTRAL,
            trade_relations: SUB_PARAM_NEUTRAL,
            reputation: SUB_PARAM_NEUTRAL,
            conflict_resolution: SUB_PARAM_NEUTRAL,
            consular_services: SUB_PARAM_NEUTRAL,
        }
    }
}

impl DiplomaticParams {
    fn apply<F: FnMut(i32) -> i32>(&mut self, f: &mut F) {
        self.alliances = f(self.alliances);
        self.trade_relations = f(self.trade_relations);
        self.reputation = f(self.reputation);
        self.conflict_resolution = f(self.conflict_resolution);
        self.consular_services = f(self.consular_services);
    }

    fn sum(&self) -> i32 {
        self.alliances
            + self.trade_relations
            + self.reputation
            + self.conflict_resolution
            + self.consular_services
    }
}

impl Default for EnvironmentalParams {
    fn default() -> Self {
        Self {
            emissions_control: SUB_PARAM_NEUTRAL,
            conservation: SUB_PARAM_NEUTRAL,
            renewables: SUB_PARAM_NEUTRAL,
            climate_resilience: SUB_PARAM_NEUTRAL,
            enforcement: SUB_PARAM_NEUTRAL,
        }
    }
}

impl EnvironmentalParams {
    fn apply<F: FnMut(i32) -> i32>(&mut self, f: &mut F) {
        self.emissions_control = f(self.emissions_control);
        self.conservation = f(self.conservation);
        self.renewables = f(self.renewables);
        self.climate_resilience = f(self.climate_resilience);
        self.enforcement = f(self.enforcement);
    }

    fn sum(&self) -> i32 {
        self.emissions_control
            + self.conservation
            + self.renewables
            + self.climate_resilience
            + self.enforcement
    }
}

impl Default for GovernanceParams {
    fn default() -> Self {
        Self {
            rule_of_law: SUB_PARAM_NEUTRAL,
            anticorruption: SUB_PARAM_NEUTRAL,
            efficiency: SUB_PARAM_NEUTRAL,
            accountability: SUB_PARAM_NEUTRAL,
            decentralization: SUB_PARAM_NEUTRAL,
        }
    }
}

impl GovernanceParams {
    fn apply<F: FnMut(i32) -> i32>(&mut self, f: &mut F) {
        self.rule_of_law = f(self.rule_of_law);
        self.anticorruption = f(self.anticorruption);
        self.efficiency = f(self.efficiency);
        self.accountability = f(self.accountability);
        self.decentralization = f(self.decentralization);
    }

    fn sum(&self) -> i32 {
        self.rule_of_law
            + self.anticorruption
            + self.efficiency
            + self.accountability
            + self.decentralization
    }
}

impl Default for SocialParams {
    fn default() -> Self {
        Self {
            cohesion: SUB_PARAM_NEUTRAL,
            equality: SUB_PARAM_NEUTRAL,
            civil_liberties: SUB_PARAM_NEUTRAL,
            cultural_life: SUB_PARAM_NEUTRAL,
            public_safety: SUB_PARAM_NEUTRAL,
        }
    }
}

impl SocialParams {
    fn apply<F: FnMut(i32) -> i32>(&mut self, f: &mut F) {
        self.cohesion = f(self.cohesion);
        self.equality = f(self.equality);
        self.civil_liberties = f(self.civil_liberties);
        self.cultural_life = f(self.cultural_life);
        self.public_safety = f(self.public_safety);
    }

    fn sum(&self) -> i32 {
        self.cohesion
            + self.equality
            + self.civil_liberties
            + self.cultural_life
            + self.public_safety
    }
}

impl Default for TechnologicalParams {
    fn default() -> Self {
        Self {
            infrastructure: SUB_PARAM_NEUTRAL,
            adoption: SUB_PARAM_NEUTRAL,
            innovation: SUB_PARAM_NEUTRAL,
            cybersecurity: SUB_PARAM_NEUTRAL,
            digital_services: SUB_PARAM_NEUTRAL,
        }
    }
}

impl TechnologicalParams {
    fn apply<F: FnMut(i32) -> i32>(&mut self, f: &mut F) {
        self.infrastructure = f(self.infrastructure);
        self.adoption = f(self.adoption);
        self.innovation = f(self.innovation);
        self.cybersecurity = f(self.cybersecurity);
        self.digital_services = f(self.digital_services);
    }

    fn sum(&self) -> i32 {
        self.infrastructure
            + self.adoption
            + self.innovation
            + self.cybersecurity
            + self.digital_services
    }
}

impl Default for InformationalParams {
    fn default() -> Self {
        Self {
            press_freedom: SUB_PARAM_NEUTRAL,
            open_data: SUB_PARAM_NEUTRAL,
            media_literacy: SUB_PARAM_NEUTRAL,
            public_messaging: SUB_PARAM_NEUTRAL,
            data_protection: SUB_PARAM_NEUTRAL,
        }
    }
}

impl InformationalParams {
    fn apply<F: FnMut(i32) -> i32>(&mut self, f: &mut F) {
        self.press_freedom = f(self.press_freedom);
        self.open_data = f(self.open_data);
        self.media_literacy = f(self.media_literacy);
        self.public_messaging = f(self.public_messaging);
        self.data_protection = f(self.data_protection);
    }

    fn sum(&self) -> i32 {
        self.press_freedom
            + self.open_data
            + self.media_literacy
            + self.public_messaging
            + self.data_protection
    }
}

/// Full 50-sub-parameter baseline handed to the scorer. Defaults to the
/// neutral mid-band value everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ParameterSnapshot {
    pub economic: EconomicParams,
    pub fiscal: FiscalParams,
    pub welfare: WelfareParams,
    pub education: EducationParams,
    pub diplomatic: DiplomaticParams,
    pub environmental: EnvironmentalParams,
    pub governance: GovernanceParams,
    pub social: SocialParams,
    pub technological: TechnologicalParams,
    pub informational: InformationalParams,
}

impl ParameterSnapshot {
    fn apply_field<F>(&mut self, field: ScoreField, f: &mut F)
    where
        F: FnMut(i32) -> i32,
    {
        match field {
            ScoreField::Economic => self.economic.apply(f),
            ScoreField::Fiscal => self.fiscal.apply(f),
            ScoreField::Welfare => self.welfare.apply(f),
            ScoreField::Education => self.education.apply(f),
            ScoreField::Diplomatic => self.diplomatic.apply(f),
            ScoreField::Environmental => self.environmental.apply(f),
            ScoreField::Governance => self.governance.apply(f),
            ScoreField::Social => self.social.apply(f),
            ScoreField::Technological => self.technological.apply(f),
            ScoreField::Informational => self.informational.apply(f),
        }
    }

    /// Sum of the field's five sub-parameters, in [0,100] once clamped.
    #[must_use]
    pub fn field_score(&self, field: ScoreField) -> i32 {
        match field {
            ScoreField::Economic => self.economic.sum(),
            ScoreField::Fiscal => self.fiscal.sum(),
            ScoreField::Welfare => self.welfare.sum(),
            ScoreField::Education => self.education.sum(),
            ScoreField::Diplomatic => self.diplomatic.sum(),
            ScoreField::Environmental => self.environmental.sum(),
            ScoreField::Governance => self.governance.sum(),
            ScoreField::Social => self.social.sum(),
            ScoreField::Technological => self.technological.sum(),
            ScoreField::Informational => self.informational.sum(),
        }
    }

    /// Clamp every sub-parameter into band.
    pub fn clamp_all(&mut self) {
        for field in ScoreField::ALL {
            self.apply_field(field, &mut |v| v.clamp(SUB_PARAM_MIN, SUB_PARAM_MAX));
        }
    }

    /// Weighted total of the snapshot as it stands, rounded half-up.
    #[must_use]
    pub fn total_score(&self) -> i32 {
        let hundredths: i32 = ScoreField::ALL
            .iter()
            .map(|f| self.field_score(*f) * f.weight())
            .sum();
        (hundredths + 50) / 100
    }
}

/// One field's contribution to a score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldScore {
    pub field: ScoreField,
    /// Raw field score in [0,100].
    pub score: i32,
    /// `score / 100 × weight`.
    pub weighted: f64,
}

/// Outcome of scoring one policy text against a baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub total_score: i32,
    pub label: RankLabel,
    /// Highest-scoring field; ties resolve to the earliest field in the
    /// fixed field order.
    pub strongest_field: ScoreField,
    pub annotation: String,
    pub field_scores: Vec<FieldScore>,
}

/// Final-standing entry persisted by hosts. Shape only; the engine never
/// stores these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRecord {
    pub player_name: String,
    pub total_score: i32,
    pub rank_label: RankLabel,
    pub final_state: NationalState,
    pub timestamp: DateTime<Utc>,
}

impl RankingRecord {
    #[must_use]
    pub fn new(player_name: &str, result: &ScoreResult, final_state: NationalState) -> Self {
        Self {
            player_name: player_name.to_string(),
            total_score: result.total_score,
            rank_label: result.label,
            final_state,
            timestamp: Utc::now(),
        }
    }
}

/// Score a policy text against a baseline snapshot. Matched fields take a
/// bounded bump on each sub-parameter; everything is clamped back into
/// band before aggregation, so the total always lands in [0,100].
pub fn score_policy<R>(policy_text: &str, baseline: &ParameterSnapshot, rng: &mut R) -> ScoreResult
where
    R: Rng + ?Sized,
{
    let lower = policy_text.to_lowercase();
    let mut snapshot = *baseline;
    snapshot.clamp_all();

    for field in ScoreField::ALL {
        if field.vocabulary().iter().any(|term| lower.contains(term)) {
            snapshot.apply_field(field, &mut |v| {
                v + rng.gen_range(KEYWORD_BUMP_MIN..=KEYWORD_BUMP_MAX)
            });
        }
    }
    snapshot.clamp_all();

    let field_scores: Vec<FieldScore> = ScoreField::ALL
        .iter()
        .map(|&field| {
            let score = snapshot.field_score(field);
            FieldScore {
                field,
                score,
                weighted: f64::from(score) / 100.0 * f64::from(field.weight()),
            }
        })
        .collect();

    let total_score = snapshot.total_score();
    let label = RankLabel::for_score(total_score);
    // First field in the fixed order wins ties.
    let mut strongest_field = ScoreField::Economic;
    let mut best = i32::MIN;
    for fs in &field_scores {
        if fs.score > best {
            best = fs.score;
            strongest_field = fs.field;
        }
    }
    let annotation = format!(
        "{}; strongest area: {}",
        label.display_name(),
        strongest_field.display_name()
    );

    ScoreResult {
        total_score,
        label,
        strongest_field,
        annotation,
        field_scores,
    }
}
