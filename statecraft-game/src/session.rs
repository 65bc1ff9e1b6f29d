//! Per-playthrough facade.
//!
//! `GameSession` owns every piece of controller state the engine defines
//! and wires them together: one director, one analyzer, one router, one
//! telemetry ledger, one RNG bundle. Hosts drive it sequentially; nothing
//! here is shared across sessions.
use log::info;
use std::sync::Arc;

use crate::analyzer::{EffectAnalysis, PolicyAnalyzer};
use crate::constants::{
    LOG_REGISTRY_RESET, LOW_APPROVAL_THRESHOLD, RISK_APPROVAL_WATCH, RISK_INDICATOR_STRAIN,
    TREND_APPROVAL_STEP, TREND_ECONOMY_STEP, TREND_WINDOW,
};
use crate::director::{DecisionTrace, EventDirector, TurnContext};
use crate::event::Event;
use crate::prompt::PromptContext;
use crate::provider::{FallbackRouter, ProviderKind, ProviderStatus, TextProvider};
use crate::rng::RngBundle;
use crate::scoring::{self, ParameterSnapshot, ScoreResult};
use crate::seed;
use crate::state::{
    ApprovalTrend, ChoiceRecord, EconomicTrend, NationalState, RiskLevel, TrendSnapshot,
};
use crate::telemetry::{Endpoint, Telemetry, UsageReport};

/// One full playthrough: state, history, controllers, RNG.
pub struct GameSession {
    seed: u64,
    seed_code: Option<String>,
    state: NationalState,
    history: Vec<ChoiceRecord>,
    /// `(approval, gdp)` at the end of each completed turn; feeds the
    /// trend window.
    indicator_log: Vec<(i32, i32)>,
    baseline: ParameterSnapshot,
    director: EventDirector,
    analyzer: PolicyAnalyzer,
    router: FallbackRouter,
    telemetry: Telemetry,
    rng: RngBundle,
    last_trace: Option<DecisionTrace>,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GameSession {
    /// Fresh session with an entropy-derived share code.
    #[must_use]
    pub fn new() -> Self {
        let entropy: u64 = rand::random();
        let code = seed::generate_code_from_entropy(entropy);
        // Entropy-generated codes always decode; the fallback never fires.
        let seed = seed::decode_to_seed(&code).unwrap_or(entropy);
        Self::from_parts(seed, Some(code))
    }

    /// Session from a raw numeric seed (no share code).
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self::from_parts(seed, None)
    }

    /// Session from a friendly share code like `ST-SUMMIT42`.
    #[must_use]
    pub fn from_seed_code(code: &str) -> Option<Self> {
        let seed = seed::decode_to_seed(code)?;
        Some(Self::from_parts(seed, Some(seed::encode_friendly(seed))))
    }

    fn from_parts(seed: u64, seed_code: Option<String>) -> Self {
        Self {
            seed,
            seed_code,
            state: NationalState::default(),
            history: Vec::new(),
            indicator_log: Vec::new(),
            baseline: ParameterSnapshot::default(),
            director: EventDirector::new(),
            analyzer: PolicyAnalyzer::new(),
            router: FallbackRouter::new(),
            telemetry: Telemetry::new(),
            rng: RngBundle::from_user_seed(seed),
            last_trace: None,
        }
    }

    /// Replace the default turn limit before play starts.
    #[must_use]
    pub fn with_turn_limit(mut self, turn_limit: u32) -> Self {
        self.state = NationalState::with_turn_limit(turn_limit);
        self
    }

    /// Register an external provider slot (remote or local).
    pub fn register_provider(&mut self, provider: Arc<dyn TextProvider>) {
        let router = std::mem::take(&mut self.router);
        self.router = router.with_provider(provider);
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn seed_code(&self) -> Option<&str> {
        self.seed_code.as_deref()
    }

    #[must_use]
    pub const fn state(&self) -> &NationalState {
        &self.state
    }

    #[must_use]
    pub fn history(&self) -> &[ChoiceRecord] {
        &self.history
    }

    /// Decision trace of the most recent `next_event` call.
    #[must_use]
    pub const fn last_trace(&self) -> Option<&DecisionTrace> {
        self.last_trace.as_ref()
    }

    #[must_use]
    pub const fn baseline(&self) -> &ParameterSnapshot {
        &self.baseline
    }

    /// Replace the scoring baseline (clamped at scoring time).
    pub fn set_baseline(&mut self, baseline: ParameterSnapshot) {
        self.baseline = baseline;
    }

    /// Trend context for the current turn, derived from the indicator log.
    #[must_use]
    pub fn trend(&self) -> TrendSnapshot {
        let (approval_trend, economic_trend) = self.derive_trends();
        TrendSnapshot {
            approval_trend,
            economic_trend,
            risk: self.derive_risk(economic_trend),
        }
    }

    fn derive_trends(&self) -> (ApprovalTrend, EconomicTrend) {
        let reference = self
            .indicator_log
            .iter()
            .rev()
            .nth(TREND_WINDOW - 1)
            .or_else(|| self.indicator_log.first());
        let Some(&(past_approval, past_gdp)) = reference else {
            return (ApprovalTrend::default(), EconomicTrend::default());
        };

        let approval_delta = self.state.approval - past_approval;
        let approval_trend = if approval_delta >= TREND_APPROVAL_STEP {
            ApprovalTrend::Rising
        } else if approval_delta <= -TREND_APPROVAL_STEP {
            ApprovalTrend::Falling
        } else {
            ApprovalTrend::Steady
        };

        let gdp_delta = self.state.gdp - past_gdp;
        let economic_trend = if gdp_delta >= TREND_ECONOMY_STEP {
            EconomicTrend::Expansion
        } else if gdp_delta <= -TREND_ECONOMY_STEP {
            EconomicTrend::Recession
        } else {
            EconomicTrend::Stable
        };

        (approval_trend, economic_trend)
    }

    /// Pressure score over the indicators, bucketed into the four tiers.
    fn derive_risk(&self, economy: EconomicTrend) -> RiskLevel {
        let s = &self.state;
        let mut pressure = 0;
        if s.approval < LOW_APPROVAL_THRESHOLD {
            pressure += 2;
        } else if s.approval < RISK_APPROVAL_WATCH {
            pressure += 1;
        }
        if s.debt > s.gdp {
            pressure += 2;
        } else if s.debt * 2 > s.gdp {
            pressure += 1;
        }
        if economy == EconomicTrend::Recession {
            pressure += 1;
        }
        if s.environment < RISK_INDICATOR_STRAIN {
            pressure += 1;
        }
        if s.diplomacy < RISK_INDICATOR_STRAIN {
            pressure += 1;
        }
        match pressure {
            0 => RiskLevel::Low,
            1 | 2 => RiskLevel::Medium,
            3 | 4 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }

    /// Probe all registered providers and adopt the best available slot.
    pub async fn probe_providers(&mut self) -> Vec<ProviderStatus> {
        self.router.probe_all().await
    }

    /// Re-probe; may promote a recovered provider.
    pub async fn recheck_providers(&mut self) -> Vec<ProviderStatus> {
        self.router.recheck_providers().await
    }

    /// Manually select a provider. Refused (returning false) when the slot
    /// is unregistered or last probed unavailable.
    pub fn set_provider(&mut self, kind: ProviderKind) -> bool {
        self.router.set_provider(kind)
    }

    #[must_use]
    pub const fn active_provider(&self) -> ProviderKind {
        self.router.active()
    }

    /// Produce the next event for the current turn. Never fails; the worst
    /// case is a template event.
    pub async fn next_event(&mut self) -> Event {
        let trend = self.trend();
        let ctx = TurnContext {
            state: &self.state,
            trend,
            history: &self.history,
            exclude_ids: &[],
        };
        let (event, trace) = self
            .director
            .next_event(&ctx, &mut self.router, &self.rng, &mut self.telemetry)
            .await;
        self.last_trace = Some(trace);
        event
    }

    /// Project the impact of a free-text policy decision.
    pub async fn analyze_policy(&mut self, policy_text: &str) -> EffectAnalysis {
        let trend = self.trend();
        let ctx = PromptContext {
            state: &self.state,
            trend,
            history: &self.history,
        };
        self.analyzer
            .analyze(policy_text, &ctx, &mut self.router, &self.rng, &mut self.telemetry)
            .await
    }

    /// Score a policy text against the session baseline.
    pub fn score_policy(&mut self, policy_text: &str) -> ScoreResult {
        self.telemetry.record_call(Endpoint::PolicyScoring);
        let mut stream = self.rng.heuristic();
        scoring::score_policy(policy_text, &self.baseline, &mut *stream)
    }

    /// Commit one option of an event: apply its effects, record the
    /// choice, advance the turn clock. Returns false (and changes nothing)
    /// for an out-of-range option index.
    pub fn apply_choice(&mut self, event: &Event, option_index: usize) -> bool {
        let Some(option) = event.options.get(option_index) else {
            return false;
        };
        self.state.apply_effects(&option.effects);
        self.history.push(ChoiceRecord {
            turn: self.state.turn,
            event_id: event.id.clone(),
            title: event.title.clone(),
            option_text: option.text.clone(),
            ideology: option.ideology,
            effects: option.effects,
        });
        self.indicator_log.push((self.state.approval, self.state.gdp));
        self.state.advance_turn();
        true
    }

    /// Commit an analyzed free-text policy the same way an event option is
    /// committed.
    pub fn apply_analysis(&mut self, policy_text: &str, analysis: &EffectAnalysis) {
        self.state.apply_effects(&analysis.effects);
        self.history.push(ChoiceRecord {
            turn: self.state.turn,
            event_id: format!("policy-{}", self.state.turn),
            title: "Policy directive".to_string(),
            option_text: policy_text.to_string(),
            ideology: crate::event::Ideology::Centrist,
            effects: analysis.effects,
        });
        self.indicator_log.push((self.state.approval, self.state.gdp));
        self.state.advance_turn();
    }

    /// Endpoint counters, provider statuses and the rolling note log.
    #[must_use]
    pub fn usage_report(&self) -> UsageReport {
        self.telemetry.report(self.router.active(), self.router.statuses())
    }

    /// Full reset: national state, history, both used-id registries, the
    /// analysis cache, telemetry, and the RNG streams (re-derived from the
    /// session seed). Provider registrations and statuses survive.
    pub fn reset(&mut self) {
        info!("{LOG_REGISTRY_RESET}: session state cleared");
        self.state = NationalState::with_turn_limit(self.state.turn_limit);
        self.history.clear();
        self.indicator_log.clear();
        self.director.reset();
        self.analyzer.reset();
        self.telemetry.reset();
        self.rng = RngBundle::from_user_seed(self.seed);
        self.last_trace = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::EffectVector;
    use crate::event::{EventOption, Ideology, Provenance, Stance, Urgency};

    fn two_option_event(id: &str) -> Event {
        let option = |text: &str, approval: i32| EventOption {
            text: text.to_string(),
            ideology: Ideology::Centrist,
            stance: Stance::Moderate,
            effects: EffectVector {
                approval,
                gdp: 20,
                ..EffectVector::default()
            },
            policy_note: None,
        };
        Event {
            id: id.to_string(),
            title: "Test Motion".to_string(),
            description: "A motion.".to_string(),
            category: "governance".to_string(),
            urgency: Urgency::Medium,
            complexity: crate::event::Complexity::Simple,
            background: String::new(),
            stakeholders: smallvec::SmallVec::new(),
            time_constraint: None,
            provenance: Provenance::Static,
            archetype: None,
            generation_reason: None,
            options: vec![option("back it", 5), option("block it", -5)],
        }
    }

    #[test]
    fn fresh_session_opens_calm() {
        let session = GameSession::from_seed(42);
        assert_eq!(session.state().turn, 1);
        assert_eq!(session.state().approval, 50);
        let trend = session.trend();
        assert_eq!(trend.approval_trend, ApprovalTrend::Steady);
        assert_eq!(trend.economic_trend, EconomicTrend::Stable);
        assert_eq!(trend.risk, RiskLevel::Low);
        assert_eq!(session.active_provider(), ProviderKind::Static);
    }

    #[test]
    fn entropy_sessions_carry_decodable_codes() {
        let session = GameSession::new();
        let code = session.seed_code().expect("entropy session has a code");
        assert_eq!(seed::decode_to_seed(code), Some(session.seed()));
    }

    #[test]
    fn seed_code_sessions_reproduce_the_seed() {
        let session = GameSession::from_seed_code("ST-SUMMIT42").expect("valid code");
        assert_eq!(session.seed_code(), Some("ST-SUMMIT42"));
        assert!(GameSession::from_seed_code("not a code").is_none());
    }

    #[test]
    fn apply_choice_records_and_advances() {
        let mut session = GameSession::from_seed(7);
        let event = two_option_event("std-test");

        assert!(!session.apply_choice(&event, 9), "bad index accepted");
        assert_eq!(session.state().turn, 1);
        assert!(session.history().is_empty());

        assert!(session.apply_choice(&event, 0));
        assert_eq!(session.state().turn, 2);
        assert_eq!(session.state().approval, 55);
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].turn, 1);
        assert_eq!(session.history()[0].event_id, "std-test");
    }

    #[test]
    fn trends_follow_the_indicator_window() {
        let mut session = GameSession::from_seed(7);
        let event = two_option_event("std-up");
        for _ in 0..4 {
            assert!(session.apply_choice(&event, 0));
        }
        // Approval climbed 5 per turn and gdp 20 per turn across the window.
        let trend = session.trend();
        assert_eq!(trend.approval_trend, ApprovalTrend::Rising);
        assert_eq!(trend.economic_trend, EconomicTrend::Expansion);

        let down = two_option_event("std-down");
        for _ in 0..4 {
            assert!(session.apply_choice(&down, 1));
        }
        assert_eq!(session.trend().approval_trend, ApprovalTrend::Falling);
    }

    #[test]
    fn risk_tiers_track_indicator_pressure() {
        let mut session = GameSession::from_seed(3);
        assert_eq!(session.trend().risk, RiskLevel::Low);

        session.state.approval = 40;
        assert_eq!(session.derive_risk(EconomicTrend::Stable), RiskLevel::Medium);

        session.state.approval = 20;
        session.state.debt = 3000;
        assert_eq!(session.derive_risk(EconomicTrend::Stable), RiskLevel::High);

        session.state.environment = 10;
        assert_eq!(
            session.derive_risk(EconomicTrend::Recession),
            RiskLevel::Critical
        );
    }

    #[tokio::test]
    async fn next_event_is_served_and_traced() {
        let mut session = GameSession::from_seed(11);
        let event = session.next_event().await;
        assert!(event.has_valid_option_count());
        let trace = session.last_trace().expect("trace recorded");
        assert_eq!(trace.chosen_id, event.id);
        assert!(!trace.emergency.fired, "turn 1 cannot be an emergency");
    }

    #[tokio::test]
    async fn reset_restores_reproducible_draws() {
        let mut session = GameSession::from_seed(23);
        let first = session.next_event().await;
        let first_trace = session.last_trace().cloned().expect("trace");
        let _ = session.apply_choice(&first, 0);

        session.reset();
        assert_eq!(session.state().turn, 1);
        assert!(session.history().is_empty());

        let again = session.next_event().await;
        let again_trace = session.last_trace().cloned().expect("trace");
        assert_eq!(first_trace.emergency, again_trace.emergency);
        assert_eq!(first_trace.source_roll, again_trace.source_roll);
        assert_eq!(first_trace.path, again_trace.path);
        // Static picks replay exactly; generated ids embed wall-clock time.
        if first_trace.path == crate::director::EventPath::Static {
            assert_eq!(first.id, again.id);
        }
    }

    #[tokio::test]
    async fn analyze_and_score_count_their_endpoints() {
        let mut session = GameSession::from_seed(5);
        let analysis = session.analyze_policy("expand broadband investment").await;
        assert!(analysis.effects.is_within_bounds());
        let score = session.score_policy("expand broadband investment");
        assert!(score.total_score >= 0 && score.total_score <= 100);

        let report = session.usage_report();
        assert_eq!(report.policy_analysis.calls, 1);
        assert_eq!(report.policy_scoring.calls, 1);
        assert_eq!(report.active_provider, ProviderKind::Static);
    }

    #[test]
    fn apply_analysis_commits_like_a_choice() {
        let mut session = GameSession::from_seed(13);
        let analysis = EffectAnalysis {
            effects: EffectVector {
                approval: 3,
                gdp: 15,
                ..EffectVector::default()
            },
            reasoning: "test".to_string(),
            confidence: 70,
            timeframe: crate::effect::Timeframe::ShortTerm,
            risks: Vec::new(),
            opportunities: Vec::new(),
            fallback: false,
        };
        session.apply_analysis("pilot a broadband fund", &analysis);
        assert_eq!(session.state().turn, 2);
        assert_eq!(session.state().approval, 53);
        assert_eq!(session.history()[0].option_text, "pilot a broadband fund");
    }
}
