//! Scenario simulation harness.
//!
//! A [`SimulationPlan`] wires one provider double into a seeded
//! [`GameSession`], plays a whole term turn by turn, and checks the
//! resulting [`SimulationSummary`] against per-scenario expectations.
//! Expectations assert invariants the engine must hold on every run, not
//! outcomes that depend on favorable rolls.
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use statecraft_game::{
    Event, EventPath, GameSession, NationalState, ProviderKind, RankLabel, UsageReport,
    decode_to_seed, encode_friendly,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::providers::{DeadProvider, FlakyProvider, SLOW_DELAY_MS, ScriptedProvider, SlowProvider};

/// Seed used when the CLI supplies none.
pub const DEFAULT_SEED: u64 = 1337;

/// Canned policy lines analyzed on cadence turns.
const POLICY_LINES: [&str; 4] = [
    "Invest in vocational education and apprenticeship subsidies",
    "Raise the policy rate to defend the currency",
    "Fund a national grid modernization program",
    "Open trade talks with the regional bloc",
];

/// Policy text scored once at the end of every simulated term.
const SCORE_PROMPT: &str = "Balance the budget without cutting essential services";

/// How the harness picks among an event's options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceStrategy {
    /// Walk the slate round-robin so every option style gets exercised.
    Rotating,
    /// Take the option with the best immediate approval effect.
    Populist,
    /// Take the option with the worst immediate approval effect, driving
    /// the session toward crisis pressure.
    Contrarian,
}

impl ChoiceStrategy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rotating => "rotating",
            Self::Populist => "populist",
            Self::Contrarian => "contrarian",
        }
    }

    /// Index of the option this strategy takes. Returns 0 for an empty
    /// slate; the session refuses the apply in that case anyway.
    #[must_use]
    pub fn pick(self, event: &Event, turn: u32) -> usize {
        let slate = event.options.len();
        if slate == 0 {
            return 0;
        }
        match self {
            Self::Rotating => usize::try_from(turn).unwrap_or(1).saturating_sub(1) % slate,
            Self::Populist => event
                .options
                .iter()
                .enumerate()
                .max_by_key(|(_, option)| option.effects.approval)
                .map_or(0, |(index, _)| index),
            Self::Contrarian => event
                .options
                .iter()
                .enumerate()
                .min_by_key(|(_, option)| option.effects.approval)
                .map_or(0, |(index, _)| index),
        }
    }
}

/// Which provider double a scenario wires into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderScript {
    /// No registration; the built-in composer serves everything.
    ComposerOnly,
    /// Healthy remote that answers every prompt with well-formed JSON.
    ScriptedRemote,
    /// Remote that fails probes and calls alike.
    DeadRemote,
    /// Remote that probes healthy but fails every nth generate call.
    FlakyRemote { fail_every: u32 },
    /// Remote that answers correctly but slower than the probe window.
    SlowRemote,
}

/// Invariant check run against a finished term.
pub type Expectation = fn(&SimulationSummary) -> Result<(), String>;

/// One scenario's run recipe.
#[derive(Debug)]
pub struct SimulationPlan {
    pub turn_limit: u32,
    pub strategy: ChoiceStrategy,
    pub provider: ProviderScript,
    /// Analyze a canned policy line every n turns (0 disables). Cadence
    /// turns analyze the same text twice so the reply cache gets a
    /// deterministic second look.
    pub analysis_cadence: u32,
    /// Re-probe providers every n turns (0 disables).
    pub recheck_cadence: u32,
    /// Play the plan twice on the same seed and compare observable output.
    pub verify_rerun: bool,
    pub expectations: Vec<Expectation>,
}

impl SimulationPlan {
    #[must_use]
    pub fn new(turn_limit: u32, strategy: ChoiceStrategy) -> Self {
        Self {
            turn_limit,
            strategy,
            provider: ProviderScript::ComposerOnly,
            analysis_cadence: 0,
            recheck_cadence: 0,
            verify_rerun: false,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_provider(mut self, provider: ProviderScript) -> Self {
        self.provider = provider;
        self
    }

    #[must_use]
    pub fn with_analysis_cadence(mut self, cadence: u32) -> Self {
        self.analysis_cadence = cadence;
        self
    }

    #[must_use]
    pub fn with_recheck_cadence(mut self, cadence: u32) -> Self {
        self.recheck_cadence = cadence;
        self
    }

    #[must_use]
    pub fn with_rerun_check(mut self) -> Self {
        self.verify_rerun = true;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }
}

/// Everything one simulated term exposes for expectation checks.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationSummary {
    pub seed: u64,
    pub turn_limit: u32,
    /// Turns where an option was applied and the clock advanced.
    pub turns_played: u32,
    pub static_events: u32,
    pub generated_events: u32,
    pub emergencies: u32,
    /// Events whose trace says a degraded template was served.
    pub fallback_events: u32,
    /// Events that failed the harness's structural checks.
    pub invalid_events: u32,
    /// Indicator values caught outside their floors or ceilings.
    pub band_violations: u32,
    /// `analyze_policy` calls issued (two per cadence turn).
    pub analyses_run: u32,
    pub distinct_titles: usize,
    pub total_score: i32,
    pub rank_label: RankLabel,
    pub final_state: NationalState,
    pub report: UsageReport,
    /// `Some` only for plans with a rerun check.
    pub rerun_matched: Option<bool>,
}

fn indicators_in_band(state: &NationalState) -> bool {
    (0..=100).contains(&state.approval)
        && (0..=100).contains(&state.technology)
        && (0..=100).contains(&state.environment)
        && (0..=100).contains(&state.diplomacy)
        && state.gdp >= 0
        && state.debt >= 0
        && state.market_index >= 0
        && state.exchange_rate >= 1
}

const fn path_label(path: EventPath) -> &'static str {
    match path {
        EventPath::Static => "static",
        EventPath::Generated => "generated",
        EventPath::Emergency => "emergency",
    }
}

/// Drives seeded sessions through whole terms and aggregates the results.
pub struct ScenarioRunner {
    verbose: bool,
}

impl ScenarioRunner {
    #[must_use]
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Play the plan once; with a rerun check, play it twice and compare
    /// the observable output of both passes.
    pub async fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> SimulationSummary {
        let (mut summary, titles) = self.play(plan, seed).await;
        if plan.verify_rerun {
            let (replay, replay_titles) = self.play(plan, seed).await;
            let matched = replay_titles == titles
                && replay.final_state == summary.final_state
                && replay.total_score == summary.total_score
                && replay.static_events == summary.static_events
                && replay.generated_events == summary.generated_events
                && replay.emergencies == summary.emergencies;
            summary.rerun_matched = Some(matched);
        }
        summary
    }

    async fn play(&self, plan: &SimulationPlan, seed: u64) -> (SimulationSummary, Vec<String>) {
        let mut session = GameSession::from_seed(seed).with_turn_limit(plan.turn_limit);
        match plan.provider {
            ProviderScript::ComposerOnly => {}
            ProviderScript::ScriptedRemote => session.register_provider(Arc::new(
                ScriptedProvider::new("scripted-remote", ProviderKind::Remote),
            )),
            ProviderScript::DeadRemote => session.register_provider(Arc::new(DeadProvider::new(
                "dead-remote",
                ProviderKind::Remote,
            ))),
            ProviderScript::FlakyRemote { fail_every } => session.register_provider(Arc::new(
                FlakyProvider::new("flaky-remote", ProviderKind::Remote, fail_every),
            )),
            ProviderScript::SlowRemote => session.register_provider(Arc::new(SlowProvider::new(
                "slow-remote",
                ProviderKind::Remote,
                SLOW_DELAY_MS,
            ))),
        }
        session.probe_providers().await;

        let mut titles = Vec::new();
        let mut turns_played = 0u32;
        let mut static_events = 0u32;
        let mut generated_events = 0u32;
        let mut emergencies = 0u32;
        let mut fallback_events = 0u32;
        let mut invalid_events = 0u32;
        let mut band_violations = 0u32;
        let mut analyses_run = 0u32;

        for _ in 0..plan.turn_limit {
            let turn = session.state().turn;
            if plan.recheck_cadence > 0 && turn > 1 && (turn - 1) % plan.recheck_cadence == 0 {
                session.recheck_providers().await;
            }

            let event = session.next_event().await;
            let structurally_ok = event.has_valid_option_count()
                && !event.title.trim().is_empty()
                && event.options.iter().all(|o| !o.text.trim().is_empty());
            if !structurally_ok {
                invalid_events += 1;
            }
            if let Some(trace) = session.last_trace() {
                match trace.path {
                    EventPath::Static => static_events += 1,
                    EventPath::Generated => generated_events += 1,
                    EventPath::Emergency => emergencies += 1,
                }
                if trace.fallback_used {
                    fallback_events += 1;
                }
                debug!(
                    "turn {turn}: {} [{}] pool {}",
                    event.title,
                    path_label(trace.path),
                    trace.pool_size
                );
            }
            titles.push(event.title.clone());

            if plan.analysis_cadence > 0 && turn % plan.analysis_cadence == 0 {
                let line_index =
                    usize::try_from(turn / plan.analysis_cadence).unwrap_or(0) % POLICY_LINES.len();
                let line = POLICY_LINES[line_index];
                let first = session.analyze_policy(line).await;
                let second = session.analyze_policy(line).await;
                analyses_run += 2;
                debug!(
                    "turn {turn}: analysis confidence {} fallback {}",
                    first.confidence, first.fallback
                );
                if first.effects != second.effects {
                    warn!("turn {turn}: repeated analysis diverged");
                }
            }

            let pick = plan.strategy.pick(&event, turn);
            if session.apply_choice(&event, pick) {
                turns_played += 1;
                if !indicators_in_band(session.state()) {
                    band_violations += 1;
                }
            } else {
                warn!("turn {turn}: option {pick} refused for '{}'", event.title);
            }
        }

        let score = session.score_policy(SCORE_PROMPT);
        let report = session.usage_report();
        let distinct_titles = titles.iter().collect::<BTreeSet<_>>().len();

        if self.verbose {
            info!(
                "seed {seed} ({}): {turns_played}/{} turns, {static_events} static / \
                 {generated_events} generated / {emergencies} emergency, score {}",
                plan.strategy.as_str(),
                plan.turn_limit,
                score.total_score
            );
        }

        let summary = SimulationSummary {
            seed,
            turn_limit: plan.turn_limit,
            turns_played,
            static_events,
            generated_events,
            emergencies,
            fallback_events,
            invalid_events,
            band_violations,
            analyses_run,
            distinct_titles,
            total_score: score.total_score,
            rank_label: score.label,
            final_state: session.state().clone(),
            report,
            rerun_matched: None,
        };
        (summary, titles)
    }

    /// Run one scenario across every seed and iteration, collecting
    /// expectation failures as human-readable strings.
    pub async fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[SeedInfo],
        iterations: u32,
    ) -> ScenarioResult {
        let mut failures = Vec::new();
        let mut durations = Vec::new();
        let mut successes = 0u32;
        let mut runs = 0u32;

        for seed_info in seeds {
            for iteration in 0..iterations {
                let seed = seed_info.seed.wrapping_add(u64::from(iteration));
                let started = Instant::now();
                let summary = self.run_plan(&scenario.plan, seed).await;
                let took = started.elapsed();
                durations.push(took);
                runs += 1;

                let mut iteration_ok = true;
                for expectation in &scenario.plan.expectations {
                    if let Err(reason) = expectation(&summary) {
                        iteration_ok = false;
                        failures.push(format!("{} seed {seed}: {reason}", scenario.name));
                    }
                }
                if iteration_ok {
                    successes += 1;
                }
                if self.verbose {
                    info!(
                        "{}: seed {seed} iteration {} finished in {took:?}",
                        scenario.name,
                        iteration + 1
                    );
                }
            }
        }

        let total: Duration = durations.iter().sum();
        let average_duration = total / u32::try_from(durations.len().max(1)).unwrap_or(1);
        ScenarioResult {
            scenario_name: scenario.name.to_string(),
            passed: failures.is_empty(),
            iterations_run: runs,
            successful_iterations: successes,
            failures,
            average_duration,
            iteration_durations: durations,
        }
    }
}

/// One resolved seed input: the numeric seed plus the share code it came
/// from, when there was one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedInfo {
    pub seed: u64,
    pub code: Option<String>,
}

/// Turn raw CLI seed inputs into usable seeds. Accepts plain numbers and
/// share codes; unusable entries are skipped with a warning. An empty
/// result falls back to [`DEFAULT_SEED`].
#[must_use]
pub fn resolve_seed_inputs(inputs: &[String]) -> Vec<SeedInfo> {
    let mut seeds = Vec::new();
    for raw in inputs {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Ok(seed) = trimmed.parse::<u64>() {
            seeds.push(SeedInfo { seed, code: None });
        } else if let Some(seed) = decode_to_seed(trimmed) {
            seeds.push(SeedInfo {
                seed,
                code: Some(encode_friendly(seed)),
            });
        } else {
            warn!("ignoring unusable seed input '{trimmed}'");
        }
    }
    if seeds.is_empty() {
        seeds.push(SeedInfo {
            seed: DEFAULT_SEED,
            code: None,
        });
    }
    seeds
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        u64::try_from(duration.as_millis())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        durations
            .iter()
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .collect::<Vec<_>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Vec::<u64>::deserialize(deserializer)?
            .into_iter()
            .map(Duration::from_millis)
            .collect())
    }
}

/// Aggregated outcome of one scenario across all seeds and iterations.
/// Durations serialize as whole milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub passed: bool,
    pub iterations_run: u32,
    pub successful_iterations: u32,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub iteration_durations: Vec<Duration>,
}

/// A named plan with a one-line description for `--list-scenarios`.
#[derive(Debug)]
pub struct TestScenario {
    pub name: &'static str,
    pub description: &'static str,
    pub plan: SimulationPlan,
}

fn expect_full_term(s: &SimulationSummary) -> Result<(), String> {
    if s.turns_played == s.turn_limit {
        Ok(())
    } else {
        Err(format!(
            "played {} of {} turns",
            s.turns_played, s.turn_limit
        ))
    }
}

fn expect_clean_events(s: &SimulationSummary) -> Result<(), String> {
    if s.invalid_events == 0 {
        Ok(())
    } else {
        Err(format!("{} structurally invalid events", s.invalid_events))
    }
}

fn expect_indicators_in_band(s: &SimulationSummary) -> Result<(), String> {
    if s.band_violations == 0 {
        Ok(())
    } else {
        Err(format!(
            "indicators left their bands {} times",
            s.band_violations
        ))
    }
}

fn expect_no_fallbacks(s: &SimulationSummary) -> Result<(), String> {
    let report_fallbacks = s.report.event_generation.fallbacks + s.report.policy_analysis.fallbacks;
    if s.fallback_events == 0 && report_fallbacks == 0 {
        Ok(())
    } else {
        Err(format!(
            "expected no fallbacks, saw {} traced and {} reported",
            s.fallback_events, report_fallbacks
        ))
    }
}

fn expect_event_call_per_turn(s: &SimulationSummary) -> Result<(), String> {
    let calls = s.report.event_generation.calls;
    if calls == u64::from(s.turn_limit) {
        Ok(())
    } else {
        Err(format!(
            "{calls} event calls recorded for {} turns",
            s.turn_limit
        ))
    }
}

fn expect_paths_accounted(s: &SimulationSummary) -> Result<(), String> {
    let traced = s.static_events + s.generated_events + s.emergencies;
    if traced == s.turn_limit {
        Ok(())
    } else {
        Err(format!(
            "{traced} traced paths for {} served events",
            s.turn_limit
        ))
    }
}

fn expect_static_active(s: &SimulationSummary) -> Result<(), String> {
    if s.report.active_provider == ProviderKind::Static {
        Ok(())
    } else {
        Err(format!(
            "expected the composer active, found {}",
            s.report.active_provider
        ))
    }
}

fn expect_remote_active(s: &SimulationSummary) -> Result<(), String> {
    if s.report.active_provider == ProviderKind::Remote {
        Ok(())
    } else {
        Err(format!(
            "expected the remote active, found {}",
            s.report.active_provider
        ))
    }
}

fn expect_remote_marked_down(s: &SimulationSummary) -> Result<(), String> {
    match s
        .report
        .providers
        .iter()
        .find(|p| p.kind == ProviderKind::Remote)
    {
        Some(status) if !status.available => Ok(()),
        Some(_) => Err("remote slot still marked available".to_string()),
        None => Err("remote slot missing from the status report".to_string()),
    }
}

fn expect_errors_absorbed(s: &SimulationSummary) -> Result<(), String> {
    let events = s.report.event_generation;
    let analyses = s.report.policy_analysis;
    if events.errors == events.fallbacks && analyses.errors == analyses.fallbacks {
        Ok(())
    } else {
        Err(format!(
            "errors and fallbacks diverged: events {}/{}, analyses {}/{}",
            events.errors, events.fallbacks, analyses.errors, analyses.fallbacks
        ))
    }
}

fn expect_single_degradation(s: &SimulationSummary) -> Result<(), String> {
    let errors = s.report.event_generation.errors + s.report.policy_analysis.errors;
    if errors == 1 {
        Ok(())
    } else {
        Err(format!("expected exactly one absorbed error, saw {errors}"))
    }
}

fn expect_some_fallbacks(s: &SimulationSummary) -> Result<(), String> {
    let fallbacks = s.report.event_generation.fallbacks + s.report.policy_analysis.fallbacks;
    if fallbacks >= 1 {
        Ok(())
    } else {
        Err("expected at least one fallback, saw none".to_string())
    }
}

fn expect_cache_hit_per_cadence_turn(s: &SimulationSummary) -> Result<(), String> {
    let expected = u64::from(s.analyses_run / 2);
    let hits = s.report.policy_analysis.cache_hits;
    if s.analyses_run > 0 && hits == expected {
        Ok(())
    } else {
        Err(format!(
            "{hits} cache hits for {} analysis calls",
            s.analyses_run
        ))
    }
}

fn expect_analysis_calls_recorded(s: &SimulationSummary) -> Result<(), String> {
    let calls = s.report.policy_analysis.calls;
    if calls == u64::from(s.analyses_run) {
        Ok(())
    } else {
        Err(format!(
            "{calls} analysis calls recorded, harness issued {}",
            s.analyses_run
        ))
    }
}

fn expect_replay_matches(s: &SimulationSummary) -> Result<(), String> {
    match s.rerun_matched {
        Some(true) => Ok(()),
        Some(false) => Err("replay diverged from the first pass".to_string()),
        None => Err("plan ran without its rerun check".to_string()),
    }
}

fn expect_score_in_range(s: &SimulationSummary) -> Result<(), String> {
    if (0..=100).contains(&s.total_score) {
        Ok(())
    } else {
        Err(format!("score {} outside 0..=100", s.total_score))
    }
}

fn smoke() -> TestScenario {
    TestScenario {
        name: "smoke",
        description: "Short composer-only term; every turn must serve a playable event.",
        plan: SimulationPlan::new(6, ChoiceStrategy::Rotating)
            .with_expectation(expect_full_term)
            .with_expectation(expect_clean_events)
            .with_expectation(expect_indicators_in_band)
            .with_expectation(expect_no_fallbacks)
            .with_expectation(expect_event_call_per_turn)
            .with_expectation(expect_paths_accounted)
            .with_expectation(expect_static_active)
            .with_expectation(expect_score_in_range),
    }
}

fn full_term() -> TestScenario {
    TestScenario {
        name: "full-term",
        description: "Whole default term with periodic policy analyses and cache checks.",
        plan: SimulationPlan::new(20, ChoiceStrategy::Populist)
            .with_analysis_cadence(5)
            .with_expectation(expect_full_term)
            .with_expectation(expect_clean_events)
            .with_expectation(expect_indicators_in_band)
            .with_expectation(expect_no_fallbacks)
            .with_expectation(expect_paths_accounted)
            .with_expectation(expect_analysis_calls_recorded)
            .with_expectation(expect_cache_hit_per_cadence_turn),
    }
}

fn determinism() -> TestScenario {
    TestScenario {
        name: "determinism",
        description: "Plays the same seed twice; both passes must match turn for turn.",
        plan: SimulationPlan::new(12, ChoiceStrategy::Rotating)
            .with_rerun_check()
            .with_expectation(expect_replay_matches)
            .with_expectation(expect_full_term)
            .with_expectation(expect_clean_events),
    }
}

fn pressure_cooker() -> TestScenario {
    TestScenario {
        name: "pressure-cooker",
        description: "Approval-hostile choices stress the clamps and the crisis path.",
        plan: SimulationPlan::new(20, ChoiceStrategy::Contrarian)
            .with_expectation(expect_full_term)
            .with_expectation(expect_clean_events)
            .with_expectation(expect_indicators_in_band)
            .with_expectation(expect_paths_accounted)
            .with_expectation(expect_score_in_range),
    }
}

fn provider_outage() -> TestScenario {
    TestScenario {
        name: "provider-outage",
        description: "Dead remote; play must continue on the composer without fallbacks.",
        plan: SimulationPlan::new(10, ChoiceStrategy::Rotating)
            .with_provider(ProviderScript::DeadRemote)
            .with_analysis_cadence(3)
            .with_expectation(expect_full_term)
            .with_expectation(expect_clean_events)
            .with_expectation(expect_remote_marked_down)
            .with_expectation(expect_static_active)
            .with_expectation(expect_no_fallbacks)
            .with_expectation(expect_paths_accounted),
    }
}

fn degraded_provider() -> TestScenario {
    TestScenario {
        name: "degraded-provider",
        description: "Remote dies after a clean probe; exactly one absorbed error allowed.",
        plan: SimulationPlan::new(12, ChoiceStrategy::Rotating)
            .with_provider(ProviderScript::FlakyRemote { fail_every: 1 })
            .with_analysis_cadence(3)
            .with_expectation(expect_full_term)
            .with_expectation(expect_clean_events)
            .with_expectation(expect_errors_absorbed)
            .with_expectation(expect_single_degradation)
            .with_expectation(expect_static_active)
            .with_expectation(expect_paths_accounted),
    }
}

fn flaky_provider() -> TestScenario {
    TestScenario {
        name: "flaky-provider",
        description: "Remote fails every third call under per-turn re-probes.",
        plan: SimulationPlan::new(15, ChoiceStrategy::Rotating)
            .with_provider(ProviderScript::FlakyRemote { fail_every: 3 })
            .with_analysis_cadence(1)
            .with_recheck_cadence(1)
            .with_expectation(expect_full_term)
            .with_expectation(expect_clean_events)
            .with_expectation(expect_errors_absorbed)
            .with_expectation(expect_some_fallbacks)
            .with_expectation(expect_paths_accounted)
            .with_expectation(expect_score_in_range),
    }
}

fn scripted_generation() -> TestScenario {
    TestScenario {
        name: "scripted-generation",
        description: "Healthy scripted remote; generated turns must parse end to end.",
        plan: SimulationPlan::new(12, ChoiceStrategy::Populist)
            .with_provider(ProviderScript::ScriptedRemote)
            .with_analysis_cadence(4)
            .with_expectation(expect_full_term)
            .with_expectation(expect_clean_events)
            .with_expectation(expect_indicators_in_band)
            .with_expectation(expect_no_fallbacks)
            .with_expectation(expect_remote_active)
            .with_expectation(expect_analysis_calls_recorded)
            .with_expectation(expect_cache_hit_per_cadence_turn)
            .with_expectation(expect_paths_accounted),
    }
}

fn slow_provider() -> TestScenario {
    TestScenario {
        name: "slow-provider",
        description: "Remote answers past the probe window and must never be selected.",
        plan: SimulationPlan::new(6, ChoiceStrategy::Rotating)
            .with_provider(ProviderScript::SlowRemote)
            .with_expectation(expect_full_term)
            .with_expectation(expect_clean_events)
            .with_expectation(expect_remote_marked_down)
            .with_expectation(expect_static_active)
            .with_expectation(expect_no_fallbacks),
    }
}

fn endurance() -> TestScenario {
    TestScenario {
        name: "endurance",
        description: "Term far past the catalog size; the dedupe registry must recycle.",
        plan: SimulationPlan::new(48, ChoiceStrategy::Rotating)
            .with_analysis_cadence(6)
            .with_expectation(expect_full_term)
            .with_expectation(expect_clean_events)
            .with_expectation(expect_indicators_in_band)
            .with_expectation(expect_event_call_per_turn)
            .with_expectation(expect_paths_accounted)
            .with_expectation(expect_score_in_range),
    }
}

/// Every scenario this binary knows, in display order.
#[must_use]
pub fn built_in_scenarios() -> Vec<TestScenario> {
    vec![
        smoke(),
        full_term(),
        determinism(),
        pressure_cooker(),
        provider_outage(),
        degraded_provider(),
        flaky_provider(),
        scripted_generation(),
        slow_provider(),
        endurance(),
    ]
}

#[must_use]
pub fn find_scenario(name: &str) -> Option<TestScenario> {
    built_in_scenarios()
        .into_iter()
        .find(|s| s.name.eq_ignore_ascii_case(name))
}

#[must_use]
pub fn scenario_names() -> Vec<&'static str> {
    built_in_scenarios().iter().map(|s| s.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slate_event() -> Event {
        serde_json::from_value(serde_json::json!({
            "id": "ev-fixture",
            "title": "Fixture",
            "description": "Three options with distinct approval effects.",
            "options": [
                { "text": "a", "effects": { "approval": 4 } },
                { "text": "b", "effects": { "approval": -6 } },
                { "text": "c", "effects": { "approval": 1 } },
            ]
        }))
        .expect("fixture event parses")
    }

    #[test]
    fn strategies_pick_the_documented_option() {
        let event = slate_event();
        assert_eq!(ChoiceStrategy::Rotating.pick(&event, 1), 0);
        assert_eq!(ChoiceStrategy::Rotating.pick(&event, 2), 1);
        assert_eq!(ChoiceStrategy::Rotating.pick(&event, 5), 1);
        assert_eq!(ChoiceStrategy::Populist.pick(&event, 1), 0);
        assert_eq!(ChoiceStrategy::Contrarian.pick(&event, 1), 1);
    }

    #[test]
    fn seed_inputs_accept_numbers_and_share_codes() {
        let inputs = vec![
            "42".to_string(),
            "ST-SUMMIT42".to_string(),
            "not-a-seed".to_string(),
        ];
        let seeds = resolve_seed_inputs(&inputs);
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0], SeedInfo { seed: 42, code: None });
        assert_eq!(seeds[1].code.as_deref(), Some("ST-SUMMIT42"));
        assert_eq!(decode_to_seed("ST-SUMMIT42"), Some(seeds[1].seed));
    }

    #[test]
    fn empty_seed_inputs_fall_back_to_the_default() {
        let seeds = resolve_seed_inputs(&[]);
        assert_eq!(
            seeds,
            vec![SeedInfo {
                seed: DEFAULT_SEED,
                code: None
            }]
        );
    }

    #[test]
    fn scenario_lookup_is_case_insensitive() {
        assert!(find_scenario("SMOKE").is_some());
        assert!(find_scenario("no-such-scenario").is_none());
        assert_eq!(scenario_names().len(), built_in_scenarios().len());
    }

    #[test]
    fn scenario_results_round_trip_with_millisecond_durations() {
        let result = ScenarioResult {
            scenario_name: "smoke".to_string(),
            passed: true,
            iterations_run: 2,
            successful_iterations: 2,
            failures: Vec::new(),
            average_duration: Duration::from_millis(12),
            iteration_durations: vec![Duration::from_millis(10), Duration::from_millis(14)],
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"average_duration\":12"));
        let back: ScenarioResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }

    #[tokio::test]
    async fn smoke_plan_passes_its_own_expectations() {
        let scenario = find_scenario("smoke").unwrap();
        let runner = ScenarioRunner::new(false);
        let summary = runner.run_plan(&scenario.plan, 42).await;
        for expectation in &scenario.plan.expectations {
            expectation(&summary).unwrap();
        }
        assert_eq!(summary.turns_played, 6);
        assert_eq!(summary.final_state.turn, 6);
    }

    #[tokio::test]
    async fn degraded_plan_absorbs_exactly_one_error() {
        let scenario = find_scenario("degraded-provider").unwrap();
        let runner = ScenarioRunner::new(false);
        let summary = runner.run_plan(&scenario.plan, 7).await;
        for expectation in &scenario.plan.expectations {
            expectation(&summary).unwrap();
        }
        let absorbed =
            summary.report.event_generation.errors + summary.report.policy_analysis.errors;
        assert_eq!(absorbed, 1);
        assert_eq!(summary.report.active_provider, ProviderKind::Static);
    }

    #[tokio::test]
    async fn rerun_check_matches_on_a_fixed_seed() {
        let scenario = find_scenario("determinism").unwrap();
        let runner = ScenarioRunner::new(false);
        let summary = runner.run_plan(&scenario.plan, 0x5EED).await;
        assert_eq!(summary.rerun_matched, Some(true));
    }

    #[tokio::test]
    async fn run_scenario_aggregates_across_seeds_and_iterations() {
        let scenario = find_scenario("smoke").unwrap();
        let runner = ScenarioRunner::new(false);
        let seeds = vec![
            SeedInfo { seed: 1, code: None },
            SeedInfo { seed: 2, code: None },
        ];
        let result = runner.run_scenario(&scenario, &seeds, 2).await;
        assert!(result.passed, "failures: {:?}", result.failures);
        assert_eq!(result.iterations_run, 4);
        assert_eq!(result.successful_iterations, 4);
        assert_eq!(result.iteration_durations.len(), 4);
    }

    fn always_fails(_: &SimulationSummary) -> Result<(), String> {
        Err("scripted expectation failure".to_string())
    }

    #[tokio::test]
    async fn failed_expectations_mark_the_scenario_failed() {
        let scenario = TestScenario {
            name: "doomed",
            description: "fails by construction",
            plan: SimulationPlan::new(2, ChoiceStrategy::Rotating)
                .with_expectation(always_fails),
        };
        let runner = ScenarioRunner::new(false);
        let seeds = vec![SeedInfo { seed: 9, code: None }];
        let result = runner.run_scenario(&scenario, &seeds, 3).await;
        assert!(!result.passed);
        assert_eq!(result.successful_iterations, 0);
        assert_eq!(result.failures.len(), 3);
        assert!(result.failures[0].contains("doomed seed 9"));
    }
}
