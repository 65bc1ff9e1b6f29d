//! Event Generation Controller.
//!
//! Per-turn machine: decide emergency, decide source, run the chosen path,
//! normalize every option, return. Only the used-id registries persist
//! between turns. `next_event` never fails; the worst case is a template
//! event with a fresh id.
use chrono::Utc;
use log::warn;
use rand::Rng;
use std::collections::HashSet;

use crate::catalog::{EventCatalog, catalog};
use crate::constants::{
    EMERGENCY_BASE_CRITICAL, EMERGENCY_BASE_HIGH, EMERGENCY_BASE_LOW, EMERGENCY_BASE_MEDIUM,
    EMERGENCY_BONUS_LATE_PHASE, EMERGENCY_BONUS_LOW_APPROVAL, EMERGENCY_BONUS_RECESSION,
    GENERATED_ID_PREFIX, GENERATED_OPTION_COUNT, ID_RETRY_LIMIT, ID_SUFFIX_SPAN,
    LOG_CATALOG_RESET, LOG_DUPLICATE_ID, LOG_EVENT_FALLBACK, LOW_APPROVAL_THRESHOLD,
    STATIC_SOURCE_BIAS,
};
use crate::effect::{EffectVector, NormalizeContext, normalize_effects};
use crate::event::{CrisisArchetype, Event, EventOption, Ideology, Provenance, Urgency};
use crate::numbers::round_f64_to_i32;
use crate::parse::{ParsedEvent, parse_event_reply};
use crate::prompt::{PromptContext, build_emergency_prompt, build_event_prompt};
use crate::provider::FallbackRouter;
use crate::rng::RngBundle;
use crate::state::{
    ChoiceRecord, EconomicTrend, GamePhase, NationalState, RiskLevel, TrendSnapshot,
};
use crate::telemetry::{Endpoint, Telemetry};

/// Literal templates served when generation fails end to end. Non-empty by
/// construction; the director rotates through them.
const FALLBACK_SHEET: [(&str, &str, &str); 3] = [
    (
        "Cabinet Crisis Session",
        "Ministers convene behind closed doors after conflicting reports reach the press. The administration must set a line before the morning briefings.",
        "governance",
    ),
    (
        "Budget Committee Deadlock",
        "The appropriations committee adjourned without a deal and agencies begin contingency planning for a funding gap.",
        "economy",
    ),
    (
        "Allied Summit Invitation",
        "An allied bloc has requested your presence at an emergency summit, and attendance will be read as a signal either way.",
        "diplomacy",
    ),
];

const FALLBACK_OPTIONS: [(&str, Ideology, i32, i32); 3] = [
    ("Address the nation and commit to a course", Ideology::Populist, 4, -10),
    ("Convene a cross-party task force", Ideology::Centrist, 1, 5),
    ("Hold position and let institutions work", Ideology::Conservative, -2, 8),
];

/// Which branch produced the turn's event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventPath {
    Static,
    Generated,
    Emergency,
}

/// Outcome of the emergency roll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmergencyDecision {
    pub fired: bool,
    pub roll: f64,
    pub threshold: f64,
}

/// Outcome of the source roll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceDecision {
    pub use_static: bool,
    pub roll: f64,
}

/// Audit record for one `next_event` invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTrace {
    pub emergency: EmergencyDecision,
    /// Absent when the emergency branch fired before the source roll.
    pub source_roll: Option<f64>,
    pub path: EventPath,
    /// Candidates the pick drew from; zero for generated paths.
    pub pool_size: usize,
    pub chosen_id: String,
    pub fallback_used: bool,
}

/// Read-only context one event decision sees.
#[derive(Debug, Clone, Copy)]
pub struct TurnContext<'a> {
    pub state: &'a NationalState,
    pub trend: TrendSnapshot,
    pub history: &'a [ChoiceRecord],
    /// Ids the caller has shown recently, excluded on top of the internal
    /// registry.
    pub exclude_ids: &'a [String],
}

/// Emergency probability for the current turn. Never rolls on the opening
/// turn.
#[must_use]
pub fn emergency_probability(state: &NationalState, trend: TrendSnapshot) -> f64 {
    if state.turn <= 1 {
        return 0.0;
    }
    let mut p = match trend.risk {
        RiskLevel::Low => EMERGENCY_BASE_LOW,
        RiskLevel::Medium => EMERGENCY_BASE_MEDIUM,
        RiskLevel::High => EMERGENCY_BASE_HIGH,
        RiskLevel::Critical => EMERGENCY_BASE_CRITICAL,
    };
    if state.approval < LOW_APPROVAL_THRESHOLD {
        p += EMERGENCY_BONUS_LOW_APPROVAL;
    }
    if trend.economic_trend == EconomicTrend::Recession {
        p += EMERGENCY_BONUS_RECESSION;
    }
    if state.phase() == GamePhase::Late {
        p += EMERGENCY_BONUS_LATE_PHASE;
    }
    p.min(1.0)
}

/// One uniform draw against the emergency threshold. The opening turn
/// skips the draw entirely so downstream streams stay aligned.
pub fn decide_emergency<R>(
    state: &NationalState,
    trend: TrendSnapshot,
    rng: &mut R,
) -> EmergencyDecision
where
    R: Rng + ?Sized,
{
    let threshold = emergency_probability(state, trend);
    if threshold <= 0.0 {
        return EmergencyDecision {
            fired: false,
            roll: 0.0,
            threshold,
        };
    }
    let roll = rng.r#gen::<f64>();
    EmergencyDecision {
        fired: roll < threshold,
        roll,
        threshold,
    }
}

/// One uniform draw against the static-source bias.
pub fn decide_source<R>(rng: &mut R) -> SourceDecision
where
    R: Rng + ?Sized,
{
    let roll = rng.r#gen::<f64>();
    SourceDecision {
        use_static: roll < STATIC_SOURCE_BIAS,
        roll,
    }
}

/// Uniform pick over the six crisis families.
pub fn pick_archetype<R>(rng: &mut R) -> CrisisArchetype
where
    R: Rng + ?Sized,
{
    CrisisArchetype::ALL[rng.gen_range(0..CrisisArchetype::ALL.len())]
}

fn jitter_effects<R>(base: EffectVector, rng: &mut R) -> EffectVector
where
    R: Rng + ?Sized,
{
    let mut jitter = |v: i32| -> i32 {
        if v == 0 {
            return 0;
        }
        let factor = rng.gen_range(0.75..=1.25);
        round_f64_to_i32(f64::from(v) * factor)
    };
    EffectVector {
        approval: jitter(base.approval),
        gdp: jitter(base.gdp),
        debt: jitter(base.debt),
        technology: jitter(base.technology),
        environment: jitter(base.environment),
        market_index: jitter(base.market_index),
        exchange_rate: jitter(base.exchange_rate),
        diplomacy: jitter(base.diplomacy),
    }
}

/// Owns the used-id registries and the catalog snapshot it serves from.
#[derive(Debug, Clone)]
pub struct EventDirector {
    catalog: EventCatalog,
    used_static: HashSet<String>,
    used_generated: HashSet<String>,
    fallback_cursor: usize,
}

impl Default for EventDirector {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDirector {
    /// Director over the compiled-in catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::with_catalog(catalog().clone())
    }

    /// Director over a caller-supplied catalog.
    #[must_use]
    pub fn with_catalog(catalog: EventCatalog) -> Self {
        Self {
            catalog,
            used_static: HashSet::new(),
            used_generated: HashSet::new(),
            fallback_cursor: 0,
        }
    }

    /// Ids consumed from the static pool so far.
    #[must_use]
    pub fn used_static_count(&self) -> usize {
        self.used_static.len()
    }

    /// Wipe both registries (full session reset).
    pub fn reset(&mut self) {
        self.used_static.clear();
        self.used_generated.clear();
        self.fallback_cursor = 0;
    }

    /// Produce the next event. Infallible at this boundary: provider and
    /// parse failures degrade to a template event, never to an error.
    pub async fn next_event(
        &mut self,
        ctx: &TurnContext<'_>,
        router: &mut FallbackRouter,
        rng: &RngBundle,
        telemetry: &mut Telemetry,
    ) -> (Event, DecisionTrace) {
        telemetry.record_call(Endpoint::EventGeneration);
        let norm = NormalizeContext {
            risk: ctx.trend.risk,
            approval: ctx.state.approval,
        };

        let emergency = {
            let mut stream = rng.decision();
            decide_emergency(ctx.state, ctx.trend, &mut *stream)
        };

        if emergency.fired {
            let archetype = {
                let mut stream = rng.selection();
                pick_archetype(&mut *stream)
            };
            let (mut event, fallback_used) = self
                .generate(ctx, router, rng, telemetry, Some(archetype))
                .await;
            normalize_options(&mut event, norm);
            let trace = DecisionTrace {
                emergency,
                source_roll: None,
                path: EventPath::Emergency,
                pool_size: CrisisArchetype::ALL.len(),
                chosen_id: event.id.clone(),
                fallback_used,
            };
            return (event, trace);
        }

        let source = {
            let mut stream = rng.decision();
            decide_source(&mut *stream)
        };

        if source.use_static {
            let (mut event, pool_size) = self.pick_static(ctx.exclude_ids, rng);
            normalize_options(&mut event, norm);
            let trace = DecisionTrace {
                emergency,
                source_roll: Some(source.roll),
                path: EventPath::Static,
                pool_size,
                chosen_id: event.id.clone(),
                fallback_used: event.provenance == Provenance::Fallback,
            };
            return (event, trace);
        }

        let (mut event, fallback_used) = self.generate(ctx, router, rng, telemetry, None).await;
        normalize_options(&mut event, norm);
        let trace = DecisionTrace {
            emergency,
            source_roll: Some(source.roll),
            path: EventPath::Generated,
            pool_size: 0,
            chosen_id: event.id.clone(),
            fallback_used,
        };
        (event, trace)
    }

    /// Uniform pick over the unused remainder of the static pool. An empty
    /// remainder resets the static registry (logged) and retries; if the
    /// caller's exclusions still empty the pool, they are ignored for the
    /// retry so a non-empty catalog always serves.
    fn pick_static(&mut self, exclude: &[String], rng: &RngBundle) -> (Event, usize) {
        let remainder = |used: &HashSet<String>, honor_exclude: bool| -> Vec<usize> {
            self.catalog
                .events
                .iter()
                .enumerate()
                .filter(|(_, e)| !used.contains(&e.id))
                .filter(|(_, e)| !honor_exclude || !exclude.contains(&e.id))
                .map(|(i, _)| i)
                .collect()
        };

        let mut pool = remainder(&self.used_static, true);
        if pool.is_empty() {
            warn!(
                "{LOG_CATALOG_RESET}: static pool exhausted after {} picks",
                self.used_static.len()
            );
            self.used_static.clear();
            pool = remainder(&self.used_static, true);
            if pool.is_empty() {
                pool = remainder(&self.used_static, false);
            }
        }
        if pool.is_empty() {
            // Only reachable with an empty caller-supplied catalog.
            return (self.fallback_event(None, rng), 0);
        }

        let pool_size = pool.len();
        let pick = {
            let mut stream = rng.selection();
            pool[stream.gen_range(0..pool.len())]
        };
        let event = self.catalog.events[pick].clone();
        self.used_static.insert(event.id.clone());
        (event, pool_size)
    }

    async fn generate(
        &mut self,
        ctx: &TurnContext<'_>,
        router: &mut FallbackRouter,
        rng: &RngBundle,
        telemetry: &mut Telemetry,
        archetype: Option<CrisisArchetype>,
    ) -> (Event, bool) {
        let prompt_ctx = PromptContext {
            state: ctx.state,
            trend: ctx.trend,
            history: ctx.history,
        };
        let prompt = match archetype {
            Some(a) => build_emergency_prompt(&prompt_ctx, a),
            None => build_event_prompt(&prompt_ctx),
        };

        let parsed = match router.generate(&prompt).await {
            Ok(reply) => match parse_event_reply(&reply) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    telemetry.record_error(Endpoint::EventGeneration, &err.to_string());
                    None
                }
            },
            Err(err) => {
                telemetry.record_error(Endpoint::EventGeneration, &err.to_string());
                None
            }
        };

        match parsed {
            Some(parsed) => (self.assemble_generated(parsed, archetype, rng), false),
            None => {
                warn!("{LOG_EVENT_FALLBACK}: serving template event");
                telemetry.record_fallback(Endpoint::EventGeneration, "template event served");
                (self.fallback_event(archetype, rng), true)
            }
        }
    }

    fn assemble_generated(
        &mut self,
        parsed: ParsedEvent,
        archetype: Option<CrisisArchetype>,
        rng: &RngBundle,
    ) -> Event {
        let mut options = parsed.options;
        pad_options(&mut options, rng);

        let urgency = match archetype {
            // Emergencies never read as routine, whatever the reply said.
            Some(_) if matches!(parsed.urgency, Urgency::Low | Urgency::Medium) => Urgency::High,
            _ => parsed.urgency,
        };

        Event {
            id: self.mint_generated_id(rng),
            title: parsed.title,
            description: parsed.description,
            category: parsed.category,
            urgency,
            complexity: parsed.complexity,
            background: parsed.background,
            stakeholders: parsed.stakeholders,
            time_constraint: parsed.time_constraint,
            provenance: if archetype.is_some() {
                Provenance::Emergency
            } else {
                Provenance::Generated
            },
            archetype,
            generation_reason: archetype
                .map(|a| format!("emergency: {}", a.display_name())),
            options,
        }
    }

    fn fallback_event(&mut self, archetype: Option<CrisisArchetype>, rng: &RngBundle) -> Event {
        let (title, description, category) = FALLBACK_SHEET[self.fallback_cursor];
        self.fallback_cursor = (self.fallback_cursor + 1) % FALLBACK_SHEET.len();

        let options = FALLBACK_OPTIONS
            .iter()
            .map(|(text, ideology, approval, diplomacy)| EventOption {
                text: (*text).to_string(),
                ideology: *ideology,
                stance: ideology.default_stance(),
                effects: EffectVector {
                    approval: *approval,
                    diplomacy: *diplomacy,
                    ..EffectVector::default()
                },
                policy_note: None,
            })
            .collect();

        Event {
            id: self.mint_generated_id(rng),
            title: title.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            urgency: if archetype.is_some() {
                Urgency::High
            } else {
                Urgency::Medium
            },
            complexity: crate::event::Complexity::Moderate,
            background: String::new(),
            stakeholders: smallvec::SmallVec::new(),
            time_constraint: None,
            provenance: Provenance::Fallback,
            archetype,
            generation_reason: Some("generation unavailable; template served".to_string()),
            options,
        }
    }

    /// Mint `evt-<unix_ms>-<4 digits>`, retrying on registry collisions.
    /// After the retry budget the duplicate is accepted with a warning.
    fn mint_generated_id(&mut self, rng: &RngBundle) -> String {
        let mut candidate = String::new();
        for _ in 0..=ID_RETRY_LIMIT {
            let millis = Utc::now().timestamp_millis();
            let suffix = {
                let mut stream = rng.identity();
                stream.gen_range(0..ID_SUFFIX_SPAN)
            };
            candidate = format!("{GENERATED_ID_PREFIX}-{millis}-{suffix:04}");
            if !self.used_generated.contains(&candidate) {
                self.used_generated.insert(candidate.clone());
                return candidate;
            }
        }
        warn!("{LOG_DUPLICATE_ID}: {candidate}");
        candidate
    }
}

fn normalize_options(event: &mut Event, ctx: NormalizeContext) {
    for option in &mut event.options {
        option.effects = normalize_effects(option.effects, ctx);
    }
}

/// Pad a parsed slate to the full archetype count. Each padded option takes
/// an ideology the slate does not cover yet, with its house profile
/// jittered so padded slates differ between events.
fn pad_options(options: &mut Vec<EventOption>, rng: &RngBundle) {
    if options.len() >= GENERATED_OPTION_COUNT {
        return;
    }
    let present: HashSet<Ideology> = options.iter().map(|o| o.ideology).collect();
    let mut stream = rng.heuristic();
    for ideology in Ideology::ALL {
        if options.len() >= GENERATED_OPTION_COUNT {
            break;
        }
        if present.contains(&ideology) {
            continue;
        }
        options.push(EventOption {
            text: format!("{}.", ideology.padding_line()),
            ideology,
            stance: ideology.default_stance(),
            effects: jitter_effects(ideology.house_effects(), &mut *stream),
            policy_note: None,
        });
    }
}
