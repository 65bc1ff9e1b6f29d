//! Statecraft Game Engine
//!
//! Platform-agnostic core logic for Statecraft, a turn-based political
//! leadership simulation. This crate provides event direction, policy
//! analysis and scoring without UI or platform-specific dependencies.

pub mod analyzer;
pub mod cache;
pub mod catalog;
pub mod constants;
pub mod director;
pub mod effect;
pub mod event;
pub mod numbers;
pub mod parse;
pub mod prompt;
pub mod provider;
pub mod rng;
pub mod scoring;
pub mod seed;
pub mod session;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use analyzer::{EffectAnalysis, PolicyAnalyzer};
pub use catalog::{EventCatalog, catalog};
pub use director::{
    DecisionTrace, EmergencyDecision, EventDirector, EventPath, SourceDecision, TurnContext,
    decide_emergency, decide_source, emergency_probability, pick_archetype,
};
pub use effect::{EffectVector, NormalizeContext, Timeframe, normalize_effects};
pub use event::{
    Complexity, CrisisArchetype, Event, EventOption, Ideology, Provenance, Stance, Urgency,
};
pub use parse::{ParseError, ParsedAnalysis, ParsedEvent, parse_analysis_reply, parse_event_reply};
pub use prompt::{
    PromptContext, build_analysis_prompt, build_emergency_prompt, build_event_prompt,
};
pub use provider::{
    FallbackRouter, ProviderError, ProviderKind, ProviderStatus, StaticComposer, TextProvider,
};
pub use rng::{CountingRng, RngBundle};
pub use scoring::{
    DiplomaticParams, EconomicParams, EducationParams, EnvironmentalParams, FieldScore,
    FiscalParams, GovernanceParams, InformationalParams, ParameterSnapshot, RankLabel,
    RankingRecord, ScoreField, ScoreResult, SocialParams, TechnologicalParams, WelfareParams,
    score_policy,
};
pub use seed::{decode_to_seed, encode_friendly, generate_code_from_entropy};
pub use session::GameSession;
pub use state::{
    ApprovalTrend, ChoiceRecord, EconomicTrend, GamePhase, NationalState, RiskLevel, TrendSnapshot,
};
pub use telemetry::{Endpoint, EndpointCounters, Telemetry, TelemetryNote, UsageReport};
