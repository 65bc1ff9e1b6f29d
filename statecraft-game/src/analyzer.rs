//! Policy Effect Analyzer.
//!
//! Free text in, bounded `EffectAnalysis` out. The provider path and the
//! keyword heuristic funnel through the same normalize routine, so callers
//! see one output shape; only the `fallback` flag records which path ran.
use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cache::PromptCache;
use crate::constants::{
    FALLBACK_CONFIDENCE_MAX, FALLBACK_CONFIDENCE_MIN, FALLBACK_JITTER_SPAN,
    LOG_ANALYSIS_FALLBACK, LOG_CACHE_HIT, PROMPT_CACHE_CAPACITY,
};
use crate::effect::{EffectVector, NormalizeContext, Timeframe, normalize_effects};
use crate::parse::{ParsedAnalysis, parse_analysis_reply};
use crate::prompt::{PromptContext, build_analysis_prompt};
use crate::provider::FallbackRouter;
use crate::rng::RngBundle;
use crate::telemetry::{Endpoint, Telemetry};

/// Projected national impact of one policy decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectAnalysis {
    pub effects: EffectVector,
    pub reasoning: String,
    pub confidence: u8,
    pub timeframe: Timeframe,
    pub risks: Vec<String>,
    pub opportunities: Vec<String>,
    /// True when the keyword heuristic produced the numbers.
    pub fallback: bool,
}

const ECONOMIC_TERMS: &[&str] = &[
    "econom", "invest", "tax", "subsid", "stimul", "budget", "trade", "industr", "employ",
    "wage",
];
const DIPLOMATIC_TERMS: &[&str] = &[
    "diplomat", "internation", "treaty", "alliance", "foreign", "embassy", "summit",
    "sanction",
];
const ENVIRONMENTAL_TERMS: &[&str] = &[
    "environment", "climate", "emission", "renewable", "green", "conserv", "pollut",
];
const TECHNOLOGICAL_TERMS: &[&str] = &[
    "technolog", "digital", "innovat", "research", "broadband", "automation", "cyber",
];
const CAUTIOUS_TERMS: &[&str] = &[
    "caution", "deliberat", "gradual", "review", "study", "commission", "pilot", "consult",
];

fn matches_group(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| text.contains(term))
}

/// Keyword heuristic used when no provider reply is usable. Matched groups
/// push bounded deltas into their field subsets, then every field picks up
/// a small jitter before the shared normalize pass.
fn keyword_fallback<R>(policy_text: &str, norm: NormalizeContext, rng: &mut R) -> EffectAnalysis
where
    R: Rng + ?Sized,
{
    let lower = policy_text.to_lowercase();
    let mut raw = EffectVector::default();
    let mut matched: Vec<&'static str> = Vec::new();

    if matches_group(&lower, ECONOMIC_TERMS) {
        matched.push("economic");
        raw.gdp += rng.gen_range(2..=8);
        raw.market_index += rng.gen_range(50..=300);
        raw.debt += rng.gen_range(5..=30);
    }
    if matches_group(&lower, DIPLOMATIC_TERMS) {
        matched.push("diplomatic");
        raw.diplomacy += rng.gen_range(2..=6);
        raw.approval += rng.gen_range(0..=2);
        raw.exchange_rate -= rng.gen_range(0..=2);
    }
    if matches_group(&lower, ENVIRONMENTAL_TERMS) {
        matched.push("environmental");
        raw.environment += rng.gen_range(2..=6);
        raw.gdp -= rng.gen_range(0..=3);
    }
    if matches_group(&lower, TECHNOLOGICAL_TERMS) {
        matched.push("technological");
        raw.technology += rng.gen_range(2..=6);
        raw.gdp += rng.gen_range(1..=4);
        raw.market_index += rng.gen_range(50..=200);
    }
    if matches_group(&lower, CAUTIOUS_TERMS) {
        matched.push("cautious");
        raw.approval += rng.gen_range(1..=3);
        raw.debt -= rng.gen_range(0..=10);
    }

    let mut jitter = || rng.gen_range(-FALLBACK_JITTER_SPAN..=FALLBACK_JITTER_SPAN);
    raw.approval += jitter();
    raw.gdp += jitter();
    raw.debt += jitter();
    raw.technology += jitter();
    raw.environment += jitter();
    raw.market_index += jitter();
    raw.exchange_rate += jitter();
    raw.diplomacy += jitter();

    let reasoning = if matched.is_empty() {
        "Heuristic estimate; no strong signals in the policy text.".to_string()
    } else {
        format!("Heuristic estimate from policy signals: {}.", matched.join(", "))
    };

    EffectAnalysis {
        effects: normalize_effects(raw, norm),
        reasoning,
        confidence: rng.gen_range(FALLBACK_CONFIDENCE_MIN..=FALLBACK_CONFIDENCE_MAX),
        timeframe: Timeframe::ShortTerm,
        risks: vec!["Estimated without advisor input".to_string()],
        opportunities: Vec::new(),
        fallback: true,
    }
}

fn finish_provider_analysis(parsed: ParsedAnalysis, norm: NormalizeContext) -> EffectAnalysis {
    EffectAnalysis {
        effects: normalize_effects(parsed.effects, norm),
        reasoning: parsed.reasoning,
        confidence: parsed.confidence,
        timeframe: parsed.timeframe,
        risks: parsed.risks,
        opportunities: parsed.opportunities,
        fallback: false,
    }
}

/// Owns the session-scoped reply cache. One outward provider call per
/// `analyze`, none on a cache hit.
pub struct PolicyAnalyzer {
    cache: PromptCache<EffectAnalysis>,
}

impl Default for PolicyAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: PromptCache::new(PROMPT_CACHE_CAPACITY),
        }
    }

    /// Cached analyses currently held.
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Drop all cached analyses (full session reset).
    pub fn reset(&mut self) {
        self.cache.clear();
    }

    /// Analyze a free-text policy decision. Infallible at this boundary:
    /// provider and parse failures degrade to the keyword heuristic.
    pub async fn analyze(
        &mut self,
        policy_text: &str,
        ctx: &PromptContext<'_>,
        router: &mut FallbackRouter,
        rng: &RngBundle,
        telemetry: &mut Telemetry,
    ) -> EffectAnalysis {
        telemetry.record_call(Endpoint::PolicyAnalysis);
        let norm = NormalizeContext {
            risk: ctx.trend.risk,
            approval: ctx.state.approval,
        };

        let prompt = build_analysis_prompt(ctx, policy_text);
        let key = PromptCache::<EffectAnalysis>::key_for(&prompt);
        if let Some(hit) = self.cache.get(key) {
            debug!("{LOG_CACHE_HIT}: key {key:016x}");
            telemetry.record_cache_hit(Endpoint::PolicyAnalysis);
            return hit.clone();
        }

        match router.generate(&prompt).await {
            Ok(reply) => match parse_analysis_reply(&reply) {
                Ok(parsed) => {
                    let analysis = finish_provider_analysis(parsed, norm);
                    self.cache.insert(key, analysis.clone());
                    return analysis;
                }
                Err(err) => {
                    telemetry.record_error(Endpoint::PolicyAnalysis, &err.to_string());
                }
            },
            Err(err) => {
                telemetry.record_error(Endpoint::PolicyAnalysis, &err.to_string());
            }
        }

        warn!("{LOG_ANALYSIS_FALLBACK}: keyword heuristic engaged");
        telemetry.record_fallback(Endpoint::PolicyAnalysis, "keyword heuristic");
        let mut stream = rng.heuristic();
        keyword_fallback(policy_text, norm, &mut *stream)
    }
}
