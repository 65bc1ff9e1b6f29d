//! Centralized balance and tuning constants for Statecraft engine logic.
//!
//! These values define the deterministic math for event generation, effect
//! normalization and policy scoring. Keeping them together ensures gameplay
//! can only be adjusted via code changes reviewed in version control.

// Logging keys -------------------------------------------------------------
pub(crate) const LOG_PROVIDER_DEGRADED: &str = "provider.degraded";
pub(crate) const LOG_PROVIDER_PROMOTED: &str = "provider.promoted";
pub(crate) const LOG_PROVIDER_REJECTED: &str = "provider.switch-rejected";
pub(crate) const LOG_CATALOG_RESET: &str = "event.catalog-reset";
pub(crate) const LOG_EVENT_FALLBACK: &str = "event.fallback-template";
pub(crate) const LOG_DUPLICATE_ID: &str = "event.duplicate-id-accepted";
pub(crate) const LOG_ANALYSIS_FALLBACK: &str = "analysis.fallback";
pub(crate) const LOG_CACHE_HIT: &str = "analysis.cache-hit";
pub(crate) const LOG_REGISTRY_RESET: &str = "session.registry-reset";

// Effect bounds (symmetric, per field) --------------------------------------
pub(crate) const BOUND_APPROVAL: i32 = 20;
pub(crate) const BOUND_GDP: i32 = 50;
pub(crate) const BOUND_DEBT: i32 = 100;
pub(crate) const BOUND_TECHNOLOGY: i32 = 15;
pub(crate) const BOUND_ENVIRONMENT: i32 = 15;
pub(crate) const BOUND_MARKET_INDEX: i32 = 2500;
pub(crate) const BOUND_EXCHANGE_RATE: i32 = 12;
pub(crate) const BOUND_DIPLOMACY: i32 = 20;

// Context adjustment --------------------------------------------------------
pub(crate) const CRITICAL_RISK_AMPLIFIER: f64 = 1.2;
pub(crate) const LOW_APPROVAL_DAMPENER: f64 = 0.8;
pub(crate) const LOW_APPROVAL_THRESHOLD: i32 = 30;

// Emergency decision --------------------------------------------------------
pub(crate) const EMERGENCY_BASE_LOW: f64 = 0.05;
pub(crate) const EMERGENCY_BASE_MEDIUM: f64 = 0.15;
pub(crate) const EMERGENCY_BASE_HIGH: f64 = 0.25;
pub(crate) const EMERGENCY_BASE_CRITICAL: f64 = 0.40;
pub(crate) const EMERGENCY_BONUS_LOW_APPROVAL: f64 = 0.10;
pub(crate) const EMERGENCY_BONUS_RECESSION: f64 = 0.10;
pub(crate) const EMERGENCY_BONUS_LATE_PHASE: f64 = 0.10;

// Source decision ------------------------------------------------------------
pub(crate) const STATIC_SOURCE_BIAS: f64 = 0.7;

// Event shape ----------------------------------------------------------------
pub(crate) const MIN_EVENT_OPTIONS: usize = 3;
pub(crate) const MAX_EVENT_OPTIONS: usize = 10;
pub(crate) const GENERATED_OPTION_COUNT: usize = 10;

// Identifier minting ---------------------------------------------------------
pub(crate) const GENERATED_ID_PREFIX: &str = "evt";
pub(crate) const ID_RETRY_LIMIT: u32 = 5;
pub(crate) const ID_SUFFIX_SPAN: u32 = 10_000;

// Provider timeouts ----------------------------------------------------------
pub(crate) const PROBE_TIMEOUT_MS: u64 = 3_000;
pub(crate) const PROBE_SWEEP_CEILING_MS: u64 = 5_000;
pub(crate) const GENERATE_TIMEOUT_MS: u64 = 20_000;

// Analyzer fallback heuristics -------------------------------------------------
pub(crate) const FALLBACK_CONFIDENCE_MIN: u8 = 60;
pub(crate) const FALLBACK_CONFIDENCE_MAX: u8 = 90;
pub(crate) const FALLBACK_JITTER_SPAN: i32 = 2;

// Prompt assembly --------------------------------------------------------------
pub(crate) const PROMPT_HISTORY_WINDOW: usize = 5;

// Session resources -------------------------------------------------------------
pub(crate) const PROMPT_CACHE_CAPACITY: usize = 100;
pub(crate) const OPS_LOG_CAPACITY: usize = 100;

// Scoring model -------------------------------------------------------------------
pub(crate) const SUB_PARAM_MIN: i32 = 0;
pub(crate) const SUB_PARAM_MAX: i32 = 20;
pub(crate) const SUB_PARAM_NEUTRAL: i32 = 10;
pub(crate) const KEYWORD_BUMP_MIN: i32 = 1;
pub(crate) const KEYWORD_BUMP_MAX: i32 = 4;
pub(crate) const SCORE_EXCELLENT: i32 = 80;
pub(crate) const SCORE_GOOD: i32 = 65;
pub(crate) const SCORE_ADEQUATE: i32 = 50;

// National state defaults -----------------------------------------------------------
pub(crate) const START_APPROVAL: i32 = 50;
pub(crate) const START_GDP: i32 = 1_000;
pub(crate) const START_DEBT: i32 = 500;
pub(crate) const START_TECHNOLOGY: i32 = 50;
pub(crate) const START_ENVIRONMENT: i32 = 50;
pub(crate) const START_MARKET_INDEX: i32 = 12_000;
pub(crate) const START_EXCHANGE_RATE: i32 = 100;
pub(crate) const START_DIPLOMACY: i32 = 50;
pub(crate) const DEFAULT_TURN_LIMIT: u32 = 20;

// Game phase boundaries (fraction of the turn limit) ----------------------------------
pub(crate) const PHASE_EARLY_FRACTION: f64 = 0.35;
pub(crate) const PHASE_MID_FRACTION: f64 = 0.70;

// Percentage-scaled indicators (approval, technology, environment, diplomacy) ----------
pub(crate) const INDICATOR_PCT_MIN: i32 = 0;
pub(crate) const INDICATOR_PCT_MAX: i32 = 100;

// Trend derivation (session-side) -------------------------------------------------------
pub(crate) const TREND_WINDOW: usize = 3;
pub(crate) const TREND_APPROVAL_STEP: i32 = 2;
pub(crate) const TREND_ECONOMY_STEP: i32 = 10;
pub(crate) const RISK_APPROVAL_WATCH: i32 = 45;
pub(crate) const RISK_INDICATOR_STRAIN: i32 = 30;

// Test/debug plumbing ---------------------------------------------------------------------
pub(crate) const FLOAT_EPSILON: f64 = 1e-9;
