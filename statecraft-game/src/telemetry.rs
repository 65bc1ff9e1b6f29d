//! Session-scoped usage accounting for the operations report.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::constants::OPS_LOG_CAPACITY;
use crate::provider::{ProviderKind, ProviderStatus};

/// The three outward-facing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    EventGeneration,
    PolicyAnalysis,
    PolicyScoring,
}

impl Endpoint {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EventGeneration => "event_generation",
            Self::PolicyAnalysis => "policy_analysis",
            Self::PolicyScoring => "policy_scoring",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters for one endpoint. `errors` counts upstream failures that were
/// absorbed, not errors surfaced to the caller; `fallbacks` counts how many
/// replies came from a degraded path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointCounters {
    pub calls: u64,
    pub errors: u64,
    pub fallbacks: u64,
    pub cache_hits: u64,
}

/// One line of the rolling operations log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryNote {
    pub at: DateTime<Utc>,
    pub endpoint: Endpoint,
    pub note: String,
}

/// Point-in-time snapshot served by the operations endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageReport {
    pub generated_at: DateTime<Utc>,
    pub active_provider: ProviderKind,
    pub providers: Vec<ProviderStatus>,
    pub event_generation: EndpointCounters,
    pub policy_analysis: EndpointCounters,
    pub policy_scoring: EndpointCounters,
    pub recent: Vec<TelemetryNote>,
}

/// Accumulates counters and a bounded rolling log.
#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    event_generation: EndpointCounters,
    policy_analysis: EndpointCounters,
    policy_scoring: EndpointCounters,
    recent: VecDeque<TelemetryNote>,
}

impl Telemetry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn counters_mut(&mut self, endpoint: Endpoint) -> &mut EndpointCounters {
        match endpoint {
            Endpoint::EventGeneration => &mut self.event_generation,
            Endpoint::PolicyAnalysis => &mut self.policy_analysis,
            Endpoint::PolicyScoring => &mut self.policy_scoring,
        }
    }

    #[must_use]
    pub const fn counters(&self, endpoint: Endpoint) -> EndpointCounters {
        match endpoint {
            Endpoint::EventGeneration => self.event_generation,
            Endpoint::PolicyAnalysis => self.policy_analysis,
            Endpoint::PolicyScoring => self.policy_scoring,
        }
    }

    fn push_note(&mut self, endpoint: Endpoint, note: String) {
        self.recent.push_back(TelemetryNote {
            at: Utc::now(),
            endpoint,
            note,
        });
        while self.recent.len() > OPS_LOG_CAPACITY {
            self.recent.pop_front();
        }
    }

    pub fn record_call(&mut self, endpoint: Endpoint) {
        self.counters_mut(endpoint).calls += 1;
    }

    pub fn record_error(&mut self, endpoint: Endpoint, note: &str) {
        self.counters_mut(endpoint).errors += 1;
        self.push_note(endpoint, format!("error: {note}"));
    }

    pub fn record_fallback(&mut self, endpoint: Endpoint, note: &str) {
        self.counters_mut(endpoint).fallbacks += 1;
        self.push_note(endpoint, format!("fallback: {note}"));
    }

    pub fn record_cache_hit(&mut self, endpoint: Endpoint) {
        self.counters_mut(endpoint).cache_hits += 1;
    }

    /// Recent log lines, oldest first.
    pub fn recent(&self) -> impl Iterator<Item = &TelemetryNote> {
        self.recent.iter()
    }

    /// Assemble the operations snapshot.
    #[must_use]
    pub fn report(
        &self,
        active_provider: ProviderKind,
        providers: Vec<ProviderStatus>,
    ) -> UsageReport {
        UsageReport {
            generated_at: Utc::now(),
            active_provider,
            providers,
            event_generation: self.event_generation,
            policy_analysis: self.policy_analysis,
            policy_scoring: self.policy_scoring,
            recent: self.recent.iter().cloned().collect(),
        }
    }

    /// Wipe counters and the rolling log.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
