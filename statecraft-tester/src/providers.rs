//! Provider doubles with scripted failure modes.
//!
//! Each double implements the engine's [`TextProvider`] trait so scenarios
//! can pin down how a session behaves when its backend is healthy, absent,
//! intermittent, or slower than the probe window.
use async_trait::async_trait;
use statecraft_game::{ProviderError, ProviderKind, TextProvider};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Sleep per call for [`SlowProvider`]. Sits past the router's probe
/// timeout so a probe sweep marks the slot unavailable.
pub const SLOW_DELAY_MS: u64 = 3_500;

/// Well-formed event reply a live backend might produce, wrapped in the
/// prose chatter real models add around their JSON.
#[must_use]
pub fn scripted_event_reply(tag: &str, serial: u32) -> String {
    format!(
        r#"Here is the requested event.
{{
    "title": "Scripted Briefing {serial} ({tag})",
    "description": "A staffer hands over briefing {serial}; the room waits for a decision.",
    "category": "governance",
    "urgency": "medium",
    "complexity": "moderate",
    "options": [
        {{ "text": "Convene the cabinet and act on the briefing", "ideology": "centrist",
           "stance": "moderate", "effects": {{ "approval": 3, "gdp": 10 }} }},
        {{ "text": "Commission an independent review first", "ideology": "technocratic",
           "stance": "cautious", "effects": {{ "approval": -1, "technology": 2 }} }},
        {{ "text": "Dismiss the briefing publicly", "ideology": "nationalist",
           "stance": "aggressive", "effects": {{ "approval": -4, "diplomacy": -3 }} }}
    ]
}}
Let me know if you need another option."#
    )
}

/// Well-formed analysis reply for the same double.
#[must_use]
pub fn scripted_analysis_reply(serial: u32) -> String {
    format!(
        r#"{{
    "effects": {{ "approval": 2, "gdp": 15, "debt": 10, "environment": -1 }},
    "reasoning": "Scripted assessment {serial}: modest gains against a small fiscal cost.",
    "confidence": 74,
    "timeframe": "short_term",
    "risks": ["Funding squeeze in the out-years", "Opposition reframing"],
    "opportunities": ["Coalition goodwill"]
}}"#
    )
}

fn reply_for(prompt: &str, tag: &str, serial: u32) -> String {
    // Event prompts ask for an options array; analysis prompts do not.
    if prompt.contains("\"options\"") {
        scripted_event_reply(tag, serial)
    } else {
        scripted_analysis_reply(serial)
    }
}

/// Healthy backend that answers every prompt with well-formed JSON.
pub struct ScriptedProvider {
    id: String,
    kind: ProviderKind,
    calls: AtomicU32,
}

impl ScriptedProvider {
    #[must_use]
    pub fn new(id: &str, kind: ProviderKind) -> Self {
        Self {
            id: id.to_string(),
            kind,
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl TextProvider for ScriptedProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, ProviderError> {
        let serial = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(reply_for(prompt, &self.id, serial))
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Backend that probes healthy but fails every `fail_every`th generate
/// call. `fail_every == 1` fails them all, which models a backend that
/// dies between the probe and the first real request.
pub struct FlakyProvider {
    id: String,
    kind: ProviderKind,
    fail_every: u32,
    calls: AtomicU32,
}

impl FlakyProvider {
    #[must_use]
    pub fn new(id: &str, kind: ProviderKind, fail_every: u32) -> Self {
        Self {
            id: id.to_string(),
            kind,
            fail_every: fail_every.max(1),
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl TextProvider for FlakyProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, ProviderError> {
        let serial = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if serial % self.fail_every == 0 {
            return Err(ProviderError::Unreachable(format!(
                "scripted failure on call {serial}"
            )));
        }
        Ok(reply_for(prompt, &self.id, serial))
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Backend that is down for probes and calls alike.
pub struct DeadProvider {
    id: String,
    kind: ProviderKind,
}

impl DeadProvider {
    #[must_use]
    pub fn new(id: &str, kind: ProviderKind) -> Self {
        Self {
            id: id.to_string(),
            kind,
        }
    }
}

#[async_trait]
impl TextProvider for DeadProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn generate_text(&self, _prompt: &str) -> Result<String, ProviderError> {
        Err(ProviderError::Unreachable("scripted outage".to_string()))
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Err(ProviderError::Unreachable("scripted outage".to_string()))
    }
}

/// Backend that answers correctly but sleeps through the probe window.
pub struct SlowProvider {
    id: String,
    kind: ProviderKind,
    delay: Duration,
    calls: AtomicU32,
}

impl SlowProvider {
    #[must_use]
    pub fn new(id: &str, kind: ProviderKind, delay_ms: u64) -> Self {
        Self {
            id: id.to_string(),
            kind,
            delay: Duration::from_millis(delay_ms),
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl TextProvider for SlowProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, ProviderError> {
        tokio::time::sleep(self.delay).await;
        let serial = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(reply_for(prompt, &self.id, serial))
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statecraft_game::{parse_analysis_reply, parse_event_reply};

    #[test]
    fn scripted_event_reply_parses_cleanly() {
        let event = parse_event_reply(&scripted_event_reply("remote-a", 3)).unwrap();
        assert!(event.title.contains("Briefing 3"));
        assert_eq!(event.options.len(), 3);
        assert!(event.options.iter().all(|o| !o.text.is_empty()));
    }

    #[test]
    fn scripted_analysis_reply_parses_cleanly() {
        let analysis = parse_analysis_reply(&scripted_analysis_reply(1)).unwrap();
        assert_eq!(analysis.confidence, 74);
        assert_eq!(analysis.risks.len(), 2);
    }

    #[tokio::test]
    async fn scripted_provider_routes_by_prompt_shape() {
        let provider = ScriptedProvider::new("remote-a", ProviderKind::Remote);
        let event = provider
            .generate_text("reply as JSON with an \"options\" array")
            .await
            .unwrap();
        assert!(event.contains("\"options\""));
        assert!(event.contains("Briefing 1"));
        let analysis = provider
            .generate_text("assess the policy impact")
            .await
            .unwrap();
        assert!(analysis.contains("\"confidence\""));
        assert!(analysis.contains("assessment 2"));
    }

    #[tokio::test]
    async fn flaky_provider_fails_on_schedule() {
        let provider = FlakyProvider::new("remote-a", ProviderKind::Remote, 3);
        for call in 1..=6u32 {
            let outcome = provider.generate_text("prompt").await;
            if call % 3 == 0 {
                assert!(outcome.is_err(), "call {call} should fail");
            } else {
                assert!(outcome.is_ok(), "call {call} should succeed");
            }
        }
    }

    #[tokio::test]
    async fn dead_provider_refuses_everything() {
        let provider = DeadProvider::new("remote-a", ProviderKind::Remote);
        assert!(provider.health_check().await.is_err());
        assert!(provider.generate_text("prompt").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_sleeps_through_its_delay() {
        let provider = SlowProvider::new("remote-a", ProviderKind::Remote, SLOW_DELAY_MS);
        let started = tokio::time::Instant::now();
        provider.health_check().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(SLOW_DELAY_MS));
    }
}
