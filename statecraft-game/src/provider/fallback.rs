//! Router that keeps one provider active and degrades toward the static
//! composer when backends misbehave.
use log::{info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, Instant};

use super::{ProviderError, ProviderKind, ProviderStatus, StaticComposer, TextProvider};
use crate::constants::{
    GENERATE_TIMEOUT_MS, LOG_PROVIDER_DEGRADED, LOG_PROVIDER_PROMOTED, LOG_PROVIDER_REJECTED,
    PROBE_SWEEP_CEILING_MS, PROBE_TIMEOUT_MS,
};

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Keeps the provider slots, their last probed health, and the active
/// pointer. The active pointer only moves in three places: a successful
/// `set_provider`, degradation inside `generate`, and a re-probe.
pub struct FallbackRouter {
    providers: Vec<Arc<dyn TextProvider>>,
    statuses: HashMap<ProviderKind, ProviderStatus>,
    active: ProviderKind,
}

impl FallbackRouter {
    /// Router with only the static composer registered.
    #[must_use]
    pub fn new() -> Self {
        let composer: Arc<dyn TextProvider> = Arc::new(StaticComposer::new());
        let mut statuses = HashMap::new();
        // The composer is in-crate and definitionally available; it never
        // needs a probe to be selectable.
        statuses.insert(
            ProviderKind::Static,
            ProviderStatus {
                kind: ProviderKind::Static,
                id: composer.id().to_string(),
                available: true,
                latency_ms: Some(0),
                last_error: None,
            },
        );
        Self {
            providers: vec![composer],
            statuses,
            active: ProviderKind::Static,
        }
    }

    /// Register (or replace) the provider for its own kind slot.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn TextProvider>) -> Self {
        let kind = provider.kind();
        self.providers.retain(|p| p.kind() != kind);
        self.statuses
            .entry(kind)
            .or_insert_with(|| ProviderStatus::unprobed(kind, provider.id()));
        self.providers.push(provider);
        self
    }

    fn slot(&self, kind: ProviderKind) -> Option<&Arc<dyn TextProvider>> {
        self.providers.iter().find(|p| p.kind() == kind)
    }

    fn is_available(&self, kind: ProviderKind) -> bool {
        self.statuses.get(&kind).is_some_and(|s| s.available)
    }

    /// Currently active slot.
    #[must_use]
    pub const fn active(&self) -> ProviderKind {
        self.active
    }

    /// Instance name of the active provider.
    #[must_use]
    pub fn active_id(&self) -> &str {
        self.slot(self.active).map_or("unregistered", |p| p.id())
    }

    /// Last known statuses in preference order.
    #[must_use]
    pub fn statuses(&self) -> Vec<ProviderStatus> {
        ProviderKind::PREFERENCE
            .iter()
            .filter_map(|kind| self.statuses.get(kind).cloned())
            .collect()
    }

    /// Probe every registered provider concurrently and re-select the
    /// active slot. Each probe runs under its own timeout; the whole sweep
    /// is harvested under a hard ceiling.
    pub async fn probe_all(&mut self) -> Vec<ProviderStatus> {
        let mut handles = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            let provider = Arc::clone(provider);
            let meta = (provider.kind(), provider.id().to_string());
            let handle = tokio::spawn(async move {
                let started = Instant::now();
                let outcome = timeout(
                    Duration::from_millis(PROBE_TIMEOUT_MS),
                    provider.health_check(),
                )
                .await;
                let latency = elapsed_ms(started);
                match outcome {
                    Ok(Ok(())) => ProviderStatus {
                        kind: provider.kind(),
                        id: provider.id().to_string(),
                        available: true,
                        latency_ms: Some(latency),
                        last_error: None,
                    },
                    Ok(Err(err)) => ProviderStatus {
                        kind: provider.kind(),
                        id: provider.id().to_string(),
                        available: false,
                        latency_ms: Some(latency),
                        last_error: Some(err.to_string()),
                    },
                    Err(_) => ProviderStatus {
                        kind: provider.kind(),
                        id: provider.id().to_string(),
                        available: false,
                        latency_ms: Some(latency),
                        last_error: Some(format!("probe timed out after {latency} ms")),
                    },
                }
            });
            handles.push((meta, handle));
        }

        let deadline = Instant::now() + Duration::from_millis(PROBE_SWEEP_CEILING_MS);
        for ((kind, id), handle) in handles {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let status = match timeout(remaining, handle).await {
                Ok(Ok(status)) => status,
                Ok(Err(_)) => ProviderStatus {
                    kind,
                    id,
                    available: false,
                    latency_ms: None,
                    last_error: Some("probe task failed".to_string()),
                },
                Err(_) => ProviderStatus {
                    kind,
                    id,
                    available: false,
                    latency_ms: None,
                    last_error: Some("probe sweep ceiling exceeded".to_string()),
                },
            };
            self.statuses.insert(status.kind, status);
        }

        self.reselect_active();
        self.statuses()
    }

    /// Full re-probe; may promote a recovered provider back over the
    /// static composer.
    pub async fn recheck_providers(&mut self) -> Vec<ProviderStatus> {
        self.probe_all().await
    }

    fn reselect_active(&mut self) {
        let previous = self.active;
        let next = ProviderKind::PREFERENCE
            .into_iter()
            .find(|kind| self.slot(*kind).is_some() && self.is_available(*kind))
            .unwrap_or(ProviderKind::Static);
        if next != previous {
            info!(
                "{LOG_PROVIDER_PROMOTED}: {} -> {}",
                previous.as_str(),
                next.as_str()
            );
        }
        self.active = next;
    }

    /// Manually select a slot. Refused (with no change) when the slot is
    /// unregistered or its last probe said unavailable.
    pub fn set_provider(&mut self, kind: ProviderKind) -> bool {
        if self.slot(kind).is_none() || !self.is_available(kind) {
            warn!("{LOG_PROVIDER_REJECTED}: {} unavailable", kind.as_str());
            return false;
        }
        self.active = kind;
        true
    }

    /// Generate text through the active provider.
    ///
    /// On any failure of a non-static active provider the router silently
    /// degrades to the static composer for subsequent calls and still
    /// returns the error for this one; callers map it to their own
    /// fallback result.
    ///
    /// # Errors
    ///
    /// Returns the active provider's error (or a timeout) for the current
    /// call.
    pub async fn generate(&mut self, prompt: &str) -> Result<String, ProviderError> {
        let active = self.active;
        let provider = self
            .slot(active)
            .ok_or(ProviderError::EmptySlot { kind: active })?;
        let provider = Arc::clone(provider);

        let started = Instant::now();
        let outcome = timeout(
            Duration::from_millis(GENERATE_TIMEOUT_MS),
            provider.generate_text(prompt),
        )
        .await;
        let latency = elapsed_ms(started);

        let err = match outcome {
            Ok(Ok(reply)) => return Ok(reply),
            Ok(Err(err)) => err,
            Err(_) => ProviderError::Timeout {
                elapsed_ms: latency,
            },
        };

        if active != ProviderKind::Static {
            warn!(
                "{LOG_PROVIDER_DEGRADED}: {} failed after {} ms ({}), switching to static",
                provider.id(),
                latency,
                err
            );
            if let Some(status) = self.statuses.get_mut(&active) {
                status.available = false;
                status.latency_ms = Some(latency);
                status.last_error = Some(err.to_string());
            }
            self.active = ProviderKind::Static;
        }
        Err(err)
    }
}

impl Default for FallbackRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    struct ScriptedProvider {
        id: &'static str,
        kind: ProviderKind,
        healthy: AtomicBool,
        calls: AtomicU32,
        reply: &'static str,
        probe_delay_ms: u64,
    }

    impl ScriptedProvider {
        fn healthy(id: &'static str, kind: ProviderKind, reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                id,
                kind,
                healthy: AtomicBool::new(true),
                calls: AtomicU32::new(0),
                reply,
                probe_delay_ms: 0,
            })
        }

        fn dead(id: &'static str, kind: ProviderKind) -> Arc<Self> {
            Arc::new(Self {
                id,
                kind,
                healthy: AtomicBool::new(false),
                calls: AtomicU32::new(0),
                reply: "",
                probe_delay_ms: 0,
            })
        }

        fn slow(id: &'static str, kind: ProviderKind, delay_ms: u64) -> Arc<Self> {
            Arc::new(Self {
                id,
                kind,
                healthy: AtomicBool::new(true),
                calls: AtomicU32::new(0),
                reply: "{}",
                probe_delay_ms: delay_ms,
            })
        }
    }

    #[async_trait]
    impl TextProvider for ScriptedProvider {
        fn id(&self) -> &str {
            self.id
        }

        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn generate_text(&self, _prompt: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.healthy.load(Ordering::SeqCst) {
                Ok(self.reply.to_string())
            } else {
                Err(ProviderError::Unreachable("scripted outage".to_string()))
            }
        }

        async fn health_check(&self) -> Result<(), ProviderError> {
            if self.probe_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.probe_delay_ms)).await;
            }
            if self.healthy.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(ProviderError::Unreachable("scripted outage".to_string()))
            }
        }
    }

    #[tokio::test]
    async fn new_router_serves_from_static() {
        let mut router = FallbackRouter::new();
        assert_eq!(router.active(), ProviderKind::Static);
        let reply = router.generate("plain \"options\" prompt").await.unwrap();
        assert!(reply.contains("title"));
    }

    #[tokio::test]
    async fn probe_prefers_remote_over_local_and_static() {
        let mut router = FallbackRouter::new()
            .with_provider(ScriptedProvider::healthy("remote-a", ProviderKind::Remote, "{}"))
            .with_provider(ScriptedProvider::healthy("local-a", ProviderKind::Local, "{}"));
        router.probe_all().await;
        assert_eq!(router.active(), ProviderKind::Remote);
        assert_eq!(router.active_id(), "remote-a");
    }

    #[tokio::test]
    async fn dead_remote_falls_through_to_local() {
        let mut router = FallbackRouter::new()
            .with_provider(ScriptedProvider::dead("remote-a", ProviderKind::Remote))
            .with_provider(ScriptedProvider::healthy("local-a", ProviderKind::Local, "{}"));
        let statuses = router.probe_all().await;
        assert_eq!(router.active(), ProviderKind::Local);
        let remote = statuses
            .iter()
            .find(|s| s.kind == ProviderKind::Remote)
            .unwrap();
        assert!(!remote.available);
        assert!(remote.last_error.as_deref().unwrap().contains("outage"));
    }

    #[tokio::test]
    async fn generate_failure_degrades_to_static() {
        let remote = ScriptedProvider::healthy("remote-a", ProviderKind::Remote, "{}");
        let mut router =
            FallbackRouter::new().with_provider(Arc::clone(&remote) as Arc<dyn TextProvider>);
        router.probe_all().await;
        assert_eq!(router.active(), ProviderKind::Remote);

        remote.healthy.store(false, Ordering::SeqCst);
        let err = router.generate("prompt").await.unwrap_err();
        assert!(matches!(err, ProviderError::Unreachable(_)));
        assert_eq!(router.active(), ProviderKind::Static);

        // The very next call is served without another remote attempt.
        let calls_before = remote.calls.load(Ordering::SeqCst);
        let reply = router.generate("next \"options\" prompt").await.unwrap();
        assert!(reply.contains("title"));
        assert_eq!(remote.calls.load(Ordering::SeqCst), calls_before);
    }

    #[tokio::test]
    async fn set_provider_refuses_unavailable_slots() {
        let mut router = FallbackRouter::new()
            .with_provider(ScriptedProvider::dead("remote-a", ProviderKind::Remote));
        router.probe_all().await;
        assert!(!router.set_provider(ProviderKind::Remote));
        assert_eq!(router.active(), ProviderKind::Static);
        assert!(router.set_provider(ProviderKind::Static));
        assert!(!router.set_provider(ProviderKind::Local));
    }

    #[tokio::test]
    async fn recheck_promotes_recovered_provider() {
        let remote = ScriptedProvider::dead("remote-a", ProviderKind::Remote);
        let mut router =
            FallbackRouter::new().with_provider(Arc::clone(&remote) as Arc<dyn TextProvider>);
        router.probe_all().await;
        assert_eq!(router.active(), ProviderKind::Static);

        remote.healthy.store(true, Ordering::SeqCst);
        router.recheck_providers().await;
        assert_eq!(router.active(), ProviderKind::Remote);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_probe_times_out_and_is_marked_unavailable() {
        let mut router = FallbackRouter::new().with_provider(ScriptedProvider::slow(
            "remote-a",
            ProviderKind::Remote,
            PROBE_TIMEOUT_MS + 500,
        ));
        let statuses = router.probe_all().await;
        let remote = statuses
            .iter()
            .find(|s| s.kind == ProviderKind::Remote)
            .unwrap();
        assert!(!remote.available);
        assert!(remote.last_error.as_deref().unwrap().contains("timed out"));
        assert_eq!(router.active(), ProviderKind::Static);
    }
}
