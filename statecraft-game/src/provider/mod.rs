//! Text provider abstraction: remote and local model backends plus the
//! in-crate static composer, all behind one async trait.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod fallback;
pub mod static_text;

pub use fallback::FallbackRouter;
pub use static_text::StaticComposer;

/// Deployment class of a provider. Doubles as the router slot key; the
/// fixed preference order lives in [`ProviderKind::PREFERENCE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Remote,
    Local,
    Static,
}

impl ProviderKind {
    /// Selection order when several providers report healthy.
    pub const PREFERENCE: [Self; 3] = [Self::Remote, Self::Local, Self::Static];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Local => "local",
            Self::Static => "static",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by provider calls. Everything here is recoverable; the
/// router reacts by degrading to the static composer.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider unreachable: {0}")]
    Unreachable(String),
    #[error("request timed out after {elapsed_ms} ms")]
    Timeout { elapsed_ms: u64 },
    #[error("malformed reply: {0}")]
    MalformedReply(String),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("no provider registered for slot {kind}")]
    EmptySlot { kind: ProviderKind },
}

/// Last known health of one provider slot. Refreshed only by explicit
/// probes, never implicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStatus {
    pub kind: ProviderKind,
    pub id: String,
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl ProviderStatus {
    #[must_use]
    pub fn unprobed(kind: ProviderKind, id: &str) -> Self {
        Self {
            kind,
            id: id.to_string(),
            available: false,
            latency_ms: None,
            last_error: None,
        }
    }
}

/// A text generation backend.
///
/// Implementations must be cheap to probe: `health_check` is called
/// concurrently for every slot under a short timeout.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Human-readable instance name, used in logs and status reports.
    fn id(&self) -> &str;

    fn kind(&self) -> ProviderKind;

    /// Generate a reply for the given prompt.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] when the backend is unreachable, rejects
    /// the request, or replies with garbage.
    async fn generate_text(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Cheap liveness probe.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] when the backend cannot currently serve
    /// requests.
    async fn health_check(&self) -> Result<(), ProviderError>;
}
