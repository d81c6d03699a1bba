use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;

/// Where results are sourced from, reflected in provenance labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    Sandbox,
    Live,
}

impl SourceMode {
    pub fn provider_label(self) -> &'static str {
        match self {
            Self::Sandbox => "mock-sandbox",
            Self::Live => "live-api",
        }
    }
}

/// Origin, freshness, and traceability metadata attached to every outbound
/// bundle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub provider: String,
    pub cache_hit: bool,
    pub cache_age_seconds: Option<u64>,
    pub request_id: String,
    pub generated_at: DateTime<Utc>,
    pub sources: Vec<String>,
}

/// Short unique id for request tracing.
pub fn generate_request_id() -> String {
    let hex: String = Uuid::new_v4().simple().to_string().chars().take(12).collect();
    format!("req-{hex}")
}

/// Stamps outbound bundles with provenance metadata.
///
/// Every wrap generates a fresh request id regardless of cache status, and
/// `generated_at` is the wrap time, not the original computation time.
pub struct ProvenanceBuilder {
    mode: SourceMode,
    clock: Arc<dyn Clock>,
}

impl ProvenanceBuilder {
    pub fn new(mode: SourceMode, clock: Arc<dyn Clock>) -> Self {
        Self { mode, clock }
    }

    pub fn wrap(
        &self,
        cache_hit: bool,
        cache_age_seconds: Option<u64>,
        sources: &[&str],
    ) -> Provenance {
        Provenance {
            provider: self.mode.provider_label().to_owned(),
            cache_hit,
            cache_age_seconds,
            request_id: generate_request_id(),
            generated_at: self.clock.now(),
            sources: sources.iter().map(|source| (*source).to_owned()).collect(),
        }
    }
}
