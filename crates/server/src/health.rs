use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use quarry_core::cache::CacheStats;
use quarry_core::MatchService;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    service: Arc<MatchService>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub catalog: HealthCheck,
    pub cache: CacheStats,
    pub checked_at: String,
}

pub fn router(service: Arc<MatchService>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { service })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let materials = state.service.materials();
    let catalog = if materials.is_empty() {
        HealthCheck { status: "degraded", detail: "no supplier data loaded".to_owned() }
    } else {
        HealthCheck {
            status: "ready",
            detail: format!("{} materials loaded", materials.len()),
        }
    };
    let ready = catalog.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "quarry-server runtime initialized".to_owned(),
        },
        catalog,
        cache: state.service.cache_stats(),
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}
