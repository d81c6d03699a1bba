use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use quarry_core::cache::CacheStats;
use quarry_core::config::ServerConfig;
use quarry_core::{
    generate_request_id, Bundle, Coordinate, MatchError, MatchService, MaterialId, Provenance,
    Quote, RouteResult, SearchResult, SupplierId,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<MatchService>,
    pub latency: LatencySettings,
}

/// Simulated upstream latency, gated by config.
#[derive(Clone, Copy, Debug)]
pub struct LatencySettings {
    pub enabled: bool,
    pub min_ms: u64,
    pub max_ms: u64,
}

impl LatencySettings {
    pub fn from_config(server: &ServerConfig) -> Self {
        Self {
            enabled: server.simulate_latency,
            min_ms: server.min_latency_ms,
            max_ms: server.max_latency_ms,
        }
    }

    pub const fn disabled() -> Self {
        Self { enabled: false, min_ms: 0, max_ms: 0 }
    }
}

/// The delay is drawn before the await, so nothing is held across it, and
/// dropping a cancelled request future cancels the sleep with it.
async fn simulate_latency(settings: LatencySettings) {
    if !settings.enabled {
        return;
    }
    let delay_ms = rand::thread_rng().gen_range(settings.min_ms..=settings.max_ms);
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/ext/suppliers/search", post(search))
        .route("/ext/suppliers/quote", post(quote))
        .route("/ext/route/eta", post(route_eta))
        .route("/ext/sources", get(sources))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct CoordinateDto {
    pub latitude: f64,
    pub longitude: f64,
}

impl CoordinateDto {
    fn coordinate(&self) -> Result<Coordinate, ApiError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ApiError::bad_request(
                "invalid_coordinates",
                format!("latitude {} out of range [-90, 90]", self.latitude),
            ));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ApiError::bad_request(
                "invalid_coordinates",
                format!("longitude {} out of range [-180, 180]", self.longitude),
            ));
        }
        Ok(Coordinate::new(self.latitude, self.longitude))
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub origin: CoordinateDto,
    pub material: String,
    pub quantity_tons: f64,
}

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub supplier_id: String,
    pub material: String,
    pub quantity_tons: f64,
}

#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    pub origin: CoordinateDto,
    pub destination: CoordinateDto,
    pub quantity_tons: Option<f64>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    detail: String,
}

impl ApiError {
    fn bad_request(code: &'static str, detail: String) -> Self {
        Self { status: StatusCode::BAD_REQUEST, code, detail }
    }
}

impl From<MatchError> for ApiError {
    fn from(error: MatchError) -> Self {
        let status = match error {
            MatchError::InvalidQuantity(_) | MatchError::InvalidPrice(_) => {
                StatusCode::BAD_REQUEST
            }
            MatchError::UnknownMaterial(_)
            | MatchError::NoSuppliersForMaterial(_)
            | MatchError::NoStockAvailable(_)
            | MatchError::UnknownSupplier { .. } => StatusCode::NOT_FOUND,
        };
        Self { status, code: error.code(), detail: error.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.code, "detail": self.detail }))).into_response()
    }
}

async fn search(
    State(state): State<ApiState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Bundle<SearchResult>>, ApiError> {
    simulate_latency(state.latency).await;
    let origin = request.origin.coordinate()?;
    let bundle =
        state.service.search(origin, &MaterialId(request.material), request.quantity_tons)?;
    Ok(Json(bundle))
}

async fn quote(
    State(state): State<ApiState>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<Bundle<Quote>>, ApiError> {
    simulate_latency(state.latency).await;
    let bundle = state.service.get_quote(
        &SupplierId(request.supplier_id),
        &MaterialId(request.material),
        request.quantity_tons,
    )?;
    Ok(Json(bundle))
}

async fn route_eta(
    State(state): State<ApiState>,
    Json(request): Json<RouteRequest>,
) -> Result<Json<Bundle<RouteResult>>, ApiError> {
    simulate_latency(state.latency).await;
    let origin = request.origin.coordinate()?;
    let destination = request.destination.coordinate()?;
    let quantity_tons = request.quantity_tons.unwrap_or(0.0);
    if quantity_tons < 0.0 {
        return Err(ApiError::bad_request(
            "invalid_quantity",
            format!("quantity_tons must not be negative, got {quantity_tons}"),
        ));
    }
    let bundle = state.service.get_route(origin, destination, quantity_tons)?;
    Ok(Json(bundle))
}

#[derive(Debug, Serialize)]
struct SourceHealth {
    source_name: &'static str,
    status: &'static str,
    response_time_ms: Option<u32>,
    last_check: DateTime<Utc>,
    error_rate: f64,
}

#[derive(Debug, Serialize)]
struct SourcesResponse {
    overall_status: &'static str,
    sources: Vec<SourceHealth>,
    cache: CacheStats,
    provenance: Provenance,
}

/// Simulated health report for the data sources behind the engine.
async fn sources(State(state): State<ApiState>) -> Json<SourcesResponse> {
    let now = Utc::now();
    let sources = vec![
        SourceHealth {
            source_name: "mock-suppliers-db",
            status: "healthy",
            response_time_ms: Some(50),
            last_check: now,
            error_rate: 0.0,
        },
        SourceHealth {
            source_name: "haversine-distance-calc",
            status: "healthy",
            response_time_ms: Some(5),
            last_check: now,
            error_rate: 0.0,
        },
        SourceHealth {
            source_name: "mock-pricing-engine",
            status: "healthy",
            response_time_ms: Some(30),
            last_check: now,
            error_rate: 0.0,
        },
        SourceHealth {
            source_name: "mock-routing-engine",
            status: "healthy",
            response_time_ms: Some(45),
            last_check: now,
            error_rate: 0.0,
        },
        SourceHealth {
            source_name: "geoapify-api",
            status: "sandbox",
            response_time_ms: None,
            last_check: now,
            error_rate: 0.0,
        },
        SourceHealth {
            source_name: "ondc-network",
            status: "disabled",
            response_time_ms: None,
            last_check: now,
            error_rate: 0.0,
        },
    ];

    let unhealthy = sources.iter().filter(|source| source.status == "down").count();
    Json(SourcesResponse {
        overall_status: if unhealthy > 0 { "degraded" } else { "healthy" },
        sources,
        cache: state.service.cache_stats(),
        provenance: Provenance {
            provider: "system-health-monitor".to_owned(),
            cache_hit: false,
            cache_age_seconds: None,
            request_id: generate_request_id(),
            generated_at: now,
            sources: vec!["internal-health-check".to_owned()],
        },
    })
}
