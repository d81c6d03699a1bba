pub mod cache;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod domain;
pub mod errors;
pub mod geo;
pub mod provenance;
pub mod quoting;
pub mod ranking;
pub mod routing;
pub mod service;

pub use cache::{
    CacheLookup, CacheStats, Fingerprint, FingerprintBuilder, ResponseCache,
    DEFAULT_CACHE_TTL_HOURS,
};
pub use catalog::{InMemoryCatalog, SupplierCatalog};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    AppConfig, CatalogConfig, ConfigError, EngineConfig, LoadOptions, LogFormat, LoggingConfig,
    ServerConfig,
};
pub use domain::plan::{Allocation, FulfillmentPlan};
pub use domain::quote::{Quote, QuoteId};
pub use domain::route::{RouteId, RouteQuality, RouteResult};
pub use domain::supplier::{Coordinate, MaterialId, RankedSupplier, SupplierId, SupplierRecord};
pub use errors::MatchError;
pub use geo::{haversine_distance, DistanceCalculator};
pub use provenance::{generate_request_id, Provenance, ProvenanceBuilder, SourceMode};
pub use quoting::{FixedJitter, JitterRange, JitterSource, QuoteEngine, UniformJitter};
pub use ranking::{RankingEngine, RankingOutcome};
pub use routing::RouteEngine;
pub use service::{Bundle, MatchService, SearchResult};
