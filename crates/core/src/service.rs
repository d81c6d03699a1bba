use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::cache::{CacheLookup, CacheStats, FingerprintBuilder, ResponseCache};
use crate::catalog::SupplierCatalog;
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::domain::plan::FulfillmentPlan;
use crate::domain::quote::Quote;
use crate::domain::route::RouteResult;
use crate::domain::supplier::{Coordinate, MaterialId, RankedSupplier, SupplierId};
use crate::errors::MatchError;
use crate::geo::DistanceCalculator;
use crate::provenance::{Provenance, ProvenanceBuilder};
use crate::quoting::{JitterSource, QuoteEngine, UniformJitter};
use crate::ranking::RankingEngine;
use crate::routing::RouteEngine;

pub const SEARCH_SOURCES: &[&str] = &["mock-suppliers-db", "haversine-distance-calc"];
pub const QUOTE_SOURCES: &[&str] = &["mock-pricing-engine", "market-data-feed"];
pub const ROUTE_SOURCES: &[&str] =
    &["mock-routing-engine", "haversine-distance", "co2-calculator"];

/// A response payload with its provenance. Serializes with the payload
/// fields inlined at the top level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bundle<T> {
    #[serde(flatten)]
    pub payload: T,
    pub provenance: Provenance,
}

/// Ranked suppliers for a demand, with the fulfillment plan and the
/// recommendation. `recommended` is absent when every candidate is out of
/// stock; the plan's `fulfilled` flag signals under-coverage either way.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub origin: Coordinate,
    pub material_id: MaterialId,
    pub requested_tons: f64,
    pub suppliers: Vec<RankedSupplier>,
    pub plan: FulfillmentPlan,
    pub recommended: Option<RankedSupplier>,
}

/// The outward face of the matching engine.
///
/// Each operation validates its inputs, probes the response cache on a
/// fingerprint of the result-affecting parameters, computes on a miss, and
/// wraps the outcome with fresh provenance.
pub struct MatchService {
    catalog: Arc<dyn SupplierCatalog>,
    ranking: RankingEngine,
    quoting: QuoteEngine,
    routing: RouteEngine,
    search_cache: ResponseCache<SearchResult>,
    quote_cache: ResponseCache<Quote>,
    route_cache: ResponseCache<RouteResult>,
    provenance: ProvenanceBuilder,
    cache_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl MatchService {
    pub fn new(catalog: Arc<dyn SupplierCatalog>, config: &EngineConfig) -> Self {
        Self::with_parts(catalog, config, Arc::new(SystemClock), Arc::new(UniformJitter))
    }

    /// Wire the service with an explicit clock and jitter source, the seam
    /// tests use for deterministic TTL and pricing behavior.
    pub fn with_parts(
        catalog: Arc<dyn SupplierCatalog>,
        config: &EngineConfig,
        clock: Arc<dyn Clock>,
        jitter: Arc<dyn JitterSource>,
    ) -> Self {
        let distance = Arc::new(DistanceCalculator::new(config.distance_memo_capacity));
        Self {
            catalog,
            ranking: RankingEngine::new(Arc::clone(&distance)),
            quoting: QuoteEngine::new(config.jitter, config.quote_validity_hours, jitter),
            routing: RouteEngine::new(
                distance,
                config.average_speed_kmh,
                config.emission_factor_kg_per_ton_km,
            ),
            search_cache: ResponseCache::new(Arc::clone(&clock)),
            quote_cache: ResponseCache::new(Arc::clone(&clock)),
            route_cache: ResponseCache::new(Arc::clone(&clock)),
            provenance: ProvenanceBuilder::new(config.source_mode, Arc::clone(&clock)),
            cache_ttl: Duration::hours(config.cache_ttl_hours),
            clock,
        }
    }

    /// Rank suppliers for a material demand and derive a fulfillment plan.
    pub fn search(
        &self,
        origin: Coordinate,
        material_id: &MaterialId,
        requested_tons: f64,
    ) -> Result<Bundle<SearchResult>, MatchError> {
        if requested_tons <= 0.0 {
            return Err(MatchError::InvalidQuantity(requested_tons));
        }

        let fingerprint = FingerprintBuilder::new("suppliers_search")
            .coordinate("origin", origin)
            .field("material", material_id.as_str())
            .field("qty", requested_tons)
            .finish();

        let lookup = self.search_cache.get_or_compute(fingerprint, self.cache_ttl, || {
            let candidates = self.catalog.list_suppliers(material_id)?;
            let outcome =
                self.ranking.rank_and_plan(material_id, &candidates, origin, requested_tons)?;
            Ok(SearchResult {
                origin,
                material_id: material_id.clone(),
                requested_tons,
                suppliers: outcome.ranked,
                plan: outcome.plan,
                recommended: outcome.recommended,
            })
        })?;

        Ok(self.bundle(lookup, SEARCH_SOURCES))
    }

    /// Quote a quantity from one supplier.
    ///
    /// Jittered quotes are cached pre-jitter-draw under the request
    /// fingerprint, so within the TTL window the cache is the source of
    /// quote consistency: identical asks see the same price.
    pub fn get_quote(
        &self,
        supplier_id: &SupplierId,
        material_id: &MaterialId,
        quantity_tons: f64,
    ) -> Result<Bundle<Quote>, MatchError> {
        if quantity_tons <= 0.0 {
            return Err(MatchError::InvalidQuantity(quantity_tons));
        }

        let fingerprint = FingerprintBuilder::new("supplier_quote")
            .field("material", material_id.as_str())
            .field("supplier", &supplier_id.0)
            .field("qty", quantity_tons)
            .finish();

        let lookup = self.quote_cache.get_or_compute(fingerprint, self.cache_ttl, || {
            let supplier = self.catalog.supplier(material_id, supplier_id)?;
            self.quoting.quote(&supplier, quantity_tons, self.clock.now())
        })?;

        Ok(self.bundle(lookup, QUOTE_SOURCES))
    }

    /// Estimate the delivery route between two points.
    pub fn get_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        quantity_tons: f64,
    ) -> Result<Bundle<RouteResult>, MatchError> {
        let fingerprint = FingerprintBuilder::new("route_eta")
            .coordinate("origin", origin)
            .coordinate("destination", destination)
            .field("qty", quantity_tons)
            .finish();

        let lookup =
            self.route_cache.get_or_compute::<_, MatchError>(fingerprint, self.cache_ttl, || {
                Ok(self.routing.route(origin, destination, quantity_tons, self.clock.now()))
            })?;

        Ok(self.bundle(lookup, ROUTE_SOURCES))
    }

    pub fn materials(&self) -> Vec<MaterialId> {
        self.catalog.materials()
    }

    /// Aggregated entry counts across the three response caches.
    pub fn cache_stats(&self) -> CacheStats {
        self.search_cache
            .stats()
            .merge(self.quote_cache.stats())
            .merge(self.route_cache.stats())
    }

    /// Proactive expiry sweep across all caches; lazy eviction on access
    /// keeps correctness without it.
    pub fn sweep_expired(&self) -> usize {
        self.search_cache.sweep_expired()
            + self.quote_cache.sweep_expired()
            + self.route_cache.sweep_expired()
    }

    fn bundle<T: Clone>(&self, lookup: CacheLookup<T>, sources: &[&str]) -> Bundle<T> {
        let provenance = self.provenance.wrap(lookup.cache_hit, lookup.age_seconds, sources);
        Bundle { payload: (*lookup.payload).clone(), provenance }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};

    use crate::catalog::InMemoryCatalog;
    use crate::clock::ManualClock;
    use crate::config::EngineConfig;
    use crate::domain::route::RouteQuality;
    use crate::domain::supplier::{Coordinate, MaterialId, SupplierId, SupplierRecord};
    use crate::errors::MatchError;
    use crate::quoting::UniformJitter;

    use super::MatchService;

    const ORIGIN: Coordinate = Coordinate { latitude: 17.3352, longitude: 78.4537 };

    fn supplier(supplier_id: &str, location: Coordinate, stock_tons: f64) -> SupplierRecord {
        SupplierRecord {
            supplier_id: SupplierId(supplier_id.to_owned()),
            name: format!("{supplier_id} Depot"),
            material_id: MaterialId("cement".to_owned()),
            material_name: "Portland Cement".to_owned(),
            stock_tons,
            unit_price: 6800.0,
            lead_time_days: 2,
            location,
            address: "Hyderabad".to_owned(),
            rating: 4.5,
        }
    }

    fn cement_catalog() -> InMemoryCatalog {
        InMemoryCatalog::new().with_material(
            "cement",
            vec![
                supplier("SUP-CEM-001", Coordinate::new(17.3345, 78.4512), 500.0),
                supplier("SUP-CEM-002", Coordinate::new(17.40, 78.50), 300.0),
            ],
        )
    }

    fn service_at(clock: ManualClock, catalog: InMemoryCatalog) -> MatchService {
        MatchService::with_parts(
            Arc::new(catalog),
            &EngineConfig::default(),
            Arc::new(clock),
            Arc::new(UniformJitter),
        )
    }

    fn manual_clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap())
    }

    #[test]
    fn search_misses_then_hits_the_cache() {
        let clock = manual_clock();
        let service = service_at(clock.clone(), cement_catalog());
        let material = MaterialId("cement".to_owned());

        let first = service.search(ORIGIN, &material, 50.0).expect("first search");
        assert!(!first.provenance.cache_hit);
        assert_eq!(first.provenance.cache_age_seconds, None);
        assert_eq!(first.payload.suppliers.len(), 2);
        assert_eq!(
            first.payload.recommended.as_ref().map(|s| s.record.supplier_id.0.as_str()),
            Some("SUP-CEM-001")
        );

        clock.advance(Duration::seconds(120));
        let second = service.search(ORIGIN, &material, 50.0).expect("second search");
        assert!(second.provenance.cache_hit);
        assert_eq!(second.provenance.cache_age_seconds, Some(120));
        assert_eq!(second.payload, first.payload);
        assert_ne!(second.provenance.request_id, first.provenance.request_id);
    }

    #[test]
    fn search_cache_expires_after_the_ttl() {
        let clock = manual_clock();
        let service = service_at(clock.clone(), cement_catalog());
        let material = MaterialId("cement".to_owned());

        service.search(ORIGIN, &material, 50.0).expect("prime cache");
        clock.advance(Duration::hours(25));
        let fresh = service.search(ORIGIN, &material, 50.0).expect("recompute");
        assert!(!fresh.provenance.cache_hit);
    }

    #[test]
    fn different_quantities_occupy_different_cache_entries() {
        let clock = manual_clock();
        let service = service_at(clock.clone(), cement_catalog());
        let material = MaterialId("cement".to_owned());

        service.search(ORIGIN, &material, 50.0).expect("fifty tons");
        service.search(ORIGIN, &material, 80.0).expect("eighty tons");
        assert_eq!(service.cache_stats().total_entries, 2);
    }

    #[test]
    fn quantity_validation_precedes_any_cache_write() {
        let clock = manual_clock();
        let service = service_at(clock.clone(), cement_catalog());
        let material = MaterialId("cement".to_owned());

        let error = service.search(ORIGIN, &material, 0.0).expect_err("zero quantity");
        assert_eq!(error, MatchError::InvalidQuantity(0.0));
        let error = service.get_quote(
            &SupplierId("SUP-CEM-001".to_owned()),
            &material,
            -2.0,
        );
        assert_eq!(error.expect_err("negative quantity"), MatchError::InvalidQuantity(-2.0));
        assert_eq!(service.cache_stats().total_entries, 0);
    }

    #[test]
    fn unknown_material_is_not_cached() {
        let clock = manual_clock();
        let service = service_at(clock.clone(), cement_catalog());

        let error = service
            .search(ORIGIN, &MaterialId("plutonium".to_owned()), 10.0)
            .expect_err("unknown material");
        assert_eq!(error, MatchError::UnknownMaterial("plutonium".to_owned()));
        assert_eq!(service.cache_stats().total_entries, 0);
    }

    #[test]
    fn cached_quotes_keep_identical_asks_price_consistent() {
        let clock = manual_clock();
        let service = service_at(clock.clone(), cement_catalog());
        let material = MaterialId("cement".to_owned());
        let supplier_id = SupplierId("SUP-CEM-001".to_owned());

        let first = service.get_quote(&supplier_id, &material, 50.0).expect("first quote");
        assert!((6732.0..=6936.0).contains(&first.payload.unit_price));

        clock.advance(Duration::minutes(5));
        let second = service.get_quote(&supplier_id, &material, 50.0).expect("second quote");
        assert!(second.provenance.cache_hit);
        // Same ask within the TTL sees the same jittered price.
        assert_eq!(second.payload.unit_price, first.payload.unit_price);
        assert_eq!(second.payload.quote_id, first.payload.quote_id);

        clock.advance(Duration::hours(25));
        let third = service.get_quote(&supplier_id, &material, 50.0).expect("third quote");
        assert!(!third.provenance.cache_hit);
    }

    #[test]
    fn quote_for_unknown_supplier_fails_precisely() {
        let clock = manual_clock();
        let service = service_at(clock.clone(), cement_catalog());

        let error = service
            .get_quote(
                &SupplierId("SUP-404".to_owned()),
                &MaterialId("cement".to_owned()),
                10.0,
            )
            .expect_err("unknown supplier");
        assert!(matches!(error, MatchError::UnknownSupplier { .. }));
    }

    #[test]
    fn route_bundle_reports_quality_and_emissions() {
        let clock = manual_clock();
        let service = service_at(clock.clone(), cement_catalog());

        let destination = Coordinate::new(17.3345, 78.4512);
        let bundle = service.get_route(ORIGIN, destination, 50.0).expect("route");

        assert_eq!(bundle.payload.distance_km, 0.28);
        assert_eq!(bundle.payload.quality, RouteQuality::Optimal);
        assert_eq!(bundle.payload.co2_kg, 0.84);
        assert_eq!(bundle.provenance.sources.len(), 3);
    }

    #[test]
    fn out_of_stock_catalog_searches_to_a_flagged_empty_plan() {
        let clock = manual_clock();
        let catalog = InMemoryCatalog::new().with_material(
            "cement",
            vec![supplier("SUP-CEM-001", Coordinate::new(17.3345, 78.4512), 0.0)],
        );
        let service = service_at(clock.clone(), catalog);

        let bundle = service
            .search(ORIGIN, &MaterialId("cement".to_owned()), 50.0)
            .expect("search succeeds without stock");
        assert!(bundle.payload.recommended.is_none());
        assert!(bundle.payload.plan.allocations.is_empty());
        assert!(!bundle.payload.plan.fulfilled);
        assert_eq!(bundle.payload.suppliers.len(), 1);
    }

    #[test]
    fn sweep_clears_expired_entries_across_caches() {
        let clock = manual_clock();
        let service = service_at(clock.clone(), cement_catalog());
        let material = MaterialId("cement".to_owned());

        service.search(ORIGIN, &material, 50.0).expect("search");
        service
            .get_quote(&SupplierId("SUP-CEM-001".to_owned()), &material, 50.0)
            .expect("quote");
        service
            .get_route(ORIGIN, Coordinate::new(17.3345, 78.4512), 50.0)
            .expect("route");
        assert_eq!(service.cache_stats().total_entries, 3);

        clock.advance(Duration::hours(25));
        assert_eq!(service.sweep_expired(), 3);
        assert_eq!(service.cache_stats().total_entries, 0);
    }
}
