use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::route::{RouteId, RouteQuality, RouteResult};
use crate::domain::supplier::Coordinate;
use crate::geo::{round2, DistanceCalculator};

/// Urban/semi-urban truck speed used for duration estimates.
pub const DEFAULT_AVERAGE_SPEED_KMH: f64 = 40.0;
/// Heavy-truck transport emission factor, kg CO₂ per ton-km.
pub const DEFAULT_EMISSION_FACTOR_KG_PER_TON_KM: f64 = 0.06;

/// Estimates delivery routes: distance, duration, ETA, and emissions.
#[derive(Debug)]
pub struct RouteEngine {
    distance: Arc<DistanceCalculator>,
    average_speed_kmh: f64,
    emission_factor_kg_per_ton_km: f64,
}

impl RouteEngine {
    pub fn new(
        distance: Arc<DistanceCalculator>,
        average_speed_kmh: f64,
        emission_factor_kg_per_ton_km: f64,
    ) -> Self {
        Self { distance, average_speed_kmh, emission_factor_kg_per_ton_km }
    }

    /// Route estimate for moving `quantity_tons` from `origin` to
    /// `destination`. A zero quantity yields zero emissions. Coordinate
    /// validity is the caller's responsibility.
    pub fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        quantity_tons: f64,
        issued_at: DateTime<Utc>,
    ) -> RouteResult {
        let distance_km = self.distance.distance(origin, destination);
        let duration_minutes =
            (distance_km / self.average_speed_kmh * 60.0).round().max(0.0) as u32;
        let co2_kg = round2(quantity_tons * distance_km * self.emission_factor_kg_per_ton_km);

        RouteResult {
            route_id: generate_route_id(issued_at),
            origin,
            destination,
            distance_km,
            duration_minutes,
            eta: issued_at + Duration::minutes(i64::from(duration_minutes)),
            co2_kg,
            quality: RouteQuality::from_distance_km(distance_km),
        }
    }
}

fn generate_route_id(issued_at: DateTime<Utc>) -> RouteId {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(6).collect();
    RouteId(format!("ROUTE-{}-{}", issued_at.format("%Y%m%d"), suffix))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};

    use crate::domain::route::RouteQuality;
    use crate::domain::supplier::Coordinate;
    use crate::geo::DistanceCalculator;

    use super::{RouteEngine, DEFAULT_AVERAGE_SPEED_KMH, DEFAULT_EMISSION_FACTOR_KG_PER_TON_KM};

    const BANDLAGUDA_ORIGIN: Coordinate = Coordinate { latitude: 17.3352, longitude: 78.4537 };
    const CEMENT_DEPOT: Coordinate = Coordinate { latitude: 17.3345, longitude: 78.4512 };

    fn engine() -> RouteEngine {
        RouteEngine::new(
            Arc::new(DistanceCalculator::default()),
            DEFAULT_AVERAGE_SPEED_KMH,
            DEFAULT_EMISSION_FACTOR_KG_PER_TON_KM,
        )
    }

    #[test]
    fn short_hop_is_optimal_with_expected_emissions() {
        let issued_at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let route = engine().route(BANDLAGUDA_ORIGIN, CEMENT_DEPOT, 50.0, issued_at);

        assert_eq!(route.distance_km, 0.28);
        assert_eq!(route.quality, RouteQuality::Optimal);
        // 50 t × 0.28 km × 0.06 kg/t-km
        assert_eq!(route.co2_kg, 0.84);
        assert!(route.route_id.0.starts_with("ROUTE-20260301-"));
    }

    #[test]
    fn duration_rounds_to_the_nearest_minute() {
        let issued_at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let route = engine().route(BANDLAGUDA_ORIGIN, CEMENT_DEPOT, 50.0, issued_at);

        // 0.28 km at 40 km/h is 0.42 minutes.
        assert_eq!(route.duration_minutes, 0);
        assert_eq!(route.eta, issued_at);

        let farther = Coordinate::new(17.50, 78.60);
        let long_route = engine().route(BANDLAGUDA_ORIGIN, farther, 10.0, issued_at);
        let expected = (long_route.distance_km / 40.0 * 60.0).round() as u32;
        assert_eq!(long_route.duration_minutes, expected);
        assert_eq!(
            long_route.eta,
            issued_at + Duration::minutes(i64::from(long_route.duration_minutes))
        );
    }

    #[test]
    fn zero_quantity_yields_zero_emissions() {
        let issued_at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let route = engine().route(BANDLAGUDA_ORIGIN, CEMENT_DEPOT, 0.0, issued_at);
        assert_eq!(route.co2_kg, 0.0);
    }

    #[test]
    fn quality_degrades_with_distance() {
        let issued_at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();

        let mid = Coordinate::new(17.45, 78.55);
        let mid_route = engine().route(BANDLAGUDA_ORIGIN, mid, 10.0, issued_at);
        assert_eq!(mid_route.quality, RouteQuality::Good);

        let far = Coordinate::new(17.80, 78.90);
        let far_route = engine().route(BANDLAGUDA_ORIGIN, far, 10.0, issued_at);
        assert_eq!(far_route.quality, RouteQuality::Fair);
    }
}
