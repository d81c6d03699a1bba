use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::supplier::Coordinate;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteId(pub String);

/// Qualitative label for a delivery route, banded on distance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteQuality {
    Optimal,
    Good,
    Fair,
}

impl RouteQuality {
    /// Bands are inclusive on their lower bound: [0, 10) optimal,
    /// [10, 30) good, [30, ∞) fair.
    pub fn from_distance_km(distance_km: f64) -> Self {
        if distance_km < 10.0 {
            Self::Optimal
        } else if distance_km < 30.0 {
            Self::Good
        } else {
            Self::Fair
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Optimal => "optimal",
            Self::Good => "good",
            Self::Fair => "fair",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub route_id: RouteId,
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub distance_km: f64,
    pub duration_minutes: u32,
    pub eta: DateTime<Utc>,
    pub co2_kg: f64,
    pub quality: RouteQuality,
}

#[cfg(test)]
mod tests {
    use super::RouteQuality;

    #[test]
    fn quality_bands_are_inclusive_on_the_lower_bound() {
        assert_eq!(RouteQuality::from_distance_km(0.0), RouteQuality::Optimal);
        assert_eq!(RouteQuality::from_distance_km(9.99), RouteQuality::Optimal);
        assert_eq!(RouteQuality::from_distance_km(10.0), RouteQuality::Good);
        assert_eq!(RouteQuality::from_distance_km(29.99), RouteQuality::Good);
        assert_eq!(RouteQuality::from_distance_km(30.0), RouteQuality::Fair);
        assert_eq!(RouteQuality::from_distance_km(120.0), RouteQuality::Fair);
    }

    #[test]
    fn quality_serializes_as_lowercase_label() {
        let json = serde_json::to_string(&RouteQuality::Optimal).expect("serialize quality");
        assert_eq!(json, "\"optimal\"");
    }
}
