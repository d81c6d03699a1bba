use serde::{Deserialize, Serialize};

/// Geographic point in decimal degrees.
///
/// Latitude is expected in [-90, 90] and longitude in [-180, 180]; range
/// enforcement is the responsibility of the boundary layer constructing the
/// value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SupplierId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialId(pub String);

impl MaterialId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One supplier's listing for a single material.
///
/// Owned by the catalog, read-only to the engines, never mutated after load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SupplierRecord {
    pub supplier_id: SupplierId,
    pub name: String,
    pub material_id: MaterialId,
    pub material_name: String,
    pub stock_tons: f64,
    pub unit_price: f64,
    pub lead_time_days: u32,
    pub location: Coordinate,
    pub address: String,
    pub rating: f64,
}

/// A supplier record enriched with its distance from a request origin.
///
/// Derived per request (the distance depends on the origin) and only ever
/// cached as part of a full response bundle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedSupplier {
    #[serde(flatten)]
    pub record: SupplierRecord,
    pub distance_km: f64,
}
