use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::supplier::{MaterialId, SupplierId};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteId(pub String);

/// A priced offer from one supplier, immutable once returned.
///
/// The unit price carries the market jitter applied at issue time, so two
/// quotes for the same supplier and quantity may legitimately differ.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub quote_id: QuoteId,
    pub supplier_id: SupplierId,
    pub material_id: MaterialId,
    pub quantity_tons: f64,
    pub unit_price: f64,
    pub total_price: f64,
    pub valid_until: DateTime<Utc>,
    pub notes: String,
}
