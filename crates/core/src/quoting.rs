use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::domain::quote::{Quote, QuoteId};
use crate::domain::supplier::SupplierRecord;
use crate::errors::MatchError;
use crate::geo::round2;

/// Multiplicative perturbation applied to a base price.
///
/// Quoting is intentionally nondeterministic: every draw simulates market
/// fluctuation, so two quotes for the same supplier and quantity may differ.
/// Tests inject [`FixedJitter`] for reproducible prices.
pub trait JitterSource: Send + Sync {
    /// Draw a factor in `[min_factor, max_factor]`.
    fn draw(&self, min_factor: f64, max_factor: f64) -> f64;
}

/// Uniform draw over the configured factor range.
#[derive(Clone, Copy, Debug, Default)]
pub struct UniformJitter;

impl JitterSource for UniformJitter {
    fn draw(&self, min_factor: f64, max_factor: f64) -> f64 {
        rand::thread_rng().gen_range(min_factor..=max_factor)
    }
}

/// Constant factor for deterministic tests.
#[derive(Clone, Copy, Debug)]
pub struct FixedJitter(pub f64);

impl JitterSource for FixedJitter {
    fn draw(&self, _min_factor: f64, _max_factor: f64) -> f64 {
        self.0
    }
}

/// Price jitter bounds as multiplicative factors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JitterRange {
    pub min_factor: f64,
    pub max_factor: f64,
}

impl Default for JitterRange {
    fn default() -> Self {
        // -1% to +2%, mirroring typical short-term market movement.
        Self { min_factor: 0.99, max_factor: 1.02 }
    }
}

pub const DEFAULT_QUOTE_VALIDITY_HOURS: i64 = 48;

/// Produces jittered quotes with a fixed validity window.
pub struct QuoteEngine {
    jitter_range: JitterRange,
    validity_hours: i64,
    jitter: Arc<dyn JitterSource>,
}

impl QuoteEngine {
    pub fn new(jitter_range: JitterRange, validity_hours: i64, jitter: Arc<dyn JitterSource>) -> Self {
        Self { jitter_range, validity_hours, jitter }
    }

    /// Quote `quantity_tons` of the supplier's material at its jittered unit
    /// price. `issued_at` stamps the quote id and starts the validity window.
    pub fn quote(
        &self,
        supplier: &SupplierRecord,
        quantity_tons: f64,
        issued_at: DateTime<Utc>,
    ) -> Result<Quote, MatchError> {
        if quantity_tons <= 0.0 {
            return Err(MatchError::InvalidQuantity(quantity_tons));
        }
        if supplier.unit_price <= 0.0 {
            return Err(MatchError::InvalidPrice(supplier.unit_price));
        }

        let factor = self.jitter.draw(self.jitter_range.min_factor, self.jitter_range.max_factor);
        let unit_price = round2(supplier.unit_price * factor);
        let total_price = round2(unit_price * quantity_tons);

        Ok(Quote {
            quote_id: generate_quote_id(issued_at),
            supplier_id: supplier.supplier_id.clone(),
            material_id: supplier.material_id.clone(),
            quantity_tons,
            unit_price,
            total_price,
            valid_until: issued_at + Duration::hours(self.validity_hours),
            notes: format!(
                "Price includes GST. Delivery in {} days. Subject to availability.",
                supplier.lead_time_days
            ),
        })
    }
}

fn generate_quote_id(issued_at: DateTime<Utc>) -> QuoteId {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(6).collect();
    QuoteId(format!("QUO-{}-{}", issued_at.format("%Y%m%d"), suffix))
}
