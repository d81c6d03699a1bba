use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::plan::{Allocation, FulfillmentPlan};
use crate::domain::supplier::{Coordinate, MaterialId, RankedSupplier, SupplierRecord};
use crate::errors::MatchError;
use crate::geo::{round2, DistanceCalculator};

/// Ranked candidates together with the fulfillment plan derived from them.
///
/// `recommended` is absent when every candidate is out of stock; callers that
/// need a hard failure for that case use [`RankingEngine::recommend`], which
/// reports `NoStockAvailable`. The search result keeps the ranked list and
/// the flagged empty plan either way.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankingOutcome {
    pub ranked: Vec<RankedSupplier>,
    pub plan: FulfillmentPlan,
    pub recommended: Option<RankedSupplier>,
}

// Allocations below this are float noise, not a real share.
const MIN_ALLOCATION_TONS: f64 = 1e-9;

/// Ranks suppliers for an origin and derives single- or split-supplier
/// fulfillment plans.
#[derive(Debug)]
pub struct RankingEngine {
    distance: Arc<DistanceCalculator>,
}

impl RankingEngine {
    pub fn new(distance: Arc<DistanceCalculator>) -> Self {
        Self { distance }
    }

    /// Enrich candidates with distance from `origin`, sort them by the fixed
    /// criteria order (distance, then unit price, then lead time; catalog
    /// order breaks remaining ties), and walk the ranking to allocate the
    /// requested quantity.
    pub fn rank_and_plan(
        &self,
        material_id: &MaterialId,
        candidates: &[SupplierRecord],
        origin: Coordinate,
        requested_tons: f64,
    ) -> Result<RankingOutcome, MatchError> {
        if requested_tons <= 0.0 {
            return Err(MatchError::InvalidQuantity(requested_tons));
        }
        if candidates.is_empty() {
            return Err(MatchError::NoSuppliersForMaterial(material_id.0.clone()));
        }

        let mut ranked: Vec<RankedSupplier> = candidates
            .iter()
            .map(|record| RankedSupplier {
                distance_km: self.distance.distance(origin, record.location),
                record: record.clone(),
            })
            .collect();

        // Stable sort keeps catalog order for full ties, so identical inputs
        // always produce identical rankings.
        ranked.sort_by(|a, b| {
            a.distance_km
                .total_cmp(&b.distance_km)
                .then(a.record.unit_price.total_cmp(&b.record.unit_price))
                .then(a.record.lead_time_days.cmp(&b.record.lead_time_days))
        });

        let plan = build_plan(&ranked, requested_tons);
        let recommended = ranked.iter().find(|s| s.record.stock_tons > 0.0).cloned();

        Ok(RankingOutcome { ranked, plan, recommended })
    }

    /// First ranked supplier with stock on hand.
    pub fn recommend<'a>(
        &self,
        material_id: &MaterialId,
        ranked: &'a [RankedSupplier],
    ) -> Result<&'a RankedSupplier, MatchError> {
        ranked
            .iter()
            .find(|s| s.record.stock_tons > 0.0)
            .ok_or_else(|| MatchError::NoStockAvailable(material_id.0.clone()))
    }
}

fn build_plan(ranked: &[RankedSupplier], requested_tons: f64) -> FulfillmentPlan {
    let mut allocations = Vec::new();
    let mut remaining = requested_tons;

    for supplier in ranked {
        if remaining <= MIN_ALLOCATION_TONS {
            break;
        }
        let available = supplier.record.stock_tons;
        if available <= 0.0 {
            continue;
        }
        let allocated = available.min(remaining);
        allocations.push(Allocation {
            supplier_id: supplier.record.supplier_id.clone(),
            allocated_tons: round2(allocated),
            estimated_cost: round2(allocated * supplier.record.unit_price),
        });
        remaining -= allocated;
    }

    FulfillmentPlan { requested_tons, allocations, fulfilled: remaining <= MIN_ALLOCATION_TONS }
}
