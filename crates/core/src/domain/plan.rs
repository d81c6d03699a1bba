use serde::{Deserialize, Serialize};

use crate::domain::supplier::SupplierId;

/// One supplier's share of a fulfillment plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub supplier_id: SupplierId,
    pub allocated_tons: f64,
    pub estimated_cost: f64,
}

/// Allocation of a requested quantity across ranked suppliers.
///
/// Invariants: each allocation stays within its supplier's stock, suppliers
/// appear in ranked order, and no supplier appears twice. When total stock
/// cannot cover the request the plan sums to the available stock and
/// `fulfilled` is false; an under-covered request is a signaled condition on
/// the plan, never an error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FulfillmentPlan {
    pub requested_tons: f64,
    pub allocations: Vec<Allocation>,
    pub fulfilled: bool,
}

impl FulfillmentPlan {
    pub fn allocated_tons(&self) -> f64 {
        self.allocations.iter().map(|allocation| allocation.allocated_tons).sum()
    }

    pub fn shortfall_tons(&self) -> f64 {
        (self.requested_tons - self.allocated_tons()).max(0.0)
    }

    /// True when fulfillment is split across more than one supplier.
    pub fn is_split(&self) -> bool {
        self.allocations.len() > 1
    }
}
