use thiserror::Error;

/// Per-request failure kinds of the matching engine.
///
/// None of these are fatal to the process; each renders a precise message a
/// caller can surface directly. Partial fulfillment is deliberately NOT an
/// error — it is signaled on the plan itself.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MatchError {
    #[error("requested quantity must be positive, got {0}")]
    InvalidQuantity(f64),
    #[error("base unit price must be positive, got {0}")]
    InvalidPrice(f64),
    #[error("unknown material `{0}`")]
    UnknownMaterial(String),
    #[error("no suppliers listed for material `{0}`")]
    NoSuppliersForMaterial(String),
    #[error("all suppliers for material `{0}` are out of stock")]
    NoStockAvailable(String),
    #[error("unknown supplier `{supplier_id}` for material `{material_id}`")]
    UnknownSupplier { material_id: String, supplier_id: String },
}

impl MatchError {
    /// Stable machine-readable code for boundary layers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidQuantity(_) => "invalid_quantity",
            Self::InvalidPrice(_) => "invalid_price",
            Self::UnknownMaterial(_) => "unknown_material",
            Self::NoSuppliersForMaterial(_) => "no_suppliers_for_material",
            Self::NoStockAvailable(_) => "no_stock_available",
            Self::UnknownSupplier { .. } => "unknown_supplier",
        }
    }
}
