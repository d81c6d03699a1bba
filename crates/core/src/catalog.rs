use std::collections::BTreeMap;

use crate::domain::supplier::{MaterialId, SupplierId, SupplierRecord};
use crate::errors::MatchError;

/// Read-only supplier catalog, the engine's single external collaborator.
///
/// Implementations must return a stable, deterministically ordered list for
/// identical material ids across calls within a process lifetime.
pub trait SupplierCatalog: Send + Sync {
    /// Full supplier list for a material. A recognized material with no
    /// suppliers yields an empty list; an unrecognized one is
    /// `UnknownMaterial`.
    fn list_suppliers(&self, material_id: &MaterialId) -> Result<Vec<SupplierRecord>, MatchError>;

    /// All materials the catalog can answer for, deterministically ordered.
    fn materials(&self) -> Vec<MaterialId>;

    fn supplier(
        &self,
        material_id: &MaterialId,
        supplier_id: &SupplierId,
    ) -> Result<SupplierRecord, MatchError> {
        self.list_suppliers(material_id)?
            .into_iter()
            .find(|record| &record.supplier_id == supplier_id)
            .ok_or_else(|| MatchError::UnknownSupplier {
                material_id: material_id.0.clone(),
                supplier_id: supplier_id.0.clone(),
            })
    }
}

/// Catalog backed by a map, used by tests and the demo driver.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCatalog {
    suppliers: BTreeMap<String, Vec<SupplierRecord>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_material(
        mut self,
        material_id: impl Into<String>,
        suppliers: Vec<SupplierRecord>,
    ) -> Self {
        self.suppliers.insert(material_id.into(), suppliers);
        self
    }
}

impl SupplierCatalog for InMemoryCatalog {
    fn list_suppliers(&self, material_id: &MaterialId) -> Result<Vec<SupplierRecord>, MatchError> {
        self.suppliers
            .get(material_id.as_str())
            .cloned()
            .ok_or_else(|| MatchError::UnknownMaterial(material_id.0.clone()))
    }

    fn materials(&self) -> Vec<MaterialId> {
        self.suppliers.keys().map(|id| MaterialId(id.clone())).collect()
    }
}
