use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use quarry_core::{
    Coordinate, MatchError, MaterialId, SupplierCatalog, SupplierId, SupplierRecord,
};

/// Canonical material ids and their on-disk file names.
const MATERIAL_FILES: &[(&str, &str)] = &[
    ("cement", "cement_suppliers.json"),
    ("sand", "sand_suppliers.json"),
    ("aggregate", "aggregate_suppliers.json"),
    ("bricks", "bricks_suppliers.json"),
];

/// Requestable aliases resolved onto canonical material ids.
const MATERIAL_ALIASES: &[(&str, &str)] = &[
    ("cement_opc_53", "cement"),
    ("sand_river", "sand"),
    ("aggregate_20mm", "aggregate"),
    ("gravel", "aggregate"),
    ("bricks_red", "bricks"),
];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: serde_json::Error },
    #[error("catalog file `{path}` declares material `{found}`, expected `{expected}`")]
    MaterialMismatch { path: PathBuf, expected: String, found: String },
    #[error("invalid supplier record `{supplier_id}` in `{path}`: {reason}")]
    InvalidRecord { path: PathBuf, supplier_id: String, reason: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    material_id: String,
    material_name: String,
    suppliers: Vec<SupplierSeed>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SupplierSeed {
    supplier_id: String,
    name: String,
    stock_tons: f64,
    unit_price: f64,
    lead_time_days: u32,
    latitude: f64,
    longitude: f64,
    address: String,
    rating: f64,
}

/// Supplier catalog loaded once from a directory of mock JSON files.
///
/// File order is preserved, so supplier lists are stable and
/// deterministically ordered for the process lifetime. Requests may use
/// canonical material ids or any known alias, case-insensitively.
#[derive(Clone, Debug)]
pub struct FileCatalog {
    suppliers: BTreeMap<String, Vec<SupplierRecord>>,
}

impl FileCatalog {
    pub fn load(data_dir: &Path) -> Result<Self, CatalogError> {
        let mut suppliers = BTreeMap::new();

        for (material_id, file_name) in MATERIAL_FILES {
            let path = data_dir.join(file_name);
            if !path.exists() {
                warn!(
                    event_name = "catalog.file_missing",
                    material = material_id,
                    path = %path.display(),
                    "supplier data file missing, material will be unavailable"
                );
                continue;
            }

            let records = load_material_file(&path, material_id)?;
            info!(
                event_name = "catalog.material_loaded",
                material = material_id,
                suppliers = records.len(),
                "supplier data file loaded"
            );
            suppliers.insert((*material_id).to_owned(), records);
        }

        Ok(Self { suppliers })
    }

    fn resolve(&self, requested: &str) -> Option<&str> {
        let requested = requested.to_lowercase();
        if let Some((canonical, _)) = self.suppliers.get_key_value(requested.as_str()) {
            return Some(canonical.as_str());
        }
        MATERIAL_ALIASES
            .iter()
            .find(|(alias, _)| *alias == requested)
            .and_then(|(_, canonical)| self.suppliers.get_key_value(*canonical))
            .map(|(canonical, _)| canonical.as_str())
    }
}

impl SupplierCatalog for FileCatalog {
    fn list_suppliers(&self, material_id: &MaterialId) -> Result<Vec<SupplierRecord>, MatchError> {
        self.resolve(material_id.as_str())
            .and_then(|canonical| self.suppliers.get(canonical))
            .cloned()
            .ok_or_else(|| MatchError::UnknownMaterial(material_id.0.clone()))
    }

    fn materials(&self) -> Vec<MaterialId> {
        self.suppliers.keys().map(|id| MaterialId(id.clone())).collect()
    }
}

fn load_material_file(path: &Path, material_id: &str) -> Result<Vec<SupplierRecord>, CatalogError> {
    let contents = fs::read_to_string(path)
        .map_err(|source| CatalogError::ReadFile { path: path.to_path_buf(), source })?;
    let file: CatalogFile = serde_json::from_str(&contents)
        .map_err(|source| CatalogError::ParseFile { path: path.to_path_buf(), source })?;

    if file.material_id != material_id {
        return Err(CatalogError::MaterialMismatch {
            path: path.to_path_buf(),
            expected: material_id.to_owned(),
            found: file.material_id,
        });
    }

    let mut records = Vec::with_capacity(file.suppliers.len());
    let mut seen_ids = Vec::with_capacity(file.suppliers.len());
    for seed in file.suppliers {
        validate_seed(path, &seed)?;
        if seen_ids.contains(&seed.supplier_id) {
            return Err(CatalogError::InvalidRecord {
                path: path.to_path_buf(),
                supplier_id: seed.supplier_id,
                reason: "duplicate supplier id".to_owned(),
            });
        }
        seen_ids.push(seed.supplier_id.clone());

        records.push(SupplierRecord {
            supplier_id: SupplierId(seed.supplier_id),
            name: seed.name,
            material_id: MaterialId(material_id.to_owned()),
            material_name: file.material_name.clone(),
            stock_tons: seed.stock_tons,
            unit_price: seed.unit_price,
            lead_time_days: seed.lead_time_days,
            location: Coordinate::new(seed.latitude, seed.longitude),
            address: seed.address,
            rating: seed.rating,
        });
    }

    Ok(records)
}

fn validate_seed(path: &Path, seed: &SupplierSeed) -> Result<(), CatalogError> {
    let invalid = |reason: String| CatalogError::InvalidRecord {
        path: path.to_path_buf(),
        supplier_id: seed.supplier_id.clone(),
        reason,
    };

    if !(-90.0..=90.0).contains(&seed.latitude) {
        return Err(invalid(format!("latitude {} out of range", seed.latitude)));
    }
    if !(-180.0..=180.0).contains(&seed.longitude) {
        return Err(invalid(format!("longitude {} out of range", seed.longitude)));
    }
    if seed.stock_tons < 0.0 {
        return Err(invalid(format!("stock {} is negative", seed.stock_tons)));
    }
    if seed.unit_price <= 0.0 {
        return Err(invalid(format!("unit price {} must be positive", seed.unit_price)));
    }
    if !(0.0..=5.0).contains(&seed.rating) {
        return Err(invalid(format!("rating {} out of range", seed.rating)));
    }
    Ok(())
}
