use std::sync::Arc;

use quarry_catalog::{CatalogError, FileCatalog};
use quarry_core::config::AppConfig;
use quarry_core::{MatchService, SupplierCatalog};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub service: Arc<MatchService>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("catalog load failed: {0}")]
    Catalog(#[from] CatalogError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        data_dir = %config.catalog.data_dir.display(),
        "starting application bootstrap"
    );

    let catalog = FileCatalog::load(&config.catalog.data_dir)?;
    info!(
        event_name = "system.bootstrap.catalog_loaded",
        materials = catalog.materials().len(),
        "supplier catalog loaded"
    );

    let service = Arc::new(MatchService::new(Arc::new(catalog), &config.engine));
    Ok(Application { config, service })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use quarry_core::config::{AppConfig, LoadOptions};

    use super::bootstrap_with_config;

    #[test]
    fn bootstrap_builds_a_service_over_the_data_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("cement_suppliers.json"),
            r#"{
  "material_id": "cement",
  "material_name": "Portland Cement (OPC 53)",
  "suppliers": [
    {
      "supplier_id": "SUP-CEM-001",
      "name": "Bandlaguda Cement Depot",
      "stock_tons": 500.0,
      "unit_price": 6800.0,
      "lead_time_days": 2,
      "latitude": 17.3345,
      "longitude": 78.4512,
      "address": "Bandlaguda Jagir, Hyderabad",
      "rating": 4.5
    }
  ]
}"#,
        )
        .expect("write cement file");

        let mut config = AppConfig::load(LoadOptions::default()).expect("default config");
        config.catalog.data_dir = dir.path().to_path_buf();

        let app = bootstrap_with_config(config).expect("bootstrap");
        assert_eq!(app.service.materials().len(), 1);
    }
}
