pub mod config;
pub mod demo;
pub mod materials;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use quarry_catalog::FileCatalog;
use quarry_core::config::{AppConfig, LoadOptions};
use quarry_core::{MatchService, SupplierCatalog};

/// Load config and stand up an in-process service over the data directory.
pub(crate) fn build_service(
    config_path: Option<PathBuf>,
) -> anyhow::Result<(AppConfig, Arc<FileCatalog>, MatchService)> {
    let config = load_config(config_path)?;
    let catalog = Arc::new(FileCatalog::load(&config.catalog.data_dir).with_context(|| {
        format!("loading supplier catalog from `{}`", config.catalog.data_dir.display())
    })?);
    let service =
        MatchService::new(Arc::clone(&catalog) as Arc<dyn SupplierCatalog>, &config.engine);
    Ok((config, catalog, service))
}

pub(crate) fn load_config(config_path: Option<PathBuf>) -> anyhow::Result<AppConfig> {
    AppConfig::load(LoadOptions { config_path }).context("loading configuration")
}
