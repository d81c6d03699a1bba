use std::path::PathBuf;

use quarry_core::SupplierCatalog;

pub fn run(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let (_config, catalog, _service) = super::build_service(config_path)?;

    for material_id in catalog.materials() {
        let suppliers = catalog.list_suppliers(&material_id)?;
        let stocked = suppliers.iter().filter(|s| s.stock_tons > 0.0).count();
        println!(
            "{:<12} {} suppliers ({} with stock)",
            material_id.0,
            suppliers.len(),
            stocked
        );
    }
    Ok(())
}
