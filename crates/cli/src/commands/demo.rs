use std::path::PathBuf;

use anyhow::Context;
use quarry_core::{Coordinate, MaterialId};

/// Search for suppliers, quote the recommendation, and route to it,
/// printing each bundle as pretty JSON.
pub fn run(
    config_path: Option<PathBuf>,
    material: &str,
    quantity: f64,
    latitude: f64,
    longitude: f64,
) -> anyhow::Result<()> {
    let (_config, _catalog, service) = super::build_service(config_path)?;
    let origin = Coordinate::new(latitude, longitude);
    let material_id = MaterialId(material.to_owned());

    let search = service
        .search(origin, &material_id, quantity)
        .with_context(|| format!("searching suppliers for `{material}`"))?;
    println!("== supplier search ==");
    println!("{}", serde_json::to_string_pretty(&search)?);

    let Some(recommended) = search.payload.recommended.clone() else {
        println!("== no stocked supplier to quote ==");
        return Ok(());
    };

    let quote = service
        .get_quote(&recommended.record.supplier_id, &material_id, quantity)
        .with_context(|| {
            format!("quoting supplier `{}`", recommended.record.supplier_id.0)
        })?;
    println!("== quote ==");
    println!("{}", serde_json::to_string_pretty(&quote)?);

    let route = service
        .get_route(origin, recommended.record.location, quantity)
        .context("routing to the recommended supplier")?;
    println!("== route ==");
    println!("{}", serde_json::to_string_pretty(&route)?);

    Ok(())
}
