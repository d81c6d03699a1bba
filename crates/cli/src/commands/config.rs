use std::path::PathBuf;

pub fn run(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;

    println!("[engine]");
    println!("source_mode = {:?}", config.engine.source_mode);
    println!("jitter_min_factor = {}", config.engine.jitter.min_factor);
    println!("jitter_max_factor = {}", config.engine.jitter.max_factor);
    println!("quote_validity_hours = {}", config.engine.quote_validity_hours);
    println!("cache_ttl_hours = {}", config.engine.cache_ttl_hours);
    println!("distance_memo_capacity = {}", config.engine.distance_memo_capacity);
    println!("average_speed_kmh = {}", config.engine.average_speed_kmh);
    println!(
        "emission_factor_kg_per_ton_km = {}",
        config.engine.emission_factor_kg_per_ton_km
    );
    println!();
    println!("[catalog]");
    println!("data_dir = {}", config.catalog.data_dir.display());
    println!();
    println!("[server]");
    println!("bind_address = {}", config.server.bind_address);
    println!("port = {}", config.server.port);
    println!("simulate_latency = {}", config.server.simulate_latency);
    println!("min_latency_ms = {}", config.server.min_latency_ms);
    println!("max_latency_ms = {}", config.server.max_latency_ms);
    println!();
    println!("[logging]");
    println!("level = {}", config.logging.level);
    println!("format = {:?}", config.logging.format);

    Ok(())
}
