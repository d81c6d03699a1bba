use std::env;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::cache::DEFAULT_CACHE_TTL_HOURS;
use crate::geo::DistanceCalculator;
use crate::provenance::SourceMode;
use crate::quoting::{JitterRange, DEFAULT_QUOTE_VALIDITY_HOURS};
use crate::routing::{DEFAULT_AVERAGE_SPEED_KMH, DEFAULT_EMISSION_FACTOR_KG_PER_TON_KM};

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub catalog: CatalogConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub source_mode: SourceMode,
    pub jitter: JitterRange,
    pub quote_validity_hours: i64,
    pub cache_ttl_hours: i64,
    pub distance_memo_capacity: usize,
    pub average_speed_kmh: f64,
    pub emission_factor_kg_per_ton_km: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            source_mode: SourceMode::Sandbox,
            jitter: JitterRange::default(),
            quote_validity_hours: DEFAULT_QUOTE_VALIDITY_HOURS,
            cache_ttl_hours: DEFAULT_CACHE_TTL_HOURS,
            distance_memo_capacity: DistanceCalculator::DEFAULT_CAPACITY,
            average_speed_kmh: DEFAULT_AVERAGE_SPEED_KMH,
            emission_factor_kg_per_ton_km: DEFAULT_EMISSION_FACTOR_KG_PER_TON_KM,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CatalogConfig {
    pub data_dir: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self { data_dir: PathBuf::from("data") }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub simulate_latency: bool,
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_owned(),
            port: 8000,
            simulate_latency: false,
            min_latency_ms: 200,
            max_latency_ms: 600,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), format: LogFormat::Compact }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    engine: Option<RawEngine>,
    catalog: Option<RawCatalog>,
    server: Option<RawServer>,
    logging: Option<RawLogging>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEngine {
    source_mode: Option<SourceMode>,
    jitter_min_factor: Option<f64>,
    jitter_max_factor: Option<f64>,
    quote_validity_hours: Option<i64>,
    cache_ttl_hours: Option<i64>,
    distance_memo_capacity: Option<usize>,
    average_speed_kmh: Option<f64>,
    emission_factor_kg_per_ton_km: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCatalog {
    data_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawServer {
    bind_address: Option<String>,
    port: Option<u16>,
    simulate_latency: Option<bool>,
    min_latency_ms: Option<u64>,
    max_latency_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLogging {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl AppConfig {
    /// Defaults, overlaid with the TOML file (explicit path, `QUARRY_CONFIG`,
    /// or `quarry.toml` when present), overlaid with `QUARRY_*` environment
    /// variables, then validated.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let raw = match resolve_config_path(&options) {
            Some(path) => {
                let contents = fs::read_to_string(&path)
                    .map_err(|source| ConfigError::ReadFile { path: path.clone(), source })?;
                toml::from_str::<RawConfig>(&contents)
                    .map_err(|source| ConfigError::ParseFile { path, source })?
            }
            None => RawConfig::default(),
        };

        let mut config = AppConfig::from_raw(raw);
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn from_raw(raw: RawConfig) -> Self {
        let mut config = AppConfig {
            engine: EngineConfig::default(),
            catalog: CatalogConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        };

        if let Some(engine) = raw.engine {
            let target = &mut config.engine;
            assign(&mut target.source_mode, engine.source_mode);
            assign(&mut target.jitter.min_factor, engine.jitter_min_factor);
            assign(&mut target.jitter.max_factor, engine.jitter_max_factor);
            assign(&mut target.quote_validity_hours, engine.quote_validity_hours);
            assign(&mut target.cache_ttl_hours, engine.cache_ttl_hours);
            assign(&mut target.distance_memo_capacity, engine.distance_memo_capacity);
            assign(&mut target.average_speed_kmh, engine.average_speed_kmh);
            assign(
                &mut target.emission_factor_kg_per_ton_km,
                engine.emission_factor_kg_per_ton_km,
            );
        }
        if let Some(catalog) = raw.catalog {
            assign(&mut config.catalog.data_dir, catalog.data_dir);
        }
        if let Some(server) = raw.server {
            let target = &mut config.server;
            assign(&mut target.bind_address, server.bind_address);
            assign(&mut target.port, server.port);
            assign(&mut target.simulate_latency, server.simulate_latency);
            assign(&mut target.min_latency_ms, server.min_latency_ms);
            assign(&mut target.max_latency_ms, server.max_latency_ms);
        }
        if let Some(logging) = raw.logging {
            assign(&mut config.logging.level, logging.level);
            assign(&mut config.logging.format, logging.format);
        }

        config
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("QUARRY_SOURCE_MODE") {
            self.engine.source_mode = match value.as_str() {
                "sandbox" => SourceMode::Sandbox,
                "live" => SourceMode::Live,
                _ => {
                    return Err(ConfigError::InvalidEnvOverride {
                        key: "QUARRY_SOURCE_MODE".to_owned(),
                        value,
                    })
                }
            };
        }
        if let Some(value) = read_env("QUARRY_CACHE_TTL_HOURS") {
            self.engine.cache_ttl_hours =
                parse_env("QUARRY_CACHE_TTL_HOURS", &value)?;
        }
        if let Some(value) = read_env("QUARRY_DATA_DIR") {
            self.catalog.data_dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("QUARRY_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("QUARRY_PORT") {
            self.server.port = parse_env("QUARRY_PORT", &value)?;
        }
        if let Some(value) = read_env("QUARRY_SIMULATE_LATENCY") {
            self.server.simulate_latency = parse_env("QUARRY_SIMULATE_LATENCY", &value)?;
        }
        if let Some(value) = read_env("QUARRY_LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = read_env("QUARRY_LOG_FORMAT") {
            self.logging.format = match value.as_str() {
                "compact" => LogFormat::Compact,
                "pretty" => LogFormat::Pretty,
                "json" => LogFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidEnvOverride {
                        key: "QUARRY_LOG_FORMAT".to_owned(),
                        value,
                    })
                }
            };
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let engine = &self.engine;
        if engine.jitter.min_factor <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "jitter_min_factor must be positive, got {}",
                engine.jitter.min_factor
            )));
        }
        if engine.jitter.min_factor > engine.jitter.max_factor {
            return Err(ConfigError::Validation(format!(
                "jitter_min_factor {} exceeds jitter_max_factor {}",
                engine.jitter.min_factor, engine.jitter.max_factor
            )));
        }
        if engine.quote_validity_hours <= 0 {
            return Err(ConfigError::Validation(format!(
                "quote_validity_hours must be positive, got {}",
                engine.quote_validity_hours
            )));
        }
        if engine.cache_ttl_hours <= 0 {
            return Err(ConfigError::Validation(format!(
                "cache_ttl_hours must be positive, got {}",
                engine.cache_ttl_hours
            )));
        }
        if engine.distance_memo_capacity == 0 {
            return Err(ConfigError::Validation(
                "distance_memo_capacity must be at least 1".to_owned(),
            ));
        }
        if engine.average_speed_kmh <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "average_speed_kmh must be positive, got {}",
                engine.average_speed_kmh
            )));
        }
        if engine.emission_factor_kg_per_ton_km < 0.0 {
            return Err(ConfigError::Validation(format!(
                "emission_factor_kg_per_ton_km must not be negative, got {}",
                engine.emission_factor_kg_per_ton_km
            )));
        }
        if self.server.min_latency_ms > self.server.max_latency_ms {
            return Err(ConfigError::Validation(format!(
                "min_latency_ms {} exceeds max_latency_ms {}",
                self.server.min_latency_ms, self.server.max_latency_ms
            )));
        }
        Ok(())
    }
}

fn assign<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_owned(),
        value: value.to_owned(),
    })
}

fn resolve_config_path(options: &LoadOptions) -> Option<PathBuf> {
    if let Some(path) = &options.config_path {
        return Some(path.clone());
    }
    if let Some(path) = read_env("QUARRY_CONFIG") {
        return Some(PathBuf::from(path));
    }
    let default = PathBuf::from("quarry.toml");
    default.exists().then_some(default)
}
