use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub matching: MatchingConfig,
    pub recommendation: RecommendationConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

/// Paths to the static reference data and the persisted stores.
#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    pub zones_csv: String,
    pub ride_log: String,
    pub pending_journal: String,
    pub model_artifact: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MatchingConfig {
    /// How long a return-trip window stays open after a drop.
    #[serde(default = "default_window_minutes")]
    pub window_minutes: i64,
    /// Pickups this close to a requested zone still satisfy it.
    #[serde(default)]
    pub zone_tolerance_m: f64,
}

fn default_window_minutes() -> i64 {
    90
}

#[derive(Debug, Deserialize, Clone)]
pub struct RecommendationConfig {
    /// Number of zones returned per recommendation.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Geographic plausibility cutoff around the drop zone.
    #[serde(default = "default_max_radius_m")]
    pub max_radius_m: f64,
}

fn default_top_k() -> usize {
    3
}

fn default_max_radius_m() -> f64 {
    15_000.0
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_radius_m: default_max_radius_m(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    #[serde(default = "default_max_passengers")]
    pub max_passengers: u32,
}

fn default_max_passengers() -> u32 {
    6
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Environment-specific overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Machine-local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. FLEETCAST__SERVER__PORT=8080
            .add_source(config::Environment::with_prefix("FLEETCAST").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
