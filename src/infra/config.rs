//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml

use crate::domain::types::VehicleClass;
use crate::services::fees::{FeeSchedule, DEFAULT_BASE_RATE, DEFAULT_MULTIPLIERS};
use crate::services::lot::LotCapacity;
use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Spots per class when a config leaves the count out
pub const DEFAULT_SPOT_COUNT: usize = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Lot identifier used in logs
    #[serde(default = "default_site_id")]
    pub id: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self { id: default_site_id() }
    }
}

fn default_site_id() -> String {
    "lot".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotsConfig {
    /// Bike spots
    #[serde(default = "default_spot_count")]
    pub small: usize,
    /// Car spots
    #[serde(default = "default_spot_count")]
    pub medium: usize,
    /// Truck spots
    #[serde(default = "default_spot_count")]
    pub large: usize,
}

impl Default for SpotsConfig {
    fn default() -> Self {
        Self { small: DEFAULT_SPOT_COUNT, medium: DEFAULT_SPOT_COUNT, large: DEFAULT_SPOT_COUNT }
    }
}

fn default_spot_count() -> usize {
    DEFAULT_SPOT_COUNT
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeesConfig {
    #[serde(default = "default_base_rate")]
    pub base_rate: u64,
    #[serde(default = "default_bike_multiplier")]
    pub bike_multiplier: u64,
    #[serde(default = "default_car_multiplier")]
    pub car_multiplier: u64,
    #[serde(default = "default_truck_multiplier")]
    pub truck_multiplier: u64,
}

impl Default for FeesConfig {
    fn default() -> Self {
        Self {
            base_rate: default_base_rate(),
            bike_multiplier: default_bike_multiplier(),
            car_multiplier: default_car_multiplier(),
            truck_multiplier: default_truck_multiplier(),
        }
    }
}

fn default_base_rate() -> u64 {
    DEFAULT_BASE_RATE
}

fn default_bike_multiplier() -> u64 {
    DEFAULT_MULTIPLIERS[VehicleClass::Bike.index()]
}

fn default_car_multiplier() -> u64 {
    DEFAULT_MULTIPLIERS[VehicleClass::Car.index()]
}

fn default_truck_multiplier() -> u64 {
    DEFAULT_MULTIPLIERS[VehicleClass::Truck.index()]
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Seconds between metrics log lines (0 disables the reporter)
    #[serde(default = "default_metrics_interval")]
    pub interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval() }
    }
}

fn default_metrics_interval() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub spots: SpotsConfig,
    #[serde(default)]
    pub fees: FeesConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    site_id: String,
    capacity: LotCapacity,
    fees: FeeSchedule,
    metrics_interval_secs: u64,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), "default".to_string())
    }
}

impl Config {
    fn from_toml(toml_config: TomlConfig, config_file: String) -> Self {
        let spots = toml_config.spots;
        let fees = toml_config.fees;
        Self {
            site_id: toml_config.site.id,
            capacity: LotCapacity::new(spots.small, spots.medium, spots.large),
            fees: FeeSchedule::new(fees.base_rate)
                .with_multiplier(VehicleClass::Bike, fees.bike_multiplier)
                .with_multiplier(VehicleClass::Car, fees.car_multiplier)
                .with_multiplier(VehicleClass::Truck, fees.truck_multiplier),
            metrics_interval_secs: toml_config.metrics.interval_secs,
            config_file,
        }
    }

    /// Pick the config file: an explicit path wins, then `CONFIG_FILE`,
    /// then config/dev.toml
    pub fn resolve_config_path(explicit: Option<&str>) -> String {
        if let Some(path) = explicit {
            return path.to_string();
        }

        if let Ok(path) = env::var("CONFIG_FILE") {
            return path;
        }

        "config/dev.toml".to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self::from_toml(toml_config, path.display().to_string()))
    }

    /// Load configuration from a path, falling back to defaults on any error
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                let error = format!("{:#}", e);
                warn!(error = %error, "config_fallback_to_defaults");
                Self::default()
            }
        }
    }

    /// Load configuration - resolves the path, then as `load_from_path`
    pub fn load(explicit: Option<&str>) -> Self {
        Self::load_from_path(Self::resolve_config_path(explicit))
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn capacity(&self) -> LotCapacity {
        self.capacity
    }

    pub fn fees(&self) -> FeeSchedule {
        self.fees
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for tests to set the capacity
    #[cfg(test)]
    pub fn with_capacity(mut self, capacity: LotCapacity) -> Self {
        self.capacity = capacity;
        self
    }
}
