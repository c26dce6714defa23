//! Configuration management for the `Skredvarsel` application
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::SkredError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `Skredvarsel` application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkredConfig {
    /// Resort reference data settings
    #[serde(default)]
    pub reference: ReferenceConfig,
    /// Model artifact settings
    #[serde(default)]
    pub models: ModelsConfig,
    /// Feature store connection settings
    #[serde(default)]
    pub feature_store: FeatureStoreConfig,
    /// Weather API settings
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Avalanche warning API settings
    #[serde(default)]
    pub warnings: WarningsConfig,
    /// HTTP response cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Resort reference data settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceConfig {
    /// Tabular file with one row per resort
    #[serde(default = "default_reference_path")]
    pub path: String,
}

/// Model artifact settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Directory holding one serialized model per resort
    #[serde(default = "default_models_dir")]
    pub dir: String,
}

/// Feature store connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureStoreConfig {
    /// Base URL of the feature store service
    #[serde(default = "default_feature_store_url")]
    pub base_url: String,
    /// Project the feature view and groups live in
    #[serde(default = "default_feature_store_project")]
    pub project: String,
    /// API key (usually provided via SKREDVARSEL_FEATURE_STORE__API_KEY)
    pub api_key: Option<String>,
    /// Feature view serving the historical batch data
    #[serde(default = "default_feature_view")]
    pub feature_view: String,
    /// Feature view version
    #[serde(default = "default_feature_view_version")]
    pub feature_view_version: u32,
    /// Version of the per-resort forecast feature groups
    #[serde(default = "default_feature_group_version")]
    pub feature_group_version: u32,
    /// Request timeout in seconds
    #[serde(default = "default_feature_store_timeout")]
    pub timeout_seconds: u32,
}

/// Weather API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Historical archive endpoint base URL
    #[serde(default = "default_archive_base_url")]
    pub archive_base_url: String,
    /// Forecast endpoint base URL
    #[serde(default = "default_forecast_base_url")]
    pub forecast_base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of attempts for failed requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Exponential backoff factor in seconds
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
}

/// Avalanche warning API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarningsConfig {
    /// Warning-by-coordinates endpoint base URL
    #[serde(default = "default_warnings_base_url")]
    pub base_url: String,
    /// Language code for warning texts (2 = English)
    #[serde(default = "default_warnings_language")]
    pub language: u8,
    /// Request timeout in seconds
    #[serde(default = "default_warnings_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of attempts for failed requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Exponential backoff factor in seconds
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
}

/// HTTP response cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
    /// TTL for forecast responses in hours
    #[serde(default = "default_forecast_ttl")]
    pub forecast_ttl_hours: u32,
    /// TTL for historical responses in days (historical data never
    /// changes, so the default is effectively forever)
    #[serde(default = "default_historical_ttl")]
    pub historical_ttl_days: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_reference_path() -> String {
    "terrain_features.csv".to_string()
}

fn default_models_dir() -> String {
    "models".to_string()
}

fn default_feature_store_url() -> String {
    "https://eu-west.cloud.hopsworks.ai".to_string()
}

fn default_feature_store_project() -> String {
    "avalanche_forecast".to_string()
}

fn default_feature_view() -> String {
    "avalanche_warning_fv".to_string()
}

fn default_feature_view_version() -> u32 {
    3
}

fn default_feature_group_version() -> u32 {
    1
}

fn default_feature_store_timeout() -> u32 {
    30
}

fn default_archive_base_url() -> String {
    "https://archive-api.open-meteo.com/v1/archive".to_string()
}

fn default_forecast_base_url() -> String {
    "https://api.open-meteo.com/v1/ecmwf".to_string()
}

fn default_weather_timeout() -> u32 {
    30
}

fn default_max_retries() -> u32 {
    5
}

fn default_backoff_factor() -> f64 {
    0.2
}

fn default_warnings_base_url() -> String {
    "https://api01.nve.no/hydrology/forecast/avalanche/v6.3.0/api".to_string()
}

fn default_warnings_language() -> u8 {
    2
}

fn default_warnings_timeout() -> u32 {
    20
}

fn default_cache_location() -> String {
    "~/.cache/skredvarsel".to_string()
}

fn default_forecast_ttl() -> u32 {
    1
}

fn default_historical_ttl() -> u32 {
    3650
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            path: default_reference_path(),
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            dir: default_models_dir(),
        }
    }
}

impl Default for FeatureStoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_feature_store_url(),
            project: default_feature_store_project(),
            api_key: None,
            feature_view: default_feature_view(),
            feature_view_version: default_feature_view_version(),
            feature_group_version: default_feature_group_version(),
            timeout_seconds: default_feature_store_timeout(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            archive_base_url: default_archive_base_url(),
            forecast_base_url: default_forecast_base_url(),
            timeout_seconds: default_weather_timeout(),
            max_retries: default_max_retries(),
            backoff_factor: default_backoff_factor(),
        }
    }
}

impl Default for WarningsConfig {
    fn default() -> Self {
        Self {
            base_url: default_warnings_base_url(),
            language: default_warnings_language(),
            timeout_seconds: default_warnings_timeout(),
            max_retries: default_max_retries(),
            backoff_factor: default_backoff_factor(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            location: default_cache_location(),
            forecast_ttl_hours: default_forecast_ttl(),
            historical_ttl_days: default_historical_ttl(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for SkredConfig {
    fn default() -> Self {
        Self {
            reference: ReferenceConfig::default(),
            models: ModelsConfig::default(),
            feature_store: FeatureStoreConfig::default(),
            weather: WeatherConfig::default(),
            warnings: WarningsConfig::default(),
            cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SkredConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Add environment variable overrides with SKREDVARSEL_ prefix
        builder = builder.add_source(
            Environment::with_prefix("SKREDVARSEL")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: SkredConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("skredvarsel").join("config.toml"))
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds == 0 || self.weather.timeout_seconds > 300 {
            return Err(
                SkredError::config("Weather API timeout must be between 1 and 300 seconds").into(),
            );
        }

        if self.warnings.timeout_seconds == 0 || self.warnings.timeout_seconds > 300 {
            return Err(SkredError::config(
                "Warning API timeout must be between 1 and 300 seconds",
            )
            .into());
        }

        if self.weather.max_retries == 0 || self.weather.max_retries > 10 {
            return Err(
                SkredError::config("Weather API max retries must be between 1 and 10").into(),
            );
        }

        if self.warnings.max_retries == 0 || self.warnings.max_retries > 10 {
            return Err(
                SkredError::config("Warning API max retries must be between 1 and 10").into(),
            );
        }

        if !(0.0..=60.0).contains(&self.weather.backoff_factor)
            || !(0.0..=60.0).contains(&self.warnings.backoff_factor)
        {
            return Err(
                SkredError::config("Backoff factor must be between 0 and 60 seconds").into(),
            );
        }

        if self.cache.forecast_ttl_hours == 0 || self.cache.forecast_ttl_hours > 168 {
            return Err(
                SkredError::config("Forecast cache TTL must be between 1 and 168 hours").into(),
            );
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(SkredError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(SkredError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for url in [
            &self.feature_store.base_url,
            &self.weather.archive_base_url,
            &self.weather.forecast_base_url,
            &self.warnings.base_url,
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(SkredError::config(format!(
                    "'{url}' is not a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if let Some(api_key) = &self.feature_store.api_key {
            if api_key.is_empty() {
                return Err(SkredError::config(
                    "Feature store API key cannot be empty if provided. Either remove it or provide a valid key.",
                )
                .into());
            }
        }

        Ok(())
    }
}
