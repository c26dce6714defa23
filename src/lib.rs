//! `Skredvarsel` - Avalanche risk forecasting for Norwegian ski resorts
//!
//! This library provides the core functionality of the forecasting
//! dashboard: per-resort feature retrieval from a batch feature store,
//! model artifact loading, risk scoring and classification, plus the
//! weather and avalanche-warning data collectors.

pub mod artifacts;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod features;
pub mod models;
pub mod resorts;
pub mod sanitize;
pub mod scorer;
pub mod warnings;
pub mod weather;

// Re-export core types for public API
pub use artifacts::{ModelArtifact, ModelStore};
pub use cache::PersistentCache;
pub use config::SkredConfig;
pub use dashboard::RiskForecastService;
pub use error::SkredError;
pub use features::{FeatureProvider, FeatureStore, RestFeatureStore};
pub use models::{FeatureRow, Prediction, Resort, RiskLevel, FEATURE_NAMES};
pub use resorts::load_resorts;
pub use sanitize::{feature_group_key, sanitize_name};
pub use warnings::{AvalancheWarning, WarningClient};
pub use weather::{DailyWeather, WeatherClient};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
