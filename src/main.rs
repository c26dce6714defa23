use anyhow::Result;
use chrono::Utc;
use skredvarsel::artifacts::ModelStore;
use skredvarsel::cache::PersistentCache;
use skredvarsel::config::SkredConfig;
use skredvarsel::dashboard::RiskForecastService;
use skredvarsel::features::{FeatureProvider, RestFeatureStore};
use skredvarsel::resorts::load_resorts;
use skredvarsel::warnings::WarningClient;
use skredvarsel::weather::WeatherClient;
use skredvarsel::SkredError;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(err) = run() {
        match err.downcast_ref::<SkredError>() {
            Some(skred) => eprintln!("{}", skred.user_message()),
            None => eprintln!("Error: {err:#}"),
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Optional first argument: path to a config file
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = SkredConfig::load_from_path(config_path)?;

    init_tracing(&config);

    // Shared setup: failures here are fatal
    let resorts = load_resorts(&config.reference.path)?;
    let cache = PersistentCache::open(cache_path(&config.cache.location))?;
    let store = RestFeatureStore::new(&config.feature_store)?;
    let provider = FeatureProvider::new(store, config.feature_store.feature_group_version);
    let models = ModelStore::new(&config.models.dir);
    let weather = WeatherClient::new(config.weather.clone())?;
    let warning_client = WarningClient::new(config.warnings.clone())?;
    let mut service = RiskForecastService::new(resorts, provider, models);

    println!("Norway Avalanche Forecast");
    println!("=========================\n");

    println!("Latest risk per resort:");
    let latest = service.latest_predictions()?;
    if latest.is_empty() {
        println!("  (no resorts with current feature data)");
    }
    for prediction in &latest {
        println!(
            "  {:<32} score {:>5.2}  {:<8} [{}]",
            prediction.resort,
            prediction.score,
            prediction.level.to_string(),
            prediction.level.color()
        );
    }

    println!("\nStored 8-day forecasts:");
    match service.forecast_predictions() {
        Ok(forecast) => {
            let mut current: Option<&str> = None;
            for prediction in &forecast {
                if current != Some(prediction.resort.as_str()) {
                    println!("  {}:", prediction.resort);
                    current = Some(prediction.resort.as_str());
                }
                println!(
                    "    day +{}  score {:>5.2}  {}",
                    prediction.day_offset.unwrap_or(0),
                    prediction.score,
                    prediction.level
                );
            }
            if forecast.is_empty() {
                println!("  (no stored forecast tables found)");
            }
        }
        Err(err) => warn!(error = %err, "forecast pass failed"),
    }

    println!("\nCurrent conditions per resort:");
    let forecast_ttl = Duration::from_secs(u64::from(config.cache.forecast_ttl_hours) * 3600);
    let today = Utc::now().date_naive();
    for resort in service.resorts() {
        let published =
            warning_client.get_warnings(resort, today, today + chrono::Duration::days(2));
        let danger = published
            .iter()
            .find_map(|w| w.danger_level.clone())
            .unwrap_or_else(|| "-".to_string());

        let snowfall = match weather.get_forecast_hourly(resort, Some(&cache), forecast_ttl) {
            Ok(rows) => rows.iter().map(|r| r.snowfall_sum).sum::<f64>(),
            Err(err) => {
                warn!(resort = %resort.name, error = %err, "forecast weather fetch failed, skipped");
                continue;
            }
        };
        println!(
            "  {:<32} official danger level {:<3} forecast snowfall {:>6.1} cm",
            resort.name, danger, snowfall
        );
    }

    Ok(())
}

/// Resolve a `~/`-prefixed cache location against the home directory.
fn cache_path(location: &str) -> PathBuf {
    if let Some(rest) = location.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(location)
}

fn init_tracing(config: &SkredConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));

    if config.logging.format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
