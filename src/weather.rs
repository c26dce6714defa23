//! Weather data collectors
//!
//! Historical daily archive and hourly forecast retrieval from the
//! open-meteo endpoints, per resort. Responses are cached persistently:
//! historical data never changes so it is kept effectively forever, while
//! forecasts go stale after an hour.

use crate::cache::PersistentCache;
use crate::config::WeatherConfig;
use crate::models::Resort;
use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Daily variables requested from the archive endpoint. Critical avalanche
/// factors: new snow amount, wind, temperature and precipitation.
const DAILY_VARIABLES: &str = "temperature_2m_mean,precipitation_sum,rain_sum,snowfall_sum,wind_speed_10m_max,wind_direction_10m_dominant";

/// Hourly variables requested from the forecast endpoint.
const HOURLY_VARIABLES: &str =
    "temperature_2m,precipitation,rain,snowfall,wind_speed_10m,wind_direction_10m";

/// One day (or forecast hour) of weather for one resort.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyWeather {
    pub date: NaiveDateTime,
    pub temperature_2m_mean: f64,
    pub precipitation_sum: f64,
    pub rain_sum: f64,
    pub snowfall_sum: f64,
    pub wind_speed_10m_max: f64,
    pub wind_direction_10m_dominant: f64,
    pub location: String,
}

/// Blocking client for the weather endpoints.
pub struct WeatherClient {
    client: reqwest::blocking::Client,
    config: WeatherConfig,
}

impl WeatherClient {
    pub fn new(config: WeatherConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_seconds)))
            .build()
            .with_context(|| "Failed to build weather HTTP client")?;
        Ok(Self { client, config })
    }

    /// Fetch daily historical weather for a resort over a date range.
    ///
    /// Days with any missing variable are dropped. Cached with the
    /// historical TTL when a cache is provided.
    pub fn get_historical_daily(
        &self,
        resort: &Resort,
        start_date: NaiveDate,
        end_date: NaiveDate,
        cache: Option<&PersistentCache>,
        historical_ttl: Duration,
    ) -> Result<Vec<DailyWeather>> {
        let cache_key = format!(
            "archive:{:.4}:{:.4}:{start_date}:{end_date}",
            resort.latitude, resort.longitude
        );
        if let Some(cached) = lookup(cache, &cache_key) {
            return Ok(cached);
        }

        let url = format!(
            "{}?latitude={}&longitude={}&start_date={}&end_date={}&daily={}",
            self.config.archive_base_url,
            resort.latitude,
            resort.longitude,
            start_date,
            end_date,
            DAILY_VARIABLES
        );

        let response: openmeteo::ArchiveResponse = self.get_with_retries(&url)?;
        let rows = response.into_daily_weather(&resort.name);
        store(cache, &cache_key, &rows, historical_ttl);
        Ok(rows)
    }

    /// Fetch the hourly weather forecast for a resort.
    ///
    /// Hourly variables are mapped onto the daily field names the feature
    /// schema uses. Cached for the forecast TTL when a cache is provided.
    pub fn get_forecast_hourly(
        &self,
        resort: &Resort,
        cache: Option<&PersistentCache>,
        forecast_ttl: Duration,
    ) -> Result<Vec<DailyWeather>> {
        let cache_key = format!("forecast:{:.4}:{:.4}", resort.latitude, resort.longitude);
        if let Some(cached) = lookup(cache, &cache_key) {
            return Ok(cached);
        }

        let url = format!(
            "{}?latitude={}&longitude={}&hourly={}",
            self.config.forecast_base_url, resort.latitude, resort.longitude, HOURLY_VARIABLES
        );

        let response: openmeteo::ForecastResponse = self.get_with_retries(&url)?;
        let rows = response.into_daily_weather(&resort.name);
        store(cache, &cache_key, &rows, forecast_ttl);
        Ok(rows)
    }

    fn get_with_retries<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        retry_with_backoff(self.config.max_retries, self.config.backoff_factor, || {
            let parsed = self
                .client
                .get(url)
                .send()
                .and_then(reqwest::blocking::Response::error_for_status)
                .with_context(|| format!("Weather request failed: {url}"))?
                .json::<T>()
                .with_context(|| "Failed to parse open-meteo response")?;
            Ok(parsed)
        })
    }
}

/// Run `operation` up to `max_retries` times, sleeping
/// `backoff_factor * 2^(attempt-1)` seconds between attempts.
pub(crate) fn retry_with_backoff<T>(
    max_retries: u32,
    backoff_factor: f64,
    operation: impl Fn() -> Result<T>,
) -> Result<T> {
    let attempts = max_retries.max(1);
    let mut last_err = None;
    for attempt in 1..=attempts {
        match operation() {
            Ok(value) => return Ok(value),
            Err(err) => {
                debug!(attempt, error = %err, "request attempt failed");
                last_err = Some(err);
                if attempt < attempts {
                    let pause = backoff_factor * f64::from(1u32 << (attempt - 1));
                    std::thread::sleep(Duration::from_secs_f64(pause));
                }
            }
        }
    }
    // loop ran at least once
    Err(last_err.expect("at least one attempt"))
}

fn lookup(cache: Option<&PersistentCache>, key: &str) -> Option<Vec<DailyWeather>> {
    let cache = cache?;
    match cache.get(key) {
        Ok(value) => value,
        Err(err) => {
            warn!(key, error = %err, "weather cache lookup failed");
            None
        }
    }
}

fn store(cache: Option<&PersistentCache>, key: &str, rows: &Vec<DailyWeather>, ttl: Duration) {
    if let Some(cache) = cache {
        if let Err(err) = cache.put(key, rows, ttl) {
            warn!(key, error = %err, "weather cache store failed");
        }
    }
}

/// open-meteo API response structures and conversion utilities
mod openmeteo {
    use super::DailyWeather;
    use chrono::{NaiveDate, NaiveDateTime};
    use serde::Deserialize;

    /// Historical archive response with daily aggregates
    #[derive(Debug, Deserialize)]
    pub struct ArchiveResponse {
        pub daily: Option<DailyData>,
    }

    #[derive(Debug, Deserialize)]
    pub struct DailyData {
        pub time: Vec<String>,
        pub temperature_2m_mean: Option<Vec<Option<f64>>>,
        pub precipitation_sum: Option<Vec<Option<f64>>>,
        pub rain_sum: Option<Vec<Option<f64>>>,
        pub snowfall_sum: Option<Vec<Option<f64>>>,
        pub wind_speed_10m_max: Option<Vec<Option<f64>>>,
        pub wind_direction_10m_dominant: Option<Vec<Option<f64>>>,
    }

    /// Forecast response with hourly values
    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        pub hourly: Option<HourlyData>,
    }

    #[derive(Debug, Deserialize)]
    pub struct HourlyData {
        pub time: Vec<String>,
        #[serde(rename = "temperature_2m")]
        pub temperature: Option<Vec<Option<f64>>>,
        pub precipitation: Option<Vec<Option<f64>>>,
        pub rain: Option<Vec<Option<f64>>>,
        pub snowfall: Option<Vec<Option<f64>>>,
        #[serde(rename = "wind_speed_10m")]
        pub wind_speed: Option<Vec<Option<f64>>>,
        #[serde(rename = "wind_direction_10m")]
        pub wind_direction: Option<Vec<Option<f64>>>,
    }

    fn value_at(series: &Option<Vec<Option<f64>>>, i: usize) -> Option<f64> {
        series.as_ref()?.get(i).copied().flatten()
    }

    fn parse_time(time: &str) -> Option<NaiveDateTime> {
        if let Ok(dt) = NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M") {
            return Some(dt);
        }
        NaiveDate::parse_from_str(time, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    }

    impl ArchiveResponse {
        /// Rows with any missing variable are dropped, mirroring the
        /// ingestion side of the pipeline.
        pub fn into_daily_weather(self, location: &str) -> Vec<DailyWeather> {
            let Some(daily) = self.daily else {
                return Vec::new();
            };

            let mut rows = Vec::with_capacity(daily.time.len());
            for (i, time) in daily.time.iter().enumerate() {
                let Some(date) = parse_time(time) else {
                    continue;
                };
                let row = (|| {
                    Some(DailyWeather {
                        date,
                        temperature_2m_mean: value_at(&daily.temperature_2m_mean, i)?,
                        precipitation_sum: value_at(&daily.precipitation_sum, i)?,
                        rain_sum: value_at(&daily.rain_sum, i)?,
                        snowfall_sum: value_at(&daily.snowfall_sum, i)?,
                        wind_speed_10m_max: value_at(&daily.wind_speed_10m_max, i)?,
                        wind_direction_10m_dominant: value_at(
                            &daily.wind_direction_10m_dominant,
                            i,
                        )?,
                        location: location.to_string(),
                    })
                })();
                if let Some(row) = row {
                    rows.push(row);
                }
            }
            rows
        }
    }

    impl ForecastResponse {
        /// Hourly variables land on the daily field names the feature
        /// schema expects downstream.
        pub fn into_daily_weather(self, location: &str) -> Vec<DailyWeather> {
            let Some(hourly) = self.hourly else {
                return Vec::new();
            };

            let mut rows = Vec::with_capacity(hourly.time.len());
            for (i, time) in hourly.time.iter().enumerate() {
                let Some(date) = parse_time(time) else {
                    continue;
                };
                let row = (|| {
                    Some(DailyWeather {
                        date,
                        temperature_2m_mean: value_at(&hourly.temperature, i)?,
                        precipitation_sum: value_at(&hourly.precipitation, i)?,
                        rain_sum: value_at(&hourly.rain, i)?,
                        snowfall_sum: value_at(&hourly.snowfall, i)?,
                        wind_speed_10m_max: value_at(&hourly.wind_speed, i)?,
                        wind_direction_10m_dominant: value_at(&hourly.wind_direction, i)?,
                        location: location.to_string(),
                    })
                })();
                if let Some(row) = row {
                    rows.push(row);
                }
            }
            rows
        }
    }

}
