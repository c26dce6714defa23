//! Avalanche warning collector
//!
//! Fetches regional avalanche danger warnings by coordinates from the NVE
//! forecast API. Failures after retries are logged and converted to an
//! empty result so downstream aggregation proceeds with fewer rows.

use crate::config::WarningsConfig;
use crate::models::Resort;
use crate::weather::retry_with_backoff;
use crate::SkredError;
use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// One published avalanche warning for a forecast region.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct AvalancheWarning {
    pub region_id: Option<u32>,
    pub region_name: Option<String>,
    pub valid_from: Option<String>,
    pub valid_to: Option<String>,
    pub danger_level: Option<String>,
    pub main_text: Option<String>,
}

/// Blocking client for the warning-by-coordinates endpoint.
pub struct WarningClient {
    client: reqwest::blocking::Client,
    config: WarningsConfig,
}

impl WarningClient {
    pub fn new(config: WarningsConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_seconds)))
            .user_agent("skredvarsel-dashboard")
            .build()
            .with_context(|| "Failed to build warning HTTP client")?;
        Ok(Self { client, config })
    }

    /// Fetch warnings covering a resort's coordinates for a date range.
    ///
    /// Never propagates upstream failures: after the retry budget is spent
    /// the error is logged and an empty list returned.
    pub fn get_warnings(
        &self,
        resort: &Resort,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Vec<AvalancheWarning> {
        let url = format!(
            "{}/AvalancheWarningByCoordinates/Simple/{}/{}/{}/{}/{}",
            self.config.base_url,
            resort.latitude,
            resort.longitude,
            self.config.language,
            start_date,
            end_date
        );

        let result = retry_with_backoff(self.config.max_retries, self.config.backoff_factor, || {
            let warnings = self
                .client
                .get(&url)
                .send()
                .and_then(reqwest::blocking::Response::error_for_status)
                .with_context(|| format!("Warning request failed: {url}"))?
                .json::<Vec<AvalancheWarning>>()
                .with_context(|| "Failed to parse avalanche warning response")?;
            Ok(warnings)
        });

        match result {
            Ok(warnings) => warnings,
            Err(err) => {
                let upstream = SkredError::upstream(format!("{err:#}"));
                warn!(
                    resort = %resort.name,
                    %start_date,
                    %end_date,
                    error = %upstream,
                    "avalanche warning fetch failed, continuing with empty result"
                );
                Vec::new()
            }
        }
    }
}

/// Split a date range into inclusive chunks of at most `chunk_days` days,
/// for the API's range limit.
pub fn date_chunks(
    start_date: NaiveDate,
    end_date: NaiveDate,
    chunk_days: u32,
) -> Vec<(NaiveDate, NaiveDate)> {
    let mut chunks = Vec::new();
    let mut start = start_date;
    while start < end_date {
        let chunk_end = (start + ChronoDuration::days(i64::from(chunk_days))).min(end_date);
        chunks.push((start, chunk_end));
        start = chunk_end + ChronoDuration::days(1);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_chunks_cover_range_without_overlap() {
        let chunks = date_chunks(date(2025, 1, 1), date(2025, 5, 1), 60);

        assert_eq!(chunks.first().unwrap().0, date(2025, 1, 1));
        assert_eq!(chunks.last().unwrap().1, date(2025, 5, 1));
        for window in chunks.windows(2) {
            assert_eq!(window[0].1 + ChronoDuration::days(1), window[1].0);
        }
        for (start, end) in &chunks {
            assert!((*end - *start).num_days() <= 60);
        }
    }

    #[test]
    fn test_date_chunks_short_range_is_one_chunk() {
        let chunks = date_chunks(date(2025, 1, 1), date(2025, 1, 10), 60);
        assert_eq!(chunks, vec![(date(2025, 1, 1), date(2025, 1, 10))]);
    }

    #[test]
    fn test_date_chunks_empty_when_start_not_before_end() {
        assert!(date_chunks(date(2025, 1, 10), date(2025, 1, 10), 60).is_empty());
    }

    #[test]
    fn test_unreachable_endpoint_yields_empty_result() {
        let config = WarningsConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            language: 2,
            timeout_seconds: 1,
            max_retries: 1,
            backoff_factor: 0.0,
        };
        let client = WarningClient::new(config).unwrap();
        let resort = Resort::new("Hafjell", 61.298, 10.403);

        let warnings = client.get_warnings(&resort, date(2025, 2, 1), date(2025, 2, 3));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_warning_deserialization() {
        let json = r#"[{
            "RegionId": 3042,
            "RegionName": "Hallingdal",
            "ValidFrom": "2025-02-01T00:00:00",
            "ValidTo": "2025-02-01T23:59:59",
            "DangerLevel": "3",
            "MainText": "Considerable avalanche danger."
        }]"#;
        let warnings: Vec<AvalancheWarning> = serde_json::from_str(json).unwrap();
        assert_eq!(warnings[0].region_id, Some(3042));
        assert_eq!(warnings[0].danger_level.as_deref(), Some("3"));
    }
}
