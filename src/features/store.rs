//! Feature store collaborator boundary

use crate::config::FeatureStoreConfig;
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use std::time::Duration;

/// One raw record as returned by the batch source: named columns to
/// arbitrary JSON values, types not yet normalized.
pub type RawRow = serde_json::Map<String, serde_json::Value>;

/// Handle on one stored feature-group table.
pub trait FeatureGroupTable {
    /// Materialize the stored rows.
    fn read(&self) -> Result<Vec<RawRow>>;
}

/// Batch feature source interface.
///
/// The real service is a remote key-value batch data provider; tests swap in
/// an in-memory implementation.
pub trait FeatureStore {
    /// All historical rows across resorts and dates, with `date`,
    /// `location` and the feature columns.
    fn get_batch_data(&self) -> Result<Vec<RawRow>>;

    /// Handle on a stored per-resort forecast table, keyed by its
    /// feature-group name.
    fn get_feature_group(&self, name: &str, version: u32) -> Result<Box<dyn FeatureGroupTable>>;
}

/// Blocking REST client against the feature store service.
pub struct RestFeatureStore {
    client: Client,
    base_url: String,
    project: String,
    feature_view: String,
    feature_view_version: u32,
}

impl RestFeatureStore {
    /// Build a store client from configuration. Establishing the connection
    /// is shared setup, so failures here are fatal.
    pub fn new(config: &FeatureStoreConfig) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(api_key) = &config.api_key {
            let mut value = reqwest::header::HeaderValue::from_str(api_key)
                .with_context(|| "Feature store API key contains invalid characters")?;
            value.set_sensitive(true);
            headers.insert("x-api-key", value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_seconds)))
            .default_headers(headers)
            .build()
            .with_context(|| "Failed to build feature store HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project: config.project.clone(),
            feature_view: config.feature_view.clone(),
            feature_view_version: config.feature_view_version,
        })
    }
}

impl FeatureStore for RestFeatureStore {
    fn get_batch_data(&self) -> Result<Vec<RawRow>> {
        let url = format!(
            "{}/project/{}/featureview/{}/version/{}/batch",
            self.base_url, self.project, self.feature_view, self.feature_view_version
        );

        let rows = self
            .client
            .get(&url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .with_context(|| format!("Batch data request failed: {url}"))?
            .json::<Vec<RawRow>>()
            .with_context(|| "Failed to parse batch data response")?;
        Ok(rows)
    }

    fn get_feature_group(&self, name: &str, version: u32) -> Result<Box<dyn FeatureGroupTable>> {
        let url = format!(
            "{}/project/{}/featuregroup/{}/version/{}/read",
            self.base_url, self.project, name, version
        );
        Ok(Box::new(RestFeatureGroup {
            client: self.client.clone(),
            url,
        }))
    }
}

struct RestFeatureGroup {
    client: Client,
    url: String,
}

impl FeatureGroupTable for RestFeatureGroup {
    fn read(&self) -> Result<Vec<RawRow>> {
        let rows = self
            .client
            .get(&self.url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .with_context(|| format!("Feature group read failed: {}", self.url))?
            .json::<Vec<RawRow>>()
            .with_context(|| "Failed to parse feature group response")?;
        Ok(rows)
    }
}
