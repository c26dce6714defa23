//! Dashboard-facing feature retrieval modes

use crate::features::store::{FeatureStore, RawRow};
use crate::models::FeatureRow;
use crate::sanitize::feature_group_key;
use anyhow::Result;
use chrono::NaiveDateTime;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Per-resort forecast tables carry this day-offset column.
pub const DAY_OFFSET_COLUMN: &str = "days_before_forecast_day";

/// Maximum stored forecast horizon in days.
pub const MAX_DAY_OFFSET: u8 = 7;

/// Retrieves feature rows per resort and normalizes them.
///
/// The latest snapshot is fetched once and cached for the session;
/// [`FeatureProvider::refresh`] clears it for the next data refresh.
pub struct FeatureProvider<S: FeatureStore> {
    store: S,
    feature_group_version: u32,
    snapshot: Option<BTreeMap<String, FeatureRow>>,
}

impl<S: FeatureStore> FeatureProvider<S> {
    #[must_use]
    pub fn new(store: S, feature_group_version: u32) -> Self {
        Self {
            store,
            feature_group_version,
            snapshot: None,
        }
    }

    /// Latest-snapshot mode: one hygiene-coerced row per resort, the one
    /// with the maximum date (ties broken by source row order). Resorts
    /// absent from the batch result are simply omitted.
    pub fn latest_snapshot(&mut self) -> Result<&BTreeMap<String, FeatureRow>> {
        if self.snapshot.is_none() {
            let rows = self.store.get_batch_data()?;
            self.snapshot = Some(select_latest_rows(rows));
        }
        // just populated above
        Ok(self.snapshot.as_ref().expect("snapshot populated"))
    }

    /// Drop the cached snapshot so the next access re-fetches.
    pub fn refresh(&mut self) {
        self.snapshot = None;
    }

    /// Multi-day forecast mode: the resort's stored forecast table, one
    /// hygiene-coerced row per day offset (0..=7), ordered by offset.
    ///
    /// # Errors
    /// Fails when the resort's feature group is absent or unreadable; the
    /// caller logs a warning and skips that resort.
    pub fn multi_day_forecast(&self, resort_name: &str) -> Result<Vec<(u8, FeatureRow)>> {
        let group_name = feature_group_key(resort_name)?;
        let table = self
            .store
            .get_feature_group(&group_name, self.feature_group_version)?;
        let rows = table.read()?;

        let mut forecast = Vec::new();
        for row in &rows {
            let Some(offset) = day_offset(row) else {
                debug!(resort = resort_name, "forecast row without usable day offset, dropped");
                continue;
            };
            if offset > MAX_DAY_OFFSET {
                continue;
            }
            forecast.push((offset, FeatureRow::from_raw(row)));
        }
        forecast.sort_by_key(|(offset, _)| *offset);
        Ok(forecast)
    }
}

/// Collapse all historical rows to the latest row per resort.
fn select_latest_rows(rows: Vec<RawRow>) -> BTreeMap<String, FeatureRow> {
    let mut dated: Vec<(String, NaiveDateTime, RawRow)> = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(location) = row.get("location").and_then(Value::as_str) else {
            debug!("batch row without location, dropped");
            continue;
        };
        let Some(date) = row.get("date").and_then(parse_date) else {
            debug!(location, "batch row without parseable date, dropped");
            continue;
        };
        dated.push((location.to_string(), date, row));
    }

    // Stable sort keeps source order for equal dates, so the last insert
    // per location is the max-date row with ties broken by source order.
    dated.sort_by(|a, b| (&a.0, a.1).cmp(&(&b.0, b.1)));

    let mut latest = BTreeMap::new();
    for (location, _, row) in dated {
        latest.insert(location, FeatureRow::from_raw(&row));
    }
    latest
}

/// Parse the batch `date` column: ISO date, ISO datetime, or epoch value.
fn parse_date(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                return Some(dt);
            }
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(dt);
            }
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        }
        Value::Number(n) => {
            let millis = n.as_i64()?;
            chrono::DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
        }
        _ => None,
    }
}

/// Extract the integer day offset from a forecast row.
fn day_offset(row: &RawRow) -> Option<u8> {
    match row.get(DAY_OFFSET_COLUMN)? {
        Value::Number(n) => n.as_u64().and_then(|v| u8::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<u8>().ok(),
        _ => None,
    }
}
