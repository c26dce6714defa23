//! Prediction pipeline orchestration
//!
//! One sequential pass per rendering request: feature retrieval, model
//! lookup, scoring, classification. Per-resort failures are logged and
//! skipped so the remaining resorts still render; only shared setup may
//! fail the whole pass.

use crate::artifacts::ModelStore;
use crate::features::{FeatureProvider, FeatureStore};
use crate::models::{FeatureRow, Prediction, Resort};
use crate::scorer;
use crate::SkredError;
use anyhow::Result;
use tracing::{debug, info, warn};

/// The dashboard-facing forecasting service.
///
/// Constructed once at process start with its collaborators injected;
/// holds the session feature cache and the process-lifetime model cache.
pub struct RiskForecastService<S: FeatureStore> {
    resorts: Vec<Resort>,
    provider: FeatureProvider<S>,
    models: ModelStore,
}

impl<S: FeatureStore> RiskForecastService<S> {
    #[must_use]
    pub fn new(resorts: Vec<Resort>, provider: FeatureProvider<S>, models: ModelStore) -> Self {
        Self {
            resorts,
            provider,
            models,
        }
    }

    /// The resort reference set, in file order.
    #[must_use]
    pub fn resorts(&self) -> &[Resort] {
        &self.resorts
    }

    /// Drop session feature caches so the next pass re-fetches.
    pub fn refresh(&mut self) {
        self.provider.refresh();
    }

    /// Latest predictions, one per resort (day offset 0).
    ///
    /// Resorts absent from the feature snapshot are omitted silently;
    /// missing models and scoring failures are logged and skipped.
    pub fn latest_predictions(&mut self) -> Result<Vec<Prediction>> {
        let snapshot = self.provider.latest_snapshot()?.clone();

        let mut predictions = Vec::new();
        for resort in &self.resorts {
            let Some(features) = snapshot.get(&resort.name) else {
                debug!(resort = %resort.name, "not in latest feature snapshot, skipped");
                continue;
            };

            match score_resort(&self.models, &resort.name, features, Some(0)) {
                Ok(prediction) => predictions.push(prediction),
                Err(err) => log_skip(&resort.name, &err),
            }
        }

        info!(
            rendered = predictions.len(),
            total = self.resorts.len(),
            "latest prediction pass complete"
        );
        Ok(predictions)
    }

    /// Multi-day forecast predictions, day offsets 0-7 per resort.
    ///
    /// A resort whose stored forecast table is absent or unreadable is
    /// skipped with a warning; the remaining resorts still render.
    pub fn forecast_predictions(&mut self) -> Result<Vec<Prediction>> {
        let mut predictions = Vec::new();
        for resort in &self.resorts {
            let forecast = match self.provider.multi_day_forecast(&resort.name) {
                Ok(forecast) => forecast,
                Err(err) => {
                    warn!(resort = %resort.name, error = %err, "forecast table lookup failed, skipped");
                    continue;
                }
            };

            for (offset, features) in &forecast {
                match score_resort(&self.models, &resort.name, features, Some(*offset)) {
                    Ok(prediction) => predictions.push(prediction),
                    Err(err) => log_skip(&resort.name, &err),
                }
            }
        }
        Ok(predictions)
    }

    /// Scenario simulation: the resort's last-known feature row with the
    /// given `(field, value)` overrides applied, re-scored. Only the
    /// overridden fields differ from the last-known values.
    pub fn simulate(&mut self, resort_name: &str, overrides: &[(&str, f64)]) -> Result<Prediction> {
        let snapshot = self.provider.latest_snapshot()?;
        let Some(features) = snapshot.get(resort_name) else {
            return Err(SkredError::feature_lookup(
                resort_name,
                "no latest feature row for scenario simulation",
            )
            .into());
        };

        let mut scenario = features.clone();
        for (field, value) in overrides {
            if !scenario.set(field, *value) {
                return Err(SkredError::feature_lookup(
                    resort_name,
                    format!("unknown scenario feature {field:?}"),
                )
                .into());
            }
        }

        score_resort(&self.models, resort_name, &scenario, None)
    }
}

fn score_resort(
    models: &ModelStore,
    resort_name: &str,
    features: &FeatureRow,
    day_offset: Option<u8>,
) -> Result<Prediction> {
    let model = models.load(resort_name)?;
    let score = scorer::predict(&model, features)?;
    Ok(Prediction::from_score(resort_name, score, day_offset))
}

fn log_skip(resort: &str, err: &anyhow::Error) {
    match err.downcast_ref::<SkredError>() {
        Some(SkredError::ModelNotFound { .. }) => {
            warn!(resort, error = %err, "model artifact missing, resort skipped");
        }
        _ => {
            warn!(resort, error = %err, "prediction failed, resort skipped");
        }
    }
}
