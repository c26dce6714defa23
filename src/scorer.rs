//! Applies a loaded model to a feature row
//!
//! The single-row model input is assembled following the model's trained
//! feature order, not the schema order. A mismatched column order would
//! silently yield a wrong but plausible-looking score, so the order source
//! of truth is always `ModelArtifact::feature_names`.

use crate::artifacts::ModelArtifact;
use crate::models::FeatureRow;
use anyhow::{bail, Result};

/// Predict the risk score for one feature row.
///
/// # Errors
/// Fails if the model expects a feature the row does not know. The error is
/// fatal to this single prediction only; callers catch and skip per-resort.
pub fn predict(model: &ModelArtifact, features: &FeatureRow) -> Result<f64> {
    let mut row = Vec::with_capacity(model.feature_names.len());
    for name in &model.feature_names {
        match features.get(name) {
            Some(value) => row.push(value),
            None => bail!("model expects unknown feature {name:?}"),
        }
    }
    Ok(model.predict_row(&row))
}
