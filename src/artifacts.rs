//! Per-resort model artifact loading and caching
//!
//! Each resort has one serialized ordinal-regression model on local storage,
//! named `xgb_ordinal_model_<sanitized>.json`. Artifacts are loaded lazily
//! and cached for the process lifetime; a changed file on disk is not picked
//! up until restart.

use crate::sanitize::sanitize_name;
use crate::SkredError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// One node of a regression tree.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        /// Index into the model's `feature_names`
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    Leaf {
        leaf: f64,
    },
}

impl TreeNode {
    fn walk(&self, row: &[f64]) -> f64 {
        match self {
            TreeNode::Leaf { leaf } => *leaf,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                // out-of-range split indices score as 0.0, same as a
                // missing feature after hygiene
                let value = row.get(*feature).copied().unwrap_or(0.0);
                if value < *threshold {
                    left.walk(row)
                } else {
                    right.walk(row)
                }
            }
        }
    }
}

/// A deserialized gradient-boosted tree ensemble bound to one resort.
///
/// Opaque to callers except for `feature_names`, whose order is the trained
/// column order and is contractual for scoring.
#[derive(Debug, Deserialize)]
pub struct ModelArtifact {
    /// Feature columns in trained order
    pub feature_names: Vec<String>,
    /// Score offset added to the tree sum
    #[serde(default)]
    pub base_score: f64,
    /// Regression trees, summed
    #[serde(default)]
    pub trees: Vec<TreeNode>,
}

impl ModelArtifact {
    /// Score a single input row. Values must already follow
    /// `feature_names` order.
    #[must_use]
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.base_score + self.trees.iter().map(|t| t.walk(row)).sum::<f64>()
    }
}

/// Memoizing accessor for per-resort model artifacts.
///
/// The cache is keyed by sanitized resort name, written once per key and
/// read-only afterwards. Unbounded, but bounded in practice by the ~20
/// known resorts; no eviction or invalidation.
pub struct ModelStore {
    models_dir: PathBuf,
    cache: Mutex<HashMap<String, Arc<ModelArtifact>>>,
}

impl ModelStore {
    /// Create a store reading artifacts from `models_dir`.
    #[must_use]
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Path an artifact for this resort is expected at.
    pub fn artifact_path(&self, resort_name: &str) -> Result<PathBuf> {
        let key = sanitize_name(resort_name)?;
        Ok(self.models_dir.join(format!("xgb_ordinal_model_{key}.json")))
    }

    /// Load the model for a resort, reading from disk on first use only.
    ///
    /// # Errors
    /// Returns [`SkredError::ModelNotFound`] when no artifact file exists
    /// for the sanitized name; the caller skips that resort and continues.
    pub fn load(&self, resort_name: &str) -> Result<Arc<ModelArtifact>> {
        let key = sanitize_name(resort_name)?;

        let mut cache = self.cache.lock().expect("model cache poisoned");
        if let Some(model) = cache.get(&key) {
            return Ok(Arc::clone(model));
        }

        let path = self.models_dir.join(format!("xgb_ordinal_model_{key}.json"));
        let model = Arc::new(read_artifact(&path, resort_name)?);
        debug!(resort = resort_name, path = %path.display(), "loaded model artifact");
        cache.insert(key, Arc::clone(&model));
        Ok(model)
    }
}

fn read_artifact(path: &Path, resort_name: &str) -> Result<ModelArtifact> {
    if !path.exists() {
        return Err(
            SkredError::model_not_found(resort_name, path.display().to_string()).into(),
        );
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read model artifact {}", path.display()))?;
    let model: ModelArtifact = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse model artifact {}", path.display()))?;
    Ok(model)
}
