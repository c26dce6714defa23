//! End-to-end pipeline tests for the prediction service

use anyhow::{anyhow, Result};
use serde_json::json;
use skredvarsel::artifacts::ModelStore;
use skredvarsel::dashboard::RiskForecastService;
use skredvarsel::features::{FeatureGroupTable, FeatureProvider, FeatureStore, RawRow};
use skredvarsel::models::{Resort, RiskLevel, FEATURE_NAMES};
use skredvarsel::sanitize::sanitize_name;
use std::collections::HashMap;
use std::path::Path;

/// In-memory stand-in for the batch feature source.
struct InMemoryStore {
    batch: Vec<RawRow>,
    groups: HashMap<String, Vec<RawRow>>,
}

struct InMemoryTable(Vec<RawRow>);

impl FeatureGroupTable for InMemoryTable {
    fn read(&self) -> Result<Vec<RawRow>> {
        Ok(self.0.clone())
    }
}

impl FeatureStore for InMemoryStore {
    fn get_batch_data(&self) -> Result<Vec<RawRow>> {
        Ok(self.batch.clone())
    }

    fn get_feature_group(&self, name: &str, _version: u32) -> Result<Box<dyn FeatureGroupTable>> {
        match self.groups.get(name) {
            Some(rows) => Ok(Box::new(InMemoryTable(rows.clone()))),
            None => Err(anyhow!("feature group {name} does not exist")),
        }
    }
}

/// A complete batch row with all 14 schema fields present.
fn batch_row(location: &str, date: &str, lag1: f64) -> RawRow {
    let mut map = serde_json::Map::new();
    map.insert("location".into(), json!(location));
    map.insert("date".into(), json!(date));
    for name in FEATURE_NAMES {
        map.insert(name.to_string(), json!(1.0));
    }
    map.insert("warning_level_lag_1".into(), json!(lag1));
    map
}

fn forecast_row(offset: u8, lag1: f64) -> RawRow {
    let mut map = batch_row("ignored", "2025-02-01", lag1);
    map.insert("days_before_forecast_day".into(), json!(offset));
    map
}

/// Write a model artifact that predicts `score` unconditionally.
fn write_constant_model(dir: &Path, resort: &str, score: f64) {
    let key = sanitize_name(resort).unwrap();
    let artifact = json!({
        "feature_names": FEATURE_NAMES,
        "base_score": score,
        "trees": [],
    });
    std::fs::write(
        dir.join(format!("xgb_ordinal_model_{key}.json")),
        serde_json::to_string(&artifact).unwrap(),
    )
    .unwrap();
}

/// A model whose score is exactly warning_level_lag_1 (single split tree
/// approximated by base + leaf offsets would be overkill; instead score
/// shifts by 2.0 when lag_1 >= 2.0).
fn write_threshold_model(dir: &Path, resort: &str) {
    let key = sanitize_name(resort).unwrap();
    let lag1_index = FEATURE_NAMES
        .iter()
        .position(|n| *n == "warning_level_lag_1")
        .unwrap();
    let artifact = json!({
        "feature_names": FEATURE_NAMES,
        "base_score": 0.5,
        "trees": [{
            "feature": lag1_index,
            "threshold": 2.0,
            "left": {"leaf": 0.0},
            "right": {"leaf": 2.0},
        }],
    });
    std::fs::write(
        dir.join(format!("xgb_ordinal_model_{key}.json")),
        serde_json::to_string(&artifact).unwrap(),
    )
    .unwrap();
}

fn service_with(
    resorts: Vec<Resort>,
    store: InMemoryStore,
    models_dir: &Path,
) -> RiskForecastService<InMemoryStore> {
    RiskForecastService::new(
        resorts,
        FeatureProvider::new(store, 1),
        ModelStore::new(models_dir),
    )
}

#[test]
fn latest_prediction_for_hafjell() {
    let dir = tempfile::tempdir().unwrap();
    write_constant_model(dir.path(), "Hafjell", 2.5);

    let store = InMemoryStore {
        batch: vec![batch_row("Hafjell", "2025-02-01", 2.5)],
        groups: HashMap::new(),
    };
    let mut service = service_with(
        vec![Resort::new("Hafjell", 61.298, 10.403)],
        store,
        dir.path(),
    );

    let predictions = service.latest_predictions().unwrap();
    assert_eq!(predictions.len(), 1);
    let p = &predictions[0];
    assert_eq!(p.resort, "Hafjell");
    assert_eq!(p.score, 2.5);
    assert_eq!(p.level, RiskLevel::High);
    assert_eq!(p.day_offset, Some(0));
}

#[test]
fn missing_artifact_skips_only_that_resort() {
    let dir = tempfile::tempdir().unwrap();
    write_constant_model(dir.path(), "Hafjell", 1.2);
    // no model for Norefjell

    let store = InMemoryStore {
        batch: vec![
            batch_row("Hafjell", "2025-02-01", 1.0),
            batch_row("Norefjell", "2025-02-01", 1.0),
        ],
        groups: HashMap::new(),
    };
    let mut service = service_with(
        vec![
            Resort::new("Hafjell", 61.298, 10.403),
            Resort::new("Norefjell", 60.225, 9.553),
        ],
        store,
        dir.path(),
    );

    let predictions = service.latest_predictions().unwrap();
    assert_eq!(predictions.len(), 1);
    assert_eq!(predictions[0].resort, "Hafjell");
    assert_eq!(predictions[0].level, RiskLevel::Moderate);
}

#[test]
fn resort_absent_from_snapshot_is_omitted_silently() {
    let dir = tempfile::tempdir().unwrap();
    write_constant_model(dir.path(), "Hafjell", 0.4);
    write_constant_model(dir.path(), "Norefjell", 0.4);

    let store = InMemoryStore {
        batch: vec![batch_row("Hafjell", "2025-02-01", 1.0)],
        groups: HashMap::new(),
    };
    let mut service = service_with(
        vec![
            Resort::new("Hafjell", 61.298, 10.403),
            Resort::new("Norefjell", 60.225, 9.553),
        ],
        store,
        dir.path(),
    );

    let predictions = service.latest_predictions().unwrap();
    assert_eq!(predictions.len(), 1);
    assert_eq!(predictions[0].resort, "Hafjell");
    assert_eq!(predictions[0].level, RiskLevel::Low);
}

#[test]
fn forecast_pass_renders_remaining_resorts_on_group_failure() {
    let dir = tempfile::tempdir().unwrap();
    write_constant_model(dir.path(), "Hafjell", 1.5);
    write_constant_model(dir.path(), "Norefjell", 1.5);

    let mut groups = HashMap::new();
    groups.insert(
        "aq_predictions_hafjell".to_string(),
        vec![forecast_row(0, 1.0), forecast_row(1, 1.0), forecast_row(2, 1.0)],
    );
    // Norefjell has no stored forecast table

    let store = InMemoryStore {
        batch: vec![],
        groups,
    };
    let mut service = service_with(
        vec![
            Resort::new("Hafjell", 61.298, 10.403),
            Resort::new("Norefjell", 60.225, 9.553),
        ],
        store,
        dir.path(),
    );

    let predictions = service.forecast_predictions().unwrap();
    assert_eq!(predictions.len(), 3);
    assert!(predictions.iter().all(|p| p.resort == "Hafjell"));
    let offsets: Vec<u8> = predictions.iter().filter_map(|p| p.day_offset).collect();
    assert_eq!(offsets, vec![0, 1, 2]);
}

#[test]
fn scenario_simulation_changes_only_the_edited_field() {
    let dir = tempfile::tempdir().unwrap();
    write_threshold_model(dir.path(), "Hafjell");

    let store = InMemoryStore {
        batch: vec![batch_row("Hafjell", "2025-02-01", 1.0)],
        groups: HashMap::new(),
    };
    let mut service = service_with(
        vec![Resort::new("Hafjell", 61.298, 10.403)],
        store,
        dir.path(),
    );

    // Baseline: lag_1 = 1.0 stays below the split, score 0.5 → Low
    let baseline = service.simulate("Hafjell", &[]).unwrap();
    assert_eq!(baseline.score, 0.5);
    assert_eq!(baseline.level, RiskLevel::Low);
    assert_eq!(baseline.day_offset, None);

    // Push only warning_level_lag_1 over the split: score 2.5 → High.
    // Every other field keeps its last-known value, so the score shift
    // comes from the edited field alone.
    let scenario = service
        .simulate("Hafjell", &[("warning_level_lag_1", 3.0)])
        .unwrap();
    assert_eq!(scenario.score, 2.5);
    assert_eq!(scenario.level, RiskLevel::High);

    // The stored snapshot is untouched by the simulation
    let repeat = service.simulate("Hafjell", &[]).unwrap();
    assert_eq!(repeat.score, 0.5);
}

#[test]
fn scenario_with_unknown_field_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_constant_model(dir.path(), "Hafjell", 1.0);

    let store = InMemoryStore {
        batch: vec![batch_row("Hafjell", "2025-02-01", 1.0)],
        groups: HashMap::new(),
    };
    let mut service = service_with(
        vec![Resort::new("Hafjell", 61.298, 10.403)],
        store,
        dir.path(),
    );

    assert!(service.simulate("Hafjell", &[("no_such_field", 1.0)]).is_err());
}

#[test]
fn scenario_for_unknown_resort_fails() {
    let dir = tempfile::tempdir().unwrap();
    let store = InMemoryStore {
        batch: vec![],
        groups: HashMap::new(),
    };
    let mut service = service_with(
        vec![Resort::new("Hafjell", 61.298, 10.403)],
        store,
        dir.path(),
    );

    assert!(service.simulate("Hafjell", &[]).is_err());
}
