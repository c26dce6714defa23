//! Model feature schema and numeric hygiene

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The fixed model feature schema, in the order the models were trained on.
pub const FEATURE_NAMES: [&str; 14] = [
    "warning_level_lag_1",
    "warning_level_lag_2",
    "warning_level_lag_3",
    "temperature_2m_mean",
    "precipitation_sum",
    "rain_sum",
    "snowfall_sum",
    "wind_speed_10m_max",
    "wind_direction_10m_dominant",
    "snow_load_steep",
    "wind_snow_transport",
    "rain_on_snow_risk",
    "temp_elev",
    "precip_slope_weighted",
];

/// One dated set of the 14 numeric predictors for one resort.
///
/// Invariant: every field is a finite f64. Construction through
/// [`FeatureRow::from_raw`] coerces each value and falls back to 0.0 for
/// anything malformed or missing, so a row never carries a NaN downstream.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct FeatureRow {
    pub warning_level_lag_1: f64,
    pub warning_level_lag_2: f64,
    pub warning_level_lag_3: f64,
    pub temperature_2m_mean: f64,
    pub precipitation_sum: f64,
    pub rain_sum: f64,
    pub snowfall_sum: f64,
    pub wind_speed_10m_max: f64,
    pub wind_direction_10m_dominant: f64,
    pub snow_load_steep: f64,
    pub wind_snow_transport: f64,
    pub rain_on_snow_risk: f64,
    pub temp_elev: f64,
    pub precip_slope_weighted: f64,
}

impl FeatureRow {
    /// Build a row from a raw feature-store record, applying numeric hygiene.
    ///
    /// Each schema field is coerced to f64; values that fail coercion (or are
    /// non-finite) are replaced with 0.0 rather than propagating a null.
    #[must_use]
    pub fn from_raw(raw: &serde_json::Map<String, Value>) -> Self {
        let mut row = Self::default();
        for name in FEATURE_NAMES {
            let value = raw.get(name).map_or(0.0, coerce_numeric);
            // set() cannot fail for names out of FEATURE_NAMES
            let _ = row.set(name, value);
        }
        row
    }

    /// Look up a field by its schema name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        let value = match name {
            "warning_level_lag_1" => self.warning_level_lag_1,
            "warning_level_lag_2" => self.warning_level_lag_2,
            "warning_level_lag_3" => self.warning_level_lag_3,
            "temperature_2m_mean" => self.temperature_2m_mean,
            "precipitation_sum" => self.precipitation_sum,
            "rain_sum" => self.rain_sum,
            "snowfall_sum" => self.snowfall_sum,
            "wind_speed_10m_max" => self.wind_speed_10m_max,
            "wind_direction_10m_dominant" => self.wind_direction_10m_dominant,
            "snow_load_steep" => self.snow_load_steep,
            "wind_snow_transport" => self.wind_snow_transport,
            "rain_on_snow_risk" => self.rain_on_snow_risk,
            "temp_elev" => self.temp_elev,
            "precip_slope_weighted" => self.precip_slope_weighted,
            _ => return None,
        };
        Some(value)
    }

    /// Set a field by its schema name. Returns false for unknown names.
    pub fn set(&mut self, name: &str, value: f64) -> bool {
        let slot = match name {
            "warning_level_lag_1" => &mut self.warning_level_lag_1,
            "warning_level_lag_2" => &mut self.warning_level_lag_2,
            "warning_level_lag_3" => &mut self.warning_level_lag_3,
            "temperature_2m_mean" => &mut self.temperature_2m_mean,
            "precipitation_sum" => &mut self.precipitation_sum,
            "rain_sum" => &mut self.rain_sum,
            "snowfall_sum" => &mut self.snowfall_sum,
            "wind_speed_10m_max" => &mut self.wind_speed_10m_max,
            "wind_direction_10m_dominant" => &mut self.wind_direction_10m_dominant,
            "snow_load_steep" => &mut self.snow_load_steep,
            "wind_snow_transport" => &mut self.wind_snow_transport,
            "rain_on_snow_risk" => &mut self.rain_on_snow_risk,
            "temp_elev" => &mut self.temp_elev,
            "precip_slope_weighted" => &mut self.precip_slope_weighted,
            _ => return false,
        };
        *slot = value;
        true
    }

    /// All 14 values in schema order.
    #[must_use]
    pub fn values(&self) -> [f64; 14] {
        [
            self.warning_level_lag_1,
            self.warning_level_lag_2,
            self.warning_level_lag_3,
            self.temperature_2m_mean,
            self.precipitation_sum,
            self.rain_sum,
            self.snowfall_sum,
            self.wind_speed_10m_max,
            self.wind_direction_10m_dominant,
            self.snow_load_steep,
            self.wind_snow_transport,
            self.rain_on_snow_risk,
            self.temp_elev,
            self.precip_slope_weighted,
        ]
    }
}

/// Coerce a raw JSON value to a finite f64, defaulting to 0.0.
fn coerce_numeric(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_row(overrides: &[(&str, Value)]) -> serde_json::Map<String, Value> {
        let mut map = serde_json::Map::new();
        for name in FEATURE_NAMES {
            map.insert(name.to_string(), json!(1.0));
        }
        for (name, value) in overrides {
            map.insert((*name).to_string(), value.clone());
        }
        map
    }

    #[test]
    fn test_from_raw_coerces_all_fields() {
        let raw = raw_row(&[
            ("temperature_2m_mean", json!("-3.5")),
            ("rain_sum", json!(null)),
            ("snowfall_sum", json!("not a number")),
            ("wind_speed_10m_max", json!(12)),
        ]);
        let row = FeatureRow::from_raw(&raw);

        assert_eq!(row.temperature_2m_mean, -3.5);
        assert_eq!(row.rain_sum, 0.0);
        assert_eq!(row.snowfall_sum, 0.0);
        assert_eq!(row.wind_speed_10m_max, 12.0);
        assert_eq!(row.warning_level_lag_1, 1.0);
    }

    #[test]
    fn test_every_field_finite_after_hygiene() {
        let mut raw = raw_row(&[]);
        raw.remove("temp_elev"); // missing column
        raw.insert("precip_slope_weighted".into(), json!({"oops": 1}));

        let row = FeatureRow::from_raw(&raw);
        for name in FEATURE_NAMES {
            let v = row.get(name).unwrap();
            assert!(v.is_finite(), "{name} is not finite");
        }
    }

    #[test]
    fn test_get_set_round_trip() {
        let mut row = FeatureRow::default();
        assert!(row.set("snow_load_steep", 4.2));
        assert_eq!(row.get("snow_load_steep"), Some(4.2));

        assert!(!row.set("no_such_feature", 1.0));
        assert_eq!(row.get("no_such_feature"), None);
    }

    #[test]
    fn test_values_follow_schema_order() {
        let mut row = FeatureRow::default();
        for (i, name) in FEATURE_NAMES.iter().enumerate() {
            row.set(name, i as f64);
        }
        let values = row.values();
        for (i, v) in values.iter().enumerate() {
            assert_eq!(*v, i as f64);
        }
    }
}
