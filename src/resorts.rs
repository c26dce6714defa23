//! Resort reference data loading
//!
//! The reference file is tabular, one row per resort, with at least
//! `location`, `latitude` and `longitude` columns (terrain attributes may
//! follow and are ignored here). It is read once at startup; schema
//! violations are fatal.

use crate::models::Resort;
use crate::SkredError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize)]
struct ResortRecord {
    location: String,
    latitude: f64,
    longitude: f64,
    region_id: Option<u32>,
}

/// Load the resort set from a reference CSV file.
///
/// # Errors
/// Returns [`SkredError::Config`] when the file is missing, a required
/// column is absent, or a coordinate fails to parse.
pub fn load_resorts(path: impl AsRef<Path>) -> Result<Vec<Resort>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SkredError::config(format!(
            "Resort reference file not found: {}",
            path.display()
        ))
        .into());
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open resort reference file {}", path.display()))?;

    let mut resorts = Vec::new();
    for (i, record) in reader.deserialize::<ResortRecord>().enumerate() {
        let record = record.map_err(|err| {
            SkredError::config(format!(
                "Malformed resort reference data at row {}: {err}",
                i + 1
            ))
        })?;
        resorts.push(Resort {
            name: record.location,
            latitude: record.latitude,
            longitude: record.longitude,
            region_id: record.region_id,
        });
    }

    if resorts.is_empty() {
        return Err(SkredError::config(format!(
            "Resort reference file {} contains no resorts",
            path.display()
        ))
        .into());
    }

    info!(count = resorts.len(), path = %path.display(), "loaded resort reference data");
    Ok(resorts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_resorts() {
        let file = write_csv(
            "location,latitude,longitude,region_id,steepness\n\
             Hafjell,61.298,10.403,3042,0.7\n\
             Norefjell,60.225,9.553,3041,0.6\n",
        );

        let resorts = load_resorts(file.path()).unwrap();
        assert_eq!(resorts.len(), 2);
        assert_eq!(resorts[0].name, "Hafjell");
        assert_eq!(resorts[0].latitude, 61.298);
        assert_eq!(resorts[0].region_id, Some(3042));
    }

    #[test]
    fn test_region_id_is_optional() {
        let file = write_csv("location,latitude,longitude\nHafjell,61.298,10.403\n");
        let resorts = load_resorts(file.path()).unwrap();
        assert_eq!(resorts[0].region_id, None);
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let file = write_csv("location,latitude\nHafjell,61.298\n");
        let err = load_resorts(file.path()).unwrap_err();
        assert!(err.downcast_ref::<SkredError>().is_some_and(|e| matches!(
            e,
            SkredError::Config { .. }
        )));
    }

    #[test]
    fn test_unparsable_coordinate_is_fatal() {
        let file = write_csv("location,latitude,longitude\nHafjell,north,10.403\n");
        assert!(load_resorts(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_is_fatal() {
        assert!(load_resorts("/definitely/not/here.csv").is_err());
    }
}
