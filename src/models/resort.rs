//! Resort reference model

use serde::{Deserialize, Serialize};

/// A named ski area with fixed geographic coordinates.
///
/// Immutable reference data loaded once at startup; identity is the name.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Resort {
    /// Display name, e.g. "Hafjell" (the join key for all lookups)
    pub name: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Avalanche forecast region the resort falls in
    pub region_id: Option<u32>,
}

impl Resort {
    /// Create a new resort
    #[must_use]
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            region_id: None,
        }
    }

    /// Create a resort with its forecast region
    #[must_use]
    pub fn with_region(
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        region_id: u32,
    ) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            region_id: Some(region_id),
        }
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}
