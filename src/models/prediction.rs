//! Prediction output model and risk classification

use serde::{Deserialize, Serialize};

/// Ordinal avalanche danger level derived from a model score.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    /// Classify a raw model score into a discrete risk level.
    ///
    /// Canonical thresholds: score >= 2 is High, score >= 1 is Moderate,
    /// anything below is Low. Scores cluster in [0, 3] (the ordinal
    /// warning-level scale) but the input is not clamped.
    #[must_use]
    pub fn classify(score: f64) -> Self {
        if score >= 2.0 {
            Self::High
        } else if score >= 1.0 {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    /// Map marker color for the UI.
    #[must_use]
    pub fn color(&self) -> &'static str {
        match self {
            Self::Low => "green",
            Self::Moderate => "orange",
            Self::High => "red",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Moderate => write!(f, "Moderate"),
            Self::High => write!(f, "High"),
        }
    }
}

/// A computed risk prediction for one resort.
///
/// Computed on demand, never persisted.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Prediction {
    /// Resort the prediction belongs to
    pub resort: String,
    /// Raw regression score
    pub score: f64,
    /// Discrete risk level derived from the score
    pub level: RiskLevel,
    /// Forecast horizon: 0 = latest/"today", 1-7 = days ahead,
    /// None for scenario simulations
    pub day_offset: Option<u8>,
}

impl Prediction {
    /// Build a prediction from a raw score, classifying it on the way.
    #[must_use]
    pub fn from_score(resort: impl Into<String>, score: f64, day_offset: Option<u8>) -> Self {
        Self {
            resort: resort.into(),
            score,
            level: RiskLevel::classify(score),
            day_offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.999, RiskLevel::Low)]
    #[case(1.0, RiskLevel::Moderate)]
    #[case(1.999, RiskLevel::Moderate)]
    #[case(2.0, RiskLevel::High)]
    #[case(-0.3, RiskLevel::Low)]
    #[case(2.9, RiskLevel::High)]
    fn test_classification_boundaries(#[case] score: f64, #[case] expected: RiskLevel) {
        assert_eq!(RiskLevel::classify(score), expected);
    }

    #[test]
    fn test_level_colors() {
        assert_eq!(RiskLevel::Low.color(), "green");
        assert_eq!(RiskLevel::Moderate.color(), "orange");
        assert_eq!(RiskLevel::High.color(), "red");
    }

    #[test]
    fn test_prediction_from_score() {
        let p = Prediction::from_score("Hafjell", 2.5, Some(0));
        assert_eq!(p.level, RiskLevel::High);
        assert_eq!(p.day_offset, Some(0));
    }
}
