//! Data models for the Skredvarsel dashboard
//!
//! Core domain models organized by concern:
//! - Resort: ski areas with fixed geographic coordinates
//! - Features: the 14 numeric predictors consumed by the models
//! - Prediction: risk score plus discrete risk level

pub mod features;
pub mod prediction;
pub mod resort;

// Re-export all public types for convenient access
pub use features::{FeatureRow, FEATURE_NAMES};
pub use prediction::{Prediction, RiskLevel};
pub use resort::Resort;
