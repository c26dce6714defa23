//! Error types and handling for the `Skredvarsel` dashboard

use thiserror::Error;

/// Main error type for the `Skredvarsel` application
///
/// Propagation policy: errors local to one resort's prediction
/// (`ModelNotFound`, `FeatureLookup`, scorer failures) must never abort a
/// whole rendering pass. Only shared-setup errors (`Config`) are fatal.
#[derive(Error, Debug)]
pub enum SkredError {
    /// Reference data or credentials missing or malformed, fatal at startup
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Name sanitization produced an empty identifier
    #[error("Invalid resort name: {name:?} sanitizes to an empty identifier")]
    InvalidName { name: String },

    /// No model artifact exists for a resort, so that resort is skipped
    #[error("Model not found for resort {resort:?} (looked for {path})")]
    ModelNotFound { resort: String, path: String },

    /// Resort absent from the feature source, so that resort is skipped
    #[error("Feature lookup failed for resort {resort:?}: {message}")]
    FeatureLookup { resort: String, message: String },

    /// Weather/avalanche HTTP call failed after retries
    #[error("Upstream API error: {message}")]
    UpstreamApi { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl SkredError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new invalid-name error
    pub fn invalid_name<S: Into<String>>(name: S) -> Self {
        Self::InvalidName { name: name.into() }
    }

    /// Create a new model-not-found error
    pub fn model_not_found<S: Into<String>, P: Into<String>>(resort: S, path: P) -> Self {
        Self::ModelNotFound {
            resort: resort.into(),
            path: path.into(),
        }
    }

    /// Create a new feature-lookup error
    pub fn feature_lookup<S: Into<String>, M: Into<String>>(resort: S, message: M) -> Self {
        Self::FeatureLookup {
            resort: resort.into(),
            message: message.into(),
        }
    }

    /// Create a new upstream API error
    pub fn upstream<S: Into<String>>(message: S) -> Self {
        Self::UpstreamApi {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            SkredError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            SkredError::InvalidName { name } => {
                format!("Resort name {name:?} cannot be used as a lookup key.")
            }
            SkredError::ModelNotFound { resort, .. } => {
                format!("No trained model is available for {resort}. It will not appear on the map.")
            }
            SkredError::FeatureLookup { resort, .. } => {
                format!("No recent feature data for {resort}. It will not appear on the map.")
            }
            SkredError::UpstreamApi { .. } => {
                "Unable to reach external weather/warning services. Showing partial data."
                    .to_string()
            }
            SkredError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
