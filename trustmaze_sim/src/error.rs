//! Error types for the experiment harness.

use thiserror::Error;
use trustmaze_core::ConfigError;

/// Errors raised while configuring, running or exporting experiments.
#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid configuration value or identifier
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Study was asked to run with nothing to compare
    #[error("Invalid study: {0}")]
    InvalidStudy(String),

    /// Export file could not be written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Export could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SimError {
    /// Creates an invalid-study error.
    pub fn invalid_study(msg: impl Into<String>) -> Self {
        Self::InvalidStudy(msg.into())
    }
}
