//! Error types for the country monitor
//!
//! This module defines all error types used throughout the crate.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for country monitor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the country monitor
#[derive(Error, Debug)]
pub enum Error {
    /// The country source could not be reached or produced no value
    #[error("Country source unavailable: {0}")]
    SourceUnavailable(String),

    /// A value that is not an ISO 3166-1 alpha-2 code
    #[error("Invalid country code: {0}")]
    InvalidCountryCode(String),

    /// Resolution did not finish within the configured timeout
    #[error("Country resolution timed out after {0:?}")]
    Timeout(Duration),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a "source unavailable" error
    pub fn source_unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    /// Create an invalid country code error
    pub fn invalid_country_code(msg: impl Into<String>) -> Self {
        Self::InvalidCountryCode(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether a later call may succeed where this one failed
    ///
    /// The cache never stores a failed resolution, so callers can use this
    /// to decide whether asking again is worthwhile.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::SourceUnavailable(_) | Self::Timeout(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
