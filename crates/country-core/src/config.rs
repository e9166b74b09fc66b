//! Configuration types for the country monitor
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main country monitor configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CountryConfig {
    /// Country source configuration
    #[serde(default)]
    pub source: SourceConfig,

    /// Optional cache settings
    #[serde(default)]
    pub cache: CacheConfig,
}

impl CountryConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.source.validate()?;
        self.cache.validate()?;

        Ok(())
    }
}

/// Country source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Host-driven source seeded with an initial country
    Manual {
        /// Initial ISO 3166-1 alpha-2 code (e.g., "US")
        country: String,
    },

    /// Custom country source
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl SourceConfig {
    /// Validate the source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            SourceConfig::Manual { country } => {
                crate::CountryCode::new(country)
                    .map_err(|e| crate::Error::config(format!("Manual source: {}", e)))?;
                Ok(())
            }
            SourceConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom country source factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom country source config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the source type name used for registry lookups
    pub fn type_name(&self) -> &str {
        match self {
            SourceConfig::Manual { .. } => "manual",
            SourceConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Manual {
            country: "US".to_string(),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Upper bound on the cold-start resolution (in seconds)
    ///
    /// `None` waits for the source indefinitely, which is the default.
    #[serde(default)]
    pub resolve_timeout_secs: Option<u64>,
}

impl CacheConfig {
    /// Set the cold-start resolution timeout
    pub fn with_resolve_timeout_secs(mut self, secs: u64) -> Self {
        self.resolve_timeout_secs = Some(secs);
        self
    }

    /// The resolution timeout as a [`Duration`], if any
    pub fn resolve_timeout(&self) -> Option<Duration> {
        self.resolve_timeout_secs.map(Duration::from_secs)
    }

    /// Validate the cache configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.resolve_timeout_secs == Some(0) {
            return Err(crate::Error::config(
                "Resolve timeout must be > 0 (omit it to wait indefinitely)",
            ));
        }
        Ok(())
    }
}
