//! Plugin-based country source registry
//!
//! The registry allows country sources to be registered dynamically at
//! runtime, avoiding hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use country_core::registry::SourceRegistry;
//! use country_core::config::SourceConfig;
//!
//! let registry = SourceRegistry::new();
//! country_core::source::register(&registry);
//!
//! let config = SourceConfig::Manual { country: "US".to_string() };
//! let source = registry.create_source(&config)?;
//! ```

use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::traits::{CountrySource, CountrySourceFactory};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

type FactoryMap = HashMap<String, Box<dyn CountrySourceFactory>>;

/// Registry for plugin-based country source creation
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct SourceRegistry {
    /// Registered country source factories
    sources: RwLock<FactoryMap>,
}

impl SourceRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in sources already registered
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        crate::source::register(&registry);
        registry
    }

    // Poisoning is ignored: every write is a single map operation.
    fn read(&self) -> RwLockReadGuard<'_, FactoryMap> {
        self.sources.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, FactoryMap> {
        self.sources.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a country source factory
    ///
    /// # Parameters
    ///
    /// - `name`: Source type name (e.g., "manual")
    /// - `factory`: Factory object for creating source instances
    ///
    /// Registering a name twice replaces the earlier factory.
    pub fn register_source(&self, name: impl Into<String>, factory: Box<dyn CountrySourceFactory>) {
        self.write().insert(name.into(), factory);
    }

    /// Create a country source from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn CountrySource>)`: Created source instance
    /// - `Err(Error)`: If the source type is not registered or creation fails
    pub fn create_source(&self, config: &SourceConfig) -> Result<Box<dyn CountrySource>> {
        config.validate()?;

        let source_type = config.type_name();
        let sources = self.read();

        let factory = sources
            .get(source_type)
            .ok_or_else(|| Error::config(format!("Unknown country source type: {}", source_type)))?;

        factory.create(config)
    }

    /// List all registered source types
    pub fn list_sources(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Check if a source type is registered
    pub fn has_source(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }
}
