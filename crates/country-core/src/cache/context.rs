//! Construction context for [`CountryCache`](super::CountryCache)

use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;

use crate::config::{CacheConfig, CountryConfig};
use crate::registry::SourceRegistry;
use crate::traits::CountrySource;
use crate::Result;

/// Everything a cache needs to reach its country source
///
/// Cheap to clone. Building a context performs no I/O; the source is not
/// queried until the first read.
#[derive(Clone)]
pub struct CountryContext {
    pub(crate) source: Arc<dyn CountrySource>,
    pub(crate) delivery: Option<Handle>,
    pub(crate) config: CacheConfig,
}

impl CountryContext {
    /// Create a context around `source` with default cache settings
    pub fn new(source: Arc<dyn CountrySource>) -> Self {
        Self {
            source,
            delivery: None,
            config: CacheConfig::default(),
        }
    }

    /// Build the source described by `config` through `registry`
    pub fn from_config(registry: &SourceRegistry, config: &CountryConfig) -> Result<Self> {
        config.validate()?;
        let source = registry.create_source(&config.source)?;

        Ok(Self::new(Arc::from(source)).with_cache_config(config.cache.clone()))
    }

    /// Runtime that change notifications are delivered on
    ///
    /// Defaults to the runtime of the task performing the first read.
    pub fn with_delivery(mut self, handle: Handle) -> Self {
        self.delivery = Some(handle);
        self
    }

    /// Override cache settings
    pub fn with_cache_config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// The configured country source
    pub fn source(&self) -> &Arc<dyn CountrySource> {
        &self.source
    }
}

impl fmt::Debug for CountryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountryContext")
            .field("source", &self.source.source_name())
            .field("delivery", &self.delivery.is_some())
            .field("config", &self.config)
            .finish()
    }
}
