// # country-core
//
// Core library for the country monitor.
//
// ## Architecture Overview
//
// This library keeps the device's current ISO 3166-1 alpha-2 country code
// cheaply available:
// - **CountrySource**: Trait for detecting the country and watching for changes
// - **CountryCache**: Resolves once on first read, then stays fresh via push
//   notifications from the source
// - **SourceRegistry**: Plugin-based registry for country sources
//
// ## Design Principles
//
// 1. **Lazy**: Nothing touches the source until the first read
// 2. **Event-Driven**: Changes arrive as an async stream, never by polling
// 3. **Single Writer Path**: Resolution and notifications share one lock
// 4. **Library-First**: The cache is injected by the host; the process-wide
//    instance is a convenience on top

pub mod cache;
pub mod config;
pub mod error;
pub mod registry;
pub mod source;
pub mod traits;

// Re-export core types for convenience
pub use cache::{CachedCountry, CountryCache, CountryContext, Origin};
pub use config::{CacheConfig, CountryConfig, SourceConfig};
pub use error::{Error, Result};
pub use registry::SourceRegistry;
pub use source::ManualCountrySource;
pub use traits::{CountryChangeEvent, CountryCode, CountrySource};
