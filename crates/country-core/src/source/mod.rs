// # Built-in Country Sources
//
// Implementations of the CountrySource trait shipped with the core crate.
// Platform-specific sources live in their own crates and register through
// the same `SourceRegistry`.

pub mod manual;

pub use manual::{ManualCountrySource, ManualCountrySourceFactory};

use crate::registry::SourceRegistry;

/// Register every built-in source with `registry`
pub fn register(registry: &SourceRegistry) {
    registry.register_source("manual", Box::new(ManualCountrySourceFactory));
}
