// # Manual Country Source
//
// Host-driven implementation of CountrySource.
//
// ## Purpose
//
// The hosting application already knows the country (from its own location
// stack, a user setting, a SIM lookup) and wants to feed it into the cache.
// It keeps a clone of this source and calls `set_country()`; every watcher
// receives a change event.
//
// ## Delivery
//
// - Changes are fanned out through a bounded broadcast channel
// - A watcher that falls behind skips to the oldest retained event, so the
//   latest country is always delivered eventually
// - Setting the same country again is a no-op (no event)

use async_trait::async_trait;
use std::pin::Pin;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::config::SourceConfig;
use crate::traits::{CountryChangeEvent, CountryCode, CountrySource, CountrySourceFactory};
use crate::{Error, Result};

/// Capacity of the change fan-out channel
const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// Host-driven country source
///
/// Clones share the same current value and the same set of watchers.
///
/// # Example
///
/// ```rust,no_run
/// use country_core::source::ManualCountrySource;
/// use country_core::traits::CountrySource;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let source = ManualCountrySource::new("US".parse()?);
///
///     source.set_country("GB".parse()?);
///     assert_eq!(source.current().await?, "GB");
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ManualCountrySource {
    current: Arc<RwLock<CountryCode>>,
    changes: broadcast::Sender<CountryChangeEvent>,
}

impl ManualCountrySource {
    /// Create a source reporting `initial` until told otherwise
    pub fn new(initial: CountryCode) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            current: Arc::new(RwLock::new(initial)),
            changes,
        }
    }

    /// Report a newly detected country
    ///
    /// Returns `true` if the country changed and watchers were notified.
    pub fn set_country(&self, country: CountryCode) -> bool {
        // Held across the send so watchers see changes in write order.
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        if *current == country {
            debug!("Country unchanged ({}), not notifying", country);
            return false;
        }

        let previous = std::mem::replace(&mut *current, country.clone());
        debug!("Country changed {} -> {}", previous, country);

        // No receivers is fine: nobody has subscribed yet.
        let _ = self
            .changes
            .send(CountryChangeEvent::new(country, Some(previous)));
        true
    }

    /// Number of live watch streams
    pub fn watcher_count(&self) -> usize {
        self.changes.receiver_count()
    }
}

#[async_trait]
impl CountrySource for ManualCountrySource {
    async fn current(&self) -> Result<CountryCode> {
        let current = self.current.read().unwrap_or_else(|e| e.into_inner());
        Ok(current.clone())
    }

    fn watch(&self) -> Pin<Box<dyn Stream<Item = CountryChangeEvent> + Send + 'static>> {
        let stream = BroadcastStream::new(self.changes.subscribe()).filter_map(|item| match item {
            Ok(event) => Some(event),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!("Country watcher lagged, skipped {} change(s)", skipped);
                None
            }
        });
        Box::pin(stream)
    }

    fn source_name(&self) -> &'static str {
        "manual"
    }
}

/// Factory for [`ManualCountrySource`]
pub struct ManualCountrySourceFactory;

impl CountrySourceFactory for ManualCountrySourceFactory {
    fn create(&self, config: &SourceConfig) -> Result<Box<dyn CountrySource>> {
        match config {
            SourceConfig::Manual { country } => {
                Ok(Box::new(ManualCountrySource::new(CountryCode::new(country)?)))
            }
            other => Err(Error::config(format!(
                "manual factory cannot build a '{}' source",
                other.type_name()
            ))),
        }
    }
}
