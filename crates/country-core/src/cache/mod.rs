//! Country cache
//!
//! The CountryCache is responsible for:
//! - Resolving the current country once, on first read
//! - Subscribing once to the source's change stream
//! - Overwriting the cached country whenever a change arrives
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐   current() (cold start only)   ┌───────────────┐
//! │ CountrySource │ ──────────────────────────────▶ │ CountryCache  │ ◀── country_iso()
//! │               │ ── CountryChangeEvent stream ─▶ │ (Mutex state) │ ──▶ updates()
//! └───────────────┘       (listener task)           └───────────────┘
//! ```
//!
//! ## Lifecycle
//!
//! ```text
//! Unresolved ──first successful read──▶ Resolved ──change──▶ Resolved
//!     ▲   │                                 │   ▲
//!     └───┘ failed read                     └───┘ listener stopped:
//!           (nothing cached,                      next read re-detects
//!            nothing subscribed)                  and re-subscribes
//! ```
//!
//! The listener stops when its delivery runtime shuts down or the source
//! closes its change stream. Either way, changes may have been missed, so
//! the next read queries the source again instead of trusting the cache.

mod context;

pub use context::CountryContext;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::pin::Pin;
use std::sync::{Arc, OnceLock, Weak};
use std::sync::Mutex as StdMutex;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{Mutex, MutexGuard, watch};
use tokio::task::{AbortHandle, JoinHandle};
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::config::CacheConfig;
use crate::error::{Error, Result};
use crate::traits::{CountryChangeEvent, CountryCode, CountrySource};

type ChangeStream = Pin<Box<dyn Stream<Item = CountryChangeEvent> + Send + 'static>>;

/// Process-wide instance handed out by [`CountryCache::get_instance`]
static INSTANCE: OnceLock<Arc<CountryCache>> = OnceLock::new();

/// How the cached country was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Queried from the source on cold start
    Detected,
    /// Delivered by a change notification
    Notified,
}

/// The cached country together with when and how it was stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CachedCountry {
    /// The cached country code
    pub code: CountryCode,
    /// When this value was stored
    pub updated_at: DateTime<Utc>,
    /// How this value was obtained
    pub origin: Origin,
}

#[derive(Default)]
struct CacheState {
    cached: Option<CachedCountry>,
    /// Listener draining the source's change stream
    subscription: Option<JoinHandle<()>>,
}

impl CacheState {
    /// Whether a listener is still applying changes to `cached`
    fn is_listening(&self) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(|subscription| !subscription.is_finished())
    }
}

/// State shared between readers and the listener task
struct Shared {
    state: Mutex<CacheState>,
    updates: watch::Sender<Option<CountryCode>>,
}

impl Shared {
    /// Overwrite the cached country. Callers must hold the state lock.
    fn store(&self, state: &mut MutexGuard<'_, CacheState>, code: CountryCode, origin: Origin) {
        state.cached = Some(CachedCountry {
            code: code.clone(),
            updated_at: Utc::now(),
            origin,
        });
        self.updates.send_replace(Some(code));
    }
}

/// Lazily resolved, push-updated cache of the current country
///
/// ## Threading
///
/// Reads may come from any task or thread. The cached value and the
/// subscription share one lock, so "check, resolve, store, subscribe" runs as
/// a single critical section and concurrent cold-start readers trigger one
/// query and one subscription between them. Change notifications take the
/// same lock, so a read observes either the old or the new country.
///
/// ## Failures
///
/// A failed resolution is returned to the caller and nothing is cached or
/// subscribed; the next read asks the source again.
pub struct CountryCache {
    source: Arc<dyn CountrySource>,
    shared: Arc<Shared>,
    delivery: Option<Handle>,
    resolve_timeout: Option<Duration>,
    /// Abort handle of the current listener, reachable without the state lock
    listener: StdMutex<Option<AbortHandle>>,
}

impl CountryCache {
    /// Create a cache over `source`
    ///
    /// Performs no I/O; the source is first queried by [`country_iso`](Self::country_iso).
    pub fn new(source: Arc<dyn CountrySource>, config: CacheConfig) -> Self {
        let (updates, _) = watch::channel(None);
        Self {
            source,
            shared: Arc::new(Shared {
                state: Mutex::new(CacheState::default()),
                updates,
            }),
            delivery: None,
            resolve_timeout: config.resolve_timeout(),
            listener: StdMutex::new(None),
        }
    }

    /// Create a cache from a [`CountryContext`]
    pub fn from_context(context: &CountryContext) -> Self {
        let mut cache = Self::new(Arc::clone(&context.source), context.config.clone());
        cache.delivery = context.delivery.clone();
        cache
    }

    /// Get the process-wide cache, creating it from `context` on first call
    ///
    /// Exactly one instance is ever created, even when several threads race
    /// on the first call. Later contexts are ignored.
    pub fn get_instance(context: &CountryContext) -> Arc<CountryCache> {
        Arc::clone(INSTANCE.get_or_init(|| {
            info!(
                "Creating process-wide country cache (source={})",
                context.source.source_name()
            );
            Arc::new(Self::from_context(context))
        }))
    }

    /// Get the current country code
    ///
    /// On cold start this queries the source (waiting as long as it takes,
    /// unless a resolve timeout is configured), caches the answer and
    /// subscribes to change notifications. Afterwards it returns the cached
    /// value without touching the source, for as long as the listener runs.
    /// If the listener has stopped, the read resolves and subscribes again.
    ///
    /// # Returns
    ///
    /// - `Ok(CountryCode)`: The most recently observed country
    /// - `Err(Error)`: Resolution failed; the cache is left as it was and
    ///   nothing new was subscribed
    pub async fn country_iso(&self) -> Result<CountryCode> {
        let mut state = self.shared.state.lock().await;

        if state.is_listening()
            && let Some(cached) = &state.cached
        {
            debug!("Country cache hit: {}", cached.code);
            return Ok(cached.code.clone());
        }

        if state.subscription.is_some() {
            warn!(
                "{} country listener stopped, resolving again",
                self.source.source_name()
            );
        }

        let delivery = self.delivery_handle()?;

        // Open the change stream before querying so a change that lands
        // mid-query is applied afterwards instead of lost.
        let changes = self.source.watch();
        let code = match self.detect().await {
            Ok(code) => code,
            Err(e) => {
                warn!(
                    "Failed to resolve country from {} source: {}",
                    self.source.source_name(),
                    e
                );
                return Err(e);
            }
        };

        info!(
            "Resolved country {} from {} source",
            code,
            self.source.source_name()
        );
        self.shared.store(&mut state, code.clone(), Origin::Detected);

        let subscription = delivery.spawn(drain_changes(
            Arc::downgrade(&self.shared),
            changes,
            self.source.source_name(),
        ));
        *self.listener.lock().unwrap_or_else(|e| e.into_inner()) =
            Some(subscription.abort_handle());
        state.subscription = Some(subscription);
        info!(
            "Subscribed to {} country change notifications",
            self.source.source_name()
        );

        Ok(code)
    }

    /// Peek at the cached country without resolving it
    pub async fn snapshot(&self) -> Option<CachedCountry> {
        self.shared.state.lock().await.cached.clone()
    }

    /// Whether a country has been resolved yet
    pub async fn is_resolved(&self) -> bool {
        self.shared.state.lock().await.cached.is_some()
    }

    /// Whether a change listener is currently running
    pub async fn is_subscribed(&self) -> bool {
        self.shared.state.lock().await.is_listening()
    }

    /// Receiver that observes every value the cache stores
    ///
    /// Starts at `None` until the first resolution.
    pub fn updates(&self) -> watch::Receiver<Option<CountryCode>> {
        self.shared.updates.subscribe()
    }

    async fn detect(&self) -> Result<CountryCode> {
        match self.resolve_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.source.current())
                .await
                .map_err(|_| Error::Timeout(timeout))?,
            None => self.source.current().await,
        }
    }

    fn delivery_handle(&self) -> Result<Handle> {
        match &self.delivery {
            Some(handle) => Ok(handle.clone()),
            None => Handle::try_current().map_err(|_| {
                Error::config("No tokio runtime available to deliver country changes on")
            }),
        }
    }
}

impl Drop for CountryCache {
    fn drop(&mut self) {
        let listener = self.listener.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(listener) = listener.take() {
            listener.abort();
        }
    }
}

/// Apply change notifications to the cache until the stream or cache ends
async fn drain_changes(shared: Weak<Shared>, mut changes: ChangeStream, source_name: &'static str) {
    while let Some(event) = changes.next().await {
        let Some(shared) = shared.upgrade() else {
            debug!("Country cache dropped, stopping {} listener", source_name);
            return;
        };

        let mut state = shared.state.lock().await;
        debug!(
            "Country change from {} source: {:?} -> {}",
            source_name,
            event.previous_country.as_ref().map(CountryCode::as_str),
            event.new_country
        );
        shared.store(&mut state, event.new_country, Origin::Notified);
    }

    warn!(
        "{} source closed its change stream, next read will resolve again",
        source_name
    );
}
