//! Test doubles and common utilities for cache contract tests
//!
//! This module provides a scripted country source that counts how the
//! cache talks to it.

#![allow(dead_code)]

use country_core::error::{Error, Result};
use country_core::traits::{CountryChangeEvent, CountryCode, CountrySource};
use country_core::CountryCache;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

/// Parse a country code (test helper)
pub fn code(s: &str) -> CountryCode {
    CountryCode::new(s).expect("valid country code")
}

/// A country source that can fail, stall and emit changes on demand
pub struct ControlledCountrySource {
    /// Country reported by current()
    current: std::sync::Mutex<CountryCode>,
    /// Number of upcoming current() calls that fail
    failures_remaining: AtomicUsize,
    /// How long current() takes to answer
    detect_delay: Duration,
    /// Fan-out for change events
    changes: broadcast::Sender<CountryChangeEvent>,
    /// Call counter for current()
    current_call_count: AtomicUsize,
    /// Call counter for watch()
    watch_call_count: AtomicUsize,
}

impl ControlledCountrySource {
    /// Create a source that immediately reports `initial`
    pub fn new(initial: &str) -> Arc<Self> {
        Self::build(initial, 0, Duration::ZERO)
    }

    /// Create a source whose detection takes `delay`
    pub fn slow(initial: &str, delay: Duration) -> Arc<Self> {
        Self::build(initial, 0, delay)
    }

    /// Create a source whose first `failures` detections fail
    pub fn failing(initial: &str, failures: usize) -> Arc<Self> {
        Self::build(initial, failures, Duration::ZERO)
    }

    fn build(initial: &str, failures: usize, detect_delay: Duration) -> Arc<Self> {
        let (changes, _) = broadcast::channel(64);
        Arc::new(Self {
            current: std::sync::Mutex::new(code(initial)),
            failures_remaining: AtomicUsize::new(failures),
            detect_delay,
            changes,
            current_call_count: AtomicUsize::new(0),
            watch_call_count: AtomicUsize::new(0),
        })
    }

    /// Get the number of times current() was called
    pub fn current_call_count(&self) -> usize {
        self.current_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times watch() was called
    pub fn watch_call_count(&self) -> usize {
        self.watch_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of change streams still alive
    pub fn active_watchers(&self) -> usize {
        self.changes.receiver_count()
    }

    /// Report a country change to all watchers
    pub fn emit_change(&self, new_country: &str) {
        let new_country = code(new_country);
        let previous = std::mem::replace(
            &mut *self.current.lock().unwrap(),
            new_country.clone(),
        );
        let _ = self
            .changes
            .send(CountryChangeEvent::new(new_country, Some(previous)));
    }

    /// Upcast for handing to the cache
    pub fn as_source(self: &Arc<Self>) -> Arc<dyn CountrySource> {
        Arc::clone(self) as Arc<dyn CountrySource>
    }
}

#[async_trait::async_trait]
impl CountrySource for ControlledCountrySource {
    async fn current(&self) -> Result<CountryCode> {
        self.current_call_count.fetch_add(1, Ordering::SeqCst);

        let detected = self.current.lock().unwrap().clone();
        if !self.detect_delay.is_zero() {
            tokio::time::sleep(self.detect_delay).await;
        }

        let failing = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Error::source_unavailable("country detector not running"));
        }

        Ok(detected)
    }

    fn watch(&self) -> Pin<Box<dyn Stream<Item = CountryChangeEvent> + Send + 'static>> {
        self.watch_call_count.fetch_add(1, Ordering::SeqCst);

        let stream = BroadcastStream::new(self.changes.subscribe()).filter_map(|item| item.ok());
        Box::pin(stream)
    }

    fn source_name(&self) -> &'static str {
        "controlled"
    }
}

/// Wait until the cache has stored `expected`, failing the test after a second
pub async fn wait_for_country(cache: &CountryCache, expected: &str) {
    let expected = code(expected);
    let mut updates = cache.updates();

    tokio::time::timeout(
        Duration::from_secs(1),
        updates.wait_for(|value| value.as_ref() == Some(&expected)),
    )
    .await
    .unwrap_or_else(|_| panic!("cache never stored {}", expected))
    .expect("cache alive");
}
