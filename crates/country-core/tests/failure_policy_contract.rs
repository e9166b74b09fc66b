//! Contract Test: Failure Propagation
//!
//! Constraints verified:
//! - A failed cold-start resolution is returned to the caller
//! - Failure is never cached: the next read asks the source again
//! - Nothing is subscribed until a resolution succeeds
//!
//! If this test fails, the cache is hiding or memoizing source failures.

mod common;

use common::*;
use country_core::{CacheConfig, CountryCache, Error};

#[tokio::test]
async fn failure_is_propagated_then_retried() {
    let source = ControlledCountrySource::failing("US", 1);
    let cache = CountryCache::new(source.as_source(), CacheConfig::default());

    let err = cache.country_iso().await.unwrap_err();
    assert!(matches!(err, Error::SourceUnavailable(_)), "got {:?}", err);
    assert!(err.is_transient());
    assert!(!cache.is_resolved().await);
    assert!(!cache.is_subscribed().await);
    assert_eq!(source.active_watchers(), 0, "failed read left a subscription");

    assert_eq!(cache.country_iso().await.unwrap(), "US");
    assert_eq!(source.current_call_count(), 2);
    assert_eq!(source.active_watchers(), 1);
    assert!(cache.is_subscribed().await);
}

#[tokio::test]
async fn persistent_failure_is_reported_on_every_read() {
    let source = ControlledCountrySource::failing("US", usize::MAX);
    let cache = CountryCache::new(source.as_source(), CacheConfig::default());

    for attempt in 1..=3 {
        let err = cache.country_iso().await.unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable(_)));
        assert_eq!(source.current_call_count(), attempt);
    }

    assert!(cache.snapshot().await.is_none());
    assert_eq!(source.active_watchers(), 0);
}

#[tokio::test]
async fn changes_before_first_success_are_ignored() {
    let source = ControlledCountrySource::failing("US", 1);
    let cache = CountryCache::new(source.as_source(), CacheConfig::default());

    cache.country_iso().await.unwrap_err();
    source.emit_change("IE");

    assert!(cache.snapshot().await.is_none());
    assert_eq!(cache.country_iso().await.unwrap(), "IE");
}
