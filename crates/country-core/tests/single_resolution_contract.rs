//! Contract Test: Resolve Once, Subscribe Once
//!
//! Constraints verified:
//! - Concurrent cold-start reads query the source exactly once
//! - Exactly one change subscription is registered, ever
//! - Warm reads are served from the cache without touching the source
//!
//! If this test fails, the cold-start critical section is broken.

mod common;

use common::*;
use country_core::{CacheConfig, CountryCache};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_cold_reads_resolve_once() {
    let source = ControlledCountrySource::slow("FR", Duration::from_millis(50));
    let cache = Arc::new(CountryCache::new(source.as_source(), CacheConfig::default()));

    let barrier = Arc::new(tokio::sync::Barrier::new(16));
    let readers: Vec<_> = (0..16)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                cache.country_iso().await
            })
        })
        .collect();

    for reader in readers {
        let country = reader.await.unwrap().expect("resolution succeeds");
        assert_eq!(country, "FR");
    }

    assert_eq!(source.current_call_count(), 1, "source queried more than once");
    assert_eq!(source.watch_call_count(), 1, "more than one subscription");
    assert_eq!(source.active_watchers(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn two_simultaneous_readers_see_same_country() {
    let source = ControlledCountrySource::slow("FR", Duration::from_millis(20));
    let cache = Arc::new(CountryCache::new(source.as_source(), CacheConfig::default()));

    let (first, second) = tokio::join!(
        tokio::spawn({
            let cache = Arc::clone(&cache);
            async move { cache.country_iso().await }
        }),
        tokio::spawn({
            let cache = Arc::clone(&cache);
            async move { cache.country_iso().await }
        }),
    );

    assert_eq!(first.unwrap().unwrap(), "FR");
    assert_eq!(second.unwrap().unwrap(), "FR");
    assert_eq!(source.current_call_count(), 1);
}

#[tokio::test]
async fn warm_reads_do_not_touch_source() {
    let source = ControlledCountrySource::new("US");
    let cache = CountryCache::new(source.as_source(), CacheConfig::default());

    let first = cache.country_iso().await.unwrap();
    for _ in 0..10 {
        assert_eq!(cache.country_iso().await.unwrap(), first);
    }

    assert_eq!(source.current_call_count(), 1);
    assert_eq!(source.watch_call_count(), 1);
}

#[tokio::test]
async fn construction_performs_no_io() {
    let source = ControlledCountrySource::new("US");
    let cache = CountryCache::new(source.as_source(), CacheConfig::default());

    assert!(!cache.is_resolved().await);
    assert!(!cache.is_subscribed().await);
    assert!(cache.snapshot().await.is_none());
    assert_eq!(source.current_call_count(), 0);
    assert_eq!(source.watch_call_count(), 0);
}
