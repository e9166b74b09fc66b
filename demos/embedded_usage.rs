//! Minimal embedding example for country-core
//!
//! An application that already learns about country changes from its own
//! stack registers a `host` country source with the registry, builds the
//! cache context from configuration, and every other part of the
//! application reads the country through the shared cache.
//!
//! ## Configuration
//!
//! - `COUNTRY_INITIAL`: Country reported on cold start (default: US)
//! - `COUNTRY_ROAMING`: Country to switch to afterwards (default: GB)
//! - `COUNTRY_RESOLVE_TIMEOUT_SECS`: Cold-start timeout (default: none)
//! - `COUNTRY_LOG_LEVEL`: trace, debug, info, warn, error (default: info)

use anyhow::{Context, Result};
use country_core::traits::{CountrySource, CountrySourceFactory};
use country_core::{
    CacheConfig, CountryCache, CountryCode, CountryConfig, CountryContext, ManualCountrySource,
    SourceConfig, SourceRegistry,
};
use serde::Deserialize;
use std::env;
use std::time::Duration;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

/// Demo configuration
struct Config {
    initial: String,
    roaming: String,
    resolve_timeout_secs: Option<u64>,
    log_level: Level,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let log_level = match env::var("COUNTRY_LOG_LEVEL")
            .unwrap_or_else(|_| "info".to_string())
            .to_lowercase()
            .as_str()
        {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            other => anyhow::bail!(
                "COUNTRY_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                other
            ),
        };

        let resolve_timeout_secs = env::var("COUNTRY_RESOLVE_TIMEOUT_SECS")
            .ok()
            .map(|s| s.parse::<u64>())
            .transpose()
            .context("COUNTRY_RESOLVE_TIMEOUT_SECS must be a number of seconds")?;

        Ok(Self {
            initial: env::var("COUNTRY_INITIAL").unwrap_or_else(|_| "US".to_string()),
            roaming: env::var("COUNTRY_ROAMING").unwrap_or_else(|_| "GB".to_string()),
            resolve_timeout_secs,
            log_level,
        })
    }

    /// Country monitor configuration for the `host` source
    fn country_config(&self) -> CountryConfig {
        CountryConfig {
            source: SourceConfig::Custom {
                factory: "host".to_string(),
                config: serde_json::json!({ "country": self.initial }),
            },
            cache: CacheConfig {
                resolve_timeout_secs: self.resolve_timeout_secs,
            },
        }
    }
}

/// Settings accepted by the `host` source
#[derive(Deserialize)]
struct HostSourceSettings {
    country: CountryCode,
}

/// Hands out clones of the application's own manual source
struct HostSourceFactory {
    handle: ManualCountrySource,
}

impl CountrySourceFactory for HostSourceFactory {
    fn create(&self, config: &SourceConfig) -> country_core::Result<Box<dyn CountrySource>> {
        let SourceConfig::Custom { config, .. } = config else {
            return Err(country_core::Error::config("host source needs a custom config"));
        };
        let settings: HostSourceSettings = serde_json::from_value(config.clone())?;

        self.handle.set_country(settings.country);
        Ok(Box::new(self.handle.clone()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    // The application keeps this handle to push changes it detects itself.
    let host = ManualCountrySource::new(CountryCode::new(&config.initial)?);

    let registry = SourceRegistry::with_builtin();
    registry.register_source(
        "host",
        Box::new(HostSourceFactory {
            handle: host.clone(),
        }),
    );
    info!("Registered country sources: {:?}", registry.list_sources());

    let context = CountryContext::from_config(&registry, &config.country_config())?;
    info!("Context ready: {:?}", context);

    let cache = CountryCache::get_instance(&context);
    info!("Current country: {}", cache.country_iso().await?);

    let mut updates = cache.updates();
    if host.set_country(CountryCode::new(&config.roaming)?) {
        tokio::time::timeout(Duration::from_secs(1), updates.changed())
            .await
            .context("Country change was not delivered")??;
    }

    info!("Current country after roaming: {}", cache.country_iso().await?);
    if let Some(snapshot) = cache.snapshot().await {
        info!(
            "Stored at {} ({:?})",
            snapshot.updated_at.to_rfc3339(),
            snapshot.origin
        );
    }

    Ok(())
}
