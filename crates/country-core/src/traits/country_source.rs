// # Country Source Trait
//
// Defines the interface for detecting the current country and monitoring
// country changes.
//
// ## Implementations
//
// - Manual (host-driven): `ManualCountrySource` in this crate
// - Future: platform location services, SIM/network operator lookups
//
// ## Usage
//
// ```rust,ignore
// use country_core::CountrySource;
// use tokio_stream::StreamExt;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* CountrySource implementation */;
//
//     // Get current country
//     let country = source.current().await?;
//
//     // Watch for changes
//     let mut stream = source.watch();
//     while let Some(change) = stream.next().await {
//         println!("Country changed: {:?}", change);
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::pin::Pin;
use std::str::FromStr;
use tokio_stream::Stream;

/// An ISO 3166-1 alpha-2 country code
///
/// Always two ASCII letters, stored in uppercase. Lowercase input is
/// accepted and normalised, anything else is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    /// Parse and normalise a country code
    ///
    /// # Returns
    ///
    /// - `Ok(CountryCode)`: `code` had exactly two ASCII letters
    /// - `Err(Error::InvalidCountryCode)`: otherwise
    pub fn new(code: &str) -> crate::Result<Self> {
        let code = code.trim();
        if code.len() != 2 || !code.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(crate::Error::invalid_country_code(format!(
                "expected two ASCII letters, got '{}'",
                code
            )));
        }

        Ok(Self(code.to_ascii_uppercase()))
    }

    /// The code as an uppercase string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CountryCode {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for CountryCode {
    type Error = crate::Error;

    fn try_from(value: String) -> crate::Result<Self> {
        Self::new(&value)
    }
}

impl From<CountryCode> for String {
    fn from(code: CountryCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CountryCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for CountryCode {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Represents a detected country change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryChangeEvent {
    /// The newly detected country
    pub new_country: CountryCode,
    /// The previous country (if known)
    pub previous_country: Option<CountryCode>,
}

impl CountryChangeEvent {
    /// Create a new country change event
    pub fn new(new_country: CountryCode, previous_country: Option<CountryCode>) -> Self {
        Self {
            new_country,
            previous_country,
        }
    }
}

/// Trait for country source implementations
///
/// This trait defines two core capabilities:
/// 1. **current()**: Detect the current country right now
/// 2. **watch()**: Stream of country change notifications
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// ## Responsibilities
///
/// Sources own detection and any retry/backoff against their backing
/// service. They do not cache on behalf of callers; that is the job of
/// [`CountryCache`](crate::CountryCache).
#[async_trait]
pub trait CountrySource: Send + Sync {
    /// Detect the current country
    ///
    /// # Returns
    ///
    /// - `Ok(CountryCode)`: The currently detected country
    /// - `Err(Error::SourceUnavailable)`: If the backing service cannot answer
    async fn current(&self) -> Result<CountryCode, crate::Error>;

    /// Watch for country changes
    ///
    /// Returns a stream that yields a [`CountryChangeEvent`] whenever the
    /// detected country changes. The stream should run for as long as the
    /// source is alive.
    ///
    /// # Behavior
    ///
    /// - Yields only on change, never the initial value
    /// - Must be cancellation-safe (dropping the stream cleans up resources)
    fn watch(&self) -> Pin<Box<dyn Stream<Item = CountryChangeEvent> + Send + 'static>>;

    /// Short name used in logs
    fn source_name(&self) -> &'static str {
        "unnamed"
    }
}

/// Helper trait for constructing country sources from configuration
pub trait CountrySourceFactory: Send + Sync {
    /// Create a CountrySource instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration specific to this source type
    fn create(
        &self,
        config: &crate::config::SourceConfig,
    ) -> Result<Box<dyn CountrySource>, crate::Error>;
}
