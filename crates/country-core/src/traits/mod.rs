//! Core traits for the country monitor
//!
//! - [`CountrySource`]: Detect the current country and watch for changes

pub mod country_source;

pub use country_source::{CountryChangeEvent, CountryCode, CountrySource, CountrySourceFactory};
