//! Core library for the weather aggregation proxy.
//!
//! Given a city name, [`WeatherService::get_weather`] returns normalized
//! current conditions plus an 8-day forecast, sourced from a credentialed
//! primary provider with automatic fallback to a credential-free secondary
//! provider, behind a short-lived response cache.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Provider clients and fallback orchestration
//! - Unit and condition/icon canonicalization
//! - Shared domain models and the error taxonomy
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod cache;
pub mod config;
pub mod convert;
pub mod error;
pub mod fallback;
pub mod model;
pub mod provider;
pub mod service;

pub use cache::WeatherCache;
pub use config::Config;
pub use error::WeatherError;
pub use fallback::FallbackPolicy;
pub use model::{ForecastDay, WeatherResult, FORECAST_DAYS, PLACEHOLDER_CONDITION};
pub use provider::ProviderId;
pub use service::WeatherService;
