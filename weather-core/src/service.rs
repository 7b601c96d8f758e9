use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use crate::cache::WeatherCache;
use crate::config::Config;
use crate::error::WeatherError;
use crate::fallback::{self, FallbackPolicy};
use crate::model::{ensure_eight_days, WeatherResult};
use crate::provider::openmeteo::OpenMeteoClient;
use crate::provider::openweather::OpenWeatherClient;

/// Facade over cache, fallback orchestration and output assembly.
///
/// One instance per process; lookups may run concurrently, the cache is the
/// only shared state. Failed lookups never touch the cache.
#[derive(Debug)]
pub struct WeatherService {
    primary: OpenWeatherClient,
    secondary: OpenMeteoClient,
    policy: FallbackPolicy,
    cache: WeatherCache,
}

impl WeatherService {
    /// Wire the service against the production provider hosts.
    pub fn new(config: &Config) -> Result<Self, WeatherError> {
        Ok(Self {
            primary: OpenWeatherClient::new(config.resolved_api_key())?,
            secondary: OpenMeteoClient::new()?,
            policy: config.fallback_policy(),
            cache: WeatherCache::new(config.cache_ttl()),
        })
    }

    /// Custom wiring; tests point the clients at mock servers and shrink
    /// the TTL.
    pub fn with_clients(
        primary: OpenWeatherClient,
        secondary: OpenMeteoClient,
        policy: FallbackPolicy,
        ttl: Duration,
    ) -> Self {
        Self {
            primary,
            secondary,
            policy,
            cache: WeatherCache::new(ttl),
        }
    }

    /// Look up current conditions and an 8-day forecast for `city`.
    ///
    /// The cache key is the trimmed, lowercased city; `force_refresh` skips
    /// the cache read but a successful result is still written back. The
    /// returned forecast always holds exactly eight ascending days,
    /// synthesized placeholders included.
    ///
    /// # Errors
    ///
    /// [`WeatherError::InvalidInput`] for an empty or whitespace-only city,
    /// before any cache or network access. Otherwise the classified failure
    /// of the attempt per the fallback policy.
    pub async fn get_weather(
        &self,
        city: &str,
        force_refresh: bool,
    ) -> Result<WeatherResult, WeatherError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(WeatherError::InvalidInput);
        }
        let key = city.to_lowercase();

        if !force_refresh {
            if let Some(hit) = self.cache.get(&key) {
                debug!(%city, "cache hit");
                return Ok(hit);
            }
        }

        let mut result = fallback::lookup(&self.primary, &self.secondary, &self.policy, city).await?;
        result.forecast = ensure_eight_days(result.forecast, Utc::now().date_naive());

        self.cache.put(&key, result.clone());
        Ok(result)
    }
}
