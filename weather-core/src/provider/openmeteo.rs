//! Secondary provider client: Open-Meteo-shaped API, credential-free.
//!
//! A full lookup geocodes the city to coordinates, then fetches current
//! readings and 8 days of daily aggregates in one combined call. A
//! daily-only variant serves forecast enrichment when the primary's own
//! forecast call came back empty.

use reqwest::Client;
use serde::Deserialize;

use crate::error::WeatherError;
use crate::provider::openweather::CALL_TIMEOUT;

const SEARCH_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

const CURRENT_FIELDS: &str = "temperature_2m,weather_code,relative_humidity_2m,wind_speed_10m";
const DAILY_FIELDS: &str = "temperature_2m_min,temperature_2m_max,weather_code,sunrise,sunset";
const DAILY_ONLY_FIELDS: &str = "temperature_2m_min,temperature_2m_max,weather_code";

#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    http: Client,
    search_url: String,
    forecast_url: String,
}

impl OpenMeteoClient {
    pub fn new() -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(CALL_TIMEOUT).build()?;
        Ok(Self {
            http,
            search_url: SEARCH_URL.to_string(),
            forecast_url: FORECAST_URL.to_string(),
        })
    }

    /// Point both endpoints at `base` instead of the production hosts.
    /// Used by tests to run against a local mock server.
    pub fn with_base_url(base: &str) -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(CALL_TIMEOUT).build()?;
        Ok(Self {
            http,
            search_url: format!("{base}/v1/search"),
            forecast_url: format!("{base}/v1/forecast"),
        })
    }

    /// Resolve `city` to its single best coordinate match. Zero matches is
    /// a terminal [`WeatherError::NotFound`].
    pub async fn geocode(&self, city: &str) -> Result<GeoMatch, WeatherError> {
        let res = self
            .http
            .get(&self.search_url)
            .query(&[("name", city), ("count", "1"), ("language", "en"), ("format", "json")])
            .send()
            .await
            .map_err(WeatherError::from_send)?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| WeatherError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(WeatherError::from_status(status.as_u16(), &body, city));
        }

        let parsed: GeoResponse =
            serde_json::from_str(&body).map_err(|e| WeatherError::Decode(e.to_string()))?;
        parsed
            .results
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::NotFound(city.to_owned()))
    }

    /// Combined call: current instantaneous readings plus 8 daily aggregates.
    pub async fn fetch_bundle(&self, lat: f64, lon: f64) -> Result<MeteoBundle, WeatherError> {
        let body = self
            .forecast_request(&[
                ("latitude", lat.to_string().as_str()),
                ("longitude", lon.to_string().as_str()),
                ("current", CURRENT_FIELDS),
                ("daily", DAILY_FIELDS),
                ("forecast_days", "8"),
                ("timezone", "auto"),
            ])
            .await?;

        serde_json::from_str(&body).map_err(|e| WeatherError::Decode(e.to_string()))
    }

    /// Daily aggregates only, for enriching a primary result whose own
    /// forecast came back empty.
    pub async fn fetch_daily(&self, lat: f64, lon: f64) -> Result<Option<MeteoDaily>, WeatherError> {
        let body = self
            .forecast_request(&[
                ("latitude", lat.to_string().as_str()),
                ("longitude", lon.to_string().as_str()),
                ("daily", DAILY_ONLY_FIELDS),
                ("forecast_days", "8"),
                ("timezone", "auto"),
            ])
            .await?;

        let parsed: MeteoDailyOnly =
            serde_json::from_str(&body).map_err(|e| WeatherError::Decode(e.to_string()))?;
        Ok(parsed.daily)
    }

    async fn forecast_request(&self, query: &[(&str, &str)]) -> Result<String, WeatherError> {
        let res = self
            .http
            .get(&self.forecast_url)
            .query(query)
            .send()
            .await
            .map_err(WeatherError::from_send)?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| WeatherError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(WeatherError::Upstream {
                status: status.as_u16(),
                body: crate::error::truncate_body(&body),
            });
        }

        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
struct GeoResponse {
    results: Option<Vec<GeoMatch>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeoMatch {
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeteoBundle {
    pub current: MeteoCurrent,
    pub daily: Option<MeteoDaily>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeteoCurrent {
    pub temperature_2m: f64,
    pub weather_code: Option<u16>,
    pub relative_humidity_2m: Option<f64>,
    /// Already km/h; Open-Meteo's default wind speed unit.
    pub wind_speed_10m: Option<f64>,
}

/// Daily aggregates keyed by parallel index into `time`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeteoDaily {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub weather_code: Vec<Option<u16>>,
    #[serde(default)]
    pub sunrise: Vec<String>,
    #[serde(default)]
    pub sunset: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MeteoDailyOnly {
    daily: Option<MeteoDaily>,
}
