//! Primary provider client: OpenWeatherMap-shaped API.
//!
//! Two calls per lookup: current conditions by city name, then a daily
//! forecast by the coordinates the first call returned. Payloads are handed
//! back in provider-native shape; normalization happens in the fallback
//! orchestrator.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::error::WeatherError;

const CURRENT_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const ONECALL_URL: &str = "https://api.openweathermap.org/data/3.0/onecall";

/// Per-call timeout for both upstream providers.
pub(crate) const CALL_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: Option<String>,
    http: Client,
    current_url: String,
    onecall_url: String,
}

impl OpenWeatherClient {
    pub fn new(api_key: Option<String>) -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(CALL_TIMEOUT).build()?;
        Ok(Self {
            api_key,
            http,
            current_url: CURRENT_URL.to_string(),
            onecall_url: ONECALL_URL.to_string(),
        })
    }

    /// Point both endpoints at `base` instead of the production hosts.
    /// Used by tests to run against a local mock server.
    pub fn with_base_url(api_key: Option<String>, base: &str) -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(CALL_TIMEOUT).build()?;
        Ok(Self {
            api_key,
            http,
            current_url: format!("{base}/data/2.5/weather"),
            onecall_url: format!("{base}/data/3.0/onecall"),
        })
    }

    fn credential(&self) -> Result<&str, WeatherError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(WeatherError::NoCredential)
    }

    /// Fetch current conditions for `city`. Fails with
    /// [`WeatherError::NoCredential`] before any I/O when no key is set.
    pub async fn fetch_current(&self, city: &str) -> Result<OwCurrent, WeatherError> {
        let key = self.credential()?;

        let res = self
            .http
            .get(&self.current_url)
            .query(&[("q", city), ("appid", key), ("units", "metric")])
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

        serde_json::from_str(&body).map_err(|e| WeatherError::Decode(e.to_string()))
    }

    /// Fetch up to 8 days of daily forecast for the given coordinates.
    /// Independently fallible; the caller degrades to an empty forecast.
    pub async fn fetch_daily(&self, lat: f64, lon: f64) -> Result<Vec<OwDaily>, WeatherError> {
        let key = self.credential()?;

        let res = self
            .http
            .get(&self.onecall_url)
            .query(&[
                ("lat", lat.to_string().as_str()),
                ("lon", lon.to_string().as_str()),
                ("exclude", "minutely,hourly,alerts"),
                ("units", "metric"),
                ("appid", key),
            ])
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

        let parsed: OwOneCall =
            serde_json::from_str(&body).map_err(|e| WeatherError::Decode(e.to_string()))?;
        Ok(parsed.daily.unwrap_or_default())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwCurrent {
    pub name: String,
    pub coord: Option<OwCoord>,
    pub main: OwMain,
    #[serde(default)]
    pub weather: Vec<OwWeather>,
    pub wind: Option<OwWind>,
    pub sys: Option<OwSys>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OwCoord {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwMain {
    pub temp: f64,
    pub humidity: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwWeather {
    pub main: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwWind {
    pub speed: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwSys {
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwOneCall {
    daily: Option<Vec<OwDaily>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwDaily {
    pub dt: i64,
    pub temp: OwDailyTemp,
    #[serde(default)]
    pub weather: Vec<OwWeather>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwDailyTemp {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_credential_fails_before_any_io() {
        let client = OpenWeatherClient::with_base_url(None, "http://127.0.0.1:9")
            .expect("client must build");

        let err = client.fetch_current("Kyiv").await.unwrap_err();
        assert!(matches!(err, WeatherError::NoCredential));
    }

    #[tokio::test]
    async fn empty_credential_counts_as_missing() {
        let client = OpenWeatherClient::with_base_url(Some(String::new()), "http://127.0.0.1:9")
            .expect("client must build");

        let err = client.fetch_daily(50.45, 30.52).await.unwrap_err();
        assert!(matches!(err, WeatherError::NoCredential));
    }

    #[test]
    fn current_payload_deserializes() {
        let json = serde_json::json!({
            "name": "Kyiv",
            "coord": {"lat": 50.45, "lon": 30.52},
            "main": {"temp": 21.3, "humidity": 56},
            "weather": [{"main": "Clouds", "icon": "04d"}],
            "wind": {"speed": 4.2},
            "sys": {"sunrise": 1724900000, "sunset": 1724950000}
        });
        let cur: OwCurrent = serde_json::from_value(json).expect("deserialize");
        assert_eq!(cur.name, "Kyiv");
        assert_eq!(cur.main.temp, 21.3);
        assert_eq!(cur.coord.map(|c| c.lat), Some(50.45));
    }

    #[test]
    fn sparse_current_payload_still_deserializes() {
        let json = serde_json::json!({
            "name": "Kyiv",
            "main": {"temp": 21.3}
        });
        let cur: OwCurrent = serde_json::from_value(json).expect("deserialize");
        assert!(cur.coord.is_none());
        assert!(cur.weather.is_empty());
        assert!(cur.main.humidity.is_none());
    }
}
