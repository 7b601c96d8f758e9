use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::provider::ProviderId;

/// Number of forecast entries every result carries, real or synthesized.
pub const FORECAST_DAYS: usize = 8;

/// Condition sentinel on synthesized forecast days. Callers that need to
/// distinguish real from placeholder data check for this value.
pub const PLACEHOLDER_CONDITION: &str = "N/A";

/// Normalized current conditions plus an 8-day forecast, provider-agnostic.
///
/// Serialized field names follow the proxy's wire shape (`temperatureC`,
/// `windKph`, ...). Immutable once assembled; callers receive their own copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherResult {
    /// Canonical city name as resolved by the answering provider.
    pub city: String,
    pub temperature_c: f64,
    pub temperature_f: f64,
    /// One of the canonical taxonomy: Clear, Cloudy, Fog, Drizzle, Rain,
    /// Snow, Thunderstorm, Unknown.
    pub condition: String,
    pub icon: Option<String>,
    pub humidity: Option<f64>,
    pub wind_kph: Option<f64>,
    /// ISO-8601 timestamps, when the provider supplied them.
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
    pub provider: ProviderId,
    /// Always exactly [`FORECAST_DAYS`] entries, dates strictly ascending.
    pub forecast: Vec<ForecastDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub min_c: Option<f64>,
    pub max_c: Option<f64>,
    pub min_f: Option<f64>,
    pub max_f: Option<f64>,
    pub condition: String,
    pub icon: Option<String>,
}

impl ForecastDay {
    fn placeholder(date: NaiveDate) -> Self {
        Self {
            date,
            min_c: None,
            max_c: None,
            min_f: None,
            max_f: None,
            condition: PLACEHOLDER_CONDITION.to_string(),
            icon: None,
        }
    }
}

/// Synthesize [`FORECAST_DAYS`] placeholder entries for `start` through
/// `start + 7`, all temperatures null.
pub fn placeholder_forecast(start: NaiveDate) -> Vec<ForecastDay> {
    let mut days = Vec::with_capacity(FORECAST_DAYS);
    let mut date = start;
    for _ in 0..FORECAST_DAYS {
        days.push(ForecastDay::placeholder(date));
        date = date.succ_opt().unwrap_or(date);
    }
    days
}

/// Enforce the output invariant: exactly [`FORECAST_DAYS`] entries, dates
/// strictly ascending with no duplicates.
///
/// An empty input becomes a full placeholder run starting `today`. A short
/// input keeps whatever the upstream supplied and is padded with placeholder
/// days continuing after its last date. Oversized input is truncated.
pub fn ensure_eight_days(mut forecast: Vec<ForecastDay>, today: NaiveDate) -> Vec<ForecastDay> {
    if forecast.is_empty() {
        return placeholder_forecast(today);
    }

    forecast.sort_by_key(|d| d.date);
    forecast.dedup_by_key(|d| d.date);
    forecast.truncate(FORECAST_DAYS);

    let mut next = forecast
        .last()
        .map(|d| d.date.succ_opt().unwrap_or(d.date))
        .unwrap_or(today);
    while forecast.len() < FORECAST_DAYS {
        forecast.push(ForecastDay::placeholder(next));
        next = next.succ_opt().unwrap_or(next);
    }
    forecast
}
