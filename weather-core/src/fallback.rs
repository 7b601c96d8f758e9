//! Fallback orchestration: primary first, secondary on eligible failures.
//!
//! The orchestrator also owns normalization of both provider-native payload
//! shapes into [`WeatherResult`], and the forecast enrichment path that
//! borrows the secondary's daily aggregates when the primary's own forecast
//! call returned nothing.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use tracing::warn;

use crate::convert::{self, Condition};
use crate::error::WeatherError;
use crate::model::{ForecastDay, WeatherResult, FORECAST_DAYS};
use crate::provider::openmeteo::{MeteoBundle, MeteoDaily, OpenMeteoClient};
use crate::provider::openweather::{OpenWeatherClient, OwCurrent, OwDaily};
use crate::provider::ProviderId;

/// Primary-provider HTTP statuses that permit trying the secondary.
/// 400 and 404 are not in the set; city-specific failures stay terminal.
pub const DEFAULT_FALLBACK_STATUSES: &[u16] = &[401, 403, 429, 500, 502, 503, 504];

/// Decides which primary-provider failures may be answered by the secondary
/// provider instead. The status set is configurable; the default preserves
/// the proxy's historical behavior.
#[derive(Debug, Clone)]
pub struct FallbackPolicy {
    statuses: Vec<u16>,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            statuses: DEFAULT_FALLBACK_STATUSES.to_vec(),
        }
    }
}

impl FallbackPolicy {
    pub fn new(statuses: impl Into<Vec<u16>>) -> Self {
        Self {
            statuses: statuses.into(),
        }
    }

    /// Pure classification: true when a primary failure permits the
    /// secondary attempt. Credential, timeout and the configured server/rate
    /// statuses are eligible; everything else fails fast.
    pub fn is_fallback_eligible(&self, err: &WeatherError) -> bool {
        match err {
            WeatherError::NoCredential | WeatherError::Timeout => true,
            WeatherError::Upstream { status, .. } => self.statuses.contains(status),
            _ => false,
        }
    }
}

/// Run the two-attempt state machine for `city`. Never retried beyond the
/// single secondary attempt. The returned forecast may still be empty; the
/// facade pads it to [`FORECAST_DAYS`] entries.
pub(crate) async fn lookup(
    primary: &OpenWeatherClient,
    secondary: &OpenMeteoClient,
    policy: &FallbackPolicy,
    city: &str,
) -> Result<WeatherResult, WeatherError> {
    let primary_err = match primary.fetch_current(city).await {
        Ok(current) => {
            let forecast = primary_forecast(primary, secondary, &current).await;
            return Ok(result_from_primary(current, forecast));
        }
        Err(err) => err,
    };

    if !policy.is_fallback_eligible(&primary_err) {
        return Err(primary_err);
    }
    warn!(%city, error = %primary_err, "primary provider failed, falling back to secondary");

    match secondary_lookup(secondary, city).await {
        Ok(result) => Ok(result),
        // A city the last-resort provider cannot resolve is the final
        // answer in its own right, not a combined failure.
        Err(err @ WeatherError::NotFound(_)) => Err(err),
        Err(secondary_err) => Err(WeatherError::AllProvidersFailed {
            primary: Box::new(primary_err),
            secondary: Box::new(secondary_err),
        }),
    }
}

/// Primary forecast with enrichment: the primary's own daily call wins when
/// it returns anything; only an empty result is backfilled from the
/// secondary's daily aggregates at the same coordinates. Failures of either
/// sub-call degrade to an empty forecast, never to a lookup failure.
async fn primary_forecast(
    primary: &OpenWeatherClient,
    secondary: &OpenMeteoClient,
    current: &OwCurrent,
) -> Vec<ForecastDay> {
    let Some(coord) = current.coord else {
        warn!(city = %current.name, "primary current payload had no coordinates, skipping forecast");
        return Vec::new();
    };

    let mut forecast = match primary.fetch_daily(coord.lat, coord.lon).await {
        Ok(daily) => days_from_onecall(daily),
        Err(err) => {
            warn!(error = %err, "primary daily forecast failed");
            Vec::new()
        }
    };

    if forecast.is_empty() {
        match secondary.fetch_daily(coord.lat, coord.lon).await {
            Ok(Some(daily)) => forecast = days_from_meteo_daily(&daily),
            Ok(None) => warn!("secondary enrichment returned no daily block"),
            Err(err) => warn!(error = %err, "secondary forecast enrichment failed"),
        }
    }

    forecast
}

/// Full secondary attempt: geocode, then one combined current+daily call.
async fn secondary_lookup(
    secondary: &OpenMeteoClient,
    city: &str,
) -> Result<WeatherResult, WeatherError> {
    let place = secondary.geocode(city).await?;
    let bundle = secondary.fetch_bundle(place.latitude, place.longitude).await?;
    Ok(result_from_secondary(place.name, &bundle))
}

fn result_from_primary(current: OwCurrent, forecast: Vec<ForecastDay>) -> WeatherResult {
    let weather = current.weather.first();
    let condition_text = weather.and_then(|w| w.main.as_deref()).unwrap_or("");
    let condition = if condition_text.is_empty() {
        Condition::Unknown
    } else {
        Condition::from_text(condition_text)
    };
    let icon = weather.and_then(|w| w.icon.clone());

    let sys = current.sys.as_ref();
    WeatherResult {
        city: current.name.clone(),
        temperature_c: current.main.temp,
        temperature_f: convert::c_to_f(current.main.temp),
        condition: condition.to_string(),
        icon,
        humidity: current.main.humidity,
        wind_kph: current
            .wind
            .as_ref()
            .and_then(|w| w.speed)
            .map(convert::mps_to_kph),
        sunrise: sys.and_then(|s| s.sunrise).and_then(iso_from_unix),
        sunset: sys.and_then(|s| s.sunset).and_then(iso_from_unix),
        provider: ProviderId::Primary,
        forecast,
    }
}

fn result_from_secondary(city: String, bundle: &MeteoBundle) -> WeatherResult {
    let current = &bundle.current;
    let code = current.weather_code;
    let daily = bundle.daily.as_ref();

    WeatherResult {
        city,
        temperature_c: current.temperature_2m,
        temperature_f: convert::c_to_f(current.temperature_2m),
        condition: code
            .map(Condition::from_wmo_code)
            .unwrap_or(Condition::Unknown)
            .to_string(),
        // A missing code gets the same generic icon as an unmapped one.
        icon: Some(code.map_or(convert::DEFAULT_ICON, convert::icon_for_wmo_code).to_string()),
        humidity: current.relative_humidity_2m,
        wind_kph: current.wind_speed_10m.map(convert::round1),
        sunrise: daily.and_then(|d| d.sunrise.first().cloned()),
        sunset: daily.and_then(|d| d.sunset.first().cloned()),
        provider: ProviderId::Secondary,
        forecast: daily.map(days_from_meteo_daily).unwrap_or_default(),
    }
}

/// Normalize the primary's daily entries, capped at [`FORECAST_DAYS`].
fn days_from_onecall(daily: Vec<OwDaily>) -> Vec<ForecastDay> {
    daily
        .into_iter()
        .take(FORECAST_DAYS)
        .filter_map(|day| {
            let date = date_from_unix(day.dt)?;
            let weather = day.weather.first();
            let text = weather.and_then(|w| w.main.as_deref());
            Some(ForecastDay {
                date,
                min_c: day.temp.min,
                max_c: day.temp.max,
                min_f: convert::c_to_f_opt(day.temp.min),
                max_f: convert::c_to_f_opt(day.temp.max),
                condition: text
                    .map(Condition::from_text)
                    .unwrap_or(Condition::Unknown)
                    .to_string(),
                icon: weather
                    .and_then(|w| w.icon.clone())
                    .or_else(|| text.map(|t| convert::icon_for_text(t).to_string())),
            })
        })
        .collect()
}

/// Normalize the secondary's parallel daily arrays, keyed by index into
/// `time`. Malformed dates are skipped.
fn days_from_meteo_daily(daily: &MeteoDaily) -> Vec<ForecastDay> {
    daily
        .time
        .iter()
        .enumerate()
        .filter_map(|(i, t)| {
            let date: NaiveDate = t.parse().ok()?;
            let min_c = daily.temperature_2m_min.get(i).copied().flatten();
            let max_c = daily.temperature_2m_max.get(i).copied().flatten();
            let code = daily.weather_code.get(i).copied().flatten();
            Some(ForecastDay {
                date,
                min_c,
                max_c,
                min_f: convert::c_to_f_opt(min_c),
                max_f: convert::c_to_f_opt(max_c),
                condition: code
                    .map(Condition::from_wmo_code)
                    .unwrap_or(Condition::Unknown)
                    .to_string(),
                icon: Some(
                    code.map_or(convert::DEFAULT_ICON, convert::icon_for_wmo_code).to_string(),
                ),
            })
        })
        .collect()
}

fn date_from_unix(ts: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(ts, 0).map(|dt| dt.date_naive())
}

fn iso_from_unix(ts: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}
