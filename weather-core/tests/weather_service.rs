//! End-to-end tests for the lookup facade against mocked provider transports.
//!
//! Both provider clients are pointed at local wiremock servers; request
//! expectations double as call-count assertions (verified when the mock
//! servers drop).

use std::time::Duration;

use chrono::{Days, Utc};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use weather_core::provider::openmeteo::OpenMeteoClient;
use weather_core::provider::openweather::OpenWeatherClient;
use weather_core::{
    FallbackPolicy, ProviderId, WeatherError, WeatherService, FORECAST_DAYS,
    PLACEHOLDER_CONDITION,
};

fn service(primary: &MockServer, secondary: &MockServer, api_key: Option<&str>) -> WeatherService {
    let primary = OpenWeatherClient::with_base_url(api_key.map(str::to_owned), &primary.uri())
        .expect("primary client must build");
    let secondary =
        OpenMeteoClient::with_base_url(&secondary.uri()).expect("secondary client must build");
    WeatherService::with_clients(
        primary,
        secondary,
        FallbackPolicy::default(),
        Duration::from_secs(120),
    )
}

fn ow_current_json() -> serde_json::Value {
    json!({
        "name": "Kyiv",
        "coord": {"lat": 50.45, "lon": 30.52},
        "main": {"temp": 21.5, "humidity": 56},
        "weather": [{"main": "Clouds", "icon": "04d"}],
        "wind": {"speed": 4.0},
        "sys": {"sunrise": 1756440000i64, "sunset": 1756488000i64}
    })
}

fn ow_onecall_json(days: usize) -> serde_json::Value {
    let today = Utc::now().date_naive();
    let daily: Vec<_> = (0..days)
        .map(|i| {
            let date = today + Days::new(i as u64);
            let noon = date.and_hms_opt(12, 0, 0).expect("valid time");
            json!({
                "dt": noon.and_utc().timestamp(),
                "temp": {"min": 12.0 + i as f64, "max": 22.0 + i as f64},
                "weather": [{"main": "Clear", "icon": "01d"}]
            })
        })
        .collect();
    json!({"daily": daily})
}

fn geocode_json() -> serde_json::Value {
    json!({
        "results": [
            {"latitude": 50.45, "longitude": 30.52, "name": "Kyiv", "country": "Ukraine"}
        ]
    })
}

fn meteo_bundle_json(days: usize) -> serde_json::Value {
    let today = Utc::now().date_naive();
    let dates: Vec<String> = (0..days)
        .map(|i| (today + Days::new(i as u64)).to_string())
        .collect();
    json!({
        "current": {
            "temperature_2m": 18.4,
            "weather_code": 61,
            "relative_humidity_2m": 77,
            "wind_speed_10m": 12.3
        },
        "daily": {
            "time": dates,
            "temperature_2m_min": vec![10.0; days],
            "temperature_2m_max": vec![20.0; days],
            "weather_code": vec![61; days],
            "sunrise": (0..days).map(|i| format!("{}T06:08", (today + Days::new(i as u64)))).collect::<Vec<_>>(),
            "sunset": (0..days).map(|i| format!("{}T19:52", (today + Days::new(i as u64)))).collect::<Vec<_>>()
        }
    })
}

/// Catch-all mock asserting the server receives no traffic at all.
async fn expect_no_requests(server: &MockServer) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn primary_success_produces_full_result() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "Kyiv"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ow_current_json()))
        .expect(1)
        .mount(&primary)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/3.0/onecall"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ow_onecall_json(8)))
        .expect(1)
        .mount(&primary)
        .await;
    expect_no_requests(&secondary).await;

    let svc = service(&primary, &secondary, Some("KEY"));
    let result = svc.get_weather("Kyiv", false).await.expect("lookup succeeds");

    assert_eq!(result.city, "Kyiv");
    assert_eq!(result.provider, ProviderId::Primary);
    assert_eq!(result.temperature_c, 21.5);
    assert_eq!(result.temperature_f, 70.7);
    assert_eq!(result.condition, "Cloudy");
    assert_eq!(result.icon.as_deref(), Some("04d"));
    assert_eq!(result.wind_kph, Some(14.4));
    assert_eq!(result.forecast.len(), FORECAST_DAYS);
    for pair in result.forecast.windows(2) {
        assert!(pair[0].date < pair[1].date, "dates strictly ascending");
    }
    assert!(result
        .forecast
        .iter()
        .all(|d| d.condition == "Clear" && d.icon.as_deref() == Some("01d")));
}

#[tokio::test]
async fn rate_limited_primary_falls_back_to_secondary() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .expect(1)
        .mount(&primary)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("name", "Kyiv"))
        .respond_with(ResponseTemplate::new(200).set_body_json(geocode_json()))
        .expect(1)
        .mount(&secondary)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(meteo_bundle_json(8)))
        .expect(1)
        .mount(&secondary)
        .await;

    let svc = service(&primary, &secondary, Some("KEY"));
    let result = svc.get_weather("Kyiv", false).await.expect("fallback succeeds");

    assert_eq!(result.provider, ProviderId::Secondary);
    assert_eq!(result.condition, "Rain");
    assert_eq!(result.icon.as_deref(), Some("10d"));
    assert_eq!(result.wind_kph, Some(12.3));
    assert_eq!(result.forecast.len(), FORECAST_DAYS);
}

#[tokio::test]
async fn city_not_found_never_consults_secondary() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(404).set_body_string("{\"message\":\"city not found\"}"))
        .expect(1)
        .mount(&primary)
        .await;
    expect_no_requests(&secondary).await;

    let svc = service(&primary, &secondary, Some("KEY"));
    let err = svc.get_weather("Atlantis", false).await.unwrap_err();

    assert!(matches!(err, WeatherError::NotFound(city) if city == "Atlantis"));
}

#[tokio::test]
async fn missing_credential_goes_straight_to_secondary() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;

    expect_no_requests(&primary).await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(geocode_json()))
        .expect(1)
        .mount(&secondary)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(meteo_bundle_json(8)))
        .expect(1)
        .mount(&secondary)
        .await;

    let svc = service(&primary, &secondary, None);
    let result = svc.get_weather("Kyiv", false).await.expect("fallback succeeds");

    assert_eq!(result.provider, ProviderId::Secondary);
    assert_eq!(result.city, "Kyiv");
}

#[tokio::test]
async fn placeholder_forecast_when_both_daily_sources_fail() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ow_current_json()))
        .expect(1)
        .mount(&primary)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/3.0/onecall"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&primary)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&secondary)
        .await;

    let svc = service(&primary, &secondary, Some("KEY"));
    let result = svc.get_weather("Kyiv", false).await.expect("current alone succeeds");

    assert_eq!(result.provider, ProviderId::Primary);
    assert_eq!(result.forecast.len(), FORECAST_DAYS);
    for day in &result.forecast {
        assert_eq!(day.condition, PLACEHOLDER_CONDITION);
        assert!(day.icon.is_none());
        assert!(day.min_c.is_none() && day.max_c.is_none());
        assert!(day.min_f.is_none() && day.max_f.is_none());
    }
}

#[tokio::test]
async fn empty_primary_forecast_is_enriched_by_secondary_daily() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ow_current_json()))
        .expect(1)
        .mount(&primary)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/3.0/onecall"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"daily": []})))
        .expect(1)
        .mount(&primary)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(meteo_bundle_json(8)))
        .expect(1)
        .mount(&secondary)
        .await;

    let svc = service(&primary, &secondary, Some("KEY"));
    let result = svc.get_weather("Kyiv", false).await.expect("lookup succeeds");

    // Current conditions stay primary even though the forecast came from
    // the secondary's daily aggregates.
    assert_eq!(result.provider, ProviderId::Primary);
    assert_eq!(result.forecast.len(), FORECAST_DAYS);
    assert!(result.forecast.iter().all(|d| d.condition == "Rain"));
}

#[tokio::test]
async fn short_secondary_forecast_is_padded_with_placeholders() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&primary)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(geocode_json()))
        .mount(&secondary)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(meteo_bundle_json(3)))
        .mount(&secondary)
        .await;

    let svc = service(&primary, &secondary, Some("KEY"));
    let result = svc.get_weather("Kyiv", false).await.expect("fallback succeeds");

    assert_eq!(result.forecast.len(), FORECAST_DAYS);
    assert!(result.forecast[..3].iter().all(|d| d.condition == "Rain"));
    assert!(result.forecast[3..]
        .iter()
        .all(|d| d.condition == PLACEHOLDER_CONDITION));
    for pair in result.forecast.windows(2) {
        assert!(pair[0].date < pair[1].date);
    }
}

#[tokio::test]
async fn cached_lookup_hits_upstream_once() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ow_current_json()))
        .expect(1)
        .mount(&primary)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/3.0/onecall"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ow_onecall_json(8)))
        .expect(1)
        .mount(&primary)
        .await;
    expect_no_requests(&secondary).await;

    let svc = service(&primary, &secondary, Some("KEY"));
    let first = svc.get_weather("Kyiv", false).await.expect("first lookup");
    // Same city, different case and padding: one cache key.
    let second = svc.get_weather("  kyiv ", false).await.expect("second lookup");

    assert_eq!(first, second);
}

#[tokio::test]
async fn force_refresh_bypasses_cache_read() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ow_current_json()))
        .expect(2)
        .mount(&primary)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/3.0/onecall"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ow_onecall_json(8)))
        .expect(2)
        .mount(&primary)
        .await;
    expect_no_requests(&secondary).await;

    let svc = service(&primary, &secondary, Some("KEY"));
    svc.get_weather("Kyiv", false).await.expect("first lookup");
    let refreshed = svc.get_weather("Kyiv", true).await.expect("forced refresh");
    // The refreshed result was written back; a plain read now serves it.
    let cached = svc.get_weather("Kyiv", false).await.expect("cached read");

    assert_eq!(refreshed, cached);
}

#[tokio::test]
async fn empty_city_is_rejected_before_any_network_call() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;
    expect_no_requests(&primary).await;
    expect_no_requests(&secondary).await;

    let svc = service(&primary, &secondary, Some("KEY"));
    for city in ["", "   ", "\t\n"] {
        let err = svc.get_weather(city, false).await.unwrap_err();
        assert!(matches!(err, WeatherError::InvalidInput), "city {city:?}");
    }
}

#[tokio::test]
async fn both_providers_failing_is_terminal() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&primary)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&secondary)
        .await;

    let svc = service(&primary, &secondary, Some("KEY"));
    let err = svc.get_weather("Kyiv", false).await.unwrap_err();

    match err {
        WeatherError::AllProvidersFailed { primary, secondary } => {
            assert!(matches!(*primary, WeatherError::Upstream { status: 503, .. }));
            assert!(matches!(*secondary, WeatherError::Upstream { status: 500, .. }));
        }
        other => panic!("expected AllProvidersFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_geocode_result_is_not_found() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&secondary)
        .await;
    expect_no_requests(&primary).await;

    // No credential: the lookup goes straight to the secondary. Its empty
    // geocode answer is the final word on the city and surfaces as a plain
    // NotFound, not a combined failure.
    let svc = service(&primary, &secondary, None);
    let err = svc.get_weather("Atlantis", false).await.unwrap_err();

    assert!(matches!(err, WeatherError::NotFound(city) if city == "Atlantis"));
}

#[tokio::test]
async fn secondary_not_found_propagates_after_eligible_primary_failure() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&primary)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&secondary)
        .await;

    let svc = service(&primary, &secondary, Some("KEY"));
    let err = svc.get_weather("Atlantis", false).await.unwrap_err();

    assert!(matches!(err, WeatherError::NotFound(city) if city == "Atlantis"));
}
