use thiserror::Error;

/// Classified failures of a weather lookup.
///
/// The fallback orchestrator inspects these to decide whether the secondary
/// provider may be tried; see [`crate::fallback::FallbackPolicy`].
#[derive(Debug, Error)]
pub enum WeatherError {
    /// The caller passed an empty or whitespace-only city. Rejected before
    /// any cache or network access.
    #[error("city must not be empty")]
    InvalidInput,

    /// The provider that was consulted could not resolve the city.
    #[error("city not found: {0}")]
    NotFound(String),

    /// No API key is configured for the primary provider.
    #[error(
        "no API key configured for the primary provider.\n\
         Hint: run `weather configure` or set OPENWEATHER_API_KEY."
    )]
    NoCredential,

    /// An upstream call exceeded the per-request timeout.
    #[error("upstream request timed out")]
    Timeout,

    /// An upstream call returned a non-success HTTP status.
    #[error("upstream request failed with status {status}: {body}")]
    Upstream { status: u16, body: String },

    /// The request could not be sent or the connection broke mid-flight.
    #[error("failed to reach upstream: {0}")]
    Transport(String),

    /// The upstream body was not the JSON shape we expect.
    #[error("failed to decode upstream response: {0}")]
    Decode(String),

    /// Both the primary attempt and the secondary fallback failed.
    #[error("all providers failed: primary: {primary}; secondary: {secondary}")]
    AllProvidersFailed {
        primary: Box<WeatherError>,
        secondary: Box<WeatherError>,
    },

    /// The HTTP client itself could not be constructed.
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl WeatherError {
    /// Classify a `reqwest` send failure. Status-bearing responses are
    /// handled at the call site; this only sees transport-level errors.
    pub(crate) fn from_send(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            WeatherError::Timeout
        } else {
            WeatherError::Transport(err.to_string())
        }
    }

    /// Classify a non-success status from an upstream current-conditions
    /// call. A 404-equivalent means the city itself is unresolvable.
    pub(crate) fn from_status(status: u16, body: &str, city: &str) -> Self {
        if status == 404 {
            WeatherError::NotFound(city.to_owned())
        } else {
            WeatherError::Upstream {
                status,
                body: truncate_body(body),
            }
        }
    }
}

/// Cap upstream bodies quoted in errors and logs.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        let cut: String = body.chars().take(MAX).collect();
        format!("{cut}...")
    } else {
        body.to_string()
    }
}
