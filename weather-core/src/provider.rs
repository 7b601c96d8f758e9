use serde::{Deserialize, Serialize};

pub mod openmeteo;
pub mod openweather;

/// Which upstream answered the current-conditions part of a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// The credentialed, first-choice provider (OpenWeatherMap-shaped API).
    Primary,
    /// The credential-free fallback provider (Open-Meteo-shaped API).
    Secondary,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Primary => "primary",
            ProviderId::Secondary => "secondary",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
