//! Pure unit conversions and condition/icon canonicalization.
//!
//! The two upstream providers disagree on units (°C everywhere, but wind in
//! m/s vs km/h), on condition vocabulary (free text vs WMO numeric codes)
//! and on icon encoding. Everything here is side-effect free; the icon
//! vocabulary is the OpenWeatherMap daytime set (`01d`..`50d`).

/// Generic partly-cloudy icon, used when no mapping rule applies and when
/// the secondary provider omits the weather code entirely.
pub const DEFAULT_ICON: &str = "03d";

/// Round to one decimal place, half away from zero.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Celsius to Fahrenheit, rounded to one decimal.
pub fn c_to_f(celsius: f64) -> f64 {
    round1(celsius * 9.0 / 5.0 + 32.0)
}

/// Absent input stays absent; never coerced to a default.
pub fn c_to_f_opt(celsius: Option<f64>) -> Option<f64> {
    celsius.map(c_to_f)
}

/// Meters per second to kilometers per hour, rounded to one decimal.
pub fn mps_to_kph(mps: f64) -> f64 {
    round1(mps * 3.6)
}

/// Canonical, provider-independent condition taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Clear,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Thunderstorm,
    Unknown,
}

impl Condition {
    pub fn as_str(self) -> &'static str {
        match self {
            Condition::Clear => "Clear",
            Condition::Cloudy => "Cloudy",
            Condition::Fog => "Fog",
            Condition::Drizzle => "Drizzle",
            Condition::Rain => "Rain",
            Condition::Snow => "Snow",
            Condition::Thunderstorm => "Thunderstorm",
            Condition::Unknown => "Unknown",
        }
    }

    /// Map a WMO weather code (secondary provider) to the canonical taxonomy.
    pub fn from_wmo_code(code: u16) -> Self {
        match code {
            0 | 1 => Condition::Clear,
            2 | 3 => Condition::Cloudy,
            45 | 48 => Condition::Fog,
            51 | 53 | 55 | 56 | 57 => Condition::Drizzle,
            61 | 63 | 65 | 66 | 67 | 80 | 81 | 82 => Condition::Rain,
            71 | 73 | 75 | 77 | 85 | 86 => Condition::Snow,
            95 | 96 | 99 => Condition::Thunderstorm,
            _ => Condition::Unknown,
        }
    }

    /// Canonicalize the primary provider's free-text condition ("Clouds",
    /// "light rain", ...) by case-insensitive keyword match, first rule wins.
    pub fn from_text(text: &str) -> Self {
        let t = text.to_lowercase();
        if t.contains("thunder") {
            Condition::Thunderstorm
        } else if t.contains("drizzle") {
            Condition::Drizzle
        } else if t.contains("rain") {
            Condition::Rain
        } else if t.contains("snow") {
            Condition::Snow
        } else if ["mist", "fog", "haze", "smoke"].iter().any(|k| t.contains(k)) {
            Condition::Fog
        } else if t.contains("cloud") || t.contains("overcast") {
            Condition::Cloudy
        } else if t.contains("clear") {
            Condition::Clear
        } else {
            Condition::Unknown
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a WMO weather code to the icon vocabulary, distinguishing cloud
/// density between codes 2 and 3. Unmapped codes get the generic
/// partly-cloudy icon.
pub fn icon_for_wmo_code(code: u16) -> &'static str {
    match code {
        0 | 1 => "01d",
        2 => "02d",
        3 => "03d",
        45 | 48 => "50d",
        51 | 53 | 55 | 56 | 57 => "09d",
        61 | 63 | 65 | 66 | 67 | 80 | 81 | 82 => "10d",
        71 | 73 | 75 | 77 | 85 | 86 => "13d",
        95 | 96 | 99 => "11d",
        _ => DEFAULT_ICON,
    }
}

/// Map the primary provider's free-text condition to an icon code via an
/// ordered keyword list; first matching rule wins, no match falls back to
/// scattered clouds.
pub fn icon_for_text(text: &str) -> &'static str {
    let t = text.to_lowercase();
    if t.contains("thunder") {
        "11d"
    } else if t.contains("drizzle") {
        "09d"
    } else if t.contains("rain") {
        "10d"
    } else if t.contains("snow") {
        "13d"
    } else if ["mist", "fog", "haze", "smoke"].iter().any(|k| t.contains(k)) {
        "50d"
    } else if t.contains("few") {
        "02d"
    } else if t.contains("scattered") {
        "03d"
    } else if ["broken", "overcast", "cloud"].iter().any(|k| t.contains(k)) {
        "04d"
    } else if t.contains("clear") {
        "01d"
    } else {
        DEFAULT_ICON
    }
}
