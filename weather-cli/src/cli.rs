use anyhow::Context;
use clap::{Parser, Subcommand};

use weather_core::{Config, WeatherResult, WeatherService, PLACEHOLDER_CONDITION};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather aggregation proxy CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key for the primary provider.
    Configure,

    /// Show current conditions and the 8-day forecast for a city.
    Show {
        /// City name, e.g. "Kyiv".
        city: String,

        /// Bypass the response cache for this lookup.
        #[arg(long)]
        refresh: bool,

        /// Print the raw JSON wire shape instead of the table.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, refresh, json } => show(&city, refresh, json).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("Primary provider API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    config.api_key = if api_key.is_empty() { None } else { Some(api_key) };
    config.save()?;

    let path = Config::config_file_path()?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}

async fn show(city: &str, refresh: bool, json: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let service = WeatherService::new(&config).context("Failed to initialize weather service")?;

    let result = service.get_weather(city, refresh).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        render(&result);
    }
    Ok(())
}

fn render(result: &WeatherResult) {
    let today = chrono::Local::now().date_naive();
    println!("Weather for {} ({}) - {}", result.city, result.provider, today);
    println!(
        "  {} {}  {:.1} C / {:.1} F",
        result.condition,
        result.icon.as_deref().unwrap_or("-"),
        result.temperature_c,
        result.temperature_f,
    );
    if let Some(humidity) = result.humidity {
        println!("  Humidity: {humidity:.0}%");
    }
    if let Some(wind) = result.wind_kph {
        println!("  Wind: {wind:.1} km/h");
    }
    if let (Some(sunrise), Some(sunset)) = (&result.sunrise, &result.sunset) {
        println!("  Sunrise: {sunrise}  Sunset: {sunset}");
    }

    println!("\n  Forecast:");
    for day in &result.forecast {
        if day.condition == PLACEHOLDER_CONDITION {
            println!("    {}  (no data)", day.date);
            continue;
        }
        let range = match (day.min_c, day.max_c) {
            (Some(min), Some(max)) => format!("{min:.1}..{max:.1} C"),
            (Some(min), None) => format!("{min:.1}.. C"),
            (None, Some(max)) => format!("..{max:.1} C"),
            (None, None) => "-".to_string(),
        };
        println!(
            "    {}  {:12}  {}",
            day.date,
            range,
            day.condition,
        );
    }
}
