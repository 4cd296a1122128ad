use anyhow::{Context, anyhow, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::{Args, Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Select};
use owm_core::{
    Call, Config, Coordinate, Language, Location, TemperatureFormat, WeatherClient,
};
use std::{fmt, path::Path};
use tracing::debug;

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "owm", version, about = "OpenWeatherMap CLI")]
pub struct Cli {
    /// API key to use instead of the stored one.
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Temperature units: celsius, fahrenheit or kelvin.
    #[arg(long, global = true)]
    pub units: Option<String>,

    /// Language code for descriptions, e.g. "it" or "zh_cn".
    #[arg(long, global = true)]
    pub lang: Option<String>,

    /// Print the raw JSON payload instead of a summary.
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key and default units/language.
    Configure,

    /// Show current weather.
    Current(LocationArgs),

    /// Show the 5 day / 3 hour forecast.
    Forecast(LocationArgs),

    /// Show the daily forecast.
    Daily(LocationArgs),

    /// Show hourly historical data.
    History {
        #[command(flatten)]
        location: LocationArgs,

        /// Start of the range (RFC 3339, "YYYY-MM-DD HH:MM", "YYYY-MM-DD" or epoch seconds).
        #[arg(long)]
        start: String,

        /// Optional end of the range, same formats as --start.
        #[arg(long)]
        end: Option<String>,
    },
}

/// Either a city name or a coordinate pair.
#[derive(Debug, Args)]
pub struct LocationArgs {
    /// City query, e.g. "London,UK".
    #[arg(conflicts_with_all = ["lat", "lon"])]
    pub city: Option<String>,

    /// Latitude in degrees.
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude in degrees.
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,
}

impl LocationArgs {
    pub fn to_location(&self) -> anyhow::Result<Location> {
        match (&self.city, self.lat, self.lon) {
            (Some(city), _, _) => Ok(Location::City(city.clone())),
            (None, Some(lat), Some(lon)) => Ok(Location::Coordinates(Coordinate::new(lat, lon))),
            _ => Err(anyhow!("Specify a city name or both --lat and --lon.")),
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let call = match &self.command {
            Command::Configure => return configure(),
            Command::Current(loc) => Call::CurrentWeather(loc.to_location()?),
            Command::Forecast(loc) => Call::Forecast(loc.to_location()?),
            Command::Daily(loc) => Call::DailyForecast(loc.to_location()?),
            Command::History { location, start, end } => Call::HistoricalData {
                location: location.to_location()?,
                start: parse_instant(start)?,
                end: end.as_deref().map(parse_instant).transpose()?,
            },
        };

        let config = self.effective_config(&Config::config_file_path()?)?;
        let client = WeatherClient::from_config(&config)?;
        let operation = call.operation();
        debug!(%operation, units = %client.temperature_format(), "running command");

        let payload = client
            .execute(call)
            .await
            .into_result()
            .map_err(|msg| anyhow!(msg))?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&payload)?);
        } else {
            print!("{}", output::render(operation, &payload, client.temperature_format()));
        }

        Ok(())
    }

    /// Config stored at `path` with command-line overrides applied.
    fn effective_config(&self, path: &Path) -> anyhow::Result<Config> {
        debug!(path = %path.display(), "loading configuration");
        let mut config = Config::load_from(path)?;

        if let Some(key) = &self.api_key {
            config.set_api_key(key.clone());
        }
        if let Some(units) = &self.units {
            config.temperature_format = Some(TemperatureFormat::try_from(units.as_str())?);
        }
        if let Some(lang) = &self.lang {
            config.language = Some(Language::try_from(lang.as_str())?);
        }

        Ok(config)
    }
}

struct LanguageChoice(Language);

impl fmt::Display for LanguageChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0.name(), self.0.as_str())
    }
}

fn configure() -> anyhow::Result<()> {
    let path = Config::config_file_path()?;
    debug!(path = %path.display(), "loading configuration");
    let mut config = Config::load_from(&path)?;

    let api_key = Password::new("OpenWeatherMap API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }
    config.set_api_key(api_key);

    let formats = TemperatureFormat::all().to_vec();
    let current = config.temperature_format.unwrap_or_default();
    let cursor = formats.iter().position(|f| *f == current).unwrap_or(0);
    let format = Select::new("Temperature units:", formats)
        .with_starting_cursor(cursor)
        .prompt()
        .context("Failed to read temperature units")?;
    config.temperature_format = Some(format);

    let languages: Vec<LanguageChoice> =
        Language::all().iter().copied().map(LanguageChoice).collect();
    let current = config.language.unwrap_or_default();
    let cursor = languages.iter().position(|l| l.0 == current).unwrap_or(0);
    let language = Select::new("Language:", languages)
        .with_starting_cursor(cursor)
        .prompt()
        .context("Failed to read language")?;
    config.language = Some(language.0);

    config.save_to(&path)?;
    debug!(path = %path.display(), "configuration saved");
    println!("Configuration saved to {}", path.display());

    Ok(())
}

/// Parse a user-supplied instant, interpreting naive times as UTC.
pub fn parse_instant(input: &str) -> anyhow::Result<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M") {
        return Ok(ndt.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
            return Ok(ndt.and_utc());
        }
    }
    if let Ok(secs) = input.parse::<i64>() {
        if let Some(dt) = DateTime::from_timestamp(secs, 0) {
            return Ok(dt);
        }
    }

    Err(anyhow!(
        "Could not parse date '{input}'. Use RFC 3339, \"YYYY-MM-DD HH:MM\", \"YYYY-MM-DD\" or epoch seconds."
    ))
}
