use thiserror::Error;

/// Errors raised while constructing a client or reading its settings.
///
/// Failures of individual weather calls never surface here; they are
/// delivered as [`crate::WeatherResult::Error`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error(
        "No API key configured.\n\
         Hint: run `owm configure` and enter your OpenWeatherMap API key."
    )]
    MissingApiKey,

    #[error("No Tokio runtime is running; background calls need one")]
    NoRuntime,

    #[error("Unknown language '{0}'. Supported codes: {1}.")]
    UnknownLanguage(String, String),

    #[error(
        "Unknown temperature format '{0}'. Supported formats: celsius, fahrenheit, kelvin."
    )]
    UnknownTemperatureFormat(String),
}

pub type Result<T> = std::result::Result<T, Error>;
