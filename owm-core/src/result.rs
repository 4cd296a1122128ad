use serde_json::Value;

/// Outcome of a single weather call.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherResult {
    /// Decoded payload, exactly as the service returned it.
    Success(Value),
    /// Human-readable description of whatever went wrong.
    Error(String),
}

impl WeatherResult {
    pub fn is_success(&self) -> bool {
        matches!(self, WeatherResult::Success(_))
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            WeatherResult::Success(value) => Some(value),
            WeatherResult::Error(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            WeatherResult::Success(_) => None,
            WeatherResult::Error(msg) => Some(msg),
        }
    }

    pub fn into_result(self) -> Result<Value, String> {
        match self {
            WeatherResult::Success(value) => Ok(value),
            WeatherResult::Error(msg) => Err(msg),
        }
    }
}

impl From<anyhow::Result<Value>> for WeatherResult {
    fn from(outcome: anyhow::Result<Value>) -> Self {
        match outcome {
            Ok(value) => WeatherResult::Success(value),
            Err(err) => {
                let msg = format!("{err:#}");
                if msg.trim().is_empty() {
                    WeatherResult::Error("Unknown error while calling OpenWeatherMap".to_string())
                } else {
                    WeatherResult::Error(msg)
                }
            }
        }
    }
}
