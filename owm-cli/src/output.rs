use chrono::DateTime;
use owm_core::{Operation, TemperatureFormat};
use serde_json::Value;
use std::fmt::Write;

/// Human-readable summary of a payload.
pub fn render(operation: Operation, payload: &Value, units: TemperatureFormat) -> String {
    match operation {
        Operation::CurrentWeather => render_current(payload, units),
        Operation::Forecast | Operation::DailyForecast | Operation::HistoricalData => {
            render_list(payload, units)
        }
    }
}

fn render_current(payload: &Value, units: TemperatureFormat) -> String {
    let name = payload["name"].as_str().unwrap_or("Unknown location");
    let temp = temperature(payload)
        .map(|t| format_temp(t, units))
        .unwrap_or_else(|| "n/a".to_string());

    format!("{name}: {temp}, {}\n", description(payload))
}

fn render_list(payload: &Value, units: TemperatureFormat) -> String {
    let mut out = String::new();

    if let Some(city) = payload["city"]["name"].as_str() {
        let _ = writeln!(out, "{city}");
    }

    let Some(entries) = payload["list"].as_array() else {
        out.push_str("No entries returned.\n");
        return out;
    };

    for entry in entries {
        let when = entry["dt"]
            .as_i64()
            .and_then(format_timestamp)
            .unwrap_or_else(|| "--/-- --:--".to_string());
        let temp = temperature(entry)
            .map(|t| format_temp(t, units))
            .unwrap_or_else(|| "n/a".to_string());

        let _ = writeln!(out, "{when}  {} {temp}", description(entry));
    }

    out
}

/// `main.temp` for current/hourly entries, `temp.day` for daily ones.
fn temperature(entry: &Value) -> Option<f64> {
    entry["main"]["temp"]
        .as_f64()
        .or_else(|| entry["temp"]["day"].as_f64())
        .or_else(|| entry["temp"].as_f64())
}

fn description(entry: &Value) -> &str {
    entry["weather"][0]["description"]
        .as_str()
        .unwrap_or("unknown")
}

fn format_temp(value: f64, units: TemperatureFormat) -> String {
    format!("{value:.1} {}", units.symbol())
}

/// Epoch seconds as `dd/MM hh:mm` (UTC, 12-hour clock).
pub fn format_timestamp(ts: i64) -> Option<String> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.format("%d/%m %I:%M").to_string())
}
