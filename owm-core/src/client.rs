//! Stateful façade over the router and transport.
//!
//! The client only stores its base settings (API key, units, language). Every
//! call merges those with its own location and time parameters into a fresh
//! [`ParamSet`], so nothing one call writes is seen by the next one.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{debug, instrument, warn};

use crate::{
    config::Config,
    error::{Error, Result},
    params::{Language, ParamSet, TemperatureFormat, keys},
    result::WeatherResult,
    router::{Operation, RequestDescriptor, Router},
    transport::{HttpTransport, Transport},
};

/// Latitude/longitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// How a call addresses the place it asks about.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    /// Free-form city query such as `"London,UK"`.
    City(String),
    Coordinates(Coordinate),
}

impl Location {
    fn write_params(&self, params: &mut ParamSet) {
        match self {
            Location::City(name) => params.insert(keys::CITY, name.as_str()),
            Location::Coordinates(coord) => {
                params.insert(keys::LAT, coord.latitude.to_string());
                params.insert(keys::LON, coord.longitude.to_string());
            }
        }
    }
}

/// One fully described weather query.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CurrentWeather(Location),
    Forecast(Location),
    DailyForecast(Location),
    HistoricalData {
        location: Location,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    },
}

impl Call {
    pub fn operation(&self) -> Operation {
        match self {
            Call::CurrentWeather(_) => Operation::CurrentWeather,
            Call::Forecast(_) => Operation::Forecast,
            Call::DailyForecast(_) => Operation::DailyForecast,
            Call::HistoricalData { .. } => Operation::HistoricalData,
        }
    }

    pub fn location(&self) -> &Location {
        match self {
            Call::CurrentWeather(location)
            | Call::Forecast(location)
            | Call::DailyForecast(location)
            | Call::HistoricalData { location, .. } => location,
        }
    }

    /// Parameters this call adds on top of the client's base settings.
    pub fn overrides(&self) -> ParamSet {
        let mut params = ParamSet::new();
        self.location().write_params(&mut params);

        if let Call::HistoricalData { start, end, .. } = self {
            params.insert(keys::TYPE, "hour");
            params.insert(keys::START, start.timestamp());
            if let Some(end) = end {
                params.insert(keys::END, end.timestamp());
            }
        }

        params
    }
}

/// Asynchronous OpenWeatherMap client.
///
/// Cloning is cheap; clones share the transport but not the settings.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    router: Router,
    transport: Arc<dyn Transport>,
    api_key: String,
    temperature_format: TemperatureFormat,
    language: Option<Language>,
}

impl WeatherClient {
    /// Client for the public endpoint with Kelvin units and no language set.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            router: Router::new()?,
            transport: Arc::new(HttpTransport::new()?),
            api_key: api_key.into(),
            temperature_format: TemperatureFormat::default(),
            language: None,
        })
    }

    pub fn with_options(
        api_key: impl Into<String>,
        temperature_format: Option<TemperatureFormat>,
        language: Option<Language>,
    ) -> Result<Self> {
        let mut client = Self::new(api_key)?;
        if let Some(format) = temperature_format {
            client.set_temperature_format(format);
        }
        if let Some(lang) = language {
            client.set_language(lang);
        }
        Ok(client)
    }

    /// Build a client from the stored configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.api_key().ok_or(Error::MissingApiKey)?;
        Self::with_options(api_key, config.temperature_format, config.language)
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    pub fn temperature_format(&self) -> TemperatureFormat {
        self.temperature_format
    }

    pub fn set_temperature_format(&mut self, format: TemperatureFormat) {
        self.temperature_format = format;
    }

    pub fn language(&self) -> Option<Language> {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = Some(language);
    }

    /// Parameters sent with every call.
    pub fn base_params(&self) -> ParamSet {
        let mut params = ParamSet::new();
        params.insert(keys::APP_ID, self.api_key.as_str());
        if let Some(units) = self.temperature_format.units_param() {
            params.insert(keys::UNITS, units);
        }
        if let Some(lang) = self.language {
            params.insert(keys::LANG, lang.as_str());
        }
        params
    }

    /// Route `call` against the current settings without sending it.
    pub fn prepare(&self, call: &Call) -> RequestDescriptor {
        let params = self.base_params().merged(&call.overrides());
        self.router.route(call.operation(), &params)
    }

    /// Send `call` and normalize the outcome.
    #[instrument(skip(self), fields(operation = %call.operation()))]
    pub async fn execute(&self, call: Call) -> WeatherResult {
        let request = self.prepare(&call);
        dispatch(self.transport.as_ref(), &request).await
    }

    /// Start `call` in the background and report through `on_complete`.
    ///
    /// The request is built before this returns; `on_complete` runs exactly
    /// once, later, on a task of the current Tokio runtime. Outside a runtime
    /// this returns [`Error::NoRuntime`] and `on_complete` is never called.
    pub fn submit<F>(&self, call: Call, on_complete: F) -> Result<JoinHandle<()>>
    where
        F: FnOnce(WeatherResult) + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        let request = self.prepare(&call);
        let transport = Arc::clone(&self.transport);

        Ok(runtime.spawn(async move {
            let result = dispatch(transport.as_ref(), &request).await;
            on_complete(result);
        }))
    }

    pub async fn current_weather_by_city_name(&self, city: &str) -> WeatherResult {
        self.execute(Call::CurrentWeather(Location::City(city.to_string())))
            .await
    }

    pub async fn current_weather_by_coordinates(&self, coordinate: Coordinate) -> WeatherResult {
        self.execute(Call::CurrentWeather(Location::Coordinates(coordinate)))
            .await
    }

    pub async fn forecast_by_city_name(&self, city: &str) -> WeatherResult {
        self.execute(Call::Forecast(Location::City(city.to_string())))
            .await
    }

    pub async fn forecast_by_coordinates(&self, coordinate: Coordinate) -> WeatherResult {
        self.execute(Call::Forecast(Location::Coordinates(coordinate)))
            .await
    }

    pub async fn daily_forecast_by_city_name(&self, city: &str) -> WeatherResult {
        self.execute(Call::DailyForecast(Location::City(city.to_string())))
            .await
    }

    pub async fn daily_forecast_by_coordinates(&self, coordinate: Coordinate) -> WeatherResult {
        self.execute(Call::DailyForecast(Location::Coordinates(coordinate)))
            .await
    }

    /// Hourly history from `start`, up to `end` when given.
    pub async fn historical_data_by_city_name(
        &self,
        city: &str,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> WeatherResult {
        self.execute(Call::HistoricalData {
            location: Location::City(city.to_string()),
            start,
            end,
        })
        .await
    }

    pub async fn historical_data_by_coordinates(
        &self,
        coordinate: Coordinate,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> WeatherResult {
        self.execute(Call::HistoricalData {
            location: Location::Coordinates(coordinate),
            start,
            end,
        })
        .await
    }
}

async fn dispatch(transport: &dyn Transport, request: &RequestDescriptor) -> WeatherResult {
    // `url` carries no query string, so the API key stays out of the logs.
    debug!(url = %request.url, params = request.query.len(), "sending {} request", request.operation);

    let result = WeatherResult::from(transport.send(request).await);

    if let WeatherResult::Error(msg) = &result {
        warn!(operation = %request.operation, error = %msg, "weather call failed");
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::RecordingTransport;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn client_with(transport: Arc<RecordingTransport>) -> WeatherClient {
        WeatherClient::new("K").unwrap().with_transport(transport)
    }

    fn replying() -> Arc<RecordingTransport> {
        Arc::new(RecordingTransport::replying(json!({"cod": 200})))
    }

    #[tokio::test]
    async fn city_call_carries_settings_and_query() {
        let transport = replying();
        let client =
            WeatherClient::with_options("K", Some(TemperatureFormat::Celsius), Some(Language::Italian))
                .unwrap()
                .with_transport(transport.clone());

        let result = client.current_weather_by_city_name("London,UK").await;

        assert!(result.is_success());
        let request = transport.last_request();
        assert_eq!(request.operation, Operation::CurrentWeather);
        assert_eq!(request.url.path(), "/data/2.5/weather");
        assert_eq!(request.query_value("APPID"), Some("K"));
        assert_eq!(request.query_value("units"), Some("metric"));
        assert_eq!(request.query_value("lang"), Some("it"));
        assert_eq!(request.query_value("q"), Some("London,UK"));
    }

    #[tokio::test]
    async fn units_follow_temperature_format() {
        let transport = replying();
        let mut client = client_with(transport.clone());

        for format in [TemperatureFormat::Celsius, TemperatureFormat::Fahrenheit] {
            client.set_temperature_format(format);
            client.forecast_by_city_name("Paris").await;
            assert_eq!(transport.last_request().query_value("units"), Some(format.as_str()));
        }

        client.set_temperature_format(TemperatureFormat::Kelvin);
        client.forecast_by_city_name("Paris").await;
        assert_eq!(transport.last_request().query_value("units"), None);
    }

    #[tokio::test]
    async fn lang_follows_language() {
        let transport = replying();
        let mut client = client_with(transport.clone());

        client.current_weather_by_city_name("Paris").await;
        assert_eq!(transport.last_request().query_value("lang"), None);

        for lang in Language::all() {
            client.set_language(*lang);
            client.current_weather_by_city_name("Paris").await;
            assert_eq!(transport.last_request().query_value("lang"), Some(lang.as_str()));
        }
    }

    #[tokio::test]
    async fn location_does_not_leak_between_calls() {
        let transport = replying();
        let client = client_with(transport.clone());

        client.current_weather_by_city_name("London,UK").await;
        client
            .current_weather_by_coordinates(Coordinate::new(51.5, -0.12))
            .await;

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].query_value("q"), Some("London,UK"));

        let second = &requests[1];
        assert_eq!(second.query_value("lat"), Some("51.5"));
        assert_eq!(second.query_value("lon"), Some("-0.12"));
        assert_eq!(second.query_value("q"), None);
    }

    #[tokio::test]
    async fn historical_without_end_omits_end() {
        let transport = replying();
        let client = client_with(transport.clone());
        let start = Utc.with_ymd_and_hms(2015, 4, 11, 0, 0, 0).unwrap();

        client
            .historical_data_by_city_name("London,UK", start, None)
            .await;

        let request = transport.last_request();
        assert_eq!(request.url.path(), "/data/2.5/history/city");
        assert_eq!(request.query_value("type"), Some("hour"));
        assert_eq!(request.query_value("start"), Some("1428710400"));
        assert_eq!(request.query_value("end"), None);
    }

    #[tokio::test]
    async fn historical_with_end_sends_both_bounds() {
        let transport = replying();
        let client = client_with(transport.clone());
        let start = Utc.with_ymd_and_hms(2015, 4, 11, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2015, 4, 12, 0, 0, 0).unwrap();

        client
            .historical_data_by_coordinates(Coordinate::new(45.46, 9.19), start, Some(end))
            .await;

        let request = transport.last_request();
        assert_eq!(request.query_value("start"), Some("1428710400"));
        assert_eq!(request.query_value("end"), Some("1428796800"));
        assert_eq!(request.query_value("lat"), Some("45.46"));
        assert_eq!(request.query_value("lon"), Some("9.19"));
    }

    #[tokio::test]
    async fn time_range_does_not_leak_into_later_calls() {
        let transport = replying();
        let client = client_with(transport.clone());
        let start = Utc.with_ymd_and_hms(2015, 4, 11, 0, 0, 0).unwrap();

        client
            .historical_data_by_city_name("Oslo", start, Some(start))
            .await;
        client.daily_forecast_by_city_name("Oslo").await;

        let request = transport.last_request();
        assert_eq!(request.url.path(), "/data/2.5/forecast/daily");
        for key in ["type", "start", "end"] {
            assert_eq!(request.query_value(key), None, "{key} leaked");
        }
    }

    #[tokio::test]
    async fn every_entry_point_routes_to_its_operation() {
        let transport = replying();
        let client = client_with(transport.clone());
        let here = Coordinate::new(1.0, 2.0);
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();

        client.current_weather_by_city_name("A").await;
        client.current_weather_by_coordinates(here).await;
        client.forecast_by_city_name("A").await;
        client.forecast_by_coordinates(here).await;
        client.daily_forecast_by_city_name("A").await;
        client.daily_forecast_by_coordinates(here).await;
        client.historical_data_by_city_name("A", start, None).await;
        client.historical_data_by_coordinates(here, start, None).await;

        let ops: Vec<Operation> = transport.requests().iter().map(|r| r.operation).collect();
        assert_eq!(
            ops,
            vec![
                Operation::CurrentWeather,
                Operation::CurrentWeather,
                Operation::Forecast,
                Operation::Forecast,
                Operation::DailyForecast,
                Operation::DailyForecast,
                Operation::HistoricalData,
                Operation::HistoricalData,
            ]
        );
    }

    #[tokio::test]
    async fn transport_failure_becomes_error_result() {
        let transport = Arc::new(RecordingTransport::failing("connection reset"));
        let client = client_with(transport);

        let result = client.forecast_by_coordinates(Coordinate::new(0.0, 0.0)).await;

        assert_eq!(result, WeatherResult::Error("connection reset".to_string()));
    }

    #[tokio::test]
    async fn submit_calls_back_once_after_returning() {
        let payload = json!({"name": "London", "list": []});
        let transport = Arc::new(RecordingTransport::replying(payload.clone()));
        let client = client_with(transport);
        let calls = Arc::new(AtomicUsize::new(0));
        let received = Arc::new(Mutex::new(None));

        let handle = {
            let calls = Arc::clone(&calls);
            let received = Arc::clone(&received);
            client
                .submit(Call::Forecast(Location::City("London".into())), move |result| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    *received.lock().unwrap() = Some(result);
                })
                .unwrap()
        };

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        handle.await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            received.lock().unwrap().take(),
            Some(WeatherResult::Success(payload))
        );
    }

    #[tokio::test]
    async fn submit_reports_failure_once() {
        let transport = Arc::new(RecordingTransport::failing("timed out"));
        let client = client_with(transport);
        let calls = Arc::new(AtomicUsize::new(0));
        let received = Arc::new(Mutex::new(Vec::new()));

        let handle = {
            let calls = Arc::clone(&calls);
            let received = Arc::clone(&received);
            client.submit(
                Call::CurrentWeather(Location::Coordinates(Coordinate::new(10.0, 20.0))),
                move |result| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    received.lock().unwrap().push(result);
                },
            )
            .unwrap()
        };
        handle.await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let results = received.lock().unwrap();
        let msg = results[0].error_message().expect("expected an error result");
        assert!(!msg.is_empty());
    }

    #[tokio::test]
    async fn submit_snapshots_settings_at_call_time() {
        let transport = replying();
        let mut client = client_with(transport.clone());
        client.set_temperature_format(TemperatureFormat::Celsius);

        let handle = client
            .submit(Call::CurrentWeather(Location::City("Rome".into())), |_| {})
            .unwrap();
        client.set_temperature_format(TemperatureFormat::Fahrenheit);
        handle.await.unwrap();

        assert_eq!(transport.last_request().query_value("units"), Some("metric"));
    }

    #[test]
    fn submit_without_runtime_is_an_error() {
        let client = client_with(replying());
        let calls = Arc::new(AtomicUsize::new(0));

        let outcome = {
            let calls = Arc::clone(&calls);
            client.submit(Call::CurrentWeather(Location::City("Rome".into())), move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            })
        };

        assert!(matches!(outcome, Err(Error::NoRuntime)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn from_config_requires_api_key() {
        let err = WeatherClient::from_config(&Config::default()).unwrap_err();
        assert!(matches!(err, Error::MissingApiKey));
    }

    #[test]
    fn from_config_applies_preferences() {
        let cfg = Config {
            api_key: Some("KEY".into()),
            temperature_format: Some(TemperatureFormat::Fahrenheit),
            language: Some(Language::German),
        };

        let client = WeatherClient::from_config(&cfg).unwrap();

        assert_eq!(client.temperature_format(), TemperatureFormat::Fahrenheit);
        assert_eq!(client.language(), Some(Language::German));
        let params = client.base_params();
        assert_eq!(params.len(), 3);
        assert!(params.contains_key("APPID"));
    }
}
