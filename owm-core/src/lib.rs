//! Client library for the OpenWeatherMap 2.5 API.
//!
//! This crate defines:
//! - Query parameters, units and languages
//! - Routing of weather operations onto endpoints
//! - An async client delivering a unified success/error result
//! - Configuration & credentials handling
//!
//! It is used by `owm-cli`, but can also be reused by other binaries or services.

pub mod client;
pub mod config;
pub mod error;
pub mod params;
pub mod result;
pub mod router;
pub mod transport;

pub use client::{Call, Coordinate, Location, WeatherClient};
pub use config::Config;
pub use error::Error;
pub use params::{Language, ParamSet, ParamValue, TemperatureFormat};
pub use result::WeatherResult;
pub use router::{Operation, RequestDescriptor, Router};
pub use transport::{HttpTransport, Transport};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> WeatherClient {
        let router = Router::with_base_url(&format!("{}/data/2.5", server.uri())).unwrap();
        WeatherClient::with_options("K", Some(TemperatureFormat::Celsius), Some(Language::Italian))
            .unwrap()
            .with_router(router)
    }

    #[tokio::test]
    async fn current_weather_end_to_end() {
        let server = MockServer::start().await;
        let payload = json!({
            "name": "London",
            "main": {"temp": 14.3},
            "weather": [{"description": "cielo sereno"}]
        });

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("APPID", "K"))
            .and(query_param("units", "metric"))
            .and(query_param("lang", "it"))
            .and(query_param("q", "London,UK"))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server).current_weather_by_city_name("London,UK").await;

        assert_eq!(result, WeatherResult::Success(payload));
    }

    #[tokio::test]
    async fn http_error_end_to_end() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast/daily"))
            .respond_with(
                ResponseTemplate::new(404).set_body_string(r#"{"cod":"404","message":"city not found"}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server).daily_forecast_by_city_name("Atlantis").await;

        let msg = result.error_message().expect("expected an error result");
        assert!(msg.contains("404"));
        assert!(msg.contains("city not found"));
    }

    #[tokio::test]
    async fn network_failure_does_not_expose_api_key() {
        let router = Router::with_base_url("http://127.0.0.1:9/data/2.5").unwrap();
        let client = WeatherClient::new("SECRETKEY").unwrap().with_router(router);

        let result = client.current_weather_by_city_name("London").await;

        let msg = result.error_message().expect("expected an error result");
        assert!(!msg.is_empty());
        assert!(!msg.contains("SECRETKEY"), "API key leaked: {msg}");
    }

    #[tokio::test]
    async fn submit_end_to_end() {
        let server = MockServer::start().await;
        let payload = json!({"list": [{"dt": 1428710400}]});

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .and(query_param("lat", "51.5"))
            .and(query_param("lon", "-0.12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let (tx, rx) = tokio::sync::oneshot::channel();
        client_for(&server)
            .submit(
                Call::Forecast(Location::Coordinates(Coordinate::new(51.5, -0.12))),
                move |result| {
                    let _ = tx.send(result);
                },
            )
            .unwrap()
            .await
            .unwrap();

        assert_eq!(rx.await.unwrap(), WeatherResult::Success(payload));
    }
}
