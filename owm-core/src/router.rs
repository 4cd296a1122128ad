use reqwest::{Method, Url};
use std::fmt;

use crate::{
    error::{Error, Result},
    params::ParamSet,
};

pub const BASE_URL: &str = "http://api.openweathermap.org/data/";
pub const API_VERSION: &str = "2.5";

/// The logical weather queries the service answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CurrentWeather,
    Forecast,
    DailyForecast,
    HistoricalData,
}

impl Operation {
    pub fn path(&self) -> &'static str {
        match self {
            Operation::CurrentWeather => "/weather",
            Operation::Forecast => "/forecast",
            Operation::DailyForecast => "/forecast/daily",
            Operation::HistoricalData => "/history/city",
        }
    }

    pub fn method(&self) -> Method {
        Method::GET
    }

    pub const fn all() -> &'static [Operation] {
        &[
            Operation::CurrentWeather,
            Operation::Forecast,
            Operation::DailyForecast,
            Operation::HistoricalData,
        ]
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::CurrentWeather => "current weather",
            Operation::Forecast => "forecast",
            Operation::DailyForecast => "daily forecast",
            Operation::HistoricalData => "historical data",
        };
        f.write_str(name)
    }
}

/// Everything the transport needs to issue one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub operation: Operation,
    pub method: Method,
    /// Endpoint URL without query string.
    pub url: Url,
    pub query: Vec<(String, String)>,
}

impl RequestDescriptor {
    /// Value of the first query pair named `key`.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// URL with the encoded query string appended.
    pub fn full_url(&self) -> Url {
        let mut url = self.url.clone();
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        url
    }
}

/// Maps an [`Operation`] and its parameters onto a concrete request.
#[derive(Debug, Clone)]
pub struct Router {
    base: Url,
}

impl Router {
    /// Router for the public OpenWeatherMap endpoint.
    pub fn new() -> Result<Self> {
        Self::with_base_url(&format!("{BASE_URL}{API_VERSION}"))
    }

    /// Router rooted at another host, e.g. a local mock server.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| Error::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        if base.cannot_be_a_base() {
            return Err(Error::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "URL cannot carry a path".to_string(),
            });
        }

        Ok(Self { base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn route(&self, operation: Operation, params: &ParamSet) -> RequestDescriptor {
        let mut url = self.base.clone();
        let path = format!("{}{}", self.base.path().trim_end_matches('/'), operation.path());
        url.set_path(&path);
        url.set_query(None);

        RequestDescriptor {
            operation,
            method: operation.method(),
            url,
            query: params.to_query_pairs(),
        }
    }
}
