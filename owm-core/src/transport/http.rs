use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::router::RequestDescriptor;

use super::Transport;

/// [`Transport`] backed by a shared `reqwest` client.
///
/// Request URLs are stripped from reqwest errors; their query string carries the API key.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new() -> crate::error::Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("owm-core/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http })
    }

    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<Value> {
        let res = self
            .http
            .request(request.method.clone(), request.url.clone())
            .query(&request.query)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| {
                format!("Failed to send request to OpenWeatherMap ({})", request.operation)
            })?;

        let status = res.status();
        let body = res.text().await.map_err(reqwest::Error::without_url).with_context(|| {
            format!("Failed to read OpenWeatherMap {} response body", request.operation)
        })?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeatherMap {} request failed with status {}: {}",
                request.operation,
                status,
                truncate_body(&body),
            ));
        }

        serde_json::from_str(&body).with_context(|| {
            format!("Failed to parse OpenWeatherMap {} JSON", request.operation)
        })
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
