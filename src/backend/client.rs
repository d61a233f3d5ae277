//! Timed JSON POST client shared by the provider backends.

use super::schema::TdoaResponse;
use crate::error::{GeoError, ProviderError, Result};
use crate::metrics;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::debug;

/// Authentication header expected by the providers
pub const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

pub struct ProviderClient {
    backend: &'static str,
    http: reqwest::Client,
    api_key: String,
    request_timeout: Duration,
}

impl ProviderClient {
    pub fn new(backend: &'static str, api_key: String, request_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| GeoError::ConfigError(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            backend,
            http,
            api_key,
            request_timeout,
        })
    }

    /// POSTs `body` to `url` and decodes the provider response envelope.
    ///
    /// The whole exchange, including reading the body, is bounded by the
    /// request timeout. The duration is recorded under `endpoint` either way.
    pub async fn post<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        url: &str,
        body: &T,
    ) -> std::result::Result<TdoaResponse, ProviderError> {
        let start = Instant::now();
        let resp = self.send(url, body).await;
        let elapsed = start.elapsed();

        metrics::observe_api_duration(self.backend, endpoint, elapsed);
        debug!(
            backend = self.backend,
            endpoint = endpoint,
            duration_ms = elapsed.as_millis() as u64,
            success = resp.is_ok(),
            "geolocation api call finished"
        );

        resp
    }

    async fn send<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> std::result::Result<TdoaResponse, ProviderError> {
        let bb = serde_json::to_vec(body).map_err(ProviderError::Encode)?;

        let request = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
            .body(bb);

        tokio::time::timeout(self.request_timeout, exchange(request))
            .await
            .map_err(|_| ProviderError::Timeout(self.request_timeout))?
    }
}

async fn exchange(
    request: reqwest::RequestBuilder,
) -> std::result::Result<TdoaResponse, ProviderError> {
    let resp = request.send().await?;
    let status = resp.status();
    let bytes = resp.bytes().await?;

    if status != StatusCode::OK {
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&bytes).into_owned(),
        });
    }

    serde_json::from_slice(&bytes).map_err(ProviderError::Decode)
}
