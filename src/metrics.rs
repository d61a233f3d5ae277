//! Prometheus metrics for the geolocation backends.

use anyhow::Result;
use lazy_static::lazy_static;
use prometheus::{register_histogram_vec, Encoder, HistogramVec, TextEncoder};
use std::time::Duration;

lazy_static! {
    /// Duration of provider API calls, per backend and endpoint.
    pub static ref BACKEND_API_DURATION: HistogramVec = register_histogram_vec!(
        "backend_api_duration_seconds",
        "The duration of geolocation backend API calls (per backend and endpoint).",
        &["backend", "endpoint"]
    )
    .expect("backend_api_duration_seconds is registered once");
}

pub fn observe_api_duration(backend: &str, endpoint: &str, elapsed: Duration) {
    BACKEND_API_DURATION
        .with_label_values(&[backend, endpoint])
        .observe(elapsed.as_secs_f64());
}

/// Encodes all registered metrics in the Prometheus text format.
pub fn encode_metrics() -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
