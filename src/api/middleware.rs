use axum::{
    body::Body,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

/// Logs method, path, status and latency of every request
pub async fn request_logging(request: Request<Body>, next: Next<Body>) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let latency_ms = start.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::warn!(%method, path = %path, status = status.as_u16(), latency_ms, "Request failed");
    } else {
        tracing::info!(%method, path = %path, status = status.as_u16(), latency_ms, "Request handled");
    }

    response
}

/// Security headers middleware
pub async fn security_headers(request: Request<Body>, next: Next<Body>) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();

    // X-Content-Type-Options - Prevent MIME sniffing
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );

    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

    response
}
