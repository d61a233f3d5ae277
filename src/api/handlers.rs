use crate::backend::Backend;
use crate::error::{ErrorKind, GeoError};
use crate::metrics;
use crate::model::geo::{ResolveMultiFrameTdoaRequest, ResolveResponse, ResolveTdoaRequest};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

const MAX_PAYLOAD_SIZE: usize = 1_048_576;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn Backend>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub backend: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for GeoError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let (status, message) = match (&self, kind) {
            (_, ErrorKind::InvalidArgument) => (StatusCode::BAD_REQUEST, self.to_string()),
            (_, ErrorKind::Unknown) => {
                tracing::error!(error = %self, "Geolocation error");
                (StatusCode::BAD_GATEWAY, "geolocation error".to_string())
            }
            (GeoError::ProviderErrors(_), ErrorKind::Internal) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            (_, ErrorKind::Internal) => {
                tracing::error!(error = %self, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred. Please try again later.".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: kind.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

fn decode_request<T: DeserializeOwned>(payload: &Bytes) -> Result<T, GeoError> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(GeoError::InvalidArgument(format!(
            "Payload exceeds maximum size of {} bytes",
            MAX_PAYLOAD_SIZE
        )));
    }

    serde_json::from_slice(payload)
        .map_err(|e| GeoError::InvalidArgument(format!("invalid request body: {}", e)))
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: state.backend.name().to_string(),
    })
}

/// Resolve the location of a single uplink frame
pub async fn resolve_tdoa(
    State(state): State<AppState>,
    payload: Bytes,
) -> Result<Json<ResolveResponse>, GeoError> {
    let req: ResolveTdoaRequest = decode_request(&payload)?;

    tracing::debug!(
        dev_eui = %req.dev_eui(),
        rx_info = req.frame_rx_info.as_ref().map_or(0, |f| f.rx_info.len()),
        "Received resolve TDOA request"
    );

    let resp = state.backend.resolve_tdoa(&req).await?;
    Ok(Json(resp))
}

/// Resolve the location using multiple uplink frames
pub async fn resolve_multi_frame_tdoa(
    State(state): State<AppState>,
    payload: Bytes,
) -> Result<Json<ResolveResponse>, GeoError> {
    let req: ResolveMultiFrameTdoaRequest = decode_request(&payload)?;

    tracing::debug!(
        dev_eui = %req.dev_eui(),
        frames = req.frame_rx_info_set.len(),
        "Received resolve multi-frame TDOA request"
    );

    let resp = state.backend.resolve_multi_frame_tdoa(&req).await?;
    Ok(Json(resp))
}

/// Prometheus scrape endpoint
pub async fn metrics_handler() -> Response {
    match metrics::encode_metrics() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testutil::StubBackend;
    use crate::error::ProviderError;
    use crate::translate::tests::valid_plain_request;

    fn create_test_state(backend: StubBackend) -> AppState {
        AppState {
            backend: Arc::new(backend),
        }
    }

    async fn error_body(resp: Response) -> ErrorResponseBody {
        let bytes = hyper::body::to_bytes(resp.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[derive(Debug, serde::Deserialize)]
    struct ErrorResponseBody {
        error: String,
        message: String,
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = health_check(State(create_test_state(StubBackend::new()))).await;
        assert_eq!(response.0.status, "ok");
        assert_eq!(response.0.backend, "stub");
    }

    #[tokio::test]
    async fn test_resolve_tdoa() {
        let state = create_test_state(StubBackend::new());
        let payload = Bytes::from(serde_json::to_vec(&valid_plain_request()).unwrap());

        let response = tokio_test::assert_ok!(resolve_tdoa(State(state), payload).await);
        assert_eq!(response.0.location(), Some(&StubBackend::location()));
    }

    #[tokio::test]
    async fn test_resolve_tdoa_invalid_body() {
        let state = create_test_state(StubBackend::new());

        let err = resolve_tdoa(State(state), Bytes::from_static(b"{\"devEui\": 12"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn test_resolve_multi_frame_tdoa() {
        let state = create_test_state(StubBackend::new());
        let payload = Bytes::from_static(
            br#"{"devEui": "AQIDBAUGBwg=", "frameRxInfoSet": [{"rxInfo": []}]}"#,
        );

        let response = resolve_multi_frame_tdoa(State(state), payload)
            .await
            .unwrap();
        assert_eq!(response.0.location().unwrap().accuracy, 25);
    }

    #[tokio::test]
    async fn test_error_status_mapping() {
        let resp = GeoError::InvalidArgument("not enough meta-data for geolocation".to_string())
            .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = error_body(resp).await;
        assert_eq!(body.error, "INVALID_ARGUMENT");
        assert_eq!(body.message, "not enough meta-data for geolocation");

        let resp = GeoError::Geolocation(ProviderError::MissingResult).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(error_body(resp).await.error, "UNKNOWN");

        let resp = GeoError::ProviderErrors(vec!["no fix".to_string()]).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = error_body(resp).await;
        assert_eq!(body.error, "INTERNAL");
        assert!(body.message.contains("no fix"));
    }

    #[tokio::test]
    async fn test_oversized_payload() {
        let state = create_test_state(StubBackend::new());
        let payload = Bytes::from(vec![b' '; MAX_PAYLOAD_SIZE + 1]);

        let err = tokio_test::assert_err!(resolve_tdoa(State(state), payload).await);
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
