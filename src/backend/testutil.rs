//! In-process test doubles for the geolocation providers and backends.

use super::client::SUBSCRIPTION_KEY_HEADER;
use super::Backend;
use crate::error::{GeoError, Result};
use crate::model::gateway::{Location, LocationSource};
use crate::model::geo::{ResolveMultiFrameTdoaRequest, ResolveResponse, ResolveTdoaRequest};
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    Router,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub path: String,
    pub api_key: Option<String>,
    pub content_type: Option<String>,
    pub body: serde_json::Value,
}

#[derive(Clone)]
struct StubState {
    status: StatusCode,
    body: Arc<String>,
    delay: Arc<Mutex<Duration>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

/// HTTP server standing in for a geolocation provider.
pub struct StubProvider {
    addr: SocketAddr,
    state: StubState,
}

impl StubProvider {
    pub async fn start(status: StatusCode, body: &str) -> Self {
        let state = StubState {
            status,
            body: Arc::new(body.to_string()),
            delay: Arc::new(Mutex::new(Duration::ZERO)),
            calls: Arc::new(Mutex::new(Vec::new())),
        };

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().fallback(handle).with_state(state.clone());
        let server = axum::Server::from_tcp(listener)
            .unwrap()
            .serve(app.into_make_service());
        tokio::spawn(server);

        Self { addr, state }
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        *self.state.delay.lock().unwrap() = delay;
        self
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.calls.lock().unwrap().len()
    }
}

async fn handle(
    State(state): State<StubState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let delay = *state.delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };

    let call = RecordedCall {
        path: uri.path().to_string(),
        api_key: header_value(SUBSCRIPTION_KEY_HEADER),
        content_type: header_value(header::CONTENT_TYPE.as_str()),
        body: serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null),
    };
    state.calls.lock().unwrap().push(call);

    (state.status, state.body.as_str().to_string())
}

/// Backend returning a fixed location (or error) and counting calls.
pub struct StubBackend {
    pub name: &'static str,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            name: "stub",
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn location() -> Location {
        Location {
            latitude: 52.1,
            longitude: 4.3,
            altitude: 12.0,
            source: LocationSource::GeoResolver,
            accuracy: 25,
        }
    }

    fn respond(&self) -> Result<ResolveResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(GeoError::InvalidArgument(
                "not enough meta-data for geolocation".to_string(),
            ));
        }
        Ok(ResolveResponse::from_location(Self::location()))
    }
}

#[async_trait]
impl Backend for StubBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn resolve_tdoa(&self, _req: &ResolveTdoaRequest) -> Result<ResolveResponse> {
        self.respond()
    }

    async fn resolve_multi_frame_tdoa(
        &self,
        _req: &ResolveMultiFrameTdoaRequest,
    ) -> Result<ResolveResponse> {
        self.respond()
    }
}
