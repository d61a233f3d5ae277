use crate::api::handlers::{
    health_check, metrics_handler, resolve_multi_frame_tdoa, resolve_tdoa, AppState,
};
use crate::api::middleware::{request_logging, security_headers};
use crate::backend::Backend;
use crate::config::{ApiConfig, MetricsConfig};
use anyhow::Result;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use axum_server::Handle;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::info;

const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// HTTP/HTTPS API server
pub struct HttpServer {
    app_state: AppState,
    bind_addr: SocketAddr,
    enable_tls: bool,
    tls_cert_path: Option<PathBuf>,
    tls_key_path: Option<PathBuf>,
    metrics_enabled: bool,
}

impl HttpServer {
    pub fn new(backend: Arc<dyn Backend>, config: ApiConfig, metrics: &MetricsConfig) -> Self {
        Self {
            app_state: AppState { backend },
            bind_addr: config.bind_addr,
            enable_tls: config.enable_tls,
            tls_cert_path: config.tls_cert,
            tls_key_path: config.tls_key,
            metrics_enabled: metrics.enabled,
        }
    }

    /// Build the Axum router with all routes and middleware
    fn build_router(&self) -> Router {
        let mut router = Router::new()
            .route("/health", get(health_check))
            .route("/api/v1/resolve-tdoa", post(resolve_tdoa))
            .route(
                "/api/v1/resolve-multi-frame-tdoa",
                post(resolve_multi_frame_tdoa),
            );

        if self.metrics_enabled {
            router = router.route("/metrics", get(metrics_handler));
        }

        router
            .layer(middleware::from_fn(security_headers))
            .layer(middleware::from_fn(request_logging))
            .layer(TraceLayer::new_for_http())
            .with_state(self.app_state.clone())
    }

    /// Start the HTTP/HTTPS server, draining in-flight requests once `shutdown` completes
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.build_router();

        let handle = Handle::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            shutdown.await;
            info!("Draining in-flight requests");
            shutdown_handle.graceful_shutdown(Some(SHUTDOWN_GRACE_PERIOD));
        });

        if self.enable_tls {
            info!("Starting HTTPS server on {} with TLS", self.bind_addr);

            let cert_path = self.tls_cert_path.as_ref().ok_or_else(|| {
                anyhow::anyhow!("TLS enabled but cert path not configured")
            })?;
            let key_path = self.tls_key_path.as_ref().ok_or_else(|| {
                anyhow::anyhow!("TLS enabled but key path not configured")
            })?;

            let config =
                axum_server::tls_rustls::RustlsConfig::from_pem_file(cert_path, key_path).await?;

            axum_server::bind_rustls(self.bind_addr, config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        } else {
            info!(
                "Starting HTTP server on {} (TLS disabled - use reverse proxy for HTTPS)",
                self.bind_addr
            );

            axum_server::bind(self.bind_addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }

        Ok(())
    }
}
