use anyhow::Result;
use lorageo::api::http::HttpServer;
use lorageo::backend;
use lorageo::config::Config;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lorageo=info".parse()?),
        )
        .json()
        .init();

    info!("Starting LoRaGeo v{}", lorageo::VERSION);

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    info!(
        backend = %config.backend.backend_type,
        "Configuration loaded successfully"
    );

    let backend = backend::setup(&config.backend)?;

    info!("Initializing API server on {}", config.api.bind_addr);
    let http_server = HttpServer::new(backend, config.api.clone(), &config.metrics);

    http_server.serve(shutdown_signal()).await?;

    info!("LoRaGeo shutdown complete");

    Ok(())
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("SIGINT received, shutting down gracefully...");
        }
        _ = async {
            #[cfg(unix)]
            {
                let mut sigterm = tokio::signal::unix::signal(
                    tokio::signal::unix::SignalKind::terminate()
                ).expect("Failed to register SIGTERM handler");
                sigterm.recv().await;
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
            }
        } => {
            info!("SIGTERM received, shutting down gracefully...");
        }
    }
}
