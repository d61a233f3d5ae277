//! Geolocation backends.
//!
//! Every provider implements [`Backend`]; the [`logger::LoggingBackend`]
//! decorator wraps any of them to archive inbound requests for replay.

pub mod client;
pub mod collos;
pub mod logger;
pub mod loracloud;
pub mod schema;

#[cfg(test)]
pub(crate) mod testutil;

use crate::config::{BackendConfig, BackendType};
use crate::error::Result;
use crate::model::geo::{ResolveMultiFrameTdoaRequest, ResolveResponse, ResolveTdoaRequest};
use crate::model::lorawan::Eui64;
use async_trait::async_trait;
use schema::{TdoaResponse, TdoaResult};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Resolves device positions from gateway reception metadata.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Backend type tag, used for metrics labels and replay artifacts
    fn name(&self) -> &'static str;

    /// Resolves the location of a single uplink frame using TDOA.
    async fn resolve_tdoa(&self, req: &ResolveTdoaRequest) -> Result<ResolveResponse>;

    /// Resolves the location using TDOA over multiple uplink frames.
    async fn resolve_multi_frame_tdoa(
        &self,
        req: &ResolveMultiFrameTdoaRequest,
    ) -> Result<ResolveResponse>;
}

/// Creates the configured provider backend without request archival.
pub fn new_backend(config: &BackendConfig) -> Result<Box<dyn Backend>> {
    let backend: Box<dyn Backend> = match config.backend_type {
        BackendType::Collos => Box::new(collos::CollosBackend::new(&config.collos)?),
        BackendType::LoRaCloud => Box::new(loracloud::LoRaCloudBackend::new(&config.lora_cloud)?),
    };
    Ok(backend)
}

/// Creates the configured backend wrapped in the request logging decorator.
pub fn setup(config: &BackendConfig) -> Result<Arc<dyn Backend>> {
    let backend = new_backend(config)?;
    let backend = logger::LoggingBackend::new(backend, config.request_log_dir.clone());

    info!(
        backend = backend.name(),
        request_log_dir = ?config.request_log_dir,
        "geolocation backend configured"
    );

    Ok(Arc::new(backend))
}

pub(crate) fn log_warnings(backend: &str, dev_eui: Eui64, resp: &TdoaResponse) {
    if !resp.warnings().is_empty() {
        warn!(
            backend = backend,
            dev_eui = %dev_eui,
            warnings = ?resp.warnings(),
            "backend returned warnings"
        );
    }
}

pub(crate) fn log_result(
    backend: &str,
    dev_eui: Eui64,
    resp: &TdoaResponse,
    result: &TdoaResult,
) {
    debug!(
        backend = backend,
        dev_eui = %dev_eui,
        algorithm_type = result.algorithm_type.as_deref().unwrap_or_default(),
        gateways_received = ?result.number_of_gateways_received,
        gateways_used = ?result.number_of_gateways_used,
        correlation_id = resp.correlation_id.as_deref().unwrap_or_default(),
        "backend resolved location"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CollosConfig, LoRaCloudConfig};
    use std::path::PathBuf;

    fn backend_config(backend_type: BackendType) -> BackendConfig {
        BackendConfig {
            backend_type,
            request_log_dir: None,
            collos: CollosConfig::default(),
            lora_cloud: LoRaCloudConfig {
                uri: "http://localhost:1".to_string(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_setup_selects_backend() {
        let collos = setup(&backend_config(BackendType::Collos)).unwrap();
        assert_eq!(collos.name(), "collos");

        let lora_cloud = setup(&backend_config(BackendType::LoRaCloud)).unwrap();
        assert_eq!(lora_cloud.name(), "lora_cloud");
    }

    #[test]
    fn test_setup_with_log_dir() {
        let mut config = backend_config(BackendType::Collos);
        config.request_log_dir = Some(PathBuf::from("/tmp/lorageo-requests"));

        let backend = setup(&config).unwrap();
        assert_eq!(backend.name(), "collos");
    }
}
