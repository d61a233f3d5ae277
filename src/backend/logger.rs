//! Request archival decorator.
//!
//! When a log directory is set, every inbound request is written as pretty JSON to
//! `<log_dir>/<operation>/<timestamp>.request.json` before being delegated.
//! Archival failures are logged and never affect the resolve outcome.

use super::Backend;
use crate::error::Result;
use crate::model::geo::{ResolveMultiFrameTdoaRequest, ResolveResponse, ResolveTdoaRequest};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const RESOLVE_TDOA_DIR: &str = "ResolveTDOA";
pub const RESOLVE_MULTI_FRAME_TDOA_DIR: &str = "ResolveMultiFrameTDOA";
pub const REQUEST_FILE_SUFFIX: &str = ".request.json";

pub struct LoggingBackend {
    backend: Box<dyn Backend>,
    log_dir: Option<PathBuf>,
}

impl LoggingBackend {
    pub fn new(backend: Box<dyn Backend>, log_dir: Option<PathBuf>) -> Self {
        Self { backend, log_dir }
    }

    async fn log_request<T: Serialize + Sync>(&self, prefix: &str, req: &T) {
        let Some(log_dir) = self
            .log_dir
            .as_deref()
            .filter(|dir| !dir.as_os_str().is_empty())
        else {
            return;
        };

        match write_request(log_dir, prefix, req).await {
            Ok(path) => info!(path = %path.display(), "log file created"),
            Err(e) => error!(error = %e, operation = prefix, "log request error"),
        }
    }
}

async fn write_request<T: Serialize>(log_dir: &Path, prefix: &str, req: &T) -> Result<PathBuf> {
    let dir = log_dir.join(prefix);
    tokio::fs::create_dir_all(&dir).await?;

    let bb = serde_json::to_vec_pretty(req)?;

    let name = Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true);
    let path = dir.join(format!("{}{}", name, REQUEST_FILE_SUFFIX));
    tokio::fs::write(&path, bb).await?;

    Ok(path)
}

#[async_trait]
impl Backend for LoggingBackend {
    fn name(&self) -> &'static str {
        self.backend.name()
    }

    async fn resolve_tdoa(&self, req: &ResolveTdoaRequest) -> Result<ResolveResponse> {
        self.log_request(RESOLVE_TDOA_DIR, req).await;
        self.backend.resolve_tdoa(req).await
    }

    async fn resolve_multi_frame_tdoa(
        &self,
        req: &ResolveMultiFrameTdoaRequest,
    ) -> Result<ResolveResponse> {
        self.log_request(RESOLVE_MULTI_FRAME_TDOA_DIR, req).await;
        self.backend.resolve_multi_frame_tdoa(req).await
    }
}
