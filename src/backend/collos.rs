//! Collos geolocation backend.
//!
//! Errors reported by Collos are advisory: they are logged and the returned
//! position is still handed to the caller.

use super::client::ProviderClient;
use super::schema::{LoRaWanRx, TdoaBody, TdoaResponse};
use super::{log_result, log_warnings, Backend};
use crate::config::CollosConfig;
use crate::error::{GeoError, ProviderError, Result};
use crate::model::geo::{ResolveMultiFrameTdoaRequest, ResolveResponse, ResolveTdoaRequest};
use crate::model::lorawan::Eui64;
use crate::translate::{translate_multi_frame_request, translate_tdoa_request};
use async_trait::async_trait;
use tracing::error;

pub const TDOA_ENDPOINT: &str =
    "https://api.preview.collos.org/semtech-localization-algorithms/v2/tdoa";
pub const TDOA_MULTI_FRAME_ENDPOINT: &str =
    "https://api.preview.collos.org/semtech-localization-algorithms/v2/tdoaMultiframe";

const NAME: &str = "collos";

pub struct CollosBackend {
    client: ProviderClient,
    tdoa_endpoint: String,
    tdoa_multi_frame_endpoint: String,
}

impl CollosBackend {
    pub fn new(config: &CollosConfig) -> Result<Self> {
        Ok(Self {
            client: ProviderClient::new(
                NAME,
                config.subscription_key.clone(),
                config.request_timeout,
            )?,
            tdoa_endpoint: config.tdoa_endpoint.clone(),
            tdoa_multi_frame_endpoint: config.tdoa_multi_frame_endpoint.clone(),
        })
    }

    fn to_response(&self, dev_eui: Eui64, resp: TdoaResponse) -> Result<ResolveResponse> {
        log_warnings(NAME, dev_eui, &resp);

        if !resp.errors().is_empty() {
            error!(
                backend = NAME,
                dev_eui = %dev_eui,
                errors = ?resp.errors(),
                correlation_id = resp.correlation_id.as_deref().unwrap_or_default(),
                "backend returned errors"
            );
        }

        let result = resp.result.as_ref().ok_or(ProviderError::MissingResult)?;
        log_result(NAME, dev_eui, &resp, result);
        Ok(ResolveResponse::from_location(result.to_location()))
    }
}

#[async_trait]
impl Backend for CollosBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn resolve_tdoa(&self, req: &ResolveTdoaRequest) -> Result<ResolveResponse> {
        let tdoa_req = translate_tdoa_request(req)?;

        let body = TdoaBody {
            lorawan: tdoa_req.rx.iter().map(LoRaWanRx::from).collect::<Vec<_>>(),
        };

        let resp = self
            .client
            .post("v2_tdoa", &self.tdoa_endpoint, &body)
            .await
            .map_err(GeoError::Geolocation)?;

        self.to_response(tdoa_req.dev_eui, resp)
    }

    async fn resolve_multi_frame_tdoa(
        &self,
        req: &ResolveMultiFrameTdoaRequest,
    ) -> Result<ResolveResponse> {
        let tdoa_req = translate_multi_frame_request(req)?;

        let body = TdoaBody {
            lorawan: tdoa_req
                .frames
                .iter()
                .map(|frame| frame.iter().map(LoRaWanRx::from).collect::<Vec<_>>())
                .collect::<Vec<_>>(),
        };

        let resp = self
            .client
            .post("v2_tdoa_multiframe", &self.tdoa_multi_frame_endpoint, &body)
            .await
            .map_err(GeoError::Geolocation)?;

        self.to_response(tdoa_req.dev_eui, resp)
    }
}
