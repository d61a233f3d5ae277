//! LoRa Cloud geolocation backend.
//!
//! Only plain fine timestamps are forwarded; LoRa Cloud is not sent encrypted
//! times of arrival. Unlike Collos, any provider-reported error fails the call.

use super::client::ProviderClient;
use super::schema::{LoRaWanRx, TdoaBody, TdoaResponse};
use super::{log_result, log_warnings, Backend};
use crate::config::LoRaCloudConfig;
use crate::error::{GeoError, ProviderError, Result};
use crate::model::geo::{ResolveMultiFrameTdoaRequest, ResolveResponse, ResolveTdoaRequest};
use crate::model::lorawan::Eui64;
use crate::translate::{
    ensure_quorum, translate_multi_frame_request, translate_tdoa_request, TdoaRx, TimeOfArrival,
};
use async_trait::async_trait;
use tracing::{error, warn};

const NAME: &str = "lora_cloud";

pub struct LoRaCloudBackend {
    client: ProviderClient,
    uri: String,
}

impl LoRaCloudBackend {
    pub fn new(config: &LoRaCloudConfig) -> Result<Self> {
        Ok(Self {
            client: ProviderClient::new(NAME, config.token.clone(), config.request_timeout)?,
            uri: config.uri.trim_end_matches('/').to_string(),
        })
    }

    pub fn tdoa_endpoint(&self) -> String {
        format!("{}/api/v2/tdoa", self.uri)
    }

    pub fn tdoa_multi_frame_endpoint(&self) -> String {
        format!("{}/api/v2/tdoaMultiframe", self.uri)
    }

    fn to_response(&self, dev_eui: Eui64, resp: TdoaResponse) -> Result<ResolveResponse> {
        log_warnings(NAME, dev_eui, &resp);

        if !resp.errors().is_empty() {
            error!(
                backend = NAME,
                dev_eui = %dev_eui,
                errors = ?resp.errors(),
                "backend returned errors"
            );
            return Err(GeoError::ProviderErrors(resp.errors().to_vec()));
        }

        let result = resp.result.as_ref().ok_or(ProviderError::MissingResult)?;
        log_result(NAME, dev_eui, &resp, result);
        Ok(ResolveResponse::from_location(result.to_location()))
    }
}

/// Drops entries carrying an encrypted time of arrival.
fn plain_only(dev_eui: Eui64, rx: Vec<TdoaRx>) -> Vec<TdoaRx> {
    rx.into_iter()
        .filter(|rx| match rx.toa {
            TimeOfArrival::Nanos(_) => true,
            TimeOfArrival::Encrypted(_) => {
                warn!(
                    backend = NAME,
                    dev_eui = %dev_eui,
                    gateway_id = %rx.gateway_id,
                    "encrypted fine-timestamp not supported, ignoring gateway"
                );
                false
            }
        })
        .collect()
}

fn to_body(rx: &[TdoaRx]) -> Vec<LoRaWanRx> {
    rx.iter().map(LoRaWanRx::from).collect()
}

#[async_trait]
impl Backend for LoRaCloudBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn resolve_tdoa(&self, req: &ResolveTdoaRequest) -> Result<ResolveResponse> {
        let tdoa_req = translate_tdoa_request(req)?;
        let dev_eui = tdoa_req.dev_eui;

        let rx = plain_only(dev_eui, tdoa_req.rx);
        ensure_quorum(&rx)?;

        let body = TdoaBody {
            lorawan: to_body(&rx),
        };

        let resp = self
            .client
            .post("v2_tdoa", &self.tdoa_endpoint(), &body)
            .await
            .map_err(GeoError::Geolocation)?;

        self.to_response(dev_eui, resp)
    }

    async fn resolve_multi_frame_tdoa(
        &self,
        req: &ResolveMultiFrameTdoaRequest,
    ) -> Result<ResolveResponse> {
        let tdoa_req = translate_multi_frame_request(req)?;
        let dev_eui = tdoa_req.dev_eui;

        let body = TdoaBody {
            lorawan: tdoa_req
                .frames
                .into_iter()
                .map(|frame| to_body(&plain_only(dev_eui, frame)))
                .collect::<Vec<_>>(),
        };

        let resp = self
            .client
            .post(
                "v2_tdoa_multiframe",
                &self.tdoa_multi_frame_endpoint(),
                &body,
            )
            .await
            .map_err(GeoError::Geolocation)?;

        self.to_response(dev_eui, resp)
    }
}
