//! Translation of gateway reception reports into backend-agnostic TDOA requests.
//!
//! Reports without an antenna location or without a usable fine timestamp are
//! skipped with a warning; they never reach a backend.

use crate::error::{GeoError, Result};
use crate::model::gateway::{FineTimestamp, UplinkRxInfo};
use crate::model::geo::{ResolveMultiFrameTdoaRequest, ResolveTdoaRequest};
use crate::model::lorawan::{Eui64, Rssi, Snr};
use base64::Engine;
use tracing::warn;

/// Minimum number of usable reception reports for a single-frame solve
pub const MIN_RX_INFO: usize = 3;

/// Time of arrival as understood by the geolocation providers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeOfArrival {
    /// Sub-second component of the plain fine timestamp, in nanoseconds
    Nanos(u32),
    /// Base64 encoded encrypted fine timestamp
    Encrypted(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AntennaLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

/// Normalized reception entry
#[derive(Debug, Clone, PartialEq)]
pub struct TdoaRx {
    /// EUI hex for plain timestamps, `0x` prefixed key id for encrypted ones
    pub gateway_id: String,
    pub antenna_id: u32,
    pub rssi: Rssi,
    pub snr: Snr,
    pub toa: TimeOfArrival,
    pub antenna_location: AntennaLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TdoaRequest {
    pub dev_eui: Eui64,
    pub rx: Vec<TdoaRx>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultiFrameTdoaRequest {
    pub dev_eui: Eui64,
    pub frames: Vec<Vec<TdoaRx>>,
}

/// Translates a single-frame resolve request, enforcing the [`MIN_RX_INFO`] quorum.
pub fn translate_tdoa_request(req: &ResolveTdoaRequest) -> Result<TdoaRequest> {
    let frame = req.frame_rx_info.as_ref().ok_or_else(|| {
        GeoError::InvalidArgument("frame_rx_info must not be nil".to_string())
    })?;

    let dev_eui = req.dev_eui();
    let rx = rx_info_to_tdoa(dev_eui, &frame.rx_info);
    ensure_quorum(&rx)?;

    Ok(TdoaRequest { dev_eui, rx })
}

/// Translates a multi-frame resolve request. Frames are translated
/// independently and may end up empty.
pub fn translate_multi_frame_request(
    req: &ResolveMultiFrameTdoaRequest,
) -> Result<MultiFrameTdoaRequest> {
    if req.frame_rx_info_set.is_empty() {
        return Err(GeoError::InvalidArgument(
            "frame_rx_info_set must not be empty".to_string(),
        ));
    }

    let dev_eui = req.dev_eui();
    let frames = req
        .frame_rx_info_set
        .iter()
        .map(|frame| rx_info_to_tdoa(dev_eui, &frame.rx_info))
        .collect();

    Ok(MultiFrameTdoaRequest { dev_eui, frames })
}

pub fn ensure_quorum(rx: &[TdoaRx]) -> Result<()> {
    if rx.len() < MIN_RX_INFO {
        return Err(GeoError::InvalidArgument(
            "not enough meta-data for geolocation".to_string(),
        ));
    }
    Ok(())
}

/// Translates the reception reports of one frame, preserving report order.
pub fn rx_info_to_tdoa(dev_eui: Eui64, rx_info: &[UplinkRxInfo]) -> Vec<TdoaRx> {
    rx_info
        .iter()
        .filter_map(|rx| translate_rx_info(dev_eui, rx))
        .collect()
}

fn translate_rx_info(dev_eui: Eui64, rx: &UplinkRxInfo) -> Option<TdoaRx> {
    let gateway_id = rx.gateway_eui();

    let Some(location) = rx.location.as_ref() else {
        warn!(
            dev_eui = %dev_eui,
            gateway_id = %gateway_id,
            "location is nil, ignoring gateway"
        );
        return None;
    };

    let (id, toa) = match rx.fine_timestamp() {
        FineTimestamp::None => {
            warn!(
                dev_eui = %dev_eui,
                gateway_id = %gateway_id,
                fine_timestamp_type = ?rx.fine_timestamp_type,
                "unsupported fine-timestamp type"
            );
            return None;
        }
        FineTimestamp::Plain(ts) => {
            let Some(time) = ts.and_then(|ts| ts.time) else {
                warn!(
                    dev_eui = %dev_eui,
                    gateway_id = %gateway_id,
                    "plain_fine_timestamp must not be nil"
                );
                return None;
            };

            (
                gateway_id.to_string(),
                TimeOfArrival::Nanos(time.timestamp_subsec_nanos()),
            )
        }
        FineTimestamp::Encrypted(ts) => {
            let Some(ts) = ts else {
                warn!(
                    dev_eui = %dev_eui,
                    gateway_id = %gateway_id,
                    "encrypted_fine_timestamp must not be nil"
                );
                return None;
            };

            if ts.fpga_id.is_empty() {
                warn!(
                    dev_eui = %dev_eui,
                    gateway_id = %gateway_id,
                    "fpga_id must not be nil"
                );
                return None;
            }

            (
                format!("0x{}", hex::encode(&ts.fpga_id)),
                TimeOfArrival::Encrypted(
                    base64::engine::general_purpose::STANDARD.encode(&ts.encrypted_ns),
                ),
            )
        }
    };

    Some(TdoaRx {
        gateway_id: id,
        antenna_id: rx.antenna,
        rssi: rx.rssi,
        snr: rx.lora_snr,
        toa,
        antenna_location: AntennaLocation {
            latitude: location.latitude,
            longitude: location.longitude,
            altitude: location.altitude,
        },
    })
}
