//! JSON schema shared by the TDOA geolocation providers.

use crate::model::gateway::{Location, LocationSource};
use crate::translate::{AntennaLocation, TdoaRx, TimeOfArrival};
use serde::{Deserialize, Serialize};

/// Request body: `{"lorawan": [...]}` for one frame, `{"lorawan": [[...], ...]}` for many
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TdoaBody<T> {
    pub lorawan: T,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoRaWanRx {
    pub gateway_id: String,
    pub antenna_id: u32,
    pub rssi: i32,
    pub snr: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toa: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted_toa: Option<String>,
    pub antenna_location: AntennaLocationBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AntennaLocationBody {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl From<AntennaLocation> for AntennaLocationBody {
    fn from(loc: AntennaLocation) -> Self {
        Self {
            latitude: loc.latitude,
            longitude: loc.longitude,
            altitude: loc.altitude,
        }
    }
}

impl From<&TdoaRx> for LoRaWanRx {
    fn from(rx: &TdoaRx) -> Self {
        let (toa, encrypted_toa) = match &rx.toa {
            TimeOfArrival::Nanos(ns) => (Some(*ns), None),
            TimeOfArrival::Encrypted(b64) => (None, Some(b64.clone())),
        };

        Self {
            gateway_id: rx.gateway_id.clone(),
            antenna_id: rx.antenna_id,
            rssi: rx.rssi,
            snr: rx.snr,
            toa,
            encrypted_toa,
            antenna_location: rx.antenna_location.into(),
        }
    }
}

/// Response envelope returned by the providers
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TdoaResponse {
    #[serde(default)]
    pub result: Option<TdoaResult>,
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
    #[serde(default)]
    pub errors: Option<Vec<String>>,
    /// Only sent by Collos
    #[serde(default)]
    pub correlation_id: Option<String>,
}

impl TdoaResponse {
    pub fn warnings(&self) -> &[String] {
        self.warnings.as_deref().unwrap_or_default()
    }

    pub fn errors(&self) -> &[String] {
        self.errors.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TdoaResult {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub accuracy: f64,
    pub algorithm_type: Option<String>,
    pub number_of_gateways_received: Option<u32>,
    pub number_of_gateways_used: Option<u32>,
}

impl TdoaResult {
    pub fn to_location(&self) -> Location {
        Location {
            latitude: self.latitude,
            longitude: self.longitude,
            altitude: self.altitude,
            source: LocationSource::GeoResolver,
            accuracy: accuracy_meters(self.accuracy),
        }
    }
}

/// Truncates the provider accuracy to whole meters; negative and NaN become 0.
fn accuracy_meters(accuracy: f64) -> u32 {
    if accuracy.is_nan() || accuracy <= 0.0 {
        return 0;
    }
    accuracy as u32
}
