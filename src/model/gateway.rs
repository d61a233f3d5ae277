use super::lorawan::{base64_bytes, Eui64, Rssi, Snr};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Origin of a location fix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationSource {
    #[default]
    Unknown,
    Gps,
    Config,
    GeoResolver,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub source: LocationSource,
    /// Accuracy radius in meters
    pub accuracy: u32,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FineTimestampType {
    #[default]
    None,
    Plain,
    Encrypted,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlainFineTimestamp {
    pub time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EncryptedFineTimestamp {
    pub aes_key_index: u32,
    #[serde(with = "base64_bytes")]
    pub encrypted_ns: Vec<u8>,
    /// Hardware (FPGA) key identifier
    #[serde(with = "base64_bytes")]
    pub fpga_id: Vec<u8>,
}

/// Typed view over the fine-timestamp fields of an [`UplinkRxInfo`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FineTimestamp<'a> {
    None,
    Plain(Option<&'a PlainFineTimestamp>),
    Encrypted(Option<&'a EncryptedFineTimestamp>),
}

/// One gateway's reception report of an uplink frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UplinkRxInfo {
    #[serde(with = "base64_bytes")]
    pub gateway_id: Vec<u8>,
    pub rssi: Rssi,
    pub lora_snr: Snr,
    pub channel: u32,
    pub rf_chain: u32,
    pub board: u32,
    pub antenna: u32,
    pub location: Option<Location>,
    pub fine_timestamp_type: FineTimestampType,
    pub plain_fine_timestamp: Option<PlainFineTimestamp>,
    pub encrypted_fine_timestamp: Option<EncryptedFineTimestamp>,
}

impl UplinkRxInfo {
    pub fn gateway_eui(&self) -> Eui64 {
        Eui64::from_slice(&self.gateway_id)
    }

    pub fn fine_timestamp(&self) -> FineTimestamp<'_> {
        match self.fine_timestamp_type {
            FineTimestampType::None => FineTimestamp::None,
            FineTimestampType::Plain => FineTimestamp::Plain(self.plain_fine_timestamp.as_ref()),
            FineTimestampType::Encrypted => {
                FineTimestamp::Encrypted(self.encrypted_fine_timestamp.as_ref())
            }
        }
    }
}
