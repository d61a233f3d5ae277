/// LoRaWAN EUI-64 (DevEUI or gateway ID), rendered as 16 lowercase hex characters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Eui64(pub [u8; 8]);

impl Eui64 {
    /// Builds an EUI from raw wire bytes.
    ///
    /// Copies at most 8 bytes; shorter input leaves the trailing bytes zeroed
    /// and longer input is truncated, matching how the network server fills
    /// fixed-size EUIs from protobuf byte fields.
    pub fn from_slice(b: &[u8]) -> Self {
        let mut eui = [0u8; 8];
        let n = b.len().min(8);
        eui[..n].copy_from_slice(&b[..n]);
        Self(eui)
    }
}

impl std::fmt::Display for Eui64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Serde adapter for protobuf `bytes` fields, which the JSON mapping carries
/// as standard base64 strings.
pub mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        base64::engine::general_purpose::STANDARD
            .decode(s.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// RSSI in dBm
pub type Rssi = i32;

/// SNR in dB
pub type Snr = f64;
