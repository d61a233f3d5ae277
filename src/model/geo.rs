use super::gateway::{Location, UplinkRxInfo};
use super::lorawan::{base64_bytes, Eui64};
use serde::{Deserialize, Serialize};

/// Reception reports of a single uplink frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FrameRxInfo {
    pub rx_info: Vec<UplinkRxInfo>,
}

/// Single-frame TDOA resolve request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolveTdoaRequest {
    #[serde(with = "base64_bytes")]
    pub dev_eui: Vec<u8>,
    pub frame_rx_info: Option<FrameRxInfo>,
}

/// Multi-frame TDOA resolve request, one [`FrameRxInfo`] per uplink
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolveMultiFrameTdoaRequest {
    #[serde(with = "base64_bytes")]
    pub dev_eui: Vec<u8>,
    pub frame_rx_info_set: Vec<FrameRxInfo>,
}

impl ResolveTdoaRequest {
    pub fn dev_eui(&self) -> Eui64 {
        Eui64::from_slice(&self.dev_eui)
    }
}

impl ResolveMultiFrameTdoaRequest {
    pub fn dev_eui(&self) -> Eui64 {
        Eui64::from_slice(&self.dev_eui)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolveResult {
    pub location: Option<Location>,
}

/// Response to both single- and multi-frame resolve calls
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolveResponse {
    pub result: Option<ResolveResult>,
}

impl ResolveResponse {
    pub fn from_location(location: Location) -> Self {
        Self {
            result: Some(ResolveResult {
                location: Some(location),
            }),
        }
    }

    pub fn location(&self) -> Option<&Location> {
        self.result.as_ref().and_then(|r| r.location.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::gateway::LocationSource;

    #[test]
    fn test_parse_resolve_request() {
        let payload = r#"{
            "devEui": "AQIDBAUGBwg=",
            "frameRxInfo": {
                "rxInfo": [{
                    "gatewayId": "AQEBAQEBAQE=",
                    "fineTimestampType": "PLAIN",
                    "plainFineTimestamp": {"time": "2024-05-01T10:00:00.123456789Z"}
                }]
            }
        }"#;

        let req: ResolveTdoaRequest = serde_json::from_str(payload).unwrap();
        assert_eq!(req.dev_eui().to_string(), "0102030405060708");
        let frame = req.frame_rx_info.unwrap();
        assert_eq!(frame.rx_info.len(), 1);
        assert!(frame.rx_info[0].plain_fine_timestamp.as_ref().unwrap().time.is_some());
    }

    #[test]
    fn test_malformed_timestamp_is_rejected() {
        let payload = r#"{
            "frameRxInfo": {
                "rxInfo": [{
                    "fineTimestampType": "PLAIN",
                    "plainFineTimestamp": {"time": "yesterday"}
                }]
            }
        }"#;

        assert!(serde_json::from_str::<ResolveTdoaRequest>(payload).is_err());
    }

    #[test]
    fn test_response_serialization() {
        let mut location = Location::new(1.5, 2.5, 3.5);
        location.source = LocationSource::GeoResolver;
        location.accuracy = 4;

        let resp = ResolveResponse::from_location(location);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["result"]["location"]["source"], "GEO_RESOLVER");
        assert_eq!(json["result"]["location"]["accuracy"], 4);
        assert_eq!(resp.location().unwrap().latitude, 1.5);
    }
}
