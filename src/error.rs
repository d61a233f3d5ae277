use std::time::Duration;
use thiserror::Error;

/// Failure talking to a geolocation provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("marshal request error: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("http request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("expected 200, got: {status} ({body})")]
    Status { status: u16, body: String },

    #[error("unmarshal response error: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("response did not contain a result")]
    MissingResult,
}

#[derive(Error, Debug)]
pub enum GeoError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("geolocation error: {0}")]
    Geolocation(#[from] ProviderError),

    #[error("backend returned errors: {0:?}")]
    ProviderErrors(Vec<String>),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

/// Caller-facing error classification, named after the RPC status codes
/// the network server expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    Unknown,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ErrorKind::Unknown => "UNKNOWN",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl GeoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GeoError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            GeoError::Geolocation(_) => ErrorKind::Unknown,
            _ => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, GeoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            GeoError::InvalidArgument("bad".to_string()).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            GeoError::Geolocation(ProviderError::Timeout(Duration::from_secs(1))).kind(),
            ErrorKind::Unknown
        );
        assert_eq!(
            GeoError::ProviderErrors(vec!["boom".to_string()]).kind(),
            ErrorKind::Internal
        );
        assert_eq!(ErrorKind::Unknown.as_str(), "UNKNOWN");
    }

    #[test]
    fn test_status_error_message() {
        let err = GeoError::Geolocation(ProviderError::Status {
            status: 401,
            body: "denied".to_string(),
        });
        assert_eq!(err.to_string(), "geolocation error: expected 200, got: 401 (denied)");
    }
}
