use crate::backend::collos;
use crate::error::GeoError;
use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    pub api: ApiConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    Collos,
    LoRaCloud,
}

impl BackendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendType::Collos => "collos",
            BackendType::LoRaCloud => "lora_cloud",
        }
    }
}

impl FromStr for BackendType {
    type Err = GeoError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "collos" => Ok(BackendType::Collos),
            "lora_cloud" => Ok(BackendType::LoRaCloud),
            other => Err(GeoError::ConfigError(format!("unknown backend: {}", other))),
        }
    }
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub backend_type: BackendType,
    /// Directory for request archival; `None` disables it
    pub request_log_dir: Option<PathBuf>,
    pub collos: CollosConfig,
    pub lora_cloud: LoRaCloudConfig,
}

#[derive(Debug, Clone)]
pub struct CollosConfig {
    pub subscription_key: String,
    pub tdoa_endpoint: String,
    pub tdoa_multi_frame_endpoint: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct LoRaCloudConfig {
    pub uri: String,
    pub token: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub enable_tls: bool,
    pub tls_cert: Option<PathBuf>,
    pub tls_key: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl Default for CollosConfig {
    fn default() -> Self {
        Self {
            subscription_key: String::new(),
            tdoa_endpoint: collos::TDOA_ENDPOINT.to_string(),
            tdoa_multi_frame_endpoint: collos::TDOA_MULTI_FRAME_ENDPOINT.to_string(),
            request_timeout: Duration::from_secs(1),
        }
    }
}

impl Default for LoRaCloudConfig {
    fn default() -> Self {
        Self {
            uri: String::new(),
            token: String::new(),
            request_timeout: Duration::from_secs(1),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_source(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_source<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = BackendConfig {
            backend_type: parse_var(&lookup, "LORAGEO_BACKEND_TYPE", BackendType::Collos)?,
            request_log_dir: lookup("LORAGEO_BACKEND_REQUEST_LOG_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            collos: CollosConfig {
                subscription_key: lookup("LORAGEO_COLLOS_SUBSCRIPTION_KEY").unwrap_or_default(),
                tdoa_endpoint: lookup("LORAGEO_COLLOS_TDOA_ENDPOINT")
                    .unwrap_or_else(|| collos::TDOA_ENDPOINT.to_string()),
                tdoa_multi_frame_endpoint: lookup("LORAGEO_COLLOS_TDOA_MULTI_FRAME_ENDPOINT")
                    .unwrap_or_else(|| collos::TDOA_MULTI_FRAME_ENDPOINT.to_string()),
                request_timeout: Duration::from_millis(parse_var(
                    &lookup,
                    "LORAGEO_COLLOS_REQUEST_TIMEOUT_MS",
                    1000,
                )?),
            },
            lora_cloud: LoRaCloudConfig {
                uri: lookup("LORAGEO_LORA_CLOUD_URI").unwrap_or_default(),
                token: lookup("LORAGEO_LORA_CLOUD_TOKEN").unwrap_or_default(),
                request_timeout: Duration::from_millis(parse_var(
                    &lookup,
                    "LORAGEO_LORA_CLOUD_REQUEST_TIMEOUT_MS",
                    1000,
                )?),
            },
        };

        let enable_tls = parse_var(&lookup, "LORAGEO_API_ENABLE_TLS", false)?;

        let api = ApiConfig {
            bind_addr: parse_var(
                &lookup,
                "LORAGEO_API_BIND_ADDR",
                "0.0.0.0:8005".parse().context("Invalid default bind address")?,
            )?,
            enable_tls,
            tls_cert: lookup("LORAGEO_API_TLS_CERT").map(PathBuf::from),
            tls_key: lookup("LORAGEO_API_TLS_KEY").map(PathBuf::from),
        };

        let metrics = MetricsConfig {
            enabled: parse_var(&lookup, "LORAGEO_METRICS_ENABLED", true)?,
        };

        Ok(Config {
            backend,
            api,
            metrics,
        })
    }

    pub fn validate(&self) -> Result<()> {
        let backend = &self.backend;

        match backend.backend_type {
            BackendType::Collos => {
                if backend.collos.request_timeout.is_zero() {
                    return Err(config_error("Collos request timeout must be greater than zero"));
                }
            }
            BackendType::LoRaCloud => {
                if backend.lora_cloud.uri.trim().is_empty() {
                    return Err(config_error(
                        "LoRa Cloud backend selected but LORAGEO_LORA_CLOUD_URI not set",
                    ));
                }
                if backend.lora_cloud.request_timeout.is_zero() {
                    return Err(config_error(
                        "LoRa Cloud request timeout must be greater than zero",
                    ));
                }
            }
        }

        if self.api.enable_tls {
            for (name, path) in [
                ("LORAGEO_API_TLS_CERT", &self.api.tls_cert),
                ("LORAGEO_API_TLS_KEY", &self.api.tls_key),
            ] {
                match path {
                    Some(p) if !p.exists() => {
                        return Err(config_error(&format!(
                            "{} not found: {:?}",
                            name, p
                        )));
                    }
                    Some(_) => {}
                    None => {
                        return Err(config_error(&format!("TLS enabled but {} not set", name)));
                    }
                }
            }
        }

        Ok(())
    }
}

fn config_error(msg: &str) -> anyhow::Error {
    GeoError::ConfigError(msg.to_string()).into()
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|s| {
            s.trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", key, e))
        })
        .transpose()
        .map(|opt| opt.unwrap_or(default))
}
