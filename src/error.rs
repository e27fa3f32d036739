// ⚠️ Error taxonomy for the form helpers

use thiserror::Error;

/// CEP input that cannot be looked up
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CepError {
    #[error("CEP must have 8 digits, got {0}")]
    InvalidLength(usize),
}

/// Failures talking to the address lookup service
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("lookup service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid lookup response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("lookup failed: {0}")]
    Other(String),
}

/// Invalid runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{key} must be a positive number of seconds, got {value:?}")]
    InvalidTimeout { key: &'static str, value: String },
    #[error("{key} must be an http(s) URL, got {value:?}")]
    InvalidUrl { key: &'static str, value: String },
    #[error("{key} must be \"text\" or \"json\", got {value:?}")]
    InvalidLogFormat { key: &'static str, value: String },
}
