// ⚙️ Runtime configuration
// Defaults work out of the box; environment variables override them.

use crate::error::ConfigError;
use std::time::Duration;

pub const DEFAULT_VIACEP_BASE_URL: &str = "https://viacep.com.br/ws";
pub const DEFAULT_USER_AGENT: &str = concat!("cadastro-form/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:3000";

const ENV_BASE_URL: &str = "VIACEP_BASE_URL";
const ENV_TIMEOUT: &str = "CEP_LOOKUP_TIMEOUT_SECS";
const ENV_USER_AGENT: &str = "CEP_LOOKUP_USER_AGENT";
const ENV_LOG_FORMAT: &str = "LOG_FORMAT";
const ENV_SERVER_ADDR: &str = "CADASTRO_ADDR";

// ============================================================================
// LOOKUP
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupConfig {
    /// Service root; the request path is `{base_url}/{cep}/json/`
    pub base_url: String,

    /// Request timeout. `None` keeps the HTTP client's default (no timeout).
    pub timeout: Option<Duration>,

    pub user_agent: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        LookupConfig {
            base_url: DEFAULT_VIACEP_BASE_URL.to_string(),
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl LookupConfig {
    /// Read `VIACEP_BASE_URL`, `CEP_LOOKUP_TIMEOUT_SECS` and `CEP_LOOKUP_USER_AGENT`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (used by `from_env` and tests)
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = LookupConfig::default();

        if let Some(base_url) = non_empty(var(ENV_BASE_URL)) {
            if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                return Err(ConfigError::InvalidUrl {
                    key: ENV_BASE_URL,
                    value: base_url,
                });
            }
            config.base_url = base_url.trim_end_matches('/').to_string();
        }

        if let Some(raw) = non_empty(var(ENV_TIMEOUT)) {
            let secs = raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidTimeout {
                    key: ENV_TIMEOUT,
                    value: raw.clone(),
                })?;
            config.timeout = Some(Duration::from_secs(secs));
        }

        if let Some(user_agent) = non_empty(var(ENV_USER_AGENT)) {
            config.user_agent = user_agent;
        }

        Ok(config)
    }

    /// Builder pattern: override the service root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Builder pattern: set a request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

// ============================================================================
// LOGGING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
}

impl LogConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let format = match non_empty(var(ENV_LOG_FORMAT)) {
            None => LogFormat::Text,
            Some(value) => match value.to_lowercase().as_str() {
                "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidLogFormat {
                        key: ENV_LOG_FORMAT,
                        value,
                    })
                }
            },
        };
        Ok(LogConfig { format })
    }
}

/// Bind address for the API server (`CADASTRO_ADDR`)
pub fn server_addr() -> String {
    non_empty(std::env::var(ENV_SERVER_ADDR).ok())
        .unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
