//! Gateway configuration.
//!
//! The configuration file has two sections: `backendAPIConfig` describes the
//! single backend every request is forwarded to, `gatewayConfig` describes the
//! listener, the per-request timeout and logging. Files are YAML (`.yaml`,
//! `.yml`) or JSON (`.json`).
//!
//! ```yaml
//! backendAPIConfig:
//!   url: http://localhost
//!   port: "9000"
//!   openAPISpecURL: http://localhost:9000/openapi.json
//! gatewayConfig:
//!   port: "8080"
//!   timeoutSeconds: 30
//!   logLevel: INFO
//!   logFile: gateway.log
//!   logToFile: false
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use url::Url;

use crate::error::ConfigError;

/// Default listener port when `gatewayConfig.port` is absent.
pub const DEFAULT_GATEWAY_PORT: u16 = 8080;

/// Default per-request timeout, also used when `timeoutSeconds` is 0.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Log verbosity accepted in `gatewayConfig.logLevel`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    #[must_use]
    pub const fn as_filter(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        };
        f.write_str(name)
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARN" | "WARNING" => Ok(Self::Warn),
            "ERROR" => Ok(Self::Error),
            _ => Err(ConfigError::Invalid(format!("invalid log level: {s}"))),
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, ConfigError> {
        value.parse()
    }
}

/// The backend all matched requests are forwarded to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    /// Base URL including scheme, e.g. `http://backend`.
    pub url: String,

    /// Port appended to the base URL as `:{port}`.
    #[serde(default, deserialize_with = "deserialize_optional_port")]
    pub port: Option<u16>,

    /// Where to fetch the OpenAPI document from. When unset the document is
    /// read from a local file instead.
    #[serde(default, rename = "openAPISpecURL")]
    pub openapi_spec_url: Option<String>,
}

/// Listener, timeout and logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    /// Port the gateway listens on.
    #[serde(deserialize_with = "deserialize_port")]
    pub port: u16,

    /// Per-request timeout for backend calls. 0 selects the default.
    pub timeout_seconds: u64,

    pub log_level: LogLevel,

    pub log_file: Option<PathBuf>,

    /// Write logs to `log_file` instead of stdout.
    pub log_to_file: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_GATEWAY_PORT,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            log_level: LogLevel::default(),
            log_file: None,
            log_to_file: false,
        }
    }
}

/// Complete configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(rename = "backendAPIConfig")]
    pub backend: BackendConfig,

    #[serde(rename = "gatewayConfig", default)]
    pub gateway: ServerConfig,
}

impl Config {
    /// Load and validate a configuration file, picking the format from its
    /// extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let parse: fn(&str) -> Result<Self, ConfigError> = match extension.as_deref() {
            Some("yaml" | "yml") => Self::from_yaml_str,
            Some("json") => Self::from_json_str,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };

        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse(&data)
    }

    pub fn from_yaml_str(data: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(data).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validated()
    }

    pub fn from_json_str(data: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(data).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validated()
    }

    fn validated(mut self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }

    /// Check every field the gateway depends on and normalize the backend URL.
    ///
    /// A trailing `/` is stripped from the backend URL because the inbound
    /// path, which always starts with `/`, is appended to it verbatim.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        let trimmed = self.backend.url.trim().trim_end_matches('/').to_string();
        if trimmed.is_empty() {
            return Err(ConfigError::Invalid("backend url must not be empty".into()));
        }

        let parsed = Url::parse(&trimmed)
            .map_err(|e| ConfigError::Invalid(format!("backend url '{trimmed}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "backend url '{trimmed}' must use http or https"
            )));
        }
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(ConfigError::Invalid(format!(
                "backend url '{trimmed}' must not carry a query or fragment"
            )));
        }
        if self.backend.port.is_some() {
            if parsed.port().is_some() {
                return Err(ConfigError::Invalid(format!(
                    "backend url '{trimmed}' already has a port; remove backendAPIConfig.port"
                )));
            }
            if parsed.path() != "/" {
                return Err(ConfigError::Invalid(format!(
                    "backend url '{trimmed}' has a path; a port cannot follow it"
                )));
            }
        }
        self.backend.url = trimmed;

        if self.gateway.port == 0 {
            return Err(ConfigError::Invalid("gateway port must be non-zero".into()));
        }
        if self.gateway.log_to_file && self.gateway.log_file.is_none() {
            return Err(ConfigError::Invalid(
                "logToFile is enabled but logFile is not set".into(),
            ));
        }
        Ok(())
    }

    /// The immutable forwarding configuration handed to the gateway.
    #[must_use]
    pub fn gateway_config(&self) -> GatewayConfig {
        let seconds = match self.gateway.timeout_seconds {
            0 => DEFAULT_TIMEOUT_SECONDS,
            n => n,
        };
        GatewayConfig {
            backend_url: self.backend.url.clone(),
            backend_port: self.backend.port,
            timeout: Duration::from_secs(seconds),
        }
    }
}

/// Process-wide forwarding configuration, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub backend_url: String,
    pub backend_port: Option<u16>,
    pub timeout: Duration,
}

impl GatewayConfig {
    #[must_use]
    pub fn new(backend_url: impl Into<String>, backend_port: Option<u16>, timeout: Duration) -> Self {
        Self {
            backend_url: backend_url.into(),
            backend_port,
            timeout,
        }
    }

    /// Base URL plus `:port` when a port is configured.
    #[must_use]
    pub fn backend_authority(&self) -> String {
        match self.backend_port {
            Some(port) => format!("{}:{port}", self.backend_url),
            None => self.backend_url.clone(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortRepr {
    Number(u16),
    Text(String),
}

impl PortRepr {
    /// `None` for an empty string. A leading `:` is accepted.
    fn into_port<E: serde::de::Error>(self) -> Result<Option<u16>, E> {
        match self {
            Self::Number(n) => Ok(Some(n)),
            Self::Text(s) => {
                let s = s.trim().trim_start_matches(':');
                if s.is_empty() {
                    return Ok(None);
                }
                s.parse()
                    .map(Some)
                    .map_err(|_| E::custom(format!("invalid port: {s}")))
            }
        }
    }
}

fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    PortRepr::deserialize(deserializer)?
        .into_port()?
        .ok_or_else(|| D::Error::custom("port must not be empty"))
}

fn deserialize_optional_port<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<PortRepr>::deserialize(deserializer)? {
        Some(repr) => repr.into_port(),
        None => Ok(None),
    }
}
