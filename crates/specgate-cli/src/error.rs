//! CLI error type and exit-code mapping.

use specgate_core::{ConfigError, CoreError, OpenApiError, RouteTableError};
use specgate_proxy::{FetchError, GatewayError};
use thiserror::Error;

/// Anything that stops the gateway from starting or keeps it from serving.
#[derive(Debug, Error)]
pub enum CliError {
    /// The configuration file is unusable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A file or socket operation failed.
    #[error("IO error: {0}")]
    Io(String),

    /// The OpenAPI document cannot be turned into routes.
    #[error("OpenAPI error: {0}")]
    Spec(String),

    #[error("{0}")]
    Internal(String),
}

impl CliError {
    /// Exit codes follow sysexits.h:
    /// - 1: General error
    /// - 65: EX_DATAERR (bad OpenAPI document)
    /// - 74: EX_IOERR
    /// - 78: EX_CONFIG
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Internal(_) => 1,
            Self::Spec(_) => 65,
            Self::Io(_) => 74,
            Self::Config(_) => 78,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io { .. } => Self::Io(err.to_string()),
            _ => Self::Config(err.to_string()),
        }
    }
}

impl From<OpenApiError> for CliError {
    fn from(err: OpenApiError) -> Self {
        match err {
            OpenApiError::Io { .. } => Self::Io(err.to_string()),
            _ => Self::Spec(err.to_string()),
        }
    }
}

impl From<RouteTableError> for CliError {
    fn from(err: RouteTableError) -> Self {
        Self::Spec(err.to_string())
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Config(e) => e.into(),
            CoreError::OpenApi(e) => e.into(),
            CoreError::RouteTable(e) => e.into(),
        }
    }
}

impl From<GatewayError> for CliError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Client(_) => Self::Internal(err.to_string()),
            GatewayError::ConflictingTemplates { .. } | GatewayError::DuplicateParameter { .. } => {
                Self::Spec(err.to_string())
            }
        }
    }
}

impl From<FetchError> for CliError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Document(e) => e.into(),
            FetchError::Request { .. } | FetchError::Status { .. } => Self::Io(err.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}
