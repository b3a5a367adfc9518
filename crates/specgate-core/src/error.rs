//! Error types for the core domain.
//!
//! Every error in this module is a startup-time error: a gateway that hits
//! one of them never begins serving traffic.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration loading or validation failed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file extension does not map to a supported format.
    #[error("Unsupported config file format: {0}")]
    UnsupportedFormat(PathBuf),

    /// The file content could not be deserialized.
    #[error("Failed to parse config file: {0}")]
    Parse(String),

    /// A field holds a value the gateway cannot run with.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// OpenAPI document loading or validation failed.
#[derive(Debug, Error)]
pub enum OpenApiError {
    /// The document file could not be read.
    #[error("Failed to read OpenAPI spec file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is neither valid JSON nor valid YAML OpenAPI.
    #[error("Failed to parse OpenAPI document: {0}")]
    Parse(String),

    /// The document parsed but is not an acceptable OpenAPI 3 document.
    #[error("Invalid OpenAPI document: {0}")]
    Invalid(String),
}

/// A path in the OpenAPI document cannot be turned into a route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteTableError {
    /// Path templates must be absolute.
    #[error("Path '{0}' must start with '/'")]
    InvalidPath(String),

    /// A `{name}` segment carries an unusable parameter name.
    #[error("Path '{path}' has invalid parameter segment '{segment}'")]
    InvalidParameter { path: String, segment: String },

    /// Not one of the eight methods an OpenAPI path item can declare.
    #[error("Unknown HTTP method '{0}'")]
    UnknownMethod(String),

    /// Path items given by `$ref` are not resolved.
    #[error("Path '{path}' is a reference ({reference}); path item references are not supported")]
    PathReference { path: String, reference: String },
}

/// Top-level core error.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    OpenApi(#[from] OpenApiError),

    #[error(transparent)]
    RouteTable(#[from] RouteTableError),
}
