#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod openapi;
pub mod routes;

pub use config::{BackendConfig, Config, GatewayConfig, LogLevel, ServerConfig};
pub use error::{ConfigError, CoreError, OpenApiError, RouteTableError};
pub use openapi::{declared_operations, load_document, parse_document, validate_document};
pub use routes::{HttpMethod, PathTemplate, RouteDefinition, RouteTable, Segment};
