#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tower as _;

// Used by the binary only
use dotenvy as _;

pub mod bootstrap;
pub mod error;
pub mod logging;
pub mod parser;

pub use bootstrap::{GatewayApp, bootstrap, load_config, load_routes, run};
pub use error::CliError;
pub use parser::Cli;
