#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]

pub mod error;
pub mod fetch;
pub mod forward;
pub mod gateway;
pub mod server;

pub use error::{FetchError, GatewayError, ProxyError};
pub use fetch::{build_fetch_client, fetch_document};
pub use gateway::{ForwardingGateway, build_client};
pub use server::serve;
