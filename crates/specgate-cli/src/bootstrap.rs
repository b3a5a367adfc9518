//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where the gateway is wired together:
//! - configuration file (via specgate-core)
//! - OpenAPI document, from the backend or a local file
//! - route table and `ForwardingGateway` (via specgate-proxy)
//! - the TCP listener

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use reqwest::Client;
use specgate_core::{Config, RouteTable};
use specgate_proxy::{ForwardingGateway, build_client, build_fetch_client, fetch_document, serve};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::CliError;
use crate::parser::Cli;

/// A fully composed gateway, ready to bind.
pub struct GatewayApp {
    pub gateway: Arc<ForwardingGateway>,
    pub router: Router,
    /// `{host}:{port}` from the CLI and `gatewayConfig.port`.
    pub bind_addr: String,
}

impl std::fmt::Debug for GatewayApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayApp")
            .field("backend", &self.gateway.authority())
            .field("routes", &self.gateway.routes().len())
            .field("bind_addr", &self.bind_addr)
            .finish_non_exhaustive()
    }
}

pub fn load_config(path: &Path) -> Result<Config, CliError> {
    Ok(Config::load(path)?)
}

/// Build the route table from the backend's published document when
/// `openAPISpecURL` is set, otherwise from `openapi_path`.
pub async fn load_routes(
    config: &Config,
    openapi_path: &Path,
    client: &Client,
) -> Result<RouteTable, CliError> {
    match config.backend.openapi_spec_url.as_deref() {
        Some(url) => {
            let doc = fetch_document(client, url).await?;
            Ok(RouteTable::build(&doc)?)
        }
        None => Ok(RouteTable::from_file(openapi_path)?),
    }
}

/// Compose the gateway for an already loaded configuration.
pub async fn bootstrap(cli: &Cli, config: &Config) -> Result<GatewayApp, CliError> {
    let gateway_config = config.gateway_config();
    let routes = load_routes(config, &cli.openapi, &build_fetch_client(&gateway_config)?).await?;
    info!(routes = routes.len(), backend = %gateway_config.backend_authority(), "Route table built");

    let client = build_client(&gateway_config)?;
    let gateway = Arc::new(ForwardingGateway::with_client(gateway_config, routes, client));
    let router = gateway.register_routes()?;

    Ok(GatewayApp {
        gateway,
        router,
        bind_addr: format!("{}:{}", cli.host, config.gateway.port),
    })
}

/// Bind the listener and serve until `cancel` fires.
pub async fn run(app: GatewayApp, cancel: CancellationToken) -> Result<(), CliError> {
    let listener = TcpListener::bind(&app.bind_addr)
        .await
        .map_err(|e| CliError::Io(format!("Failed to bind {}: {e}", app.bind_addr)))?;

    let port = listener.local_addr()?.port();
    info!("Starting gateway on port {port}");

    serve(listener, app.router, cancel).await?;
    Ok(())
}
