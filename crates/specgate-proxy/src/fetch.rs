//! Fetching the OpenAPI document from the backend.

use openapiv3::OpenAPI;
use reqwest::Client;
use reqwest::redirect::Policy;
use specgate_core::{GatewayConfig, parse_document, validate_document};
use tracing::{error, info};

use crate::error::{FetchError, GatewayError};

const MAX_DOCUMENT_REDIRECTS: usize = 10;

/// Client for loading the document at startup. Unlike the forwarding client
/// it follows redirects, so a moved document URL still resolves.
pub fn build_fetch_client(config: &GatewayConfig) -> Result<Client, GatewayError> {
    let client = Client::builder()
        .timeout(config.timeout)
        .redirect(Policy::limited(MAX_DOCUMENT_REDIRECTS))
        .no_proxy()
        .build()?;
    Ok(client)
}

/// GET, parse and validate the document at `url`.
pub async fn fetch_document(client: &Client, url: &str) -> Result<OpenAPI, FetchError> {
    let response = client.get(url).send().await.map_err(|source| {
        error!(url = %url, "Failed to fetch OpenAPI spec: {source}");
        FetchError::Request {
            url: url.to_string(),
            source,
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        error!(url = %url, status = %status, "Failed to fetch OpenAPI spec");
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }

    let text = response.text().await.map_err(|source| {
        error!(url = %url, "Failed to read OpenAPI spec response: {source}");
        FetchError::Request {
            url: url.to_string(),
            source,
        }
    })?;

    let doc = parse_document(&text)?;
    validate_document(&doc)?;

    info!(url = %url, paths = doc.paths.paths.len(), "OpenAPI spec loaded successfully from URL");
    Ok(doc)
}
