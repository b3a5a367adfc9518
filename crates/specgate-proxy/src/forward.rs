//! The forwarding transaction.
//!
//! One inbound request becomes exactly one backend call: method check,
//! backend URL construction, body capture, outbound request assembly,
//! execution under the client timeout, then either error classification or
//! relay of the backend's status, headers and body. There are no retries.

use axum::body::Body;
use axum::extract::Request;
use axum::http::header::{CONTENT_LENGTH, HOST, TRANSFER_ENCODING};
use axum::http::{HeaderMap, HeaderName, Method, Uri};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use specgate_core::HttpMethod;
use tracing::{debug, error, info};

use crate::error::ProxyError;
use crate::gateway::{ForwardingGateway, http_method};

/// Headers describing the framing of one hop's message. The client and the
/// listener recompute them for the buffered body instead of copying them.
fn is_framing_header(name: &HeaderName) -> bool {
    *name == HOST || *name == CONTENT_LENGTH || *name == TRANSFER_ENCODING
}

/// Copy every value of every non-framing header, preserving order and
/// repeated values.
pub fn copy_headers(source: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(source.len());
    for (name, value) in source {
        if !is_framing_header(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}

impl ForwardingGateway {
    /// Backend URL for an inbound URI: authority, then the inbound path and
    /// raw query exactly as received.
    #[must_use]
    pub fn backend_url(&self, uri: &Uri) -> String {
        let mut url = format!("{}{}", self.authority(), uri.path());
        if let Some(query) = uri.query().filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }
        url
    }

    /// Forward one request matched to a route bound to `bound`.
    pub async fn forward(&self, bound: HttpMethod, request: Request) -> Response {
        let (parts, body) = request.into_parts();
        debug!(method = %parts.method, path = %parts.uri.path(), "Incoming request");

        if parts.method != http_method(bound) {
            let err = ProxyError::MethodNotAllowed {
                expected: bound,
                actual: parts.method.to_string(),
            };
            error!(path = %parts.uri.path(), "{err}");
            return err.into_response();
        }

        let url = self.backend_url(&parts.uri);
        info!(method = %parts.method, url = %url, "Forwarding request to backend");

        let body = match axum::body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let err = ProxyError::BodyRead(e.to_string());
                error!(method = %parts.method, path = %parts.uri.path(), "{err}");
                return err.into_response();
            }
        };

        let is_head = parts.method == Method::HEAD;
        match self.execute(parts.method, &url, &parts.headers, body).await {
            Ok(response) => relay(response, &url, is_head).await,
            Err(err) => {
                error!(url = %url, status = %err.status(), "{err}");
                err.into_response()
            }
        }
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<reqwest::Response, ProxyError> {
        let mut outbound = self
            .client
            .request(method, url)
            .body(body)
            .build()
            .map_err(|e| ProxyError::RequestBuild {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        *outbound.headers_mut() = copy_headers(headers);

        debug!(url = %url, "Sending request to backend");
        self.client
            .execute(outbound)
            .await
            .map_err(|e| ProxyError::from_transport(url, &e))
    }
}

/// Relay the backend response. The status is fixed once the backend has
/// answered: a failure reading its body is logged and the caller receives
/// the status and headers with an empty body.
///
/// A HEAD response carries no body, so its `Content-Length` is relayed as is.
async fn relay(response: reqwest::Response, url: &str, is_head: bool) -> Response {
    let status = response.status();
    let mut headers = copy_headers(response.headers());
    if is_head {
        if let Some(length) = response.headers().get(CONTENT_LENGTH) {
            headers.insert(CONTENT_LENGTH, length.clone());
        }
    }
    info!(url = %url, status = %status, "Received response from backend");

    let body = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(url = %url, status = %status, "Error reading response body: {e}");
            Bytes::new()
        }
    };

    let mut relayed = Response::new(Body::from(body));
    *relayed.status_mut() = status;
    *relayed.headers_mut() = headers;
    relayed
}
