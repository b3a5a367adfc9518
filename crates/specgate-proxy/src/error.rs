//! Gateway error types and their HTTP mappings.
//!
//! [`ProxyError`] covers everything that can go wrong inside one forwarding
//! transaction. It is always contained to that transaction: the caller gets a
//! status code and a short plaintext body, details go to the log.

use std::error::Error as StdError;
use std::io;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use specgate_core::{HttpMethod, OpenApiError};
use thiserror::Error;

/// Failure of a single forwarding transaction.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The request reached a handler bound to a different method.
    #[error("Method Not Allowed: {actual} (route accepts {expected})")]
    MethodNotAllowed { expected: HttpMethod, actual: String },

    /// The inbound body could not be read.
    #[error("Error reading request body: {0}")]
    BodyRead(String),

    /// The outbound request could not be constructed.
    #[error("Error creating backend request for {url}: {reason}")]
    RequestBuild { url: String, reason: String },

    /// The backend did not answer within the configured timeout.
    #[error("Backend request to {url} timed out: {reason}")]
    Timeout { url: String, reason: String },

    /// Transport failure the network stack reports as transient.
    #[error("Temporary backend error for {url}: {reason}")]
    Unavailable { url: String, reason: String },

    /// Any other transport failure.
    #[error("Error forwarding request to {url}: {reason}")]
    BadGateway { url: String, reason: String },
}

impl ProxyError {
    /// Classify a failed backend call.
    ///
    /// Timeouts map to [`ProxyError::Timeout`]; connection refusals, resets
    /// and aborts anywhere in the source chain map to
    /// [`ProxyError::Unavailable`]; everything else (DNS, TLS, protocol) maps
    /// to [`ProxyError::BadGateway`].
    pub fn from_transport(url: &str, err: &reqwest::Error) -> Self {
        let url = url.to_string();
        let reason = error_chain(err);
        if err.is_timeout() {
            Self::Timeout { url, reason }
        } else if is_temporary(err) {
            Self::Unavailable { url, reason }
        } else {
            Self::BadGateway { url, reason }
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::BodyRead(_) | Self::RequestBuild { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::BadGateway { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Body sent to the caller. Never includes backend or internal details.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed { .. } => "Method Not Allowed",
            Self::BodyRead(_) => "Error reading request body",
            Self::RequestBuild { .. } => "Error creating backend request",
            Self::Timeout { .. } => "Backend request timed out",
            Self::Unavailable { .. } => "Temporary backend error",
            Self::BadGateway { .. } => "Error forwarding request to backend",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.public_message()).into_response()
    }
}

/// Whether any error in the source chain is an I/O error the peer or the
/// network caused transiently.
pub fn is_temporary(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            if matches!(
                io_err.kind(),
                io::ErrorKind::ConnectionRefused
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::NotConnected
                    | io::ErrorKind::UnexpectedEof
            ) {
                return true;
            }
        }
        current = e.source();
    }
    false
}

/// `outer: inner: innermost`, for logging.
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut current = err.source();
    while let Some(e) = current {
        let text = e.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        current = e.source();
    }
    message
}

/// Startup failure while assembling the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The outbound HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// Two templates match the same request paths under different parameter
    /// names, e.g. `/items/{id}` and `/items/{itemId}`.
    #[error("Routes '{first}' and '{second}' match the same paths with different parameter names")]
    ConflictingTemplates { first: String, second: String },

    /// A template repeats a parameter name.
    #[error("Path '{path}' repeats parameter '{name}'")]
    DuplicateParameter { path: String, name: String },
}

/// Fetching the OpenAPI document from a URL failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to fetch OpenAPI spec from {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to fetch OpenAPI spec from {url}: status {status}")]
    Status { url: String, status: StatusCode },

    #[error(transparent)]
    Document(#[from] OpenApiError),
}
