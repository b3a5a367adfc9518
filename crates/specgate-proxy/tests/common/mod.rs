//! Shared fixtures for gateway integration tests.
//!
//! `MockBackend` is a real axum server on an ephemeral port that records every
//! request it receives. Its response is steered by request headers:
//!
//! - `x-mock-status: <code>` sets the response status (default 200)
//! - `x-mock-delay-ms: <ms>` delays the response
//!
//! The body is `{"id":42}` for `/orders/42`, otherwise the request body echoed.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::Response;
use specgate_core::{GatewayConfig, RouteTable, parse_document};
use specgate_proxy::ForwardingGateway;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub const ORDERS_API: &str = r#"
openapi: 3.0.3
info:
  title: Orders
  version: "1.0"
paths:
  /orders:
    post:
      responses:
        "201": {description: created}
  /orders/{id}:
    get:
      responses:
        "200": {description: one order}
  /orders/{id}/items/{itemId}:
    get:
      responses:
        "200": {description: one item}
    delete:
      responses:
        "204": {description: removed}
  /ping:
    head:
      responses:
        "200": {description: alive}
  /v1/:batch:
    post:
      responses:
        "200": {description: batch}
"#;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

type Recorder = Arc<Mutex<Vec<RecordedRequest>>>;

pub struct MockBackend {
    pub addr: SocketAddr,
    requests: Recorder,
    cancel: CancellationToken,
}

impl MockBackend {
    pub async fn start() -> Self {
        let requests: Recorder = Arc::default();
        let app = Router::new()
            .fallback(record_and_respond)
            .with_state(Arc::clone(&requests));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let cancel = CancellationToken::new();
        let shutdown = cancel.clone();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await
                .unwrap();
        });

        Self {
            addr,
            requests,
            cancel,
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn recorded(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn record_and_respond(State(requests): State<Recorder>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    let status = parts
        .headers
        .get("x-mock-status")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u16>().ok())
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::OK);
    let delay = parts
        .headers
        .get("x-mock-delay-ms")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    requests.lock().unwrap().push(RecordedRequest {
        method: parts.method.clone(),
        uri: parts.uri.clone(),
        headers: parts.headers.clone(),
        body: body.clone(),
    });

    if let Some(ms) = delay {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    let payload = if parts.uri.path() == "/orders/42" {
        Bytes::from_static(br#"{"id":42}"#)
    } else {
        body
    };

    let mut response = Response::new(Body::from(payload));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert("x-backend", HeaderValue::from_static("mock"));
    headers.append("set-cookie", HeaderValue::from_static("a=1"));
    headers.append("set-cookie", HeaderValue::from_static("b=2"));
    if status.is_redirection() {
        headers.insert("location", HeaderValue::from_static("/elsewhere"));
    }
    response
}

/// Router for `ORDERS_API` forwarding to `127.0.0.1:{port}`.
pub fn gateway_router(port: u16, timeout: Duration) -> Router {
    let doc = parse_document(ORDERS_API).unwrap();
    let routes = RouteTable::build(&doc).unwrap();
    let config = GatewayConfig::new("http://127.0.0.1", Some(port), timeout);
    Arc::new(ForwardingGateway::new(config, routes).unwrap())
        .register_routes()
        .unwrap()
}

/// A local port with nothing listening on it.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

/// A port whose listener reads each request and answers with bytes that are
/// not an HTTP response, then closes the connection.
pub async fn garbage_backend() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let _ = stream.write_all(b"SSH-2.0-OpenSSH_9.6 not http\r\n\r\n").await;
            let _ = stream.shutdown().await;
        }
    });
    port
}
