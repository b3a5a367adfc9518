//! Listener loop for the gateway.
//!
//! Runs the registered router on a pre-bound `TcpListener`. Each accepted
//! connection is served on its own tokio task.

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Serve `router` until `cancel` is triggered.
///
/// In-flight requests are allowed to finish once cancellation starts.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!("Gateway listening on {addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;

    info!("Gateway shut down");
    Ok(())
}
