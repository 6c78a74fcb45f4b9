//! Serving the router on a pre-bound listener.

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Run the HTTP server until `cancel` is triggered.
///
/// The listener is bound by the caller so the port is known before serving
/// starts.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;

    tracing::info!("HTTP server shut down");
    Ok(())
}
