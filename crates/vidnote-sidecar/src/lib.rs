//! The vidnote sidecar process.
//!
//! Composition root: discovers the external tools, wires the core services
//! into the HTTP adapter, binds a loopback port, announces it on stdout and
//! serves until shutdown.

pub mod config;
pub mod logging;
pub mod port;
pub mod readiness;

use std::io::{self, Write};
use std::net::Ipv4Addr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use vidnote_axum::{AxumContext, create_router};
use vidnote_core::{DownloadService, DownloadServiceConfig, TaskRegistry};
use vidnote_fetch::{Tool, ToolLocator, YtDlpFetcher};

pub use config::SidecarArgs;
pub use readiness::{ReadinessConfig, ReadinessOutcome};

/// Attempts at binding an auto-assigned port before giving up.
const AUTO_PORT_ATTEMPTS: u32 = 3;

/// Fatal errors before or while serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to allocate a port: {0}")]
    PortAllocation(#[source] io::Error),

    #[error("Failed to bind 127.0.0.1:{port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] io::Error),
}

/// Run the sidecar until Ctrl-C, announcing the port on stdout.
pub async fn run(args: SidecarArgs) -> Result<(), StartupError> {
    let cancel = CancellationToken::new();

    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received");
            on_signal.cancel();
        }
    });

    run_until(&args, cancel, io::stdout()).await
}

/// Run the sidecar until `cancel` fires, announcing the port on `announce_to`.
pub async fn run_until<W>(
    args: &SidecarArgs,
    cancel: CancellationToken,
    announce_to: W,
) -> Result<(), StartupError>
where
    W: Write + Send + 'static,
{
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Sidecar starting up");

    let tools = ToolLocator::new()
        .with_explicit(Tool::YtDlp, args.yt_dlp.clone())
        .with_explicit(Tool::Ffmpeg, args.ffmpeg.clone())
        .with_resource_dir(args.resource_dir.clone())
        .discover();

    let downloads = DownloadService::new(
        Arc::new(TaskRegistry::new()),
        Arc::new(YtDlpFetcher::new(tools.yt_dlp)),
        DownloadServiceConfig {
            ffmpeg_location: tools.ffmpeg,
        },
    );
    let state = Arc::new(AxumContext::new(Arc::new(downloads)));
    let app = create_router(state, &args.cors());

    let listener = bind(args.port).await?;
    let port = listener
        .local_addr()
        .map_err(|source| StartupError::Bind {
            port: args.port,
            source,
        })?
        .port();

    tracing::info!(port, "Starting sidecar server");

    let readiness = args.readiness();
    tokio::spawn(async move {
        let mut out = announce_to;
        if let Err(e) = readiness::announce_when_ready(port, &readiness, &mut out).await {
            tracing::error!(error = %e, "Failed to announce port");
        }
    });

    let served = vidnote_axum::serve(listener, app, cancel)
        .await
        .map_err(StartupError::Serve);

    tracing::info!("Sidecar shutting down");
    served
}

/// Bind the loopback listener, retrying auto-assigned ports that were taken
/// between allocation and bind.
async fn bind(requested: u16) -> Result<TcpListener, StartupError> {
    let mut attempt = 1;
    loop {
        let port = port::allocate_port(requested).map_err(StartupError::PortAllocation)?;

        match TcpListener::bind((Ipv4Addr::LOCALHOST, port)).await {
            Ok(listener) => return Ok(listener),
            Err(source) if requested == 0 && attempt < AUTO_PORT_ATTEMPTS => {
                tracing::debug!(port, attempt, error = %source, "Allocated port was taken, retrying");
                attempt += 1;
            }
            Err(source) => return Err(StartupError::Bind { port, source }),
        }
    }
}
