//! Tracing setup.
//!
//! stdout is reserved for the port handshake, so console logs go to stderr.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global subscriber.
///
/// `RUST_LOG` controls the filter (default `info`). When `log_dir` is set,
/// logs are also written to a daily-rotated file there; keep the returned
/// guard alive for the life of the process so buffered lines are flushed.
pub fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = log_dir
        .and_then(|dir| match std::fs::create_dir_all(dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(dir, "vn-sidecar");
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .compact();
                Some((layer, guard))
            }
            Err(e) => {
                eprintln!("Failed to create log directory {}: {e}", dir.display());
                None
            }
        })
        .unzip();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact(),
        )
        .with(file_layer)
        .try_init()
        .ok();

    guard
}
