//! Port announcement for the parent process.
//!
//! The parent launches the sidecar and scans its stdout for a single
//! `SERVER_PORT=<port>` line. The announcer waits until the listener accepts
//! TCP connections before printing it, and prints it anyway once the probe
//! budget is spent so the parent never waits forever.

use std::io::{self, Write};
use std::net::Ipv4Addr;
use std::time::Duration;

use tokio::net::TcpStream;

/// Prefix of the handshake line.
pub const SIGNAL_PREFIX: &str = "SERVER_PORT=";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessConfig {
    /// Pause before the first probe.
    pub warmup: Duration,
    /// Probes before giving up on confirmation.
    pub attempts: u32,
    /// Pause between probes.
    pub interval: Duration,
    /// Upper bound on a single connect.
    pub connect_timeout: Duration,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        // Listener startup is slower on these platforms
        let warmup = if cfg!(any(target_os = "windows", target_os = "macos")) {
            Duration::from_secs(1)
        } else {
            Duration::from_millis(250)
        };

        Self {
            warmup,
            attempts: 40,
            interval: Duration::from_millis(100),
            connect_timeout: Duration::from_millis(250),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessOutcome {
    /// A probe connected; `attempts` probes were made.
    Confirmed { attempts: u32 },
    /// No probe connected; the line was written regardless.
    Fallback,
}

/// The exact handshake line, without newline.
pub fn signal_line(port: u16) -> String {
    format!("{SIGNAL_PREFIX}{port}")
}

/// Probe `127.0.0.1:port` until it accepts a connection or the budget runs out.
pub async fn wait_until_accepting(port: u16, config: &ReadinessConfig) -> ReadinessOutcome {
    tokio::time::sleep(config.warmup).await;

    for attempt in 1..=config.attempts {
        let connect = TcpStream::connect((Ipv4Addr::LOCALHOST, port));
        match tokio::time::timeout(config.connect_timeout, connect).await {
            Ok(Ok(_stream)) => {
                tracing::debug!(port, attempt, "Listener is accepting connections");
                return ReadinessOutcome::Confirmed { attempts: attempt };
            }
            Ok(Err(e)) => tracing::trace!(port, attempt, error = %e, "Readiness probe failed"),
            Err(_) => tracing::trace!(port, attempt, "Readiness probe timed out"),
        }

        if attempt < config.attempts {
            tokio::time::sleep(config.interval).await;
        }
    }

    ReadinessOutcome::Fallback
}

/// Wait for the listener, then write the handshake line to `out` and flush.
pub async fn announce_when_ready<W: Write + Send>(
    port: u16,
    config: &ReadinessConfig,
    out: &mut W,
) -> io::Result<ReadinessOutcome> {
    let outcome = wait_until_accepting(port, config).await;

    match outcome {
        ReadinessOutcome::Confirmed { attempts } => {
            tracing::info!(port, attempts, "Server ready, announcing port");
        }
        ReadinessOutcome::Fallback => {
            tracing::warn!(
                port,
                attempts = config.attempts,
                "Server did not confirm readiness, announcing port anyway"
            );
        }
    }

    writeln!(out, "{}", signal_line(port))?;
    out.flush()?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn fast(attempts: u32) -> ReadinessConfig {
        ReadinessConfig {
            warmup: Duration::ZERO,
            attempts,
            interval: Duration::from_millis(10),
            connect_timeout: Duration::from_millis(100),
        }
    }

    #[test]
    fn signal_line_format() {
        assert_eq!(signal_line(54321), "SERVER_PORT=54321");
    }

    #[tokio::test]
    async fn confirms_listening_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut out = Vec::new();
        let outcome = announce_when_ready(port, &fast(5), &mut out).await.unwrap();

        assert_eq!(outcome, ReadinessOutcome::Confirmed { attempts: 1 });
        assert_eq!(String::from_utf8(out).unwrap(), format!("SERVER_PORT={port}\n"));
    }

    #[tokio::test]
    async fn falls_back_when_nothing_listens() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let mut out = Vec::new();
        let outcome = announce_when_ready(port, &fast(3), &mut out).await.unwrap();

        assert_eq!(outcome, ReadinessOutcome::Fallback);
        assert_eq!(String::from_utf8(out).unwrap(), format!("SERVER_PORT={port}\n"));
    }

    #[tokio::test]
    async fn confirms_listener_that_starts_late() {
        let port = crate::port::allocate_port(0).unwrap();

        let late = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
            tokio::time::sleep(Duration::from_secs(2)).await;
            drop(listener);
        });

        let outcome = wait_until_accepting(port, &fast(100)).await;
        assert!(matches!(outcome, ReadinessOutcome::Confirmed { attempts } if attempts > 1));

        late.abort();
    }

    #[test]
    fn default_budget() {
        let config = ReadinessConfig::default();
        assert_eq!(config.attempts, 40);
        assert_eq!(config.interval, Duration::from_millis(100));
        assert_eq!(config.connect_timeout, Duration::from_millis(250));
        assert!(config.warmup >= Duration::from_millis(250));
    }
}
