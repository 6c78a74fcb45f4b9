//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use vidnote_axum::CorsConfig;

use crate::readiness::ReadinessConfig;

/// Video download sidecar.
///
/// Prints `SERVER_PORT=<port>` on stdout once the HTTP API accepts
/// connections. All diagnostics go to stderr.
#[derive(Debug, Clone, Parser)]
#[command(name = "vn-sidecar")]
#[command(version, about)]
pub struct SidecarArgs {
    /// Port to listen on (0 picks a free one)
    #[arg(long, env = "VN_SIDECAR_PORT", default_value_t = 0)]
    pub port: u16,

    /// Allowed CORS origin; repeat or comma-separate. Replaces the defaults.
    #[arg(long = "cors-origin", env = "VN_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    /// Path to the yt-dlp executable
    #[arg(long = "yt-dlp", env = "VN_YTDLP_PATH")]
    pub yt_dlp: Option<PathBuf>,

    /// Path to the ffmpeg executable
    #[arg(long, env = "VN_FFMPEG_PATH")]
    pub ffmpeg: Option<PathBuf>,

    /// Directory holding bundled tools
    #[arg(long = "resource-dir", env = "VN_RESOURCE_DIR")]
    pub resource_dir: Option<PathBuf>,

    /// Also write daily-rotated log files here
    #[arg(long = "log-dir", env = "VN_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Delay before the first readiness probe, in milliseconds
    #[arg(long = "ready-warmup-ms", env = "VN_READY_WARMUP_MS")]
    pub ready_warmup_ms: Option<u64>,

    /// Readiness probe attempts before announcing anyway
    #[arg(long = "ready-attempts", env = "VN_READY_ATTEMPTS", default_value_t = 40)]
    pub ready_attempts: u32,

    /// Delay between readiness probes, in milliseconds
    #[arg(long = "ready-interval-ms", env = "VN_READY_INTERVAL_MS", default_value_t = 100)]
    pub ready_interval_ms: u64,
}

impl SidecarArgs {
    /// Configured origins, or the defaults when none are given.
    pub fn cors(&self) -> CorsConfig {
        let origins: Vec<String> = self
            .cors_origins
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .map(ToString::to_string)
            .collect();

        if origins.is_empty() {
            CorsConfig::default()
        } else {
            CorsConfig::allow_origins(origins)
        }
    }

    pub fn readiness(&self) -> ReadinessConfig {
        let defaults = ReadinessConfig::default();
        ReadinessConfig {
            warmup: self
                .ready_warmup_ms
                .map_or(defaults.warmup, Duration::from_millis),
            attempts: self.ready_attempts,
            interval: Duration::from_millis(self.ready_interval_ms),
            ..defaults
        }
    }
}
