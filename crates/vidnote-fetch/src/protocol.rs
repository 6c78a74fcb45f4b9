//! Line protocol spoken by the yt-dlp child process.
//!
//! yt-dlp is asked to print machine-readable lines through its output
//! templates:
//!
//! ```text
//! vn-progress:{"status": "downloading", "downloaded_bytes": 1024, "total_bytes": 4096, ...}
//! vn-result:{"title": "Clip", "duration": 12.5, "thumbnail": "https://...", "filepath": "/out/Clip.mp4"}
//! ```
//!
//! Everything else on stdout is human-oriented output and is not parsed.

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use vidnote_core::{ProgressPhase, ProgressSnapshot};

/// Prefix of progress lines.
pub const PROGRESS_PREFIX: &str = "vn-progress:";
/// Prefix of the final metadata line.
pub const RESULT_PREFIX: &str = "vn-result:";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The line does not carry a protocol prefix.
    #[error("Not a protocol line")]
    NotProtocol,

    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Unknown progress status: {0}")]
    UnknownStatus(String),
}

// ============================================================================
// Protocol Events
// ============================================================================

/// Metadata printed once the final file is in place.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResultLine {
    pub title: Option<String>,
    pub duration: Option<f64>,
    pub thumbnail: Option<String>,
    pub filepath: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    Progress(ProgressSnapshot),
    Result(ResultLine),
}

// ============================================================================
// Parsing
// ============================================================================

/// Raw progress dictionary. yt-dlp emits floats for estimates and `null`
/// for anything it does not know yet.
#[derive(Deserialize)]
struct RawProgress {
    status: String,
    downloaded_bytes: Option<f64>,
    total_bytes: Option<f64>,
    total_bytes_estimate: Option<f64>,
    speed: Option<f64>,
    eta: Option<f64>,
    filename: Option<String>,
}

/// Parse one stdout line.
pub fn parse_line(line: &str) -> Result<FetchEvent, ProtocolError> {
    let line = line.trim();

    if let Some(json) = line.strip_prefix(PROGRESS_PREFIX) {
        let raw: RawProgress = serde_json::from_str(json)?;
        return progress_from_raw(raw).map(FetchEvent::Progress);
    }

    if let Some(json) = line.strip_prefix(RESULT_PREFIX) {
        return Ok(FetchEvent::Result(serde_json::from_str(json)?));
    }

    Err(ProtocolError::NotProtocol)
}

fn progress_from_raw(raw: RawProgress) -> Result<ProgressSnapshot, ProtocolError> {
    let phase = match raw.status.as_str() {
        "downloading" => ProgressPhase::Downloading,
        "finished" => ProgressPhase::Finished,
        "error" => ProgressPhase::Error,
        other => return Err(ProtocolError::UnknownStatus(other.to_string())),
    };

    let bytes_total = match whole(raw.total_bytes) {
        0 => whole(raw.total_bytes_estimate),
        n => n,
    };

    Ok(ProgressSnapshot {
        phase,
        bytes_downloaded: whole(raw.downloaded_bytes),
        bytes_total,
        speed: raw.speed.filter(|s| s.is_finite() && *s > 0.0).unwrap_or(0.0),
        eta_seconds: whole(raw.eta),
        filename: raw.filename.unwrap_or_default(),
    })
}

/// Non-negative whole number, zero for absent or nonsensical values.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole(value: Option<f64>) -> u64 {
    value
        .filter(|v| v.is_finite() && *v > 0.0)
        .map_or(0, |v| v.round() as u64)
}

// ============================================================================
// Tests
// ============================================================================
