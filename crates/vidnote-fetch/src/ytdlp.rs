//! [`MediaFetcher`] backed by the `yt-dlp` executable.
//!
//! The child is driven through command-line flags only. Progress and the
//! final metadata come back over stdout using the line protocol in
//! [`crate::protocol`]; stderr is collected for error reporting.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

use vidnote_core::{FetchError, FetchRequest, MediaFetcher, MediaInfo, ProgressSink};

use crate::protocol::{FetchEvent, PROGRESS_PREFIX, ProtocolError, RESULT_PREFIX, ResultLine, parse_line};

// ============================================================================
// Constants
// ============================================================================

/// Merged H.264 + AAC in an mp4 container. Needs ffmpeg to merge.
pub const MERGED_MP4_FORMAT: &str =
    "bestvideo[ext=mp4][vcodec^=avc]+bestaudio[ext=m4a]/best[ext=mp4]/best";

/// Single pre-muxed file; used when ffmpeg is unavailable.
pub const PREMUXED_FORMAT: &str = "best[ext=mp4]/best";

const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";
const UNKNOWN_TITLE: &str = "Unknown";

// ============================================================================
// Fetcher
// ============================================================================

/// Runs one `yt-dlp` process per fetch.
#[derive(Debug, Clone)]
pub struct YtDlpFetcher {
    program: Option<PathBuf>,
}

impl YtDlpFetcher {
    /// `program` is the resolved `yt-dlp` path; `None` makes every fetch
    /// fail with [`FetchError::ToolMissing`].
    pub const fn new(program: Option<PathBuf>) -> Self {
        Self { program }
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn fetch(
        &self,
        request: FetchRequest,
        progress: ProgressSink,
    ) -> Result<MediaInfo, FetchError> {
        let program = self.program.as_deref().ok_or_else(|| FetchError::ToolMissing {
            tool: "yt-dlp".to_string(),
        })?;

        let output_dir = resolve_output_dir(&request.output_dir);
        tokio::fs::create_dir_all(&output_dir).await?;

        tracing::info!(
            target: "vidnote.fetch",
            url = %request.url,
            output_dir = %output_dir.display(),
            "Starting yt-dlp"
        );

        let mut child = Command::new(program)
            .args(build_args(&request, &output_dir))
            .kill_on_drop(true)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => FetchError::ToolMissing {
                    tool: "yt-dlp".to_string(),
                },
                _ => FetchError::Process {
                    message: format!("Failed to spawn yt-dlp: {e}"),
                },
            })?;

        let stdout = child.stdout.take().ok_or_else(|| FetchError::Process {
            message: "Missing stdout".to_string(),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| FetchError::Process {
            message: "Missing stderr".to_string(),
        })?;

        let mut stderr_reader = BufReader::new(stderr);
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr_reader.read_to_end(&mut buf).await;
            buf
        });

        let mut segments = BufReader::new(stdout).split(b'\n');
        let mut result_line = None;

        while let Some(raw) = segments.next_segment().await? {
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(line) {
                Ok(FetchEvent::Progress(snapshot)) => progress.report(snapshot),
                Ok(FetchEvent::Result(result)) => result_line = Some(result),
                Err(ProtocolError::NotProtocol) => {
                    tracing::debug!(target: "vidnote.fetch", "[yt-dlp] {line}");
                }
                Err(e) => {
                    tracing::warn!(target: "vidnote.fetch", error = %e, line = %line, "Unparseable protocol line");
                }
            }
        }

        let status = child.wait().await?;
        let stderr_buf = stderr_task.await.unwrap_or_default();
        let stderr_text = String::from_utf8_lossy(&stderr_buf);

        if !status.success() {
            return Err(classify_failure(failure_message(&stderr_text, status)));
        }

        finish(result_line, &output_dir).await
    }
}

// ============================================================================
// Argument Building
// ============================================================================

/// Map a client format preference to a yt-dlp format selector.
pub fn resolve_format(preference: Option<&str>, ffmpeg_available: bool) -> String {
    match preference.map(str::trim) {
        None | Some("" | "best") if ffmpeg_available => MERGED_MP4_FORMAT.to_string(),
        None | Some("" | "best") => PREMUXED_FORMAT.to_string(),
        Some(other) => other.to_string(),
    }
}

/// A path with an extension names a file; its parent is the output directory.
pub fn resolve_output_dir(save_path: &Path) -> PathBuf {
    if save_path.extension().is_some() {
        save_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    } else {
        save_path.to_path_buf()
    }
}

fn build_args(request: &FetchRequest, output_dir: &Path) -> Vec<OsString> {
    let ffmpeg = request.ffmpeg_location.as_deref();

    let mut args: Vec<OsString> = vec![
        "--newline".into(),
        "--progress".into(),
        "--no-simulate".into(),
        "--progress-template".into(),
        format!("download:{PROGRESS_PREFIX}%(progress)j").into(),
        "--print".into(),
        format!("after_move:{RESULT_PREFIX}%(.{{title,duration,thumbnail,filepath}})j").into(),
        "--format".into(),
        resolve_format(request.format_hint.as_deref(), ffmpeg.is_some()).into(),
        "--output".into(),
        output_dir.join(OUTPUT_TEMPLATE).into_os_string(),
    ];

    if let Some(ffmpeg) = ffmpeg {
        args.extend([
            "--ffmpeg-location".into(),
            ffmpeg.as_os_str().to_owned(),
            "--merge-output-format".into(),
            "mp4".into(),
            "--recode-video".into(),
            "mp4".into(),
        ]);
    }

    args.push("--".into());
    args.push(request.url.clone().into());
    args
}

// ============================================================================
// Outcome Handling
// ============================================================================

async fn finish(result: Option<ResultLine>, output_dir: &Path) -> Result<MediaInfo, FetchError> {
    let result = result.unwrap_or_default();

    let file_path = match result.filepath {
        Some(path) => path,
        None => newest_file(output_dir).await?.ok_or_else(|| {
            FetchError::Other(format!(
                "Download finished but no file was found in {}",
                output_dir.display()
            ))
        })?,
    };

    Ok(MediaInfo {
        file_path,
        title: result
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        duration_seconds: result.duration.unwrap_or(0.0),
        thumbnail_url: result.thumbnail.filter(|t| !t.is_empty()),
    })
}

/// Most recently modified regular file directly inside `dir`.
async fn newest_file(dir: &Path) -> Result<Option<PathBuf>, FetchError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;

    while let Some(entry) = entries.next_entry().await? {
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified()?;
        if newest.as_ref().is_none_or(|(seen, _)| modified > *seen) {
            newest = Some((modified, entry.path()));
        }
    }

    Ok(newest.map(|(_, path)| path))
}

/// Human-readable reason for a failed run.
fn failure_message(stderr: &str, status: ExitStatus) -> String {
    let reason = stderr
        .lines()
        .rev()
        .find_map(|line| line.trim().strip_prefix("ERROR:"))
        .map(str::trim)
        .map(ToString::to_string)
        .or_else(|| Some(stderr.trim().to_string()).filter(|s| !s.is_empty()))
        .unwrap_or_else(|| format!("yt-dlp exited with {status}"));

    format!("Download failed: {reason}")
}

fn classify_failure(message: String) -> FetchError {
    if message.contains("Unsupported URL") {
        FetchError::Unsupported(message)
    } else if message.contains("Unable to download")
        || message.contains("HTTP Error")
        || message.contains("timed out")
    {
        FetchError::Network(message)
    } else {
        FetchError::Process { message }
    }
}

// ============================================================================
// Tests
// ============================================================================
