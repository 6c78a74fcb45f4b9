//! Core domain types for download tasks.
//!
//! Pure data types with no I/O dependencies.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier for a download task.
///
/// Generated once at submission time (UUID v4) and never reused within a
/// process lifetime.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// View the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Lifecycle status of a task.
///
/// Legal edges: `Queued → Downloading → {Completed, Failed}`.
/// `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Queued,
    Downloading,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Position in the partial order `queued < downloading < {completed, failed}`.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Queued => 0,
            Self::Downloading => 1,
            Self::Completed | Self::Failed => 2,
        }
    }

    /// Whether `self → next` is an edge of the state machine.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Downloading)
                | (Self::Downloading, Self::Completed | Self::Failed)
        )
    }

    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Downloading => "downloading",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase reported by the fetch collaborator alongside byte counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressPhase {
    #[default]
    Downloading,
    /// One stream finished; post-processing may follow.
    Finished,
    Error,
}

/// Last-known progress of a running download.
///
/// Replaced wholesale on every update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub phase: ProgressPhase,
    pub bytes_downloaded: u64,
    /// Zero when the collaborator does not know the size.
    pub bytes_total: u64,
    /// Bytes per second.
    pub speed: f64,
    pub eta_seconds: u64,
    pub filename: String,
}

impl ProgressSnapshot {
    /// Percentage in `0.0..=100.0`, or `0.0` when the total is unknown.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> f64 {
        match self.phase {
            ProgressPhase::Finished => 100.0,
            _ if self.bytes_total == 0 => 0.0,
            _ => (self.bytes_downloaded as f64 / self.bytes_total as f64 * 100.0).min(100.0),
        }
    }
}

/// Metadata of a successfully fetched media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub file_path: PathBuf,
    pub title: String,
    pub duration_seconds: f64,
    pub thumbnail_url: Option<String>,
}

/// Terminal outcome of a task. Set exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TaskResult {
    Completed(MediaInfo),
    Failed { error_message: String },
}

impl TaskResult {
    /// Build a failure result from any displayable error.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            error_message: message.into(),
        }
    }

    /// The terminal status this result belongs to.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        match self {
            Self::Completed(_) => TaskStatus::Completed,
            Self::Failed { .. } => TaskStatus::Failed,
        }
    }
}

/// One download job as stored in the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub url: String,
    pub save_path: PathBuf,
    pub format_preference: Option<String>,
    pub status: TaskStatus,
    pub progress: Option<ProgressSnapshot>,
    pub result: Option<TaskResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a task in the `queued` state.
    pub fn queued(
        id: TaskId,
        url: impl Into<String>,
        save_path: impl Into<PathBuf>,
        format_preference: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            url: url.into(),
            save_path: save_path.into(),
            format_preference,
            status: TaskStatus::Queued,
            progress: None,
            result: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Progress, but only while it is meaningful.
    #[must_use]
    pub fn live_progress(&self) -> Option<&ProgressSnapshot> {
        match self.status {
            TaskStatus::Downloading => self.progress.as_ref(),
            _ => None,
        }
    }
}
