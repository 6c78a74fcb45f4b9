//! Request and response bodies.
//!
//! Field names are snake_case on the wire. Requests also accept the
//! camelCase spellings some frontends send.

use serde::{Deserialize, Serialize};

use vidnote_core::{ProgressPhase, SubmitRequest, Task, TaskResult, TaskStatus};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// Body of `POST /api/download`.
///
/// Missing fields deserialize as empty so validation answers with a 400
/// instead of a body-rejection error.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DownloadRequest {
    pub url: String,
    #[serde(alias = "savePath")]
    pub save_path: String,
    #[serde(alias = "formatPreference")]
    pub format_preference: Option<String>,
}

impl From<DownloadRequest> for SubmitRequest {
    fn from(req: DownloadRequest) -> Self {
        Self {
            url: req.url,
            save_path: req.save_path,
            format_preference: req.format_preference,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DownloadAccepted {
    pub success: bool,
    pub task_id: String,
    pub message: String,
}

/// Live progress, reported only while downloading.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressDto {
    pub status: ProgressPhase,
    pub percent: f64,
    pub downloaded_bytes: u64,
    pub total_bytes: u64,
    pub speed: f64,
    pub eta: u64,
    pub filename: String,
}

/// Body of `GET /api/download/{task_id}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskStatusResponse {
    /// `false` only for failed tasks.
    pub success: bool,
    pub message: String,
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl From<&Task> for TaskStatusResponse {
    fn from(task: &Task) -> Self {
        let progress = task.live_progress().map(|p| ProgressDto {
            status: p.phase,
            percent: p.percent(),
            downloaded_bytes: p.bytes_downloaded,
            total_bytes: p.bytes_total,
            speed: p.speed,
            eta: p.eta_seconds,
            filename: p.filename.clone(),
        });

        let mut response = Self {
            success: true,
            message: format!("Download status: {}", task.status),
            task_id: task.id.to_string(),
            status: task.status,
            progress,
            file_path: None,
            title: None,
            duration: None,
            thumbnail: None,
        };

        match &task.result {
            Some(TaskResult::Completed(info)) => {
                response.message = "Download completed successfully".to_string();
                response.file_path = Some(info.file_path.to_string_lossy().into_owned());
                response.title = Some(info.title.clone());
                response.duration = Some(info.duration_seconds);
                response.thumbnail.clone_from(&info.thumbnail_url);
            }
            Some(TaskResult::Failed { error_message }) => {
                response.success = false;
                response.message.clone_from(error_message);
            }
            None => {}
        }

        response
    }
}
