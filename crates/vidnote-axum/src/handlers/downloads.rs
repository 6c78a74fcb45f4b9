//! Download submission and status polling.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};

use vidnote_core::TaskId;

use crate::dto::{DownloadAccepted, DownloadRequest, TaskStatusResponse};
use crate::error::HttpError;
use crate::state::AppState;

/// Queue a new download.
pub async fn submit(
    State(state): State<AppState>,
    body: Result<Json<DownloadRequest>, JsonRejection>,
) -> Result<Json<DownloadAccepted>, HttpError> {
    let Json(request) = body.map_err(|e| HttpError::BadRequest(e.body_text()))?;

    let task_id = state.downloads.submit(request.into())?;

    Ok(Json(DownloadAccepted {
        success: true,
        task_id: task_id.to_string(),
        message: "Download task queued".to_string(),
    }))
}

/// Report the current state of a download.
pub async fn status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskStatusResponse>, HttpError> {
    let task = state.downloads.status(&TaskId::from(task_id))?;

    tracing::debug!(
        target: "vidnote.download",
        id = %task.id,
        status = %task.status,
        "Status polled"
    );

    Ok(Json(TaskStatusResponse::from(&task)))
}
