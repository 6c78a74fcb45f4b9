//! Download orchestration.
//!
//! `submit` validates and registers a task, then hands the actual work to a
//! background unit and returns immediately. Each unit is supervised by an
//! outer task that records a terminal state on every exit path, panics
//! included.

use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::CoreError;
use crate::ports::{FetchRequest, MediaFetcher, ProgressSink};
use crate::task::{
    MediaInfo, ProgressSnapshot, Task, TaskId, TaskRegistry, TaskResult, TaskStatus,
};

/// A download submission as received from a client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitRequest {
    pub url: String,
    pub save_path: String,
    pub format_preference: Option<String>,
}

/// Settings applied to every fetch.
#[derive(Debug, Clone, Default)]
pub struct DownloadServiceConfig {
    /// Resolved ffmpeg binary, if any.
    pub ffmpeg_location: Option<PathBuf>,
}

/// Accepts download submissions and reports task status.
pub struct DownloadService {
    registry: Arc<TaskRegistry>,
    fetcher: Arc<dyn MediaFetcher>,
    config: DownloadServiceConfig,
}

impl DownloadService {
    pub fn new(
        registry: Arc<TaskRegistry>,
        fetcher: Arc<dyn MediaFetcher>,
        config: DownloadServiceConfig,
    ) -> Self {
        Self {
            registry,
            fetcher,
            config,
        }
    }

    /// The registry backing this service.
    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    /// Register a new task and start it in the background.
    ///
    /// Must be called from within a Tokio runtime. Returns without waiting
    /// for the fetch; the returned id is immediately visible to
    /// [`status`](Self::status).
    pub fn submit(&self, request: SubmitRequest) -> Result<TaskId, CoreError> {
        if request.url.trim().is_empty() {
            return Err(CoreError::Validation("URL is required".to_string()));
        }
        if request.save_path.trim().is_empty() {
            return Err(CoreError::Validation("save_path is required".to_string()));
        }

        let format_preference = request
            .format_preference
            .filter(|f| !f.trim().is_empty());

        let id = TaskId::generate();
        let task = self.registry.create(
            id.clone(),
            request.url,
            request.save_path,
            format_preference,
        )?;

        let fetch_request = FetchRequest {
            url: task.url.clone(),
            output_dir: task.save_path.clone(),
            format_hint: task.format_preference.clone(),
            ffmpeg_location: self.config.ffmpeg_location.clone(),
        };

        tracing::info!(
            target: "vidnote.download",
            id = %id,
            url = %task.url,
            save_path = %task.save_path.display(),
            "Download task queued"
        );

        tokio::spawn(supervise(
            Arc::clone(&self.registry),
            Arc::clone(&self.fetcher),
            id.clone(),
            fetch_request,
        ));

        Ok(id)
    }

    /// Current snapshot of a task.
    pub fn status(&self, id: &TaskId) -> Result<Task, CoreError> {
        Ok(self.registry.get(id)?)
    }
}

/// Run one task to completion and record its terminal state.
async fn supervise(
    registry: Arc<TaskRegistry>,
    fetcher: Arc<dyn MediaFetcher>,
    id: TaskId,
    request: FetchRequest,
) {
    let worker = tokio::spawn(run_task(
        Arc::clone(&registry),
        fetcher,
        id.clone(),
        request,
    ));

    let outcome = match worker.await {
        Ok(outcome) => outcome,
        Err(err) if err.is_panic() => Err(format!(
            "Download task panicked: {}",
            panic_message(err.into_panic().as_ref())
        )),
        Err(err) => Err(format!("Download task aborted: {err}")),
    };

    finalize(&registry, &id, outcome);
}

async fn run_task(
    registry: Arc<TaskRegistry>,
    fetcher: Arc<dyn MediaFetcher>,
    id: TaskId,
    request: FetchRequest,
) -> Result<MediaInfo, String> {
    registry
        .transition(&id, TaskStatus::Downloading, None)
        .map_err(|e| e.to_string())?;

    tracing::debug!(target: "vidnote.download", id = %id, "Download started");

    let (sink, mut rx) = ProgressSink::channel();
    let fetch = fetcher.fetch(request, sink);
    tokio::pin!(fetch);

    let result = loop {
        tokio::select! {
            biased;
            Some(progress) = rx.recv() => apply_progress(&registry, &id, progress),
            result = &mut fetch => break result,
        }
    };

    // Apply whatever the fetcher emitted before returning
    rx.close();
    drain(&registry, &id, &mut rx);

    result.map_err(|e| e.to_string())
}

fn apply_progress(registry: &TaskRegistry, id: &TaskId, progress: ProgressSnapshot) {
    registry.update_progress(id, progress);
}

fn drain(
    registry: &TaskRegistry,
    id: &TaskId,
    rx: &mut mpsc::UnboundedReceiver<ProgressSnapshot>,
) {
    while let Ok(progress) = rx.try_recv() {
        apply_progress(registry, id, progress);
    }
}

fn finalize(registry: &TaskRegistry, id: &TaskId, outcome: Result<MediaInfo, String>) {
    // A fault before the worker got going leaves the task queued
    if let Ok(task) = registry.get(id) {
        if task.status == TaskStatus::Queued {
            let _ = registry.transition(id, TaskStatus::Downloading, None);
        }
    }

    let (next, result) = match outcome {
        Ok(info) => {
            tracing::info!(
                target: "vidnote.download",
                id = %id,
                title = %info.title,
                file = %info.file_path.display(),
                "Download completed"
            );
            (TaskStatus::Completed, TaskResult::Completed(info))
        }
        Err(message) => {
            tracing::warn!(target: "vidnote.download", id = %id, error = %message, "Download failed");
            let message = if message.trim().is_empty() {
                "Download failed".to_string()
            } else {
                message
            };
            (TaskStatus::Failed, TaskResult::failed(message))
        }
    };

    if let Err(err) = registry.transition(id, next, Some(result)) {
        tracing::error!(target: "vidnote.download", id = %id, error = %err, "Failed to record task outcome");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::ports::FetchError;

    /// Fetcher whose behavior is scripted per test.
    struct ScriptedFetcher {
        progress: Vec<ProgressSnapshot>,
        gate: Option<Arc<Notify>>,
        outcome: Outcome,
        seen: Mutex<Vec<FetchRequest>>,
    }

    enum Outcome {
        Succeed(MediaInfo),
        Fail(&'static str),
        Panic,
    }

    impl ScriptedFetcher {
        fn new(outcome: Outcome) -> Self {
            Self {
                progress: Vec::new(),
                gate: None,
                outcome,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn with_progress(mut self, progress: Vec<ProgressSnapshot>) -> Self {
            self.progress = progress;
            self
        }

        fn gated(mut self, gate: Arc<Notify>) -> Self {
            self.gate = Some(gate);
            self
        }
    }

    #[async_trait]
    impl MediaFetcher for ScriptedFetcher {
        async fn fetch(
            &self,
            request: FetchRequest,
            progress: ProgressSink,
        ) -> Result<MediaInfo, FetchError> {
            self.seen.lock().unwrap().push(request);
            for p in &self.progress {
                progress.report(p.clone());
            }
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            match &self.outcome {
                Outcome::Succeed(info) => Ok(info.clone()),
                Outcome::Fail(message) => Err(FetchError::Network((*message).to_string())),
                Outcome::Panic => panic!("fetcher exploded"),
            }
        }
    }

    fn media_x() -> MediaInfo {
        MediaInfo {
            file_path: "/tmp/out/X.mp4".into(),
            title: "X".to_string(),
            duration_seconds: 42.0,
            thumbnail_url: Some("https://example.com/x.jpg".to_string()),
        }
    }

    fn service(fetcher: ScriptedFetcher) -> (DownloadService, Arc<ScriptedFetcher>) {
        let fetcher = Arc::new(fetcher);
        let service = DownloadService::new(
            Arc::new(TaskRegistry::new()),
            Arc::clone(&fetcher) as Arc<dyn MediaFetcher>,
            DownloadServiceConfig {
                ffmpeg_location: Some("/opt/ffmpeg/bin/ffmpeg".into()),
            },
        );
        (service, fetcher)
    }

    fn request(url: &str) -> SubmitRequest {
        SubmitRequest {
            url: url.to_string(),
            save_path: "/tmp/out".to_string(),
            format_preference: None,
        }
    }

    async fn wait_for_terminal(service: &DownloadService, id: &TaskId) -> Task {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let task = service.status(id).unwrap();
                if task.status.is_terminal() {
                    return task;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("task did not reach a terminal state")
    }

    #[tokio::test]
    async fn submit_returns_before_fetch_finishes() {
        let gate = Arc::new(Notify::new());
        let (service, _) = service(ScriptedFetcher::new(Outcome::Succeed(media_x())).gated(Arc::clone(&gate)));

        let id = tokio::time::timeout(Duration::from_millis(500), async {
            service.submit(request("https://example.com/v")).unwrap()
        })
        .await
        .unwrap();

        let status = service.status(&id).unwrap().status;
        assert!(matches!(status, TaskStatus::Queued | TaskStatus::Downloading));

        gate.notify_one();
        let task = wait_for_terminal(&service, &id).await;
        assert_eq!(task.status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn successful_fetch_completes_with_metadata() {
        let (service, fetcher) = service(ScriptedFetcher::new(Outcome::Succeed(media_x())));

        let id = service.submit(request("https://example.com/v")).unwrap();
        let task = wait_for_terminal(&service, &id).await;

        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.result, Some(TaskResult::Completed(media_x())));

        // Terminal state is stable
        for _ in 0..3 {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let again = service.status(&id).unwrap();
            assert_eq!(again.status, TaskStatus::Completed);
            assert_eq!(again.result, Some(TaskResult::Completed(media_x())));
        }

        let seen = fetcher.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].url, "https://example.com/v");
        assert_eq!(seen[0].output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(
            seen[0].ffmpeg_location,
            Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg"))
        );
    }

    #[tokio::test]
    async fn failed_fetch_records_message() {
        let (service, _) = service(
            ScriptedFetcher::new(Outcome::Fail("connection reset")).with_progress(vec![
                ProgressSnapshot {
                    bytes_downloaded: 10,
                    bytes_total: 100,
                    ..Default::default()
                },
            ]),
        );

        let id = service.submit(request("https://example.com/v")).unwrap();
        let task = wait_for_terminal(&service, &id).await;

        assert_eq!(task.status, TaskStatus::Failed);
        match task.result {
            Some(TaskResult::Failed { error_message }) => {
                assert!(error_message.contains("connection reset"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn panicking_fetch_still_fails_task() {
        let (service, _) = service(ScriptedFetcher::new(Outcome::Panic));

        let id = service.submit(request("https://example.com/v")).unwrap();
        let task = wait_for_terminal(&service, &id).await;

        assert_eq!(task.status, TaskStatus::Failed);
        match task.result {
            Some(TaskResult::Failed { error_message }) => {
                assert!(error_message.contains("fetcher exploded"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn progress_is_visible_while_downloading() {
        let gate = Arc::new(Notify::new());
        let (service, _) = service(
            ScriptedFetcher::new(Outcome::Succeed(media_x()))
                .with_progress(vec![
                    ProgressSnapshot {
                        bytes_downloaded: 10,
                        bytes_total: 100,
                        ..Default::default()
                    },
                    ProgressSnapshot {
                        bytes_downloaded: 60,
                        bytes_total: 100,
                        filename: "X.mp4".to_string(),
                        ..Default::default()
                    },
                ])
                .gated(Arc::clone(&gate)),
        );

        let id = service.submit(request("https://example.com/v")).unwrap();

        let progress = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let task = service.status(&id).unwrap();
                if let Some(p) = task.live_progress() {
                    if p.bytes_downloaded == 60 {
                        return p.clone();
                    }
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(progress.filename, "X.mp4");

        gate.notify_one();
        let task = wait_for_terminal(&service, &id).await;
        assert!(task.live_progress().is_none());
    }

    #[tokio::test]
    async fn status_never_moves_backwards() {
        let gate = Arc::new(Notify::new());
        let (service, _) =
            service(ScriptedFetcher::new(Outcome::Succeed(media_x())).gated(Arc::clone(&gate)));

        let id = service.submit(request("https://example.com/v")).unwrap();
        let mut last_rank = 0;
        let mut released = false;

        for i in 0..400 {
            let task = service.status(&id).unwrap();
            assert!(task.status.rank() >= last_rank);
            last_rank = task.status.rank();
            if task.status.is_terminal() {
                break;
            }
            if i == 10 && !released {
                gate.notify_one();
                released = true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(last_rank, TaskStatus::Completed.rank());
    }

    #[tokio::test]
    async fn empty_url_is_rejected_without_creating_task() {
        let (service, fetcher) = service(ScriptedFetcher::new(Outcome::Succeed(media_x())));

        let err = service.submit(request("   ")).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ref m) if m == "URL is required"));
        assert!(service.registry().is_empty());
        assert!(fetcher.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_save_path_is_rejected() {
        let (service, _) = service(ScriptedFetcher::new(Outcome::Succeed(media_x())));

        let err = service
            .submit(SubmitRequest {
                url: "https://example.com/v".to_string(),
                save_path: String::new(),
                format_preference: None,
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(service.registry().is_empty());
    }

    #[tokio::test]
    async fn blank_format_preference_is_dropped() {
        let (service, fetcher) = service(ScriptedFetcher::new(Outcome::Succeed(media_x())));

        let id = service
            .submit(SubmitRequest {
                url: "https://example.com/v".to_string(),
                save_path: "/tmp/out".to_string(),
                format_preference: Some(" ".to_string()),
            })
            .unwrap();
        wait_for_terminal(&service, &id).await;

        assert_eq!(fetcher.seen.lock().unwrap()[0].format_hint, None);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let (service, _) = service(ScriptedFetcher::new(Outcome::Succeed(media_x())));

        let err = service.status(&TaskId::from("does-not-exist")).unwrap_err();
        assert!(matches!(err, CoreError::TaskNotFound(_)));
    }

    #[test]
    fn panic_message_reads_str_and_string_payloads() {
        let s: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(s.as_ref()), "static");
        let s: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(s.as_ref()), "owned");
        let s: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(s.as_ref()), "unknown panic");
    }
}
