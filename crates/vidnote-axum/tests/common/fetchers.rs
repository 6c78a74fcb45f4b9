//! Hand-written `MediaFetcher` fakes.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;
use vidnote_core::{
    FetchError, FetchRequest, MediaFetcher, MediaInfo, ProgressSink, ProgressSnapshot,
};

/// Completes immediately with fixed metadata.
pub struct InstantSuccess(pub MediaInfo);

#[async_trait]
impl MediaFetcher for InstantSuccess {
    async fn fetch(
        &self,
        _request: FetchRequest,
        _progress: ProgressSink,
    ) -> Result<MediaInfo, FetchError> {
        Ok(self.0.clone())
    }
}

/// Fails immediately with a network error.
pub struct InstantFailure(pub &'static str);

#[async_trait]
impl MediaFetcher for InstantFailure {
    async fn fetch(
        &self,
        _request: FetchRequest,
        _progress: ProgressSink,
    ) -> Result<MediaInfo, FetchError> {
        Err(FetchError::Network(self.0.to_string()))
    }
}

/// Reports one progress snapshot, then waits for the gate before succeeding.
pub struct Gated {
    pub progress: ProgressSnapshot,
    pub gate: Arc<Notify>,
    pub info: MediaInfo,
}

#[async_trait]
impl MediaFetcher for Gated {
    async fn fetch(
        &self,
        _request: FetchRequest,
        progress: ProgressSink,
    ) -> Result<MediaInfo, FetchError> {
        progress.report(self.progress.clone());
        self.gate.notified().await;
        Ok(self.info.clone())
    }
}

pub fn media_x() -> MediaInfo {
    MediaInfo {
        file_path: "/tmp/out/X.mp4".into(),
        title: "X".to_string(),
        duration_seconds: 12.0,
        thumbnail_url: Some("https://example.com/x.jpg".to_string()),
    }
}
