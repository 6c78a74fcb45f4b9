//! Media fetch port.
//!
//! The orchestrator hands a [`FetchRequest`] and a [`ProgressSink`] to a
//! [`MediaFetcher`] and awaits the outcome. Implementations own all process,
//! network and filesystem details.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::task::{MediaInfo, ProgressSnapshot};

/// What to fetch and where to put it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    /// Directory or file path as submitted by the client.
    pub output_dir: PathBuf,
    /// Format selector; `None` lets the fetcher choose.
    pub format_hint: Option<String>,
    /// Post-processing tool location, if one was found at startup.
    pub ffmpeg_location: Option<PathBuf>,
}

/// Failure of a fetch. Stored in the task's `failed` result.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{tool} executable not found")]
    ToolMissing { tool: String },

    #[error("Unsupported URL: {0}")]
    Unsupported(String),

    #[error("Network error: {0}")]
    Network(String),

    /// The fetch process exited unsuccessfully.
    #[error("{message}")]
    Process { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Progress channel handed to a fetcher.
///
/// Reports are delivered in emission order. Reporting never blocks and
/// never fails; events sent after the receiver is gone are discarded.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tx: mpsc::UnboundedSender<ProgressSnapshot>,
}

impl ProgressSink {
    /// Create a sink and the receiver the orchestrator drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressSnapshot>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Sink whose reports go nowhere.
    pub fn discard() -> Self {
        Self::channel().0
    }

    /// Publish a progress snapshot.
    pub fn report(&self, progress: ProgressSnapshot) {
        let _ = self.tx.send(progress);
    }
}

/// Performs media retrieval and post-processing.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Fetch `request.url`, reporting progress along the way.
    async fn fetch(
        &self,
        request: FetchRequest,
        progress: ProgressSink,
    ) -> Result<MediaInfo, FetchError>;
}
