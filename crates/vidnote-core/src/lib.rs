//! Core domain for the vidnote download sidecar.
//!
//! Holds the task model, the concurrent [`TaskRegistry`], the
//! [`MediaFetcher`] port and the [`DownloadService`] that ties them together.
//! Adapters (HTTP, yt-dlp) live in their own crates.

#![deny(unused_crate_dependencies)]

pub mod error;
pub mod ports;
pub mod services;
pub mod task;

pub use error::CoreError;
pub use ports::{FetchError, FetchRequest, MediaFetcher, ProgressSink};
pub use services::{DownloadService, DownloadServiceConfig, SubmitRequest};
pub use task::{
    MediaInfo, ProgressPhase, ProgressSnapshot, RegistryError, Task, TaskId, TaskRegistry,
    TaskResult, TaskStatus,
};
