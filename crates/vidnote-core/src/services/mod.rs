//! Application services.

mod download_service;

pub use download_service::{DownloadService, DownloadServiceConfig, SubmitRequest};
