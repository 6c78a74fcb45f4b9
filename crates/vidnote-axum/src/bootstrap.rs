//! Wiring types for the HTTP adapter.
//!
//! The composition root (the sidecar binary) builds the core services and
//! hands them over in an [`AxumContext`].

use std::sync::Arc;

use vidnote_core::DownloadService;

/// Services reachable from handlers.
pub struct AxumContext {
    pub downloads: Arc<DownloadService>,
}

impl AxumContext {
    pub const fn new(downloads: Arc<DownloadService>) -> Self {
        Self { downloads }
    }
}

/// Origins allowed to call the API from a browser context.
///
/// Always an explicit allow-list; a `*` entry is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    origins: Vec<String>,
}

impl CorsConfig {
    pub const fn allow_origins(origins: Vec<String>) -> Self {
        Self { origins }
    }

    pub fn origins(&self) -> &[String] {
        &self.origins
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self::allow_origins(default_cors_origins())
    }
}

/// Origins the desktop shell loads its webview from.
///
/// - the frontend dev server
/// - Tauri WebView protocols (`tauri://` and `http(s)://tauri.localhost`)
pub fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:1420".into(), // Vite dev server
        "tauri://localhost".into(),
        "http://tauri.localhost".into(),
        "https://tauri.localhost".into(),
    ]
}
