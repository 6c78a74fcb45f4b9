//! Shared fixtures for the HTTP integration tests.

#![allow(dead_code)]

pub mod fetchers;

use std::sync::Arc;

use axum::Router;
use vidnote_axum::{AppState, AxumContext, CorsConfig, create_router};
use vidnote_core::{DownloadService, DownloadServiceConfig, MediaFetcher, TaskRegistry};

/// Build an application state around `fetcher`.
pub fn state_with(fetcher: impl MediaFetcher + 'static) -> AppState {
    let service = DownloadService::new(
        Arc::new(TaskRegistry::new()),
        Arc::new(fetcher),
        DownloadServiceConfig::default(),
    );
    Arc::new(AxumContext::new(Arc::new(service)))
}

/// Router with the default origin allow-list.
pub fn app_with(fetcher: impl MediaFetcher + 'static) -> (Router, AppState) {
    let state = state_with(fetcher);
    let app = create_router(Arc::clone(&state), &CorsConfig::default());
    (app, state)
}
