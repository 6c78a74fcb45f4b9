//! Axum HTTP adapter for the vidnote sidecar.
//!
//! Exposes the health probes and the download API over loopback HTTP. All
//! behavior lives in `vidnote-core`; handlers only translate.
//!
//! Wire fields are snake_case (`task_id`, `save_path`, `file_path`,
//! `duration`, `thumbnail`), matching the desktop frontend. Requests also
//! accept the camelCase spellings (`savePath`, `formatPreference`).

#![deny(unused_crate_dependencies)]

// Used only by integration tests under tests/
#[cfg(test)]
use async_trait as _;
#[cfg(test)]
use http_body_util as _;
#[cfg(test)]
use reqwest as _;
#[cfg(test)]
use tower as _;

pub mod bootstrap;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use bootstrap::{AxumContext, CorsConfig, default_cors_origins};
pub use error::HttpError;
pub use routes::create_router;
pub use server::serve;
pub use state::AppState;
