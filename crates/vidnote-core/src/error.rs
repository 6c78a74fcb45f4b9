//! Core error type.

use thiserror::Error;

use crate::task::{RegistryError, TaskId};

/// Semantic errors surfaced by the core services.
///
/// Adapters map these to their own representation (HTTP status codes,
/// exit codes).
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid input; nothing was created.
    #[error("{0}")]
    Validation(String),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    /// Registry invariant violated. Indicates a bug.
    #[error(transparent)]
    Registry(RegistryError),
}

impl From<RegistryError> for CoreError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(id) => Self::TaskNotFound(id),
            other => Self::Registry(other),
        }
    }
}
