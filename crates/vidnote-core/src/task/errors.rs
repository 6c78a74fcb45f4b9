//! Task registry error types.

use thiserror::Error;

use super::types::{TaskId, TaskStatus};

/// Errors raised by [`TaskRegistry`](super::TaskRegistry) operations.
///
/// Everything except `NotFound` indicates a logic error in the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Task not found: {0}")]
    NotFound(TaskId),

    #[error("Task already exists: {0}")]
    AlreadyExists(TaskId),

    #[error("Illegal transition for task {id}: {from} -> {to}")]
    IllegalTransition {
        id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },

    /// A terminal transition without its result, a result of the wrong kind,
    /// or a result on a non-terminal transition.
    #[error("Result does not match transition of task {id} to {to}")]
    ResultMismatch { id: TaskId, to: TaskStatus },
}
